use crate::{
    config::{ApiKey, Config},
    extract::{self, Format},
    interpret::{AnthropicClient, prompt},
    pipeline::{Pipeline, Upload},
    server,
    util::ensure_dir,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "survey-webup")]
#[command(about = "Convert survey documents into the web-upload workbook (extract + LLM + xlsx)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./survey-webup.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service.
    Serve {
        /// Listen address, overrides server.bind.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Convert one local file into the upload workbook.
    Convert {
        #[arg(long)]
        input: PathBuf,
        /// Output workbook path. Defaults to `<stem>_웹업용.xlsx` next to the input.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also write the conversion report as JSON.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the parsed survey structure as JSON.
    Analyze {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the text that would be sent to the model. No API key needed.
    Extract {
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the instruction prompt and its version.
    Prompt {},
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref());
    let cfg = match &cfg_path {
        Some(p) => Config::load(p)?,
        None => Config::default(),
    };
    let _guard = init_logging(&args, &cfg)?;
    if let Some(p) = &cfg_path {
        info!("config {}", p.display());
    }

    match &args.cmd {
        Command::Serve { bind } => serve(&cfg, bind.as_deref()),
        Command::Convert { input, out, report } => {
            convert(&cfg, input, out.as_deref(), report.as_deref())
        }
        Command::Analyze { input, out } => analyze(&cfg, input, out.as_deref()),
        Command::Extract { input } => extract_only(&cfg, input),
        Command::Prompt {} => {
            println!("# {} sha256={}", prompt::PROMPT_VERSION, prompt::SYSTEM_PROMPT_SHA256);
            println!("{}", prompt::SYSTEM_PROMPT);
            Ok(())
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    [
        PathBuf::from("survey-webup.toml"),
        PathBuf::from("survey-webup.example.toml"),
    ]
    .into_iter()
    .find(|p| p.exists())
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stderr keeps stdout clean for the JSON the offline commands print.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = match resolve_log_path(cfg) {
        Some(path) => {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            ensure_dir(parent)?;
            let file = std::fs::File::create(&path)
                .with_context(|| format!("create log file: {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from("logs").join("survey-webup.log"))
}

/// The credential is read here, once; a missing key stops the process
/// before any request is accepted.
fn build_pipeline(cfg: &Config) -> Result<Pipeline<AnthropicClient>> {
    let key = ApiKey::from_env(&cfg.llm).context("language model credential")?;
    let client = AnthropicClient::new(&cfg.llm, key)?;
    Ok(Pipeline::new(cfg, client))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")
}

fn read_upload(input: &Path) -> Result<Upload> {
    let bytes =
        std::fs::read(input).with_context(|| format!("reading input: {}", input.display()))?;
    let filename = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("input has no usable file name: {}", input.display()))?
        .to_string();
    Ok(Upload { filename, bytes })
}

fn serve(cfg: &Config, bind: Option<&str>) -> Result<()> {
    let mut cfg = cfg.clone();
    if let Some(b) = bind {
        cfg.server.bind = b.to_string();
    }
    let pipeline = Arc::new(build_pipeline(&cfg)?);
    runtime()?.block_on(server::serve(&cfg, pipeline))
}

fn convert(cfg: &Config, input: &Path, out: Option<&Path>, report: Option<&Path>) -> Result<()> {
    let pipeline = build_pipeline(cfg)?;
    let upload = read_upload(input)?;
    let conversion = runtime()?.block_on(pipeline.convert(upload))?;

    let out_path = out.map(PathBuf::from).unwrap_or_else(|| {
        input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&conversion.filename)
    });
    std::fs::write(&out_path, &conversion.workbook)
        .with_context(|| format!("writing workbook: {}", out_path.display()))?;

    if let Some(report_path) = report {
        std::fs::write(
            report_path,
            serde_json::to_string_pretty(&conversion.report)?,
        )
        .with_context(|| format!("writing report: {}", report_path.display()))?;
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "status": "ok",
            "workbook": out_path,
            "report": conversion.report,
        }))?
    );
    Ok(())
}

fn analyze(cfg: &Config, input: &Path, out: Option<&Path>) -> Result<()> {
    let pipeline = build_pipeline(cfg)?;
    let upload = read_upload(input)?;
    let analysis = runtime()?.block_on(pipeline.analyze(upload))?;
    let json = serde_json::to_string_pretty(&analysis.survey)?;
    match out {
        Some(p) => std::fs::write(p, json).with_context(|| format!("writing {}", p.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn extract_only(cfg: &Config, input: &Path) -> Result<()> {
    let upload = read_upload(input)?;
    let format = Format::from_filename(&upload.filename)?;
    let extracted = extract::extract(cfg, &upload.bytes, format)?;
    let prompt = prompt::build(&extracted.text, cfg.limits.max_prompt_chars);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "input": input,
            "format": extracted.format,
            "chars": extracted.text.chars().count(),
            "skipped_pages": extracted.skipped_pages,
            "would_truncate": prompt.truncated,
            "text": extracted.text,
        }))?
    );
    Ok(())
}
