use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub llm: Llm,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub extract: Extract,
    #[serde(default)]
    pub render: Render,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        cfg.validate()
            .with_context(|| format!("invalid config: {}", path.display()))?;
        Ok(cfg)
    }

    /// Rejects values that would only fail later, mid-request.
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            bail!("llm.model is empty");
        }
        if self.llm.max_tokens == 0 {
            bail!("llm.max_tokens must be > 0");
        }
        if self.llm.api_key_env.trim().is_empty() {
            bail!("llm.api_key_env is empty");
        }
        if self.limits.max_upload_bytes == 0 {
            bail!("limits.max_upload_bytes must be > 0");
        }
        if self.limits.max_prompt_chars == 0 {
            bail!("limits.max_prompt_chars must be > 0");
        }
        if self.render.header_row == 0 {
            bail!("render.header_row is 1-based and must be > 0");
        }
        if self.render.max_options == 0 || self.render.max_options > 200 {
            bail!(
                "render.max_options must be within 1..=200, got {}",
                self.render.max_options
            );
        }
        if self.render.sheet_name.trim().is_empty() {
            bail!("render.sheet_name is empty");
        }
        for p in &self.extract.strip_line_patterns {
            Regex::new(p).map_err(|e| anyhow!("extract.strip_line_patterns: {p:?}: {e}"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub permissive_cors: bool,
}
impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".into(),
            permissive_cors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Llm {
    pub base_url: String,
    pub api_version: String,
    pub model: String,
    pub max_tokens: u32,
    /// 0 disables the request timeout.
    pub timeout_seconds: u64,
    pub api_key_env: String,
}
impl Default for Llm {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".into(),
            api_version: "2023-06-01".into(),
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 16000,
            timeout_seconds: 180,
            api_key_env: "ANTHROPIC_API_KEY".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_upload_bytes: u64,
    pub max_prompt_chars: usize,
}
impl Default for Limits {
    fn default() -> Self {
        Self {
            max_upload_bytes: 20 * 1024 * 1024,
            max_prompt_chars: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Extract {
    pub normalize_unicode: bool,
    pub normalize_newlines: bool,
    pub trim_trailing_whitespace: bool,
    pub collapse_blank_lines: bool,
    pub control_chars_to_sanitize: Vec<u8>,
    pub strip_line_patterns: Vec<String>,
}
impl Default for Extract {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            normalize_newlines: true,
            trim_trailing_whitespace: true,
            collapse_blank_lines: true,
            control_chars_to_sanitize: (0u8..32).filter(|c| !matches!(c, 9 | 10 | 13)).collect(),
            strip_line_patterns: vec![
                "(?i)^page\\s+\\d+(\\s*(/|of)\\s*\\d+)?$".into(),
                "^-\\s*\\d+\\s*-$".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Render {
    pub sheet_name: String,
    /// 1-based row holding the column headers; data starts on the next row.
    pub header_row: u32,
    pub max_options: usize,
    pub header_fill: u32,
}
impl Default for Render {
    fn default() -> Self {
        Self {
            sheet_name: "설문지".into(),
            header_row: 3,
            max_options: 35,
            header_fill: 0xE0E0E0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

/// Credential for the language-model provider. Read once at startup and
/// handed to the client; never logged.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            bail!("API key is empty");
        }
        Ok(Self(key.trim().to_string()))
    }

    pub fn from_env(llm: &Llm) -> Result<Self> {
        let raw = std::env::var(&llm.api_key_env)
            .map_err(|_| anyhow!("{} is not set", llm.api_key_env))?;
        Self::new(raw).with_context(|| format!("{} is empty", llm.api_key_env))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
