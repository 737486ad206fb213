pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod interpret;
pub mod pipeline;
pub mod postprocess;
pub mod render;
pub mod report;
pub mod server;
pub mod survey;
pub mod util;

pub use error::ConvertError;
pub use pipeline::{Pipeline, Upload};
pub use survey::SurveyStructure;
