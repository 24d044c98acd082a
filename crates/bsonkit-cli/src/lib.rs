pub mod cli;
pub mod formatter;
pub mod stats;

pub use cli::Cli;
pub use formatter::Formatter;
pub use stats::Stats;

use bsonkit::BsonError;
use bsonkit_common::CommonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] CommonError),

    #[error("Document {index} at offset {offset}: {source}")]
    Decode {
        index: usize,
        offset: usize,
        source: BsonError,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;

/// 初始化日志，`RUST_LOG` 优先于传入的级别
pub fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr))
        .with(filter)
        .init();
}
