pub mod error;
pub mod types;
pub mod config;

pub use config::{BsonkitConfig, CodecConfig, LogConfig, NESTING_DEPTH_LIMIT};
pub use error::{CommonError, CommonResult};
pub use types::ObjectId;
