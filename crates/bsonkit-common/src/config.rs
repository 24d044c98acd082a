//! 配置模块
//!
//! 定义编解码器与日志的配置项，支持从 TOML 文件加载:
//!
//! ```toml
//! [codec]
//! initial_capacity = 256
//! max_document_size = 16777216
//! max_nesting_depth = 100
//! indent_width = 2
//!
//! [log]
//! level = "info"
//! ```

use crate::error::{CommonError, CommonResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// `max_nesting_depth` 允许的上限
pub const NESTING_DEPTH_LIMIT: usize = 100;

/// 编解码器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// 文档构建器的初始容量(字节)，仅作为性能提示
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// 单个文档允许的最大字节数 (默认: 16MB)
    #[serde(default = "default_max_document_size")]
    pub max_document_size: usize,

    /// 递归渲染时允许的最大嵌套层级 (默认: 100)
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// 美化输出的缩进宽度 (默认: 2)
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,
}

fn default_initial_capacity() -> usize { 256 }
fn default_max_document_size() -> usize { 16 * 1024 * 1024 }
fn default_max_nesting_depth() -> usize { NESTING_DEPTH_LIMIT }
fn default_indent_width() -> usize { 2 }

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
            max_document_size: default_max_document_size(),
            max_nesting_depth: default_max_nesting_depth(),
            indent_width: default_indent_width(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// 顶层配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BsonkitConfig {
    #[serde(default)]
    pub codec: CodecConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl BsonkitConfig {
    /// # Brief
    /// 从 TOML 文件加载配置
    ///
    /// # Arguments
    /// * `path` - 配置文件路径
    ///
    /// # Returns
    /// 解析后的配置实例
    pub fn from_file(path: &Path) -> CommonResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> CommonResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CommonError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// # Brief
    /// 将配置序列化为 TOML 字符串
    pub fn to_toml(&self) -> CommonResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CommonError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// 检查取值范围
    pub fn validate(&self) -> CommonResult<()> {
        // 最小文档: 4 字节长度 + 1 字节结束符
        if self.codec.max_document_size < 5 {
            return Err(CommonError::Config(
                "max_document_size must be at least 5 bytes".to_string(),
            ));
        }
        if self.codec.max_document_size > i32::MAX as usize {
            return Err(CommonError::Config(
                "max_document_size must fit in an int32".to_string(),
            ));
        }
        if self.codec.max_nesting_depth == 0 {
            return Err(CommonError::Config(
                "max_nesting_depth must be positive".to_string(),
            ));
        }
        // 渲染与统计按层递归，层数受线程栈限制
        if self.codec.max_nesting_depth > NESTING_DEPTH_LIMIT {
            return Err(CommonError::Config(format!(
                "max_nesting_depth must not exceed {}",
                NESTING_DEPTH_LIMIT
            )));
        }
        Ok(())
    }
}
