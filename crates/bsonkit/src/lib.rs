//! # bsonkit - BSON 元素编解码器
//!
//! bsonkit 实现 BSON 二进制文档格式的元素级编解码:
//!
//! - **显式类型**：每个元素在构造时即确定其 BSON 类型，不做写入时类型推断
//! - **惰性解码**：`ElementIter` 每次只解出一个元素，嵌入文档/数组以借用的字节区间返回
//! - **零拷贝**：解码出的字符串、二进制与子文档都借用自原始缓冲区
//! - **两阶段构建**：`DocumentBuilder::finish` 消耗构建器，定稿后不可再写入
//!
//! ## 快速开始
//!
//! ```rust,ignore
//! use bsonkit::{DocumentBuilder, Element, RawDocument};
//!
//! let mut inner = DocumentBuilder::new();
//! inner.append(Element::string("x", "y"))?;
//! let inner = inner.finish();
//!
//! let mut outer = DocumentBuilder::new();
//! outer.append(Element::document("inner", RawDocument::new(&inner)?))?;
//! let bytes = outer.finish();
//!
//! for element in RawDocument::new(&bytes)?.iter() {
//!     println!("{}", element?.name());
//! }
//! ```
//!
//! ## 并发约定
//!
//! 所有操作都是同步、单线程的纯内存操作。`ReadBuffer`/`WriteBuffer` 的游标
//! 不做内部同步，跨线程共享同一缓冲区需要调用方自行加锁。

pub mod spec;
pub mod buffer;
pub mod element;
pub mod encoder;
pub mod builder;
pub mod decoder;
pub mod pretty;
pub mod json;

pub use buffer::{ReadBuffer, WriteBuffer};
pub use builder::DocumentBuilder;
pub use decoder::{read_document, DocumentStream, ElementIter, RawDocument};
pub use element::{Binary, BsonValue, DbPointer, Element, JavaScriptWithScope, Regex};
pub use encoder::write_element;
pub use json::{to_relaxed_json, to_relaxed_json_with_depth, value_to_json};
pub use pretty::{mapped, pretty, Printer};
pub use spec::{BinarySubtype, ElementType};

pub use bsonkit_common::ObjectId;

use thiserror::Error;

/// BSON 编解码的错误类型
///
/// 所有错误对当前文档都是致命的：BSON 是严格的二进制格式，
/// 任何结构性错误都使整个文档失效，不做局部恢复。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BsonError {
    /// 读取越过缓冲区末尾
    #[error("Buffer underrun: need {need} bytes, have {have}")]
    BufferUnderrun { need: usize, have: usize },

    /// 字符串不是有效的 UTF-8 编码
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// C 字符串缺少结束符，或写入的名称中含有 NUL
    #[error("Invalid C-string: {0}")]
    InvalidCString(String),

    /// 未知的元素类型码
    #[error("Unknown element type: 0x{0:02X}")]
    UnknownElementType(u8),

    /// 未登记的二进制子类型
    #[error("Unsupported binary subtype: 0x{0:02X}")]
    UnsupportedSubtype(u8),

    /// 文档结构无效
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// 文档体积超出限制
    #[error("Document too large: max {0} bytes")]
    DocumentTooLarge(usize),

    /// 嵌套层级过深
    #[error("Nesting too deep: max {0}")]
    NestingTooDeep(usize),
}

/// BSON 操作的 Result 类型别名
pub type BsonResult<T> = Result<T, BsonError>;
