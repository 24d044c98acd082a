//! 文档构建器
//!
//! 将一串元素组合为带长度前缀、以 NUL 结尾的文档:
//! `int32 总长 | element* | 0x00`。总长从长度字段起算(含)到结尾 NUL(含)。

use crate::buffer::WriteBuffer;
use crate::element::Element;
use crate::encoder::write_element;
use crate::spec::{MAX_DOCUMENT_SIZE, MIN_DOCUMENT_SIZE};
use crate::{BsonError, BsonResult};
use bsonkit_common::CodecConfig;
use bytes::Bytes;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 256;

/// 单次使用的文档构建器
///
/// `finish` 消耗构建器本身，定稿之后无法再写入。
#[derive(Debug)]
pub struct DocumentBuilder {
    buf: WriteBuffer,
    max_size: usize,
    count: usize,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// 创建构建器
    ///
    /// # Arguments
    /// * `capacity` - 预估字节数，仅为性能提示，缓冲区会按需增长
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_limits(capacity, MAX_DOCUMENT_SIZE)
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::with_limits(config.initial_capacity, config.max_document_size)
    }

    fn with_limits(capacity: usize, max_size: usize) -> Self {
        let mut buf = WriteBuffer::with_capacity(capacity.max(MIN_DOCUMENT_SIZE));
        // 长度占位，finish 时回填
        buf.put_i32_le(0);
        Self {
            buf,
            max_size: max_size.min(i32::MAX as usize),
            count: 0,
        }
    }

    /// 追加一个元素
    ///
    /// # Returns
    /// 成功返回自身以便链式调用；超出大小上限返回 `DocumentTooLarge`
    pub fn append(&mut self, element: Element<'_>) -> BsonResult<&mut Self> {
        let mark = self.buf.len();
        if let Err(e) = write_element(&element, &mut self.buf) {
            self.buf.truncate(mark);
            return Err(e);
        }
        // 预留结尾 NUL
        if self.buf.len() + 1 > self.max_size {
            self.buf.truncate(mark);
            return Err(BsonError::DocumentTooLarge(self.max_size));
        }
        self.count += 1;
        Ok(self)
    }

    /// 当前已写入的字节数(不含结尾 NUL)
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn element_count(&self) -> usize {
        self.count
    }

    /// 定稿文档
    ///
    /// # Brief
    /// 追加结尾 NUL，回填总长度，返回完整文档字节
    pub fn finish(mut self) -> Bytes {
        self.buf.put_u8(0);
        let total = self.buf.len();
        // append 已保证 total <= max_size <= i32::MAX，偏移 0 处恒有 4 字节占位
        let _ = self.buf.patch_i32_le(0, total as i32);
        trace!(elements = self.count, bytes = total, "document finished");
        self.buf.freeze()
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawDocument;

    #[test]
    fn test_empty_document() {
        let bytes = DocumentBuilder::new().finish();
        assert_eq!(&bytes[..], &[5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_length_prefix_matches() {
        let mut builder = DocumentBuilder::with_capacity(1);
        builder
            .append(Element::string("name", "bsonkit"))
            .unwrap()
            .append(Element::int32("n", 3))
            .unwrap();
        assert_eq!(builder.element_count(), 2);
        let bytes = builder.finish();
        let len = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(len as usize, bytes.len());
        assert_eq!(bytes[bytes.len() - 1], 0);
    }

    #[test]
    fn test_nested_document_is_copied_verbatim() {
        let mut inner = DocumentBuilder::new();
        inner.append(Element::boolean("ok", true)).unwrap();
        let inner = inner.finish();

        let mut outer = DocumentBuilder::new();
        outer
            .append(Element::document("inner", RawDocument::new(&inner).unwrap()))
            .unwrap();
        let outer = outer.finish();

        // 4 字节长度 + 类型码 + "inner\0"
        assert_eq!(&outer[11..11 + inner.len()], &inner[..]);
    }

    #[test]
    fn test_size_limit() {
        let config = CodecConfig {
            max_document_size: 16,
            ..CodecConfig::default()
        };
        let mut builder = DocumentBuilder::from_config(&config);
        builder.append(Element::int32("a", 1)).unwrap();
        let err = builder.append(Element::int64("b", 1)).unwrap_err();
        assert_eq!(err, BsonError::DocumentTooLarge(16));
        // 失败的元素被回滚，已写入部分仍可定稿
        let bytes = builder.finish();
        assert_eq!(bytes.len(), 12);
    }
}
