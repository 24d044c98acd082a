//! BSON 惰性解码模块
//!
//! `ElementIter` 是一个只进、单次遍历的状态机:
//!
//! 1. 起始: 记录起始位置，读取 4 字节文档长度(含长度字段与结尾 NUL)
//! 2. 判定: 当 `(当前位置 - 起始位置 + 1) < 文档长度` 时还有下一个元素
//! 3. 取值: 读取类型码，按类型解出载荷；嵌入文档/数组只切出字节区间，不递归解码
//! 4. 结束: 结尾 NUL 只参与边界计算，迭代器不会消费它
//!
//! 需要重新遍历时，对同一字节区间重新构造迭代器即可。

use crate::buffer::ReadBuffer;
use crate::element::{Binary, BsonValue, DbPointer, Element, JavaScriptWithScope, Regex};
use crate::spec::{BinarySubtype, ElementType, MIN_DOCUMENT_SIZE, OBJECT_ID_LEN};
use crate::{BsonError, BsonResult};
use bsonkit_common::ObjectId;
use indexmap::IndexMap;
use std::fmt;
use std::iter::FusedIterator;
use tracing::{debug, trace};

/// 已校验的文档字节区间
///
/// 借用父缓冲区，不做拷贝；父缓冲区在其生命周期内保持不可变。
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawDocument<'a> {
    data: &'a [u8],
}

impl<'a> RawDocument<'a> {
    /// 校验并包装一段完整的文档字节
    ///
    /// # Brief
    /// 检查长度前缀与切片长度一致、不小于 5 字节且以 NUL 结尾
    ///
    /// # Arguments
    /// * `data` - 恰好一个文档的字节
    ///
    /// # Returns
    /// 成功返回 RawDocument，格式不符返回错误
    pub fn new(data: &'a [u8]) -> BsonResult<Self> {
        if data.len() < MIN_DOCUMENT_SIZE {
            return Err(BsonError::BufferUnderrun {
                need: MIN_DOCUMENT_SIZE,
                have: data.len(),
            });
        }
        let size = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if size < MIN_DOCUMENT_SIZE as i32 {
            return Err(BsonError::InvalidDocument(format!(
                "document size {} is below the minimum",
                size
            )));
        }
        if size as usize != data.len() {
            return Err(BsonError::InvalidDocument(format!(
                "length prefix {} does not match {} bytes",
                size,
                data.len()
            )));
        }
        if data[data.len() - 1] != 0 {
            return Err(BsonError::InvalidDocument(
                "document is not NUL-terminated".to_string(),
            ));
        }
        Ok(Self { data })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 不含任何元素的文档 (5 字节)
    pub fn is_empty(&self) -> bool {
        self.data.len() == MIN_DOCUMENT_SIZE
    }

    /// 构造一个全新的元素迭代器
    pub fn iter(&self) -> ElementIter<'a> {
        ElementIter {
            buf: ReadBuffer::from_parts(self.data, 4),
            start: 0,
            size: self.data.len(),
            failed: false,
        }
    }

    /// 按字段名查找第一个匹配的元素
    pub fn get(&self, name: &str) -> BsonResult<Option<Element<'a>>> {
        for element in self.iter() {
            let element = element?;
            if element.name() == name {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// 投影为字段名到元素的映射，重名字段后者覆盖前者
    pub fn mapped(&self) -> BsonResult<IndexMap<&'a str, Element<'a>>> {
        crate::pretty::mapped(self.iter())
    }
}

impl fmt::Debug for RawDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDocument")
            .field("len", &self.data.len())
            .field("data", &hex::encode(self.data))
            .finish()
    }
}

impl<'a> IntoIterator for RawDocument<'a> {
    type Item = BsonResult<Element<'a>>;
    type IntoIter = ElementIter<'a>;

    fn into_iter(self) -> ElementIter<'a> {
        self.iter()
    }
}

/// 惰性元素迭代器
///
/// 每次调用只解出一个元素。遇到错误后迭代器熔断，不再产出元素。
#[derive(Debug, Clone)]
pub struct ElementIter<'a> {
    buf: ReadBuffer<'a>,
    start: usize,
    size: usize,
    failed: bool,
}

impl<'a> ElementIter<'a> {
    /// 在缓冲区当前位置开始一个文档
    ///
    /// # Brief
    /// 记录起始位置并读取文档长度；缓冲区可以在文档之后还有其他数据
    ///
    /// # Arguments
    /// * `buf` - 游标位于文档起点的读缓冲区
    ///
    /// # Returns
    /// 成功返回迭代器；长度非法、数据不足或缺少结尾 NUL 时返回错误
    pub fn new(mut buf: ReadBuffer<'a>) -> BsonResult<Self> {
        let start = buf.position();
        let size = buf.read_i32_le()?;
        if size < MIN_DOCUMENT_SIZE as i32 {
            return Err(BsonError::InvalidDocument(format!(
                "document size {} at offset {} is below the minimum",
                size, start
            )));
        }
        let size = size as usize;
        let have = buf.len() - start;
        if size > have {
            return Err(BsonError::BufferUnderrun { need: size, have });
        }
        if buf.as_slice()[start + size - 1] != 0 {
            return Err(BsonError::InvalidDocument(format!(
                "document at offset {} is not NUL-terminated",
                start
            )));
        }
        Ok(Self {
            buf,
            start,
            size,
            failed: false,
        })
    }

    /// 是否还有下一个元素
    ///
    /// 结尾 NUL 计入文档长度但不参与迭代，故有 `+ 1`。
    pub fn has_next(&self) -> bool {
        !self.failed && (self.buf.position() - self.start + 1) < self.size
    }

    /// 当前读游标在底层缓冲区中的绝对位置
    pub fn position(&self) -> usize {
        self.buf.position()
    }

    pub fn start_position(&self) -> usize {
        self.start
    }

    pub fn document_size(&self) -> usize {
        self.size
    }

    /// 交还底层缓冲区
    ///
    /// 遍历结束后游标停在结尾 NUL 上，继续读取同一缓冲区中的后续文档前
    /// 需要先跳过这 1 个字节。
    pub fn into_buffer(self) -> ReadBuffer<'a> {
        self.buf
    }

    /// 解出下一个元素
    pub fn next_element(&mut self) -> BsonResult<Element<'a>> {
        if !self.has_next() {
            return Err(BsonError::InvalidDocument(
                "no more elements in document".to_string(),
            ));
        }
        let offset = self.buf.position();
        match self.decode_element() {
            Ok(element) => {
                trace!(offset, name = element.name(), kind = element.element_type().name(), "element");
                Ok(element)
            }
            Err(e) => {
                debug!(offset, error = %e, "element decode failed");
                self.failed = true;
                Err(e)
            }
        }
    }

    fn decode_element(&mut self) -> BsonResult<Element<'a>> {
        let offset = self.buf.position();
        let code = self.buf.read_u8()?;
        if code == 0 {
            return Err(BsonError::InvalidDocument(format!(
                "unexpected terminator at offset {}",
                offset
            )));
        }
        let element_type = ElementType::from_u8(code).ok_or(BsonError::UnknownElementType(code))?;
        let name = self.buf.read_cstr()?;
        let value = self.decode_value(element_type)?;

        // 结尾 NUL 之前必须结束
        let boundary = self.start + self.size - 1;
        if self.buf.position() > boundary {
            return Err(BsonError::InvalidDocument(format!(
                "element {:?} at offset {} overruns the document",
                name, offset
            )));
        }
        Ok(Element::new(name, value))
    }

    fn decode_value(&mut self, element_type: ElementType) -> BsonResult<BsonValue<'a>> {
        let value = match element_type {
            ElementType::Double => BsonValue::Double(self.buf.read_f64_le()?),
            ElementType::String => BsonValue::String(self.buf.read_string()?),
            ElementType::Document => BsonValue::Document(self.read_embedded()?),
            ElementType::Array => BsonValue::Array(self.read_embedded()?),
            ElementType::Binary => BsonValue::Binary(self.read_binary()?),
            ElementType::Undefined => BsonValue::Undefined,
            ElementType::ObjectId => BsonValue::ObjectId(self.read_object_id()?),
            ElementType::Boolean => {
                let offset = self.buf.position();
                match self.buf.read_u8()? {
                    0 => BsonValue::Boolean(false),
                    1 => BsonValue::Boolean(true),
                    b => {
                        return Err(BsonError::InvalidDocument(format!(
                            "invalid boolean byte 0x{:02X} at offset {}",
                            b, offset
                        )))
                    }
                }
            }
            ElementType::DateTime => BsonValue::DateTime(self.buf.read_i64_le()?),
            ElementType::Null => BsonValue::Null,
            ElementType::Regex => {
                let pattern = self.buf.read_cstr()?;
                let flags = self.buf.read_cstr()?;
                BsonValue::Regex(Regex { pattern, flags })
            }
            ElementType::DbPointer => {
                let namespace = self.buf.read_string()?;
                let id = self.read_object_id()?;
                BsonValue::DbPointer(DbPointer { namespace, id })
            }
            ElementType::JavaScript => BsonValue::JavaScript(self.buf.read_string()?),
            ElementType::Symbol => BsonValue::Symbol(self.buf.read_string()?),
            ElementType::JavaScriptWithScope => {
                let offset = self.buf.position();
                let total = self.buf.read_i32_le()?;
                let code = self.buf.read_string()?;
                let scope = self.read_embedded()?;
                let consumed = self.buf.position() - offset;
                if total < 0 || total as usize != consumed {
                    return Err(BsonError::InvalidDocument(format!(
                        "code with scope at offset {} declares {} bytes but spans {}",
                        offset, total, consumed
                    )));
                }
                BsonValue::JavaScriptWithScope(JavaScriptWithScope { code, scope })
            }
            ElementType::Int32 => BsonValue::Int32(self.buf.read_i32_le()?),
            ElementType::Timestamp => BsonValue::Timestamp(self.buf.read_u64_le()?),
            ElementType::Int64 => BsonValue::Int64(self.buf.read_i64_le()?),
            ElementType::MinKey => BsonValue::MinKey,
            ElementType::MaxKey => BsonValue::MaxKey,
        };
        Ok(value)
    }

    /// 嵌入文档: 先窥视长度(不消费)，再整体切出，长度字段包含在切片内
    fn read_embedded(&mut self) -> BsonResult<RawDocument<'a>> {
        read_document(&mut self.buf)
    }

    fn read_binary(&mut self) -> BsonResult<Binary<'a>> {
        let offset = self.buf.position();
        let len = self.buf.read_i32_le()?;
        if len < 0 {
            return Err(BsonError::InvalidDocument(format!(
                "negative binary length {} at offset {}",
                len, offset
            )));
        }
        let code = self.buf.read_u8()?;
        let subtype = BinarySubtype::from_u8(code).ok_or(BsonError::UnsupportedSubtype(code))?;
        let bytes = self.buf.read_bytes(len as usize)?;
        Ok(Binary { subtype, bytes })
    }

    fn read_object_id(&mut self) -> BsonResult<ObjectId> {
        let bytes: [u8; OBJECT_ID_LEN] = self.buf.read_array()?;
        Ok(ObjectId::from_bytes(bytes))
    }
}

impl<'a> Iterator for ElementIter<'a> {
    type Item = BsonResult<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        Some(self.next_element())
    }
}

impl FusedIterator for ElementIter<'_> {}

/// 从缓冲区读取一个完整文档
///
/// # Brief
/// 窥视长度字段后整体切出文档字节，并将游标移过其结尾 NUL
///
/// # Arguments
/// * `buf` - 游标位于文档起点的读缓冲区
///
/// # Returns
/// 成功返回借用的 RawDocument；失败时游标不移动
pub fn read_document<'a>(buf: &mut ReadBuffer<'a>) -> BsonResult<RawDocument<'a>> {
    let offset = buf.position();
    let size = buf.peek_i32_le()?;
    if size < MIN_DOCUMENT_SIZE as i32 {
        return Err(BsonError::InvalidDocument(format!(
            "document size {} at offset {} is below the minimum",
            size, offset
        )));
    }
    let bytes = buf.slice(offset, size as usize)?;
    let doc = RawDocument::new(bytes)?;
    buf.set_position(offset + bytes.len())?;
    Ok(doc)
}

/// 连续文档流
///
/// 遍历同一缓冲区中首尾相接的多个文档(例如导出文件)。
#[derive(Debug, Clone)]
pub struct DocumentStream<'a> {
    buf: ReadBuffer<'a>,
    index: usize,
    failed: bool,
}

impl<'a> DocumentStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buf: ReadBuffer::new(data),
            index: 0,
            failed: false,
        }
    }

    /// 下一个文档的序号(从 0 开始)
    pub fn index(&self) -> usize {
        self.index
    }

    /// 下一个文档在缓冲区中的偏移
    pub fn offset(&self) -> usize {
        self.buf.position()
    }
}

impl<'a> Iterator for DocumentStream<'a> {
    type Item = BsonResult<RawDocument<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buf.remaining() == 0 {
            return None;
        }
        let offset = self.buf.position();
        match read_document(&mut self.buf) {
            Ok(doc) => {
                debug!(index = self.index, offset, size = doc.len(), "document");
                self.index += 1;
                Some(Ok(doc))
            }
            Err(e) => {
                debug!(index = self.index, offset, error = %e, "document read failed");
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for DocumentStream<'_> {}
