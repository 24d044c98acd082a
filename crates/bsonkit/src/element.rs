//! BSON 元素模型
//!
//! 元素是 (类型码, 字段名, 载荷) 三元组。类型码由 `BsonValue` 的变体决定，
//! 不能单独设置，因此类型码与载荷不会不一致。
//! 所有字符串与字节载荷都以借用形式存在，解码时零拷贝。

use crate::decoder::RawDocument;
use crate::spec::{BinarySubtype, ElementType};
use bsonkit_common::ObjectId;
use std::fmt;

/// 二进制载荷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binary<'a> {
    pub subtype: BinarySubtype,
    pub bytes: &'a [u8],
}

/// 正则表达式载荷，模式与选项均为 C 字符串
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regex<'a> {
    pub pattern: &'a str,
    pub flags: &'a str,
}

/// DBPointer 载荷 (已废弃的 BSON 类型)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbPointer<'a> {
    pub namespace: &'a str,
    pub id: ObjectId,
}

/// 带作用域的 JavaScript 代码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JavaScriptWithScope<'a> {
    pub code: &'a str,
    pub scope: RawDocument<'a>,
}

/// BSON 载荷的枚举类型
///
/// 每个变体对应一个 BSON 线上类型码。嵌入文档与数组以未解码的字节区间表示，
/// 需要时再对其构造子迭代器。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BsonValue<'a> {
    Double(f64),
    String(&'a str),
    Document(RawDocument<'a>),
    /// 线上形状与 Document 相同，数组语义只是键名约定 ("0", "1", ...)
    Array(RawDocument<'a>),
    Binary(Binary<'a>),
    Undefined,
    ObjectId(ObjectId),
    Boolean(bool),
    /// 自 Unix 纪元起的毫秒数
    DateTime(i64),
    Null,
    Regex(Regex<'a>),
    DbPointer(DbPointer<'a>),
    JavaScript(&'a str),
    Symbol(&'a str),
    JavaScriptWithScope(JavaScriptWithScope<'a>),
    Int32(i32),
    /// 高 32 位为秒，低 32 位为递增序号
    Timestamp(u64),
    Int64(i64),
    MinKey,
    MaxKey,
}

impl<'a> BsonValue<'a> {
    pub fn element_type(&self) -> ElementType {
        match self {
            BsonValue::Double(_) => ElementType::Double,
            BsonValue::String(_) => ElementType::String,
            BsonValue::Document(_) => ElementType::Document,
            BsonValue::Array(_) => ElementType::Array,
            BsonValue::Binary(_) => ElementType::Binary,
            BsonValue::Undefined => ElementType::Undefined,
            BsonValue::ObjectId(_) => ElementType::ObjectId,
            BsonValue::Boolean(_) => ElementType::Boolean,
            BsonValue::DateTime(_) => ElementType::DateTime,
            BsonValue::Null => ElementType::Null,
            BsonValue::Regex(_) => ElementType::Regex,
            BsonValue::DbPointer(_) => ElementType::DbPointer,
            BsonValue::JavaScript(_) => ElementType::JavaScript,
            BsonValue::Symbol(_) => ElementType::Symbol,
            BsonValue::JavaScriptWithScope(_) => ElementType::JavaScriptWithScope,
            BsonValue::Int32(_) => ElementType::Int32,
            BsonValue::Timestamp(_) => ElementType::Timestamp,
            BsonValue::Int64(_) => ElementType::Int64,
            BsonValue::MinKey => ElementType::MinKey,
            BsonValue::MaxKey => ElementType::MaxKey,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            BsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            BsonValue::Int32(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BsonValue::Int32(n) => Some(*n as i64),
            BsonValue::Int64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BsonValue::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BsonValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// 嵌入文档或数组的字节区间
    pub fn as_document(&self) -> Option<RawDocument<'a>> {
        match self {
            BsonValue::Document(doc) | BsonValue::Array(doc) => Some(*doc),
            _ => None,
        }
    }

    /// 拆分 Timestamp 为 (秒, 递增序号)
    pub fn timestamp_parts(&self) -> Option<(u32, u32)> {
        match self {
            BsonValue::Timestamp(ts) => Some(((ts >> 32) as u32, *ts as u32)),
            _ => None,
        }
    }
}

/// 单个叶子值的文本表示
///
/// 嵌套的文档与数组只显示大小，递归渲染见 `pretty` 模块。
impl fmt::Display for BsonValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BsonValue::Double(n) => write!(f, "{:?}", n),
            BsonValue::String(s) => write!(f, "{:?}", s),
            BsonValue::Document(doc) => write!(f, "Document({} bytes)", doc.len()),
            BsonValue::Array(doc) => write!(f, "Array({} bytes)", doc.len()),
            BsonValue::Binary(b) => {
                write!(f, "Binary(0x{:02x}, {})", b.subtype.code(), hex::encode(b.bytes))
            }
            BsonValue::Undefined => write!(f, "undefined"),
            BsonValue::ObjectId(id) => write!(f, "ObjectId(\"{}\")", id),
            BsonValue::Boolean(b) => write!(f, "{}", b),
            BsonValue::DateTime(ms) => write!(f, "DateTime({})", ms),
            BsonValue::Null => write!(f, "null"),
            BsonValue::Regex(r) => write!(f, "/{}/{}", r.pattern, r.flags),
            BsonValue::DbPointer(p) => write!(f, "DBPointer({:?}, \"{}\")", p.namespace, p.id),
            BsonValue::JavaScript(code) => write!(f, "Code({:?})", code),
            BsonValue::Symbol(s) => write!(f, "Symbol({:?})", s),
            BsonValue::JavaScriptWithScope(js) => {
                write!(f, "CodeWithScope({:?}, {} bytes)", js.code, js.scope.len())
            }
            BsonValue::Int32(n) => write!(f, "{}", n),
            BsonValue::Timestamp(ts) => write!(f, "Timestamp({}, {})", ts >> 32, ts & 0xFFFF_FFFF),
            BsonValue::Int64(n) => write!(f, "NumberLong({})", n),
            BsonValue::MinKey => write!(f, "MinKey"),
            BsonValue::MaxKey => write!(f, "MaxKey"),
        }
    }
}

/// BSON 元素: 字段名 + 载荷
///
/// 元素是不可变的值对象，构造后只会被写入一次或交给调用方。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element<'a> {
    name: &'a str,
    value: BsonValue<'a>,
}

impl<'a> Element<'a> {
    pub fn new(name: &'a str, value: BsonValue<'a>) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn value(&self) -> &BsonValue<'a> {
        &self.value
    }

    pub fn into_value(self) -> BsonValue<'a> {
        self.value
    }

    pub fn element_type(&self) -> ElementType {
        self.value.element_type()
    }

    pub fn double(name: &'a str, v: f64) -> Self {
        Self::new(name, BsonValue::Double(v))
    }

    pub fn string(name: &'a str, v: &'a str) -> Self {
        Self::new(name, BsonValue::String(v))
    }

    pub fn document(name: &'a str, doc: RawDocument<'a>) -> Self {
        Self::new(name, BsonValue::Document(doc))
    }

    pub fn array(name: &'a str, doc: RawDocument<'a>) -> Self {
        Self::new(name, BsonValue::Array(doc))
    }

    pub fn binary(name: &'a str, subtype: BinarySubtype, bytes: &'a [u8]) -> Self {
        Self::new(name, BsonValue::Binary(Binary { subtype, bytes }))
    }

    pub fn undefined(name: &'a str) -> Self {
        Self::new(name, BsonValue::Undefined)
    }

    pub fn object_id(name: &'a str, id: ObjectId) -> Self {
        Self::new(name, BsonValue::ObjectId(id))
    }

    pub fn boolean(name: &'a str, v: bool) -> Self {
        Self::new(name, BsonValue::Boolean(v))
    }

    pub fn datetime(name: &'a str, millis: i64) -> Self {
        Self::new(name, BsonValue::DateTime(millis))
    }

    pub fn null(name: &'a str) -> Self {
        Self::new(name, BsonValue::Null)
    }

    pub fn regex(name: &'a str, pattern: &'a str, flags: &'a str) -> Self {
        Self::new(name, BsonValue::Regex(Regex { pattern, flags }))
    }

    pub fn db_pointer(name: &'a str, namespace: &'a str, id: ObjectId) -> Self {
        Self::new(name, BsonValue::DbPointer(DbPointer { namespace, id }))
    }

    pub fn javascript(name: &'a str, code: &'a str) -> Self {
        Self::new(name, BsonValue::JavaScript(code))
    }

    pub fn symbol(name: &'a str, symbol: &'a str) -> Self {
        Self::new(name, BsonValue::Symbol(symbol))
    }

    pub fn javascript_with_scope(name: &'a str, code: &'a str, scope: RawDocument<'a>) -> Self {
        Self::new(
            name,
            BsonValue::JavaScriptWithScope(JavaScriptWithScope { code, scope }),
        )
    }

    pub fn int32(name: &'a str, v: i32) -> Self {
        Self::new(name, BsonValue::Int32(v))
    }

    pub fn timestamp(name: &'a str, v: u64) -> Self {
        Self::new(name, BsonValue::Timestamp(v))
    }

    pub fn int64(name: &'a str, v: i64) -> Self {
        Self::new(name, BsonValue::Int64(v))
    }

    pub fn min_key(name: &'a str) -> Self {
        Self::new(name, BsonValue::MinKey)
    }

    pub fn max_key(name: &'a str) -> Self {
        Self::new(name, BsonValue::MaxKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_follows_variant() {
        assert_eq!(Element::double("a", 1.0).element_type() as u8, 0x01);
        assert_eq!(Element::min_key("a").element_type() as u8, 0xFF);
        assert_eq!(Element::max_key("a").element_type() as u8, 0x7F);
        assert_eq!(Element::int64("a", 1).element_type(), ElementType::Int64);
        assert_eq!(
            Element::binary("a", BinarySubtype::Md5, &[1]).element_type(),
            ElementType::Binary
        );
    }

    #[test]
    fn test_accessors() {
        let e = Element::int32("n", 7);
        assert_eq!(e.name(), "n");
        assert_eq!(e.value().as_i32(), Some(7));
        assert_eq!(e.value().as_i64(), Some(7));
        assert_eq!(e.value().as_str(), None);

        let ts = Element::timestamp("t", (5u64 << 32) | 9);
        assert_eq!(ts.value().timestamp_parts(), Some((5, 9)));
    }

    #[test]
    fn test_display_leaf_values() {
        assert_eq!(BsonValue::Double(1.0).to_string(), "1.0");
        assert_eq!(BsonValue::String("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(BsonValue::Int64(3).to_string(), "NumberLong(3)");
        assert_eq!(
            BsonValue::Regex(Regex { pattern: "^a", flags: "i" }).to_string(),
            "/^a/i"
        );
        assert_eq!(
            BsonValue::Binary(Binary { subtype: BinarySubtype::Uuid, bytes: &[0xAB] }).to_string(),
            "Binary(0x03, ab)"
        );
    }
}
