//! BSON 元素编码模块
//!
//! 将单个元素序列化为 `[类型码][C 字符串字段名][载荷]` 追加到写缓冲区。

use crate::buffer::{length_prefix, WriteBuffer};
use crate::element::{BsonValue, Element};
use crate::BsonResult;

/// 编码一个元素
///
/// # Brief
/// 按元素类型写入类型码、字段名与载荷，返回缓冲区以便链式调用
///
/// # Arguments
/// * `element` - 要编码的元素
/// * `buf` - 目标缓冲区
///
/// # Returns
/// 成功返回同一缓冲区；字段名或正则含 NUL 时返回 `InvalidCString`，
/// 载荷长度超出 int32 时返回 `DocumentTooLarge`。出错时缓冲区不变
pub fn write_element<'b>(
    element: &Element<'_>,
    buf: &'b mut WriteBuffer,
) -> BsonResult<&'b mut WriteBuffer> {
    Encoder::new(&mut *buf).encode_element(element)?;
    Ok(buf)
}

struct Encoder<'b> {
    buf: &'b mut WriteBuffer,
}

impl<'b> Encoder<'b> {
    fn new(buf: &'b mut WriteBuffer) -> Self {
        Self { buf }
    }

    fn encode_element(&mut self, element: &Element<'_>) -> BsonResult<()> {
        let value = element.value();
        // 字段名、正则与长度字段先行校验，出错时不留下半个元素
        check_cstr(element.name())?;
        if let BsonValue::Regex(r) = value {
            check_cstr(r.pattern)?;
            check_cstr(r.flags)?;
        }
        check_lengths(value)?;

        self.buf.put_u8(element.element_type() as u8);
        self.buf.put_cstr(element.name())?;
        self.encode_value(value)
    }

    fn encode_value(&mut self, value: &BsonValue<'_>) -> BsonResult<()> {
        match value {
            BsonValue::Double(n) => self.buf.put_f64_le(*n),
            BsonValue::String(s) | BsonValue::JavaScript(s) | BsonValue::Symbol(s) => {
                self.buf.put_string(s)?
            }
            BsonValue::Document(doc) | BsonValue::Array(doc) => {
                self.buf.put_slice(doc.as_bytes())
            }
            BsonValue::Binary(b) => {
                self.buf.put_i32_le(length_prefix(b.bytes.len())?);
                self.buf.put_u8(b.subtype.code());
                self.buf.put_slice(b.bytes);
            }
            BsonValue::ObjectId(id) => self.buf.put_slice(id.as_bytes()),
            BsonValue::Boolean(b) => self.buf.put_u8(*b as u8),
            BsonValue::DateTime(n) | BsonValue::Int64(n) => self.buf.put_i64_le(*n),
            BsonValue::Timestamp(ts) => self.buf.put_u64_le(*ts),
            BsonValue::Int32(n) => self.buf.put_i32_le(*n),
            BsonValue::Regex(r) => {
                self.buf.put_cstr(r.pattern)?;
                self.buf.put_cstr(r.flags)?;
            }
            BsonValue::DbPointer(p) => {
                self.buf.put_string(p.namespace)?;
                self.buf.put_slice(p.id.as_bytes());
            }
            BsonValue::JavaScriptWithScope(js) => {
                self.buf.put_i32_le(length_prefix(scoped_code_len(js.code, js.scope.len()))?);
                self.buf.put_string(js.code)?;
                self.buf.put_slice(js.scope.as_bytes());
            }
            BsonValue::Undefined | BsonValue::Null | BsonValue::MinKey | BsonValue::MaxKey => {}
        }
        Ok(())
    }
}

/// int32 总长 | string 代码 | 作用域文档，总长包含自身 4 字节
fn scoped_code_len(code: &str, scope_len: usize) -> usize {
    4 + 4 + code.len() + 1 + scope_len
}

/// 所有 int32 长度字段都必须放得下
fn check_lengths(value: &BsonValue<'_>) -> BsonResult<()> {
    match value {
        BsonValue::String(s) | BsonValue::JavaScript(s) | BsonValue::Symbol(s) => {
            length_prefix(s.len() + 1)?;
        }
        BsonValue::Binary(b) => {
            length_prefix(b.bytes.len())?;
        }
        BsonValue::DbPointer(p) => {
            length_prefix(p.namespace.len() + 1)?;
        }
        BsonValue::JavaScriptWithScope(js) => {
            length_prefix(scoped_code_len(js.code, js.scope.len()))?;
        }
        _ => {}
    }
    Ok(())
}

fn check_cstr(s: &str) -> BsonResult<()> {
    if s.as_bytes().contains(&0) {
        return Err(crate::BsonError::InvalidCString(format!(
            "{:?} contains an interior NUL",
            s
        )));
    }
    Ok(())
}
