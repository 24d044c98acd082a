//! 文档投影与缩进打印
//!
//! 仅用于诊断输出，不保证能从文本还原字节。

use crate::decoder::{ElementIter, RawDocument};
use crate::element::{BsonValue, Element};
use crate::spec::MAX_NESTING_DEPTH;
use crate::{BsonError, BsonResult};
use bsonkit_common::CodecConfig;
use indexmap::IndexMap;

/// 将迭代器耗尽为 字段名 -> 元素 的映射
///
/// # Brief
/// BSON 允许重名字段，这里后出现的覆盖先出现的(保留首次出现的位置)，
/// 因此投影是有损的
///
/// # Arguments
/// * `iter` - 新构造的元素迭代器
///
/// # Returns
/// 成功返回映射，遇到解码错误立即返回
pub fn mapped<'a>(iter: ElementIter<'a>) -> BsonResult<IndexMap<&'a str, Element<'a>>> {
    let mut map = IndexMap::new();
    for element in iter {
        let element = element?;
        map.insert(element.name(), element);
    }
    Ok(map)
}

/// 以默认缩进递归渲染文档
pub fn pretty(doc: RawDocument<'_>) -> BsonResult<String> {
    Printer::default().render(doc)
}

/// 缩进打印器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Printer {
    indent: usize,
    max_depth: usize,
}

impl Printer {
    /// 创建打印器
    ///
    /// # Arguments
    /// * `indent` - 每层缩进的空格数
    /// * `max_depth` - 允许的最大嵌套层数，顶层文档计为第 1 层，
    ///   超过 `MAX_NESTING_DEPTH` 时按 `MAX_NESTING_DEPTH` 处理
    pub fn new(indent: usize, max_depth: usize) -> Self {
        Self {
            indent,
            max_depth: max_depth.min(MAX_NESTING_DEPTH),
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new(config.indent_width, config.max_nesting_depth)
    }

    /// 渲染一个文档
    ///
    /// 每次调用都从头构造迭代器，对同一字节重复调用结果相同。
    pub fn render(&self, doc: RawDocument<'_>) -> BsonResult<String> {
        let mut out = String::with_capacity(doc.len() * 2);
        self.write_document(&mut out, doc, false, 0)?;
        Ok(out)
    }

    fn write_document(
        &self,
        out: &mut String,
        doc: RawDocument<'_>,
        array: bool,
        depth: usize,
    ) -> BsonResult<()> {
        if depth >= self.max_depth {
            return Err(BsonError::NestingTooDeep(self.max_depth));
        }
        let (open, close) = if array { ('[', ']') } else { ('{', '}') };
        out.push(open);
        if doc.is_empty() {
            out.push(close);
            return Ok(());
        }

        out.push('\n');
        for (i, element) in doc.iter().enumerate() {
            let element = element?;
            if i > 0 {
                out.push_str(",\n");
            }
            self.pad(out, depth + 1);
            if !array {
                out.push_str(&format!("{:?}: ", element.name()));
            }
            self.write_value(out, element.value(), depth + 1)?;
        }
        out.push('\n');
        self.pad(out, depth);
        out.push(close);
        Ok(())
    }

    fn write_value(&self, out: &mut String, value: &BsonValue<'_>, depth: usize) -> BsonResult<()> {
        match value {
            BsonValue::Document(doc) => self.write_document(out, *doc, false, depth),
            BsonValue::Array(doc) => self.write_document(out, *doc, true, depth),
            BsonValue::JavaScriptWithScope(js) => {
                out.push_str(&format!("CodeWithScope({:?}, ", js.code));
                self.write_document(out, js.scope, false, depth)?;
                out.push(')');
                Ok(())
            }
            leaf => {
                out.push_str(&leaf.to_string());
                Ok(())
            }
        }
    }

    fn pad(&self, out: &mut String, depth: usize) {
        out.extend(std::iter::repeat(' ').take(depth * self.indent));
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new(2, MAX_NESTING_DEPTH)
    }
}
