//! 文档统计
//!
//! 递归进入嵌入文档、数组与代码作用域，按元素类型计数。

use bsonkit::spec::MAX_NESTING_DEPTH;
use bsonkit::{BsonError, BsonResult, BsonValue, RawDocument};
use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub documents: usize,
    pub bytes: usize,
    pub elements: usize,
    /// 类型名 -> 出现次数，按首次出现排序
    pub by_type: IndexMap<&'static str, usize>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累计一个顶层文档
    ///
    /// # Arguments
    /// * `doc` - 顶层文档
    /// * `max_depth` - 允许的最大嵌套层数，不超过 `MAX_NESTING_DEPTH`
    pub fn add_document(&mut self, doc: RawDocument<'_>, max_depth: usize) -> BsonResult<()> {
        self.documents += 1;
        self.bytes += doc.len();
        self.walk(doc, 0, max_depth.min(MAX_NESTING_DEPTH))
    }

    fn walk(&mut self, doc: RawDocument<'_>, depth: usize, max_depth: usize) -> BsonResult<()> {
        if depth >= max_depth {
            return Err(BsonError::NestingTooDeep(max_depth));
        }
        for element in doc.iter() {
            let element = element?;
            self.elements += 1;
            *self.by_type.entry(element.element_type().name()).or_insert(0) += 1;
            match element.value() {
                BsonValue::Document(sub) | BsonValue::Array(sub) => {
                    self.walk(*sub, depth + 1, max_depth)?
                }
                BsonValue::JavaScriptWithScope(js) => self.walk(js.scope, depth + 1, max_depth)?,
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsonkit::{DocumentBuilder, Element};

    #[test]
    fn test_counts_recurse() {
        let mut inner = DocumentBuilder::new();
        inner.append(Element::int32("0", 1)).unwrap();
        inner.append(Element::int32("1", 2)).unwrap();
        let inner = inner.finish();

        let mut doc = DocumentBuilder::new();
        doc.append(Element::string("name", "a")).unwrap();
        doc.append(Element::array("list", RawDocument::new(&inner).unwrap()))
            .unwrap();
        let bytes = doc.finish();

        let mut stats = Stats::new();
        stats
            .add_document(RawDocument::new(&bytes).unwrap(), 10)
            .unwrap();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.bytes, bytes.len());
        assert_eq!(stats.elements, 4);
        assert_eq!(stats.by_type["int32"], 2);
        assert_eq!(stats.by_type["array"], 1);
        assert_eq!(
            stats.by_type.keys().copied().collect::<Vec<_>>(),
            vec!["string", "array", "int32"]
        );

        let err = Stats::new()
            .add_document(RawDocument::new(&bytes).unwrap(), 1)
            .unwrap_err();
        assert_eq!(err, BsonError::NestingTooDeep(1));
    }

    #[test]
    fn test_oversized_depth_is_capped() {
        let mut bytes = DocumentBuilder::new().finish().to_vec();
        for _ in 0..MAX_NESTING_DEPTH + 50 {
            let mut outer = DocumentBuilder::new();
            outer
                .append(Element::document("d", RawDocument::new(&bytes).unwrap()))
                .unwrap();
            bytes = outer.finish().to_vec();
        }
        let err = Stats::new()
            .add_document(RawDocument::new(&bytes).unwrap(), usize::MAX)
            .unwrap_err();
        assert_eq!(err, BsonError::NestingTooDeep(MAX_NESTING_DEPTH));
    }
}
