//! BSON 到 JSON 的转换模块
//!
//! 输出 MongoDB 宽松扩展 JSON (Relaxed Extended JSON v2)。JSON 无法直接表达的
//! 类型使用 `$` 前缀的包装对象:
//!
//! - ObjectId: `{"$oid": "507f1f77bcf86cd799439011"}`
//! - DateTime: `{"$date": "2023-11-14T22:13:20.000Z"}`，超出 1970-9999 年时为
//!   `{"$date": {"$numberLong": "..."}}`
//! - Binary: `{"$binary": {"base64": "...", "subType": "00"}}`
//! - Regex: `{"$regularExpression": {"pattern": "...", "options": "..."}}`
//! - Timestamp: `{"$timestamp": {"t": 1, "i": 2}}`
//!
//! 字段顺序与文档中的元素顺序一致。

use crate::decoder::RawDocument;
use crate::element::BsonValue;
use crate::spec::MAX_NESTING_DEPTH;
use crate::{BsonError, BsonResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Datelike, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Map, Number, Value as JsonValue};

/// 将文档转换为宽松扩展 JSON
///
/// # Brief
/// 递归展开嵌入文档、数组与代码作用域
///
/// # Arguments
/// * `doc` - 要转换的文档
///
/// # Returns
/// 成功返回 JSON 对象，解码失败或嵌套过深返回错误
pub fn to_relaxed_json(doc: RawDocument<'_>) -> BsonResult<JsonValue> {
    to_relaxed_json_with_depth(doc, MAX_NESTING_DEPTH)
}

/// 以指定的最大嵌套层数转换，`max_depth` 不会超过 `MAX_NESTING_DEPTH`
pub fn to_relaxed_json_with_depth(
    doc: RawDocument<'_>,
    max_depth: usize,
) -> BsonResult<JsonValue> {
    document_to_json(doc, 0, max_depth.min(MAX_NESTING_DEPTH))
}

/// 将单个值转换为宽松扩展 JSON
pub fn value_to_json(value: &BsonValue<'_>) -> BsonResult<JsonValue> {
    convert(value, 0, MAX_NESTING_DEPTH)
}

fn document_to_json(doc: RawDocument<'_>, depth: usize, max_depth: usize) -> BsonResult<JsonValue> {
    if depth >= max_depth {
        return Err(BsonError::NestingTooDeep(max_depth));
    }
    let mut map = Map::new();
    for element in doc.iter() {
        let element = element?;
        map.insert(element.name().to_string(), convert(element.value(), depth + 1, max_depth)?);
    }
    Ok(JsonValue::Object(map))
}

fn array_to_json(doc: RawDocument<'_>, depth: usize, max_depth: usize) -> BsonResult<JsonValue> {
    if depth >= max_depth {
        return Err(BsonError::NestingTooDeep(max_depth));
    }
    let mut items = Vec::new();
    for element in doc.iter() {
        items.push(convert(element?.value(), depth + 1, max_depth)?);
    }
    Ok(JsonValue::Array(items))
}

fn convert(value: &BsonValue<'_>, depth: usize, max_depth: usize) -> BsonResult<JsonValue> {
    let json = match value {
        BsonValue::Double(f) => double_to_json(*f),
        BsonValue::String(s) => JsonValue::String(s.to_string()),
        BsonValue::Document(doc) => document_to_json(*doc, depth, max_depth)?,
        BsonValue::Array(doc) => array_to_json(*doc, depth, max_depth)?,
        BsonValue::Binary(b) => json!({
            "$binary": {
                "base64": STANDARD.encode(b.bytes),
                "subType": format!("{:02x}", b.subtype.code()),
            }
        }),
        BsonValue::Undefined => json!({ "$undefined": true }),
        BsonValue::ObjectId(id) => json!({ "$oid": id.to_hex() }),
        BsonValue::Boolean(b) => JsonValue::Bool(*b),
        BsonValue::DateTime(ms) => datetime_to_json(*ms),
        BsonValue::Null => JsonValue::Null,
        BsonValue::Regex(r) => json!({
            "$regularExpression": { "pattern": r.pattern, "options": r.flags }
        }),
        BsonValue::DbPointer(p) => json!({
            "$dbPointer": { "$ref": p.namespace, "$id": { "$oid": p.id.to_hex() } }
        }),
        BsonValue::JavaScript(code) => json!({ "$code": code }),
        BsonValue::Symbol(s) => json!({ "$symbol": s }),
        BsonValue::JavaScriptWithScope(js) => json!({
            "$code": js.code,
            "$scope": document_to_json(js.scope, depth, max_depth)?,
        }),
        BsonValue::Int32(n) => json!(*n),
        BsonValue::Timestamp(ts) => json!({
            "$timestamp": { "t": (ts >> 32) as u32, "i": *ts as u32 }
        }),
        BsonValue::Int64(n) => json!(*n),
        BsonValue::MinKey => json!({ "$minKey": 1 }),
        BsonValue::MaxKey => json!({ "$maxKey": 1 }),
    };
    Ok(json)
}

fn double_to_json(f: f64) -> JsonValue {
    match Number::from_f64(f) {
        Some(n) => JsonValue::Number(n),
        None => {
            let repr = if f.is_nan() {
                "NaN"
            } else if f.is_sign_positive() {
                "Infinity"
            } else {
                "-Infinity"
            };
            json!({ "$numberDouble": repr })
        }
    }
}

fn datetime_to_json(ms: i64) -> JsonValue {
    if let Some(dt) = Utc.timestamp_millis_opt(ms).single() {
        if (1970..=9999).contains(&dt.year()) {
            return json!({ "$date": dt.to_rfc3339_opts(SecondsFormat::Millis, true) });
        }
    }
    json!({ "$date": { "$numberLong": ms.to_string() } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DocumentBuilder;
    use crate::element::Element;
    use crate::spec::BinarySubtype;
    use crate::ObjectId;
    use bytes::Bytes;

    fn build(elements: &[Element<'_>]) -> Bytes {
        let mut builder = DocumentBuilder::new();
        for element in elements {
            builder.append(*element).unwrap();
        }
        builder.finish()
    }

    /// `levels` 层嵌套的文档，最内层为空
    fn nested(levels: usize) -> Vec<u8> {
        let mut bytes = build(&[]).to_vec();
        for _ in 1..levels {
            let outer = build(&[Element::document("d", RawDocument::new(&bytes).unwrap())]);
            bytes = outer.to_vec();
        }
        bytes
    }

    #[test]
    fn test_scalars() {
        let bytes = build(&[
            Element::int32("i", 7),
            Element::int64("l", -3),
            Element::double("d", 1.5),
            Element::string("s", "x"),
            Element::boolean("b", true),
            Element::null("n"),
        ]);
        let json = to_relaxed_json(RawDocument::new(&bytes).unwrap()).unwrap();
        assert_eq!(
            json,
            json!({ "i": 7, "l": -3, "d": 1.5, "s": "x", "b": true, "n": null })
        );
        // 顺序保持
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["i", "l", "d", "s", "b", "n"]);
    }

    #[test]
    fn test_wrapped_types() {
        let id = ObjectId::from_hex("507f1f77bcf86cd799439011").unwrap();
        let bytes = build(&[
            Element::object_id("id", id),
            Element::binary("bin", BinarySubtype::Uuid, b"hi"),
            Element::regex("re", "^a", "i"),
            Element::timestamp("ts", (1u64 << 32) | 2),
            Element::datetime("date", 0),
            Element::datetime("old", -62_135_596_800_001),
            Element::min_key("min"),
            Element::undefined("u"),
            Element::db_pointer("p", "db.c", id),
        ]);
        let json = to_relaxed_json(RawDocument::new(&bytes).unwrap()).unwrap();
        assert_eq!(json["id"], json!({ "$oid": "507f1f77bcf86cd799439011" }));
        assert_eq!(
            json["bin"],
            json!({ "$binary": { "base64": "aGk=", "subType": "03" } })
        );
        assert_eq!(
            json["re"],
            json!({ "$regularExpression": { "pattern": "^a", "options": "i" } })
        );
        assert_eq!(json["ts"], json!({ "$timestamp": { "t": 1, "i": 2 } }));
        assert_eq!(json["date"], json!({ "$date": "1970-01-01T00:00:00.000Z" }));
        assert_eq!(
            json["old"],
            json!({ "$date": { "$numberLong": "-62135596800001" } })
        );
        assert_eq!(json["min"], json!({ "$minKey": 1 }));
        assert_eq!(json["u"], json!({ "$undefined": true }));
        assert_eq!(json["p"]["$dbPointer"]["$ref"], json!("db.c"));
    }

    #[test]
    fn test_nested_and_scope() {
        let arr = build(&[Element::int32("0", 1), Element::string("1", "two")]);
        let scope = build(&[Element::int32("x", 1)]);
        let bytes = build(&[
            Element::array("arr", RawDocument::new(&arr).unwrap()),
            Element::javascript_with_scope("f", "x", RawDocument::new(&scope).unwrap()),
        ]);
        let json = to_relaxed_json(RawDocument::new(&bytes).unwrap()).unwrap();
        assert_eq!(json["arr"], json!([1, "two"]));
        assert_eq!(json["f"], json!({ "$code": "x", "$scope": { "x": 1 } }));
    }

    #[test]
    fn test_depth_limit() {
        let inner = build(&[]);
        let bytes = build(&[Element::document("d", RawDocument::new(&inner).unwrap())]);
        let doc = RawDocument::new(&bytes).unwrap();

        assert!(to_relaxed_json_with_depth(doc, 2).is_ok());
        assert_eq!(
            to_relaxed_json_with_depth(doc, 1),
            Err(BsonError::NestingTooDeep(1))
        );
        // 超出上限的层数按上限处理
        let deep = nested(MAX_NESTING_DEPTH + 1);
        assert_eq!(
            to_relaxed_json_with_depth(RawDocument::new(&deep).unwrap(), usize::MAX),
            Err(BsonError::NestingTooDeep(MAX_NESTING_DEPTH))
        );
    }

    #[test]
    fn test_non_finite_doubles() {
        assert_eq!(
            value_to_json(&BsonValue::Double(f64::NAN)).unwrap(),
            json!({ "$numberDouble": "NaN" })
        );
        assert_eq!(
            value_to_json(&BsonValue::Double(f64::NEG_INFINITY)).unwrap(),
            json!({ "$numberDouble": "-Infinity" })
        );
    }
}
