//! Scalar-valued providers
//!
//! Every document has a string `_id` and a single value field `v`.

use bson::oid::ObjectId;
use bson::spec::BinarySubtype;
use bson::{doc, Binary, Bson, DateTime, Document, Regex, Timestamp};

fn docs<const N: usize>(entries: [(&str, Bson); N]) -> Vec<Document> {
    entries
        .into_iter()
        .map(|(id, v)| doc! { "_id": id, "v": v })
        .collect()
}

pub(crate) fn doubles() -> Vec<Document> {
    docs([
        ("double", Bson::Double(42.13)),
        ("double-whole", Bson::Double(42.0)),
        ("double-zero", Bson::Double(0.0)),
        ("double-negative-zero", Bson::Double(-0.0)),
        ("double-smallest", Bson::Double(f64::from_bits(1))),
        ("double-big", Bson::Double((1_i64 << 61) as f64)),
        ("double-max", Bson::Double(f64::MAX)),
        ("double-nan", Bson::Double(f64::NAN)),
        ("double-1", Bson::Double(4080.1234)),
    ])
}

pub(crate) fn small_doubles() -> Vec<Document> {
    docs([
        ("double", Bson::Double(42.13)),
        ("double-whole", Bson::Double(42.0)),
        ("double-zero", Bson::Double(0.0)),
        ("double-1", Bson::Double(4080.1234)),
        ("double-2", Bson::Double(-1.5)),
    ])
}

pub(crate) fn int32s() -> Vec<Document> {
    docs([
        ("int32", Bson::Int32(42)),
        ("int32-zero", Bson::Int32(0)),
        ("int32-max", Bson::Int32(i32::MAX)),
        ("int32-min", Bson::Int32(i32::MIN)),
        ("int32-1", Bson::Int32(4080)),
        ("int32-2", Bson::Int32(1024)),
    ])
}

pub(crate) fn int64s() -> Vec<Document> {
    docs([
        ("int64", Bson::Int64(42)),
        ("int64-zero", Bson::Int64(0)),
        ("int64-max", Bson::Int64(i64::MAX)),
        ("int64-min", Bson::Int64(i64::MIN)),
        ("int64-1", Bson::Int64(4080)),
        ("int64-big", Bson::Int64(1 << 61)),
    ])
}

pub(crate) fn strings() -> Vec<Document> {
    docs([
        ("string", Bson::String("foo".into())),
        ("string-double", Bson::String("42.13".into())),
        ("string-whole", Bson::String("42".into())),
        ("string-empty", Bson::String(String::new())),
        ("string-duplicate", Bson::String("foo".into())),
    ])
}

pub(crate) fn bools() -> Vec<Document> {
    docs([("bool-false", Bson::Boolean(false)), ("bool-true", Bson::Boolean(true))])
}

pub(crate) fn nulls() -> Vec<Document> {
    docs([("null", Bson::Null)])
}

pub(crate) fn unsets() -> Vec<Document> {
    vec![doc! { "_id": "unset" }]
}

pub(crate) fn object_ids() -> Vec<Document> {
    docs([
        (
            "objectid",
            Bson::ObjectId(ObjectId::from_bytes([
                0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x10, 0x11,
            ])),
        ),
        ("objectid-empty", Bson::ObjectId(ObjectId::from_bytes([0; 12]))),
    ])
}

pub(crate) fn date_times() -> Vec<Document> {
    docs([
        ("datetime", Bson::DateTime(DateTime::from_millis(1_627_378_542_123))),
        ("datetime-epoch", Bson::DateTime(DateTime::from_millis(0))),
        ("datetime-year-min", Bson::DateTime(DateTime::from_millis(-62_135_596_800_000))),
    ])
}

pub(crate) fn timestamps() -> Vec<Document> {
    docs([
        ("timestamp", Bson::Timestamp(Timestamp { time: 42, increment: 13 })),
        ("timestamp-i", Bson::Timestamp(Timestamp { time: 0, increment: 1 })),
    ])
}

pub(crate) fn binaries() -> Vec<Document> {
    docs([
        (
            "binary",
            Bson::Binary(Binary {
                subtype: BinarySubtype::UserDefined(0x80),
                bytes: vec![42, 0, 13],
            }),
        ),
        (
            "binary-empty",
            Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: Vec::new(),
            }),
        ),
    ])
}

pub(crate) fn regexes() -> Vec<Document> {
    docs([
        (
            "regex",
            Bson::RegularExpression(Regex {
                pattern: "foo".into(),
                options: "i".into(),
            }),
        ),
        (
            "regex-empty",
            Bson::RegularExpression(Regex {
                pattern: String::new(),
                options: String::new(),
            }),
        ),
    ])
}

/// One of each scalar kind, keyed by the ids scenarios address most often.
pub(crate) fn scalars() -> Vec<Document> {
    let mut all = Vec::new();
    all.extend(docs([
        ("double", Bson::Double(42.13)),
        ("double-zero", Bson::Double(0.0)),
        ("double-smallest", Bson::Double(f64::from_bits(1))),
        ("double-whole", Bson::Double(42.0)),
        ("string", Bson::String("foo".into())),
        ("string-empty", Bson::String(String::new())),
        ("bool-true", Bson::Boolean(true)),
        ("null", Bson::Null),
        ("int32", Bson::Int32(42)),
        ("int32-zero", Bson::Int32(0)),
        ("int64", Bson::Int64(42)),
        ("int64-zero", Bson::Int64(0)),
    ]));
    all.extend(object_ids().into_iter().take(1));
    all.extend(date_times().into_iter().take(1));
    all.extend(timestamps().into_iter().take(1));
    all.extend(binaries().into_iter().take(1));
    all.extend(regexes().into_iter().take(1));
    all
}
