//! Array, document and mixed-type providers

use bson::{doc, Bson, Document};

pub(crate) fn array_documents() -> Vec<Document> {
    vec![
        doc! {
            "_id": "array-documents",
            "v": [{ "field": 42 }, { "field": 44 }]
        },
        doc! {
            "_id": "array-documents-nested",
            "v": [{ "foo": [{ "bar": "hello" }, { "bar": "world" }] }]
        },
        doc! {
            "_id": "array-documents-nested-duplicate",
            "v": [{ "foo": [{ "bar": "hello" }, { "bar": "world" }] }]
        },
        doc! {
            "_id": "array-two-documents",
            "v": [{ "field": 1 }, { "field": 2 }]
        },
    ]
}

pub(crate) fn array_and_documents() -> Vec<Document> {
    vec![
        doc! {
            "_id": "array-documents-two-fields",
            "v": [{ "field": 42, "foo": "bar" }, { "field": 44, "foo": "baz" }]
        },
        doc! {
            "_id": "document",
            "v": { "foo": 42 }
        },
        doc! {
            "_id": "array-int32",
            "v": [42, 43]
        },
    ]
}

pub(crate) fn composites() -> Vec<Document> {
    vec![
        doc! { "_id": "document", "v": { "foo": 42 } },
        doc! {
            "_id": "document-composite",
            "v": { "foo": 42, "42": "foo", "array": [42, "foo", Bson::Null] },
        },
        doc! { "_id": "document-empty", "v": {} },
        doc! { "_id": "array", "v": [42] },
        doc! { "_id": "array-two", "v": [42, "foo"] },
        doc! { "_id": "array-three", "v": [42, "foo", Bson::Null] },
        doc! { "_id": "array-empty", "v": [] },
        doc! { "_id": "array-embedded", "v": [[42, "foo"], []] },
    ]
}

/// The same field holding a different type in every document.
pub(crate) fn mixed() -> Vec<Document> {
    vec![
        doc! { "_id": "null", "v": Bson::Null },
        doc! { "_id": "unset" },
        doc! { "_id": "empty-array", "v": [] },
        doc! { "_id": "array-null", "v": [Bson::Null] },
        doc! { "_id": "array-empty-nested", "v": [[]] },
        doc! { "_id": "int32", "v": 42 },
        doc! { "_id": "int64", "v": 42_i64 },
        doc! { "_id": "double", "v": 42.13 },
        doc! { "_id": "string", "v": "foo" },
    ]
}
