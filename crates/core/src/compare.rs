//! Document, error and sequence comparison
//!
//! ## Equality rules
//!
//! - Different BSON types are NEVER equal: `Int32(43) != Int64(43) != Double(43.0)`
//! - Field order inside a document is ignored, at every nesting level
//! - Array element order is significant
//! - Doubles compare by bit pattern, except that every NaN equals every NaN.
//!   This keeps equality reflexive and tells `-0.0` from `0.0`.
//!
//! Errors compare by structure only (see [`errors_equal`]).

use bson::spec::ElementType;
use bson::{Bson, Document};
use std::fmt;

use crate::error::BackendError;

/// Compare two documents, ignoring field order.
pub fn documents_equal(a: &Document, b: &Document) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(k, v)| b.get(k).map_or(false, |w| values_equal(v, w)))
}

/// Compare two BSON values with the type-strict rules above.
pub fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (a, b) {
        (Bson::Double(x), Bson::Double(y)) => doubles_equal(*x, *y),
        (Bson::Document(x), Bson::Document(y)) => documents_equal(x, y),
        (Bson::Array(x), Bson::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        _ => a.element_type() == b.element_type() && a == b,
    }
}

fn doubles_equal(x: f64, y: f64) -> bool {
    (x.is_nan() && y.is_nan()) || x.to_bits() == y.to_bits()
}

/// Compare two ordered document sequences pointwise.
///
/// Callers sort both sides by `_id` first, so this is order-sensitive.
pub fn sequence_equal(a: &[Document], b: &[Document]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(l, r)| documents_equal(l, r))
}

/// Compare two backend errors structurally.
///
/// Command errors match on `code` and `code_name`; the message text is
/// ignored. Only server command errors can match: two transport, decode or
/// interruption errors are never equal, whatever their cause.
pub fn errors_equal(a: &BackendError, b: &BackendError) -> bool {
    match (a, b) {
        (BackendError::Command(x), BackendError::Command(y)) => {
            x.code == y.code && x.code_name == y.code_name
        }
        _ => false,
    }
}

/// Kind of a single difference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceKind {
    /// Present in expected, absent in actual
    Missing,
    /// Absent in expected, present in actual
    Unexpected,
    /// Same path, different BSON types
    TypeMismatch,
    /// Same path and type, different values
    ValueMismatch,
    /// Arrays or sequences of different length
    LengthMismatch,
}

/// One difference between an expected (compat) and actual (target) value.
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    /// Dotted path (`v.0.field`); sequences use the element index as first segment
    pub path: String,
    /// What kind of difference
    pub kind: DifferenceKind,
    /// Expected value at `path`, if any
    pub expected: Option<Bson>,
    /// Actual value at `path`, if any
    pub actual: Option<Bson>,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        match (&self.expected, &self.actual) {
            (Some(e), Some(a)) => write!(
                f,
                "{}: {:?}: expected {} {}, got {} {}",
                path,
                self.kind,
                type_label(e.element_type()),
                e,
                type_label(a.element_type()),
                a
            ),
            (Some(e), None) => write!(
                f,
                "{}: missing, expected {} {}",
                path,
                type_label(e.element_type()),
                e
            ),
            (None, Some(a)) => {
                write!(f, "{}: unexpected {} {}", path, type_label(a.element_type()), a)
            }
            (None, None) => write!(f, "{}: {:?}", path, self.kind),
        }
    }
}

fn type_label(t: ElementType) -> &'static str {
    match t {
        ElementType::Double => "double",
        ElementType::String => "string",
        ElementType::EmbeddedDocument => "object",
        ElementType::Array => "array",
        ElementType::Binary => "binData",
        ElementType::Undefined => "undefined",
        ElementType::ObjectId => "objectId",
        ElementType::Boolean => "bool",
        ElementType::DateTime => "date",
        ElementType::Null => "null",
        ElementType::RegularExpression => "regex",
        ElementType::DbPointer => "dbPointer",
        ElementType::JavaScriptCode => "javascript",
        ElementType::Symbol => "symbol",
        ElementType::JavaScriptCodeWithScope => "javascriptWithScope",
        ElementType::Int32 => "int",
        ElementType::Timestamp => "timestamp",
        ElementType::Int64 => "long",
        ElementType::Decimal128 => "decimal",
        ElementType::MaxKey => "maxKey",
        ElementType::MinKey => "minKey",
        #[allow(unreachable_patterns)]
        _ => "unknown",
    }
}

/// List every difference between two documents.
///
/// Empty iff [`documents_equal`] holds.
pub fn diff_documents(expected: &Document, actual: &Document) -> Vec<Difference> {
    let mut diffs = Vec::new();
    diff_document_at("", expected, actual, &mut diffs);
    diffs
}

/// List every difference between two document sequences.
pub fn diff_sequences(expected: &[Document], actual: &[Document]) -> Vec<Difference> {
    let mut diffs = Vec::new();
    if expected.len() != actual.len() {
        diffs.push(Difference {
            path: String::new(),
            kind: DifferenceKind::LengthMismatch,
            expected: Some(Bson::Int64(expected.len() as i64)),
            actual: Some(Bson::Int64(actual.len() as i64)),
        });
    }
    for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
        diff_document_at(&i.to_string(), e, a, &mut diffs);
    }
    diffs
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn diff_document_at(
    path: &str,
    expected: &Document,
    actual: &Document,
    diffs: &mut Vec<Difference>,
) {
    for (key, e) in expected {
        let child = join(path, key);
        match actual.get(key) {
            Some(a) => diff_value_at(&child, e, a, diffs),
            None => diffs.push(Difference {
                path: child,
                kind: DifferenceKind::Missing,
                expected: Some(e.clone()),
                actual: None,
            }),
        }
    }
    for (key, a) in actual {
        if !expected.contains_key(key) {
            diffs.push(Difference {
                path: join(path, key),
                kind: DifferenceKind::Unexpected,
                expected: None,
                actual: Some(a.clone()),
            });
        }
    }
}

fn diff_value_at(path: &str, expected: &Bson, actual: &Bson, diffs: &mut Vec<Difference>) {
    match (expected, actual) {
        (Bson::Document(e), Bson::Document(a)) => diff_document_at(path, e, a, diffs),
        (Bson::Array(e), Bson::Array(a)) => {
            if e.len() != a.len() {
                diffs.push(Difference {
                    path: path.to_string(),
                    kind: DifferenceKind::LengthMismatch,
                    expected: Some(expected.clone()),
                    actual: Some(actual.clone()),
                });
                return;
            }
            for (i, (ev, av)) in e.iter().zip(a).enumerate() {
                diff_value_at(&join(path, &i.to_string()), ev, av, diffs);
            }
        }
        _ if expected.element_type() != actual.element_type() => diffs.push(Difference {
            path: path.to_string(),
            kind: DifferenceKind::TypeMismatch,
            expected: Some(expected.clone()),
            actual: Some(actual.clone()),
        }),
        _ if !values_equal(expected, actual) => diffs.push(Difference {
            path: path.to_string(),
            kind: DifferenceKind::ValueMismatch,
            expected: Some(expected.clone()),
            actual: Some(actual.clone()),
        }),
        _ => {}
    }
}

/// Collect the `_id` of every document, `Null` where absent.
pub fn collect_ids(docs: &[Document]) -> Vec<Bson> {
    docs.iter()
        .map(|d| d.get("_id").cloned().unwrap_or(Bson::Null))
        .collect()
}

/// Render ids the way the logs print them: `[a, b, c]`.
pub fn format_ids(ids: &[Bson]) -> String {
    let parts: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};
    use proptest::prelude::*;

    #[test]
    fn test_int32_not_equal_int64() {
        let a = doc! { "v": 43_i32 };
        let b = doc! { "v": 43_i64 };
        assert!(!documents_equal(&a, &b));

        let diffs = diff_documents(&a, &b);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DifferenceKind::TypeMismatch);
        assert_eq!(diffs[0].path, "v");
    }

    #[test]
    fn test_int_not_equal_double() {
        assert!(!values_equal(&Bson::Int32(1), &Bson::Double(1.0)));
        assert!(!values_equal(&Bson::Int64(1), &Bson::Double(1.0)));
    }

    #[test]
    fn test_field_order_ignored() {
        let a = doc! { "_id": "x", "v": { "a": 1, "b": 2 } };
        let b = doc! { "v": { "b": 2, "a": 1 }, "_id": "x" };
        assert!(documents_equal(&a, &b));
        assert!(diff_documents(&a, &b).is_empty());
    }

    #[test]
    fn test_array_order_matters() {
        let a = doc! { "v": [1, 2] };
        let b = doc! { "v": [2, 1] };
        assert!(!documents_equal(&a, &b));
        let diffs = diff_documents(&a, &b);
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].path, "v.0");
    }

    #[test]
    fn test_nan_equals_nan_and_signed_zero_differs() {
        assert!(values_equal(&Bson::Double(f64::NAN), &Bson::Double(f64::NAN)));
        assert!(!values_equal(&Bson::Double(0.0), &Bson::Double(-0.0)));
    }

    #[test]
    fn test_missing_and_unexpected_fields() {
        let expected = doc! { "_id": "a", "v": 1 };
        let actual = doc! { "_id": "a", "w": 1 };
        let diffs = diff_documents(&expected, &actual);
        let kinds: Vec<_> = diffs.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DifferenceKind::Missing, DifferenceKind::Unexpected]);
        assert!(diffs[0].to_string().contains("missing"));
    }

    #[test]
    fn test_sequence_equal_is_pointwise() {
        let a = vec![doc! { "_id": "a" }, doc! { "_id": "b" }];
        let b = vec![doc! { "_id": "b" }, doc! { "_id": "a" }];
        assert!(sequence_equal(&a, &a));
        assert!(!sequence_equal(&a, &b));
        assert!(!sequence_equal(&a, &a[..1]));

        let diffs = diff_sequences(&a, &a[..1]);
        assert_eq!(diffs[0].kind, DifferenceKind::LengthMismatch);
    }

    #[test]
    fn test_errors_ignore_message() {
        let a = BackendError::command(
            40,
            "ConflictingUpdateOperators",
            "Updating the path 'v' would create a conflict at 'v'",
        );
        let b = BackendError::command(40, "ConflictingUpdateOperators", "conflict");
        let c = BackendError::command(9, "FailedToParse", "conflict");
        assert!(errors_equal(&a, &b));
        assert!(!errors_equal(&a, &c));
        assert!(!errors_equal(&a, &BackendError::transport("x")));
    }

    #[test]
    fn test_non_command_errors_never_match() {
        let reset = BackendError::transport("reset");
        assert!(!errors_equal(&reset, &reset.clone()));
        let decode = BackendError::Decode { reason: "truncated".into() };
        assert!(!errors_equal(&decode, &decode.clone()));
        assert!(!errors_equal(&BackendError::Cancelled, &BackendError::Cancelled));
    }

    #[test]
    fn test_collect_ids() {
        let docs = vec![doc! { "_id": "a" }, doc! { "v": 1 }];
        let ids = collect_ids(&docs);
        assert_eq!(ids, vec![Bson::String("a".into()), Bson::Null]);
        let rendered = format_ids(&ids);
        assert!(rendered.starts_with('['));
        assert!(rendered.contains('a'));
        assert!(rendered.contains("null"));
    }

    #[test]
    fn test_object_ids_compare_by_value() {
        let id = ObjectId::from_bytes([1; 12]);
        assert!(documents_equal(&doc! { "_id": id }, &doc! { "_id": id }));
        assert!(!documents_equal(
            &doc! { "_id": id },
            &doc! { "_id": ObjectId::from_bytes([2; 12]) }
        ));
    }

    fn scalar() -> impl Strategy<Value = Bson> {
        prop_oneof![
            any::<i32>().prop_map(Bson::Int32),
            any::<i64>().prop_map(Bson::Int64),
            any::<f64>().prop_map(Bson::Double),
            any::<bool>().prop_map(Bson::Boolean),
            "[a-z]{0,8}".prop_map(Bson::String),
            Just(Bson::Null),
        ]
    }

    fn document() -> impl Strategy<Value = Document> {
        prop::collection::vec(("[a-z]{1,3}", scalar()), 0..6).prop_map(|fields| {
            let mut d = Document::new();
            for (k, v) in fields {
                d.insert(k, v);
            }
            d
        })
    }

    proptest! {
        #[test]
        fn prop_documents_equal_reflexive(d in document()) {
            prop_assert!(documents_equal(&d, &d));
            prop_assert!(diff_documents(&d, &d).is_empty());
        }

        #[test]
        fn prop_documents_equal_symmetric(a in document(), b in document()) {
            prop_assert_eq!(documents_equal(&a, &b), documents_equal(&b, &a));
        }

        #[test]
        fn prop_field_order_irrelevant(d in document()) {
            let mut reversed = Document::new();
            for (k, v) in d.iter().collect::<Vec<_>>().into_iter().rev() {
                reversed.insert(k.clone(), v.clone());
            }
            prop_assert!(documents_equal(&d, &reversed));
        }

        #[test]
        fn prop_int32_never_equals_int64(n in any::<i32>()) {
            let as_i32 = doc! { "v": n };
            let as_i64 = doc! { "v": n as i64 };
            prop_assert!(!documents_equal(&as_i32, &as_i64));
        }

        #[test]
        fn prop_diff_empty_iff_equal(a in document(), b in document()) {
            prop_assert_eq!(diff_documents(&a, &b).is_empty(), documents_equal(&a, &b));
        }
    }
}
