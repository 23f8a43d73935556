//! Filter matching, path lookup and sort ordering
//!
//! Supported filter forms:
//! - `{field: value}` and dotted paths, with array fan-out
//! - `$eq`, `$exists`, `$in`, `$gt`, `$lt`
//! - top-level `$and`
//!
//! Equality is numeric-aware the way the reference server's query language
//! is (`int32(42)` matches `int64(42)` and `42.0`), which is a different
//! question from the comparator's type-strict equality.

use bson::{Bson, Document};
use std::cmp::Ordering;

use doccompat_core::BackendResult;

use crate::codes;

/// Values reachable at a dotted path.
///
/// Arrays fan out over their document elements unless the next segment is
/// a numeric index.
pub(crate) fn lookup(doc: &Document, path: &str) -> Vec<Bson> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    collect_from_document(doc, &segments, &mut out);
    out
}

fn collect_from_document(doc: &Document, segments: &[&str], out: &mut Vec<Bson>) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if let Some(value) = doc.get(*head) {
        collect_from_value(value, rest, out);
    }
}

fn collect_from_value(value: &Bson, segments: &[&str], out: &mut Vec<Bson>) {
    let Some((head, tail)) = segments.split_first() else {
        out.push(value.clone());
        return;
    };
    match value {
        Bson::Document(d) => collect_from_document(d, segments, out),
        Bson::Array(items) => {
            if let Ok(index) = head.parse::<usize>() {
                if let Some(item) = items.get(index) {
                    collect_from_value(item, tail, out);
                }
            } else {
                for item in items {
                    if let Bson::Document(d) = item {
                        collect_from_document(d, segments, out);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Whether `doc` satisfies `filter`.
pub(crate) fn matches(doc: &Document, filter: &Document) -> BackendResult<bool> {
    for (key, condition) in filter {
        if !matches_clause(doc, key, condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_clause(doc: &Document, key: &str, condition: &Bson) -> BackendResult<bool> {
    if key == "$and" {
        let Bson::Array(clauses) = condition else {
            return Err(codes::bad_value("$and must be an array"));
        };
        if clauses.is_empty() {
            return Err(codes::bad_value("$and/$or/$nor must be a nonempty array"));
        }
        for clause in clauses {
            let Bson::Document(sub) = clause else {
                return Err(codes::bad_value("$or/$and/$nor entries need to be full objects"));
            };
            if !matches(doc, sub)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    if key.starts_with('$') {
        return Err(codes::bad_value(format!("unknown top level operator: {}", key)));
    }

    let values = lookup(doc, key);
    match condition {
        Bson::Document(ops) if is_operator_document(ops) => {
            for (op, arg) in ops {
                if !matches_operator(&values, op, arg)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(matches_eq(&values, condition)),
    }
}

/// A document whose first key is `$`-prefixed holds query operators.
pub(crate) fn is_operator_document(doc: &Document) -> bool {
    doc.keys().next().map_or(false, |k| k.starts_with('$'))
}

fn matches_operator(values: &[Bson], op: &str, arg: &Bson) -> BackendResult<bool> {
    match op {
        "$eq" => Ok(matches_eq(values, arg)),
        "$exists" => Ok(values.is_empty() != truthy(arg)),
        "$in" => {
            let Bson::Array(choices) = arg else {
                return Err(codes::bad_value("$in needs an array"));
            };
            Ok(choices.iter().any(|choice| matches_eq(values, choice)))
        }
        "$gt" => Ok(any_compares(values, arg, Ordering::Greater)),
        "$lt" => Ok(any_compares(values, arg, Ordering::Less)),
        other => Err(codes::bad_value(format!("unknown operator: {}", other))),
    }
}

fn matches_eq(values: &[Bson], expected: &Bson) -> bool {
    if values.is_empty() {
        return matches!(expected, Bson::Null);
    }
    values.iter().any(|v| {
        query_equal(v, expected)
            || matches!(v, Bson::Array(items) if items.iter().any(|i| query_equal(i, expected)))
    })
}

fn any_compares(values: &[Bson], arg: &Bson, wanted: Ordering) -> bool {
    values
        .iter()
        .flat_map(|v| match v {
            Bson::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .any(|candidate| {
            type_rank(candidate) == type_rank(arg) && compare_values(candidate, arg) == wanted
        })
}

/// Numeric-aware equality used by filters.
pub(crate) fn query_equal(a: &Bson, b: &Bson) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Boolean reading of a command flag (`new: 42.0` is true, `new: 0` is false).
pub(crate) fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(d) => *d != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

pub(crate) fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(d) => Some(*d),
        _ => None,
    }
}

/// Canonical cross-type ordering rank.
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 13,
        _ => 12,
    }
}

/// Total order over values: type rank first, then value.
pub(crate) fn compare_values(a: &Bson, b: &Bson) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Document(x), Bson::Document(y)) => compare_documents(x, y),
        (Bson::Array(x), Bson::Array(y)) => compare_sequences(x, y),
        (Bson::Binary(x), Bson::Binary(y)) => x.bytes.cmp(&y.bytes),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.timestamp_millis().cmp(&y.timestamp_millis()),
        (Bson::Timestamp(x), Bson::Timestamp(y)) => {
            (x.time, x.increment).cmp(&(y.time, y.increment))
        }
        (Bson::RegularExpression(x), Bson::RegularExpression(y)) => {
            (&x.pattern, &x.options).cmp(&(&y.pattern, &y.options))
        }
        _ => match (as_number(a), as_number(b)) {
            // NaN sorts below every other number
            (Some(x), Some(y)) => match (x.is_nan(), y.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            },
            _ => Ordering::Equal,
        },
    }
}

fn compare_documents(a: &Document, b: &Document) -> Ordering {
    for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
        let ord = compare_values(va, vb).then_with(|| ka.cmp(kb));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_sequences(a: &[Bson], b: &[Bson]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = compare_values(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// One parsed sort key: path and direction.
#[derive(Debug, Clone)]
pub(crate) struct SortKey {
    path: String,
    ascending: bool,
}

/// Parse a sort specification.
pub(crate) fn parse_sort(sort: &Document) -> BackendResult<Vec<SortKey>> {
    let mut keys = Vec::with_capacity(sort.len());
    for (path, direction) in sort {
        if path.starts_with('$') {
            return Err(codes::dollar_field_path(path));
        }
        if path.split('.').any(str::is_empty) {
            return Err(codes::empty_field_path());
        }
        let ascending = match as_number(direction) {
            Some(d) if d == 1.0 => true,
            Some(d) if d == -1.0 => false,
            _ => return Err(codes::invalid_sort_order()),
        };
        keys.push(SortKey {
            path: path.clone(),
            ascending,
        });
    }
    Ok(keys)
}

/// Stable sort of `docs` by `keys`.
pub(crate) fn sort_documents(docs: &mut [Document], keys: &[SortKey]) {
    docs.sort_by(|a, b| compare_by_keys(a, b, keys));
}

pub(crate) fn compare_by_keys(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ord = compare_values(&sort_value(a, key), &sort_value(b, key));
        let ord = if key.ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Representative value of a document for one sort key: the smallest
/// candidate ascending, the largest descending, null when missing.
fn sort_value(doc: &Document, key: &SortKey) -> Bson {
    let candidates = lookup(doc, &key.path);
    let picked = if key.ascending {
        candidates.into_iter().min_by(compare_values)
    } else {
        candidates.into_iter().max_by(compare_values)
    };
    picked.unwrap_or(Bson::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_lookup_dotted_and_fan_out() {
        let d = doc! { "v": [{ "foo": [{ "bar": "hello" }, { "bar": "world" }] }] };
        assert_eq!(lookup(&d, "v.0.foo.0.bar"), vec![Bson::String("hello".into())]);
        assert_eq!(lookup(&d, "v.foo.bar").len(), 2);
        assert!(lookup(&d, "invalid.foo").is_empty());
    }

    #[test]
    fn test_equality_is_numeric_aware() {
        let d = doc! { "_id": "int64", "v": 42_i64 };
        assert!(matches(&d, &doc! { "v": 42 }).unwrap());
        assert!(matches(&d, &doc! { "v": 42.0 }).unwrap());
        assert!(!matches(&d, &doc! { "v": "42" }).unwrap());
    }

    #[test]
    fn test_exists() {
        let d = doc! { "_id": "x" };
        assert!(matches(&d, &doc! { "_id": { "$exists": true } }).unwrap());
        assert!(!matches(&d, &doc! { "_id": { "$exists": false } }).unwrap());
        assert!(matches(&d, &doc! { "non-existent": { "$exists": false } }).unwrap());
    }

    #[test]
    fn test_in_and_comparisons() {
        let d = doc! { "_id": "a", "v": 5 };
        assert!(matches(&d, &doc! { "_id": { "$in": ["a", "b"] } }).unwrap());
        assert!(matches(&d, &doc! { "v": { "$gt": 0 } }).unwrap());
        assert!(!matches(&d, &doc! { "v": { "$lt": 0 } }).unwrap());
        // different type brackets never compare
        assert!(!matches(&d, &doc! { "v": { "$gt": "a" } }).unwrap());
    }

    #[test]
    fn test_and_contradiction_matches_nothing() {
        let filter = doc! { "$and": [{ "v": { "$gt": 0 } }, { "v": { "$lt": 0 } }] };
        for v in [Bson::Int32(1), Bson::Int32(-1), Bson::Int32(0), Bson::String("x".into())] {
            assert!(!matches(&doc! { "v": v }, &filter).unwrap());
        }
    }

    #[test]
    fn test_missing_field_equals_null() {
        assert!(matches(&doc! { "_id": 1 }, &doc! { "v": Bson::Null }).unwrap());
    }

    #[test]
    fn test_unknown_operator_is_bad_value() {
        let err = matches(&doc! { "v": 1 }, &doc! { "v": { "$nope": 1 } }).unwrap_err();
        assert_eq!(err.as_command().unwrap().code, 2);
    }

    #[test]
    fn test_sort_parse_errors() {
        let code = |sort: Document| parse_sort(&sort).unwrap_err().as_command().unwrap().code;
        assert_eq!(code(doc! { "v": 2 }), 15975);
        assert_eq!(code(doc! { "v..foo": 1 }), 15998);
        assert_eq!(code(doc! { "$v.foo": 1 }), 16410);
    }

    #[test]
    fn test_sort_by_type_then_value() {
        let mut docs = vec![
            doc! { "_id": "s", "v": "foo" },
            doc! { "_id": "n", "v": Bson::Null },
            doc! { "_id": "i", "v": 42 },
            doc! { "_id": "d", "v": 1.5 },
        ];
        sort_documents(&mut docs, &parse_sort(&doc! { "v": 1 }).unwrap());
        let ids: Vec<&str> = docs.iter().map(|d| d.get_str("_id").unwrap()).collect();
        assert_eq!(ids, vec!["n", "d", "i", "s"]);

        sort_documents(&mut docs, &parse_sort(&doc! { "v": -1 }).unwrap());
        assert_eq!(docs[0].get_str("_id").unwrap(), "s");
    }

    #[test]
    fn test_truthy() {
        assert!(truthy(&Bson::Double(42.0)));
        assert!(!truthy(&Bson::Double(0.0)));
        assert!(!truthy(&Bson::Int64(0)));
        assert!(truthy(&Bson::Boolean(true)));
    }
}
