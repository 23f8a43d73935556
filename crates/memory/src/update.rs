//! Update documents: parsing, validation and application
//!
//! An update is either a replacement document or a set of operators.
//! Operators are validated as a whole before anything is applied, so a
//! rejected update never leaves a partially modified document behind.

use bson::{Bson, Document};

use doccompat_core::BackendResult;

use crate::codes;
use crate::query;

/// Supported update operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operator {
    Set,
    Unset,
    Inc,
    SetOnInsert,
}

impl Operator {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "$set" => Some(Operator::Set),
            "$unset" => Some(Operator::Unset),
            "$inc" => Some(Operator::Inc),
            "$setOnInsert" => Some(Operator::SetOnInsert),
            _ => None,
        }
    }
}

/// A parsed, validated update.
#[derive(Debug, Clone)]
pub(crate) enum Update {
    Replacement(Document),
    Operators(Vec<(Operator, String, Bson)>),
}

/// Parse and validate an update argument.
///
/// `check_conflicts` is off only for engines emulating a server that
/// applies overlapping operators in order.
pub(crate) fn parse(update: &Bson, check_conflicts: bool) -> BackendResult<Update> {
    let Bson::Document(spec) = update else {
        return Err(codes::type_mismatch(format!(
            "Update argument must be either an object or an array, found {}",
            codes::type_name(update)
        )));
    };

    if !query::is_operator_document(spec) {
        if let Some(key) = spec.keys().find(|k| k.starts_with('$')) {
            return Err(codes::dollar_prefixed_field_name(key));
        }
        return Ok(Update::Replacement(spec.clone()));
    }

    let mut ops = Vec::new();
    for (name, arg) in spec {
        let op = Operator::parse(name).ok_or_else(|| {
            codes::failed_to_parse(format!(
                "Unknown modifier: {}. Expected a valid update modifier or pipeline-style update specified as an array",
                name
            ))
        })?;
        let Bson::Document(fields) = arg else {
            return Err(codes::failed_to_parse(format!(
                "Modifiers operate on fields but we found type {} instead. For example: {{$mod: {{<field>: ...}}}} not {{{}: {}}}",
                codes::type_name(arg),
                name,
                arg
            )));
        };
        for (path, value) in fields {
            validate_path(path)?;
            if op == Operator::Inc && query::as_number(value).is_none() {
                return Err(codes::type_mismatch(format!(
                    "Cannot increment with non-numeric argument: {{{}: {}}}",
                    path, value
                )));
            }
            ops.push((op, path.clone(), value.clone()));
        }
    }

    if check_conflicts {
        check_operator_conflicts(&ops)?;
    }
    Ok(Update::Operators(ops))
}

fn validate_path(path: &str) -> BackendResult<()> {
    if path.is_empty() {
        return Err(codes::empty_field_name("An empty update path is not valid."));
    }
    if path.split('.').any(str::is_empty) {
        return Err(codes::empty_field_name(format!(
            "The update path '{}' contains an empty field name, which is not allowed.",
            path
        )));
    }
    Ok(())
}

/// Two operators may not touch the same path, or a path and its prefix.
fn check_operator_conflicts(ops: &[(Operator, String, Bson)]) -> BackendResult<()> {
    for (i, (_, a, _)) in ops.iter().enumerate() {
        for (_, b, _) in &ops[i + 1..] {
            if overlaps(a, b) {
                return Err(codes::conflicting_update_operators(b, a));
            }
        }
    }
    Ok(())
}

fn overlaps(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    long == short || (long.starts_with(short) && long[short.len()..].starts_with('.'))
}

/// Apply operators to `doc`. `$setOnInsert` only takes effect when `inserting`.
pub(crate) fn apply_operators(
    doc: &mut Document,
    ops: &[(Operator, String, Bson)],
    inserting: bool,
) -> BackendResult<()> {
    for (op, path, value) in ops {
        let segments: Vec<&str> = path.split('.').collect();
        match op {
            Operator::Set => set_path(doc, &segments, value.clone())?,
            Operator::SetOnInsert if inserting => set_path(doc, &segments, value.clone())?,
            Operator::SetOnInsert => {}
            Operator::Unset => unset_path(doc, &segments),
            Operator::Inc => {
                let current = get_path(doc, &segments).cloned();
                let next = match current {
                    None => value.clone(),
                    Some(existing) => add(&existing, value).ok_or_else(|| {
                        codes::type_mismatch(format!(
                            "Cannot apply $inc to a value of non-numeric type. {{_id: {}}} has the field '{}' of non-numeric type {}",
                            doc.get("_id").cloned().unwrap_or(Bson::Null),
                            segments.last().copied().unwrap_or_default(),
                            codes::type_name(&existing)
                        ))
                    })?,
                };
                set_path(doc, &segments, next)?;
            }
        }
    }
    Ok(())
}

/// Numeric addition with the server's widening rules.
fn add(a: &Bson, b: &Bson) -> Option<Bson> {
    match (a, b) {
        (Bson::Int32(x), Bson::Int32(y)) => Some(
            x.checked_add(*y)
                .map(Bson::Int32)
                .unwrap_or_else(|| Bson::Int64(i64::from(*x) + i64::from(*y))),
        ),
        (Bson::Int32(_) | Bson::Int64(_), Bson::Int32(_) | Bson::Int64(_)) => {
            let x = as_i64(a)?;
            let y = as_i64(b)?;
            x.checked_add(y).map(Bson::Int64)
        }
        _ => Some(Bson::Double(query::as_number(a)? + query::as_number(b)?)),
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

/// Value at an exact path; numeric segments index arrays.
pub(crate) fn get_path<'a>(doc: &'a Document, segments: &[&str]) -> Option<&'a Bson> {
    let (head, rest) = segments.split_first()?;
    let mut current = doc.get(*head)?;
    for segment in rest {
        current = match current {
            Bson::Document(d) => d.get(*segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

pub(crate) fn set_path(doc: &mut Document, segments: &[&str], value: Bson) -> BackendResult<()> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        doc.insert(*head, value);
        return Ok(());
    }
    if !doc.contains_key(*head) {
        doc.insert(*head, Document::new());
    }
    match doc.get_mut(*head) {
        Some(child) => set_in_value(child, rest, value),
        None => Ok(()),
    }
}

fn set_in_value(target: &mut Bson, segments: &[&str], value: Bson) -> BackendResult<()> {
    let Some((head, tail)) = segments.split_first() else {
        return Ok(());
    };
    match target {
        Bson::Document(d) => set_path(d, segments, value),
        Bson::Array(items) => {
            let Ok(index) = head.parse::<usize>() else {
                return Err(codes::path_not_viable(head, &Bson::Array(items.clone())));
            };
            while items.len() <= index {
                items.push(Bson::Null);
            }
            if tail.is_empty() {
                items[index] = value;
                return Ok(());
            }
            if matches!(items[index], Bson::Null) {
                items[index] = Bson::Document(Document::new());
            }
            set_in_value(&mut items[index], tail, value)
        }
        other => Err(codes::path_not_viable(head, other)),
    }
}

fn unset_path(doc: &mut Document, segments: &[&str]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        doc.remove(*head);
        return;
    }
    if let Some(child) = doc.get_mut(*head) {
        unset_in_value(child, rest);
    }
}

fn unset_in_value(target: &mut Bson, segments: &[&str]) {
    let Some((head, tail)) = segments.split_first() else {
        return;
    };
    match target {
        Bson::Document(d) => unset_path(d, segments),
        Bson::Array(items) => {
            let Some(index) = head.parse::<usize>().ok().filter(|i| *i < items.len()) else {
                return;
            };
            if tail.is_empty() {
                // array slots are nulled, never removed
                items[index] = Bson::Null;
            } else {
                unset_in_value(&mut items[index], tail);
            }
        }
        _ => {}
    }
}

/// Recursively widen every int32 in `doc` to int64.
pub(crate) fn widen_int32(doc: &mut Document) {
    for (_, value) in doc.iter_mut() {
        widen_value(value);
    }
}

fn widen_value(value: &mut Bson) {
    match value {
        Bson::Int32(i) => *value = Bson::Int64(i64::from(*i)),
        Bson::Document(d) => widen_int32(d),
        Bson::Array(items) => items.iter_mut().for_each(widen_value),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn ops(update: Document) -> Vec<(Operator, String, Bson)> {
        match parse(&Bson::Document(update), true).unwrap() {
            Update::Operators(ops) => ops,
            Update::Replacement(_) => panic!("expected operators"),
        }
    }

    fn code(update: Bson) -> i32 {
        parse(&update, true).unwrap_err().as_command().unwrap().code
    }

    #[test]
    fn test_replacement_and_operators() {
        assert!(matches!(
            parse(&Bson::Document(doc! { "v": 43 }), true).unwrap(),
            Update::Replacement(_)
        ));
        assert!(matches!(parse(&Bson::Document(doc! {}), true).unwrap(), Update::Replacement(_)));
        assert_eq!(ops(doc! { "$set": { "v": 1 }, "$inc": { "w": 2 } }).len(), 2);
    }

    #[test]
    fn test_parse_errors_mirror_server_codes() {
        assert_eq!(code(Bson::String("123".into())), 14);
        assert_eq!(code(Bson::Document(doc! { "$set": { "v": 4 }, "$inc": { "v": 4 } })), 40);
        let parent = doc! { "$set": { "v.0.field": 4 }, "$inc": { "v": 4 } };
        assert_eq!(code(Bson::Document(parent)), 40);
        assert_eq!(code(Bson::Document(doc! { "$set": { "": 4 } })), 56);
        assert_eq!(code(Bson::Document(doc! { "$set": { "v..foo": 4 } })), 56);
        assert_eq!(code(Bson::Document(doc! { "$invalid": "non-existent-field" })), 9);
        assert_eq!(code(Bson::Document(doc! { "$set": 1 })), 9);
        assert_eq!(code(Bson::Document(doc! { "v": 43, "$set": { "test": 0 } })), 52);
        assert_eq!(code(Bson::Document(doc! { "$inc": { "v": "x" } })), 14);
    }

    #[test]
    fn test_sibling_paths_do_not_conflict() {
        assert_eq!(ops(doc! { "$set": { "v.0.field": 4 }, "$inc": { "v.0.foo": 4 } }).len(), 2);
        assert_eq!(ops(doc! { "$set": { "v": 4 }, "$inc": { "vv": 4 } }).len(), 2);
    }

    #[test]
    fn test_conflict_check_can_be_skipped() {
        let update = Bson::Document(doc! { "$set": { "v": 4 }, "$inc": { "v": 4 } });
        assert!(parse(&update, false).is_ok());
    }

    #[test]
    fn test_apply_set_inc_unset() {
        let mut d = doc! { "_id": "int64", "v": 42_i64, "w": 1 };
        let update = ops(doc! {
            "$set": { "x.y": "z" },
            "$inc": { "v": 1, "n": 5 },
            "$unset": { "w": "" },
        });
        apply_operators(&mut d, &update, false).unwrap();
        assert_eq!(d, doc! { "_id": "int64", "v": 43_i64, "x": { "y": "z" }, "n": 5 });
    }

    #[test]
    fn test_inc_widens_on_overflow() {
        let mut d = doc! { "v": i32::MAX };
        apply_operators(&mut d, &ops(doc! { "$inc": { "v": 1 } }), false).unwrap();
        assert_eq!(d.get("v"), Some(&Bson::Int64(i64::from(i32::MAX) + 1)));
    }

    #[test]
    fn test_inc_non_numeric_target_fails() {
        let mut d = doc! { "_id": "s", "v": "foo" };
        let err = apply_operators(&mut d, &ops(doc! { "$inc": { "v": 1 } }), false).unwrap_err();
        assert_eq!(err.as_command().unwrap().code, 14);
    }

    #[test]
    fn test_set_into_array_needs_index() {
        let mut d = doc! { "v": [{ "field": 42 }] };
        apply_operators(&mut d, &ops(doc! { "$set": { "v.0.field": 4 } }), false).unwrap();
        assert_eq!(d, doc! { "v": [{ "field": 4 }] });

        let err =
            apply_operators(&mut d, &ops(doc! { "$inc": { "v.field": 4 } }), false).unwrap_err();
        assert_eq!(err.as_command().unwrap().code, 28);
    }

    #[test]
    fn test_set_on_insert_only_when_inserting() {
        let update = ops(doc! { "$setOnInsert": { "new": "val" } });
        let mut existing = doc! { "_id": "int32" };
        apply_operators(&mut existing, &update, false).unwrap();
        assert!(!existing.contains_key("new"));

        let mut inserted = doc! { "_id": "non-existent" };
        apply_operators(&mut inserted, &update, true).unwrap();
        assert_eq!(inserted.get_str("new").unwrap(), "val");
    }

    #[test]
    fn test_widen_int32_recurses() {
        let mut d = doc! { "a": 1, "b": { "c": [2, "x"] }, "d": 3_i64 };
        widen_int32(&mut d);
        assert_eq!(d, doc! { "a": 1_i64, "b": { "c": [2_i64, "x"] }, "d": 3_i64 });
    }
}
