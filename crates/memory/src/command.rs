//! The findAndModify command

use bson::oid::ObjectId;
use bson::{doc, Bson, Document};

use doccompat_core::BackendResult;

use crate::codes;
use crate::engine::MemoryEngine;
use crate::query;
use crate::update::{self, Update};

/// Command name, matched case-insensitively
pub(crate) const FIND_AND_MODIFY: &str = "findAndModify";

const KNOWN_FIELDS: &[&str] = &[
    "query",
    "sort",
    "remove",
    "update",
    "new",
    "fields",
    "upsert",
    "bypassDocumentValidation",
    "writeConcern",
    "maxTimeMS",
    "collation",
    "arrayFilters",
    "hint",
    "let",
    "comment",
];

/// Parsed findAndModify arguments
#[derive(Debug)]
struct Request {
    query: Document,
    sort: Document,
    remove: bool,
    update: Option<Update>,
    new: bool,
    upsert: bool,
}

fn document_field(body: &Document, field: &str) -> BackendResult<Document> {
    match body.get(field) {
        None | Some(Bson::Null) => Ok(Document::new()),
        Some(Bson::Document(d)) => Ok(d.clone()),
        Some(other) => Err(codes::type_mismatch(format!(
            "BSON field '{}.{}' is the wrong type '{}', expected type 'object'",
            FIND_AND_MODIFY,
            field,
            codes::type_name(other)
        ))),
    }
}

fn flag(body: &Document, field: &str) -> bool {
    body.get(field).map_or(false, query::truthy)
}

fn parse_request(body: &Document, check_conflicts: bool) -> BackendResult<Request> {
    for key in body.keys().skip(1) {
        if !key.starts_with('$') && !KNOWN_FIELDS.contains(&key.as_str()) {
            return Err(codes::unknown_field(FIND_AND_MODIFY, key));
        }
    }

    if let Some(max_time) = body.get("maxTimeMS") {
        if query::as_number(max_time).is_none() {
            return Err(codes::bad_value(format!(
                "maxTimeMS must be a number, found {}",
                codes::type_name(max_time)
            )));
        }
    }

    let query = document_field(body, "query")?;
    let sort = document_field(body, "sort")?;
    let remove = flag(body, "remove");
    let new = flag(body, "new");
    let upsert = flag(body, "upsert");

    let update = match body.get("update") {
        Some(u) => Some(update::parse(u, check_conflicts)?),
        None => None,
    };

    if remove {
        if update.is_some() {
            return Err(codes::failed_to_parse("Cannot specify both an update and remove=true"));
        }
        if upsert {
            return Err(codes::failed_to_parse("Cannot specify both upsert=true and remove=true"));
        }
        if new {
            return Err(codes::failed_to_parse(
                "Cannot specify both new=true and remove=true; 'remove' always returns the deleted document",
            ));
        }
    } else if update.is_none() {
        return Err(codes::failed_to_parse("Either an update or remove=true must be specified"));
    }

    Ok(Request {
        query,
        sort,
        remove,
        update,
        new,
        upsert,
    })
}

/// Run findAndModify against `collection` of `engine`.
///
/// Validation happens before the collection is locked; the find, the
/// modification and the reply are then computed under one write lock.
pub(crate) fn find_and_modify(
    engine: &MemoryEngine,
    collection: &str,
    body: &Document,
) -> BackendResult<Document> {
    let request = parse_request(body, !engine.quirks().skip_conflict_check)?;
    let sort_keys = query::parse_sort(&request.sort)?;
    let widen = engine.quirks().widen_int32;

    engine.with_collection_mut(collection, |docs| -> BackendResult<Document> {
        let mut first: Option<usize> = None;
        for (i, doc) in docs.iter().enumerate() {
            if !query::matches(doc, &request.query)? {
                continue;
            }
            first = match first {
                Some(best)
                    if query::compare_by_keys(&docs[best], doc, &sort_keys)
                        != std::cmp::Ordering::Greater =>
                {
                    Some(best)
                }
                _ => Some(i),
            };
        }

        match (first, &request.update) {
            (Some(i), _) if request.remove => {
                let removed = docs.remove(i);
                Ok(reply(doc! { "n": 1 }, Some(removed)))
            }
            (None, _) if request.remove => Ok(reply(doc! { "n": 0 }, None)),
            (Some(i), Some(spec)) => {
                let old = docs[i].clone();
                let mut updated = modify_existing(&old, spec)?;
                if widen {
                    update::widen_int32(&mut updated);
                }
                docs[i] = updated.clone();
                let value = if request.new { updated } else { old };
                Ok(reply(doc! { "n": 1, "updatedExisting": true }, Some(value)))
            }
            (None, Some(spec)) if request.upsert => {
                let mut inserted = build_upsert(&request.query, spec)?;
                if widen {
                    update::widen_int32(&mut inserted);
                }
                let id = inserted.get("_id").cloned().unwrap_or(Bson::Null);
                let taken = |d: &Document| {
                    d.get("_id").map_or(false, |existing| query::query_equal(existing, &id))
                };
                if docs.iter().any(taken) {
                    return Err(codes::duplicate_key(collection, &id));
                }
                docs.push(inserted.clone());
                let value = if request.new { Some(inserted) } else { None };
                Ok(reply(
                    doc! { "n": 1, "updatedExisting": false, "upserted": id },
                    value,
                ))
            }
            _ => Ok(reply(doc! { "n": 0, "updatedExisting": false }, None)),
        }
    })
}

fn modify_existing(old: &Document, spec: &Update) -> BackendResult<Document> {
    let old_id = old.get("_id").cloned().unwrap_or(Bson::Null);
    let updated = match spec {
        Update::Replacement(replacement) => {
            let mut updated = doc! { "_id": old_id.clone() };
            for (k, v) in replacement {
                if k != "_id" {
                    updated.insert(k.clone(), v.clone());
                }
            }
            if let Some(new_id) = replacement.get("_id") {
                if new_id != &old_id {
                    return Err(codes::immutable_field(format!(
                        "After applying the update, the (immutable) field '_id' was found to have been altered to _id: {}",
                        new_id
                    )));
                }
            }
            updated
        }
        Update::Operators(ops) => {
            let mut updated = old.clone();
            update::apply_operators(&mut updated, ops, false)?;
            if updated.get("_id") != Some(&old_id) {
                return Err(codes::immutable_field(
                    "Performing an update on the path '_id' would modify the immutable field '_id'",
                ));
            }
            updated
        }
    };
    Ok(updated)
}

/// Document inserted by an upsert that matched nothing.
///
/// Replacement updates keep only the query's `_id`; operator updates start
/// from every equality in the query. A missing `_id` is generated.
fn build_upsert(filter: &Document, spec: &Update) -> BackendResult<Document> {
    let mut seed = Document::new();
    seed_from_query(filter, &mut seed)?;
    let query_id = seed.get("_id").cloned();

    let body = match spec {
        Update::Replacement(replacement) => {
            let mut body = replacement.clone();
            if let Some(id) = &query_id {
                if !body.contains_key("_id") {
                    body.insert("_id", id.clone());
                }
            }
            body
        }
        Update::Operators(ops) => {
            let mut body = seed;
            update::apply_operators(&mut body, ops, true)?;
            if let Some(id) = &query_id {
                if body.get("_id") != Some(id) {
                    return Err(codes::immutable_field(
                        "Performing an update on the path '_id' would modify the immutable field '_id'",
                    ));
                }
            }
            body
        }
    };

    let id = body.get("_id").cloned().unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));
    match id {
        Bson::RegularExpression(_) => return Err(codes::bad_value("can't use a regex for _id")),
        Bson::Array(_) => return Err(codes::bad_value("can't use an array for _id")),
        Bson::Undefined => return Err(codes::bad_value("can't use a undefined for _id")),
        _ => {}
    }
    let mut inserted = doc! { "_id": id };
    for (k, v) in body {
        if k != "_id" {
            inserted.insert(k, v);
        }
    }
    Ok(inserted)
}

fn seed_from_query(filter: &Document, seed: &mut Document) -> BackendResult<()> {
    for (key, condition) in filter {
        if key == "$and" {
            if let Bson::Array(clauses) = condition {
                for clause in clauses {
                    if let Bson::Document(sub) = clause {
                        seed_from_query(sub, seed)?;
                    }
                }
            }
            continue;
        }
        if key.starts_with('$') {
            continue;
        }
        let value = match condition {
            Bson::Document(ops) if query::is_operator_document(ops) => match ops.get("$eq") {
                Some(v) => v.clone(),
                None => continue,
            },
            other => other.clone(),
        };
        let segments: Vec<&str> = key.split('.').collect();
        update::set_path(seed, &segments, value)?;
    }
    Ok(())
}

fn reply(last_error: Document, value: Option<Document>) -> Document {
    doc! {
        "lastErrorObject": last_error,
        "value": value.map_or(Bson::Null, Bson::Document),
        "ok": 1.0
    }
}
