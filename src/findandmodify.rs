//! findAndModify scenario tables
//!
//! One table per family. Every scenario runs against all registered
//! providers unless it names its own subset; the default `{_id: 1}` sort is
//! added by the harness.

use bson::{doc, Bson, Regex};

use doccompat_core::{table, FixtureProvisioner, Scenario, ScenarioTable};
use doccompat_harness::{HarnessConfig, RunOptions, ScenarioRunner};
use doccompat_shareddata::{
    all_except, registry, ARRAY_AND_DOCUMENTS, DATE_TIMES, DOUBLES, INT32S, SCALARS, SMALL_DOUBLES,
    STRINGS, UNSETS,
};

/// Command name sent to both systems.
pub const OPERATION: &str = "findAndModify";

fn issue(number: u32) -> String {
    format!("https://github.com/FerretDB/FerretDB-DocumentDB/issues/{}", number)
}

/// Runner for findAndModify tables over the shared provider catalogue.
pub fn runner<P: FixtureProvisioner>(provisioner: P, config: &HarnessConfig) -> ScenarioRunner<P> {
    ScenarioRunner::new(provisioner, registry().clone(), OPERATION)
        .with_options(RunOptions::from(config))
}

/// Every family as `(name, table)`.
pub fn families() -> Vec<(&'static str, ScenarioTable)> {
    vec![
        ("Simple", simple()),
        ("Errors", errors()),
        ("Update", update()),
        ("DotNotation", dot_notation()),
        ("UpdateSet", update_set()),
        ("Unset", unset()),
        ("UpdateCurrentDate", update_current_date()),
        ("UpdateRename", update_rename()),
        ("Sort", sort()),
        ("Upsert", upsert()),
        ("UpsertSet", upsert_set()),
        ("SetOnInsert", set_on_insert()),
        ("UpsertUnset", upsert_unset()),
        ("Remove", remove()),
        ("ReplacementDoc", replacement_doc()),
    ]
}

/// Basic remove and `new` flag handling.
pub fn simple() -> ScenarioTable {
    table([
        (
            "EmptyQueryRemove",
            Scenario::new(doc! { "query": {}, "remove": true }),
        ),
        (
            "NewDoubleNonZero",
            Scenario::new(doc! {
                "query": { "_id": "double-smallest" },
                "update": { "_id": "double-smallest", "v": 43.0 },
                "new": 42.0,
            }),
        ),
        (
            "NewDoubleZero",
            Scenario::new(doc! {
                "query": { "_id": "double-zero" },
                "update": { "_id": "double-zero", "v": 43.0 },
                "new": 0.0,
            }),
        ),
        (
            "NewIntNonZero",
            Scenario::new(doc! {
                "query": { "_id": "int32" },
                "update": { "_id": "int32", "v": 43_i32 },
                "new": 11_i32,
            }),
        ),
        (
            "NewIntZero",
            Scenario::new(doc! {
                "query": { "_id": "int32-zero" },
                "update": { "_id": "int32-zero", "v": 43_i32 },
                "new": 0_i32,
            }),
        ),
        (
            "NewLongNonZero",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "_id": "int64", "v": 43_i64 },
                "new": 11_i64,
            }),
        ),
        (
            "NewLongZero",
            Scenario::new(doc! {
                "query": { "_id": "int64-zero" },
                "update": { "_id": "int64-zero", "v": 43_i64 },
                "new": 0_i64,
            }),
        ),
    ])
}

/// Malformed commands every system must reject.
pub fn errors() -> ScenarioTable {
    table([
        ("NotEnoughParameters", Scenario::new(doc! {}).expect_none()),
        (
            "UpdateAndRemove",
            Scenario::new(doc! { "update": {}, "remove": true }).expect_none(),
        ),
        (
            "NewAndRemove",
            Scenario::new(doc! { "new": true, "remove": true }).expect_none(),
        ),
        (
            "InvalidUpdateType",
            Scenario::new(doc! { "query": {}, "update": "123" }).expect_none(),
        ),
        (
            "InvalidMaxTimeMSType",
            Scenario::new(doc! { "maxTimeMS": "string" })
                .expect_none()
                .fails(issue(318)),
        ),
        (
            "DuplicateID",
            Scenario::new(doc! {
                "query": { "non-existent": "val" },
                "update": { "_id": "int32", "v": 43_i32 },
                "upsert": true,
            })
            .providers([INT32S])
            .expect_none()
            .fails(issue(894)),
        ),
        (
            "InvalidID",
            Scenario::new(doc! {
                "query": { "non-existent": "val" },
                "update": {
                    "_id": Bson::RegularExpression(Regex {
                        pattern: "[a-z]*[0-9]".to_string(),
                        options: String::new(),
                    }),
                    "v": 43_i32,
                },
                "upsert": true,
            })
            .providers([INT32S])
            .expect_none()
            .fails(issue(317)),
        ),
    ])
}

/// Replacement and operator updates, including operator conflicts.
pub fn update() -> ScenarioTable {
    table([
        (
            "Replace",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "_id": "int64", "v": 43_i64 },
            }),
        ),
        (
            "ReplaceWithoutID",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "v": 43_i64 },
            }),
        ),
        (
            "ReplaceReturnNew",
            Scenario::new(doc! {
                "query": { "_id": "int32" },
                "update": { "_id": "int32", "v": 43_i32 },
                "new": true,
            }),
        ),
        (
            "NotExistedIdInQuery",
            Scenario::new(doc! {
                "query": { "_id": "no-such-id" },
                "update": { "v": 43_i32 },
            }),
        ),
        (
            "NotExistedIdNotInQuery",
            Scenario::new(doc! {
                "query": { "$and": [{ "v": { "$gt": 0 } }, { "v": { "$lt": 0 } }] },
                "update": { "v": 43_i32 },
            }),
        ),
        (
            "UpdateOperatorSet",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "$set": { "v": 43_i64 } },
            }),
        ),
        (
            "UpdateOperatorSetReturnNew",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "$set": { "v": 43_i64 } },
                "new": true,
            }),
        ),
        (
            "EmptyUpdate",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "v": {} },
            }),
        ),
        (
            "Conflict",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": false } },
                "update": { "$invalid": "non-existent-field" },
            })
            .expect_none(),
        ),
        (
            "OperatorConflict",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": false } },
                "update": { "$set": { "v": 4 }, "$inc": { "v": 4 } },
            })
            .expect_none(),
        ),
        (
            "NoConflict",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "$set": { "v": 4 }, "$inc": { "foo": 4 } },
            }),
        ),
        (
            "EmptyKey",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "$set": { "": 4 }, "$inc": { "": 4 } },
            })
            .expect_none(),
        ),
        (
            "EmptyKeyAndKey",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "$set": { "": 4 }, "$inc": { "v": 4 } },
            })
            .expect_none(),
        ),
        (
            "InvalidOperator",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": false } },
                "update": { "$invalid": "non-existent-field" },
            })
            .expect_none(),
        ),
    ])
}

/// Dotted update paths into arrays of documents.
pub fn dot_notation() -> ScenarioTable {
    table([
        (
            "Conflict",
            Scenario::new(doc! {
                "query": { "_id": "array-documents-two-fields" },
                "update": { "$set": { "v.0.field": 4 }, "$inc": { "v.0.field": 4 } },
            })
            .expect_none(),
        ),
        (
            "NoConflict",
            Scenario::new(doc! {
                "query": { "_id": "array-documents-two-fields" },
                "update": { "$set": { "v.0.field": 4 }, "$inc": { "v.0.foo": 4 } },
            }),
        ),
        (
            "NoIndex",
            Scenario::new(doc! {
                "query": { "_id": "array-documents-two-fields" },
                "update": { "$set": { "v.0.field": 4 }, "$inc": { "v.field": 4 } },
            })
            .fails_for(issue(320), [ARRAY_AND_DOCUMENTS]),
        ),
        (
            "ParentConflict",
            Scenario::new(doc! {
                "query": { "_id": "array-documents-two-fields" },
                "update": { "$set": { "v.0.field": 4 }, "$inc": { "v": 4 } },
            })
            .expect_none(),
        ),
        (
            "ConflictKey",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": false } },
                "update": { "$set": { "v": "val" }, "$min": { "v.foo": "val" } },
            })
            .expect_none(),
        ),
        (
            "ConflictKeyPrefix",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": false } },
                "update": { "$set": { "v.foo": "val" }, "$min": { "v": "val" } },
            })
            .expect_none(),
        ),
    ])
}

/// `$set` against existing, missing and `_id` fields.
pub fn update_set() -> ScenarioTable {
    table([
        (
            "NonExistentExistsTrue",
            Scenario::new(doc! {
                "query": { "non-existent": { "$exists": true } },
                "update": { "$set": { "v": "foo" } },
            }),
        ),
        (
            "NonExistentExistsFalse",
            Scenario::new(doc! {
                "query": { "non-existent": { "$exists": false } },
                "update": { "$set": { "v": "foo" } },
            })
            .fails_for(issue(321), [STRINGS]),
        ),
        (
            "ExistsTrue",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": true } },
                "update": { "$set": { "v": "foo" } },
            })
            .fails_for(issue(321), [STRINGS]),
        ),
        (
            "ExistsFalse",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": false } },
                "update": { "$set": { "v": "foo" } },
            }),
        ),
        (
            "UpdateIDNoQuery",
            Scenario::new(doc! { "update": { "$set": { "_id": "int32" } } })
                .fails_for(issue(321), [INT32S]),
        ),
        (
            "UpdateExistingID",
            Scenario::new(doc! {
                "query": { "_id": "int32" },
                "update": { "$set": { "_id": "int32-1" } },
            }),
        ),
        (
            "UpdateSameID",
            Scenario::new(doc! {
                "query": { "_id": "int32" },
                "update": { "$set": { "_id": "int32" } },
            })
            .fails_for(issue(321), [INT32S, SCALARS]),
        ),
    ])
}

/// `$unset` against existing and missing fields.
pub fn unset() -> ScenarioTable {
    table([
        (
            "NonExistentExistsT",
            Scenario::new(doc! {
                "query": { "non-existent": { "$exists": true } },
                "update": { "$unset": { "v": "" } },
            }),
        ),
        (
            "NonExistentExistsF",
            Scenario::new(doc! {
                "query": { "non-existent": { "$exists": false } },
                "update": { "$unset": { "v": "" } },
            })
            .fails_for(issue(321), [UNSETS]),
        ),
        (
            "ExistsTrue",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": true } },
                "update": { "$unset": { "v": "" } },
            })
            .fails_for(issue(321), [UNSETS]),
        ),
        (
            "ExistsFalse",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": false } },
                "update": { "$unset": { "v": "" } },
            }),
        ),
        (
            "UnsetNonExistentField",
            Scenario::new(doc! {
                "query": { "_id": "double" },
                "update": { "$unset": { "non-existent-field": "" } },
            })
            .fails_for(issue(321), [SCALARS, DOUBLES, SMALL_DOUBLES]),
        ),
    ])
}

/// Malformed `$currentDate` operands.
///
/// The tracked divergence covers every provider that has no `datetime`
/// document.
pub fn update_current_date() -> ScenarioTable {
    let without_datetime = || all_except(&[SCALARS, DATE_TIMES]);
    table([
        (
            "NotDocument",
            Scenario::new(doc! {
                "query": { "_id": "datetime" },
                "update": { "$currentDate": 1 },
            })
            .expect_none(),
        ),
        (
            "UnknownOption",
            Scenario::new(doc! {
                "query": { "_id": "datetime" },
                "update": { "$currentDate": { "v": { "foo": 1_i32 } } },
            })
            .expect_none()
            .fails_for(issue(323), without_datetime()),
        ),
        (
            "InvalidType",
            Scenario::new(doc! {
                "query": { "_id": "datetime" },
                "update": { "$currentDate": { "v": { "$type": 1_i32 } } },
            })
            .expect_none()
            .fails_for(issue(323), without_datetime()),
        ),
        (
            "UnknownType",
            Scenario::new(doc! {
                "query": { "_id": "datetime" },
                "update": { "$currentDate": { "v": { "$type": "unknown" } } },
            })
            .expect_none()
            .fails_for(issue(323), without_datetime()),
        ),
        (
            "InvalidValue",
            Scenario::new(doc! {
                "query": { "_id": "datetime" },
                "update": { "$currentDate": { "v": 1 } },
            })
            .expect_none()
            .fails_for(issue(323), without_datetime()),
        ),
    ])
}

/// Malformed `$rename` operands.
pub fn update_rename() -> ScenarioTable {
    table([
        (
            "NotDocument",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "$rename": 1 },
            })
            .expect_none(),
        ),
        (
            "NonStringTargetField",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "$rename": { "v": 0 } },
            })
            .expect_none(),
        ),
        (
            "SameTargetField",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "$rename": { "v": "v" } },
            })
            .expect_none()
            .fails(issue(324)),
        ),
        (
            "DuplicateTarget",
            Scenario::new(doc! {
                "query": { "_id": "int64" },
                "update": { "$rename": { "v": "w", "x": "w" } },
            })
            .expect_none(),
        ),
    ])
}

/// Sort orders, including dotted and invalid sort keys.
pub fn sort() -> ScenarioTable {
    let nested = || {
        doc! {
            "_id": { "$in": ["array-documents-nested", "array-documents-nested-duplicate"] },
        }
    };
    let set_bar = || doc! { "$set": { "v.0.foo.0.bar": "baz" } };
    table([
        (
            "DotNotation",
            Scenario::new(doc! {
                "query": nested(),
                "update": set_bar(),
                "sort": { "v.0.foo": 1, "_id": 1 },
            }),
        ),
        (
            "DotNotationIndex",
            Scenario::new(doc! {
                "query": nested(),
                "update": set_bar(),
                "sort": { "v.0.foo.0.bar": 1, "_id": 1 },
            }),
        ),
        (
            "DotNotationNonExistent",
            Scenario::new(doc! {
                "query": nested(),
                "update": set_bar(),
                "sort": { "invalid.foo": 1, "_id": 1 },
            }),
        ),
        (
            "DotNotationMissingField",
            Scenario::new(doc! {
                "query": nested(),
                "update": set_bar(),
                "sort": { "v..foo": 1, "_id": 1 },
            })
            .expect_none()
            .fails(issue(321)),
        ),
        (
            "DollarPrefixedFieldName",
            Scenario::new(doc! {
                "query": nested(),
                "update": set_bar(),
                "sort": { "$v.foo": 1, "_id": 1 },
            })
            .expect_none()
            .fails(issue(321)),
        ),
    ])
}

/// Upserts with replacement documents.
pub fn upsert() -> ScenarioTable {
    table([
        (
            "UpsertNoSuchDocument",
            Scenario::new(doc! {
                "query": { "_id": "no-such-doc" },
                "update": { "$set": { "v": 43.13 } },
                "upsert": true,
                "new": true,
            }),
        ),
        (
            "UpsertNoReplaceDocument",
            Scenario::new(doc! {
                "query": { "_id": "no-such-doc" },
                "update": { "v": 43.13 },
                "upsert": true,
                "new": true,
            }),
        ),
        (
            "UpsertReplace",
            Scenario::new(doc! {
                "query": { "_id": "double" },
                "update": { "v": 43.13 },
                "upsert": true,
            }),
        ),
        (
            "UpsertReplaceReturnNew",
            Scenario::new(doc! {
                "query": { "_id": "double" },
                "update": { "v": 43.13 },
                "upsert": true,
                "new": true,
            }),
        ),
        (
            "ExistsNew",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": false } },
                "upsert": true,
                "update": { "_id": "replaced", "v": "replaced" },
                "new": true,
            }),
        ),
        (
            "ExistsFalse",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": false } },
                "upsert": true,
                "update": { "_id": "replaced", "v": "replaced" },
            }),
        ),
        (
            "UpdateID",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": true } },
                "upsert": true,
                "update": { "_id": "int32", "v": "replaced" },
            }),
        ),
        (
            // _id is immutable
            "UpdateDifferentID",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": true } },
                "upsert": true,
                "update": { "_id": "replaced", "v": "replaced" },
            })
            .expect_none(),
        ),
        (
            "ExistsTrue",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": true } },
                "upsert": true,
                "update": { "v": "replaced" },
            }),
        ),
    ])
}

/// Upserts with `$set`, including query-seeded inserts.
pub fn upsert_set() -> ScenarioTable {
    table([
        (
            "Upsert",
            Scenario::new(doc! {
                "query": { "_id": "double" },
                "update": { "$set": { "v": 43.13 } },
                "upsert": true,
            }),
        ),
        (
            "UpsertNew",
            Scenario::new(doc! {
                "query": { "_id": "double" },
                "update": { "$set": { "v": 43.13 } },
                "upsert": true,
                "new": true,
            }),
        ),
        (
            "UpsertNonExistent",
            Scenario::new(doc! {
                "query": { "_id": "non-existent" },
                "upsert": true,
                "update": { "$set": { "v": "43" } },
            }),
        ),
        (
            "UpsertNewNonExistent",
            Scenario::new(doc! {
                "query": { "_id": "non-existent" },
                "upsert": true,
                "update": { "$set": { "v": "43" } },
                "new": true,
            }),
        ),
        (
            "NonExistentExistsFalse",
            Scenario::new(doc! {
                "query": { "non-existent": { "$exists": false } },
                "upsert": true,
                "update": { "$set": { "v": "foo" } },
            })
            .fails_for(issue(321), [STRINGS]),
        ),
        (
            "ExistsTrue",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": true } },
                "upsert": true,
                "update": { "$set": { "v": "foo" } },
            })
            .fails_for(issue(321), [STRINGS]),
        ),
        (
            // _id is immutable
            "UpsertID",
            Scenario::new(doc! {
                "query": { "_id": "non-existent" },
                "upsert": true,
                "update": { "$set": { "_id": "double" } },
            })
            .expect_none(),
        ),
        (
            "UpsertIDNoQuery",
            Scenario::new(doc! {
                "upsert": true,
                "update": { "$set": { "_id": "int32", "v": 2_i32 } },
            }),
        ),
        (
            "UpsertExistingID",
            Scenario::new(doc! {
                "query": { "_id": "int32" },
                "upsert": true,
                "update": { "$set": { "_id": "int32-1", "v": 2_i32 } },
            })
            .expect_none(),
        ),
        (
            "UpsertSameID",
            Scenario::new(doc! {
                "query": { "_id": "int32" },
                "upsert": true,
                "update": { "$set": { "_id": "int32", "v": 2_i32 } },
            }),
        ),
        (
            "UpsertQueryOperatorEq",
            Scenario::new(doc! {
                "query": { "_id": { "$eq": "non-existent" } },
                "upsert": true,
                "update": { "$set": { "new": "val" } },
            }),
        ),
        (
            "UpsertQueryOperatorMixed",
            Scenario::new(doc! {
                "query": {
                    "_id": { "$eq": "non-existent" },
                    "v": { "$lt": 43 },
                    "non_existent": 0_i32,
                },
                "upsert": true,
                "update": { "$set": { "new": "val" } },
            }),
        ),
        (
            "UpsertQueryObject",
            Scenario::new(doc! {
                "query": { "_id": "non-existent", "v": { "k1": "v1" } },
                "upsert": true,
                "update": { "$set": { "new": "val" } },
            }),
        ),
        (
            "UpsertQueryObjectNested",
            Scenario::new(doc! {
                "query": { "_id": "non-existent", "v": { "k1": "v1", "k2": { "k21": "v21" } } },
                "upsert": true,
                "update": { "$set": { "new": "val" } },
            }),
        ),
    ])
}

/// `$setOnInsert` with and without an insert.
pub fn set_on_insert() -> ScenarioTable {
    table([
        (
            "IDExists",
            Scenario::new(doc! {
                "query": { "_id": "int32" },
                "upsert": true,
                "new": true,
                "update": { "$setOnInsert": { "new": "val" } },
            })
            .providers([INT32S])
            .fails_for(issue(321), [INT32S]),
        ),
        (
            "IDNotExists",
            Scenario::new(doc! {
                "query": { "_id": "non-existent" },
                "upsert": true,
                "new": true,
                "update": { "$setOnInsert": { "new": "val" } },
            }),
        ),
        (
            "UpsertFalse",
            Scenario::new(doc! {
                "query": { "_id": "non-existent" },
                "upsert": false,
                "new": true,
                "update": { "$setOnInsert": { "new": "val" } },
            }),
        ),
        (
            "SetWithSetOnInsert",
            Scenario::new(doc! {
                "query": { "_id": "non-existent" },
                "upsert": true,
                "new": true,
                "update": { "$set": { "new": "val" }, "$setOnInsert": { "v": 42_i32 } },
            }),
        ),
        (
            "ApplySetSkipSetOnInsert",
            Scenario::new(doc! {
                "query": { "_id": "int32" },
                "upsert": true,
                "new": true,
                "update": { "$set": { "new": "val" }, "$setOnInsert": { "v": 43_i32 } },
            })
            .providers([INT32S]),
        ),
    ])
}

/// Upserts with `$unset`.
pub fn upsert_unset() -> ScenarioTable {
    table([
        (
            "NonExistentExistsT",
            Scenario::new(doc! {
                "query": { "non-existent": { "$exists": true } },
                "upsert": true,
                // same _id on both systems
                "update": { "$unset": { "v": "" }, "$set": { "_id": "upserted" } },
            }),
        ),
        (
            "NonExistentExistsF",
            Scenario::new(doc! {
                "query": { "non-existent": { "$exists": false } },
                "upsert": true,
                "update": { "$unset": { "v": "" } },
            })
            .fails_for(issue(321), [UNSETS]),
        ),
        (
            "ExistsTrue",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": true } },
                "upsert": true,
                "update": { "$unset": { "v": "" } },
            })
            .fails_for(issue(321), [UNSETS]),
        ),
        (
            "ExistsFalse",
            Scenario::new(doc! {
                "query": { "_id": { "$exists": false } },
                "upsert": true,
                "update": { "$unset": { "v": "" }, "$set": { "_id": "upserted" } },
            }),
        ),
        (
            "UnsetNonExistentField",
            Scenario::new(doc! {
                "query": { "_id": "double" },
                "upsert": true,
                "update": { "$unset": { "non-existent-field": "" } },
            })
            .fails_for(issue(321), [SCALARS, DOUBLES, SMALL_DOUBLES]),
        ),
    ])
}

/// `remove: true`.
pub fn remove() -> ScenarioTable {
    table([
        (
            "Remove",
            Scenario::new(doc! { "query": { "_id": "double" }, "remove": true }),
        ),
        (
            "RemoveEmptyQueryResult",
            Scenario::new(doc! {
                "query": { "$and": [{ "v": { "$gt": 0 } }, { "v": { "$lt": 0 } }] },
                "remove": true,
            }),
        ),
    ])
}

/// Replacement documents without a query.
pub fn replacement_doc() -> ScenarioTable {
    table([
        ("Basic", Scenario::new(doc! { "update": { "v": 43_i32 } })),
        (
            "EmptyDoc",
            Scenario::new(doc! { "update": {} }).fails_for(issue(321), [UNSETS]),
        ),
        (
            "FilterAndUpsertTrue",
            Scenario::new(doc! {
                "query": { "_id": "non-existent" },
                "update": { "v": 43_i32 },
                "upsert": true,
            }),
        ),
        (
            "WithUpdateOp",
            Scenario::new(doc! { "update": { "v": 43_i32, "$set": { "test": 0_i32 } } })
                .expect_none(),
        ),
        (
            "SameId",
            Scenario::new(doc! {
                "query": { "_id": "int32" },
                "update": { "_id": "int32", "v": 43_i32 },
            }),
        ),
        (
            "DifferentId",
            Scenario::new(doc! {
                "query": { "_id": "int32" },
                "update": { "_id": "non-existent", "v": 43_i32 },
            }),
        ),
    ])
}
