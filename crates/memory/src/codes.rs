//! Server error codes the engine reports
//!
//! Codes and names follow the reference server so that structural error
//! comparison between this engine and a real deployment is meaningful.

use bson::Bson;
use doccompat_core::BackendError;

pub(crate) fn internal_error(message: impl Into<String>) -> BackendError {
    BackendError::command(1, "InternalError", message)
}

pub(crate) fn bad_value(message: impl Into<String>) -> BackendError {
    BackendError::command(2, "BadValue", message)
}

pub(crate) fn failed_to_parse(message: impl Into<String>) -> BackendError {
    BackendError::command(9, "FailedToParse", message)
}

pub(crate) fn type_mismatch(message: impl Into<String>) -> BackendError {
    BackendError::command(14, "TypeMismatch", message)
}

pub(crate) fn path_not_viable(field: &str, element: &Bson) -> BackendError {
    BackendError::command(
        28,
        "PathNotViable",
        format!("Cannot create field '{}' in element {{{}}}", field, element),
    )
}

pub(crate) fn conflicting_update_operators(path: &str, conflict: &str) -> BackendError {
    BackendError::command(
        40,
        "ConflictingUpdateOperators",
        format!("Updating the path '{}' would create a conflict at '{}'", path, conflict),
    )
}

pub(crate) fn dollar_prefixed_field_name(field: &str) -> BackendError {
    BackendError::command(
        52,
        "DollarPrefixedFieldName",
        format!(
            "The dollar ($) prefixed field '{}' in '{}' is not allowed in the context of an update's replacement document",
            field, field
        ),
    )
}

pub(crate) fn empty_field_name(message: impl Into<String>) -> BackendError {
    BackendError::command(56, "EmptyFieldName", message)
}

pub(crate) fn command_not_found(command: &str) -> BackendError {
    BackendError::command(59, "CommandNotFound", format!("no such command: '{}'", command))
}

pub(crate) fn immutable_field(message: impl Into<String>) -> BackendError {
    BackendError::command(66, "ImmutableField", message)
}

pub(crate) fn invalid_sort_order() -> BackendError {
    BackendError::command(
        15975,
        "Location15975",
        "$sort key ordering must be 1 (for ascending) or -1 (for descending)",
    )
}

pub(crate) fn empty_field_path() -> BackendError {
    BackendError::command(15998, "Location15998", "FieldPath field names may not be empty strings.")
}

pub(crate) fn dollar_field_path(path: &str) -> BackendError {
    BackendError::command(
        16410,
        "Location16410",
        format!(
            "FieldPath field names may not start with '$'. Consider using $getField or $setField. ({})",
            path
        ),
    )
}

pub(crate) fn unknown_field(command: &str, field: &str) -> BackendError {
    BackendError::command(
        40415,
        "Location40415",
        format!("BSON field '{}.{}' is an unknown field.", command, field),
    )
}

pub(crate) fn duplicate_key(collection: &str, id: &Bson) -> BackendError {
    BackendError::command(
        11000,
        "DuplicateKey",
        format!(
            "E11000 duplicate key error collection: {} index: _id_ dup key: {{ _id: {} }}",
            collection, id
        ),
    )
}

/// Display name of a value's type, as the reference server spells it.
pub(crate) fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Document(_) => "object",
        Bson::Array(_) => "array",
        Bson::Binary(_) => "binData",
        Bson::ObjectId(_) => "objectId",
        Bson::Boolean(_) => "bool",
        Bson::DateTime(_) => "date",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::Int32(_) => "int",
        Bson::Timestamp(_) => "timestamp",
        Bson::Int64(_) => "long",
        Bson::Decimal128(_) => "decimal",
        _ => "unknown",
    }
}
