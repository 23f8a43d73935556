//! Driver error mapping

use doccompat_core::BackendError;
use mongodb::error::{Error, ErrorKind, WriteFailure};

/// Map a driver error onto a [`BackendError`].
///
/// Server command and write errors keep their code and code name so they
/// compare structurally; everything else is a transport failure.
pub fn map_error(err: Error) -> BackendError {
    match *err.kind {
        ErrorKind::Command(ref c) => {
            BackendError::command(c.code, c.code_name.clone(), c.message.clone())
        }
        ErrorKind::Write(WriteFailure::WriteError(ref w)) => BackendError::command(
            w.code,
            w.code_name.clone().unwrap_or_default(),
            w.message.clone(),
        ),
        ErrorKind::BsonDeserialization(ref e) => BackendError::Decode { reason: e.to_string() },
        _ => BackendError::transport(err.to_string()),
    }
}
