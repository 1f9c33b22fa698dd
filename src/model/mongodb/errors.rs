//! For some reason, the mongodb crate doesn't provide error code constants.
//! This module fills in the gaps.

use mongodb::error::{
    Error as DbError, ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR,
    UNKNOWN_TRANSACTION_COMMIT_RESULT,
};

pub const DUPLICATE_KEY: i32 = 11000;

/// Return true if the given error is a duplicate key violation, whether it came
/// from a plain write or from a command such as `findAndModify`.
pub fn is_duplicate_key_error(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(ref e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Return true if the server aborted the transaction in a way that a fresh
/// attempt may succeed, e.g. a write conflict with a concurrent transaction.
pub fn is_transient_transaction_error(err: &DbError) -> bool {
    err.contains_label(TRANSIENT_TRANSACTION_ERROR)
}

/// Return true if a commit may or may not have applied, so committing again is safe.
pub fn is_unknown_commit_result(err: &DbError) -> bool {
    err.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn unlabelled_errors_are_final() {
        let err = DbError::from(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(!is_duplicate_key_error(&err));
        assert!(!is_transient_transaction_error(&err));
        assert!(!is_unknown_commit_result(&err));
    }
}
