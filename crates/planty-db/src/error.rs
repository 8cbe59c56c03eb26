use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE or PRIMARY KEY constraint rejected a write.
    /// `column` is the qualified column SQLite reports, e.g. `users.email`.
    #[error("unique constraint failed: {column}")]
    Conflict { column: String },

    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, Some(msg)) = &err {
            let unique = code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY;
            if unique {
                let column = msg
                    .strip_prefix("UNIQUE constraint failed: ")
                    .unwrap_or(msg)
                    .to_string();
                return DbError::Conflict { column };
            }
        }
        DbError::Sqlite(err)
    }
}

impl DbError {
    /// True when this is a uniqueness violation on `table.column`.
    pub fn is_conflict_on(&self, qualified_column: &str) -> bool {
        matches!(self, DbError::Conflict { column } if column.split(", ").any(|c| c == qualified_column))
    }
}
