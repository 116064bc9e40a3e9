use alpha_vault_core::id::UserIdParseError;
use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    Database {
        source: redb::DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
    Transaction {
        source: Box<redb::TransactionError>,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Table {
        source: redb::TableError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Storage {
        source: redb::StorageError,
        #[snafu(implicit)]
        location: Location,
    },
    Commit {
        source: redb::CommitError,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(display("Session storage error"))]
    Store { source: StoreError },
    #[snafu(display("Stored user id is corrupt"))]
    CorruptUserId { source: UserIdParseError },
    #[snafu(display("Cached profile is not valid JSON"))]
    CorruptProfile { source: serde_json::Error },
    #[snafu(display("Profile could not be encoded"))]
    ProfileEncode { source: serde_json::Error },
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
