//! Persistence for users, candidates and settings.
//!
//! The voting core only talks to these traits. [`MongoStore`] backs the
//! running server; [`MemoryStore`] backs the tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{
    db::{Candidate, CandidateFields, NewCandidate, NewUser, SettingValue, User},
    mongodb::Id,
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// The store handle placed in Rocket's managed state.
pub type SharedStore = Arc<dyn Store>;

/// User records.
#[rocket::async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new user. Fails with `Conflict` if the national ID is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn user_by_id(&self, id: Id) -> Result<Option<User>>;

    async fn user_by_national_id(&self, national_id: &str) -> Result<Option<User>>;

    /// Whether any admin account exists.
    async fn admin_exists(&self) -> Result<bool>;

    /// Replace a user's password hash. Fails with `NotFound` if the user is gone.
    async fn set_password_hash(&self, id: Id, password_hash: String) -> Result<()>;
}

/// Candidates and the ballots cast for them.
#[rocket::async_trait]
pub trait CandidateLedger: Send + Sync {
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate>;

    async fn candidate_by_id(&self, id: Id) -> Result<Option<Candidate>>;

    async fn candidates(&self) -> Result<Vec<Candidate>>;

    /// Overwrite the editable fields, leaving ballots and the total alone.
    /// Returns `None` if the candidate doesn't exist.
    async fn update_candidate_fields(
        &self,
        id: Id,
        fields: CandidateFields,
    ) -> Result<Option<Candidate>>;

    /// Remove a candidate together with its ballots, returning what was removed.
    async fn delete_candidate(&self, id: Id) -> Result<Option<Candidate>>;
}

/// Generic key/value settings.
#[rocket::async_trait]
pub trait SettingsStore: Send + Sync {
    async fn setting(&self, key: &str) -> Result<Option<SettingValue>>;

    /// Create or overwrite a setting, returning the stored value.
    async fn upsert_setting(&self, key: &str, value: SettingValue) -> Result<SettingValue>;
}

/// Everything the server needs, plus the one operation that spans two components.
#[rocket::async_trait]
pub trait Store: IdentityStore + CandidateLedger + SettingsStore {
    /// Atomically flip the voter's `has_voted` flag from false to true and append
    /// their ballot to the candidate, bumping its total.
    ///
    /// Either every write lands or none does:
    /// - `Conflict` if the user is not a voter who has yet to vote.
    /// - `NotFound` if the candidate does not exist.
    ///
    /// Returns the candidate as it is after the ballot was recorded.
    async fn commit_vote(
        &self,
        voter: Id,
        candidate: Id,
        voted_at: DateTime<Utc>,
    ) -> Result<Candidate>;
}
