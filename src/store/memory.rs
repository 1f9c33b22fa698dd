use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rocket::tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::{
    db::{Ballot, Candidate, CandidateFields, NewCandidate, NewUser, Role, SettingValue, User},
    mongodb::Id,
};

use super::{CandidateLedger, IdentityStore, SettingsStore, Store};

#[derive(Default)]
struct Tables {
    users: HashMap<Id, User>,
    candidates: HashMap<Id, Candidate>,
    settings: HashMap<String, SettingValue>,
}

/// A store held entirely in process memory.
///
/// A single lock guards all three tables, so `commit_vote` checks the voter and
/// writes both documents without anything interleaving.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl IdentityStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|existing| existing.national_id == user.national_id)
        {
            return Err(Error::conflict(format!(
                "A user with national ID {} already exists",
                user.national_id
            )));
        }
        if user.role == Role::Admin && tables.users.values().any(|u| u.role == Role::Admin) {
            return Err(Error::conflict("An admin user already exists"));
        }
        let user = User {
            id: Id::new(),
            user,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Id) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn user_by_national_id(&self, national_id: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.national_id == national_id)
            .cloned())
    }

    async fn admin_exists(&self) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|user| user.role == Role::Admin))
    }

    async fn set_password_hash(&self, id: Id, password_hash: String) -> Result<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("User {id}")))?;
        user.password_hash = password_hash;
        Ok(())
    }
}

#[rocket::async_trait]
impl CandidateLedger for MemoryStore {
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let candidate = Candidate {
            id: Id::new(),
            candidate,
        };
        self.tables
            .write()
            .await
            .candidates
            .insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn candidate_by_id(&self, id: Id) -> Result<Option<Candidate>> {
        Ok(self.tables.read().await.candidates.get(&id).cloned())
    }

    async fn candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self
            .tables
            .read()
            .await
            .candidates
            .values()
            .cloned()
            .collect())
    }

    async fn update_candidate_fields(
        &self,
        id: Id,
        fields: CandidateFields,
    ) -> Result<Option<Candidate>> {
        let mut tables = self.tables.write().await;
        Ok(tables.candidates.get_mut(&id).map(|candidate| {
            candidate.fields = fields;
            candidate.clone()
        }))
    }

    async fn delete_candidate(&self, id: Id) -> Result<Option<Candidate>> {
        Ok(self.tables.write().await.candidates.remove(&id))
    }
}

#[rocket::async_trait]
impl SettingsStore for MemoryStore {
    async fn setting(&self, key: &str) -> Result<Option<SettingValue>> {
        Ok(self.tables.read().await.settings.get(key).cloned())
    }

    async fn upsert_setting(&self, key: &str, value: SettingValue) -> Result<SettingValue> {
        self.tables
            .write()
            .await
            .settings
            .insert(key.to_string(), value.clone());
        Ok(value)
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn commit_vote(
        &self,
        voter: Id,
        candidate: Id,
        voted_at: DateTime<Utc>,
    ) -> Result<Candidate> {
        let mut tables = self.tables.write().await;
        let Tables {
            users, candidates, ..
        } = &mut *tables;

        // Check everything before touching anything.
        let user = users
            .get_mut(&voter)
            .filter(|user| user.role == Role::Voter && !user.has_voted)
            .ok_or_else(|| Error::conflict(format!("User {voter} cannot cast a ballot")))?;
        let candidate = candidates
            .get_mut(&candidate)
            .ok_or_else(|| Error::not_found(format!("Candidate {candidate}")))?;

        user.has_voted = true;
        candidate.record(Ballot {
            user: voter,
            voted_at,
        });
        Ok(candidate.clone())
    }
}
