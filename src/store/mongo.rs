use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use mongodb::{
    bson::{doc, to_bson, Bson},
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Client, ClientSession, Database,
};
use rocket::{futures::TryStreamExt, tokio::time::sleep};

use crate::error::{Error, Result};
use crate::model::{
    db::{
        Ballot, Candidate, CandidateFields, NewCandidate, NewUser, Role, Setting, SettingValue,
        User,
    },
    mongodb::{
        is_duplicate_key_error, is_transient_transaction_error, is_unknown_commit_result, Coll, Id,
    },
};

use super::{CandidateLedger, IdentityStore, SettingsStore, Store};

/// A store backed by MongoDB.
///
/// Vote commits use multi-document transactions, so the deployment must be a
/// replica set (a single-node replica set is enough).
pub struct MongoStore {
    client: Client,
    users: Coll<User>,
    new_users: Coll<NewUser>,
    candidates: Coll<Candidate>,
    new_candidates: Coll<NewCandidate>,
    settings: Coll<Setting>,
}

impl MongoStore {
    pub fn new(client: Client, db: &Database) -> Self {
        Self {
            client,
            users: Coll::from_db(db),
            new_users: Coll::from_db(db),
            candidates: Coll::from_db(db),
            new_candidates: Coll::from_db(db),
            settings: Coll::from_db(db),
        }
    }

    /// The two writes of a vote, run inside the caller's transaction.
    async fn commit_vote_in(
        &self,
        session: &mut ClientSession,
        voter: Id,
        candidate: Id,
        voted_at: DateTime<Utc>,
    ) -> Result<Candidate> {
        // Compare-and-set the flag. This is the serialisation point between
        // concurrent attempts by the same voter.
        let filter = doc! {
            "_id": *voter,
            "role": Role::Voter.to_string(),
            "has_voted": false,
        };
        let update = doc! {
            "$set": { "has_voted": true }
        };
        let result = self
            .users
            .update_one_with_session(filter, update, None, session)
            .await?;
        if result.modified_count != 1 {
            return Err(Error::conflict(format!("User {voter} cannot cast a ballot")));
        }

        // Append the ballot and bump the total in the same document write.
        let ballot = Ballot {
            user: voter,
            voted_at,
        };
        let ballot: Bson = to_bson(&ballot)?;
        let update = doc! {
            "$push": { "votes": ballot },
            "$inc": { "vote_count": 1_i64 },
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.candidates
            .find_one_and_update_with_session(candidate.as_doc(), update, options, session)
            .await
            .map_err(|e| {
                if is_duplicate_key_error(&e) {
                    Error::conflict(format!("User {voter} already has a ballot recorded"))
                } else {
                    e.into()
                }
            })?
            .ok_or_else(|| Error::not_found(format!("Candidate {candidate}")))
    }
}

#[rocket::async_trait]
impl IdentityStore for MongoStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let id: Id = match self.new_users.insert_one(&user, None).await {
            Ok(result) => result
                .inserted_id
                .as_object_id()
                .ok_or_else(|| Error::not_found("Inserted user ID"))?
                .into(),
            // Either the national ID index or the single-admin index.
            Err(e) if is_duplicate_key_error(&e) => {
                let taken = self
                    .user_by_national_id(&user.national_id)
                    .await?
                    .is_some();
                return Err(if taken || user.role != Role::Admin {
                    Error::conflict(format!(
                        "A user with national ID {} already exists",
                        user.national_id
                    ))
                } else {
                    Error::conflict("An admin user already exists")
                });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(User { id, user })
    }

    async fn user_by_id(&self, id: Id) -> Result<Option<User>> {
        Ok(self.users.find_one(id.as_doc(), None).await?)
    }

    async fn user_by_national_id(&self, national_id: &str) -> Result<Option<User>> {
        let filter = doc! {
            "national_id": national_id,
        };
        Ok(self.users.find_one(filter, None).await?)
    }

    async fn admin_exists(&self) -> Result<bool> {
        let filter = doc! {
            "role": Role::Admin.to_string(),
        };
        Ok(self.users.count_documents(filter, None).await? > 0)
    }

    async fn set_password_hash(&self, id: Id, password_hash: String) -> Result<()> {
        let update = doc! {
            "$set": { "password_hash": password_hash }
        };
        let result = self.users.update_one(id.as_doc(), update, None).await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("User {id}")));
        }
        Ok(())
    }
}

#[rocket::async_trait]
impl CandidateLedger for MongoStore {
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let id: Id = self
            .new_candidates
            .insert_one(&candidate, None)
            .await?
            .inserted_id
            .as_object_id()
            .ok_or_else(|| Error::not_found("Inserted candidate ID"))?
            .into();
        Ok(Candidate { id, candidate })
    }

    async fn candidate_by_id(&self, id: Id) -> Result<Option<Candidate>> {
        Ok(self.candidates.find_one(id.as_doc(), None).await?)
    }

    async fn candidates(&self) -> Result<Vec<Candidate>> {
        let candidates: Vec<Candidate> = self
            .candidates
            .find(None, None)
            .await?
            .try_collect()
            .await?;
        Ok(candidates)
    }

    async fn update_candidate_fields(
        &self,
        id: Id,
        fields: CandidateFields,
    ) -> Result<Option<Candidate>> {
        let update = doc! {
            "$set": {
                "name": fields.name,
                "party": fields.party,
                "age": i64::from(fields.age),
            }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .candidates
            .find_one_and_update(id.as_doc(), update, options)
            .await?)
    }

    async fn delete_candidate(&self, id: Id) -> Result<Option<Candidate>> {
        // Ballots are embedded, so they go with the document.
        Ok(self.candidates.find_one_and_delete(id.as_doc(), None).await?)
    }
}

#[rocket::async_trait]
impl SettingsStore for MongoStore {
    async fn setting(&self, key: &str) -> Result<Option<SettingValue>> {
        let filter = doc! {
            "key": key,
        };
        let setting = self.settings.find_one(filter, None).await?;
        Ok(setting.map(|setting| setting.value))
    }

    async fn upsert_setting(&self, key: &str, value: SettingValue) -> Result<SettingValue> {
        let filter = doc! {
            "key": key,
        };
        let value_bson: Bson = to_bson(&value)?;
        let update = doc! {
            "$set": { "key": key, "value": value_bson }
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let setting = self
            .settings
            .find_one_and_update(filter, update, options)
            .await?;
        Ok(setting.map(|setting| setting.value).unwrap_or(value))
    }
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn commit_vote(
        &self,
        voter: Id,
        candidate: Id,
        voted_at: DateTime<Utc>,
    ) -> Result<Candidate> {
        let mut session = self.client.start_session(None).await?;
        let mut attempt = 1;

        loop {
            session.start_transaction(None).await?;
            let result = match self
                .commit_vote_in(&mut session, voter, candidate, voted_at)
                .await
            {
                Ok(updated) => commit_with_retry(&mut session).await.map(|()| updated),
                Err(e) => {
                    if let Err(abort_err) = session.abort_transaction().await {
                        debug!("Abort of vote transaction for {voter} failed: {abort_err}");
                    }
                    Err(e)
                }
            };

            match result {
                Err(e) if is_transient(&e) && attempt < MAX_VOTE_ATTEMPTS => {
                    warn!("Retrying vote transaction for {voter} (attempt {attempt}): {e}");
                    sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt))).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// How many times a vote transaction is run before a transient failure is reported.
const MAX_VOTE_ATTEMPTS: u32 = 5;

const RETRY_BACKOFF_MS: u64 = 10;

/// Whether the failed transaction may be run again from the start.
///
/// Only database errors carry transaction labels. A refused ballot is final.
fn is_transient(err: &Error) -> bool {
    match err {
        Error::Unavailable(e) => is_transient_transaction_error(e),
        _ => false,
    }
}

/// Commit, repeating the commit alone while its outcome is unknown.
async fn commit_with_retry(session: &mut ClientSession) -> Result<()> {
    loop {
        match session.commit_transaction().await {
            Err(e) if is_unknown_commit_result(&e) => {
                debug!("Vote commit outcome unknown, committing again: {e}");
            }
            result => return Ok(result?),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use mongodb::error::Error as DbError;

    use super::*;

    #[test]
    fn refusals_are_not_retried() {
        assert!(!is_transient(&Error::conflict("User cannot cast a ballot")));
        assert!(!is_transient(&Error::not_found("Candidate")));
        let dropped = DbError::from(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(!is_transient(&Error::Unavailable(dropped)));
    }
}
