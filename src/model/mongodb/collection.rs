use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::db::{Candidate, NewCandidate, NewUser, Role, Setting, User};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// User collections
const USERS: &str = "users";
impl MongoCollection for User {
    const NAME: &'static str = USERS;
}
impl MongoCollection for NewUser {
    const NAME: &'static str = USERS;
}

// Candidate collections
const CANDIDATES: &str = "candidates";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATES;
}
impl MongoCollection for NewCandidate {
    const NAME: &'static str = CANDIDATES;
}

// Settings collection
const SETTINGS: &str = "settings";
impl MongoCollection for Setting {
    const NAME: &'static str = SETTINGS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // User collection: one account per national ID.
    let user_index = IndexModel::builder()
        .keys(doc! {"national_id": 1})
        .options(unique.clone())
        .build();
    Coll::<User>::from_db(db)
        .create_index(user_index, None)
        .await?;

    // User collection: at most one admin. Voters are left out of the index.
    let admin_index = IndexModel::builder()
        .keys(doc! {"role": 1})
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(doc! {"role": Role::Admin.to_string()})
                .build(),
        )
        .build();
    Coll::<User>::from_db(db)
        .create_index(admin_index, None)
        .await?;

    // Candidate collection: a voter may appear in at most one ballot across all
    // candidates. Candidates without ballots are left out of the index.
    let ballot_index = IndexModel::builder()
        .keys(doc! {"votes.user": 1})
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(doc! {"votes.user": {"$exists": true}})
                .build(),
        )
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(ballot_index, None)
        .await?;

    // Settings collection.
    let setting_index = IndexModel::builder()
        .keys(doc! {"key": 1})
        .options(unique)
        .build();
    Coll::<Setting>::from_db(db)
        .create_index(setting_index, None)
        .await?;

    Ok(())
}
