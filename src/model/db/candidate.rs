use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A single recorded vote. Owned by the candidate it was cast for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// The voter who cast this ballot.
    pub user: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub voted_at: DateTime<Utc>,
}

/// The admin-editable fields of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFields {
    pub name: String,
    pub party: String,
    pub age: u32,
}

/// Core candidate data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    #[serde(flatten)]
    pub fields: CandidateFields,
    /// Cached running total. Always equal to `votes.len()` after a committed write.
    pub vote_count: u64,
    pub votes: Vec<Ballot>,
}

impl CandidateCore {
    /// A candidate with no votes yet.
    pub fn new(fields: CandidateFields) -> Self {
        Self {
            fields,
            vote_count: 0,
            votes: Vec::new(),
        }
    }

    /// Append a ballot, keeping the cached total in step.
    pub fn record(&mut self, ballot: Ballot) {
        self.votes.push(ballot);
        self.vote_count += 1;
    }

    /// The tally recomputed from the ballots themselves.
    pub fn counted_votes(&self) -> u64 {
        self.votes.len() as u64
    }

    pub fn has_ballot_from(&self, voter: Id) -> bool {
        self.votes.iter().any(|ballot| ballot.user == voter)
    }
}

impl Deref for CandidateCore {
    type Target = CandidateFields;

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
