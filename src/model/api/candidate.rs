use serde::{Deserialize, Serialize};

use crate::model::db::{Candidate, CandidateFields};

/// A new candidate, as submitted by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
    pub party: String,
    pub age: u32,
}

impl From<CandidateSpec> for CandidateFields {
    fn from(spec: CandidateSpec) -> Self {
        Self {
            name: spec.name,
            party: spec.party,
            age: spec.age,
        }
    }
}

/// A partial update. Absent fields keep their current value; ballot data
/// cannot be changed through this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidatePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
}

impl CandidatePatch {
    /// Merge onto existing fields.
    pub fn apply(self, current: &CandidateFields) -> CandidateFields {
        CandidateFields {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            party: self.party.unwrap_or_else(|| current.party.clone()),
            age: self.age.unwrap_or(current.age),
        }
    }
}

/// Public listing entry, reporting the cached vote total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: String,
    pub name: String,
    pub party: String,
    pub age: u32,
    pub vote_count: u64,
}

impl From<Candidate> for CandidateSummary {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id.to_string(),
            vote_count: candidate.candidate.vote_count,
            name: candidate.candidate.fields.name,
            party: candidate.candidate.fields.party,
            age: candidate.candidate.fields.age,
        }
    }
}

/// One row of the tally, counted from the ballots themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyEntry {
    pub name: String,
    pub party: String,
    pub vote_count: u64,
}

impl From<&Candidate> for TallyEntry {
    fn from(candidate: &Candidate) -> Self {
        Self {
            name: candidate.name.clone(),
            party: candidate.party.clone(),
            vote_count: candidate.counted_votes(),
        }
    }
}

/// Confirmation of a committed vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub candidate_name: String,
    pub party: String,
    pub total_votes: u64,
}

impl From<Candidate> for VoteReceipt {
    fn from(candidate: Candidate) -> Self {
        Self {
            total_votes: candidate.candidate.vote_count,
            candidate_name: candidate.candidate.fields.name,
            party: candidate.candidate.fields.party,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl CandidateSpec {
        pub fn example() -> Self {
            CandidateFields::example().into()
        }

        pub fn example2() -> Self {
            CandidateFields::example2().into()
        }
    }

    impl From<CandidateFields> for CandidateSpec {
        fn from(fields: CandidateFields) -> Self {
            Self {
                name: fields.name,
                party: fields.party,
                age: fields.age,
            }
        }
    }
}
