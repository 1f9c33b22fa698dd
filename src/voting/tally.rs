use std::cmp::Reverse;

use log::debug;

use crate::error::Result;
use crate::model::api::candidate::{CandidateSummary, TallyEntry};
use crate::store::Store;

/// Every candidate with their cached total. Unordered.
pub async fn list_candidates(store: &dyn Store) -> Result<Vec<CandidateSummary>> {
    let candidates = store.candidates().await?;
    Ok(candidates.into_iter().map(CandidateSummary::from).collect())
}

/// Per-candidate totals recounted from the stored ballots, highest first.
///
/// This deliberately ignores the cached total, so a document edited behind the
/// service's back still reports what was actually cast. Not gated by the
/// results visibility flag.
pub async fn vote_tally(store: &dyn Store) -> Result<Vec<TallyEntry>> {
    let candidates = store.candidates().await?;
    let mut tally: Vec<TallyEntry> = candidates.iter().map(TallyEntry::from).collect();
    tally.sort_by(|a, b| {
        (Reverse(a.vote_count), &a.name).cmp(&(Reverse(b.vote_count), &b.name))
    });
    debug!("Tallied {} candidate(s)", tally.len());
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::api::candidate::CandidateSpec;
    use crate::model::db::{Ballot, CandidateFields, NewCandidate};
    use crate::model::mongodb::Id;
    use crate::store::{CandidateLedger, MemoryStore};
    use crate::voting::{add_candidate, cast_vote, testing::populated};

    #[rocket::async_test]
    async fn empty() {
        let store = MemoryStore::new();
        assert!(list_candidates(&store).await.unwrap().is_empty());
        assert!(vote_tally(&store).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn ordered_by_count_then_name() {
        let (store, admin, v1, v2) = populated().await;
        let names = ["Carol", "Alice", "Bob"];
        let mut ids = Vec::new();
        for name in names {
            let spec = CandidateSpec {
                name: name.to_string(),
                ..CandidateSpec::example()
            };
            ids.push(add_candidate(&store, admin.id, spec).await.unwrap().id);
        }
        cast_vote(&store, v1.id, ids[2]).await.unwrap();
        cast_vote(&store, v2.id, ids[2]).await.unwrap();

        let tally = vote_tally(&store).await.unwrap();
        let order: Vec<_> = tally
            .iter()
            .map(|entry| (entry.name.as_str(), entry.vote_count))
            .collect();
        assert_eq!(order, vec![("Bob", 2), ("Alice", 0), ("Carol", 0)]);
    }

    #[rocket::async_test]
    async fn tally_recounts_ballots() {
        // A document whose cached total has drifted from its ballots.
        let store = MemoryStore::new();
        let mut drifted = NewCandidate::new(CandidateFields::example());
        drifted.votes.push(Ballot {
            user: Id::new(),
            voted_at: Utc::now(),
        });
        drifted.vote_count = 7;
        store.insert_candidate(drifted).await.unwrap();

        let listed = list_candidates(&store).await.unwrap();
        assert_eq!(listed[0].vote_count, 7);
        let tally = vote_tally(&store).await.unwrap();
        assert_eq!(tally[0].vote_count, 1);
    }
}
