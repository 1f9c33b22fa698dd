use chrono::Utc;
use log::{info, warn};

use crate::error::{Error, Result};
use crate::model::{db::Candidate, mongodb::Id};
use crate::store::Store;

/// Cast the caller's one and only vote.
///
/// Preconditions are checked in order and the first failure wins:
///
/// 1. the candidate exists (`NotFound`),
/// 2. the caller resolves to a user (`NotFound`),
/// 3. the user is not an admin (`Forbidden`),
/// 4. the user has not voted yet (`Conflict`).
///
/// The ballot append, the total increment and the `has_voted` flip are then
/// committed as one unit by [`Store::commit_vote`], which re-checks the flag so
/// two racing requests from the same voter cannot both land.
pub async fn cast_vote(store: &dyn Store, voter: Id, candidate_id: Id) -> Result<Candidate> {
    store
        .candidate_by_id(candidate_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;
    let user = store
        .user_by_id(voter)
        .await?
        .ok_or_else(|| Error::not_found(format!("User {voter}")))?;
    if user.is_admin() {
        warn!("Admin {voter} attempted to vote");
        return Err(Error::forbidden("Admins cannot vote"));
    }
    if user.has_voted {
        warn!("Voter {voter} attempted to vote twice");
        return Err(Error::conflict("You have already voted"));
    }

    let candidate = store.commit_vote(voter, candidate_id, Utc::now()).await?;
    info!(
        "Vote recorded for candidate {candidate_id}, total now {}",
        candidate.vote_count
    );
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{api::candidate::CandidateSpec, db::User};
    use crate::store::{CandidateLedger, IdentityStore, MemoryStore};
    use crate::voting::{add_candidate, testing::populated, vote_tally};

    async fn ballots_from(store: &MemoryStore, voter: &User) -> usize {
        store
            .candidates()
            .await
            .unwrap()
            .iter()
            .flat_map(|candidate| candidate.votes.iter())
            .filter(|ballot| ballot.user == voter.id)
            .count()
    }

    async fn assert_totals_consistent(store: &MemoryStore) {
        for candidate in store.candidates().await.unwrap() {
            assert_eq!(candidate.vote_count, candidate.counted_votes());
        }
    }

    #[rocket::async_test]
    async fn vote_once() {
        let (store, admin, voter, _) = populated().await;
        let alice = add_candidate(&store, admin.id, CandidateSpec::example())
            .await
            .unwrap();

        let receipt = cast_vote(&store, voter.id, alice.id).await.unwrap();
        assert_eq!(receipt.name, "Alice");
        assert_eq!(receipt.party, "PartyA");
        assert_eq!(receipt.vote_count, 1);

        assert!(store.user_by_id(voter.id).await.unwrap().unwrap().has_voted);
        assert_eq!(ballots_from(&store, &voter).await, 1);
        assert_totals_consistent(&store).await;
    }

    #[rocket::async_test]
    async fn second_vote_conflicts() {
        let (store, admin, voter, _) = populated().await;
        let alice = add_candidate(&store, admin.id, CandidateSpec::example())
            .await
            .unwrap();
        let bob = add_candidate(&store, admin.id, CandidateSpec::example2())
            .await
            .unwrap();

        cast_vote(&store, voter.id, alice.id).await.unwrap();
        for candidate in [alice.id, bob.id] {
            let result = cast_vote(&store, voter.id, candidate).await;
            assert!(matches!(result, Err(Error::Conflict(_))));
        }
        assert_eq!(ballots_from(&store, &voter).await, 1);
        assert_totals_consistent(&store).await;
    }

    #[rocket::async_test]
    async fn admin_cannot_vote() {
        let (store, admin, _, _) = populated().await;
        let alice = add_candidate(&store, admin.id, CandidateSpec::example())
            .await
            .unwrap();
        let result = cast_vote(&store, admin.id, alice.id).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));
        assert!(!store.user_by_id(admin.id).await.unwrap().unwrap().has_voted);
        assert_eq!(ballots_from(&store, &admin).await, 0);
    }

    #[rocket::async_test]
    async fn precondition_order() {
        let (store, admin, voter, _) = populated().await;

        // Missing candidate beats everything, even for an admin or unknown caller.
        for caller in [admin.id, voter.id, Id::new()] {
            let result = cast_vote(&store, caller, Id::new()).await;
            assert!(matches!(result, Err(Error::NotFound(_))));
        }

        let alice = add_candidate(&store, admin.id, CandidateSpec::example())
            .await
            .unwrap();
        let result = cast_vote(&store, Id::new(), alice.id).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(
            store
                .candidate_by_id(alice.id)
                .await
                .unwrap()
                .unwrap()
                .vote_count,
            0
        );
    }

    #[rocket::async_test]
    async fn two_voters_two_candidates() {
        let (store, admin, v1, v2) = populated().await;
        let alice = add_candidate(&store, admin.id, CandidateSpec::example())
            .await
            .unwrap();
        let bob = add_candidate(&store, admin.id, CandidateSpec::example2())
            .await
            .unwrap();

        let counts = |tally: Vec<crate::model::api::candidate::TallyEntry>| {
            let mut counts = tally
                .into_iter()
                .map(|entry| (entry.name, entry.vote_count))
                .collect::<Vec<_>>();
            counts.sort();
            counts
        };

        cast_vote(&store, v1.id, alice.id).await.unwrap();
        assert_eq!(
            counts(vote_tally(&store).await.unwrap()),
            vec![("Alice".to_string(), 1), ("Bob".to_string(), 0)]
        );

        cast_vote(&store, v2.id, bob.id).await.unwrap();
        assert_eq!(
            counts(vote_tally(&store).await.unwrap()),
            vec![("Alice".to_string(), 1), ("Bob".to_string(), 1)]
        );

        let again = cast_vote(&store, v1.id, alice.id).await;
        assert!(matches!(again, Err(Error::Conflict(_))));
        assert_eq!(
            counts(vote_tally(&store).await.unwrap()),
            vec![("Alice".to_string(), 1), ("Bob".to_string(), 1)]
        );
        assert_totals_consistent(&store).await;
    }

    #[rocket::async_test]
    async fn racing_votes_land_once() {
        let (store, admin, voter, _) = populated().await;
        let alice = add_candidate(&store, admin.id, CandidateSpec::example())
            .await
            .unwrap();
        let bob = add_candidate(&store, admin.id, CandidateSpec::example2())
            .await
            .unwrap();

        let (first, second) = rocket::tokio::join!(
            cast_vote(&store, voter.id, alice.id),
            cast_vote(&store, voter.id, bob.id),
        );
        assert!(first.is_ok() != second.is_ok());
        assert_eq!(ballots_from(&store, &voter).await, 1);
        assert_totals_consistent(&store).await;
    }
}
