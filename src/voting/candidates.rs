use log::info;

use crate::error::{Error, Result};
use crate::model::{
    api::candidate::{CandidatePatch, CandidateSpec},
    db::{Candidate, CandidateFields, NewCandidate},
    mongodb::Id,
};
use crate::store::Store;

use super::require_admin;

fn check_fields(fields: &CandidateFields) -> Result<()> {
    if fields.name.trim().is_empty() || fields.party.trim().is_empty() || fields.age == 0 {
        return Err(Error::validation(
            "All fields are required: name, age, party",
        ));
    }
    Ok(())
}

/// Add a candidate with no votes. Admin only.
pub async fn add_candidate(store: &dyn Store, caller: Id, spec: CandidateSpec) -> Result<Candidate> {
    require_admin(store, caller).await?;
    let fields = CandidateFields::from(spec);
    check_fields(&fields)?;

    let candidate = store.insert_candidate(NewCandidate::new(fields)).await?;
    info!("Added candidate {} ({})", candidate.id, candidate.name);
    Ok(candidate)
}

/// Merge a partial update onto a candidate's details. Admin only.
///
/// The merged result must still have every required field.
pub async fn update_candidate(
    store: &dyn Store,
    caller: Id,
    candidate_id: Id,
    patch: CandidatePatch,
) -> Result<Candidate> {
    require_admin(store, caller).await?;
    let current = store
        .candidate_by_id(candidate_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;

    let fields = patch.apply(&current.fields);
    check_fields(&fields)?;

    let candidate = store
        .update_candidate_fields(candidate_id, fields)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;
    info!("Updated candidate {candidate_id}");
    Ok(candidate)
}

/// Remove a candidate and every ballot cast for them. Admin only.
pub async fn delete_candidate(store: &dyn Store, caller: Id, candidate_id: Id) -> Result<Candidate> {
    require_admin(store, caller).await?;
    let candidate = store
        .delete_candidate(candidate_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;
    info!(
        "Deleted candidate {candidate_id} with {} ballot(s)",
        candidate.counted_votes()
    );
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CandidateLedger;
    use crate::voting::{cast_vote, testing::populated, vote_tally};

    #[rocket::async_test]
    async fn admin_only() {
        let (store, _admin, voter, _) = populated().await;
        let result = add_candidate(&store, voter.id, CandidateSpec::example()).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));

        let result = add_candidate(&store, Id::new(), CandidateSpec::example()).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));
        assert!(store.candidates().await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn add_starts_empty() {
        let (store, admin, _, _) = populated().await;
        let candidate = add_candidate(&store, admin.id, CandidateSpec::example())
            .await
            .unwrap();
        assert_eq!(candidate.vote_count, 0);
        assert!(candidate.votes.is_empty());
        assert_eq!(candidate.fields, CandidateFields::example());
    }

    #[rocket::async_test]
    async fn add_requires_fields() {
        let (store, admin, _, _) = populated().await;
        let spec = CandidateSpec {
            party: String::new(),
            ..CandidateSpec::example()
        };
        let result = add_candidate(&store, admin.id, spec).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[rocket::async_test]
    async fn partial_update() {
        let (store, admin, voter, _) = populated().await;
        let candidate = add_candidate(&store, admin.id, CandidateSpec::example())
            .await
            .unwrap();

        let patch = CandidatePatch {
            age: Some(46),
            ..Default::default()
        };
        let updated = update_candidate(&store, admin.id, candidate.id, patch)
            .await
            .unwrap();
        assert_eq!(updated.age, 46);
        assert_eq!(updated.name, "Alice");

        // Blanking a required field is rejected and leaves the candidate alone.
        let patch = CandidatePatch {
            name: Some(String::new()),
            ..Default::default()
        };
        let result = update_candidate(&store, admin.id, candidate.id, patch).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        let stored = store.candidate_by_id(candidate.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Alice");

        let result = update_candidate(&store, voter.id, candidate.id, Default::default()).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));

        let result = update_candidate(&store, admin.id, Id::new(), Default::default()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[rocket::async_test]
    async fn delete_takes_ballots_with_it() {
        let (store, admin, v1, v2) = populated().await;
        let alice = add_candidate(&store, admin.id, CandidateSpec::example())
            .await
            .unwrap();
        let bob = add_candidate(&store, admin.id, CandidateSpec::example2())
            .await
            .unwrap();
        cast_vote(&store, v1.id, alice.id).await.unwrap();
        cast_vote(&store, v2.id, bob.id).await.unwrap();

        let deleted = delete_candidate(&store, admin.id, alice.id).await.unwrap();
        assert_eq!(deleted.counted_votes(), 1);

        let tally = vote_tally(&store).await.unwrap();
        assert_eq!(tally.len(), 1);
        assert_eq!(tally[0].name, "Bob");
        assert!(store
            .candidates()
            .await
            .unwrap()
            .iter()
            .all(|candidate| !candidate.has_ballot_from(v1.id)));

        let again = delete_candidate(&store, admin.id, alice.id).await;
        assert!(matches!(again, Err(Error::NotFound(_))));

        let result = delete_candidate(&store, v2.id, bob.id).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));
    }
}
