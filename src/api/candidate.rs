use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::candidate::{
            CandidatePatch, CandidateSpec, CandidateSummary, TallyEntry, VoteReceipt,
        },
        auth::AuthToken,
        mongodb::Id,
    },
    store::SharedStore,
    voting,
};

pub fn routes() -> Vec<Route> {
    routes![
        list_candidates,
        add_candidate,
        update_candidate,
        delete_candidate,
        cast_vote,
        vote_tally,
    ]
}

#[get("/candidate")]
pub async fn list_candidates(store: &State<SharedStore>) -> Result<Json<Vec<CandidateSummary>>> {
    let candidates = voting::list_candidates(store.inner().as_ref()).await?;
    Ok(Json(candidates))
}

#[post("/candidate", data = "<spec>", format = "json")]
pub async fn add_candidate(
    token: AuthToken,
    spec: Json<CandidateSpec>,
    store: &State<SharedStore>,
) -> Result<(Status, Json<CandidateSummary>)> {
    let candidate =
        voting::add_candidate(store.inner().as_ref(), token.id, spec.into_inner()).await?;
    Ok((Status::Created, Json(candidate.into())))
}

#[put("/candidate/<candidate_id>", data = "<patch>", format = "json")]
pub async fn update_candidate(
    token: AuthToken,
    candidate_id: Id,
    patch: Json<CandidatePatch>,
    store: &State<SharedStore>,
) -> Result<Json<CandidateSummary>> {
    let candidate = voting::update_candidate(
        store.inner().as_ref(),
        token.id,
        candidate_id,
        patch.into_inner(),
    )
    .await?;
    Ok(Json(candidate.into()))
}

#[delete("/candidate/<candidate_id>")]
pub async fn delete_candidate(
    token: AuthToken,
    candidate_id: Id,
    store: &State<SharedStore>,
) -> Result<Json<CandidateSummary>> {
    let candidate =
        voting::delete_candidate(store.inner().as_ref(), token.id, candidate_id).await?;
    Ok(Json(candidate.into()))
}

#[post("/candidate/vote/<candidate_id>")]
pub async fn cast_vote(
    token: AuthToken,
    candidate_id: Id,
    store: &State<SharedStore>,
) -> Result<Json<VoteReceipt>> {
    let candidate = voting::cast_vote(store.inner().as_ref(), token.id, candidate_id).await?;
    Ok(Json(candidate.into()))
}

#[get("/candidate/vote/count")]
pub async fn vote_tally(store: &State<SharedStore>) -> Result<Json<Vec<TallyEntry>>> {
    let tally = voting::vote_tally(store.inner().as_ref()).await?;
    Ok(Json(tally))
}
