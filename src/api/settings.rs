use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{api::Visibility, auth::AuthToken},
    store::SharedStore,
    voting,
};

pub fn routes() -> Vec<Route> {
    routes![get_visibility, set_visibility]
}

/// Readable by anyone. Whether to actually hide results is up to the client.
#[get("/settings/results-visibility")]
pub async fn get_visibility(store: &State<SharedStore>) -> Result<Json<Visibility>> {
    let visible = voting::get_visibility(store.inner().as_ref()).await?;
    Ok(Json(Visibility { visible }))
}

#[put("/settings/results-visibility", data = "<visibility>", format = "json")]
pub async fn set_visibility(
    token: AuthToken,
    visibility: Json<Visibility>,
    store: &State<SharedStore>,
) -> Result<Json<Visibility>> {
    let visible =
        voting::set_visibility(store.inner().as_ref(), token.id, visibility.visible).await?;
    Ok(Json(Visibility { visible }))
}
