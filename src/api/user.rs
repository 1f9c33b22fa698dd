use rocket::{
    http::{CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    config::Config,
    error::Result,
    model::{
        api::user::{LoginRequest, PasswordChange, TokenResponse, UserProfile, UserSignup},
        auth::{AuthToken, AUTH_TOKEN_COOKIE},
        db::User,
    },
    store::SharedStore,
    voting,
};

pub fn routes() -> Vec<Route> {
    routes![signup, login, profile, change_password, logout]
}

/// Issue a token for a freshly authenticated user, both in the body and as a cookie.
fn sign_in(user: User, cookies: &CookieJar<'_>, config: &Config) -> Result<Json<TokenResponse>> {
    let jwt = AuthToken::new(&user).encode(config)?;
    cookies.add(AuthToken::cookie(jwt.clone(), config));
    Ok(Json(TokenResponse {
        token: jwt,
        user: user.into(),
    }))
}

#[post("/user/signup", data = "<signup>", format = "json")]
pub async fn signup(
    signup: Json<UserSignup>,
    cookies: &CookieJar<'_>,
    store: &State<SharedStore>,
    config: &State<Config>,
) -> Result<Json<TokenResponse>> {
    let user = voting::register(store.inner().as_ref(), signup.into_inner()).await?;
    sign_in(user, cookies, config)
}

#[post("/user/login", data = "<credentials>", format = "json")]
pub async fn login(
    credentials: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    store: &State<SharedStore>,
    config: &State<Config>,
) -> Result<Json<TokenResponse>> {
    let user = voting::authenticate(
        store.inner().as_ref(),
        &credentials.national_id,
        &credentials.password,
    )
    .await?;
    sign_in(user, cookies, config)
}

#[get("/user/profile")]
pub async fn profile(token: AuthToken, store: &State<SharedStore>) -> Result<Json<UserProfile>> {
    let user = voting::profile(store.inner().as_ref(), token.id).await?;
    Ok(Json(user.into()))
}

#[put("/user/profile/password", data = "<change>", format = "json")]
pub async fn change_password(
    token: AuthToken,
    change: Json<PasswordChange>,
    store: &State<SharedStore>,
) -> Result<()> {
    voting::change_password(
        store.inner().as_ref(),
        token.id,
        &change.current_password,
        &change.new_password,
    )
    .await
}

#[delete("/user/logout")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(AUTH_TOKEN_COOKIE);
    Status::Ok
}
