use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use log::{debug, error};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    db::{Role, User},
    mongodb::Id,
};
use crate::store::SharedStore;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

const BEARER_PREFIX: &str = "Bearer ";

/// An authentication token naming a specific user and the role they signed in with.
///
/// This is the whole of what the voting core learns about a caller: a stable
/// identity plus a role. Role checks inside the core re-resolve the identity
/// against the store rather than trusting the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub id: Id,
    #[serde(rename = "rgt")]
    pub role: Role,
}

impl AuthToken {
    /// Create a new [`AuthToken`] for the given user.
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }

    /// Sign this token into a JWT that expires after the configured TTL.
    pub fn encode(self, config: &Config) -> Result<String> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };
        let jwt = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;
        Ok(jwt)
    }

    /// Verify and decode a JWT produced by [`AuthToken::encode`].
    pub fn decode(jwt: &str, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            jwt,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }

    /// Wrap a signed JWT in the session cookie.
    pub fn cookie(jwt: String, config: &Config) -> Cookie<'static> {
        Cookie::build((AUTH_TOKEN_COOKIE, jwt))
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .build()
    }
}

/// Token claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// Pull the raw JWT out of the `Authorization` header, falling back to the cookie.
fn raw_token(req: &Request<'_>) -> Option<String> {
    let from_header = req
        .headers()
        .get_one("Authorization")
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(|jwt| jwt.trim().to_string());
    from_header.or_else(|| {
        req.cookies()
            .get(AUTH_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Resolve the caller's token and check the user it names still exists.
    ///
    /// A missing or invalid token forwards with `401`, so unauthenticated
    /// requests to protected routes end up at the `401` catcher.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let (Some(config), Some(store)) = (
            req.rocket().state::<Config>(),
            req.rocket().state::<SharedStore>(),
        ) else {
            error!("Authentication attempted before config and store were managed");
            return Outcome::Forward(Status::InternalServerError);
        };

        let Some(jwt) = raw_token(req) else {
            return Outcome::Forward(Status::Unauthorized);
        };

        let token = match Self::decode(&jwt, config) {
            Ok(token) => token,
            Err(e) => {
                debug!("Rejected bearer token: {e}");
                return Outcome::Forward(Status::Unauthorized);
            }
        };

        match store.user_by_id(token.id).await {
            Ok(Some(_)) => Outcome::Success(token),
            Ok(None) => Outcome::Forward(Status::Unauthorized),
            Err(e) => Outcome::Error((e.status(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::db::UserCore;

    fn config() -> Config {
        Config::example()
    }

    #[test]
    fn encode_decode() {
        let user = User {
            id: Id::new(),
            user: UserCore::example_admin(),
        };
        let token = AuthToken::new(&user);
        let jwt = token.encode(&config()).unwrap();
        let decoded = AuthToken::decode(&jwt, &config()).unwrap();
        assert_eq!(token, decoded);
        assert_eq!(decoded.role, Role::Admin);
    }

    #[test]
    fn wrong_secret_rejected() {
        let user = User {
            id: Id::new(),
            user: UserCore::example_voter(),
        };
        let jwt = AuthToken::new(&user).encode(&config()).unwrap();
        let other = Config::example_with_secret("a different secret");
        assert!(AuthToken::decode(&jwt, &other).is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(AuthToken::decode("not.a.jwt", &config()).is_err());
    }
}
