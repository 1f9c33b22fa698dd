use serde::{Deserialize, Serialize};

use crate::model::db::{Role, User};

/// Everything needed to open an account. The password is plaintext and is
/// hashed before it reaches the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSignup {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    pub address: String,
    pub national_id: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Login credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub national_id: String,
    pub password: String,
}

/// A request to replace the caller's own password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// API-friendly view of a user. Never carries the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub address: String,
    pub national_id: String,
    pub role: Role,
    pub has_voted: bool,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.user.name,
            age: user.user.age,
            email: user.user.email,
            mobile: user.user.mobile,
            address: user.user.address,
            national_id: user.user.national_id,
            role: user.user.role,
            has_voted: user.user.has_voted,
        }
    }
}

/// Returned by signup and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl UserSignup {
        pub fn voter_example() -> Self {
            Self {
                name: "Asha Verma".to_string(),
                age: 34,
                email: Some("asha@example.com".to_string()),
                mobile: Some("9876543210".to_string()),
                address: "12 Lake Road".to_string(),
                national_id: "123456789012".to_string(),
                password: "correct horse".to_string(),
                role: Role::Voter,
            }
        }

        pub fn voter_example2() -> Self {
            Self {
                name: "Ravi Nair".to_string(),
                age: 61,
                email: None,
                mobile: None,
                address: "4 Hill Street".to_string(),
                national_id: "210987654321".to_string(),
                password: "battery staple".to_string(),
                role: Role::Voter,
            }
        }

        pub fn admin_example() -> Self {
            Self {
                name: "Returning Officer".to_string(),
                age: 50,
                email: None,
                mobile: None,
                address: "Election Office".to_string(),
                national_id: "999999999999".to_string(),
                password: "ballotbox".to_string(),
                role: Role::Admin,
            }
        }

        pub fn credentials(&self) -> LoginRequest {
            LoginRequest {
                national_id: self.national_id.clone(),
                password: self.password.clone(),
            }
        }
    }
}
