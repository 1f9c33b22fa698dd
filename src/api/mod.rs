use chrono::{DateTime, Utc};
use rocket::{serde::json::Json, Route};
use serde::{Deserialize, Serialize};

pub mod candidate;
pub mod settings;
pub mod user;

pub fn routes() -> Vec<Route> {
    let mut routes = routes![health];
    routes.extend(user::routes());
    routes.extend(candidate::routes());
    routes.extend(settings::routes());
    routes
}

/// Liveness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub message: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[get("/")]
pub fn health() -> Json<Health> {
    Json(Health {
        message: "Voting backend is running".to_string(),
        status: "OK".to_string(),
        timestamp: Utc::now(),
    })
}
