#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod cors;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;
pub mod voting;

pub use config::Config;

use config::{ConfigFairing, DatabaseFairing};
use cors::CorsFairing;
use logging::LoggerFairing;

/// Build the server, backed by MongoDB.
pub fn build() -> Rocket<Build> {
    mount(rocket::build()).attach(DatabaseFairing)
}

/// Build the server around an in-test store, skipping the database fairing.
///
/// Auth settings fall back to test values when `Rocket.toml` has none.
#[cfg(test)]
pub(crate) fn rocket_for_store(store: store::SharedStore) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .join(("jwt_secret", "test secret"))
        .join(("auth_ttl", 3600));
    mount(rocket::custom(figment)).manage(store)
}

fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(ConfigFairing)
        .attach(LoggerFairing)
        .attach(CorsFairing)
        .mount("/", api::routes())
        .mount("/", cors::routes())
}
