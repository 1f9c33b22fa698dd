//! Data types, split by where they travel.

pub mod api;
pub mod auth;
pub mod db;
pub mod mongodb;
