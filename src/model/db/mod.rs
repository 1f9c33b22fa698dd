//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.
//! - Credentials are present, so these types never leave the server as-is.

pub mod candidate;
pub mod setting;
pub mod user;

pub use candidate::{Ballot, Candidate, CandidateCore, CandidateFields, NewCandidate};
pub use setting::{Setting, SettingValue, RESULTS_VISIBILITY};
pub use user::{NewUser, Role, User, UserCore};
