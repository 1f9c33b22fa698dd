//! The voting core.
//!
//! Every operation takes the caller's resolved identity (never a token) and a
//! [`Store`]. Role checks re-resolve that identity against the store.

mod candidates;
mod cast;
mod tally;
mod users;
mod visibility;

pub use candidates::{add_candidate, delete_candidate, update_candidate};
pub use cast::cast_vote;
pub use tally::{list_candidates, vote_tally};
pub use users::{
    authenticate, change_password, profile, register, MIN_PASSWORD_LENGTH, NATIONAL_ID_LENGTH,
};
pub use visibility::{get_visibility, set_visibility};

use log::warn;

use crate::error::{Error, Result};
use crate::model::{db::User, mongodb::Id};
use crate::store::Store;

/// Resolve the caller and insist they are an admin.
///
/// Unknown identities are refused the same way as voters.
async fn require_admin(store: &dyn Store, caller: Id) -> Result<User> {
    match store.user_by_id(caller).await? {
        Some(user) if user.is_admin() => Ok(user),
        _ => {
            warn!("Refused admin operation for {caller}");
            Err(Error::forbidden("Access denied. Admin only."))
        }
    }
}
