use argon2::Config as Argon2Config;
use log::{info, warn};
use rand::Rng;

use crate::error::{Error, Result};
use crate::model::{
    api::user::UserSignup,
    db::{NewUser, Role, User},
    mongodb::Id,
};
use crate::store::Store;

/// National IDs are exactly this many ASCII digits.
pub const NATIONAL_ID_LENGTH: usize = 12;

pub const MIN_PASSWORD_LENGTH: usize = 6;

fn hash_password(password: &str) -> Result<String> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    Ok(argon2::hash_encoded(
        password.as_bytes(),
        &salt,
        &Argon2Config::default(),
    )?)
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

fn check_signup(signup: &UserSignup) -> Result<()> {
    if signup.name.trim().is_empty() {
        return Err(Error::validation("Name is required"));
    }
    if signup.address.trim().is_empty() {
        return Err(Error::validation("Address is required"));
    }
    if signup.age == 0 {
        return Err(Error::validation("Age is required"));
    }
    if signup.national_id.len() != NATIONAL_ID_LENGTH
        || !signup.national_id.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(Error::validation(format!(
            "National ID must be exactly {NATIONAL_ID_LENGTH} digits"
        )));
    }
    check_password(&signup.password)
}

/// Open a new account.
///
/// At most one admin may ever exist; a second admin signup is a conflict, as is
/// a national ID that is already registered. The store enforces both, so the
/// early admin check here only saves hashing a password that would be refused.
pub async fn register(store: &dyn Store, signup: UserSignup) -> Result<User> {
    check_signup(&signup)?;

    if signup.role == Role::Admin && store.admin_exists().await? {
        warn!("Refused a second admin registration");
        return Err(Error::conflict("An admin user already exists"));
    }

    let password_hash = hash_password(&signup.password)?;
    let user = store
        .insert_user(NewUser {
            name: signup.name,
            age: signup.age,
            email: signup.email.filter(|email| !email.is_empty()),
            mobile: signup.mobile.filter(|mobile| !mobile.is_empty()),
            address: signup.address,
            national_id: signup.national_id,
            role: signup.role,
            password_hash,
            has_voted: false,
        })
        .await?;
    info!("Registered {} {}", user.role, user.id);
    Ok(user)
}

/// Check a national ID and password, returning the matching user.
pub async fn authenticate(store: &dyn Store, national_id: &str, password: &str) -> Result<User> {
    store
        .user_by_national_id(national_id)
        .await?
        .filter(|user| user.verify_password(password))
        .ok_or_else(|| Error::Unauthorized("Invalid national ID or password".to_string()))
}

/// The caller's own record.
pub async fn profile(store: &dyn Store, caller: Id) -> Result<User> {
    store
        .user_by_id(caller)
        .await?
        .ok_or_else(|| Error::not_found(format!("User {caller}")))
}

/// Replace the caller's password after checking the current one.
pub async fn change_password(
    store: &dyn Store,
    caller: Id,
    current_password: &str,
    new_password: &str,
) -> Result<()> {
    let user = profile(store, caller).await?;
    if !user.verify_password(current_password) {
        return Err(Error::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }
    check_password(new_password)?;
    if current_password == new_password {
        return Err(Error::validation(
            "New password must be different from the current password",
        ));
    }

    let password_hash = hash_password(new_password)?;
    store.set_password_hash(caller, password_hash).await?;
    info!("Password changed for {caller}");
    Ok(())
}
