//! Password hashing and the session identity contract.
//!
//! The cookie session stores three keys for an authenticated browser:
//! the user id, the display name, and the role. Handlers never touch the
//! keys directly; they go through [`establish`] / [`clear`] here and
//! [`crate::middleware::ClientCtx`] for reads.

use actix_session::Session;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use once_cell::sync::Lazy;

use crate::orm::users;

pub const KEY_USER_ID: &str = "user_id";
pub const KEY_USER_NAME: &str = "user_name";
pub const KEY_ROLE: &str = "role";

static ARGON2: Lazy<Argon2<'static>> = Lazy::new(Argon2::default);

pub fn get_argon2() -> &'static Argon2<'static> {
    &ARGON2
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))?
        .to_string())
}

/// Verify a password against a stored PHC hash. An unparseable stored hash
/// is logged and treated as a verification failure.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("stored password hash failed to parse: {}", e);
            false
        }
    }
}

/// Rotate the session id and store the authenticated identity.
/// The rotation keeps a pre-login session id from surviving authentication.
pub fn establish(
    session: &Session,
    user: &users::Model,
) -> Result<(), actix_session::SessionInsertError> {
    session.renew();
    session.insert(KEY_USER_ID, user.user_id)?;
    session.insert(KEY_USER_NAME, user.name.clone())?;
    session.insert(KEY_ROLE, user.role)?;
    Ok(())
}

/// Log the browser out: drop the identity keys and rotate the session id.
/// The flash slot is left alone so the goodbye notice can still render on
/// the next page.
pub fn clear(session: &Session) {
    session.remove(KEY_USER_ID);
    session.remove(KEY_USER_NAME);
    session.remove(KEY_ROLE);
    session.renew();
}
