//! One-shot session notices.
//!
//! A handler records the outcome of a state change here before redirecting;
//! the next rendered page consumes and clears it. The slot holds at most one
//! message — a later `set_flash` overwrites an unconsumed one.

use actix_session::Session;
use serde::{Deserialize, Serialize};

const FLASH_KEY: &str = "flash";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub text: String,
    pub kind: Severity,
}

impl Flash {
    /// Suffix of the `alert-*` CSS class the layout renders.
    pub fn css_class(&self) -> &'static str {
        match self.kind {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}

pub fn set_flash(session: &Session, text: impl Into<String>, kind: Severity) {
    let flash = Flash {
        text: text.into(),
        kind,
    };
    if let Err(e) = session.insert(FLASH_KEY, flash) {
        log::error!("failed to store flash message: {}", e);
    }
}

/// Return and clear the pending notice. A second call in the same
/// request/response cycle returns None.
pub fn take_flash(session: &Session) -> Option<Flash> {
    match session.get::<Flash>(FLASH_KEY) {
        Ok(flash) => {
            if flash.is_some() {
                session.remove(FLASH_KEY);
            }
            flash
        }
        Err(e) => {
            // An undecodable slot should not wedge every later page load.
            log::error!("failed to read flash message: {}", e);
            session.remove(FLASH_KEY);
            None
        }
    }
}
