//! Application-wide constants
//!
//! This module contains constants used throughout the application.

/// Maximum size of an uploaded PDF note in bytes (50 MB).
pub const MAX_PDF_BYTES: usize = 50 * 1024 * 1024;

/// Maximum size of an uploaded lecture video in bytes (500 MB).
pub const MAX_VIDEO_BYTES: usize = 500 * 1024 * 1024;

/// Video containers accepted for direct upload.
/// Browsers can play these natively in a `<video>` element.
pub const ALLOWED_VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "webm", "ogg"];

/// Upper bound for plain-text multipart fields (title, description, URL).
pub const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Default username displayed for unauthenticated users
pub const GUEST_USERNAME: &str = "Guest";
