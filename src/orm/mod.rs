pub mod questions;
pub mod topics;
pub mod users;
