pub mod client_ctx;

pub use client_ctx::{can_access, ClientCtx, Profile};
