//! Request extractors for the admin surface.
//!
//! - [`auth::AdminUser`] -- requires a valid admin JWT Bearer token.

pub mod auth;
