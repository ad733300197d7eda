//! Admin authentication primitives.
//!
//! - [`password`] -- Argon2id hashing of the shared admin password.
//! - [`jwt`] -- admin token generation and validation.

pub mod jwt;
pub mod password;
