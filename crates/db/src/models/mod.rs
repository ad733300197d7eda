//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - Create/update DTOs used by the repositories
//! - The conversion into the matching `memora-core` type

pub mod event;
pub mod memory;
pub mod settings;
