//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod event_repo;
pub mod memory_repo;
pub mod settings_repo;

pub use event_repo::EventRepo;
pub use memory_repo::MemoryRepo;
pub use settings_repo::SettingsRepo;
