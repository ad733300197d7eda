pub mod auth;
pub mod events;
pub mod memories;
pub mod sessions;
pub mod settings;
