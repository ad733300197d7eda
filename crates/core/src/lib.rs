//! Memora domain core.
//!
//! Pure domain logic for the guestbook flow: tones and their question banks,
//! the settings/event overlay, prompt selection, the guest session state
//! machine, and the collaborator traits the persistence and HTTP layers
//! implement. Nothing in here talks to a database or a socket directly.

pub mod capture;
pub mod error;
pub mod event_code;
pub mod export;
pub mod media;
pub mod prompt;
pub mod resolver;
pub mod session;
pub mod settings;
pub mod stores;
pub mod tone;
pub mod types;
