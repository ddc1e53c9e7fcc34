//! Centralized message management for the engine.
//!
//! All user communication flows through the [`Message`] enum: variants carry
//! typed parameters, the `Display` implementation in [`display`] renders the
//! text, and the `msg_*!` macros in [`macros`] route it to the console or to
//! the tracing system depending on debug mode.
//!
//! ## Usage
//!
//! ```rust
//! use sqlevo::libs::messages::Message;
//! use sqlevo::{msg_info, msg_success};
//!
//! msg_success!(Message::ValidateOk);
//! msg_info!(Message::MigrateComplete(3));
//! ```

pub mod display;
pub mod macros;
pub mod types;

// Re-export the main Message type for convenient access
pub use types::Message;
