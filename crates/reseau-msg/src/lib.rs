//! # reseau-msg
//!
//! The message delivery engine: creation, inbox/sent listings, the
//! Delivered → Read transition, and viewer-scoped deletion.
//!
//! Messages are exchanged between any two directory users by default; the
//! [`reseau_shared::MessagePolicy::require_friendship`] knob gates sending on
//! an accepted connection instead, consulting the graph engine.

pub mod engine;

mod error;

pub use engine::MessagingEngine;
pub use error::MsgError;
