//! # reseau-shared
//!
//! Identifier and status types shared by the Réseau engines, plus the
//! policy knobs that configure them.  This crate is a leaf: it depends on
//! nothing inside the workspace so every other crate can use it freely.

pub mod policy;
pub mod types;

pub use policy::{GraphPolicy, MessagePolicy, HOP_CEILING};
pub use types::{ConnectionStatus, MessageStatus, UserId};
