//! Command implementations for the deckhand CLI

pub mod bounce;
pub mod build;
pub mod completions;
pub mod decommission;
pub mod deploy;
pub mod destroy;
pub mod diff;
pub mod diffed;
pub mod helpers;
pub mod order;
pub mod push;
pub mod validate;
pub mod version;
