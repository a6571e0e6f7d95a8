//! Data types for the broadcast chat server
//!
//! This module contains the identity types shared by the registry, the codec
//! and the transport endpoint.

mod connection;
mod user;

use std::collections::BTreeSet;

pub use connection::{ConnectionId, ConnectionIdGenerator};
pub use user::User;

/// Point-in-time set of joined users, sorted by name then id
pub type Roster = BTreeSet<User>;
