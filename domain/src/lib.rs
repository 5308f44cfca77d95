//! Business logic for the session credential platform.
//!
//! This crate re-exports the entity types consumers need so that the `web`
//! layer does not depend on `entity_api` directly; each layer translates the
//! errors of the layer below it (see [`error`]).
pub use entity_api::{users, Id};

pub mod error;
pub mod gateway;
pub mod jwt;
pub mod session;
pub mod user;
