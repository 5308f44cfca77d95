pub use entity::{users, Id};

pub mod error;
pub mod user;
