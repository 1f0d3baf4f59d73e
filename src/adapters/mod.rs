// Adapters layer: concrete implementations of the domain ports.

pub mod auth;
pub mod memory;
pub mod rest;

pub use auth::InMemoryAuthenticator;
pub use memory::{Dataset, InMemoryRepository};
pub use rest::RestRepository;
