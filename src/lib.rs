pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::MarketConfig;

pub use adapters::{InMemoryAuthenticator, InMemoryRepository, RestRepository};
pub use core::catalog::{Catalog, CatalogQuery};
pub use core::session::{Session, SessionSnapshot};
pub use utils::error::{MarketError, Result};
