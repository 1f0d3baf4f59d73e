pub mod auth;
pub mod catalog;
pub mod detail;
pub mod listing_form;
pub mod render;
pub mod saved;
pub mod seller;
pub mod session;

pub use crate::domain::model::{
    Category, Condition, Listing, ListingId, ListingStatus, Profile, SavedListing, SortKey,
    StatusChange, UserId,
};
pub use crate::domain::ports::{Authenticator, ConfigProvider, ListingRepository};
pub use crate::utils::error::Result;
