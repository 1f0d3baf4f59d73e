use crate::core::listing_form::NewListing;
use crate::domain::model::{
    Credentials, Listing, ListingId, Profile, SavedListing, SignUpRequest, SortKey, StatusChange,
    UserId,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of listings, profiles and saved listings. Backed by the hosted
/// backend in production and by memory in demos and tests.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn list_listings(&self) -> Result<Vec<Listing>>;

    async fn get_listing(&self, id: &ListingId) -> Result<Option<Listing>>;

    async fn get_profile(&self, id: &UserId) -> Result<Option<Profile>>;

    async fn saved_listings(&self, user: &UserId) -> Result<Vec<SavedListing>>;

    async fn create_listing(&self, listing: NewListing, seller: &UserId) -> Result<Listing>;

    /// Applies `change` to a listing that is still active and returns the
    /// stored result. Sold and deleted listings yield `IllegalTransition`.
    async fn update_status(
        &self,
        id: &ListingId,
        change: StatusChange,
        now: DateTime<Utc>,
    ) -> Result<Listing>;

    /// Returns `false` when the pair was already saved.
    async fn save_listing(&self, saved: SavedListing) -> Result<bool>;

    /// Returns `false` when nothing was saved for the pair.
    async fn unsave_listing(&self, user: &UserId, listing: &ListingId) -> Result<bool>;
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Profile>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<Profile>;

    async fn sign_out(&self, user: &UserId) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn institutional_domain(&self) -> &str;
    fn max_images(&self) -> usize;
    fn default_sort(&self) -> SortKey;
    fn active_only(&self) -> bool;
}
