use crate::core::catalog::{self, CatalogQuery};
use crate::core::session::Session;
use crate::domain::model::{Listing, ListingId, Profile, StatusChange, UserId};
use crate::domain::ports::ListingRepository;
use crate::utils::error::{MarketError, Result};
use chrono::{DateTime, Utc};

/// Listings posted by `seller_id`, run through the catalog query engine.
pub fn listings_by_seller<'a>(
    listings: &'a [Listing],
    seller_id: &UserId,
    query: &CatalogQuery,
) -> Vec<&'a Listing> {
    catalog::query(listings, query)
        .into_iter()
        .filter(|listing| &listing.seller_id == seller_id)
        .collect()
}

/// A user's public page: their profile and what they have on offer.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerPage {
    pub profile: Profile,
    pub listings: Vec<Listing>,
}

pub async fn load_seller_page<R>(
    repository: &R,
    seller_id: &UserId,
    query: &CatalogQuery,
) -> Result<SellerPage>
where
    R: ListingRepository + ?Sized,
{
    let profile = repository
        .get_profile(seller_id)
        .await?
        .ok_or_else(|| MarketError::not_found("Profile", seller_id.as_str()))?;

    let all = repository.list_listings().await?;
    let listings = listings_by_seller(&all, seller_id, query)
        .into_iter()
        .cloned()
        .collect();

    Ok(SellerPage { profile, listings })
}

/// Applies a seller-initiated status change and persists it.
pub async fn update_status<R>(
    repository: &R,
    session: &Session,
    id: &ListingId,
    change: StatusChange,
    now: DateTime<Utc>,
) -> Result<Listing>
where
    R: ListingRepository + ?Sized,
{
    let user = session.require_user()?;
    let listing = repository
        .get_listing(id)
        .await?
        .ok_or_else(|| MarketError::not_found("Listing", id.as_str()))?;

    if listing.seller_id != user.id {
        return Err(MarketError::Forbidden {
            message: format!("only the seller can change listing {}", id),
        });
    }

    let updated = repository.update_status(id, change, now).await?;
    tracing::info!("Listing {} is now {}", updated.id, updated.status());
    Ok(updated)
}
