use crate::core::session::SessionSnapshot;
use crate::domain::model::{Listing, ListingId, Profile};
use crate::domain::ports::ListingRepository;
use crate::utils::error::{MarketError, Result};

/// A listing together with its seller. `seller` is `None` when the seller id
/// points at no profile; such a detail is not renderable.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDetail {
    pub listing: Listing,
    pub seller: Option<Profile>,
}

impl ListingDetail {
    /// Resolves the seller from the embedded join first, then from `profiles`.
    pub fn resolve(listing: Listing, profiles: &[Profile]) -> Self {
        let seller = embedded_seller(&listing)
            .or_else(|| profiles.iter().find(|p| p.id == listing.seller_id))
            .cloned();
        Self { listing, seller }
    }

    pub fn is_renderable(&self) -> bool {
        self.seller.is_some()
    }

    pub fn into_renderable(self) -> Result<Self> {
        if self.is_renderable() {
            Ok(self)
        } else {
            Err(MarketError::not_found("Seller profile", self.listing.seller_id.as_str()))
        }
    }

    pub fn is_owned_by(&self, viewer: &SessionSnapshot) -> bool {
        viewer.is(&self.listing.seller_id)
    }

    /// Messaging the seller needs a signed-in viewer who is not the seller.
    pub fn can_message(&self, viewer: &SessionSnapshot) -> bool {
        viewer.is_signed_in() && !self.is_owned_by(viewer)
    }

    pub fn image(&self, index: usize) -> Option<&str> {
        self.listing.images.get(index).map(String::as_str)
    }
}

fn embedded_seller(listing: &Listing) -> Option<&Profile> {
    listing
        .seller
        .as_ref()
        .filter(|seller| seller.id == listing.seller_id)
}

pub async fn load_detail<R>(repository: &R, id: &ListingId) -> Result<ListingDetail>
where
    R: ListingRepository + ?Sized,
{
    let listing = repository
        .get_listing(id)
        .await?
        .ok_or_else(|| MarketError::not_found("Listing", id.as_str()))?;

    let seller = match embedded_seller(&listing) {
        Some(seller) => Some(seller.clone()),
        None => repository.get_profile(&listing.seller_id).await?,
    };

    if seller.is_none() {
        tracing::warn!(
            "Listing {} references missing seller {}",
            listing.id,
            listing.seller_id
        );
    }

    ListingDetail { listing, seller }.into_renderable()
}
