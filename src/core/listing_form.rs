use crate::core::session::Session;
use crate::domain::model::{Category, Condition, Listing, ListingId, UserId};
use crate::domain::ports::ListingRepository;
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::validate_non_empty_string;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_MAX_IMAGES: usize = 4;

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub condition: String,
    /// Already-uploaded image references.
    pub images: Vec<String>,
}

/// A draft that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub condition: Condition,
    pub images: Vec<String>,
}

impl ListingDraft {
    pub fn validate(&self, max_images: usize) -> Result<NewListing> {
        validate_non_empty_string("title", &self.title)?;
        validate_non_empty_string("description", &self.description)?;

        let price = parse_price(&self.price)?;
        let category: Category = required(&self.category, "category")?.parse()?;
        let condition: Condition = required(&self.condition, "condition")?.parse()?;

        if self.images.is_empty() {
            return Err(MarketError::validation("images", "Please add at least one image"));
        }
        if self.images.len() > max_images {
            return Err(MarketError::validation(
                "images",
                format!("Maximum {} images allowed", max_images),
            ));
        }
        for image in &self.images {
            validate_image_reference(image)?;
        }

        Ok(NewListing {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            price,
            category,
            condition,
            images: self.images.clone(),
        })
    }
}

impl NewListing {
    pub fn into_listing(self, id: ListingId, seller_id: UserId, now: DateTime<Utc>) -> Listing {
        Listing::new(id, self.title, self.price, seller_id, now)
            .with_description(self.description)
            .with_category(self.category)
            .with_condition(self.condition)
            .with_images(self.images)
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    validate_non_empty_string(field, value)?;
    Ok(value.trim())
}

fn parse_price(raw: &str) -> Result<f64> {
    let raw = raw.trim().trim_start_matches('$');
    let price: f64 = raw
        .parse()
        .map_err(|_| MarketError::validation("price", format!("'{}' is not a number", raw)))?;

    if !price.is_finite() || price < 0.0 {
        return Err(MarketError::validation("price", "Price must be zero or more"));
    }
    Ok(price)
}

fn validate_image_reference(image: &str) -> Result<()> {
    let url = Url::parse(image)
        .map_err(|e| MarketError::validation("images", format!("'{}': {}", image, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(MarketError::validation(
            "images",
            format!("Unsupported image URL scheme: {}", scheme),
        )),
    }
}

/// Validates the draft for the signed-in seller and stores it.
pub async fn submit_listing<R>(
    repository: &R,
    session: &Session,
    draft: &ListingDraft,
    max_images: usize,
) -> Result<Listing>
where
    R: ListingRepository + ?Sized,
{
    let seller = session.require_user()?;
    let new_listing = draft.validate(max_images)?;

    let listing = repository.create_listing(new_listing, &seller.id).await?;
    tracing::info!("🆕 Listing {} created by {}", listing.id, seller.id);
    Ok(listing)
}
