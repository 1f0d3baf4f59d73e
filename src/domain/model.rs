use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::{MarketError, Result};

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_id!(ListingId);
opaque_id!(UserId);

/// 將 "Sports Equipment" / "sports-equipment" / "SPORTS_EQUIPMENT" 視為同一個值
fn normalize_label(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect::<String>()
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Textbooks,
    Electronics,
    Furniture,
    Clothing,
    #[serde(rename = "Sports Equipment")]
    SportsEquipment,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Textbooks,
        Category::Electronics,
        Category::Furniture,
        Category::Clothing,
        Category::SportsEquipment,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Textbooks => "Textbooks",
            Category::Electronics => "Electronics",
            Category::Furniture => "Furniture",
            Category::Clothing => "Clothing",
            Category::SportsEquipment => "Sports Equipment",
            Category::Other => "Other",
        }
    }

    /// Parses a browse filter value. Empty input and "all" mean no restriction.
    pub fn parse_filter(raw: &str) -> Result<Option<Category>> {
        let normalized = normalize_label(raw);
        if normalized.is_empty() || normalized == "all" {
            return Ok(None);
        }
        raw.parse().map(Some)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = normalize_label(s);
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == normalized)
            .ok_or_else(|| {
                MarketError::validation("category", format!("Unknown category '{}'", s.trim()))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    New,
    #[serde(rename = "Like New")]
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::New,
        Condition::LikeNew,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "New",
            Condition::LikeNew => "Like New",
            Condition::Good => "Good",
            Condition::Fair => "Fair",
            Condition::Poor => "Poor",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = normalize_label(s);
        Condition::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == normalized)
            .ok_or_else(|| {
                MarketError::validation("condition", format!("Unknown condition '{}'", s.trim()))
            })
    }
}

/// Closed lifecycle of a listing. Only `Active` can move, and only through
/// [`ActiveListing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Active,
    Sold,
    Deleted,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
            ListingStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seller-initiated status changes. Both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    MarkSold,
    Delete,
}

impl StatusChange {
    /// Status a listing ends up in after the change.
    pub fn target(self) -> ListingStatus {
        match self {
            StatusChange::MarkSold => ListingStatus::Sold,
            StatusChange::Delete => ListingStatus::Deleted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Newest,
    PriceLow,
    PriceHigh,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::PriceLow => "price_low",
            SortKey::PriceHigh => "price_high",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "newest" => Ok(SortKey::Newest),
            "price_low" => Ok(SortKey::PriceLow),
            "price_high" => Ok(SortKey::PriceHigh),
            other => Err(MarketError::validation(
                "sort",
                format!("Unknown sort key '{}' (newest, price_low, price_high)", other),
            )),
        }
    }
}

/// 未知或缺漏的列舉值以 `None` 帶過，不拒絕整筆資料
fn lenient_label<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(
        id: impl Into<UserId>,
        email: impl Into<String>,
        full_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            full_name: full_name.into(),
            avatar_url: None,
            created_at,
        }
    }

    /// Avatar fallback letter.
    pub fn initial(&self) -> Option<char> {
        self.full_name.trim().chars().next()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_label")]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub images: Vec<String>,
    pub seller_id: UserId,
    #[serde(default)]
    status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Seller profile embedded by the backend join, when it was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<Profile>,
}

impl Listing {
    pub fn new(
        id: impl Into<ListingId>,
        title: impl Into<String>,
        price: f64,
        seller_id: impl Into<UserId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            price,
            category: None,
            condition: None,
            images: Vec::new(),
            seller_id: seller_id.into(),
            status: ListingStatus::Active,
            created_at,
            updated_at: created_at,
            seller: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    pub fn with_seller(mut self, seller: Profile) -> Self {
        self.seller = Some(seller);
        self
    }

    pub fn status(&self) -> ListingStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Gives back the listing unchanged when it is not active.
    pub fn into_active(self) -> std::result::Result<ActiveListing, Listing> {
        if self.is_active() {
            Ok(ActiveListing(self))
        } else {
            Err(self)
        }
    }

    /// Runs `change` through [`ActiveListing`]; anything but an active
    /// listing yields `IllegalTransition`.
    pub fn transition(self, change: StatusChange, now: DateTime<Utc>) -> Result<Listing> {
        let active = self
            .into_active()
            .map_err(|listing| MarketError::IllegalTransition {
                id: listing.id.to_string(),
                status: listing.status.to_string(),
            })?;
        Ok(active.apply(change, now))
    }
}

/// A listing proven to be `Active`; the only place status transitions live.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveListing(Listing);

impl ActiveListing {
    pub fn listing(&self) -> &Listing {
        &self.0
    }

    pub fn mark_sold(self, now: DateTime<Utc>) -> Listing {
        self.finish(ListingStatus::Sold, now)
    }

    pub fn delete(self, now: DateTime<Utc>) -> Listing {
        self.finish(ListingStatus::Deleted, now)
    }

    pub fn apply(self, change: StatusChange, now: DateTime<Utc>) -> Listing {
        match change {
            StatusChange::MarkSold => self.mark_sold(now),
            StatusChange::Delete => self.delete(now),
        }
    }

    fn finish(self, status: ListingStatus, now: DateTime<Utc>) -> Listing {
        let mut listing = self.0;
        listing.status = status;
        // updated_at 不倒退
        listing.updated_at = now.max(listing.updated_at);
        listing
    }
}

impl From<ActiveListing> for Listing {
    fn from(active: ActiveListing) -> Self {
        active.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedListing {
    pub user_id: UserId,
    pub listing_id: ListingId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<Listing>,
}

impl SavedListing {
    pub fn new(user_id: UserId, listing_id: ListingId, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            listing_id,
            created_at,
            listing: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_category_parsing_accepts_aliases() {
        assert_eq!("Sports Equipment".parse::<Category>().unwrap(), Category::SportsEquipment);
        assert_eq!("sports-equipment".parse::<Category>().unwrap(), Category::SportsEquipment);
        assert_eq!("TEXTBOOKS".parse::<Category>().unwrap(), Category::Textbooks);
        assert!("Cars".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_filter_empty_means_all() {
        assert_eq!(Category::parse_filter("").unwrap(), None);
        assert_eq!(Category::parse_filter("  ").unwrap(), None);
        assert_eq!(Category::parse_filter("all").unwrap(), None);
        assert_eq!(Category::parse_filter("Furniture").unwrap(), Some(Category::Furniture));
        assert!(Category::parse_filter("Boats").is_err());
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("newest".parse::<SortKey>().unwrap(), SortKey::Newest);
        assert_eq!("price_low".parse::<SortKey>().unwrap(), SortKey::PriceLow);
        assert_eq!("price-high".parse::<SortKey>().unwrap(), SortKey::PriceHigh);
        assert!("cheapest".parse::<SortKey>().is_err());
        assert_eq!(SortKey::default(), SortKey::Newest);
    }

    #[test]
    fn test_listing_deserializes_backend_row() {
        let json = serde_json::json!({
            "id": "2",
            "title": "MacBook Pro 2022",
            "description": "M1 Pro, 16GB RAM",
            "price": 1200.0,
            "category": "Electronics",
            "condition": "Like New",
            "images": ["https://img.example/a.jpg"],
            "seller_id": "7",
            "status": "sold",
            "created_at": "2024-01-02T00:00:00Z",
            "updated_at": "2024-01-03T00:00:00Z"
        });

        let listing: Listing = serde_json::from_value(json).unwrap();
        assert_eq!(listing.category, Some(Category::Electronics));
        assert_eq!(listing.condition, Some(Condition::LikeNew));
        assert_eq!(listing.status(), ListingStatus::Sold);
        assert_eq!(listing.seller_id, UserId::from("7"));
        assert!(listing.seller.is_none());
    }

    #[test]
    fn test_unknown_category_is_carried_as_none() {
        let json = serde_json::json!({
            "id": "9",
            "title": "Mystery box",
            "price": 5,
            "category": "Collectibles",
            "seller_id": "1",
            "created_at": "2024-01-02T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z"
        });

        let listing: Listing = serde_json::from_value(json).unwrap();
        assert_eq!(listing.category, None);
        assert_eq!(listing.condition, None);
        assert!(listing.is_active());
    }

    #[test]
    fn test_active_listing_can_be_sold_once() {
        let listing = Listing::new("1", "Desk", 40.0, "u1", at(1));
        let sold = listing.into_active().unwrap().mark_sold(at(3));

        assert_eq!(sold.status(), ListingStatus::Sold);
        assert_eq!(sold.updated_at, at(3));

        // 已售出的不能再轉換
        let rejected = sold.into_active().unwrap_err();
        assert_eq!(rejected.status(), ListingStatus::Sold);
    }

    #[test]
    fn test_transition_never_moves_updated_at_backwards() {
        let listing = Listing::new("1", "Desk", 40.0, "u1", at(5));
        let deleted = listing
            .into_active()
            .unwrap()
            .apply(StatusChange::Delete, at(2));

        assert_eq!(deleted.status(), ListingStatus::Deleted);
        assert_eq!(deleted.updated_at, at(5));
        assert!(deleted.created_at <= deleted.updated_at);
    }

    #[test]
    fn test_sold_listing_cannot_transition_again() {
        let sold = Listing::new("1", "Desk", 40.0, "u1", at(1))
            .transition(StatusChange::MarkSold, at(2))
            .unwrap();
        assert_eq!(sold.status(), ListingStatus::Sold);

        for change in [StatusChange::MarkSold, StatusChange::Delete] {
            let err = sold.clone().transition(change, at(3)).unwrap_err();
            assert!(matches!(
                err,
                MarketError::IllegalTransition { ref status, .. } if status == "sold"
            ));
        }
        assert_eq!(StatusChange::Delete.target(), ListingStatus::Deleted);
    }

    #[test]
    fn test_profile_initial() {
        let profile = Profile::new("1", "demo@queensu.ca", "Demo User", at(1));
        assert_eq!(profile.initial(), Some('D'));
    }
}
