use crate::core::listing_form::NewListing;
use crate::domain::model::{
    Listing, ListingId, ListingStatus, Profile, SavedListing, StatusChange, UserId,
};
use crate::domain::ports::ListingRepository;
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

const LISTING_SELECT: &str = "*,seller:profiles(*)";
const SAVED_SELECT: &str = "*,listing:listings(*)";

/// Repository over the hosted backend's REST interface
/// (`{base}/rest/v1/<table>` with PostgREST-style filters).
#[derive(Debug, Clone)]
pub struct RestRepository {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
}

impl RestRepository {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(Duration::from_secs(seconds));
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = self.table_url(table);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        request
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Backend response status: {}", status);

        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(MarketError::BackendError {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Ok(self.send(request).await?.json().await?)
    }

    /// Decodes each row on its own; rows that do not fit `T` are logged
    /// and dropped instead of failing the whole collection.
    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        request: RequestBuilder,
    ) -> Result<Vec<T>> {
        let rows: Vec<serde_json::Value> = self.fetch(request).await?;
        Ok(decode_rows(table, rows))
    }
}

fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<serde_json::Value>) -> Vec<T> {
    let total = rows.len();
    let decoded: Vec<T> = rows
        .into_iter()
        .filter_map(|row| {
            let id = row.get("id").cloned().unwrap_or_default();
            match serde_json::from_value(row) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Skipping malformed {} row {}: {}", table, id, e);
                    None
                }
            }
        })
        .collect();

    if decoded.len() < total {
        tracing::warn!("⚠️  Skipped {} of {} {} rows", total - decoded.len(), total, table);
    }
    decoded
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl ListingRepository for RestRepository {
    async fn list_listings(&self) -> Result<Vec<Listing>> {
        let request = self
            .request(Method::GET, "listings")
            .query(&[("select", LISTING_SELECT)]);
        let listings: Vec<Listing> = self.fetch_rows("listings", request).await?;
        tracing::info!("📦 Fetched {} listings", listings.len());
        Ok(listings)
    }

    async fn get_listing(&self, id: &ListingId) -> Result<Option<Listing>> {
        let request = self
            .request(Method::GET, "listings")
            .query(&[("select", LISTING_SELECT.to_string()), ("id", eq(id.as_str()))]);
        let rows: Vec<Listing> = self.fetch(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_profile(&self, id: &UserId) -> Result<Option<Profile>> {
        let request = self
            .request(Method::GET, "profiles")
            .query(&[("select", "*".to_string()), ("id", eq(id.as_str()))]);
        let rows: Vec<Profile> = self.fetch(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn saved_listings(&self, user: &UserId) -> Result<Vec<SavedListing>> {
        let request = self.request(Method::GET, "saved_listings").query(&[
            ("select", SAVED_SELECT.to_string()),
            ("user_id", eq(user.as_str())),
            ("order", "created_at.desc".to_string()),
        ]);
        self.fetch_rows("saved_listings", request).await
    }

    async fn create_listing(&self, listing: NewListing, seller: &UserId) -> Result<Listing> {
        let body = serde_json::json!({
            "title": listing.title,
            "description": listing.description,
            "price": listing.price,
            "category": listing.category,
            "condition": listing.condition,
            "images": listing.images,
            "seller_id": seller,
        });

        let request = self
            .request(Method::POST, "listings")
            .header("Prefer", "return=representation")
            .json(&body);
        let rows: Vec<Listing> = self.fetch(request).await?;

        rows.into_iter().next().ok_or_else(|| MarketError::BackendError {
            status: 200,
            message: "insert returned no rows".to_string(),
        })
    }

    async fn update_status(
        &self,
        id: &ListingId,
        change: StatusChange,
        now: DateTime<Utc>,
    ) -> Result<Listing> {
        // 只更新仍為 active 的資料列
        let request = self
            .request(Method::PATCH, "listings")
            .query(&[
                ("select", LISTING_SELECT.to_string()),
                ("id", eq(id.as_str())),
                ("status", eq(ListingStatus::Active.as_str())),
            ])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "status": change.target(), "updated_at": now }));

        let rows: Vec<Listing> = self.fetch(request).await?;
        if let Some(updated) = rows.into_iter().next() {
            return Ok(updated);
        }

        let current = self
            .get_listing(id)
            .await?
            .ok_or_else(|| MarketError::not_found("Listing", id.as_str()))?;
        current.transition(change, now)?;
        Err(MarketError::BackendError {
            status: 409,
            message: format!("listing {} was not updated", id),
        })
    }

    async fn save_listing(&self, saved: SavedListing) -> Result<bool> {
        // 重複收藏由後端忽略，回傳空陣列
        let request = self
            .request(Method::POST, "saved_listings")
            .header("Prefer", "resolution=ignore-duplicates,return=representation")
            .json(&serde_json::json!({
                "user_id": saved.user_id,
                "listing_id": saved.listing_id,
                "created_at": saved.created_at,
            }));
        let rows: Vec<serde_json::Value> = self.fetch(request).await?;
        Ok(!rows.is_empty())
    }

    async fn unsave_listing(&self, user: &UserId, listing: &ListingId) -> Result<bool> {
        let request = self
            .request(Method::DELETE, "saved_listings")
            .query(&[("user_id", eq(user.as_str())), ("listing_id", eq(listing.as_str()))])
            .header("Prefer", "return=representation");
        let rows: Vec<serde_json::Value> = self.fetch(request).await?;
        Ok(!rows.is_empty())
    }
}
