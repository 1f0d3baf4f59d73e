use crate::core::listing_form::NewListing;
use crate::domain::model::{
    Category, Condition, Listing, ListingId, Profile, SavedListing, StatusChange, UserId,
};
use crate::domain::ports::ListingRepository;
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tokio::sync::RwLock;

/// On-disk shape of a marketplace snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub listings: Vec<Listing>,
    #[serde(default)]
    pub saved_listings: Vec<SavedListing>,
}

/// Repository over an in-memory [`Dataset`], for demos and tests.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<Dataset>,
}

impl InMemoryRepository {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            state: RwLock::new(dataset),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(content)?;
        tracing::debug!(
            "Loaded dataset: {} profiles, {} listings, {} saved",
            dataset.profiles.len(),
            dataset.listings.len(),
            dataset.saved_listings.len()
        );
        Ok(Self::new(dataset))
    }

    pub async fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json_str(&content)
    }

    /// 範例資料：兩位賣家、兩筆刊登、一筆收藏
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let demo = Profile::new("1", "demo@queensu.ca", "Demo User", now - Duration::days(90));
        let jane = Profile::new("2", "seller@queensu.ca", "Jane Doe", now - Duration::days(200));

        let textbook = Listing::new(
            "1",
            "Computer Science Textbook",
            75.0,
            demo.id.clone(),
            now - Duration::hours(2),
        )
        .with_description("Introduction to Algorithms, 4th Edition. Like new condition.")
        .with_category(Category::Textbooks)
        .with_condition(Condition::LikeNew)
        .with_images(vec![
            "https://images.unsplash.com/photo-1544716278-ca5e3f4abd8c".to_string(),
            "https://images.unsplash.com/photo-1589998059171-988d887df646".to_string(),
        ]);

        let laptop = Listing::new(
            "2",
            "MacBook Pro 2022",
            1200.0,
            jane.id.clone(),
            now - Duration::days(1),
        )
        .with_description("M1 Pro, 16GB RAM, 512GB SSD. Includes charger and original box.")
        .with_category(Category::Electronics)
        .with_condition(Condition::Good)
        .with_images(vec![
            "https://images.unsplash.com/photo-1517336714731-489689fd1ca8".to_string(),
            "https://images.unsplash.com/photo-1611186871348-b1ce696e52c9".to_string(),
        ]);

        let saved = SavedListing::new(demo.id.clone(), laptop.id.clone(), now);

        Self::new(Dataset {
            profiles: vec![demo, jane],
            listings: vec![textbook, laptop],
            saved_listings: vec![saved],
        })
    }

    pub async fn snapshot(&self) -> Dataset {
        self.state.read().await.clone()
    }

    pub async fn write_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(&*self.state.read().await)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path.as_ref(), content).await?;
        tracing::debug!("Dataset written to {}", path.as_ref().display());
        Ok(())
    }

    /// One past the highest numeric id, or the lowest free one once that
    /// would overflow.
    fn next_listing_id(dataset: &Dataset) -> Result<ListingId> {
        let used: BTreeSet<u64> = dataset
            .listings
            .iter()
            .filter_map(|listing| listing.id.as_str().parse::<u64>().ok())
            .collect();

        let next = match used.last() {
            None => Some(1),
            Some(max) => max
                .checked_add(1)
                .or_else(|| (1..=u64::MAX).find(|n| !used.contains(n))),
        };
        next.map(|n| ListingId(n.to_string()))
            .ok_or_else(|| MarketError::validation("id", "no listing ids left"))
    }
}

#[async_trait]
impl ListingRepository for InMemoryRepository {
    async fn list_listings(&self) -> Result<Vec<Listing>> {
        let state = self.state.read().await;
        // 模擬後端 join：帶上賣家資料
        Ok(state
            .listings
            .iter()
            .map(|listing| {
                let mut listing = listing.clone();
                if listing.seller.is_none() {
                    listing.seller = state
                        .profiles
                        .iter()
                        .find(|p| p.id == listing.seller_id)
                        .cloned();
                }
                listing
            })
            .collect())
    }

    async fn get_listing(&self, id: &ListingId) -> Result<Option<Listing>> {
        let state = self.state.read().await;
        Ok(state.listings.iter().find(|l| &l.id == id).cloned())
    }

    async fn get_profile(&self, id: &UserId) -> Result<Option<Profile>> {
        let state = self.state.read().await;
        Ok(state.profiles.iter().find(|p| &p.id == id).cloned())
    }

    async fn saved_listings(&self, user: &UserId) -> Result<Vec<SavedListing>> {
        let state = self.state.read().await;
        Ok(state
            .saved_listings
            .iter()
            .filter(|saved| &saved.user_id == user)
            .map(|saved| {
                let mut saved = saved.clone();
                if saved.listing.is_none() {
                    saved.listing = state
                        .listings
                        .iter()
                        .find(|l| l.id == saved.listing_id)
                        .cloned();
                }
                saved
            })
            .collect())
    }

    async fn create_listing(&self, listing: NewListing, seller: &UserId) -> Result<Listing> {
        let mut state = self.state.write().await;
        if !state.profiles.iter().any(|p| &p.id == seller) {
            return Err(MarketError::not_found("Profile", seller.as_str()));
        }

        let id = Self::next_listing_id(&state)?;
        let created = listing.into_listing(id, seller.clone(), Utc::now());
        state.listings.push(created.clone());
        Ok(created)
    }

    async fn update_status(
        &self,
        id: &ListingId,
        change: StatusChange,
        now: DateTime<Utc>,
    ) -> Result<Listing> {
        let mut state = self.state.write().await;
        let listing = state
            .listings
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| MarketError::not_found("Listing", id.as_str()))?;

        let updated = listing.clone().transition(change, now)?;
        *listing = updated.clone();
        Ok(updated)
    }

    async fn save_listing(&self, saved: SavedListing) -> Result<bool> {
        let mut state = self.state.write().await;
        let exists = state
            .saved_listings
            .iter()
            .any(|s| s.user_id == saved.user_id && s.listing_id == saved.listing_id);
        if exists {
            return Ok(false);
        }
        state.saved_listings.push(saved);
        Ok(true)
    }

    async fn unsave_listing(&self, user: &UserId, listing: &ListingId) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.saved_listings.len();
        state
            .saved_listings
            .retain(|s| !(&s.user_id == user && &s.listing_id == listing));
        Ok(state.saved_listings.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ListingStatus;

    #[tokio::test]
    async fn test_seeded_listings_carry_sellers() {
        let repo = InMemoryRepository::seeded(Utc::now());
        let listings = repo.list_listings().await.unwrap();

        assert_eq!(listings.len(), 2);
        assert!(listings.iter().all(|l| l.seller.is_some()));
    }

    #[tokio::test]
    async fn test_save_listing_is_idempotent() {
        let repo = InMemoryRepository::seeded(Utc::now());
        let again = SavedListing::new("1".into(), "2".into(), Utc::now());

        assert!(!repo.save_listing(again).await.unwrap());
        assert_eq!(repo.saved_listings(&"1".into()).await.unwrap().len(), 1);

        assert!(repo.unsave_listing(&"1".into(), &"2".into()).await.unwrap());
        assert!(!repo.unsave_listing(&"1".into(), &"2".into()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_status_keeps_fields() {
        let repo = InMemoryRepository::seeded(Utc::now());
        let id = ListingId::from("1");
        repo.update_status(&id, StatusChange::MarkSold, Utc::now())
            .await
            .unwrap();

        let listing = repo.get_listing(&id).await.unwrap().unwrap();
        assert_eq!(listing.status(), ListingStatus::Sold);
        assert_eq!(listing.title, "Computer Science Textbook");
    }

    #[tokio::test]
    async fn test_sold_listing_stays_sold() {
        let repo = InMemoryRepository::seeded(Utc::now());
        let id = ListingId::from("1");
        repo.update_status(&id, StatusChange::MarkSold, Utc::now())
            .await
            .unwrap();

        let err = repo
            .update_status(&id, StatusChange::Delete, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::IllegalTransition { .. }));

        let listing = repo.get_listing(&id).await.unwrap().unwrap();
        assert_eq!(listing.status(), ListingStatus::Sold);
    }

    #[test]
    fn test_next_listing_id_wraps_to_free_id() {
        let mut dataset = Dataset::default();
        assert_eq!(
            InMemoryRepository::next_listing_id(&dataset).unwrap(),
            ListingId::from("1")
        );

        let now = Utc::now();
        dataset.listings = vec![
            Listing::new("1", "Desk", 40.0, "u1", now),
            Listing::new(u64::MAX.to_string(), "Chair", 15.0, "u1", now),
            Listing::new("abc", "Lamp", 10.0, "u1", now),
        ];
        assert_eq!(
            InMemoryRepository::next_listing_id(&dataset).unwrap(),
            ListingId::from("2")
        );
    }

    #[tokio::test]
    async fn test_missing_listing_update_is_not_found() {
        let repo = InMemoryRepository::new(Dataset::default());
        let err = repo
            .update_status(&"9".into(), StatusChange::MarkSold, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
    }
}
