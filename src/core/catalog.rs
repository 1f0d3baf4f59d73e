//! Catalog query engine.
//!
//! Turns the raw listing collection into the sequence the browse view shows:
//! a case-insensitive title search, an optional category restriction and one
//! of three sort orders. Everything here is pure and borrows its input, so
//! the source collection keeps its order no matter how often it is queried.

use crate::domain::model::{Category, Listing, ListingId, SortKey};
use crate::domain::ports::ConfigProvider;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search_term: String,
    pub category: Option<Category>,
    pub sort: SortKey,
    /// Drop sold and deleted listings before sorting.
    pub active_only: bool,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting query for a view: configured sort unless `sort` overrides it.
    /// Every status is shown unless the caller or the config asks otherwise.
    pub fn for_view<C>(config: &C, sort: Option<SortKey>, active_only: bool) -> Self
    where
        C: ConfigProvider + ?Sized,
    {
        let query = Self::new().sorted_by(sort.unwrap_or_else(|| config.default_sort()));
        if active_only || config.active_only() {
            query.only_active()
        } else {
            query
        }
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn only_active(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.matches_lowercased(listing, &self.search_term.to_lowercase())
    }

    // 只比對標題，不搜尋描述
    fn matches_lowercased(&self, listing: &Listing, needle: &str) -> bool {
        if self.active_only && !listing.is_active() {
            return false;
        }
        if let Some(category) = self.category {
            if listing.category != Some(category) {
                return false;
            }
        }
        needle.is_empty() || listing.title.to_lowercase().contains(needle)
    }
}

/// Filters and sorts `listings` without touching the slice.
///
/// All three orders are stable: listings with equal price (or equal
/// `created_at` for [`SortKey::Newest`]) keep their input order. Prices are
/// compared with IEEE total ordering, so a NaN price sorts after every number
/// for `price_low` and before every number for `price_high`.
pub fn query<'a>(listings: &'a [Listing], query: &CatalogQuery) -> Vec<&'a Listing> {
    let needle = query.search_term.to_lowercase();

    let mut results: Vec<&Listing> = listings
        .iter()
        .filter(|listing| query.matches_lowercased(listing, &needle))
        .collect();

    match query.sort {
        SortKey::PriceLow => results.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::PriceHigh => results.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortKey::Newest => results.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }

    tracing::debug!(
        "Catalog query '{}' (category: {:?}, sort: {}) matched {} of {} listings",
        query.search_term,
        query.category,
        query.sort,
        results.len(),
        listings.len()
    );

    results
}

/// Owns the source-of-truth collection the browse view re-queries on every
/// parameter change.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    listings: Vec<Listing>,
}

impl Catalog {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    pub fn query(&self, catalog_query: &CatalogQuery) -> Vec<&Listing> {
        query(&self.listings, catalog_query)
    }

    pub fn get(&self, id: &ListingId) -> Option<&Listing> {
        self.listings.iter().find(|listing| &listing.id == id)
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}
