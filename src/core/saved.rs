use crate::domain::model::{Listing, ListingId, SavedListing, UserId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Bookmarks, at most one per (user, listing) pair.
#[derive(Debug, Clone, Default)]
pub struct SavedListings {
    entries: BTreeMap<(UserId, ListingId), SavedListing>,
}

/// A bookmark and the listing it points at, if that listing still exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSave<'a> {
    pub saved: &'a SavedListing,
    pub listing: Option<&'a Listing>,
}

impl SavedListings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duplicates collapse into the earliest save.
    pub fn from_records(records: impl IntoIterator<Item = SavedListing>) -> Self {
        let mut saved = Self::new();
        for record in records {
            let key = (record.user_id.clone(), record.listing_id.clone());
            let keep_existing = saved
                .entries
                .get(&key)
                .is_some_and(|existing| existing.created_at <= record.created_at);
            if !keep_existing {
                saved.entries.insert(key, record);
            }
        }
        saved
    }

    /// Returns `true` when the pair was not saved before.
    pub fn save(&mut self, user: &UserId, listing: &ListingId, now: DateTime<Utc>) -> bool {
        let key = (user.clone(), listing.clone());
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries
            .insert(key, SavedListing::new(user.clone(), listing.clone(), now));
        true
    }

    pub fn unsave(&mut self, user: &UserId, listing: &ListingId) -> bool {
        self.entries
            .remove(&(user.clone(), listing.clone()))
            .is_some()
    }

    /// Returns whether the listing is saved afterwards.
    pub fn toggle(&mut self, user: &UserId, listing: &ListingId, now: DateTime<Utc>) -> bool {
        if self.unsave(user, listing) {
            false
        } else {
            self.save(user, listing, now)
        }
    }

    pub fn is_saved(&self, user: &UserId, listing: &ListingId) -> bool {
        self.entries.contains_key(&(user.clone(), listing.clone()))
    }

    /// Newest save first.
    pub fn for_user(&self, user: &UserId) -> Vec<&SavedListing> {
        let mut saves: Vec<&SavedListing> = self
            .entries
            .values()
            .filter(|saved| &saved.user_id == user)
            .collect();
        saves.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        saves
    }

    /// Pairs each of the user's saves with its listing, looked up in
    /// `listings` first and then in the embedded join.
    pub fn resolve<'a>(&'a self, user: &UserId, listings: &'a [Listing]) -> Vec<ResolvedSave<'a>> {
        self.for_user(user)
            .into_iter()
            .map(|saved| ResolvedSave {
                saved,
                listing: listings
                    .iter()
                    .find(|listing| listing.id == saved.listing_id)
                    .or(saved.listing.as_ref()),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
