//! Watchlist, favorites, watched and disliked lists plus the shared details table
//!
//! The store is the single source of truth for how each title is classified.
//! Every read goes to the backend, so two stores over the same backend always
//! agree once an operation has returned.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;

use crate::db::KeyValueStore;
use crate::models::{ListType, Membership, MovieDetails, MovieTitle};

pub mod events;
pub mod notifications;

pub use events::{ListChange, ListEvent, ListObserver};
pub use notifications::{Card, CardBoard, Notification, NotificationCenter, NotificationKind};

/// Key of the title → details table
pub const MOVIE_DETAILS_KEY: &str = "movieDetails";

/// Persistent movie lists with exclusion rules and change notification
pub struct ListStore {
    backend: Box<dyn KeyValueStore>,
    observers: Vec<Arc<dyn ListObserver>>,
}

impl ListStore {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            observers: Vec::new(),
        }
    }

    /// Registers an observer for every subsequent list event
    pub fn subscribe(&mut self, observer: Arc<dyn ListObserver>) {
        self.observers.push(observer);
    }

    /// Titles in `list`, in insertion order
    ///
    /// Missing or unreadable data reads as an empty list.
    pub fn get(&self, list: ListType) -> Vec<MovieTitle> {
        let raw = match self.backend.get(list.key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, list = %list, "Failed to read list, treating as empty");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, list = %list, "Malformed list data, treating as empty");
            Vec::new()
        })
    }

    /// Appends `title` to `list`
    ///
    /// Returns `false` without touching storage when the title is empty or
    /// already present. Adding to watchlist, favorites or disliked evicts the
    /// title from the other two. If any write fails the lists already
    /// rewritten are put back, no event is emitted and the result is `false`.
    pub fn add(&self, title: &str, list: ListType) -> bool {
        if title.is_empty() {
            tracing::debug!(list = %list, "Ignoring add of empty title");
            return false;
        }

        let mut titles = self.get(list);
        if titles.iter().any(|existing| existing == title) {
            tracing::debug!(title = %title, list = %list, "Title already in list");
            self.emit(title, list, ListChange::AlreadyPresent, Vec::new());
            return false;
        }

        warn_on_near_duplicate(title, list, &titles);

        // Previous contents of every list the title was evicted from
        let mut evicted: Vec<(ListType, Vec<MovieTitle>)> = Vec::new();

        for other in list.excludes().iter().copied() {
            let before = self.get(other);
            let Some(position) = before.iter().position(|existing| existing == title) else {
                continue;
            };

            let mut after = before.clone();
            after.remove(position);
            if !self.write_list(other, &after) {
                self.restore(title, &evicted);
                return false;
            }
            evicted.push((other, before));
        }

        titles.push(title.to_string());
        if !self.write_list(list, &titles) {
            self.restore(title, &evicted);
            return false;
        }

        let displaced: Vec<ListType> = evicted.into_iter().map(|(other, _)| other).collect();

        tracing::info!(
            title = %title,
            list = %list,
            displaced = ?displaced,
            "Added title to list"
        );

        self.emit(title, list, ListChange::Added, displaced);
        true
    }

    /// Removes `title` from `list`; `false` if it was not there
    pub fn remove(&self, title: &str, list: ListType) -> bool {
        if !self.remove_quietly(title, list) {
            return false;
        }

        tracing::info!(title = %title, list = %list, "Removed title from list");
        self.emit(title, list, ListChange::Removed, Vec::new());
        true
    }

    pub fn is_in_list(&self, title: &str, list: ListType) -> bool {
        !title.is_empty() && self.get(list).iter().any(|existing| existing == title)
    }

    /// Files `title` under `list`, optionally recording its details
    ///
    /// Details overwrite whatever was stored for the title before, whichever
    /// list it was filed under then. They are written first, even when the
    /// title is already in `list`; if that write fails the lists are left
    /// alone and the result is `false`.
    pub fn set_status(&self, title: &str, list: ListType, details: Option<MovieDetails>) -> bool {
        if title.is_empty() {
            return false;
        }

        if let Some(details) = details {
            if !self.store_details(title, details) {
                return false;
            }
        }

        self.add(title, list)
    }

    /// Which lists `title` is in
    pub fn membership(&self, title: &str) -> Membership {
        let mut membership = Membership::default();
        for list in ListType::ALL {
            membership.set(list, self.is_in_list(title, list));
        }
        membership
    }

    /// Stored details for `title`, if any
    pub fn details(&self, title: &str) -> Option<MovieDetails> {
        self.details_table().remove(title)
    }

    /// The whole details table
    ///
    /// Entries that are not JSON objects are skipped; a table that is not a
    /// JSON object reads as empty.
    pub fn details_table(&self) -> BTreeMap<MovieTitle, MovieDetails> {
        let raw = match self.backend.get(MOVIE_DETAILS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read movie details, treating as empty");
                return BTreeMap::new();
            }
        };

        let entries: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed movie details, treating as empty");
                return BTreeMap::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|(title, value)| match serde_json::from_value(value) {
                Ok(details) => Some((title, details)),
                Err(e) => {
                    tracing::warn!(error = %e, title = %title, "Skipping malformed details entry");
                    None
                }
            })
            .collect()
    }

    /// Drops details for titles that are in no list; returns how many went
    pub fn prune_details(&self) -> usize {
        let listed: HashSet<MovieTitle> = ListType::ALL
            .into_iter()
            .flat_map(|list| self.get(list))
            .collect();

        let mut table = self.details_table();
        let before = table.len();
        table.retain(|title, _| listed.contains(title));
        let pruned = before - table.len();

        if pruned > 0 && self.write_details(&table) {
            tracing::info!(pruned, "Pruned orphaned movie details");
            pruned
        } else {
            0
        }
    }

    fn store_details(&self, title: &str, details: MovieDetails) -> bool {
        let mut table = self.details_table();
        table.insert(title.to_string(), details);
        self.write_details(&table)
    }

    /// Puts back lists rewritten by an add that could not complete
    fn restore(&self, title: &str, evicted: &[(ListType, Vec<MovieTitle>)]) {
        for (list, titles) in evicted {
            if !self.write_list(*list, titles) {
                tracing::error!(
                    title = %title,
                    list = %list,
                    "Failed to restore list after aborted add"
                );
            }
        }
    }

    /// Removes without notifying
    fn remove_quietly(&self, title: &str, list: ListType) -> bool {
        if title.is_empty() {
            return false;
        }

        let mut titles = self.get(list);
        let Some(position) = titles.iter().position(|existing| existing == title) else {
            return false;
        };

        titles.remove(position);
        self.write_list(list, &titles)
    }

    fn write_list(&self, list: ListType, titles: &[MovieTitle]) -> bool {
        self.write(list.key(), titles)
    }

    fn write_details(&self, table: &BTreeMap<MovieTitle, MovieDetails>) -> bool {
        self.write(MOVIE_DETAILS_KEY, table)
    }

    fn write<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Failed to serialize list data");
                return false;
            }
        };

        match self.backend.set(key, &json) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    key = %key,
                    backend = self.backend.name(),
                    "Failed to persist list data"
                );
                false
            }
        }
    }

    fn emit(&self, title: &str, list: ListType, change: ListChange, displaced: Vec<ListType>) {
        if self.observers.is_empty() {
            return;
        }

        let event = ListEvent {
            title: title.to_string(),
            list,
            change,
            displaced,
            membership: self.membership(title),
            at: Utc::now(),
        };

        for observer in &self.observers {
            observer.on_list_event(&event);
        }
    }
}

/// Titles are exact keys, so "The Matrix" and "the matrix " are different
/// movies. Flag it when that is probably not what the caller meant.
fn warn_on_near_duplicate(title: &str, list: ListType, titles: &[MovieTitle]) {
    let folded = title.trim().to_lowercase();
    if let Some(existing) = titles
        .iter()
        .find(|existing| existing.trim().to_lowercase() == folded)
    {
        tracing::warn!(
            title = %title,
            existing = %existing,
            list = %list,
            "Title differs from an existing entry only by case or whitespace"
        );
    }
}
