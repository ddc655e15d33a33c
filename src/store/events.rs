use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{ListType, Membership, MovieTitle};

/// What a list operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListChange {
    Added,
    AlreadyPresent,
    Removed,
}

/// Emitted by the list store after every add or remove that names a title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListEvent {
    pub title: MovieTitle,
    pub list: ListType,
    pub change: ListChange,
    /// Lists the title was evicted from to keep the exclusion rules
    pub displaced: Vec<ListType>,
    /// Membership of `title` across all lists once the operation finished
    pub membership: Membership,
    pub at: DateTime<Utc>,
}

impl ListEvent {
    /// Human-readable description of the change
    pub fn describe(&self) -> String {
        let base = match self.change {
            ListChange::Added => format!("Added \"{}\" to {}", self.title, self.list),
            ListChange::AlreadyPresent => {
                format!("\"{}\" is already in your {}", self.title, self.list)
            }
            ListChange::Removed => format!("Removed \"{}\" from {}", self.title, self.list),
        };

        if self.displaced.is_empty() {
            base
        } else {
            let lists: Vec<&str> = self.displaced.iter().map(|list| list.key()).collect();
            format!("{} (removed from {})", base, lists.join(", "))
        }
    }

    /// Whether persisted state changed
    pub fn is_mutation(&self) -> bool {
        self.change != ListChange::AlreadyPresent
    }
}

/// Reacts to list changes; implemented by the presentation layer
pub trait ListObserver: Send + Sync {
    fn on_list_event(&self, event: &ListEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(change: ListChange, displaced: Vec<ListType>) -> ListEvent {
        ListEvent {
            title: "Heat".to_string(),
            list: ListType::Watchlist,
            change,
            displaced,
            membership: Membership::default(),
            at: Utc::now(),
        }
    }

    #[test]
    fn test_describe_added() {
        assert_eq!(
            event(ListChange::Added, vec![]).describe(),
            "Added \"Heat\" to watchlist"
        );
    }

    #[test]
    fn test_describe_already_present() {
        let e = event(ListChange::AlreadyPresent, vec![]);
        assert_eq!(e.describe(), "\"Heat\" is already in your watchlist");
        assert!(!e.is_mutation());
    }

    #[test]
    fn test_describe_removed() {
        assert_eq!(
            event(ListChange::Removed, vec![]).describe(),
            "Removed \"Heat\" from watchlist"
        );
    }

    #[test]
    fn test_describe_mentions_displaced_lists() {
        let e = event(ListChange::Added, vec![ListType::Favorites, ListType::Disliked]);
        assert_eq!(
            e.describe(),
            "Added \"Heat\" to watchlist (removed from favorites, disliked)"
        );
    }
}
