use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::events::{ListChange, ListEvent, ListObserver};
use crate::models::{ListType, Membership, MovieDetails, MovieTitle};

/// How long a notification stays visible
pub const NOTIFICATION_TTL_SECS: i64 = 3;

/// Kind of notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
}

/// A transient on-screen message about a list change
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.at >= Duration::seconds(NOTIFICATION_TTL_SECS)
    }
}

/// Collects notifications for list events
#[derive(Debug, Default)]
pub struct NotificationCenter {
    notifications: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications still visible at `now`; expired ones are discarded
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let mut notifications = self.lock();
        notifications.retain(|n| !n.is_expired(now));
        notifications.clone()
    }

    /// Takes every pending notification regardless of age
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    pub fn dismiss(&self, id: Uuid) {
        self.lock().retain(|n| n.id != id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        // A panic while holding the lock leaves a plain Vec behind; keep using it
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ListObserver for NotificationCenter {
    fn on_list_event(&self, event: &ListEvent) {
        let kind = match event.change {
            ListChange::Added | ListChange::Removed => NotificationKind::Success,
            ListChange::AlreadyPresent => NotificationKind::Info,
        };

        self.lock().push(Notification {
            id: Uuid::new_v4(),
            message: event.describe(),
            kind,
            at: event.at,
        });
    }
}

/// A rendered movie card with its list buttons
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: MovieTitle,
    pub details: Option<MovieDetails>,
    pub membership: Membership,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Card {
    /// Terminal rendering: title, summary line, one toggle per list
    pub fn render(&self) -> String {
        let mut out = self.title.clone();

        if let Some(summary) = self
            .details
            .as_ref()
            .map(MovieDetails::summary)
            .filter(|summary| !summary.is_empty())
        {
            out.push_str(&format!(" ({})", summary));
        }

        let buttons: Vec<String> = ListType::ALL
            .into_iter()
            .map(|list| {
                let mark = if self.membership.contains(list) { 'x' } else { ' ' };
                format!("[{}] {}", mark, list)
            })
            .collect();

        out.push('\n');
        out.push_str("  ");
        out.push_str(&buttons.join("  "));
        out
    }
}

/// Every visible card, keyed by title
///
/// Several cards can show the same title (a recommendation and an input
/// poster, say); all of them refresh together.
#[derive(Debug, Default)]
pub struct CardBoard {
    cards: Mutex<HashMap<MovieTitle, Vec<Card>>>,
}

impl CardBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a card on the board with its current membership
    pub fn register(&self, title: &str, details: Option<MovieDetails>, membership: Membership) {
        self.lock().entry(title.to_string()).or_default().push(Card {
            title: title.to_string(),
            details,
            membership,
            refreshed_at: None,
        });
    }

    pub fn cards_for(&self, title: &str) -> Vec<Card> {
        self.lock().get(title).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<MovieTitle, Vec<Card>>> {
        self.cards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ListObserver for CardBoard {
    fn on_list_event(&self, event: &ListEvent) {
        if !event.is_mutation() {
            return;
        }

        if let Some(cards) = self.lock().get_mut(&event.title) {
            for card in cards.iter_mut() {
                card.membership = event.membership;
                card.refreshed_at = Some(event.at);
            }
            tracing::debug!(title = %event.title, cards = cards.len(), "Refreshed cards");
        }
    }
}
