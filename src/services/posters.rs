use std::sync::Arc;

use rand::seq::IndexedRandom;
use serde::Serialize;

use crate::services::providers::{is_usable_poster, poster_for_title, MetadataProvider};

/// Where a poster sits on the backdrop, in percent of the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PosterSlot {
    pub x: u8,
    pub y: u8,
    pub rotation: i16,
}

const fn slot(x: u8, y: u8, rotation: i16) -> PosterSlot {
    PosterSlot { x, y, rotation }
}

pub const POSTER_SLOTS: [PosterSlot; 11] = [
    slot(5, 15, -15),
    slot(85, 25, 12),
    slot(10, 65, 8),
    slot(80, 75, -10),
    slot(92, 45, 15),
    slot(15, 35, -8),
    slot(75, 15, 5),
    slot(25, 85, -12),
    slot(70, 55, 7),
    slot(3, 90, -5),
    slot(95, 85, 10),
];

/// Shown when none of the selected or recommended titles has a poster
pub const FALLBACK_TITLES: [&str; 5] = [
    "The Shawshank Redemption",
    "The Godfather",
    "Pulp Fiction",
    "The Dark Knight",
    "Fight Club",
];

/// Landing backdrop layout: the analysis slots plus two more near the middle
pub const BACKDROP_SLOTS: [PosterSlot; 13] = [
    POSTER_SLOTS[0],
    POSTER_SLOTS[1],
    POSTER_SLOTS[2],
    POSTER_SLOTS[3],
    POSTER_SLOTS[4],
    POSTER_SLOTS[5],
    POSTER_SLOTS[6],
    POSTER_SLOTS[7],
    POSTER_SLOTS[8],
    POSTER_SLOTS[9],
    POSTER_SLOTS[10],
    slot(40, 20, -20),
    slot(60, 90, 15),
];

/// IMDb ids the backdrop draws from
pub const BACKDROP_IMDB_IDS: [&str; 10] = [
    "tt0111161",
    "tt0068646",
    "tt0071562",
    "tt0468569",
    "tt0050083",
    "tt0108052",
    "tt0110912",
    "tt0167260",
    "tt0060196",
    "tt0137523",
];

/// A poster that resolved and was placed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedPoster {
    pub title: String,
    pub poster_url: String,
    pub slot: PosterSlot,
}

/// Pairs titles with slots: recommendations first, then the user's own picks
/// in whatever slots remain
pub fn assign_slots(recommended: &[String], inputs: &[String]) -> Vec<(String, PosterSlot)> {
    let input_room = POSTER_SLOTS.len().saturating_sub(recommended.len());

    recommended
        .iter()
        .chain(inputs.iter().take(input_room))
        .zip(POSTER_SLOTS)
        .map(|(title, slot)| (title.clone(), slot))
        .collect()
}

/// Resolves posters for the assigned slots concurrently
///
/// Slots whose poster does not resolve stay empty. When nothing resolves at
/// all, the classics in [`FALLBACK_TITLES`] are tried instead.
pub async fn lay_out_posters(
    provider: Arc<dyn MetadataProvider>,
    recommended: &[String],
    inputs: &[String],
) -> Vec<PlacedPoster> {
    let placed = resolve(provider.clone(), assign_slots(recommended, inputs)).await;
    if !placed.is_empty() {
        return placed;
    }

    tracing::info!("No posters were added, trying fallback titles");
    let fallback = FALLBACK_TITLES
        .iter()
        .map(|title| title.to_string())
        .zip(POSTER_SLOTS)
        .collect();
    resolve(provider, fallback).await
}

/// Draws one classic per backdrop slot; the same film may land twice
pub fn pick_backdrop<R: rand::Rng + ?Sized>(rng: &mut R) -> Vec<(&'static str, PosterSlot)> {
    BACKDROP_SLOTS
        .iter()
        .filter_map(|slot| BACKDROP_IMDB_IDS.choose(&mut *rng).map(|id| (*id, *slot)))
        .collect()
}

/// Fills the landing backdrop with randomly chosen classics
///
/// Lookups run concurrently. Slots whose movie fails to load or has no
/// usable poster stay empty.
pub async fn backdrop(provider: Arc<dyn MetadataProvider>) -> Vec<PlacedPoster> {
    let picks = pick_backdrop(&mut rand::rng());
    backdrop_from(provider, picks).await
}

async fn backdrop_from(
    provider: Arc<dyn MetadataProvider>,
    picks: Vec<(&'static str, PosterSlot)>,
) -> Vec<PlacedPoster> {
    let mut tasks = Vec::new();

    for (imdb_id, slot) in picks {
        let provider = provider.clone();
        tasks.push(tokio::spawn(async move {
            (imdb_id, slot, provider.movie(imdb_id).await)
        }));
    }

    let mut placed = Vec::new();
    for task in tasks {
        match task.await {
            Ok((_, slot, Ok(movie))) if is_usable_poster(&movie.poster) => {
                placed.push(PlacedPoster {
                    title: movie.title,
                    poster_url: movie.poster,
                    slot,
                })
            }
            Ok((imdb_id, _, Ok(_))) => {
                tracing::debug!(imdb_id, "Backdrop movie has no poster");
            }
            Ok((imdb_id, _, Err(e))) => {
                tracing::warn!(imdb_id, error = %e, "Error fetching backdrop poster");
            }
            Err(e) => tracing::error!(error = %e, "Poster task join error"),
        }
    }

    placed
}

async fn resolve(
    provider: Arc<dyn MetadataProvider>,
    assignments: Vec<(String, PosterSlot)>,
) -> Vec<PlacedPoster> {
    let mut tasks = Vec::new();

    for (title, slot) in assignments {
        let provider = provider.clone();
        let task = tokio::spawn(async move {
            let poster = poster_for_title(provider.as_ref(), &title).await;
            (title, slot, poster)
        });
        tasks.push(task);
    }

    let mut placed = Vec::new();
    for task in tasks {
        match task.await {
            Ok((title, slot, Some(poster_url))) => placed.push(PlacedPoster {
                title,
                poster_url,
                slot,
            }),
            Ok((title, _, None)) => {
                tracing::debug!(title = %title, "Could not create poster - no valid URL");
            }
            Err(e) => tracing::error!(error = %e, "Poster task join error"),
        }
    }

    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{OmdbMovie, OmdbSearchHit};
    use crate::services::providers::MockMetadataProvider;
    use rand::{rngs::StdRng, SeedableRng};

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn hit_with_poster(query: &str) -> OmdbSearchHit {
        OmdbSearchHit {
            title: query.to_string(),
            year: String::new(),
            imdb_id: String::new(),
            poster: format!("https://img/{}.jpg", query.replace(' ', "_")),
        }
    }

    #[test]
    fn test_assign_recommendations_first() {
        let assigned = assign_slots(&titles(&["R1", "R2"]), &titles(&["I1", "I2", "I3"]));
        let names: Vec<&str> = assigned.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(names, ["R1", "R2", "I1", "I2", "I3"]);
        assert_eq!(assigned[0].1, POSTER_SLOTS[0]);
        assert_eq!(assigned[2].1, POSTER_SLOTS[2]);
    }

    #[test]
    fn test_assign_caps_at_slot_count() {
        let recommended: Vec<String> = (0..9).map(|i| format!("R{}", i)).collect();
        let inputs = titles(&["I1", "I2", "I3", "I4"]);
        let assigned = assign_slots(&recommended, &inputs);
        assert_eq!(assigned.len(), POSTER_SLOTS.len());
        assert_eq!(assigned.last().unwrap().0, "I2");
    }

    #[test]
    fn test_assign_too_many_recommendations_leaves_no_room() {
        let recommended: Vec<String> = (0..12).map(|i| format!("R{}", i)).collect();
        let assigned = assign_slots(&recommended, &titles(&["I1"]));
        assert_eq!(assigned.len(), POSTER_SLOTS.len());
        assert!(assigned.iter().all(|(t, _)| t.starts_with('R')));
    }

    #[tokio::test]
    async fn test_unresolved_slots_stay_empty() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_search().returning(|query| {
            if query == "Heat" {
                Err(AppError::NotFound("Movie not found!".to_string()))
            } else {
                Ok(vec![hit_with_poster(query)])
            }
        });

        let placed = lay_out_posters(
            Arc::new(provider),
            &titles(&["Memento"]),
            &titles(&["Heat", "Alien"]),
        )
        .await;

        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0].title, "Memento");
        assert_eq!(placed[0].slot, POSTER_SLOTS[0]);
        assert_eq!(placed[1].title, "Alien");
        assert_eq!(placed[1].slot, POSTER_SLOTS[2]);
        assert_eq!(placed[1].poster_url, "https://img/Alien.jpg");
    }

    #[tokio::test]
    async fn test_falls_back_to_classics() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_search().returning(|query| {
            if FALLBACK_TITLES.contains(&query) {
                Ok(vec![hit_with_poster(query)])
            } else {
                Ok(vec![])
            }
        });

        let placed = lay_out_posters(Arc::new(provider), &titles(&["Obscure"]), &[]).await;

        let names: Vec<&str> = placed.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(names, FALLBACK_TITLES);
        assert_eq!(placed[4].slot, POSTER_SLOTS[4]);
    }

    fn classic(imdb_id: &str, poster: &str) -> OmdbMovie {
        OmdbMovie {
            title: format!("Classic {}", imdb_id),
            year: String::new(),
            genre: String::new(),
            plot: String::new(),
            poster: poster.to_string(),
            imdb_rating: String::new(),
            imdb_id: imdb_id.to_string(),
            response: "True".to_string(),
            error: None,
        }
    }

    #[test]
    fn test_backdrop_slots_extend_poster_slots() {
        assert_eq!(BACKDROP_SLOTS[..POSTER_SLOTS.len()], POSTER_SLOTS);
        assert_eq!(BACKDROP_SLOTS[11], slot(40, 20, -20));
        assert_eq!(BACKDROP_SLOTS[12], slot(60, 90, 15));
    }

    #[test]
    fn test_pick_backdrop_fills_every_slot() {
        let mut rng = StdRng::seed_from_u64(7);
        let picks = pick_backdrop(&mut rng);

        assert_eq!(picks.len(), BACKDROP_SLOTS.len());
        assert!(picks.iter().all(|(id, _)| BACKDROP_IMDB_IDS.contains(id)));
        let slots: Vec<PosterSlot> = picks.iter().map(|(_, slot)| *slot).collect();
        assert_eq!(slots, BACKDROP_SLOTS);
    }

    #[tokio::test]
    async fn test_backdrop_places_posters_in_slot_order() {
        let mut provider = MockMetadataProvider::new();
        provider
            .expect_movie()
            .returning(|id| Ok(classic(id, &format!("https://img/{}.jpg", id))));

        let placed = backdrop(Arc::new(provider)).await;

        assert_eq!(placed.len(), BACKDROP_SLOTS.len());
        for (poster, slot) in placed.iter().zip(BACKDROP_SLOTS) {
            assert_eq!(poster.slot, slot);
            assert!(poster.title.starts_with("Classic tt"));
            assert!(poster.poster_url.starts_with("https://img/tt"));
        }
    }

    #[tokio::test]
    async fn test_backdrop_skips_missing_posters() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_movie().returning(|id| {
            if id == "tt0111161" {
                Err(AppError::NotFound("Movie not found!".to_string()))
            } else {
                Ok(classic(id, "N/A"))
            }
        });

        let picks = vec![("tt0111161", BACKDROP_SLOTS[0]), ("tt0068646", BACKDROP_SLOTS[1])];
        assert!(backdrop_from(Arc::new(provider), picks).await.is_empty());
    }

    #[tokio::test]
    async fn test_backdrop_keeps_resolved_slots() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_movie().returning(|id| {
            if id == "tt0137523" {
                Ok(classic(id, "https://img/fight.jpg"))
            } else {
                Ok(classic(id, "N/A"))
            }
        });

        let picks = vec![("tt0060196", BACKDROP_SLOTS[0]), ("tt0137523", BACKDROP_SLOTS[12])];
        let placed = backdrop_from(Arc::new(provider), picks).await;

        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].title, "Classic tt0137523");
        assert_eq!(placed[0].slot, BACKDROP_SLOTS[12]);
    }
}
