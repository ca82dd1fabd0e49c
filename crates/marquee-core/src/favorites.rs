//! Locally saved favorite movies.
//!
//! The set is kept in memory in insertion order and written back through a
//! [`FavoritesBackend`] as a whole after every mutation. Entries are movie
//! snapshots taken when they were favorited; later upstream changes are not
//! reflected.

pub mod backend;

use marquee_api::Movie;

use crate::error::CoreError;

pub use backend::{FavoritesBackend, JsonFileBackend, MemoryBackend};

/// File the favorites array is written to, named after its `movie-favorites` storage key.
pub const FAVORITES_FILE: &str = "movie-favorites.json";

/// Single source of truth for "is this movie favorited".
pub struct FavoritesStore<B: FavoritesBackend> {
    backend: B,
    favorites: Vec<Movie>,
    synced: bool,
}

impl<B: FavoritesBackend> FavoritesStore<B> {
    /// Load the set from `backend`. Missing, unreadable or unparsable storage
    /// yields an empty set.
    pub fn open(backend: B) -> Self {
        let favorites = match backend.load() {
            Ok(Some(content)) => match serde_json::from_str::<Vec<Movie>>(&content) {
                Ok(movies) => dedupe(movies),
                Err(e) => {
                    tracing::warn!("Ignoring corrupt favorites storage: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read favorites storage: {e}");
                Vec::new()
            }
        };
        tracing::debug!(count = favorites.len(), "favorites loaded");

        Self {
            backend,
            favorites,
            synced: true,
        }
    }

    /// Favorites in insertion order.
    pub fn favorites(&self) -> &[Movie] {
        &self.favorites
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    pub fn get(&self, movie_id: u64) -> Option<&Movie> {
        self.favorites.iter().find(|m| m.id == movie_id)
    }

    pub fn is_favorite(&self, movie_id: u64) -> bool {
        self.get(movie_id).is_some()
    }

    /// Whether the last write reached storage. False after a failed save,
    /// until a later mutation persists successfully.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Insert `movie`. An entry with the same id is replaced in place.
    ///
    /// The in-memory set is updated even when persisting fails; the error is
    /// returned so the caller knows storage is behind.
    pub fn add(&mut self, movie: Movie) -> Result<(), CoreError> {
        match self.favorites.iter_mut().find(|m| m.id == movie.id) {
            Some(existing) => *existing = movie,
            None => self.favorites.push(movie),
        }
        self.persist()
    }

    /// Remove the entry for `movie_id`. Returns whether anything was removed;
    /// an absent id leaves storage untouched.
    pub fn remove(&mut self, movie_id: u64) -> Result<bool, CoreError> {
        let before = self.favorites.len();
        self.favorites.retain(|m| m.id != movie_id);
        if self.favorites.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Remove `movie` if favorited, add it otherwise. Returns the new status.
    pub fn toggle_favorite(&mut self, movie: Movie) -> Result<bool, CoreError> {
        if self.is_favorite(movie.id) {
            self.remove(movie.id)?;
            Ok(false)
        } else {
            self.add(movie)?;
            Ok(true)
        }
    }

    pub fn clear(&mut self) -> Result<(), CoreError> {
        self.favorites.clear();
        self.persist()
    }

    fn persist(&mut self) -> Result<(), CoreError> {
        let serialized = serde_json::to_string(&self.favorites)?;
        match self.backend.save(&serialized) {
            Ok(()) => {
                self.synced = true;
                Ok(())
            }
            Err(e) => {
                self.synced = false;
                tracing::warn!("Favorites changed in memory but were not saved: {e}");
                Err(CoreError::Persist(e.to_string()))
            }
        }
    }
}

/// Collapse duplicate ids written by older versions, keeping the first
/// position and the last snapshot.
fn dedupe(movies: Vec<Movie>) -> Vec<Movie> {
    let mut out: Vec<Movie> = Vec::with_capacity(movies.len());
    for movie in movies {
        match out.iter_mut().find(|m| m.id == movie.id) {
            Some(existing) => *existing = movie,
            None => out.push(movie),
        }
    }
    out
}
