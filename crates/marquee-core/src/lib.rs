pub mod catalog;
pub mod config;
pub mod error;
pub mod favorites;
pub mod listing;
pub mod query_cache;
pub mod search;
pub mod trailer;

pub use catalog::{Catalog, MoviePage};
pub use error::CoreError;
pub use favorites::{FavoritesBackend, FavoritesStore, JsonFileBackend, MemoryBackend};
pub use listing::{ListingAggregator, ListingKind, ListingPage, PageState};
pub use query_cache::{QueryCache, QueryKey, QueryState, RetryPolicy};
pub use search::SearchSession;
