//! Trait definitions for movie metadata sources.
//!
//! The TMDB client implements [`MovieSource`], and the core crate is written
//! against the trait so tests can swap in an in-memory source.

use std::future::Future;

use crate::types::{CreditsResponse, MovieDetails, MoviesResponse, VideosResponse};

/// A paginated, read-only movie metadata service.
pub trait MovieSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Movies trending over the given window.
    fn trending(
        &self,
        window: TimeWindow,
        page: u32,
    ) -> impl Future<Output = Result<MoviesResponse, Self::Error>> + Send;

    /// Movies currently in theatres.
    fn now_playing(&self, page: u32)
        -> impl Future<Output = Result<MoviesResponse, Self::Error>> + Send;

    /// Search movies by title.
    fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> impl Future<Output = Result<MoviesResponse, Self::Error>> + Send;

    /// Full details for one movie.
    fn movie_details(
        &self,
        movie_id: u64,
    ) -> impl Future<Output = Result<MovieDetails, Self::Error>> + Send;

    /// Trailers, teasers and clips for one movie.
    fn movie_videos(
        &self,
        movie_id: u64,
    ) -> impl Future<Output = Result<VideosResponse, Self::Error>> + Send;

    /// Cast list for one movie.
    fn movie_credits(
        &self,
        movie_id: u64,
    ) -> impl Future<Output = Result<CreditsResponse, Self::Error>> + Send;
}

/// Window for the trending endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeWindow {
    #[default]
    Day,
    Week,
}

impl TimeWindow {
    /// Path segment used by `/trending/movie/{window}`.
    pub fn as_path_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day => write!(f, "Today"),
            Self::Week => write!(f, "This Week"),
        }
    }
}
