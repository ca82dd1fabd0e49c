//! Cached access to a [`MovieSource`].
//!
//! Every remote read goes through a [`QueryCache`], so re-reading a resolved
//! page or detail record costs no network traffic.

use futures::stream::{FuturesUnordered, StreamExt};
use marquee_api::{Cast, MovieDetails, MovieSource, Video};

use crate::error::CoreError;
use crate::listing::{ListingAggregator, ListingKind, ListingPage};
use crate::query_cache::{QueryCache, QueryKey, RetryPolicy};
use crate::trailer::{select_trailer, Trailer};

/// Cast members shown on a movie page.
pub const TOP_CAST: usize = 10;

/// Everything the movie detail view shows.
#[derive(Debug, Clone)]
pub struct MoviePage {
    pub details: MovieDetails,
    pub cast: Vec<Cast>,
}

pub struct Catalog<S> {
    source: S,
    listings: QueryCache<ListingPage>,
    details: QueryCache<MovieDetails>,
    videos: QueryCache<Vec<Video>>,
    credits: QueryCache<Vec<Cast>>,
}

impl<S: MovieSource> Catalog<S> {
    pub fn new(source: S, retry: RetryPolicy) -> Self {
        Self {
            source,
            listings: QueryCache::new(retry),
            details: QueryCache::new(retry),
            videos: QueryCache::new(retry),
            credits: QueryCache::new(retry),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn listings(&self) -> &QueryCache<ListingPage> {
        &self.listings
    }

    /// One page of a listing, fetched at most once per `(listing, page)`.
    pub async fn listing_page(
        &self,
        kind: &ListingKind,
        page: u32,
    ) -> Result<ListingPage, CoreError> {
        let source = &self.source;
        self.listings
            .get_or_fetch(&kind.query_key(page), move || async move {
                let resp = match kind {
                    ListingKind::NowPlaying => source.now_playing(page).await,
                    ListingKind::Trending(window) => source.trending(*window, page).await,
                    ListingKind::Search(query) => source.search_movies(query, page).await,
                }?;
                Ok::<_, S::Error>(ListingPage::from(resp))
            })
            .await
    }

    /// Fetch every page `listing` still needs and record each as it arrives.
    ///
    /// Pages are fetched concurrently, so they may land out of order; the
    /// aggregator keeps them ordered by page number. Returns the number of
    /// pages that resolved successfully.
    pub async fn drive(&self, listing: &mut ListingAggregator) -> usize {
        let kind = listing.kind().clone();
        let kind_ref = &kind;
        let mut in_flight: FuturesUnordered<_> = listing
            .pages_to_fetch()
            .into_iter()
            .map(move |page| async move { (page, self.listing_page(kind_ref, page).await) })
            .collect();

        let mut resolved = 0;
        while let Some((page, result)) = in_flight.next().await {
            let ok = result.is_ok();
            if listing.resolve(&kind, page, result.map_err(|e| e.to_string())) && ok {
                resolved += 1;
            }
        }
        resolved
    }

    pub async fn details(&self, movie_id: u64) -> Result<MovieDetails, CoreError> {
        let source = &self.source;
        self.details
            .get_or_fetch(&QueryKey::new(format!("/movie/{movie_id}")), move || {
                source.movie_details(movie_id)
            })
            .await
    }

    pub async fn videos(&self, movie_id: u64) -> Result<Vec<Video>, CoreError> {
        let source = &self.source;
        self.videos
            .get_or_fetch(
                &QueryKey::new(format!("/movie/{movie_id}/videos")),
                move || async move { source.movie_videos(movie_id).await.map(|r| r.results) },
            )
            .await
    }

    pub async fn credits(&self, movie_id: u64) -> Result<Vec<Cast>, CoreError> {
        let source = &self.source;
        self.credits
            .get_or_fetch(
                &QueryKey::new(format!("/movie/{movie_id}/credits")),
                move || async move { source.movie_credits(movie_id).await.map(|r| r.cast) },
            )
            .await
    }

    /// Details plus top-billed cast. Missing credits leave the cast empty
    /// rather than failing the page.
    pub async fn movie_page(&self, movie_id: u64) -> Result<MoviePage, CoreError> {
        let (details, credits) = tokio::join!(self.details(movie_id), self.credits(movie_id));
        let details = details?;
        let cast = match credits {
            Ok(mut cast) => {
                cast.truncate(TOP_CAST);
                cast
            }
            Err(e) => {
                tracing::warn!(movie_id, "credits unavailable: {e}");
                Vec::new()
            }
        };
        Ok(MoviePage { details, cast })
    }

    /// The movie's YouTube trailer, if it has one.
    pub async fn trailer(&self, movie_id: u64) -> Result<Option<Trailer>, CoreError> {
        let videos = self.videos(movie_id).await?;
        Ok(select_trailer(&videos))
    }
}
