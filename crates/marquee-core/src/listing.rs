//! Incremental aggregation of a paginated listing.
//!
//! Pages are requested strictly in sequence (`1..=N`) but may resolve in any
//! order. Reads always assemble items by ascending page number, and pages
//! that have not resolved contribute nothing.

use std::collections::BTreeMap;

use marquee_api::{Movie, MoviesResponse, TimeWindow};

use crate::query_cache::QueryKey;

/// Which remote listing an aggregation is built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingKind {
    NowPlaying,
    Trending(TimeWindow),
    Search(String),
}

impl ListingKind {
    pub fn endpoint(&self) -> String {
        match self {
            Self::NowPlaying => "/movie/now_playing".to_string(),
            Self::Trending(window) => format!("/trending/movie/{}", window.as_path_str()),
            Self::Search(_) => "/search/movie".to_string(),
        }
    }

    /// Cache identity of one page of this listing.
    pub fn query_key(&self, page: u32) -> QueryKey {
        let key = QueryKey::new(self.endpoint()).param("page", page);
        match self {
            Self::Search(query) => key.param("query", query),
            _ => key,
        }
    }
}

impl std::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NowPlaying => write!(f, "New Release"),
            Self::Trending(window) => write!(f, "Trending {window}"),
            Self::Search(query) => write!(f, "Results for \"{query}\""),
        }
    }
}

/// One resolved page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub page_number: u32,
    pub items: Vec<Movie>,
    pub total_pages: u32,
}

impl From<MoviesResponse> for ListingPage {
    fn from(resp: MoviesResponse) -> Self {
        Self {
            page_number: resp.page,
            items: resp.results,
            total_pages: resp.total_pages,
        }
    }
}

/// Lifecycle of a requested page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageState {
    Loading,
    Resolved(ListingPage),
    Failed(String),
}

/// A growing, flattened view over consecutive pages of one listing.
#[derive(Debug, Clone)]
pub struct ListingAggregator {
    kind: ListingKind,
    pages: BTreeMap<u32, PageState>,
}

impl ListingAggregator {
    /// Start a listing with page 1 requested.
    pub fn new(kind: ListingKind) -> Self {
        let mut pages = BTreeMap::new();
        pages.insert(1, PageState::Loading);
        Self { kind, pages }
    }

    pub fn kind(&self) -> &ListingKind {
        &self.kind
    }

    /// Highest page number requested so far.
    pub fn frontier(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Requested page numbers, always `1..=frontier`.
    pub fn requested_pages(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    /// Request the page after the frontier and return its number.
    pub fn request_next_page(&mut self) -> u32 {
        let next = self.frontier() + 1;
        self.pages.insert(next, PageState::Loading);
        tracing::debug!(kind = %self.kind, page = next, "page requested");
        next
    }

    pub fn page_state(&self, page: u32) -> Option<&PageState> {
        self.pages.get(&page)
    }

    /// Requested pages that still need a fetch: loading ones and failed ones.
    pub fn pages_to_fetch(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|(_, state)| !matches!(state, PageState::Resolved(_)))
            .map(|(page, _)| *page)
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        self.pages
            .values()
            .any(|state| matches!(state, PageState::Loading))
    }

    /// Record the outcome of fetching `page`.
    ///
    /// Results for another listing (a superseded search term) or for a page
    /// that was never requested are dropped, and a resolved page is never
    /// replaced. Returns whether the outcome was applied.
    pub fn resolve(
        &mut self,
        kind: &ListingKind,
        page: u32,
        outcome: Result<ListingPage, String>,
    ) -> bool {
        if *kind != self.kind {
            tracing::debug!(expected = %self.kind, got = %kind, page, "stale page dropped");
            return false;
        }
        let Some(state) = self.pages.get_mut(&page) else {
            tracing::debug!(kind = %self.kind, page, "unrequested page dropped");
            return false;
        };
        if matches!(state, PageState::Resolved(_)) {
            tracing::debug!(kind = %self.kind, page, "page already resolved");
            return false;
        }
        *state = match outcome {
            Ok(mut listing) => {
                listing.page_number = page;
                PageState::Resolved(listing)
            }
            Err(msg) => {
                tracing::warn!(kind = %self.kind, page, "page failed: {msg}");
                PageState::Failed(msg)
            }
        };
        true
    }

    /// Items of every resolved page, ascending by page number, each page in its own order.
    pub fn aggregated_items(&self) -> Vec<&Movie> {
        self.resolved_pages()
            .flat_map(|page| page.items.iter())
            .collect()
    }

    /// Whether the source reports pages beyond the highest resolved one.
    ///
    /// While later pages are still loading this keeps reflecting the last
    /// resolved page, so it does not flip while a fetch is in flight.
    pub fn has_more(&self) -> bool {
        self.resolved_pages()
            .next_back()
            .map(|page| page.page_number < page.total_pages)
            .unwrap_or(false)
    }

    /// Reported result page count, from the highest resolved page.
    pub fn total_pages(&self) -> Option<u32> {
        self.resolved_pages().next_back().map(|page| page.total_pages)
    }

    fn resolved_pages(&self) -> impl DoubleEndedIterator<Item = &ListingPage> {
        self.pages.values().filter_map(|state| match state {
            PageState::Resolved(page) => Some(page),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: u64) -> Movie {
        Movie {
            id,
            title: format!("Movie {id}"),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            release_date: String::new(),
            vote_average: 5.0,
            genre_ids: Vec::new(),
        }
    }

    fn page(number: u32, ids: &[u64], total_pages: u32) -> Result<ListingPage, String> {
        Ok(ListingPage {
            page_number: number,
            items: ids.iter().copied().map(movie).collect(),
            total_pages,
        })
    }

    fn item_ids(listing: &ListingAggregator) -> Vec<u64> {
        listing.aggregated_items().iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_starts_with_page_one_requested() {
        let listing = ListingAggregator::new(ListingKind::NowPlaying);
        assert_eq!(listing.requested_pages(), vec![1]);
        assert_eq!(listing.pages_to_fetch(), vec![1]);
        assert!(listing.aggregated_items().is_empty());
        assert!(!listing.has_more());
        assert!(listing.is_loading());
    }

    #[test]
    fn test_frontier_advances_by_one() {
        let mut listing = ListingAggregator::new(ListingKind::NowPlaying);
        assert_eq!(listing.request_next_page(), 2);
        assert_eq!(listing.request_next_page(), 3);
        assert_eq!(listing.requested_pages(), vec![1, 2, 3]);
        assert_eq!(listing.frontier(), 3);
    }

    #[test]
    fn test_three_page_walkthrough() {
        let kind = ListingKind::NowPlaying;
        let mut listing = ListingAggregator::new(kind.clone());

        listing.resolve(&kind, 1, page(1, &[1, 2], 3));
        assert_eq!(item_ids(&listing), vec![1, 2]);
        assert!(listing.has_more());

        listing.request_next_page();
        listing.resolve(&kind, 2, page(2, &[3], 3));
        assert_eq!(item_ids(&listing), vec![1, 2, 3]);
        assert!(listing.has_more());

        listing.request_next_page();
        listing.resolve(&kind, 3, page(3, &[4], 3));
        assert_eq!(item_ids(&listing), vec![1, 2, 3, 4]);
        assert!(!listing.has_more());
        assert!(!listing.is_loading());
    }

    #[test]
    fn test_out_of_order_resolution_is_ordered_by_page() {
        let kind = ListingKind::Trending(TimeWindow::Day);
        let orders: [[u32; 3]; 3] = [[3, 1, 2], [2, 3, 1], [3, 2, 1]];

        for order in orders {
            let mut listing = ListingAggregator::new(kind.clone());
            listing.request_next_page();
            listing.request_next_page();
            for n in order {
                let ids = [u64::from(n) * 10, u64::from(n) * 10 + 1];
                listing.resolve(&kind, n, page(n, &ids, 5));
            }
            assert_eq!(item_ids(&listing), vec![10, 11, 20, 21, 30, 31]);
        }
    }

    #[test]
    fn test_loading_page_contributes_nothing() {
        let kind = ListingKind::NowPlaying;
        let mut listing = ListingAggregator::new(kind.clone());
        listing.request_next_page();
        listing.request_next_page();
        listing.resolve(&kind, 3, page(3, &[30], 9));

        assert_eq!(item_ids(&listing), vec![30]);
        assert_eq!(listing.pages_to_fetch(), vec![1, 2]);
    }

    #[test]
    fn test_has_more_retained_while_next_page_loads() {
        let kind = ListingKind::NowPlaying;
        let mut listing = ListingAggregator::new(kind.clone());
        listing.resolve(&kind, 1, page(1, &[1], 2));
        assert!(listing.has_more());

        listing.request_next_page();
        assert!(listing.is_loading());
        assert!(listing.has_more());

        listing.resolve(&kind, 2, page(2, &[2], 2));
        assert!(!listing.has_more());
    }

    #[test]
    fn test_failed_page_is_retried_and_does_not_advance() {
        let kind = ListingKind::NowPlaying;
        let mut listing = ListingAggregator::new(kind.clone());
        listing.resolve(&kind, 1, page(1, &[1], 2));
        listing.request_next_page();
        listing.resolve(&kind, 2, Err("500".into()));

        assert_eq!(item_ids(&listing), vec![1]);
        assert!(listing.has_more());
        assert!(matches!(listing.page_state(2), Some(PageState::Failed(_))));
        assert_eq!(listing.pages_to_fetch(), vec![2]);

        listing.resolve(&kind, 2, page(2, &[2], 2));
        assert_eq!(item_ids(&listing), vec![1, 2]);
        assert!(!listing.has_more());
    }

    #[test]
    fn test_stale_and_unrequested_pages_dropped() {
        let current = ListingKind::Search("alien".into());
        let stale = ListingKind::Search("alie".into());
        let mut listing = ListingAggregator::new(current.clone());

        assert!(!listing.resolve(&stale, 1, page(1, &[99], 1)));
        assert!(!listing.resolve(&current, 2, page(2, &[98], 2)));
        assert!(listing.aggregated_items().is_empty());
        assert_eq!(listing.requested_pages(), vec![1]);

        assert!(listing.resolve(&current, 1, page(1, &[1], 1)));
        assert_eq!(item_ids(&listing), vec![1]);
    }

    #[test]
    fn test_late_outcome_does_not_replace_resolved_page() {
        let kind = ListingKind::NowPlaying;
        let mut listing = ListingAggregator::new(kind.clone());
        assert!(listing.resolve(&kind, 1, page(1, &[1, 2], 3)));

        assert!(!listing.resolve(&kind, 1, Err("late 500".into())));
        assert!(!listing.resolve(&kind, 1, page(1, &[9], 1)));

        assert!(matches!(listing.page_state(1), Some(PageState::Resolved(_))));
        assert_eq!(item_ids(&listing), vec![1, 2]);
        assert!(listing.has_more());
        assert_eq!(listing.total_pages(), Some(3));
    }

    #[test]
    fn test_has_more_stays_false_once_exhausted() {
        let kind = ListingKind::NowPlaying;
        let mut listing = ListingAggregator::new(kind.clone());
        listing.resolve(&kind, 1, page(1, &[1], 1));
        assert!(!listing.has_more());
        assert_eq!(listing.total_pages(), Some(1));
    }

    #[test]
    fn test_query_keys() {
        assert_eq!(
            ListingKind::NowPlaying.query_key(2).to_string(),
            "/movie/now_playing?page=2"
        );
        assert_eq!(
            ListingKind::Trending(TimeWindow::Week).query_key(1).to_string(),
            "/trending/movie/week?page=1"
        );
        assert_eq!(
            ListingKind::Search("heat".into()).query_key(1).to_string(),
            "/search/movie?page=1&query=heat"
        );
    }

    #[test]
    fn test_from_response() {
        let resp = MoviesResponse {
            results: vec![movie(1)],
            page: 4,
            total_pages: 10,
            total_results: 200,
        };
        let page: ListingPage = resp.into();
        assert_eq!(page.page_number, 4);
        assert_eq!(page.total_pages, 10);
        assert_eq!(page.items.len(), 1);
    }
}
