use crate::listing::{ListingAggregator, ListingKind};

/// Search state keyed by the submitted term.
///
/// Submitting a different term starts a fresh aggregation at page 1, so pages
/// still in flight for the old term are dropped when they land.
#[derive(Debug, Default)]
pub struct SearchSession {
    listing: Option<ListingAggregator>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a search term. Returns true when a new aggregation was started.
    ///
    /// A blank term disables the search.
    pub fn submit(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            self.listing = None;
            return false;
        }
        if self.term() == Some(term) {
            return false;
        }
        tracing::debug!(term, "new search");
        self.listing = Some(ListingAggregator::new(ListingKind::Search(term.to_string())));
        true
    }

    pub fn term(&self) -> Option<&str> {
        match self.listing.as_ref().map(ListingAggregator::kind) {
            Some(ListingKind::Search(term)) => Some(term.as_str()),
            _ => None,
        }
    }

    pub fn listing(&self) -> Option<&ListingAggregator> {
        self.listing.as_ref()
    }

    pub fn listing_mut(&mut self) -> Option<&mut ListingAggregator> {
        self.listing.as_mut()
    }
}
