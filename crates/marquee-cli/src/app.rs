use std::io::Write;

use marquee_api::image::{image_url_with_base, ImageSize};
use marquee_api::MovieSource;
use marquee_core::{
    Catalog, CoreError, FavoritesBackend, FavoritesStore, ListingAggregator, ListingKind,
    PageState, SearchSession,
};

use crate::cli::FavoritesAction;
use crate::format;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not load {kind}: {message}")]
    Listing { kind: String, message: String },

    #[error("could not open browser: {0}")]
    Browser(String),
}

/// Command handlers over a catalog and the favorites store.
pub struct App<S, B: FavoritesBackend> {
    catalog: Catalog<S>,
    favorites: FavoritesStore<B>,
    image_base_url: String,
}

impl<S: MovieSource, B: FavoritesBackend> App<S, B> {
    pub fn new(catalog: Catalog<S>, favorites: FavoritesStore<B>, image_base_url: String) -> Self {
        Self {
            catalog,
            favorites,
            image_base_url,
        }
    }

    pub fn favorites(&self) -> &FavoritesStore<B> {
        &self.favorites
    }

    /// Print the first `pages` pages of a listing, loading one more page at a
    /// time while the source reports more.
    pub async fn listing(
        &self,
        kind: ListingKind,
        pages: u32,
        out: &mut impl Write,
    ) -> Result<(), AppError> {
        let mut listing = ListingAggregator::new(kind);
        self.load_pages(&mut listing, pages).await;
        self.print_listing(&listing, out)
    }

    pub async fn search(
        &self,
        term: &str,
        pages: u32,
        out: &mut impl Write,
    ) -> Result<(), AppError> {
        let mut session = SearchSession::new();
        session.submit(term);
        let Some(listing) = session.listing_mut() else {
            writeln!(out, "Enter a search term.")?;
            return Ok(());
        };
        self.load_pages(listing, pages).await;
        self.print_listing(listing, out)
    }

    pub async fn movie(&self, movie_id: u64, out: &mut impl Write) -> Result<(), AppError> {
        let page = self.catalog.movie_page(movie_id).await?;
        let poster = image_url_with_base(
            &self.image_base_url,
            page.details.movie.poster_path.as_deref(),
            ImageSize::W500,
        );
        let favorite = self.favorites.is_favorite(movie_id);
        write!(out, "{}", format::movie_page(&page, &poster, favorite))?;
        Ok(())
    }

    pub async fn trailer(
        &self,
        movie_id: u64,
        open: bool,
        out: &mut impl Write,
    ) -> Result<(), AppError> {
        let Some(trailer) = self.catalog.trailer(movie_id).await? else {
            writeln!(out, "Trailer Not Available")?;
            return Ok(());
        };
        writeln!(out, "{}", trailer.name)?;
        writeln!(out, "Watch: {}", trailer.watch_url())?;
        writeln!(out, "Embed: {}", trailer.embed_url())?;
        if open {
            open::that(trailer.watch_url()).map_err(|e| AppError::Browser(e.to_string()))?;
        }
        Ok(())
    }

    pub async fn favorites_command(
        &mut self,
        action: FavoritesAction,
        out: &mut impl Write,
    ) -> Result<(), AppError> {
        match action {
            FavoritesAction::List => self.print_favorites(out)?,
            FavoritesAction::Add { id } => {
                let movie = self.catalog.details(id).await?.to_movie();
                let title = movie.title.clone();
                self.favorites.add(movie)?;
                writeln!(out, "Added {title} to favorites")?;
            }
            FavoritesAction::Remove { id } => {
                let title = self.favorites.get(id).map(|m| m.title.clone());
                if self.favorites.remove(id)? {
                    let title = title.unwrap_or_else(|| format!("#{id}"));
                    writeln!(out, "Removed {title} from favorites")?;
                } else {
                    writeln!(out, "#{id} is not a favorite")?;
                }
            }
            FavoritesAction::Toggle { id } => {
                // Removing needs only the stored snapshot; adding needs a fetch.
                let movie = match self.favorites.get(id) {
                    Some(movie) => movie.clone(),
                    None => self.catalog.details(id).await?.to_movie(),
                };
                let title = movie.title.clone();
                if self.favorites.toggle_favorite(movie)? {
                    writeln!(out, "Added {title} to favorites")?;
                } else {
                    writeln!(out, "Removed {title} from favorites")?;
                }
            }
            FavoritesAction::Clear => {
                let count = self.favorites.len();
                self.favorites.clear()?;
                writeln!(out, "Cleared {count} favorites")?;
            }
        }
        Ok(())
    }

    async fn load_pages(&self, listing: &mut ListingAggregator, pages: u32) {
        self.catalog.drive(listing).await;
        while listing.frontier() < pages && listing.has_more() {
            listing.request_next_page();
            self.catalog.drive(listing).await;
        }
    }

    fn print_listing(
        &self,
        listing: &ListingAggregator,
        out: &mut impl Write,
    ) -> Result<(), AppError> {
        let items = listing.aggregated_items();
        let failure = listing
            .requested_pages()
            .into_iter()
            .find_map(|page| match listing.page_state(page) {
                Some(PageState::Failed(message)) => Some((page, message.clone())),
                _ => None,
            });

        if items.is_empty() {
            if let Some((_, message)) = &failure {
                return Err(AppError::Listing {
                    kind: listing.kind().to_string(),
                    message: message.clone(),
                });
            }
        }

        writeln!(out, "{}", listing.kind())?;
        if items.is_empty() {
            writeln!(out, "No movies found.")?;
            return Ok(());
        }
        for (i, movie) in items.iter().enumerate() {
            let favorite = self.favorites.is_favorite(movie.id);
            writeln!(out, "{}", format::movie_line(i + 1, movie, favorite))?;
        }
        if let Some((page, message)) = failure {
            tracing::warn!(page, "page missing from output: {message}");
            writeln!(out, "Page {page} failed to load: {message}")?;
        }
        if listing.has_more() {
            writeln!(
                out,
                "More available: rerun with --pages {}",
                listing.frontier() + 1
            )?;
        }
        Ok(())
    }

    fn print_favorites(&self, out: &mut impl Write) -> Result<(), AppError> {
        if self.favorites.is_empty() {
            writeln!(out, "No favorites yet.")?;
            return Ok(());
        }
        writeln!(out, "My Favorites ({})", self.favorites.len())?;
        for (i, movie) in self.favorites.favorites().iter().enumerate() {
            writeln!(out, "{}", format::movie_line(i + 1, movie, true))?;
        }
        Ok(())
    }
}
