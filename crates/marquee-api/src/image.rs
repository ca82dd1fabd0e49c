//! Poster and backdrop URL resolution.

pub const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Shown when a movie has no artwork.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-movie.jpg";

/// Image size variant served by the TMDB image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    #[default]
    W500,
    Original,
}

impl ImageSize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::W500 => "w500",
            Self::Original => "original",
        }
    }
}

/// Fully-qualified URL for an image path fragment, or the placeholder when absent.
pub fn image_url(path: Option<&str>, size: ImageSize) -> String {
    image_url_with_base(TMDB_IMAGE_BASE_URL, path, size)
}

/// Like [`image_url`], against a configured CDN base.
pub fn image_url_with_base(base: &str, path: Option<&str>, size: ImageSize) -> String {
    match path {
        Some(p) if !p.is_empty() => {
            format!("{}/{}{}", base.trim_end_matches('/'), size.as_str(), p)
        }
        _ => PLACEHOLDER_IMAGE.to_string(),
    }
}
