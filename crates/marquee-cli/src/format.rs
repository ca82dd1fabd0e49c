//! Terminal formatting for movie metadata.

use marquee_api::{Cast, Movie};
use marquee_core::MoviePage;

const FAVORITE_MARK: &str = "♥";

/// TMDB vote average with one decimal, e.g. `7.3/10`.
pub fn rating(vote_average: f64) -> String {
    format!("{vote_average:.1}/10")
}

/// Runtime in minutes as `2h 5m`.
pub fn runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn year(movie: &Movie) -> String {
    movie
        .release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".into())
}

/// One line of a listing: position, id, title, year, rating and favorite mark.
pub fn movie_line(index: usize, movie: &Movie, favorite: bool) -> String {
    let mark = if favorite { FAVORITE_MARK } else { " " };
    format!(
        "{index:>3}. {mark} {:<40} {}  {:>7}  #{}",
        truncate(&movie.title, 40),
        year(movie),
        rating(movie.vote_average),
        movie.id
    )
}

pub fn cast_line(cast: &Cast) -> String {
    if cast.character.is_empty() {
        cast.name.clone()
    } else {
        format!("{} as {}", cast.name, cast.character)
    }
}

/// Multi-line detail view of a movie.
pub fn movie_page(page: &MoviePage, poster_url: &str, favorite: bool) -> String {
    let details = &page.details;
    let movie = &details.movie;
    let mut out = String::new();

    out.push_str(&movie.title);
    if favorite {
        out.push_str(&format!(" {FAVORITE_MARK}"));
    }
    out.push('\n');
    if !details.tagline.is_empty() {
        out.push_str(&format!("\"{}\"\n", details.tagline));
    }

    let mut facts = vec![rating(movie.vote_average), year(movie)];
    if let Some(minutes) = details.runtime.filter(|m| *m > 0) {
        facts.push(runtime(minutes));
    }
    out.push_str(&facts.join("  |  "));
    out.push('\n');

    if !details.genres.is_empty() {
        let names: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
        out.push_str(&names.join(", "));
        out.push('\n');
    }
    out.push_str(&format!("Poster: {poster_url}\n"));

    if !movie.overview.is_empty() {
        out.push_str("\nOverview\n");
        out.push_str(&movie.overview);
        out.push('\n');
    }

    if !page.cast.is_empty() {
        out.push_str("\nCast & Crew\n");
        for member in &page.cast {
            out.push_str("  ");
            out.push_str(&cast_line(member));
            out.push('\n');
        }
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
