use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "marquee", version, about = "Discover movies from the terminal")]
pub struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Movies trending today (or this week).
    Trending {
        #[arg(long)]
        week: bool,
        #[command(flatten)]
        paging: Paging,
    },
    /// New releases in theatres.
    NowPlaying {
        #[command(flatten)]
        paging: Paging,
    },
    /// Search movies by title.
    Search {
        /// Search term.
        #[arg(required = true, num_args = 1..)]
        term: Vec<String>,
        #[command(flatten)]
        paging: Paging,
    },
    /// Details and top cast for one movie.
    Movie { id: u64 },
    /// Show the YouTube trailer for a movie.
    Trailer {
        id: u64,
        /// Open the trailer in the default browser.
        #[arg(long)]
        open: bool,
    },
    /// Manage locally saved favorites.
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Copy, Args)]
pub struct Paging {
    /// How many pages to load (each "load more" adds one).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub pages: u32,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum FavoritesAction {
    /// List favorites in the order they were added.
    List,
    /// Favorite a movie by id.
    Add { id: u64 },
    /// Remove a favorite by id.
    Remove { id: u64 },
    /// Favorite or unfavorite a movie by id.
    Toggle { id: u64 },
    /// Remove every favorite.
    Clear,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Print the config file location.
    Path,
    /// Print the effective configuration.
    Show,
    /// Write the current configuration to the config file.
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_joins_words() {
        let cli = Cli::try_parse_from(["marquee", "search", "blade", "runner", "--pages", "2"])
            .unwrap();
        match cli.command {
            Command::Search { term, paging } => {
                assert_eq!(term.join(" "), "blade runner");
                assert_eq!(paging.pages, 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_favorites_default_and_toggle() {
        let cli = Cli::try_parse_from(["marquee", "favorites"]).unwrap();
        assert!(matches!(cli.command, Command::Favorites { action: None }));

        let cli = Cli::try_parse_from(["marquee", "-vv", "favorites", "toggle", "550"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Favorites {
                action: Some(FavoritesAction::Toggle { id: 550 })
            }
        ));
    }

    #[test]
    fn test_pages_must_be_positive() {
        assert!(Cli::try_parse_from(["marquee", "now-playing", "--pages", "0"]).is_err());
    }
}
