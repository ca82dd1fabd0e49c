pub mod image;
pub mod tmdb;
pub mod traits;
pub mod types;

pub use tmdb::{TmdbAuth, TmdbClient, TmdbError};
pub use traits::{MovieSource, TimeWindow};
pub use types::{
    Cast, CreditsResponse, Genre, Movie, MovieDetails, MoviesResponse, Video, VideosResponse,
};
