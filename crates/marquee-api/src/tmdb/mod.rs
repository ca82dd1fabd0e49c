pub mod client;
pub mod error;

pub use client::{TmdbAuth, TmdbClient};
pub use error::TmdbError;
