use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::TmdbError;
use crate::traits::{MovieSource, TimeWindow};
use crate::types::{CreditsResponse, MovieDetails, MoviesResponse, VideosResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Credentials accepted by the TMDB v3 API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TmdbAuth {
    /// v4 read access token, sent as `Authorization: Bearer`.
    Bearer(String),
    /// v3 key, sent as the `api_key` query parameter.
    ApiKey(String),
}

/// TMDB REST client.
pub struct TmdbClient {
    http: Client,
    base_url: String,
    auth: TmdbAuth,
    language: Option<String>,
}

impl TmdbClient {
    pub fn new(auth: TmdbAuth) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            auth,
            language: None,
        }
    }

    /// Point the client at another API root (a proxy or a test server).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, TmdbError> {
        Url::parse(base_url).map_err(|e| TmdbError::Parse(format!("invalid base URL: {e}")))?;
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Request localized titles and overviews, e.g. `en-US`.
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language.filter(|l| !l.is_empty());
        self
    }

    /// Build the request URL for `path`, including query and credential parameters.
    pub fn url_for(&self, path: &str, query: &[(&str, String)]) -> Result<Url, TmdbError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| TmdbError::Parse(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
            if let Some(ref language) = self.language {
                pairs.append_pair("language", language);
            }
            if let TmdbAuth::ApiKey(ref key) = self.auth {
                pairs.append_pair("api_key", key);
            }
        }
        // An empty `query_pairs_mut` still leaves a trailing `?`.
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TmdbError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        if status == 401 {
            return Err(TmdbError::Auth(body));
        }
        Err(TmdbError::Api {
            status,
            message: body,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TmdbError> {
        let url = self.url_for(path, query)?;
        tracing::debug!(path, "TMDB request");

        let mut req = self.http.get(url).header("Accept", "application/json");
        if let TmdbAuth::Bearer(ref token) = self.auth {
            req = req.bearer_auth(token);
        }

        let resp = Self::check_response(req.send().await?).await?;
        resp.json().await.map_err(|e| TmdbError::Parse(e.to_string()))
    }
}

impl MovieSource for TmdbClient {
    type Error = TmdbError;

    async fn trending(&self, window: TimeWindow, page: u32) -> Result<MoviesResponse, TmdbError> {
        self.get_json(
            &format!("/trending/movie/{}", window.as_path_str()),
            &[("page", page.to_string())],
        )
        .await
    }

    async fn now_playing(&self, page: u32) -> Result<MoviesResponse, TmdbError> {
        self.get_json("/movie/now_playing", &[("page", page.to_string())])
            .await
    }

    async fn search_movies(&self, query: &str, page: u32) -> Result<MoviesResponse, TmdbError> {
        self.get_json(
            "/search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    async fn movie_details(&self, movie_id: u64) -> Result<MovieDetails, TmdbError> {
        self.get_json(&format!("/movie/{movie_id}"), &[]).await
    }

    async fn movie_videos(&self, movie_id: u64) -> Result<VideosResponse, TmdbError> {
        self.get_json(&format!("/movie/{movie_id}/videos"), &[]).await
    }

    async fn movie_credits(&self, movie_id: u64) -> Result<CreditsResponse, TmdbError> {
        self.get_json(&format!("/movie/{movie_id}/credits"), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_with_api_key_and_language() {
        let client = TmdbClient::new(TmdbAuth::ApiKey("k3y".into()))
            .with_language(Some("en-US".into()));
        let url = client
            .url_for(
                "/search/movie",
                &[("query", "blade runner".into()), ("page", "2".into())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.themoviedb.org/3/search/movie?query=blade+runner&page=2&language=en-US&api_key=k3y"
        );
    }

    #[test]
    fn test_url_bearer_keeps_query_clean() {
        let client = TmdbClient::new(TmdbAuth::Bearer("tok".into()));
        let url = client.url_for("/movie/550/credits", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.themoviedb.org/3/movie/550/credits");
    }

    #[test]
    fn test_custom_base_url() {
        let client = TmdbClient::new(TmdbAuth::Bearer("tok".into()))
            .with_base_url("http://localhost:8080/3/")
            .unwrap();
        let url = client
            .url_for("/trending/movie/week", &[("page", "1".into())])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/3/trending/movie/week?page=1");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = TmdbClient::new(TmdbAuth::Bearer("tok".into())).with_base_url("not a url");
        assert!(matches!(result, Err(TmdbError::Parse(_))));
    }

    #[test]
    fn test_empty_language_ignored() {
        let client =
            TmdbClient::new(TmdbAuth::Bearer("tok".into())).with_language(Some(String::new()));
        let url = client.url_for("/movie/now_playing", &[]).unwrap();
        assert_eq!(url.query(), None);
    }
}
