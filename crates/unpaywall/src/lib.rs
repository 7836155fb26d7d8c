#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![warn(missing_docs, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

//! # unpaywall
//!
//! unpaywall is a small blocking client for the [Unpaywall](https://unpaywall.org) API. It looks up
//! the open access status of a DOI, searches the title index and normalizes the responses into
//! flat [`normalize::Row`]s that a table, CSV or JSON writer can print without understanding the
//! nested OA locations.
//!
//! ```no_run
//! use unpaywall::{normalize, Config, Unpaywall};
//!
//! let api = Unpaywall::new(Config::default().email("me@example.com"))?;
//! let record = api.lookup("10.1038/nature12373")?;
//! let row = normalize::flatten(&record);
//! assert!(!row.contains_key("oa_locations"));
//! # Ok::<(), unpaywall::Error>(())
//! ```

mod api;
mod error;
pub mod model;
pub mod normalize;

use std::time::Duration;

pub use api::Client;
pub use error::{Error, ErrorKind};
pub use model::{Doi, OaLocation, SearchRequest, SearchResult};
pub use reqwest::Url;

use log::{info, trace};
use model::SearchResponse;

/// The production endpoint of the API.
pub const DEFAULT_BASE_URL: &str = "https://api.unpaywall.org";

/// Connection settings for [`Unpaywall`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    base_url: String,
    email: Option<String>,
    timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            email: None,
            timeout: None,
        }
    }
}

impl Config {
    /// Use `base_url` instead of [`DEFAULT_BASE_URL`].
    #[must_use]
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The contact email sent with every request, the API rejects requests without one.
    #[must_use]
    pub fn email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Abort a request that has not completed after `timeout`.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn checked_email(&self) -> Result<&str, Error> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::MissingCredential,
                    "an email address is required to use the Unpaywall API",
                )
            })
    }

    /// `{base_url}/v2/{path}`, each segment of `path` is percent encoded.
    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = format!("{}/v2", self.base_url.trim_end_matches('/'));
        let mut url = Url::parse(&base).map_err(|e| Error::wrap(ErrorKind::Request, e))?;
        url.path_segments_mut()
            .map_err(|()| {
                Error::new(
                    ErrorKind::Request,
                    format!("'{}' cannot be used as a base URL", self.base_url),
                )
            })?
            .extend(path.split('/'));
        Ok(url)
    }
}

/// A client for the Unpaywall API.
///
/// The client only holds immutable configuration so one instance can be reused for any number of
/// sequential calls.
#[derive(Debug)]
pub struct Unpaywall<C: Client = reqwest::blocking::Client> {
    client: C,
    config: Config,
}

impl Unpaywall {
    /// Creates a client that sends requests over HTTP.
    ///
    /// A missing email is not an error here, it is reported by the first call that would need it.
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::Request`] is returned when the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, Error> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        // otherwise the 30 second default of the blocking client applies
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::wrap(ErrorKind::Request, e))?;

        Ok(Self::with_client(client, config))
    }
}

impl<C: Client> Unpaywall<C> {
    /// Creates a client that sends requests through `client`.
    #[must_use]
    pub const fn with_client(client: C, config: Config) -> Self {
        Self { client, config }
    }

    /// The configuration this client was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Look up the OA status of a single DOI.
    ///
    /// The `doi` may be given in hyperlink form or with a `doi:` prefix.
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::MissingCredential`] is returned when no email is configured, no
    /// request is sent in that case.
    /// An [`Err`] is returned when the request fails, the API answers with an error status or the
    /// response cannot be decoded into a [`Doi`].
    pub fn lookup(&self, doi: &str) -> Result<Doi, Error> {
        let email = self.config.checked_email()?;
        let doi = canonical_doi(doi);
        info!("Looking up '{doi}' using the Unpaywall API");

        let mut url = self.config.endpoint(doi)?;
        url.query_pairs_mut().append_pair("email", email);

        let record = self.client.get_json(&url)?;
        trace!("Request was successful");
        Ok(record)
    }

    /// Search the title index of the API, a single page of hits is returned in the order the API
    /// ranked them.
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::MissingCredential`] is returned when no email is configured, no
    /// request is sent in that case.
    /// An [`Err`] is returned when the request fails, the API answers with an error status or the
    /// response cannot be decoded into a list of [`SearchResult`]s.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, Error> {
        let email = self.config.checked_email()?;
        info!("Searching for '{}' using the Unpaywall API", request.query());

        let mut url = self.config.endpoint("search")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("query", request.query())
                .append_pair("email", email);
            if let Some(is_oa) = request.oa_filter() {
                query.append_pair("is_oa", if is_oa { "true" } else { "false" });
            }
            if let Some(page) = request.page_number() {
                query.append_pair("page", &page.to_string());
            }
        }

        let SearchResponse { results } = self.client.get_json(&url)?;
        trace!("Request was successful with {} results", results.len());
        Ok(results)
    }
}

/// Strips the hyperlink and `doi:` prefixes people tend to paste along with a DOI.
fn canonical_doi(doi: &str) -> &str {
    const PREFIXES: [&str; 5] = [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi:",
    ];

    let doi = doi.trim();
    PREFIXES
        .iter()
        .find_map(|prefix| doi.strip_prefix(prefix))
        .unwrap_or(doi)
        .trim()
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{
        api::{
            assert_url, call_count, impl_text_producer, MockClient, NetworkErrorProducer,
            ServerErrorProducer,
        },
        normalize::{flatten, flatten_search, LOCATION},
    };

    impl_text_producer! {
        DoiProducer => Ok(include_str!("../tests/data/doi.json").to_owned()),
        SearchProducer => Ok(include_str!("../tests/data/search.json").to_owned()),
        BestLocationProducer => Ok(
            r#"{
                "doi": "10.1/x",
                "best_oa_location": {"url": "http://x", "is_best": true, "host_type": "publisher"},
                "oa_locations": [{"url": "http://x", "is_best": true, "host_type": "publisher"}]
            }"#.to_owned()
        ),
        NotJsonProducer => Ok("<html>Service Unavailable</html>".to_owned()),
    }

    fn mock_api<P: crate::api::Producer<String>>(config: Config) -> Unpaywall<MockClient<P>> {
        Unpaywall::with_client(MockClient::default(), config)
    }

    fn config() -> Config {
        Config::default().email("me@example.com")
    }

    #[test]
    fn lookup_url_format_is_correct() {
        mock_api::<DoiProducer>(config())
            .lookup("10.1038/nature12373")
            .unwrap();
        assert_url!("https://api.unpaywall.org/v2/10.1038/nature12373?email=me%40example.com");
    }

    #[test]
    fn lookup_uses_base_url_and_canonical_doi() {
        mock_api::<DoiProducer>(config().base_url("http://localhost:8080/"))
            .lookup(" https://doi.org/10.1038/nature12373 ")
            .unwrap();
        assert_url!("http://localhost:8080/v2/10.1038/nature12373?email=me%40example.com");
    }

    #[test]
    fn doi_is_percent_encoded() {
        mock_api::<DoiProducer>(config())
            .lookup("10.1002/(sici)1#2?x")
            .unwrap();
        assert_url!(
            "https://api.unpaywall.org/v2/10.1002/(sici)1%232%3Fx?email=me%40example.com"
        );
    }

    #[test]
    fn search_url_format_is_correct() {
        let api = mock_api::<SearchProducer>(config());

        api.search(&SearchRequest::new("cell thermometry")).unwrap();
        assert_url!(
            "https://api.unpaywall.org/v2/search?query=cell+thermometry&email=me%40example.com"
        );

        api.search(&SearchRequest::new("test").is_oa(false).page(2))
            .unwrap();
        assert_url!(
            "https://api.unpaywall.org/v2/search?query=test&email=me%40example.com&is_oa=false&page=2"
        );
        assert_eq!(2, call_count());
    }

    #[test]
    fn missing_email_fails_before_any_request() {
        let api = mock_api::<DoiProducer>(Config::default());

        let err = api.lookup("10.1038/nature12373").unwrap_err();
        assert_eq!(ErrorKind::MissingCredential, err.kind());

        let err = api.search(&SearchRequest::new("test")).unwrap_err();
        assert_eq!(ErrorKind::MissingCredential, err.kind());

        assert_eq!(0, call_count());
    }

    #[test]
    fn blank_email_is_missing() {
        let err = mock_api::<DoiProducer>(Config::default().email("  "))
            .lookup("10.1038/nature12373")
            .unwrap_err();

        assert_eq!(ErrorKind::MissingCredential, err.kind());
        assert_eq!(0, call_count());
    }

    #[test]
    fn transport_errors_are_passed_through() {
        let err = mock_api::<NetworkErrorProducer>(config())
            .lookup("10.1/x")
            .unwrap_err();
        assert_eq!(ErrorKind::Request, err.kind());

        let err = mock_api::<ServerErrorProducer>(config())
            .search(&SearchRequest::new("test"))
            .unwrap_err();
        assert_eq!(ErrorKind::Status, err.kind());
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = mock_api::<NotJsonProducer>(config())
            .lookup("10.1/x")
            .unwrap_err();
        assert_eq!(ErrorKind::Decode, err.kind());

        // a DOI record is not a search response
        let err = mock_api::<DoiProducer>(config())
            .search(&SearchRequest::new("test"))
            .unwrap_err();
        assert_eq!(ErrorKind::Decode, err.kind());
    }

    #[test]
    fn invalid_base_url_is_a_request_error() {
        let err = mock_api::<DoiProducer>(config().base_url("not a url"))
            .lookup("10.1/x")
            .unwrap_err();

        assert_eq!(ErrorKind::Request, err.kind());
        assert_eq!(0, call_count());
    }

    #[test]
    fn lookup_and_flatten_promotes_best_location() {
        let record = mock_api::<BestLocationProducer>(config())
            .lookup("10.1/x")
            .unwrap();
        let row = flatten(&record);

        assert_eq!(Value::from("http://x"), row[LOCATION]["url"]);
        assert!(!row.contains_key("oa_locations"));
    }

    #[test]
    fn search_and_flatten_keeps_score_and_snippet() {
        let results = mock_api::<SearchProducer>(config())
            .search(&SearchRequest::new("test"))
            .unwrap();
        let rows = results.iter().map(flatten_search).collect::<Vec<_>>();

        assert_eq!(1, rows.len());
        assert_eq!(Some(0.92), rows[0]["score"].as_f64());
        assert_eq!(Value::from("...match..."), rows[0]["snippet"]);
    }

    #[test]
    fn canonical_doi_strips_prefixes() {
        assert_eq!("10.1/x", canonical_doi("10.1/x"));
        assert_eq!("10.1/x", canonical_doi("doi:10.1/x"));
        assert_eq!("10.1/x", canonical_doi("https://dx.doi.org/10.1/x"));
        assert_eq!("10.1/x", canonical_doi("  http://doi.org/10.1/x\n"));
    }
}
