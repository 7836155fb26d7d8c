//! Typed records returned by the Unpaywall API.
//!
//! See the data description at <https://unpaywall.org/data-format>.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// A DOI-assigned resource, including metadata and information about its OA status.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Doi {
    /// The identifier for the resource, always lowercase.
    pub doi: String,
    /// The DOI in hyperlink form.
    #[serde(default, deserialize_with = "nullable")]
    pub doi_url: String,
    /// The title of the resource.
    #[serde(default)]
    pub title: Option<String>,
    /// The year the resource was published.
    #[serde(default)]
    pub year: Option<i64>,
    /// The name of the publisher.
    #[serde(default)]
    pub publisher: Option<String>,
    /// Whether there is an OA copy of the resource.
    #[serde(default, deserialize_with = "nullable")]
    pub is_oa: bool,
    /// The OA status of the resource.
    #[serde(default, deserialize_with = "nullable")]
    pub oa_status: OaStatus,
    /// The type of resource, for example `journal-article`.
    #[serde(default)]
    pub genre: Option<String>,
    /// Whether the item is an ancillary part of a journal, like a table of contents.
    #[serde(default, deserialize_with = "nullable")]
    pub is_paratext: bool,
    /// The name of the journal publishing the resource.
    #[serde(default)]
    pub journal_name: Option<String>,
    /// Any ISSNs assigned to the journal publishing the resource, comma separated.
    #[serde(default)]
    pub journal_issns: Option<String>,
    /// A single linking ISSN for the journal publishing the resource.
    #[serde(default)]
    pub journal_issn_l: Option<String>,
    /// Whether the resource is published in a completely OA journal.
    #[serde(default, deserialize_with = "nullable")]
    pub journal_is_oa: bool,
    /// Whether the resource is published in a DOAJ-indexed journal.
    #[serde(default, deserialize_with = "nullable")]
    pub journal_is_in_doaj: bool,
    /// Whether there is a copy of the resource in a repository.
    #[serde(default, deserialize_with = "nullable")]
    pub has_repository_copy: bool,
    /// The date the resource was published.
    #[serde(default)]
    pub published_date: Option<String>,
    /// The data collection approach used for the resource.
    #[serde(default, deserialize_with = "nullable")]
    pub data_standard: i64,
    /// The time the record was last updated.
    #[serde(default)]
    pub updated: Option<String>,
    /// Every OA location associated with the resource.
    #[serde(default, deserialize_with = "nullable")]
    pub oa_locations: Vec<OaLocation>,
    /// OA locations that are not available yet.
    #[serde(default, deserialize_with = "nullable")]
    pub oa_locations_embargoed: Vec<OaLocation>,
    /// The location the API ranks as the best OA copy.
    #[serde(default)]
    pub best_oa_location: Option<OaLocation>,
    /// The location with the earliest `oa_date`.
    #[serde(default)]
    pub first_oa_location: Option<OaLocation>,
}

/// A location of an Open Access copy of a resource.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct OaLocation {
    /// How the location was found.
    #[serde(default, deserialize_with = "nullable")]
    pub evidence: String,
    /// The type of host serving the location.
    #[serde(default, deserialize_with = "nullable")]
    pub host_type: HostType,
    /// Whether this is the best location for the resource.
    #[serde(default, deserialize_with = "nullable")]
    pub is_best: bool,
    /// The license the copy is published under.
    #[serde(default)]
    pub license: Option<String>,
    /// When the resource first became available at this location.
    #[serde(default)]
    pub oa_date: Option<String>,
    /// The OAI-PMH endpoint where the location was found.
    #[serde(default)]
    pub pmh_id: Option<String>,
    /// The repository endpoint that served the location.
    #[serde(default)]
    pub endpoint_id: Option<String>,
    /// When the data for this location was last updated.
    #[serde(default, deserialize_with = "nullable")]
    pub updated: String,
    /// The PDF url when available, otherwise the landing page url.
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    /// The landing page describing the copy.
    #[serde(default, deserialize_with = "nullable")]
    pub url_for_landing_page: String,
    /// A direct link to the PDF.
    #[serde(default)]
    pub url_for_pdf: Option<String>,
    /// The content version accessible at this location, for example `publishedVersion`.
    #[serde(default, deserialize_with = "nullable")]
    pub version: String,
}

/// The open access category of a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OaStatus {
    /// Published in an OA journal.
    Gold,
    /// Free under an open license in a toll-access journal.
    Hybrid,
    /// Free to read on the publisher page without an identifiable license.
    Bronze,
    /// Free in an OA repository.
    Green,
    /// Published in an OA journal without author fees.
    Diamond,
    /// No OA copy found.
    Closed,
    /// A category this crate does not know about yet.
    Other(String),
}

impl OaStatus {
    /// The status as the API spells it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Gold => "gold",
            Self::Hybrid => "hybrid",
            Self::Bronze => "bronze",
            Self::Green => "green",
            Self::Diamond => "diamond",
            Self::Closed => "closed",
            Self::Other(s) => s,
        }
    }
}

// A missing status stays empty rather than claiming the resource is closed.
impl Default for OaStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for OaStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "gold" => Self::Gold,
            "hybrid" => Self::Hybrid,
            "bronze" => Self::Bronze,
            "green" => Self::Green,
            "diamond" => Self::Diamond,
            "closed" => Self::Closed,
            _ => Self::Other(s),
        }
    }
}

impl<'de> Deserialize<'de> for OaStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl fmt::Display for OaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of host serving an [`OaLocation`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostType {
    /// The publisher of the resource.
    Publisher,
    /// An institutional or subject repository.
    Repository,
    /// A host type this crate does not know about yet.
    Other(String),
}

impl HostType {
    /// The host type as the API spells it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Publisher => "publisher",
            Self::Repository => "repository",
            Self::Other(s) => s,
        }
    }
}

// A missing host type stays empty rather than claiming to be a publisher.
impl Default for HostType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for HostType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "publisher" => Self::Publisher,
            "repository" => Self::Repository,
            _ => Self::Other(s),
        }
    }
}

impl<'de> Deserialize<'de> for HostType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single hit of a full-text search.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The matching resource.
    pub response: Doi,
    /// How well the resource matched the query.
    pub score: f64,
    /// Text around the query match, with the match wrapped in `<b>` tags.
    #[serde(default, deserialize_with = "nullable")]
    pub snippet: String,
}

#[derive(Deserialize)]
pub(crate) struct SearchResponse {
    pub(crate) results: Vec<SearchResult>,
}

/// The parameters of a full-text search.
///
/// ```
/// use unpaywall::SearchRequest;
///
/// let req = SearchRequest::new("cell thermometry").is_oa(true).page(2);
/// assert_eq!("cell thermometry", req.query());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    is_oa: Option<bool>,
    page: Option<u32>,
}

impl SearchRequest {
    /// Construct a search for `query` without any filter.
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            query: query.into(),
            is_oa: None,
            page: None,
        }
    }

    /// Only return resources whose OA status matches `is_oa`.
    #[must_use]
    pub const fn is_oa(mut self, is_oa: bool) -> Self {
        self.is_oa = Some(is_oa);
        self
    }

    /// Return the given page of results, the API starts counting at 1.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// The query text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    pub(crate) const fn oa_filter(&self) -> Option<bool> {
        self.is_oa
    }

    pub(crate) const fn page_number(&self) -> Option<u32> {
        self.page
    }
}

/// The API sends `null` for fields it documents as always present, those become the empty value.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOI_JSON: &str = include_str!("../tests/data/doi.json");

    #[test]
    fn doi_can_be_derived_from_json() {
        let doi: Doi = serde_json::from_str(DOI_JSON).unwrap();

        assert_eq!("10.1038/nature12373", doi.doi);
        assert!(doi.is_oa);
        assert_eq!(OaStatus::Green, doi.oa_status);
        assert_eq!(Some("Nature"), doi.journal_name.as_deref());
        assert_eq!(2, doi.oa_locations.len());
        assert!(doi.oa_locations_embargoed.is_empty());

        let best = doi.best_oa_location.expect("fixture has a best location");
        assert!(best.is_best);
        assert_eq!(HostType::Repository, best.host_type);
        assert_eq!(None, best.license);

        let first = doi.first_oa_location.expect("fixture has a first location");
        assert_ne!(best.url, first.url);
    }

    #[test]
    fn nulls_become_empty_values() {
        let doi: Doi = serde_json::from_str(
            r#"{
                "doi": "10.1/x",
                "doi_url": null,
                "is_oa": null,
                "oa_status": null,
                "journal_name": null,
                "oa_locations": null,
                "best_oa_location": null
            }"#,
        )
        .unwrap();

        assert_eq!("", doi.doi_url);
        assert!(!doi.is_oa);
        assert_eq!("", doi.oa_status.as_str());
        assert_eq!(None, doi.journal_name);
        assert!(doi.oa_locations.is_empty());
        assert_eq!(None, doi.best_oa_location);
    }

    #[test]
    fn missing_status_is_not_closed() {
        let doi: Doi = serde_json::from_str(r#"{"doi": "10.1/x", "is_oa": true}"#).unwrap();

        assert!(doi.is_oa);
        assert_ne!(OaStatus::Closed, doi.oa_status);
        assert_eq!(OaStatus::Other(String::new()), doi.oa_status);
    }

    #[test]
    fn missing_landing_page_is_empty() {
        let location: OaLocation =
            serde_json::from_str(r#"{"url": "http://x", "url_for_landing_page": null}"#).unwrap();
        assert_eq!("", location.url_for_landing_page);
    }

    #[test]
    fn doi_is_required() {
        assert!(serde_json::from_str::<Doi>(r#"{"doi_url": "https://doi.org/10.1/x"}"#).is_err());
        assert!(serde_json::from_str::<Doi>(r#"{"doi": null}"#).is_err());
    }

    #[test]
    fn unknown_categories_are_kept() {
        let location: OaLocation =
            serde_json::from_str(r#"{"host_type": "preprint server", "url": "http://x"}"#).unwrap();
        assert_eq!("preprint server", location.host_type.as_str());

        assert_eq!(OaStatus::Other("platinum".to_owned()), "platinum".to_owned().into());
    }

    #[test]
    fn mistyped_field_is_an_error() {
        assert!(serde_json::from_str::<Doi>(r#"{"doi": "10.1/x", "is_oa": "yes"}"#).is_err());
    }

    #[test]
    fn search_request_setters() {
        let req = SearchRequest::new("test").is_oa(false).page(3);

        assert_eq!("test", req.query());
        assert_eq!(Some(false), req.oa_filter());
        assert_eq!(Some(3), req.page_number());
    }
}
