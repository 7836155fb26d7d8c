//! Flattens typed records into generic rows for a columnar sink.
//!
//! A [`Doi`] carries every OA location it knows about, which is too much nesting for a table. A
//! normalized [`Row`] keeps the scalar fields, drops the location lists and the first location,
//! and moves the best location (when there is one) to a single nested `location` value.

use log::trace;
use serde_json::{Map, Number, Value};

use crate::model::{Doi, OaLocation, SearchResult};

/// A generic mapping from field name to value.
pub type Row = Map<String, Value>;

/// The key the best location is moved to by [`prune`].
pub const LOCATION: &str = "location";

const BEST_OA_LOCATION: &str = "best_oa_location";
const FIRST_OA_LOCATION: &str = "first_oa_location";
const OA_LOCATIONS: &str = "oa_locations";
const OA_LOCATIONS_EMBARGOED: &str = "oa_locations_embargoed";

/// Projects every field of `record` into a [`Row`], including all of its locations.
///
/// Optional fields that are absent are left out of the row rather than set to `null`.
#[must_use]
pub fn project(record: &Doi) -> Row {
    let mut row = Row::new();

    row.insert("doi".to_owned(), record.doi.as_str().into());
    row.insert("doi_url".to_owned(), record.doi_url.as_str().into());
    insert_some(&mut row, "title", record.title.as_deref());
    insert_some(&mut row, "year", record.year);
    insert_some(&mut row, "publisher", record.publisher.as_deref());
    row.insert("is_oa".to_owned(), record.is_oa.into());
    row.insert("oa_status".to_owned(), record.oa_status.as_str().into());
    insert_some(&mut row, "genre", record.genre.as_deref());
    row.insert("is_paratext".to_owned(), record.is_paratext.into());
    insert_some(&mut row, "journal_name", record.journal_name.as_deref());
    insert_some(&mut row, "journal_issns", record.journal_issns.as_deref());
    insert_some(&mut row, "journal_issn_l", record.journal_issn_l.as_deref());
    row.insert("journal_is_oa".to_owned(), record.journal_is_oa.into());
    row.insert(
        "journal_is_in_doaj".to_owned(),
        record.journal_is_in_doaj.into(),
    );
    row.insert(
        "has_repository_copy".to_owned(),
        record.has_repository_copy.into(),
    );
    insert_some(&mut row, "published_date", record.published_date.as_deref());
    row.insert("data_standard".to_owned(), record.data_standard.into());
    insert_some(&mut row, "updated", record.updated.as_deref());

    row.insert(
        OA_LOCATIONS.to_owned(),
        record.oa_locations.iter().map(location).collect(),
    );
    row.insert(
        OA_LOCATIONS_EMBARGOED.to_owned(),
        record.oa_locations_embargoed.iter().map(location).collect(),
    );
    insert_some(
        &mut row,
        BEST_OA_LOCATION,
        record.best_oa_location.as_ref().map(location),
    );
    insert_some(
        &mut row,
        FIRST_OA_LOCATION,
        record.first_oa_location.as_ref().map(location),
    );

    row
}

/// Removes the location lists (`oa_locations` and `oa_locations_embargoed`) and the first location
/// from `row` and renames the best location to [`LOCATION`].
///
/// A row without a best location gets no [`LOCATION`] key at all. Pruning a row that has already
/// been pruned returns it unchanged.
#[must_use]
pub fn prune(mut row: Row) -> Row {
    row.remove(OA_LOCATIONS);
    row.remove(OA_LOCATIONS_EMBARGOED);
    row.remove(FIRST_OA_LOCATION);

    if let Some(best) = row.remove(BEST_OA_LOCATION).filter(|v| !v.is_null()) {
        row.insert(LOCATION.to_owned(), best);
    }
    row
}

/// Normalizes a looked up record, see [`project`] and [`prune`].
#[must_use]
pub fn flatten(record: &Doi) -> Row {
    trace!("Flattening record for '{}'", record.doi);
    prune(project(record))
}

/// Normalizes a search hit: the flattened record plus the `score` and `snippet` of the hit.
#[must_use]
pub fn flatten_search(result: &SearchResult) -> Row {
    let mut row = flatten(&result.response);
    row.insert(
        "score".to_owned(),
        Number::from_f64(result.score).map_or(Value::Null, Value::Number),
    );
    row.insert("snippet".to_owned(), result.snippet.as_str().into());
    row
}

fn location(loc: &OaLocation) -> Value {
    let mut row = Row::new();

    row.insert("evidence".to_owned(), loc.evidence.as_str().into());
    row.insert("host_type".to_owned(), loc.host_type.as_str().into());
    row.insert("is_best".to_owned(), loc.is_best.into());
    insert_some(&mut row, "license", loc.license.as_deref());
    insert_some(&mut row, "oa_date", loc.oa_date.as_deref());
    insert_some(&mut row, "pmh_id", loc.pmh_id.as_deref());
    insert_some(&mut row, "endpoint_id", loc.endpoint_id.as_deref());
    row.insert("updated".to_owned(), loc.updated.as_str().into());
    row.insert("url".to_owned(), loc.url.as_str().into());
    row.insert(
        "url_for_landing_page".to_owned(),
        loc.url_for_landing_page.as_str().into(),
    );
    insert_some(&mut row, "url_for_pdf", loc.url_for_pdf.as_deref());
    row.insert("version".to_owned(), loc.version.as_str().into());

    Value::Object(row)
}

#[inline]
fn insert_some<V: Into<Value>>(row: &mut Row, key: &str, value: Option<V>) {
    if let Some(value) = value {
        row.insert(key.to_owned(), value.into());
    }
}
