//! Client search input and its normalized form.
//!
//! Normalization never fails: malformed numbers, dates and partial geo
//! filters fall back to defaults or are dropped.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Votes,
    Priority,
}

impl SortKey {
    /// Case-insensitive; anything unrecognised sorts by date.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "votes" => Self::Votes,
            "priority" => Self::Priority,
            _ => Self::Date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

/// Inclusive `createdAt` bounds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoFilter {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

impl GeoFilter {
    /// All three parts must be present and sane, otherwise no geo filter.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>, radius_km: Option<f64>) -> Option<Self> {
        let (lat, lng, radius_km) = (lat?, lng?, radius_km?);
        let valid = (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng)
            && radius_km.is_finite()
            && radius_km >= 0.0;
        valid.then_some(Self { lat, lng, radius_km })
    }
}

/// Raw search input as it arrives over the wire, from either query
/// parameters or a JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub priorities: Vec<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub statuses: Vec<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub start_date: Option<Value>,
    #[serde(default)]
    pub end_date: Option<Value>,
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lng: Option<Value>,
    #[serde(default)]
    pub radius: Option<Value>,
    #[serde(default)]
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub page: Option<Value>,
    #[serde(default)]
    pub limit: Option<Value>,
}

/// Nested geo form: `"location": {"lat": .., "lng": .., "radius": ..}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lng: Option<Value>,
    #[serde(default)]
    pub radius: Option<Value>,
}

impl SearchRequest {
    /// Builds a request from decoded query-string pairs. List keys may
    /// repeat and may carry a `[]` suffix.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut req = SearchRequest::default();
        for (k, v) in pairs {
            let key = k.as_ref();
            let key = key.strip_suffix("[]").unwrap_or(key);
            let v: String = v.into();
            match key {
                "query" => req.query = Some(v),
                "categories" => req.categories.push(v),
                "priorities" => req.priorities.push(v),
                "statuses" => req.statuses.push(v),
                "tags" => req.tags.push(v),
                "startDate" => req.start_date = Some(Value::String(v)),
                "endDate" => req.end_date = Some(Value::String(v)),
                "lat" => req.lat = Some(Value::String(v)),
                "lng" => req.lng = Some(Value::String(v)),
                "radius" => req.radius = Some(Value::String(v)),
                "sortBy" => req.sort_by = Some(v),
                "sortOrder" => req.sort_order = Some(v),
                "page" => req.page = Some(Value::String(v)),
                "limit" => req.limit = Some(Value::String(v)),
                _ => {}
            }
        }
        req
    }
}

/// Normalized, validated query. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub free_text: Option<String>,
    pub categories: BTreeSet<String>,
    pub priorities: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub date_range: Option<DateRange>,
    pub geo: Option<GeoFilter>,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
    pub page: u64,
    pub limit: u64,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            free_text: None,
            categories: BTreeSet::new(),
            priorities: BTreeSet::new(),
            statuses: BTreeSet::new(),
            tags: BTreeSet::new(),
            date_range: None,
            geo: None,
            sort_by: SortKey::Date,
            sort_order: SortOrder::Asc,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl FilterSpec {
    pub fn from_request(req: SearchRequest) -> Self {
        let nested = req.location.unwrap_or_default();
        let lat = req.lat.or(nested.lat);
        let lng = req.lng.or(nested.lng);
        let radius = req.radius.or(nested.radius);
        let geo = GeoFilter::from_parts(
            lat.as_ref().and_then(loose_f64),
            lng.as_ref().and_then(loose_f64),
            radius.as_ref().and_then(loose_f64),
        );

        let start = req
            .start_date
            .as_ref()
            .and_then(|v| parse_date_bound(v, Bound::Start));
        let end = req
            .end_date
            .as_ref()
            .and_then(|v| parse_date_bound(v, Bound::End));
        let date_range = (start.is_some() || end.is_some()).then_some(DateRange { start, end });

        Self {
            free_text: req
                .query
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            categories: clean_set(req.categories),
            priorities: clean_set(req.priorities),
            statuses: clean_set(req.statuses),
            tags: clean_set(req.tags),
            date_range,
            geo,
            sort_by: req.sort_by.as_deref().map(SortKey::parse).unwrap_or_default(),
            sort_order: req
                .sort_order
                .as_deref()
                .map(SortOrder::parse)
                .unwrap_or_default(),
            page: normalize_page(req.page.as_ref()),
            limit: normalize_limit(req.limit.as_ref()),
        }
    }

    /// Same filters, page window pinned to the first single-issue page.
    pub fn for_facets(&self) -> Self {
        Self {
            page: 1,
            limit: 1,
            ..self.clone()
        }
    }

    /// Saturates, so an absurd page lands past every result.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

pub fn normalize_page(raw: Option<&Value>) -> u64 {
    match raw.and_then(loose_i64) {
        Some(p) if p >= 1 => p as u64,
        _ => DEFAULT_PAGE,
    }
}

pub fn normalize_limit(raw: Option<&Value>) -> u64 {
    match raw.and_then(loose_i64) {
        Some(l) if (1..=MAX_LIMIT as i64).contains(&l) => l as u64,
        _ => DEFAULT_LIMIT,
    }
}

fn loose_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn loose_f64(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    f.is_finite().then_some(f)
}

fn clean_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

fn parse_date_bound(v: &Value, bound: Bound) -> Option<DateTime<Utc>> {
    let s = v.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let naive = match bound {
        Bound::Start => day.and_hms_opt(0, 0, 0)?,
        Bound::End => day.and_hms_nano_opt(23, 59, 59, 999_999_999)?,
    };
    Some(Utc.from_utc_datetime(&naive))
}

fn string_or_seq<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => Vec::new(),
    })
}
