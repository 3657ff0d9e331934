//! Compiles a [`FilterSpec`] into one composite predicate.
//!
//! The same [`Predicate`] value is handed to every store operation of a
//! search (page fetch, total count, facet groups) so they all see the same
//! matched set.

use crate::filter::{DateRange, FilterSpec};
use crate::geo::GeoCap;
use crate::model::{Dimension, Issue};
use crate::text::{fold, TextQuery};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Free-text search over title and description.
    Text(TextQuery),
    /// Scalar field value must be one of the given values.
    FieldIn {
        dim: Dimension,
        values: BTreeSet<String>,
    },
    /// Tag set must contain every given tag.
    TagsAll(BTreeSet<String>),
    /// `createdAt` within inclusive bounds.
    CreatedBetween {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
    /// Location inside a spherical cap. Issues without a location never match.
    GeoWithin(GeoCap),
}

impl Clause {
    pub fn matches(&self, issue: &Issue) -> bool {
        match self {
            Clause::Text(q) => q.matches(&issue.title, &issue.description),
            Clause::FieldIn { dim, values } => issue
                .dimension_values(*dim)
                .into_iter()
                .any(|v| values.contains(v)),
            Clause::TagsAll(tags) => tags.is_subset(&issue.tags),
            Clause::CreatedBetween { start, end } => {
                start.map_or(true, |s| issue.created_at >= s)
                    && end.map_or(true, |e| issue.created_at <= e)
            }
            Clause::GeoWithin(cap) => issue.location.as_ref().is_some_and(|l| cap.contains(l)),
        }
    }
}

/// Logical AND of clauses. No clauses matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn compile(spec: &FilterSpec) -> Self {
        let mut clauses = Vec::new();
        if let Some(q) = spec.free_text.as_deref().and_then(TextQuery::parse) {
            clauses.push(Clause::Text(q));
        }
        for (dim, values) in [
            (Dimension::Categories, &spec.categories),
            (Dimension::Priorities, &spec.priorities),
            (Dimension::Statuses, &spec.statuses),
        ] {
            if !values.is_empty() {
                clauses.push(Clause::FieldIn {
                    dim,
                    values: values.clone(),
                });
            }
        }
        if !spec.tags.is_empty() {
            clauses.push(Clause::TagsAll(spec.tags.clone()));
        }
        if let Some(DateRange { start, end }) = spec.date_range {
            if start.is_some() || end.is_some() {
                clauses.push(Clause::CreatedBetween { start, end });
            }
        }
        if let Some(g) = spec.geo {
            clauses.push(Clause::GeoWithin(GeoCap::from_km(g.lat, g.lng, g.radius_km)));
        }
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Tags every match must carry, if the predicate constrains tags.
    pub fn required_tags(&self) -> Option<&BTreeSet<String>> {
        self.clauses.iter().find_map(|c| match c {
            Clause::TagsAll(t) => Some(t),
            _ => None,
        })
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        let mut folded: Option<String> = None;
        self.clauses.iter().all(|c| match c {
            Clause::Text(q) => {
                let hay = folded.get_or_insert_with(|| {
                    fold(&format!("{}\n{}", issue.title, issue.description))
                });
                q.matches_folded(hay)
            }
            other => other.matches(issue),
        })
    }
}
