//! Final search response.

use crate::facets::Facets;
use sautii_core::Issue;
use sautii_storage::PageWindow;
use serde::{Deserialize, Serialize};

/// One search response. All three parts are always present; an empty match
/// yields `[]`, `0` and empty facet maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub issues: Vec<Issue>,
    pub total: u64,
    pub facets: Facets,
}

pub fn assemble(total: u64, facets: Facets, mut issues: Vec<Issue>, window: PageWindow) -> SearchResult {
    let cap = usize::try_from(window.limit).unwrap_or(usize::MAX);
    if issues.len() > cap {
        tracing::warn!(returned = issues.len(), limit = window.limit, "store overfilled page");
        issues.truncate(cap);
    }
    SearchResult {
        issues,
        total,
        facets,
    }
}
