//! Sort plan and page window for the result page.

use sautii_core::{FilterSpec, Issue, Predicate, Result, SortKey};
use sautii_storage::{IssueStore, PageWindow, SortPlan, TieBreak};

/// Date sorts stand alone; vote and priority sorts fall back to newest first.
pub fn sort_plan(spec: &FilterSpec) -> SortPlan {
    let tie_break = match spec.sort_by {
        SortKey::Date => None,
        SortKey::Votes | SortKey::Priority => Some(TieBreak::CreatedAtDesc),
    };
    SortPlan {
        key: spec.sort_by,
        order: spec.sort_order,
        tie_break,
    }
}

pub fn page_window(spec: &FilterSpec) -> PageWindow {
    PageWindow {
        offset: spec.offset(),
        limit: spec.limit,
    }
}

pub async fn fetch_page<S>(store: &S, predicate: &Predicate, spec: &FilterSpec) -> Result<Vec<Issue>>
where
    S: IssueStore + ?Sized,
{
    store
        .sorted_page(predicate, sort_plan(spec), page_window(spec))
        .await
}
