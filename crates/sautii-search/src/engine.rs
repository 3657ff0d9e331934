//! Search entry point tying predicate, facets and paging together.

use crate::assemble::{assemble, SearchResult};
use crate::facets::{self, Facets};
use crate::paginate::{fetch_page, page_window};
use sautii_core::{FilterSpec, Predicate, Result};
use sautii_storage::IssueStore;
use std::sync::Arc;

/// Search over an injected issue store.
///
/// Each call compiles the filter once and runs the total count, the facet
/// groups and the page fetch concurrently against that one predicate. The
/// three reads are separate store calls, so under concurrent writes they may
/// disagree slightly; snapshot consistency is up to the store.
pub struct SearchEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for SearchEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: IssueStore + ?Sized> SearchEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn search(&self, spec: &FilterSpec) -> Result<SearchResult> {
        let predicate = Predicate::compile(spec);
        tracing::debug!(
            clauses = predicate.clauses().len(),
            page = spec.page,
            limit = spec.limit,
            "search compiled"
        );
        let store = self.store.as_ref();
        let (total, facets, issues) = futures::try_join!(
            store.count(&predicate),
            facets::aggregate(store, &predicate),
            fetch_page(store, &predicate, spec),
        )?;
        tracing::debug!(total, returned = issues.len(), "search done");
        Ok(assemble(total, facets, issues, page_window(spec)))
    }

    /// Facet counts only; the page window is pinned to page 1, limit 1.
    pub async fn facets(&self, spec: &FilterSpec) -> Result<Facets> {
        Ok(self.search(&spec.for_facets()).await?.facets)
    }
}
