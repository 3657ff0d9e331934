use sautii_core::{
    Comment, Dimension, Issue, IssueUpdate, NewComment, NewIssue, Predicate, Result, SortKey,
    SortOrder, UserId, VoteType,
};
use std::collections::BTreeMap;

/// Secondary sort applied when primary keys tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// `createdAt`, newest first, regardless of the primary order.
    CreatedAtDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortPlan {
    pub key: SortKey,
    pub order: SortOrder,
    pub tie_break: Option<TieBreak>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

pub type GroupCounts = BTreeMap<String, u64>;

/// Issue collection consumed by the search engine.
///
/// Read operations take the compiled predicate by reference so a single
/// search can reuse it across the page, count and facet calls.
#[async_trait::async_trait]
pub trait IssueStore: Send + Sync + 'static {
    async fn query(&self, predicate: &Predicate) -> Result<Vec<Issue>>;
    async fn count(&self, predicate: &Predicate) -> Result<u64>;
    /// Counts matches per distinct value of `dim`. With `multi_valued`,
    /// array fields are flattened first so one issue can land in several
    /// buckets.
    async fn group_count(
        &self,
        predicate: &Predicate,
        dim: Dimension,
        multi_valued: bool,
    ) -> Result<GroupCounts>;
    async fn sorted_page(
        &self,
        predicate: &Predicate,
        plan: SortPlan,
        window: PageWindow,
    ) -> Result<Vec<Issue>>;

    // Write paths backing the read model
    async fn insert(&self, req: NewIssue, created_by: Option<UserId>) -> Result<Issue>;
    async fn get(&self, id: &str) -> Result<Issue>;
    async fn update(&self, id: &str, upd: IssueUpdate) -> Result<Issue>;
    async fn vote(&self, id: &str, user: &str, vote: VoteType) -> Result<Issue>;
    async fn add_comment(&self, id: &str, req: NewComment) -> Result<Comment>;
}
