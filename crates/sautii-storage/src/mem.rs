use crate::traits::{GroupCounts, IssueStore, PageWindow, SortPlan, TieBreak};
use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus::{register_histogram_vec, HistogramVec};
use sautii_core::{
    priority_ordinal, Comment, Dimension, Issue, IssueId, IssueUpdate, NewComment, NewIssue,
    Predicate, Result, SautiiError, SortKey, SortOrder, UserId, VoteType,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

static STORE_SCAN_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!("store_scan_seconds", "In-memory predicate scan latency", &["op"])
        .unwrap()
});

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    // id -> issue; BTreeMap keeps ULID (creation) order for stable scans
    issues: BTreeMap<IssueId, Issue>,
    // tag -> ids carrying it
    tag_index: HashMap<String, BTreeSet<IssueId>>,
}

impl Inner {
    fn index(&mut self, issue: &Issue) {
        for t in issue.tags.iter() {
            self.tag_index
                .entry(t.clone())
                .or_default()
                .insert(issue.id.clone());
        }
    }

    fn unindex(&mut self, issue: &Issue) {
        for t in issue.tags.iter() {
            if let Some(ids) = self.tag_index.get_mut(t) {
                ids.remove(&issue.id);
                if ids.is_empty() {
                    self.tag_index.remove(t);
                }
            }
        }
    }

    fn put(&mut self, issue: Issue) {
        if let Some(old) = self.issues.remove(&issue.id) {
            self.unindex(&old);
        }
        self.index(&issue);
        self.issues.insert(issue.id.clone(), issue);
    }

    /// Matching issues in id order. Required tags narrow the scan through
    /// the tag index before the full predicate runs.
    fn matching<'a>(&'a self, predicate: &'a Predicate) -> Vec<&'a Issue> {
        let Some(tags) = predicate.required_tags() else {
            return self
                .issues
                .values()
                .filter(|i| predicate.matches(i))
                .collect();
        };
        let mut candidates: Option<BTreeSet<&IssueId>> = None;
        for t in tags {
            let Some(ids) = self.tag_index.get(t) else {
                return Vec::new();
            };
            candidates = Some(match candidates.take() {
                None => ids.iter().collect(),
                Some(prev) => prev.into_iter().filter(|id| ids.contains(*id)).collect(),
            });
        }
        candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.issues.get(id))
            .filter(|i| predicate.matches(i))
            .collect()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        let store = Self::new();
        for i in issues {
            store.load(i);
        }
        store
    }

    /// Inserts a fully formed issue as-is, replacing any issue with the same id.
    pub fn load(&self, issue: Issue) {
        self.inner.write().put(issue);
    }

    pub fn len(&self) -> usize {
        self.inner.read().issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compare(a: &Issue, b: &Issue, plan: SortPlan) -> Ordering {
    let primary = match plan.key {
        SortKey::Date => a.created_at.cmp(&b.created_at),
        SortKey::Votes => a.votes.net().cmp(&b.votes.net()),
        SortKey::Priority => priority_ordinal(a.priority.as_deref())
            .cmp(&priority_ordinal(b.priority.as_deref())),
    };
    let primary = match plan.order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    match plan.tie_break {
        Some(TieBreak::CreatedAtDesc) => primary.then_with(|| b.created_at.cmp(&a.created_at)),
        None => primary,
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

#[async_trait::async_trait]
impl IssueStore for InMemoryStore {
    async fn query(&self, predicate: &Predicate) -> Result<Vec<Issue>> {
        let _timer = STORE_SCAN_SECONDS.with_label_values(&["query"]).start_timer();
        let inner = self.inner.read();
        Ok(inner.matching(predicate).into_iter().cloned().collect())
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64> {
        let _timer = STORE_SCAN_SECONDS.with_label_values(&["count"]).start_timer();
        let inner = self.inner.read();
        Ok(inner.matching(predicate).len() as u64)
    }

    async fn group_count(
        &self,
        predicate: &Predicate,
        dim: Dimension,
        multi_valued: bool,
    ) -> Result<GroupCounts> {
        let _timer = STORE_SCAN_SECONDS
            .with_label_values(&["group_count"])
            .start_timer();
        let inner = self.inner.read();
        let mut out = GroupCounts::new();
        for issue in inner.matching(predicate) {
            let values = issue.dimension_values(dim);
            if multi_valued {
                for v in values {
                    *out.entry(v.to_string()).or_insert(0) += 1;
                }
            } else if let [v] = values.as_slice() {
                *out.entry(v.to_string()).or_insert(0) += 1;
            }
        }
        Ok(out)
    }

    async fn sorted_page(
        &self,
        predicate: &Predicate,
        plan: SortPlan,
        window: PageWindow,
    ) -> Result<Vec<Issue>> {
        let _timer = STORE_SCAN_SECONDS
            .with_label_values(&["sorted_page"])
            .start_timer();
        let inner = self.inner.read();
        let mut hits = inner.matching(predicate);
        hits.sort_by(|a, b| compare(a, b, plan));
        Ok(hits
            .into_iter()
            .skip(to_usize(window.offset))
            .take(to_usize(window.limit))
            .cloned()
            .collect())
    }

    async fn insert(&self, req: NewIssue, created_by: Option<UserId>) -> Result<Issue> {
        if req.title.trim().is_empty() {
            return Err(SautiiError::Invalid("title is required".into()));
        }
        let issue = Issue::new(req, created_by);
        let mut inner = self.inner.write();
        if inner.issues.contains_key(&issue.id) {
            return Err(SautiiError::Invalid(format!("duplicate id {}", issue.id)));
        }
        inner.put(issue.clone());
        tracing::debug!(id = %issue.id, "issue inserted");
        Ok(issue)
    }

    async fn get(&self, id: &str) -> Result<Issue> {
        self.inner
            .read()
            .issues
            .get(id)
            .cloned()
            .ok_or(SautiiError::NotFound)
    }

    async fn update(&self, id: &str, upd: IssueUpdate) -> Result<Issue> {
        let mut inner = self.inner.write();
        let mut issue = inner.issues.get(id).cloned().ok_or(SautiiError::NotFound)?;
        issue.apply_update(upd);
        inner.put(issue.clone());
        Ok(issue)
    }

    async fn vote(&self, id: &str, user: &str, vote: VoteType) -> Result<Issue> {
        let mut inner = self.inner.write();
        let issue = inner.issues.get_mut(id).ok_or(SautiiError::NotFound)?;
        issue.votes.apply(user, vote);
        Ok(issue.clone())
    }

    async fn add_comment(&self, id: &str, req: NewComment) -> Result<Comment> {
        if req.content.trim().is_empty() {
            return Err(SautiiError::Invalid("comment content is required".into()));
        }
        let mut inner = self.inner.write();
        let issue = inner.issues.get_mut(id).ok_or(SautiiError::NotFound)?;
        let comment = Comment::new(req);
        issue.comments.push(comment.clone());
        issue.updated_at = Utc::now();
        Ok(comment)
    }
}
