//! Shared fixtures for engine tests.

use chrono::{Duration, TimeZone, Utc};
use sautii_core::{
    Comment, Dimension, FilterSpec, Issue, IssueUpdate, Location, NewComment, NewIssue,
    Predicate, Result, SautiiError, SearchRequest, UserId, VoteType,
};
use sautii_storage::{GroupCounts, InMemoryStore, IssueStore, PageWindow, SortPlan};

pub fn spec(body: serde_json::Value) -> FilterSpec {
    let req: SearchRequest = serde_json::from_value(body).expect("valid request json");
    FilterSpec::from_request(req)
}

pub struct Row {
    pub id: &'static str,
    pub day: i64,
    pub category: Option<&'static str>,
    pub priority: &'static str,
    pub status: &'static str,
    pub tags: &'static [&'static str],
    pub at: Option<(f64, f64)>,
    pub up: usize,
    pub down: usize,
    pub title: &'static str,
    pub description: &'static str,
}

pub fn day(n: i64) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + Duration::days(n)
}

pub fn build(row: &Row) -> Issue {
    let mut issue = Issue::new(
        NewIssue {
            id: Some(row.id.to_string()),
            title: row.title.to_string(),
            description: row.description.to_string(),
            category: row.category.map(str::to_string),
            priority: Some(row.priority.to_string()),
            location: row.at.map(|(lat, lng)| Location {
                lat,
                lng,
                address: String::new(),
            }),
            tags: row.tags.iter().map(|t| t.to_string()).collect(),
        },
        Some("reporter".into()),
    );
    issue.status = Some(row.status.to_string());
    issue.created_at = day(row.day);
    issue.updated_at = day(row.day);
    for u in 0..row.up {
        issue.votes.apply(&format!("up-{u}"), VoteType::Up);
    }
    for u in 0..row.down {
        issue.votes.apply(&format!("down-{u}"), VoteType::Down);
    }
    issue
}

pub const ROWS: &[Row] = &[
    Row { id: "i01", day: 1, category: Some("security"), priority: "high", status: "pending", tags: &["night", "market"], at: Some((-1.2864, 36.8172)), up: 3, down: 0, title: "Broken streetlights", description: "Dark street near the market at night" },
    Row { id: "i02", day: 2, category: Some("health"), priority: "critical", status: "active", tags: &["water"], at: Some((-1.3133, 36.7876)), up: 5, down: 1, title: "Contaminated water", description: "Water point smells of sewage" },
    Row { id: "i03", day: 3, category: Some("security"), priority: "medium", status: "resolved", tags: &["night"], at: Some((-4.0435, 39.6682)), up: 0, down: 2, title: "Muggings at bus stop", description: "Commuters robbed after dark" },
    Row { id: "i04", day: 4, category: Some("education"), priority: "low", status: "pending", tags: &["school", "market"], at: None, up: 1, down: 0, title: "École overcrowded", description: "Classes have ninety pupils" },
    Row { id: "i05", day: 5, category: Some("infrastructure"), priority: "high", status: "active", tags: &["road", "night", "market"], at: Some((-1.2676, 36.8108)), up: 2, down: 0, title: "Pothole on Waiyaki Way", description: "Deep pothole damaging cars at night" },
    Row { id: "i06", day: 6, category: Some("security"), priority: "critical", status: "pending", tags: &[], at: Some((-0.0917, 34.7680)), up: 0, down: 0, title: "Police post unmanned", description: "No officers at the post" },
    Row { id: "i07", day: 7, category: Some("health"), priority: "low", status: "rejected", tags: &["water", "school"], at: Some((-0.3031, 36.0800)), up: 1, down: 1, title: "School borehole dry", description: "Pupils carry water from home" },
    Row { id: "i08", day: 8, category: None, priority: "medium", status: "pending", tags: &["road"], at: None, up: 0, down: 0, title: "Unclassified report", description: "Road sign missing" },
];

pub fn fixture() -> InMemoryStore {
    InMemoryStore::from_issues(ROWS.iter().map(build))
}

/// `n` security issues created on consecutive days, ids `p01..`.
pub fn bulk(n: usize) -> InMemoryStore {
    InMemoryStore::from_issues((1..=n).map(|k| {
        let mut i = build(&ROWS[0]);
        i.id = format!("p{k:02}");
        i.created_at = day(k as i64);
        i
    }))
}

/// Store whose every read fails, for error propagation tests.
pub struct FailingStore;

fn down() -> SautiiError {
    SautiiError::Store("connection refused".into())
}

#[async_trait::async_trait]
impl IssueStore for FailingStore {
    async fn query(&self, _: &Predicate) -> Result<Vec<Issue>> {
        Err(down())
    }
    async fn count(&self, _: &Predicate) -> Result<u64> {
        Err(down())
    }
    async fn group_count(&self, _: &Predicate, _: Dimension, _: bool) -> Result<GroupCounts> {
        Err(down())
    }
    async fn sorted_page(&self, _: &Predicate, _: SortPlan, _: PageWindow) -> Result<Vec<Issue>> {
        Err(down())
    }
    async fn insert(&self, _: NewIssue, _: Option<UserId>) -> Result<Issue> {
        Err(down())
    }
    async fn get(&self, _: &str) -> Result<Issue> {
        Err(down())
    }
    async fn update(&self, _: &str, _: IssueUpdate) -> Result<Issue> {
        Err(down())
    }
    async fn vote(&self, _: &str, _: &str, _: VoteType) -> Result<Issue> {
        Err(down())
    }
    async fn add_comment(&self, _: &str, _: NewComment) -> Result<Comment> {
        Err(down())
    }
}
