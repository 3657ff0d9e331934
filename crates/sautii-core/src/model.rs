use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ulid::Ulid;

pub type IssueId = String; // ULID string
pub type UserId = String;

pub const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

/// Up and down voters of an issue. A user is never in both sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Votes {
    #[serde(default)]
    pub up: BTreeSet<UserId>,
    #[serde(default)]
    pub down: BTreeSet<UserId>,
}

impl Votes {
    /// Records a vote, moving the user out of the opposite set.
    pub fn apply(&mut self, user: &str, vote: VoteType) {
        let (add, remove) = match vote {
            VoteType::Up => (&mut self.up, &mut self.down),
            VoteType::Down => (&mut self.down, &mut self.up),
        };
        remove.remove(user);
        add.insert(user.to_string());
    }

    pub fn net(&self) -> i64 {
        self.up.len() as i64 - self.down.len() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub created_by: UserId,
}

impl Comment {
    pub fn new(req: NewComment) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new().to_string(),
            content: req.content,
            created_by: req.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub votes: Votes,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub id: Option<IssueId>,
}

impl Issue {
    pub fn new(mut req: NewIssue, created_by: Option<UserId>) -> Self {
        let id = req.id.take().unwrap_or_else(|| Ulid::new().to_string());
        let now = Utc::now();
        Self {
            id,
            title: req.title,
            description: req.description,
            category: req.category,
            priority: req.priority,
            status: Some(DEFAULT_STATUS.to_string()),
            location: req.location,
            created_by,
            assigned_to: None,
            tags: req.tags,
            votes: Votes::default(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, upd: IssueUpdate) {
        let IssueUpdate {
            title,
            description,
            category,
            priority,
            status,
            location,
            tags,
            assigned_to,
        } = upd;
        if let Some(v) = title {
            self.title = v;
        }
        if let Some(v) = description {
            self.description = v;
        }
        if let Some(v) = category {
            self.category = Some(v);
        }
        if let Some(v) = priority {
            self.priority = Some(v);
        }
        if let Some(v) = status {
            self.status = Some(v);
        }
        if let Some(v) = location {
            self.location = Some(v);
        }
        if let Some(v) = tags {
            self.tags = v;
        }
        if let Some(v) = assigned_to {
            self.assigned_to = Some(v);
        }
        self.updated_at = Utc::now();
    }

    /// Values this issue contributes to a facet dimension.
    pub fn dimension_values(&self, dim: Dimension) -> Vec<&str> {
        match dim {
            Dimension::Categories => self.category.as_deref().into_iter().collect(),
            Dimension::Priorities => self.priority.as_deref().into_iter().collect(),
            Dimension::Statuses => self.status.as_deref().into_iter().collect(),
            Dimension::Tags => self.tags.iter().map(String::as_str).collect(),
        }
    }
}

/// Fields a caller may change on an existing issue. Anything else is
/// immutable through the update path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub location: Option<Location>,
    pub tags: Option<BTreeSet<String>>,
    pub assigned_to: Option<UserId>,
}

/// A categorical dimension used both for membership filters and facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Categories,
    Priorities,
    Statuses,
    Tags,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Categories,
        Dimension::Priorities,
        Dimension::Statuses,
        Dimension::Tags,
    ];

    /// Facet key in responses.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Priorities => "priorities",
            Self::Statuses => "statuses",
            Self::Tags => "tags",
        }
    }

    /// Document field the dimension reads.
    pub const fn field(self) -> &'static str {
        match self {
            Self::Categories => "category",
            Self::Priorities => "priority",
            Self::Statuses => "status",
            Self::Tags => "tags",
        }
    }

    pub const fn is_multi_valued(self) -> bool {
        matches!(self, Self::Tags)
    }
}

/// Rank of a priority label; unknown or missing labels rank lowest.
pub fn priority_ordinal(priority: Option<&str>) -> i32 {
    match priority.map(str::to_ascii_lowercase).as_deref() {
        Some("low") => 0,
        Some("medium") => 1,
        Some("high") => 2,
        Some("critical") => 3,
        _ => -1,
    }
}
