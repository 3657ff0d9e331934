//! Per-dimension counts over the matching set.

use sautii_core::{Dimension, Predicate, Result};
use sautii_storage::{GroupCounts, IssueStore};
use serde::{Deserialize, Serialize};

/// Per-dimension value counts over the full filtered set.
///
/// Counts are self-inclusive: a dimension's own filter narrows its own
/// buckets, so `categories=security` yields only the `security` bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    pub categories: GroupCounts,
    pub priorities: GroupCounts,
    pub statuses: GroupCounts,
    pub tags: GroupCounts,
}

impl Facets {
    pub fn get(&self, dim: Dimension) -> &GroupCounts {
        match dim {
            Dimension::Categories => &self.categories,
            Dimension::Priorities => &self.priorities,
            Dimension::Statuses => &self.statuses,
            Dimension::Tags => &self.tags,
        }
    }

    pub fn is_empty(&self) -> bool {
        Dimension::ALL.iter().all(|d| self.get(*d).is_empty())
    }
}

/// Runs one grouped count per dimension against the same predicate.
pub async fn aggregate<S>(store: &S, predicate: &Predicate) -> Result<Facets>
where
    S: IssueStore + ?Sized,
{
    let group = move |dim: Dimension| store.group_count(predicate, dim, dim.is_multi_valued());
    let (categories, priorities, statuses, tags) = futures::try_join!(
        group(Dimension::Categories),
        group(Dimension::Priorities),
        group(Dimension::Statuses),
        group(Dimension::Tags),
    )?;
    Ok(Facets {
        categories,
        priorities,
        statuses,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, spec};
    use serde_json::json;

    #[tokio::test]
    async fn facets_follow_the_filter_including_their_own_dimension() {
        let store = fixture();
        let p = Predicate::compile(&spec(json!({"categories": ["security"]})));
        let f = aggregate(&store, &p).await.unwrap();
        assert_eq!(f.categories.len(), 1);
        assert_eq!(f.categories.get("security"), Some(&3));
        assert_eq!(f.statuses.values().sum::<u64>(), 3);
    }

    #[tokio::test]
    async fn tags_count_once_per_carried_tag() {
        let store = fixture();
        let f = aggregate(&store, &Predicate::match_all()).await.unwrap();
        let tag_total: u64 = f.tags.values().sum();
        let carried: usize = store
            .query(&Predicate::match_all())
            .await
            .unwrap()
            .iter()
            .map(|i| i.tags.len())
            .sum();
        assert_eq!(tag_total, carried as u64);
    }

    #[tokio::test]
    async fn empty_match_gives_empty_maps() {
        let store = fixture();
        let p = Predicate::compile(&spec(json!({"categories": ["NONEXISTENT"]})));
        let f = aggregate(&store, &p).await.unwrap();
        assert!(f.is_empty());
        assert_eq!(
            serde_json::to_value(&f).unwrap(),
            json!({"categories": {}, "priorities": {}, "statuses": {}, "tags": {}})
        );
    }
}
