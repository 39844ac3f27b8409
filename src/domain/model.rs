use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

pub type UserId = i64;
pub type PostId = i64;

/// 牆的擁有者 ID；社群牆為負數
pub type OwnerId = i64;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Counter {
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    /// Unix 秒
    pub date: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub views: Counter,
    #[serde(default)]
    pub likes: Counter,
    #[serde(default)]
    pub reposts: Counter,
    #[serde(default)]
    pub comments: Counter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Community {
    pub id: i64,
    pub name: String,
    pub screen_name: String,
}

impl Community {
    pub fn wall_owner(&self) -> OwnerId {
        -self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Employee {
    pub id: UserId,
    pub name: String,
    pub url: String,
    pub domain: String,
}

/// 追蹤的員工名單，啟動時載入一次後唯讀
pub type Roster = BTreeMap<UserId, Employee>;

pub type ReactorSet = HashSet<UserId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Repost,
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactionKind::Like => f.write_str("like"),
            ReactionKind::Repost => f.write_str("repost"),
        }
    }
}

/// 單次子請求的結果，失敗時保留原因，交給上層策略決定如何處理
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactorOutcome {
    Fetched(ReactorSet),
    Failed(String),
}

impl ReactorOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ReactorOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityMark {
    Both,
    Like,
    Repost,
    None,
}

impl ActivityMark {
    pub fn classify(liked: bool, reposted: bool) -> Self {
        match (liked, reposted) {
            (true, true) => ActivityMark::Both,
            (true, false) => ActivityMark::Like,
            (false, true) => ActivityMark::Repost,
            (false, false) => ActivityMark::None,
        }
    }

    pub fn has_like(self) -> bool {
        matches!(self, ActivityMark::Both | ActivityMark::Like)
    }

    pub fn has_repost(self) -> bool {
        matches!(self, ActivityMark::Both | ActivityMark::Repost)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ActivityMark::Both => "❤️🔁",
            ActivityMark::Like => "❤️",
            ActivityMark::Repost => "🔁",
            ActivityMark::None => "➖",
        }
    }
}

impl fmt::Display for ActivityMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivityMark::Both => "both",
            ActivityMark::Like => "like",
            ActivityMark::Repost => "repost",
            ActivityMark::None => "none",
        };
        f.write_str(name)
    }
}

/// 累計統計；total 永遠由 likes + reposts 算出
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityStats {
    likes: u32,
    reposts: u32,
}

impl ActivityStats {
    pub fn likes(&self) -> u32 {
        self.likes
    }

    pub fn reposts(&self) -> u32 {
        self.reposts
    }

    pub fn total(&self) -> u32 {
        self.likes + self.reposts
    }

    pub fn record(&mut self, mark: ActivityMark) {
        if mark.has_like() {
            self.likes += 1;
        }
        if mark.has_repost() {
            self.reposts += 1;
        }
    }
}

impl Serialize for ActivityStats {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ActivityStats", 3)?;
        state.serialize_field("likes", &self.likes)?;
        state.serialize_field("reposts", &self.reposts)?;
        state.serialize_field("total", &self.total())?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub employee: Employee,
    marks: Vec<ActivityMark>,
    stats: ActivityStats,
}

impl ActivityRecord {
    pub fn new(employee: Employee) -> Self {
        Self {
            employee,
            marks: Vec::new(),
            stats: ActivityStats::default(),
        }
    }

    pub fn push(&mut self, mark: ActivityMark) {
        self.marks.push(mark);
        self.stats.record(mark);
    }

    pub fn marks(&self) -> &[ActivityMark] {
        &self.marks
    }

    pub fn stats(&self) -> ActivityStats {
        self.stats
    }

    pub fn total(&self) -> u32 {
        self.stats.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: UserId) -> Employee {
        Employee {
            id,
            name: format!("User {}", id),
            url: format!("https://vk.com/id{}", id),
            domain: format!("id{}", id),
        }
    }

    #[test]
    fn test_classify_covers_all_combinations() {
        assert_eq!(ActivityMark::classify(true, true), ActivityMark::Both);
        assert_eq!(ActivityMark::classify(true, false), ActivityMark::Like);
        assert_eq!(ActivityMark::classify(false, true), ActivityMark::Repost);
        assert_eq!(ActivityMark::classify(false, false), ActivityMark::None);
    }

    #[test]
    fn test_total_is_always_recomputed() {
        let mut record = ActivityRecord::new(employee(1));
        record.push(ActivityMark::Both);
        record.push(ActivityMark::Like);
        record.push(ActivityMark::None);
        record.push(ActivityMark::Repost);

        let stats = record.stats();
        assert_eq!(stats.likes(), 2);
        assert_eq!(stats.reposts(), 2);
        assert_eq!(stats.total(), 4);
        assert_eq!(record.marks().len(), 4);
    }

    #[test]
    fn test_stats_serialize_with_total() {
        let mut stats = ActivityStats::default();
        stats.record(ActivityMark::Both);
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json, serde_json::json!({"likes": 1, "reposts": 1, "total": 2}));
    }

    #[test]
    fn test_post_deserializes_with_missing_counters() {
        let post: Post = serde_json::from_value(serde_json::json!({
            "id": 42,
            "date": 1700000000,
            "text": "hello",
            "likes": {"count": 3}
        }))
        .unwrap();
        assert_eq!(post.likes.count, 3);
        assert_eq!(post.views.count, 0);
    }

    #[test]
    fn test_wall_owner_is_negated_community_id() {
        let community = Community {
            id: 123,
            name: "Test".to_string(),
            screen_name: "test".to_string(),
        };
        assert_eq!(community.wall_owner(), -123);
    }
}
