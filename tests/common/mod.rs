#![allow(dead_code)]

use async_trait::async_trait;
use engagement_etl::domain::model::{
    Community, Counter, Employee, OwnerId, Post, PostId, ReactionKind, Roster, UserId,
};
use engagement_etl::domain::ports::RemoteDataSource;
use engagement_etl::{EtlError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const COMMUNITY_ID: i64 = 777;

/// 記憶體內的假資料來源，會記錄呼叫次數
#[derive(Default)]
pub struct FakeSource {
    pub posts: Vec<Post>,
    pub likes: HashMap<PostId, Vec<UserId>>,
    pub reposts: HashMap<PostId, Vec<UserId>>,
    pub roster: Roster,
    pub failing_reactors: HashSet<(PostId, ReactionKind)>,
    pub fail_posts: AtomicBool,
    /// 從這個 offset 起的貼文頁都失敗
    pub fail_posts_from_offset: Option<usize>,
    pub fail_roster: bool,
    pub post_calls: AtomicUsize,
    pub reactor_calls: AtomicUsize,
}

impl FakeSource {
    pub fn post_calls(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    pub fn reactor_calls(&self) -> usize {
        self.reactor_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteDataSource for FakeSource {
    async fn resolve_community(&self, screen_name: &str) -> Result<Community> {
        Ok(Community {
            id: COMMUNITY_ID,
            name: "Test Community".to_string(),
            screen_name: screen_name.to_string(),
        })
    }

    async fn fetch_posts(&self, owner: OwnerId, count: usize, offset: usize) -> Result<Vec<Post>> {
        assert_eq!(owner, -COMMUNITY_ID);
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        let page_fails = self.fail_posts_from_offset.is_some_and(|from| offset >= from);
        if self.fail_posts.load(Ordering::SeqCst) || page_fails {
            return Err(EtlError::RemoteApiError {
                code: 15,
                message: "Access denied".to_string(),
            });
        }
        Ok(self.posts.iter().skip(offset).take(count).cloned().collect())
    }

    async fn fetch_reactors(
        &self,
        _owner: OwnerId,
        post_id: PostId,
        kind: ReactionKind,
    ) -> Result<Vec<UserId>> {
        self.reactor_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_reactors.contains(&(post_id, kind)) {
            return Err(EtlError::RemoteApiError {
                code: 6,
                message: "Too many requests per second".to_string(),
            });
        }
        let map = match kind {
            ReactionKind::Like => &self.likes,
            ReactionKind::Repost => &self.reposts,
        };
        Ok(map.get(&post_id).cloned().unwrap_or_default())
    }

    async fn fetch_roster(&self, _screen_names: &[String]) -> Result<Roster> {
        if self.fail_roster {
            return Err(EtlError::RemoteApiError {
                code: 5,
                message: "User authorization failed".to_string(),
            });
        }
        Ok(self.roster.clone())
    }
}

pub fn employee(id: UserId, name: &str) -> Employee {
    Employee {
        id,
        name: name.to_string(),
        url: format!("https://vk.com/id{}", id),
        domain: format!("id{}", id),
    }
}

pub fn post(id: PostId, date: i64) -> Post {
    Post {
        id,
        date,
        text: format!("Post {}", id),
        views: Counter { count: 10 },
        likes: Counter { count: 2 },
        reposts: Counter { count: 1 },
        comments: Counter { count: 0 },
    }
}

/// P1 / P2，Alice (10) 與 Bob (20)
pub fn worked_example() -> FakeSource {
    let roster: Roster = [employee(10, "Alice"), employee(20, "Bob")]
        .into_iter()
        .map(|e| (e.id, e))
        .collect();

    FakeSource {
        // 由新到舊
        posts: vec![post(1, 1_708_700_000), post(2, 1_708_600_000)],
        likes: HashMap::from([(1, vec![10]), (2, vec![10, 20])]),
        reposts: HashMap::from([(1, vec![20]), (2, vec![])]),
        roster,
        ..Default::default()
    }
}

/// 2024-03-01 起往回 60 天，每天中午一則
pub fn daily_posts_for_export() -> FakeSource {
    const MARCH_FIRST: i64 = 1_709_251_200;
    let mut source = worked_example();
    source.posts = (0..60)
        .map(|i| post(5000 - i, MARCH_FIRST - i * 86_400 + 12 * 3600))
        .collect();
    source
}
