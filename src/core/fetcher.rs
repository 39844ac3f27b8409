use crate::domain::model::{OwnerId, PostId, ReactionKind, ReactorOutcome, ReactorSet};
use crate::domain::ports::RemoteDataSource;
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_CONCURRENCY_LIMIT: usize = 8;

/// 子請求失敗時的處理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// 視為沒有任何反應（少算，但報表照常產出）
    #[default]
    Degrade,
    /// 任何一個子請求失敗就放棄整份報表
    Abort,
}

/// 每則貼文的按讚者 / 轉發者抓取結果，每個請求的 ID 都一定有對應項目
#[derive(Debug, Clone, Default)]
pub struct ReactionIndex {
    pub likes: HashMap<PostId, ReactorOutcome>,
    pub reposts: HashMap<PostId, ReactorOutcome>,
    /// 請求時的貼文順序
    order: Vec<PostId>,
}

pub type ReactorsByItem = HashMap<PostId, ReactorSet>;

impl ReactionIndex {
    pub fn failures(&self) -> usize {
        self.likes
            .values()
            .chain(self.reposts.values())
            .filter(|o| o.is_failed())
            .count()
    }

    /// 依請求順序逐則處理，同一則先看按讚再看轉發；
    /// `Abort` 回報的是第一個失敗的 (貼文, 種類)
    pub fn resolve(mut self, policy: FailurePolicy) -> Result<(ReactorsByItem, ReactorsByItem)> {
        let mut likes = HashMap::with_capacity(self.order.len());
        let mut reposts = HashMap::with_capacity(self.order.len());

        for &post_id in &self.order {
            if likes.contains_key(&post_id) {
                continue;
            }
            let like = resolve_outcome(
                self.likes.remove(&post_id),
                post_id,
                ReactionKind::Like,
                policy,
            )?;
            let repost = resolve_outcome(
                self.reposts.remove(&post_id),
                post_id,
                ReactionKind::Repost,
                policy,
            )?;
            likes.insert(post_id, like);
            reposts.insert(post_id, repost);
        }
        Ok((likes, reposts))
    }
}

fn resolve_outcome(
    outcome: Option<ReactorOutcome>,
    post_id: PostId,
    kind: ReactionKind,
    policy: FailurePolicy,
) -> Result<ReactorSet> {
    let reason = match outcome {
        Some(ReactorOutcome::Fetched(set)) => return Ok(set),
        Some(ReactorOutcome::Failed(reason)) => reason,
        None => "no result recorded".to_string(),
    };
    match policy {
        FailurePolicy::Degrade => {
            tracing::warn!(
                "⚠️ {} list for post {} unavailable, counting as empty: {}",
                kind,
                post_id,
                reason
            );
            Ok(ReactorSet::new())
        }
        FailurePolicy::Abort => Err(EtlError::ReactorFetchError {
            post_id,
            kind: kind.to_string(),
            reason,
        }),
    }
}

/// 以貼文為單位限制並行數的按讚 / 轉發抓取器
///
/// 每則貼文取得一個 semaphore 許可後，同時送出兩個子請求，
/// 因此實際對外並行請求最多約為 2 × limit。
pub struct ReactionFetcher<S: RemoteDataSource> {
    source: Arc<S>,
    concurrency_limit: usize,
}

impl<S: RemoteDataSource> ReactionFetcher<S> {
    pub fn new(source: Arc<S>, concurrency_limit: usize) -> Self {
        Self {
            source,
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// 等待所有貼文的兩個子請求都完成後才回傳。
    ///
    /// 丟棄回傳的 future 會一併中止所有仍在進行的工作。
    pub async fn fetch(&self, owner: OwnerId, item_ids: &[PostId]) -> ReactionIndex {
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut workers = JoinSet::new();

        for &post_id in item_ids {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            workers.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let reason = "fetcher semaphore closed".to_string();
                        return (
                            post_id,
                            ReactorOutcome::Failed(reason.clone()),
                            ReactorOutcome::Failed(reason),
                        );
                    }
                };

                let (likes, reposts) = tokio::join!(
                    fetch_outcome(source.as_ref(), owner, post_id, ReactionKind::Like),
                    fetch_outcome(source.as_ref(), owner, post_id, ReactionKind::Repost),
                );
                (post_id, likes, reposts)
            });
        }

        let mut index = ReactionIndex {
            likes: HashMap::with_capacity(item_ids.len()),
            reposts: HashMap::with_capacity(item_ids.len()),
            order: item_ids.to_vec(),
        };

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((post_id, likes, reposts)) => {
                    index.likes.insert(post_id, likes);
                    index.reposts.insert(post_id, reposts);
                }
                Err(e) => tracing::error!("❌ Reactor worker did not finish: {}", e),
            }
        }

        // 工作中途 panic 的貼文也要有項目
        for &post_id in item_ids {
            index
                .likes
                .entry(post_id)
                .or_insert_with(|| ReactorOutcome::Failed("worker panicked".to_string()));
            index
                .reposts
                .entry(post_id)
                .or_insert_with(|| ReactorOutcome::Failed("worker panicked".to_string()));
        }

        let failures = index.failures();
        if failures > 0 {
            tracing::warn!(
                "⚠️ {} of {} reactor requests failed",
                failures,
                item_ids.len() * 2
            );
        } else {
            tracing::debug!("Fetched reactors for {} posts", item_ids.len());
        }

        index
    }
}

async fn fetch_outcome<S: RemoteDataSource>(
    source: &S,
    owner: OwnerId,
    post_id: PostId,
    kind: ReactionKind,
) -> ReactorOutcome {
    match source.fetch_reactors(owner, post_id, kind).await {
        Ok(ids) => ReactorOutcome::Fetched(ids.into_iter().collect()),
        Err(e) => {
            tracing::debug!("{} request for post {} failed: {}", kind, post_id, e);
            ReactorOutcome::Failed(e.to_string())
        }
    }
}
