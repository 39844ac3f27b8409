use crate::domain::model::{Community, OwnerId, Post, PostId, ReactionKind, Roster, UserId};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 社群平台的遠端資料來源
///
/// `fetch_posts` 與名單 / 社群查詢失敗時整份報表失敗；
/// `fetch_reactors` 失敗只會讓該貼文降級為空集合。
#[async_trait]
pub trait RemoteDataSource: Send + Sync + 'static {
    async fn resolve_community(&self, screen_name: &str) -> Result<Community>;

    /// 依時間由新到舊
    async fn fetch_posts(&self, owner: OwnerId, count: usize, offset: usize) -> Result<Vec<Post>>;

    async fn fetch_reactors(
        &self,
        owner: OwnerId,
        post_id: PostId,
        kind: ReactionKind,
    ) -> Result<Vec<UserId>>;

    async fn fetch_roster(&self, screen_names: &[String]) -> Result<Roster>;
}
