use crate::domain::model::{Community, Employee, OwnerId, Post, PostId, ReactionKind, Roster, UserId};
use crate::domain::ports::RemoteDataSource;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.vk.com/method";
pub const DEFAULT_API_VERSION: &str = "5.131";

#[derive(Debug, Clone)]
pub struct VkClientOptions {
    pub api_url: String,
    pub access_token: String,
    pub api_version: String,
    pub timeout: Duration,
    /// likes.getList / wall.getReposts 單次最多取回的筆數
    pub reactor_page_size: usize,
}

impl Default for VkClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(10),
            reactor_page_size: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_code: i64,
    error_msg: String,
}

#[derive(Debug, Deserialize)]
struct GroupItem {
    id: i64,
    name: String,
    #[serde(default)]
    screen_name: String,
}

#[derive(Debug, Deserialize)]
struct UserItem {
    id: UserId,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    domain: String,
}

#[derive(Debug, Deserialize)]
struct ItemsPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ProfileRef {
    id: UserId,
}

#[derive(Debug, Deserialize)]
struct RepostsPage {
    #[serde(default)]
    profiles: Vec<ProfileRef>,
}

/// VK 風格 JSON API 的 reqwest 用戶端
pub struct VkClient {
    client: Client,
    options: VkClientOptions,
}

impl VkClient {
    pub fn new(options: VkClientOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .pool_max_idle_per_host(100)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self { client, options })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.options.api_url.trim_end_matches('/'), method);
        tracing::debug!("Calling {}", method);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[
                ("access_token", self.options.access_token.as_str()),
                ("v", self.options.api_version.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let envelope: Envelope<T> = response.json().await?;
        match (envelope.response, envelope.error) {
            (_, Some(err)) => Err(EtlError::RemoteApiError {
                code: err.error_code,
                message: err.error_msg,
            }),
            (Some(response), None) => Ok(response),
            (None, None) => Err(EtlError::ProcessingError {
                message: format!("{} returned neither response nor error", method),
            }),
        }
    }

    async fn likers(&self, owner: OwnerId, post_id: PostId) -> Result<Vec<UserId>> {
        let page: ItemsPage<UserId> = self
            .call(
                "likes.getList",
                &[
                    ("type", "post".to_string()),
                    ("owner_id", owner.to_string()),
                    ("item_id", post_id.to_string()),
                    ("count", self.options.reactor_page_size.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    async fn reposters(&self, owner: OwnerId, post_id: PostId) -> Result<Vec<UserId>> {
        let page: RepostsPage = self
            .call(
                "wall.getReposts",
                &[
                    ("owner_id", owner.to_string()),
                    ("post_id", post_id.to_string()),
                    ("count", self.options.reactor_page_size.to_string()),
                ],
            )
            .await?;
        Ok(page.profiles.into_iter().map(|p| p.id).collect())
    }
}

#[async_trait]
impl RemoteDataSource for VkClient {
    async fn resolve_community(&self, screen_name: &str) -> Result<Community> {
        let groups: Vec<GroupItem> = self
            .call("groups.getById", &[("group_id", screen_name.to_string())])
            .await?;
        let group = groups.into_iter().next().ok_or_else(|| EtlError::NotFound {
            what: format!("community '{}'", screen_name),
        })?;
        let screen_name = if group.screen_name.is_empty() {
            screen_name.to_string()
        } else {
            group.screen_name
        };
        Ok(Community {
            id: group.id,
            name: group.name,
            screen_name,
        })
    }

    async fn fetch_posts(&self, owner: OwnerId, count: usize, offset: usize) -> Result<Vec<Post>> {
        let page: ItemsPage<Post> = self
            .call(
                "wall.get",
                &[
                    ("owner_id", owner.to_string()),
                    ("count", count.to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    async fn fetch_reactors(
        &self,
        owner: OwnerId,
        post_id: PostId,
        kind: ReactionKind,
    ) -> Result<Vec<UserId>> {
        match kind {
            ReactionKind::Like => self.likers(owner, post_id).await,
            ReactionKind::Repost => self.reposters(owner, post_id).await,
        }
    }

    async fn fetch_roster(&self, screen_names: &[String]) -> Result<Roster> {
        let users: Vec<UserItem> = self
            .call(
                "users.get",
                &[
                    ("user_ids", screen_names.join(",")),
                    ("fields", "domain".to_string()),
                ],
            )
            .await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let domain = if user.domain.is_empty() {
                    format!("id{}", user.id)
                } else {
                    user.domain
                };
                let employee = Employee {
                    id: user.id,
                    name: format!("{} {}", user.first_name, user.last_name)
                        .trim()
                        .to_string(),
                    url: format!("https://vk.com/{}", domain),
                    domain,
                };
                (user.id, employee)
            })
            .collect())
    }
}
