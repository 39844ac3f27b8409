use crate::core::aggregator::aggregate;
use crate::core::cache::{cache_key, TtlCache};
use crate::core::fetcher::{FailurePolicy, ReactionFetcher, DEFAULT_CONCURRENCY_LIMIT};
use crate::core::ranking::rank;
use crate::domain::model::{ActivityRecord, Community, OwnerId, Post, PostId, Roster};
use crate::domain::ports::RemoteDataSource;
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_POST_COUNT: usize = 30;
pub const MAX_POST_COUNT: usize = 100;
pub const RANGE_PAGE_SIZE: usize = 100;
pub const TEXT_PREVIEW_CHARS: usize = 150;

const ACTIVITY_OPERATION: &str = "employee_activity";
const POSTS_OPERATION: &str = "posts_analysis";

/// 超出 1..=100 的筆數一律回到預設值
pub fn normalize_count(requested: Option<usize>) -> usize {
    match requested {
        Some(n) if (1..=MAX_POST_COUNT).contains(&n) => n,
        _ => DEFAULT_POST_COUNT,
    }
}

pub fn post_link(owner: OwnerId, post_id: PostId) -> String {
    format!("https://vk.com/wall{}_{}", owner, post_id)
}

fn timestamp(unix: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(unix, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

pub fn format_short_date(unix: i64) -> String {
    timestamp(unix).format("%d.%m").to_string()
}

pub fn format_full_date(unix: i64) -> String {
    timestamp(unix).format("%d.%m.%Y %H:%M").to_string()
}

pub fn preview_text(text: &str) -> String {
    match text.char_indices().nth(TEXT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityReport {
    pub records: Vec<ActivityRecord>,
    pub post_dates: Vec<String>,
    pub post_links: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostStat {
    pub date: String,
    pub link: String,
    pub text: String,
    pub views: u64,
    pub likes: u64,
    pub reposts: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct EngagementTotals {
    pub views: u64,
    pub likes: u64,
    pub reposts: u64,
    pub comments: u64,
}

impl EngagementTotals {
    fn add(&mut self, stat: &PostStat) {
        self.views += stat.views;
        self.likes += stat.likes;
        self.reposts += stat.reposts;
        self.comments += stat.comments;
    }

    /// 整數平均，沒有貼文時為 0
    pub fn average(&self, count: usize) -> EngagementTotals {
        if count == 0 {
            return EngagementTotals::default();
        }
        let n = count as u64;
        EngagementTotals {
            views: self.views / n,
            likes: self.likes / n,
            reposts: self.reposts / n,
            comments: self.comments / n,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostsAnalysis {
    pub stats: Vec<PostStat>,
    pub totals: EngagementTotals,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateRangeReport {
    pub period: String,
    pub stats: Vec<PostStat>,
    pub totals: EngagementTotals,
    pub averages: EngagementTotals,
}

impl DateRangeReport {
    pub fn count(&self) -> usize {
        self.stats.len()
    }
}

#[derive(Debug, Clone)]
pub enum CachedReport {
    Activity(Arc<ActivityReport>),
    Posts(Arc<PostsAnalysis>),
}

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub concurrency_limit: usize,
    pub failure_policy: FailurePolicy,
    pub activity_ttl: Duration,
    pub posts_ttl: Duration,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            failure_policy: FailurePolicy::Degrade,
            activity_ttl: Duration::from_secs(5 * 60),
            posts_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// 報表服務：所有請求共用同一份名單、社群資訊與快取
pub struct ReportService<S: RemoteDataSource> {
    source: Arc<S>,
    community: Community,
    roster: Arc<Roster>,
    fetcher: ReactionFetcher<S>,
    cache: TtlCache<CachedReport>,
    settings: ReportSettings,
}

impl<S: RemoteDataSource> ReportService<S> {
    pub fn new(
        source: Arc<S>,
        community: Community,
        roster: Roster,
        cache: TtlCache<CachedReport>,
        settings: ReportSettings,
    ) -> Self {
        let fetcher = ReactionFetcher::new(Arc::clone(&source), settings.concurrency_limit);
        Self {
            source,
            community,
            roster: Arc::new(roster),
            fetcher,
            cache,
            settings,
        }
    }

    /// 啟動時解析社群並載入員工名單，任何一步失敗都直接回傳錯誤
    pub async fn bootstrap(
        source: Arc<S>,
        community_screen_name: &str,
        employees: &[String],
        settings: ReportSettings,
    ) -> Result<Self> {
        let community = source.resolve_community(community_screen_name).await?;
        let roster = source.fetch_roster(employees).await?;
        if roster.is_empty() {
            return Err(EtlError::NotFound {
                what: "any roster employee".to_string(),
            });
        }

        tracing::info!("✅ Community: {} (ID: {})", community.name, community.id);
        tracing::info!("✅ Employees: {}", roster.len());

        Ok(Self::new(source, community, roster, TtlCache::new(), settings))
    }

    pub fn community(&self) -> &Community {
        &self.community
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub async fn employee_activity(&self, count: usize) -> Result<Arc<ActivityReport>> {
        let key = cache_key(ACTIVITY_OPERATION, count);
        if let Some(CachedReport::Activity(report)) = self.cache.get(&key) {
            tracing::info!("📦 Employee activity for {} posts served from cache", count);
            return Ok(report);
        }

        tracing::info!("🔄 Loading employee activity for {} posts", count);
        let started = Instant::now();
        let owner = self.community.wall_owner();

        let posts = self.source.fetch_posts(owner, count, 0).await?;
        let post_ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();

        let index = self.fetcher.fetch(owner, &post_ids).await;
        let (likes, reposts) = index.resolve(self.settings.failure_policy)?;

        let records = rank(aggregate(&posts, &self.roster, &likes, &reposts));
        let report = Arc::new(ActivityReport {
            records,
            post_dates: posts.iter().map(|p| format_short_date(p.date)).collect(),
            post_links: posts.iter().map(|p| post_link(owner, p.id)).collect(),
            count,
        });

        self.cache.set(
            key,
            CachedReport::Activity(Arc::clone(&report)),
            self.settings.activity_ttl,
        );
        tracing::info!(
            "✅ Employee activity for {} posts loaded in {:?}",
            posts.len(),
            started.elapsed()
        );
        Ok(report)
    }

    pub async fn posts_analysis(&self, count: usize) -> Result<Arc<PostsAnalysis>> {
        let key = cache_key(POSTS_OPERATION, count);
        if let Some(CachedReport::Posts(report)) = self.cache.get(&key) {
            tracing::info!("📦 Posts analysis for {} posts served from cache", count);
            return Ok(report);
        }

        let owner = self.community.wall_owner();
        let posts = self.source.fetch_posts(owner, count, 0).await?;
        let (stats, totals) = summarize(owner, &posts);

        let report = Arc::new(PostsAnalysis {
            stats,
            totals,
            count,
        });
        self.cache.set(
            key,
            CachedReport::Posts(Arc::clone(&report)),
            self.settings.posts_ttl,
        );
        Ok(report)
    }

    /// `from` / `to` 格式為 DD.MM.YYYY，結束日包含到當天 23:59
    pub async fn date_range(&self, from: &str, to: &str) -> Result<DateRangeReport> {
        let start = parse_day(from)?;
        let end = parse_day(to)? + ChronoDuration::hours(23) + ChronoDuration::minutes(59);
        let start_ts = start.timestamp();
        let end_ts = end.timestamp();

        let owner = self.community.wall_owner();
        let mut selected = Vec::new();
        let mut offset = 0;

        'pages: loop {
            let page = match self.source.fetch_posts(owner, RANGE_PAGE_SIZE, offset).await {
                Ok(page) => page,
                Err(e) if offset == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!("⚠️ Stopping date range scan at offset {}: {}", offset, e);
                    break;
                }
            };
            if page.is_empty() {
                break;
            }

            for post in page {
                if post.date > end_ts {
                    continue;
                }
                if post.date < start_ts {
                    break 'pages;
                }
                selected.push(post);
            }
            offset += RANGE_PAGE_SIZE;
        }

        tracing::info!("📅 {} posts between {} and {}", selected.len(), from, to);

        let (stats, totals) = summarize(owner, &selected);
        let averages = totals.average(stats.len());
        Ok(DateRangeReport {
            period: format!("{} – {}", from, to),
            stats,
            totals,
            averages,
        })
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("🗑️ Cache cleared");
    }
}

fn parse_day(value: &str) -> Result<DateTime<Utc>> {
    NaiveDate::parse_from_str(value.trim(), "%d.%m.%Y")
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| EtlError::InvalidDateError {
            value: value.to_string(),
        })
}

fn summarize(owner: OwnerId, posts: &[Post]) -> (Vec<PostStat>, EngagementTotals) {
    let mut totals = EngagementTotals::default();
    let stats = posts
        .iter()
        .map(|post| {
            let stat = PostStat {
                date: format_full_date(post.date),
                link: post_link(owner, post.id),
                text: preview_text(&post.text),
                views: post.views.count,
                likes: post.likes.count,
                reposts: post.reposts.count,
                comments: post.comments.count,
            };
            totals.add(&stat);
            stat
        })
        .collect();
    (stats, totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_count() {
        assert_eq!(normalize_count(None), 30);
        assert_eq!(normalize_count(Some(0)), 30);
        assert_eq!(normalize_count(Some(1)), 1);
        assert_eq!(normalize_count(Some(100)), 100);
        assert_eq!(normalize_count(Some(101)), 30);
    }

    #[test]
    fn test_preview_text_is_char_safe() {
        let short = "Привет";
        assert_eq!(preview_text(short), short);

        let long: String = "ж".repeat(200);
        let preview = preview_text(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), TEXT_PREVIEW_CHARS + 3);

        let exact: String = "a".repeat(TEXT_PREVIEW_CHARS);
        assert_eq!(preview_text(&exact), exact);
    }

    #[test]
    fn test_date_formats() {
        // 2024-02-23 14:00:00 UTC
        assert_eq!(format_short_date(1_708_696_800), "23.02");
        assert_eq!(format_full_date(1_708_696_800), "23.02.2024 14:00");
    }

    #[test]
    fn test_parse_day() {
        let day = parse_day("01.03.2024").unwrap();
        assert_eq!(day.timestamp(), 1_709_251_200);
        assert!(matches!(
            parse_day("2024-03-01"),
            Err(EtlError::InvalidDateError { .. })
        ));
    }

    #[test]
    fn test_averages() {
        let totals = EngagementTotals {
            views: 10,
            likes: 5,
            reposts: 3,
            comments: 0,
        };
        assert_eq!(
            totals.average(3),
            EngagementTotals {
                views: 3,
                likes: 1,
                reposts: 1,
                comments: 0
            }
        );
        assert_eq!(totals.average(0), EngagementTotals::default());
    }

    #[test]
    fn test_post_link() {
        assert_eq!(post_link(-12345, 678), "https://vk.com/wall-12345_678");
    }
}
