use crate::app::export::ReportExporter;
use crate::core::report::{normalize_count, ReportService};
use crate::domain::ports::{RemoteDataSource, Storage};
use crate::utils::error::{EtlError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRequest {
    Activity { count: usize },
    Posts { count: usize },
    Range { from: String, to: String },
    ClearCache,
}

impl ReportRequest {
    /// 解析互動模式的一行指令；空行回傳 `None`
    ///
    /// `activity [n]`, `posts [n]`, `range <DD.MM.YYYY> <DD.MM.YYYY>`, `clear`
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = parts.collect();

        let count = |args: &[&str]| -> Result<usize> {
            match args.first() {
                None => Ok(normalize_count(None)),
                Some(raw) => raw
                    .parse::<usize>()
                    .map(|n| normalize_count(Some(n)))
                    .map_err(|_| EtlError::ProcessingError {
                        message: format!("'{}' is not a post count", raw),
                    }),
            }
        };

        let request = match command.to_ascii_lowercase().as_str() {
            "activity" => ReportRequest::Activity { count: count(args.as_slice())? },
            "posts" => ReportRequest::Posts { count: count(args.as_slice())? },
            "range" => match args.as_slice() {
                [from, to] => ReportRequest::Range {
                    from: from.to_string(),
                    to: to.to_string(),
                },
                _ => {
                    return Err(EtlError::ProcessingError {
                        message: "usage: range <DD.MM.YYYY> <DD.MM.YYYY>".to_string(),
                    })
                }
            },
            "clear" | "clear_cache" => ReportRequest::ClearCache,
            other => {
                return Err(EtlError::ProcessingError {
                    message: format!("unknown command '{}'", other),
                })
            }
        };
        Ok(Some(request))
    }
}

/// 報表流程：取資料 (快取或遠端) → 彙整 → 輸出
pub struct EtlEngine<S: RemoteDataSource, T: Storage> {
    service: ReportService<S>,
    exporter: ReportExporter<T>,
}

impl<S: RemoteDataSource, T: Storage> EtlEngine<S, T> {
    pub fn new(service: ReportService<S>, exporter: ReportExporter<T>) -> Self {
        Self { service, exporter }
    }

    pub fn service(&self) -> &ReportService<S> {
        &self.service
    }

    /// 回傳輸出檔名；清除快取時為 `None`
    pub async fn run(&self, request: &ReportRequest) -> Result<Option<String>> {
        match request {
            ReportRequest::Activity { count } => {
                let report = self.service.employee_activity(*count).await?;
                for (rank, record) in report.records.iter().enumerate() {
                    let marks: String = record.marks().iter().map(|m| m.symbol()).collect();
                    tracing::info!(
                        "{:>2}. {} {} (❤️ {} 🔁 {} = {})",
                        rank + 1,
                        record.employee.name,
                        marks,
                        record.stats().likes(),
                        record.stats().reposts(),
                        record.total()
                    );
                }
                self.exporter.export_activity(&report).await.map(Some)
            }
            ReportRequest::Posts { count } => {
                let report = self.service.posts_analysis(*count).await?;
                tracing::info!(
                    "📊 {} posts: {} views, {} likes, {} reposts, {} comments",
                    report.stats.len(),
                    report.totals.views,
                    report.totals.likes,
                    report.totals.reposts,
                    report.totals.comments
                );
                self.exporter.export_posts(&report).await.map(Some)
            }
            ReportRequest::Range { from, to } => {
                let report = self.service.date_range(from, to).await?;
                tracing::info!(
                    "📊 {}: {} posts, avg {} views / {} likes",
                    report.period,
                    report.count(),
                    report.averages.views,
                    report.averages.likes
                );
                self.exporter.export_range(&report).await.map(Some)
            }
            ReportRequest::ClearCache => {
                self.service.clear_cache();
                Ok(None)
            }
        }
    }
}
