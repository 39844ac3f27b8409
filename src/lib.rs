pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::TomlConfig;

pub use adapters::{LocalStorage, VkClient, VkClientOptions};
pub use app::export::ReportExporter;
pub use crate::core::cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use crate::core::etl::{EtlEngine, ReportRequest};
pub use crate::core::fetcher::{FailurePolicy, ReactionFetcher, ReactionIndex};
pub use crate::core::report::{ActivityReport, DateRangeReport, PostsAnalysis, ReportService, ReportSettings};
pub use utils::error::{EtlError, Result};
