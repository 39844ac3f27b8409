pub mod aggregator;
pub mod cache;
pub mod etl;
pub mod fetcher;
pub mod ranking;
pub mod report;

pub use crate::domain::model::{ActivityRecord, Employee, Post, Roster};
pub use crate::domain::ports::{RemoteDataSource, Storage};
pub use crate::utils::error::Result;
