//! Application services orchestrating the domain through ports.

mod analytics;
mod posts;
mod scheduler;

pub use analytics::{
    AnalyticsService, DEFAULT_SUMMARY_DAYS, DEFAULT_TOP_LIMIT, MAX_DAYS, MAX_LIST_LIMIT,
    MAX_TOP_LIMIT,
};
pub use posts::{NewPost, PostChanges, PostService, ScheduleChange};
pub use scheduler::{
    DEFAULT_TICK_INTERVAL, PublishScheduler, SchedulerSettings, SchedulerStats, TickReport,
};
