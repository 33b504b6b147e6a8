//! Meeting provider adapters. Daily.co, with a local fallback for development.

pub mod daily;
pub mod local;

pub use daily::DailyAdapter;
pub use local::LocalMeetingAdapter;
