mod time;

pub use time::{current_time_nanos, monotonic_nanos};
