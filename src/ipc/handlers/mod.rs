pub mod analytics;
pub mod attendance;
pub mod comments;
pub mod core;
pub mod dashboard;
pub mod directory;
pub mod marks;
pub mod reports;
