pub mod api;
pub mod config;
pub mod export;
pub mod ipc;
pub mod model;
pub mod roster;
pub mod summary;
