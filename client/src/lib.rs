pub mod api;
pub mod config;
pub mod navigation;
pub mod pipeline;
pub mod report;
pub mod results;
pub mod upload;
