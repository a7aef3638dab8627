pub mod analytics;
pub mod models;
pub mod server;
pub mod telemetry;
pub mod version;
pub mod web;
