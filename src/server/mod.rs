pub mod config;
pub mod insight_service;
pub mod net_rate_enricher;
pub mod overview_broadcaster;
pub mod snapshot;
