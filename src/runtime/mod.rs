pub mod callbacks;
pub mod http_store;
pub mod jobs;
pub mod logging;
pub mod memory;
pub mod orchestrator;
pub mod sqlite;
pub mod store;
pub mod types;
