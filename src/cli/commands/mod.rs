//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod import;
mod search;
mod serve;
mod sources;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use import::run_import;
pub use search::run_search;
pub use serve::{router, run_serve};
pub use sources::run_sources;
