//! HTTP client for the prediction API and the concurrent load driver.

pub mod client;
pub mod driver;

pub use client::ApiClient;
pub use driver::{KindTally, LoadDriver, RunSummary, ScenarioReport, WorkerReport};
