pub mod crawler;
pub mod orchestrator;
pub mod web;

#[cfg(test)]
mod tests;

pub use crawler::{FetchedPage, PageFetcher};
pub use orchestrator::{CrawlOutcome, Orchestrator};
pub use web::WebDriverFetcher;
