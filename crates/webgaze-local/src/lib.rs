//! Local implementations for webgaze.
//!
//! - `duckduckgo`: HTML-scraping search provider (reqwest + scraper).
//! - `session`: the single shared headless-Chromium session.
//! - `navigate`: navigation guard (load, settle, validate).
//! - `extract`: page HTML to Markdown.
//! - `screenshot`: bounded screenshot size reduction.

pub mod duckduckgo;
pub mod extract;
pub mod navigate;
pub mod screenshot;
pub mod session;

pub use duckduckgo::DuckDuckGoProvider;
pub use session::{BrowserSession, VisitOutcome};
