//! Job-posting field extraction.
//!
//! Provides:
//! - Browser sessions (headless Chrome, or captured HTML snapshots)
//! - A capped pool of reusable sessions
//! - Per-field selector catalogs with cleaners and validators
//! - The per-attempt extraction session

pub mod browser;
pub mod driver;
pub mod pool;
pub mod redirect;
pub mod session;
pub mod snapshot;
pub mod strategies;

pub use browser::{ChromeFactory, ChromeSession};
pub use driver::{MarkerContext, PageDriver, SessionFactory};
pub use pool::{BrowserPool, PoolStats, PooledSession};
pub use session::ExtractionSession;
pub use snapshot::StaticPage;
pub use strategies::{FieldStrategy, BOILERPLATE};
