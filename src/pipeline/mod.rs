//! Discovery pipeline.
//!
//! - [`Orchestrator`]: two-phase crawl of one source
//! - [`SeenStore`]: which references were already notified
//! - [`Scheduler`]: sequential sweeps over the catalog, notifying new listings

pub mod crawl;
pub mod schedule;
pub mod store;

pub use crawl::Orchestrator;
pub use schedule::{Scheduler, SweepReport};
pub use store::SeenStore;
