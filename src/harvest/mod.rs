//! Log Harvest Module
//!
//! Discovers the previous hour's transaction log, parses each line into a
//! structured record, and delivers each record to the reporting endpoint.
//! Pure per-round task logic with no consensus awareness.

mod pipeline;
mod record;

pub use pipeline::{HarvestReport, LogHarvestPipeline};
pub use record::LogRecord;
