pub mod index;

pub use index::{IndexedReport, Nearby, ReportIndex};
