//! Report rows, sinks and the JSON integration log.

pub mod integration;
pub mod reporter;
pub mod row;
pub mod sink;

pub use integration::{Integration, IntegrationLog, MetricSeries, MetricValue};
pub use reporter::Reporter;
pub use row::ReportRow;
pub use sink::{CsvSink, ReportSink};
