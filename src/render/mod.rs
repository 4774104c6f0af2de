//! Result rendering: surrogate keys back to public identifiers (JSON) or
//! labels (CSV).

pub mod csv;
pub mod json;

pub use self::csv::{CsvRenderer, GzipCsvWriter};
pub use self::json::{DataRowView, JsonRenderer, MetaView, QueryResponse, TimePeriodView};
