//! Rows as labelled CSV, gzip-compressed a batch at a time.
//!
//! Headers are facet and indicator labels; cells are option labels. Each
//! batch becomes an Arrow [`RecordBatch`] of string columns and is written
//! through the Arrow CSV writer into a gzip stream whose output is drained
//! after every batch.

use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::catalog::MetadataCatalog;
use crate::error::{QueryError, QueryResult};
use crate::query::projection::{DataRow, ProjectedColumn, Projection};

/// Output columns, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CsvColumn {
    TimePeriod,
    TimeIdentifier,
    Facet(ProjectedColumn),
}

/// Converts decoded rows into labelled record batches.
pub struct CsvRenderer<'a> {
    catalog: &'a MetadataCatalog,
    columns: Vec<CsvColumn>,
    schema: SchemaRef,
}

impl<'a> CsvRenderer<'a> {
    pub fn new(catalog: &'a MetadataCatalog, projection: &Projection) -> Self {
        let mut columns = Vec::with_capacity(projection.columns().len() + 1);
        for column in projection.columns() {
            if *column == ProjectedColumn::TimePeriod {
                columns.push(CsvColumn::TimePeriod);
                columns.push(CsvColumn::TimeIdentifier);
            } else {
                columns.push(CsvColumn::Facet(*column));
            }
        }

        let fields: Vec<Field> = columns
            .iter()
            .map(|c| Field::new(header(catalog, *c), DataType::Utf8, true))
            .collect();

        Self {
            catalog,
            columns,
            schema: Arc::new(Schema::new(fields)),
        }
    }

    pub fn headers(&self) -> Vec<String> {
        self.schema.fields().iter().map(|f| f.name().clone()).collect()
    }

    pub fn record_batch(&self, rows: &[DataRow]) -> QueryResult<RecordBatch> {
        let arrays: Vec<ArrayRef> = self
            .columns
            .iter()
            .map(|column| {
                let cells: Vec<Option<String>> =
                    rows.iter().map(|row| self.cell(row, *column)).collect();
                Arc::new(StringArray::from(cells)) as ArrayRef
            })
            .collect();
        RecordBatch::try_new(Arc::clone(&self.schema), arrays)
            .map_err(|e| QueryError::Render(e.to_string()))
    }

    fn cell(&self, row: &DataRow, column: CsvColumn) -> Option<String> {
        let period = || row.time_period.and_then(|k| self.catalog.time_period_by_key(k));
        match column {
            CsvColumn::TimePeriod => period().map(|p| p.key.period()),
            CsvColumn::TimeIdentifier => period().map(|p| p.key.identifier.label()),
            CsvColumn::Facet(ProjectedColumn::TimePeriod) => None,
            CsvColumn::Facet(ProjectedColumn::GeographicLevel) => {
                row.geographic_level.map(|l| l.label().to_string())
            }
            CsvColumn::Facet(ProjectedColumn::Location(level)) => row
                .locations
                .iter()
                .find(|(l, _)| *l == level)
                .and_then(|&(l, key)| self.catalog.location_by_key(l, key))
                .map(|o| o.label.clone()),
            CsvColumn::Facet(ProjectedColumn::Filter(i)) => row
                .filters
                .iter()
                .find(|(f, _)| *f == i)
                .and_then(|&(_, key)| self.catalog.filter_option_by_key(key))
                .map(|o| o.option.label.clone()),
            CsvColumn::Facet(ProjectedColumn::Indicator(i)) => row
                .values
                .iter()
                .find(|(v, _)| *v == i)
                .filter(|(_, value)| !value.is_null())
                .map(|(_, value)| value.to_string()),
        }
    }
}

fn header(catalog: &MetadataCatalog, column: CsvColumn) -> String {
    match column {
        CsvColumn::TimePeriod | CsvColumn::Facet(ProjectedColumn::TimePeriod) => {
            "Time period".to_string()
        }
        CsvColumn::TimeIdentifier => "Time identifier".to_string(),
        CsvColumn::Facet(ProjectedColumn::GeographicLevel) => "Geographic level".to_string(),
        CsvColumn::Facet(ProjectedColumn::Location(level)) => level.label().to_string(),
        CsvColumn::Facet(ProjectedColumn::Filter(i)) => catalog
            .filters()
            .get(i)
            .map(|f| f.label.clone())
            .unwrap_or_default(),
        CsvColumn::Facet(ProjectedColumn::Indicator(i)) => catalog
            .indicators()
            .get(i)
            .map(|ind| ind.label.clone())
            .unwrap_or_default(),
    }
}

/// Gzip-compressed CSV, emitted as chunks as batches are written.
pub struct GzipCsvWriter {
    encoder: GzEncoder<Vec<u8>>,
    header_written: bool,
}

impl Default for GzipCsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl GzipCsvWriter {
    pub fn new() -> Self {
        Self {
            encoder: GzEncoder::new(Vec::new(), Compression::default()),
            header_written: false,
        }
    }

    /// Write one batch and return the compressed bytes produced so far.
    /// The header row precedes the first batch.
    pub fn write_batch(&mut self, batch: &RecordBatch) -> QueryResult<Bytes> {
        {
            let mut writer = WriterBuilder::new()
                .with_header(!self.header_written)
                .build(&mut self.encoder);
            writer
                .write(batch)
                .map_err(|e| QueryError::Render(e.to_string()))?;
        }
        self.header_written = true;
        self.encoder.flush().map_err(render_io)?;
        Ok(Bytes::from(std::mem::take(self.encoder.get_mut())))
    }

    /// Finish the gzip stream and return its trailing bytes.
    pub fn finish(self) -> QueryResult<Bytes> {
        self.encoder.finish().map(Bytes::from).map_err(render_io)
    }
}

fn render_io(e: std::io::Error) -> QueryError {
    QueryError::Render(e.to_string())
}
