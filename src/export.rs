//! CSV export of the report table.

use csv::Writer;
use std::path::Path;

use crate::error::ExportError;
use crate::report::ReportTable;

/// Fixed export header: the date column followed by one column per metric,
/// in report order.
pub const CSV_HEADER: [&str; 7] = [
    "Date",
    "Sessions",
    "Total Users",
    "Screen Pageviews",
    "Conversions",
    "Event Count",
    "User Engagement Duration",
];

/// Render the table as a CSV document. Values pass through verbatim.
pub fn render(table: &ReportTable) -> Result<String, ExportError> {
    let mut wtr = Writer::from_writer(vec![]);

    wtr.write_record(CSV_HEADER)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(1 + row.values.len());
        record.push(row.date.as_str());
        record.extend(row.values.iter().map(|v| v.as_str()));
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(data)?)
}

/// Render and overwrite the snapshot file in place. Concurrent requests are
/// last-writer-wins; no locking is performed.
pub fn write_file<P: AsRef<Path>>(path: P, table: &ReportTable) -> Result<(), ExportError> {
    let content = render(table)?;
    std::fs::write(path, content)?;
    Ok(())
}
