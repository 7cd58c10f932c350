use crate::transform::error::TransformError;
use crate::transform::flatten::flatten_record;
use crate::transform::frame::rows_to_frame;
use crate::weather::types::CurrentWeather;
use polars::prelude::*;

pub const TIMESTAMP_COLUMN: &str = "dt";
pub const TIMESTAMP_TEXT_COLUMN: &str = "dt_txt";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Turns one current-weather record into a single-row frame.
///
/// When the record carries a `dt` epoch timestamp, a `dt_txt` column with the
/// same instant rendered as UTC `YYYY-MM-DD HH:MM:SS` is appended; `dt`
/// itself is kept.
pub fn transform_current(record: &CurrentWeather) -> Result<DataFrame, TransformError> {
    let row = flatten_record(record.fields());
    let frame = rows_to_frame(std::slice::from_ref(&row))?;

    if frame.column(TIMESTAMP_COLUMN).is_err() {
        return Ok(frame);
    }

    let frame = frame
        .lazy()
        .with_column(epoch_seconds_to_text(col(TIMESTAMP_COLUMN)).alias(TIMESTAMP_TEXT_COLUMN))
        .collect()?;
    Ok(frame)
}

fn epoch_seconds_to_text(seconds: Expr) -> Expr {
    (seconds.cast(DataType::Int64) * lit(1000i64))
        .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
        .dt()
        .strftime(TIMESTAMP_FORMAT)
}
