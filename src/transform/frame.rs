//! Helpers for moving flattened rows in and out of polars frames.

use crate::transform::error::TransformError;
use crate::transform::flatten::Row;
use polars::prelude::*;
use std::io::Cursor;

/// Builds a frame from rows, unioning their columns.
///
/// Columns absent from a row are null in that row. Types are inferred from
/// every row, so a column holding both integers and floats becomes a float
/// column.
pub fn rows_to_frame(rows: &[Row]) -> Result<DataFrame, TransformError> {
    if rows.iter().all(|row| row.is_empty()) {
        return Ok(DataFrame::empty());
    }

    let mut ndjson = Vec::new();
    for row in rows {
        serde_json::to_writer(&mut ndjson, row)?;
        ndjson.push(b'\n');
    }

    let frame = JsonReader::new(Cursor::new(ndjson))
        .with_json_format(JsonFormat::JsonLines)
        .infer_schema_len(None)
        .finish()?;
    Ok(frame)
}

/// Stacks frames vertically, unioning columns and promoting types.
pub fn concat_frames(frames: Vec<DataFrame>) -> Result<DataFrame, TransformError> {
    let mut frames: Vec<DataFrame> = frames.into_iter().filter(|f| f.height() > 0).collect();
    match frames.len() {
        0 => Ok(DataFrame::empty()),
        1 => Ok(frames.remove(0)),
        _ => {
            let lazy: Vec<LazyFrame> = frames.into_iter().map(IntoLazy::lazy).collect();
            let args = UnionArgs {
                to_supertypes: true,
                ..Default::default()
            };
            Ok(concat_lf_diagonal(lazy, args)?.collect()?)
        }
    }
}

/// `name: dtype` for every column, for diagnostics.
pub fn describe_columns(frame: &DataFrame) -> String {
    frame
        .get_column_names()
        .iter()
        .zip(frame.dtypes())
        .map(|(name, dtype)| format!("{name}: {dtype}"))
        .collect::<Vec<_>>()
        .join(", ")
}
