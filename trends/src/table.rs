
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, StringArray, TimestampSecondArray,
};
use arrow::compute::{cast, sum};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use std::sync::Arc;

use crate::client::MAX_PHRASES_PER_REQUEST;
use crate::models::{GeoMapEntry, InterestSeries, TimelinePoint};

pub const DATE_COLUMN: &str = "date";
pub const PARTIAL_COLUMN: &str = "isPartial";
pub const GEO_NAME_COLUMN: &str = "geoName";
pub const GEO_CODE_COLUMN: &str = "geoCode";

/// Builds the raw time series: `date`, one Float64 column per phrase, then `isPartial`.
pub fn timeline_batch(phrases: &[String], points: &[TimelinePoint]) -> Result<RecordBatch> {
    let mut fields = vec![Field::new(
        DATE_COLUMN,
        DataType::Timestamp(TimeUnit::Second, None),
        true,
    )];
    let dates: Vec<Option<i64>> = points.iter().map(|p| p.time.parse::<i64>().ok()).collect();
    let mut columns: Vec<ArrayRef> = vec![Arc::new(TimestampSecondArray::from(dates))];

    for (idx, phrase) in phrases.iter().enumerate() {
        fields.push(Field::new(phrase, DataType::Float64, true));
        let values: Vec<Option<f64>> = points.iter().map(|p| p.value.get(idx).copied()).collect();
        columns.push(Arc::new(Float64Array::from(values)));
    }

    fields.push(Field::new(PARTIAL_COLUMN, DataType::Boolean, false));
    let partial: Vec<bool> = points.iter().map(|p| p.is_partial).collect();
    columns.push(Arc::new(BooleanArray::from(partial)));

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Builds the raw region table: `geoName`, `geoCode`, one Float64 column per phrase.
pub fn region_batch(phrases: &[String], entries: &[GeoMapEntry]) -> Result<RecordBatch> {
    let mut fields = vec![
        Field::new(GEO_NAME_COLUMN, DataType::Utf8, false),
        Field::new(GEO_CODE_COLUMN, DataType::Utf8, false),
    ];
    let names: Vec<&str> = entries.iter().map(|e| e.geo_name.as_str()).collect();
    let codes: Vec<&str> = entries.iter().map(|e| e.geo_code.as_str()).collect();
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(names)),
        Arc::new(StringArray::from(codes)),
    ];

    for (idx, phrase) in phrases.iter().enumerate() {
        fields.push(Field::new(phrase, DataType::Float64, true));
        let values: Vec<Option<f64>> = entries.iter().map(|e| e.value.get(idx).copied()).collect();
        columns.push(Arc::new(Float64Array::from(values)));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Averages each requested phrase over all time buckets.
///
/// Only the first five phrases are considered. A phrase without a column scores zero.
/// Returns `Ok(None)` when the table is absent or has no rows.
pub fn average_interest(
    raw: Option<&RecordBatch>,
    phrases: &[String],
) -> Result<Option<InterestSeries>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.num_rows() == 0 {
        return Ok(None);
    }

    let data = drop_partial_column(raw)?;
    let mut averages = InterestSeries::new();
    for phrase in phrases.iter().take(MAX_PHRASES_PER_REQUEST) {
        let mean = match data.column_by_name(phrase) {
            Some(column) => column_mean(column.as_ref())?,
            None => 0.0,
        };
        averages.insert(phrase.clone(), mean);
    }

    Ok(Some(averages))
}

/// Highest-scoring regions for one phrase, descending, ties in table order.
pub fn top_regions(table: &RecordBatch, phrase: &str, limit: usize) -> Result<Vec<(String, f64)>> {
    let names = table
        .column_by_name(GEO_NAME_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::MalformedResponse("region table lacks geoName".to_string()))?;
    let values = match table.column_by_name(phrase) {
        Some(column) => cast(column.as_ref(), &DataType::Float64)?,
        None => return Ok(Vec::new()),
    };
    let values = as_f64(values.as_ref())?;

    let mut regions: Vec<(String, f64)> = (0..table.num_rows())
        .map(|row| {
            let value = if values.is_null(row) { 0.0 } else { values.value(row) };
            (names.value(row).to_string(), value)
        })
        .collect();
    regions.sort_by(|a, b| b.1.total_cmp(&a.1));
    regions.truncate(limit);
    Ok(regions)
}

fn drop_partial_column(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let keep: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| field.name() != PARTIAL_COLUMN)
        .map(|(idx, _)| idx)
        .collect();
    Ok(batch.project(&keep)?)
}

fn column_mean(column: &dyn Array) -> Result<f64> {
    let values = cast(column, &DataType::Float64)?;
    let values = as_f64(values.as_ref())?;
    let count = values.len() - values.null_count();
    if count == 0 {
        return Ok(0.0);
    }
    Ok(sum(values).unwrap_or(0.0) / count as f64)
}

fn as_f64(array: &dyn Array) -> Result<&Float64Array> {
    array
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| Error::MalformedResponse("expected a Float64 column".to_string()))
}
