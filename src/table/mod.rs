mod error;
mod sample;

use std::ops::Range;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, RecordBatch, Scalar, StringArray,
    TimestampNanosecondArray, UInt32Array,
};
use arrow::compute::kernels::{boolean as boolean_kernels, cmp as cmp_kernels};
use arrow::compute::{
    concat_batches, filter_record_batch, lexsort_to_indices, take_record_batch, SortColumn,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit, TimestampNanosecondType};
use chrono::{DateTime, Utc};

pub use error::TableError;
pub use sample::{Sample, Value};

/// Name of the mandatory first column.
pub const TIMESTAMP: &str = "timestamp";

const UTC: &str = "UTC";

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Nanosecond, Some(UTC.into()))
}

fn to_nanos(t: DateTime<Utc>) -> Result<i64, TableError> {
    t.timestamp_nanos_opt()
        .ok_or(TableError::TimestampOutOfRange(t))
}

fn timestamp_scalar(t: DateTime<Utc>) -> Result<Scalar<TimestampNanosecondArray>, TableError> {
    let array = TimestampNanosecondArray::from(vec![to_nanos(t)?]).with_timezone(UTC);
    Ok(Scalar::new(array))
}

/// Trajectory samples held in an arrow [`RecordBatch`].
///
/// Column 0 is a non-null `Timestamp(Nanosecond, "UTC")` named
/// [`TIMESTAMP`]; every other column is a nullable `Float64` or `Utf8`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    batch: RecordBatch,
}

impl SampleTable {
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Result<Self, TableError> {
        let nanos = timestamps
            .into_iter()
            .map(to_nanos)
            .collect::<Result<Vec<i64>, _>>()?;
        let column = TimestampNanosecondArray::from(nanos).with_timezone(UTC);
        let schema = Schema::new(vec![Field::new(TIMESTAMP, timestamp_type(), false)]);
        let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(column) as ArrayRef])?;
        Ok(Self { batch })
    }

    /// Wraps an existing batch after checking its layout.
    pub fn from_batch(batch: RecordBatch) -> Result<Self, TableError> {
        let schema = batch.schema();
        let fields = schema.fields();
        match fields.first() {
            Some(f)
                if f.name() == TIMESTAMP
                    && *f.data_type() == timestamp_type()
                    && batch.column(0).null_count() == 0 => {}
            _ => return Err(TableError::InvalidTimestamps),
        }
        for (i, field) in fields.iter().enumerate().skip(1) {
            if fields[..i].iter().any(|f| f.name() == field.name()) {
                return Err(TableError::DuplicateColumn(field.name().clone()));
            }
            check_type(field.name(), field.data_type())?;
        }
        Ok(Self { batch })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn with_floats(self, name: &str, values: Vec<Option<f64>>) -> Result<Self, TableError> {
        self.with_array(name, Arc::new(Float64Array::from(values)))
    }

    pub fn with_texts(self, name: &str, values: Vec<Option<String>>) -> Result<Self, TableError> {
        self.with_array(name, Arc::new(StringArray::from(values)))
    }

    pub fn with_array(self, name: &str, array: ArrayRef) -> Result<Self, TableError> {
        if name == TIMESTAMP || self.has_column(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        check_type(name, array.data_type())?;
        self.check_len(name, array.len())?;

        let schema = self.batch.schema();
        let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
        fields.push(Field::new(name, array.data_type().clone(), true));
        let mut columns = self.batch.columns().to_vec();
        columns.push(array);

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        Ok(Self { batch })
    }

    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn timestamp_array(&self) -> &TimestampNanosecondArray {
        self.batch.column(0).as_primitive::<TimestampNanosecondType>()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.timestamp_array()
            .values()
            .iter()
            .map(|ns| DateTime::from_timestamp_nanos(*ns))
            .collect()
    }

    /// Earliest and latest timestamps.
    pub fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let values = self.timestamp_array().values();
        let min = values.iter().min()?;
        let max = values.iter().max()?;
        Some((
            DateTime::from_timestamp_nanos(*min),
            DateTime::from_timestamp_nanos(*max),
        ))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names().any(|n| n == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .skip(1)
            .map(|f| f.name().as_str())
    }

    /// Names of every numeric column, in column order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns()
            .filter(|(_, c)| *c.data_type() == DataType::Float64)
            .map(|(n, _)| n.to_string())
            .collect()
    }

    /// Every column except the timestamps.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &ArrayRef)> {
        self.column_names().zip(self.batch.columns().iter().skip(1))
    }

    pub fn column(&self, name: &str) -> Result<&ArrayRef, TableError> {
        self.columns()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    pub fn floats(&self, name: &str) -> Result<Vec<Option<f64>>, TableError> {
        let array = self
            .column(name)?
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| TableError::NotNumeric(name.to_string()))?;
        Ok(array.iter().collect())
    }

    pub fn texts(&self, name: &str) -> Result<Vec<Option<String>>, TableError> {
        let array = self
            .column(name)?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| TableError::NotText(name.to_string()))?;
        Ok(array.iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Replaces the values of an existing numeric column.
    pub fn set_floats(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<(), TableError> {
        self.check_len(name, values.len())?;
        let schema = self.batch.schema();
        let index = match schema.column_with_name(name) {
            Some((i, field)) if i > 0 && *field.data_type() == DataType::Float64 => i,
            Some((i, _)) if i > 0 => return Err(TableError::NotNumeric(name.to_string())),
            _ => return Err(TableError::ColumnNotFound(name.to_string())),
        };

        let mut columns = self.batch.columns().to_vec();
        columns[index] = Arc::new(Float64Array::from(values));
        self.batch = RecordBatch::try_new(schema, columns)?;
        Ok(())
    }

    /// Keeps the rows where `mask` is true. Missing mask entries count as false.
    pub fn filter(&self, mask: &[bool]) -> Result<Self, TableError> {
        let mask: BooleanArray = (0..self.len())
            .map(|i| Some(mask.get(i).copied().unwrap_or(false)))
            .collect();
        Ok(Self {
            batch: filter_record_batch(&self.batch, &mask)?,
        })
    }

    pub fn take(&self, indices: &[usize]) -> Result<Self, TableError> {
        let indices = UInt32Array::from_iter_values(indices.iter().map(|&i| i as u32));
        Ok(Self {
            batch: take_record_batch(&self.batch, &indices)?,
        })
    }

    /// Zero-copy view of the rows in `range`, clamped to the table.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Self {
            batch: self.batch.slice(start, end - start),
        }
    }

    /// Stable sort of all rows by timestamp.
    pub fn sort_by_timestamp(&self) -> Result<Self, TableError> {
        let row_ids = UInt32Array::from_iter_values(0..self.len() as u32);
        let indices = lexsort_to_indices(
            &[
                SortColumn {
                    values: self.batch.column(0).clone(),
                    options: None,
                },
                SortColumn {
                    values: Arc::new(row_ids),
                    options: None,
                },
            ],
            None,
        )?;
        Ok(Self {
            batch: take_record_batch(&self.batch, &indices)?,
        })
    }

    /// Rows with `start <= timestamp <= stop`, in their current order.
    pub fn time_window(&self, start: DateTime<Utc>, stop: DateTime<Utc>) -> Result<Self, TableError> {
        let timestamps = self.timestamp_array();
        let after_start = cmp_kernels::gt_eq(timestamps, &timestamp_scalar(start)?)?;
        let before_stop = cmp_kernels::lt_eq(timestamps, &timestamp_scalar(stop)?)?;
        let mask = boolean_kernels::and(&after_start, &before_stop)?;
        Ok(Self {
            batch: filter_record_batch(&self.batch, &mask)?,
        })
    }

    pub fn row(&self, index: usize) -> Option<Sample> {
        if index >= self.len() {
            return None;
        }
        Some(Sample {
            timestamp: DateTime::from_timestamp_nanos(self.timestamp_array().value(index)),
            values: self
                .columns()
                .map(|(n, c)| (n.to_string(), Value::from_array(c.as_ref(), index)))
                .collect(),
        })
    }

    /// Appends tables one after another. All parts must share the same columns.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a SampleTable>) -> Result<Self, TableError> {
        let parts: Vec<&SampleTable> = parts.into_iter().collect();
        let Some(first) = parts.first() else {
            return Self::new(Vec::new());
        };
        let schema = first.batch.schema();
        if parts.iter().any(|p| p.batch.schema() != schema) {
            return Err(TableError::SchemaMismatch);
        }
        Ok(Self {
            batch: concat_batches(&schema, parts.iter().map(|p| &p.batch))?,
        })
    }

    fn check_len(&self, name: &str, found: usize) -> Result<(), TableError> {
        if found != self.len() {
            return Err(TableError::LengthMismatch {
                name: name.to_string(),
                expected: self.len(),
                found,
            });
        }
        Ok(())
    }
}

fn check_type(name: &str, data_type: &DataType) -> Result<(), TableError> {
    match data_type {
        DataType::Float64 | DataType::Utf8 => Ok(()),
        other => Err(TableError::UnsupportedType {
            name: name.to_string(),
            data_type: other.clone(),
        }),
    }
}

/// Signed number of seconds from `start` to `t`, with nanosecond precision.
pub(crate) fn seconds_between(start: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    let delta = t - start;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use chrono::{Duration, TimeZone};

    fn times(offsets: &[i64]) -> Vec<DateTime<Utc>> {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        offsets.iter().map(|s| t0 + Duration::seconds(*s)).collect()
    }

    fn sample_table() -> SampleTable {
        SampleTable::new(times(&[2, 0, 1]))
            .unwrap()
            .with_floats("altitude", vec![Some(300.0), Some(100.0), None])
            .unwrap()
            .with_texts(
                "callsign",
                vec![Some("AFR12".into()), Some("AFR12".into()), None],
            )
            .unwrap()
    }

    #[test]
    fn test_rejects_mismatched_length() {
        let err = SampleTable::new(times(&[0, 1]))
            .unwrap()
            .with_floats("altitude", vec![Some(1.0)])
            .unwrap_err();
        assert!(matches!(
            err,
            TableError::LengthMismatch { ref name, expected: 2, found: 1 } if name == "altitude"
        ));
    }

    #[test]
    fn test_rejects_duplicate_column() {
        let err = sample_table()
            .with_floats("altitude", vec![None, None, None])
            .unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(ref n) if n == "altitude"));
        assert!(matches!(
            sample_table().with_floats(TIMESTAMP, vec![None, None, None]),
            Err(TableError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_rejects_other_arrow_types() {
        let counts: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3]));
        assert!(matches!(
            sample_table().with_array("count", counts),
            Err(TableError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_from_batch_checks_layout() {
        let table = sample_table();
        let rebuilt = SampleTable::from_batch(table.batch().clone()).unwrap();
        assert_eq!(rebuilt, table);

        let without_time = table.batch().project(&[1, 2]).unwrap();
        assert!(matches!(
            SampleTable::from_batch(without_time),
            Err(TableError::InvalidTimestamps)
        ));
    }

    #[test]
    fn test_sort_moves_every_column() {
        let sorted = sample_table().sort_by_timestamp().unwrap();
        assert_eq!(sorted.timestamps(), times(&[0, 1, 2]));
        assert_eq!(
            sorted.floats("altitude").unwrap(),
            vec![Some(100.0), None, Some(300.0)]
        );
        assert_eq!(sorted.texts("callsign").unwrap()[1], None);
    }

    #[test]
    fn test_sort_is_stable() {
        let table = SampleTable::new(times(&[5, 0, 5, 0]))
            .unwrap()
            .with_floats("row", vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0)])
            .unwrap();
        let sorted = table.sort_by_timestamp().unwrap();
        assert_eq!(
            sorted.floats("row").unwrap(),
            vec![Some(1.0), Some(3.0), Some(0.0), Some(2.0)]
        );
    }

    #[test]
    fn test_column_errors() {
        let table = sample_table();
        assert!(matches!(
            table.floats("speed"),
            Err(TableError::ColumnNotFound(ref n)) if n == "speed"
        ));
        assert!(matches!(
            table.floats("callsign"),
            Err(TableError::NotNumeric(ref n)) if n == "callsign"
        ));
        assert!(matches!(table.floats(TIMESTAMP), Err(TableError::ColumnNotFound(_))));
        assert_eq!(table.numeric_columns(), vec!["altitude".to_string()]);
    }

    #[test]
    fn test_set_floats_replaces_values() {
        let mut table = sample_table();
        table
            .set_floats("altitude", vec![Some(1.0), Some(2.0), Some(3.0)])
            .unwrap();
        assert_eq!(
            table.floats("altitude").unwrap(),
            vec![Some(1.0), Some(2.0), Some(3.0)]
        );
        assert!(matches!(
            table.set_floats("callsign", vec![None, None, None]),
            Err(TableError::NotNumeric(_))
        ));
    }

    #[test]
    fn test_time_window_is_inclusive() {
        let table = sample_table().sort_by_timestamp().unwrap();
        let t = times(&[0, 1, 2]);
        let window = table.time_window(t[1], t[2]).unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window.timestamps()[0], t[1]);
    }

    #[test]
    fn test_sub_microsecond_timestamps_survive() {
        let t = times(&[0])[0] + Duration::nanoseconds(1);
        let table = SampleTable::new(vec![t]).unwrap();
        assert_eq!(table.timestamps(), vec![t]);
        assert_eq!(table.time_window(t, t).unwrap().len(), 1);
        assert_eq!(seconds_between(t - Duration::nanoseconds(1), t), 1e-9);
    }

    #[test]
    fn test_filter_and_take() {
        let table = sample_table();
        let kept = table.filter(&[true, false]).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.floats("altitude").unwrap(), vec![Some(300.0)]);

        let picked = table.take(&[2, 2]).unwrap();
        assert_eq!(picked.texts("callsign").unwrap(), vec![None, None]);
    }

    #[test]
    fn test_slice_and_concat_roundtrip() {
        let table = sample_table();
        let parts = [table.slice(0..1), table.slice(1..3)];
        assert_eq!(SampleTable::concat(&parts).unwrap(), table);
        assert!(table.slice(5..9).is_empty());

        let other = SampleTable::new(times(&[9])).unwrap();
        assert!(matches!(
            SampleTable::concat([&table, &other]),
            Err(TableError::SchemaMismatch)
        ));
    }

    #[test]
    fn test_row_values() {
        let row = sample_table().row(2).unwrap();
        assert!(row.get("altitude").unwrap().is_null());
        assert_eq!(row.get("callsign"), Some(&Value::Null));
        let first = sample_table().row(0).unwrap();
        assert_eq!(first.get("callsign").and_then(Value::as_str), Some("AFR12"));
        assert!(sample_table().row(3).is_none());
    }
}
