//! Helpers for reading named columns out of warehouse result batches.
//!
//! Warehouses disagree on physical types (`Utf8` vs `Utf8View`, `Int64` vs
//! `UInt64`), so columns are looked up by name and cast to the type the
//! caller wants before downcasting.

use crate::error::{GuardError, Result};
use arrow::array::{Array, ArrayRef, BooleanArray, Date32Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

fn column_as(batch: &RecordBatch, name: &str, data_type: &DataType) -> Result<ArrayRef> {
    let column = batch.column_by_name(name).ok_or_else(|| {
        GuardError::UnexpectedResultShape(format!("result is missing column '{name}'"))
    })?;
    if column.data_type() == data_type {
        return Ok(column.clone());
    }
    cast(column, data_type).map_err(|e| {
        GuardError::UnexpectedResultShape(format!(
            "column '{name}' of type {} can't be read as {data_type}: {e}",
            column.data_type()
        ))
    })
}

macro_rules! typed_column {
    ($fn_name:ident, $array:ty, $data_type:expr) => {
        pub(crate) fn $fn_name(batch: &RecordBatch, name: &str) -> Result<$array> {
            let array = column_as(batch, name, &$data_type)?;
            array
                .as_any()
                .downcast_ref::<$array>()
                .cloned()
                .ok_or_else(|| {
                    GuardError::Internal(format!(
                        "column '{name}' did not downcast to {}",
                        stringify!($array)
                    ))
                })
        }
    };
}

typed_column!(string_column, StringArray, DataType::Utf8);
typed_column!(bool_column, BooleanArray, DataType::Boolean);
typed_column!(int_column, Int64Array, DataType::Int64);
typed_column!(date_column, Date32Array, DataType::Date32);

/// Reads a nullable string value.
pub(crate) fn string_value(array: &StringArray, row: usize) -> Option<String> {
    array.is_valid(row).then(|| array.value(row).to_string())
}
