//! Training dataset loading and column access.
//!
//! The historical observation table is a CSV with one row per field
//! measurement and a ground-truth fertilizer label. Loading is purely
//! structural: the file must exist and every required column must be
//! present, but no values are transformed here.
//!
//! The column names are the wire contract with the source dataset and are
//! preserved verbatim, including its misspellings ("Phosphorous",
//! "Temparature").

use crate::error::{LearningError, Result};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Nutrient and environment columns, in the exact order used to build the
/// classifier's feature vector. Reordering invalidates any trained model.
pub const NUMERIC_COLUMNS: [&str; 6] = [
    "Nitrogen",
    "Phosphorous",
    "Potassium",
    "Temparature",
    "Humidity",
    "Moisture",
];

/// Categorical soil descriptor column.
pub const SOIL_TYPE_COLUMN: &str = "Soil Type";

/// Categorical crop descriptor column.
pub const CROP_TYPE_COLUMN: &str = "Crop Type";

/// Ground-truth label column.
pub const LABEL_COLUMN: &str = "Fertilizer Name";

/// Full feature column order shared between training and inference.
///
/// The two `* Enc` entries are the integer codes produced by the fitted
/// category encoders; they always occupy the last two positions.
pub const FEATURE_COLUMNS: [&str; 8] = [
    "Nitrogen",
    "Phosphorous",
    "Potassium",
    "Temparature",
    "Humidity",
    "Moisture",
    "Soil Type Enc",
    "Crop Type Enc",
];

/// Every column the training table must contain.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "Nitrogen",
    "Phosphorous",
    "Potassium",
    "Temparature",
    "Humidity",
    "Moisture",
    "Soil Type",
    "Crop Type",
    "Fertilizer Name",
];

/// Load the labeled training table from a CSV file.
///
/// # Errors
///
/// - [`LearningError::DatasetMissing`] if the file does not exist
/// - [`LearningError::ColumnNotFound`] if a required column is absent
/// - [`LearningError::Polars`] if the CSV cannot be parsed
pub fn load_dataset(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LearningError::DatasetMissing(path.display().to_string()));
    }

    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    validate_columns(&df)?;

    info!(
        rows = df.height(),
        columns = df.width(),
        "loaded training dataset from {}",
        path.display()
    );
    debug!("dataset schema: {:?}", df.schema());

    Ok(df)
}

/// Check that every required column is present.
pub fn validate_columns(df: &DataFrame) -> Result<()> {
    for name in REQUIRED_COLUMNS {
        if df.column(name).is_err() {
            return Err(LearningError::ColumnNotFound(name.to_string()));
        }
    }
    Ok(())
}

/// Extract a numeric column as `f64` values.
///
/// # Errors
///
/// Returns [`LearningError::ColumnNotFound`] if the column is absent and
/// [`LearningError::InvalidValue`] for nulls or non-castable cells.
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| LearningError::ColumnNotFound(name.to_string()))?;
    let series = column.as_materialized_series();
    let casted = series
        .cast(&DataType::Float64)
        .map_err(|e| LearningError::InvalidValue {
            column: name.to_string(),
            row: 0,
            reason: e.to_string(),
        })?;
    let ca = casted.f64()?;

    let mut values = Vec::with_capacity(ca.len());
    for (row, value) in ca.into_iter().enumerate() {
        match value {
            Some(v) => values.push(v),
            None => {
                return Err(LearningError::InvalidValue {
                    column: name.to_string(),
                    row,
                    reason: "missing value".to_string(),
                });
            }
        }
    }
    Ok(values)
}

/// Extract a categorical column as owned strings.
///
/// # Errors
///
/// Returns [`LearningError::ColumnNotFound`] if the column is absent and
/// [`LearningError::InvalidValue`] for nulls or non-string cells.
pub fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df
        .column(name)
        .map_err(|_| LearningError::ColumnNotFound(name.to_string()))?;
    let ca = column
        .as_materialized_series()
        .str()
        .map_err(|e| LearningError::InvalidValue {
            column: name.to_string(),
            row: 0,
            reason: e.to_string(),
        })?;

    let mut values = Vec::with_capacity(ca.len());
    for (row, value) in ca.into_iter().enumerate() {
        match value {
            Some(v) => values.push(v.to_string()),
            None => {
                return Err(LearningError::InvalidValue {
                    column: name.to_string(),
                    row,
                    reason: "missing value".to_string(),
                });
            }
        }
    }
    Ok(values)
}
