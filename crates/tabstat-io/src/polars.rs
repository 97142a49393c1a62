//! Conversion between polars data frames and datasets

use crate::error::Result;
use polars::prelude::{Column as FrameColumn, DataFrame, DataType, NamedFrom, Series};
use tabstat_core::{Column, ColumnData, Dataset};

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

/// Numeric columns become numeric, everything else is read as text
pub fn dataset_from_polars(df: &DataFrame) -> Result<Dataset> {
    let mut dataset = Dataset::new();
    for column in df.get_columns() {
        let name = column.name().as_str();
        let data = if is_numeric(column.dtype()) {
            let floats = column.cast(&DataType::Float64)?;
            ColumnData::Numeric(
                floats
                    .f64()?
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect(),
            )
        } else {
            let text = column.cast(&DataType::String)?;
            ColumnData::Text(
                text.str()?
                    .into_iter()
                    .map(|v| v.map(str::to_string))
                    .collect(),
            )
        };
        dataset.push_column(Column::new(name, data))?;
    }
    Ok(dataset)
}

/// Build a data frame with one series per dataset column
pub fn dataset_to_polars(data: &Dataset) -> Result<DataFrame> {
    let series: Vec<FrameColumn> = data
        .columns()
        .iter()
        .map(|column| {
            let name = column.name().into();
            match column.data() {
                ColumnData::Numeric(values) => Series::new(name, values.clone()).into(),
                ColumnData::Text(values) => Series::new(name, values.clone()).into(),
            }
        })
        .collect();
    Ok(DataFrame::new(series)?)
}
