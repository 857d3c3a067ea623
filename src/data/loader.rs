use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{DISH_NAME_COLUMN, Dataset, Dish, Feature, NutrientVector};
use crate::error::Error;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a nutrition dataset from a file.  Dispatch by extension.
///
/// Every format needs a `Dish Name` column and the four nutrient columns
/// (`Calories (kcal)`, `Protein (g)`, `Carbohydrates (g)`, `Free Sugar (g)`).
/// Empty or null nutrient cells count as 0; negative ones are rejected.
///
/// Supported formats:
/// * `.csv`     – header row with column names (default)
/// * `.json`    – `[{ "Dish Name": "...", "Calories (kcal)": 120.0, ... }, ...]`
/// * `.parquet` – string name column and numeric nutrient columns
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" | "" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading dataset {}", path.display()))?;

    log::info!(
        "Loaded {} dishes ({} columns) from {}",
        dataset.len(),
        dataset.column_names().len(),
        path.display()
    );
    Ok(dataset)
}

fn nutrients_from_cells(cells: [f64; 4], row: usize) -> Result<NutrientVector> {
    NutrientVector::try_from_array(cells).with_context(|| format!("Row {row}"))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

/// Parse CSV from any reader; split out so tests can feed in-memory text.
pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Dataset> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let name_idx = column_index(&headers, DISH_NAME_COLUMN)?;
    let mut feature_idx = [0usize; 4];
    for (slot, feature) in feature_idx.iter_mut().zip(Feature::ALL) {
        *slot = column_index(&headers, feature.column())?;
    }

    let mut dishes = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let name = record.get(name_idx).unwrap_or("").trim().to_string();
        let mut cells = [0.0; 4];
        for (cell, (&idx, feature)) in cells.iter_mut().zip(feature_idx.iter().zip(Feature::ALL)) {
            *cell = parse_cell(record.get(idx).unwrap_or(""), row_no, feature)?;
        }

        dishes.push(Dish::new(name, nutrients_from_cells(cells, row_no)?));
    }

    Ok(Dataset::new(dishes, headers))
}

fn column_index(headers: &[String], column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| Error::MissingColumn(column.to_string()).into())
}

fn parse_cell(s: &str, row: usize, feature: Feature) -> Result<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(0.0);
    }
    s.parse::<f64>()
        .with_context(|| format!("Row {row}, {feature}: '{s}' is not a number"))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "Dish Name": "Dal", "Calories (kcal)": 120.5, "Protein (g)": 7.2,
///     "Carbohydrates (g)": 18.0, "Free Sugar (g)": 1.1 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut column_names: Vec<String> = Vec::new();
    let mut dishes = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        for key in obj.keys() {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
        }

        let name = obj
            .get(DISH_NAME_COLUMN)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        let mut cells = [0.0; 4];
        for (cell, feature) in cells.iter_mut().zip(Feature::ALL) {
            *cell = json_to_f64(obj.get(feature.column()), i, feature)?;
        }

        dishes.push(Dish::new(name, nutrients_from_cells(cells, i)?));
    }

    let required = std::iter::once(DISH_NAME_COLUMN).chain(Feature::ALL.iter().map(|f| f.column()));
    if !dishes.is_empty() {
        for column in required {
            if !column_names.iter().any(|c| c == column) {
                return Err(Error::MissingColumn(column.to_string()).into());
            }
        }
    }

    Ok(Dataset::new(dishes, column_names))
}

fn json_to_f64(val: Option<&JsonValue>, row: usize, feature: Feature) -> Result<f64> {
    match val {
        None | Some(JsonValue::Null) => Ok(0.0),
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .with_context(|| format!("Row {row}, {feature}: not representable as f64")),
        Some(JsonValue::String(s)) => parse_cell(s, row, feature),
        Some(other) => bail!("Row {row}, {feature}: {other} is not a number"),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas or Polars.
///
/// The name column must be Utf8/LargeUtf8; nutrient columns may be Float64,
/// Float32, Int64 or Int32.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let required = std::iter::once(DISH_NAME_COLUMN).chain(Feature::ALL.iter().map(|f| f.column()));
    for column in required {
        if !column_names.iter().any(|c| c == column) {
            return Err(Error::MissingColumn(column.to_string()).into());
        }
    }
    let reader = builder.build().context("building parquet reader")?;

    let mut dishes = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let name_idx = schema
            .index_of(DISH_NAME_COLUMN)
            .map_err(|_| Error::MissingColumn(DISH_NAME_COLUMN.to_string()))?;
        let mut feature_cols = Vec::with_capacity(Feature::ALL.len());
        for feature in Feature::ALL {
            let idx = schema
                .index_of(feature.column())
                .map_err(|_| Error::MissingColumn(feature.column().to_string()))?;
            feature_cols.push(batch.column(idx));
        }
        let name_col = batch.column(name_idx);

        for row in 0..batch.num_rows() {
            let row_no = dishes.len();
            let name = extract_string(name_col, row)
                .with_context(|| format!("Row {row_no}: failed to read '{DISH_NAME_COLUMN}'"))?;

            let mut cells = [0.0; 4];
            for ((cell, col), feature) in cells.iter_mut().zip(&feature_cols).zip(Feature::ALL) {
                *cell = extract_f64(col, row)
                    .with_context(|| format!("Row {row_no}: failed to read '{feature}'"))?;
            }

            dishes.push(Dish::new(name, nutrients_from_cells(cells, row_no)?));
        }
    }

    Ok(Dataset::new(dishes, column_names))
}

// -- Parquet / Arrow helpers --

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).trim().to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).trim().to_string()),
        other => bail!("Expected a string column, got {other:?}"),
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        return Ok(0.0);
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .value(row),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .value(row) as f64,
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .value(row) as f64,
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .value(row) as f64,
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Dish Name,Calories (kcal),Protein (g),Carbohydrates (g),Fats (g),Free Sugar (g)";

    fn csv_from(text: &str) -> Result<Dataset> {
        read_csv(csv::Reader::from_reader(text.as_bytes()))
    }

    #[test]
    fn csv_rows_get_scores_and_keep_order() {
        let text = format!("{HEADER}\nDal,0,20,40,3,0\nHalwa,500,0,0,20,15\n");
        let ds = csv_from(&text).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.names(), vec!["Dal", "Halwa"]);
        assert!((ds.dishes()[0].score - 100.0).abs() < 1e-9);
        assert!(ds.dishes()[1].score.abs() < 1e-9);
        assert_eq!(ds.column_names().len(), 6);
    }

    #[test]
    fn csv_empty_cells_default_to_zero() {
        let text = format!("{HEADER}\nPlain rice,,2.5,,,\n");
        let ds = csv_from(&text).unwrap();
        let n = ds.dishes()[0].nutrients;
        assert_eq!(n.calories(), 0.0);
        assert_eq!(n.protein(), 2.5);
        assert_eq!(n.carbohydrates(), 0.0);
        assert_eq!(n.free_sugar(), 0.0);
    }

    #[test]
    fn csv_missing_column_is_reported() {
        let text = "Dish Name,Calories (kcal),Protein (g),Carbohydrates (g)\nDal,1,2,3\n";
        let err = csv_from(text).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::MissingColumn(c)) => assert_eq!(c, "Free Sugar (g)"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn csv_rejects_bad_cells() {
        let text = format!("{HEADER}\nDal,abc,1,1,1,1\n");
        assert!(csv_from(&text).is_err());
        let text = format!("{HEADER}\nDal,-5,1,1,1,1\n");
        assert!(csv_from(&text).is_err());
    }

    #[test]
    fn json_records() {
        let text = r#"[
            {"Dish Name": "Dal", "Calories (kcal)": 0, "Protein (g)": 20,
             "Carbohydrates (g)": "40", "Free Sugar (g)": null},
            {"Dish Name": "Tea", "Calories (kcal)": 30.5, "Protein (g)": 1,
             "Carbohydrates (g)": 5, "Free Sugar (g)": 4}
        ]"#;
        let ds = parse_json(text).unwrap();
        assert_eq!(ds.len(), 2);
        assert!((ds.dishes()[0].score - 100.0).abs() < 1e-9);
        assert_eq!(ds.dishes()[1].nutrients.calories(), 30.5);
    }

    #[test]
    fn json_requires_columns() {
        let text = r#"[{"Dish Name": "Dal", "Calories (kcal)": 1}]"#;
        let err = parse_json(text).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::MissingColumn(_))));
    }

    fn write_parquet(path: &Path, columns: &[&str]) {
        use arrow::datatypes::{Field, Schema};
        use parquet::arrow::ArrowWriter;

        let fields: Vec<Field> = columns
            .iter()
            .map(|c| {
                let ty = if *c == DISH_NAME_COLUMN { DataType::Utf8 } else { DataType::Float64 };
                Field::new(*c, ty, true)
            })
            .collect();
        let schema = Arc::new(Schema::new(fields));
        let file = std::fs::File::create(path).unwrap();
        // No batches: a valid file with zero rows.
        ArrowWriter::try_new(file, schema, None).unwrap().close().unwrap();
    }

    #[test]
    fn empty_parquet_still_needs_every_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dishes.parquet");
        write_parquet(
            &path,
            &[DISH_NAME_COLUMN, "Calories (kcal)", "Protein (g)", "Carbohydrates (g)"],
        );
        let err = load_file(&path).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::MissingColumn(c)) => assert_eq!(c, "Free Sugar (g)"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_parquet_with_all_columns_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dishes.parquet");
        let mut columns = vec![DISH_NAME_COLUMN];
        columns.extend(Feature::ALL.iter().map(|f| f.column()));
        write_parquet(&path, &columns);
        assert!(load_file(&path).unwrap().is_empty());
    }

    #[test]
    fn unsupported_extension() {
        assert!(load_file(Path::new("dishes.xlsx")).is_err());
    }

    #[test]
    fn load_file_reads_csv_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dishes.csv");
        std::fs::write(&path, format!("{HEADER}\nDal,100,10,35,2,1\n")).unwrap();
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.dishes()[0].name, "Dal");
    }
}
