//! Write a synthetic dish table for demos and smoke tests.
//!
//! ```text
//! generate_sample [OUTPUT] [--rows N]
//! ```
//! The format follows the extension of OUTPUT (`.csv` by default, `.parquet`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use nutriscore::data::model::{DISH_NAME_COLUMN, Feature};

#[derive(Parser)]
#[command(about = "Generate a deterministic synthetic nutrition dataset")]
struct Args {
    /// Output file (.csv or .parquet)
    #[arg(default_value = "Indian_Food_Nutrition_Processed.csv")]
    output: PathBuf,

    /// Number of dishes
    #[arg(short, long, default_value_t = 240)]
    rows: usize,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const BASES: [&str; 12] = [
    "Paneer", "Chana", "Aloo", "Dal", "Rajma", "Chicken", "Egg", "Palak", "Mushroom", "Gobi",
    "Moong", "Fish",
];
const STYLES: [&str; 10] = [
    "Curry", "Masala", "Tikka", "Pulao", "Paratha", "Halwa", "Kheer", "Pakora", "Chaat", "Soup",
];

/// One generated dish: nutrient ranges per style so scores spread out.
struct Row {
    name: String,
    values: [f64; 4],
}

fn generate(rows: usize, seed: u64) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..rows)
        .map(|i| {
            let base = BASES[i % BASES.len()];
            let style_idx = (i / BASES.len()) % STYLES.len();
            let style = STYLES[style_idx];
            let round = i / (BASES.len() * STYLES.len());
            let name = if round == 0 {
                format!("{base} {style}")
            } else {
                format!("{base} {style} ({})", round + 1)
            };

            let sweet = matches!(style, "Halwa" | "Kheer");
            let fried = matches!(style, "Pakora" | "Paratha");
            let protein_max = if matches!(base, "Chicken" | "Fish") { 28.0 } else { 16.0 };
            let carbs_max = if sweet { 80.0 } else { 55.0 };

            let calories = rng.gen_range(40.0..220.0) + if fried { 200.0 } else { 0.0 };
            let protein = rng.gen_range(0.5..protein_max);
            let carbs = rng.gen_range(2.0..carbs_max);
            let sugar = if sweet {
                rng.gen_range(8.0..35.0)
            } else {
                rng.gen_range(0.0..6.0)
            };
            Row {
                name,
                values: [calories, protein, carbs, sugar].map(|v: f64| (v * 100.0).round() / 100.0),
            }
        })
        .collect()
}

fn header() -> Vec<&'static str> {
    std::iter::once(DISH_NAME_COLUMN)
        .chain(Feature::ALL.iter().map(|f| f.column()))
        .collect()
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(header())?;
    for row in rows {
        let mut record = vec![row.name.clone()];
        record.extend(row.values.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let names: Vec<&str> = header();
    let mut fields = vec![Field::new(names[0], DataType::Utf8, false)];
    fields.extend(names[1..].iter().map(|n| Field::new(*n, DataType::Float64, false)));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(
        rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
    ))];
    for i in 0..Feature::ALL.len() {
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.values[i]).collect::<Vec<_>>(),
        )));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let rows = generate(args.rows, args.seed);
    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => write_csv(&args.output, &rows)?,
        "parquet" | "pq" => write_parquet(&args.output, &rows)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    log::info!("Wrote {} dishes to {}", rows.len(), args.output.display());
    Ok(())
}
