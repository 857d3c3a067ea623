use std::io::{self, Write};
use std::path::PathBuf;

use crate::data::model::{DatasetSummary, Feature};
use crate::ml::regression::LinearModel;
use crate::pipeline::EvaluationReport;

const RULE_WIDTH: usize = 80;

// ---------------------------------------------------------------------------
// Banners
// ---------------------------------------------------------------------------

pub fn header(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "  {title}")?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

pub fn section(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out, "  {title}")?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out)
}

// ---------------------------------------------------------------------------
// Training report
// ---------------------------------------------------------------------------

pub fn dataset_summary(out: &mut impl Write, s: &DatasetSummary) -> io::Result<()> {
    writeln!(out, "Dataset loaded: {} dishes, {} columns", s.records, s.columns)?;
    writeln!(out, "  |- Score range: {:.2} - {:.2}", s.score_min, s.score_max)?;
    writeln!(out, "  |- Mean score:  {:.2}", s.score_mean)?;
    writeln!(out, "  `- Std dev:     {:.2}", s.score_std)
}

pub fn evaluation(out: &mut impl Write, r: &EvaluationReport) -> io::Result<()> {
    writeln!(
        out,
        "Model performance ({} train / {} test dishes):",
        r.train_samples, r.test_samples
    )?;
    writeln!(out, "  |- Train R2:   {:.4} ({:.2}%)", r.train.r2, r.train.r2 * 100.0)?;
    writeln!(out, "  |- Test R2:    {:.4} ({:.2}%)", r.test.r2, r.test.r2 * 100.0)?;
    writeln!(out, "  |- Train RMSE: {:.4}", r.train.rmse)?;
    writeln!(out, "  |- Test RMSE:  {:.4}", r.test.rmse)?;
    writeln!(out, "  |- Train MAE:  {:.4}", r.train.mae)?;
    writeln!(out, "  |- Test MAE:   {:.4}", r.test.mae)?;
    writeln!(out, "  `- R2 gap:     {:.4} (train - test; large values suggest overfitting)", r.r2_gap())
}

pub fn coefficients(out: &mut impl Write, features: &[Feature], model: &LinearModel) -> io::Result<()> {
    writeln!(out, "Model coefficients (standardized features):")?;
    for (feature, coef) in features.iter().zip(model.coefficients()) {
        writeln!(out, "  |- {:<25} {:>10.4}", feature.column(), coef)?;
    }
    writeln!(out, "  `- {:<25} {:>10.4}", "Intercept", model.intercept())
}

pub fn saved_files(out: &mut impl Write, files: &[PathBuf]) -> io::Result<()> {
    writeln!(out, "Saved model files:")?;
    for (i, path) in files.iter().enumerate() {
        let branch = if i + 1 == files.len() { '`' } else { '|' };
        writeln!(out, "  {branch}- {}", path.display())?;
    }
    Ok(())
}
