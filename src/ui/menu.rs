use std::io::{self, BufRead, Write};

use crate::data::model::{Dish, Feature, NutrientVector, parse_nutrient};
use crate::data::nearest::similarity_percent;
use crate::error::{Error, InputProblem};
use crate::state::Predictor;

use super::report::{header, section};

/// Interactive prediction loop over any line source and sink, so the whole
/// session can be driven from a byte buffer in tests.
pub struct Menu<'a, R, W> {
    predictor: &'a Predictor,
    input: R,
    out: W,
    match_count: usize,
    search_limit: usize,
}

enum Choice {
    Predict,
    Search,
    Exit,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(predictor: &'a Predictor, input: R, out: W) -> Self {
        Menu {
            predictor,
            input,
            out,
            match_count: 2,
            search_limit: 5,
        }
    }

    pub fn with_limits(mut self, match_count: usize, search_limit: usize) -> Self {
        self.match_count = match_count;
        self.search_limit = search_limit;
        self
    }

    /// Run until the user picks "Exit" or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        header(&mut self.out, "NUTRITIONAL SCORE PREDICTION")?;
        section(&mut self.out, "HOW TO USE")?;
        writeln!(self.out, "Predicts a nutritional quality score (0-100) for a dish.")?;
        let order = self.predictor.feature_order().unwrap_or(&Feature::ALL[..]);
        let names: Vec<&str> = order.iter().map(|f| f.column()).collect();
        writeln!(self.out, "Features: {}", names.join(", "))?;
        writeln!(self.out, "Higher scores mean better nutritional quality.")?;

        loop {
            let Some(choice) = self.read_choice()? else {
                break;
            };
            match choice {
                Choice::Predict => {
                    if !self.predict()? {
                        break;
                    }
                }
                Choice::Search => {
                    if !self.search()? {
                        break;
                    }
                }
                Choice::Exit => {
                    header(&mut self.out, "Thank you for using the nutrition prediction app!")?;
                    break;
                }
            }
        }
        self.out.flush()
    }

    /// Next trimmed line, or `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn read_choice(&mut self) -> io::Result<Option<Choice>> {
        loop {
            section(&mut self.out, "PREDICTION")?;
            writeln!(self.out, "Options:")?;
            writeln!(self.out, "  1. Enter nutritional values manually")?;
            writeln!(self.out, "  2. Search for a dish in the dataset")?;
            writeln!(self.out, "  3. Exit")?;
            writeln!(self.out)?;
            write!(self.out, "Enter choice (1-3): ")?;

            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match line.as_str() {
                "1" => return Ok(Some(Choice::Predict)),
                "2" => return Ok(Some(Choice::Search)),
                "3" => return Ok(Some(Choice::Exit)),
                _ => writeln!(self.out, "Invalid choice. Please enter 1, 2, or 3.")?,
            }
        }
    }

    /// Prompt until a valid non-negative number arrives.
    fn read_nutrient(&mut self, feature: Feature) -> io::Result<Option<f64>> {
        loop {
            write!(self.out, "  {}: ", feature.column())?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match parse_nutrient(feature.column(), &line) {
                Ok(value) => return Ok(Some(value)),
                Err(Error::InvalidInput {
                    problem: InputProblem::Negative,
                    ..
                }) => writeln!(self.out, "     Please enter a positive number")?,
                Err(_) => writeln!(self.out, "     Please enter a valid number")?,
            }
        }
    }

    /// Returns `false` when input ran out mid-entry.
    fn predict(&mut self) -> io::Result<bool> {
        writeln!(self.out, "Enter nutritional values for the dish:")?;
        writeln!(self.out)?;
        let mut values = [0.0; 4];
        for (slot, feature) in values.iter_mut().zip(Feature::ALL) {
            match self.read_nutrient(feature)? {
                Some(v) => *slot = v,
                None => return Ok(false),
            }
        }
        // Every value already passed the same checks.
        let nutrients = match NutrientVector::try_from_array(values) {
            Ok(n) => n,
            Err(e) => {
                writeln!(self.out, "{e}")?;
                return Ok(true);
            }
        };

        let prediction = match self.predictor.predict(&nutrients) {
            Ok(p) => p,
            Err(e) => {
                log::error!("Prediction failed: {e}");
                writeln!(self.out, "Prediction failed: {e}")?;
                return Ok(true);
            }
        };

        section(&mut self.out, "PREDICTION RESULT")?;
        writeln!(self.out, "Input nutritional values:")?;
        for feature in Feature::ALL {
            writeln!(self.out, "  |- {}: {:.2}", feature.column(), nutrients.get(feature))?;
        }
        writeln!(self.out)?;
        writeln!(self.out, "Predicted score: {:.2}/100", prediction.score)?;
        writeln!(self.out, "Rating: {}", prediction.category)?;
        writeln!(self.out, "{}", prediction.category.message())?;
        self.interpretation(prediction.score)?;

        section(&mut self.out, "MATCHING DISHES FROM DATASET")?;
        let predictor = self.predictor;
        match predictor.nearest(&nutrients, self.match_count) {
            Ok(matches) if matches.is_empty() => {
                writeln!(self.out, "No matching dishes found in dataset")?;
            }
            Ok(matches) => {
                writeln!(
                    self.out,
                    "Top {} dishes with similar nutritional values:",
                    matches.len()
                )?;
                writeln!(self.out)?;
                for (rank, m) in matches.iter().enumerate() {
                    writeln!(self.out, "  {}. {}", rank + 1, m.dish.name)?;
                    writeln!(self.out, "     Similarity: {:.1}%", similarity_percent(m.distance))?;
                    self.nutrient_lines(m.dish, "     ")?;
                    writeln!(self.out)?;
                }
            }
            Err(e) => writeln!(self.out, "Matching dishes unavailable: {e}")?,
        }
        Ok(true)
    }

    fn interpretation(&mut self, score: f64) -> io::Result<()> {
        let (title, lines) = if score >= 70.0 {
            (
                "Key strengths:",
                ["Good balance of nutrients", "Recommended for a healthy diet"],
            )
        } else if score >= 50.0 {
            (
                "Moderate nutrition:",
                ["Contains some beneficial nutrients", "Could be improved"],
            )
        } else {
            (
                "Nutritional concerns:",
                ["Consider healthier alternatives", "Focus on increasing nutrients"],
            )
        };
        writeln!(self.out)?;
        writeln!(self.out, "{title}")?;
        for line in lines {
            writeln!(self.out, "   * {line}")?;
        }
        Ok(())
    }

    fn search(&mut self) -> io::Result<bool> {
        write!(self.out, "Enter dish name to search: ")?;
        let Some(query) = self.read_line()? else {
            return Ok(false);
        };
        let predictor = self.predictor;
        match predictor.search(&query, self.search_limit) {
            Ok(found) if found.is_empty() => {
                writeln!(self.out)?;
                writeln!(self.out, "No dishes found matching '{query}'")?;
            }
            Ok(found) => {
                writeln!(self.out)?;
                writeln!(self.out, "Found {} matching dish(es):", found.len())?;
                writeln!(self.out)?;
                for dish in found {
                    writeln!(self.out, "  * {}", dish.name)?;
                    self.nutrient_lines(dish, "    ")?;
                    writeln!(self.out)?;
                }
            }
            Err(e) => writeln!(self.out, "Search unavailable: {e}")?,
        }
        Ok(true)
    }

    fn nutrient_lines(&mut self, dish: &Dish, indent: &str) -> io::Result<()> {
        for feature in Feature::ALL {
            writeln!(
                self.out,
                "{indent}|- {}: {:.2}",
                feature.column(),
                dish.nutrients.get(feature)
            )?;
        }
        Ok(())
    }
}
