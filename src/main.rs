use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use nutriscore::config::Config;
use nutriscore::pipeline::TrainingPipeline;
use nutriscore::server;
use nutriscore::state::{self, Predictor};
use nutriscore::ui::menu::Menu;
use nutriscore::ui::report;

#[derive(Parser)]
#[command(name = "nutriscore")]
#[command(about = "Score dishes by nutrient content, train a regression on the scores and serve predictions")]
#[command(version)]
struct Cli {
    /// JSON configuration file (defaults to ./nutriscore.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the linear model on the dataset and save the artifact files
    Train {
        /// Dataset file (.csv, .json or .parquet), tried before the configured paths
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Directory the model files are written to
        #[arg(short, long)]
        models_dir: Option<PathBuf>,

        /// Fraction of dishes held out for evaluation
        #[arg(long)]
        test_size: Option<f64>,

        /// Random seed for the train/test split
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Interactive prediction and dish search
    Predict {
        /// Directory searched first for the model files
        #[arg(short, long)]
        models_dir: Option<PathBuf>,
    },

    /// Run the HTTP API
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:5000
        #[arg(short, long)]
        bind: Option<String>,

        /// Directory searched first for the model files
        #[arg(short, long)]
        models_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Train {
            dataset,
            models_dir,
            test_size,
            seed,
        } => {
            if let Some(path) = dataset {
                config.prefer_dataset(path);
            }
            if let Some(dir) = models_dir {
                config.prefer_models_dir(dir);
            }
            if let Some(t) = test_size {
                config.test_size = t;
            }
            if let Some(s) = seed {
                config.seed = s;
            }
            cmd_train(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Predict { models_dir } => {
            if let Some(dir) = models_dir {
                config.prefer_models_dir(dir);
            }
            cmd_predict(&config)
        }
        Commands::Serve { bind, models_dir } => {
            if let Some(addr) = bind {
                config.bind = addr;
            }
            if let Some(dir) = models_dir {
                config.prefer_models_dir(dir);
            }
            server::serve(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_train(config: &Config) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    report::header(&mut out, "LINEAR REGRESSION MODEL TRAINING")?;
    writeln!(out, "Test size: {}  Seed: {}", config.test_size, config.seed)?;
    writeln!(out, "Models directory: {}", config.models_dir.display())?;

    report::header(&mut out, "STEP 1: LOADING DATA")?;
    let dataset = state::load_dataset(config)?;
    report::dataset_summary(&mut out, &dataset.summary())?;

    report::header(&mut out, "STEP 2: TRAINING MODEL")?;
    let pipeline = TrainingPipeline::new(config.test_size, config.seed);
    let outcome = pipeline.run(&dataset).context("training failed")?;
    report::evaluation(&mut out, &outcome.report)?;
    writeln!(out)?;
    report::coefficients(&mut out, &outcome.artifact.feature_order, &outcome.artifact.model)?;

    report::header(&mut out, "STEP 3: SAVING MODEL")?;
    let files = outcome.artifact.save(&config.models_dir)?;
    report::saved_files(&mut out, &files)?;

    report::header(&mut out, "TRAINING COMPLETE")?;
    writeln!(out, "Run `nutriscore predict` or `nutriscore serve` to use the model.")?;
    Ok(())
}

fn cmd_predict(config: &Config) -> Result<ExitCode> {
    let predictor = Predictor::load(config);
    if !predictor.has_model() {
        eprintln!("No trained model found in:");
        for dir in &config.artifact_dirs {
            eprintln!("  {}", dir.display());
        }
        eprintln!("Run `nutriscore train` first to create the model files.");
        return Ok(ExitCode::FAILURE);
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(&predictor, stdin.lock(), stdout.lock())
        .with_limits(config.match_count, config.cli_search_limit)
        .run()
        .context("interactive session failed")?;
    Ok(ExitCode::SUCCESS)
}
