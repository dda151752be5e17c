//! PhishGuard Trainer - Main Entry Point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use phishguard_core::api::commands;
use phishguard_core::constants::{self, APP_NAME, APP_VERSION, DEFAULT_LABEL_COLUMN, DEFAULT_URL_COLUMN};
use phishguard_core::logic::dataset::DatasetOptions;
use phishguard_core::logic::heuristic::HeuristicOptions;
use phishguard_core::logic::training::TrainingConfig;

#[derive(Parser)]
#[command(name = "phishguard-train", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a forest from a CSV dataset and save the artifact
    Train {
        input: PathBuf,
        #[arg(short, long, env = "PHISHGUARD_MODEL_PATH")]
        out: Option<PathBuf>,
        #[arg(long, env = "PHISHGUARD_TREES")]
        trees: Option<usize>,
        #[arg(long, env = "PHISHGUARD_SEED")]
        seed: Option<u64>,
        #[arg(long)]
        max_depth: Option<usize>,
        #[arg(long, default_value_t = constants::DEFAULT_HOLDOUT_FRACTION)]
        holdout: f64,
        #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
        label_column: String,
        #[arg(long, default_value = DEFAULT_URL_COLUMN)]
        url_column: String,
    },
    /// Print the feature vector of one URL
    Extract {
        url: String,
        /// JSON object of measured page features
        #[arg(long)]
        page: Option<String>,
    },
    /// Convert a URL dataset into a feature-column dataset
    Export {
        input: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
        label_column: String,
        #[arg(long, default_value = DEFAULT_URL_COLUMN)]
        url_column: String,
    },
    /// Show artifact metadata
    Inspect {
        #[arg(short, long, env = "PHISHGUARD_MODEL_PATH")]
        model: Option<PathBuf>,
    },
    /// Score a JSON object of features
    Predict {
        features: String,
        #[arg(short, long, env = "PHISHGUARD_MODEL_PATH")]
        model: Option<PathBuf>,
    },
    /// Heuristic screen plus model verdict for a URL
    Check {
        url: String,
        #[arg(short, long, env = "PHISHGUARD_MODEL_PATH")]
        model: Option<PathBuf>,
        #[arg(long)]
        no_keywords: bool,
        #[arg(long)]
        no_long_urls: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let model_path = |given: Option<PathBuf>| given.unwrap_or_else(constants::get_model_path);

    match args.command {
        Command::Train {
            input,
            out,
            trees,
            seed,
            max_depth,
            holdout,
            label_column,
            url_column,
        } => {
            log::info!("{} trainer v{}", APP_NAME, APP_VERSION);
            let mut config = TrainingConfig::from_env();
            if let Some(n) = trees {
                config.forest.n_trees = n;
            }
            if let Some(s) = seed {
                config.forest.seed = s;
            }
            config.forest.max_depth = max_depth;
            config.holdout_fraction = holdout;
            config.dataset = DatasetOptions { label_column, url_column };

            print_json(&commands::train(&input, &model_path(out), &config)?)
        }
        Command::Extract { url, page } => print_json(&commands::extract(&url, page.as_deref())?),
        Command::Export {
            input,
            out,
            label_column,
            url_column,
        } => {
            let options = DatasetOptions { label_column, url_column };
            print_json(&commands::export_features(&input, &out, &options)?)
        }
        Command::Inspect { model } => print_json(&commands::inspect(&model_path(model))?),
        Command::Predict { features, model } => {
            print_json(&commands::predict(&model_path(model), &features)?)
        }
        Command::Check {
            url,
            model,
            no_keywords,
            no_long_urls,
        } => {
            let options = HeuristicOptions {
                flag_keywords: !no_keywords,
                flag_long_urls: !no_long_urls,
            };
            print_json(&commands::check(&model_path(model), &url, &options)?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
