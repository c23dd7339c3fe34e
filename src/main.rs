mod features;
mod hybrid;
mod model;
mod physics;
mod sources;
mod training;
mod web;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::model::ModelBundle;
use crate::sources::{current_solar_or_estimated, ElementSource, NoaaSource, SpaceTrackSource};
use crate::training::{
    collect_dataset, train_and_save, validate_physics, TrainOptions, DEFAULT_TRAINING_SATELLITES,
};

#[derive(Parser)]
#[command(name = "decaywatch")]
#[command(about = "Hybrid physics + ML orbital decay prediction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the prediction HTTP service
    Serve {
        /// YAML config file; defaults apply when omitted
        #[arg(long)]
        config: Option<String>,
    },
    /// Train the risk classifier from historical decay data
    Train {
        /// NORAD ids to train on; defaults to verified decayed Starlinks
        #[arg(long = "norad-id")]
        norad_ids: Vec<u32>,
        #[arg(long, default_value_t = 120)]
        days_back: u32,
        /// Keep only rows below this altitude (km)
        #[arg(long)]
        max_altitude_km: Option<f64>,
        #[arg(long, default_value = "hybrid_decay_model.json")]
        output: PathBuf,
    },
    /// Report physics-model error against fresh history (no retraining)
    Validate {
        #[arg(long)]
        model: PathBuf,
        #[arg(long = "norad-id")]
        norad_ids: Vec<u32>,
        #[arg(long, default_value_t = 120)]
        days_back: u32,
    },
    /// Batch risk scores for a list of satellites, JSON to stdout
    Batch {
        /// Model bundle; physics-only fallback scoring when omitted
        #[arg(long)]
        model: Option<PathBuf>,
        norad_ids: Vec<u32>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(config).await,
        Commands::Train {
            norad_ids,
            days_back,
            max_altitude_km,
            output,
        } => train(norad_ids, days_back, max_altitude_km, output).await,
        Commands::Validate {
            model,
            norad_ids,
            days_back,
        } => validate(model, norad_ids, days_back).await,
        Commands::Batch { model, norad_ids } => batch(model, norad_ids).await,
    }
}

async fn serve(config_path: Option<String>) -> ExitCode {
    let config = match config_path {
        Some(path) => match web::Config::from_file(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error reading config: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => web::Config::default(),
    };

    if let Err(e) = web::run_server(config).await {
        eprintln!("Server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn training_sources() -> Result<(SpaceTrackSource, NoaaSource), ExitCode> {
    let elements = match SpaceTrackSource::from_env(None) {
        Ok(Some(source)) => source,
        Ok(None) => {
            eprintln!("Set SPACETRACK_USERNAME and SPACETRACK_PASSWORD first");
            return Err(ExitCode::FAILURE);
        }
        Err(e) => {
            eprintln!("Element source error: {e}");
            return Err(ExitCode::FAILURE);
        }
    };
    let solar = match NoaaSource::new(None) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Solar source error: {e}");
            return Err(ExitCode::FAILURE);
        }
    };
    Ok((elements, solar))
}

async fn train(
    norad_ids: Vec<u32>,
    days_back: u32,
    max_altitude_km: Option<f64>,
    output: PathBuf,
) -> ExitCode {
    let (elements, solar) = match training_sources() {
        Ok(s) => s,
        Err(code) => return code,
    };

    let options = TrainOptions {
        norad_ids: if norad_ids.is_empty() {
            DEFAULT_TRAINING_SATELLITES.to_vec()
        } else {
            norad_ids
        },
        days_back,
        max_altitude_km,
        output,
    };

    println!(
        "Collecting training data from {} satellites (rate-limited, this can take minutes)",
        options.norad_ids.len()
    );

    match train_and_save(&elements, &solar, &options).await {
        Ok(report) => {
            println!(
                "Trained on {} samples from {} satellites",
                report.total_samples, report.satellites_used
            );
            println!(
                "Physics model: RMSE {:.4} km/day, MAE {:.4} km/day, R2 {:.4}",
                report.physics.overall.rmse, report.physics.overall.mae, report.physics.overall.r2
            );
            println!(
                "Risk classifier: train acc {:.3}, test acc {:.3}",
                report.classifier.train_accuracy, report.classifier.test_accuracy
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Training failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn validate(model: PathBuf, norad_ids: Vec<u32>, days_back: u32) -> ExitCode {
    let bundle = match ModelBundle::load(&model) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error loading bundle: {e}");
            return ExitCode::FAILURE;
        }
    };
    let (elements, solar) = match training_sources() {
        Ok(s) => s,
        Err(code) => return code,
    };

    let options = TrainOptions {
        norad_ids: if norad_ids.is_empty() {
            DEFAULT_TRAINING_SATELLITES.to_vec()
        } else {
            norad_ids
        },
        days_back,
        max_altitude_km: None,
        output: model,
    };

    let (rows, _) = match collect_dataset(&elements, &solar, &options).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Data collection failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    match validate_physics(&bundle.atmosphere, &rows) {
        Some(report) => {
            if report.overall.r2 < 0.0 {
                log::warn!(
                    "physics model R2 {:.3} is negative: worse than predicting the mean",
                    report.overall.r2
                );
            }
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Report serialization failed: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("No rows collected, nothing to validate");
            ExitCode::FAILURE
        }
    }
}

async fn batch(model: Option<PathBuf>, norad_ids: Vec<u32>) -> ExitCode {
    if norad_ids.is_empty() {
        eprintln!("No NORAD ids given");
        return ExitCode::FAILURE;
    }

    let bundle = match model {
        Some(path) => match ModelBundle::load(&path) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("Error loading bundle: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => ModelBundle::physics_only(),
    };
    let predictor = hybrid::HybridPredictor::from_bundle(bundle);

    let (elements, solar_source) = match training_sources() {
        Ok(s) => s,
        Err(code) => return code,
    };
    let solar = current_solar_or_estimated(&solar_source).await;

    let mut entries = Vec::new();
    for norad_id in norad_ids {
        match elements.current(norad_id).await {
            Ok(Some(state)) => {
                entries.push(web::api::batch::batch_entry(
                    &predictor, norad_id, &state, &solar,
                ));
            }
            Ok(None) => log::warn!("NORAD {norad_id}: no current element set, skipping"),
            Err(e) => log::warn!("NORAD {norad_id}: fetch failed ({e}), skipping"),
        }
    }

    match serde_json::to_string_pretty(&entries) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Serialization failed: {e}");
            ExitCode::FAILURE
        }
    }
}
