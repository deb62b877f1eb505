use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::domain::{model::DEFAULT_WEIGHTS_FILE, training::DATASET_DESCRIPTOR};

/// Flower detection web UI.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServeArgs {
    /// Exported ONNX weights of the trained detector
    #[arg(long, env = "FLOWER_WEIGHTS", default_value = DEFAULT_WEIGHTS_FILE, value_name = "FILE")]
    pub weights: PathBuf,

    /// Dataset descriptor the model was trained with; supplies class names
    #[arg(long, env = "FLOWER_DATASET", default_value = DATASET_DESCRIPTOR, value_name = "FILE")]
    pub dataset: PathBuf,

    /// Address to listen on
    #[arg(long, env = "FLOWER_BIND", default_value = "0.0.0.0:8090")]
    pub bind: String,

    /// TrueType font used for box labels; boxes are drawn without text when absent
    #[arg(long, env = "FLOWER_FONT", value_name = "FILE")]
    pub font: Option<PathBuf>,

    /// Directory holding index.html and assets
    #[arg(long, env = "FLOWER_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,
}

/// Trains the flower detector through the Ultralytics CLI.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct TrainArgs {
    /// Project directory holding the dataset descriptor
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Dataset descriptor, relative to the working directory
    #[arg(long, default_value = DATASET_DESCRIPTOR)]
    pub data: PathBuf,

    /// Ultralytics command line entry point
    #[arg(long, env = "YOLO_BIN", default_value = "yolo")]
    pub yolo_bin: PathBuf,

    /// Keep only the .pt weights, skip the ONNX export
    #[arg(long)]
    pub skip_export: bool,
}

/// `RUST_LOG` wins; `info` otherwise.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
