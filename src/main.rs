use anyhow::anyhow;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crayfish_lib::commands::{self, CommandResult, Session};
use crayfish_lib::Config;

#[derive(Parser)]
#[command(name = "crayfish")]
#[command(about = "Cluster and classify pixel detector frames", long_about = None)]
struct Cli {
    /// Config JSON file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Append a JSONL run trace to this file
    #[arg(long, global = true, value_name = "FILE")]
    trace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the attribute table of a frame
    Inspect {
        frame: PathBuf,
    },
    /// List the clusters of a frame with their attributes
    Clusters {
        frame: PathBuf,
    },
    /// Label clusters by nearest point and save a training file
    ExportTraining {
        frame: PathBuf,

        /// Manual label `x,y=Class`, repeatable
        #[arg(short, long = "label", value_name = "X,Y=CLASS")]
        labels: Vec<String>,

        /// Training file to write
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Apply manual classes from a training file to a frame
    LoadTraining {
        frame: PathBuf,

        /// Training file to read
        #[arg(short, long)]
        training: PathBuf,
    },
    /// Train a classifier and classify every cluster of a frame
    Classify {
        frame: PathBuf,

        /// Training file to learn from
        #[arg(short, long)]
        training: PathBuf,

        /// Algorithm name ("K Nearest Neighbours" or "knn")
        #[arg(short, long, default_value = "K Nearest Neighbours")]
        algorithm: String,

        /// Neighbours to consult (defaults to the config value)
        #[arg(short)]
        k: Option<usize>,

        /// Dimensions to include, repeatable (default: every available one)
        #[arg(long = "include", value_name = "ATTRIBUTE")]
        include: Vec<String>,
    },
    /// Sum every frame file below a folder
    Aggregate {
        folder: PathBuf,
    },
}

fn print_report<T: Serialize>(report: CommandResult<T>) -> anyhow::Result<()> {
    let report = report.map_err(|e| anyhow!("{}", e.message()))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let session = Session::new(config, cli.trace.clone()).map_err(|e| anyhow!("{}", e.message()))?;

    match cli.command {
        Commands::Inspect { frame } => print_report(commands::inspect_frame(&session, &frame)),
        Commands::Clusters { frame } => print_report(commands::list_clusters(&session, &frame)),
        Commands::ExportTraining {
            frame,
            labels,
            output,
        } => print_report(commands::export_training(&session, &frame, &labels, &output)),
        Commands::LoadTraining { frame, training } => {
            print_report(commands::load_training(&session, &frame, &training))
        }
        Commands::Classify {
            frame,
            training,
            algorithm,
            k,
            include,
        } => print_report(commands::classify(
            &session, &frame, &training, &algorithm, k, &include,
        )),
        Commands::Aggregate { folder } => print_report(commands::aggregate(&session, &folder)),
    }
}
