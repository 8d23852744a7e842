// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Fabstir text detector CLI
#[derive(Parser, Debug)]
#[command(name = "fabstir-text-detect")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Detect text regions in images with a DB ONNX model", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect text regions and print them as JSON
    Detect(detect::DetectArgs),

    /// Print the scale parameters chosen for an image
    Scale(detect::ScaleArgs),

    /// Print version information
    Version,
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Detect(args) => detect::run_detect(args).await,
        Commands::Scale(args) => detect::run_scale(args).await,
        Commands::Version => {
            println!("{}", crate::version::get_version_string());
            println!(
                "{}",
                serde_json::to_string_pretty(&crate::version::get_version_info())?
            );
            Ok(())
        }
    }
}
