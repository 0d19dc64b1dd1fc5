//! Command-line interface
//!
//! `serve` runs the dashboard API, `report` prints the evaluation report and
//! attribution ranking to the terminal, `explain` walks one evaluation record.

use clap::{Parser, Subcommand};
use colored::*;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::{InputExplanation, PipelineArtifacts};
use crate::server::{run_server, ServerConfig};

fn dim(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {} {}", dim(key), val.white());
}

#[derive(Parser)]
#[command(name = "shapboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train, evaluate and explain a tabular classifier")]
pub struct Cli {
    /// Path to the CSV dataset
    #[arg(long, global = true)]
    pub data: Option<String>,

    /// Target column name
    #[arg(long, global = true)]
    pub target: Option<String>,

    /// Seed for the split and the forest
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Number of trees in the forest
    #[arg(long, global = true)]
    pub trees: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the dashboard server (the default)
    Serve {
        /// Host to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the classification report and attribution ranking
    Report,

    /// Explain one evaluation record
    Explain {
        /// Row index within the evaluation partition
        #[arg(short, long, default_value = "0")]
        row: usize,
    },
}

impl Cli {
    /// Pipeline configuration with CLI overrides applied
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        if let Some(ref data) = self.data {
            config.data_path = data.clone();
        }
        if let Some(ref target) = self.target {
            config.target = target.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(trees) = self.trees {
            config.n_trees = trees;
        }
        config
    }
}

/// Run the `serve` command
pub async fn cmd_serve(
    config: &PipelineConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let artifacts = PipelineArtifacts::build(config)?;

    let mut server_config = ServerConfig::default();
    if let Some(host) = host {
        server_config.host = host;
    }
    if let Some(port) = port {
        server_config.port = port;
    }

    run_server(server_config, artifacts).await
}

/// Run the `report` command
pub fn cmd_report(config: &PipelineConfig) -> Result<()> {
    let artifacts = PipelineArtifacts::build(config)?;

    section("Dataset");
    kv("path    ", &config.data_path);
    kv("target  ", &artifacts.schema.target);
    kv("features", &format!(
        "{} original, {} encoded",
        artifacts.schema.n_features(),
        artifacts.feature_names.len()
    ));
    kv("eval    ", &format!("{} rows", artifacts.x_eval.nrows()));

    section("Classification report");
    for line in artifacts.report.to_string().lines() {
        println!("  {}", line);
    }

    section("Features by mean |attribution|, both classes");
    print_bars(&artifacts.summary_all.bars);

    section("Features by mean |attribution|, negative class");
    print_bars(&artifacts.summary_negative.bars);

    Ok(())
}

fn print_bars(bars: &[crate::render::SummaryBar]) {
    let max = bars
        .first()
        .map(|b| b.mean_abs_attribution)
        .unwrap_or(0.0)
        .max(f64::MIN_POSITIVE);
    for bar in bars {
        let width = ((bar.mean_abs_attribution / max) * 40.0).round() as usize;
        println!(
            "  {:>20} {} {:.4}",
            bar.feature,
            "█".repeat(width).truecolor(120, 170, 255),
            bar.mean_abs_attribution
        );
    }
}

/// Run the `explain` command
pub fn cmd_explain(config: &PipelineConfig, row: usize) -> Result<()> {
    let artifacts = PipelineArtifacts::build(config)?;
    let explanation = artifacts.explain_eval_record(row)?;
    print_explanation(&explanation, row, artifacts.y_eval[row]);
    Ok(())
}

fn print_explanation(explanation: &InputExplanation, row: usize, actual: usize) {
    section(&format!("Evaluation record {}", row));
    kv("predicted  ", &explanation.label.to_string());
    kv("probability", &format!("{:.3}", explanation.probability));
    kv("actual     ", &actual.to_string());
    kv("baseline   ", &format!("{:.3}", explanation.force.base_value));

    section("Contributions toward the positive class");
    for entry in &explanation.force.entries {
        let value = format!("{:+.4}", entry.attribution);
        let colored_value = if entry.attribution >= 0.0 {
            value.truecolor(220, 90, 90)
        } else {
            value.truecolor(90, 140, 220)
        };
        println!(
            "  {:>20} = {:<10.3} {}",
            entry.feature, entry.value, colored_value
        );
    }
}
