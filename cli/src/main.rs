//! Promresult CLI
//!
//! Command-line interface for decoding and inspecting metrics query responses.
//!
//! # Usage
//!
//! ```bash
//! promresult --help
//! curl -s 'http://prometheus:9090/api/v1/query?query=up' | promresult --query up decode
//! promresult --input response.json first-value
//! promresult --input response.json labels --key namespace,pod
//! ```

#![deny(unsafe_code)]

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use shared::config::{DecodeConfig, DEFAULT_TIMESTAMP_RESOLUTION};
use shared::extract::labels_by_key;
use shared::prom::{Decoder, LABEL_PREFIX};
use tracing_subscriber::EnvFilter;

/// Promresult CLI - decode and inspect metrics query responses
#[derive(Parser)]
#[command(name = "promresult")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path of the raw query response, or `-` for stdin
    #[arg(short, long, env = "PROMRESULT_INPUT", default_value = "-", global = true)]
    input: String,

    /// Query text the response belongs to, used in diagnostics
    #[arg(short, long, env = "PROMRESULT_QUERY", default_value = "", global = true)]
    query: String,

    /// Sample timestamps are snapped to multiples of this value
    #[arg(
        long,
        env = "PROMRESULT_TIMESTAMP_RESOLUTION",
        default_value_t = DEFAULT_TIMESTAMP_RESOLUTION,
        global = true
    )]
    timestamp_resolution: f64,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode the response and print the result set as JSON
    Decode {
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the value of the first sample of the first result
    FirstValue,
    /// Print the labels of every result, keyed by the given fields and cluster
    Labels {
        /// Label fields forming the key, comma separated
        #[arg(short, long = "key", value_delimiter = ',', default_value = "namespace,pod")]
        keys: Vec<String>,

        /// Cluster id used when a result carries none
        #[arg(
            long,
            env = "PROMRESULT_DEFAULT_CLUSTER_ID",
            default_value = "cluster-one"
        )]
        default_cluster_id: String,

        /// Prefix identifying label fields
        #[arg(long, default_value = LABEL_PREFIX)]
        label_prefix: String,
    },
}

impl Cli {
    fn decode_config(&self) -> DecodeConfig {
        let mut config = DecodeConfig {
            timestamp_resolution: self.timestamp_resolution,
            ..DecodeConfig::default()
        };
        if let Some(Commands::Labels { label_prefix, .. }) = &self.command {
            config.label_prefix.clone_from(label_prefix);
        }
        config
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let Some(command) = &cli.command else {
        println!("Promresult CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("Use --help for usage information");
        return Ok(());
    };

    let config = cli.decode_config();
    let decoder = Decoder::new(&config).context("Invalid decoder configuration")?;
    let raw = read_input(&cli.input)?;
    let results = decoder.decode(&cli.query, &raw)?;

    tracing::debug!(
        query = %cli.query,
        results = results.len(),
        "Decoded query response"
    );

    match command {
        Commands::Decode { pretty } => {
            let rendered = output::RenderedResults::from(&results);
            let json = if *pretty {
                serde_json::to_string_pretty(&rendered)?
            } else {
                serde_json::to_string(&rendered)?
            };
            println!("{json}");
        }
        Commands::FirstValue => {
            println!("{}", results.get_first_value()?);
        }
        Commands::Labels {
            keys,
            default_cluster_id,
            ..
        } => {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            let labels =
                labels_by_key(&results, &keys, decoder.label_prefix(), default_cluster_id)?;
            println!("{}", serde_json::to_string_pretty(&labels)?);
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_input(input: &str) -> Result<Value> {
    let text = if input == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read response from stdin")?
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read response from {input}"))?
    };

    serde_json::from_str(&text).context("Response is not valid JSON")
}
