//! Machine converter CLI - machine API ↔ cluster API
//!
//! ```bash
//! machine-converter convert --input machineset.yaml --api capi --provider aws
//! machine-converter convert --input output.yaml --api mapi --provider aws --cluster-name prod-abc12 --region us-east-1
//! machine-converter providers
//! ```
//!
//! `--cluster-name` and `--region` fall back to `CLUSTER_NAME` and
//! `CLUSTER_REGION`, which may also come from a `.env` file.

use clap::{Parser, Subcommand};
use machine_converter::logs::LOG_BROADCASTER;
use machine_converter::{convert_file, providers, write_outputs, ConvertOptions};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "machine-converter")]
#[command(about = "Convert machine API machine sets to cluster API and back", long_about = None)]
struct Cli {
    /// Do not echo conversion logs to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a YAML file
    Convert {
        /// Input YAML file
        #[arg(short, long, default_value = "input.yaml")]
        input: PathBuf,

        /// API to convert to: capi or mapi
        #[arg(short, long)]
        api: String,

        /// Cloud provider
        #[arg(short, long, default_value = "aws")]
        provider: String,

        /// Cluster name restored when converting to mapi
        #[arg(long)]
        cluster_name: Option<String>,

        /// Region restored when converting to mapi
        #[arg(long)]
        region: Option<String>,

        /// Directory for output-<n>.yaml files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Print documents to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },

    /// List supported cloud providers
    Providers,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    LOG_BROADCASTER.set_echo(!cli.quiet);

    let result = match cli.command {
        Commands::Convert {
            input,
            api,
            provider,
            cluster_name,
            region,
            output_dir,
            stdout,
        } => {
            let options = ConvertOptions {
                provider,
                direction: api,
                cluster_name: cluster_name.or_else(|| env_value("CLUSTER_NAME")),
                region: region.or_else(|| env_value("CLUSTER_REGION")),
            };
            cmd_convert(&input, &options, &output_dir, stdout)
        }

        Commands::Providers => cmd_providers(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn cmd_convert(
    input: &Path,
    options: &ConvertOptions,
    output_dir: &Path,
    stdout: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!(
        "📄 Converting to {}, for cloud provider: {}",
        options.direction, options.provider
    );

    let output = convert_file(input, options)?;

    if stdout {
        for document in &output.documents {
            println!("---\n{}", document.trim_end());
        }
        return Ok(());
    }

    for path in write_outputs(output_dir, &output.documents)? {
        eprintln!("💾 Written: {}", path.display());
    }
    eprintln!("✨ Done!");
    Ok(())
}

fn cmd_providers() -> Result<(), Box<dyn std::error::Error>> {
    for provider in providers() {
        println!("{}", provider);
    }
    Ok(())
}
