//! PDF Inverter CLI
//!
//! Command-line front-end for producing black/white inverted PDFs.

use clap::Parser;
use pdf_invert::{
    config::{default_output_dir, ShellConfig},
    shell::{Shell, TriggerOutcome},
    InvertOptions,
};
use std::path::PathBuf;

/// Write a black/white inverted copy of a PDF next to your other files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PDF file(s); only the first PDF is processed
    input: Vec<PathBuf>,

    /// Directory for the `_processed.pdf` copy (defaults to your home directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Resolution pages are rasterized at
    #[arg(short, long, default_value = "100")]
    dpi: f32,

    /// Compress PDF streams (reduces file size)
    #[arg(short, long, default_value_t = true, action = clap::ArgAction::Set)]
    compress_streams: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = ShellConfig {
        output_dir: args.output_dir.unwrap_or_else(default_output_dir),
        options: InvertOptions {
            dpi: args.dpi,
            compress_streams: args.compress_streams,
        },
    };

    println!("PDF Inverter");
    println!("============");

    let mut shell = Shell::new(config);
    shell.select(args.input);

    match shell.trigger() {
        TriggerOutcome::Started(job) => {
            if args.verbose {
                println!("Input:  {:?}", job.input);
                println!("Output: {:?}", job.output);
            }
            println!("{}", shell.status());
        }
        TriggerOutcome::NotStarted(reason) => anyhow::bail!("Could not start: {}", reason),
        TriggerOutcome::NoFileSelected | TriggerOutcome::Busy => {
            anyhow::bail!("{}", shell.status())
        }
    }

    shell.wait(|status| println!("{}", status));

    if shell.last_run_failed() {
        anyhow::bail!("Inversion did not complete");
    }

    Ok(())
}
