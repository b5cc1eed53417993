use std::process::Command;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for scrollkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, tests and docs in sequence
    Check,
    /// Run all unit tests
    Test,
    /// Run the timing programs under each crate's benches/
    Bench {
        /// Only run benches of this crate (e.g. scrollkit-spatial)
        #[arg(short, long)]
        package: Option<String>,
    },
    /// Smoke-run every CLI subcommand with small inputs
    Smoke,
}

const BENCH_CRATES: [&str; 3] = ["scrollkit-spatial", "scrollkit-render", "scrollkit-stream"];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt", &["fmt", "--all", "--", "--check"])?;
            cargo(
                "clippy",
                &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            )?;
            cargo("test", &["test", "--workspace"])?;
            cargo("doc", &["doc", "--workspace", "--no-deps"])?;
        }
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Bench { package } => {
            let selected: Vec<&str> = match package.as_deref() {
                Some(p) if BENCH_CRATES.contains(&p) => vec![p],
                Some(p) => anyhow::bail!("{p} has no benches; pick one of {BENCH_CRATES:?}"),
                None => BENCH_CRATES.to_vec(),
            };
            for p in selected {
                cargo("bench", &["bench", "-p", p])?;
            }
        }
        Commands::Smoke => {
            let runs: [&[&str]; 4] = [
                &["info"],
                &["collide", "--bodies", "300", "--verify"],
                &["scroll", "--frames", "60"],
                &["regions", "--side", "3", "--steps", "60"],
            ];
            for args in runs {
                let mut full = vec!["run", "-q", "-p", "scrollkit-cli", "--"];
                full.extend_from_slice(args);
                cargo(args[0], &full)?;
            }
        }
    }

    Ok(())
}

fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> cargo {label}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {label} failed");
    }
    Ok(())
}
