//! Migrate a legacy price store to the per-item LP column layout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use data::migrate::{MigrationOutcome, migrate_file};

#[derive(Parser, Debug)]
#[command(about = "Migrate prices.json to the LP column schema")]
struct Args {
	/// Path to the legacy prices.json.
	#[arg(long, default_value = "prices.json")]
	input: PathBuf,

	/// Optional output path; defaults to rewriting the input in place.
	#[arg(long)]
	output: Option<PathBuf>,

	/// Do not create a backup when writing in place.
	#[arg(long)]
	no_backup: bool,
}

fn main() -> ExitCode {
	env_logger::init();
	let args = Args::parse();

	if !args.input.exists() {
		eprintln!("Input file '{}' does not exist", args.input.display());
		return ExitCode::FAILURE;
	}
	let output = args.output.clone().unwrap_or_else(|| args.input.clone());

	match migrate_file(&args.input, &output, !args.no_backup) {
		Ok(MigrationOutcome::AlreadyMigrated) => {
			println!(
				"{} already uses the LP schema; no changes made.",
				args.input.display()
			);
			ExitCode::SUCCESS
		}
		Ok(MigrationOutcome::Migrated { entries, backup }) => {
			if let Some(backup) = backup {
				println!("Backup created at {}", backup.display());
			}
			println!("Migrated {entries} entries to {}", output.display());
			ExitCode::SUCCESS
		}
		Err(err) => {
			eprintln!("Migration failed: {err:#}");
			ExitCode::FAILURE
		}
	}
}
