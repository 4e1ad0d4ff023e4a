//! `cert-gen` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use certgen_cli::cli::{Cli, Commands};
use certgen_cli::commands::{GenerateCommand, VerifyCommand};
use certgen_cli::output::OutputFormat;

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), certgen_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command() {
        Commands::Generate(args) => {
            let cmd = GenerateCommand::new(&cli.config, &cli.output_root);
            cmd.execute(&mut stdout, &format, &args)?;
        }
        Commands::Verify => {
            let cmd = VerifyCommand::new(&cli.config, &cli.output_root);
            cmd.execute(&mut stdout, &format)?;
        }
    }

    Ok(())
}
