//! code-analyzer CLI entry point.

use clap::Parser;
use code_analyzer::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();
    cli::init_logging(&cli.log_level);

    let outcome = match &cli.command {
        Commands::Analyze(args) => cli::run_analyze(args),
        Commands::Repo(args) => cli::run_repo(args),
        Commands::Init(args) => cli::run_init(args),
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
