//! wp-core binary entry point.

use clap::Parser;
use wp_core::cli::{run_parse, run_profile, Cli, Commands};
use wp_core::exit_codes::ExitCode;
use wp_core::pipeline::RunReport;

fn print_report(report: &RunReport) -> ExitCode {
    match serde_json::to_string_pretty(report) {
        Ok(json) => {
            println!("{json}");
            report.exit_code()
        }
        Err(e) => {
            eprintln!("error: failed to serialize run report: {e}");
            ExitCode::InternalError
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Parse(args) => {
            let json = args.json;
            match run_parse(args) {
                Ok(report) if json => print_report(&report),
                Ok(report) => report.exit_code(),
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::from(&e)
                }
            }
        }
        Commands::Profile(args) => match run_profile(args) {
            Ok(Some(report)) => report.exit_code(),
            Ok(None) => ExitCode::Clean,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(&e)
            }
        },
    };

    std::process::exit(code.as_i32());
}
