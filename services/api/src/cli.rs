use crate::report::{run_evaluate, run_thresholds, EvaluateArgs, ThresholdsArgs};
use crate::server;
use care_compliance::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Care Compliance",
    about = "Evaluate adult family home vitals, credentials, and medication compliance",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a JSON snapshot of records and print the compliance report
    Evaluate(EvaluateArgs),
    /// Print the active threshold table
    Thresholds(ThresholdsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// CSV or JSON threshold table to use instead of the configured one
    #[arg(long)]
    pub(crate) thresholds: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args),
        Command::Thresholds(args) => run_thresholds(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["care-compliance-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn evaluate_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "care-compliance-api",
            "evaluate",
            "--input",
            "snapshot.json",
            "--today",
            "2025-03-15",
            "--json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Evaluate(args)) => {
                assert_eq!(args.input, PathBuf::from("snapshot.json"));
                assert_eq!(
                    args.today,
                    chrono::NaiveDate::from_ymd_opt(2025, 3, 15)
                );
                assert!(args.json);
                assert!(args.thresholds.is_none());
            }
            other => panic!("expected evaluate command, got {other:?}"),
        }
    }

    #[test]
    fn malformed_today_is_rejected() {
        let parsed = Cli::try_parse_from([
            "care-compliance-api",
            "evaluate",
            "--input",
            "snapshot.json",
            "--today",
            "15/03/2025",
        ]);
        assert!(parsed.is_err());
    }
}
