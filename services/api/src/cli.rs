use crate::demo::{run_demo, DemoArgs};
use crate::infra::{load_dataset, parse_timestamp, write_dataset};
use crate::server;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use realty_match::config::AppConfig;
use realty_match::error::AppError;
use realty_match::telemetry;
use realty_match::workflows::matching::{InMemoryStore, MatchingService};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "Realty Match",
    about = "Match buyer profiles and saved searches against listings",
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
    /// Run matching passes against a JSON dataset
    Match {
        #[command(subcommand)]
        command: MatchCommand,
    },
    /// Seed a sample agency and walk through a matching day
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum MatchCommand {
    /// Run the profile matching pass once and print the report
    Run(MatchRunArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON dataset used to seed the in-memory store
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct MatchRunArgs {
    /// JSON dataset with profiles, properties, saved searches, and feedback
    #[arg(long)]
    pub(crate) dataset: PathBuf,
    /// Evaluation instant (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Also run the saved-search alert pass
    #[arg(long)]
    pub(crate) alerts: bool,
    /// Write the updated dataset back so later runs see match dates and sent listings
    #[arg(long)]
    pub(crate) write_back: bool,
}

#[derive(Serialize)]
struct MatchRunOutput<P, A> {
    matching: P,
    #[serde(skip_serializing_if = "Option::is_none")]
    alerts: Option<A>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Match {
            command: MatchCommand::Run(args),
        } => {
            let config = AppConfig::load()?;
            telemetry::init_stderr(&config.telemetry)?;
            run_match(args, config)
        }
        Command::Demo(args) => {
            let config = AppConfig::load()?;
            telemetry::init_stderr(&config.telemetry)?;
            run_demo(args)
        }
    }
}

fn run_match(args: MatchRunArgs, config: AppConfig) -> Result<(), AppError> {
    let dataset = load_dataset(&args.dataset)?;
    let now = args.now.unwrap_or_else(Utc::now);

    let store = Arc::new(InMemoryStore::from_dataset(dataset));
    let service = MatchingService::new(store.clone(), config.matching);

    let matching = service.run(now)?;
    let alerts = if args.alerts {
        Some(service.run_alerts(now)?)
    } else {
        None
    };

    let output = MatchRunOutput { matching, alerts };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if args.write_back {
        write_dataset(&args.dataset, &store.snapshot()?)?;
    }

    Ok(())
}
