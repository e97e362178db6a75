use crate::commands::{run_etl_command, run_report_command, EtlArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use selection_dw::config::AppConfig;
use selection_dw::error::AppError;
use selection_dw::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "selection-dw",
    about = "Build the recruitment selection warehouse and report hiring KPIs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the candidate export, build the star schema and load it (default command)
    Etl(EtlArgs),
    /// Print the hiring KPIs of an existing warehouse
    Report(ReportArgs),
    /// Serve health, metrics and KPI endpoints over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Warehouse database to report from
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Etl(EtlArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match command {
        Command::Etl(args) => run_etl_command(args, &config),
        Command::Report(args) => run_report_command(args, &config),
        Command::Serve(args) => server::run(args, config).await,
    }
}
