//! Historian CLI — query slow-control channels from the terminal.

mod output;

use clap::{Parser, Subcommand, ValueEnum};
use historian_lib::{HistorianClient, TimeSpec};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "historian")]
#[command(about = "Slow-control historian CLI — latest values and range queries", long_about = None)]
struct Cli {
    /// Output format: plain (human-readable), json (structured).
    #[arg(short, long, default_value = "plain", value_enum)]
    output: OutputFormatArg,

    /// Historian username. Falls back to a prompt when unset.
    #[arg(long, env = "SC_USER")]
    username: Option<String>,

    /// Override the service base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Latest measured value for one channel
    Last { name: String },
    /// Latest values for the PMT channel batch
    Pmts,
    /// Historical range query for one channel
    Query {
        name: String,
        /// Range start: Unix seconds or a date/time like "2023-11-14 22:13:20"
        start: String,
        /// Range end, same forms as start
        end: String,
        #[arg(long, default_value = "LAB", value_parser = ["LAB", "RAWBYTIME"])]
        query_type: String,
        /// Sampling interval in seconds
        #[arg(long, default_value = "1")]
        interval: u32,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("historian {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let mut client = HistorianClient::new(cli.username.clone(), None);
    if let Some(ref base) = cli.base_url {
        if let Err(e) = client.set_base_url(base) {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    }
    if let Some(secs) = cli.timeout {
        client.set_timeout(Duration::from_secs(secs));
    }

    let format = match cli.output {
        OutputFormatArg::Plain => output::OutputFormat::Plain,
        OutputFormatArg::Json => output::OutputFormat::Json,
    };

    match run(&mut client, cli.command, format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    client: &mut HistorianClient,
    cmd: Commands,
    format: output::OutputFormat,
) -> Result<(), String> {
    let print_value = |v: &serde_json::Value| match format {
        output::OutputFormat::Plain => println!("{}", output::format_plain(v)),
        output::OutputFormat::Json => println!("{}", output::format_json(v).unwrap()),
    };

    match cmd {
        Commands::Last { name } => {
            let value = client
                .get_last_measured_value(&name)
                .await
                .map_err(|e| e.to_string())?;
            print_value(&value);
        }
        Commands::Pmts => {
            let value = client
                .get_last_measured_pmts()
                .await
                .map_err(|e| e.to_string())?;
            print_value(&value);
        }
        Commands::Query {
            name,
            start,
            end,
            query_type,
            interval,
        } => {
            let value = client
                .get_measurements(
                    &name,
                    parse_timespec(&start),
                    parse_timespec(&end),
                    Some(query_type.as_str()),
                    Some(interval),
                )
                .await
                .map_err(|e| e.to_string())?;
            print_value(&value);
        }
        Commands::Version => {}
    }
    Ok(())
}

/// Bare digits are Unix seconds; anything else is calendar text.
fn parse_timespec(s: &str) -> TimeSpec {
    match s.parse::<i64>() {
        Ok(secs) => TimeSpec::Unix(secs),
        Err(_) => TimeSpec::Text(s.to_string()),
    }
}
