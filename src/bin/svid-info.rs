//! Prints the SPIFFE ID and expiration of the workload's default X.509-SVID as JSON.
//!
//! ```bash
//! svid-info --endpoint unix:/tmp/spire-agent/public/api.sock
//! {"identity":"spiffe://example.org/workload-a","expiresAt":"2030-01-01T00:00:00Z"}
//! ```
//!
//! The exit code identifies the failure kind, so scripts can branch on it without parsing
//! the log output.

use std::io::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use svid_info::{resolve_endpoint_address, EndpointAddress, SvidFetchErrorKind, SvidFetcher};
use tracing::error;
use tracing_subscriber::EnvFilter;

const EXIT_INVALID_ENDPOINT: u8 = 2;
const EXIT_CONTEXT_FETCH_FAILED: u8 = 3;
const EXIT_EMPTY_CERTIFICATE_CHAIN: u8 = 4;
const EXIT_UNEXPECTED_FAILURE: u8 = 5;
const EXIT_TIMED_OUT: u8 = 6;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "svid-info", version)]
#[command(about = "Print the SPIFFE ID and expiration of the workload's X.509-SVID")]
struct Args {
    /// Workload API endpoint address (e.g. unix:/tmp/spire-agent/public/api.sock)
    #[arg(long, env = "SPIFFE_ENDPOINT_SOCKET")]
    endpoint: Option<String>,

    /// Seconds to wait for the Workload API before giving up
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), log_level)));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let address = args
        .endpoint
        .and_then(EndpointAddress::new)
        .unwrap_or_else(resolve_endpoint_address);

    let fetcher = SvidFetcher::new();
    let fetch = fetcher.fetch(&address);
    let svid_info = match tokio::time::timeout(Duration::from_secs(args.timeout_secs), fetch).await
    {
        Ok(Ok(svid_info)) => svid_info,
        Ok(Err(e)) => {
            eprintln!("svid-info: {e}");
            return Ok(ExitCode::from(exit_code(e.kind())));
        }
        Err(_) => {
            error!(
                "Workload API at {} did not answer within {}s",
                address, args.timeout_secs
            );
            eprintln!("svid-info: timed out after {}s", args.timeout_secs);
            return Ok(ExitCode::from(EXIT_TIMED_OUT));
        }
    };

    let json = serde_json::to_string(&svid_info).context("failed to serialize SVID info")?;
    writeln!(std::io::stdout().lock(), "{json}").context("failed to write to stdout")?;

    Ok(ExitCode::SUCCESS)
}

fn exit_code(kind: SvidFetchErrorKind) -> u8 {
    match kind {
        SvidFetchErrorKind::InvalidEndpoint => EXIT_INVALID_ENDPOINT,
        SvidFetchErrorKind::ContextFetchFailed => EXIT_CONTEXT_FETCH_FAILED,
        SvidFetchErrorKind::EmptyCertificateChain => EXIT_EMPTY_CERTIFICATE_CHAIN,
        _ => EXIT_UNEXPECTED_FAILURE,
    }
}
