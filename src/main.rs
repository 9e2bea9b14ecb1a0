use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use txguard::application::machine::{Phase, TransactionStateMachine};
use txguard::application::session::WorkflowSession;
use txguard::config::{DEFAULT_API_URL, ServiceConfig, WorkflowConfig};
use txguard::domain::draft::DraftInput;
use txguard::domain::ports::{RiskAssessorBox, TransactionCommitterBox};
use txguard::domain::record::TransactionRecord;
use txguard::infrastructure::http::HttpGateway;
use txguard::infrastructure::in_memory::InMemoryHistory;
use txguard::interfaces::csv::record_writer::RecordWriter;
use txguard::interfaces::csv::request_reader::RequestReader;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input CSV file with `recipient,amount,remarks` rows
    input: PathBuf,

    /// Base URL of the risk and transaction services
    #[arg(long, env = "TXGUARD_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Upper bound, in seconds, on each analyze and send call
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Record confirmed payments in memory instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Cancel payments that require acknowledging a warning
    #[arg(long)]
    cancel_on_warning: bool,

    /// Number of send attempts before a confirmed payment is cancelled
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    send_attempts: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("txguard=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout_secs);

    let service = ServiceConfig {
        base_url: cli.api_url.clone(),
        request_timeout: timeout,
    };
    let gateway = HttpGateway::new(service).into_diagnostic()?;

    let assessor: RiskAssessorBox = Box::new(gateway.clone());
    let committer: TransactionCommitterBox = if cli.dry_run {
        Box::new(InMemoryHistory::new())
    } else {
        Box::new(gateway)
    };
    let machine = TransactionStateMachine::with_config(
        assessor,
        committer,
        WorkflowConfig::with_timeout(timeout),
    );
    let session = WorkflowSession::spawn(machine);

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = RequestReader::new(file);
    let stdout = io::stdout();
    let mut writer = RecordWriter::new(stdout.lock());

    for (row, request) in reader.requests().enumerate() {
        let row = row + 1;
        let input = match request {
            Ok(input) => input,
            Err(e) => {
                eprintln!("Row {row}: error reading request: {e}");
                continue;
            }
        };

        if let Some(record) = process(&session, &cli, row, input).await.into_diagnostic()? {
            writer.write_record(&record).into_diagnostic()?;
        }
        session.reset().await.into_diagnostic()?;
    }

    writer.flush().into_diagnostic()?;
    session.shutdown().await.into_diagnostic()?;
    Ok(())
}

/// Drives one request to a terminal record. `None` when the row was skipped.
async fn process(
    session: &WorkflowSession,
    cli: &Cli,
    row: usize,
    input: DraftInput,
) -> txguard::error::Result<Option<TransactionRecord>> {
    match session.submit(input).await? {
        Phase::Reviewing => {}
        Phase::Blocked => {
            warn!(row, "payment blocked by risk policy");
            return Ok(session.snapshot().record);
        }
        _ => {
            let snapshot = session.snapshot();
            let message = snapshot
                .error
                .map(|e| e.message())
                .unwrap_or_else(|| "request was not accepted".to_string());
            eprintln!("Row {row}: {message}");
            return Ok(None);
        }
    }

    let snapshot = session.snapshot();
    if snapshot.warning_acknowledgement {
        if cli.cancel_on_warning {
            info!(row, "cancelling payment that requires a warning acknowledgement");
            return session.cancel().await;
        }
        if let Some(risk) = &snapshot.risk {
            warn!(row, level = %risk.level, "{}", risk.level.summary());
        }
    }

    if let Some(cooldown) = snapshot.cooldown.filter(|c| !c.completed) {
        info!(row, seconds = cooldown.remaining_seconds, "waiting out cooldown");
    }
    session.wait_until_confirmable().await?;

    for attempt in 1..=cli.send_attempts {
        if session.confirm().await? == Phase::Success {
            return Ok(session.snapshot().record);
        }
        if let Some(error) = session.snapshot().error {
            eprintln!("Row {row}: attempt {attempt}: {}", error.message());
        }
    }
    session.cancel().await
}
