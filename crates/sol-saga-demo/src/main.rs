mod error;
mod order;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sol_saga::{CancellationToken, SagaConfig};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::error::DemoError;
use crate::order::{ORDER_ACTIVITY, Outcome};

#[derive(Parser)]
#[command(name = "sol-saga-demo")]
#[command(about = "Run the sample order saga and print its ledger", long_about = None)]
struct Cli {
    /// Name of the saga
    #[arg(long, default_value = "Order")]
    saga_name: String,

    /// Result reported by the order activity
    #[arg(long, value_enum, default_value_t = Outcome::Success)]
    outcome: Outcome,

    /// TOML file with a `[saga]` table
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(DemoError::Runtime)
        .and_then(|runtime| runtime.block_on(run(cli)));

    if let Err(e) = result {
        print_error(&e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), DemoError> {
    let config = match &cli.config {
        Some(path) => SagaConfig::load(path)?,
        None => SagaConfig::default(),
    };
    let mut saga = order::order_saga(&cli.saga_name, cli.outcome, config)?;

    println!("Saga Name => {}", saga.name());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling saga");
            on_interrupt.cancel();
        }
    });

    saga.execute_with_cancellation(&cancel).await?;

    println!("{}", saga.ledger().summary());
    if let Some(payload) = saga
        .ledger()
        .find(ORDER_ACTIVITY, true)
        .and_then(|record| record.result().payload::<String>())
    {
        println!("{payload}");
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn print_error(error: &DemoError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
