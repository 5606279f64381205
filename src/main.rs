use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use timed::{cli::Cli, timed, Recorder};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn fetch(delay_ms: u64) -> usize {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    delay_ms as usize
}

async fn store(delay_ms: u64, bytes: usize) -> usize {
    tokio::time::sleep(Duration::from_millis(delay_ms / 2)).await;
    bytes
}

async fn flaky(delay_ms: u64) -> std::result::Result<(), String> {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    Err("upstream unavailable".to_string())
}

/// Call each demo function `calls` times through its timing wrapper
async fn run_demo(args: &Cli) {
    let fetch = timed!(fetch);
    let store = timed!(store);
    let flaky = timed!(flaky);

    for _ in 0..args.calls {
        let bytes = fetch.call((args.delay_ms,)).await;
        store.call((args.delay_ms, bytes)).await;
    }

    if args.fail {
        if let Err(e) = flaky.try_call((args.delay_ms,)).await {
            eprintln!("{} failed: {} (not timed)", flaky.name(), e);
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    if args.calls == 0 {
        anyhow::bail!("Invalid value for --calls: 0 (must be >= 1)");
    }

    init_tracing(args.debug);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(run_demo(&args));

    if args.dump {
        Recorder::global().dump(&mut std::io::stdout())?;
        println!();
    }

    timed::process_logs()?;

    Ok(())
}
