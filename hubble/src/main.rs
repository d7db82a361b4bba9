//! # hubble - Main Entry Point
//!
//! Replays a recorded flow file into the flow ring and runs one query:
//! - **Historical** (default): replay everything, then print the selected flows
//! - **Follow** (`--follow`): replay in the background and stream flows until
//!   Ctrl+C
//! - **Status** (`--status`): replay, then print ring occupancy

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use hubble::cli::{Args, FlowPrinter, ObserveConfig};
use hubble::container::Ring;
use hubble::domain::ReplayError;
use hubble::ingest::Ingest;
use hubble::observer::Observer;
use hubble::replay::replay_file;
use hubble::Flow;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_DATAERR: i32 = 65;

/// Flows queued between the replay and the writer thread
const WRITER_QUEUE_SIZE: usize = 1024;

/// Flows buffered between the query and the printer
const OUTPUT_QUEUE_SIZE: usize = 256;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ReplayError>() {
        Some(ReplayError::Parse { .. }) => EXIT_DATAERR,
        _ => EXIT_ERROR,
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let config = ObserveConfig::from(Args::parse());

    let ring = Ring::<Flow>::with_capacity(config.buffer_size).context("Invalid --buffer-size")?;
    let ring = Arc::new(ring);
    let observer = Observer::new(Arc::clone(&ring));
    let ingest =
        Ingest::spawn(Arc::clone(&ring), WRITER_QUEUE_SIZE).context("Failed to start flow writer")?;
    info!("Flow ring ready (capacity {})", ring.capacity());

    if config.follow {
        follow(&config, &observer, &ingest).await
    } else {
        snapshot(&config, &observer, ingest)
    }
}

/// Replay the whole file, then answer from the settled ring.
fn snapshot(config: &ObserveConfig, observer: &Observer<Flow>, ingest: Ingest<Flow>) -> Result<()> {
    let replayed = replay_file(&config.file, &ingest.sender(), config.replay_delay)?;
    let dropped = ingest.dropped();
    ingest.finish().context("Flow writer panicked")?;

    if config.status {
        let status = serde_json::to_string(&observer.server_status())?;
        println!("{status}");
        return Ok(());
    }

    // The writer has stopped, so the most recent flow is safe to include
    let batch = observer.historical_settled(&config.request());

    let mut printer = FlowPrinter::new(std::io::stdout().lock(), config.output);
    for flow in &batch.flows {
        printer.print(flow)?;
    }
    printer.flush()?;

    if !config.quiet {
        eprintln!(
            "{} flows shown ({replayed} replayed, {} held, {dropped} dropped)",
            batch.flows.len(),
            observer.ring().len()
        );
    }
    Ok(())
}

/// Replay in the background and stream flows until Ctrl+C or `--until`.
async fn follow(
    config: &ObserveConfig,
    observer: &Observer<Flow>,
    ingest: &Ingest<Flow>,
) -> Result<()> {
    let replay = {
        let (file, delay, tx) = (config.file.clone(), config.replay_delay, ingest.sender());
        std::thread::Builder::new()
            .name("hubble-replay".to_string())
            .spawn(move || {
                let result = replay_file(&file, &tx, delay);
                if let Err(ref e) = result {
                    error!("Replay stopped: {e}");
                }
                result
            })
            .context("Failed to start replay")?
    };

    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(OUTPUT_QUEUE_SIZE);
    let query = {
        let (observer, request, cancel) = (observer.clone(), config.request(), cancel.clone());
        tokio::spawn(async move { observer.get_flows(&request, &tx, &cancel).await })
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut printer = FlowPrinter::new(std::io::stdout(), config.output);
    loop {
        tokio::select! {
            flow = rx.recv() => {
                let Some(flow) = flow else { break };
                printer.print(&flow)?;
                printer.flush()?;
            }
            _ = &mut ctrl_c => break,
        }
    }

    cancel.cancel();
    let summary = query.await.context("Flow query task panicked")??;

    if !config.quiet {
        eprintln!("\n{} flows delivered, {} lost", summary.delivered, summary.lost);
    }

    // A replay still pacing through the file is abandoned with the process
    if replay.is_finished() {
        replay.join().map_err(|_| anyhow!("Replay thread panicked"))??;
    }
    Ok(())
}
