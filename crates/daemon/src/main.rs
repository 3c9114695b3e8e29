// SPDX-License-Identifier: MIT

//! zsnap daemon (zsnapd)
//!
//! Background process that wakes up on a fixed interval and runs one
//! scheduling cycle over the configured volumes: snapshot, replicate,
//! clean.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod lifecycle;

use std::path::PathBuf;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use zsnap_adapters::{ShellRunner, TracedRunner};
use zsnap_core::scheduler::{CycleReport, VolumeOutcome};
use zsnap_core::{BucketCleaner, Config, Scheduler, SystemClock};

use crate::lifecycle::PidLock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let (config_path, check_only) = match args.as_slice() {
        [_, path] => (PathBuf::from(path), false),
        [_, path, flag] if flag == "--check" => (PathBuf::from(path), true),
        _ => {
            eprintln!("usage: zsnapd <config.toml> [--check]");
            std::process::exit(2);
        }
    };

    let config = match zsnap_core::config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("zsnapd: {}", e);
            std::process::exit(1);
        }
    };

    if check_only {
        println!("configuration OK: {} volumes", config.volumes.len());
        return Ok(());
    }

    let _log_guard = setup_logging(&config)?;

    info!(
        config = %config_path.display(),
        volumes = config.volumes.len(),
        interval = %humantime::format_duration(config.interval),
        "starting zsnapd"
    );

    let pid_lock = match &config.pid_file {
        Some(path) => Some(PidLock::acquire(path)?),
        None => None,
    };

    let runner = TracedRunner::new(ShellRunner::new());
    let clock = SystemClock;
    let cleaner = BucketCleaner::new(runner.clone(), clock.clone());
    let scheduler = Scheduler::new(runner, clock, cleaner, config.clone());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        match scheduler.run_cycle().await {
            Ok(report) => log_report(&report),
            Err(e) => error!(error = %e, "scheduling cycle failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    if let Some(lock) = pid_lock {
        lock.release();
    }
    info!("daemon stopped");
    Ok(())
}

fn log_report(report: &CycleReport) {
    for volume in &report.volumes {
        match &volume.outcome {
            VolumeOutcome::Completed {
                snapshotted,
                transfers,
                cleaned,
            } => info!(
                dataset = %volume.dataset,
                snapshotted,
                transfers,
                cleaned,
                "volume processed"
            ),
            VolumeOutcome::Failed(e) => {
                error!(dataset = %volume.dataset, error = %e, "volume failed")
            }
            VolumeOutcome::UnknownDataset => {
                warn!(dataset = %volume.dataset, "configured dataset does not exist")
            }
            VolumeOutcome::Idle => {}
        }
    }
    if report.fired() > 0 {
        info!(
            volumes = report.volumes.len(),
            fired = report.fired(),
            failed = report.failures().count(),
            "cycle complete"
        );
    }
}

fn setup_logging(
    config: &Config,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "zsnapd.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
            Ok(None)
        }
    }
}
