//! Replay command - feed a host list through the interception policy
//!
//! Each host is handled as if the proxy engine had reported a request for
//! it: blocked hosts are recorded in the metrics (when enabled) and counted
//! as disconnected. Hosts are spread over several tasks, the way concurrent
//! connection handlers would call the policy. Edits made to the settings
//! file by another process while a replay runs apply to the following hosts.

use super::Session;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use lockdown_core::{FileStore, InterceptionPolicy, Verdict};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Replay command arguments
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// File with one host per line ("-" for stdin)
    pub file: PathBuf,

    /// Number of concurrent workers
    #[arg(short, long, default_value = "4", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// Print the verdict for every host
    #[arg(long)]
    pub each: bool,
}

#[derive(Debug, Default)]
struct Tally {
    blocked: AtomicUsize,
    allowed: AtomicUsize,
    disconnected: AtomicUsize,
}

/// Execute replay command
pub fn execute(session: &Session, args: ReplayArgs) -> Result<()> {
    let hosts = read_hosts(&args.file)?;
    info!(hosts = hosts.len(), workers = args.workers, "Replaying host list");

    let policy = session.policy();
    let tally = Arc::new(Tally::default());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(usize::from(args.workers))
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let verdicts = runtime.block_on(replay(
        policy.clone(),
        session.store.clone(),
        hosts,
        args.workers,
        tally.clone(),
    ))?;

    if args.each {
        for (host, verdict) in &verdicts {
            match verdict {
                Verdict::Block { rule } => println!("{} {} (rule: {})", "BLOCK".red(), host, rule),
                Verdict::Allow => println!("{} {}", "ALLOW".green(), host),
            }
        }
    }

    println!("Hosts:        {}", verdicts.len());
    println!("Blocked:      {}", tally.blocked.load(Ordering::Relaxed).to_string().red());
    println!("Allowed:      {}", tally.allowed.load(Ordering::Relaxed).to_string().green());
    println!("Disconnected: {}", tally.disconnected.load(Ordering::Relaxed));

    let metrics = policy.metrics();
    if metrics.is_enabled() {
        println!("Total blocks recorded: {}", metrics.snapshot().total);
    } else {
        println!("{}", "Metrics disabled, nothing recorded".yellow());
    }

    Ok(())
}

async fn replay(
    policy: InterceptionPolicy,
    store: Arc<FileStore>,
    hosts: Vec<String>,
    workers: u16,
    tally: Arc<Tally>,
) -> Result<Vec<(String, Verdict)>> {
    let chunk_size = hosts.len().div_ceil(usize::from(workers)).max(1);
    let mut handles = Vec::new();

    for (worker, chunk) in hosts.chunks(chunk_size).enumerate() {
        let policy = policy.clone();
        let tally = tally.clone();
        let store = store.clone();
        let chunk = chunk.to_vec();

        // The policy may write the settings file, so run it off the async workers
        handles.push(tokio::task::spawn_blocking(move || {
            debug!(worker, hosts = chunk.len(), "Worker started");
            chunk
                .into_iter()
                .map(|host| {
                    refresh(&store);
                    let verdict = policy.on_request_observed(&host, || {
                        tally.disconnected.fetch_add(1, Ordering::Relaxed);
                    });
                    if verdict.is_block() {
                        tally.blocked.fetch_add(1, Ordering::Relaxed);
                    } else {
                        tally.allowed.fetch_add(1, Ordering::Relaxed);
                    }
                    (host, verdict)
                })
                .collect::<Vec<_>>()
        }));
    }

    let mut verdicts = Vec::with_capacity(hosts.len());
    for handle in handles {
        verdicts.extend(handle.await.context("Replay worker panicked")?);
    }
    Ok(verdicts)
}

/// Pick up settings written by another process since the last read
fn refresh(store: &FileStore) {
    match store.check_reload() {
        Ok(true) => debug!("Settings reloaded during replay"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Keeping cached settings, reload failed"),
    }
}

fn read_hosts(path: &Path) -> Result<Vec<String>> {
    let reader: Box<dyn BufRead> = if path == Path::new("-") {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open host list {}", path.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut hosts = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read host list")?;
        let host = line.trim();
        if !host.is_empty() && !host.starts_with('#') {
            hosts.push(host.to_string());
        }
    }
    Ok(hosts)
}
