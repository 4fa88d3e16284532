//! A fixed number of workers draining a shared [`PortSource`].
use super::prober::{PortProbeOutcome, Probe, ProbeFailure};
use crate::port_source::PortSource;
use crate::warning;
use colored::Colorize;
use log::debug;
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::{
    sync::mpsc,
    task::{JoinHandle, JoinSet},
};

/// How the workers talk to the terminal while they run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusLines {
    /// Also report closed and failed ports.
    pub verbose: bool,
    pub greppable: bool,
    pub accessible: bool,
}

impl StatusLines {
    /// The stderr line for one outcome, if any should be printed.
    ///
    /// Open ports are always announced, closed and failed ones only when
    /// verbose. Greppable mode prints nothing. Descriptor exhaustion is
    /// reported once per pool instead, so it never gets a line here.
    pub fn line(&self, outcome: PortProbeOutcome) -> Option<String> {
        if self.greppable {
            return None;
        }

        match outcome {
            PortProbeOutcome::Open(port) if self.accessible => Some(format!("Open {port}")),
            PortProbeOutcome::Open(port) => Some(format!("Open {}", port.to_string().purple())),
            PortProbeOutcome::Error(_, ProbeFailure::ResourceExhausted) => None,
            PortProbeOutcome::Closed(port) if self.verbose => Some(format!("Closed {port}")),
            PortProbeOutcome::Error(port, failure) if self.verbose => {
                Some(format!("Closed {port} ({failure})"))
            }
            _ => None,
        }
    }
}

/// What a finished pool did, gathered once every worker has been joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Ports each worker probed, indexed by worker.
    pub probed_per_worker: Vec<usize>,
    /// Workers that panicked instead of returning.
    pub failed_workers: usize,
}

impl PoolReport {
    pub fn probed(&self) -> usize {
        self.probed_per_worker.iter().sum()
    }
}

/// The open findings of a running pool.
///
/// `results` yields `None` only after the last worker has returned: each
/// worker owns one sender and the channel closes when the last of them is
/// dropped. `workers` resolves once the join set is empty.
#[derive(Debug)]
pub struct ResultStream {
    pub results: mpsc::Receiver<PortProbeOutcome>,
    pub workers: JoinHandle<PoolReport>,
}

/// State every worker of one pool reads.
#[derive(Debug)]
struct Shared<P> {
    source: Arc<PortSource>,
    target: Option<IpAddr>,
    prober: Arc<P>,
    status: StatusLines,
    exhaustion_reported: AtomicBool,
}

/// Spawns exactly `workers` tasks onto the runtime.
#[derive(Debug)]
pub struct WorkerPool<P> {
    prober: Arc<P>,
    workers: NonZeroUsize,
    status: StatusLines,
}

impl<P: Probe> WorkerPool<P> {
    pub const fn new(prober: Arc<P>, workers: NonZeroUsize, status: StatusLines) -> Self {
        Self {
            prober,
            workers,
            status,
        }
    }

    /// Starts the workers against `target`.
    ///
    /// A `None` target means the host could not be resolved: every port is
    /// then reported as [`ProbeFailure::Unresolved`] without any network
    /// traffic, and the pool still runs the source to exhaustion.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run(self, source: Arc<PortSource>, target: Option<IpAddr>) -> ResultStream {
        let workers = self.workers.get();
        let (tx, results) = mpsc::channel(workers);
        let shared = Arc::new(Shared {
            source,
            target,
            prober: self.prober,
            status: self.status,
            exhaustion_reported: AtomicBool::new(false),
        });

        let mut set = JoinSet::new();
        for id in 0..workers {
            set.spawn(worker(id, Arc::clone(&shared), tx.clone()));
        }
        // From here on the workers hold the only senders.
        drop(tx);

        let watcher = tokio::spawn(async move {
            let mut report = PoolReport {
                probed_per_worker: vec![0; workers],
                failed_workers: 0,
            };
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((id, probed)) => report.probed_per_worker[id] = probed,
                    Err(e) => {
                        debug!("Worker did not finish: {e}");
                        report.failed_workers += 1;
                    }
                }
            }
            debug!("All {workers} workers joined, {} ports probed", report.probed());
            report
        });

        ResultStream {
            results,
            workers: watcher,
        }
    }
}

/// One unit of the pool: take a port, probe it, forward it if open, repeat
/// until the source runs dry. Returns its id and how many ports it probed.
async fn worker<P: Probe>(
    id: usize,
    shared: Arc<Shared<P>>,
    results: mpsc::Sender<PortProbeOutcome>,
) -> (usize, usize) {
    let mut probed = 0;

    while let Some(port) = shared.source.next_port() {
        let outcome = match shared.target {
            Some(ip) => shared.prober.probe(SocketAddr::new(ip, port)).await,
            None => PortProbeOutcome::Error(port, ProbeFailure::Unresolved),
        };
        probed += 1;
        shared.report(outcome);

        if outcome.is_open() && results.send(outcome).await.is_err() {
            debug!("Worker {id} stopping, nobody is collecting results");
            break;
        }
    }

    debug!("Worker {id} done after {probed} ports");
    (id, probed)
}

impl<P> Shared<P> {
    fn report(&self, outcome: PortProbeOutcome) {
        if let PortProbeOutcome::Error(_, ProbeFailure::ResourceExhausted) = outcome {
            if !self.exhaustion_reported.swap(true, Ordering::Relaxed) {
                warning!(
                    "Too many open files. Please reduce the worker count.",
                    self.status.greppable,
                    self.status.accessible
                );
            }
        }
        if let Some(line) = self.status.line(outcome) {
            eprintln!("{line}");
        }
    }
}
