//! Turns the scattered findings of a pool into one ordered result.
use super::prober::PortProbeOutcome;
use log::debug;
use std::collections::HashSet;
use tokio::sync::mpsc;

/// Open ports gathered from a pool, not yet ordered.
#[derive(Debug, Default)]
pub struct Collector {
    open: HashSet<u16>,
    received: usize,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finding. Anything that is not open is ignored.
    pub fn push(&mut self, outcome: PortProbeOutcome) {
        self.received += 1;
        if let PortProbeOutcome::Open(port) = outcome {
            if !self.open.insert(port) {
                debug!("Port {port} was reported open twice");
            }
        }
    }

    /// Reads `results` until every sender is gone, then returns self.
    pub async fn drain(mut self, results: &mut mpsc::Receiver<PortProbeOutcome>) -> Self {
        while let Some(outcome) = results.recv().await {
            self.push(outcome);
        }
        debug!("Result stream closed after {} findings", self.received);
        self
    }

    /// How many outcomes reached the collector.
    pub const fn received(&self) -> usize {
        self.received
    }

    /// The open ports in ascending order, each once.
    pub fn into_sorted(self) -> Vec<u16> {
        let mut ports = self.open.into_iter().collect::<Vec<_>>();
        ports.sort_unstable();
        ports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::prober::ProbeFailure;
    use std::time::Duration;

    #[test]
    fn sorts_findings_regardless_of_arrival() {
        let mut collector = Collector::new();
        for port in [8080, 22, 443, 80, 3306] {
            collector.push(PortProbeOutcome::Open(port));
        }
        collector.push(PortProbeOutcome::Closed(21));
        collector.push(PortProbeOutcome::Error(25, ProbeFailure::TimedOut));

        assert_eq!(collector.received(), 7);
        assert_eq!(collector.into_sorted(), vec![22, 80, 443, 3306, 8080]);
    }

    #[test]
    fn duplicate_findings_are_kept_once() {
        let mut collector = Collector::new();
        collector.push(PortProbeOutcome::Open(80));
        collector.push(PortProbeOutcome::Open(80));
        assert_eq!(collector.into_sorted(), vec![80]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn drains_every_producer_before_returning() {
        let (tx, mut rx) = mpsc::channel(4);
        for chunk in 0..10u16 {
            let tx = tx.clone();
            tokio::spawn(async move {
                for port in (chunk * 100 + 1..=chunk * 100 + 100).rev() {
                    tx.send(PortProbeOutcome::Open(port)).await.unwrap();
                }
            });
        }
        drop(tx);

        let ports = Collector::new().drain(&mut rx).await.into_sorted();
        assert_eq!(ports, (1..=1000).collect::<Vec<u16>>());
    }

    #[tokio::test]
    async fn closed_stream_does_not_block() {
        let (tx, mut rx) = mpsc::channel::<PortProbeOutcome>(1);
        drop(tx);

        let collector = tokio::time::timeout(Duration::from_secs(1), Collector::new().drain(&mut rx))
            .await
            .expect("drain should return once the stream is closed");
        assert!(collector.into_sorted().is_empty());
    }
}
