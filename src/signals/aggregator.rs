// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Concurrent signal aggregation.
//!
//! Every collector runs as its own task on a [`JoinSet`]. A semaphore bounds
//! how many run at once; the per-collector timeout starts once a task holds
//! its permit, so queueing never eats into a collector's budget.
//!
//! The aggregator waits for every task to settle. Cancelling the supplied
//! token aborts all in-flight tasks, as does dropping the returned future.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use super::{CollectorOutput, SignalCollector, SignalSet, SignalStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("signal aggregation was cancelled")]
pub struct AggregationCancelled;

enum Settled {
    Done(CollectorOutput),
    Failed(SignalStatus),
}

pub struct SignalAggregator {
    collectors: Vec<Arc<dyn SignalCollector>>,
    pool_size: usize,
    timeout: Duration,
}

impl SignalAggregator {
    pub fn new(
        collectors: Vec<Arc<dyn SignalCollector>>,
        pool_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            collectors,
            pool_size: pool_size.max(1),
            timeout,
        }
    }

    /// Run all collectors for `address` and merge their results.
    pub async fn aggregate(
        &self,
        address: Address,
        cancel: &CancellationToken,
    ) -> Result<SignalSet, AggregationCancelled> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("aggregate", %run_id, %address);
        self.run(address, cancel).instrument(span).await
    }

    async fn run(
        &self,
        address: Address,
        cancel: &CancellationToken,
    ) -> Result<SignalSet, AggregationCancelled> {
        let started = Instant::now();
        let permits = Arc::new(Semaphore::new(self.pool_size));
        let mut tasks = JoinSet::new();

        for collector in &self.collectors {
            let collector = Arc::clone(collector);
            let permits = Arc::clone(&permits);
            let timeout = self.timeout;
            tasks.spawn(
                async move {
                    let kind = collector.kind();
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return (kind, Settled::Failed(SignalStatus::Error));
                    };
                    let outcome = tokio::time::timeout(timeout, collector.collect(address)).await;
                    let settled = match outcome {
                        Ok(Ok(output)) => Settled::Done(output),
                        Ok(Err(err)) => {
                            warn!(
                                collector = kind.as_str(),
                                error = %err,
                                "collector failed, using neutral default"
                            );
                            Settled::Failed(SignalStatus::Error)
                        }
                        Err(_) => {
                            warn!(
                                collector = kind.as_str(),
                                timeout_ms = timeout.as_millis() as u64,
                                "collector timed out, using neutral default"
                            );
                            Settled::Failed(SignalStatus::TimedOut)
                        }
                    };
                    (kind, settled)
                }
                .in_current_span(),
            );
        }

        // Slots that never report (panicked task) stay at Error.
        let mut set = SignalSet::neutral(SignalStatus::Error);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    info!("aggregation cancelled");
                    return Err(AggregationCancelled);
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((kind, Settled::Done(output)))) => {
                        if !set.record(kind, output) {
                            warn!(
                                collector = kind.as_str(),
                                "collector returned mismatched output"
                            );
                            set.degrade(kind, SignalStatus::Error);
                        }
                    }
                    Some(Ok((kind, Settled::Failed(status)))) => set.degrade(kind, status),
                    Some(Err(err)) => warn!(error = %err, "collector task aborted"),
                },
            }
        }

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "signals aggregated");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::providers::ProviderError;
    use crate::signals::{ActivitySnapshot, CollectorError, RiskSignal, SignalKind};

    struct Fixed {
        kind: SignalKind,
        delay: Duration,
        output: Option<CollectorOutput>,
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn new(kind: SignalKind, delay_ms: u64, output: Option<CollectorOutput>) -> Self {
            Self {
                kind,
                delay: Duration::from_millis(delay_ms),
                output,
                running: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn risk(kind: SignalKind, count: u64) -> Self {
            Self::new(
                kind,
                0,
                Some(CollectorOutput::Risk(RiskSignal {
                    count,
                    weighted_score: count as f64,
                })),
            )
        }
    }

    #[async_trait]
    impl SignalCollector for Fixed {
        fn kind(&self) -> SignalKind {
            self.kind
        }

        async fn collect(&self, _address: Address) -> Result<CollectorOutput, CollectorError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.output
                .clone()
                .ok_or(CollectorError::Provider(ProviderError::Status(500)))
        }
    }

    fn activity() -> Fixed {
        Fixed::new(
            SignalKind::Activity,
            0,
            Some(CollectorOutput::Activity(ActivitySnapshot {
                tx_count: 10,
                ..Default::default()
            })),
        )
    }

    #[tokio::test]
    async fn merges_all_collectors() {
        let aggregator = SignalAggregator::new(
            vec![
                Arc::new(activity()),
                Arc::new(Fixed::risk(SignalKind::Tokens, 1)),
                Arc::new(Fixed::risk(SignalKind::Contracts, 2)),
                Arc::new(Fixed::risk(SignalKind::Approvals, 3)),
                Arc::new(Fixed::risk(SignalKind::Nfts, 4)),
            ],
            8,
            Duration::from_secs(1),
        );
        let set = aggregator
            .aggregate(Address::ZERO, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(set.activity.value.tx_count, 10);
        assert_eq!(set.tokens.value.count, 1);
        assert_eq!(set.contracts.value.count, 2);
        assert_eq!(set.approvals.value.count, 3);
        assert_eq!(set.nfts.value.count, 4);
        assert_eq!(set.statuses().nfts, SignalStatus::Ok);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_and_errors_fail_open() {
        let aggregator = SignalAggregator::new(
            vec![
                Arc::new(activity()),
                Arc::new(Fixed::new(SignalKind::Tokens, 60_000, None)),
                Arc::new(Fixed::new(SignalKind::Contracts, 0, None)),
                Arc::new(Fixed::risk(SignalKind::Approvals, 3)),
                Arc::new(Fixed::risk(SignalKind::Nfts, 4)),
            ],
            8,
            Duration::from_secs(12),
        );
        let set = aggregator
            .aggregate(Address::ZERO, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(set.tokens.status, SignalStatus::TimedOut);
        assert_eq!(set.tokens.value, RiskSignal::default());
        assert_eq!(set.contracts.status, SignalStatus::Error);
        assert_eq!(set.approvals.value.count, 3);
        assert_eq!(set.activity.status, SignalStatus::Ok);
    }

    #[tokio::test(start_paused = true)]
    async fn pool_bounds_concurrency() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let collectors: Vec<Arc<dyn SignalCollector>> = (0..5)
            .map(|_| {
                let mut c = Fixed::risk(SignalKind::Tokens, 1);
                c.delay = Duration::from_millis(100);
                c.running = running.clone();
                c.peak = peak.clone();
                Arc::new(c) as Arc<dyn SignalCollector>
            })
            .collect();
        let aggregator = SignalAggregator::new(collectors, 2, Duration::from_secs(1));
        aggregator
            .aggregate(Address::ZERO, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_waiting() {
        let aggregator = SignalAggregator::new(
            vec![Arc::new(Fixed::new(SignalKind::Tokens, 60_000, None))],
            8,
            Duration::from_secs(120),
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let result = aggregator.aggregate(Address::ZERO, &cancel).await;
        assert_eq!(result, Err(AggregationCancelled));
    }
}
