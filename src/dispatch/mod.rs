use std::sync::Arc;

use colored::Colorize;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use indicatif::ProgressBar;
use itertools::iproduct;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task;

use crate::executor::{Executor, Method, Outcome};
use crate::target::normalize_url;

/// One (subdomain, endpoint, method) combination.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct WorkItem {
    pub subdomain: String,
    pub endpoint: String,
    pub method: Method,
}

/// A finished work item: what was asked, where it went and what came back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Probe {
    #[serde(flatten)]
    pub item: WorkItem,
    pub url: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("invalid concurrency 0, expected positive integer")]
    ZeroConcurrency,
}

pub fn work_item_count(subdomains: usize, endpoints: usize, methods: usize) -> usize {
    subdomains.saturating_mul(endpoints).saturating_mul(methods)
}

/// Fans the subdomain x endpoint x method cross product out over a bounded
/// pool of workers.
///
/// A worker owns one (subdomain, endpoint) pair and runs every method for it
/// in the order given, so at most `concurrency` requests are in flight at any
/// instant. Every work item yields exactly one [`Probe`].
pub struct Dispatcher<E: Executor> {
    executor: Arc<E>,
    concurrency: usize,
    progress: ProgressBar,
}

impl<E: Executor> Dispatcher<E> {
    pub fn new(executor: E, concurrency: usize) -> Result<Self, DispatchError> {
        Self::from_shared(Arc::new(executor), concurrency)
    }

    pub fn from_shared(executor: Arc<E>, concurrency: usize) -> Result<Self, DispatchError> {
        if concurrency == 0 {
            return Err(DispatchError::ZeroConcurrency);
        }
        Ok(Self {
            executor,
            concurrency,
            progress: ProgressBar::hidden(),
        })
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub async fn dispatch(
        &self,
        subdomains: &[String],
        endpoints: &[String],
        methods: &[Method],
    ) -> Vec<Probe> {
        let total = work_item_count(subdomains.len(), endpoints.len(), methods.len());
        if total == 0 {
            return Vec::new();
        }
        tracing::info!(
            total,
            targets = subdomains.len() * endpoints.len(),
            concurrency = self.concurrency,
            "dispatching requests"
        );

        let gate = Arc::new(Semaphore::new(self.concurrency));
        let methods: Arc<[Method]> = Arc::from(methods);
        // probes are tagged with the index of the pair that produced them
        let (probe_tx, mut probe_rx) = mpsc::unbounded_channel::<(usize, Probe)>();
        let workers = FuturesUnordered::new();

        for (pair, (subdomain, endpoint)) in
            iproduct!(subdomains.iter(), endpoints.iter()).enumerate()
        {
            // the gate is owned here and never closed, so acquiring only waits
            let permit = gate.clone().acquire_owned().await.ok();
            let executor = Arc::clone(&self.executor);
            let methods = Arc::clone(&methods);
            let probe_tx = probe_tx.clone();
            let pb = self.progress.clone();
            let subdomain = subdomain.clone();
            let endpoint = endpoint.clone();

            let handle = task::spawn({
                let subdomain = subdomain.clone();
                let endpoint = endpoint.clone();
                async move {
                    let _permit = permit;
                    let url = normalize_url(&subdomain, &endpoint);
                    pb.set_message(format!(
                        "{} {}",
                        "testing ::".bold().white(),
                        url.as_str().bold().blue()
                    ));
                    for &method in methods.iter() {
                        let outcome = executor.execute(method, &url).await;
                        tracing::debug!(%method, %url, ?outcome, "request finished");
                        pb.inc(1);
                        let probe = Probe {
                            item: WorkItem {
                                subdomain: subdomain.clone(),
                                endpoint: endpoint.clone(),
                                method,
                            },
                            url: url.clone(),
                            outcome,
                        };
                        if probe_tx.send((pair, probe)).is_err() {
                            break;
                        }
                    }
                }
            });
            workers.push(async move { (pair, subdomain, endpoint, handle.await) });
        }
        drop(probe_tx);

        let joined: Vec<_> = workers.collect().await;

        let mut probes = Vec::with_capacity(total);
        let mut reported = vec![0usize; subdomains.len() * endpoints.len()];
        while let Some((pair, probe)) = probe_rx.recv().await {
            reported[pair] += 1;
            probes.push(probe);
        }

        for (pair, subdomain, endpoint, result) in joined {
            if let Err(e) = result {
                tracing::error!(%subdomain, %endpoint, error = %e, "worker stopped early");
                // a worker reports its methods in order, so what is missing is a suffix
                let missing = methods.iter().skip(reported[pair]).copied();
                fill_missing(&mut probes, &subdomain, &endpoint, missing, &e.to_string());
            }
        }

        probes
    }
}

// records a failure for every method a dead worker never reported
fn fill_missing(
    probes: &mut Vec<Probe>,
    subdomain: &str,
    endpoint: &str,
    missing: impl Iterator<Item = Method>,
    reason: &str,
) {
    let url = normalize_url(subdomain, endpoint);
    for method in missing {
        probes.push(Probe {
            item: WorkItem {
                subdomain: subdomain.to_string(),
                endpoint: endpoint.to_string(),
                method,
            },
            url: url.clone(),
            outcome: Outcome::Failure {
                message: format!("worker for {url} stopped before {method}: {reason}"),
            },
        });
    }
}
