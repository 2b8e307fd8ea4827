// src/pipeline/pool.rs
// =============================================================================
// The bounded worker pool that probes every disallowed entry.
//
// How it works:
// 1. All entries are fed, in robots.txt order, into a scheduling queue
// 2. W producer workers pull entries from the queue and fetch them
// 3. Each fetch outcome, tagged with its entry index, goes on a completion
//    channel with room for W results
// 4. W consumer workers drain the completion channel: found bodies are
//    written to disk, everything else is recorded as a failure
// 5. Once every producer has finished, the last completion sender is
//    dropped, which closes the channel and lets the consumers stop
//
// W is the configured pool size clamped to the number of entries, so no
// idle workers are spawned for short lists. The pool never aborts itself:
// a transport failure is recorded against its entry and the scan goes on.
// =============================================================================

use super::report::{EntryReport, EntryStatus, ScanReport};
use crate::config::ScanConfig;
use crate::error::{ScanError, TransportKind};
use crate::fetch::Fetcher;
use crate::output::ResourceWriter;
use crate::resource::Resource;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};
use url::Url;

/// Number of producers (and consumers) for `entries` entries
pub fn pool_size(workers: usize, entries: usize) -> usize {
    workers.min(entries)
}

// One fetch outcome travelling from a producer to a consumer
struct Completed {
    index: usize,
    url: Url,
    outcome: Result<Resource, ScanError>,
}

type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;

pub struct Pipeline<F, W> {
    fetcher: Arc<F>,
    writer: Arc<W>,
    workers: usize,
}

impl<F, W> Pipeline<F, W>
where
    F: Fetcher + 'static,
    W: ResourceWriter + 'static,
{
    pub fn new(fetcher: Arc<F>, writer: Arc<W>, config: &ScanConfig) -> Self {
        Self::with_workers(fetcher, writer, config.workers())
    }

    pub fn with_workers(fetcher: Arc<F>, writer: Arc<W>, workers: usize) -> Self {
        Self {
            fetcher,
            writer,
            workers: workers.max(1),
        }
    }

    /// Probes every entry and returns one report line per entry
    pub async fn run(&self, target: &str, entries: Vec<Url>) -> ScanReport {
        let start = Instant::now();
        let total = entries.len();
        let size = pool_size(self.workers, total);

        if size == 0 {
            info!("Nothing to scan");
            return ScanReport::new(target, Vec::new(), start.elapsed());
        }

        info!("Starting the scan of {} entries with {} workers", total, size);

        let (scheduled_tx, scheduled_rx) = mpsc::channel::<(usize, Url)>(size);
        let (completed_tx, completed_rx) = mpsc::channel::<Completed>(size);

        // Producer pool first, so the queue starts draining immediately
        let producers: Vec<_> = worker_handles(scheduled_rx, size)
            .into_iter()
            .enumerate()
            .map(|(worker, queue)| {
                tokio::spawn(produce(
                    worker,
                    Arc::clone(&self.fetcher),
                    queue,
                    completed_tx.clone(),
                ))
            })
            .collect();

        let consumers: Vec<_> = worker_handles(completed_rx, size)
            .into_iter()
            .enumerate()
            .map(|(worker, results)| {
                tokio::spawn(consume(worker, Arc::clone(&self.writer), results))
            })
            .collect();

        // Feed the producers in robots.txt order
        for (index, url) in entries.into_iter().enumerate() {
            if scheduled_tx.send((index, url)).await.is_err() {
                error!("All producers stopped, {} entries were not scheduled", total - index);
                break;
            }
        }
        drop(scheduled_tx);

        for joined in join_all(producers).await {
            if let Err(e) = joined {
                error!("Producer worker failed: {}", e);
            }
        }

        // Producers are done, so this is the last sender: closing it tells
        // the consumers nothing else is coming once the channel is drained.
        drop(completed_tx);

        let mut reports = Vec::with_capacity(total);
        for joined in join_all(consumers).await {
            match joined {
                Ok(mut batch) => reports.append(&mut batch),
                Err(e) => error!("Consumer worker failed: {}", e),
            }
        }

        ScanReport::new(target, reports, start.elapsed())
    }
}

// One handle per worker. The receivers live only inside the workers, so
// once every worker on a side has stopped the channel is closed and the
// other side's sends fail instead of waiting forever.
fn worker_handles<T>(receiver: mpsc::Receiver<T>, count: usize) -> Vec<SharedReceiver<T>> {
    let shared = Arc::new(Mutex::new(receiver));
    let mut handles: Vec<_> = (1..count).map(|_| Arc::clone(&shared)).collect();
    handles.push(shared);
    handles
}

async fn produce<F: Fetcher>(
    worker: usize,
    fetcher: Arc<F>,
    queue: SharedReceiver<(usize, Url)>,
    completed: mpsc::Sender<Completed>,
) {
    loop {
        // The lock is only held while waiting for the next entry
        let next = queue.lock().await.recv().await;
        let Some((index, url)) = next else {
            break;
        };

        debug!("Producer {} fetching entry {}: {}", worker, index, url);
        let outcome = fetcher.fetch(&url).await;

        if completed.send(Completed { index, url, outcome }).await.is_err() {
            warn!("Completion channel closed, producer {} stopping", worker);
            break;
        }
    }
    debug!("Producer {} finished", worker);
}

async fn consume<W: ResourceWriter>(
    worker: usize,
    writer: Arc<W>,
    results: SharedReceiver<Completed>,
) -> Vec<EntryReport> {
    let mut reports = Vec::new();
    loop {
        let next = results.lock().await.recv().await;
        let Some(completed) = next else {
            break;
        };
        reports.push(handle_completed(writer.as_ref(), completed).await);
    }
    debug!("Consumer {} finished after {} entries", worker, reports.len());
    reports
}

// Turns one fetch outcome into its report line. The body is released
// before returning, whichever branch was taken.
async fn handle_completed<W: ResourceWriter + ?Sized>(
    writer: &W,
    completed: Completed,
) -> EntryReport {
    let Completed {
        index,
        url,
        outcome,
    } = completed;

    let status = match outcome {
        Ok(mut resource) => {
            let code = resource.status.as_u16();
            let status = if resource.found {
                match writer.write(&mut resource).await {
                    Ok(path) => {
                        info!("- {} [{}] saved", url, resource.status);
                        EntryStatus::Saved { status: code, path }
                    }
                    Err(e) => {
                        warn!("- {} [{}] could not be saved: {}", url, resource.status, e);
                        EntryStatus::PersistFailed {
                            status: code,
                            message: e.to_string(),
                        }
                    }
                }
            } else {
                info!("- {} [{}]", url, resource.status);
                EntryStatus::NotFound { status: code }
            };
            resource.body.close();
            status
        }
        Err(e) => {
            warn!("- {} failed: {}", url, e);
            EntryStatus::FetchFailed {
                kind: e.transport_kind().unwrap_or(TransportKind::Other),
                message: e.to_string(),
            }
        }
    };

    EntryReport {
        index,
        url: url.to_string(),
        status,
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why wrap the receivers in Arc<Mutex<..>>?
//    - tokio's mpsc has a single receiver
//    - W workers share it; whoever holds the lock takes the next item
//    - The lock is released as soon as recv() returns, before the fetch
//
// 2. When does the completion channel close?
//    - Each producer owns a clone of the sender and drops it when it exits
//    - run() drops its own copy only after join_all(producers), so the
//      channel cannot close while a producer might still send
//
// 3. What if a worker panics?
//    - join_all reports a JoinError, which is logged
//    - entries that worker held are missing from the report
//    - run() keeps no receiver of its own: if every consumer dies, the
//      producers' sends fail and they stop; if every producer dies, the
//      feeding loop's sends fail. Either way run() still returns.
// -----------------------------------------------------------------------------
