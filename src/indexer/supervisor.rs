//! Process-wide orchestration of Source Indexer tasks (module C6:
//! Supervisor).
//!
//! The Supervisor owns the lifetime of every [`SourceIndexer`] task: it
//! spawns one per enabled [`Source`] at startup, restarts a task that
//! exits with an error (exponential backoff, reset after a healthy run),
//! reacts to `source.enable`/`source.disable` on the [`EventBus`] by
//! spawning or winding one down, and — for `Factory` sources — turns a
//! `factory.new-contract` event into a brand-new child `Source` row and
//! task. On shutdown it waits a bounded grace period for in-flight windows
//! to finish before aborting stragglers.
//!
//! Adapted from the teacher's WebSocket reconnect loop
//! (`realtime_processor::RealtimeProcessor::start`): a `tokio::select!`
//! over task completion, bus events, and the shared shutdown token, with
//! backoff on repeated failure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{AbortHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::bus::{BusEvent, EventBus, NewSourceDescriptor};
use crate::error::{AppError, DomainError, Result};
use crate::indexer::source_indexer::SourceIndexer;
use crate::ports::{Cache, ControlPlaneStore, IndexStore, LogPublisher, SourceStore};
use crate::types::entities::{Blockchain, Source, SourceParams};
use crate::types::enums::{DecodeFailurePolicy, SourceStatus, SourceType};

/// Initial restart backoff.
const BASE_BACKOFF: Duration = Duration::from_secs(1);
/// Restart backoff ceiling.
const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// A task that ran at least this long before crashing has its backoff
/// counter reset, so one failure after a long healthy run doesn't inherit
/// a stale long delay.
const HEALTHY_RESET: Duration = Duration::from_secs(300);
/// How long to wait for a disabled source's indexer to reach `Stopped`
/// before force-aborting it.
const DISABLE_GRACE: Duration = Duration::from_secs(60);
const DISABLE_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// How long `run` waits for in-flight windows to finish on shutdown
/// before aborting remaining tasks.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Per-source restart backoff bookkeeping.
struct RestartState {
    attempt: u32,
    last_spawn: Instant,
}

/// Orchestrates every Source Indexer task in the process.
pub struct Supervisor {
    control_store: Arc<dyn ControlPlaneStore>,
    source_store: Arc<dyn SourceStore>,
    index_store: Arc<dyn IndexStore>,
    abi_cache: Arc<dyn Cache>,
    publisher: Arc<dyn LogPublisher>,
    rpc_clients: HashMap<Uuid, Arc<dyn rpc_client::RpcClient>>,
    bus: EventBus,
    shutdown: CancellationToken,
}

impl Supervisor {
    /// Build a new Supervisor.
    ///
    /// `rpc_clients` must have one entry per [`Blockchain`] id this process
    /// is configured to index; a source whose blockchain has no entry logs
    /// an error and is never spawned.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        control_store: Arc<dyn ControlPlaneStore>,
        source_store: Arc<dyn SourceStore>,
        index_store: Arc<dyn IndexStore>,
        abi_cache: Arc<dyn Cache>,
        publisher: Arc<dyn LogPublisher>,
        rpc_clients: HashMap<Uuid, Arc<dyn rpc_client::RpcClient>>,
        bus: EventBus,
        shutdown: CancellationToken,
    ) -> Self {
        Self { control_store, source_store, index_store, abi_cache, publisher, rpc_clients, bus, shutdown }
    }

    /// Run until the shared shutdown token is cancelled. Spawns every
    /// currently-enabled, schedulable source at startup.
    ///
    /// # Errors
    /// Returns an error only if the initial `list_enabled_sources` call
    /// fails; individual source task failures are retried internally and
    /// never propagate out of `run`.
    #[instrument(skip_all)]
    pub async fn run(mut self) -> Result<()> {
        let mut tasks: JoinSet<(Uuid, Result<()>)> = JoinSet::new();
        let mut running: HashMap<Uuid, AbortHandle> = HashMap::new();
        let mut restarts: HashMap<Uuid, RestartState> = HashMap::new();
        let mut events = self.bus.subscribe();

        for source in self.source_store.list_enabled_sources().await? {
            if source.is_schedulable() {
                self.spawn_source(source, &mut tasks, &mut running).await;
            }
        }

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    match joined {
                        Ok((source_id, Ok(()))) => {
                            info!(%source_id, "source indexer exited cleanly");
                            running.remove(&source_id);
                            restarts.remove(&source_id);
                        }
                        Ok((source_id, Err(e))) => {
                            warn!(%source_id, error = %e, "source indexer task failed");
                            running.remove(&source_id);
                            let _ = self.source_store.set_source_status(source_id, SourceStatus::LoopBackoff).await;
                            self.schedule_restart(source_id, &mut restarts);
                        }
                        Err(join_err) => error!(error = %join_err, "source indexer task panicked"),
                    }
                }

                Ok(event) = events.recv() => {
                    self.handle_bus_event(event, &mut tasks, &mut running).await;
                }
            }
        }

        self.drain_with_grace(&mut tasks).await;
        Ok(())
    }

    async fn handle_bus_event(
        &self,
        event: BusEvent,
        tasks: &mut JoinSet<(Uuid, Result<()>)>,
        running: &mut HashMap<Uuid, AbortHandle>,
    ) {
        match event {
            BusEvent::SourceEnable(id) => self.try_enable(id, tasks, running).await,
            BusEvent::SourceDisable(id) => self.watch_disable(id, running),
            BusEvent::FactoryNewContract(descriptor) => {
                if let Err(e) = self.spawn_factory_child(descriptor, tasks, running).await {
                    error!(error = %e, "failed to spawn factory child source");
                }
            }
            BusEvent::LogNew(_) | BusEvent::Shutdown => {}
        }
    }

    /// Re-fetch the source fresh (its `enabled`/`status` may have changed
    /// since the event was published) before spawning.
    async fn try_enable(&self, source_id: Uuid, tasks: &mut JoinSet<(Uuid, Result<()>)>, running: &mut HashMap<Uuid, AbortHandle>) {
        if running.contains_key(&source_id) {
            return;
        }
        match self.source_store.get_source(source_id).await {
            Ok(Some(source)) if source.is_schedulable() => self.spawn_source(source, tasks, running).await,
            Ok(_) => debug!(%source_id, "source not schedulable, skipping enable"),
            Err(e) => error!(%source_id, error = %e, "failed to load source for enable"),
        }
    }

    /// Poll until a disabled source's indexer reaches `Stopped`, or
    /// force-abort it once `DISABLE_GRACE` elapses.
    fn watch_disable(&self, source_id: Uuid, running: &mut HashMap<Uuid, AbortHandle>) {
        let Some(abort) = running.remove(&source_id) else {
            return;
        };
        let source_store = Arc::clone(&self.source_store);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let deadline = Instant::now() + DISABLE_GRACE;
            loop {
                match source_store.get_source(source_id).await {
                    Ok(Some(source)) if source.status == SourceStatus::Stopped => return,
                    Ok(None) => return,
                    _ => {}
                }
                if Instant::now() >= deadline || shutdown.is_cancelled() {
                    warn!(%source_id, "disable grace period elapsed, force-stopping source indexer");
                    abort.abort();
                    let _ = source_store.set_source_status(source_id, SourceStatus::Stopped).await;
                    return;
                }
                tokio::select! {
                    () = shutdown.cancelled() => return,
                    () = tokio::time::sleep(DISABLE_POLL_INTERVAL) => {}
                }
            }
        });
    }

    /// Schedule a delayed respawn attempt via a `SourceEnable` bus event,
    /// with exponential backoff reset if the previous attempt had been
    /// running long enough to count as healthy.
    fn schedule_restart(&self, source_id: Uuid, restarts: &mut HashMap<Uuid, RestartState>) {
        let attempt = match restarts.get(&source_id) {
            Some(state) if state.last_spawn.elapsed() < HEALTHY_RESET => state.attempt + 1,
            _ => 0,
        };
        let delay = BASE_BACKOFF.saturating_mul(1u32 << attempt.min(8)).min(MAX_BACKOFF);
        restarts.insert(source_id, RestartState { attempt, last_spawn: Instant::now() });

        info!(%source_id, attempt, delay_secs = delay.as_secs(), "scheduling source indexer restart");
        let bus = self.bus.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = shutdown.cancelled() => {}
                () = tokio::time::sleep(delay) => bus.publish(BusEvent::SourceEnable(source_id)),
            }
        });
    }

    async fn spawn_source(&self, source: Source, tasks: &mut JoinSet<(Uuid, Result<()>)>, running: &mut HashMap<Uuid, AbortHandle>) {
        let source_id = source.id;
        match self.resolve_blockchain(&source).await {
            Ok(blockchain) => match self.rpc_clients.get(&blockchain.id).cloned() {
                Some(rpc) => {
                    let indexer = SourceIndexer::new(
                        source,
                        blockchain,
                        rpc,
                        Arc::clone(&self.control_store),
                        Arc::clone(&self.source_store),
                        Arc::clone(&self.index_store),
                        Arc::clone(&self.abi_cache),
                        Arc::clone(&self.publisher),
                        self.bus.clone(),
                        self.shutdown.clone(),
                    );
                    let abort = tasks.spawn(async move {
                        let id = indexer.source_id();
                        (id, indexer.run().await)
                    });
                    running.insert(source_id, abort);
                    info!(%source_id, "spawned source indexer");
                }
                None => error!(%source_id, blockchain_id = %blockchain.id, "no RPC client configured for blockchain"),
            },
            Err(e) => error!(%source_id, error = %e, "failed to resolve blockchain for source"),
        }
    }

    async fn resolve_blockchain(&self, source: &Source) -> Result<Blockchain> {
        let pipeline = self
            .control_store
            .get_pipeline(source.pipeline_id)
            .await?
            .ok_or(DomainError::PipelineNotFound(source.pipeline_id))?;
        self.control_store
            .get_blockchain(pipeline.blockchain_id)
            .await?
            .ok_or(DomainError::BlockchainNotFound(pipeline.blockchain_id))
            .map_err(AppError::from)
    }

    /// Turn a discovered factory child into a new `Contract`-type source
    /// and spawn it immediately. Skips creation if a source for the same
    /// address already exists in the pipeline — an at-least-once bus
    /// redelivery of the same creation log must not spawn duplicates.
    async fn spawn_factory_child(
        &self,
        descriptor: NewSourceDescriptor,
        tasks: &mut JoinSet<(Uuid, Result<()>)>,
        running: &mut HashMap<Uuid, AbortHandle>,
    ) -> Result<()> {
        let existing = self.source_store.list_sources(Some(descriptor.pipeline_id)).await?;
        let already_exists = existing.iter().any(|s| {
            matches!(&s.type_params, SourceParams::Contract { address } if *address == descriptor.new_address)
        });
        if already_exists {
            debug!(address = %descriptor.new_address, "factory child source already exists, skipping");
            return Ok(());
        }

        let pipeline = self
            .control_store
            .get_pipeline(descriptor.pipeline_id)
            .await?
            .ok_or(DomainError::PipelineNotFound(descriptor.pipeline_id))?;
        let blockchain = self
            .control_store
            .get_blockchain(pipeline.blockchain_id)
            .await?
            .ok_or(DomainError::BlockchainNotFound(pipeline.blockchain_id))?;

        let source = Source {
            id: Uuid::new_v4(),
            pipeline_id: descriptor.pipeline_id,
            abi_id: descriptor.child_abi_id,
            chain_id: blockchain.chain_id,
            source_type: SourceType::Contract,
            type_params: SourceParams::Contract { address: descriptor.new_address },
            start_block: descriptor.start_block,
            sync_block: descriptor.start_block.prev(),
            enabled: true,
            status: SourceStatus::Stopped,
            decode_failure_policy: DecodeFailurePolicy::Lenient,
        };
        self.source_store.create_source(&source).await?;
        info!(source_id = %source.id, address = %descriptor.new_address, "created factory child source");
        self.spawn_source(source, tasks, running).await;
        Ok(())
    }

    /// Wait up to `SHUTDOWN_GRACE` for every running task to exit on its
    /// own (they all observe the same cancellation token), then abort
    /// whatever's left.
    async fn drain_with_grace(&self, tasks: &mut JoinSet<(Uuid, Result<()>)>) {
        let deadline = tokio::time::sleep(SHUTDOWN_GRACE);
        tokio::pin!(deadline);
        loop {
            if tasks.is_empty() {
                break;
            }
            tokio::select! {
                () = &mut deadline => {
                    warn!(remaining = tasks.len(), "shutdown grace period elapsed, aborting remaining source indexers");
                    tasks.abort_all();
                    break;
                }
                next = tasks.join_next() => {
                    if next.is_none() {
                        break;
                    }
                }
            }
        }
        while tasks.join_next().await.is_some() {}
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
