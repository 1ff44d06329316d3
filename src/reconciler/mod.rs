//! Mutation reconciliation between the session store and the remote authority
//!
//! The reconciler owns the session store (offer catalog + flow collection)
//! and is the only writer to it. Single-allocation operations are optimistic:
//! apply locally, notify observers, then sync; a failed sync restores the
//! pre-mutation snapshot. Bulk publish is the opposite: confirm remotely
//! first, then apply the state transitions locally.
//!
//! A per-flow admission lock serializes protocols on the same flow, so a
//! late rollback can never overwrite a newer optimistic apply. Different
//! flows proceed concurrently without restriction. Reloads bypass the
//! admission locks; a store generation counter makes any rollback captured
//! before a reload a no-op instead of a stale overwrite.

pub mod error;

pub use error::ReconcileError;
use error::Result;

use crate::allocator::recompute_shares;
use crate::boundary::{AllocationUpdate, LoadBoundary, SyncBoundary};
use crate::domain::{Allocation, AllocationState, Flow, FlowCollection, Offer, OfferCatalog};
use crate::events::{Event, EventBus};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Session-scoped state: offer catalog and flow collection.
///
/// Created on feature activation, discarded on navigation away; rebuilt
/// wholesale by `reload_all`.
#[derive(Default)]
struct SessionStore {
    /// Bumped on every wholesale rebuild; a rollback captured against an
    /// older generation is dropped instead of applied.
    generation: u64,
    offers: OfferCatalog,
    flows: FlowCollection,
}

/// A single-allocation transition request
enum Mutation {
    Add { offer_id: i64 },
    Delete { offer_id: i64 },
    Restore { offer_id: i64 },
    TogglePin { offer_id: i64 },
}

/// Apply one transition to a flow.
///
/// Returns without touching the flow on validation failure. Wrong-state
/// delete/restore requests are no-ops, not errors.
fn apply(flow: &mut Flow, mutation: &Mutation) -> Result<()> {
    let flow_id = flow.id;
    match *mutation {
        Mutation::Add { offer_id } => {
            if flow.has_offer(offer_id) {
                return Err(ReconcileError::DuplicateOffer { flow_id, offer_id });
            }
            flow.allocations.push(Allocation::pending(flow_id, offer_id));
        }
        Mutation::Delete { offer_id } => {
            let allocation = flow
                .allocation_mut(offer_id)
                .ok_or(ReconcileError::AllocationNotFound { flow_id, offer_id })?;
            if allocation.state == AllocationState::Published {
                allocation.state = AllocationState::PendingDelete;
                allocation.share = 0;
            }
        }
        Mutation::Restore { offer_id } => {
            let allocation = flow
                .allocation_mut(offer_id)
                .ok_or(ReconcileError::AllocationNotFound { flow_id, offer_id })?;
            if matches!(
                allocation.state,
                AllocationState::PendingDelete | AllocationState::Deleted
            ) {
                allocation.state = AllocationState::PendingAdd;
            }
        }
        Mutation::TogglePin { offer_id } => {
            let allocation = flow
                .allocation_mut(offer_id)
                .ok_or(ReconcileError::AllocationNotFound { flow_id, offer_id })?;
            allocation.is_pinned = !allocation.is_pinned;
        }
    }
    Ok(())
}

/// Allocations whose `(share, state, is_pinned)` differ from the snapshot.
/// Entries absent from the snapshot always count as changed.
fn changed_since(current: &[Allocation], snapshot: &[Allocation]) -> Vec<Allocation> {
    current
        .iter()
        .filter(|a| {
            match snapshot.iter().find(|prev| prev.offer_id == a.offer_id) {
                Some(prev) => {
                    prev.share != a.share
                        || prev.state != a.state
                        || prev.is_pinned != a.is_pinned
                }
                None => true,
            }
        })
        .cloned()
        .collect()
}

/// Central state machine for allocation mutations
pub struct MutationReconciler {
    campaign_id: i64,
    store: RwLock<SessionStore>,
    flow_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
    load: Arc<dyn LoadBoundary>,
    sync: Arc<dyn SyncBoundary>,
    events: Arc<EventBus>,
}

impl MutationReconciler {
    pub fn new(
        campaign_id: i64,
        load: Arc<dyn LoadBoundary>,
        sync: Arc<dyn SyncBoundary>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            campaign_id,
            store: RwLock::new(SessionStore::default()),
            flow_locks: Mutex::new(HashMap::new()),
            load,
            sync,
            events,
        }
    }

    /// Snapshot of the current flow list, in order
    pub async fn flows(&self) -> Vec<Flow> {
        self.store.read().await.flows.to_vec()
    }

    /// Snapshot of the offer catalog
    pub async fn offers(&self) -> Vec<Offer> {
        self.store.read().await.offers.iter().cloned().collect()
    }

    /// Catalog lookup backing the attach-offer autocomplete
    pub async fn search_offers(&self, query: &str, limit: usize) -> Vec<Offer> {
        self.store
            .read()
            .await
            .offers
            .search(query, limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Attach an offer to a flow (optimistic)
    pub async fn add_allocation(&self, flow_id: i64, offer_id: i64) -> Result<()> {
        self.single_allocation(flow_id, Mutation::Add { offer_id }).await
    }

    /// Mark a published allocation for deletion (optimistic)
    pub async fn request_delete(&self, flow_id: i64, offer_id: i64) -> Result<()> {
        self.single_allocation(flow_id, Mutation::Delete { offer_id }).await
    }

    /// Bring a deleted or pending-delete allocation back (optimistic)
    pub async fn restore_allocation(&self, flow_id: i64, offer_id: i64) -> Result<()> {
        self.single_allocation(flow_id, Mutation::Restore { offer_id }).await
    }

    /// Toggle an allocation's pin flag (optimistic)
    pub async fn toggle_pin(&self, flow_id: i64, offer_id: i64) -> Result<()> {
        self.single_allocation(flow_id, Mutation::TogglePin { offer_id }).await
    }

    /// Admission lock for one flow: at most one in-flight protocol per flow
    /// id, later requests queue in arrival order.
    async fn flow_lock(&self, flow_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.flow_locks.lock().await;
        locks
            .entry(flow_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// The optimistic single-allocation protocol: snapshot, apply, diff,
    /// notify, sync all changed allocations concurrently, commit or roll back.
    async fn single_allocation(&self, flow_id: i64, mutation: Mutation) -> Result<()> {
        // resolve the flow before taking an admission slot, so unknown ids
        // never leave an entry behind in the lock map
        if self.store.read().await.flows.get(flow_id).is_none() {
            return Err(ReconcileError::FlowNotFound(flow_id));
        }

        let lock = self.flow_lock(flow_id).await;
        let _admission = lock.lock().await;

        let (snapshot, changed, flows, generation) = {
            let mut store = self.store.write().await;
            let generation = store.generation;
            let flow = store
                .flows
                .get_mut(flow_id)
                .ok_or(ReconcileError::FlowNotFound(flow_id))?;
            let snapshot = flow.allocations.clone();
            apply(flow, &mutation)?;
            recompute_shares(&mut flow.allocations);
            let changed = changed_since(&flow.allocations, &snapshot);
            (snapshot, changed, store.flows.to_vec(), generation)
        };

        // Observers see the optimistic state before any network confirmation
        self.events.emit(Event::FlowsUpdated { flows });

        if changed.is_empty() {
            return Ok(());
        }

        debug!(flow_id, changed = changed.len(), "submitting allocation updates");
        let updates: Vec<AllocationUpdate> = changed.iter().map(Into::into).collect();
        let results = join_all(
            updates
                .iter()
                .map(|update| self.sync.update_allocation(flow_id, update)),
        )
        .await;

        let first_error = results.iter().find_map(|r| r.as_ref().err());
        let Some(first_error) = first_error else {
            return Ok(());
        };

        let succeeded: Vec<i64> = changed
            .iter()
            .zip(&results)
            .filter(|(_, r)| r.is_ok())
            .map(|(a, _)| a.offer_id)
            .collect();
        if !succeeded.is_empty() {
            // Those writes are not undone remotely; a reload re-converges.
            warn!(
                flow_id,
                ?succeeded,
                "partial sync failure, remote state diverges until next reload"
            );
        }

        let mut store = self.store.write().await;
        if store.generation != generation {
            // the store was rebuilt while the sync was in flight; the
            // snapshot predates the rebuild and must not be reinstated
            warn!(flow_id, error = %first_error, "sync failed after a reload, rollback dropped");
            return Err(ReconcileError::Sync(first_error.to_string()));
        }
        if let Some(flow) = store.flows.get_mut(flow_id) {
            flow.allocations = snapshot;
            recompute_shares(&mut flow.allocations);
        }
        let flows = store.flows.to_vec();
        drop(store);

        warn!(flow_id, error = %first_error, "rolled back optimistic mutation");
        self.events.emit(Event::FlowsUpdated { flows });
        Err(ReconcileError::Sync(first_error.to_string()))
    }

    /// Publish a flow's pending changes as one bulk operation.
    ///
    /// Not optimistic: the local transitions (`PendingAdd -> Published`,
    /// `PendingDelete -> Deleted`) are applied only after the authority
    /// accepts the publish, so there is nothing to roll back on failure.
    pub async fn push_flow(&self, flow_id: i64) -> Result<()> {
        if self.store.read().await.flows.get(flow_id).is_none() {
            return Err(ReconcileError::FlowNotFound(flow_id));
        }

        let lock = self.flow_lock(flow_id).await;
        let _admission = lock.lock().await;

        // the flow may have been removed by a reload while we queued
        if self.store.read().await.flows.get(flow_id).is_none() {
            return Err(ReconcileError::FlowNotFound(flow_id));
        }

        self.sync
            .publish_flow(flow_id)
            .await
            .map_err(|e| ReconcileError::Sync(e.to_string()))?;

        let flows = {
            let mut store = self.store.write().await;
            let flow = store
                .flows
                .get_mut(flow_id)
                .ok_or(ReconcileError::FlowNotFound(flow_id))?;
            for allocation in &mut flow.allocations {
                match allocation.state {
                    AllocationState::PendingAdd => allocation.state = AllocationState::Published,
                    AllocationState::PendingDelete => allocation.state = AllocationState::Deleted,
                    _ => {}
                }
            }
            store.flows.to_vec()
        };

        info!(flow_id, "flow published to remote authority");
        self.events.emit(Event::FlowPushed { flow_id });
        self.events.emit(Event::FlowsUpdated { flows });
        Ok(())
    }

    /// Discard all local state and rebuild from the remote authority.
    ///
    /// The replacement store is built completely off to the side and swapped
    /// in only on full success; any network or decode failure leaves the
    /// previous store intact. Each rebuilt flow is normalized through the
    /// allocator, which guards against remote percentages that do not sum
    /// to 100.
    pub async fn reload_all(&self) -> Result<()> {
        info!(campaign_id = self.campaign_id, "reloading session store");
        let offers = self.load.fetch_offers().await?;
        let summaries = self.load.fetch_flows(self.campaign_id).await?;

        let mut flows = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let allocations = self.load.fetch_allocations(summary.id).await?;
            if allocations.is_empty() {
                // flows with no offers are not part of the working set
                continue;
            }
            let mut flow = Flow {
                id: summary.id,
                name: summary.name,
                kind: summary.kind,
                allocations,
            };
            recompute_shares(&mut flow.allocations);
            flows.push(flow);
        }

        let (flow_count, offer_count, flow_list) = {
            let mut store = self.store.write().await;
            store.generation = store.generation.wrapping_add(1);
            store.offers = OfferCatalog::new(offers);
            store.flows = FlowCollection::new(flows);

            // drop lock entries for flows that no longer exist; in-flight
            // protocols keep their own Arc clone, those entries stay
            let mut locks = self.flow_locks.lock().await;
            locks.retain(|id, lock| {
                Arc::strong_count(lock) > 1 || store.flows.get(*id).is_some()
            });

            (store.flows.len(), store.offers.len(), store.flows.to_vec())
        };

        info!(flow_count, offer_count, "session store rebuilt");
        self.events.emit(Event::Reloaded { flow_count, offer_count });
        self.events.emit(Event::FlowsUpdated { flows: flow_list });
        Ok(())
    }
}
