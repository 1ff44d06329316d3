//! Shared test fixtures: scripted mock boundaries and a seeded core

// not every test binary uses every fixture
#![allow(dead_code)]

use async_trait::async_trait;
use offerflow_core::boundary::{
    AllocationAck, AllocationUpdate, BoundaryError, FlowSummary, LoadBoundary, SyncBoundary,
};
use offerflow_core::domain::{Allocation, AllocationState, Offer};
use offerflow_core::OfferFlowCore;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CAMPAIGN_ID: i64 = 77;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
}

/// Canonical load boundary returning scripted payloads
#[derive(Default)]
pub struct MockLoad {
    pub offers: Mutex<Vec<Offer>>,
    pub flows: Mutex<Vec<FlowSummary>>,
    pub allocations: Mutex<HashMap<i64, Vec<Allocation>>>,
    /// Flow ids whose allocation fetch fails with a decode error
    pub fail_allocations_for: Mutex<HashSet<i64>>,
}

#[async_trait]
impl LoadBoundary for MockLoad {
    async fn fetch_offers(&self) -> Result<Vec<Offer>, BoundaryError> {
        Ok(self.offers.lock().unwrap().clone())
    }

    async fn fetch_flows(&self, campaign_id: i64) -> Result<Vec<FlowSummary>, BoundaryError> {
        assert_eq!(campaign_id, CAMPAIGN_ID);
        Ok(self.flows.lock().unwrap().clone())
    }

    async fn fetch_allocations(&self, flow_id: i64) -> Result<Vec<Allocation>, BoundaryError> {
        if self.fail_allocations_for.lock().unwrap().contains(&flow_id) {
            return Err(BoundaryError::Decode("missing field `state`".into()));
        }
        Ok(self
            .allocations
            .lock()
            .unwrap()
            .get(&flow_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Sync boundary recording every call, with scripted failures and latency
#[derive(Default)]
pub struct MockSync {
    pub updates: Mutex<Vec<(i64, AllocationUpdate)>>,
    pub published: Mutex<Vec<i64>>,
    /// Offer ids whose update fails with a network error
    pub fail_offers: Mutex<HashSet<i64>>,
    pub fail_publish: Mutex<bool>,
    pub delay: Mutex<Option<Duration>>,
}

impl MockSync {
    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn fail_offer(&self, offer_id: i64) {
        self.fail_offers.lock().unwrap().insert(offer_id);
    }
}

#[async_trait]
impl SyncBoundary for MockSync {
    async fn update_allocation(
        &self,
        flow_id: i64,
        update: &AllocationUpdate,
    ) -> Result<AllocationAck, BoundaryError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.updates.lock().unwrap().push((flow_id, update.clone()));
        if self.fail_offers.lock().unwrap().contains(&update.offer_id) {
            return Err(BoundaryError::Network("Invalid payload".into()));
        }
        Ok(AllocationAck {
            flow_id,
            offer_id: update.offer_id,
            share: update.share,
            state: update.state,
            is_pinned: update.is_pinned,
        })
    }

    async fn publish_flow(&self, flow_id: i64) -> Result<(), BoundaryError> {
        if *self.fail_publish.lock().unwrap() {
            return Err(BoundaryError::Network("Flow not found".into()));
        }
        self.published.lock().unwrap().push(flow_id);
        Ok(())
    }
}

pub struct TestCtx {
    pub load: Arc<MockLoad>,
    pub sync: Arc<MockSync>,
    pub core: OfferFlowCore,
}

pub fn allocation(flow_id: i64, offer_id: i64, share: u8, state: AllocationState) -> Allocation {
    Allocation { offer_id, flow_id, share, state, is_pinned: false }
}

/// Two published 50/50 allocations on flow 1, one full-share on flow 2,
/// three offers in the catalog.
pub fn seeded() -> TestCtx {
    let load = Arc::new(MockLoad::default());
    *load.offers.lock().unwrap() = vec![
        Offer { id: 11, name: "Alpha".into() },
        Offer { id: 12, name: "Beta".into() },
        Offer { id: 13, name: "Gamma".into() },
    ];
    *load.flows.lock().unwrap() = vec![
        FlowSummary { id: 1, name: "main".into(), kind: "default".into() },
        FlowSummary { id: 2, name: "backup".into(), kind: "default".into() },
    ];
    load.allocations.lock().unwrap().insert(
        1,
        vec![
            allocation(1, 11, 50, AllocationState::Published),
            allocation(1, 12, 50, AllocationState::Published),
        ],
    );
    load.allocations.lock().unwrap().insert(
        2,
        vec![allocation(2, 13, 100, AllocationState::Published)],
    );

    let sync = Arc::new(MockSync::default());
    let core = OfferFlowCore::with_boundaries(CAMPAIGN_ID, load.clone(), sync.clone());
    TestCtx { load, sync, core }
}
