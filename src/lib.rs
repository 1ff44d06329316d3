//! offerflow-core
//!
//! Client-side engine for attaching traffic offers to campaign flows with
//! percentage allocations and pushing the result to an external
//! traffic-routing platform. The session holds a local model of flows and
//! their allocations; mutations are applied optimistically, shares are
//! redistributed deterministically under pinning constraints, and a failed
//! sync with the remote authority rolls the model back.

pub mod allocator;
pub mod boundary;
pub mod campaigns;
pub mod config;
pub mod domain;
pub mod events;
pub mod reconciler;

pub use boundary::{BoundaryError, LoadBoundary, RoutingApiClient, SyncBoundary};
pub use config::CoreConfig;
pub use domain::{Allocation, AllocationState, Flow, Offer};
pub use events::{Event, EventBus};
pub use reconciler::{MutationReconciler, ReconcileError};

use std::sync::Arc;
use tracing::info;

/// One activated session of the allocation feature, scoped to a campaign.
///
/// Created when the operator opens a campaign, torn down on navigation away.
/// Owns the event bus and the reconciler; all state lives inside the
/// reconciler's session store.
pub struct OfferFlowCore {
    pub events: Arc<EventBus>,
    pub reconciler: Arc<MutationReconciler>,
}

impl OfferFlowCore {
    /// Activate the feature against the configured remote authority.
    ///
    /// Fails fast when required configuration is absent; every later failure
    /// is recoverable by re-issuing the triggering action.
    pub fn new(config: &CoreConfig, campaign_id: i64) -> anyhow::Result<Self> {
        config.validate()?;
        let client = Arc::new(RoutingApiClient::new(config)?);
        info!(campaign_id, host = %config.api_base_url, "offerflow core activated");
        Ok(Self::with_boundaries(campaign_id, client.clone(), client))
    }

    /// Wire the core with explicit boundaries (test seam)
    pub fn with_boundaries(
        campaign_id: i64,
        load: Arc<dyn LoadBoundary>,
        sync: Arc<dyn SyncBoundary>,
    ) -> Self {
        let events = Arc::new(EventBus::default());
        let reconciler = Arc::new(MutationReconciler::new(
            campaign_id,
            load,
            sync,
            events.clone(),
        ));
        Self { events, reconciler }
    }
}
