//! Boundaries to the remote authority
//!
//! The core never speaks HTTP directly; it talks to the authority through
//! two narrow async traits. `LoadBoundary` reads the canonical catalog and
//! flow state, `SyncBoundary` writes one allocation or bulk-publishes one
//! flow. `RoutingApiClient` is the production implementation of both.

pub mod http;
pub mod wire;

pub use http::RoutingApiClient;
pub use wire::{AllocationAck, AllocationUpdate, FlowSummary};

use crate::domain::{Allocation, Offer};
use async_trait::async_trait;
use thiserror::Error;

/// Failures crossing a boundary
#[derive(Error, Debug, Clone)]
pub enum BoundaryError {
    /// Transport failure or non-success response
    #[error("{0}")]
    Network(String),

    /// Malformed payload from the remote authority
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Read-only access to the canonical offers, flows and allocations
#[async_trait]
pub trait LoadBoundary: Send + Sync {
    /// Fetch the offer catalog
    async fn fetch_offers(&self) -> Result<Vec<Offer>, BoundaryError>;

    /// Fetch the flow list for a campaign
    async fn fetch_flows(&self, campaign_id: i64) -> Result<Vec<FlowSummary>, BoundaryError>;

    /// Fetch the allocations of one flow
    async fn fetch_allocations(&self, flow_id: i64) -> Result<Vec<Allocation>, BoundaryError>;
}

/// Write access: commit one allocation's fields, or bulk-publish one flow
#[async_trait]
pub trait SyncBoundary: Send + Sync {
    /// Submit one allocation's `(share, state, is_pinned)` for a flow
    async fn update_allocation(
        &self,
        flow_id: i64,
        update: &AllocationUpdate,
    ) -> Result<AllocationAck, BoundaryError>;

    /// Publish a flow's pending allocation changes as one bulk operation
    async fn publish_flow(&self, flow_id: i64) -> Result<(), BoundaryError>;
}
