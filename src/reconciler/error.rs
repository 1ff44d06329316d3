//! Reconciler error types

use crate::boundary::BoundaryError;
use thiserror::Error;

/// Mutation protocol errors
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Local validation: the offer is already attached to the flow.
    /// No snapshot is taken and no network call is issued.
    #[error("offer {offer_id} is already attached to flow {flow_id}")]
    DuplicateOffer { flow_id: i64, offer_id: i64 },

    /// The flow id is unknown to the session store
    #[error("flow {0} not found")]
    FlowNotFound(i64),

    /// The offer has no allocation in the flow
    #[error("offer {offer_id} has no allocation in flow {flow_id}")]
    AllocationNotFound { flow_id: i64, offer_id: i64 },

    /// A sync call failed; the local state was rolled back (single-allocation
    /// protocols) or left untouched (bulk publish). Carries the first
    /// failure reason.
    #[error("sync with remote authority failed: {0}")]
    Sync(String),

    /// A load call failed during reload; the previous store is kept
    #[error("reload failed: {0}")]
    Load(#[from] BoundaryError),
}

/// Result type for reconciler operations
pub type Result<T> = std::result::Result<T, ReconcileError>;
