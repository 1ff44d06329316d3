//! Typed wire schemas for the remote authority's endpoints
//!
//! Every payload goes through an explicit serde decode producing either a
//! typed value or a `BoundaryError::Decode`; malformed input never panics.

use crate::domain::{Allocation, AllocationState, Offer};
use serde::{Deserialize, Serialize};

/// `GET /offers/` response
#[derive(Debug, Deserialize)]
pub struct OffersResponse {
    pub offers: Vec<Offer>,
}

/// One entry of the campaign flow list
#[derive(Debug, Clone, Deserialize)]
pub struct FlowSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// `GET /company/{campaign_id}/streams/` response
#[derive(Debug, Deserialize)]
pub struct FlowsResponse {
    pub flows: Vec<FlowSummary>,
}

/// One allocation row as the authority serializes it
#[derive(Debug, Deserialize)]
pub struct AllocationRow {
    pub offer: i64,
    pub flow: i64,
    pub share: u8,
    pub state: AllocationState,
    pub is_pinned: bool,
}

impl From<AllocationRow> for Allocation {
    fn from(row: AllocationRow) -> Self {
        Allocation {
            offer_id: row.offer,
            flow_id: row.flow,
            share: row.share,
            state: row.state,
            is_pinned: row.is_pinned,
        }
    }
}

/// `GET /flow/{flow_id}/offer_flows/` response
#[derive(Debug, Deserialize)]
pub struct AllocationsResponse {
    pub offer_flows: Vec<AllocationRow>,
}

/// Body of the per-allocation update submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationUpdate {
    pub offer_id: i64,
    pub share: u8,
    pub state: AllocationState,
    pub is_pinned: bool,
}

impl From<&Allocation> for AllocationUpdate {
    fn from(a: &Allocation) -> Self {
        AllocationUpdate {
            offer_id: a.offer_id,
            share: a.share,
            state: a.state,
            is_pinned: a.is_pinned,
        }
    }
}

/// Acknowledgement echoed back for a committed allocation update
#[derive(Debug, Clone, Deserialize)]
pub struct AllocationAck {
    pub flow_id: i64,
    pub offer_id: i64,
    pub share: u8,
    pub state: AllocationState,
    pub is_pinned: bool,
}

/// Error body shape used by the authority on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Extract a failure reason from a response body.
///
/// Prefers the `error` field, then `message`, then falls back to the
/// transport status text.
pub fn error_reason(body: &str, status_text: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(reason) = parsed.error.or(parsed.message) {
            return reason;
        }
    }
    status_text.to_string()
}
