//! Flow - a campaign traffic-distribution node and its offer allocations
//!
//! A flow carries an ordered sequence of allocations. Ordering is significant:
//! the share allocator hands remainder units to earlier entries, so two flows
//! with the same allocations in a different order compute different shares.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an allocation.
///
/// Wire values are the literal strings `pending_add`, `published`,
/// `pending_delete` and `deleted`, and round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationState {
    /// Attached locally, not yet published to the remote authority
    PendingAdd,

    /// Confirmed by the remote authority
    Published,

    /// Marked for removal, pending the next bulk publish
    PendingDelete,

    /// Removed from the routed mix (kept in the sequence so it can be restored)
    Deleted,
}

impl AllocationState {
    /// Active allocations are the ones whose shares must sum to 100.
    pub fn is_active(&self) -> bool {
        matches!(self, AllocationState::Published | AllocationState::PendingAdd)
    }
}

/// The attachment of an offer to a flow with a percentage share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub offer_id: i64,
    pub flow_id: i64,

    /// Integer percentage, 0..=100
    pub share: u8,

    pub state: AllocationState,

    /// Pinned allocations keep their share during redistribution
    pub is_pinned: bool,
}

impl Allocation {
    /// A freshly attached allocation, before shares are recomputed
    pub fn pending(flow_id: i64, offer_id: i64) -> Self {
        Self {
            offer_id,
            flow_id,
            share: 0,
            state: AllocationState::PendingAdd,
            is_pinned: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

/// A campaign flow whose offer mix is pushed to the routing platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    pub id: i64,
    pub name: String,

    /// Flow type as reported by the remote authority (e.g. "default", "forced")
    pub kind: String,

    /// Ordered sequence; entries are never removed, deletion is a state change
    pub allocations: Vec<Allocation>,
}

impl Flow {
    pub fn new(id: i64, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: kind.into(),
            allocations: Vec::new(),
        }
    }

    pub fn allocation(&self, offer_id: i64) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.offer_id == offer_id)
    }

    pub fn allocation_mut(&mut self, offer_id: i64) -> Option<&mut Allocation> {
        self.allocations.iter_mut().find(|a| a.offer_id == offer_id)
    }

    pub fn has_offer(&self, offer_id: i64) -> bool {
        self.allocation(offer_id).is_some()
    }

    /// Sum of shares over active allocations (the set that must total 100)
    pub fn active_share_total(&self) -> u32 {
        self.allocations
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.share as u32)
            .sum()
    }
}

/// Ordered, id-addressed repository of flows for the session.
///
/// Owned exclusively by the reconciler's session store; fully replaced only
/// by a reload. No persistence.
#[derive(Debug, Clone, Default)]
pub struct FlowCollection {
    flows: Vec<Flow>,
}

impl FlowCollection {
    pub fn new(flows: Vec<Flow>) -> Self {
        Self { flows }
    }

    pub fn get(&self, flow_id: i64) -> Option<&Flow> {
        self.flows.iter().find(|f| f.id == flow_id)
    }

    pub fn get_mut(&mut self, flow_id: i64) -> Option<&mut Flow> {
        self.flows.iter_mut().find(|f| f.id == flow_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flow> {
        self.flows.iter()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Snapshot of the full flow list, in order, for observers
    pub fn to_vec(&self) -> Vec<Flow> {
        self.flows.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_strings_round_trip() {
        let cases = [
            (AllocationState::PendingAdd, "\"pending_add\""),
            (AllocationState::Published, "\"published\""),
            (AllocationState::PendingDelete, "\"pending_delete\""),
            (AllocationState::Deleted, "\"deleted\""),
        ];
        for (state, wire) in cases {
            assert_eq!(serde_json::to_string(&state).unwrap(), wire);
            let back: AllocationState = serde_json::from_str(wire).unwrap();
            assert_eq!(back, state);
        }
    }

    #[test]
    fn test_active_states() {
        assert!(AllocationState::Published.is_active());
        assert!(AllocationState::PendingAdd.is_active());
        assert!(!AllocationState::PendingDelete.is_active());
        assert!(!AllocationState::Deleted.is_active());
    }

    #[test]
    fn test_flow_collection_lookup_preserves_order() {
        let flows = FlowCollection::new(vec![
            Flow::new(7, "geo", "forced"),
            Flow::new(3, "offers", "default"),
        ]);
        assert_eq!(flows.get(3).unwrap().name, "offers");
        assert!(flows.get(99).is_none());
        let ids: Vec<i64> = flows.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![7, 3]);
    }
}
