//! Domain model for offer/flow allocation

pub mod flow;
pub mod offer;

pub use flow::{Allocation, AllocationState, Flow, FlowCollection};
pub use offer::{Offer, OfferCatalog};
