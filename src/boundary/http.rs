//! reqwest implementation of the load/sync boundaries

use super::wire::{
    self, AllocationAck, AllocationUpdate, AllocationsResponse, FlowSummary, FlowsResponse,
    OffersResponse,
};
use super::{BoundaryError, LoadBoundary, SyncBoundary};
use crate::campaigns::{CampaignCreated, FlowAction};
use crate::config::CoreConfig;
use crate::domain::{Allocation, Offer};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the traffic-routing platform's API.
///
/// Implements both boundaries against the platform's endpoints, sending the
/// configured `Api-Key` header on every request.
pub struct RoutingApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RoutingApiClient {
    pub fn new(config: &CoreConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Read the body, folding non-success statuses into a network error
    /// carrying the platform's own message when it sends one.
    async fn read_body(res: reqwest::Response) -> Result<String, BoundaryError> {
        let status = res.status();
        let status_text = status.canonical_reason().unwrap_or("request failed");
        let body = res
            .text()
            .await
            .map_err(|e| BoundaryError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(BoundaryError::Network(wire::error_reason(&body, status_text)));
        }
        Ok(body)
    }

    async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, BoundaryError> {
        let body = Self::read_body(res).await?;
        serde_json::from_str(&body).map_err(|e| BoundaryError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BoundaryError> {
        debug!(path, "GET");
        let res = self
            .client
            .get(self.url(path))
            .header("Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| BoundaryError::Network(e.to_string()))?;
        Self::decode(res).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, BoundaryError> {
        debug!(path, "POST");
        let res = self
            .client
            .post(self.url(path))
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| BoundaryError::Network(e.to_string()))?;
        Self::decode(res).await
    }

    /// Available flow action types, for campaign bootstrap
    pub async fn fetch_flow_actions(&self) -> Result<Vec<FlowAction>, BoundaryError> {
        self.get_json("streams_actions").await
    }

    /// Create a campaign; returns the id assigned by the platform
    pub async fn create_campaign(&self, payload: &Value) -> Result<i64, BoundaryError> {
        let created: CampaignCreated = self.post_json("campaigns", payload).await?;
        Ok(created.id)
    }

    /// Create a flow inside an existing campaign
    pub async fn create_flow(&self, payload: &Value) -> Result<(), BoundaryError> {
        let _: Value = self.post_json("streams", payload).await?;
        Ok(())
    }
}

#[async_trait]
impl LoadBoundary for RoutingApiClient {
    async fn fetch_offers(&self) -> Result<Vec<Offer>, BoundaryError> {
        let res: OffersResponse = self.get_json("offers/").await?;
        Ok(res.offers)
    }

    async fn fetch_flows(&self, campaign_id: i64) -> Result<Vec<FlowSummary>, BoundaryError> {
        let res: FlowsResponse = self
            .get_json(&format!("company/{campaign_id}/streams/"))
            .await?;
        Ok(res.flows)
    }

    async fn fetch_allocations(&self, flow_id: i64) -> Result<Vec<Allocation>, BoundaryError> {
        let res: AllocationsResponse = self
            .get_json(&format!("flow/{flow_id}/offer_flows/"))
            .await?;
        Ok(res.offer_flows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl SyncBoundary for RoutingApiClient {
    async fn update_allocation(
        &self,
        flow_id: i64,
        update: &AllocationUpdate,
    ) -> Result<AllocationAck, BoundaryError> {
        let body = serde_json::to_value(update)
            .map_err(|e| BoundaryError::Decode(e.to_string()))?;
        self.post_json(&format!("flow/{flow_id}/update_offer/"), &body)
            .await
    }

    async fn publish_flow(&self, flow_id: i64) -> Result<(), BoundaryError> {
        let path = format!("flow/{flow_id}/");
        debug!(path, "PUT");
        let res = self
            .client
            .put(self.url(&path))
            .header("Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| BoundaryError::Network(e.to_string()))?;
        Self::read_body(res).await?;
        Ok(())
    }
}
