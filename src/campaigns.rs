//! Campaign bootstrap - create a campaign with its two default flows
//!
//! A new campaign starts with a geo-redirect flow for the chosen country and
//! a flow routing 100% of traffic to the selected offer. Action types differ
//! per platform install, so they are resolved against the action list the
//! platform reports.

use crate::boundary::{BoundaryError, RoutingApiClient};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

/// One action type reported by the platform
#[derive(Debug, Clone, Deserialize)]
pub struct FlowAction {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Response to a campaign creation
#[derive(Debug, Deserialize)]
pub struct CampaignCreated {
    pub id: i64,
}

/// Operator input for a new campaign
#[derive(Debug, Clone)]
pub struct CampaignDraft {
    pub name: String,
    pub country: String,
    pub offer_id: i64,
    pub offer_name: String,
}

/// Pick an action key for a flow schema.
///
/// Redirect schemas want a "redirect"-typed action, everything else an
/// "other"-typed one; falls back to the first reported action, then to a
/// conventional default.
pub fn resolve_action(actions: &[FlowAction], schema: &str) -> String {
    let fallback = if schema == "redirect" { "redirect" } else { "offers" };
    if actions.is_empty() {
        return fallback.to_string();
    }

    let target_kind = if schema == "redirect" { "redirect" } else { "other" };
    actions
        .iter()
        .find(|a| a.kind == target_kind)
        .or_else(|| actions.first())
        .map(|a| a.key.clone())
        .unwrap_or_else(|| fallback.to_string())
}

/// URL-safe alias derived from the campaign name
pub fn build_alias(name: &str, fallback_suffix: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        format!("campaign-{fallback_suffix}")
    } else {
        slug
    }
}

/// Campaign creation payload
pub fn campaign_payload(
    draft: &CampaignDraft,
    alias: &str,
    domain_id: i64,
    traffic_source_id: i64,
    group_id: Option<i64>,
) -> Value {
    let mut payload = json!({
        "alias": alias,
        "name": draft.name,
        "type": "position",
        "state": "active",
        "cookies_ttl": 24,
        "cost_type": "CPC",
        "cost_value": 0,
        "cost_auto": false,
        "domain_id": domain_id,
        "traffic_source_id": traffic_source_id,
        "notes": format!("Country: {}", draft.country),
    });
    if let Some(group_id) = group_id {
        payload["group_id"] = json!(group_id);
    }
    payload
}

/// Forced geo-redirect flow for the campaign's country
pub fn geo_redirect_flow(campaign_id: i64, country: &str, actions: &[FlowAction]) -> Value {
    json!({
        "campaign_id": campaign_id,
        "schema": "redirect",
        "type": "forced",
        "name": format!("{campaign_id}-geo-redirect"),
        "action_type": resolve_action(actions, "redirect"),
        "action_options": {"url": "https://www.google.com"},
        "comments": "Auto-generated redirect for selected country",
        "state": "active",
        "collect_clicks": false,
        "filter_or": false,
        "filters": [{
            "name": "country",
            "mode": "accept",
            "payload": [country],
        }],
    })
}

/// Default flow routing the full share to the selected offer
pub fn offer_flow(campaign_id: i64, draft: &CampaignDraft, actions: &[FlowAction]) -> Value {
    let offer_label = if draft.offer_name.is_empty() {
        draft.offer_id.to_string()
    } else {
        draft.offer_name.clone()
    };
    json!({
        "campaign_id": campaign_id,
        "schema": "landings",
        "type": "default",
        "name": format!("{campaign_id}-offer"),
        "action_type": resolve_action(actions, "landings"),
        "comments": format!("Auto flow for offer {offer_label}"),
        "state": "active",
        "collect_clicks": false,
        "filter_or": false,
        "offers": [{
            "offer_id": draft.offer_id,
            "share": 100,
            "state": "active",
        }],
    })
}

/// Create a campaign and its default flows.
///
/// Flow creation failures do not abort the bootstrap; the campaign id is
/// returned together with the names of the flows that failed.
pub async fn bootstrap_campaign(
    client: &RoutingApiClient,
    draft: &CampaignDraft,
    alias: &str,
    domain_id: i64,
    traffic_source_id: i64,
    group_id: Option<i64>,
) -> Result<(i64, Vec<String>), BoundaryError> {
    let actions = client.fetch_flow_actions().await.unwrap_or_else(|e| {
        warn!(error = %e, "could not fetch flow actions, using fallbacks");
        Vec::new()
    });

    let payload = campaign_payload(draft, alias, domain_id, traffic_source_id, group_id);
    let campaign_id = client.create_campaign(&payload).await?;

    let mut failed = Vec::new();
    for flow in [
        geo_redirect_flow(campaign_id, &draft.country, &actions),
        offer_flow(campaign_id, draft, &actions),
    ] {
        let name = flow["name"].as_str().unwrap_or("flow").to_string();
        if let Err(e) = client.create_flow(&flow).await {
            warn!(flow = %name, error = %e, "default flow creation failed");
            failed.push(name);
        }
    }

    Ok((campaign_id, failed))
}
