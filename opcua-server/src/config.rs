// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Server configuration: the operation limits enforced by the services
//! dispatch table and the subscription engine, plus the application identity
//! used to answer `CreateSession`/`GetEndpoints`.

use opcua_core::config::Config;
use opcua_types::generated::{ApplicationType, EndpointDescription, MessageSecurityMode};
use opcua_types::string::UAString;
use serde::{Deserialize, Serialize};

/// Per-service array-operation caps (`SPEC_FULL.md` §4.7): a request whose
/// array exceeds the relevant limit fails the whole call with
/// `BadTooManyOperations` rather than being silently truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalLimits {
    /// Maximum number of entries in a `Read` request.
    #[serde(default = "defaults::max_nodes_per_read")]
    pub max_nodes_per_read: usize,
    /// Maximum number of entries in a `Write` request.
    #[serde(default = "defaults::max_nodes_per_write")]
    pub max_nodes_per_write: usize,
    /// Maximum number of entries in a `Browse` request.
    #[serde(default = "defaults::max_nodes_per_browse")]
    pub max_nodes_per_browse: usize,
    /// Maximum number of entries in a `TranslateBrowsePathsToNodeIds` request.
    #[serde(default = "defaults::max_nodes_per_translate_browse_paths")]
    pub max_nodes_per_translate_browse_paths: usize,
    /// Maximum number of entries in a `Call` request.
    #[serde(default = "defaults::max_nodes_per_method_call")]
    pub max_nodes_per_method_call: usize,
    /// Maximum number of entries in Create/Modify/Delete/SetMonitoringMode MonitoredItems.
    #[serde(default = "defaults::max_monitored_items_per_call")]
    pub max_monitored_items_per_call: usize,
    /// Maximum number of references returned per node by one Browse call before
    /// a continuation point is issued.
    #[serde(default = "defaults::max_references_per_browse_node")]
    pub max_references_per_browse_node: usize,
}

impl Default for OperationalLimits {
    fn default() -> Self {
        Self {
            max_nodes_per_read: defaults::max_nodes_per_read(),
            max_nodes_per_write: defaults::max_nodes_per_write(),
            max_nodes_per_browse: defaults::max_nodes_per_browse(),
            max_nodes_per_translate_browse_paths: defaults::max_nodes_per_translate_browse_paths(),
            max_nodes_per_method_call: defaults::max_nodes_per_method_call(),
            max_monitored_items_per_call: defaults::max_monitored_items_per_call(),
            max_references_per_browse_node: defaults::max_references_per_browse_node(),
        }
    }
}

/// Subscription-engine limits (`SPEC_FULL.md` §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionLimits {
    /// Subscriptions any single session may hold open.
    #[serde(default = "defaults::max_subscriptions_per_session")]
    pub max_subscriptions_per_session: usize,
    /// Floor applied to a client's requested publishing interval, in ms.
    #[serde(default = "defaults::min_publishing_interval_ms")]
    pub min_publishing_interval_ms: f64,
    /// Floor applied to a MonitoredItem's requested sampling interval, in ms.
    #[serde(default = "defaults::min_sampling_interval_ms")]
    pub min_sampling_interval_ms: f64,
    /// Ceiling applied to a client's requested keep-alive count.
    #[serde(default = "defaults::max_keep_alive_count")]
    pub max_keep_alive_count: u32,
    /// MonitoredItems any single subscription may hold; 0 = unlimited.
    #[serde(default = "defaults::max_monitored_items_per_subscription")]
    pub max_monitored_items_per_subscription: usize,
    /// Notification queue depth applied when a MonitoredItem requests a larger one.
    #[serde(default = "defaults::max_monitored_item_queue_size")]
    pub max_monitored_item_queue_size: usize,
    /// Retransmission queue depth per subscription, for `Republish`.
    #[serde(default = "defaults::max_retransmit_queue_size")]
    pub max_retransmit_queue_size: usize,
}

impl Default for SubscriptionLimits {
    fn default() -> Self {
        Self {
            max_subscriptions_per_session: defaults::max_subscriptions_per_session(),
            min_publishing_interval_ms: defaults::min_publishing_interval_ms(),
            min_sampling_interval_ms: defaults::min_sampling_interval_ms(),
            max_keep_alive_count: defaults::max_keep_alive_count(),
            max_monitored_items_per_subscription: defaults::max_monitored_items_per_subscription(),
            max_monitored_item_queue_size: defaults::max_monitored_item_queue_size(),
            max_retransmit_queue_size: defaults::max_retransmit_queue_size(),
        }
    }
}

/// All server resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ServerLimits {
    /// Registered sessions before `CreateSession` starts rejecting with `BadTooManySessions`.
    #[serde(default = "defaults::max_sessions")]
    pub max_sessions: usize,
    /// Per-service array caps.
    #[serde(default)]
    pub operational: OperationalLimits,
    /// Subscription-engine caps.
    #[serde(default)]
    pub subscriptions: SubscriptionLimits,
}

/// Server identity and resource configuration, loaded from a JSON5 document
/// via [`Config::load`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Application name advertised in `ApplicationDescription`.
    pub application_name: String,
    /// Globally unique application URI.
    pub application_uri: String,
    /// Product URI, stable across versions.
    pub product_uri: String,
    /// Endpoint URLs this server listens on.
    pub endpoint_urls: Vec<String>,
    /// Default session timeout applied when a client requests 0, in ms.
    #[serde(default = "defaults::max_session_timeout_ms")]
    pub max_session_timeout_ms: u64,
    /// Resource limits.
    #[serde(default)]
    pub limits: ServerLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            application_name: "opcua-server".into(),
            application_uri: "urn:opcua-server".into(),
            product_uri: "urn:opcua-server:product".into(),
            endpoint_urls: vec!["opc.tcp://127.0.0.1:4840".into()],
            max_session_timeout_ms: defaults::max_session_timeout_ms(),
            limits: ServerLimits::default(),
        }
    }
}

impl Config for ServerConfig {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.endpoint_urls.is_empty() {
            errors.push("at least one endpoint_url is required".to_string());
        }
        if self.limits.subscriptions.min_publishing_interval_ms <= 0.0 {
            errors.push("min_publishing_interval_ms must be positive".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn application_name(&self) -> UAString {
        UAString::from(self.application_name.as_str())
    }

    fn application_uri(&self) -> UAString {
        UAString::from(self.application_uri.as_str())
    }

    fn product_uri(&self) -> UAString {
        UAString::from(self.product_uri.as_str())
    }

    fn application_type(&self) -> ApplicationType {
        ApplicationType::Server
    }

    fn discovery_urls(&self) -> Option<Vec<UAString>> {
        Some(self.endpoint_urls.iter().map(|u| UAString::from(u.as_str())).collect())
    }
}

impl ServerConfig {
    /// Build the unsecured `None`/`None` endpoint this server always advertises.
    /// Additional secured endpoints are an address-space/transport concern this
    /// crate's Non-goals exclude (see `DESIGN.md`).
    pub fn endpoint_descriptions(&self, url: &str) -> Vec<EndpointDescription> {
        self.endpoint_urls
            .iter()
            .filter(|u| u.as_str() == url)
            .map(|u| EndpointDescription {
                endpoint_url: UAString::from(u.as_str()),
                server: self.application_description(),
                server_certificate: opcua_types::ByteString::null(),
                security_mode: MessageSecurityMode::None,
                security_policy_uri: UAString::from("http://opcfoundation.org/UA/SecurityPolicy#None"),
                user_identity_tokens: Some(vec![
                    opcua_types::generated::UserTokenPolicy::anonymous(),
                    opcua_types::generated::UserTokenPolicy::user_name(),
                ]),
                transport_profile_uri: UAString::from(
                    "http://opcfoundation.org/UA-Profile/Transport/uatcp-uasc-uabinary",
                ),
                security_level: 0,
            })
            .collect()
    }
}

mod defaults {
    pub fn max_nodes_per_read() -> usize {
        1000
    }
    pub fn max_nodes_per_write() -> usize {
        1000
    }
    pub fn max_nodes_per_browse() -> usize {
        1000
    }
    pub fn max_nodes_per_translate_browse_paths() -> usize {
        1000
    }
    pub fn max_nodes_per_method_call() -> usize {
        1000
    }
    pub fn max_monitored_items_per_call() -> usize {
        1000
    }
    pub fn max_references_per_browse_node() -> usize {
        1000
    }
    pub fn max_subscriptions_per_session() -> usize {
        100
    }
    pub fn min_publishing_interval_ms() -> f64 {
        100.0
    }
    pub fn min_sampling_interval_ms() -> f64 {
        100.0
    }
    pub fn max_keep_alive_count() -> u32 {
        2000
    }
    pub fn max_monitored_items_per_subscription() -> usize {
        0
    }
    pub fn max_monitored_item_queue_size() -> usize {
        100
    }
    pub fn max_retransmit_queue_size() -> usize {
        100
    }
    pub fn max_sessions() -> usize {
        100
    }
    pub fn max_session_timeout_ms() -> u64 {
        600_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_endpoint_list_fails_validation() {
        let mut config = ServerConfig::default();
        config.endpoint_urls.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn endpoint_descriptions_filter_by_url() {
        let config = ServerConfig::default();
        let eps = config.endpoint_descriptions("opc.tcp://127.0.0.1:4840");
        assert_eq!(eps.len(), 1);
        assert!(config.endpoint_descriptions("opc.tcp://nowhere:1").is_empty());
    }
}
