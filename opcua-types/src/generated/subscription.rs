// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// This file was generated by opcua-codegen from dictionary/types.yaml. DO NOT EDIT.

//! CreateSubscription/ModifySubscription/DeleteSubscriptions/
//! SetPublishingMode/TransferSubscriptions bodies.

use crate::{binary_struct, generated::headers::{RequestHeader, ResponseHeader}, status_code::StatusCode, UaNullable};

/// Request body for the CreateSubscription service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateSubscriptionRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Requested interval between publish cycles, in milliseconds.
    pub requested_publishing_interval: f64,
    /// Requested number of publish cycles without a message before the subscription times out.
    pub requested_lifetime_count: u32,
    /// Requested number of publish cycles without new notifications before a keep-alive is sent.
    pub requested_max_keep_alive_count: u32,
    /// Maximum number of notifications the server may batch into one PublishResponse.
    pub max_notifications_per_publish: u32,
    /// Whether the subscription starts in the publishing-enabled state.
    pub publishing_enabled: bool,
    /// Relative priority among the session's subscriptions for PublishRequest allocation.
    pub priority: u8,
}

impl UaNullable for CreateSubscriptionRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CreateSubscriptionRequest {
    request_header: RequestHeader,
    requested_publishing_interval: f64,
    requested_lifetime_count: u32,
    requested_max_keep_alive_count: u32,
    max_notifications_per_publish: u32,
    publishing_enabled: bool,
    priority: u8,
});

/// Response body for the CreateSubscription service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateSubscriptionResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// Server-assigned subscription id.
    pub subscription_id: u32,
    /// Publishing interval the server actually applied, in milliseconds.
    pub revised_publishing_interval: f64,
    /// Lifetime count the server actually applied.
    pub revised_lifetime_count: u32,
    /// Keep-alive count the server actually applied.
    pub revised_max_keep_alive_count: u32,
}

impl UaNullable for CreateSubscriptionResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CreateSubscriptionResponse {
    response_header: ResponseHeader,
    subscription_id: u32,
    revised_publishing_interval: f64,
    revised_lifetime_count: u32,
    revised_max_keep_alive_count: u32,
});

/// Request body for the ModifySubscription service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifySubscriptionRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Subscription being modified.
    pub subscription_id: u32,
    /// New requested publishing interval in milliseconds.
    pub requested_publishing_interval: f64,
    /// New requested lifetime count.
    pub requested_lifetime_count: u32,
    /// New requested keep-alive count.
    pub requested_max_keep_alive_count: u32,
    /// New maximum notifications per publish.
    pub max_notifications_per_publish: u32,
    /// New relative priority.
    pub priority: u8,
}

impl UaNullable for ModifySubscriptionRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(ModifySubscriptionRequest {
    request_header: RequestHeader,
    subscription_id: u32,
    requested_publishing_interval: f64,
    requested_lifetime_count: u32,
    requested_max_keep_alive_count: u32,
    max_notifications_per_publish: u32,
    priority: u8,
});

/// Response body for the ModifySubscription service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifySubscriptionResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// Publishing interval the server actually applied.
    pub revised_publishing_interval: f64,
    /// Lifetime count the server actually applied.
    pub revised_lifetime_count: u32,
    /// Keep-alive count the server actually applied.
    pub revised_max_keep_alive_count: u32,
}

impl UaNullable for ModifySubscriptionResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(ModifySubscriptionResponse {
    response_header: ResponseHeader,
    revised_publishing_interval: f64,
    revised_lifetime_count: u32,
    revised_max_keep_alive_count: u32,
});

/// Request body for the DeleteSubscriptions service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteSubscriptionsRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Ids of the subscriptions to delete.
    pub subscription_ids: Option<Vec<u32>>,
}

impl UaNullable for DeleteSubscriptionsRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(DeleteSubscriptionsRequest {
    request_header: RequestHeader,
    subscription_ids: Option<Vec<u32>>,
});

/// Response body for the DeleteSubscriptions service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteSubscriptionsResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One status per entry in `subscription_ids`.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for DeleteSubscriptionsResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(DeleteSubscriptionsResponse {
    response_header: ResponseHeader,
    results: Option<Vec<StatusCode>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// Request body for the SetPublishingMode service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPublishingModeRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Whether publishing should be enabled or suspended.
    pub publishing_enabled: bool,
    /// Ids of the subscriptions to change.
    pub subscription_ids: Option<Vec<u32>>,
}

impl UaNullable for SetPublishingModeRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(SetPublishingModeRequest {
    request_header: RequestHeader,
    publishing_enabled: bool,
    subscription_ids: Option<Vec<u32>>,
});

/// Response body for the SetPublishingMode service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPublishingModeResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One status per entry in `subscription_ids`.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for SetPublishingModeResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(SetPublishingModeResponse {
    response_header: ResponseHeader,
    results: Option<Vec<StatusCode>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// Request body for the TransferSubscriptions service: re-homes subscriptions
/// left in the transferable pool onto the calling session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransferSubscriptionsRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Ids of the subscriptions to transfer onto this session.
    pub subscription_ids: Option<Vec<u32>>,
    /// Whether to re-deliver the last sent notification immediately after transfer.
    pub send_initial_values: bool,
}

impl UaNullable for TransferSubscriptionsRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(TransferSubscriptionsRequest {
    request_header: RequestHeader,
    subscription_ids: Option<Vec<u32>>,
    send_initial_values: bool,
});

/// Result of transferring one subscription.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransferResult {
    /// `Good`, `GoodSubscriptionTransferred`, or an error.
    pub status_code: StatusCode,
    /// Ids of MonitoredItems whose last value is being re-delivered.
    pub available_sequence_numbers: Option<Vec<u32>>,
}

impl UaNullable for TransferResult {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(TransferResult {
    status_code: StatusCode,
    available_sequence_numbers: Option<Vec<u32>>,
});

/// Response body for the TransferSubscriptions service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransferSubscriptionsResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One result per entry in `subscription_ids`.
    pub results: Option<Vec<TransferResult>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for TransferSubscriptionsResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(TransferSubscriptionsResponse {
    response_header: ResponseHeader,
    results: Option<Vec<TransferResult>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});
