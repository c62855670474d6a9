// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// This file was generated by opcua-codegen from dictionary/types.yaml. DO NOT EDIT.

//! CreateMonitoredItems/ModifyMonitoredItems/DeleteMonitoredItems/
//! SetMonitoringMode bodies, and the filter/parameter types they carry.

use crate::{
    binary_struct,
    generated::{attribute::ReadValueId, headers::{RequestHeader, ResponseHeader}},
    status_code::StatusCode,
    variant::ExtensionObject,
    wire_enum, UaNullable,
};

wire_enum!(MonitoringMode, default = Reporting {
    Disabled = 0,
    Sampling = 1,
    Reporting = 2,
});

wire_enum!(DataChangeTrigger, default = StatusValue {
    Status = 0,
    StatusValue = 1,
    StatusValueTimestamp = 2,
});

wire_enum!(DeadbandType, default = None {
    None = 0,
    Absolute = 1,
    Percent = 2,
});

/// Filter governing when a sampled value is enqueued for publishing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataChangeFilter {
    /// Which parts of the value must change to trigger a notification.
    pub trigger: DataChangeTrigger,
    /// None/Absolute/Percent deadband.
    pub deadband_type: DeadbandType,
    /// Deadband magnitude; meaning depends on `deadband_type`.
    pub deadband_value: f64,
}

impl UaNullable for DataChangeFilter {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(DataChangeFilter {
    trigger: DataChangeTrigger,
    deadband_type: DeadbandType,
    deadband_value: f64,
});

/// Sampling/queueing parameters requested for one MonitoredItem.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoringParameters {
    /// Client-assigned handle returned in every notification from this item.
    pub client_handle: u32,
    /// Sampling interval in ms; 0 means notify-on-write, negative means
    /// "use the subscription's publishing interval".
    pub sampling_interval: f64,
    /// Encoded [`DataChangeFilter`] or `EventFilter`; null means the default
    /// DataChange filter (trigger = StatusValue, no deadband).
    pub filter: ExtensionObject,
    /// Notification queue depth; at least 1.
    pub queue_size: u32,
    /// Whether to discard the oldest (`true`) or newest (`false`) sample on overflow.
    pub discard_oldest: bool,
}

impl UaNullable for MonitoringParameters {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(MonitoringParameters {
    client_handle: u32,
    sampling_interval: f64,
    filter: ExtensionObject,
    queue_size: u32,
    discard_oldest: bool,
});

/// Request to create one MonitoredItem.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoredItemCreateRequest {
    /// Attribute being monitored.
    pub item_to_monitor: ReadValueId,
    /// Initial monitoring mode.
    pub monitoring_mode: MonitoringMode,
    /// Sampling/queueing parameters.
    pub requested_parameters: MonitoringParameters,
}

impl UaNullable for MonitoredItemCreateRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(MonitoredItemCreateRequest {
    item_to_monitor: ReadValueId,
    monitoring_mode: MonitoringMode,
    requested_parameters: MonitoringParameters,
});

/// Result of creating one MonitoredItem.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoredItemCreateResult {
    /// `Good`, or an error such as `BadFilterNotAllowed`.
    pub status_code: StatusCode,
    /// Server-assigned id, used by Modify/Delete/SetMonitoringMode/SetTriggering.
    pub monitored_item_id: u32,
    /// Sampling interval the server actually applied.
    pub revised_sampling_interval: f64,
    /// Queue size the server actually applied.
    pub revised_queue_size: u32,
    /// Server-side state of the filter, if it produced one (e.g. initial deadband baseline).
    pub filter_result: ExtensionObject,
}

impl UaNullable for MonitoredItemCreateResult {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(MonitoredItemCreateResult {
    status_code: StatusCode,
    monitored_item_id: u32,
    revised_sampling_interval: f64,
    revised_queue_size: u32,
    filter_result: ExtensionObject,
});

/// Request body for the CreateMonitoredItems service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateMonitoredItemsRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Subscription the new items are attached to.
    pub subscription_id: u32,
    /// Which timestamps to include in each item's notifications.
    pub timestamps_to_return: crate::generated::attribute::TimestampsToReturn,
    /// One entry per MonitoredItem to create.
    pub items_to_create: Option<Vec<MonitoredItemCreateRequest>>,
}

impl UaNullable for CreateMonitoredItemsRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CreateMonitoredItemsRequest {
    request_header: RequestHeader,
    subscription_id: u32,
    timestamps_to_return: crate::generated::attribute::TimestampsToReturn,
    items_to_create: Option<Vec<MonitoredItemCreateRequest>>,
});

/// Response body for the CreateMonitoredItems service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateMonitoredItemsResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One result per entry in `items_to_create`.
    pub results: Option<Vec<MonitoredItemCreateResult>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for CreateMonitoredItemsResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CreateMonitoredItemsResponse {
    response_header: ResponseHeader,
    results: Option<Vec<MonitoredItemCreateResult>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// Request to modify one existing MonitoredItem's parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoredItemModifyRequest {
    /// Item being modified.
    pub monitored_item_id: u32,
    /// New sampling/queueing parameters, replacing the previous ones.
    pub requested_parameters: MonitoringParameters,
}

impl UaNullable for MonitoredItemModifyRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(MonitoredItemModifyRequest {
    monitored_item_id: u32,
    requested_parameters: MonitoringParameters,
});

/// Result of modifying one MonitoredItem.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoredItemModifyResult {
    /// `Good`, or an error such as `BadMonitoredItemIdInvalid`.
    pub status_code: StatusCode,
    /// Sampling interval the server actually applied.
    pub revised_sampling_interval: f64,
    /// Queue size the server actually applied.
    pub revised_queue_size: u32,
    /// Server-side state of the filter, if it produced one.
    pub filter_result: ExtensionObject,
}

impl UaNullable for MonitoredItemModifyResult {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(MonitoredItemModifyResult {
    status_code: StatusCode,
    revised_sampling_interval: f64,
    revised_queue_size: u32,
    filter_result: ExtensionObject,
});

/// Request body for the ModifyMonitoredItems service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifyMonitoredItemsRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Subscription the items belong to.
    pub subscription_id: u32,
    /// Which timestamps to include in each item's notifications from now on.
    pub timestamps_to_return: crate::generated::attribute::TimestampsToReturn,
    /// One entry per MonitoredItem to modify.
    pub items_to_modify: Option<Vec<MonitoredItemModifyRequest>>,
}

impl UaNullable for ModifyMonitoredItemsRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(ModifyMonitoredItemsRequest {
    request_header: RequestHeader,
    subscription_id: u32,
    timestamps_to_return: crate::generated::attribute::TimestampsToReturn,
    items_to_modify: Option<Vec<MonitoredItemModifyRequest>>,
});

/// Response body for the ModifyMonitoredItems service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifyMonitoredItemsResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One result per entry in `items_to_modify`.
    pub results: Option<Vec<MonitoredItemModifyResult>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for ModifyMonitoredItemsResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(ModifyMonitoredItemsResponse {
    response_header: ResponseHeader,
    results: Option<Vec<MonitoredItemModifyResult>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// Request body for the DeleteMonitoredItems service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteMonitoredItemsRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Subscription the items belong to.
    pub subscription_id: u32,
    /// Ids of the items to delete.
    pub monitored_item_ids: Option<Vec<u32>>,
}

impl UaNullable for DeleteMonitoredItemsRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(DeleteMonitoredItemsRequest {
    request_header: RequestHeader,
    subscription_id: u32,
    monitored_item_ids: Option<Vec<u32>>,
});

/// Response body for the DeleteMonitoredItems service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteMonitoredItemsResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One status per entry in `monitored_item_ids`.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for DeleteMonitoredItemsResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(DeleteMonitoredItemsResponse {
    response_header: ResponseHeader,
    results: Option<Vec<StatusCode>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// Request body for the SetMonitoringMode service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetMonitoringModeRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Subscription the items belong to.
    pub subscription_id: u32,
    /// Mode to apply to every listed item.
    pub monitoring_mode: MonitoringMode,
    /// Ids of the items to change.
    pub monitored_item_ids: Option<Vec<u32>>,
}

impl UaNullable for SetMonitoringModeRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(SetMonitoringModeRequest {
    request_header: RequestHeader,
    subscription_id: u32,
    monitoring_mode: MonitoringMode,
    monitored_item_ids: Option<Vec<u32>>,
});

/// Response body for the SetMonitoringMode service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetMonitoringModeResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One status per entry in `monitored_item_ids`.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for SetMonitoringModeResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(SetMonitoringModeResponse {
    response_header: ResponseHeader,
    results: Option<Vec<StatusCode>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// Request body for the SetTriggering service: links/unlinks "triggering"
/// MonitoredItems to a sampling-only item so it reports for one cycle when
/// the trigger fires.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetTriggeringRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Subscription the items belong to.
    pub subscription_id: u32,
    /// The sampling-only item whose triggering links are being changed.
    pub triggering_item_id: u32,
    /// Items to add as triggers.
    pub links_to_add: Option<Vec<u32>>,
    /// Items to remove as triggers.
    pub links_to_remove: Option<Vec<u32>>,
}

impl UaNullable for SetTriggeringRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(SetTriggeringRequest {
    request_header: RequestHeader,
    subscription_id: u32,
    triggering_item_id: u32,
    links_to_add: Option<Vec<u32>>,
    links_to_remove: Option<Vec<u32>>,
});

/// Response body for the SetTriggering service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetTriggeringResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One status per entry in `links_to_add`.
    pub add_results: Option<Vec<StatusCode>>,
    /// Per-link diagnostic info for `links_to_add`; empty unless requested.
    pub add_diagnostic_infos: Option<Vec<StatusCode>>,
    /// One status per entry in `links_to_remove`.
    pub remove_results: Option<Vec<StatusCode>>,
    /// Per-link diagnostic info for `links_to_remove`; empty unless requested.
    pub remove_diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for SetTriggeringResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(SetTriggeringResponse {
    response_header: ResponseHeader,
    add_results: Option<Vec<StatusCode>>,
    add_diagnostic_infos: Option<Vec<StatusCode>>,
    remove_results: Option<Vec<StatusCode>>,
    remove_diagnostic_infos: Option<Vec<StatusCode>>,
});
