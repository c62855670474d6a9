// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// This file was generated by opcua-codegen from dictionary/types.yaml. DO NOT EDIT.

//! Publish/Republish bodies and the notification payloads a subscription
//! delivers: `DataChangeNotification` and `EventNotificationList`, both
//! carried inside a [`NotificationMessage`] as [`ExtensionObject`]s.

use crate::{
    binary_struct,
    data_value::DataValue,
    date_time::UtcTime,
    generated::headers::{RequestHeader, ResponseHeader},
    status_code::StatusCode,
    variant::{ExtensionObject, Variant},
    UaNullable,
};

/// One sample delivered for a DataChange MonitoredItem.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoredItemNotification {
    /// Client handle from the MonitoredItem's [`crate::generated::monitored_item::MonitoringParameters`].
    pub client_handle: u32,
    /// The sampled value, with whichever timestamps were requested.
    pub value: DataValue,
}

impl UaNullable for MonitoredItemNotification {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(MonitoredItemNotification {
    client_handle: u32,
    value: DataValue,
});

/// Batch of DataChange samples for one publish cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataChangeNotification {
    /// Samples from every DataChange MonitoredItem that reported this cycle.
    pub monitored_items: Option<Vec<MonitoredItemNotification>>,
    /// Reserved; always empty in this implementation.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for DataChangeNotification {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(DataChangeNotification {
    monitored_items: Option<Vec<MonitoredItemNotification>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// Projected select-clause values for one fired event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventFieldList {
    /// Client handle of the event MonitoredItem that fired.
    pub client_handle: u32,
    /// One value per select-clause, in the order requested by the `EventFilter`.
    pub event_fields: Option<Vec<Variant>>,
}

impl UaNullable for EventFieldList {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(EventFieldList {
    client_handle: u32,
    event_fields: Option<Vec<Variant>>,
});

/// Batch of fired events for one publish cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventNotificationList {
    /// Field projections from every event MonitoredItem that fired this cycle.
    pub events: Option<Vec<EventFieldList>>,
}

impl UaNullable for EventNotificationList {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(EventNotificationList {
    events: Option<Vec<EventFieldList>>,
});

/// One publish cycle's worth of notifications for a subscription.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotificationMessage {
    /// Monotonically increasing per-subscription sequence number.
    pub sequence_number: u32,
    /// When the server assembled this message.
    pub publish_time: UtcTime,
    /// Encoded [`DataChangeNotification`]/[`EventNotificationList`] payloads;
    /// empty for a keep-alive message.
    pub notification_data: Option<Vec<ExtensionObject>>,
}

impl UaNullable for NotificationMessage {
    fn is_ua_null(&self) -> bool {
        false
    }
}

impl NotificationMessage {
    /// Build an empty keep-alive notification.
    pub fn keep_alive(sequence_number: u32) -> Self {
        Self {
            sequence_number,
            publish_time: UtcTime::now(),
            notification_data: None,
        }
    }

    /// True if this carries no notification payloads.
    pub fn is_keep_alive(&self) -> bool {
        self.notification_data.as_ref().map(|v| v.is_empty()).unwrap_or(true)
    }
}

binary_struct!(NotificationMessage {
    sequence_number: u32,
    publish_time: UtcTime,
    notification_data: Option<Vec<ExtensionObject>>,
});

/// Acknowledges receipt of a previously delivered notification so its entry
/// in the server's retransmission queue can be freed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubscriptionAcknowledgement {
    /// Subscription the acknowledged message belongs to.
    pub subscription_id: u32,
    /// Sequence number being acknowledged.
    pub sequence_number: u32,
}

impl UaNullable for SubscriptionAcknowledgement {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(SubscriptionAcknowledgement {
    subscription_id: u32,
    sequence_number: u32,
});

/// Request body for the Publish service: a client "credit" the server may
/// hold parked until it has something to deliver.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PublishRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Notifications from prior PublishResponses being acknowledged.
    pub subscription_acknowledgements: Option<Vec<SubscriptionAcknowledgement>>,
}

impl UaNullable for PublishRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(PublishRequest {
    request_header: RequestHeader,
    subscription_acknowledgements: Option<Vec<SubscriptionAcknowledgement>>,
});

/// Response body for the Publish service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PublishResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// Subscription this message was delivered for.
    pub subscription_id: u32,
    /// Other subscriptions on this session with notifications still pending.
    pub available_sequence_numbers: Option<Vec<u32>>,
    /// True if `notification_message`'s sequence number follows a gap the
    /// client should fill in via Republish.
    pub more_notifications: bool,
    /// The delivered notifications, or an empty keep-alive.
    pub notification_message: NotificationMessage,
    /// Per-acknowledgement result, same order as the request's `subscription_acknowledgements`.
    pub results: Option<Vec<StatusCode>>,
    /// Per-acknowledgement diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for PublishResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(PublishResponse {
    response_header: ResponseHeader,
    subscription_id: u32,
    available_sequence_numbers: Option<Vec<u32>>,
    more_notifications: bool,
    notification_message: NotificationMessage,
    results: Option<Vec<StatusCode>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// Request body for the Republish service: re-deliver one already-sent message by sequence number.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepublishRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Subscription the message was sent on.
    pub subscription_id: u32,
    /// Sequence number to re-deliver.
    pub retransmit_sequence_number: u32,
}

impl UaNullable for RepublishRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(RepublishRequest {
    request_header: RequestHeader,
    subscription_id: u32,
    retransmit_sequence_number: u32,
});

/// Response body for the Republish service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepublishResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// The re-delivered message.
    pub notification_message: NotificationMessage,
}

impl UaNullable for RepublishResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(RepublishResponse {
    response_header: ResponseHeader,
    notification_message: NotificationMessage,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encoding::{BinaryDecodable, BinaryEncodable, Context},
        namespaces::NamespaceMap,
        node_id::NodeId,
    };

    fn ctx() -> Context<'static> {
        static NS: std::sync::OnceLock<NamespaceMap> = std::sync::OnceLock::new();
        Context::new(NS.get_or_init(NamespaceMap::new))
    }

    #[test]
    fn keep_alive_roundtrips_with_no_notification_data() {
        let ctx = ctx();
        let msg = NotificationMessage::keep_alive(3);
        assert!(msg.is_keep_alive());
        let bytes = msg.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        let back = NotificationMessage::decode(&mut cur, &ctx).unwrap();
        assert_eq!(back.sequence_number, 3);
        assert!(back.is_keep_alive());
    }

    #[test]
    fn data_change_notification_wraps_through_extension_object() {
        let ctx = ctx();
        let dcn = DataChangeNotification {
            monitored_items: Some(vec![MonitoredItemNotification {
                client_handle: 7,
                value: DataValue::new_now(Variant::Int32(1)),
            }]),
            diagnostic_infos: None,
        };
        let wrapped = ExtensionObject::from_encodable(NodeId::new(0, 811u32), &dcn, &ctx).unwrap();
        let msg = NotificationMessage {
            sequence_number: 1,
            publish_time: UtcTime::now(),
            notification_data: Some(vec![wrapped]),
        };
        assert!(!msg.is_keep_alive());
        let bytes = msg.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        let back = NotificationMessage::decode(&mut cur, &ctx).unwrap();
        let data = back.notification_data.unwrap();
        let decoded: DataChangeNotification = data[0].decode_inner(&ctx).unwrap();
        assert_eq!(decoded, dcn);
    }
}
