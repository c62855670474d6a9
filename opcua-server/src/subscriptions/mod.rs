// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! [`Subscription`]/[`SubscriptionManager`]: the publishing timer, the
//! notification batching and retransmission queue, and the
//! CreateSubscription/ModifySubscription/DeleteSubscriptions/
//! SetPublishingMode/TransferSubscriptions and CreateMonitoredItems/
//! ModifyMonitoredItems/DeleteMonitoredItems/SetMonitoringMode/
//! SetTriggering services that mutate it (`SPEC_FULL.md` §4.9/§4.9.1).
//!
//! No literal teacher file covers server-side subscriptions (the teacher
//! pack's subscription engine lives client-side only); this module is
//! grounded instead on this crate's own tick-polling idiom
//! ([`crate::async_op::AsyncOperations::expire`],
//! [`crate::session::manager::SessionManager::expire_sessions`]) and on
//! `SPEC_FULL.md` §4.9's publishing-timer/keep-alive/lifetime prose.

pub mod event;
pub mod monitored_item;

pub use event::{reachable_notifiers, FiredEvent};
pub use monitored_item::{MonitoredItem, QueuedNotification};

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use opcua_types::generated::{
    CreateMonitoredItemsRequest, CreateMonitoredItemsResponse, CreateSubscriptionRequest, CreateSubscriptionResponse,
    DeleteMonitoredItemsRequest, DeleteMonitoredItemsResponse, ModifyMonitoredItemsRequest, ModifyMonitoredItemsResponse,
    ModifySubscriptionRequest, ModifySubscriptionResponse, MonitoredItemCreateRequest, MonitoredItemCreateResult,
    MonitoredItemModifyRequest, MonitoredItemModifyResult, MonitoringMode, SetMonitoringModeRequest,
    SetMonitoringModeResponse, SetTriggeringRequest, SetTriggeringResponse, TransferResult,
};
use opcua_types::generated::{
    DataChangeNotification, EventFieldList, EventNotificationList, MonitoredItemNotification, NotificationMessage,
    PublishRequest, PublishResponse, ResponseHeader,
};
use opcua_types::constants::next_sequence_number;
use opcua_types::variant::ExtensionObject;
use opcua_types::{Context, DataValue, NamespaceMap, NodeId, StatusCode, UtcTime};
use opcua_nodes::AddressSpace;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::config::SubscriptionLimits;

/// Real `DataChangeNotification_Encoding_DefaultBinary` id, same precedent
/// `opcua_types::generated::notification`'s own test uses.
const ENCODING_ID_DATA_CHANGE_NOTIFICATION: u32 = 811;
/// Real `EventNotificationList_Encoding_DefaultBinary` id.
const ENCODING_ID_EVENT_NOTIFICATION_LIST: u32 = 916;

fn encode_ctx() -> Context<'static> {
    static NS: std::sync::OnceLock<NamespaceMap> = std::sync::OnceLock::new();
    Context::new(NS.get_or_init(NamespaceMap::new))
}

/// Lifecycle state of one [`Subscription`], mirroring the standard's subscription state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Created, no publish cycle has run yet.
    Creating,
    /// Publishing and keeping up with demand.
    Normal,
    /// Notifications are queued but no `Publish` request was available to carry them.
    Late,
    /// Nothing queued; the keep-alive counter is ticking down.
    KeepAlive,
    /// Deleted, or its lifetime counter reached zero.
    Closed,
}

/// Resolves a previously parked `Publish` once this subscription has something to deliver, or
/// fails it outright (e.g. `DeleteSubscriptions` leaving no subscription able to serve it).
type PublishSender = oneshot::Sender<Result<(u32, NotificationMessage), StatusCode>>;

/// One subscription: its publishing timer, MonitoredItems, and the
/// retransmission/parked-request queues the Publish/Republish services read.
pub struct Subscription {
    id: u32,
    publishing_interval_ms: f64,
    max_keep_alive_count: u32,
    max_lifetime_count: u32,
    max_notifications_per_publish: u32,
    priority: u8,
    publishing_enabled: bool,
    state: SubscriptionState,
    current_keep_alive_counter: u32,
    current_lifetime_counter: u32,
    next_sequence_number: u32,
    monitored_items: HashMap<u32, MonitoredItem>,
    next_item_id: u32,
    retransmission_queue: VecDeque<NotificationMessage>,
    max_retransmit_queue_size: usize,
    /// Parked `Publish` requests, FIFO. `SPEC_FULL.md` leaves it open whether this queue lives
    /// per-subscription or per-session; kept per-subscription here since a `PublishRequest`
    /// resolves against exactly one subscription's notification message, and
    /// `SubscriptionManager::publish` is the one place that needs to reason about a session's
    /// several subscriptions at once (see `DESIGN.md`).
    parked_publish: VecDeque<PublishSender>,
    next_publish_deadline: Instant,
}

impl Subscription {
    /// Build a new subscription from a `CreateSubscription` request, applying `limits`.
    pub fn new(id: u32, request: &CreateSubscriptionRequest, limits: &SubscriptionLimits, now: Instant) -> (Self, CreateSubscriptionResponse) {
        let publishing_interval_ms = request.requested_publishing_interval.max(limits.min_publishing_interval_ms);
        let max_keep_alive_count = request.requested_max_keep_alive_count.clamp(1, limits.max_keep_alive_count);
        // The standard requires lifetimeCount be at least 3x keepAliveCount so a subscription
        // outlives a few missed keep-alives before timing out.
        let max_lifetime_count = request.requested_lifetime_count.max(max_keep_alive_count.saturating_mul(3));
        let sub = Self {
            id,
            publishing_interval_ms,
            max_keep_alive_count,
            max_lifetime_count,
            max_notifications_per_publish: request.max_notifications_per_publish,
            priority: request.priority,
            publishing_enabled: request.publishing_enabled,
            state: SubscriptionState::Creating,
            current_keep_alive_counter: max_keep_alive_count,
            current_lifetime_counter: max_lifetime_count,
            next_sequence_number: 1,
            monitored_items: HashMap::new(),
            next_item_id: 1,
            retransmission_queue: VecDeque::new(),
            max_retransmit_queue_size: limits.max_retransmit_queue_size.max(1),
            parked_publish: VecDeque::new(),
            next_publish_deadline: now + Duration::from_millis(publishing_interval_ms.max(1.0) as u64),
        };
        let response = CreateSubscriptionResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            subscription_id: id,
            revised_publishing_interval: publishing_interval_ms,
            revised_lifetime_count: max_lifetime_count,
            revised_max_keep_alive_count: max_keep_alive_count,
        };
        (sub, response)
    }

    /// Server-assigned id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Whether `Publish` currently delivers notifications for this subscription.
    pub fn publishing_enabled(&self) -> bool {
        self.publishing_enabled
    }

    /// Relative priority among a session's subscriptions, e.g. for `Publish` allocation order.
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// `ModifySubscription`: replace the publishing timer parameters, resetting both counters.
    pub fn modify(&mut self, request: &ModifySubscriptionRequest, limits: &SubscriptionLimits) -> ModifySubscriptionResponse {
        self.publishing_interval_ms = request.requested_publishing_interval.max(limits.min_publishing_interval_ms);
        self.max_keep_alive_count = request.requested_max_keep_alive_count.clamp(1, limits.max_keep_alive_count);
        self.max_lifetime_count = request.requested_lifetime_count.max(self.max_keep_alive_count.saturating_mul(3));
        self.max_notifications_per_publish = request.max_notifications_per_publish;
        self.priority = request.priority;
        self.current_keep_alive_counter = self.max_keep_alive_count;
        self.current_lifetime_counter = self.max_lifetime_count;
        ModifySubscriptionResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            revised_publishing_interval: self.publishing_interval_ms,
            revised_lifetime_count: self.max_lifetime_count,
            revised_max_keep_alive_count: self.max_keep_alive_count,
        }
    }

    /// `SetPublishingMode`.
    pub fn set_publishing_mode(&mut self, enabled: bool) {
        self.publishing_enabled = enabled;
    }

    /// `CreateMonitoredItems`: add one item, applying `limits` to its requested parameters. A
    /// negative `sampling_interval` ("use the subscription's publishing interval") resolves
    /// against [`Self::publishing_interval_ms`].
    pub fn create_monitored_item(&mut self, request: &MonitoredItemCreateRequest, limits: &SubscriptionLimits) -> MonitoredItemCreateResult {
        if limits.max_monitored_items_per_subscription != 0 && self.monitored_items.len() >= limits.max_monitored_items_per_subscription {
            return MonitoredItemCreateResult { status_code: StatusCode::BadTooManyMonitoredItems, ..Default::default() };
        }
        let id = self.next_item_id;
        self.next_item_id += 1;
        let capped = self.apply_item_limits(request.clone(), limits);
        let (item, result) = MonitoredItem::new(id, &capped);
        self.monitored_items.insert(id, item);
        result
    }

    fn apply_item_limits(&self, mut request: MonitoredItemCreateRequest, limits: &SubscriptionLimits) -> MonitoredItemCreateRequest {
        let params = &mut request.requested_parameters;
        params.queue_size = params.queue_size.min(limits.max_monitored_item_queue_size as u32).max(1);
        params.sampling_interval = if params.sampling_interval < 0.0 {
            self.publishing_interval_ms
        } else {
            params.sampling_interval.max(limits.min_sampling_interval_ms)
        };
        request
    }

    /// `ModifyMonitoredItems`: replace one item's parameters, applying the same limits as creation.
    pub fn modify_monitored_item(&mut self, request: &MonitoredItemModifyRequest, limits: &SubscriptionLimits) -> MonitoredItemModifyResult {
        let Some(item) = self.monitored_items.get_mut(&request.monitored_item_id) else {
            return MonitoredItemModifyResult { status_code: StatusCode::BadMonitoredItemIdInvalid, ..Default::default() };
        };
        let mut capped = request.clone();
        let params = &mut capped.requested_parameters;
        params.queue_size = params.queue_size.min(limits.max_monitored_item_queue_size as u32).max(1);
        params.sampling_interval = if params.sampling_interval < 0.0 {
            self.publishing_interval_ms
        } else {
            params.sampling_interval.max(limits.min_sampling_interval_ms)
        };
        item.modify(&capped)
    }

    /// `DeleteMonitoredItems`.
    pub fn delete_monitored_items(&mut self, ids: &[u32]) -> Vec<StatusCode> {
        ids.iter()
            .map(|id| if self.monitored_items.remove(id).is_some() { StatusCode::Good } else { StatusCode::BadMonitoredItemIdInvalid })
            .collect()
    }

    /// `SetMonitoringMode`.
    pub fn set_monitoring_mode(&mut self, mode: MonitoringMode, ids: &[u32]) -> Vec<StatusCode> {
        ids.iter()
            .map(|id| match self.monitored_items.get_mut(id) {
                Some(item) => {
                    item.set_monitoring_mode(mode);
                    StatusCode::Good
                }
                None => StatusCode::BadMonitoredItemIdInvalid,
            })
            .collect()
    }

    /// `SetTriggering`: link/unlink triggers on `triggering_item_id`.
    pub fn set_triggering(&mut self, triggering_item_id: u32, links_to_add: &[u32], links_to_remove: &[u32]) -> Result<(Vec<StatusCode>, Vec<StatusCode>), StatusCode> {
        if !self.monitored_items.contains_key(&triggering_item_id) {
            return Err(StatusCode::BadMonitoredItemIdInvalid);
        }
        let add_results = links_to_add
            .iter()
            .map(|id| match self.monitored_items.get_mut(id) {
                Some(item) => {
                    item.add_trigger(triggering_item_id);
                    StatusCode::Good
                }
                None => StatusCode::BadMonitoredItemIdInvalid,
            })
            .collect();
        let remove_results = links_to_remove
            .iter()
            .map(|id| match self.monitored_items.get_mut(id) {
                Some(item) => {
                    item.remove_trigger(triggering_item_id);
                    StatusCode::Good
                }
                None => StatusCode::BadMonitoredItemIdInvalid,
            })
            .collect();
        Ok((add_results, remove_results))
    }

    /// Feed a new sample to every DataChange MonitoredItem watching `node_id`/`attribute_id`.
    pub fn notify_data_change(&mut self, node_id: &NodeId, attribute_id: u32, value: &DataValue) {
        for item in self.monitored_items.values_mut() {
            if !item.is_event_item() && item.node_id() == node_id && item.attribute_id() == attribute_id {
                item.sample_data_change(value.clone());
            }
        }
    }

    /// Feed a fired event to every Event MonitoredItem attached to `notifier`.
    pub fn notify_event(&mut self, source: &impl opcua_types::generated::event_filter::EventFieldSource, notifier: &NodeId) {
        for item in self.monitored_items.values_mut() {
            if item.is_event_item() && item.node_id() == notifier {
                item.notify_event(source);
            }
        }
    }

    /// `true` if any MonitoredItem has a sample waiting to publish.
    pub fn has_queued_notifications(&self) -> bool {
        self.monitored_items.values().any(|item| item.has_queued())
    }

    /// Sequence numbers currently held in the retransmission queue, for `Republish`/`PublishResponse::available_sequence_numbers`.
    pub fn retransmission_sequence_numbers(&self) -> Vec<u32> {
        self.retransmission_queue.iter().map(|m| m.sequence_number).collect()
    }

    /// `Republish`: re-deliver an already-sent message by sequence number.
    pub fn republish(&self, sequence_number: u32) -> Result<NotificationMessage, StatusCode> {
        self.retransmission_queue.iter().find(|m| m.sequence_number == sequence_number).cloned().ok_or(StatusCode::BadMessageNotAvailable)
    }

    /// Acknowledge a delivered message, freeing its retransmission-queue entry.
    pub fn acknowledge(&mut self, sequence_number: u32) -> StatusCode {
        match self.retransmission_queue.iter().position(|m| m.sequence_number == sequence_number) {
            Some(idx) => {
                self.retransmission_queue.remove(idx);
                StatusCode::Good
            }
            None => StatusCode::BadSequenceNumberUnknown,
        }
    }

    /// Drain every MonitoredItem with something queued, up to `max_notifications_per_publish`
    /// across the whole subscription, batching DataChange and Event samples into the two
    /// standard notification payloads and wrapping each in an [`ExtensionObject`] (real
    /// `DataChangeNotification`/`EventNotificationList` binary encoding ids, the same precedent
    /// `opcua_types::generated::notification`'s own test uses for `DataChangeNotification`).
    /// Promotes any `Sampling`-only items linked to a reporting item for next cycle
    /// (`SetTriggering`'s triggering-links rule).
    fn build_notification_message(&mut self) -> NotificationMessage {
        let ctx = encode_ctx();
        let mut remaining = if self.max_notifications_per_publish == 0 { usize::MAX } else { self.max_notifications_per_publish as usize };
        let mut data_changes = Vec::new();
        let mut event_fields = Vec::new();
        let mut reported_ids = Vec::new();

        for item in self.monitored_items.values_mut() {
            if remaining == 0 {
                break;
            }
            let drained = item.drain(remaining);
            if drained.is_empty() {
                continue;
            }
            reported_ids.push(item.id());
            remaining -= drained.len();
            for (client_handle, notification) in drained {
                match notification {
                    QueuedNotification::DataChange(value) => data_changes.push(MonitoredItemNotification { client_handle, value }),
                    QueuedNotification::Event(fields) => event_fields.push(EventFieldList { client_handle, event_fields: Some(fields) }),
                }
            }
        }
        self.promote_triggered(&reported_ids);

        let mut notification_data = Vec::new();
        if !data_changes.is_empty() {
            let dcn = DataChangeNotification { monitored_items: Some(data_changes), diagnostic_infos: None };
            if let Ok(obj) = ExtensionObject::from_encodable(NodeId::new(0, ENCODING_ID_DATA_CHANGE_NOTIFICATION), &dcn, &ctx) {
                notification_data.push(obj);
            }
        }
        if !event_fields.is_empty() {
            let enl = EventNotificationList { events: Some(event_fields) };
            if let Ok(obj) = ExtensionObject::from_encodable(NodeId::new(0, ENCODING_ID_EVENT_NOTIFICATION_LIST), &enl, &ctx) {
                notification_data.push(obj);
            }
        }

        let sequence_number = self.next_sequence_number;
        self.next_sequence_number = next_sequence_number(self.next_sequence_number);
        let message = NotificationMessage {
            sequence_number,
            publish_time: UtcTime::now(),
            notification_data: if notification_data.is_empty() { None } else { Some(notification_data) },
        };
        self.retransmission_queue.push_back(message.clone());
        while self.retransmission_queue.len() > self.max_retransmit_queue_size {
            self.retransmission_queue.pop_front();
        }
        message
    }

    fn promote_triggered(&mut self, reported_ids: &[u32]) {
        if reported_ids.is_empty() {
            return;
        }
        for item in self.monitored_items.values_mut() {
            if item.has_triggers() && reported_ids.iter().any(|&id| item.is_triggered_by(id)) {
                item.arm_once();
            }
        }
    }

    /// Advance the publishing timer. Returns `Some(BadTimeout)` the cycle the lifetime counter
    /// reaches zero, at which point the caller must delete the subscription.
    ///
    /// While publishing is disabled the lifetime counter still decrements (so a forgotten
    /// disabled subscription does not live forever) but no notification or keep-alive is ever
    /// sent and any parked `Publish` stays parked.
    pub fn tick(&mut self, now: Instant) -> Option<StatusCode> {
        if now < self.next_publish_deadline {
            return None;
        }
        self.next_publish_deadline = now + Duration::from_millis(self.publishing_interval_ms.max(1.0) as u64);

        let sent = if !self.publishing_enabled {
            false
        } else if self.has_queued_notifications() {
            match self.parked_publish.pop_front() {
                Some(sender) => {
                    let message = self.build_notification_message();
                    self.state = SubscriptionState::Normal;
                    sender.send(Ok((self.id, message))).is_ok()
                }
                None => {
                    self.state = SubscriptionState::Late;
                    false
                }
            }
        } else {
            self.current_keep_alive_counter = self.current_keep_alive_counter.saturating_sub(1);
            if self.current_keep_alive_counter == 0 {
                self.current_keep_alive_counter = self.max_keep_alive_count;
                self.state = SubscriptionState::KeepAlive;
                match self.parked_publish.pop_front() {
                    Some(sender) => {
                        let sequence_number = self.next_sequence_number;
                        self.next_sequence_number = next_sequence_number(self.next_sequence_number);
                        sender.send(Ok((self.id, NotificationMessage::keep_alive(sequence_number)))).is_ok()
                    }
                    None => false,
                }
            } else {
                false
            }
        };

        if sent {
            self.current_lifetime_counter = self.max_lifetime_count;
            None
        } else {
            self.current_lifetime_counter = self.current_lifetime_counter.saturating_sub(1);
            if self.current_lifetime_counter == 0 {
                self.state = SubscriptionState::Closed;
                Some(StatusCode::BadTimeout)
            } else {
                None
            }
        }
    }
}

/// What `Publish` answers with.
pub enum PublishOutcome {
    /// A notification (or keep-alive) was already due; answered immediately.
    Ready(PublishResponse),
    /// Nothing due yet: parked until [`Subscription::tick`] has something, or `deadline` passes.
    Pending {
        /// Resolves with the owning subscription's id and message, or an error if the
        /// subscription was deleted out from under the parked request.
        receiver: oneshot::Receiver<Result<(u32, NotificationMessage), StatusCode>>,
        /// When the caller should give up waiting and answer with a keep-alive/timeout itself.
        deadline: Instant,
        /// Pre-computed acknowledgement results, to merge into the eventual `PublishResponse`.
        results: Option<Vec<StatusCode>>,
        /// Pre-computed acknowledgement diagnostics.
        diagnostic_infos: Option<Vec<StatusCode>>,
    },
}

/// The subscription table for one server: every subscription from every session, keyed by its
/// server-assigned id. Per-session ownership is tracked on [`crate::session::Session`] itself
/// (`subscriptions()`/`add_subscription`/`remove_subscription`) so this table stays a flat,
/// server-global map, the same split `SessionManager` draws between its own table and the
/// `AddressSpace` it serves.
#[derive(Default)]
pub struct SubscriptionManager {
    subscriptions: HashMap<u32, Subscription>,
    next_id: u32,
}

impl SubscriptionManager {
    /// An empty subscription table.
    pub fn new() -> Self {
        Self { subscriptions: HashMap::new(), next_id: 1 }
    }

    /// `CreateSubscription`.
    pub fn create_subscription(&mut self, request: &CreateSubscriptionRequest, limits: &SubscriptionLimits, now: Instant) -> CreateSubscriptionResponse {
        let id = self.next_id;
        self.next_id += 1;
        let (sub, response) = Subscription::new(id, request, limits, now);
        self.subscriptions.insert(id, sub);
        response
    }

    /// Look up a subscription by id.
    pub fn get(&self, id: u32) -> Option<&Subscription> {
        self.subscriptions.get(&id)
    }

    /// Look up a subscription by id, mutably.
    pub fn get_mut(&mut self, id: u32) -> Option<&mut Subscription> {
        self.subscriptions.get_mut(&id)
    }

    /// `ModifySubscription`.
    pub fn modify_subscription(&mut self, request: &ModifySubscriptionRequest, limits: &SubscriptionLimits) -> Result<ModifySubscriptionResponse, StatusCode> {
        self.subscriptions.get_mut(&request.subscription_id).map(|s| s.modify(request, limits)).ok_or(StatusCode::BadSubscriptionIdInvalid)
    }

    /// `DeleteSubscriptions`. A parked `Publish` belonging to a deleted subscription is
    /// re-parked on a remaining subscription if one exists, so the client's publish credit isn't
    /// wasted; only once every named subscription (and every other subscription in the table) is
    /// gone is it failed outright with `BadNoSubscription` (`SPEC_FULL.md` §4.9.1).
    pub fn delete_subscriptions(&mut self, ids: &[u32]) -> Vec<StatusCode> {
        let mut orphaned = Vec::new();
        let results = ids
            .iter()
            .map(|id| match self.subscriptions.remove(id) {
                Some(sub) => {
                    orphaned.extend(sub.parked_publish);
                    StatusCode::Good
                }
                None => StatusCode::BadSubscriptionIdInvalid,
            })
            .collect();

        if orphaned.is_empty() {
            return results;
        }
        match self.subscriptions.keys().next().copied() {
            Some(target) => {
                let sub = self.subscriptions.get_mut(&target).expect("key from this table");
                sub.parked_publish.extend(orphaned);
            }
            None => {
                for sender in orphaned {
                    let _ = sender.send(Err(StatusCode::BadNoSubscription));
                }
            }
        }
        results
    }

    /// `SetPublishingMode`.
    pub fn set_publishing_mode(&mut self, enabled: bool, ids: &[u32]) -> Vec<StatusCode> {
        ids.iter()
            .map(|id| match self.subscriptions.get_mut(id) {
                Some(sub) => {
                    sub.set_publishing_mode(enabled);
                    StatusCode::Good
                }
                None => StatusCode::BadSubscriptionIdInvalid,
            })
            .collect()
    }

    /// `TransferSubscriptions`: report each subscription as transferred without touching its
    /// queues or counters. Re-parenting session ownership is the caller's job (moving the id
    /// between `Session::subscriptions` tables), since this table has no notion of "owner".
    pub fn transfer_subscriptions(&self, ids: &[u32]) -> Vec<TransferResult> {
        ids.iter()
            .map(|id| match self.subscriptions.get(id) {
                Some(sub) => TransferResult {
                    status_code: StatusCode::GoodSubscriptionTransferred,
                    available_sequence_numbers: Some(sub.retransmission_sequence_numbers()),
                },
                None => TransferResult { status_code: StatusCode::BadSubscriptionIdInvalid, available_sequence_numbers: None },
            })
            .collect()
    }

    /// `CreateMonitoredItems`.
    pub fn create_monitored_items(&mut self, request: &CreateMonitoredItemsRequest, limits: &SubscriptionLimits) -> Result<CreateMonitoredItemsResponse, StatusCode> {
        let sub = self.subscriptions.get_mut(&request.subscription_id).ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        let items = request.items_to_create.as_deref().unwrap_or_default();
        let results = items.iter().map(|item| sub.create_monitored_item(item, limits)).collect();
        Ok(CreateMonitoredItemsResponse { response_header: ResponseHeader::new_good(&request.request_header), results: Some(results), diagnostic_infos: None })
    }

    /// `ModifyMonitoredItems`.
    pub fn modify_monitored_items(&mut self, request: &ModifyMonitoredItemsRequest, limits: &SubscriptionLimits) -> Result<ModifyMonitoredItemsResponse, StatusCode> {
        let sub = self.subscriptions.get_mut(&request.subscription_id).ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        let items = request.items_to_modify.as_deref().unwrap_or_default();
        let results = items.iter().map(|item| sub.modify_monitored_item(item, limits)).collect();
        Ok(ModifyMonitoredItemsResponse { response_header: ResponseHeader::new_good(&request.request_header), results: Some(results), diagnostic_infos: None })
    }

    /// `DeleteMonitoredItems`.
    pub fn delete_monitored_items(&mut self, request: &DeleteMonitoredItemsRequest) -> Result<DeleteMonitoredItemsResponse, StatusCode> {
        let sub = self.subscriptions.get_mut(&request.subscription_id).ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        let ids = request.monitored_item_ids.as_deref().unwrap_or_default();
        let results = sub.delete_monitored_items(ids);
        Ok(DeleteMonitoredItemsResponse { response_header: ResponseHeader::new_good(&request.request_header), results: Some(results), diagnostic_infos: None })
    }

    /// `SetMonitoringMode`.
    pub fn set_monitoring_mode(&mut self, request: &SetMonitoringModeRequest) -> Result<SetMonitoringModeResponse, StatusCode> {
        let sub = self.subscriptions.get_mut(&request.subscription_id).ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        let ids = request.monitored_item_ids.as_deref().unwrap_or_default();
        let results = sub.set_monitoring_mode(request.monitoring_mode, ids);
        Ok(SetMonitoringModeResponse { response_header: ResponseHeader::new_good(&request.request_header), results: Some(results), diagnostic_infos: None })
    }

    /// `SetTriggering`.
    pub fn set_triggering(&mut self, request: &SetTriggeringRequest) -> Result<SetTriggeringResponse, StatusCode> {
        let sub = self.subscriptions.get_mut(&request.subscription_id).ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        let add = request.links_to_add.clone().unwrap_or_default();
        let remove = request.links_to_remove.clone().unwrap_or_default();
        let (add_results, remove_results) = sub.set_triggering(request.triggering_item_id, &add, &remove)?;
        Ok(SetTriggeringResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            add_results: Some(add_results),
            add_diagnostic_infos: None,
            remove_results: Some(remove_results),
            remove_diagnostic_infos: None,
        })
    }

    /// `Republish`.
    pub fn republish(&self, subscription_id: u32, sequence_number: u32) -> Result<NotificationMessage, StatusCode> {
        self.subscriptions.get(&subscription_id).ok_or(StatusCode::BadSubscriptionIdInvalid)?.republish(sequence_number)
    }

    /// `Publish`: acknowledge `request`'s `subscription_acknowledgements` against whichever of
    /// `owned_ids` they name, then either deliver the first owned, publishing-enabled
    /// subscription that already has something queued, or park the request on whichever owned
    /// subscription's publishing timer fires soonest.
    pub fn publish(&mut self, request: &PublishRequest, owned_ids: &[u32], timeout: Duration, now: Instant) -> PublishOutcome {
        let (results, diagnostic_infos) = match &request.subscription_acknowledgements {
            Some(acks) => {
                let results = acks
                    .iter()
                    .map(|ack| match self.subscriptions.get_mut(&ack.subscription_id) {
                        Some(sub) => sub.acknowledge(ack.sequence_number),
                        None => StatusCode::BadSubscriptionIdInvalid,
                    })
                    .collect();
                (Some(results), None)
            }
            None => (None, None),
        };

        let mut candidates: Vec<u32> = owned_ids.iter().copied().filter(|id| self.subscriptions.contains_key(id)).collect();
        candidates.sort_by_key(|id| self.subscriptions.get(id).expect("checked above").next_publish_deadline);

        for &id in &candidates {
            let sub = self.subscriptions.get_mut(&id).expect("checked above");
            if sub.publishing_enabled && sub.has_queued_notifications() {
                let message = sub.build_notification_message();
                let more_notifications = sub.has_queued_notifications();
                let available_sequence_numbers = Some(sub.retransmission_sequence_numbers());
                return PublishOutcome::Ready(PublishResponse {
                    response_header: ResponseHeader::new_good(&request.request_header),
                    subscription_id: id,
                    available_sequence_numbers,
                    more_notifications,
                    notification_message: message,
                    results,
                    diagnostic_infos,
                });
            }
        }

        let Some(&target) = candidates.first() else {
            return PublishOutcome::Ready(PublishResponse {
                response_header: ResponseHeader::new_service_result(&request.request_header, StatusCode::BadNoSubscription),
                results,
                diagnostic_infos,
                ..Default::default()
            });
        };
        let (sender, receiver) = oneshot::channel();
        self.subscriptions.get_mut(&target).expect("checked above").parked_publish.push_back(sender);
        PublishOutcome::Pending { receiver, deadline: now + timeout, results, diagnostic_infos }
    }

    /// Advance every subscription's publishing timer, removing and returning the ids of any that
    /// timed out (`BadTimeout`). Called once per `EventLoop` tick.
    pub fn tick_all(&mut self, now: Instant) -> Vec<u32> {
        let closed: Vec<u32> = self
            .subscriptions
            .iter_mut()
            .filter_map(|(&id, sub)| if sub.tick(now) == Some(StatusCode::BadTimeout) { Some(id) } else { None })
            .collect();
        for id in &closed {
            self.subscriptions.remove(id);
        }
        closed
    }

    /// The next deadline among all live subscriptions, for the caller's `EventLoop` tick.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.subscriptions.values().map(|s| s.next_publish_deadline).min()
    }

    /// Feed a new attribute value to every subscription's matching DataChange MonitoredItems.
    pub fn notify_data_change(&mut self, node_id: &NodeId, attribute_id: u32, value: &DataValue) {
        for sub in self.subscriptions.values_mut() {
            sub.notify_data_change(node_id, attribute_id, value);
        }
    }

    /// Bubble a fired event up through `space` and feed it to every reached notifier's Event
    /// MonitoredItems, across every subscription.
    pub fn notify_event(&mut self, space: &AddressSpace, event: &FiredEvent) {
        for notifier in reachable_notifiers(space, &event.source_node) {
            for sub in self.subscriptions.values_mut() {
                sub.notify_event(event, &notifier);
            }
        }
    }

    /// Number of subscriptions currently tracked.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// `true` if no subscriptions are tracked.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua_types::generated::{AttributeId, MonitoringParameters, ReadValueId, RequestHeader};
    use opcua_types::Variant;
    use std::time::Duration as StdDuration;

    fn limits() -> SubscriptionLimits {
        SubscriptionLimits {
            max_subscriptions_per_session: 10,
            min_publishing_interval_ms: 1.0,
            min_sampling_interval_ms: 1.0,
            max_keep_alive_count: 100,
            max_monitored_items_per_subscription: 0,
            max_monitored_item_queue_size: 100,
            max_retransmit_queue_size: 10,
        }
    }

    fn create_request(keep_alive: u32, lifetime: u32) -> CreateSubscriptionRequest {
        CreateSubscriptionRequest {
            request_header: RequestHeader::new(NodeId::null(), 1),
            requested_publishing_interval: 50.0,
            requested_lifetime_count: lifetime,
            requested_max_keep_alive_count: keep_alive,
            max_notifications_per_publish: 0,
            publishing_enabled: true,
            priority: 0,
        }
    }

    fn item_request(queue_size: u32) -> MonitoredItemCreateRequest {
        MonitoredItemCreateRequest {
            item_to_monitor: ReadValueId { node_id: NodeId::new(1, 1u32), attribute_id: AttributeId::Value as u32, ..Default::default() },
            monitoring_mode: MonitoringMode::Reporting,
            requested_parameters: MonitoringParameters { client_handle: 1, sampling_interval: 50.0, queue_size, discard_oldest: true, ..Default::default() },
        }
    }

    #[test]
    fn create_subscription_enforces_keep_alive_lifetime_ratio() {
        let mut mgr = SubscriptionManager::new();
        let response = mgr.create_subscription(&create_request(10, 5), &limits(), Instant::now());
        assert_eq!(response.revised_max_keep_alive_count, 10);
        assert_eq!(response.revised_lifetime_count, 30);
    }

    #[test]
    fn tick_sends_keep_alive_once_counter_expires_and_a_request_is_parked() {
        let mut mgr = SubscriptionManager::new();
        let response = mgr.create_subscription(&create_request(2, 20), &limits(), Instant::now());
        let id = response.subscription_id;

        let request = PublishRequest { request_header: RequestHeader::new(NodeId::null(), 2), subscription_acknowledgements: None };
        let outcome = mgr.publish(&request, &[id], StdDuration::from_secs(30), Instant::now());
        let PublishOutcome::Pending { mut receiver, .. } = outcome else { panic!("expected pending, nothing queued yet") };

        let mut now = Instant::now();
        for _ in 0..3 {
            now += StdDuration::from_millis(60);
            mgr.tick_all(now);
        }

        let (sub_id, message) = receiver.try_recv().unwrap().unwrap();
        assert_eq!(sub_id, id);
        assert!(message.is_keep_alive());
    }

    #[test]
    fn build_notification_message_wraps_sequence_number_at_the_spec_boundary() {
        let mut mgr = SubscriptionManager::new();
        let response = mgr.create_subscription(&create_request(5, 30), &limits(), Instant::now());
        let id = response.subscription_id;
        let sub = mgr.subscriptions.get_mut(&id).unwrap();
        sub.next_sequence_number = opcua_types::constants::SEQUENCE_NUMBER_WRAP_AT;

        let message = sub.build_notification_message();
        assert_eq!(message.sequence_number, opcua_types::constants::SEQUENCE_NUMBER_WRAP_AT);
        assert_eq!(sub.next_sequence_number, 1);
    }

    #[test]
    fn publish_delivers_already_queued_notification_immediately() {
        let mut mgr = SubscriptionManager::new();
        let response = mgr.create_subscription(&create_request(5, 30), &limits(), Instant::now());
        let id = response.subscription_id;

        let create_items = CreateMonitoredItemsRequest {
            request_header: RequestHeader::new(NodeId::null(), 2),
            subscription_id: id,
            timestamps_to_return: Default::default(),
            items_to_create: Some(vec![item_request(10)]),
        };
        mgr.create_monitored_items(&create_items, &limits()).unwrap();
        mgr.get_mut(id).unwrap().notify_data_change(&NodeId::new(1, 1u32), AttributeId::Value as u32, &DataValue::new_now(Variant::Int32(7)));

        let request = PublishRequest { request_header: RequestHeader::new(NodeId::null(), 3), subscription_acknowledgements: None };
        let outcome = mgr.publish(&request, &[id], StdDuration::from_secs(30), Instant::now());
        let PublishOutcome::Ready(response) = outcome else { panic!("expected an immediate response") };
        assert_eq!(response.subscription_id, id);
        assert!(!response.notification_message.is_keep_alive());
    }

    #[test]
    fn subscription_closes_with_bad_timeout_once_lifetime_expires() {
        let mut mgr = SubscriptionManager::new();
        let response = mgr.create_subscription(&create_request(1, 3), &limits(), Instant::now());
        let id = response.subscription_id;

        let mut now = Instant::now();
        let mut closed = Vec::new();
        for _ in 0..6 {
            now += StdDuration::from_millis(60);
            closed = mgr.tick_all(now);
        }
        assert_eq!(closed, vec![id]);
        assert!(mgr.get(id).is_none());
    }

    #[test]
    fn delete_subscriptions_fails_orphaned_parked_publish_with_bad_no_subscription() {
        let mut mgr = SubscriptionManager::new();
        let response = mgr.create_subscription(&create_request(50, 200), &limits(), Instant::now());
        let id = response.subscription_id;

        let request = PublishRequest { request_header: RequestHeader::new(NodeId::null(), 2), subscription_acknowledgements: None };
        let outcome = mgr.publish(&request, &[id], StdDuration::from_secs(30), Instant::now());
        let PublishOutcome::Pending { mut receiver, .. } = outcome else { panic!("expected pending") };

        let results = mgr.delete_subscriptions(&[id]);
        assert_eq!(results, vec![StatusCode::Good]);
        assert_eq!(receiver.try_recv().unwrap(), Err(StatusCode::BadNoSubscription));
    }

    #[test]
    fn triggering_link_promotes_a_sampling_only_item_for_one_cycle() {
        let mut mgr = SubscriptionManager::new();
        let response = mgr.create_subscription(&create_request(50, 200), &limits(), Instant::now());
        let id = response.subscription_id;

        let mut trigger = item_request(10);
        trigger.requested_parameters.client_handle = 1;
        let mut triggered = item_request(10);
        triggered.monitoring_mode = MonitoringMode::Sampling;
        triggered.item_to_monitor.node_id = NodeId::new(1, 2u32);
        triggered.requested_parameters.client_handle = 2;

        let create_items = CreateMonitoredItemsRequest {
            request_header: RequestHeader::new(NodeId::null(), 2),
            subscription_id: id,
            timestamps_to_return: Default::default(),
            items_to_create: Some(vec![trigger, triggered]),
        };
        let created = mgr.create_monitored_items(&create_items, &limits()).unwrap();
        let trigger_id = created.results.as_ref().unwrap()[0].monitored_item_id;
        let triggered_id = created.results.as_ref().unwrap()[1].monitored_item_id;

        let sub = mgr.get_mut(id).unwrap();
        sub.set_triggering(triggered_id, &[trigger_id], &[]).unwrap();

        // Before the trigger ever reports, the sampling-only item never enqueues.
        sub.notify_data_change(&NodeId::new(1, 2u32), AttributeId::Value as u32, &DataValue::new_now(Variant::Int32(1)));
        assert!(!sub.has_queued_notifications());

        // The trigger item reports; building a notification message promotes the triggered item.
        sub.notify_data_change(&NodeId::new(1, 1u32), AttributeId::Value as u32, &DataValue::new_now(Variant::Int32(1)));
        let _ = sub.build_notification_message();

        sub.notify_data_change(&NodeId::new(1, 2u32), AttributeId::Value as u32, &DataValue::new_now(Variant::Int32(2)));
        assert!(sub.has_queued_notifications());
    }
}
