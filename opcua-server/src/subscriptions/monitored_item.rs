// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! [`MonitoredItem`]: per-attribute sampling/queueing bound to a
//! [`super::Subscription`] (`SPEC_FULL.md` §3's MonitoredItem record, §4.9's
//! DataChange filter and queue-overflow rules, §4.9's Event MonitoredItem
//! support built on [`opcua_types::generated::event_filter`]).

use std::collections::{HashSet, VecDeque};
use std::sync::OnceLock;

use opcua_types::generated::event_filter::{EventFieldSource, EventFilter, FilterEvaluator, SimpleAttributeOperand};
use opcua_types::generated::{
    AttributeId, DataChangeFilter, DataChangeTrigger, DeadbandType, MonitoredItemCreateRequest,
    MonitoredItemCreateResult, MonitoredItemModifyRequest, MonitoredItemModifyResult, MonitoringMode,
    MonitoringParameters, TimestampsToReturn,
};
use opcua_types::variant::ExtensionObject;
use opcua_types::{Context, DataValue, NamespaceMap, NodeId, StatusCode, UAString, Variant};

/// Sub-code set on a delivered sample's status to mark it as the first value reported after a
/// queue overflow, mirroring the standard's `InfoBits::Overflow` sub-code of `Good`/`Uncertain`.
pub const OVERFLOW_BIT: u32 = 0x0000_0400;

const ENCODING_ID_DATA_CHANGE_FILTER: u32 = 1;
const ENCODING_ID_EVENT_FILTER: u32 = 2;

fn decode_ctx() -> Context<'static> {
    static NS: OnceLock<NamespaceMap> = OnceLock::new();
    Context::new(NS.get_or_init(NamespaceMap::new))
}

/// What one MonitoredItem filters samples with.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Attribute sampling, gated by trigger and deadband.
    DataChange { trigger: DataChangeTrigger, deadband_type: DeadbandType, deadband_value: f64 },
    /// Event sampling: a where-clause and projected select-clauses.
    Event(EventFilter),
}

impl Filter {
    /// Parse `MonitoringParameters::filter`. A null or unrecognized filter defaults to a plain
    /// DataChange filter (trigger = StatusValue, no deadband), matching the standard's default.
    fn parse(raw: &ExtensionObject) -> Self {
        if raw.type_id == NodeId::new(0, ENCODING_ID_EVENT_FILTER) {
            if let Ok(filter) = raw.decode_inner::<EventFilter>(&decode_ctx()) {
                return Filter::Event(filter);
            }
        }
        if raw.type_id == NodeId::new(0, ENCODING_ID_DATA_CHANGE_FILTER) {
            if let Ok(filter) = raw.decode_inner::<DataChangeFilter>(&decode_ctx()) {
                return Filter::DataChange {
                    trigger: filter.trigger,
                    deadband_type: filter.deadband_type,
                    deadband_value: filter.deadband_value,
                };
            }
        }
        Filter::DataChange { trigger: DataChangeTrigger::StatusValue, deadband_type: DeadbandType::None, deadband_value: 0.0 }
    }
}

/// One queued, not-yet-published sample.
#[derive(Debug, Clone)]
pub enum QueuedNotification {
    /// A DataChange MonitoredItem's sampled value.
    DataChange(DataValue),
    /// An Event MonitoredItem's projected select-clause values.
    Event(Vec<Variant>),
}

/// A single attribute or event subscription, bound to one [`super::Subscription`].
#[derive(Debug)]
pub struct MonitoredItem {
    id: u32,
    node_id: NodeId,
    attribute_id: u32,
    index_range: UAString,
    monitoring_mode: MonitoringMode,
    sampling_interval_ms: f64,
    client_handle: u32,
    filter: Filter,
    select_clauses: Vec<SimpleAttributeOperand>,
    queue: VecDeque<QueuedNotification>,
    queue_size: usize,
    discard_oldest: bool,
    last_sampled_value: Option<DataValue>,
    /// MonitoredItems that promote this one to reporting for one cycle when they report
    /// (`SetTriggering`'s `links_to_add`/`links_to_remove`, §4.9's triggering-links rule). This
    /// item must be in `Sampling` mode for a trigger firing to have any effect.
    triggered_by: HashSet<u32>,
    /// Set by [`MonitoredItem::arm_once`] when a linked trigger reports; lets a `Sampling`-only
    /// item enqueue its next sample once, then clears itself.
    armed_once: bool,
}

impl MonitoredItem {
    /// Build a new item from a `CreateMonitoredItems` request entry, producing the
    /// server-revised result the service returns alongside it.
    pub fn new(id: u32, request: &MonitoredItemCreateRequest) -> (Self, MonitoredItemCreateResult) {
        let params = &request.requested_parameters;
        let queue_size = params.queue_size.max(1) as usize;
        let filter = Filter::parse(&params.filter);
        let select_clauses = match &filter {
            Filter::Event(f) => f.select_clauses.clone().unwrap_or_default(),
            Filter::DataChange { .. } => Vec::new(),
        };
        let item = Self {
            id,
            node_id: request.item_to_monitor.node_id.clone(),
            attribute_id: request.item_to_monitor.attribute_id,
            index_range: request.item_to_monitor.index_range.clone(),
            monitoring_mode: request.monitoring_mode,
            sampling_interval_ms: params.sampling_interval,
            client_handle: params.client_handle,
            filter,
            select_clauses,
            queue: VecDeque::new(),
            queue_size,
            discard_oldest: params.discard_oldest,
            last_sampled_value: None,
            triggered_by: HashSet::new(),
            armed_once: false,
        };
        let result = MonitoredItemCreateResult {
            status_code: StatusCode::Good,
            monitored_item_id: id,
            revised_sampling_interval: item.sampling_interval_ms,
            revised_queue_size: item.queue_size as u32,
            filter_result: ExtensionObject::null(),
        };
        (item, result)
    }

    /// Server-assigned id, returned to the client at creation.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Node this item reads (DataChange) or bubbles events through (Event).
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Attribute being monitored. `AttributeId::EventNotifier` marks an Event item.
    pub fn attribute_id(&self) -> u32 {
        self.attribute_id
    }

    /// `true` if this item was created to monitor `EventNotifier`, i.e. it is an Event item.
    pub fn is_event_item(&self) -> bool {
        self.attribute_id == AttributeId::EventNotifier as u32
    }

    /// Current monitoring mode.
    pub fn monitoring_mode(&self) -> MonitoringMode {
        self.monitoring_mode
    }

    /// Sampling interval in ms; `0` means notify-on-write.
    pub fn sampling_interval_ms(&self) -> f64 {
        self.sampling_interval_ms
    }

    /// Apply `ModifyMonitoredItems`' new parameters, replacing the filter and queue policy.
    pub fn modify(&mut self, request: &MonitoredItemModifyRequest) -> MonitoredItemModifyResult {
        let params = &request.requested_parameters;
        self.queue_size = params.queue_size.max(1) as usize;
        self.sampling_interval_ms = params.sampling_interval;
        self.client_handle = params.client_handle;
        self.discard_oldest = params.discard_oldest;
        self.filter = Filter::parse(&params.filter);
        self.select_clauses = match &self.filter {
            Filter::Event(f) => f.select_clauses.clone().unwrap_or_default(),
            Filter::DataChange { .. } => Vec::new(),
        };
        while self.queue.len() > self.queue_size {
            self.queue.pop_front();
        }
        MonitoredItemModifyResult {
            status_code: StatusCode::Good,
            revised_sampling_interval: self.sampling_interval_ms,
            revised_queue_size: self.queue_size as u32,
            filter_result: ExtensionObject::null(),
        }
    }

    /// `SetMonitoringMode`: clears the queue when transitioning to `Disabled` (§4.9.1).
    pub fn set_monitoring_mode(&mut self, mode: MonitoringMode) {
        self.monitoring_mode = mode;
        if mode == MonitoringMode::Disabled {
            self.queue.clear();
        }
    }

    /// Link `trigger_id` so that item reporting promotes this `Sampling`-only item for one cycle.
    pub fn add_trigger(&mut self, trigger_id: u32) {
        self.triggered_by.insert(trigger_id);
    }

    /// Unlink a previously added trigger.
    pub fn remove_trigger(&mut self, trigger_id: u32) {
        self.triggered_by.remove(&trigger_id);
    }

    /// `true` if `trigger_id` is one of this item's registered triggers.
    pub fn is_triggered_by(&self, trigger_id: u32) -> bool {
        self.triggered_by.contains(&trigger_id)
    }

    /// `true` if this item has any registered triggers, i.e. `SetTriggering` has linked it as a
    /// triggered (not triggering) item.
    pub fn has_triggers(&self) -> bool {
        !self.triggered_by.is_empty()
    }

    /// Promote this item's next matching sample to reporting for one cycle, as if it were in
    /// `Reporting` mode. Called on a `Sampling`-only item when a linked trigger reports.
    pub fn arm_once(&mut self) {
        self.armed_once = true;
    }

    fn push(&mut self, notification: QueuedNotification, mark_overflow: impl FnOnce(&mut QueuedNotification)) {
        if self.queue.len() >= self.queue_size {
            if self.discard_oldest {
                self.queue.pop_front();
                let mut notification = notification;
                mark_overflow(&mut notification);
                self.queue.push_back(notification);
            } else if let Some(tail) = self.queue.back_mut() {
                mark_overflow(tail);
            }
            return;
        }
        self.queue.push_back(notification);
    }

    /// Evaluate a new DataChange sample against the trigger/deadband filter and, if it should be
    /// reported, enqueue it. Returns `true` if something was enqueued.
    pub fn sample_data_change(&mut self, value: DataValue) -> bool {
        if self.monitoring_mode == MonitoringMode::Disabled {
            return false;
        }
        let Filter::DataChange { trigger, deadband_type, deadband_value } = &self.filter else {
            return false;
        };
        if !self.triggers(*trigger, deadband_type, *deadband_value, &value) {
            return false;
        }
        self.last_sampled_value = Some(value.clone());
        if self.monitoring_mode == MonitoringMode::Sampling && !std::mem::take(&mut self.armed_once) {
            return false;
        }
        self.push(QueuedNotification::DataChange(value), |n| {
            if let QueuedNotification::DataChange(dv) = n {
                dv.status = Some(StatusCode::from_bits(StatusCode::Good.bits() | OVERFLOW_BIT));
            }
        });
        true
    }

    fn triggers(&self, trigger: DataChangeTrigger, deadband_type: &DeadbandType, deadband_value: f64, value: &DataValue) -> bool {
        let Some(last) = &self.last_sampled_value else { return true };
        let status_changed = last.status != value.status;
        if status_changed {
            return true;
        }
        if trigger == DataChangeTrigger::Status {
            return false;
        }
        let changed = match deadband_type {
            DeadbandType::None => last.value != value.value,
            DeadbandType::Absolute => !within_deadband(&last.value, &value.value, deadband_value, None),
            DeadbandType::Percent => !within_deadband(&last.value, &value.value, deadband_value, Some(100.0)),
        };
        if !changed {
            return false;
        }
        if trigger == DataChangeTrigger::StatusValueTimestamp {
            return true;
        }
        changed
    }

    /// Evaluate this item's Event filter against a fired event, enqueuing the projected
    /// select-clause fields if the where-clause matches. Returns `true` if enqueued.
    pub fn notify_event(&mut self, source: &impl EventFieldSource) -> bool {
        if self.monitoring_mode == MonitoringMode::Disabled {
            return false;
        }
        let Filter::Event(filter) = &self.filter else { return false };
        let evaluator = FilterEvaluator::new(&filter.where_clause, source);
        if !evaluator.matches() {
            return false;
        }
        if self.monitoring_mode == MonitoringMode::Sampling && !std::mem::take(&mut self.armed_once) {
            return false;
        }
        let fields = evaluator.project(&self.select_clauses);
        self.push(QueuedNotification::Event(fields), |_| {});
        true
    }

    /// Drain up to `max` queued notifications, tagging each with this item's client handle, for
    /// one publish cycle.
    pub fn drain(&mut self, max: usize) -> Vec<(u32, QueuedNotification)> {
        let take = self.queue.len().min(max);
        self.queue.drain(..take).map(|n| (self.client_handle, n)).collect()
    }

    /// `true` if there is at least one notification waiting to be published.
    pub fn has_queued(&self) -> bool {
        !self.queue.is_empty()
    }
}

fn within_deadband(old: &Option<Variant>, new: &Option<Variant>, deadband: f64, percent_of: Option<f64>) -> bool {
    let (Some(old), Some(new)) = (as_f64(old), as_f64(new)) else {
        return old == new;
    };
    let limit = match percent_of {
        Some(range) => deadband / 100.0 * range,
        None => deadband,
    };
    (new - old).abs() <= limit
}

fn as_f64(v: &Option<Variant>) -> Option<f64> {
    match v {
        Some(Variant::SByte(n)) => Some(*n as f64),
        Some(Variant::Byte(n)) => Some(*n as f64),
        Some(Variant::Int16(n)) => Some(*n as f64),
        Some(Variant::UInt16(n)) => Some(*n as f64),
        Some(Variant::Int32(n)) => Some(*n as f64),
        Some(Variant::UInt32(n)) => Some(*n as f64),
        Some(Variant::Int64(n)) => Some(*n as f64),
        Some(Variant::UInt64(n)) => Some(*n as f64),
        Some(Variant::Float(n)) => Some(*n as f64),
        Some(Variant::Double(n)) => Some(*n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua_types::generated::ReadValueId;

    fn request(queue_size: u32, discard_oldest: bool) -> MonitoredItemCreateRequest {
        MonitoredItemCreateRequest {
            item_to_monitor: ReadValueId { node_id: NodeId::new(1, 1u32), attribute_id: AttributeId::Value as u32, ..Default::default() },
            monitoring_mode: MonitoringMode::Reporting,
            requested_parameters: MonitoringParameters { client_handle: 7, sampling_interval: 100.0, queue_size, discard_oldest, ..Default::default() },
        }
    }

    #[test]
    fn default_filter_reports_on_any_value_change() {
        let (mut item, _) = MonitoredItem::new(1, &request(10, true));
        assert!(item.sample_data_change(DataValue::new_now(Variant::Int32(1))));
        assert!(item.sample_data_change(DataValue::new_now(Variant::Int32(2))));
        assert!(!item.sample_data_change(DataValue::new_now(Variant::Int32(2))));
    }

    #[test]
    fn overflow_discard_oldest_marks_new_tail() {
        let (mut item, _) = MonitoredItem::new(1, &request(2, true));
        item.sample_data_change(DataValue::new_now(Variant::Int32(1)));
        item.sample_data_change(DataValue::new_now(Variant::Int32(2)));
        item.sample_data_change(DataValue::new_now(Variant::Int32(3)));
        let drained = item.drain(10);
        assert_eq!(drained.len(), 2);
        let QueuedNotification::DataChange(dv) = &drained[1].1 else { panic!("expected data change") };
        assert_eq!(dv.value, Some(Variant::Int32(3)));
        assert_eq!(dv.status.unwrap().bits() & OVERFLOW_BIT, OVERFLOW_BIT);
    }

    #[test]
    fn overflow_discard_newest_marks_current_tail_and_drops_new_sample() {
        let (mut item, _) = MonitoredItem::new(1, &request(2, false));
        item.sample_data_change(DataValue::new_now(Variant::Int32(1)));
        item.sample_data_change(DataValue::new_now(Variant::Int32(2)));
        item.sample_data_change(DataValue::new_now(Variant::Int32(3)));
        let drained = item.drain(10);
        assert_eq!(drained.len(), 2);
        let QueuedNotification::DataChange(dv) = &drained[1].1 else { panic!("expected data change") };
        assert_eq!(dv.value, Some(Variant::Int32(2)));
        assert_eq!(dv.status.unwrap().bits() & OVERFLOW_BIT, OVERFLOW_BIT);
    }

    #[test]
    fn disabled_mode_never_enqueues_and_clears_queue() {
        let (mut item, _) = MonitoredItem::new(1, &request(10, true));
        item.sample_data_change(DataValue::new_now(Variant::Int32(1)));
        item.set_monitoring_mode(MonitoringMode::Disabled);
        assert!(!item.has_queued());
        assert!(!item.sample_data_change(DataValue::new_now(Variant::Int32(2))));
    }

    #[test]
    fn sampling_mode_only_enqueues_once_armed() {
        let (mut item, _) = MonitoredItem::new(1, &request(10, true));
        item.set_monitoring_mode(MonitoringMode::Sampling);
        assert!(!item.sample_data_change(DataValue::new_now(Variant::Int32(1))));
        assert!(!item.has_queued());

        item.arm_once();
        assert!(item.sample_data_change(DataValue::new_now(Variant::Int32(2))));
        assert!(item.has_queued());

        // arm_once is consumed, so the next change is sampled but not enqueued.
        assert!(!item.sample_data_change(DataValue::new_now(Variant::Int32(3))));
    }

    #[test]
    fn triggering_links_are_tracked() {
        let (mut item, _) = MonitoredItem::new(2, &request(10, true));
        assert!(!item.has_triggers());
        item.add_trigger(1);
        assert!(item.has_triggers());
        assert!(item.is_triggered_by(1));
        item.remove_trigger(1);
        assert!(!item.is_triggered_by(1));
    }
}
