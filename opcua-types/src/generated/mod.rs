// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Hand-authored output of the offline `opcua-codegen` tool: one module per
//! service family rather than the upstream one-file-per-type convention,
//! since the reduced type dictionary this crate targets doesn't need the
//! extra indirection.

pub mod attribute;
pub mod browsing;
pub mod call;
pub mod event_filter;
pub mod headers;
pub mod monitored_item;
pub mod notification;
pub mod secure_channel;
pub mod session;
pub mod subscription;

pub use attribute::{AttributeId, ReadRequest, ReadResponse, ReadValueId, TimestampsToReturn, WriteRequest, WriteResponse, WriteValue};
pub use browsing::{
    BrowseDescription, BrowseDirection, BrowseNextRequest, BrowseNextResponse, BrowsePath,
    BrowsePathResult, BrowsePathTarget, BrowseRequest, BrowseResponse, BrowseResult,
    ReferenceDescription, TranslateBrowsePathsToNodeIdsRequest,
    TranslateBrowsePathsToNodeIdsResponse,
};
pub use call::{CallMethodRequest, CallMethodResult, CallRequest, CallResponse};
pub use event_filter::{
    AttributeOperand, ContentFilter, ContentFilterElement, ElementOperand, EventFieldSource,
    EventFilter, FilterEvaluator, FilterOperand, FilterOperator, LiteralOperand,
    SimpleAttributeOperand,
};
pub use headers::{AsRequestHandle, RequestHeader, ResponseHeader};
pub use monitored_item::{
    CreateMonitoredItemsRequest, CreateMonitoredItemsResponse, DataChangeFilter,
    DataChangeTrigger, DeadbandType, DeleteMonitoredItemsRequest, DeleteMonitoredItemsResponse,
    ModifyMonitoredItemsRequest, ModifyMonitoredItemsResponse, MonitoredItemCreateRequest,
    MonitoredItemCreateResult, MonitoredItemModifyRequest, MonitoredItemModifyResult,
    MonitoringMode, MonitoringParameters, SetMonitoringModeRequest, SetMonitoringModeResponse,
    SetTriggeringRequest, SetTriggeringResponse,
};
pub use notification::{
    DataChangeNotification, EventFieldList, EventNotificationList, MonitoredItemNotification,
    NotificationMessage, PublishRequest, PublishResponse, RepublishRequest, RepublishResponse,
    SubscriptionAcknowledgement,
};
pub use secure_channel::{
    ChannelSecurityToken, CloseSecureChannelRequest, CloseSecureChannelResponse,
    OpenSecureChannelRequest, OpenSecureChannelResponse, SecurityTokenRequestType,
};
pub use session::{
    ActivateSessionRequest, ActivateSessionResponse, AnonymousIdentityToken, ApplicationDescription,
    ApplicationType, BuildInfo, CloseSessionRequest, CloseSessionResponse, CreateSessionRequest,
    CreateSessionResponse, EndpointDescription, MessageSecurityMode, SignatureData,
    UserNameIdentityToken, UserTokenPolicy, UserTokenType,
};
pub use subscription::{
    CreateSubscriptionRequest, CreateSubscriptionResponse, DeleteSubscriptionsRequest,
    DeleteSubscriptionsResponse, ModifySubscriptionRequest, ModifySubscriptionResponse,
    SetPublishingModeRequest, SetPublishingModeResponse, TransferResult,
    TransferSubscriptionsRequest, TransferSubscriptionsResponse,
};
