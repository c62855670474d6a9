// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

use std::io::{Read, Write};

use opcua_types::{
    encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult},
    generated::*,
    Error, ServiceFault,
};

use super::{Message, MessageType};
use crate::comms::MessageChunkType;

macro_rules! response_enum {
    ($($name:ident: $value:ident = $id:expr),* $(,)?) => {
        /// Every response type this implementation can produce, plus `ServiceFault` for
        /// requests that fail before reaching a specific service handler.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ResponseMessage {
            $(
                #[doc = stringify!($name)]
                $name(Box<$value>),
            )*
            /// A service-level failure response.
            ServiceFault(Box<ServiceFault>),
        }

        $(
            impl From<$value> for ResponseMessage {
                fn from(value: $value) -> Self {
                    Self::$name(Box::new(value))
                }
            }

            impl MessageType for $value {
                fn type_id() -> u32 {
                    $id
                }
            }
        )*

        impl From<ServiceFault> for ResponseMessage {
            fn from(value: ServiceFault) -> Self {
                Self::ServiceFault(Box::new(value))
            }
        }

        impl MessageType for ServiceFault {
            fn type_id() -> u32 {
                0
            }
        }

        impl ResponseMessage {
            /// The response header common to every variant.
            pub fn response_header(&self) -> &ResponseHeader {
                match self {
                    $( Self::$name(v) => &v.response_header, )*
                    Self::ServiceFault(v) => &v.response_header,
                }
            }

            /// The numeric type-id `opcua-codegen` assigned this variant's response struct.
            pub fn type_id_of(&self) -> u32 {
                match self {
                    $( Self::$name(_) => $id, )*
                    Self::ServiceFault(_) => 0,
                }
            }

            /// The chunk message type a response of this kind is carried in.
            pub fn chunk_message_type(&self) -> MessageChunkType {
                match self {
                    Self::OpenSecureChannel(_) => MessageChunkType::OpenSecureChannel,
                    Self::CloseSecureChannel(_) => MessageChunkType::CloseSecureChannel,
                    _ => MessageChunkType::Message,
                }
            }
        }

        impl BinaryEncodable for ResponseMessage {
            fn byte_len(&self, ctx: &Context<'_>) -> usize {
                match self {
                    $( Self::$name(v) => v.byte_len(ctx), )*
                    Self::ServiceFault(v) => v.byte_len(ctx),
                }
            }

            fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
                match self {
                    $( Self::$name(v) => v.encode(stream, ctx), )*
                    Self::ServiceFault(v) => v.encode(stream, ctx),
                }
            }
        }

        impl Message for ResponseMessage {
            fn request_handle(&self) -> u32 {
                self.response_header().request_handle
            }

            fn decode_by_type_id<S: Read + ?Sized>(stream: &mut S, type_id: u32, ctx: &Context<'_>) -> EncodingResult<Self> {
                match type_id {
                    $( $id => Ok($value::decode(stream, ctx)?.into()), )*
                    0 => Ok(ServiceFault::decode(stream, ctx)?.into()),
                    other => Err(Error::decoding(format!("decoding unsupported for response type id {other}"))),
                }
            }
        }
    };
}

response_enum! {
    OpenSecureChannel: OpenSecureChannelResponse = 1,
    CloseSecureChannel: CloseSecureChannelResponse = 2,
    CreateSession: CreateSessionResponse = 3,
    ActivateSession: ActivateSessionResponse = 4,
    CloseSession: CloseSessionResponse = 5,
    Read: ReadResponse = 6,
    Write: WriteResponse = 7,
    Browse: BrowseResponse = 8,
    BrowseNext: BrowseNextResponse = 9,
    TranslateBrowsePathsToNodeIds: TranslateBrowsePathsToNodeIdsResponse = 10,
    Call: CallResponse = 11,
    CreateSubscription: CreateSubscriptionResponse = 12,
    ModifySubscription: ModifySubscriptionResponse = 13,
    DeleteSubscriptions: DeleteSubscriptionsResponse = 14,
    TransferSubscriptions: TransferSubscriptionsResponse = 15,
    SetPublishingMode: SetPublishingModeResponse = 16,
    CreateMonitoredItems: CreateMonitoredItemsResponse = 17,
    ModifyMonitoredItems: ModifyMonitoredItemsResponse = 18,
    DeleteMonitoredItems: DeleteMonitoredItemsResponse = 19,
    SetMonitoringMode: SetMonitoringModeResponse = 20,
    SetTriggering: SetTriggeringResponse = 21,
    Publish: PublishResponse = 22,
    Republish: RepublishResponse = 23,
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua_types::{status_code::StatusCode, NamespaceMap};

    #[test]
    fn service_fault_roundtrips_through_type_id_zero() {
        let ns = NamespaceMap::new();
        let ctx = Context::new(&ns);
        let resp = ResponseMessage::from(ServiceFault::new(42u32, StatusCode::BadInvalidArgument));
        assert_eq!(resp.type_id_of(), 0);
        let mut buf = Vec::new();
        resp.encode(&mut buf, &ctx).unwrap();
        let mut cur = std::io::Cursor::new(buf.as_slice());
        let decoded = ResponseMessage::decode_by_type_id(&mut cur, 0, &ctx).unwrap();
        assert_eq!(decoded, resp);
    }

    #[test]
    fn response_message_roundtrips_through_its_type_id() {
        let ns = NamespaceMap::new();
        let ctx = Context::new(&ns);
        let resp = ResponseMessage::from(CloseSessionResponse { response_header: ResponseHeader::new_good(7u32) });
        let mut buf = Vec::new();
        resp.encode(&mut buf, &ctx).unwrap();
        let mut cur = std::io::Cursor::new(buf.as_slice());
        let decoded = ResponseMessage::decode_by_type_id(&mut cur, resp.type_id_of(), &ctx).unwrap();
        assert_eq!(decoded, resp);
    }
}
