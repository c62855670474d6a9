// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

use std::io::{Read, Write};

use opcua_types::{
    encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult},
    generated::*,
    Error,
};

use super::{Message, MessageType};
use crate::comms::MessageChunkType;

macro_rules! request_enum {
    ($($name:ident: $value:ident = $id:expr),* $(,)?) => {
        /// Every request type this implementation can decode off the wire.
        #[derive(Debug, Clone, PartialEq)]
        pub enum RequestMessage {
            $(
                #[doc = stringify!($name)]
                $name(Box<$value>),
            )*
        }

        $(
            impl From<$value> for RequestMessage {
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

        impl RequestMessage {
            /// The request header common to every variant.
            pub fn request_header(&self) -> &RequestHeader {
                match self {
                    $( Self::$name(v) => &v.request_header, )*
                }
            }

            /// The numeric type-id `opcua-codegen` assigned this variant's request struct.
            pub fn type_id_of(&self) -> u32 {
                match self {
                    $( Self::$name(_) => $id, )*
                }
            }

            /// The chunk message type a request of this kind is carried in.
            pub fn chunk_message_type(&self) -> MessageChunkType {
                match self {
                    Self::OpenSecureChannel(_) => MessageChunkType::OpenSecureChannel,
                    Self::CloseSecureChannel(_) => MessageChunkType::CloseSecureChannel,
                    _ => MessageChunkType::Message,
                }
            }
        }

        impl BinaryEncodable for RequestMessage {
            fn byte_len(&self, ctx: &Context<'_>) -> usize {
                match self {
                    $( Self::$name(v) => v.byte_len(ctx), )*
                }
            }

            fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
                match self {
                    $( Self::$name(v) => v.encode(stream, ctx), )*
                }
            }
        }

        impl Message for RequestMessage {
            fn request_handle(&self) -> u32 {
                self.request_header().request_handle
            }

            fn decode_by_type_id<S: Read + ?Sized>(stream: &mut S, type_id: u32, ctx: &Context<'_>) -> EncodingResult<Self> {
                match type_id {
                    $( $id => Ok($value::decode(stream, ctx)?.into()), )*
                    other => Err(Error::decoding(format!("decoding unsupported for request type id {other}"))),
                }
            }
        }
    };
}

request_enum! {
    OpenSecureChannel: OpenSecureChannelRequest = 1,
    CloseSecureChannel: CloseSecureChannelRequest = 2,
    CreateSession: CreateSessionRequest = 3,
    ActivateSession: ActivateSessionRequest = 4,
    CloseSession: CloseSessionRequest = 5,
    Read: ReadRequest = 6,
    Write: WriteRequest = 7,
    Browse: BrowseRequest = 8,
    BrowseNext: BrowseNextRequest = 9,
    TranslateBrowsePathsToNodeIds: TranslateBrowsePathsToNodeIdsRequest = 10,
    Call: CallRequest = 11,
    CreateSubscription: CreateSubscriptionRequest = 12,
    ModifySubscription: ModifySubscriptionRequest = 13,
    DeleteSubscriptions: DeleteSubscriptionsRequest = 14,
    TransferSubscriptions: TransferSubscriptionsRequest = 15,
    SetPublishingMode: SetPublishingModeRequest = 16,
    CreateMonitoredItems: CreateMonitoredItemsRequest = 17,
    ModifyMonitoredItems: ModifyMonitoredItemsRequest = 18,
    DeleteMonitoredItems: DeleteMonitoredItemsRequest = 19,
    SetMonitoringMode: SetMonitoringModeRequest = 20,
    SetTriggering: SetTriggeringRequest = 21,
    Publish: PublishRequest = 22,
    Republish: RepublishRequest = 23,
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua_types::NamespaceMap;

    #[test]
    fn request_message_roundtrips_through_its_type_id() {
        let ns = NamespaceMap::new();
        let ctx = Context::new(&ns);
        let req = RequestMessage::from(CloseSessionRequest { request_header: RequestHeader::default(), delete_subscriptions: true });
        let mut buf = Vec::new();
        req.encode(&mut buf, &ctx).unwrap();
        let mut cur = std::io::Cursor::new(buf.as_slice());
        let decoded = RequestMessage::decode_by_type_id(&mut cur, req.type_id_of(), &ctx).unwrap();
        assert_eq!(decoded, req);
    }
}
