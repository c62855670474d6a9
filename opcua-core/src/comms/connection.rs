// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! [`Connection`]: the per-connection framing state a transport owns, independent of
//! whatever I/O actually carries the bytes. Accumulates partial chunks bounded by
//! [`TransportLimits::receive_buffer_size`] (the spec's `tcpBufSize`), reassembles and
//! decodes complete messages through [`SecureChannel`]/[`Chunker`], and queues outgoing
//! bytes bounded by [`TransportLimits::send_high_water_mark`].
//!
//! Grounded on the *usage shape* of the teacher's
//! `opcua-server/src/transport/tcp.rs` (`TcpTransport`, `TransportConfig`,
//! `process_message`'s pending-chunks accumulation) rather than its literal code: that file
//! drives a `tokio`/`FramedRead` socket loop this crate doesn't reproduce (a full
//! asynchronous client/server event loop is out of scope), so `Connection` is sans-I/O —
//! `push_received_bytes`/`take_outgoing` are plain synchronous calls a transport (real or, in
//! this crate's own tests, a byte `Vec`) drives directly.

use std::collections::VecDeque;
use std::io::Cursor;

use opcua_types::{
    constants::{MAX_CHUNK_COUNT, MAX_MESSAGE_SIZE},
    encoding::Context,
    status_code::StatusCode,
    Error,
};

use crate::messages::RequestMessage;

use super::chunker::{Chunker, ChunkInfo, MessageChunk, MessageChunkHeader, MessageIsFinalType};
use super::secure_channel::SecureChannel;
use super::MESSAGE_CHUNK_HEADER_SIZE;

/// Bounds one [`Connection`]'s buffers. A real transport negotiates these during the
/// HELLO/ACKNOWLEDGE handshake (out of scope here); these are the fixed defaults a
/// connection starts with.
#[derive(Debug, Clone)]
pub struct TransportLimits {
    /// Upper bound on the partial-chunk accumulator, the spec's `tcpBufSize`.
    pub receive_buffer_size: usize,
    /// Upper bound on a single decoded message's total body size across all its chunks.
    pub max_message_size: usize,
    /// Upper bound on how many chunks a single message may be split across.
    pub max_chunk_count: usize,
    /// Outgoing-byte high-water mark. Enqueuing past it tears the connection down with
    /// `BadResourceUnavailable` rather than growing the queue without bound.
    pub send_high_water_mark: usize,
}

impl Default for TransportLimits {
    fn default() -> Self {
        Self {
            receive_buffer_size: MAX_MESSAGE_SIZE,
            max_message_size: MAX_MESSAGE_SIZE,
            max_chunk_count: MAX_CHUNK_COUNT,
            send_high_water_mark: MAX_MESSAGE_SIZE * 4,
        }
    }
}

/// A fully reassembled, decoded request ready for `Server::dispatch`, plus the request id its
/// response chunks must echo back.
#[derive(Debug)]
pub struct ReceivedMessage {
    /// The decoded request.
    pub message: RequestMessage,
    /// The request id carried in the chunk sequence headers.
    pub request_id: u32,
}

/// Per-connection framing state. Owns no socket: a transport feeds it received bytes with
/// [`Connection::push_received_bytes`] and drains queued output with
/// [`Connection::take_outgoing`].
pub struct Connection {
    limits: TransportLimits,
    accumulator: Vec<u8>,
    pending_chunks: Vec<MessageChunk>,
    /// The sequence number the next message's first chunk must carry. `Chunker::validate_chunks`
    /// both consumes and returns this shape (its return value is already "one past the last
    /// chunk it validated"), so this field is never re-derived with an extra `+1`/wrap step.
    next_expected_sequence_number: u32,
    outgoing: VecDeque<u8>,
    closed: Option<StatusCode>,
}

impl Connection {
    /// A fresh connection with empty buffers.
    pub fn new(limits: TransportLimits) -> Self {
        Self {
            limits,
            accumulator: Vec::new(),
            pending_chunks: Vec::new(),
            next_expected_sequence_number: 1,
            outgoing: VecDeque::new(),
            closed: None,
        }
    }

    /// The status code the connection was torn down with, if [`Connection::close`] or a
    /// backpressure failure has already closed it.
    pub fn closed_reason(&self) -> Option<StatusCode> {
        self.closed
    }

    /// Tear the connection down. Once closed, further `push_received_bytes`/`enqueue_send`
    /// calls keep failing with the same reason rather than silently doing nothing.
    pub fn close(&mut self, reason: StatusCode) {
        self.closed = Some(reason);
        self.accumulator.clear();
        self.pending_chunks.clear();
        self.outgoing.clear();
    }

    /// Feed newly-arrived bytes in. `bytes` is copied into the accumulator, so the caller's
    /// slice doesn't need to outlive the call (`SPEC_FULL.md`'s `on_receive` contract).
    /// Returns every message completed by this call, in arrival order.
    ///
    /// If appending `bytes` would grow the accumulator past `receive_buffer_size`, the
    /// connection is torn down with `BadResourceUnavailable` and that error is returned.
    pub fn push_received_bytes(
        &mut self,
        bytes: &[u8],
        channel: &mut SecureChannel,
        ctx: &Context<'_>,
    ) -> Result<Vec<ReceivedMessage>, Error> {
        if let Some(reason) = self.closed {
            return Err(Error::new(reason, "connection is closed"));
        }
        if self.accumulator.len() + bytes.len() > self.limits.receive_buffer_size {
            self.close(StatusCode::BadResourceUnavailable);
            return Err(Error::new(StatusCode::BadResourceUnavailable, "receive accumulator exceeded tcpBufSize"));
        }
        self.accumulator.extend_from_slice(bytes);

        let mut messages = Vec::new();
        loop {
            if self.accumulator.len() < MESSAGE_CHUNK_HEADER_SIZE {
                break;
            }
            let message_size = {
                let mut cursor = Cursor::new(&self.accumulator);
                match MessageChunkHeader::decode(&mut cursor, ctx) {
                    Ok(header) => header.message_size as usize,
                    Err(e) => {
                        self.close(e.status());
                        return Err(e);
                    }
                }
            };
            if message_size < MESSAGE_CHUNK_HEADER_SIZE || self.accumulator.len() < message_size {
                break;
            }
            let chunk_bytes: Vec<u8> = self.accumulator.drain(..message_size).collect();
            match self.accept_chunk(MessageChunk { data: chunk_bytes }, channel, ctx) {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(messages)
    }

    fn accept_chunk(
        &mut self,
        chunk: MessageChunk,
        channel: &mut SecureChannel,
        ctx: &Context<'_>,
    ) -> Result<Option<ReceivedMessage>, Error> {
        let info = ChunkInfo::new(&chunk, ctx)?;
        if info.message_header.is_final == MessageIsFinalType::FinalError {
            self.pending_chunks.clear();
            return Ok(None);
        }

        if self.pending_chunks.len() >= self.limits.max_chunk_count {
            self.close(StatusCode::BadResourceUnavailable);
            return Err(Error::new(StatusCode::BadResourceUnavailable, "message exceeds the negotiated max chunk count"));
        }
        self.pending_chunks.push(chunk);

        if info.message_header.is_final == MessageIsFinalType::Intermediate {
            return Ok(None);
        }

        let outcome = self.decode_pending(channel, ctx);
        self.pending_chunks.clear();
        outcome
    }

    fn decode_pending(&mut self, channel: &mut SecureChannel, ctx: &Context<'_>) -> Result<Option<ReceivedMessage>, Error> {
        let infos: Result<Vec<ChunkInfo>, Error> = self.pending_chunks.iter().map(|c| ChunkInfo::new(c, ctx)).collect();
        let infos = infos?;
        let request_id = infos[0].sequence_header.request_id;

        self.next_expected_sequence_number =
            Chunker::validate_chunks(self.next_expected_sequence_number, channel.secure_channel_id(), &infos)?;

        let body = Chunker::decode(channel, &self.pending_chunks, ctx).map_err(|e| e.with_request_id(request_id))?;
        if body.len() > self.limits.max_message_size {
            return Err(Error::new(StatusCode::BadResponseTooLarge, "decoded message exceeds the negotiated max message size").with_request_id(request_id));
        }
        let message = RequestMessage::from_bytes_with_type_id(&body, ctx).map_err(|e| e.with_request_id(request_id))?;
        Ok(Some(ReceivedMessage { message, request_id }))
    }

    /// Queue `bytes` for the transport to send. Fails with `BadResourceUnavailable` (and
    /// tears the connection down) if the queue would grow past `send_high_water_mark`.
    pub fn enqueue_send(&mut self, bytes: &[u8]) -> Result<(), StatusCode> {
        if let Some(reason) = self.closed {
            return Err(reason);
        }
        if self.outgoing.len() + bytes.len() > self.limits.send_high_water_mark {
            self.close(StatusCode::BadResourceUnavailable);
            return Err(StatusCode::BadResourceUnavailable);
        }
        self.outgoing.extend(bytes.iter().copied());
        Ok(())
    }

    /// Number of bytes currently queued to send.
    pub fn pending_send_len(&self) -> usize {
        self.outgoing.len()
    }

    /// Drain up to `max_len` queued outgoing bytes, or `None` if nothing is queued.
    pub fn take_outgoing(&mut self, max_len: usize) -> Option<Vec<u8>> {
        if self.outgoing.is_empty() {
            return None;
        }
        let n = max_len.min(self.outgoing.len());
        Some(self.outgoing.drain(..n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comms::chunker::MessageChunkType;
    use crate::comms::secure_channel::Role;
    use opcua_types::generated::{CloseSessionRequest, RequestHeader};
    use opcua_types::NamespaceMap;

    fn ctx() -> Context<'static> {
        Context::new(Box::leak(Box::new(NamespaceMap::new())))
    }

    fn encode_request(channel: &SecureChannel, request_id: u32, req: RequestMessage, ctx: &Context<'_>) -> Vec<MessageChunk> {
        let body = req.to_bytes_with_type_id(ctx).unwrap();
        Chunker::encode(1, request_id, 8192, req.chunk_message_type(), channel, &body, ctx).unwrap()
    }

    #[test]
    fn single_chunk_message_delivers_one_received_message() {
        let mut channel = SecureChannel::new(Role::Server);
        let ctx = ctx();
        let req = RequestMessage::from(CloseSessionRequest { request_header: RequestHeader::new(opcua_types::NodeId::null(), 7), delete_subscriptions: true });
        let chunks = encode_request(&channel, 99, req.clone(), &ctx);
        assert_eq!(chunks.len(), 1);

        let mut conn = Connection::new(TransportLimits::default());
        let received = conn.push_received_bytes(&chunks[0].data, &mut channel, &ctx).unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].request_id, 99);
        assert_eq!(received[0].message, req);
    }

    #[test]
    fn bytes_delivered_one_at_a_time_still_reassemble() {
        let mut channel = SecureChannel::new(Role::Server);
        let ctx = ctx();
        let req = RequestMessage::from(CloseSessionRequest { request_header: RequestHeader::new(opcua_types::NodeId::null(), 1), delete_subscriptions: false });
        let chunks = encode_request(&channel, 1, req.clone(), &ctx);
        let wire = chunks[0].data.clone();

        let mut conn = Connection::new(TransportLimits::default());
        let mut received = Vec::new();
        for byte in &wire {
            received.extend(conn.push_received_bytes(std::slice::from_ref(byte), &mut channel, &ctx).unwrap());
        }
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].message, req);
    }

    #[test]
    fn multi_chunk_message_reassembles_across_several_pushes() {
        let mut channel = SecureChannel::new(Role::Server);
        let ctx = ctx();
        let req = RequestMessage::from(CloseSessionRequest { request_header: RequestHeader::new(opcua_types::NodeId::null(), 1), delete_subscriptions: true });
        // Pad the encoded body with trailing bytes past the real fields so the message has to
        // span several 8192-byte chunks; `decode_by_type_id` only reads what the struct needs
        // and ignores the rest, so the decoded request is unaffected by the padding.
        let mut body = req.to_bytes_with_type_id(&ctx).unwrap();
        body.extend(std::iter::repeat(0u8).take(20_000));
        let chunks = Chunker::encode(1, 5, 8192, MessageChunkType::Message, &channel, &body, &ctx).unwrap();
        assert!(chunks.len() > 1);

        let mut conn = Connection::new(TransportLimits::default());
        let mut received = Vec::new();
        for chunk in &chunks {
            received.extend(conn.push_received_bytes(&chunk.data, &mut channel, &ctx).unwrap());
        }
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].request_id, 5);
        assert_eq!(received[0].message, req);
    }

    #[test]
    fn receive_accumulator_over_tcp_buf_size_closes_the_connection() {
        let mut channel = SecureChannel::new(Role::Server);
        let ctx = ctx();
        let mut conn = Connection::new(TransportLimits { receive_buffer_size: 4, ..TransportLimits::default() });
        let err = conn.push_received_bytes(&[0u8; 5], &mut channel, &ctx).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadResourceUnavailable);
        assert_eq!(conn.closed_reason(), Some(StatusCode::BadResourceUnavailable));
    }

    #[test]
    fn send_queue_over_high_water_mark_closes_the_connection() {
        let mut conn = Connection::new(TransportLimits { send_high_water_mark: 4, ..TransportLimits::default() });
        assert!(conn.enqueue_send(&[1, 2, 3, 4]).is_ok());
        assert_eq!(conn.enqueue_send(&[5]).unwrap_err(), StatusCode::BadResourceUnavailable);
        assert_eq!(conn.closed_reason(), Some(StatusCode::BadResourceUnavailable));
    }

    #[test]
    fn take_outgoing_drains_in_order() {
        let mut conn = Connection::new(TransportLimits::default());
        conn.enqueue_send(b"hello").unwrap();
        let first = conn.take_outgoing(3).unwrap();
        assert_eq!(first, b"hel");
        let second = conn.take_outgoing(100).unwrap();
        assert_eq!(second, b"lo");
        assert!(conn.take_outgoing(10).is_none());
    }
}
