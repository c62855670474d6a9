// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! The crate-wide [`Error`] type: a [`StatusCode`] paired with context, threaded
//! with `?` instead of panicking.

use std::{
    error::Error as StdError,
    fmt::{Debug, Display},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{constants, status_code::StatusCode};

/// Result of an encoding, decoding or service-dispatch operation.
pub type EncodingResult<T> = std::result::Result<T, Error>;

/// General OPC UA error: a status code plus the context that produced it.
///
/// Carries the request id/handle when known, so the SecureChannel and
/// Services layers can route a `ServiceFault` back without re-deriving it.
#[derive(Debug)]
pub struct Error {
    status: StatusCode,
    request_id: Option<u32>,
    request_handle: Option<u32>,
    context: Box<dyn StdError + Send + Sync>,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.context)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.context)
    }
}

impl Error {
    /// Create a new error with an explicit status code.
    pub fn new(status: StatusCode, context: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            status,
            request_id: None,
            request_handle: None,
            context: context.into(),
        }
    }

    /// Create a `BadDecoding` error.
    pub fn decoding(context: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::new(StatusCode::BadDecoding, context)
    }

    /// Create a `BadEncoding` error.
    pub fn encoding(context: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::new(StatusCode::BadEncoding, context)
    }

    /// Attach a request id.
    pub fn with_request_id(mut self, id: u32) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Attach a request handle.
    pub fn with_request_handle(mut self, handle: u32) -> Self {
        self.request_handle = Some(handle);
        self
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the request id, if known.
    pub fn request_id(&self) -> Option<u32> {
        self.request_id
    }

    /// Get the request handle, if known.
    pub fn request_handle(&self) -> Option<u32> {
        self.request_handle
    }
}

impl From<Error> for StatusCode {
    fn from(value: Error) -> Self {
        log::error!("{}", value);
        value.status()
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::decoding(value)
    }
}

/// Released when a [`DepthLock`] drops, so recursive decode failures still
/// decrement the depth gauge during unwinding.
#[derive(Debug)]
pub struct DepthLock<'a> {
    gauge: &'a DepthGauge,
}

impl Drop for DepthLock<'_> {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::Release);
    }
}

impl<'a> DepthLock<'a> {
    /// Take a depth lease, failing with `BadDecoding` if the max depth is exceeded.
    pub fn obtain(gauge: &'a DepthGauge) -> EncodingResult<DepthLock<'a>> {
        let current = gauge.current.fetch_add(1, Ordering::Acquire);
        if current >= gauge.max {
            Err(Error::decoding(
                "maximum recursion depth reached while decoding",
            ))
        } else {
            Ok(DepthLock { gauge })
        }
    }
}

/// Bounds recursive decoding of nested structures and Variants.
#[derive(Debug)]
pub struct DepthGauge {
    max: u64,
    current: AtomicU64,
}

impl Clone for DepthGauge {
    fn clone(&self) -> Self {
        Self::new(self.max)
    }
}

impl Default for DepthGauge {
    fn default() -> Self {
        Self::new(constants::MAX_DECODING_DEPTH)
    }
}

impl DepthGauge {
    /// Create a gauge with the given maximum depth.
    pub fn new(max: u64) -> Self {
        Self {
            max,
            current: AtomicU64::new(0),
        }
    }

    /// Maximum depth this gauge enforces.
    pub fn max_depth(&self) -> u64 {
        self.max
    }
}
