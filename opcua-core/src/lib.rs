// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

#![warn(missing_docs)]

//! Functionality common to OPC UA clients and servers: message chunking,
//! the secure channel state machine, request/response wrapper enums, the
//! cooperative `EventLoop` facade, and configuration loading.

/// Debugging helpers for dumping wire data.
pub mod debug {
    use log::{log_enabled, trace};

    /// Print the contents of a slice in hex and visible-char format, at `trace` level
    /// under the `hex` target only.
    pub fn log_buffer(message: &str, buf: &[u8]) {
        if !log_enabled!(target: "hex", log::Level::Trace) {
            return;
        }
        trace!(target: "hex", "{}", message);
        for (i, chunk) in buf.chunks(32).enumerate() {
            let hex: String = chunk.iter().map(|b| format!(" {:02x}", b)).collect();
            let chars: String = chunk
                .iter()
                .map(|&b| if (32..=126).contains(&b) { b as char } else { '.' })
                .collect();
            trace!(target: "hex", "{:08x}:{} {}", i * 32, hex, chars);
        }
    }
}

/// Protocol-wide constants.
pub mod constants {
    /// Default OPC UA TCP port, used when an endpoint URL omits one.
    pub const DEFAULT_OPC_UA_SERVER_PORT: u16 = 4840;
}

pub mod comms;
pub mod config;
pub mod event_loop;
pub mod messages;

pub use messages::{Message, MessageType, RequestMessage, ResponseMessage};

/// Common synchronous locks. Re-exports from `parking_lot` used throughout the workspace.
pub mod sync {
    /// Read-write lock. Prefer this when reads dominate writes.
    pub type RwLock<T> = parking_lot::RwLock<T>;
    /// Mutually exclusive lock.
    pub type Mutex<T> = parking_lot::Mutex<T>;
}

/// Obtain a lock on a `Mutex`, as a single point to add tracing if a deadlock needs hunting down.
#[macro_export]
macro_rules! trace_lock {
    ($x:expr) => {{
        $x.lock()
    }};
}

/// Obtain a read lock on a `RwLock`.
#[macro_export]
macro_rules! trace_read_lock {
    ($x:expr) => {{
        $x.read()
    }};
}

/// Obtain a write lock on a `RwLock`.
#[macro_export]
macro_rules! trace_write_lock {
    ($x:expr) => {{
        $x.write()
    }};
}
