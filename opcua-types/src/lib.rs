// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

#![warn(missing_docs)]

//! Data model and wire codec for OPC UA: built-in types, the structured-type
//! reflection descriptor, and binary/JSON encoding.

pub mod byte_string;
pub mod constants;
pub mod data_value;
pub mod date_time;
pub mod encoding;
pub mod errors;
pub mod guid;
pub mod json5;
pub mod localized_text;
pub mod namespaces;
pub mod node_id;
pub mod qualified_name;
pub mod service_fault;
pub mod status_code;
pub mod string;
pub mod variant;

#[cfg(feature = "json")]
pub mod json;

pub mod generated;

pub use byte_string::ByteString;
pub use data_value::DataValue;
pub use date_time::UtcTime;
pub use encoding::{
    BinaryDecodable, BinaryEncodable, Context, DecodingOptions, EncodingResult, UaNullable,
};
pub use errors::Error;
pub use guid::Guid;
pub use localized_text::LocalizedText;
pub use namespaces::NamespaceMap;
pub use node_id::{Identifier, NodeId};
pub use qualified_name::QualifiedName;
pub use service_fault::ServiceFault;
pub use status_code::StatusCode;
pub use string::UAString;
pub use variant::{DataTypeDescriptor, DataTypeKind, MemberDescriptor, Variant, VariantScalarTypeId};

#[cfg(test)]
mod tests;
