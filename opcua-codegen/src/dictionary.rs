// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! The type dictionary schema: one [`Dictionary`] per `types.yaml`, grouping
//! [`StructDef`]/[`EnumDef`] entries by the service family ("module") whose
//! wire types they describe.
//!
//! This mirrors `opcua-types/src/generated/mod.rs`'s one-module-per-service-
//! family layout rather than the upstream one-file-per-type convention; see
//! that module's doc comment for why.

use serde::Deserialize;

/// The full set of generated modules this dictionary describes.
#[derive(Debug, Deserialize)]
pub struct Dictionary {
    /// One entry per `opcua-types/src/generated/<name>.rs` file to emit.
    pub modules: Vec<Module>,
}

/// One generated source file: a module doc comment plus the enums and
/// structs it declares, in declaration order.
#[derive(Debug, Deserialize)]
pub struct Module {
    /// File stem under `opcua-types/src/generated/`, e.g. `"attribute"`.
    pub name: String,
    /// Rendered as the file's `//!` module doc comment.
    pub doc: String,
    /// Extra `use` paths this module's fields reference, beyond the common
    /// prelude every module gets (`binary_struct`, `wire_enum`, `UaNullable`).
    #[serde(default)]
    pub imports: Vec<String>,
    /// Fieldless wire enums, rendered via the `wire_enum!` macro.
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    /// Structured types, rendered as a struct definition plus a
    /// `binary_struct!` macro invocation.
    #[serde(default)]
    pub structs: Vec<StructDef>,
}

/// A fieldless, numerically-tagged wire enum (`wire_enum!` macro).
#[derive(Debug, Deserialize)]
pub struct EnumDef {
    /// Type name, e.g. `"MonitoringMode"`.
    pub name: String,
    /// Variant name used as this enum's `Default`.
    pub default: String,
    /// Variants in declaration order; `value` is the wire tag.
    pub variants: Vec<EnumVariant>,
}

/// One variant of an [`EnumDef`].
#[derive(Debug, Deserialize)]
pub struct EnumVariant {
    /// Variant name.
    pub name: String,
    /// Numeric wire tag.
    pub value: u32,
}

/// A structured type: a Rust struct plus its `binary_struct!` field-order
/// declaration (the two are always kept in sync, which is exactly the
/// invariant a generator — rather than two hand-maintained lists — exists
/// to enforce).
#[derive(Debug, Deserialize)]
pub struct StructDef {
    /// Type name, e.g. `"ReadValueId"`.
    pub name: String,
    /// Rendered as the struct's doc comment, if present.
    #[serde(default)]
    pub doc: Option<String>,
    /// Fields in wire order.
    pub fields: Vec<FieldDef>,
    /// Name of the field whose `.is_null()` this type's `UaNullable::
    /// is_ua_null` delegates to. Absent means the type is never considered
    /// null (the common case for response bodies and nested records).
    #[serde(default)]
    pub null_field: Option<String>,
}

/// One field of a [`StructDef`], in wire order.
#[derive(Debug, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Rust type, as it would be written in source (e.g. `"Option<Vec<u32>>"`,
    /// `"crate::generated::attribute::TimestampsToReturn"`).
    pub ty: String,
    /// Rendered as the field's doc comment, if present.
    #[serde(default)]
    pub doc: Option<String>,
}
