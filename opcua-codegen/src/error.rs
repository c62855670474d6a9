// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Failure modes of the `opcua-codegen` binary.

use thiserror::Error;

/// Everything that can go wrong reading a type dictionary or rendering a
/// generated module from it.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// The dictionary file could not be read from disk.
    #[error("failed to read dictionary file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The dictionary file's YAML was malformed.
    #[error("failed to parse dictionary: {0}")]
    Dictionary(#[from] serde_yaml::Error),
    /// A type or field name in the dictionary is not valid Rust syntax.
    #[error("invalid Rust syntax in dictionary: {0}")]
    Syntax(#[from] syn::Error),
    /// The rendered module's token stream did not parse as a Rust file.
    #[error("failed to render module '{module}': {source}")]
    Render {
        /// Module that failed to render.
        module: String,
        /// Underlying syn parse error on the generated token stream.
        #[source]
        source: syn::Error,
    },
    /// The rendered module could not be written to the output directory.
    #[error("failed to write module '{module}' to {path}: {source}")]
    Write {
        /// Module that failed to write.
        module: String,
        /// Path that failed to write.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
