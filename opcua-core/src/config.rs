// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Common utilities for configuration files shared by client and server.
//!
//! Configuration is read from and written to JSON5 documents (comments,
//! unquoted keys, trailing commas) rather than YAML, reflecting the wire
//! stack's own JSON5 tokenizer in `opcua-types`.

use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use opcua_types::generated::{ApplicationDescription, ApplicationType};
use opcua_types::{localized_text::LocalizedText, string::UAString};

/// Error returned from loading or saving a [`Config`] implementor.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config failed its own [`Config::validate`] pass.
    #[error("configuration is invalid: {0:?}")]
    Invalid(Vec<String>),
    /// Reading or writing the file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The document could not be parsed or rendered as JSON5.
    #[error("json5 error: {0}")]
    Json5(#[from] json5::Error),
}

/// Loading, saving, and validating configuration for a client or server application.
pub trait Config: serde::Serialize {
    /// Save this configuration to `path` as a JSON5 document. Fails without writing
    /// anything if [`Config::validate`] reports errors.
    fn save(&self, path: &Path) -> Result<(), ConfigError>
    where
        Self: Sized,
    {
        if let Err(errors) = self.validate() {
            return Err(ConfigError::Invalid(errors));
        }
        let s = json5::to_string(self)?;
        let mut f = File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Load a configuration from a JSON5 document at `path`.
    fn load<A>(path: &Path) -> Result<A, ConfigError>
    where
        for<'de> A: Config + serde::Deserialize<'de>,
    {
        let mut f = File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        Ok(json5::from_str(&s)?)
    }

    /// Validate the configuration, returning the list of problems found if any.
    ///
    /// A rule-handling key of `Abort` should translate a validation failure into an
    /// error returned from this method; `Warn` should log and still return `Ok`.
    fn validate(&self) -> Result<(), Vec<String>>;

    /// The application's name.
    fn application_name(&self) -> UAString;

    /// The application's globally unique URI.
    fn application_uri(&self) -> UAString;

    /// The product URI, stable across instances and versions of the application.
    fn product_uri(&self) -> UAString;

    /// Whether this application is a client, a server, or both.
    fn application_type(&self) -> ApplicationType;

    /// Discovery URLs this application can be reached at, if it is a server.
    fn discovery_urls(&self) -> Option<Vec<UAString>> {
        None
    }

    /// Build the `ApplicationDescription` advertised by `GetEndpoints`/`FindServers`.
    fn application_description(&self) -> ApplicationDescription {
        ApplicationDescription {
            application_uri: self.application_uri(),
            application_name: LocalizedText::new("", self.application_name().as_ref()),
            application_type: self.application_type(),
            product_uri: self.product_uri(),
            gateway_server_uri: UAString::null(),
            discovery_profile_uri: UAString::null(),
            discovery_urls: self.discovery_urls(),
        }
    }
}
