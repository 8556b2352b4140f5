//! Plugins for the named extension points of array metadata.
//!
//! A [`Plugin`] creates objects from [`MetadataV3`] (a name and optional configuration).
//! Codecs are the only extension point resolved through plugins; data types, chunk grids and chunk key encodings form closed sets.
//!
//! Plugins are submitted at compile time with the [inventory] crate and collected once into a process-wide registry on first use (see [`codec_registry`](crate::array::codec::codec_registry)).
//! Resolution of an unregistered name is an explicit [`PluginCreateError::Unsupported`] error.

use thiserror::Error;

use crate::metadata::v3::MetadataV3;

/// A plugin.
pub struct Plugin<TPlugin> {
    /// The identifier of the plugin.
    identifier: &'static str,
    /// Tests if the name is a match for this plugin.
    match_name_fn: fn(name: &str) -> bool,
    /// Create an implementation of this plugin from metadata.
    create_fn: fn(metadata: &MetadataV3) -> Result<TPlugin, PluginCreateError>,
}

impl<TPlugin> core::fmt::Debug for Plugin<TPlugin> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Plugin")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

/// An invalid plugin metadata error.
///
/// Raised when a registered plugin receives a configuration it cannot interpret.
#[derive(Debug, Error)]
#[error("{plugin_type} {identifier} is unsupported with metadata: {metadata}")]
pub struct PluginMetadataInvalidError {
    identifier: &'static str,
    plugin_type: &'static str,
    metadata: Box<MetadataV3>,
}

impl PluginMetadataInvalidError {
    /// Create a new [`PluginMetadataInvalidError`].
    #[must_use]
    pub fn new(identifier: &'static str, plugin_type: &'static str, metadata: MetadataV3) -> Self {
        Self {
            identifier,
            plugin_type,
            metadata: Box::new(metadata),
        }
    }

    /// Returns the identifier of the plugin that rejected the metadata.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        self.identifier
    }
}

/// A plugin creation error.
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum PluginCreateError {
    /// No plugin is registered with this name.
    #[error("{plugin_type} {name} is not supported")]
    Unsupported { name: String, plugin_type: String },
    /// The plugin is registered, but its configuration is invalid.
    #[error(transparent)]
    MetadataInvalid(#[from] PluginMetadataInvalidError),
    /// Other
    #[error("{_0}")]
    Other(String),
}

impl PluginCreateError {
    /// Create a [`PluginCreateError::Unsupported`] error.
    #[must_use]
    pub fn unsupported(name: &str, plugin_type: &str) -> Self {
        Self::Unsupported {
            name: name.to_string(),
            plugin_type: plugin_type.to_string(),
        }
    }
}

impl From<&str> for PluginCreateError {
    fn from(err_string: &str) -> Self {
        Self::Other(err_string.to_string())
    }
}

impl From<String> for PluginCreateError {
    fn from(err_string: String) -> Self {
        Self::Other(err_string)
    }
}

impl<TPlugin> Plugin<TPlugin> {
    /// Create a new plugin for registration.
    pub const fn new(
        identifier: &'static str,
        match_name_fn: fn(name: &str) -> bool,
        create_fn: fn(metadata: &MetadataV3) -> Result<TPlugin, PluginCreateError>,
    ) -> Self {
        Self {
            identifier,
            match_name_fn,
            create_fn,
        }
    }

    /// Create a `TPlugin` plugin from `metadata`.
    ///
    /// # Errors
    /// Returns a [`PluginCreateError`] if the configuration is invalid.
    pub fn create(&self, metadata: &MetadataV3) -> Result<TPlugin, PluginCreateError> {
        (self.create_fn)(metadata)
    }

    /// Returns true if this plugin is associated with `name`.
    ///
    /// This includes aliases of the plugin identifier.
    #[must_use]
    pub fn match_name(&self, name: &str) -> bool {
        (self.match_name_fn)(name)
    }

    /// Returns the identifier of the plugin.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        self.identifier
    }
}
