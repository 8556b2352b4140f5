use serde::{de::DeserializeOwned, ser::SerializeMap, Deserialize};
use thiserror::Error;

/// Metadata with a name and optional configuration.
///
/// Represents the named fields of V3 array metadata: the data type, chunk grid, chunk key encoding, each codec, and each storage transformer.
///
/// Deserialises from a bare name or a name/configuration map:
/// ```json
/// "crc32c"
/// ```
/// or
/// ```json
/// {
///     "name": "gzip",
///     "configuration": {
///       "level": 5
///     }
/// }
/// ```
/// A configuration, when present, is always a JSON object.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MetadataV3 {
    name: String,
    configuration: Option<MetadataConfiguration>,
}

/// Configuration metadata.
pub type MetadataConfiguration = serde_json::Map<String, serde_json::Value>;

impl TryFrom<&str> for MetadataV3 {
    type Error = serde_json::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        serde_json::from_str(s)
    }
}

impl core::fmt::Display for MetadataV3 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.configuration {
            Some(configuration) if !configuration.is_empty() => write!(
                f,
                "{} {}",
                self.name,
                serde_json::to_string(configuration).unwrap_or_default()
            ),
            _ => write!(f, "{}", self.name),
        }
    }
}

impl serde::Serialize for MetadataV3 {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match &self.configuration {
            None => s.serialize_str(self.name.as_str()),
            Some(configuration) if configuration.is_empty() => {
                let mut s = s.serialize_map(Some(1))?;
                s.serialize_entry("name", &self.name)?;
                s.end()
            }
            Some(configuration) => {
                let mut s = s.serialize_map(Some(2))?;
                s.serialize_entry("name", &self.name)?;
                s.serialize_entry("configuration", configuration)?;
                s.end()
            }
        }
    }
}

impl<'de> serde::Deserialize<'de> for MetadataV3 {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct MetadataNameConfiguration {
            name: String,
            #[serde(default)]
            configuration: Option<MetadataConfiguration>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum MetadataIntermediate {
            Name(String),
            NameConfiguration(MetadataNameConfiguration),
        }

        let metadata = MetadataIntermediate::deserialize(d).map_err(|_| {
            serde::de::Error::custom(r#"expected metadata "<name>" or {"name":"<name>"} or {"name":"<name>","configuration":{}}"#)
        })?;
        Ok(match metadata {
            MetadataIntermediate::Name(name) => Self {
                name,
                configuration: None,
            },
            MetadataIntermediate::NameConfiguration(metadata) => Self {
                name: metadata.name,
                configuration: metadata.configuration,
            },
        })
    }
}

impl MetadataV3 {
    /// Create metadata from `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            configuration: None,
        }
    }

    /// Create metadata from `name` and `configuration`.
    #[must_use]
    pub fn new_with_configuration(name: &str, configuration: MetadataConfiguration) -> Self {
        Self {
            name: name.into(),
            configuration: Some(configuration),
        }
    }

    /// Convert a serializable configuration to [`MetadataV3`].
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] if `configuration` does not serialize to a JSON object.
    pub fn new_with_serializable_configuration<TConfiguration: serde::Serialize>(
        name: &str,
        configuration: &TConfiguration,
    ) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(configuration)? {
            serde_json::Value::Object(configuration) => {
                Ok(Self::new_with_configuration(name, configuration))
            }
            _ => Err(serde::ser::Error::custom(
                "the configuration cannot be serialized to a JSON struct",
            )),
        }
    }

    /// Try and convert [`MetadataV3`] to a deserializable configuration.
    ///
    /// A missing configuration is treated as an empty object.
    ///
    /// # Errors
    /// Returns a [`ConfigurationInvalidError`] if the metadata cannot be converted.
    pub fn to_configuration<TConfiguration: DeserializeOwned>(
        &self,
    ) -> Result<TConfiguration, ConfigurationInvalidError> {
        let configuration = self.configuration.clone().unwrap_or_default();
        serde_json::from_value(serde_json::Value::Object(configuration)).map_err(|err| {
            ConfigurationInvalidError {
                name: self.name.clone(),
                configuration: self.configuration.clone(),
                reason: err.to_string(),
            }
        })
    }

    /// Returns the metadata name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the metadata configuration.
    #[must_use]
    pub const fn configuration(&self) -> Option<&MetadataConfiguration> {
        self.configuration.as_ref()
    }

    /// Returns true if the configuration is none or an empty map.
    #[must_use]
    pub fn configuration_is_none_or_empty(&self) -> bool {
        self.configuration
            .as_ref()
            .map_or(true, serde_json::Map::is_empty)
    }
}

/// An invalid configuration error.
#[derive(Clone, Debug, Error)]
#[error("{name} configuration {configuration:?} is invalid: {reason}")]
pub struct ConfigurationInvalidError {
    name: String,
    configuration: Option<MetadataConfiguration>,
    reason: String,
}

impl ConfigurationInvalidError {
    /// Returns the name of the metadata with the invalid configuration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
