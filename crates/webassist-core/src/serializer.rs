//! Logging JSON serializer
//!
//! [`JsonObjectSerializer`] wraps `serde_json` and reports failures through
//! `tracing`: serialization errors are logged and returned to the caller,
//! deserialization errors are logged together with the offending input and
//! turned into `None`.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Output options for [`ObjectSerializer`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonOptions {
    /// Indent the output
    pub pretty: bool,
}

impl JsonOptions {
    /// Indented output
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

/// Serializes values to and from strings
pub trait ObjectSerializer: Send + Sync {
    /// Serialize `value`, using the serializer's defaults when `options` is `None`
    fn serialize<T: Serialize + ?Sized>(
        &self,
        value: &T,
        options: Option<JsonOptions>,
    ) -> Result<String, serde_json::Error>;

    /// Deserialize `data`, yielding `None` when it cannot be parsed as `T`
    fn deserialize<T: DeserializeOwned>(&self, data: &str, options: Option<JsonOptions>)
        -> Option<T>;
}

/// [`ObjectSerializer`] backed by `serde_json`
#[derive(Debug, Clone, Default)]
pub struct JsonObjectSerializer {
    defaults: JsonOptions,
}

impl JsonObjectSerializer {
    /// Serializer with compact output by default
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializer using `defaults` when no options are given
    pub fn with_options(defaults: JsonOptions) -> Self {
        Self { defaults }
    }
}

impl ObjectSerializer for JsonObjectSerializer {
    fn serialize<T: Serialize + ?Sized>(
        &self,
        value: &T,
        options: Option<JsonOptions>,
    ) -> Result<String, serde_json::Error> {
        let options = options.unwrap_or(self.defaults);
        let result = if options.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };

        result.map_err(|err| {
            tracing::error!(
                error = %err,
                object_type = std::any::type_name::<T>(),
                "Serialization failed"
            );
            err
        })
    }

    fn deserialize<T: DeserializeOwned>(&self, data: &str, _options: Option<JsonOptions>) -> Option<T> {
        match serde_json::from_str(data) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    data = %data,
                    target_type = std::any::type_name::<T>(),
                    "Deserialization failed"
                );
                None
            }
        }
    }
}
