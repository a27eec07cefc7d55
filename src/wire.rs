//! Write-only JSON shape of outcomes
//!
//! Outcomes are produced, never read back: every `Deserialize` impl here
//! fails with [`WireError::Unsupported`]. Exception errors are flattened to
//! message, type, and (when enabled) stack trace.

use crate::{Error, Outcome, PagedOutcome, WireError};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serialization settings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WireOptions {
    /// Emit `stackTrace` for exception errors; off unless opted in
    pub include_stack_traces: bool,
}

impl WireOptions {
    /// Options that emit stack traces
    pub fn with_stack_traces() -> Self {
        Self {
            include_stack_traces: true,
        }
    }
}

/// Serializable view of an [`Outcome`] under explicit options
pub struct WireOutcome<'a, T> {
    outcome: &'a Outcome<T>,
    options: WireOptions,
}

/// Serializable view of a [`PagedOutcome`] under explicit options
pub struct WirePage<'a, T> {
    page: &'a PagedOutcome<T>,
    options: WireOptions,
}

struct WireErrors<'a> {
    errors: &'a [Error],
    options: WireOptions,
}

struct WireErrorEntry<'a> {
    error: &'a Error,
    options: WireOptions,
}

impl<T> Outcome<T> {
    /// Serializable view using `options`
    pub fn to_wire(&self, options: &WireOptions) -> WireOutcome<'_, T> {
        WireOutcome {
            outcome: self,
            options: *options,
        }
    }
}

impl<T: Serialize> Outcome<T> {
    /// Render as a JSON string using `options`
    pub fn to_json(&self, options: &WireOptions) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_wire(options))
    }
}

impl<T> PagedOutcome<T> {
    /// Serializable view using `options`
    pub fn to_wire(&self, options: &WireOptions) -> WirePage<'_, T> {
        WirePage {
            page: self,
            options: *options,
        }
    }
}

impl<T: Serialize> PagedOutcome<T> {
    /// Render as a JSON string using `options`
    pub fn to_json(&self, options: &WireOptions) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_wire(options))
    }
}

fn serialize_common<M, T>(
    map: &mut M,
    outcome: &Outcome<T>,
    options: WireOptions,
) -> Result<(), M::Error>
where
    M: SerializeMap,
    T: Serialize,
{
    map.serialize_entry("isSuccess", &outcome.is_success())?;
    // Value-less outcomes (`T = ()`) carry no `value` key. Other zero-sized
    // values, such as unit structs, are still emitted.
    if !is_unit::<T>() {
        if let Some(value) = outcome.value() {
            map.serialize_entry("value", value)?;
        }
    }
    map.serialize_entry("messages", outcome.messages())?;
    map.serialize_entry(
        "errors",
        &WireErrors {
            errors: outcome.errors(),
            options,
        },
    )
}

fn is_unit<T>() -> bool {
    // `TypeId` would need `T: 'static`, which borrowed values cannot meet.
    std::any::type_name::<T>() == std::any::type_name::<()>()
}

impl<T: Serialize> Serialize for WireOutcome<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        serialize_common(&mut map, self.outcome, self.options)?;
        map.end()
    }
}

impl<T: Serialize> Serialize for WirePage<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let page = self.page;
        let mut map = serializer.serialize_map(None)?;
        serialize_common(&mut map, page.as_outcome(), self.options)?;
        map.serialize_entry("currentPage", &page.current_page())?;
        map.serialize_entry("totalPages", &page.total_pages())?;
        map.serialize_entry("totalCount", &page.total_count())?;
        map.serialize_entry("pageSize", &page.page_size())?;
        map.serialize_entry("hasNextPage", &page.has_next_page())?;
        map.serialize_entry("hasPreviousPage", &page.has_previous_page())?;
        map.end()
    }
}

impl Serialize for WireErrors<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.errors.iter().map(|error| WireErrorEntry {
            error,
            options: self.options,
        }))
    }
}

impl Serialize for WireErrorEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("kind", self.error.kind().as_str())?;
        match self.error {
            Error::Generic { message } => {
                map.serialize_entry("message", message)?;
            }
            Error::Validation { property, message } => {
                map.serialize_entry("message", message)?;
                map.serialize_entry("property", property)?;
            }
            Error::Exception {
                message,
                type_name,
                stack_trace,
            } => {
                map.serialize_entry("message", message)?;
                map.serialize_entry("type", type_name)?;
                if let (true, Some(trace)) = (self.options.include_stack_traces, stack_trace) {
                    map.serialize_entry("stackTrace", trace)?;
                }
            }
            Error::Cancelled { source_name } => {
                if let Some(source) = source_name {
                    map.serialize_entry("source", source)?;
                }
            }
            Error::RuleViolation { rule_name, message } => {
                if let Some(message) = message {
                    map.serialize_entry("message", message)?;
                }
                map.serialize_entry("rule", rule_name)?;
            }
        }
        map.end()
    }
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireErrorEntry {
            error: self,
            options: WireOptions::default(),
        }
        .serialize(serializer)
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire(&WireOptions::default()).serialize(serializer)
    }
}

impl<T: Serialize> Serialize for PagedOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire(&WireOptions::default()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Error {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        Err(D::Error::custom(WireError::Unsupported("Error")))
    }
}

impl<'de, T> Deserialize<'de> for Outcome<T> {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        Err(D::Error::custom(WireError::Unsupported("Outcome")))
    }
}

impl<'de, T> Deserialize<'de> for PagedOutcome<T> {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        Err(D::Error::custom(WireError::Unsupported("PagedOutcome")))
    }
}
