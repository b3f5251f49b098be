//! Wire-level inputs for creating and updating segments
//!
//! Optional attributes are tri-state: a caller can leave an attribute out,
//! send an explicit null, or send a value. `Attr` keeps the three cases
//! apart so normalization is a `match`, not a comparison against a
//! placeholder value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::segment::ids::{NetworkId, SegmentId};

/// An optional attribute as supplied by a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr<T> {
    /// The caller did not supply the attribute
    Unspecified,
    /// The caller explicitly supplied null
    Null,
    /// The caller supplied a value
    Value(T),
}

impl<T> Attr<T> {
    pub fn is_unspecified(&self) -> bool {
        matches!(self, Attr::Unspecified)
    }

    /// Collapse to the stored representation: anything but a value is null
    pub fn into_option(self) -> Option<T> {
        match self {
            Attr::Value(value) => Some(value),
            Attr::Unspecified | Attr::Null => None,
        }
    }
}

impl<T> Default for Attr<T> {
    fn default() -> Self {
        Attr::Unspecified
    }
}

impl<T> From<Option<T>> for Attr<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Attr::Null, Attr::Value)
    }
}

// Absent keys never reach these impls: fields are tagged `#[serde(default)]`
// so a missing key stays `Unspecified`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Attr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Attr::from)
    }
}

impl<T: Serialize> Serialize for Attr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Attr::Value(value) => serializer.serialize_some(value),
            Attr::Unspecified | Attr::Null => serializer.serialize_none(),
        }
    }
}

/// Request to create a segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSpec {
    /// Caller-chosen id; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SegmentId>,

    pub network_id: NetworkId,

    #[serde(default, skip_serializing_if = "Attr::is_unspecified")]
    pub physical_network: Attr<String>,

    pub network_type: String,

    #[serde(default, skip_serializing_if = "Attr::is_unspecified")]
    pub segmentation_id: Attr<u32>,
}

impl SegmentSpec {
    /// A spec with only the required attributes
    pub fn new(network_id: NetworkId, network_type: impl Into<String>) -> Self {
        Self {
            id: None,
            network_id,
            physical_network: Attr::Unspecified,
            network_type: network_type.into(),
            segmentation_id: Attr::Unspecified,
        }
    }

    pub fn with_id(mut self, id: SegmentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_physical_network(mut self, physical_network: impl Into<String>) -> Self {
        self.physical_network = Attr::Value(physical_network.into());
        self
    }

    pub fn with_segmentation_id(mut self, segmentation_id: u32) -> Self {
        self.segmentation_id = Attr::Value(segmentation_id);
        self
    }
}

/// Partial update of a segment
///
/// Only supplied attributes are written. The id is immutable and therefore
/// not part of an update; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<NetworkId>,

    #[serde(default, skip_serializing_if = "Attr::is_unspecified")]
    pub physical_network: Attr<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_type: Option<String>,

    #[serde(default, skip_serializing_if = "Attr::is_unspecified")]
    pub segmentation_id: Attr<u32>,
}

impl SegmentUpdate {
    /// Whether the update would change nothing
    pub fn is_empty(&self) -> bool {
        self.network_id.is_none()
            && self.physical_network.is_unspecified()
            && self.network_type.is_none()
            && self.segmentation_id.is_unspecified()
    }
}
