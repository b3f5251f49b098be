//! Domain entities for network segments
//!
//! A Segment binds a network to a physical network, a segmentation
//! technology (VLAN, VXLAN, ...) and a segmentation id. This module also
//! defines how a stored segment is projected into the wire-level view
//! returned to callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::segment::error::SegmentError;
use crate::segment::ids::{NetworkId, SegmentId};
use crate::segment::request::{Attr, SegmentUpdate};

/// A persisted network segment record
///
/// Segments carry no derived or cached fields; every field is set at creation
/// and changes only through an explicit update. The `id` never changes.
///
/// # Example
///
/// ```rust
/// use netseg_domain::segment::{NetworkId, Segment, SegmentField, SegmentId};
/// use uuid::Uuid;
///
/// let segment = Segment::from_parts(
///     SegmentId::new(),
///     NetworkId::from_uuid(Uuid::new_v4()),
///     None,
///     "vlan".to_string(),
///     Some(100),
/// );
/// let view = segment.project(&[SegmentField::NetworkType]);
/// assert_eq!(view.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Unique identifier for this segment
    id: SegmentId,

    /// Network this segment belongs to
    network_id: NetworkId,

    /// Physical network name, if any
    physical_network: Option<String>,

    /// Segmentation technology (vlan, vxlan, flat, ...)
    network_type: String,

    /// Segmentation id within the technology, if any
    segmentation_id: Option<u32>,
}

impl Segment {
    /// Create a Segment with explicit values
    pub fn from_parts(
        id: SegmentId,
        network_id: NetworkId,
        physical_network: Option<String>,
        network_type: String,
        segmentation_id: Option<u32>,
    ) -> Self {
        Self {
            id,
            network_id,
            physical_network,
            network_type,
            segmentation_id,
        }
    }

    /// Get the segment's unique identifier
    pub fn id(&self) -> &SegmentId {
        &self.id
    }

    /// Get the owning network's identifier
    pub fn network_id(&self) -> &NetworkId {
        &self.network_id
    }

    /// Get the physical network name (if set)
    pub fn physical_network(&self) -> Option<&str> {
        self.physical_network.as_deref()
    }

    /// Get the segmentation technology
    pub fn network_type(&self) -> &str {
        &self.network_type
    }

    /// Get the segmentation id (if set)
    pub fn segmentation_id(&self) -> Option<u32> {
        self.segmentation_id
    }

    /// Overwrite the fields supplied in `update`, leaving the rest untouched
    pub fn apply(&mut self, update: SegmentUpdate) {
        if let Some(network_id) = update.network_id {
            self.network_id = network_id;
        }
        if let Some(network_type) = update.network_type {
            self.network_type = network_type;
        }
        match update.physical_network {
            Attr::Unspecified => {}
            other => self.physical_network = other.into_option(),
        }
        match update.segmentation_id {
            Attr::Unspecified => {}
            other => self.segmentation_id = other.into_option(),
        }
    }

    /// Comparable value of a single field
    pub fn field_value(&self, field: SegmentField) -> FieldValue {
        match field {
            SegmentField::Id => FieldValue::from(self.id.to_string()),
            SegmentField::NetworkId => FieldValue::from(self.network_id.to_string()),
            SegmentField::PhysicalNetwork => FieldValue::from(self.physical_network.clone()),
            SegmentField::NetworkType => FieldValue::from(self.network_type.clone()),
            SegmentField::SegmentationId => FieldValue::from(self.segmentation_id),
        }
    }

    /// Project this record onto the requested fields
    ///
    /// An empty field list selects every canonical field.
    pub fn project(&self, fields: &[SegmentField]) -> SegmentView {
        let selected: &[SegmentField] = if fields.is_empty() {
            &SegmentField::ALL
        } else {
            fields
        };

        SegmentView(
            selected
                .iter()
                .map(|field| (*field, self.field_value(*field)))
                .collect(),
        )
    }
}

/// The canonical fields of a segment view
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentField {
    Id,
    NetworkId,
    PhysicalNetwork,
    NetworkType,
    SegmentationId,
}

impl SegmentField {
    /// Every canonical field, in view order
    pub const ALL: [SegmentField; 5] = [
        SegmentField::Id,
        SegmentField::NetworkId,
        SegmentField::PhysicalNetwork,
        SegmentField::NetworkType,
        SegmentField::SegmentationId,
    ];

    /// Wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentField::Id => "id",
            SegmentField::NetworkId => "network_id",
            SegmentField::PhysicalNetwork => "physical_network",
            SegmentField::NetworkType => "network_type",
            SegmentField::SegmentationId => "segmentation_id",
        }
    }

    /// Interpret a raw string (e.g. a query parameter) as a value of this field
    pub fn parse_value(&self, raw: &str) -> Result<FieldValue, SegmentError> {
        match self {
            SegmentField::SegmentationId => raw.parse::<i64>().map(FieldValue::Int).map_err(|_| {
                SegmentError::invalid_input(format!("segmentation_id must be an integer, got '{}'", raw))
            }),
            _ => Ok(FieldValue::from(raw)),
        }
    }
}

impl fmt::Display for SegmentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegmentField {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SegmentField::ALL
            .iter()
            .find(|field| field.as_str() == s)
            .copied()
            .ok_or_else(|| SegmentError::invalid_input(format!("unknown segment field '{}'", s)))
    }
}

/// Value of one field of one segment
///
/// Totally ordered so storage engines can sort and paginate on any field:
/// `Null` sorts before every integer, integers before text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Int(i64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<SegmentId> for FieldValue {
    fn from(value: SegmentId) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<NetworkId> for FieldValue {
    fn from(value: NetworkId) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// A segment projected onto a subset of its canonical fields
///
/// Serializes as a JSON object keyed by field wire name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SegmentView(BTreeMap<SegmentField, FieldValue>);

impl SegmentView {
    /// Value of a field, if the field was selected
    pub fn get(&self, field: SegmentField) -> Option<&FieldValue> {
        self.0.get(&field)
    }

    /// Whether the field was selected
    pub fn contains(&self, field: SegmentField) -> bool {
        self.0.contains_key(&field)
    }

    /// The segment id, when `id` was selected
    pub fn id(&self) -> Option<SegmentId> {
        self.get(SegmentField::Id)
            .and_then(FieldValue::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// Drop a field from the view, returning its value if it was selected
    pub fn remove(&mut self, field: SegmentField) -> Option<FieldValue> {
        self.0.remove(&field)
    }

    /// Selected fields, in canonical order
    pub fn fields(&self) -> impl Iterator<Item = SegmentField> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
