//! Filtering, sorting and pagination of segment collections
//!
//! `ListOptions` is what a caller asks for. `CollectionQuery` is what the
//! manager hands to a storage adapter once the marker has been resolved;
//! it also carries the slicing rules so every adapter paginates the same way.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::segment::entity::{FieldValue, Segment, SegmentField};
use crate::segment::error::SegmentError;
use crate::segment::ids::SegmentId;

/// Per-field accepted value sets
///
/// A record matches when, for every filtered field, its value is one of the
/// accepted values. A field with an empty accepted set matches nothing, and
/// a null value never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(BTreeMap<SegmentField, Vec<FieldValue>>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter that selects a single segment by id
    pub fn by_id(id: SegmentId) -> Self {
        Self::new().with(SegmentField::Id, [id])
    }

    /// Accept `values` for `field`, in addition to values already accepted
    pub fn with<I, V>(mut self, field: SegmentField, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.0
            .entry(field)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Accept one more value for `field`
    pub fn insert(&mut self, field: SegmentField, value: impl Into<FieldValue>) {
        self.0.entry(field).or_default().push(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentField, &[FieldValue])> + '_ {
        self.0.iter().map(|(field, values)| (*field, values.as_slice()))
    }

    pub fn matches(&self, segment: &Segment) -> bool {
        self.iter().all(|(field, accepted)| {
            let value = segment.field_value(field);
            !value.is_null() && accepted.contains(&value)
        })
    }
}

/// Sort direction of one sort key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(SegmentError::invalid_input(format!(
                "sort direction must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

/// One sort key: a field and a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SegmentField,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: SegmentField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: SegmentField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

/// Caller-facing options of a list operation
///
/// Every option defaults to unset: no filters, all fields, natural order,
/// no limit, first page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub filters: Filters,
    pub fields: Vec<SegmentField>,
    pub sorts: Vec<SortKey>,
    /// Page size; `Some(0)` is the same as `None`
    pub limit: Option<usize>,
    /// Id of the record the page starts after
    pub marker: Option<SegmentId>,
    pub page_reverse: bool,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_fields(mut self, fields: impl Into<Vec<SegmentField>>) -> Self {
        self.fields = fields.into();
        self
    }

    pub fn sorted_by(mut self, key: SortKey) -> Self {
        self.sorts.push(key);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_marker(mut self, marker: SegmentId) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn reversed(mut self) -> Self {
        self.page_reverse = true;
        self
    }

    /// Page size with zero treated as unlimited
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|limit| *limit > 0)
    }
}

/// A resolved collection request, as seen by storage adapters
#[derive(Debug, Clone, Copy)]
pub struct CollectionQuery<'a> {
    pub filters: &'a Filters,
    pub sorts: &'a [SortKey],
    pub limit: Option<usize>,
    pub marker: Option<&'a Segment>,
    pub page_reverse: bool,
}

impl<'a> CollectionQuery<'a> {
    /// Whether this request fetches the page before the marker
    pub fn reverses(&self) -> bool {
        self.limit.is_some() && self.page_reverse
    }

    /// Sort keys actually applied
    ///
    /// `id ASC` is appended when the caller did not sort on id, so the order
    /// is total and markers are unambiguous. A reverse page flips every key.
    pub fn ordering(&self) -> Vec<SortKey> {
        let mut keys = self.sorts.to_vec();
        if !keys.iter().any(|key| key.field == SegmentField::Id) {
            keys.push(SortKey::asc(SegmentField::Id));
        }
        if self.reverses() {
            for key in &mut keys {
                key.direction = key.direction.reversed();
            }
        }
        keys
    }

    /// Filter, order, cut after the marker, limit
    ///
    /// A reverse page is returned in the caller's order, not the flipped one.
    pub fn slice<I>(&self, records: I) -> Vec<Segment>
    where
        I: IntoIterator<Item = Segment>,
    {
        let ordering = self.ordering();
        let mut rows: Vec<Segment> = records
            .into_iter()
            .filter(|segment| self.filters.matches(segment))
            .collect();

        rows.sort_by(|a, b| compare(&ordering, a, b));

        if let Some(marker) = self.marker {
            rows.retain(|segment| compare(&ordering, segment, marker) == Ordering::Greater);
        }
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        if self.reverses() {
            rows.reverse();
        }
        rows
    }
}

/// Compare two segments under a sequence of sort keys
pub fn compare(ordering: &[SortKey], a: &Segment, b: &Segment) -> Ordering {
    ordering
        .iter()
        .map(|key| {
            let natural = a.field_value(key.field).cmp(&b.field_value(key.field));
            match key.direction {
                SortDirection::Asc => natural,
                SortDirection::Desc => natural.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::ids::NetworkId;
    use uuid::Uuid;

    fn segment(n: u128, network_type: &str, segmentation_id: Option<u32>) -> Segment {
        Segment::from_parts(
            SegmentId::from_uuid(Uuid::from_u128(n)),
            NetworkId::from_uuid(Uuid::from_u128(1000)),
            None,
            network_type.to_string(),
            segmentation_id,
        )
    }

    fn ids(rows: &[Segment]) -> Vec<SegmentId> {
        rows.iter().map(|s| *s.id()).collect()
    }

    fn fixture() -> Vec<Segment> {
        vec![
            segment(3, "vxlan", Some(30)),
            segment(1, "vlan", Some(10)),
            segment(4, "vlan", None),
            segment(2, "vlan", Some(20)),
        ]
    }

    fn id(n: u128) -> SegmentId {
        SegmentId::from_uuid(Uuid::from_u128(n))
    }

    #[test]
    fn test_filters_match_value_sets() {
        let filters = Filters::new().with(SegmentField::NetworkType, ["vlan", "gre"]);
        let query = CollectionQuery {
            filters: &filters,
            sorts: &[],
            limit: None,
            marker: None,
            page_reverse: false,
        };
        assert_eq!(ids(&query.slice(fixture())), vec![id(1), id(2), id(4)]);
    }

    #[test]
    fn test_empty_accepted_set_matches_nothing() {
        let filters = Filters::new().with(SegmentField::NetworkType, Vec::<String>::new());
        assert!(fixture().iter().all(|s| !filters.matches(s)));
    }

    #[test]
    fn test_null_never_matches() {
        let filters = Filters::new().with(SegmentField::SegmentationId, [FieldValue::Null]);
        assert!(fixture().iter().all(|s| !filters.matches(s)));
    }

    #[test]
    fn test_ordering_appends_id_once() {
        let sorts = [SortKey::desc(SegmentField::SegmentationId)];
        let filters = Filters::new();
        let query = CollectionQuery {
            filters: &filters,
            sorts: &sorts,
            limit: None,
            marker: None,
            page_reverse: false,
        };
        assert_eq!(
            query.ordering(),
            vec![
                SortKey::desc(SegmentField::SegmentationId),
                SortKey::asc(SegmentField::Id)
            ]
        );

        let sorts = [SortKey::desc(SegmentField::Id)];
        let query = CollectionQuery { sorts: &sorts, ..query };
        assert_eq!(query.ordering(), vec![SortKey::desc(SegmentField::Id)]);
    }

    #[test]
    fn test_marker_and_limit_page_forward() {
        let rows = fixture();
        let marker = rows[1].clone(); // id 1
        let filters = Filters::new();
        let query = CollectionQuery {
            filters: &filters,
            sorts: &[],
            limit: Some(2),
            marker: Some(&marker),
            page_reverse: false,
        };
        assert_eq!(ids(&query.slice(rows)), vec![id(2), id(3)]);
    }

    #[test]
    fn test_reverse_page_returns_records_before_marker_in_caller_order() {
        let rows = fixture();
        let marker = rows[2].clone(); // id 4
        let filters = Filters::new();
        let query = CollectionQuery {
            filters: &filters,
            sorts: &[],
            limit: Some(2),
            marker: Some(&marker),
            page_reverse: true,
        };
        assert_eq!(ids(&query.slice(rows)), vec![id(2), id(3)]);
    }

    #[test]
    fn test_page_reverse_without_limit_is_ignored() {
        let filters = Filters::new();
        let query = CollectionQuery {
            filters: &filters,
            sorts: &[],
            limit: None,
            marker: None,
            page_reverse: true,
        };
        assert_eq!(ids(&query.slice(fixture())), vec![id(1), id(2), id(3), id(4)]);
    }

    #[test]
    fn test_desc_sort_on_nullable_field() {
        let sorts = [SortKey::desc(SegmentField::SegmentationId)];
        let filters = Filters::new();
        let query = CollectionQuery {
            filters: &filters,
            sorts: &sorts,
            limit: None,
            marker: None,
            page_reverse: false,
        };
        assert_eq!(ids(&query.slice(fixture())), vec![id(3), id(2), id(1), id(4)]);
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        assert_eq!(ListOptions::new().with_limit(0).effective_limit(), None);
        assert_eq!(ListOptions::new().with_limit(3).effective_limit(), Some(3));
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("down".parse::<SortDirection>().is_err());
    }
}
