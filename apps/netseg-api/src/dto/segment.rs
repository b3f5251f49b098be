//! DTOs for segment endpoints

use netseg_domain::segment::{Attr, NetworkId, SegmentSpec, SegmentUpdate};
use netseg_domain::{SegmentId, SegmentView};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Attributes accepted when creating a segment
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSegment {
    /// Caller-chosen id; generated when absent
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Option<Uuid>,
    pub network_id: Uuid,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "physnet1")]
    pub physical_network: Attr<String>,
    #[schema(example = "vlan")]
    pub network_type: String,
    #[serde(default)]
    #[schema(value_type = Option<u32>, example = 100)]
    pub segmentation_id: Attr<u32>,
}

impl From<CreateSegment> for SegmentSpec {
    fn from(dto: CreateSegment) -> Self {
        SegmentSpec {
            id: dto.id.map(SegmentId::from_uuid),
            network_id: NetworkId::from_uuid(dto.network_id),
            physical_network: dto.physical_network,
            network_type: dto.network_type,
            segmentation_id: dto.segmentation_id,
        }
    }
}

/// Attributes accepted when updating a segment; omitted ones are unchanged
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateSegment {
    pub network_id: Option<Uuid>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub physical_network: Attr<String>,
    pub network_type: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<u32>, example = 200)]
    pub segmentation_id: Attr<u32>,
}

impl From<UpdateSegment> for SegmentUpdate {
    fn from(dto: UpdateSegment) -> Self {
        SegmentUpdate {
            network_id: dto.network_id.map(NetworkId::from_uuid),
            physical_network: dto.physical_network,
            network_type: dto.network_type,
            segmentation_id: dto.segmentation_id,
        }
    }
}

/// Request body for segment creation
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSegmentRequest {
    pub segment: CreateSegment,
}

/// Request body for segment update
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSegmentRequest {
    pub segment: UpdateSegment,
}

/// Response body carrying one segment
#[derive(Debug, Serialize, ToSchema)]
pub struct SegmentResponse {
    /// Requested fields of the segment
    #[schema(value_type = Object, example = json!({
        "id": "550e8400-e29b-41d4-a716-446655440000",
        "network_id": "0b6a3c1e-5d2f-4a8b-9c7d-1e2f3a4b5c6d",
        "physical_network": null,
        "network_type": "vlan",
        "segmentation_id": 100
    }))]
    pub segment: SegmentView,
}

/// Pagination link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Link {
    #[schema(example = "next")]
    pub rel: String,
    #[schema(example = "/v2.0/segments?limit=2&marker=550e8400-e29b-41d4-a716-446655440000")]
    pub href: String,
}

/// Response body for segment listing
#[derive(Debug, Serialize, ToSchema)]
pub struct SegmentListResponse {
    #[schema(value_type = Vec<Object>)]
    pub segments: Vec<SegmentView>,
    /// Links to neighbouring pages; omitted when there are none
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments_links: Vec<Link>,
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error description
    #[schema(example = "Segment 550e8400-e29b-41d4-a716-446655440000 could not be found")]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_body_distinguishes_null_and_absent() {
        let body: CreateSegmentRequest = serde_json::from_value(json!({
            "segment": {
                "network_id": "0b6a3c1e-5d2f-4a8b-9c7d-1e2f3a4b5c6d",
                "network_type": "vlan",
                "physical_network": null
            }
        }))
        .unwrap();

        assert_eq!(body.segment.physical_network, Attr::Null);
        assert_eq!(body.segment.segmentation_id, Attr::Unspecified);

        let spec = SegmentSpec::from(body.segment);
        assert!(spec.id.is_none());
        assert_eq!(spec.network_type, "vlan");
    }

    #[test]
    fn test_update_body_rejects_unknown_attribute() {
        let result: Result<UpdateSegmentRequest, _> =
            serde_json::from_value(json!({"segment": {"mtu": 1500}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_body_maps_supplied_attributes() {
        let body: UpdateSegmentRequest =
            serde_json::from_value(json!({"segment": {"segmentation_id": 200}})).unwrap();

        let update = SegmentUpdate::from(body.segment);
        assert_eq!(update.segmentation_id, Attr::Value(200));
        assert!(update.network_type.is_none());
        assert!(update.physical_network.is_unspecified());
    }

    #[test]
    fn test_list_response_omits_empty_links() {
        let body = SegmentListResponse {
            segments: Vec::new(),
            segments_links: Vec::new(),
        };
        assert_eq!(serde_json::to_value(body).unwrap(), json!({"segments": []}));
    }
}
