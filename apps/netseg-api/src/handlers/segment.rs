//! Segment handlers

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use netseg_domain::segment::{ListOptions, SegmentField, SortDirection, SortKey};
use netseg_domain::{RequestContext, SegmentError, SegmentId, SegmentView};
use tracing::{error, info, warn};

use crate::{
    config::ApiConfig,
    dto::segment::{
        CreateSegmentRequest, ErrorResponse, Link, SegmentListResponse, SegmentResponse,
        UpdateSegmentRequest,
    },
    AppState,
};

/// Path of the segment collection
pub const SEGMENTS_PATH: &str = "/v2.0/segments";

/// Header carrying a caller-assigned request id
const REQUEST_ID_HEADER: &str = "x-openstack-request-id";

/// Query parameters with a fixed meaning; any other key is a field filter
const PAGINATION_PARAMS: [&str; 3] = ["limit", "marker", "page_reverse"];

/// Error returned by segment handlers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl From<SegmentError> for ApiError {
    fn from(err: SegmentError) -> Self {
        let status = match &err {
            SegmentError::SegmentNotFound { .. } | SegmentError::NetworkNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SegmentError::SegmentAlreadyExists(_) => StatusCode::CONFLICT,
            SegmentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SegmentError::TransactionFailure(_) | SegmentError::StorageFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!(error = ?err, "Segment request failed");
        } else {
            warn!(error = %err, "Segment request rejected");
        }

        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// Create a segment
#[utoipa::path(
    post,
    path = "/v2.0/segments",
    request_body = CreateSegmentRequest,
    responses(
        (status = 201, description = "Segment created", body = SegmentResponse),
        (status = 400, description = "Bad request - invalid attributes", body = ErrorResponse),
        (status = 404, description = "Network not found", body = ErrorResponse),
        (status = 409, description = "Conflict - segment already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "segments"
)]
pub async fn create_segment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateSegmentRequest>,
) -> Result<(StatusCode, Json<SegmentResponse>), ApiError> {
    let ctx = request_context(&headers);
    info!(request_id = %ctx.request_id(), "Received create segment request");

    let segment = state.segments.create(&ctx, payload.segment.into()).await?;
    Ok((StatusCode::CREATED, Json(SegmentResponse { segment })))
}

/// List segments
///
/// Accepts repeated `fields`, `sort_key`/`sort_dir` pairs, `limit`,
/// `marker`, `page_reverse`, and any segment field name as a filter.
#[utoipa::path(
    get,
    path = "/v2.0/segments",
    responses(
        (status = 200, description = "Segments matching the filters", body = SegmentListResponse),
        (status = 400, description = "Bad request - invalid query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "segments"
)]
pub async fn list_segments(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<SegmentListResponse>, ApiError> {
    let ctx = request_context(&headers);
    let options = parse_list_query(&params, &state.config)?;
    let query = with_link_fields(&options);

    let mut segments = state.segments.list(&ctx, &query).await?;
    let segments_links = pagination_links(raw_query.as_deref(), &segments, &options);
    if query.fields != options.fields {
        for segment in &mut segments {
            segment.remove(SegmentField::Id);
        }
    }
    info!(request_id = %ctx.request_id(), count = segments.len(), "Listed segments");

    Ok(Json(SegmentListResponse {
        segments,
        segments_links,
    }))
}

/// Show one segment
#[utoipa::path(
    get,
    path = "/v2.0/segments/{id}",
    params(("id" = String, Path, description = "Segment id")),
    responses(
        (status = 200, description = "The segment", body = SegmentResponse),
        (status = 400, description = "Bad request - invalid id or field", body = ErrorResponse),
        (status = 404, description = "Segment not found", body = ErrorResponse)
    ),
    tag = "segments"
)]
pub async fn show_segment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<SegmentResponse>, ApiError> {
    let ctx = request_context(&headers);
    let id: SegmentId = id.parse()?;
    let fields = parse_fields(&params)?;

    let segment = state.segments.get(&ctx, &id, &fields).await?;
    Ok(Json(SegmentResponse { segment }))
}

/// Update the supplied attributes of a segment
#[utoipa::path(
    put,
    path = "/v2.0/segments/{id}",
    params(("id" = String, Path, description = "Segment id")),
    request_body = UpdateSegmentRequest,
    responses(
        (status = 200, description = "Segment updated", body = SegmentResponse),
        (status = 400, description = "Bad request - invalid attributes", body = ErrorResponse),
        (status = 404, description = "Segment not found", body = ErrorResponse)
    ),
    tag = "segments"
)]
pub async fn update_segment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<UpdateSegmentRequest>,
) -> Result<Json<SegmentResponse>, ApiError> {
    let ctx = request_context(&headers);
    let id: SegmentId = id.parse()?;
    info!(request_id = %ctx.request_id(), segment_id = %id, "Received update segment request");

    let segment = state.segments.update(&ctx, &id, payload.segment.into()).await?;
    Ok(Json(SegmentResponse { segment }))
}

/// Delete a segment
#[utoipa::path(
    delete,
    path = "/v2.0/segments/{id}",
    params(("id" = String, Path, description = "Segment id")),
    responses(
        (status = 204, description = "Segment deleted"),
        (status = 404, description = "Segment not found", body = ErrorResponse)
    ),
    tag = "segments"
)]
pub async fn delete_segment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let ctx = request_context(&headers);
    let id: SegmentId = id.parse()?;
    info!(request_id = %ctx.request_id(), segment_id = %id, "Received delete segment request");

    state.segments.delete(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Context for one HTTP request, reusing the caller's request id if sent
fn request_context(headers: &HeaderMap) -> RequestContext {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map_or_else(RequestContext::new, RequestContext::with_request_id)
}

fn parse_fields(params: &[(String, String)]) -> Result<Vec<SegmentField>, SegmentError> {
    params
        .iter()
        .filter(|(key, _)| key == "fields")
        .map(|(_, value)| value.parse())
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SegmentError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(SegmentError::invalid_input(format!(
            "{key} must be a boolean, got '{value}'"
        ))),
    }
}

/// Turn list query parameters into list options under the configured policy
///
/// Sorting parameters are ignored when sorting is disabled, pagination
/// parameters when pagination is disabled. A configured maximum page size
/// also applies when no limit was requested.
pub fn parse_list_query(
    params: &[(String, String)],
    config: &ApiConfig,
) -> Result<ListOptions, SegmentError> {
    let mut options = ListOptions::new();
    let mut sort_keys = Vec::new();
    let mut sort_dirs = Vec::new();
    let mut limit = None;

    for (key, value) in params {
        match key.as_str() {
            "fields" => options.fields.push(value.parse()?),
            "sort_key" => sort_keys.push(value.parse::<SegmentField>()?),
            "sort_dir" => sort_dirs.push(value.parse::<SortDirection>()?),
            "limit" => {
                let requested = value.parse::<usize>().map_err(|_| {
                    SegmentError::invalid_input(format!(
                        "limit must be a non-negative integer, got '{value}'"
                    ))
                })?;
                limit = Some(requested);
            }
            "marker" => options.marker = Some(value.parse()?),
            "page_reverse" => options.page_reverse = parse_bool(key, value)?,
            _ => {
                let field: SegmentField = key.parse()?;
                let value = field.parse_value(value)?;
                options.filters.insert(field, value);
            }
        }
    }

    if config.allow_sorting {
        if sort_keys.len() != sort_dirs.len() {
            return Err(SegmentError::invalid_input(
                "the number of sort_keys and sort_dirs must be the same",
            ));
        }
        options.sorts = sort_keys
            .into_iter()
            .zip(sort_dirs)
            .map(|(field, direction)| SortKey { field, direction })
            .collect();
    }

    if config.allow_pagination {
        options.limit = match (limit, config.pagination_max_limit) {
            (None, None) => None,
            (requested, _) => Some(config.clamp_limit(requested.unwrap_or(0))),
        };
    } else {
        options.marker = None;
        options.page_reverse = false;
    }

    Ok(options)
}

/// Options actually sent to the manager
///
/// Links name records by id, so a paged projection that left `id` out
/// fetches it anyway; the handler strips it again before responding.
fn with_link_fields(options: &ListOptions) -> ListOptions {
    let mut query = options.clone();
    if query.effective_limit().is_some()
        && !query.fields.is_empty()
        && !query.fields.contains(&SegmentField::Id)
    {
        query.fields.push(SegmentField::Id);
    }
    query
}

/// Links to the pages around `page`
///
/// A full page links onward, and a page reached through a marker links
/// back. On a reverse page the two directions swap.
pub fn pagination_links(raw_query: Option<&str>, page: &[SegmentView], options: &ListOptions) -> Vec<Link> {
    let Some(limit) = options.effective_limit() else {
        return Vec::new();
    };
    let (Some(first), Some(last)) = (
        page.first().and_then(SegmentView::id),
        page.last().and_then(SegmentView::id),
    ) else {
        return Vec::new();
    };

    let base: Vec<&str> = raw_query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            !PAGINATION_PARAMS.contains(&key)
        })
        .collect();

    let href = |marker: SegmentId, reverse: bool| {
        let mut pairs = base.clone();
        let limit = format!("limit={limit}");
        let marker = format!("marker={marker}");
        pairs.push(&limit);
        pairs.push(&marker);
        if reverse {
            pairs.push("page_reverse=True");
        }
        format!("{SEGMENTS_PATH}?{}", pairs.join("&"))
    };
    let link = |rel: &str, href: String| Link {
        rel: rel.to_string(),
        href,
    };

    let full_page = page.len() == limit;
    let has_marker = options.marker.is_some();
    let mut links = Vec::new();

    if options.page_reverse {
        if has_marker {
            links.push(link("next", href(last, false)));
        }
        if full_page {
            links.push(link("previous", href(first, true)));
        }
    } else {
        if full_page {
            links.push(link("next", href(last, false)));
        }
        if has_marker {
            links.push(link("previous", href(first, true)));
        }
    }
    links
}
