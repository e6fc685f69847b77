use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use territory_shared::{
    IntensityScale, IntensityTier, MarketIntelligence, Metric, Point, Record, Rect, RegionStats,
    Size, VIRTUAL_HEIGHT, VIRTUAL_WIDTH, Viewport, registry,
};
use tracing::warn;

use crate::state::{AppState, ObservabilitySnapshot, SnapshotSummary};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (records, seq) = {
        let snapshot = state.snapshot.read().await;
        (snapshot.records.len(), snapshot.seq)
    };
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "regions": registry().len(),
        "records": records,
        "seq": seq,
        "observability": {
            "aggregation_passes_total": observability.aggregation_passes_total,
            "ignored_records_total": observability.ignored_records_total,
            "rejected_submissions_total": observability.rejected_submissions_total,
            "stats_requests_total": observability.stats_requests_total,
        }
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegionView {
    id: &'static str,
    name: &'static str,
    path: &'static str,
    label_anchor: Point,
    bounds: Rect,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegionsPayload {
    virtual_width: f64,
    virtual_height: f64,
    default_region: Option<&'static str>,
    regions: Vec<RegionView>,
}

pub async fn get_regions() -> impl IntoResponse {
    let registry = registry();
    let payload = RegionsPayload {
        virtual_width: VIRTUAL_WIDTH,
        virtual_height: VIRTUAL_HEIGHT,
        default_region: registry.default_region().map(|r| r.id),
        regions: registry
            .regions()
            .iter()
            .map(|r| RegionView {
                id: r.id,
                name: r.name,
                path: r.path,
                label_anchor: r.label_anchor,
                bounds: r.bounds,
            })
            .collect(),
    };
    ([(header::CACHE_CONTROL, "public, max-age=3600")], Json(payload))
}

/// Serve the pre-serialized record array, no re-serialization per request.
pub async fn get_records(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (etag, json): (String, Arc<Bytes>) = {
        let snapshot = state.snapshot.read().await;
        (records_etag(snapshot.seq), Arc::clone(&snapshot.records_json))
    };

    if if_none_match_matches(&headers, &etag) {
        return not_modified_response("no-cache", Some(etag.as_str()));
    }

    json_bytes_response((*json).clone(), "no-cache", Some(etag.as_str()))
}

/// Replace the record set with a JSON array of record objects.
pub async fn put_records(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SnapshotSummary>, StatusCode> {
    let records = parse_records(&body).map_err(|e| {
        warn!(error = %e, "rejected malformed record submission");
        state.observability.record_rejected_submission();
        StatusCode::BAD_REQUEST
    })?;

    if records.len() > state.max_records {
        warn!(
            records = records.len(),
            max_records = state.max_records,
            "rejected oversize record submission"
        );
        state.observability.record_rejected_submission();
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }

    Ok(Json(state.replace_records(records).await))
}

pub(crate) fn parse_records(body: &[u8]) -> Result<Vec<Record>, serde_json::Error> {
    serde_json::from_slice(body)
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    metric: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegionStatsView {
    #[serde(flatten)]
    stats: RegionStats,
    tier: IntensityTier,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsPayload {
    seq: u64,
    timestamp: String,
    metric: Metric,
    max_volume: u64,
    max_growth: u64,
    stats: BTreeMap<String, RegionStatsView>,
    intelligence: MarketIntelligence,
}

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    state.observability.record_stats_request();
    let metric = match query.metric.as_deref() {
        Some(raw) => raw.parse::<Metric>().map_err(|e| {
            warn!(error = %e, "rejected stats query");
            StatusCode::BAD_REQUEST
        })?,
        None => Metric::default(),
    };

    let snapshot = state.snapshot.read().await;
    let stats = &snapshot.report.stats;
    let scale = IntensityScale::from_stats(stats);
    let payload = StatsPayload {
        seq: snapshot.seq,
        timestamp: snapshot.timestamp.clone(),
        metric,
        max_volume: scale.max(Metric::Volume),
        max_growth: scale.max(Metric::Growth),
        stats: stats
            .iter()
            .map(|(id, entry)| {
                (
                    id.clone(),
                    RegionStatsView {
                        stats: *entry,
                        tier: scale.tier(entry, metric),
                    },
                )
            })
            .collect(),
        intelligence: MarketIntelligence::build(registry().regions(), stats, metric),
    };
    drop(snapshot);

    serde_json::to_value(payload).map(Json).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize stats payload");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[derive(Debug, Deserialize)]
pub struct ViewportQuery {
    width: Option<f64>,
    height: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewportPayload {
    #[serde(flatten)]
    viewport: Viewport,
    container: Size,
    target: Point,
}

/// Initial viewport state for a container of the given size.
pub async fn get_viewport(
    Query(query): Query<ViewportQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let container = container_size(query.width, query.height).ok_or(StatusCode::BAD_REQUEST)?;
    let viewport = Viewport::new(container, registry().default_target());
    let payload = ViewportPayload {
        container: viewport.container(),
        target: viewport.target(),
        viewport,
    };
    serde_json::to_value(payload).map(Json).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize viewport payload");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

fn container_size(width: Option<f64>, height: Option<f64>) -> Option<Size> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    let width = width.filter(|v| valid(*v))?;
    let height = height.filter(|v| valid(*v))?;
    Some(Size::new(width, height))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let (record_count, seq) = {
        let snapshot = state.snapshot.read().await;
        (snapshot.records.len(), snapshot.seq)
    };
    let body = render_prometheus_metrics(
        record_count,
        registry().len(),
        seq,
        state.observability.snapshot(),
    );

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(
    record_count: usize,
    region_count: usize,
    seq: u64,
    observability: ObservabilitySnapshot,
) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "# HELP territory_records Records in the current record set."
    );
    let _ = writeln!(body, "# TYPE territory_records gauge");
    let _ = writeln!(body, "territory_records {record_count}");

    let _ = writeln!(body, "# HELP territory_regions Regions in the registry.");
    let _ = writeln!(body, "# TYPE territory_regions gauge");
    let _ = writeln!(body, "territory_regions {region_count}");

    let _ = writeln!(
        body,
        "# HELP territory_snapshot_seq Sequence number of the current snapshot."
    );
    let _ = writeln!(body, "# TYPE territory_snapshot_seq gauge");
    let _ = writeln!(body, "territory_snapshot_seq {seq}");

    let _ = writeln!(
        body,
        "# HELP territory_aggregation_passes_total Aggregation passes run since startup."
    );
    let _ = writeln!(body, "# TYPE territory_aggregation_passes_total counter");
    let _ = writeln!(
        body,
        "territory_aggregation_passes_total {}",
        observability.aggregation_passes_total
    );

    let _ = writeln!(
        body,
        "# HELP territory_ignored_records_total Records that matched no region."
    );
    let _ = writeln!(body, "# TYPE territory_ignored_records_total counter");
    let _ = writeln!(
        body,
        "territory_ignored_records_total {}",
        observability.ignored_records_total
    );

    let _ = writeln!(
        body,
        "# HELP territory_rejected_submissions_total Record submissions rejected as malformed or oversize."
    );
    let _ = writeln!(body, "# TYPE territory_rejected_submissions_total counter");
    let _ = writeln!(
        body,
        "territory_rejected_submissions_total {}",
        observability.rejected_submissions_total
    );

    let _ = writeln!(
        body,
        "# HELP territory_stats_requests_total Requests served by /api/stats."
    );
    let _ = writeln!(body, "# TYPE territory_stats_requests_total counter");
    let _ = writeln!(
        body,
        "territory_stats_requests_total {}",
        observability.stats_requests_total
    );

    body
}

fn records_etag(seq: u64) -> String {
    format!("\"records-{seq}\"")
}

fn json_bytes_response(body: Bytes, cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn not_modified_response(cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn normalize_etag(candidate: &str) -> &str {
    candidate.strip_prefix("W/").unwrap_or(candidate).trim()
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers.get(header::IF_NONE_MATCH) else {
        return false;
    };
    let Ok(raw) = value.to_str() else {
        return false;
    };

    raw.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize_etag(candidate) == normalize_etag(etag)
    })
}
