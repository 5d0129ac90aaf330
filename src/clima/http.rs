// clima - Municipal weather forecasts from AEMET OpenData
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::client::{upstream_url, ClientError, MetadataRequest, DEFAULT_MUNICIPALITY};
use crate::metrics::{Outcome, ProxyMetrics, Resource};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

const JSON_CONTENT_TYPE: &str = "application/json";
const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";
const MISSING_KEY_MESSAGE: &str = "AEMET API key is not configured";

/// Shared state for every request handled by the proxy.
///
/// The API key only ever leaves the process as a query parameter of requests to AEMET.
pub struct RequestContext {
    client: Client,
    api_url: Url,
    api_key: Option<String>,
    registry: Registry,
    metrics: ProxyMetrics,
}

impl RequestContext {
    pub fn new(client: Client, api_url: Url, api_key: Option<String>, registry: Registry, metrics: ProxyMetrics) -> Self {
        // An empty environment variable is as good as a missing one
        let api_key = api_key.filter(|k| !k.is_empty());
        RequestContext {
            client,
            api_url,
            api_key,
            registry,
            metrics,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Query parameters accepted by the proxy endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ProxyParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
}

impl ProxyParams {
    /// `type=maestro` asks for the lookup table, anything else for a forecast.
    pub fn request(&self) -> MetadataRequest {
        if self.kind.as_deref() == Some("maestro") {
            MetadataRequest::Municipalities
        } else {
            let code = self.id.as_deref().unwrap_or(DEFAULT_MUNICIPALITY);
            MetadataRequest::Forecast(code.to_owned())
        }
    }
}

pub fn router(context: Arc<RequestContext>) -> Router {
    Router::new()
        .route("/api/clima", get(forward))
        .route("/metrics", get(text_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

async fn forward(State(context): State<Arc<RequestContext>>, Query(params): Query<ProxyParams>) -> Response {
    let request = params.request();
    let resource = Resource::from(&request);

    let api_key = match context.api_key.as_deref() {
        Some(k) => k,
        None => {
            tracing::error!(message = "refusing to forward request", request = %request, error = MISSING_KEY_MESSAGE);
            context.metrics.request(resource, Outcome::ConfigError);
            return error_response(MISSING_KEY_MESSAGE);
        }
    };

    let start = Instant::now();
    let res = fetch_upstream(&context, &request, api_key).await;
    context.metrics.upstream_duration(start.elapsed());

    match res {
        Ok(body) => {
            tracing::debug!(message = "forwarded upstream response", request = %request, num_bytes = body.len());
            context.metrics.request(resource, Outcome::Success);
            (StatusCode::OK, [(CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response()
        }
        Err(e) => {
            tracing::error!(message = "failed to forward request", request = %request, error = %e);
            context.metrics.request(resource, Outcome::UpstreamError);
            error_response(&e.to_string())
        }
    }
}

/// Fetch the metadata envelope from AEMET, checking that it is JSON but otherwise leaving
/// it untouched.
async fn fetch_upstream(context: &RequestContext, request: &MetadataRequest, api_key: &str) -> Result<Bytes, ClientError> {
    let mut url = upstream_url(&context.api_url, request);
    url.query_pairs_mut().append_pair("api_key", api_key);

    let res = context
        .client
        .get(url)
        .header(ACCEPT, JSON_CONTENT_TYPE)
        .send()
        .await
        .map_err(|e| ClientError::Internal(e.without_url()))?;

    let body = res.bytes().await.map_err(|e| ClientError::Internal(e.without_url()))?;
    serde_json::from_slice::<IgnoredAny>(&body)?;
    Ok(body)
}

fn error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

async fn text_metrics(State(context): State<Arc<RequestContext>>) -> Response {
    let mut buf = String::new();

    match encode(&mut buf, &context.registry) {
        Ok(_) => {
            tracing::debug!(message = "encoded prometheus metrics to text format", num_bytes = buf.len());
            (StatusCode::OK, [(CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], buf).into_response()
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics", error = %e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
