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

use crate::client::MetadataRequest;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::time::Duration;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Resource {
    Municipalities,
    Forecast,
}

impl From<&MetadataRequest> for Resource {
    fn from(req: &MetadataRequest) -> Self {
        match req {
            MetadataRequest::Municipalities => Resource::Municipalities,
            MetadataRequest::Forecast(_) => Resource::Forecast,
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Outcome {
    Success,
    ConfigError,
    UpstreamError,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct RequestLabels {
    resource: Resource,
    outcome: Outcome,
}

/// Holder for metrics about requests forwarded by the proxy.
///
/// All metrics are created and registered upon call to `ProxyMetrics::new()`. The request
/// counter is labeled by the upstream resource requested and how the request ended.
#[derive(Debug, Clone)]
pub struct ProxyMetrics {
    requests: Family<RequestLabels, Counter>,
    upstream_duration: Histogram,
}

impl ProxyMetrics {
    pub fn new(reg: &mut Registry) -> Self {
        let requests = Family::<RequestLabels, Counter>::default();
        let upstream_duration = Histogram::new(exponential_buckets(0.05, 2.0, 10));

        reg.register(
            "clima_proxy_requests",
            "Requests forwarded to AEMET by resource and outcome",
            requests.clone(),
        );
        reg.register(
            "clima_proxy_upstream_duration_seconds",
            "Time spent waiting for AEMET to respond, in seconds",
            upstream_duration.clone(),
        );

        Self {
            requests,
            upstream_duration,
        }
    }

    pub fn request(&self, resource: Resource, outcome: Outcome) {
        self.requests.get_or_create(&RequestLabels { resource, outcome }).inc();
    }

    pub fn upstream_duration(&self, elapsed: Duration) {
        self.upstream_duration.observe(elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus_client::encoding::text::encode;

    #[test]
    fn test_request_counter() {
        let mut registry = Registry::default();
        let metrics = ProxyMetrics::new(&mut registry);
        metrics.request(Resource::Forecast, Outcome::Success);
        metrics.request(Resource::Forecast, Outcome::Success);
        metrics.request(Resource::Municipalities, Outcome::ConfigError);

        let mut buf = String::new();
        encode(&mut buf, &registry).unwrap();

        assert!(
            buf.contains(r#"clima_proxy_requests_total{resource="Forecast",outcome="Success"} 2"#),
            "{}",
            buf
        );
        assert!(
            buf.contains(r#"clima_proxy_requests_total{resource="Municipalities",outcome="ConfigError"} 1"#),
            "{}",
            buf
        );
    }

    #[test]
    fn test_upstream_duration() {
        let mut registry = Registry::default();
        let metrics = ProxyMetrics::new(&mut registry);
        metrics.upstream_duration(Duration::from_millis(120));

        let mut buf = String::new();
        encode(&mut buf, &registry).unwrap();

        assert!(buf.contains("clima_proxy_upstream_duration_seconds_count 1"), "{}", buf);
    }
}
