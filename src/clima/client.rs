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

use crate::forecast::ForecastResponse;
use crate::municipality::MunicipalityRecord;
use encoding_rs::ISO_8859_15;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://opendata.aemet.es/opendata/api/";
pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000/api/clima";

/// Municipality whose forecast is shown before anything has been searched for (Málaga).
pub const DEFAULT_MUNICIPALITY: &str = "29067";

/// Coarse classification of a `ClientError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Fetch,
    Decode,
    Parse,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Internal(reqwest::Error),
    #[error("unexpected status {0} for {1}")]
    Unexpected(StatusCode, Url),
    #[error("request rejected by upstream with estado {0}: {1}")]
    Rejected(u16, String),
    #[error("unable to decode ISO-8859-15 payload from {0}")]
    Decode(Url),
    #[error("malformed payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("invalid data URL {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Internal(_) | Self::Unexpected(_, _) | Self::Rejected(_, _) => ErrorKind::Fetch,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Parse(_) | Self::MissingField(_) | Self::InvalidUrl(_) => ErrorKind::Parse,
        }
    }
}

/// Resource to fetch the metadata envelope for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataRequest {
    /// The full municipality lookup table ("maestro").
    Municipalities,
    /// Daily forecast for a municipality code, e.g. `28079`.
    Forecast(String),
}

impl fmt::Display for MetadataRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Municipalities => write!(f, "municipalities"),
            Self::Forecast(code) => write!(f, "forecast {}", code),
        }
    }
}

/// Where the first hop of a fetch goes.
///
/// `Direct` talks to the AEMET API and sends the API key along with each request. `Proxy`
/// talks to a `clima-proxy` instance that holds the key on the server side. The second hop
/// always goes straight to the data URL from the envelope in both cases.
#[derive(Clone)]
pub enum Upstream {
    Direct { api_url: Url, api_key: String },
    Proxy { proxy_url: Url },
}

impl Upstream {
    pub fn direct(api_url: &str, api_key: &str) -> Result<Self, ClientError> {
        if api_key.is_empty() {
            return Err(ClientError::Config("AEMET API key is empty".to_owned()));
        }

        Ok(Self::Direct {
            api_url: parse_base_url(api_url)?,
            api_key: api_key.to_owned(),
        })
    }

    pub fn proxy(proxy_url: &str) -> Result<Self, ClientError> {
        Ok(Self::Proxy {
            proxy_url: parse_base_url(proxy_url)?,
        })
    }

    fn metadata_url(&self, req: &MetadataRequest) -> Url {
        match self {
            Self::Direct { api_url, api_key } => {
                let mut url = upstream_url(api_url, req);
                url.query_pairs_mut().append_pair("api_key", api_key);
                url
            }
            Self::Proxy { proxy_url } => {
                let mut url = proxy_url.clone();
                {
                    let mut query = url.query_pairs_mut();
                    match req {
                        MetadataRequest::Municipalities => query.append_pair("type", "maestro"),
                        MetadataRequest::Forecast(code) => query.append_pair("id", code),
                    };
                }
                url
            }
        }
    }
}

// Never print the API key
impl fmt::Debug for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { api_url, .. } => f
                .debug_struct("Direct")
                .field("api_url", &api_url.as_str())
                .field("api_key", &"<redacted>")
                .finish(),
            Self::Proxy { proxy_url } => f.debug_struct("Proxy").field("proxy_url", &proxy_url.as_str()).finish(),
        }
    }
}

/// Parse a base URL that paths or query parameters will be added to.
pub fn parse_base_url(url: &str) -> Result<Url, ClientError> {
    let parsed = Url::parse(url).map_err(|e| ClientError::Config(format!("invalid URL {}: {}", url, e)))?;
    if parsed.cannot_be_a_base() {
        return Err(ClientError::Config(format!("invalid base URL {}", url)));
    }

    Ok(parsed)
}

/// Build the AEMET metadata URL for a request, without any credentials.
pub fn upstream_url(api_url: &Url, req: &MetadataRequest) -> Url {
    let mut url = api_url.clone();
    if let Ok(mut p) = url.path_segments_mut() {
        p.pop_if_empty();
        match req {
            MetadataRequest::Municipalities => {
                p.extend(["maestro", "municipios"]);
            }
            MetadataRequest::Forecast(code) => {
                p.extend(["prediccion", "especifica", "municipio", "diaria", code.as_str()]);
            }
        }
    }

    url
}

/// Decode a payload served by AEMET. Data URLs serve ISO-8859-15 rather than UTF-8.
///
/// Every byte has a mapping in ISO-8859-15, so this never returns `None` in practice.
pub fn decode_payload(bytes: &[u8]) -> Option<Cow<'_, str>> {
    ISO_8859_15.decode_without_bom_handling_and_without_replacement(bytes)
}

/// First hop response: points at the actual payload instead of containing it.
#[derive(Serialize, Deserialize, Debug)]
pub struct Envelope {
    #[serde(alias = "descripcion")]
    pub description: Option<String>,
    #[serde(alias = "estado")]
    pub status: Option<u16>,
    #[serde(alias = "datos")]
    pub data_url: Option<String>,
    #[serde(alias = "metadatos")]
    pub metadata_url: Option<String>,
}

impl Envelope {
    /// Return the data URL, failing if the upstream reported an error or left it out.
    pub fn data_url(&self) -> Result<Url, ClientError> {
        if let Some(status) = self.status {
            if !(200..300).contains(&status) {
                let description = self.description.clone().unwrap_or_default();
                return Err(ClientError::Rejected(status, description));
            }
        }

        let raw = self.data_url.as_deref().ok_or(ClientError::MissingField("datos"))?;
        Url::parse(raw).map_err(|_| ClientError::InvalidUrl(raw.to_owned()))
    }
}

#[derive(Debug)]
pub struct AemetClient {
    client: Client,
    upstream: Upstream,
}

impl AemetClient {
    const USER_AGENT: &'static str = concat!("clima/", env!("CARGO_PKG_VERSION"));
    const JSON_RESPONSE: &'static str = "application/json";

    pub fn new(client: Client, upstream: Upstream) -> Self {
        AemetClient { client, upstream }
    }

    pub async fn municipalities(&self) -> Result<Vec<MunicipalityRecord>, ClientError> {
        self.resolve(&MetadataRequest::Municipalities).await
    }

    /// Fetch the forecast for a municipality. Only the first location of the payload is kept.
    pub async fn forecast(&self, code: &str) -> Result<ForecastResponse, ClientError> {
        let forecasts: Vec<ForecastResponse> = self.resolve(&MetadataRequest::Forecast(code.to_owned())).await?;
        forecasts.into_iter().next().ok_or(ClientError::MissingField("prediccion"))
    }

    /// Fetch the envelope for `req`, follow its data URL, and parse the decoded payload.
    pub async fn resolve<T: DeserializeOwned>(&self, req: &MetadataRequest) -> Result<T, ClientError> {
        let metadata_url = self.upstream.metadata_url(req);
        tracing::debug!(message = "making metadata request", request = %req);

        let res = self.make_request(metadata_url).await?;
        let body = res.bytes().await.map_err(|e| ClientError::Internal(e.without_url()))?;
        let envelope: Envelope = serde_json::from_slice(&body)?;
        let data_url = envelope.data_url()?;
        tracing::debug!(message = "following data URL", request = %req, url = %data_url);

        let res = self.make_request(data_url.clone()).await?;
        let bytes = res.bytes().await.map_err(ClientError::Internal)?;
        let text = decode_payload(&bytes).ok_or(ClientError::Decode(data_url))?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn make_request(&self, url: Url) -> Result<Response, ClientError> {
        let res = self
            .client
            .get(url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::JSON_RESPONSE)
            .send()
            .await
            .map_err(|e| ClientError::Internal(e.without_url()))?;

        let status = res.status();
        if status.is_success() {
            Ok(res)
        } else {
            Err(ClientError::Unexpected(status, without_query(url)))
        }
    }
}

// Metadata URLs can carry the API key as a query parameter.
fn without_query(mut url: Url) -> Url {
    url.set_query(None);
    url
}
