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

use clap::Parser;
use clima::client::{AemetClient, ClientError, Upstream, DEFAULT_API_URL, DEFAULT_MUNICIPALITY, DEFAULT_PROXY_URL};
use clima::forecast::render;
use clima::municipality::{Municipality, MunicipalityIndex};
use clima::session::{Event, SearchSession};
use reqwest::Client;
use std::error::Error;
use std::io;
use std::process;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{Instrument, Level};

const DEFAULT_LOG_LEVEL: Level = Level::WARN;

static UNLOADED: MunicipalityIndex = MunicipalityIndex::empty();

#[derive(Debug, Parser)]
#[clap(name = "clima", version = clap::crate_version!())]
struct ClimaApplication {
    /// Call the AEMET API directly with --api-key instead of going through a clima-proxy
    #[clap(long)]
    direct: bool,

    /// AEMET OpenData API key, only used with --direct
    #[clap(long, env = "AEMET_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL for the AEMET OpenData API, only used with --direct
    #[clap(long, default_value_t = DEFAULT_API_URL.into())]
    api_url: String,

    /// URL of the clima-proxy endpoint
    #[clap(long, default_value_t = DEFAULT_PROXY_URL.into())]
    proxy_url: String,

    /// Municipality code to show the forecast for at startup
    #[clap(long, default_value_t = DEFAULT_MUNICIPALITY.into())]
    default_code: String,

    /// Timeout for each request, in milliseconds. By default, requests never time out.
    #[clap(long)]
    timeout_millis: Option<u64>,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = ClimaApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .with_writer(io::stderr)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let upstream = match (opts.direct, opts.api_key.as_deref()) {
        (true, Some(key)) => Upstream::direct(&opts.api_url, key),
        (true, None) => Err(ClientError::Config("--direct requires an AEMET API key".to_owned())),
        (false, _) => Upstream::proxy(&opts.proxy_url),
    };

    let upstream = upstream.unwrap_or_else(|e| {
        tracing::error!(message = "invalid configuration", error = %e);
        process::exit(1)
    });

    let mut builder = Client::builder();
    if let Some(millis) = opts.timeout_millis {
        builder = builder.timeout(Duration::from_millis(millis));
    }

    let http_client = builder.build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    tracing::debug!(message = "resolved upstream", upstream = ?upstream);
    let client = Arc::new(AemetClient::new(http_client, upstream));
    let index = Arc::new(OnceLock::new());

    // The lookup table and the default forecast are fetched at the same time. Searching
    // before the table arrives just finds nothing.
    {
        let client = client.clone();
        let index = index.clone();
        tokio::spawn(
            async move {
                let loaded = MunicipalityIndex::load_or_empty(&client).await;
                let _ = index.set(loaded);
            }
            .instrument(tracing::span!(Level::DEBUG, "aemet_municipalities")),
        );
    }

    let mut forecasts = JoinSet::new();
    spawn_forecast(&mut forecasts, client.clone(), opts.default_code.clone());

    let mut session = SearchSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let loaded = index.get().unwrap_or(&UNLOADED);
        match session.line(loaded, &line) {
            Event::Select(m) => {
                println!("> {}", m.name);
                spawn_forecast(&mut forecasts, client.clone(), m.code);
            }
            Event::NoSuggestion(position) => {
                tracing::warn!(message = "no suggestion with that number", position = position)
            }
            Event::Dismissed => {}
            Event::Suggestions(suggestions) => print_suggestions(suggestions),
        }
    }

    // Input is closed but forecasts already asked for still get shown
    while forecasts.join_next().await.is_some() {}

    Ok(())
}

/// Fetch and print a forecast in the background.
///
/// Fetches are never cancelled. When several are in flight, whichever finishes last is the
/// one left on screen.
fn spawn_forecast(forecasts: &mut JoinSet<()>, client: Arc<AemetClient>, code: String) {
    forecasts.spawn(async move {
        let res = client
            .forecast(&code)
            .instrument(tracing::span!(Level::DEBUG, "aemet_forecast", code = %code))
            .await
            .and_then(|f| render(&f));

        match res {
            Ok(view) => println!("\n{}\n", view),
            Err(e) => tracing::error!(message = "failed to fetch forecast", code = %code, error = %e),
        }
    });
}

fn print_suggestions(suggestions: &[Municipality]) {
    for (i, m) in suggestions.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, m.name);
    }
}
