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

//! Municipal weather forecasts from AEMET OpenData
//!
//! ## Features
//!
//! `clima` fetches today's forecast for any Spanish municipality from the [AEMET OpenData] API
//! and lets you search for municipalities by name. It is made of two programs:
//!
//! * `clima-proxy` - A small HTTP server that forwards requests to AEMET, adding an API key
//!   that stays on the server.
//! * `clima` - An interactive terminal program. Type part of a municipality name to get a
//!   list of suggestions, then type the number of a suggestion to see its forecast.
//!
//! [AEMET OpenData]: https://opendata.aemet.es/
//!
//! ### How AEMET responses work
//!
//! AEMET never returns data directly. Every request returns a small JSON envelope with a
//! `datos` field pointing at a short-lived URL, and *that* URL serves the actual payload.
//! The payload is encoded as ISO-8859-15, not UTF-8, so it has to be decoded before it is
//! parsed or accented names like "León" come out mangled. [`client::AemetClient`] takes care
//! of both steps. Only the first request is sent through the proxy; the data URL is fetched
//! directly since it is signed and temporary.
//!
//! ## Build
//!
//! ```text
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! ### API key
//!
//! Request an API key from AEMET at <https://opendata.aemet.es/centrodedescargas/altaUsuario>.
//! Both programs read it from the `AEMET_API_KEY` environment variable or the `--api-key` flag.
//!
//! ### Proxy
//!
//! ```text
//! AEMET_API_KEY=... ./clima-proxy --bind 127.0.0.1:3000
//! ```
//!
//! The proxy answers `GET /api/clima?type=maestro` with the envelope for the municipality
//! lookup table, and `GET /api/clima?id=28079` with the envelope for a forecast (the ID
//! defaults to `29067`, Málaga). Prometheus metrics are exposed at `/metrics`.
//!
//! ### Terminal
//!
//! ```text
//! ./clima --proxy-url http://127.0.0.1:3000/api/clima
//! ```
//!
//! Or, skipping the proxy entirely:
//!
//! ```text
//! AEMET_API_KEY=... ./clima --direct
//! ```
//!

pub mod client;
pub mod forecast;
pub mod http;
pub mod icon;
pub mod metrics;
pub mod municipality;
pub mod search;
pub mod session;
