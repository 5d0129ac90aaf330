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

//! The `clima` binary run end to end against a mock proxy.

use serde_json::json;
use std::process::Stdio;
use tokio::process::Command;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// "Málaga" as ISO-8859-15 bytes
const FORECAST: &[u8] = b"[{\"nombre\":\"M\xe1laga\",\"provincia\":\"M\xe1laga\",\"prediccion\":{\"dia\":[\
{\"fecha\":\"2024-03-01T00:00:00\",\"temperatura\":{\"maxima\":21,\"minima\":11},\
\"estadoCielo\":[{\"value\":\"11\",\"descripcion\":\"Despejado\",\"periodo\":\"00-24\"}]}]}}]";

#[tokio::test]
async fn test_default_forecast_printed_when_input_closed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/clima"))
        .and(query_param("id", "29067"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "descripcion": "exito",
            "estado": 200,
            "datos": format!("{}/sh/forecast", server.uri()),
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sh/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FORECAST.to_vec(), "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let output = Command::new(env!("CARGO_BIN_EXE_clima"))
        .arg("--proxy-url")
        .arg(format!("{}/api/clima", server.uri()))
        .stdin(Stdio::null())
        .output()
        .await
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "exit status {}", output.status);
    assert!(stdout.contains("Málaga"), "stdout was {:?}", stdout);
    assert!(stdout.contains("Min: 11°C | Max: 21°C"), "stdout was {:?}", stdout);
}
