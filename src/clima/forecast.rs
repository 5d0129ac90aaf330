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

use crate::client::ClientError;
use crate::icon::icon_for;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily forecast for a single municipality.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ForecastResponse {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "provincia")]
    pub province: String,
    #[serde(alias = "prediccion")]
    pub prediction: Prediction,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Prediction {
    #[serde(alias = "dia")]
    pub days: Vec<ForecastDay>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ForecastDay {
    #[serde(alias = "fecha")]
    pub date: String,
    #[serde(alias = "temperatura")]
    pub temperature: Temperature,
    #[serde(alias = "estadoCielo")]
    pub sky_states: Vec<SkyState>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Temperature {
    #[serde(alias = "maxima")]
    pub max: f64,
    #[serde(alias = "minima")]
    pub min: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SkyState {
    #[serde(alias = "value")]
    pub code: String,
    #[serde(alias = "descripcion")]
    pub description: String,
    #[serde(alias = "periodo")]
    pub period: Option<String>,
}

/// Everything needed to display today's forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastView {
    pub location: String,
    pub province: String,
    pub date: String,
    pub max: f64,
    pub min: f64,
    pub description: String,
    pub icon: &'static str,
}

impl fmt::Display for ForecastView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}  {} ({})", self.icon, self.location, self.province)?;
        writeln!(f, "    {}°C", self.max)?;
        writeln!(f, "    Min: {}°C | Max: {}°C", self.min, self.max)?;
        writeln!(f, "    {}", self.description)?;
        write!(f, "    {}", self.date)
    }
}

/// Build the view for the first day of a forecast.
pub fn render(forecast: &ForecastResponse) -> Result<ForecastView, ClientError> {
    let today = forecast
        .prediction
        .days
        .first()
        .ok_or(ClientError::MissingField("prediccion.dia"))?;
    let sky = authoritative_sky_state(&today.sky_states).ok_or(ClientError::MissingField("estadoCielo"))?;

    Ok(ForecastView {
        location: forecast.name.clone(),
        province: forecast.province.clone(),
        date: today.date.clone(),
        max: today.temperature.max,
        min: today.temperature.min,
        description: sky.description.clone(),
        icon: icon_for(&sky.code, &sky.description),
    })
}

/// The first sky state with a code, or the first one overall if none has a code.
///
/// AEMET sometimes reports a whole-day entry without a code next to entries for each period.
pub fn authoritative_sky_state(states: &[SkyState]) -> Option<&SkyState> {
    states.iter().find(|s| !s.code.is_empty()).or_else(|| states.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ErrorKind;

    fn forecast(sky: &str) -> ForecastResponse {
        let raw = format!(
            r#"{{
                "origen": {{"productor": "Agencia Estatal de Meteorología - AEMET"}},
                "elaborado": "2024-03-01T10:00:00",
                "nombre": "León",
                "provincia": "León",
                "prediccion": {{
                    "dia": [{{
                        "fecha": "2024-03-01T00:00:00",
                        "temperatura": {{"maxima": 14, "minima": -2, "dato": []}},
                        "estadoCielo": {}
                    }}]
                }},
                "id": 24089
            }}"#,
            sky
        );

        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_render_first_non_empty_code() {
        let f = forecast(
            r#"[{"value":"","descripcion":"Intervalos nubosos","periodo":"00-24"},
                {"value":"12","descripcion":"Poco nuboso","periodo":"12-18"}]"#,
        );
        let view = render(&f).unwrap();

        assert_eq!("León", view.location);
        assert_eq!("Poco nuboso", view.description);
        assert_eq!("🌤️", view.icon);
        assert_eq!(14.0, view.max);
        assert_eq!(-2.0, view.min);
    }

    #[test]
    fn test_render_falls_back_to_first_entry() {
        let f = forecast(
            r#"[{"value":"","descripcion":"Cielo cubierto","periodo":"00-24"},
                {"value":"","descripcion":"Despejado","periodo":"12-24"}]"#,
        );
        let view = render(&f).unwrap();

        assert_eq!("Cielo cubierto", view.description);
        assert_eq!("☁️", view.icon);
    }

    #[test]
    fn test_render_period_optional() {
        let f = forecast(r#"[{"value":"11n","descripcion":"Despejado noche"}]"#);
        let view = render(&f).unwrap();

        assert_eq!("🌙", view.icon);
    }

    #[test]
    fn test_render_no_sky_states() {
        let err = render(&forecast("[]")).unwrap_err();
        assert_eq!(ErrorKind::Parse, err.kind());
    }

    #[test]
    fn test_render_no_days() {
        let mut f = forecast("[]");
        f.prediction.days.clear();

        let err = render(&f).unwrap_err();
        assert!(matches!(err, ClientError::MissingField("prediccion.dia")));
    }

    #[test]
    fn test_display() {
        let f = forecast(r#"[{"value":"11","descripcion":"Despejado","periodo":"00-24"}]"#);
        let out = render(&f).unwrap().to_string();

        assert!(out.contains("León (León)"), "{}", out);
        assert!(out.contains("Min: -2°C | Max: 14°C"), "{}", out);
        assert!(out.contains("Despejado"), "{}", out);
    }
}
