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

pub const SUN: &str = "☀️";
pub const CLOUD: &str = "☁️";
pub const RAIN: &str = "🌧️";
pub const STORM: &str = "⛈️";
pub const DEFAULT: &str = "🌈";

/// Pick a glyph for a sky state.
///
/// Known AEMET sky state codes (including `n` suffixed night variants) are mapped directly.
/// Anything else falls back to keywords in the description, checked in a fixed order so that
/// the first match wins. Unrecognized input gets `DEFAULT`.
pub fn icon_for(code: &str, description: &str) -> &'static str {
    if let Some(icon) = icon_for_code(code.trim()) {
        return icon;
    }

    let description = description.to_lowercase();
    if description.contains("despejado") {
        SUN
    } else if description.contains("cubierto") || description.contains("nubes") {
        CLOUD
    } else if description.contains("lluvia") {
        RAIN
    } else if description.contains("tormenta") {
        STORM
    } else {
        DEFAULT
    }
}

fn icon_for_code(code: &str) -> Option<&'static str> {
    let icon = match code {
        "11" => SUN,
        "11n" => "🌙",
        "12" => "🌤️",
        "13" => "⛅",
        "14" | "15" | "16" | "22" => CLOUD,
        "16n" => "🌙",
        "17" => "🌤️",
        "23" | "43" => "🌦️",
        "24" | "25" | "26" | "44" | "45" | "46" => RAIN,
        "51" => "🌩️",
        "52" => STORM,
        "71" => "🌨️",
        "81" | "82" => "🌫️",
        _ => return None,
    };

    Some(icon)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[(&str, &str)] = &[
        ("11", "☀️"),
        ("11n", "🌙"),
        ("12", "🌤️"),
        ("13", "⛅"),
        ("14", "☁️"),
        ("15", "☁️"),
        ("16", "☁️"),
        ("16n", "🌙"),
        ("17", "🌤️"),
        ("22", "☁️"),
        ("23", "🌦️"),
        ("24", "🌧️"),
        ("25", "🌧️"),
        ("26", "🌧️"),
        ("43", "🌦️"),
        ("44", "🌧️"),
        ("45", "🌧️"),
        ("46", "🌧️"),
        ("51", "🌩️"),
        ("52", "⛈️"),
        ("71", "🌨️"),
        ("81", "🌫️"),
        ("82", "🌫️"),
    ];

    #[test]
    fn test_code_wins_over_description() {
        for (code, icon) in TABLE {
            for description in ["", "Despejado", "Tormenta con lluvia", "cubierto"] {
                assert_eq!(*icon, icon_for(code, description), "code {} / {:?}", code, description);
            }
        }
    }

    #[test]
    fn test_code_is_trimmed() {
        assert_eq!("🌙", icon_for(" 11n ", ""));
    }

    #[test]
    fn test_keyword_fallback() {
        assert_eq!(SUN, icon_for("", "Despejado"));
        assert_eq!(CLOUD, icon_for("", "cielo cubierto con algo de nubes"));
        assert_eq!(CLOUD, icon_for("", "Nubes altas"));
        assert_eq!(RAIN, icon_for("", "Lluvia escasa"));
        assert_eq!(STORM, icon_for("", "TORMENTA"));
    }

    #[test]
    fn test_keyword_order() {
        assert_eq!(CLOUD, icon_for("", "nubes con lluvia"));
        assert_eq!(RAIN, icon_for("", "lluvia y tormenta"));
        assert_eq!(SUN, icon_for("", "despejado, luego cubierto"));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(DEFAULT, icon_for("999", ""));
        assert_eq!(DEFAULT, icon_for("", ""));
        assert_eq!(DEFAULT, icon_for("11 n", "niebla"));
    }
}
