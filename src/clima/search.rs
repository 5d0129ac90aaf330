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

use crate::municipality::{Municipality, MunicipalityIndex};

/// Queries shorter than this (after trimming) never match anything.
pub const MIN_QUERY_CHARS: usize = 3;

/// Maximum number of suggestions returned for a query.
pub const MAX_RESULTS: usize = 10;

/// Find municipalities whose name contains `query`, ignoring case.
///
/// Results are in index order (not ranked by relevance) and capped at `MAX_RESULTS`.
pub fn search<'a>(index: &'a MunicipalityIndex, query: &str) -> Vec<&'a Municipality> {
    let query = query.trim().to_lowercase();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }

    index
        .iter()
        .filter(|m| m.name.to_lowercase().contains(&query))
        .take(MAX_RESULTS)
        .collect()
}
