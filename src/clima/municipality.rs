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

use crate::client::{AemetClient, ClientError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// AEMET entity IDs look like "id28079" while forecasts are requested with "28079"
const CODE_PREFIX: &str = "id";

/// Raw entry of the AEMET municipality lookup table. Fields other than these are ignored.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MunicipalityRecord {
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Municipality {
    pub name: String,
    pub code: String,
}

impl From<MunicipalityRecord> for Municipality {
    fn from(record: MunicipalityRecord) -> Self {
        Municipality {
            code: municipality_code(&record.id).to_owned(),
            name: record.name,
        }
    }
}

/// Strip the fixed `id` prefix from an AEMET entity ID. IDs without it are returned as-is.
pub fn municipality_code(id: &str) -> &str {
    id.strip_prefix(CODE_PREFIX).unwrap_or(id)
}

/// Every known municipality, in the order the lookup table lists them.
///
/// The index is built once and never modified afterwards. A failed load results in an
/// empty index that is not marked as loaded, which makes every search come back empty.
#[derive(Debug, Default)]
pub struct MunicipalityIndex {
    entries: Vec<Municipality>,
    loaded: bool,
}

impl MunicipalityIndex {
    pub const fn empty() -> Self {
        MunicipalityIndex {
            entries: Vec::new(),
            loaded: false,
        }
    }

    /// Build an index from lookup table records, keeping the first entry for any repeated code.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = MunicipalityRecord>,
    {
        let mut seen = HashSet::new();
        let entries = records
            .into_iter()
            .map(Municipality::from)
            .filter(|m| seen.insert(m.code.clone()))
            .collect();

        MunicipalityIndex { entries, loaded: true }
    }

    pub async fn load(client: &AemetClient) -> Result<Self, ClientError> {
        let records = client.municipalities().await?;
        Ok(Self::from_records(records))
    }

    pub async fn load_or_empty(client: &AemetClient) -> Self {
        match Self::load(client).await {
            Ok(index) => {
                tracing::info!(message = "loaded municipalities", count = index.len());
                index
            }
            Err(e) => {
                tracing::error!(message = "failed to load municipalities", error = %e);
                Self::empty()
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Municipality> {
        self.entries.iter()
    }

    pub fn get(&self, code: &str) -> Option<&Municipality> {
        self.entries.iter().find(|m| m.code == code)
    }
}
