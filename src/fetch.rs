// Copyright (C) 2023 Dheatly23
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
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::time::Duration;

use anyhow::{Context, Error};
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::metadata::{ChapterLocation, ConfigurationPack, CONFIGURATION_FILE};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP access to the chapter host. Shared by all page workers.
pub struct Fetcher {
    client: Client,
    location_api: String,
}

impl Fetcher {
    pub fn new(location_api: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, location_api))
    }

    pub fn with_client(client: Client, location_api: impl Into<String>) -> Self {
        Self {
            client,
            location_api: location_api.into(),
        }
    }

    pub fn get(&self, url: &str) -> Result<Vec<u8>, Error> {
        debug!("GET {url}");
        let bytes = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .with_context(|| format!("fetching {url}"))?;
        Ok(bytes.to_vec())
    }

    /// Resolves a chapter id to its base URL (ending in `/`).
    pub fn chapter_url(&self, cid: &str) -> Result<String, Error> {
        let url = format!("{}{cid}", self.location_api);
        let location = ChapterLocation::parse(&self.get(&url)?)?;
        let base = location.base_url();
        info!("Chapter URL: {base}");
        Ok(base)
    }

    pub fn configuration(&self, chapter_url: &str) -> Result<ConfigurationPack, Error> {
        let url = format!("{chapter_url}{CONFIGURATION_FILE}");
        ConfigurationPack::parse(&self.get(&url)?).with_context(|| format!("reading {url}"))
    }
}
