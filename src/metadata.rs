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

//! Chapter metadata documents.
//!
//! A chapter id resolves to a chapter URL through the location API. The
//! chapter URL holds `configuration_pack.json`, which lists the pages and,
//! keyed by page path, the page layout (including the content area).

use std::collections::HashMap;

use anyhow::{Context, Error};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::pattern::Pattern;
use crate::tiles::Rect;

pub const DEFAULT_LOCATION_API: &str = "http://api.comic-earthstar.jp/c.php?cid=";
pub const CONFIGURATION_FILE: &str = "configuration_pack.json";

/// Response of the location API.
#[derive(Clone, Debug, Deserialize)]
pub struct ChapterLocation {
    pub url: String,
}

impl ChapterLocation {
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes).context("parsing chapter location")
    }

    /// Chapter URL, always ending in `/`.
    pub fn base_url(&self) -> String {
        if self.url.ends_with('/') {
            self.url.clone()
        } else {
            format!("{}/", self.url)
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConfigurationPack {
    pub configuration: Configuration,
    /// Per-page sections, keyed by page path.
    #[serde(flatten)]
    pub sections: HashMap<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Configuration {
    pub contents: Vec<ContentEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ContentEntry {
    pub file: String,
    #[serde(default)]
    pub index: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PageSection {
    file_link_info: FileLinkInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FileLinkInfo {
    page_link_info_list: Vec<PageLinkInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PageLinkInfo {
    page: PageLayout,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PageLayout {
    content_area: Option<ContentArea>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContentArea {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

/// Everything needed to fetch and restore one page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageInfo {
    /// Output file stem.
    pub name: String,
    /// Scrambled image location.
    pub url: String,
    pub pattern: Pattern,
    /// Published content area, if the chapter has one for this page.
    pub content_area: Option<Rect>,
}

impl PageInfo {
    /// Derives a page from its path inside the chapter.
    pub fn new(chapter_url: &str, path: &str, content_area: Option<Rect>) -> Self {
        let file = path.rsplit('/').next().unwrap_or(path);
        let name = match file.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => file,
        };
        Self {
            name: name.to_owned(),
            url: format!("{chapter_url}{path}/0.jpeg"),
            pattern: Pattern::from_key(&format!("{path}/0")),
            content_area,
        }
    }
}

impl ConfigurationPack {
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes).context("parsing chapter configuration")
    }

    /// Content area of a page, if its section has a usable one.
    pub fn content_area(&self, path: &str) -> Option<Rect> {
        let section = self.sections.get(path)?;
        let section = match PageSection::deserialize(section) {
            Ok(s) => s,
            Err(e) => {
                debug!("no layout for {path}: {e}");
                return None;
            }
        };
        let area = section
            .file_link_info
            .page_link_info_list
            .into_iter()
            .next()?
            .page
            .content_area?;
        Some(Rect::new(area.x, area.y, area.width, area.height))
    }

    /// All pages in document order.
    pub fn pages(&self, chapter_url: &str) -> Vec<PageInfo> {
        self.configuration
            .contents
            .iter()
            .map(|entry| PageInfo::new(chapter_url, &entry.file, self.content_area(&entry.file)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://cdn.example/chapter/";

    const PACK: &str = r#"{
        "configuration": {
            "contents": [
                {"file": "item/xhtml/p-cover.xhtml", "index": 0},
                {"file": "item/xhtml/p-001.xhtml", "index": 1},
                {"file": "item/xhtml/p-002.xhtml", "index": 2}
            ]
        },
        "item/xhtml/p-cover.xhtml": {
            "FileLinkInfo": {
                "PageCount": 1,
                "PageLinkInfoList": [{
                    "Page": {
                        "No": 0,
                        "Size": {"Width": 1060, "Height": 1500},
                        "ContentArea": {"X": 4, "Y": 0, "Width": 1052, "Height": 1500}
                    }
                }]
            }
        },
        "item/xhtml/p-001.xhtml": {"FileLinkInfo": {"PageLinkInfoList": []}},
        "item/xhtml/p-002.xhtml": "unexpected"
    }"#;

    #[test]
    fn location_base_url_gets_slash() {
        let loc = ChapterLocation::parse(br#"{"url": "https://cdn.example/chapter"}"#).unwrap();
        assert_eq!(loc.base_url(), BASE);
        let loc = ChapterLocation::parse(br#"{"url": "https://cdn.example/chapter/"}"#).unwrap();
        assert_eq!(loc.base_url(), BASE);
        assert!(ChapterLocation::parse(b"{}").is_err());
    }

    #[test]
    fn page_info_from_path() {
        let page = PageInfo::new(BASE, "item/xhtml/p-001.xhtml", None);
        assert_eq!(page.name, "p-001");
        assert_eq!(
            page.url,
            "https://cdn.example/chapter/item/xhtml/p-001.xhtml/0.jpeg"
        );
        assert_eq!(page.pattern, Pattern::from_key("item/xhtml/p-001.xhtml/0"));

        assert_eq!(PageInfo::new(BASE, "plain", None).name, "plain");
    }

    #[test]
    fn pages_keep_document_order() {
        let pack = ConfigurationPack::parse(PACK.as_bytes()).unwrap();
        let pages = pack.pages(BASE);
        let names: Vec<_> = pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["p-cover", "p-001", "p-002"]);
        assert_eq!(pack.configuration.contents[2].index, Some(2));
    }

    #[test]
    fn content_area_when_present() {
        let pack = ConfigurationPack::parse(PACK.as_bytes()).unwrap();
        let pages = pack.pages(BASE);
        assert_eq!(pages[0].content_area, Some(Rect::new(4, 0, 1052, 1500)));
        assert_eq!(pages[1].content_area, None);
        assert_eq!(pages[2].content_area, None);
        assert_eq!(pack.content_area("item/xhtml/missing.xhtml"), None);
    }

    #[test]
    fn missing_contents_is_an_error() {
        assert!(ConfigurationPack::parse(br#"{"configuration": {}}"#).is_err());
        assert!(ConfigurationPack::parse(b"not json").is_err());
    }
}
