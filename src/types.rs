use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Translation {
    #[default]
    Sub,
    Dub,
}

impl Translation {
    pub fn as_str(self) -> &'static str {
        match self {
            Translation::Sub => "sub",
            Translation::Dub => "dub",
        }
    }
}

/// Which attribute a title is read from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TitleLang {
    #[default]
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "data-jp")]
    Japanese,
}

impl TitleLang {
    pub fn as_str(self) -> &'static str {
        match self {
            TitleLang::Title => "title",
            TitleLang::Japanese => "data-jp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub name: String,
    pub link: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub list: Vec<ListItem>,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    Ongoing,
    Completed,
    NotYetAired,
    #[default]
    Unknown,
}

impl Status {
    /// Numeric code understood by the host.
    pub fn code(self) -> u8 {
        match self {
            Status::Ongoing => 0,
            Status::Completed => 1,
            Status::NotYetAired => 4,
            Status::Unknown => 5,
        }
    }

    /// Maps free status text from a detail page. Matching is exact after
    /// trimming and lower-casing.
    pub fn from_text(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "ongoing" | "airing" | "releasing" => Status::Ongoing,
            "completed" | "finished" => Status::Completed,
            "not yet aired" => Status::NotYetAired,
            _ => Status::Unknown,
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRef {
    pub name: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    pub name: String,
    pub image_url: String,
    pub link: String,
    pub description: String,
    pub genre: Vec<String>,
    pub status: Status,
    pub chapters: Vec<EpisodeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamCandidate {
    pub url: String,
    pub original_url: String,
    pub quality: String,
    pub headers: HashMap<String, String>,
}

impl StreamCandidate {
    pub fn new(url: String, quality: impl Into<String>, headers: &HashMap<String, String>) -> Self {
        Self {
            original_url: url.clone(),
            url,
            quality: quality.into(),
            headers: headers.clone(),
        }
    }

    pub fn label(&self) -> String {
        let kind = if self.url.contains(".m3u8") {
            "HLS"
        } else if self.url.contains(".mp4") {
            "MP4"
        } else {
            "embed"
        };
        format!("{} ({}) {}", self.quality, kind, self.url)
    }
}
