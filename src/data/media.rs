/// Metadata for whatever the device is currently playing
use std::fmt;
use serde::{Serialize, Deserialize};
use strum_macros::{Display, EnumString};

/// Kind of content reported by the now-playing notifications
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaType {
    /// Stored music (local library, streaming services)
    Music,
    /// Internet radio station
    Radio,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MediaInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>, // in seconds

    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>, // in seconds

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl fmt::Display for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut display_str = self.title.as_deref().unwrap_or("Unknown Title").to_string();
        if let Some(artist_name) = &self.artist {
            if !artist_name.is_empty() {
                display_str.push_str(" by ");
                display_str.push_str(artist_name);
            }
        }
        if let Some(album_name) = &self.album {
            if !album_name.is_empty() {
                display_str.push_str(&format!(" (Album: {})", album_name));
            }
        }
        write!(f, "{}", display_str)
    }
}
