//! Asset records stored in the static-asset cache.

use serde::{Deserialize, Serialize};

use crate::cache::current_timestamp_ms;

// == Media Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Font,
    Script,
    Style,
    Other,
}

impl MediaKind {
    /// Infers the kind from the URL's file extension, ignoring query and fragment.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
        let file = path.rsplit('/').next().unwrap_or(path);
        let extension = match file.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return MediaKind::Other,
        };

        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "svg" | "webp" | "avif" => MediaKind::Image,
            "woff" | "woff2" | "ttf" | "eot" => MediaKind::Font,
            "js" => MediaKind::Script,
            "css" => MediaKind::Style,
            _ => MediaKind::Other,
        }
    }
}

// == Asset Record ==
/// A fetched binary asset. Overwritten on refresh, dropped with its cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub url: String,
    pub media_kind: MediaKind,
    #[serde(with = "crate::cache::serde_hex")]
    pub payload: Vec<u8>,
    pub size_bytes: u64,
    /// Unix milliseconds
    pub cached_at: u64,
}

impl AssetRecord {
    pub fn new(url: impl Into<String>, payload: Vec<u8>) -> Self {
        let url = url.into();
        Self {
            media_kind: MediaKind::from_url(&url),
            size_bytes: payload.len() as u64,
            cached_at: current_timestamp_ms(),
            url,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_from_url() {
        assert_eq!(MediaKind::from_url("/images/user/owner.jpg"), MediaKind::Image);
        assert_eq!(MediaKind::from_url("/fonts/Inter.WOFF2"), MediaKind::Font);
        assert_eq!(MediaKind::from_url("/assets/app.js?v=3"), MediaKind::Script);
        assert_eq!(MediaKind::from_url("/assets/app.css#x"), MediaKind::Style);
        assert_eq!(MediaKind::from_url("/favicon.ico"), MediaKind::Other);
        assert_eq!(MediaKind::from_url("/v1.2/readme"), MediaKind::Other);
    }

    #[test]
    fn test_record_payload_survives_json() {
        let record = AssetRecord::new("/images/logo/logo.png", vec![0x89, 0x50, 0x4e, 0x47]);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("89504e47"));

        let back: AssetRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.payload, record.payload);
        assert_eq!(back.size_bytes, 4);
        assert_eq!(back.media_kind, MediaKind::Image);
    }
}
