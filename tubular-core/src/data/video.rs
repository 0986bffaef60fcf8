use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A catalog entry.  Immutable from the client's perspective, the server owns
/// all counts.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: Arc<str>,
    /// External platform reference, used for playback and thumbnails.
    pub video_id: Arc<str>,
    pub title: Arc<str>,
    pub channel_name: Arc<str>,
    pub channel_display_pic: Arc<str>,
    pub view_count: Arc<str>,
    pub upload_date: Arc<str>,
    #[serde(default)]
    pub like_count: u64,
    pub subscribers: Arc<str>,
}

impl Video {
    pub fn thumbnail_url(&self) -> String {
        format!(
            "https://img.youtube.com/vi/{id}/mqdefault.jpg",
            id = self.video_id
        )
    }

    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={id}", id = self.video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_format() {
        let video: Video = serde_json::from_str(
            r#"{
                "_id": "61ee",
                "videoId": "dQw4w9WgXcQ",
                "title": "Never Gonna Give You Up",
                "channelName": "Rick Astley",
                "channelDisplayPic": "https://example.com/rick.jpg",
                "viewCount": "1.2B",
                "uploadDate": "Oct 25, 2009",
                "likeCount": 16000000,
                "subscribers": "3.2M"
            }"#,
        )
        .unwrap();

        assert_eq!(video.id.as_ref(), "61ee");
        assert_eq!(video.channel_name.as_ref(), "Rick Astley");
        assert_eq!(video.like_count, 16000000);
        assert_eq!(
            video.thumbnail_url(),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/mqdefault.jpg"
        );
    }
}
