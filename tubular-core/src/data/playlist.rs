use std::sync::Arc;

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::data::Video;

/// A user-created playlist.  Membership is mutated only through confirmed
/// server responses, never locally.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: Arc<str>,
    pub name: Arc<str>,
    #[serde(default)]
    pub videos: Vector<Video>,
}

impl Playlist {
    pub fn contains(&self, video_id: &str) -> bool {
        self.videos.iter().any(|video| &*video.id == video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_without_videos() {
        let playlist: Playlist =
            serde_json::from_str(r#"{"_id": "p1", "name": "Favorites"}"#).unwrap();
        assert_eq!(playlist.name.as_ref(), "Favorites");
        assert!(playlist.videos.is_empty());
        assert!(!playlist.contains("v1"));
    }
}
