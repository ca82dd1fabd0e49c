use marquee_api::Video;

const YOUTUBE_EMBED: &str = "https://www.youtube.com/embed";
const YOUTUBE_WATCH: &str = "https://www.youtube.com/watch?v=";

/// A playable YouTube trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    pub key: String,
    pub name: String,
}

impl Trailer {
    pub fn embed_url(&self) -> String {
        format!("{YOUTUBE_EMBED}/{}", self.key)
    }

    pub fn watch_url(&self) -> String {
        format!("{YOUTUBE_WATCH}{}", self.key)
    }
}

/// First video that is a YouTube trailer. Teasers, clips and other hosts are skipped.
pub fn select_trailer(videos: &[Video]) -> Option<Trailer> {
    videos
        .iter()
        .find(|v| v.video_type == "Trailer" && v.site == "YouTube")
        .map(|v| Trailer {
            key: v.key.clone(),
            name: v.name.clone(),
        })
}
