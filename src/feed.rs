use crate::error::FeedError;
use crate::models::VideoRecord;

/// Ordered feed with a cursor that wraps in both directions.
///
/// An empty feed cannot be constructed, so navigation never has to handle it.
#[derive(Debug, Clone)]
pub struct FeedStore {
    videos: Vec<VideoRecord>,
    index: usize,
}

impl FeedStore {
    pub fn new(videos: Vec<VideoRecord>) -> Result<Self, FeedError> {
        if videos.is_empty() {
            return Err(FeedError::EmptyFeed);
        }
        Ok(Self { videos, index: 0 })
    }

    #[must_use]
    pub fn current_video(&self) -> &VideoRecord {
        &self.videos[self.index]
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn next(&mut self) -> &VideoRecord {
        self.index = (self.index + 1) % self.videos.len();
        self.current_video()
    }

    pub fn previous(&mut self) -> &VideoRecord {
        let len = self.videos.len();
        self.index = (self.index + len - 1) % len;
        self.current_video()
    }

    /// Jumps to a video by id. Returns `false` when the id is not in the feed.
    pub fn select(&mut self, video_id: &str) -> bool {
        match self.videos.iter().position(|v| v.id == video_id) {
            Some(index) => {
                self.index = index;
                true
            }
            None => false,
        }
    }
}
