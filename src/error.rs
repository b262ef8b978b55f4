//! Error types shared by the stores and the mock data source.

use thiserror::Error;

/// Failures of the key-value persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend lock poisoned")]
    Poisoned,
}

/// Failures surfaced by feed, comment and mock-request operations.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("The feed has no videos")]
    EmptyFeed,

    #[error("Comment content is empty")]
    EmptyComment,

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Failed to post comment: {0}")]
    PostFailed(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl FeedError {
    /// Short message suitable for a transient notice in the UI.
    #[must_use]
    pub fn notice(&self) -> String {
        match self {
            FeedError::EmptyComment => "请输入评论内容".to_string(),
            FeedError::VideoNotFound(_) => "视频不存在".to_string(),
            FeedError::PostFailed(_) => "发送失败，请重试".to_string(),
            FeedError::Storage(_) => "本地保存失败".to_string(),
            other => other.to_string(),
        }
    }
}
