use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::format::{format_number, format_relative_time, format_time};

/// 缓存的话题标签正则表达式
static HASHTAG_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"#[^\s#]+").expect("Invalid regex pattern"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoAuthor {
    pub id: String,
    pub name: String,
    pub avatar: String,
    /// Baseline from the data source; the interaction store decides what is shown.
    #[serde(default)]
    pub is_followed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Music {
    pub name: String,
    pub author: String,
}

/// Display baselines, not authoritative counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoStats {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub favorites: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub video_url: String,
    pub cover_url: String,
    pub author: VideoAuthor,
    pub description: String,
    pub tags: Vec<String>,
    pub music: Music,
    pub stats: VideoStats,
    pub create_time: String,
    pub location: Option<String>,
}

impl VideoRecord {
    #[must_use]
    pub fn formatted_time(&self) -> String {
        format_time(&self.create_time)
    }

    /// Description with inline hashtags removed.
    #[must_use]
    pub fn caption(&self) -> String {
        HASHTAG_RE
            .replace_all(&self.description, "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Declared tags followed by any inline hashtags not already declared.
    #[must_use]
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags = self.tags.clone();
        for found in HASHTAG_RE.find_iter(&self.description) {
            let tag = found.as_str();
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        tags
    }

    #[must_use]
    pub fn music_label(&self) -> String {
        format!("{} - {}", self.music.name, self.music.author)
    }

    #[must_use]
    pub fn like_label(&self, liked: bool) -> String {
        format_number(self.stats.likes + u64::from(liked))
    }

    #[must_use]
    pub fn favorite_label(&self, favorited: bool) -> String {
        format_number(self.stats.favorites + u64::from(favorited))
    }

    #[must_use]
    pub fn share_label(&self) -> String {
        format_number(self.stats.shares)
    }

    /// 评论数角标：虚拟评论数非零时优先显示
    #[must_use]
    pub fn comment_label(&self, virtual_count: u64) -> String {
        if virtual_count > 0 {
            format_number(virtual_count)
        } else {
            format_number(self.stats.comments)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentAuthor {
    pub id: String,
    pub name: String,
    pub avatar: String,
}

/// 评论（最多一层回复）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: String,
    pub user: CommentAuthor,
    pub content: String,
    pub create_time: DateTime<Utc>,
    pub likes: u64,
    #[serde(default)]
    pub replies: Vec<CommentRecord>,
}

impl CommentRecord {
    #[must_use]
    pub fn formatted_time(&self) -> String {
        format_relative_time(self.create_time)
    }

    #[must_use]
    pub fn has_replies(&self) -> bool {
        !self.replies.is_empty()
    }

    /// This record plus its direct replies.
    #[must_use]
    pub fn thread_size(&self) -> u64 {
        1 + self.replies.len() as u64
    }

    /// Drops anything nested below the first reply level.
    #[must_use]
    pub fn flattened(mut self) -> Self {
        for reply in &mut self.replies {
            reply.replies.clear();
        }
        self
    }

    /// Strips replies entirely, for records that are about to become a reply.
    #[must_use]
    pub fn into_reply(mut self) -> Self {
        self.replies.clear();
        self
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommentSort {
    #[default]
    Hot,
    Time,
}

impl CommentSort {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            CommentSort::Hot => "最热",
            CommentSort::Time => "最新",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::seed_videos;

    #[test]
    fn caption_strips_inline_hashtags() {
        let video = seed_videos()
            .into_iter()
            .find(|v| v.id == "2")
            .expect("seed video 2");
        assert_eq!(video.caption(), "心之所向 身之所往 治愈系视频，送给正在努力的你！");
        assert!(video.all_tags().contains(&"#coexistence".to_string()));
        assert_eq!(
            video.all_tags().iter().filter(|t| *t == "#coexistence").count(),
            1
        );
    }

    #[test]
    fn labels_add_own_toggle_to_baseline() {
        let video = &seed_videos()[0];
        assert_eq!(video.like_label(false), "280");
        assert_eq!(video.like_label(true), "281");
        assert_eq!(video.comment_label(0), "446");
        assert_eq!(video.comment_label(1200), "1.2k");
    }

    #[test]
    fn flattened_drops_second_level_replies() {
        let nested = CommentRecord {
            id: "r".into(),
            user: CommentAuthor {
                id: "u".into(),
                name: "n".into(),
                avatar: String::new(),
            },
            content: "deep".into(),
            create_time: Utc::now(),
            likes: 0,
            replies: Vec::new(),
        };
        let mut reply = nested.clone();
        reply.id = "reply".into();
        reply.replies.push(nested.clone());
        let mut top = nested;
        top.id = "top".into();
        top.replies.push(reply);

        let top = top.flattened();
        assert_eq!(top.thread_size(), 2);
        assert!(top.replies[0].replies.is_empty());
    }
}
