use chrono::{Duration as ChronoDuration, Utc};
use gpui::BackgroundExecutor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::FeedError;
use crate::models::{CommentAuthor, CommentRecord, Music, VideoAuthor, VideoRecord, VideoStats};

const AVATAR_BASE: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(1);

pub struct PostCommentRequest<'a> {
    pub video_id: &'a str,
    pub content: &'a str,
    pub parent_id: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct PostResult {
    pub success: bool,
    pub comment: CommentRecord,
}

/// In-memory stand-in for the feed backend.
///
/// Every accessor waits out the configured latency on the GPUI background
/// executor before answering. Without an executor the answers are immediate.
pub struct MockFeedClient {
    executor: Option<BackgroundExecutor>,
    latency: Duration,
    comment_latency: Duration,
    videos: Vec<VideoRecord>,
}

impl MockFeedClient {
    pub fn new(executor: BackgroundExecutor, config: &AppConfig) -> Self {
        Self {
            executor: Some(executor),
            latency: config.latency,
            comment_latency: config.comment_latency,
            videos: seed_videos(),
        }
    }

    #[cfg(test)]
    pub fn instant() -> Self {
        Self {
            executor: None,
            latency: Duration::ZERO,
            comment_latency: Duration::ZERO,
            videos: seed_videos(),
        }
    }

    async fn simulate_latency(&self, latency: Duration) {
        if let Some(executor) = self.executor.as_ref() {
            if !latency.is_zero() {
                executor.timer(latency).await;
            }
        }
    }

    pub async fn fetch_video_list(&self) -> Vec<VideoRecord> {
        self.simulate_latency(self.latency).await;
        self.videos.clone()
    }

    pub async fn fetch_video_by_id(&self, id: &str) -> Result<VideoRecord, FeedError> {
        self.simulate_latency(self.latency).await;
        self.videos
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| FeedError::VideoNotFound(id.to_string()))
    }

    pub async fn fetch_comments(&self, video_id: &str) -> Vec<CommentRecord> {
        self.simulate_latency(self.comment_latency).await;
        seed_comments(video_id)
    }

    pub async fn post_comment(
        &self,
        request: PostCommentRequest<'_>,
    ) -> Result<PostResult, FeedError> {
        let content = request.content.trim();
        if content.is_empty() {
            return Err(FeedError::EmptyComment);
        }
        self.simulate_latency(self.comment_latency).await;

        log::debug!(
            "posted comment on video {} (reply to {:?})",
            request.video_id,
            request.parent_id
        );
        Ok(PostResult {
            success: true,
            comment: new_own_comment(content, request.parent_id.is_some()),
        })
    }
}

fn new_own_comment(content: &str, is_reply: bool) -> CommentRecord {
    let now = Utc::now();
    let seq = NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed);
    let prefix = if is_reply { "temp-reply" } else { "temp" };
    CommentRecord {
        id: format!("{prefix}-{}-{seq}", now.timestamp_millis()),
        user: CommentAuthor {
            id: "current-user".to_string(),
            name: "我".to_string(),
            avatar: format!("{AVATAR_BASE}current"),
        },
        content: content.to_string(),
        create_time: now,
        likes: 0,
        replies: Vec::new(),
    }
}

#[allow(clippy::too_many_arguments)]
fn video(
    id: &str,
    video_url: &str,
    author: (&str, &str, &str, bool),
    description: &str,
    tags: &[&str],
    music: (&str, &str),
    stats: (u64, u64, u64, u64),
    create_time: &str,
    location: &str,
) -> VideoRecord {
    let (author_id, name, seed, is_followed) = author;
    let (likes, comments, shares, favorites) = stats;
    VideoRecord {
        id: id.to_string(),
        video_url: video_url.to_string(),
        cover_url: format!("https://picsum.photos/400/600?random={id}"),
        author: VideoAuthor {
            id: author_id.to_string(),
            name: name.to_string(),
            avatar: format!("{AVATAR_BASE}{seed}"),
            is_followed,
        },
        description: description.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        music: Music {
            name: music.0.to_string(),
            author: music.1.to_string(),
        },
        stats: VideoStats {
            likes,
            comments,
            shares,
            favorites,
        },
        create_time: create_time.to_string(),
        location: Some(location.to_string()),
    }
}

pub(crate) fn seed_videos() -> Vec<VideoRecord> {
    const BBB: &str = "https://www.w3schools.com/html/mov_bbb.mp4";
    const MOVIE: &str = "https://www.w3schools.com/html/movie.mp4";

    vec![
        video(
            "1",
            BBB,
            ("user1", "@苏漫坐（美妆版）", "Sophie", false),
            "第19集：上镜日常妆15分钟保姆级跟练丨出片又自然丨 长视频戳主出击！",
            &["#新手化妆教程", "#今日妆容", "#妆教", "#新手化妆"],
            ("一首友好的键盘曲", "音乐人"),
            (280, 446, 27, 170),
            "10月5日",
            "四川阿坝",
        ),
        video(
            "2",
            MOVIE,
            ("user2", "@COEXIST", "Felix", false),
            "心之所向 身之所往 #coexistence 治愈系视频，送给正在努力的你！",
            &["#coexistence", "#治愈", "#正能量"],
            ("星辰大海", "云朵乐队"),
            (238, 358, 1205, 182),
            "5天前",
            "四川阿坝",
        ),
        video(
            "3",
            BBB,
            ("user3", "@小林同学", "Xiaolin", true),
            "今天教大家做超简单的快手菜！10分钟搞定晚餐！",
            &["#美食教程", "#快手菜", "#家常菜", "#下饭菜"],
            ("轻松的一天", "美食BGM"),
            (156, 234, 567, 890),
            "昨天",
            "北京",
        ),
        video(
            "4",
            MOVIE,
            ("user4", "@旅行日记", "Travel", false),
            "西藏自驾游第10天，终于到达珠峰大本营！太震撼了！",
            &["#西藏旅游", "#自驾游", "#珠峰", "#旅行日记"],
            ("漫步云端", "旅行音乐"),
            (2345, 345, 890, 1230),
            "2天前",
            "西藏",
        ),
        video(
            "5",
            BBB,
            ("user5", "@健身教练王老师", "Coach", true),
            "7天练出腹肌！每天10分钟腹肌训练，适合新手！",
            &["#健身教程", "#腹肌训练", "#居家健身", "#新手健身"],
            ("燃脂节奏", "运动音乐"),
            (567, 890, 1200, 2340),
            "1周前",
            "上海",
        ),
    ]
}

fn comment(
    id: &str,
    user: (&str, &str, &str),
    content: &str,
    age: ChronoDuration,
    likes: u64,
    replies: Vec<CommentRecord>,
) -> CommentRecord {
    CommentRecord {
        id: id.to_string(),
        user: CommentAuthor {
            id: user.0.to_string(),
            name: user.1.to_string(),
            avatar: format!("{AVATAR_BASE}{}", user.2),
        },
        content: content.to_string(),
        create_time: Utc::now() - age,
        likes,
        replies,
    }
}

/// 每个视频的初始评论；未定义的视频返回空列表
pub(crate) fn seed_comments(video_id: &str) -> Vec<CommentRecord> {
    let hours = ChronoDuration::hours;
    let days = ChronoDuration::days;

    match video_id {
        "1" => vec![
            comment(
                "c1",
                ("u101", "小美爱化妆", "user1"),
                "太实用了！跟着博主学会了日常妆，感谢分享！",
                hours(2),
                128,
                vec![comment(
                    "c1-1",
                    ("user1", "@苏漫坐（美妆版）", "Sophie"),
                    "谢谢支持！多多练习就能画得更好啦～",
                    hours(1),
                    45,
                    Vec::new(),
                )],
            ),
            comment(
                "c2",
                ("u102", "新手小白", "user2"),
                "请问用的什么牌子的粉底液呀？",
                hours(3),
                56,
                Vec::new(),
            ),
            comment(
                "c3",
                ("u103", "化妆达人", "user3"),
                "手法很细腻，适合新手学习！已收藏",
                hours(5),
                89,
                Vec::new(),
            ),
        ],
        "2" => vec![
            comment(
                "c4",
                ("u104", "追光者", "user4"),
                "太治愈了，看完心情都变好了！",
                days(1),
                234,
                Vec::new(),
            ),
            comment(
                "c5",
                ("u105", "旅行者", "user5"),
                "四川阿坝的风景真的太美了！",
                days(1) + hours(2),
                167,
                Vec::new(),
            ),
        ],
        "3" => vec![comment(
            "c6",
            ("u106", "吃货一号", "user6"),
            "太简单了！今晚就试试！",
            days(1),
            445,
            Vec::new(),
        )],
        "4" => vec![comment(
            "c7",
            ("u107", "旅游爱好者", "user7"),
            "一直想去西藏，看了你的视频更想去了！",
            days(2),
            678,
            Vec::new(),
        )],
        "5" => vec![comment(
            "c8",
            ("u108", "健身小白", "user8"),
            "跟着练了3天，已经有点效果了！",
            days(3),
            1234,
            Vec::new(),
        )],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn lookup_by_id_reports_missing_videos() {
        let client = MockFeedClient::instant();
        let video = block_on(client.fetch_video_by_id("4")).expect("video 4");
        assert_eq!(video.author.name, "@旅行日记");
        assert!(matches!(
            block_on(client.fetch_video_by_id("404")),
            Err(FeedError::VideoNotFound(id)) if id == "404"
        ));
    }

    #[test]
    fn unknown_videos_have_no_comments() {
        let client = MockFeedClient::instant();
        assert_eq!(block_on(client.fetch_comments("1")).len(), 3);
        assert!(block_on(client.fetch_comments("missing")).is_empty());
    }

    #[test]
    fn posting_builds_an_own_comment() {
        let client = MockFeedClient::instant();
        let result = block_on(client.post_comment(PostCommentRequest {
            video_id: "1",
            content: "  你好  ",
            parent_id: Some("c1"),
        }))
        .expect("post");
        assert!(result.success);
        assert_eq!(result.comment.content, "你好");
        assert_eq!(result.comment.user.id, "current-user");
        assert_eq!(result.comment.likes, 0);
        assert!(result.comment.id.starts_with("temp-reply-"));
    }

    #[test]
    fn posting_blank_content_is_rejected() {
        let client = MockFeedClient::instant();
        let result = block_on(client.post_comment(PostCommentRequest {
            video_id: "1",
            content: "   ",
            parent_id: None,
        }));
        assert!(matches!(result, Err(FeedError::EmptyComment)));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = new_own_comment("a", false);
        let b = new_own_comment("b", false);
        assert_ne!(a.id, b.id);
    }
}
