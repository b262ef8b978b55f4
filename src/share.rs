use crate::models::VideoRecord;

const SHARE_BASE_URL: &str = "https://www.douyin.com/video/";

/// Public link for a video.
pub fn share_link(video: &VideoRecord) -> Result<url::Url, url::ParseError> {
    url::Url::parse(SHARE_BASE_URL)?.join(&video.id)
}

/// Video id from a share link, if `text` is one.
#[must_use]
pub fn video_id_from_link(text: &str) -> Option<String> {
    let link = url::Url::parse(text.trim()).ok()?;
    let base = url::Url::parse(SHARE_BASE_URL).ok()?;
    if link.host_str() != base.host_str() {
        return None;
    }
    let id = link.path().strip_prefix(base.path())?;
    (!id.is_empty() && !id.contains('/')).then(|| id.to_string())
}

/// 分享文案
#[must_use]
pub fn share_text(video: &VideoRecord) -> String {
    format!("【抖音】{}\n来自 {}", video.description, video.author.name)
}

/// Host the media is served from, without a leading `www.`.
#[must_use]
pub fn media_host(video: &VideoRecord) -> Option<String> {
    url::Url::parse(&video.video_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
}
