//! Wires the stores together for one running app.
//!
//! Nothing here touches GPUI; the window shell calls in with user input and
//! performs whatever asynchronous work the returned effects ask for.

use crate::comments::{CommentStore, LoadOutcome, SendComment};
use crate::config::AppConfig;
use crate::error::FeedError;
use crate::feed::FeedStore;
use crate::interaction::InteractionStore;
use crate::models::VideoRecord;
use crate::player::{PlayerHandle, PlayerStore, SimulatedPlayer, DEFAULT_VOLUME};
use crate::search::SearchHistory;
use crate::share;
use crate::shortcuts::{self, ShortcutAction, ShortcutTargets};
use crate::storage::{Storage, StorageKey};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputFocus {
    #[default]
    None,
    Comment,
    Search,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyEffect {
    Ignored,
    Handled,
    VideoChanged,
    CommentsOpened,
    FullscreenToggled,
    Send(SendComment),
    /// A share link was entered; the shell resolves the id before jumping.
    OpenVideo(String),
}

/// A comment load the shell still has to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub video_id: String,
}

pub struct Session {
    pub config: AppConfig,
    storage: Storage,
    pub feed: Option<FeedStore>,
    pub interactions: InteractionStore,
    pub comments: CommentStore,
    pub playback: PlayerStore,
    pub player: SimulatedPlayer,
    pub search: SearchHistory,
    pub search_input: String,
    pub comments_open: bool,
    pub focus: InputFocus,
    pub clear_screen: bool,
    pub notice: Option<String>,
    saved_volume: f64,
}

impl Session {
    pub fn new(config: AppConfig, storage: Storage) -> Self {
        let volume = match storage.load::<f64>(&StorageKey::Volume) {
            Ok(Some(volume)) => volume,
            Ok(None) => DEFAULT_VOLUME,
            Err(e) => {
                log::warn!("failed to read saved volume: {e}");
                DEFAULT_VOLUME
            }
        };

        Self {
            config,
            interactions: InteractionStore::load(storage.clone()),
            comments: CommentStore::new(storage.clone()),
            search: SearchHistory::load(storage.clone()),
            storage,
            feed: None,
            playback: PlayerStore::new(volume),
            player: SimulatedPlayer::new(volume),
            search_input: String::new(),
            comments_open: false,
            focus: InputFocus::None,
            clear_screen: false,
            notice: None,
            saved_volume: volume,
        }
    }

    pub fn install_feed(&mut self, videos: Vec<VideoRecord>) -> Result<(), FeedError> {
        let feed = FeedStore::new(videos)?;
        log::info!("feed loaded with {} videos", feed.len());
        self.feed = Some(feed);
        self.start_current_video();
        Ok(())
    }

    #[must_use]
    pub fn current_video(&self) -> Option<&VideoRecord> {
        self.feed.as_ref().map(FeedStore::current_video)
    }

    fn start_current_video(&mut self) {
        let Some(duration) = self.current_video().map(simulated_duration) else {
            return;
        };
        self.player.load(duration);
        self.sync_player();
    }

    /// Applies queued player events to the mirror and persists volume changes.
    pub fn sync_player(&mut self) {
        self.playback.apply_all(self.player.take_events());
        let volume = self.playback.state().volume;
        if (volume - self.saved_volume).abs() > f64::EPSILON {
            self.saved_volume = volume;
            self.storage.save_logged(&StorageKey::Volume, &volume);
        }
    }

    /// Advances playback. Returns `true` if the feed moved on because the
    /// video ended with autoplay enabled.
    pub fn tick(&mut self, elapsed: f64) -> bool {
        self.player.tick(elapsed);
        self.sync_player();
        if self.playback.has_ended() && self.config.autoplay {
            self.next_video();
            return true;
        }
        false
    }

    pub fn next_video(&mut self) {
        if let Some(feed) = self.feed.as_mut() {
            feed.next();
            self.on_video_changed();
        }
    }

    /// Jumps to a video already in the feed. Returns `false` for unknown ids.
    pub fn open_video(&mut self, video_id: &str) -> bool {
        let Some(feed) = self.feed.as_mut() else {
            return false;
        };
        if !feed.select(video_id) {
            return false;
        }
        self.on_video_changed();
        true
    }

    fn on_video_changed(&mut self) {
        self.start_current_video();
        if self.focus == InputFocus::Comment {
            self.focus = InputFocus::None;
        }
    }

    pub fn cycle_rate(&mut self) {
        self.player
            .set_playback_rate(self.playback.state().rate.next());
        self.sync_player();
    }

    pub fn toggle_like(&mut self) -> Option<bool> {
        let id = self.current_video()?.id.clone();
        Some(self.interactions.toggle_like(&id))
    }

    pub fn toggle_favorite(&mut self) -> Option<bool> {
        let id = self.current_video()?.id.clone();
        Some(self.interactions.toggle_favorite(&id))
    }

    pub fn toggle_follow(&mut self) -> Option<bool> {
        let id = self.current_video()?.author.id.clone();
        Some(self.interactions.toggle_follow(&id))
    }

    /// Opens the drawer for the current video. Returns the fetch the shell
    /// must perform when nothing was persisted yet.
    pub fn open_comments(&mut self) -> Option<PendingFetch> {
        let (video_id, baseline) = {
            let video = self.current_video()?;
            (video.id.clone(), video.stats.comments)
        };
        self.comments_open = true;
        self.comments.init_virtual_count(&video_id, baseline);
        match self.comments.load_comments(&video_id) {
            LoadOutcome::Restored => None,
            LoadOutcome::NeedsFetch => Some(PendingFetch { video_id }),
        }
    }

    pub fn close_comments(&mut self) {
        self.comments_open = false;
        if self.focus == InputFocus::Comment {
            self.focus = InputFocus::None;
        }
    }

    /// Comment badge for the current video.
    #[must_use]
    pub fn comment_badge(&self) -> String {
        let Some(video) = self.current_video() else {
            return String::new();
        };
        let virtual_count = if self.comments.active_video() == Some(video.id.as_str()) {
            self.comments.virtual_count()
        } else {
            0
        };
        video.comment_label(virtual_count)
    }

    /// Starts a reply, prefilling the composer with an `@` mention.
    pub fn begin_reply(&mut self, comment_id: &str, author_name: &str) {
        self.comments.begin_reply(comment_id);
        self.comments.set_input(format!("@{author_name} "));
        self.focus = InputFocus::Comment;
    }

    /// Validates the composer and returns the request to post.
    pub fn submit_comment(&mut self) -> Option<SendComment> {
        let request = self.comments.draft()?;
        match self.comments.begin_send(&request) {
            Ok(()) => Some(request),
            Err(e) => {
                self.notice = Some(e.notice());
                None
            }
        }
    }

    /// Records the query. Returns the video id when the query is a share link.
    pub fn submit_search(&mut self) -> Option<String> {
        let query = std::mem::take(&mut self.search_input);
        self.focus = InputFocus::None;
        if let Some(video_id) = share::video_id_from_link(&query) {
            return Some(video_id);
        }
        if self.search.record(&query) {
            log::info!("searched for {:?}", query.trim());
        }
        None
    }

    /// Routes a key press. `typed` carries the text the key produces, if any.
    pub fn handle_key(&mut self, key: &str, typed: Option<&str>) -> KeyEffect {
        match self.focus {
            InputFocus::Comment => self.edit_comment_input(key, typed),
            InputFocus::Search => self.edit_search_input(key, typed),
            InputFocus::None => self.dispatch_shortcut(key),
        }
    }

    fn edit_comment_input(&mut self, key: &str, typed: Option<&str>) -> KeyEffect {
        match key {
            "enter" => match self.submit_comment() {
                Some(request) => KeyEffect::Send(request),
                None => KeyEffect::Handled,
            },
            "escape" => {
                self.focus = InputFocus::None;
                self.comments.cancel_reply();
                self.comments.set_input("");
                KeyEffect::Handled
            }
            "backspace" => {
                self.comments.pop_input();
                KeyEffect::Handled
            }
            _ => match typed {
                Some(text) => {
                    self.comments.push_input(text);
                    KeyEffect::Handled
                }
                None => KeyEffect::Ignored,
            },
        }
    }

    fn edit_search_input(&mut self, key: &str, typed: Option<&str>) -> KeyEffect {
        match key {
            "enter" => match self.submit_search() {
                Some(video_id) => KeyEffect::OpenVideo(video_id),
                None => KeyEffect::Handled,
            },
            "escape" => {
                self.focus = InputFocus::None;
                KeyEffect::Handled
            }
            "backspace" => {
                self.search_input.pop();
                KeyEffect::Handled
            }
            _ => match typed {
                Some(text) => {
                    self.search_input.push_str(text);
                    KeyEffect::Handled
                }
                None => KeyEffect::Ignored,
            },
        }
    }

    fn dispatch_shortcut(&mut self, key: &str) -> KeyEffect {
        let Some(feed) = self.feed.as_mut() else {
            return KeyEffect::Ignored;
        };
        let was_open = self.comments_open;
        let was_fullscreen = self.player.is_fullscreen();

        let Some(action) = shortcuts::dispatch(
            key,
            false,
            ShortcutTargets {
                feed,
                playback: &self.playback,
                player: &mut self.player,
                comments_open: &mut self.comments_open,
            },
        ) else {
            return KeyEffect::Ignored;
        };
        self.finish_shortcut(action, was_open, was_fullscreen)
    }

    /// Runs an action triggered by a button rather than a key.
    pub fn run_shortcut(&mut self, action: ShortcutAction) -> KeyEffect {
        let Some(feed) = self.feed.as_mut() else {
            return KeyEffect::Ignored;
        };
        let was_open = self.comments_open;
        let was_fullscreen = self.player.is_fullscreen();

        shortcuts::apply(
            action,
            ShortcutTargets {
                feed,
                playback: &self.playback,
                player: &mut self.player,
                comments_open: &mut self.comments_open,
            },
        );
        self.finish_shortcut(action, was_open, was_fullscreen)
    }

    fn finish_shortcut(
        &mut self,
        action: ShortcutAction,
        was_open: bool,
        was_fullscreen: bool,
    ) -> KeyEffect {
        self.sync_player();

        if action.changes_video() {
            self.on_video_changed();
            return KeyEffect::VideoChanged;
        }
        if action == ShortcutAction::OpenComments && !was_open {
            return KeyEffect::CommentsOpened;
        }
        if self.player.is_fullscreen() != was_fullscreen {
            return KeyEffect::FullscreenToggled;
        }
        KeyEffect::Handled
    }
}

/// Length given to the simulated player for a video, 15 to 59 seconds.
fn simulated_duration(video: &VideoRecord) -> f64 {
    let seed: u32 = video.id.bytes().map(u32::from).sum();
    15.0 + f64::from(seed % 45)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{seed_comments, seed_videos};
    use crate::storage::memory_storage;
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        let (storage, _backend) = memory_storage();
        let mut session = Session::new(AppConfig::default(), storage);
        session.install_feed(seed_videos()).expect("feed");
        session
    }

    #[test]
    fn installing_the_feed_starts_playback() {
        let session = session();
        assert_eq!(session.current_video().map(|v| v.id.as_str()), Some("1"));
        assert!(session.playback.is_playing());
        assert!(session.playback.state().duration >= 15.0);
    }

    #[test]
    fn empty_feed_is_refused() {
        let (storage, _backend) = memory_storage();
        let mut session = Session::new(AppConfig::default(), storage);
        assert!(matches!(session.install_feed(Vec::new()), Err(FeedError::EmptyFeed)));
        assert_eq!(session.handle_key("down", None), KeyEffect::Ignored);
    }

    #[test]
    fn arrow_keys_change_video_and_restart_player() {
        let mut session = session();
        session.tick(5.0);
        assert_eq!(session.handle_key("down", None), KeyEffect::VideoChanged);
        assert_eq!(session.current_video().map(|v| v.id.as_str()), Some("2"));
        assert_eq!(session.playback.state().current_time, 0.0);
    }

    #[test]
    fn c_opens_comments_once() {
        let mut session = session();
        assert_eq!(session.handle_key("c", None), KeyEffect::CommentsOpened);
        assert_eq!(session.handle_key("c", None), KeyEffect::Handled);
        assert_eq!(session.handle_key("escape", None), KeyEffect::Handled);
        assert!(!session.comments_open);
    }

    #[test]
    fn focused_composer_captures_typing() {
        let mut session = session();
        let pending = session.open_comments().expect("needs fetch");
        session
            .comments
            .install_fetched(&pending.video_id, seed_comments(&pending.video_id));
        session.focus = InputFocus::Comment;

        assert_eq!(session.handle_key("k", Some("k")), KeyEffect::Handled);
        assert_eq!(session.handle_key("down", None), KeyEffect::Ignored);
        assert_eq!(session.current_video().map(|v| v.id.as_str()), Some("1"));
        assert!(session.playback.is_playing());

        match session.handle_key("enter", None) {
            KeyEffect::Send(request) => {
                assert_eq!(request.content, "k");
                assert_eq!(request.video_id, "1");
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn reply_prefills_mention_and_escape_discards_it() {
        let mut session = session();
        let pending = session.open_comments().expect("needs fetch");
        session
            .comments
            .install_fetched(&pending.video_id, seed_comments(&pending.video_id));

        session.begin_reply("c1", "小明");
        assert_eq!(session.focus, InputFocus::Comment);
        assert_eq!(session.comments.input(), "@小明 ");
        assert_eq!(session.comments.reply_to(), Some("c1"));

        session.handle_key("escape", None);
        assert_eq!(session.comments.reply_to(), None);
        assert_eq!(session.comments.input(), "");
        assert_eq!(session.focus, InputFocus::None);
    }

    #[test]
    fn empty_comment_raises_a_notice() {
        let mut session = session();
        session.open_comments();
        session.focus = InputFocus::Comment;
        assert_eq!(session.handle_key("enter", None), KeyEffect::Handled);
        assert_eq!(session.notice.as_deref(), Some("请输入评论内容"));
        assert!(!session.comments.is_sending());
    }

    #[test]
    fn badge_uses_virtual_count_for_the_open_video() {
        let mut session = session();
        assert_eq!(session.comment_badge(), "446");
        let pending = session.open_comments().expect("needs fetch");
        session
            .comments
            .install_fetched(&pending.video_id, seed_comments(&pending.video_id));
        session.comments.delete_comment("1", "c2", None).expect("delete");
        assert_eq!(session.comment_badge(), "445");
        session.next_video();
        assert_eq!(session.comment_badge(), "358");
    }

    #[test]
    fn autoplay_advances_on_end() {
        let (storage, _backend) = memory_storage();
        let config = AppConfig {
            autoplay: true,
            ..AppConfig::default()
        };
        let mut session = Session::new(config, storage);
        session.install_feed(seed_videos()).expect("feed");

        assert!(session.tick(120.0));
        assert_eq!(session.current_video().map(|v| v.id.as_str()), Some("2"));
        assert!(session.playback.is_playing());
    }

    #[test]
    fn without_autoplay_the_video_stays() {
        let mut session = session();
        assert!(!session.tick(120.0));
        assert!(session.playback.has_ended());
        assert_eq!(session.current_video().map(|v| v.id.as_str()), Some("1"));
    }

    #[test]
    fn volume_is_persisted_and_restored() {
        let (storage, _backend) = memory_storage();
        {
            let mut session = Session::new(AppConfig::default(), storage.clone());
            session.install_feed(seed_videos()).expect("feed");
            session.handle_key("-", None);
        }
        let session = Session::new(AppConfig::default(), storage);
        assert_eq!(session.playback.state().volume, 0.5);
    }

    #[test]
    fn buttons_share_the_shortcut_path() {
        let mut session = session();
        assert_eq!(
            session.run_shortcut(ShortcutAction::ToggleMute),
            KeyEffect::Handled
        );
        assert_eq!(session.playback.state().volume, 0.0);
        assert_eq!(
            session.run_shortcut(ShortcutAction::ToggleFullscreen),
            KeyEffect::FullscreenToggled
        );
        assert_eq!(
            session.run_shortcut(ShortcutAction::NextVideo),
            KeyEffect::VideoChanged
        );
        assert_eq!(session.current_video().map(|v| v.id.as_str()), Some("2"));
    }

    #[test]
    fn pasted_share_link_opens_the_video() {
        let mut session = session();
        session.focus = InputFocus::Search;
        session.search_input = "https://www.douyin.com/video/4".to_string();

        assert_eq!(
            session.handle_key("enter", None),
            KeyEffect::OpenVideo("4".to_string())
        );
        assert!(session.search.entries().is_empty());
        assert!(session.open_video("4"));
        assert_eq!(session.current_video().map(|v| v.id.as_str()), Some("4"));
        assert!(!session.open_video("404"));
    }

    #[test]
    fn rate_cycles_through_the_player() {
        let mut session = session();
        session.cycle_rate();
        session.cycle_rate();
        assert_eq!(session.playback.state().rate.as_f64(), 1.5);
    }

    #[test]
    fn search_box_records_history() {
        let mut session = session();
        session.focus = InputFocus::Search;
        for ch in ["旅", "行"] {
            session.handle_key(ch, Some(ch));
        }
        session.handle_key("enter", None);
        assert_eq!(session.search.entries(), ["旅行"]);
        assert_eq!(session.focus, InputFocus::None);
        assert!(session.search_input.is_empty());
    }
}
