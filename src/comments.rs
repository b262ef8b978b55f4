//! Comment session for the video whose comment drawer is open.
//!
//! Comments are kept in insertion order (newest first) and persisted per video.
//! Two counters exist: the virtual count is a display number seeded from the
//! video's baseline stat and nudged by sends and deletes, while the actual count
//! is always recomputed from the loaded records.

use std::collections::BTreeSet;

use crate::error::FeedError;
use crate::models::{CommentRecord, CommentSort};
use crate::storage::{Storage, StorageKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Persisted comments were found and installed.
    Restored,
    /// Nothing persisted; the caller fetches and calls [`CommentStore::install_fetched`].
    NeedsFetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendComment {
    pub video_id: String,
    pub content: String,
    pub parent_id: Option<String>,
}

pub struct CommentStore {
    storage: Storage,
    video_id: Option<String>,
    comments: Vec<CommentRecord>,
    liked: BTreeSet<String>,
    loading: bool,
    pending_sends: usize,
    input: String,
    reply_to: Option<String>,
    sort: CommentSort,
    virtual_count: u64,
}

impl CommentStore {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            video_id: None,
            comments: Vec::new(),
            liked: BTreeSet::new(),
            loading: false,
            pending_sends: 0,
            input: String::new(),
            reply_to: None,
            sort: CommentSort::default(),
            virtual_count: 0,
        }
    }

    #[must_use]
    pub fn active_video(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    fn is_active(&self, video_id: &str) -> bool {
        self.video_id.as_deref() == Some(video_id)
    }

    /// Switches the session to `video_id`, dropping state of the previous video.
    fn open_session(&mut self, video_id: &str) {
        if self.is_active(video_id) {
            return;
        }
        self.video_id = Some(video_id.to_string());
        self.comments.clear();
        self.liked = self
            .storage
            .load_or_default(&StorageKey::LikedComments(video_id.to_string()));
        self.loading = false;
        self.input.clear();
        self.reply_to = None;
        self.virtual_count = 0;
    }

    /// Restores the persisted virtual count for the video, or seeds and persists it.
    pub fn init_virtual_count(&mut self, video_id: &str, initial_count: u64) -> u64 {
        self.open_session(video_id);
        let key = StorageKey::VirtualCommentCount(video_id.to_string());
        match self.storage.load::<u64>(&key) {
            Ok(Some(stored)) => self.virtual_count = stored,
            Ok(None) => {
                self.virtual_count = initial_count;
                self.storage.save_logged(&key, &initial_count);
            }
            Err(e) => {
                log::warn!("failed to read {key}: {e}");
                self.virtual_count = initial_count;
            }
        }
        self.reconcile_virtual_count();
        self.virtual_count
    }

    pub fn load_comments(&mut self, video_id: &str) -> LoadOutcome {
        self.open_session(video_id);
        self.loading = true;

        let stored: Vec<CommentRecord> = self
            .storage
            .load_or_default(&StorageKey::Comments(video_id.to_string()));
        if stored.is_empty() {
            return LoadOutcome::NeedsFetch;
        }

        self.comments = stored.into_iter().map(CommentRecord::flattened).collect();
        self.loading = false;
        self.reconcile_virtual_count();
        log::debug!("restored {} comments for video {video_id}", self.comments.len());
        LoadOutcome::Restored
    }

    /// Installs a fetched seed set. Returns `false` if the session moved on.
    /// Comments sent while the fetch was in flight stay on top.
    pub fn install_fetched(&mut self, video_id: &str, comments: Vec<CommentRecord>) -> bool {
        if !self.is_active(video_id) {
            log::debug!("dropping comments fetched for inactive video {video_id}");
            return false;
        }

        let sent = std::mem::take(&mut self.comments);
        self.comments = sent
            .into_iter()
            .chain(comments.into_iter().map(CommentRecord::flattened))
            .collect();
        self.persist_comments(video_id);
        self.loading = false;
        self.reconcile_virtual_count();
        true
    }

    /// Validates a send before any latency is spent on it.
    pub fn begin_send(&mut self, request: &SendComment) -> Result<(), FeedError> {
        if request.content.trim().is_empty() {
            return Err(FeedError::EmptyComment);
        }
        self.pending_sends += 1;
        Ok(())
    }

    /// Inserts a posted comment and bumps the virtual count by one.
    pub fn apply_sent(
        &mut self,
        request: &SendComment,
        comment: CommentRecord,
    ) -> Result<(), FeedError> {
        self.pending_sends = self.pending_sends.saturating_sub(1);
        let video_id = request.video_id.as_str();
        if !self.is_active(video_id) {
            log::warn!("dropping comment sent to inactive video {video_id}");
            return Err(FeedError::VideoNotFound(video_id.to_string()));
        }

        match request.parent_id.as_deref() {
            Some(parent_id) => {
                let parent = self
                    .thread_root_index(parent_id)
                    .ok_or_else(|| FeedError::CommentNotFound(parent_id.to_string()))?;
                self.comments[parent].replies.insert(0, comment.into_reply());
            }
            None => self.comments.insert(0, comment.flattened()),
        }

        self.persist_comments(video_id);
        self.set_virtual_count(video_id, self.virtual_count + 1);
        self.input.clear();
        self.reply_to = None;
        log::info!("sent comment on video {video_id}");
        Ok(())
    }

    /// Called when a post fails; the comment list is left untouched.
    pub fn fail_send(&mut self, error: &FeedError) {
        self.pending_sends = self.pending_sends.saturating_sub(1);
        log::error!("failed to send comment: {error}");
    }

    /// Toggles the user's like on one comment. Returns the new liked state.
    pub fn like_comment(&mut self, comment_id: &str) -> Result<bool, FeedError> {
        let video_id = self
            .video_id
            .clone()
            .ok_or_else(|| FeedError::CommentNotFound(comment_id.to_string()))?;
        let liked = !self.liked.contains(comment_id);

        let record = self
            .find_mut(comment_id)
            .ok_or_else(|| FeedError::CommentNotFound(comment_id.to_string()))?;
        record.likes = if liked {
            record.likes + 1
        } else {
            record.likes.saturating_sub(1)
        };

        if liked {
            self.liked.insert(comment_id.to_string());
        } else {
            self.liked.remove(comment_id);
        }

        self.persist_comments(&video_id);
        self.storage
            .save_logged(&StorageKey::LikedComments(video_id), &self.liked);
        Ok(liked)
    }

    /// Removes a top-level comment with its replies, or a single reply.
    /// Returns how many records were removed.
    pub fn delete_comment(
        &mut self,
        video_id: &str,
        comment_id: &str,
        parent_id: Option<&str>,
    ) -> Result<u64, FeedError> {
        if !self.is_active(video_id) {
            return Err(FeedError::CommentNotFound(comment_id.to_string()));
        }
        let not_found = || FeedError::CommentNotFound(comment_id.to_string());

        let removed: Vec<CommentRecord> = match parent_id {
            Some(parent_id) => {
                let parent = self
                    .comments
                    .iter_mut()
                    .find(|c| c.id == parent_id)
                    .ok_or_else(not_found)?;
                let position = parent
                    .replies
                    .iter()
                    .position(|r| r.id == comment_id)
                    .ok_or_else(not_found)?;
                vec![parent.replies.remove(position)]
            }
            None => {
                let position = self
                    .comments
                    .iter()
                    .position(|c| c.id == comment_id)
                    .ok_or_else(not_found)?;
                let mut thread = self.comments.remove(position);
                let replies = std::mem::take(&mut thread.replies);
                std::iter::once(thread).chain(replies).collect()
            }
        };

        let before = self.liked.len();
        for record in &removed {
            self.liked.remove(&record.id);
        }
        if self.liked.len() != before {
            self.storage
                .save_logged(&StorageKey::LikedComments(video_id.to_string()), &self.liked);
        }

        let removed = removed.len() as u64;
        self.persist_comments(video_id);
        self.set_virtual_count(video_id, self.virtual_count.saturating_sub(removed));
        log::info!("deleted {removed} comment(s) from video {video_id}");
        Ok(removed)
    }

    /// Top-level comments plus their direct replies, counted from the live list.
    #[must_use]
    pub fn actual_count(&self) -> u64 {
        self.comments.iter().map(CommentRecord::thread_size).sum()
    }

    #[must_use]
    pub fn virtual_count(&self) -> u64 {
        self.virtual_count
    }

    #[must_use]
    pub fn comments(&self) -> &[CommentRecord] {
        &self.comments
    }

    /// Display order for the current sort mode; the stored order is not touched.
    #[must_use]
    pub fn sorted(&self) -> Vec<&CommentRecord> {
        let mut view: Vec<&CommentRecord> = self.comments.iter().collect();
        match self.sort {
            CommentSort::Hot => view.sort_by(|a, b| b.likes.cmp(&a.likes)),
            CommentSort::Time => view.sort_by(|a, b| b.create_time.cmp(&a.create_time)),
        }
        view
    }

    #[must_use]
    pub fn sort(&self) -> CommentSort {
        self.sort
    }

    pub fn set_sort(&mut self, sort: CommentSort) {
        self.sort = sort;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.pending_sends > 0
    }

    #[must_use]
    pub fn is_comment_liked(&self, comment_id: &str) -> bool {
        self.liked.contains(comment_id)
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn push_input(&mut self, text: &str) {
        self.input.push_str(text);
    }

    pub fn pop_input(&mut self) {
        self.input.pop();
    }

    #[must_use]
    pub fn reply_to(&self) -> Option<&str> {
        self.reply_to.as_deref()
    }

    pub fn begin_reply(&mut self, parent_id: &str) {
        self.reply_to = Some(parent_id.to_string());
    }

    pub fn cancel_reply(&mut self) {
        self.reply_to = None;
    }

    /// Builds a send request from the composer state for the active video.
    #[must_use]
    pub fn draft(&self) -> Option<SendComment> {
        Some(SendComment {
            video_id: self.video_id.clone()?,
            content: self.input.clone(),
            parent_id: self.reply_to.clone(),
        })
    }

    /// Index of the top-level comment owning `id`, whether `id` is that
    /// comment or one of its replies. Keeps replies one level deep.
    fn thread_root_index(&self, id: &str) -> Option<usize> {
        self.comments
            .iter()
            .position(|c| c.id == id || c.replies.iter().any(|r| r.id == id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut CommentRecord> {
        for comment in &mut self.comments {
            if comment.id == id {
                return Some(comment);
            }
            if let Some(reply) = comment.replies.iter_mut().find(|r| r.id == id) {
                return Some(reply);
            }
        }
        None
    }

    fn persist_comments(&self, video_id: &str) {
        self.storage
            .save_logged(&StorageKey::Comments(video_id.to_string()), &self.comments);
    }

    fn set_virtual_count(&mut self, video_id: &str, count: u64) {
        self.virtual_count = count;
        self.storage
            .save_logged(&StorageKey::VirtualCommentCount(video_id.to_string()), &count);
    }

    /// Once records are loaded the virtual count is never shown below them.
    fn reconcile_virtual_count(&mut self) {
        let actual = self.actual_count();
        if self.virtual_count < actual {
            if let Some(video_id) = self.video_id.clone() {
                log::debug!(
                    "raising virtual comment count for video {video_id} from {} to {actual}",
                    self.virtual_count
                );
                self.set_virtual_count(&video_id, actual);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{seed_comments, MockFeedClient, PostCommentRequest};
    use crate::storage::memory_storage;
    use chrono::{Duration, Utc};
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    fn loaded_store(video_id: &str, baseline: u64) -> CommentStore {
        let (storage, _backend) = memory_storage();
        let mut store = CommentStore::new(storage);
        store.init_virtual_count(video_id, baseline);
        assert_eq!(store.load_comments(video_id), LoadOutcome::NeedsFetch);
        assert!(store.is_loading());
        assert!(store.install_fetched(video_id, seed_comments(video_id)));
        assert!(!store.is_loading());
        store
    }

    fn own_comment(id: &str) -> CommentRecord {
        let mut comment = seed_comments("1").remove(1);
        comment.id = id.to_string();
        comment.likes = 0;
        comment.create_time = Utc::now();
        comment
    }

    fn send(store: &mut CommentStore, id: &str, parent_id: Option<&str>) {
        let request = SendComment {
            video_id: store.active_video().expect("active").to_string(),
            content: "hello".to_string(),
            parent_id: parent_id.map(str::to_string),
        };
        store.begin_send(&request).expect("valid");
        store.apply_sent(&request, own_comment(id)).expect("sent");
    }

    fn top_level_ids(store: &CommentStore) -> Vec<&str> {
        store.comments().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn virtual_count_is_seeded_once_then_restored() {
        let (storage, backend) = memory_storage();
        let mut store = CommentStore::new(storage.clone());
        assert_eq!(store.init_virtual_count("1", 446), 446);
        assert_eq!(
            backend.raw(&StorageKey::VirtualCommentCount("1".into())).as_deref(),
            Some("446")
        );

        let mut reopened = CommentStore::new(storage);
        assert_eq!(reopened.init_virtual_count("1", 10), 446);
    }

    #[test]
    fn seeded_comments_are_persisted_and_restored() {
        let (storage, _backend) = memory_storage();
        let mut store = CommentStore::new(storage.clone());
        store.init_virtual_count("1", 446);
        assert_eq!(store.load_comments("1"), LoadOutcome::NeedsFetch);
        store.install_fetched("1", seed_comments("1"));

        let mut reopened = CommentStore::new(storage);
        assert_eq!(reopened.load_comments("1"), LoadOutcome::Restored);
        assert!(!reopened.is_loading());
        assert_eq!(reopened.actual_count(), 4);
    }

    #[test]
    fn stale_fetch_is_dropped() {
        let (storage, _backend) = memory_storage();
        let mut store = CommentStore::new(storage);
        store.load_comments("1");
        store.load_comments("2");
        assert!(!store.install_fetched("1", seed_comments("1")));
        assert!(store.comments().is_empty());
        assert!(store.is_loading());
    }

    #[test]
    fn send_during_first_fetch_survives_install() {
        let (storage, _backend) = memory_storage();
        let mut store = CommentStore::new(storage.clone());
        store.init_virtual_count("1", 446);
        assert_eq!(store.load_comments("1"), LoadOutcome::NeedsFetch);

        send(&mut store, "early", None);
        assert!(store.install_fetched("1", seed_comments("1")));

        assert_eq!(top_level_ids(&store), vec!["early", "c1", "c2", "c3"]);
        assert_eq!(store.actual_count(), 5);
        assert_eq!(store.virtual_count(), 447);

        let mut reopened = CommentStore::new(storage);
        assert_eq!(reopened.load_comments("1"), LoadOutcome::Restored);
        assert_eq!(reopened.actual_count(), 5);
    }

    #[test]
    fn top_level_send_goes_first_and_counts_one() {
        let mut store = loaded_store("1", 446);
        let actual = store.actual_count();

        send(&mut store, "mine", None);

        assert_eq!(store.actual_count(), actual + 1);
        assert_eq!(store.virtual_count(), 447);
        assert_eq!(top_level_ids(&store), vec!["mine", "c1", "c2", "c3"]);
        assert_eq!(store.input(), "");
    }

    #[test]
    fn reply_goes_first_under_parent_only() {
        let mut store = loaded_store("1", 446);
        let before = top_level_ids(&store)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        send(&mut store, "reply", Some("c1"));

        assert_eq!(store.actual_count(), 5);
        assert_eq!(store.virtual_count(), 447);
        assert_eq!(top_level_ids(&store), before);
        let parent = &store.comments()[0];
        assert_eq!(parent.replies[0].id, "reply");
        assert_eq!(parent.replies[1].id, "c1-1");
    }

    #[test]
    fn reply_to_a_reply_stays_one_level_deep() {
        let mut store = loaded_store("1", 446);
        send(&mut store, "nested", Some("c1-1"));

        let parent = &store.comments()[0];
        assert_eq!(parent.replies[0].id, "nested");
        assert!(parent.replies.iter().all(|r| r.replies.is_empty()));
        assert_eq!(store.actual_count(), 5);
    }

    #[test]
    fn reply_to_unknown_parent_changes_nothing() {
        let mut store = loaded_store("1", 446);
        let request = SendComment {
            video_id: "1".into(),
            content: "hi".into(),
            parent_id: Some("ghost".into()),
        };
        store.begin_send(&request).expect("valid");
        assert!(matches!(
            store.apply_sent(&request, own_comment("x")),
            Err(FeedError::CommentNotFound(_))
        ));
        assert_eq!(store.actual_count(), 4);
        assert_eq!(store.virtual_count(), 446);
        assert!(!store.is_sending());
    }

    #[test]
    fn blank_content_is_rejected_before_mutation() {
        let mut store = loaded_store("1", 446);
        let request = SendComment {
            video_id: "1".into(),
            content: " \n ".into(),
            parent_id: None,
        };
        assert!(matches!(store.begin_send(&request), Err(FeedError::EmptyComment)));
        assert!(!store.is_sending());
        assert_eq!(store.actual_count(), 4);
    }

    #[test]
    fn failed_send_leaves_list_untouched() {
        let mut store = loaded_store("1", 446);
        store.set_input("draft");
        let request = store.draft().expect("draft");
        store.begin_send(&request).expect("valid");
        assert!(store.is_sending());

        store.fail_send(&FeedError::PostFailed("offline".into()));

        assert!(!store.is_sending());
        assert_eq!(store.actual_count(), 4);
        assert_eq!(store.input(), "draft");
    }

    #[test]
    fn deleting_a_thread_removes_replies_too() {
        let mut store = loaded_store("1", 446);
        send(&mut store, "reply", Some("c1"));
        assert_eq!(store.virtual_count(), 447);

        let removed = store.delete_comment("1", "c1", None).expect("delete");

        assert_eq!(removed, 3);
        assert_eq!(store.virtual_count(), 444);
        assert_eq!(store.actual_count(), 2);
        assert_eq!(top_level_ids(&store), vec!["c2", "c3"]);
    }

    #[test]
    fn deleting_drops_likes_of_removed_records() {
        let (storage, backend) = memory_storage();
        let mut store = CommentStore::new(storage);
        store.init_virtual_count("1", 446);
        store.load_comments("1");
        store.install_fetched("1", seed_comments("1"));
        store.like_comment("c1").expect("like");
        store.like_comment("c1-1").expect("like");
        store.like_comment("c2").expect("like");

        store.delete_comment("1", "c1", None).expect("delete");

        assert!(!store.is_comment_liked("c1"));
        assert!(!store.is_comment_liked("c1-1"));
        assert!(store.is_comment_liked("c2"));
        assert_eq!(
            backend.raw(&StorageKey::LikedComments("1".into())).as_deref(),
            Some(r#"["c2"]"#)
        );
    }

    #[test]
    fn deleting_a_reply_counts_one() {
        let mut store = loaded_store("1", 446);
        assert_eq!(store.delete_comment("1", "c1-1", Some("c1")).expect("delete"), 1);
        assert_eq!(store.virtual_count(), 445);
        assert!(store.comments()[0].replies.is_empty());
    }

    #[test]
    fn deleting_unknown_comment_is_an_error() {
        let mut store = loaded_store("1", 446);
        assert!(store.delete_comment("1", "ghost", None).is_err());
        assert!(store.delete_comment("1", "ghost", Some("c1")).is_err());
        assert!(store.delete_comment("2", "c1", None).is_err());
        assert_eq!(store.virtual_count(), 446);
    }

    #[test]
    fn virtual_count_is_raised_to_actual_after_load() {
        let store = loaded_store("1", 2);
        assert_eq!(store.virtual_count(), 4);
    }

    #[test]
    fn deletes_saturate_at_zero() {
        let (storage, _backend) = memory_storage();
        let mut store = CommentStore::new(storage.clone());
        storage
            .save(&StorageKey::Comments("1".into()), &seed_comments("1"))
            .expect("save");
        storage
            .save(&StorageKey::VirtualCommentCount("1".into()), &0u64)
            .expect("save");

        store.init_virtual_count("1", 0);
        store.load_comments("1");
        store.set_virtual_count("1", 1);
        store.delete_comment("1", "c1", None).expect("delete");
        assert_eq!(store.virtual_count(), 0);
    }

    #[test]
    fn hot_sort_orders_by_likes_without_touching_storage_order() {
        let mut store = loaded_store("1", 446);
        store.set_sort(CommentSort::Hot);
        let likes: Vec<u64> = store.sorted().iter().map(|c| c.likes).collect();
        assert_eq!(likes, vec![128, 89, 56]);
        assert_eq!(top_level_ids(&store), vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn time_sort_ignores_likes() {
        let mut store = loaded_store("1", 446);
        let now = Utc::now();
        store.comments[0].create_time = now - Duration::hours(10);
        store.comments[1].create_time = now - Duration::hours(1);
        store.comments[2].create_time = now - Duration::hours(5);

        store.set_sort(CommentSort::Time);
        let ids: Vec<&str> = store.sorted().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c3", "c1"]);
    }

    #[test]
    fn comment_like_toggles_one_record() {
        let mut store = loaded_store("1", 446);

        assert!(store.like_comment("c1-1").expect("like"));
        assert_eq!(store.comments()[0].replies[0].likes, 46);
        assert_eq!(store.comments()[0].likes, 128);
        assert!(store.is_comment_liked("c1-1"));

        assert!(!store.like_comment("c1-1").expect("unlike"));
        assert_eq!(store.comments()[0].replies[0].likes, 45);
        assert!(!store.is_comment_liked("c1-1"));

        assert!(store.like_comment("ghost").is_err());
    }

    #[test]
    fn full_send_through_mock_client() {
        let client = MockFeedClient::instant();
        let mut store = loaded_store("1", 446);
        store.set_input("  第一  ");
        let request = store.draft().expect("draft");

        store.begin_send(&request).expect("valid");
        let posted = block_on(client.post_comment(PostCommentRequest {
            video_id: &request.video_id,
            content: &request.content,
            parent_id: request.parent_id.as_deref(),
        }))
        .expect("post");
        store.apply_sent(&request, posted.comment).expect("apply");

        assert_eq!(store.comments()[0].content, "第一");
        assert_eq!(store.comments()[0].user.id, "current-user");
        assert_eq!(store.actual_count(), 5);
    }
}
