use std::collections::BTreeSet;

use crate::storage::{Storage, StorageKey};

/// Which videos the user liked or favorited and which authors they follow.
///
/// Each toggle writes the full updated set back to storage.
pub struct InteractionStore {
    storage: Storage,
    liked: BTreeSet<String>,
    favorited: BTreeSet<String>,
    followed: BTreeSet<String>,
}

impl InteractionStore {
    pub fn load(storage: Storage) -> Self {
        let liked = storage.load_or_default(&StorageKey::LikedVideos);
        let favorited = storage.load_or_default(&StorageKey::FavoritedVideos);
        let followed = storage.load_or_default(&StorageKey::FollowedUsers);
        Self {
            storage,
            liked,
            favorited,
            followed,
        }
    }

    #[must_use]
    pub fn is_liked(&self, video_id: &str) -> bool {
        self.liked.contains(video_id)
    }

    #[must_use]
    pub fn is_favorited(&self, video_id: &str) -> bool {
        self.favorited.contains(video_id)
    }

    #[must_use]
    pub fn is_followed(&self, author_id: &str) -> bool {
        self.followed.contains(author_id)
    }

    pub fn toggle_like(&mut self, video_id: &str) -> bool {
        let liked = toggle(&mut self.liked, video_id);
        self.storage.save_logged(&StorageKey::LikedVideos, &self.liked);
        log::info!("{} video {video_id}", if liked { "liked" } else { "unliked" });
        liked
    }

    pub fn toggle_favorite(&mut self, video_id: &str) -> bool {
        let favorited = toggle(&mut self.favorited, video_id);
        self.storage
            .save_logged(&StorageKey::FavoritedVideos, &self.favorited);
        log::info!(
            "{} video {video_id}",
            if favorited { "favorited" } else { "unfavorited" }
        );
        favorited
    }

    pub fn toggle_follow(&mut self, author_id: &str) -> bool {
        let followed = toggle(&mut self.followed, author_id);
        self.storage
            .save_logged(&StorageKey::FollowedUsers, &self.followed);
        log::info!(
            "{} author {author_id}",
            if followed { "followed" } else { "unfollowed" }
        );
        followed
    }
}

fn toggle(set: &mut BTreeSet<String>, id: &str) -> bool {
    if set.remove(id) {
        false
    } else {
        set.insert(id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_storage;
    use pretty_assertions::assert_eq;

    #[test]
    fn double_toggle_restores_state_with_one_write_each() {
        let (storage, backend) = memory_storage();
        let mut store = InteractionStore::load(storage);

        assert!(store.toggle_like("1"));
        assert_eq!(backend.write_count(&StorageKey::LikedVideos), 1);
        assert_eq!(backend.raw(&StorageKey::LikedVideos).as_deref(), Some(r#"["1"]"#));

        assert!(!store.toggle_like("1"));
        assert_eq!(backend.write_count(&StorageKey::LikedVideos), 2);
        assert_eq!(backend.raw(&StorageKey::LikedVideos).as_deref(), Some("[]"));
        assert!(!store.is_liked("1"));
    }

    #[test]
    fn sets_are_independent() {
        let (storage, backend) = memory_storage();
        let mut store = InteractionStore::load(storage);

        store.toggle_favorite("2");
        store.toggle_follow("user2");
        assert!(!store.is_liked("2"));
        assert!(store.is_favorited("2"));
        assert!(store.is_followed("user2"));
        assert_eq!(backend.write_count(&StorageKey::LikedVideos), 0);
        assert_eq!(backend.write_count(&StorageKey::FavoritedVideos), 1);
        assert_eq!(backend.write_count(&StorageKey::FollowedUsers), 1);
    }

    #[test]
    fn state_survives_reload() {
        let (storage, _backend) = memory_storage();
        {
            let mut store = InteractionStore::load(storage.clone());
            store.toggle_like("3");
            store.toggle_like("1");
            store.toggle_follow("user5");
        }
        let store = InteractionStore::load(storage);
        assert!(store.is_liked("1"));
        assert!(store.is_liked("3"));
        assert!(store.is_followed("user5"));
        assert!(!store.is_favorited("1"));
    }
}
