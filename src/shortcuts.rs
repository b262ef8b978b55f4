use crate::feed::FeedStore;
use crate::player::{clamp_unit, PlayerHandle, PlayerStore};

const SHORT_SEEK_SECS: f64 = 5.0;
const LONG_SEEK_SECS: f64 = 10.0;
const VOLUME_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    TogglePlay,
    PreviousVideo,
    NextVideo,
    SeekBy(f64),
    ToggleMute,
    AdjustVolume(f64),
    ToggleFullscreen,
    OpenComments,
    CloseComments,
    /// Jump to `digit × 10%` of the duration.
    SeekToTenth(u8),
}

impl ShortcutAction {
    /// Maps a key name to an action. Accepts both GPUI key names (`space`,
    /// `up`) and DOM-style names (`" "`, `arrowup`).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.to_lowercase();
        let action = match key.as_str() {
            " " | "space" | "k" => Self::TogglePlay,
            "up" | "arrowup" => Self::PreviousVideo,
            "down" | "arrowdown" => Self::NextVideo,
            "left" | "arrowleft" => Self::SeekBy(-SHORT_SEEK_SECS),
            "right" | "arrowright" => Self::SeekBy(SHORT_SEEK_SECS),
            "j" => Self::SeekBy(-LONG_SEEK_SECS),
            "l" => Self::SeekBy(LONG_SEEK_SECS),
            "m" => Self::ToggleMute,
            "+" | "=" => Self::AdjustVolume(VOLUME_STEP),
            "-" => Self::AdjustVolume(-VOLUME_STEP),
            "f" => Self::ToggleFullscreen,
            "c" => Self::OpenComments,
            "escape" => Self::CloseComments,
            digit if digit.len() == 1 => {
                let value = digit.chars().next()?.to_digit(10)?;
                Self::SeekToTenth(value as u8)
            }
            _ => return None,
        };
        Some(action)
    }

    /// Whether the action moves to another video.
    #[must_use]
    pub fn changes_video(&self) -> bool {
        matches!(self, Self::PreviousVideo | Self::NextVideo)
    }
}

/// Everything a shortcut may act on.
pub struct ShortcutTargets<'a> {
    pub feed: &'a mut FeedStore,
    pub playback: &'a PlayerStore,
    pub player: &'a mut dyn PlayerHandle,
    pub comments_open: &'a mut bool,
}

/// Routes one key press. Returns the applied action, or `None` when the key
/// is unbound or a text input has focus.
pub fn dispatch(
    key: &str,
    input_focused: bool,
    targets: ShortcutTargets<'_>,
) -> Option<ShortcutAction> {
    if input_focused {
        return None;
    }
    let action = ShortcutAction::from_key(key)?;
    apply(action, targets);
    log::debug!("shortcut {key:?} -> {action:?}");
    Some(action)
}

pub fn apply(action: ShortcutAction, targets: ShortcutTargets<'_>) {
    let ShortcutTargets {
        feed,
        playback,
        player,
        comments_open,
    } = targets;
    let state = playback.state();

    match action {
        ShortcutAction::TogglePlay => {
            if state.is_playing {
                player.pause();
            } else {
                player.play();
            }
        }
        ShortcutAction::PreviousVideo => {
            feed.previous();
        }
        ShortcutAction::NextVideo => {
            feed.next();
        }
        ShortcutAction::SeekBy(delta) => {
            player.set_current_time(clamp_seek(state.current_time + delta, state.duration));
        }
        ShortcutAction::ToggleMute => {
            let target = if state.volume > 0.0 {
                0.0
            } else {
                playback.last_audible_volume()
            };
            player.set_volume(target);
        }
        ShortcutAction::AdjustVolume(delta) => {
            player.set_volume(step_volume(state.volume, delta));
        }
        ShortcutAction::ToggleFullscreen => {
            if player.is_fullscreen() {
                player.exit_fullscreen();
            } else {
                player.request_fullscreen();
            }
        }
        ShortcutAction::OpenComments => *comments_open = true,
        ShortcutAction::CloseComments => *comments_open = false,
        ShortcutAction::SeekToTenth(digit) => {
            let target = state.duration * f64::from(digit) / 10.0;
            player.set_current_time(clamp_seek(target, state.duration));
        }
    }
}

fn clamp_seek(target: f64, duration: f64) -> f64 {
    target.clamp(0.0, duration.max(0.0))
}

/// Steps the volume, rounding to hundredths so repeated steps do not drift.
fn step_volume(volume: f64, delta: f64) -> f64 {
    clamp_unit(((volume + delta) * 100.0).round() / 100.0)
}
