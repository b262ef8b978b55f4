//! Playback mirror and the handle used to command the player.
//!
//! [`PlayerStore`] only reflects events reported by the player; commands go to a
//! [`PlayerHandle`] and come back as events.

use std::collections::VecDeque;

use crate::format::format_clock;

pub const DEFAULT_VOLUME: f64 = 0.6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackRate {
    Half,
    ThreeQuarters,
    #[default]
    Normal,
    OneAndQuarter,
    OneAndHalf,
    Double,
}

impl PlaybackRate {
    pub const ALL: [PlaybackRate; 6] = [
        PlaybackRate::Half,
        PlaybackRate::ThreeQuarters,
        PlaybackRate::Normal,
        PlaybackRate::OneAndQuarter,
        PlaybackRate::OneAndHalf,
        PlaybackRate::Double,
    ];

    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            PlaybackRate::Half => 0.5,
            PlaybackRate::ThreeQuarters => 0.75,
            PlaybackRate::Normal => 1.0,
            PlaybackRate::OneAndQuarter => 1.25,
            PlaybackRate::OneAndHalf => 1.5,
            PlaybackRate::Double => 2.0,
        }
    }

    /// 倍速循环：0.5 → 0.75 → 1 → 1.25 → 1.5 → 2 → 0.5
    #[must_use]
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|r| *r == self).unwrap_or(2);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn label(self) -> String {
        match self {
            PlaybackRate::Normal => "倍速".to_string(),
            other => format!("{}x", other.as_f64()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Play,
    Pause,
    TimeUpdate(f64),
    LoadedMetadata { duration: f64 },
    VolumeChange(f64),
    RateChange(PlaybackRate),
    Ended,
    Error(String),
}

/// Commands understood by a media player.
pub trait PlayerHandle {
    fn play(&mut self);
    fn pause(&mut self);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn duration(&self) -> f64;
    fn volume(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
    fn playback_rate(&self) -> PlaybackRate;
    fn set_playback_rate(&mut self, rate: PlaybackRate);
    fn is_fullscreen(&self) -> bool;
    fn request_fullscreen(&mut self);
    fn exit_fullscreen(&mut self);
    /// Events emitted since the last call, oldest first.
    fn take_events(&mut self) -> Vec<PlayerEvent>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f64,
    pub rate: PlaybackRate,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: DEFAULT_VOLUME,
            rate: PlaybackRate::Normal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerStore {
    state: PlaybackState,
    last_audible_volume: f64,
    ended: bool,
    error: Option<String>,
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME)
    }
}

impl PlayerStore {
    pub fn new(volume: f64) -> Self {
        let volume = clamp_unit(volume);
        Self {
            state: PlaybackState {
                volume,
                ..PlaybackState::default()
            },
            last_audible_volume: if volume > 0.0 { volume } else { DEFAULT_VOLUME },
            ended: false,
            error: None,
        }
    }

    pub fn apply(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Play => {
                self.state.is_playing = true;
                self.ended = false;
                self.error = None;
            }
            PlayerEvent::Pause => self.state.is_playing = false,
            PlayerEvent::TimeUpdate(time) => self.state.current_time = time.max(0.0),
            PlayerEvent::LoadedMetadata { duration } => {
                self.state.duration = duration.max(0.0);
                self.state.current_time = 0.0;
                self.ended = false;
                self.error = None;
            }
            PlayerEvent::VolumeChange(volume) => {
                let volume = clamp_unit(volume);
                self.state.volume = volume;
                if volume > 0.0 {
                    self.last_audible_volume = volume;
                }
            }
            PlayerEvent::RateChange(rate) => self.state.rate = rate,
            PlayerEvent::Ended => {
                self.state.is_playing = false;
                self.ended = true;
            }
            PlayerEvent::Error(message) => {
                log::error!("player error: {message}");
                self.state.is_playing = false;
                self.error = Some(message);
            }
        }
    }

    pub fn apply_all(&mut self, events: impl IntoIterator<Item = PlayerEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    #[must_use]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.ended
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Volume to restore when unmuting.
    #[must_use]
    pub fn last_audible_volume(&self) -> f64 {
        self.last_audible_volume
    }

    #[must_use]
    pub fn formatted_current_time(&self) -> String {
        format_clock(self.state.current_time)
    }

    #[must_use]
    pub fn formatted_duration(&self) -> String {
        format_clock(self.state.duration)
    }

    /// Played fraction in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.state.duration > 0.0 {
            (self.state.current_time / self.state.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A player without a decoder: it keeps a clock, honours commands and reports
/// them back as events.
pub struct SimulatedPlayer {
    playing: bool,
    current_time: f64,
    duration: f64,
    volume: f64,
    rate: PlaybackRate,
    fullscreen: bool,
    events: VecDeque<PlayerEvent>,
}

impl SimulatedPlayer {
    pub fn new(volume: f64) -> Self {
        Self {
            playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: clamp_unit(volume),
            rate: PlaybackRate::Normal,
            fullscreen: false,
            events: VecDeque::new(),
        }
    }

    /// Loads a new source of the given length and starts playing it.
    pub fn load(&mut self, duration: f64) {
        self.current_time = 0.0;
        self.duration = duration.max(0.0);
        self.events.push_back(PlayerEvent::LoadedMetadata {
            duration: self.duration,
        });
        self.play();
    }

    /// Advances the clock by `elapsed` wall-clock seconds.
    pub fn tick(&mut self, elapsed: f64) {
        if !self.playing || self.duration <= 0.0 {
            return;
        }
        self.current_time = (self.current_time + elapsed * self.rate.as_f64()).min(self.duration);
        self.events
            .push_back(PlayerEvent::TimeUpdate(self.current_time));
        if self.current_time >= self.duration {
            self.playing = false;
            self.events.push_back(PlayerEvent::Ended);
        }
    }
}

impl PlayerHandle for SimulatedPlayer {
    fn play(&mut self) {
        if self.duration <= 0.0 {
            self.events
                .push_back(PlayerEvent::Error("no media loaded".to_string()));
            return;
        }
        if self.current_time >= self.duration {
            self.current_time = 0.0;
        }
        self.playing = true;
        self.events.push_back(PlayerEvent::Play);
    }

    fn pause(&mut self) {
        self.playing = false;
        self.events.push_back(PlayerEvent::Pause);
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.current_time = seconds.clamp(0.0, self.duration);
        self.events
            .push_back(PlayerEvent::TimeUpdate(self.current_time));
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = clamp_unit(volume);
        self.events
            .push_back(PlayerEvent::VolumeChange(self.volume));
    }

    fn playback_rate(&self) -> PlaybackRate {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: PlaybackRate) {
        self.rate = rate;
        self.events.push_back(PlayerEvent::RateChange(rate));
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn request_fullscreen(&mut self) {
        self.fullscreen = true;
    }

    fn exit_fullscreen(&mut self) {
        self.fullscreen = false;
    }

    fn take_events(&mut self) -> Vec<PlayerEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rates_cycle_through_the_fixed_set() {
        let mut rate = PlaybackRate::Normal;
        let mut seen = Vec::new();
        for _ in 0..6 {
            rate = rate.next();
            seen.push(rate.as_f64());
        }
        assert_eq!(seen, vec![1.25, 1.5, 2.0, 0.5, 0.75, 1.0]);
        assert_eq!(PlaybackRate::Normal.label(), "倍速");
        assert_eq!(PlaybackRate::OneAndHalf.label(), "1.5x");
    }

    #[test]
    fn store_mirrors_player_events() {
        let mut player = SimulatedPlayer::new(0.6);
        let mut store = PlayerStore::default();

        player.load(90.0);
        player.tick(65.0);
        store.apply_all(player.take_events());

        assert!(store.is_playing());
        assert_eq!(store.state().duration, 90.0);
        assert_eq!(store.formatted_current_time(), "1:05");
        assert_eq!(store.formatted_duration(), "1:30");
    }

    #[test]
    fn rate_change_arrives_as_an_echo() {
        let mut player = SimulatedPlayer::new(0.6);
        let mut store = PlayerStore::default();

        player.set_playback_rate(store.state().rate.next());
        assert_eq!(store.state().rate, PlaybackRate::Normal);

        store.apply_all(player.take_events());
        assert_eq!(store.state().rate, PlaybackRate::OneAndQuarter);
    }

    #[test]
    fn playing_to_the_end_emits_ended() {
        let mut player = SimulatedPlayer::new(0.6);
        let mut store = PlayerStore::default();
        player.load(10.0);
        player.set_playback_rate(PlaybackRate::Double);
        player.tick(6.0);
        store.apply_all(player.take_events());

        assert!(store.has_ended());
        assert!(!store.is_playing());
        assert_eq!(store.progress(), 1.0);
    }

    #[test]
    fn muting_remembers_last_audible_volume() {
        let mut store = PlayerStore::default();
        store.apply(PlayerEvent::VolumeChange(0.8));
        store.apply(PlayerEvent::VolumeChange(0.0));
        assert_eq!(store.state().volume, 0.0);
        assert_eq!(store.last_audible_volume(), 0.8);
    }

    #[test]
    fn errors_stop_playback() {
        let mut player = SimulatedPlayer::new(0.6);
        let mut store = PlayerStore::default();
        player.play();
        store.apply_all(player.take_events());
        assert!(!store.is_playing());
        assert_eq!(store.error(), Some("no media loaded"));
    }
}
