//! External collaborators the gameplay layer calls into.
//!
//! Progression (level completion, restarts, death counting), audio playback
//! and scene reloading live outside this crate. They are injected as trait
//! objects when a [`Simulation`](crate::simulation::Simulation) is built, so
//! tests can substitute recording fakes.
//!
//! Every collaborator is optional. A missing collaborator never stops a
//! sequence: audio is skipped silently, a missing progression service is
//! reported with `warn!`, and restarts fall back to a direct scene reload.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Identifier of an audio clip known to the audio collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(String);

impl ClipId {
    /// Creates a clip identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The clip name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClipId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Level progression: completion, restarts and the death counter.
pub trait Progression: Send + Sync {
    /// Marks the current level complete and moves on.
    fn complete_level(&self);
    /// Restarts the current level.
    fn restart_level(&self);
    /// Adds `count` deaths to the persistent counter.
    fn add_death(&self, count: u32);
}

/// Fire-and-forget sound playback.
pub trait Audio: Send + Sync {
    /// Plays `clip` once at `volume` (0 to 1).
    fn play_one_shot(&self, clip: &ClipId, volume: f32);
}

/// Direct scene reload, used when no progression service is present.
pub trait SceneLoader: Send + Sync {
    /// Reloads the active scene from scratch.
    fn reload_active_scene(&self);
}

/// Which collaborator handled a restart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartRoute {
    /// Routed through [`Progression::restart_level`].
    Progression,
    /// Fell back to [`SceneLoader::reload_active_scene`].
    SceneReload,
    /// Nobody could restart the level.
    Unavailable,
}

/// The set of injected collaborators.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use skyhop_core::services::{Progression, RestartRoute, Services};
///
/// #[derive(Default)]
/// struct Deaths(Mutex<u32>);
///
/// impl Progression for Deaths {
///     fn complete_level(&self) {}
///     fn restart_level(&self) {}
///     fn add_death(&self, count: u32) {
///         *self.0.lock().unwrap() += count;
///     }
/// }
///
/// let deaths = Arc::new(Deaths::default());
/// let services = Services::new().with_progression(deaths.clone());
/// services.add_death(1);
/// assert_eq!(*deaths.0.lock().unwrap(), 1);
/// assert_eq!(services.restart_level(), RestartRoute::Progression);
/// ```
#[derive(Clone, Default)]
pub struct Services {
    progression: Option<Arc<dyn Progression>>,
    audio: Option<Arc<dyn Audio>>,
    scene_loader: Option<Arc<dyn SceneLoader>>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("progression", &self.progression.is_some())
            .field("audio", &self.audio.is_some())
            .field("scene_loader", &self.scene_loader.is_some())
            .finish()
    }
}

impl Services {
    /// No collaborators at all.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the progression collaborator.
    #[must_use]
    pub fn with_progression(mut self, progression: Arc<dyn Progression>) -> Self {
        self.progression = Some(progression);
        self
    }

    /// Installs the audio collaborator.
    #[must_use]
    pub fn with_audio(mut self, audio: Arc<dyn Audio>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Installs the scene reload fallback.
    #[must_use]
    pub fn with_scene_loader(mut self, loader: Arc<dyn SceneLoader>) -> Self {
        self.scene_loader = Some(loader);
        self
    }

    /// Whether a progression collaborator is installed.
    #[must_use]
    pub fn has_progression(&self) -> bool {
        self.progression.is_some()
    }

    /// Plays `clip` if both the clip and an audio collaborator exist.
    ///
    /// Returns whether anything was played.
    pub fn play(&self, clip: Option<&ClipId>, volume: f32) -> bool {
        match (clip, &self.audio) {
            (Some(clip), Some(audio)) => {
                audio.play_one_shot(clip, volume);
                true
            }
            _ => false,
        }
    }

    /// Reports deaths. A missing progression service drops the count.
    pub fn add_death(&self, count: u32) {
        match &self.progression {
            Some(progression) => progression.add_death(count),
            None => warn!(count, "no progression service; death not counted"),
        }
    }

    /// Requests a restart, falling back to a direct scene reload.
    pub fn restart_level(&self) -> RestartRoute {
        if let Some(progression) = &self.progression {
            progression.restart_level();
            RestartRoute::Progression
        } else if let Some(loader) = &self.scene_loader {
            loader.reload_active_scene();
            RestartRoute::SceneReload
        } else {
            warn!("no progression service or scene loader; restart dropped");
            RestartRoute::Unavailable
        }
    }

    /// Reports level completion. Returns false (after a warning) when no
    /// progression service is installed.
    pub fn complete_level(&self) -> bool {
        match &self.progression {
            Some(progression) => {
                progression.complete_level();
                true
            }
            None => {
                warn!("no progression service; level completion dropped");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Counter {
        reloads: AtomicU32,
        plays: AtomicU32,
    }

    impl SceneLoader for Counter {
        fn reload_active_scene(&self) {
            self.reloads.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Audio for Counter {
        fn play_one_shot(&self, _clip: &ClipId, _volume: f32) {
            self.plays.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn restart_falls_back_to_scene_reload() {
        let loader = Arc::new(Counter::default());
        let services = Services::new().with_scene_loader(loader.clone());
        assert_eq!(services.restart_level(), RestartRoute::SceneReload);
        assert_eq!(loader.reloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_collaborators_are_not_fatal() {
        let services = Services::new();
        services.add_death(1);
        assert!(!services.complete_level());
        assert_eq!(services.restart_level(), RestartRoute::Unavailable);
        assert!(!services.play(Some(&ClipId::new("jump")), 1.0));
    }

    #[test]
    fn play_needs_a_clip() {
        let audio = Arc::new(Counter::default());
        let services = Services::new().with_audio(audio.clone());
        assert!(!services.play(None, 1.0));
        assert!(services.play(Some(&"land".into()), 0.8));
        assert_eq!(audio.plays.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn debug_lists_installed_collaborators() {
        let services = Services::new().with_audio(Arc::new(Counter::default()));
        let text = format!("{services:?}");
        assert!(text.contains("audio: true"));
        assert!(text.contains("progression: false"));
    }
}
