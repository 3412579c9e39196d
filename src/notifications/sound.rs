//! Audio cue played when a notification arrives.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::store::{keys, Persisted, PreferenceStore};

/// Something that can play a short confirmation tone.
pub trait SoundPlayer: Send {
    fn play(&self) -> Result<()>;
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play(&self) -> Result<()> {
        let mut stderr = std::io::stderr();
        stderr.write_all(b"\x07").context("Failed to ring terminal bell")?;
        stderr.flush().context("Failed to ring terminal bell")?;
        Ok(())
    }
}

/// Plays nothing.
#[derive(Debug, Default)]
pub struct Silent;

impl SoundPlayer for Silent {
    fn play(&self) -> Result<()> {
        Ok(())
    }
}

/// A player gated by the persisted sound preference.
pub struct SoundEffects {
    enabled: Persisted<bool>,
    player: Box<dyn SoundPlayer>,
}

impl SoundEffects {
    pub fn new(store: Arc<dyn PreferenceStore>, player: Box<dyn SoundPlayer>) -> Self {
        Self {
            enabled: Persisted::load(store, keys::SOUND_ENABLED, true),
            player,
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.get()
    }

    /// Flip the preference and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.enabled.update(|on| *on = !*on);
        self.is_enabled()
    }

    /// Play the cue if enabled. Playback failures are logged and swallowed.
    pub fn play(&self) {
        if !self.is_enabled() {
            return;
        }
        if let Err(e) = self.player.play() {
            warn!(error = %e, "Error playing notification sound");
        }
    }
}

impl std::fmt::Debug for SoundEffects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEffects")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts plays, optionally failing each one.
    #[derive(Clone, Default)]
    pub struct CountingPlayer {
        pub plays: Arc<AtomicUsize>,
        pub fail: bool,
    }

    impl CountingPlayer {
        pub fn count(&self) -> usize {
            self.plays.load(Ordering::SeqCst)
        }
    }

    impl SoundPlayer for CountingPlayer {
        fn play(&self) -> Result<()> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("no audio device");
            }
            Ok(())
        }
    }
}
