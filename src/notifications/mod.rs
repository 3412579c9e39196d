//! Notification center: auto-expiring banners for trade events.
//!
//! Each banner is hidden after the display timeout and removed after a
//! further fade delay. Dismissing early runs the same two steps.

mod sound;

use tracing::debug;

use crate::ids::IdGenerator;
use crate::models::{Notification, Trade};
use crate::scheduler::{Scheduler, Task};

pub use sound::{Silent, SoundEffects, SoundPlayer, TerminalBell};

#[cfg(test)]
pub(crate) use sound::testing;

/// Active notifications and their fade timers.
#[derive(Debug)]
pub struct NotificationCenter {
    active: Vec<Notification>,
    ids: IdGenerator,
    sound: SoundEffects,
    display_ms: u64,
    fade_ms: u64,
}

impl NotificationCenter {
    pub fn new(sound: SoundEffects, display_ms: u64, fade_ms: u64) -> Self {
        Self {
            active: Vec::new(),
            ids: IdGenerator::new(),
            sound,
            display_ms,
            fade_ms,
        }
    }

    /// Raise a notification for `trade`, optionally replacing its note with `message`.
    pub fn add(&mut self, scheduler: &mut Scheduler, trade: &Trade, message: Option<String>) -> u64 {
        let mut snapshot = trade.clone();
        if let Some(message) = message {
            snapshot.notes = Some(message);
        }

        let id = self.ids.next();
        self.active.push(Notification {
            id,
            trade: snapshot,
            visible: true,
        });
        self.sound.play();
        scheduler.schedule(self.display_ms, Task::HideNotification(id));

        debug!(id = id, trade_id = trade.id, "Notification added");
        id
    }

    /// Start fading `id` out now. Returns false if it is not visible.
    pub fn dismiss(&mut self, scheduler: &mut Scheduler, id: u64) -> bool {
        self.hide(scheduler, id)
    }

    /// Timer callback: hide a visible notification and schedule its removal.
    pub fn hide(&mut self, scheduler: &mut Scheduler, id: u64) -> bool {
        match self.active.iter_mut().find(|n| n.id == id && n.visible) {
            Some(n) => {
                n.visible = false;
                scheduler.schedule(self.fade_ms, Task::RemoveNotification(id));
                true
            }
            None => false,
        }
    }

    /// Timer callback: drop a notification from the active set.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.active.len();
        self.active.retain(|n| n.id != id);
        before != self.active.len()
    }

    pub fn active(&self) -> &[Notification] {
        &self.active
    }

    pub fn get(&self, id: u64) -> Option<&Notification> {
        self.active.iter().find(|n| n.id == id)
    }

    pub fn sound(&self) -> &SoundEffects {
        &self.sound
    }

    pub fn sound_mut(&mut self) -> &mut SoundEffects {
        &mut self.sound
    }
}
