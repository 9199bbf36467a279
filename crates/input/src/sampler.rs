use glam::Vec2;
use parking_lot::Mutex;

use crate::action::{Action, ActionSet};

/// Input as seen by one frame: the held actions and the mouse motion
/// accumulated since the previous frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pub held: ActionSet,
    /// Relative pointer motion in pixels.
    pub mouse_delta: Vec2,
}

impl InputSnapshot {
    pub fn holding(actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            held: actions.into_iter().collect(),
            mouse_delta: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Default)]
struct Pending {
    held: ActionSet,
    mouse_delta: Vec2,
}

/// Collects input events as they arrive and hands each frame one
/// consistent [`InputSnapshot`].
///
/// Events may be fed from any thread. A snapshot is taken under a single
/// lock, so a frame never sees half of an event burst.
#[derive(Debug, Default)]
pub struct InputSampler {
    pending: Mutex<Pending>,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, action: Action) {
        self.pending.lock().held.insert(action.flag());
    }

    pub fn release(&self, action: Action) {
        self.pending.lock().held.remove(action.flag());
    }

    /// Drop every held action (e.g. when the window loses focus).
    pub fn release_all(&self) {
        self.pending.lock().held = ActionSet::empty();
    }

    pub fn add_mouse_motion(&self, dx: f32, dy: f32) {
        self.pending.lock().mouse_delta += Vec2::new(dx, dy);
    }

    /// Read the frame's input. Held actions persist; the mouse delta is
    /// consumed.
    pub fn snapshot(&self) -> InputSnapshot {
        let mut pending = self.pending.lock();
        let snapshot = InputSnapshot {
            held: pending.held,
            mouse_delta: pending.mouse_delta,
        };
        pending.mouse_delta = Vec2::ZERO;
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn snapshot_consumes_mouse_but_keeps_keys() {
        let sampler = InputSampler::new();
        sampler.press(Action::MoveForward);
        sampler.add_mouse_motion(3.0, -2.0);
        sampler.add_mouse_motion(1.0, 1.0);

        let first = sampler.snapshot();
        assert!(first.held.holds(Action::MoveForward));
        assert_eq!(first.mouse_delta, Vec2::new(4.0, -1.0));

        let second = sampler.snapshot();
        assert!(second.held.holds(Action::MoveForward));
        assert_eq!(second.mouse_delta, Vec2::ZERO);
    }

    #[test]
    fn release_and_release_all() {
        let sampler = InputSampler::new();
        sampler.press(Action::StrafeLeft);
        sampler.press(Action::Slow);
        sampler.release(Action::StrafeLeft);
        assert_eq!(sampler.snapshot().held, ActionSet::SLOW);
        sampler.release_all();
        assert!(sampler.snapshot().held.is_empty());
    }

    #[test]
    fn feeds_from_other_threads() {
        let sampler = Arc::new(InputSampler::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sampler = Arc::clone(&sampler);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        sampler.add_mouse_motion(1.0, 0.5);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sampler.snapshot().mouse_delta, Vec2::new(400.0, 200.0));
    }

    #[test]
    fn holding_builds_snapshot() {
        let snap = InputSnapshot::holding([Action::Ascend, Action::Slow]);
        assert!(snap.held.holds(Action::Ascend));
        assert!(snap.held.holds(Action::Slow));
        assert_eq!(snap.mouse_delta, Vec2::ZERO);
    }
}
