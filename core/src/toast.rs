//! Toast notification lifecycle.
//!
//! Each toast counts down from 100% to 0% in fixed steps, one per tick,
//! then spends a short exit grace in the `Expiring` phase before removal.
//! Hovering pauses the countdown; manual close skips straight to `Expiring`.
//!
//! The manager is plain data driven by [`ToastManager::tick`]; the host (or
//! [`crate::ticker`]) decides when ticks happen. Toasts stay in insertion
//! order and removing one never reorders the rest.

use crate::error::ApiError;

/// Interval between countdown ticks.
pub const TICK_INTERVAL_MS: u64 = 100;

/// Duration used by [`ToastManager::success`] and [`ToastManager::error`].
pub const DEFAULT_DURATION_MS: u64 = 4000;

/// Exit animation time between close and removal.
pub const EXIT_GRACE_MS: u64 = 300;

const EXIT_GRACE_TICKS: u32 = (EXIT_GRACE_MS / TICK_INTERVAL_MS) as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn title(self) -> &'static str {
        match self {
            ToastKind::Success => "Success!",
            ToastKind::Error => "Error!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    /// Closed, waiting out the exit grace. Holds the ticks left.
    Expiring(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    id: ToastId,
    message: String,
    kind: ToastKind,
    duration_ms: u64,
    remaining_percent: f64,
    paused: bool,
    phase: Phase,
}

impl Toast {
    pub fn id(&self) -> ToastId {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ToastKind {
        self.kind
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Progress bar width, 0.0 to 100.0.
    pub fn remaining_percent(&self) -> f64 {
        self.remaining_percent
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_expiring(&self) -> bool {
        matches!(self.phase, Phase::Expiring(_))
    }

    /// Percent removed per tick. Durations shorter than one tick expire on
    /// the first tick.
    fn step(&self) -> f64 {
        let ticks = self.duration_ms.max(TICK_INTERVAL_MS) as f64 / TICK_INTERVAL_MS as f64;
        100.0 / ticks
    }
}

/// Ordered collection of live toasts.
#[derive(Debug)]
pub struct ToastManager {
    toasts: Vec<Toast>,
    next_id: u64,
    exit_grace_ticks: u32,
}

impl Default for ToastManager {
    fn default() -> Self {
        Self {
            toasts: Vec::new(),
            next_id: 0,
            exit_grace_ticks: EXIT_GRACE_TICKS,
        }
    }
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager for hosts with no exit animation: closed toasts are removed
    /// immediately.
    pub fn without_exit_grace() -> Self {
        Self {
            exit_grace_ticks: 0,
            ..Self::default()
        }
    }

    /// Appends a toast at 100% and returns its id.
    pub fn enqueue(&mut self, message: impl Into<String>, kind: ToastKind, duration_ms: u64) -> ToastId {
        let id = ToastId(self.next_id);
        self.next_id += 1;
        let toast = Toast {
            id,
            message: message.into(),
            kind,
            duration_ms,
            remaining_percent: 100.0,
            paused: false,
            phase: Phase::Active,
        };
        tracing::debug!(id = id.0, ?kind, duration_ms, "toast enqueued");
        self.toasts.push(toast);
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> ToastId {
        self.enqueue(message, ToastKind::Success, DEFAULT_DURATION_MS)
    }

    pub fn error(&mut self, message: impl Into<String>) -> ToastId {
        self.enqueue(message, ToastKind::Error, DEFAULT_DURATION_MS)
    }

    /// Shows a failed call as an error toast.
    pub fn report(&mut self, error: &ApiError) -> ToastId {
        tracing::warn!(%error, "reporting failure to user");
        self.error(error.user_message())
    }

    /// Freezes the countdown of an active toast. Idempotent.
    pub fn pause(&mut self, id: ToastId) {
        if let Some(toast) = self.active_mut(id) {
            toast.paused = true;
        }
    }

    /// Continues the countdown from where it was frozen.
    pub fn resume(&mut self, id: ToastId) {
        if let Some(toast) = self.active_mut(id) {
            toast.paused = false;
        }
    }

    /// Starts the exit of a toast. No-op for unknown or already expiring ids.
    pub fn dismiss(&mut self, id: ToastId) {
        if self.active_mut(id).is_none() {
            return;
        }
        if self.exit_grace_ticks == 0 {
            self.remove(id);
            return;
        }
        let grace = self.exit_grace_ticks;
        if let Some(toast) = self.active_mut(id) {
            toast.phase = Phase::Expiring(grace);
            tracing::debug!(id = id.0, "toast dismissed");
        }
    }

    /// Drops a toast immediately, skipping the exit grace.
    pub fn remove(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        let removed = self.toasts.len() < before;
        if removed {
            tracing::debug!(id = id.0, "toast removed");
        }
        removed
    }

    /// Advances every running countdown by one step and retires toasts whose
    /// exit grace ran out. Returns the ids removed by this tick.
    pub fn tick(&mut self) -> Vec<ToastId> {
        let grace = self.exit_grace_ticks;
        let mut removed = Vec::new();
        for toast in &mut self.toasts {
            match toast.phase {
                Phase::Active if toast.paused => {}
                Phase::Active => {
                    let next = toast.remaining_percent - toast.step();
                    if next <= 0.0 {
                        toast.remaining_percent = 0.0;
                        toast.phase = Phase::Expiring(grace);
                        if grace == 0 {
                            removed.push(toast.id);
                        }
                    } else {
                        toast.remaining_percent = next;
                    }
                }
                Phase::Expiring(left) => {
                    let left = left.saturating_sub(1);
                    toast.phase = Phase::Expiring(left);
                    if left == 0 {
                        removed.push(toast.id);
                    }
                }
            }
        }
        if !removed.is_empty() {
            self.toasts.retain(|t| !removed.contains(&t.id));
            tracing::debug!(count = removed.len(), "toasts expired");
        }
        removed
    }

    pub fn get(&self, id: ToastId) -> Option<&Toast> {
        self.toasts.iter().find(|t| t.id == id)
    }

    /// Toasts in display (insertion) order.
    pub fn toasts(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn clear(&mut self) {
        self.toasts.clear();
    }

    fn active_mut(&mut self, id: ToastId) -> Option<&mut Toast> {
        self.toasts
            .iter_mut()
            .find(|t| t.id == id && t.phase == Phase::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(manager: &ToastManager) -> Vec<ToastId> {
        manager.toasts().map(Toast::id).collect()
    }

    #[test]
    fn enqueue_starts_full_and_returns_unique_ids() {
        let mut m = ToastManager::new();
        let a = m.success("Crop added successfully!");
        let b = m.error("Failed to add crop");
        assert_ne!(a, b);
        let toast = m.get(a).unwrap();
        assert_eq!(toast.remaining_percent(), 100.0);
        assert_eq!(toast.kind().title(), "Success!");
        assert_eq!(toast.duration_ms(), DEFAULT_DURATION_MS);
        assert!(!toast.is_paused());
    }

    #[test]
    fn default_duration_expires_after_forty_ticks_plus_grace() {
        let mut m = ToastManager::new();
        let id = m.success("saved");
        for _ in 0..39 {
            assert!(m.tick().is_empty());
        }
        assert!(m.get(id).unwrap().remaining_percent() > 0.0);
        m.tick();
        let toast = m.get(id).unwrap();
        assert_eq!(toast.remaining_percent(), 0.0);
        assert!(toast.is_expiring());

        assert!(m.tick().is_empty());
        assert!(m.tick().is_empty());
        assert_eq!(m.tick(), vec![id]);
        assert!(m.is_empty());
    }

    #[test]
    fn remaining_never_increases_while_running() {
        let mut m = ToastManager::new();
        let id = m.enqueue("hello", ToastKind::Success, 1500);
        let mut last = 100.0;
        while let Some(toast) = m.get(id) {
            assert!(toast.remaining_percent() <= last);
            last = toast.remaining_percent();
            m.tick();
        }
    }

    #[test]
    fn paused_toast_is_frozen_and_resumes_from_same_value() {
        let mut m = ToastManager::new();
        let id = m.success("hover me");
        for _ in 0..10 {
            m.tick();
        }
        let frozen = m.get(id).unwrap().remaining_percent();
        assert!((frozen - 75.0).abs() < 1e-9);

        m.pause(id);
        m.pause(id);
        for _ in 0..100 {
            m.tick();
        }
        assert_eq!(m.get(id).unwrap().remaining_percent(), frozen);

        m.resume(id);
        m.tick();
        assert!((m.get(id).unwrap().remaining_percent() - 72.5).abs() < 1e-9);
    }

    #[test]
    fn dismiss_waits_out_exit_grace() {
        let mut m = ToastManager::new();
        let id = m.error("nope");
        m.pause(id);
        m.dismiss(id);
        assert!(m.get(id).unwrap().is_expiring());
        m.dismiss(id);
        m.tick();
        m.tick();
        assert!(m.get(id).is_some());
        m.tick();
        assert!(m.get(id).is_none());
    }

    #[test]
    fn without_exit_grace_removes_immediately() {
        let mut m = ToastManager::without_exit_grace();
        let a = m.success("a");
        let b = m.enqueue("b", ToastKind::Success, 100);
        m.dismiss(a);
        assert!(m.get(a).is_none());
        assert_eq!(m.tick(), vec![b]);
        assert!(m.is_empty());
    }

    #[test]
    fn removing_first_keeps_relative_order() {
        let mut m = ToastManager::without_exit_grace();
        let all: Vec<ToastId> = (0..5).map(|i| m.success(format!("toast {i}"))).collect();
        m.dismiss(all[0]);
        assert_eq!(ids(&m), all[1..].to_vec());
        m.remove(all[2]);
        assert_eq!(ids(&m), vec![all[1], all[3], all[4]]);
    }

    #[test]
    fn unknown_ids_are_noops() {
        let mut m = ToastManager::new();
        let id = m.success("x");
        assert!(m.remove(id));
        m.pause(id);
        m.resume(id);
        m.dismiss(id);
        assert!(!m.remove(id));
        assert!(m.tick().is_empty());
    }

    #[test]
    fn zero_duration_expires_on_first_tick() {
        let mut m = ToastManager::without_exit_grace();
        let id = m.enqueue("flash", ToastKind::Error, 0);
        assert_eq!(m.tick(), vec![id]);
    }

    #[test]
    fn report_uses_user_message() {
        let mut m = ToastManager::new();
        let id = m.report(&ApiError::Http {
            status: 400,
            message: "Insufficient quantity".to_string(),
        });
        let toast = m.get(id).unwrap();
        assert_eq!(toast.kind(), ToastKind::Error);
        assert_eq!(toast.message(), "Insufficient quantity");
    }
}
