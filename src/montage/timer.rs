// SYNOID Montage Timers
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Single-shot timers used by the playback sequencer. `VirtualTimer` is a
// manual clock for tests; `TokioTimer` backs real previews.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

pub trait Timer {
    /// Arm a single-shot timer firing `after` from now.
    fn schedule(&mut self, after: Duration) -> TimerId;

    /// Disarm a timer. Unknown or already-fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

/// Manually advanced clock. Nothing fires until the owner asks for due timers.
#[derive(Debug, Default)]
pub struct VirtualTimer {
    now: Duration,
    next_id: u64,
    pending: Vec<(TimerId, Duration)>,
}

impl VirtualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Remove the earliest timer due at or before `until` and move the clock
    /// to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerId> {
        let (pos, &(id, deadline)) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (_, deadline))| *deadline <= until)
            .min_by_key(|(_, (_, deadline))| *deadline)?;
        self.pending.remove(pos);
        self.now = self.now.max(deadline);
        Some(id)
    }

    /// Move the clock forward to `until` once every due timer was handled.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

impl Timer for VirtualTimer {
    fn schedule(&mut self, after: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push((id, self.now + after));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|(pending, _)| *pending != id);
    }
}

/// Wall-clock timers on the tokio runtime. Each fire is reported on the
/// channel handed to `new`; cancelling aborts the sleeping task.
pub struct TokioTimer {
    next_id: u64,
    tasks: HashMap<TimerId, JoinHandle<()>>,
    tx: mpsc::UnboundedSender<TimerId>,
}

impl TokioTimer {
    pub fn new(tx: mpsc::UnboundedSender<TimerId>) -> Self {
        Self {
            next_id: 0,
            tasks: HashMap::new(),
            tx,
        }
    }
}

impl Timer for TokioTimer {
    fn schedule(&mut self, after: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(id);
        });
        self.tasks.insert(id, task);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_timer_fires_in_deadline_order() {
        let mut timer = VirtualTimer::new();
        let late = timer.schedule(Duration::from_secs(6));
        let early = timer.schedule(Duration::from_secs(4));

        let until = Duration::from_secs(10);
        assert_eq!(timer.pop_due(until), Some(early));
        assert_eq!(timer.now(), Duration::from_secs(4));
        assert_eq!(timer.pop_due(until), Some(late));
        assert_eq!(timer.pop_due(until), None);
        timer.settle(until);
        assert_eq!(timer.now(), until);
    }

    #[test]
    fn test_virtual_timer_cancel() {
        let mut timer = VirtualTimer::new();
        let id = timer.schedule(Duration::from_secs(1));
        timer.cancel(id);
        timer.cancel(id);
        assert_eq!(timer.pending_count(), 0);
        assert_eq!(timer.pop_due(Duration::from_secs(5)), None);
    }

    #[tokio::test]
    async fn test_tokio_timer_reports_and_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TokioTimer::new(tx);

        let cancelled = timer.schedule(Duration::from_millis(50));
        let kept = timer.schedule(Duration::from_millis(100));
        timer.cancel(cancelled);

        assert_eq!(rx.recv().await, Some(kept));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
    }
}
