//! One-shot tasks keyed by due tick, with cancellation per task and per class.
//!
//! Tasks are plain data (`T`) rather than closures: the owner drains due
//! tasks and interprets them with full mutable access to its own state.
//! Each task carries a class `C`; scheduling a new task of a class usually
//! cancels the pending ones first (see [`DeferredTaskQueue::schedule_exclusive`]).

use serde::{Deserialize, Serialize};

/// Opaque handle returned by `schedule`, usable with `cancel`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TaskId(pub u64);

#[derive(Clone, Debug)]
struct Entry<C, T> {
    id: TaskId,
    class: C,
    due: u64,
    task: T,
}

#[derive(Clone, Debug)]
pub struct DeferredTaskQueue<C, T> {
    /// Sorted by (due, id); ids are monotonic so equal due ticks fire in
    /// scheduling order.
    entries: Vec<Entry<C, T>>,
    next_id: u64,
}

impl<C, T> Default for DeferredTaskQueue<C, T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<C: Copy + Eq, T> DeferredTaskQueue<C, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, class: C, due_tick: u64, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let pos = self.entries.partition_point(|e| e.due <= due_tick);
        self.entries.insert(
            pos,
            Entry {
                id,
                class,
                due: due_tick,
                task,
            },
        );
        id
    }

    /// Cancel every pending task of `class`, then schedule the new one.
    pub fn schedule_exclusive(&mut self, class: C, due_tick: u64, task: T) -> TaskId {
        self.cancel_class(class);
        self.schedule(class, due_tick, task)
    }

    /// Returns false when the task already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Cancel all pending tasks of a class; returns how many were dropped.
    pub fn cancel_class(&mut self, class: C) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.class != class);
        before - self.entries.len()
    }

    pub fn is_pending(&self, class: C) -> bool {
        self.entries.iter().any(|e| e.class == class)
    }

    /// Due tick of the earliest pending task.
    pub fn next_due(&self) -> Option<u64> {
        self.entries.first().map(|e| e.due)
    }

    /// Remove and return every task due at or before `now`, in firing order.
    pub fn drain_due(&mut self, now: u64) -> Vec<T> {
        let split = self.entries.partition_point(|e| e.due <= now);
        self.entries.drain(..split).map(|e| e.task).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
