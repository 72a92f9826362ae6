// THEORY:
// The scheduler replaces ad hoc `setTimeout` / `setInterval` calls with an
// explicit timer queue on virtual milliseconds. Every task carries a handle
// that can be cancelled synchronously, a due time, and an insertion order so
// tasks due at the same millisecond run first-in first-out.
//
// The queue does not run callbacks. It hands back the payload of the next due
// task and lets the owner dispatch it, which keeps all mutable state in one
// place and lets tests drive time by hand. A repeating task is re-armed before
// its payload is returned, so whatever the owner does with a tick can never
// stop the next one from being scheduled.

use std::collections::HashMap;
use tracing::trace;

/// Cancellable identity of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct ScheduledTask<E> {
    due_at: u64,
    order: u64,
    interval_ms: Option<u64>,
    payload: E,
}

/// A task that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct DueTask<E> {
    pub handle: TaskHandle,
    pub due_at: u64,
    pub payload: E,
}

#[derive(Debug)]
pub struct Scheduler<E> {
    tasks: HashMap<TaskHandle, ScheduledTask<E>>,
    next_handle: u64,
    next_order: u64,
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            next_handle: 1,
            next_order: 0,
        }
    }

    /// Runs `payload` once at `now_ms + delay_ms`.
    pub fn schedule_once(&mut self, now_ms: u64, delay_ms: u64, payload: E) -> TaskHandle {
        self.insert(now_ms.saturating_add(delay_ms), None, payload)
    }

    /// Runs `payload` every `interval_ms`, first at `now_ms + interval_ms`.
    /// A zero interval is treated as 1ms so the queue always makes progress.
    pub fn schedule_repeating(&mut self, now_ms: u64, interval_ms: u64, payload: E) -> TaskHandle {
        let interval_ms = interval_ms.max(1);
        self.insert(now_ms.saturating_add(interval_ms), Some(interval_ms), payload)
    }

    /// Returns whether the task was still pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let removed = self.tasks.remove(&handle).is_some();
        trace!(handle = handle.0, removed, "cancel task");
        removed
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<u64> {
        self.tasks.values().map(|task| task.due_at).min()
    }

    /// Pops the earliest task due at or before `due_limit`. Repeating tasks
    /// are re-armed one interval after the time they were due. A repeating
    /// task more than one interval behind is merged into a single run at
    /// `due_limit`, the way a browser folds missed interval callbacks.
    pub fn pop_due(&mut self, due_limit: u64) -> Option<DueTask<E>> {
        self.merge_overdue(due_limit);
        let handle = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due_at <= due_limit)
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(handle, _)| *handle)?;

        let task = self.tasks.remove(&handle)?;
        if let Some(interval_ms) = task.interval_ms {
            let order = self.bump_order();
            self.tasks.insert(
                handle,
                ScheduledTask {
                    due_at: task.due_at.saturating_add(interval_ms),
                    order,
                    interval_ms: Some(interval_ms),
                    payload: task.payload.clone(),
                },
            );
        }

        Some(DueTask {
            handle,
            due_at: task.due_at,
            payload: task.payload,
        })
    }

    fn merge_overdue(&mut self, due_limit: u64) {
        for (handle, task) in self.tasks.iter_mut() {
            let Some(interval_ms) = task.interval_ms else {
                continue;
            };
            if task.due_at.saturating_add(interval_ms) < due_limit {
                trace!(handle = handle.0, from = task.due_at, to = due_limit, "merge missed runs");
                task.due_at = due_limit;
            }
        }
    }

    fn insert(&mut self, due_at: u64, interval_ms: Option<u64>, payload: E) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        let order = self.bump_order();
        self.tasks.insert(
            handle,
            ScheduledTask {
                due_at,
                order,
                interval_ms,
                payload,
            },
        );
        trace!(handle = handle.0, due_at, ?interval_ms, "schedule task");
        handle
    }

    fn bump_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }
}

impl<E: Clone> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
