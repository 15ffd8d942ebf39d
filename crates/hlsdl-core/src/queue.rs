//! Work queue of pending segment indices plus the completion counter.
//!
//! Both live under one mutex so that "queue empty but work still in flight" and
//! "queue empty and every segment accounted for" are told apart atomically.
//! Workers that find the queue empty wait on a condvar instead of spinning; the
//! last completion (or abandonment) wakes everyone to observe end-of-work.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("invalid segment index: {index} (segment count {total})")]
    InvalidIndex { index: usize, total: usize },
    #[error("segment {0} is not in flight")]
    NotInFlight(usize),
}

/// Result of a non-blocking take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Take {
    /// Process this index; it is now in flight for the caller.
    Segment(usize),
    /// Queue is empty but some index is still in flight and may be requeued.
    TryAgain,
    /// Every segment is completed or abandoned.
    Done,
}

/// Where an index currently is. Each index is in exactly one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Pending,
    InFlight,
    Completed,
    Abandoned,
}

#[derive(Debug)]
struct State {
    pending: VecDeque<usize>,
    slots: Vec<Slot>,
    completed: usize,
    abandoned: usize,
}

impl State {
    fn accounted_for(&self) -> bool {
        self.completed + self.abandoned == self.slots.len()
    }

    fn take_in_flight(&mut self, index: usize) -> Result<(), QueueError> {
        match self.slots.get(index) {
            None => Err(QueueError::InvalidIndex {
                index,
                total: self.slots.len(),
            }),
            Some(Slot::InFlight) => Ok(()),
            Some(_) => Err(QueueError::NotInFlight(index)),
        }
    }
}

/// Shared queue + completion counter for one run.
#[derive(Debug)]
pub struct WorkQueue {
    state: Mutex<State>,
    changed: Condvar,
}

impl WorkQueue {
    /// Queue holding `[0, total)` in ascending order.
    pub fn new(total: usize) -> Self {
        Self {
            state: Mutex::new(State {
                pending: (0..total).collect(),
                slots: vec![Slot::Pending; total],
                completed: 0,
                abandoned: 0,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A worker panicking mid-update leaves only counters behind; keep going.
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn total(&self) -> usize {
        self.lock().slots.len()
    }

    /// Number of segments successfully persisted so far.
    pub fn completed(&self) -> usize {
        self.lock().completed
    }

    pub fn abandoned(&self) -> usize {
        self.lock().abandoned
    }

    /// Pop the next index without blocking.
    pub fn try_take(&self) -> Take {
        let mut st = self.lock();
        Self::take_locked(&mut st)
    }

    fn take_locked(st: &mut State) -> Take {
        match st.pending.pop_front() {
            Some(index) => {
                st.slots[index] = Slot::InFlight;
                Take::Segment(index)
            }
            None if st.accounted_for() => Take::Done,
            None => Take::TryAgain,
        }
    }

    /// Pop the next index, waiting while the queue is empty but work is in flight.
    /// Returns `None` once every segment is accounted for.
    pub fn take(&self) -> Option<usize> {
        let mut st = self.lock();
        loop {
            match Self::take_locked(&mut st) {
                Take::Segment(index) => return Some(index),
                Take::Done => return None,
                Take::TryAgain => {
                    st = self
                        .changed
                        .wait(st)
                        .unwrap_or_else(|p| p.into_inner());
                }
            }
        }
    }

    /// Put an in-flight index back at the tail for another attempt.
    pub fn requeue(&self, index: usize) -> Result<(), QueueError> {
        let mut st = self.lock();
        st.take_in_flight(index)?;
        st.slots[index] = Slot::Pending;
        st.pending.push_back(index);
        drop(st);
        self.changed.notify_one();
        Ok(())
    }

    /// Record a successful persist. Returns the new completed count.
    pub fn complete(&self, index: usize) -> Result<usize, QueueError> {
        let mut st = self.lock();
        st.take_in_flight(index)?;
        st.slots[index] = Slot::Completed;
        st.completed += 1;
        let completed = st.completed;
        let done = st.accounted_for();
        drop(st);
        if done {
            self.changed.notify_all();
        }
        Ok(completed)
    }

    /// Give up on an in-flight index; it counts as accounted for but not completed.
    pub fn abandon(&self, index: usize) -> Result<(), QueueError> {
        let mut st = self.lock();
        st.take_in_flight(index)?;
        st.slots[index] = Slot::Abandoned;
        st.abandoned += 1;
        let done = st.accounted_for();
        drop(st);
        if done {
            self.changed.notify_all();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn takes_in_ascending_order() {
        let q = WorkQueue::new(3);
        assert_eq!(q.try_take(), Take::Segment(0));
        assert_eq!(q.try_take(), Take::Segment(1));
        assert_eq!(q.try_take(), Take::Segment(2));
        assert_eq!(q.try_take(), Take::TryAgain);
    }

    #[test]
    fn empty_queue_is_done_immediately() {
        let q = WorkQueue::new(0);
        assert_eq!(q.try_take(), Take::Done);
        assert_eq!(q.take(), None);
    }

    #[test]
    fn requeue_appends_to_tail() {
        let q = WorkQueue::new(3);
        assert_eq!(q.take(), Some(0));
        q.requeue(0).unwrap();
        assert_eq!(q.take(), Some(1));
        assert_eq!(q.take(), Some(2));
        assert_eq!(q.take(), Some(0));
    }

    #[test]
    fn done_only_after_all_accounted_for() {
        let q = WorkQueue::new(2);
        let a = q.take().unwrap();
        let b = q.take().unwrap();
        assert_eq!(q.complete(a), Ok(1));
        assert_eq!(q.try_take(), Take::TryAgain);
        q.abandon(b).unwrap();
        assert_eq!(q.try_take(), Take::Done);
        assert_eq!(q.completed(), 1);
        assert_eq!(q.abandoned(), 1);
    }

    #[test]
    fn requeue_rejects_out_of_range_index() {
        let q = WorkQueue::new(2);
        assert_eq!(
            q.requeue(5),
            Err(QueueError::InvalidIndex { index: 5, total: 2 })
        );
    }

    #[test]
    fn index_cannot_be_completed_twice_or_requeued_while_pending() {
        let q = WorkQueue::new(2);
        let i = q.take().unwrap();
        q.complete(i).unwrap();
        assert_eq!(q.complete(i), Err(QueueError::NotInFlight(i)));
        assert_eq!(q.requeue(1), Err(QueueError::NotInFlight(1)));
        assert_eq!(q.completed(), 1);
    }

    #[test]
    fn blocked_take_wakes_on_requeue() {
        let q = Arc::new(WorkQueue::new(1));
        let i = q.take().unwrap();
        let q2 = Arc::clone(&q);
        let waiter = std::thread::spawn(move || q2.take());
        std::thread::sleep(Duration::from_millis(50));
        q.requeue(i).unwrap();
        assert_eq!(waiter.join().unwrap(), Some(0));
    }

    #[test]
    fn blocked_takers_all_released_on_last_completion() {
        let q = Arc::new(WorkQueue::new(1));
        let i = q.take().unwrap();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let q = Arc::clone(&q);
                std::thread::spawn(move || q.take())
            })
            .collect();
        std::thread::sleep(Duration::from_millis(50));
        q.complete(i).unwrap();
        for w in waiters {
            assert_eq!(w.join().unwrap(), None);
        }
    }
}
