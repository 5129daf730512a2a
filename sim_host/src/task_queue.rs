//! Per-context FIFO queue of eligible task ids.
//!
//! Provides deterministic ordering: ids are pulled in registration order.

use core_types::TaskId;
use std::collections::VecDeque;

/// Queue error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The id is already waiting in this queue.
    Duplicate(TaskId),
}

/// FIFO queue of task ids for one context.
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    ids: VecDeque<TaskId>,
}

impl TaskQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of queued ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns whether `id` is waiting in the queue.
    pub fn contains(&self, id: &TaskId) -> bool {
        self.ids.contains(id)
    }

    /// Appends an id; an id may be queued only once at a time.
    pub fn push(&mut self, id: TaskId) -> Result<(), QueueError> {
        if self.contains(&id) {
            return Err(QueueError::Duplicate(id));
        }
        self.ids.push_back(id);
        Ok(())
    }

    /// Pops the oldest id.
    pub fn pop(&mut self) -> Option<TaskId> {
        self.ids.pop_front()
    }

    /// Returns the oldest id without removing it.
    pub fn peek(&self) -> Option<&TaskId> {
        self.ids.front()
    }

    /// Snapshot of the queued ids, oldest first.
    pub fn ids(&self) -> Vec<TaskId> {
        self.ids.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_ordering() {
        let mut queue = TaskQueue::new();
        queue.push(TaskId::from("a")).unwrap();
        queue.push(TaskId::from("b")).unwrap();
        queue.push(TaskId::from("c")).unwrap();

        assert_eq!(queue.pop(), Some(TaskId::from("a")));
        assert_eq!(queue.pop(), Some(TaskId::from("b")));
        assert_eq!(queue.pop(), Some(TaskId::from("c")));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_queue_rejects_duplicate() {
        let mut queue = TaskQueue::new();
        queue.push(TaskId::from("a")).unwrap();
        assert_eq!(
            queue.push(TaskId::from("a")),
            Err(QueueError::Duplicate(TaskId::from("a")))
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_id_can_be_requeued_after_pop() {
        let mut queue = TaskQueue::new();
        queue.push(TaskId::from("a")).unwrap();
        queue.pop();
        assert!(queue.push(TaskId::from("a")).is_ok());
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut queue = TaskQueue::new();
        queue.push(TaskId::from(1u64)).unwrap();
        assert_eq!(queue.peek(), Some(&TaskId::from("1")));
        assert_eq!(queue.len(), 1);
    }
}
