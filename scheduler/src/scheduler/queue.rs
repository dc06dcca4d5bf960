use super::{error::QueueOverflow, Pid, Priority};

/// A bounded circular FIFO of process ids.
///
/// The queue never looks at process state. Whoever pops a pid has to read the
/// current PCB from the process table before acting on it.
#[derive(Debug, Clone)]
pub struct ProcessQueue {
    slots: Vec<Pid>,
    head: usize,
    tail: usize,
    len: usize,
}

impl ProcessQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![Pid::new(0); capacity],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn push(&mut self, pid: Pid) -> Result<(), QueueOverflow> {
        if self.is_full() {
            return Err(QueueOverflow {
                pid,
                capacity: self.capacity(),
            });
        }

        self.slots[self.tail] = pid;
        self.tail = (self.tail + 1) % self.capacity();
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Pid> {
        if self.is_empty() {
            return None;
        }

        let pid = self.slots[self.head];
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        Some(pid)
    }

    /// Iterates the queued pids in service order.
    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        (0..self.len).map(move |offset| self.slots[(self.head + offset) % self.capacity()])
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.iter().any(|queued| queued == pid)
    }
}

/// The two ready queues. HIGH is always served before LOW.
#[derive(Debug, Clone)]
pub struct ReadyQueues {
    high: ProcessQueue,
    low: ProcessQueue,
}

impl ReadyQueues {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            high: ProcessQueue::with_capacity(capacity),
            low: ProcessQueue::with_capacity(capacity),
        }
    }

    pub fn queue(&self, priority: Priority) -> &ProcessQueue {
        match priority {
            Priority::High => &self.high,
            Priority::Low => &self.low,
        }
    }

    pub fn push(&mut self, priority: Priority, pid: Pid) -> Result<(), QueueOverflow> {
        match priority {
            Priority::High => self.high.push(pid),
            Priority::Low => self.low.push(pid),
        }
    }

    /// Pops from HIGH if it has anyone, otherwise from LOW.
    pub fn pop_next(&mut self) -> Option<Pid> {
        self.high.pop().or_else(|| self.low.pop())
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.low.is_empty()
    }
}
