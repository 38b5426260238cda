//! The queue capability: one trait, two realizations.
//!
//! `runnable`, `pending`, and `aperiodic` are priority heaps ordered by a
//! per-queue key function (deadline for the first two, re-taggable priority
//! for the third). `arrival`, `waiting`, `sleeping`, and `exited` are plain
//! FIFOs. Both kinds transparently skip (and finalize) `ToBeRemoved`
//! descriptors on dequeue, so callers never see a descriptor that is
//! already on its way out.

use slopos_abi::{QueueId, SchedError, ThreadId, ThreadStatus};
use slopos_lib::RingBuffer;

use super::arena::Arena;
use super::thread::ThreadDescriptor;

pub trait Queue<const N: usize> {
    fn id(&self) -> QueueId;
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn enqueue(&mut self, arena: &mut Arena<N>, tid: ThreadId) -> Result<(), SchedError>;
    fn dequeue(&mut self, arena: &mut Arena<N>) -> Result<ThreadId, SchedError>;
    fn remove_by_identity(
        &mut self,
        arena: &mut Arena<N>,
        tid: ThreadId,
    ) -> Result<ThreadId, SchedError>;
    fn peek(&self, arena: &Arena<N>) -> Option<ThreadId>;
}

/// Finalize a `ToBeRemoved` descriptor encountered while popping a queue:
/// mark it `Removed` and detach it from queue bookkeeping. Returns `true`
/// if the descriptor should be skipped rather than returned to the caller.
fn skip_if_removed<const N: usize>(arena: &mut Arena<N>, tid: ThreadId) -> bool {
    let desc = arena.get_mut(tid);
    if desc.status == ThreadStatus::ToBeRemoved {
        desc.set_status(ThreadStatus::Removed);
        desc.current_queue = QueueId::None;
        true
    } else {
        desc.current_queue = QueueId::None;
        false
    }
}

// ---------------------------------------------------------------------------
// HeapQueue: binary min-heap over a key read from the arena.
// ---------------------------------------------------------------------------

pub struct HeapQueue<const N: usize> {
    items: [ThreadId; N],
    size: usize,
    id: QueueId,
    key: fn(&ThreadDescriptor) -> u64,
}

impl<const N: usize> HeapQueue<N> {
    pub const fn new(id: QueueId, key: fn(&ThreadDescriptor) -> u64) -> Self {
        Self {
            items: [ThreadId::INVALID; N],
            size: 0,
            id,
            key,
        }
    }

    fn key_of(&self, arena: &Arena<N>, tid: ThreadId) -> u64 {
        (self.key)(arena.get(tid))
    }

    fn sift_up(&mut self, mut i: usize, arena: &Arena<N>) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.key_of(arena, self.items[parent]) <= self.key_of(arena, self.items[i]) {
                break;
            }
            self.items.swap(parent, i);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize, arena: &Arena<N>) {
        loop {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            let mut smallest = i;
            if left < self.size
                && self.key_of(arena, self.items[left]) < self.key_of(arena, self.items[smallest])
            {
                smallest = left;
            }
            if right < self.size
                && self.key_of(arena, self.items[right]) < self.key_of(arena, self.items[smallest])
            {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.items.swap(i, smallest);
            i = smallest;
        }
    }

    /// Non-owning iteration over the heap's current members, in no
    /// particular order beyond the heap invariant. Used by the admission
    /// controller to sum utilizations without dequeuing anything.
    pub fn iter(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.items[..self.size].iter().copied()
    }
}

impl<const N: usize> Queue<N> for HeapQueue<N> {
    #[inline]
    fn id(&self) -> QueueId {
        self.id
    }

    #[inline]
    fn len(&self) -> usize {
        self.size
    }

    fn enqueue(&mut self, arena: &mut Arena<N>, tid: ThreadId) -> Result<(), SchedError> {
        if self.size == N {
            return Err(SchedError::QueueFull(self.id));
        }
        self.items[self.size] = tid;
        self.size += 1;
        arena.get_mut(tid).current_queue = self.id;
        self.sift_up(self.size - 1, arena);
        Ok(())
    }

    fn dequeue(&mut self, arena: &mut Arena<N>) -> Result<ThreadId, SchedError> {
        loop {
            if self.size == 0 {
                return Err(SchedError::QueueEmpty(self.id));
            }
            let root = self.items[0];
            self.size -= 1;
            self.items[0] = self.items[self.size];
            if self.size > 0 {
                self.sift_down(0, arena);
            }
            if skip_if_removed(arena, root) {
                continue;
            }
            return Ok(root);
        }
    }

    fn remove_by_identity(
        &mut self,
        arena: &mut Arena<N>,
        tid: ThreadId,
    ) -> Result<ThreadId, SchedError> {
        let Some(pos) = self.items[..self.size].iter().position(|&x| x == tid) else {
            return Err(SchedError::NotFound(self.id, tid));
        };
        self.size -= 1;
        self.items[pos] = self.items[self.size];
        if pos < self.size {
            self.sift_down(pos, arena);
            self.sift_up(pos, arena);
        }
        arena.get_mut(tid).current_queue = QueueId::None;
        Ok(tid)
    }

    fn peek(&self, _arena: &Arena<N>) -> Option<ThreadId> {
        if self.size == 0 { None } else { Some(self.items[0]) }
    }
}

// ---------------------------------------------------------------------------
// RingQueue: FIFO with wrap-around, built on slopos_lib::RingBuffer.
// ---------------------------------------------------------------------------

pub struct RingQueue<const N: usize> {
    buf: RingBuffer<ThreadId, N>,
    id: QueueId,
}

impl<const N: usize> RingQueue<N> {
    pub fn new(id: QueueId) -> Self {
        Self {
            buf: RingBuffer::new(),
            id,
        }
    }

    /// Push without touching `current_queue` or the ToBeRemoved skip path.
    /// Used only by `exit()`, which pushes onto `exited` while the
    /// descriptor's `current_queue` still records where it is physically
    /// parked (if anywhere), so the housekeeper can find and evict it.
    pub fn push_raw(&mut self, tid: ThreadId) -> Result<(), SchedError> {
        if self.buf.try_push(tid) {
            Ok(())
        } else {
            Err(SchedError::QueueFull(self.id))
        }
    }

    pub fn pop_raw(&mut self) -> Option<ThreadId> {
        self.buf.try_pop()
    }
}

impl<const N: usize> Queue<N> for RingQueue<N> {
    #[inline]
    fn id(&self) -> QueueId {
        self.id
    }

    #[inline]
    fn len(&self) -> usize {
        self.buf.len() as usize
    }

    fn enqueue(&mut self, arena: &mut Arena<N>, tid: ThreadId) -> Result<(), SchedError> {
        if !self.buf.try_push(tid) {
            return Err(SchedError::QueueFull(self.id));
        }
        arena.get_mut(tid).current_queue = self.id;
        Ok(())
    }

    fn dequeue(&mut self, arena: &mut Arena<N>) -> Result<ThreadId, SchedError> {
        loop {
            let Some(tid) = self.buf.try_pop() else {
                return Err(SchedError::QueueEmpty(self.id));
            };
            if skip_if_removed(arena, tid) {
                continue;
            }
            return Ok(tid);
        }
    }

    fn remove_by_identity(
        &mut self,
        arena: &mut Arena<N>,
        tid: ThreadId,
    ) -> Result<ThreadId, SchedError> {
        match self.buf.remove_by(|&x| x == tid) {
            Some(found) => {
                arena.get_mut(found).current_queue = QueueId::None;
                Ok(found)
            }
            None => Err(SchedError::NotFound(self.id, tid)),
        }
    }

    fn peek(&self, _arena: &Arena<N>) -> Option<ThreadId> {
        self.buf.peek().copied()
    }
}
