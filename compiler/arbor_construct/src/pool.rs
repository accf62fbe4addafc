//! Recycling record pool.
//!
//! Tree nodes and expression contexts live for a handful of actions each, so
//! a parse allocates and releases them constantly. [`Pool`] keeps released
//! records in place and hands them out again, so the backing storage only
//! grows to the peak number of simultaneously live records.
//!
//! Records are addressed by [`Handle`]s carrying a generation. Releasing a
//! record bumps its generation, so a handle kept past release is detected
//! instead of silently aliasing whatever reuses the slot.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::error::{Fault, PoolKind, Violation};

/// Reset a released record to its zeroed state, dropping anything it holds.
pub(crate) trait Recycle {
    fn recycle(&mut self);
}

/// Generation-checked index into a [`Pool<T>`].
pub(crate) struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    #[inline]
    const fn new(index: u32, generation: u32) -> Self {
        Handle {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    #[inline]
    const fn slot(self) -> usize {
        self.index as usize
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Clone for Handle<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

/// Occupancy counters for one pool.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Records currently handed out.
    pub live: usize,
    /// Records ever created; never exceeds the peak of `live`.
    pub capacity: usize,
    /// Allocations served from a released record.
    pub reused: u64,
}

struct Entry<T> {
    value: T,
    generation: u32,
    occupied: bool,
}

pub(crate) struct Pool<T> {
    entries: Vec<Entry<T>>,
    /// Released entry indices, most recent last.
    free: Vec<u32>,
    live: usize,
    reused: u64,
    limit: Option<usize>,
    kind: PoolKind,
}

impl<T: Recycle> Pool<T> {
    pub fn new(kind: PoolKind, capacity: usize, limit: Option<usize>) -> Self {
        Pool {
            entries: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            live: 0,
            reused: 0,
            limit,
            kind,
        }
    }

    /// Hand out a zeroed record, reusing a released one when possible.
    ///
    /// `make` builds a fresh record when the pool has to grow.
    pub fn alloc_with(&mut self, make: impl FnOnce() -> T) -> Result<Handle<T>, Fault> {
        if let Some(limit) = self.limit {
            if self.live >= limit {
                return Err(self.exhausted(limit));
            }
        }

        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.occupied = true;
            self.live += 1;
            self.reused += 1;
            return Ok(Handle::new(index, entry.generation));
        }

        let Ok(index) = u32::try_from(self.entries.len()) else {
            return Err(self.exhausted(self.entries.len()));
        };
        self.entries.push(Entry {
            value: make(),
            generation: 0,
            occupied: true,
        });
        self.live += 1;
        tracing::trace!(pool = %self.kind, capacity = self.entries.len(), "pool grew");
        Ok(Handle::new(index, 0))
    }

    /// Release a record for reuse. Whatever it still holds is dropped now.
    pub fn free(&mut self, handle: Handle<T>) -> Result<(), Violation> {
        let kind = self.kind;
        let entry = self
            .entries
            .get_mut(handle.slot())
            .filter(|entry| entry.occupied && entry.generation == handle.generation)
            .ok_or(Violation::StaleHandle(kind))?;
        entry.value.recycle();
        entry.occupied = false;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Ok(())
    }

    /// Release every live record at once.
    pub fn clear(&mut self) {
        for (index, entry) in (0u32..).zip(self.entries.iter_mut()) {
            if entry.occupied {
                entry.value.recycle();
                entry.occupied = false;
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(index);
            }
        }
        self.live = 0;
    }

    #[inline]
    pub fn get(&self, handle: Handle<T>) -> Result<&T, Violation> {
        self.entries
            .get(handle.slot())
            .filter(|entry| entry.occupied && entry.generation == handle.generation)
            .map(|entry| &entry.value)
            .ok_or(Violation::StaleHandle(self.kind))
    }

    #[inline]
    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, Violation> {
        let kind = self.kind;
        self.entries
            .get_mut(handle.slot())
            .filter(|entry| entry.occupied && entry.generation == handle.generation)
            .map(|entry| &mut entry.value)
            .ok_or(Violation::StaleHandle(kind))
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            live: self.live,
            capacity: self.entries.len(),
            reused: self.reused,
        }
    }

    fn exhausted(&self, limit: usize) -> Fault {
        Fault::Exhausted {
            pool: self.kind,
            limit,
        }
    }
}

#[cfg(test)]
mod tests;
