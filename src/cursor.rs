use std::fmt;
use std::ops::{Deref, Range};
use std::sync::Arc;

/// An owned view over a contiguous run of elements that can be split in two.
///
/// A cursor stands for the position of a chunk: splitting it at `mid` yields the
/// first `mid` elements and the rest, and the halves never overlap.
pub trait Cursor: Sized + Send + 'static {
    fn len(&self) -> usize;

    /// Splits into `[0, mid)` and `[mid, len)`; `mid` is clamped to `len`.
    fn split_at(self, mid: usize) -> (Self, Self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cursor for Range<usize> {
    fn len(&self) -> usize {
        ExactSizeIterator::len(self)
    }

    fn split_at(self, mid: usize) -> (Self, Self) {
        let mid = self.start + mid.min(Cursor::len(&self));
        (self.start .. mid, mid .. self.end)
    }
}

impl<T> Cursor for Vec<T> where T: Send + 'static {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn split_at(mut self, mid: usize) -> (Self, Self) {
        let tail = self.split_off(mid.min(Vec::len(&self)));
        (self, tail)
    }
}

impl<A, B> Cursor for (A, B) where A: Cursor, B: Cursor {
    fn len(&self) -> usize {
        self.0.len().min(self.1.len())
    }

    fn split_at(self, mid: usize) -> (Self, Self) {
        let (a_head, a_tail) = self.0.split_at(mid);
        let (b_head, b_tail) = self.1.split_at(mid);
        ((a_head, b_head), (a_tail, b_tail))
    }
}

/// Cheaply cloneable window into shared, immutable data.
pub struct SharedSlice<T> {
    data: Arc<[T]>,
    start: usize,
    end: usize,
}

impl<T> SharedSlice<T> {
    pub fn new(data: Arc<[T]>) -> SharedSlice<T> {
        let end = data.len();
        SharedSlice { data, start: 0, end }
    }

    /// Offset of this window inside the whole shared data.
    pub fn offset(&self) -> usize {
        self.start
    }

    /// The whole shared data, regardless of this window.
    pub fn whole(&self) -> &[T] {
        &self.data
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data[self.start .. self.end]
    }

    /// A sub-window, relative to this one; bounds are clamped.
    pub fn slice(&self, range: Range<usize>) -> SharedSlice<T> {
        let end = self.start.saturating_add(range.end).min(self.end);
        let start = self.start.saturating_add(range.start).min(end);
        SharedSlice { data: self.data.clone(), start, end }
    }
}

impl<T> Clone for SharedSlice<T> {
    fn clone(&self) -> Self {
        SharedSlice { data: self.data.clone(), start: self.start, end: self.end }
    }
}

impl<T> Deref for SharedSlice<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> From<Vec<T>> for SharedSlice<T> {
    fn from(data: Vec<T>) -> Self {
        SharedSlice::new(data.into())
    }
}

impl<T> From<Arc<[T]>> for SharedSlice<T> {
    fn from(data: Arc<[T]>) -> Self {
        SharedSlice::new(data)
    }
}

impl<T> From<&[T]> for SharedSlice<T> where T: Clone {
    fn from(data: &[T]) -> Self {
        SharedSlice::new(data.into())
    }
}

impl<T> fmt::Debug for SharedSlice<T> where T: fmt::Debug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSlice")
            .field("start", &self.start)
            .field("items", &self.as_slice())
            .finish()
    }
}

impl<T> Cursor for SharedSlice<T> where T: Send + Sync + 'static {
    fn len(&self) -> usize {
        self.end - self.start
    }

    fn split_at(self, mid: usize) -> (Self, Self) {
        let mid = self.start + mid.min(self.end - self.start);
        let head = SharedSlice { data: self.data.clone(), start: self.start, end: mid };
        let tail = SharedSlice { data: self.data, start: mid, end: self.end };
        (head, tail)
    }
}
