use std::collections::TryReserveError;

use super::{ChunkingConfig, Cursor};

/// Where a chunk lies in the global index space of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkSpan {
    pub base_index: usize,
    pub count: usize,
}

impl ChunkSpan {
    pub fn end(&self) -> usize {
        self.base_index + self.count
    }
}

/// One chunk handed to a chunk closure.
///
/// `base_index` is the offset of `start` in the whole range, so closures can
/// report absolute positions.
#[derive(Debug, Clone)]
pub struct ChunkDescriptor<P> {
    pub start: P,
    pub count: usize,
    pub base_index: usize,
}

impl<P> ChunkDescriptor<P> {
    pub fn span(&self) -> ChunkSpan {
        ChunkSpan { base_index: self.base_index, count: self.count }
    }

    /// Absolute index range covered by this chunk.
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.base_index .. self.base_index + self.count
    }
}

/// Splits `[0, count)` into contiguous, non-overlapping spans covering every
/// index once.
///
/// With `chunk_size` every span holds that many elements except possibly the
/// last. Without it the number of chunks is aimed at `chunks_per_worker` per
/// unit of `concurrency`, limited so no chunk falls under `min_chunk_size`, and
/// sizes differ by at most one.
pub fn plan(count: usize, chunk_size: Option<usize>, concurrency: usize, config: &ChunkingConfig) ->
    Result<Vec<ChunkSpan>, TryReserveError>
{
    let mut spans = Vec::new();
    if count == 0 {
        return Ok(spans);
    }

    match chunk_size.filter(|&size| size > 0) {
        Some(size) => {
            let chunks = count.div_ceil(size);
            spans.try_reserve_exact(chunks)?;
            let mut base_index = 0;
            while base_index < count {
                let chunk_count = size.min(count - base_index);
                spans.push(ChunkSpan { base_index, count: chunk_count });
                base_index += chunk_count;
            }
        },
        None => {
            let target = concurrency.max(1).saturating_mul(config.chunks_per_worker.max(1));
            let min_chunk_size = config.min_chunk_size.max(1);
            let by_size = count / min_chunk_size;
            let chunks = target.min(by_size).clamp(1, count);
            spans.try_reserve_exact(chunks)?;

            let base = count / chunks;
            let extra = count % chunks;
            let mut base_index = 0;
            for chunk in 0 .. chunks {
                let chunk_count = if chunk < extra { base + 1 } else { base };
                spans.push(ChunkSpan { base_index, count: chunk_count });
                base_index += chunk_count;
            }
        },
    }
    Ok(spans)
}

/// Cuts `first` along `spans`, front to back.
///
/// `spans` must come from [`plan`] for `first.len()` elements.
pub fn split<P>(mut first: P, spans: &[ChunkSpan]) -> Result<Vec<ChunkDescriptor<P>>, TryReserveError> where P: Cursor {
    let mut chunks = Vec::new();
    chunks.try_reserve_exact(spans.len())?;
    let mut spans = spans.iter().peekable();
    while let Some(span) = spans.next() {
        if spans.peek().is_none() {
            chunks.push(ChunkDescriptor { start: first, count: span.count, base_index: span.base_index });
            break;
        }
        let (head, tail) = first.split_at(span.count);
        chunks.push(ChunkDescriptor { start: head, count: span.count, base_index: span.base_index });
        first = tail;
    }
    Ok(chunks)
}
