//! Fixed-size batching for bulk deletes.

/// Largest number of ids removed by a single store request.
pub const DEFAULT_DELETE_BATCH_SIZE: usize = 25;

/// One slice of a bulk delete. `index` is zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteBatch {
    pub index: usize,
    pub ids: Vec<String>,
}

/// Splits a list of ids into consecutive [`DeleteBatch`]es.
///
/// Each batch is independent, so a caller can retry a failed batch on its own
/// or resume from a given index.
#[derive(Debug)]
pub struct DeleteBatches {
    ids: std::vec::IntoIter<String>,
    size: usize,
    next_index: usize,
}

impl DeleteBatches {
    /// A `size` of zero is treated as one.
    pub fn new(ids: Vec<String>, size: usize) -> Self {
        Self {
            ids: ids.into_iter(),
            size: size.max(1),
            next_index: 0,
        }
    }
}

impl Iterator for DeleteBatches {
    type Item = DeleteBatch;

    fn next(&mut self) -> Option<Self::Item> {
        let ids: Vec<String> = self.ids.by_ref().take(self.size).collect();
        if ids.is_empty() {
            return None;
        }
        let batch = DeleteBatch {
            index: self.next_index,
            ids,
        };
        self.next_index += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ids.len().div_ceil(self.size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DeleteBatches {}
