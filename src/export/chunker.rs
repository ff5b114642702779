//! Partitioning of the ordered record list into merged documents

use super::types::DateRange;

/// How an export of `total` records is split into parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub total: usize,
    pub chunk_size: usize,
}

impl ChunkPlan {
    /// `chunk_size` of zero is treated as one record per part
    pub fn new(total: usize, chunk_size: usize) -> Self {
        Self {
            total,
            chunk_size: chunk_size.max(1),
        }
    }

    /// ceil(total / chunk_size)
    pub fn num_parts(&self) -> usize {
        self.total.div_ceil(self.chunk_size)
    }

    pub fn needs_zip(&self) -> bool {
        self.num_parts() > 1
    }

    /// Split `records` into consecutive chunks of at most `chunk_size`
    pub fn split<'a, T>(&self, records: &'a [T]) -> impl Iterator<Item = &'a [T]> {
        records.chunks(self.chunk_size)
    }
}

/// Output file naming for one date range
#[derive(Debug, Clone)]
pub struct FileNamer {
    stem: String,
}

impl FileNamer {
    pub fn new(range: &DateRange) -> Self {
        Self {
            stem: format!(
                "All_Inspections_{}_to_{}",
                range.from.format("%Y-%m-%d"),
                range.to.format("%Y-%m-%d")
            ),
        }
    }

    /// Name of an unpartitioned single PDF
    pub fn single_pdf(&self) -> String {
        format!("{}.pdf", self.stem)
    }

    /// Name of the `part`-th PDF (1-based)
    pub fn part_pdf(&self, part: usize) -> String {
        format!("{}_Part{}.pdf", self.stem, part)
    }

    pub fn archive(&self) -> String {
        format!("{}.zip", self.stem)
    }
}
