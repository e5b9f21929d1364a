//! Sparse accessor overlay.

use crate::document::{AccessorInfo, ComponentType, SparseInfo};
use crate::error::IngestError;

use super::{AccessorReader, Run, decode_run, read_int};

impl AccessorReader<'_> {
    /// Replaces the elements named by `sparse.indices` with `sparse.values`.
    ///
    /// Indices are tightly packed scalars; values are tightly packed elements
    /// of the parent's type. Out-of-range indices are logged and skipped.
    pub(super) fn apply_sparse<T: Copy>(
        &mut self,
        info: &AccessorInfo,
        sparse: &SparseInfo,
        read: impl Fn(&[u8], usize, ComponentType, bool) -> T + Copy,
        out: &mut [T],
    ) -> Result<(), IngestError> {
        if sparse.count == 0 {
            return Ok(());
        }
        let n = info.components();

        let index_window = self
            .buffers
            .view_window(self.views, sparse.indices.buffer_view)?;
        let index_type = sparse.indices.component_type;
        let mut indices = Vec::new();
        decode_run(
            &index_window,
            Run {
                accessor: info.index,
                start: sparse.indices.byte_offset,
                count: sparse.count,
                stride: index_type.size(),
                component_type: index_type,
                components: 1,
                normalized: false,
            },
            |data, offset, ty, _| read_int(data, offset, ty),
            &mut self.checkpoint,
            &mut indices,
        )?;

        let value_window = self
            .buffers
            .view_window(self.views, sparse.values.buffer_view)?;
        let mut values = Vec::new();
        decode_run(
            &value_window,
            Run {
                accessor: info.index,
                start: sparse.values.byte_offset,
                count: sparse.count,
                stride: info.tight_stride(),
                component_type: info.component_type,
                components: n,
                normalized: info.normalized,
            },
            read,
            &mut self.checkpoint,
            &mut values,
        )?;

        for (k, &target) in indices.iter().enumerate() {
            // U32 indices above i32::MAX wrap negative and are rejected here too
            let Some(target) = usize::try_from(target).ok().filter(|&t| t < info.count) else {
                log::warn!(
                    "Accessor {}: sparse index {} out of range (count {})",
                    info.index,
                    target as u32,
                    info.count
                );
                continue;
            };
            out[target * n..(target + 1) * n].copy_from_slice(&values[k * n..(k + 1) * n]);
        }

        log::debug!(
            "Accessor {}: applied {} sparse replacements",
            info.index,
            sparse.count
        );
        Ok(())
    }
}
