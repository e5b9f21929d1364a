//! Accessor decode engine.
//!
//! An [`AccessorReader`] turns accessor metadata plus buffer bytes into typed
//! element sequences. Every read goes through the same core:
//!
//! 1. Resolve the buffer view window and the effective stride (declared
//!    `byteStride`, or the tight element size).
//! 2. Check that the last element fits in the window, so the inner loop never
//!    needs per-read bounds handling.
//! 3. Read `components` values per element, then skip to the next stride.
//! 4. Overlay sparse replacements, if any.
//!
//! Accessors without a buffer view decode to zeros (identity diagonals for
//! matrix types) before the sparse overlay.
//!
//! The shape readers (`read_vec3`, `read_colors`, ...) accept any element type
//! and pad or truncate components, so a VEC2 position still yields `Vec3`s.

mod component;
mod sparse;

pub use component::{read_float, read_int};

use crate::buffers::BufferSet;
use crate::cancellation::Checkpoint;
use crate::document::{AccessorInfo, BufferViewInfo, ComponentType};
use crate::error::IngestError;
use crate::math::{Color, IntVec4, Mat4, Vec2, Vec3, Vec4};
use crate::window::StreamWindow;

/// Placement of a packed run of elements inside a window.
#[derive(Clone, Copy, Debug)]
struct Run {
    /// Accessor reported in errors.
    accessor: usize,
    /// Byte offset of the first element inside the window.
    start: usize,
    count: usize,
    stride: usize,
    component_type: ComponentType,
    components: usize,
    normalized: bool,
}

/// Decodes accessors of one document.
pub struct AccessorReader<'a> {
    accessors: &'a [AccessorInfo],
    views: &'a [BufferViewInfo],
    buffers: &'a BufferSet,
    clamp_to_bounds: bool,
    checkpoint: Checkpoint,
}

impl<'a> AccessorReader<'a> {
    /// Creates a reader with clamping off and no cancellation.
    pub fn new(
        accessors: &'a [AccessorInfo],
        views: &'a [BufferViewInfo],
        buffers: &'a BufferSet,
    ) -> Self {
        Self {
            accessors,
            views,
            buffers,
            clamp_to_bounds: false,
            checkpoint: Checkpoint::never(),
        }
    }

    /// Clamp float components to the accessor's declared `min`/`max`.
    pub fn with_clamp_to_bounds(mut self, clamp: bool) -> Self {
        self.clamp_to_bounds = clamp;
        self
    }

    /// Checks for cancellation through `checkpoint` once per element.
    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    /// Metadata of accessor `index`.
    pub fn info(&self, index: usize) -> Result<&'a AccessorInfo, IngestError> {
        self.accessors.get(index).ok_or(IngestError::MissingEntry {
            kind: "accessors",
            index,
        })
    }

    /// Number of elements accessor `index` declares.
    pub fn count(&self, index: usize) -> Result<usize, IngestError> {
        Ok(self.info(index)?.count)
    }

    /// All components of every element, flattened, normalization applied.
    ///
    /// This is the raw form used for animation outputs; a VEC3 accessor of
    /// `count` elements yields `3 * count` floats.
    pub fn read_floats(&mut self, index: usize) -> Result<Vec<f32>, IngestError> {
        let info = self.info(index)?;
        let mut values = self.decode(info, read_float, 1.0, 0.0)?;
        if self.clamp_to_bounds {
            clamp_to_bounds(info, &mut values);
        }
        Ok(values)
    }

    /// All components of every element, flattened, read as integers.
    pub fn read_ints(&mut self, index: usize) -> Result<Vec<i32>, IngestError> {
        let info = self.info(index)?;
        self.decode(info, |data, offset, ty, _| read_int(data, offset, ty), 1, 0)
    }

    /// Index data as unsigned integers.
    pub fn read_indices(&mut self, index: usize) -> Result<Vec<u32>, IngestError> {
        Ok(self.read_ints(index)?.into_iter().map(|i| i as u32).collect())
    }

    /// Elements as `Vec2`. Extra components are dropped.
    pub fn read_vec2(&mut self, index: usize) -> Result<Vec<Vec2>, IngestError> {
        let n = self.info(index)?.components();
        let flat = self.read_floats(index)?;
        Ok(reshape(&flat, n, [0.0; 2])
            .map(|[x, y]| Vec2::new(x, y))
            .collect())
    }

    /// Elements as `Vec3`. Missing components are 0, extra ones dropped.
    pub fn read_vec3(&mut self, index: usize) -> Result<Vec<Vec3>, IngestError> {
        let n = self.info(index)?.components();
        let flat = self.read_floats(index)?;
        Ok(reshape(&flat, n, [0.0; 3])
            .map(|[x, y, z]| Vec3::new(x, y, z))
            .collect())
    }

    /// Elements as `Vec4`. Missing components are 0.
    pub fn read_vec4(&mut self, index: usize) -> Result<Vec<Vec4>, IngestError> {
        let n = self.info(index)?.components();
        let flat = self.read_floats(index)?;
        Ok(reshape(&flat, n, [0.0; 4])
            .map(|[x, y, z, w]| Vec4::new(x, y, z, w))
            .collect())
    }

    /// Elements as colors. RGB data gets alpha 1.
    pub fn read_colors(&mut self, index: usize) -> Result<Vec<Color>, IngestError> {
        let n = self.info(index)?.components();
        let flat = self.read_floats(index)?;
        Ok(reshape(&flat, n, [0.0, 0.0, 0.0, 1.0])
            .map(|[r, g, b, a]| Color::new(r, g, b, a))
            .collect())
    }

    /// Elements as integer 4-vectors. Missing components are 0.
    pub fn read_int_vec4(&mut self, index: usize) -> Result<Vec<IntVec4>, IngestError> {
        let n = self.info(index)?.components();
        let flat = self.read_ints(index)?;
        Ok(reshape(&flat, n, [0; 4])
            .map(|[x, y, z, w]| IntVec4::new(x, y, z, w))
            .collect())
    }

    /// Elements as 4x4 matrices.
    ///
    /// Components are column-major as stored by glTF. MAT2 and MAT3 fill the
    /// upper-left block of an identity matrix.
    pub fn read_mat4(&mut self, index: usize) -> Result<Vec<Mat4>, IngestError> {
        let info = self.info(index)?;
        let n = info.components();
        let dim = info.accessor_type.matrix_dimension().unwrap_or(4);
        let flat = self.read_floats(index)?;

        if n == 16 {
            return Ok(flat.chunks_exact(16).map(Mat4::from_column_slice).collect());
        }
        Ok(flat
            .chunks_exact(n)
            .map(|element| {
                let mut m = Mat4::identity();
                for (k, &value) in element.iter().enumerate() {
                    let (row, col) = (k % dim, k / dim);
                    if row < 4 && col < 4 {
                        m[(row, col)] = value;
                    }
                }
                m
            })
            .collect())
    }

    /// Shared decode path for floats and integers.
    ///
    /// `one` and `zero` fill accessors that have no buffer view.
    fn decode<T: Copy>(
        &mut self,
        info: &AccessorInfo,
        read: impl Fn(&[u8], usize, ComponentType, bool) -> T + Copy,
        one: T,
        zero: T,
    ) -> Result<Vec<T>, IngestError> {
        let n = info.components();
        let mut out = Vec::new();

        match info.buffer_view {
            Some(view_index) => {
                let window = self.buffers.view_window(self.views, view_index)?;
                let stride = self.views[view_index].effective_stride(info.tight_stride());
                let run = Run {
                    accessor: info.index,
                    start: info.byte_offset,
                    count: info.count,
                    stride,
                    component_type: info.component_type,
                    components: n,
                    normalized: info.normalized,
                };
                decode_run(&window, run, read, &mut self.checkpoint, &mut out)?;
            }
            None => {
                // Nothing backs the count here, so it is only trusted as far
                // as the allocator will go.
                let total = info.count.checked_mul(n).ok_or_else(|| {
                    IngestError::InvalidAccessor {
                        accessor: info.index,
                        reason: format!("count {} overflows", info.count),
                    }
                })?;
                out.try_reserve_exact(total)
                    .map_err(|e| IngestError::InvalidAccessor {
                        accessor: info.index,
                        reason: format!("cannot allocate {total} components: {e}"),
                    })?;
                let dim = info.accessor_type.matrix_dimension();
                for _ in 0..info.count {
                    for c in 0..n {
                        let diagonal = dim.is_some_and(|d| c % d == c / d);
                        out.push(if diagonal { one } else { zero });
                    }
                }
            }
        }

        if let Some(sparse) = &info.sparse {
            self.apply_sparse(info, sparse, read, &mut out)?;
        }

        log::trace!(
            "Decoded accessor {} ({} x {}, {:?})",
            info.index,
            info.count,
            info.accessor_type.name(),
            info.component_type
        );
        Ok(out)
    }
}

/// Reads `run` from `window` into `out`.
///
/// Fails with [`IngestError::BufferOverrun`] before reading or allocating
/// anything if the last element would extend past the window, and with
/// [`IngestError::InvalidAccessor`] if the stride is shorter than an element.
fn decode_run<T>(
    window: &StreamWindow,
    run: Run,
    read: impl Fn(&[u8], usize, ComponentType, bool) -> T,
    checkpoint: &mut Checkpoint,
    out: &mut Vec<T>,
) -> Result<(), IngestError> {
    if run.count == 0 {
        return Ok(());
    }

    let size = run.component_type.size();
    let element = size * run.components;
    if run.stride < element {
        return Err(IngestError::InvalidAccessor {
            accessor: run.accessor,
            reason: format!("stride {} is shorter than the {element} byte element", run.stride),
        });
    }

    let data = window.as_slice();
    let needed = (run.count - 1)
        .checked_mul(run.stride)
        .and_then(|v| v.checked_add(run.start))
        .and_then(|v| v.checked_add(element))
        .unwrap_or(usize::MAX);
    if needed > data.len() {
        return Err(IngestError::BufferOverrun {
            accessor: run.accessor,
            needed,
            available: data.len(),
        });
    }
    // Bounded by the window length now that every element is known to fit
    out.reserve(run.count * run.components);

    let mut cursor = run.start;
    for _ in 0..run.count {
        checkpoint.tick()?;
        let initial = cursor;
        for _ in 0..run.components {
            out.push(read(data, cursor, run.component_type, run.normalized));
            cursor += size;
        }
        // Skip interleaved data belonging to other attributes
        cursor = initial + run.stride;
    }
    Ok(())
}

fn clamp_to_bounds(info: &AccessorInfo, values: &mut [f32]) {
    let n = info.components();
    if info.min.len() != n || info.max.len() != n {
        return;
    }
    for element in values.chunks_exact_mut(n) {
        for (c, value) in element.iter_mut().enumerate() {
            *value = value.max(info.min[c]).min(info.max[c]);
        }
    }
}

/// Splits flattened components into fixed-size elements.
///
/// Takes the first `N` components of each `n`-wide element and fills the rest
/// from `fill`.
fn reshape<T: Copy, const N: usize>(
    flat: &[T],
    n: usize,
    fill: [T; N],
) -> impl Iterator<Item = [T; N]> + '_ {
    flat.chunks_exact(n.max(1)).map(move |element| {
        let mut out = fill;
        let used = element.len().min(N);
        out[..used].copy_from_slice(&element[..used]);
        out
    })
}

#[cfg(test)]
mod tests;
