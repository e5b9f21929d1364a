use super::*;
use crate::buffers::{BufferEntry, BufferSource};
use crate::cancellation::CancellationToken;
use crate::document::{AccessorType, SparseIndices, SparseValues};
use crate::document::SparseInfo;

fn buffers(bytes: Vec<u8>) -> BufferSet {
    BufferSet::from_entries(vec![BufferEntry {
        byte_length: bytes.len(),
        source: BufferSource::DataUri,
        data: Some(StreamWindow::new(bytes)),
    }])
}

fn view(byte_offset: usize, byte_length: usize, byte_stride: usize) -> BufferViewInfo {
    BufferViewInfo {
        buffer: 0,
        byte_offset,
        byte_length,
        byte_stride,
    }
}

fn accessor(
    buffer_view: Option<usize>,
    component_type: ComponentType,
    accessor_type: AccessorType,
    count: usize,
) -> AccessorInfo {
    AccessorInfo {
        index: 0,
        name: None,
        buffer_view,
        byte_offset: 0,
        component_type,
        accessor_type,
        count,
        normalized: false,
        min: Vec::new(),
        max: Vec::new(),
        sparse: None,
    }
}

#[test]
fn test_u8_normalized_scalar() {
    let set = buffers(vec![0, 127, 255]);
    let views = [view(0, 3, 0)];
    let mut info = accessor(Some(0), ComponentType::U8, AccessorType::Scalar, 3);
    info.normalized = true;
    let accessors = [info];

    let values = AccessorReader::new(&accessors, &views, &set)
        .read_floats(0)
        .unwrap();
    assert_eq!(values[0], 0.0);
    assert!((values[1] - 0.498).abs() < 1e-3);
    assert_eq!(values[2], 1.0);
}

#[test]
fn test_i16_normalized_minimum_is_minus_one() {
    let set = buffers((-32768i16).to_le_bytes().to_vec());
    let views = [view(0, 2, 0)];
    let mut info = accessor(Some(0), ComponentType::I16, AccessorType::Scalar, 1);
    info.normalized = true;
    let accessors = [info];

    let values = AccessorReader::new(&accessors, &views, &set)
        .read_floats(0)
        .unwrap();
    assert_eq!(values, vec![-1.0]);
}

#[test]
fn test_interleaved_vec3() {
    // position (3 floats) + uv (2 floats) per vertex, stride 20
    let floats: [f32; 10] = [1.0, 2.0, 3.0, 0.1, 0.2, 4.0, 5.0, 6.0, 0.3, 0.4];
    let set = buffers(bytemuck::cast_slice(&floats).to_vec());
    let views = [view(0, 40, 20)];
    let positions = accessor(Some(0), ComponentType::F32, AccessorType::Vec3, 2);
    let mut uvs = accessor(Some(0), ComponentType::F32, AccessorType::Vec2, 2);
    uvs.index = 1;
    uvs.byte_offset = 12;
    let accessors = [positions, uvs];

    let mut reader = AccessorReader::new(&accessors, &views, &set);
    assert_eq!(
        reader.read_vec3(0).unwrap(),
        vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)]
    );
    assert_eq!(
        reader.read_vec2(1).unwrap(),
        vec![Vec2::new(0.1, 0.2), Vec2::new(0.3, 0.4)]
    );
}

#[test]
fn test_view_offset_adds_to_accessor_offset() {
    let shorts: [u16; 6] = [99, 99, 10, 20, 30, 99];
    let set = buffers(bytemuck::cast_slice(&shorts).to_vec());
    let views = [view(2, 10, 0)];
    let mut info = accessor(Some(0), ComponentType::U16, AccessorType::Scalar, 3);
    info.byte_offset = 2;
    let accessors = [info];

    let values = AccessorReader::new(&accessors, &views, &set)
        .read_ints(0)
        .unwrap();
    assert_eq!(values, vec![10, 20, 30]);
}

#[test]
fn test_zero_count_is_empty() {
    let set = buffers(vec![0; 4]);
    let views = [view(0, 4, 0)];
    let accessors = [accessor(Some(0), ComponentType::F32, AccessorType::Vec3, 0)];

    let values = AccessorReader::new(&accessors, &views, &set)
        .read_vec3(0)
        .unwrap();
    assert!(values.is_empty());
}

#[test]
fn test_overrun_is_reported() {
    let set = buffers(vec![0; 8]);
    let views = [view(0, 8, 0)];
    let accessors = [accessor(Some(0), ComponentType::F32, AccessorType::Vec3, 1)];

    let err = AccessorReader::new(&accessors, &views, &set)
        .read_floats(0)
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::BufferOverrun {
            accessor: 0,
            needed: 12,
            available: 8
        }
    ));
}

#[test]
fn test_overrun_respects_view_length() {
    // Buffer holds enough bytes, but the view is shorter
    let set = buffers(vec![0; 64]);
    let views = [view(0, 8, 0)];
    let accessors = [accessor(Some(0), ComponentType::F32, AccessorType::Scalar, 3)];

    let err = AccessorReader::new(&accessors, &views, &set)
        .read_floats(0)
        .unwrap_err();
    assert!(matches!(err, IngestError::BufferOverrun { .. }));
}

#[test]
fn test_missing_buffer_dependency() {
    let set = BufferSet::from_entries(vec![BufferEntry {
        byte_length: 12,
        source: BufferSource::External,
        data: None,
    }]);
    let views = [view(0, 12, 0)];
    let accessors = [accessor(Some(0), ComponentType::F32, AccessorType::Vec3, 1)];

    let err = AccessorReader::new(&accessors, &views, &set)
        .read_vec3(0)
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::MissingBufferDependency {
            buffer_view: 0,
            buffer: 0
        }
    ));
}

#[test]
fn test_missing_accessor() {
    let set = BufferSet::default();
    let mut reader = AccessorReader::new(&[], &[], &set);
    assert!(matches!(
        reader.read_floats(3),
        Err(IngestError::MissingEntry {
            kind: "accessors",
            index: 3
        })
    ));
}

#[test]
fn test_sparse_override() {
    // Base: five zero floats. Indices view: [2] as u8. Values view: [9.0]
    let mut bytes = vec![0u8; 20];
    bytes.extend_from_slice(&[2, 0, 0, 0]);
    bytes.extend_from_slice(&9.0f32.to_le_bytes());
    let set = buffers(bytes);
    let views = [view(0, 20, 0), view(20, 1, 0), view(24, 4, 0)];
    let mut info = accessor(Some(0), ComponentType::F32, AccessorType::Scalar, 5);
    info.sparse = Some(SparseInfo {
        count: 1,
        indices: SparseIndices {
            buffer_view: 1,
            byte_offset: 0,
            component_type: ComponentType::U8,
        },
        values: SparseValues {
            buffer_view: 2,
            byte_offset: 0,
        },
    });
    let accessors = [info];

    let values = AccessorReader::new(&accessors, &views, &set)
        .read_floats(0)
        .unwrap();
    assert_eq!(values, vec![0.0, 0.0, 9.0, 0.0, 0.0]);
}

#[test]
fn test_pure_sparse_vec3() {
    let indices: [u16; 2] = [3, 0];
    let values: [f32; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let mut bytes = bytemuck::cast_slice(&indices).to_vec();
    bytes.extend_from_slice(bytemuck::cast_slice(&values));
    let set = buffers(bytes);
    let views = [view(0, 4, 0), view(4, 24, 0)];
    let mut info = accessor(None, ComponentType::F32, AccessorType::Vec3, 4);
    info.sparse = Some(SparseInfo {
        count: 2,
        indices: SparseIndices {
            buffer_view: 0,
            byte_offset: 0,
            component_type: ComponentType::U16,
        },
        values: SparseValues {
            buffer_view: 1,
            byte_offset: 0,
        },
    });
    let accessors = [info];

    let decoded = AccessorReader::new(&accessors, &views, &set)
        .read_vec3(0)
        .unwrap();
    assert_eq!(
        decoded,
        vec![
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::zeros(),
            Vec3::zeros(),
            Vec3::new(1.0, 2.0, 3.0),
        ]
    );
}

#[test]
fn test_sparse_values_use_parent_component_type() {
    // Normalized u8 colors; the override value 255 must become 1.0
    let mut bytes = vec![0u8; 6];
    bytes.extend_from_slice(&[1, 255, 255, 255]);
    let set = buffers(bytes);
    let views = [view(0, 6, 0), view(6, 1, 0), view(7, 3, 0)];
    let mut info = accessor(Some(0), ComponentType::U8, AccessorType::Vec3, 2);
    info.normalized = true;
    info.sparse = Some(SparseInfo {
        count: 1,
        indices: SparseIndices {
            buffer_view: 1,
            byte_offset: 0,
            component_type: ComponentType::U8,
        },
        values: SparseValues {
            buffer_view: 2,
            byte_offset: 0,
        },
    });
    let accessors = [info];

    let colors = AccessorReader::new(&accessors, &views, &set)
        .read_colors(0)
        .unwrap();
    assert_eq!(colors[0], Color::new(0.0, 0.0, 0.0, 1.0));
    assert_eq!(colors[1], Color::WHITE);
}

#[test]
fn test_sparse_out_of_range_index_is_skipped() {
    let mut bytes = vec![0u8; 8];
    bytes.extend_from_slice(&[7, 0, 0, 0]);
    bytes.extend_from_slice(&5.0f32.to_le_bytes());
    let set = buffers(bytes);
    let views = [view(0, 8, 0), view(8, 1, 0), view(12, 4, 0)];
    let mut info = accessor(Some(0), ComponentType::F32, AccessorType::Scalar, 2);
    info.sparse = Some(SparseInfo {
        count: 1,
        indices: SparseIndices {
            buffer_view: 1,
            byte_offset: 0,
            component_type: ComponentType::U8,
        },
        values: SparseValues {
            buffer_view: 2,
            byte_offset: 0,
        },
    });
    let accessors = [info];

    let values = AccessorReader::new(&accessors, &views, &set)
        .read_floats(0)
        .unwrap();
    assert_eq!(values, vec![0.0, 0.0]);
}

#[test]
fn test_default_matrix_is_identity() {
    let set = BufferSet::default();
    let accessors = [accessor(None, ComponentType::F32, AccessorType::Mat4, 2)];
    let matrices = AccessorReader::new(&accessors, &[], &set)
        .read_mat4(0)
        .unwrap();
    assert_eq!(matrices, vec![Mat4::identity(); 2]);
}

#[test]
fn test_mat4_is_column_major() {
    // Translation (1, 2, 3) stored column-major: last column holds it
    let m: [f32; 16] = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        1.0, 2.0, 3.0, 1.0,
    ];
    let set = buffers(bytemuck::cast_slice(&m).to_vec());
    let views = [view(0, 64, 0)];
    let accessors = [accessor(Some(0), ComponentType::F32, AccessorType::Mat4, 1)];

    let matrices = AccessorReader::new(&accessors, &views, &set)
        .read_mat4(0)
        .unwrap();
    assert_eq!(matrices[0], Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn test_mat2_fills_upper_left_block() {
    let m: [f32; 4] = [2.0, 3.0, 4.0, 5.0];
    let set = buffers(bytemuck::cast_slice(&m).to_vec());
    let views = [view(0, 16, 0)];
    let accessors = [accessor(Some(0), ComponentType::F32, AccessorType::Mat2, 1)];

    let matrices = AccessorReader::new(&accessors, &views, &set)
        .read_mat4(0)
        .unwrap();
    let out = matrices[0];
    assert_eq!(out[(0, 0)], 2.0);
    assert_eq!(out[(1, 0)], 3.0);
    assert_eq!(out[(0, 1)], 4.0);
    assert_eq!(out[(1, 1)], 5.0);
    assert_eq!(out[(2, 2)], 1.0);
    assert_eq!(out[(3, 3)], 1.0);
}

#[test]
fn test_shape_conversions() {
    let floats: [f32; 4] = [1.0, 2.0, 3.0, 4.0];
    let set = buffers(bytemuck::cast_slice(&floats).to_vec());
    let views = [view(0, 16, 0)];
    let vec2 = accessor(Some(0), ComponentType::F32, AccessorType::Vec2, 2);
    let mut vec4 = accessor(Some(0), ComponentType::F32, AccessorType::Vec4, 1);
    vec4.index = 1;
    let mut vec3 = accessor(Some(0), ComponentType::F32, AccessorType::Vec3, 1);
    vec3.index = 2;
    let accessors = [vec2, vec4, vec3];
    let mut reader = AccessorReader::new(&accessors, &views, &set);

    assert_eq!(
        reader.read_vec3(0).unwrap(),
        vec![Vec3::new(1.0, 2.0, 0.0), Vec3::new(3.0, 4.0, 0.0)]
    );
    assert_eq!(reader.read_vec3(1).unwrap(), vec![Vec3::new(1.0, 2.0, 3.0)]);
    assert_eq!(reader.read_vec2(1).unwrap(), vec![Vec2::new(1.0, 2.0)]);
    assert_eq!(
        reader.read_vec4(2).unwrap(),
        vec![Vec4::new(1.0, 2.0, 3.0, 0.0)]
    );
    assert_eq!(
        reader.read_colors(0).unwrap(),
        vec![Color::new(1.0, 2.0, 0.0, 1.0), Color::new(3.0, 4.0, 0.0, 1.0)]
    );
    assert_eq!(
        reader.read_colors(2).unwrap(),
        vec![Color::new(1.0, 2.0, 3.0, 1.0)]
    );
}

#[test]
fn test_int_vec4_joints() {
    let set = buffers(vec![1, 2, 3, 4, 250, 0, 0, 0]);
    let views = [view(0, 8, 0)];
    let accessors = [accessor(Some(0), ComponentType::U8, AccessorType::Vec4, 2)];

    let joints = AccessorReader::new(&accessors, &views, &set)
        .read_int_vec4(0)
        .unwrap();
    assert_eq!(joints, vec![IntVec4::new(1, 2, 3, 4), IntVec4::new(250, 0, 0, 0)]);
}

#[test]
fn test_read_indices() {
    let indices: [u32; 3] = [0, 70000, 2];
    let set = buffers(bytemuck::cast_slice(&indices).to_vec());
    let views = [view(0, 12, 0)];
    let accessors = [accessor(Some(0), ComponentType::U32, AccessorType::Scalar, 3)];

    let decoded = AccessorReader::new(&accessors, &views, &set)
        .read_indices(0)
        .unwrap();
    assert_eq!(decoded, vec![0, 70000, 2]);
}

#[test]
fn test_clamp_to_bounds_is_opt_in() {
    let floats: [f32; 3] = [-5.0, 0.5, 5.0];
    let set = buffers(bytemuck::cast_slice(&floats).to_vec());
    let views = [view(0, 12, 0)];
    let mut info = accessor(Some(0), ComponentType::F32, AccessorType::Scalar, 3);
    info.min = vec![0.0];
    info.max = vec![1.0];
    let accessors = [info];

    let unclamped = AccessorReader::new(&accessors, &views, &set)
        .read_floats(0)
        .unwrap();
    assert_eq!(unclamped, vec![-5.0, 0.5, 5.0]);

    let clamped = AccessorReader::new(&accessors, &views, &set)
        .with_clamp_to_bounds(true)
        .read_floats(0)
        .unwrap();
    assert_eq!(clamped, vec![0.0, 0.5, 1.0]);
}

#[test]
fn test_cancellation_stops_decode() {
    let set = buffers(vec![0; 400]);
    let views = [view(0, 400, 0)];
    let accessors = [accessor(Some(0), ComponentType::F32, AccessorType::Scalar, 100)];
    let token = CancellationToken::new();
    token.cancel();

    let err = AccessorReader::new(&accessors, &views, &set)
        .with_checkpoint(Checkpoint::new(Some(token), 16))
        .read_floats(0)
        .unwrap_err();
    assert!(matches!(err, IngestError::Cancelled(_)));
}

#[test]
fn test_huge_count_is_rejected_before_allocating() {
    let set = buffers(vec![0; 8]);
    let views = [view(0, 8, 0)];

    // Element count times stride overflows usize
    let accessors = [accessor(Some(0), ComponentType::F32, AccessorType::Mat4, 1 << 60)];
    let err = AccessorReader::new(&accessors, &views, &set)
        .read_floats(0)
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::BufferOverrun {
            needed: usize::MAX,
            available: 8,
            ..
        }
    ));

    // Fits in usize but is far larger than the view
    let accessors = [accessor(Some(0), ComponentType::F32, AccessorType::Vec4, 1 << 44)];
    let err = AccessorReader::new(&accessors, &views, &set)
        .read_vec4(0)
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::BufferOverrun {
            needed: 0x1_0000_0000_0000,
            available: 8,
            ..
        }
    ));
}

#[test]
fn test_huge_sparse_count_is_rejected_before_allocating() {
    let set = buffers(vec![0; 16]);
    let views = [view(0, 8, 0), view(8, 4, 0), view(12, 4, 0)];
    let mut info = accessor(Some(0), ComponentType::F32, AccessorType::Scalar, 2);
    info.sparse = Some(SparseInfo {
        count: 1 << 62,
        indices: SparseIndices {
            buffer_view: 1,
            byte_offset: 0,
            component_type: ComponentType::U32,
        },
        values: SparseValues {
            buffer_view: 2,
            byte_offset: 0,
        },
    });
    let accessors = [info];

    let err = AccessorReader::new(&accessors, &views, &set)
        .read_floats(0)
        .unwrap_err();
    assert!(matches!(err, IngestError::BufferOverrun { available: 4, .. }));
}

#[test]
fn test_viewless_count_overflow_is_invalid() {
    let set = BufferSet::default();
    let accessors = [accessor(None, ComponentType::F32, AccessorType::Mat4, usize::MAX / 2)];

    let err = AccessorReader::new(&accessors, &[], &set)
        .read_floats(0)
        .unwrap_err();
    assert!(matches!(err, IngestError::InvalidAccessor { accessor: 0, .. }));
}

#[test]
fn test_stride_shorter_than_element_is_invalid() {
    let set = buffers(vec![0; 64]);
    let views = [view(0, 64, 4)];
    let accessors = [accessor(Some(0), ComponentType::F32, AccessorType::Vec3, 1 << 40)];

    let err = AccessorReader::new(&accessors, &views, &set)
        .read_vec3(0)
        .unwrap_err();
    assert!(matches!(err, IngestError::InvalidAccessor { accessor: 0, .. }));
}

#[test]
fn test_view_cannot_reach_past_its_buffer() {
    // Three floats in the file, but the buffer only owns the first one
    let floats: [f32; 3] = [1.0, 2.0, 3.0];
    let file = StreamWindow::new(bytemuck::cast_slice(&floats).to_vec());
    let set = BufferSet::from_entries(vec![BufferEntry {
        byte_length: 4,
        source: BufferSource::Binary,
        data: Some(file.window(0, 4)),
    }]);
    let views = [view(0, 12, 0)];
    let accessors = [accessor(Some(0), ComponentType::F32, AccessorType::Scalar, 3)];

    let err = AccessorReader::new(&accessors, &views, &set)
        .read_floats(0)
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::BufferOverrun {
            needed: 12,
            available: 4,
            ..
        }
    ));
}
