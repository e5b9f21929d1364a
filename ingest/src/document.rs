//! Typed accessor and buffer view metadata read from the JSON tree.

use crate::error::IngestError;
use crate::json::JsonValue;

/// Storage type of one accessor component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// `5120`: signed byte.
    I8,
    /// `5121`: unsigned byte.
    U8,
    /// `5122`: signed short.
    I16,
    /// `5123`: unsigned short.
    U16,
    /// `5125`: unsigned int.
    U32,
    /// `5126`: float.
    F32,
}

impl ComponentType {
    /// Maps a glTF `componentType` code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            5120 => Some(Self::I8),
            5121 => Some(Self::U8),
            5122 => Some(Self::I16),
            5123 => Some(Self::U16),
            5125 => Some(Self::U32),
            5126 => Some(Self::F32),
            _ => None,
        }
    }

    /// The glTF `componentType` code.
    pub const fn code(self) -> i32 {
        match self {
            Self::I8 => 5120,
            Self::U8 => 5121,
            Self::I16 => 5122,
            Self::U16 => 5123,
            Self::U32 => 5125,
            Self::F32 => 5126,
        }
    }

    /// Size of one component in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

/// Element shape of an accessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorType {
    /// Parses a glTF `type` string.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "SCALAR" => Some(Self::Scalar),
            "VEC2" => Some(Self::Vec2),
            "VEC3" => Some(Self::Vec3),
            "VEC4" => Some(Self::Vec4),
            "MAT2" => Some(Self::Mat2),
            "MAT3" => Some(Self::Mat3),
            "MAT4" => Some(Self::Mat4),
            _ => None,
        }
    }

    /// The glTF `type` string.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat2 => "MAT2",
            Self::Mat3 => "MAT3",
            Self::Mat4 => "MAT4",
        }
    }

    /// Number of components per element.
    pub const fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    /// Column count for matrix types, `None` for scalars and vectors.
    pub const fn matrix_dimension(self) -> Option<usize> {
        match self {
            Self::Mat2 => Some(2),
            Self::Mat3 => Some(3),
            Self::Mat4 => Some(4),
            _ => None,
        }
    }
}

/// A `bufferViews[i]` entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferViewInfo {
    /// Index into `buffers`.
    pub buffer: usize,
    /// Offset of the view inside the buffer.
    pub byte_offset: usize,
    /// Length of the view.
    pub byte_length: usize,
    /// Interleaving stride, 0 when tightly packed.
    pub byte_stride: usize,
}

impl BufferViewInfo {
    /// Reads a buffer view object.
    pub fn parse(value: JsonValue<'_>) -> Self {
        Self {
            buffer: value.child_index("buffer").unwrap_or(0),
            byte_offset: value.child_index("byteOffset").unwrap_or(0),
            byte_length: value.child_index("byteLength").unwrap_or(0),
            byte_stride: value.child_index("byteStride").unwrap_or(0),
        }
    }

    /// The declared stride, or `tight_stride` when none is declared.
    pub fn effective_stride(&self, tight_stride: usize) -> usize {
        if self.byte_stride != 0 {
            self.byte_stride
        } else {
            tight_stride
        }
    }
}

/// Where the indices of a sparse accessor live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SparseIndices {
    pub buffer_view: usize,
    pub byte_offset: usize,
    pub component_type: ComponentType,
}

/// Where the replacement values of a sparse accessor live.
///
/// Values share the parent accessor's element type, component type, and
/// normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SparseValues {
    pub buffer_view: usize,
    pub byte_offset: usize,
}

/// The `sparse` block of an accessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SparseInfo {
    /// Number of overridden elements.
    pub count: usize,
    pub indices: SparseIndices,
    pub values: SparseValues,
}

/// An `accessors[i]` entry.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessorInfo {
    /// Position in the `accessors` array.
    pub index: usize,
    pub name: Option<String>,
    /// `None` for pure-sparse or all-default accessors.
    pub buffer_view: Option<usize>,
    /// Offset relative to the start of the buffer view.
    pub byte_offset: usize,
    pub component_type: ComponentType,
    pub accessor_type: AccessorType,
    /// Number of elements.
    pub count: usize,
    /// Whether integer components map to `[0, 1]` or `[-1, 1]`.
    pub normalized: bool,
    /// Declared per-component minimum (may be empty).
    pub min: Vec<f32>,
    /// Declared per-component maximum (may be empty).
    pub max: Vec<f32>,
    pub sparse: Option<SparseInfo>,
}

impl AccessorInfo {
    /// Reads an accessor object.
    pub fn parse(index: usize, value: JsonValue<'_>) -> Result<Self, IngestError> {
        let invalid = |reason: String| IngestError::InvalidAccessor {
            accessor: index,
            reason,
        };

        let code = value.child_i32_or("componentType", 0);
        let component_type = ComponentType::from_code(code)
            .ok_or_else(|| invalid(format!("unknown componentType {code}")))?;

        let type_name = value.child_str("type").unwrap_or_default();
        let accessor_type = AccessorType::parse(&type_name)
            .ok_or_else(|| invalid(format!("unknown type '{type_name}'")))?;

        let sparse = match value.get("sparse") {
            Some(sparse) => Some(parse_sparse(sparse).map_err(invalid)?),
            None => None,
        };

        Ok(Self {
            index,
            name: value.child_str("name").map(|s| s.into_owned()),
            buffer_view: value.child_index("bufferView"),
            byte_offset: value.child_index("byteOffset").unwrap_or(0),
            component_type,
            accessor_type,
            count: value.child_index("count").unwrap_or(0),
            normalized: value.child_bool_or("normalized", false),
            min: value.get("min").map(|v| v.to_f32_vec()).unwrap_or_default(),
            max: value.get("max").map(|v| v.to_f32_vec()).unwrap_or_default(),
            sparse,
        })
    }

    /// Components per element.
    pub fn components(&self) -> usize {
        self.accessor_type.components()
    }

    /// Bytes per element when tightly packed.
    pub fn tight_stride(&self) -> usize {
        self.component_type.size() * self.components()
    }
}

fn parse_sparse(sparse: JsonValue<'_>) -> Result<SparseInfo, String> {
    let indices = sparse
        .get("indices")
        .ok_or_else(|| "sparse accessor has no indices".to_string())?;
    let values = sparse
        .get("values")
        .ok_or_else(|| "sparse accessor has no values".to_string())?;

    let code = indices.child_i32_or("componentType", 0);
    let component_type = match ComponentType::from_code(code) {
        Some(ct @ (ComponentType::U8 | ComponentType::U16 | ComponentType::U32)) => ct,
        _ => return Err(format!("invalid sparse index componentType {code}")),
    };

    Ok(SparseInfo {
        count: sparse.child_index("count").unwrap_or(0),
        indices: SparseIndices {
            buffer_view: indices
                .child_index("bufferView")
                .ok_or_else(|| "sparse indices have no bufferView".to_string())?,
            byte_offset: indices.child_index("byteOffset").unwrap_or(0),
            component_type,
        },
        values: SparseValues {
            buffer_view: values
                .child_index("bufferView")
                .ok_or_else(|| "sparse values have no bufferView".to_string())?,
            byte_offset: values.child_index("byteOffset").unwrap_or(0),
        },
    })
}

/// Reads every `bufferViews` entry.
pub fn parse_buffer_views(root: JsonValue<'_>) -> Vec<BufferViewInfo> {
    root.get("bufferViews")
        .map(|views| views.iter().map(BufferViewInfo::parse).collect())
        .unwrap_or_default()
}

/// Reads every `accessors` entry.
pub fn parse_accessors(root: JsonValue<'_>) -> Result<Vec<AccessorInfo>, IngestError> {
    let Some(accessors) = root.get("accessors") else {
        return Ok(Vec::new());
    };
    accessors
        .iter()
        .enumerate()
        .map(|(i, value)| AccessorInfo::parse(i, value))
        .collect()
}
