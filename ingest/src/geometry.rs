//! Primitive geometry assembly.
//!
//! Decodes the vertex attributes, indices, and morph targets of each mesh
//! primitive and applies the load's coordinate conventions. Strips and fans
//! become triangle lists. Point and line primitives are reported and skipped.

use crate::accessor::AccessorReader;
use crate::cancellation::Checkpoint;
use crate::draco::{DecompressedGeometry, draco_buffer_view};
use crate::error::IngestError;
use crate::json::JsonValue;
use crate::loader::GltfAsset;
use crate::math::{
    Color, IntVec4, Vec2, Vec3, Vec4, convert_tangent, convert_vec3, flip_uv,
};
use crate::options::IngestOptions;

/// Maximum number of `TEXCOORD_n` sets read per primitive.
pub const MAX_UV_SETS: usize = 4;

/// glTF primitive topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveMode {
    /// Maps a glTF `mode` value.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Points),
            1 => Some(Self::Lines),
            2 => Some(Self::LineLoop),
            3 => Some(Self::LineStrip),
            4 => Some(Self::Triangles),
            5 => Some(Self::TriangleStrip),
            6 => Some(Self::TriangleFan),
            _ => None,
        }
    }

    /// Whether the mode describes triangles.
    pub fn is_triangles(self) -> bool {
        matches!(
            self,
            Self::Triangles | Self::TriangleStrip | Self::TriangleFan
        )
    }
}

/// Per-vertex offsets of one morph target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MorphTarget {
    pub name: Option<String>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
}

/// Decoded triangle geometry of one primitive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedPrimitive {
    /// Position in the mesh's `primitives` array.
    pub index: usize,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    /// `TEXCOORD_0` to `TEXCOORD_3`, stopping at the first missing set.
    pub uvs: Vec<Vec<Vec2>>,
    pub colors: Vec<Color>,
    pub joints: Vec<IntVec4>,
    pub weights: Vec<Vec4>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
    pub material: Option<usize>,
    pub targets: Vec<MorphTarget>,
    /// Whether the geometry came from a Draco decoder.
    pub draco_compressed: bool,
}

impl DecodedPrimitive {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A primitive that was not decoded.
#[derive(Debug)]
pub struct SkippedPrimitive {
    /// Position in the mesh's `primitives` array.
    pub index: usize,
    pub reason: IngestError,
}

/// Decoded mesh.
#[derive(Debug, Default)]
pub struct DecodedMesh {
    /// Position in the `meshes` array.
    pub index: usize,
    pub name: Option<String>,
    pub primitives: Vec<DecodedPrimitive>,
    /// Default morph target weights.
    pub weights: Vec<f32>,
    /// Morph target names from `extras.targetNames`.
    pub target_names: Vec<String>,
    /// Primitives with unsupported topology.
    pub skipped: Vec<SkippedPrimitive>,
}

impl GltfAsset {
    /// Decodes every mesh.
    pub fn decode_meshes(&self) -> Result<Vec<DecodedMesh>, IngestError> {
        (0..self.count("meshes"))
            .map(|i| self.decode_mesh(i))
            .collect()
    }

    /// Decodes mesh `index`.
    pub fn decode_mesh(&self, index: usize) -> Result<DecodedMesh, IngestError> {
        let mesh = self.entry("meshes", index)?;
        let mut reader = self.reader();
        let mut checkpoint = self.checkpoint();

        let target_names: Vec<String> = mesh
            .get("extras")
            .and_then(|extras| extras.get("targetNames"))
            .map(|names| names.iter().map(|n| n.to_text().into_owned()).collect())
            .unwrap_or_default();

        let mut result = DecodedMesh {
            index,
            name: mesh.child_str("name").map(|s| s.into_owned()),
            weights: mesh.get("weights").map(|w| w.to_f32_vec()).unwrap_or_default(),
            target_names,
            ..Default::default()
        };

        let Some(primitives) = mesh.get("primitives") else {
            return Ok(result);
        };

        for (p, primitive) in primitives.iter().enumerate() {
            let mode_code = primitive.child_i32_or("mode", 4);
            let is_draco = draco_buffer_view(primitive).is_some();

            // Draco output is always a triangle list
            let mode = if is_draco {
                PrimitiveMode::Triangles
            } else {
                match PrimitiveMode::from_code(mode_code) {
                    Some(mode) if mode.is_triangles() => mode,
                    _ => {
                        let reason = IngestError::UnsupportedPrimitiveTopology {
                            mesh: index,
                            primitive: p,
                            mode: mode_code,
                        };
                        log::warn!("Skipping primitive: {reason}");
                        result.skipped.push(SkippedPrimitive { index: p, reason });
                        continue;
                    }
                }
            };

            let mut decoded = if is_draco {
                self.decode_draco_primitive(index, p, primitive, &mut checkpoint)?
            } else {
                decode_primitive(&mut reader, &self.options, primitive, mode, &mut checkpoint)?
            };
            decoded.index = p;
            decoded.material = primitive.child_index("material");

            if self.options.import_blend_shapes
                && let Some(targets) = primitive.get("targets")
            {
                decoded.targets =
                    decode_targets(&mut reader, &self.options, targets, &result.target_names)?;
            }

            log::debug!(
                "Mesh {index} primitive {p}: {} vertices, {} triangles, {} targets",
                decoded.positions.len(),
                decoded.triangle_count(),
                decoded.targets.len()
            );
            result.primitives.push(decoded);
        }

        Ok(result)
    }

    fn decode_draco_primitive(
        &self,
        mesh: usize,
        primitive_index: usize,
        primitive: JsonValue<'_>,
        checkpoint: &mut Checkpoint,
    ) -> Result<DecodedPrimitive, IngestError> {
        let decoder = self
            .draco
            .as_ref()
            .ok_or(IngestError::DracoCallbackMissing { mesh })?;
        let view = draco_buffer_view(primitive).unwrap_or(0);
        let window = self.buffers.view_window(&self.buffer_views, view)?;

        let geometry = decoder
            .decode(window.as_slice())
            .ok_or(IngestError::DracoDecodeFailed {
                mesh,
                primitive: primitive_index,
            })?;
        convert_decompressed(geometry, &self.options, checkpoint)
    }
}

/// Decodes the attributes and indices of one uncompressed primitive.
pub(crate) fn decode_primitive(
    reader: &mut AccessorReader<'_>,
    options: &IngestOptions,
    primitive: JsonValue<'_>,
    mode: PrimitiveMode,
    checkpoint: &mut Checkpoint,
) -> Result<DecodedPrimitive, IngestError> {
    let attributes = primitive.get("attributes");
    let attribute = |name: &str| attributes.and_then(|a| a.child_index(name));
    let mut out = DecodedPrimitive::default();

    if let Some(index) = attribute("POSITION") {
        out.positions = reader.read_vec3(index)?;
        for p in &mut out.positions {
            checkpoint.tick()?;
            *p = convert_vec3(*p, options.convert_handedness) * options.scale_factor;
        }
    }

    if options.import_normals
        && let Some(index) = attribute("NORMAL")
    {
        out.normals = reader.read_vec3(index)?;
        for n in &mut out.normals {
            checkpoint.tick()?;
            let converted = convert_vec3(*n, options.convert_handedness);
            *n = converted.try_normalize(f32::EPSILON).unwrap_or(converted);
        }
    }

    if options.import_tangents
        && let Some(index) = attribute("TANGENT")
    {
        out.tangents = reader.read_vec4(index)?;
        for t in &mut out.tangents {
            checkpoint.tick()?;
            *t = convert_tangent(*t, options.convert_handedness);
        }
    }

    for set in 0..MAX_UV_SETS {
        let Some(index) = attribute(&format!("TEXCOORD_{set}")) else {
            break;
        };
        let mut uvs = reader.read_vec2(index)?;
        if options.flip_uvs {
            for uv in &mut uvs {
                checkpoint.tick()?;
                *uv = flip_uv(*uv);
            }
        }
        out.uvs.push(uvs);
    }

    if options.import_colors
        && let Some(index) = attribute("COLOR_0")
    {
        out.colors = reader.read_colors(index)?;
    }
    if let Some(index) = attribute("JOINTS_0") {
        out.joints = reader.read_int_vec4(index)?;
    }
    if let Some(index) = attribute("WEIGHTS_0") {
        out.weights = reader.read_vec4(index)?;
    }

    let raw_indices = match primitive.child_index("indices") {
        Some(index) => reader.read_indices(index)?,
        None => (0..out.positions.len() as u32).collect(),
    };
    out.indices = triangulate(&raw_indices, mode, options.convert_handedness);
    Ok(out)
}

/// Decodes morph targets of one primitive.
fn decode_targets(
    reader: &mut AccessorReader<'_>,
    options: &IngestOptions,
    targets: JsonValue<'_>,
    names: &[String],
) -> Result<Vec<MorphTarget>, IngestError> {
    let mut out = Vec::with_capacity(targets.len());
    for (t, target) in targets.iter().enumerate() {
        let mut morph = MorphTarget {
            name: names.get(t).cloned(),
            ..Default::default()
        };
        if let Some(index) = target.child_index("POSITION") {
            morph.positions = reader
                .read_vec3(index)?
                .into_iter()
                .map(|p| convert_vec3(p, options.convert_handedness) * options.scale_factor)
                .collect();
        }
        if let Some(index) = target.child_index("NORMAL") {
            morph.normals = reader
                .read_vec3(index)?
                .into_iter()
                .map(|n| convert_vec3(n, options.convert_handedness))
                .collect();
        }
        if let Some(index) = target.child_index("TANGENT") {
            morph.tangents = reader
                .read_vec3(index)?
                .into_iter()
                .map(|t| t * options.scale_factor)
                .collect();
        }
        out.push(morph);
    }
    Ok(out)
}

/// Applies the load's conventions to Draco output.
fn convert_decompressed(
    geometry: DecompressedGeometry,
    options: &IngestOptions,
    checkpoint: &mut Checkpoint,
) -> Result<DecodedPrimitive, IngestError> {
    let mut out = DecodedPrimitive {
        draco_compressed: true,
        ..Default::default()
    };

    out.positions = geometry.positions;
    for p in &mut out.positions {
        checkpoint.tick()?;
        *p = convert_vec3(*p, options.convert_handedness) * options.scale_factor;
    }
    if options.import_normals {
        out.normals = geometry
            .normals
            .into_iter()
            .map(|n| convert_vec3(n, options.convert_handedness))
            .collect();
    }
    if !geometry.uvs.is_empty() {
        let uvs = if options.flip_uvs {
            geometry.uvs.into_iter().map(flip_uv).collect()
        } else {
            geometry.uvs
        };
        out.uvs.push(uvs);
    }
    if options.import_colors {
        out.colors = geometry.colors;
    }

    let raw_indices = if geometry.indices.is_empty() {
        (0..out.positions.len() as u32).collect()
    } else {
        geometry.indices
    };
    out.indices = triangulate(&raw_indices, PrimitiveMode::Triangles, options.convert_handedness);
    Ok(out)
}

/// Converts strip and fan indices to a triangle list.
///
/// Strips alternate winding so every triangle keeps the orientation of the
/// first. With `reverse_winding` each triangle's last two corners swap.
/// Trailing indices that do not complete a triangle are dropped.
pub fn triangulate(indices: &[u32], mode: PrimitiveMode, reverse_winding: bool) -> Vec<u32> {
    let mut triangles: Vec<[u32; 3]> = match mode {
        PrimitiveMode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    [w[0], w[1], w[2]]
                } else {
                    [w[1], w[0], w[2]]
                }
            })
            .collect(),
        PrimitiveMode::TriangleFan => match indices.split_first() {
            Some((&first, rest)) => rest
                .windows(2)
                .map(|w| [first, w[0], w[1]])
                .collect(),
            None => Vec::new(),
        },
        _ => {
            if indices.len() % 3 != 0 {
                log::warn!(
                    "Triangle list has {} indices, dropping {} trailing",
                    indices.len(),
                    indices.len() % 3
                );
            }
            indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect()
        }
    };

    if reverse_winding {
        for t in &mut triangles {
            t.swap(1, 2);
        }
    }
    triangles.into_iter().flatten().collect()
}
