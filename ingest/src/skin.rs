//! Skin decoding.

use crate::error::IngestError;
use crate::loader::GltfAsset;
use crate::math::{Mat4, convert_mat4};

/// Decoded skin.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedSkin {
    /// Position in the `skins` array.
    pub index: usize,
    pub name: Option<String>,
    /// Joint node indices.
    pub joints: Vec<usize>,
    /// Root node of the joint hierarchy.
    pub skeleton: Option<usize>,
    /// One matrix per joint. Identity when the skin declares none.
    pub inverse_bind_matrices: Vec<Mat4>,
}

impl GltfAsset {
    /// Decodes every skin.
    pub fn decode_skins(&self) -> Result<Vec<DecodedSkin>, IngestError> {
        (0..self.count("skins")).map(|i| self.decode_skin(i)).collect()
    }

    /// Decodes skin `index`.
    ///
    /// Inverse bind matrices get the same handedness conversion as node
    /// transforms, and their translation is scaled like positions.
    pub fn decode_skin(&self, index: usize) -> Result<DecodedSkin, IngestError> {
        let skin = self.entry("skins", index)?;
        let joints: Vec<usize> = skin
            .get("joints")
            .map(|joints| {
                joints
                    .iter()
                    .filter_map(|j| j.try_i64().and_then(|v| usize::try_from(v).ok()))
                    .collect()
            })
            .unwrap_or_default();

        let inverse_bind_matrices = match skin.child_index("inverseBindMatrices") {
            Some(accessor) => {
                let mut matrices = self.reader().read_mat4(accessor)?;
                if matrices.len() != joints.len() {
                    log::warn!(
                        "Skin {index}: {} inverse bind matrices for {} joints",
                        matrices.len(),
                        joints.len()
                    );
                }
                for m in &mut matrices {
                    *m = convert_mat4(*m, self.options.convert_handedness);
                    for row in 0..3 {
                        m[(row, 3)] *= self.options.scale_factor;
                    }
                }
                matrices
            }
            None => vec![Mat4::identity(); joints.len()],
        };

        log::debug!("Skin {index}: {} joints", joints.len());
        Ok(DecodedSkin {
            index,
            name: skin.child_str("name").map(|s| s.into_owned()),
            joints,
            skeleton: skin.child_index("skeleton"),
            inverse_bind_matrices,
        })
    }
}
