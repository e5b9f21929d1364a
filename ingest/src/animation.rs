//! Animation sampler decoding.
//!
//! Each channel yields its keyframe times and the sampler output as a flat
//! float array (`components` floats per keyframe, three times that for cubic
//! spline in-tangent/value/out-tangent triples). Curve fitting is left to the
//! consumer.

use crate::error::IngestError;
use crate::loader::GltfAsset;
use crate::math::{Vec3, Vec4, convert_rotation, convert_vec3};
use crate::options::IngestOptions;

/// Node property driven by a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationPath {
    Translation,
    Rotation,
    Scale,
    /// Morph target weights.
    Weights,
}

impl AnimationPath {
    /// Parses a glTF `target.path` string.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "translation" => Some(Self::Translation),
            "rotation" => Some(Self::Rotation),
            "scale" => Some(Self::Scale),
            "weights" => Some(Self::Weights),
            _ => None,
        }
    }
}

/// Keyframe interpolation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

impl Interpolation {
    /// Parses a glTF `interpolation` string. Unknown values are linear.
    pub fn parse(text: &str) -> Self {
        match text {
            "STEP" => Self::Step,
            "CUBICSPLINE" => Self::CubicSpline,
            _ => Self::Linear,
        }
    }
}

/// One decoded channel.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationChannel {
    /// Target node index.
    pub target_node: Option<usize>,
    pub path: AnimationPath,
    pub interpolation: Interpolation,
    /// Keyframe times in seconds.
    pub times: Vec<f32>,
    /// Flattened sampler output.
    pub values: Vec<f32>,
    /// Floats per output element (3 for translation, 4 for rotation, ...).
    pub components: usize,
}

impl AnimationChannel {
    /// Number of keyframes.
    pub fn keyframe_count(&self) -> usize {
        self.times.len()
    }
}

/// Decoded animation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedAnimation {
    /// Position in the `animations` array.
    pub index: usize,
    pub name: Option<String>,
    pub channels: Vec<AnimationChannel>,
}

impl DecodedAnimation {
    /// Latest keyframe time over all channels.
    pub fn duration(&self) -> f32 {
        self.channels
            .iter()
            .filter_map(|c| c.times.last().copied())
            .fold(0.0, f32::max)
    }
}

impl GltfAsset {
    /// Decodes every animation.
    pub fn decode_animations(&self) -> Result<Vec<DecodedAnimation>, IngestError> {
        (0..self.count("animations"))
            .map(|i| self.decode_animation(i))
            .collect()
    }

    /// Decodes animation `index`.
    ///
    /// Channels with an unknown path or a missing sampler are logged and
    /// skipped.
    pub fn decode_animation(&self, index: usize) -> Result<DecodedAnimation, IngestError> {
        let animation = self.entry("animations", index)?;
        let mut reader = self.reader();
        let mut checkpoint = self.checkpoint();
        let mut result = DecodedAnimation {
            index,
            name: animation.child_str("name").map(|s| s.into_owned()),
            channels: Vec::new(),
        };

        let samplers = animation.get("samplers");
        let Some(channels) = animation.get("channels") else {
            return Ok(result);
        };

        for (c, channel) in channels.iter().enumerate() {
            let target = channel.get("target");
            let path_name = target
                .and_then(|t| t.child_str("path"))
                .unwrap_or_default();
            let Some(path) = AnimationPath::parse(&path_name) else {
                log::warn!("Animation {index} channel {c}: unsupported path '{path_name}'");
                continue;
            };
            let Some(sampler) = channel
                .child_index("sampler")
                .and_then(|s| samplers.and_then(|samplers| samplers.at(s)))
            else {
                log::warn!("Animation {index} channel {c}: missing sampler");
                continue;
            };
            let (Some(input), Some(output)) =
                (sampler.child_index("input"), sampler.child_index("output"))
            else {
                log::warn!("Animation {index} channel {c}: sampler without input or output");
                continue;
            };

            let interpolation = sampler
                .child_str("interpolation")
                .map_or(Interpolation::Linear, |s| Interpolation::parse(&s));
            let times = reader.read_floats(input)?;
            let components = reader.info(output)?.components();
            let mut values = reader.read_floats(output)?;

            for element in values.chunks_exact_mut(components) {
                checkpoint.tick()?;
                convert_keyframe(path, element, &self.options);
            }

            result.channels.push(AnimationChannel {
                target_node: target.and_then(|t| t.child_index("node")),
                path,
                interpolation,
                times,
                values,
                components,
            });
        }

        log::debug!(
            "Animation {index}: {} channels, {:.3}s",
            result.channels.len(),
            result.duration()
        );
        Ok(result)
    }
}

/// Converts one output element in place.
///
/// Cubic spline tangents are vectors of the same kind as the values, so the
/// same rule applies to all three parts of a triple.
fn convert_keyframe(path: AnimationPath, element: &mut [f32], options: &IngestOptions) {
    match path {
        AnimationPath::Translation if element.len() >= 3 => {
            let v = convert_vec3(
                Vec3::new(element[0], element[1], element[2]),
                options.convert_handedness,
            ) * options.scale_factor;
            element[..3].copy_from_slice(v.as_slice());
        }
        AnimationPath::Rotation if element.len() >= 4 => {
            let q = convert_rotation(
                Vec4::new(element[0], element[1], element[2], element[3]),
                options.convert_handedness,
            );
            element[..4].copy_from_slice(q.as_slice());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_and_interpolation() {
        assert_eq!(AnimationPath::parse("rotation"), Some(AnimationPath::Rotation));
        assert_eq!(AnimationPath::parse("pointer"), None);
        assert_eq!(Interpolation::parse("STEP"), Interpolation::Step);
        assert_eq!(Interpolation::parse("CUBICSPLINE"), Interpolation::CubicSpline);
        assert_eq!(Interpolation::parse("LINEAR"), Interpolation::Linear);
        assert_eq!(Interpolation::parse("bogus"), Interpolation::Linear);
    }

    #[test]
    fn test_convert_translation() {
        let options = IngestOptions {
            scale_factor: 2.0,
            ..Default::default()
        };
        let mut element = [1.0, 2.0, 3.0];
        convert_keyframe(AnimationPath::Translation, &mut element, &options);
        assert_eq!(element, [-2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_convert_rotation() {
        let mut element = [0.1, 0.2, 0.3, 0.9];
        convert_keyframe(AnimationPath::Rotation, &mut element, &IngestOptions::default());
        assert_eq!(element, [0.1, -0.2, -0.3, 0.9]);
    }

    #[test]
    fn test_scale_and_weights_untouched() {
        let options = IngestOptions {
            scale_factor: 10.0,
            ..Default::default()
        };
        let mut scale = [1.0, 2.0, 3.0];
        convert_keyframe(AnimationPath::Scale, &mut scale, &options);
        assert_eq!(scale, [1.0, 2.0, 3.0]);
        let mut weight = [0.5];
        convert_keyframe(AnimationPath::Weights, &mut weight, &options);
        assert_eq!(weight, [0.5]);
    }

    #[test]
    fn test_raw_options_keep_values() {
        let mut element = [1.0, 2.0, 3.0];
        convert_keyframe(AnimationPath::Translation, &mut element, &IngestOptions::raw());
        assert_eq!(element, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_duration() {
        let channel = |times: Vec<f32>| AnimationChannel {
            target_node: Some(0),
            path: AnimationPath::Scale,
            interpolation: Interpolation::Linear,
            times,
            values: Vec::new(),
            components: 3,
        };
        let animation = DecodedAnimation {
            index: 0,
            name: None,
            channels: vec![channel(vec![0.0, 1.5]), channel(vec![0.0, 2.25]), channel(vec![])],
        };
        assert_eq!(animation.duration(), 2.25);
    }
}
