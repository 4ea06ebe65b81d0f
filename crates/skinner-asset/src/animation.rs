use std::ops::{Add, Mul};

use glam::{Quat, Vec3, Vec4};

use crate::error::AnimationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    /// Three values per key: in tangent, value, out tangent.
    CubicSpline,
}

impl Interpolation {
    fn values_per_key(self) -> usize {
        match self {
            Interpolation::CubicSpline => 3,
            Interpolation::Linear | Interpolation::Step => 1,
        }
    }

    /// Value between keys `from` and `to` at `factor` in `[0, 1]`.
    /// `delta` is the time between the two keys.
    pub fn sample<T: Interpolate>(
        self,
        values: &[T],
        from: usize,
        to: usize,
        factor: f32,
        delta: f32,
    ) -> T {
        // the key value itself, untouched by float error
        if factor <= 0.0 {
            return match self {
                Interpolation::CubicSpline => values[from * 3 + 1],
                Interpolation::Linear | Interpolation::Step => values[from],
            };
        }
        match self {
            Interpolation::Step => values[from],
            Interpolation::Linear => T::interpolate(values[from], values[to], factor),
            Interpolation::CubicSpline => T::cubic_spline(
                values[from * 3 + 1],
                values[from * 3 + 2],
                values[to * 3 + 1],
                values[to * 3],
                factor,
                delta,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl ChannelValues {
    pub fn path(&self) -> TargetPath {
        match self {
            ChannelValues::Translation(_) => TargetPath::Translation,
            ChannelValues::Rotation(_) => TargetPath::Rotation,
            ChannelValues::Scale(_) => TargetPath::Scale,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChannelValues::Translation(values) | ChannelValues::Scale(values) => values.len(),
            ChannelValues::Rotation(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keyframes driving one transform component of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationChannel {
    target: usize,
    interpolation: Interpolation,
    times: Vec<f32>,
    values: ChannelValues,
}

impl AnimationChannel {
    pub fn new(
        target: usize,
        interpolation: Interpolation,
        times: Vec<f32>,
        values: ChannelValues,
    ) -> Result<Self, AnimationError> {
        if times.is_empty() {
            return Err(AnimationError::Empty);
        }
        if values.len() != times.len() * interpolation.values_per_key() {
            return Err(AnimationError::KeyCount {
                times: times.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            target,
            interpolation,
            times,
            values,
        })
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn path(&self) -> TargetPath {
        self.values.path()
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Never empty.
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    pub fn values(&self) -> &ChannelValues {
        &self.values
    }

    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationAsset {
    pub name: Option<String>,
    pub channels: Vec<AnimationChannel>,
    /// Latest key time over all channels.
    pub duration: f32,
}

impl AnimationAsset {
    pub fn new(name: Option<String>, channels: Vec<AnimationChannel>) -> Self {
        let duration = channels
            .iter()
            .map(AnimationChannel::end_time)
            .fold(0.0, f32::max);
        Self {
            name,
            channels,
            duration,
        }
    }
}

pub trait Interpolate: Copy {
    fn interpolate(a: Self, b: Self, factor: f32) -> Self;

    /// Hermite spline from `value` (leaving with `out_tangent`) to `next`
    /// (arriving with `in_tangent`).
    fn cubic_spline(
        value: Self,
        out_tangent: Self,
        next: Self,
        in_tangent: Self,
        factor: f32,
        delta: f32,
    ) -> Self;
}

fn hermite<T>(value: T, out_tangent: T, next: T, in_tangent: T, t: f32, delta: f32) -> T
where
    T: Mul<f32, Output = T> + Add<T, Output = T>,
{
    let t2 = t * t;
    let t3 = t2 * t;
    value * (2.0 * t3 - 3.0 * t2 + 1.0)
        + out_tangent * (delta * (t3 - 2.0 * t2 + t))
        + next * (-2.0 * t3 + 3.0 * t2)
        + in_tangent * (delta * (t3 - t2))
}

impl Interpolate for Vec3 {
    fn interpolate(a: Self, b: Self, factor: f32) -> Self {
        a.lerp(b, factor)
    }

    fn cubic_spline(
        value: Self,
        out_tangent: Self,
        next: Self,
        in_tangent: Self,
        factor: f32,
        delta: f32,
    ) -> Self {
        hermite(value, out_tangent, next, in_tangent, factor, delta)
    }
}

impl Interpolate for Quat {
    fn interpolate(a: Self, b: Self, factor: f32) -> Self {
        a.slerp(b, factor)
    }

    fn cubic_spline(
        value: Self,
        out_tangent: Self,
        next: Self,
        in_tangent: Self,
        factor: f32,
        delta: f32,
    ) -> Self {
        let result = hermite(
            Vec4::from(value),
            Vec4::from(out_tangent),
            Vec4::from(next),
            Vec4::from(in_tangent),
            factor,
            delta,
        );
        Quat::from_vec4(result).normalize()
    }
}

#[cfg(test)]
mod test {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn channel_checks_key_counts() {
        assert_eq!(
            AnimationChannel::new(
                0,
                Interpolation::Linear,
                vec![],
                ChannelValues::Scale(vec![])
            ),
            Err(AnimationError::Empty)
        );
        assert_eq!(
            AnimationChannel::new(
                0,
                Interpolation::Linear,
                vec![0.0, 1.0],
                ChannelValues::Translation(vec![Vec3::ZERO])
            ),
            Err(AnimationError::KeyCount {
                times: 2,
                values: 1
            })
        );
        assert!(AnimationChannel::new(
            0,
            Interpolation::CubicSpline,
            vec![0.0, 1.0],
            ChannelValues::Translation(vec![Vec3::ZERO; 6])
        )
        .is_ok());
    }

    #[test]
    fn duration_is_latest_key() {
        let short = AnimationChannel::new(
            0,
            Interpolation::Linear,
            vec![0.0, 0.5],
            ChannelValues::Scale(vec![Vec3::ONE; 2]),
        )
        .unwrap();
        let long = AnimationChannel::new(
            1,
            Interpolation::Step,
            vec![0.25, 1.5],
            ChannelValues::Rotation(vec![Quat::IDENTITY; 2]),
        )
        .unwrap();
        let animation = AnimationAsset::new(Some("walk".to_string()), vec![short, long]);
        assert_eq!(animation.duration, 1.5);
        assert_eq!(AnimationAsset::new(None, vec![]).duration, 0.0);
    }

    #[test]
    fn linear_and_step() {
        let values = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];
        let half = Interpolation::Linear.sample(&values, 0, 1, 0.5, 1.0);
        assert!(half.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
        assert_eq!(Interpolation::Linear.sample(&values, 0, 1, 0.0, 1.0), values[0]);
        assert_eq!(Interpolation::Step.sample(&values, 0, 1, 0.9, 1.0), values[0]);
    }

    #[test]
    fn rotation_uses_slerp() {
        let values = [Quat::IDENTITY, Quat::from_xyzw(0.0, 1.0, 0.0, 0.0)];
        let half = Interpolation::Linear.sample(&values, 0, 1, 0.5, 1.0);
        assert!(half.abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2), 1e-5));
        assert!((half.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cubic_spline_hits_keys_and_follows_tangents() {
        // in, value, out per key
        let values = [
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::X,
            Vec3::X,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::ZERO,
        ];
        let spline = Interpolation::CubicSpline;
        assert!(spline
            .sample(&values, 0, 1, 0.0, 1.0)
            .abs_diff_eq(Vec3::ZERO, 1e-6));
        assert!(spline
            .sample(&values, 0, 1, 1.0, 1.0)
            .abs_diff_eq(Vec3::X, 1e-6));
        // unit slope at both ends makes the curve a straight line
        assert!(spline
            .sample(&values, 0, 1, 0.5, 1.0)
            .abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));

        let rotations = [
            Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
            Quat::IDENTITY,
            Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
            Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
            Quat::from_rotation_z(1.0),
            Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
        ];
        let middle = spline.sample(&rotations, 0, 1, 0.5, 1.0);
        assert!((middle.length() - 1.0).abs() < 1e-5);
    }
}
