use glam::{Quat, Vec3};

use crate::AnimError;

/// How values between two keyframes are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Hold the previous keyframe value.
    Step,
    #[default]
    Linear,
    /// Hermite spline; each keyframe stores (in-tangent, value, out-tangent).
    CubicSpline,
}

/// Values that can live on a keyframe track.
pub trait Keyframe: Copy {
    fn interpolate(a: Self, b: Self, s: f32) -> Self;
    fn weighted_sum(terms: [(Self, f32); 4]) -> Self;
    fn finish(self) -> Self {
        self
    }
}

impl Keyframe for Vec3 {
    fn interpolate(a: Self, b: Self, s: f32) -> Self {
        a.lerp(b, s)
    }

    fn weighted_sum(terms: [(Self, f32); 4]) -> Self {
        terms.iter().fold(Vec3::ZERO, |acc, (v, w)| acc + *v * *w)
    }
}

impl Keyframe for Quat {
    fn interpolate(a: Self, b: Self, s: f32) -> Self {
        a.slerp(b, s)
    }

    fn weighted_sum(terms: [(Self, f32); 4]) -> Self {
        terms
            .iter()
            .fold(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0), |acc, (q, w)| {
                acc + *q * *w
            })
    }

    fn finish(self) -> Self {
        self.normalize()
    }
}

/// A keyframe track: sorted key times plus one value (or three, for cubic
/// splines) per key.
#[derive(Debug, Clone, PartialEq)]
pub struct Track<T> {
    times: Vec<f32>,
    values: Vec<T>,
    interpolation: Interpolation,
}

pub type TrackVec3 = Track<Vec3>;
pub type TrackQuat = Track<Quat>;

impl<T: Keyframe> Track<T> {
    pub fn new(
        times: Vec<f32>,
        values: Vec<T>,
        interpolation: Interpolation,
    ) -> Result<Self, AnimError> {
        if times.is_empty() {
            return Err(AnimError::EmptyTrack);
        }
        let expected = match interpolation {
            Interpolation::CubicSpline => times.len() * 3,
            Interpolation::Step | Interpolation::Linear => times.len(),
        };
        if values.len() != expected {
            return Err(AnimError::TrackLength {
                times: times.len(),
                values: values.len(),
                expected,
            });
        }
        if times.iter().any(|t| !t.is_finite()) || times.windows(2).any(|w| w[1] < w[0]) {
            return Err(AnimError::UnorderedKeyTimes);
        }
        Ok(Self {
            times,
            values,
            interpolation,
        })
    }

    pub fn times(&self) -> &[f32] {
        &self.times
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Time of the last keyframe.
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    fn value(&self, key: usize) -> T {
        match self.interpolation {
            Interpolation::CubicSpline => self.values[key * 3 + 1],
            Interpolation::Step | Interpolation::Linear => self.values[key],
        }
    }

    /// Sample the track at time `t`, clamping outside the keyed range.
    pub fn sample(&self, t: f32) -> T {
        let next = self.times.partition_point(|&k| k <= t);
        if next == 0 {
            return self.value(0);
        }
        if next == self.times.len() {
            return self.value(next - 1);
        }
        let prev = next - 1;
        let span = self.times[next] - self.times[prev];
        let s = (t - self.times[prev]) / span;

        match self.interpolation {
            Interpolation::Step => self.value(prev),
            Interpolation::Linear => T::interpolate(self.value(prev), self.value(next), s),
            Interpolation::CubicSpline => {
                let s2 = s * s;
                let s3 = s2 * s;
                let v0 = self.values[prev * 3 + 1];
                let out0 = self.values[prev * 3 + 2];
                let in1 = self.values[next * 3];
                let v1 = self.values[next * 3 + 1];
                T::weighted_sum([
                    (v0, 2.0 * s3 - 3.0 * s2 + 1.0),
                    (out0, span * (s3 - 2.0 * s2 + s)),
                    (v1, -2.0 * s3 + 3.0 * s2),
                    (in1, span * (s3 - s2)),
                ])
                .finish()
            }
        }
    }
}

/// Which node property a channel drives.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelTarget {
    Translation(TrackVec3),
    Rotation(TrackQuat),
    Scale(TrackVec3),
}

impl ChannelTarget {
    fn end_time(&self) -> f32 {
        match self {
            Self::Translation(t) | Self::Scale(t) => t.end_time(),
            Self::Rotation(t) => t.end_time(),
        }
    }
}

/// One animated property of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub node: usize,
    pub target: ChannelTarget,
}

/// A named set of channels sharing one timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    channels: Vec<Channel>,
}

impl AnimationClip {
    /// Build a clip; the duration is the latest key time over all channels.
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .map(|c| c.target.end_time())
            .fold(0.0_f32, f32::max);
        Self {
            name: name.into(),
            duration,
            channels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Highest node index any channel targets.
    pub fn max_node(&self) -> Option<usize> {
        self.channels.iter().map(|c| c.node).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(times: &[f32], xs: &[f32]) -> TrackVec3 {
        Track::new(
            times.to_vec(),
            xs.iter().map(|&x| Vec3::new(x, 0.0, 0.0)).collect(),
            Interpolation::Linear,
        )
        .unwrap()
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = Track::new(vec![0.0, 1.0], vec![Vec3::ZERO], Interpolation::Linear);
        assert!(matches!(err, Err(AnimError::TrackLength { expected: 2, .. })));

        let err = Track::new(vec![0.0], vec![Vec3::ZERO], Interpolation::CubicSpline);
        assert!(matches!(err, Err(AnimError::TrackLength { expected: 3, .. })));
    }

    #[test]
    fn rejects_empty_and_unordered() {
        assert_eq!(
            Track::<Vec3>::new(vec![], vec![], Interpolation::Step),
            Err(AnimError::EmptyTrack)
        );
        assert_eq!(
            Track::new(vec![1.0, 0.5], vec![Vec3::ZERO; 2], Interpolation::Step),
            Err(AnimError::UnorderedKeyTimes)
        );
    }

    #[test]
    fn linear_sampling_and_clamping() {
        let track = linear(&[0.0, 2.0], &[0.0, 4.0]);
        assert_eq!(track.sample(-1.0).x, 0.0);
        assert_eq!(track.sample(1.0).x, 2.0);
        assert_eq!(track.sample(2.0).x, 4.0);
        assert_eq!(track.sample(10.0).x, 4.0);
    }

    #[test]
    fn step_holds_previous_key() {
        let track = Track::new(
            vec![0.0, 1.0],
            vec![Vec3::ZERO, Vec3::ONE],
            Interpolation::Step,
        )
        .unwrap();
        assert_eq!(track.sample(0.99), Vec3::ZERO);
        assert_eq!(track.sample(1.0), Vec3::ONE);
    }

    #[test]
    fn cubic_spline_hits_keys_and_flat_tangents_stay_in_range() {
        let values = vec![
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ZERO, // key 0: in, value, out
            Vec3::ZERO,
            Vec3::splat(2.0),
            Vec3::ZERO, // key 1
        ];
        let track = Track::new(vec![0.0, 1.0], values, Interpolation::CubicSpline).unwrap();
        assert_eq!(track.sample(0.0), Vec3::ZERO);
        assert_eq!(track.sample(1.0), Vec3::splat(2.0));
        let mid = track.sample(0.5);
        assert!((mid.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn rotation_slerp_is_normalized() {
        let track = Track::new(
            vec![0.0, 1.0],
            vec![Quat::IDENTITY, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)],
            Interpolation::Linear,
        )
        .unwrap();
        let q = track.sample(0.5);
        assert!((q.length() - 1.0).abs() < 1e-5);
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(q.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn clip_duration_is_latest_key() {
        let clip = AnimationClip::new(
            "sway",
            vec![
                Channel {
                    node: 0,
                    target: ChannelTarget::Translation(linear(&[0.0, 1.5], &[0.0, 1.0])),
                },
                Channel {
                    node: 2,
                    target: ChannelTarget::Scale(linear(&[0.0, 3.0], &[1.0, 2.0])),
                },
            ],
        );
        assert_eq!(clip.duration(), 3.0);
        assert_eq!(clip.max_node(), Some(2));
        assert_eq!(clip.name(), "sway");
    }
}
