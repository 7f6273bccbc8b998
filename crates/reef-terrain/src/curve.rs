//! Cliff profile curve: three keyed channels sampled over `[0, 1]`.

use glam::Vec3;

/// One scalar channel of a keyed curve.
///
/// Keys are kept sorted by time. Sampling interpolates linearly between keys
/// and holds the first/last value outside the keyed range. A channel without
/// keys samples to zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurveChannel {
    keys: Vec<(f32, f32)>,
}

impl CurveChannel {
    /// Build a channel from `(time, value)` keys in any order.
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.retain(|(t, v)| t.is_finite() && v.is_finite());
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// A channel that returns `value` everywhere.
    pub fn constant(value: f32) -> Self {
        Self::new(vec![(0.0, value)])
    }

    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    pub fn sample(&self, t: f32) -> f32 {
        let (Some(&(first_t, first_v)), Some(&(last_t, last_v))) =
            (self.keys.first(), self.keys.last())
        else {
            return 0.0;
        };

        if t <= first_t {
            return first_v;
        }
        if t >= last_t {
            return last_v;
        }

        // First key strictly after t; t > first_t guarantees idx >= 1.
        let idx = self.keys.partition_point(|&(kt, _)| kt <= t);
        let (t0, v0) = self.keys[idx - 1];
        let (t1, v1) = self.keys[idx];
        let span = t1 - t0;
        if span <= f32::EPSILON {
            return v1;
        }
        v0 + (v1 - v0) * ((t - t0) / span)
    }
}

/// The authored profile that shapes the reef basin.
///
/// Sampled by normalized angle around the centre, `x` skews the radial
/// distance. Sampled by that skewed distance, `y` pulls vertices toward the
/// centre (overhangs) and `z` lifts them into the cliff wall.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CliffProfileCurve {
    pub x: CurveChannel,
    pub y: CurveChannel,
    pub z: CurveChannel,
}

impl CliffProfileCurve {
    pub fn new(x: CurveChannel, y: CurveChannel, z: CurveChannel) -> Self {
        Self { x, y, z }
    }

    pub fn from_keys(x: Vec<(f32, f32)>, y: Vec<(f32, f32)>, z: Vec<(f32, f32)>) -> Self {
        Self::new(CurveChannel::new(x), CurveChannel::new(y), CurveChannel::new(z))
    }

    /// A curve that samples to `(0, 0, 0)` everywhere: no skew, no cliff.
    pub fn flat() -> Self {
        Self::default()
    }

    /// A curve that samples to `value` everywhere.
    pub fn constant(value: Vec3) -> Self {
        Self::new(
            CurveChannel::constant(value.x),
            CurveChannel::constant(value.y),
            CurveChannel::constant(value.z),
        )
    }

    pub fn sample(&self, t: f32) -> Vec3 {
        Vec3::new(self.x.sample(t), self.y.sample(t), self.z.sample(t))
    }
}
