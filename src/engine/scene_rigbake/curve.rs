use glam::{DQuat, DVec4};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation
{
    Constant,
    #[default]
    Linear,
    /// Hermite, using the keys' tangents (value units per second)
    Cubic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveKey
{
    pub time: f64,
    pub value: f64,
    /// Governs the segment from this key to the next
    pub interpolation: Interpolation,
    pub in_tangent: f64,
    pub out_tangent: f64,
}
impl CurveKey
{
    #[must_use]
    pub fn linear(time: f64, value: f64) -> Self
    {
        Self { time, value, interpolation: Interpolation::Linear, in_tangent: 0.0, out_tangent: 0.0 }
    }
    #[must_use]
    pub fn constant(time: f64, value: f64) -> Self
    {
        Self { time, value, interpolation: Interpolation::Constant, in_tangent: 0.0, out_tangent: 0.0 }
    }
}

// (s, dt) for a time inside [t0, t1]
#[inline]
fn segment_param(t0: f64, t1: f64, time: f64) -> (f64, f64)
{
    let dt = t1 - t0;
    match dt > 0.0
    {
        true => (((time - t0) / dt).clamp(0.0, 1.0), dt),
        false => (0.0, 0.0),
    }
}

#[inline]
fn hermite(p0: f64, m0: f64, p1: f64, m1: f64, s: f64, dt: f64) -> f64
{
    let s2 = s * s;
    let s3 = s2 * s;
    (2.0 * s3 - 3.0 * s2 + 1.0) * p0 +
    (s3 - 2.0 * s2 + s) * dt * m0 +
    (-2.0 * s3 + 3.0 * s2) * p1 +
    (s3 - s2) * dt * m1
}

// index of the key starting the segment containing `time`, or None if before the first key
fn segment_start<K>(keys: &[K], time: f64, key_time: impl Fn(&K) -> f64) -> Option<usize>
{
    let after = keys.partition_point(|k| key_time(k) <= time);
    after.checked_sub(1)
}

/// A single scalar channel (one axis of translation, rotation or scale)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnimCurve
{
    keys: Vec<CurveKey>,
}
impl AnimCurve
{
    /// Keys are sorted by time. Keys sharing a time keep the last one
    #[must_use]
    pub fn new(mut keys: Vec<CurveKey>) -> Self
    {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        keys.reverse();
        keys.dedup_by(|a, b| a.time == b.time);
        keys.reverse();
        Self { keys }
    }

    #[inline] #[must_use]
    pub fn keys(&self) -> &[CurveKey] { &self.keys }

    pub fn key_times(&self) -> impl Iterator<Item = f64> + '_ { self.keys.iter().map(|k| k.time) }

    #[must_use]
    pub fn evaluate(&self, time: f64) -> Option<f64>
    {
        let first = self.keys.first()?;
        let Some(i) = segment_start(&self.keys, time, |k| k.time) else { return Some(first.value) };
        let k0 = &self.keys[i];
        let Some(k1) = self.keys.get(i + 1) else { return Some(k0.value) };

        let (s, dt) = segment_param(k0.time, k1.time, time);
        Some(match k0.interpolation
        {
            Interpolation::Constant => k0.value,
            Interpolation::Linear => k0.value + (k1.value - k0.value) * s,
            Interpolation::Cubic => hermite(k0.value, k0.out_tangent, k1.value, k1.in_tangent, s, dt),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuatKey
{
    pub time: f64,
    pub value: DQuat,
    pub interpolation: Interpolation,
    pub in_tangent: DVec4,
    pub out_tangent: DVec4,
}
impl QuatKey
{
    #[must_use]
    pub fn linear(time: f64, value: DQuat) -> Self
    {
        Self { time, value, interpolation: Interpolation::Linear, in_tangent: DVec4::ZERO, out_tangent: DVec4::ZERO }
    }
}

/// Whole-rotation channel, as authored by quaternion based sources
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QuatCurve
{
    keys: Vec<QuatKey>,
}
impl QuatCurve
{
    #[must_use]
    pub fn new(mut keys: Vec<QuatKey>) -> Self
    {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        keys.reverse();
        keys.dedup_by(|a, b| a.time == b.time);
        keys.reverse();
        Self { keys }
    }

    #[inline] #[must_use]
    pub fn keys(&self) -> &[QuatKey] { &self.keys }

    pub fn key_times(&self) -> impl Iterator<Item = f64> + '_ { self.keys.iter().map(|k| k.time) }

    #[must_use]
    pub fn evaluate(&self, time: f64) -> Option<DQuat>
    {
        let first = self.keys.first()?;
        let Some(i) = segment_start(&self.keys, time, |k| k.time) else { return Some(first.value) };
        let k0 = &self.keys[i];
        let Some(k1) = self.keys.get(i + 1) else { return Some(k0.value) };

        let (s, dt) = segment_param(k0.time, k1.time, time);
        Some(match k0.interpolation
        {
            Interpolation::Constant => k0.value,
            Interpolation::Linear => k0.value.slerp(k1.value, s),
            Interpolation::Cubic =>
            {
                let p0 = DVec4::from(k0.value);
                let p1 = DVec4::from(k1.value);
                let v = DVec4::new(
                    hermite(p0.x, k0.out_tangent.x, p1.x, k1.in_tangent.x, s, dt),
                    hermite(p0.y, k0.out_tangent.y, p1.y, k1.in_tangent.y, s, dt),
                    hermite(p0.z, k0.out_tangent.z, p1.z, k1.in_tangent.z, s, dt),
                    hermite(p0.w, k0.out_tangent.w, p1.w, k1.in_tangent.w, s, dt));
                DQuat::from_vec4(v).normalize()
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RotationCurves
{
    /// Per-axis Euler angles in degrees (XYZ order)
    Euler([Option<AnimCurve>; 3]),
    Quat(QuatCurve),
}
impl Default for RotationCurves
{
    fn default() -> Self { RotationCurves::Euler([None, None, None]) }
}

/// Every animated channel of one node within one animation stack
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeCurves
{
    pub translation: [Option<AnimCurve>; 3],
    pub rotation: RotationCurves,
    pub scale: [Option<AnimCurve>; 3],
}
impl NodeCurves
{
    /// Key times of all channels, unsorted and possibly repeated
    pub fn key_times(&self) -> impl Iterator<Item = f64> + '_
    {
        let axes = |curves: &[Option<AnimCurve>; 3]| -> Vec<f64>
        {
            curves.iter().flatten().flat_map(|c| c.key_times()).collect()
        };

        let mut times = axes(&self.translation);
        match &self.rotation
        {
            RotationCurves::Euler(curves) => times.extend(axes(curves)),
            RotationCurves::Quat(curve) => times.extend(curve.key_times()),
        }
        times.extend(axes(&self.scale));
        times.into_iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.key_times().next().is_none() }
}
