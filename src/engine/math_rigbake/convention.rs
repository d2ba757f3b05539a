use crate::{det3, normal_matrix, with_translation};
use glam::{DMat4, DVec3, DVec4};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis
{
    X,
    Y,
    Z,
}
impl Axis
{
    #[inline] #[must_use]
    pub fn index(self) -> usize
    {
        match self
        {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Diagonal matrix negating a single axis
#[must_use]
pub fn mirror_matrix(axis: Axis) -> DMat4
{
    let mut diag = DVec4::ONE;
    diag[axis.index()] = -1.0;
    DMat4::from_diagonal(diag)
}

/// True when triangles must have their second and third corners swapped to keep front faces.
/// An odd number of reflections (negative world determinant, or the mirror) flips the winding
#[inline] #[must_use]
pub fn winding_flip(world: &DMat4, mirror_applied: bool) -> bool
{
    (det3(world) < 0.0) ^ mirror_applied
}

/// Handedness/unit normalization applied identically to geometry, bind matrices and keyframes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateConvention
{
    pub mirror: Option<Axis>,
    /// Applied to translations only
    pub length_scale: f64,
}
impl Default for CoordinateConvention
{
    fn default() -> Self { Self
    {
        mirror: None,
        length_scale: 1.0,
    }}
}
impl CoordinateConvention
{
    #[inline] #[must_use]
    pub fn is_mirrored(&self) -> bool { self.mirror.is_some() }

    /// `S * m * S`
    #[must_use]
    pub fn conjugate(&self, m: &DMat4) -> DMat4
    {
        match self.mirror
        {
            Some(axis) =>
            {
                let s = mirror_matrix(axis);
                s * *m * s
            }
            None => *m,
        }
    }

    #[must_use]
    pub fn scale_translation(&self, m: &DMat4) -> DMat4
    {
        with_translation(m, m.w_axis.truncate() * self.length_scale)
    }

    /// Translation scaling followed by the mirror conjugation
    #[must_use]
    pub fn normalize(&self, m: &DMat4) -> DMat4
    {
        self.conjugate(&self.scale_translation(m))
    }

    #[inline] #[must_use]
    pub fn mirror_vector(&self, mut v: DVec3) -> DVec3
    {
        if let Some(axis) = self.mirror
        {
            v[axis.index()] = -v[axis.index()];
        }
        v
    }

    /// Position already in the bake space -> mirrored and unit scaled
    #[inline] #[must_use]
    pub fn bake_point(&self, p: DVec3) -> DVec3
    {
        self.mirror_vector(p) * self.length_scale
    }

    /// Linear bake transform for a mesh, `S * m` (translation not scaled)
    #[must_use]
    pub fn bake_matrix(&self, m: &DMat4) -> DMat4
    {
        match self.mirror
        {
            Some(axis) => mirror_matrix(axis) * *m,
            None => *m,
        }
    }

    /// Normal through `m` then the mirror, unit length (zero stays zero)
    #[must_use]
    pub fn bake_normal(&self, m: &DMat4, n: DVec3) -> DVec3
    {
        let out = normal_matrix(&self.bake_matrix(m)) * n;
        out.normalize_or_zero()
    }
}
