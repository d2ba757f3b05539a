use glam::{DMat4, DVec4};
use math_rigbake::Axis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedAxis
{
    pub axis: Axis,
    pub negative: bool,
}
impl SignedAxis
{
    pub const POS_X: Self = Self { axis: Axis::X, negative: false };
    pub const POS_Y: Self = Self { axis: Axis::Y, negative: false };
    pub const POS_Z: Self = Self { axis: Axis::Z, negative: false };
    pub const NEG_Y: Self = Self { axis: Axis::Y, negative: true };
    pub const NEG_Z: Self = Self { axis: Axis::Z, negative: true };

    #[inline] #[must_use]
    fn sign(self) -> f64 { if self.negative { -1.0 } else { 1.0 } }

    #[inline] #[must_use]
    fn unit(self) -> DVec4
    {
        let mut v = DVec4::ZERO;
        v[self.axis.index()] = self.sign();
        v
    }
}

/// Which coordinate axes point right, up, and out of the front of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSystem
{
    pub right: SignedAxis,
    pub up: SignedAxis,
    pub front: SignedAxis,
}
impl AxisSystem
{
    /// Y up, right handed, models face +Z
    pub const GLTF: Self = Self { right: SignedAxis::POS_X, up: SignedAxis::POS_Y, front: SignedAxis::POS_Z };
    pub const OPENGL: Self = Self::GLTF;
    /// Y up, left handed
    pub const DIRECTX: Self = Self { right: SignedAxis::POS_X, up: SignedAxis::POS_Y, front: SignedAxis::NEG_Z };
    /// Z up, right handed
    pub const MAX: Self = Self { right: SignedAxis::POS_X, up: SignedAxis::POS_Z, front: SignedAxis::NEG_Y };

    fn basis(&self) -> DMat4
    {
        DMat4::from_cols(self.right.unit(), self.up.unit(), self.front.unit(), DVec4::W)
    }

    #[must_use]
    pub fn is_right_handed(&self) -> bool
    {
        self.basis().determinant() > 0.0
    }

    /// Maps coordinates expressed in `self` to coordinates expressed in `target`.
    /// Always a signed permutation, so its inverse is its transpose
    #[must_use]
    pub fn conversion_to(&self, target: &AxisSystem) -> DMat4
    {
        target.basis() * self.basis().transpose()
    }
}
impl Default for AxisSystem
{
    fn default() -> Self { Self::GLTF }
}

#[cfg(test)]
mod tests
{
    use glam::DVec3;
    use super::*;

    #[test]
    fn handedness()
    {
        assert!(AxisSystem::GLTF.is_right_handed());
        assert!(AxisSystem::MAX.is_right_handed());
        assert!(!AxisSystem::DIRECTX.is_right_handed());
    }

    #[test]
    fn identity_conversion()
    {
        assert_eq!(AxisSystem::DIRECTX.conversion_to(&AxisSystem::DIRECTX), DMat4::IDENTITY);
    }

    #[test]
    fn gltf_to_directx_flips_z()
    {
        let m = AxisSystem::GLTF.conversion_to(&AxisSystem::DIRECTX);
        assert_eq!(m.transform_point3(DVec3::new(1.0, 2.0, 3.0)), DVec3::new(1.0, 2.0, -3.0));
    }

    #[test]
    fn max_to_gltf_moves_up()
    {
        let m = AxisSystem::MAX.conversion_to(&AxisSystem::GLTF);
        // max up (+Z) becomes gltf up (+Y)
        assert_eq!(m.transform_vector3(DVec3::Z), DVec3::Y);
        // max front (-Y) becomes gltf front (+Z)
        assert_eq!(m.transform_vector3(DVec3::NEG_Y), DVec3::Z);
        assert_eq!(m.transform_vector3(DVec3::X), DVec3::X);
        assert!(m.determinant() > 0.0);
    }
}
