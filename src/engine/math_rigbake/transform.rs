use glam::{DMat4, DQuat, DVec3, Quat, Vec3};

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Transform
{
    pub position: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}
impl Default for Transform
{
    fn default() -> Self { Self
    {
        position: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    }}
}
impl Transform
{
    #[inline] #[must_use]
    pub fn to_world_mtx(&self) -> DMat4 { DMat4::from_scale_rotation_translation(self.scale, self.rotation, self.position) }

    // Rotation is renormalized, falling back to identity if it collapsed
    #[inline] #[must_use]
    pub fn normalized(mut self) -> Self
    {
        let len_sq = self.rotation.length_squared();
        self.rotation = match len_sq > 0.0 && len_sq.is_finite()
        {
            true => self.rotation.normalize(),
            false => DQuat::IDENTITY,
        };
        self
    }

    /// Narrow to single precision, as stored in the baked files
    #[inline] #[must_use]
    pub fn to_f32(&self) -> (Vec3, Quat, Vec3)
    {
        (
            Vec3::new(self.position.x as f32, self.position.y as f32, self.position.z as f32),
            Quat::from_xyzw(self.rotation.x as f32, self.rotation.y as f32, self.rotation.z as f32, self.rotation.w as f32),
            Vec3::new(self.scale.x as f32, self.scale.y as f32, self.scale.z as f32),
        )
    }
}

impl From<(DVec3, DQuat, DVec3)> for Transform
{
    fn from((position, rotation, scale): (DVec3, DQuat, DVec3)) -> Self
    {
        Transform { position, rotation, scale }
    }
}
impl From<Transform> for DMat4
{
    fn from(t: Transform) -> Self { t.to_world_mtx() }
}
impl From<DMat4> for Transform
{
    fn from(m: DMat4) -> Self
    {
        let (scale, rotation, position) = m.to_scale_rotation_translation();
        Transform { position, rotation, scale }
    }
}

/// Rotation from Euler angles in degrees, applied X first, then Y, then Z
#[inline] #[must_use]
pub fn quat_from_euler_xyz_degrees(degrees: DVec3) -> DQuat
{
    DQuat::from_rotation_z(degrees.z.to_radians()) *
    DQuat::from_rotation_y(degrees.y.to_radians()) *
    DQuat::from_rotation_x(degrees.x.to_radians())
}

/// Inverse of `quat_from_euler_xyz_degrees`
#[inline] #[must_use]
pub fn euler_xyz_degrees_from_quat(rotation: DQuat) -> DVec3
{
    // ZYX intrinsic is the same composition as XYZ extrinsic
    let (z, y, x) = rotation.to_euler(glam::EulerRot::ZYX);
    DVec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}
