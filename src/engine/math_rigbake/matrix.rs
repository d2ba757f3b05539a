use glam::{DMat3, DMat4, DVec3, Mat4};

/// Determinants with a smaller magnitude are treated as singular
pub const SINGULAR_EPSILON: f64 = 1e-12;

/// Determinant of the upper 3x3 (the linear part) of `m`
#[inline] #[must_use]
pub fn det3(m: &DMat4) -> f64
{
    DMat3::from_mat4(*m).determinant()
}

/// `None` when `m` is singular or not finite
#[inline] #[must_use]
pub fn try_inverse(m: &DMat4) -> Option<DMat4>
{
    let det = m.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON
    {
        return None;
    }

    let inv = m.inverse();
    inv.is_finite().then_some(inv)
}

/// Matrix transforming directions (normals) consistently with `m`
#[must_use]
pub fn normal_matrix(m: &DMat4) -> DMat3
{
    let linear = DMat3::from_mat4(*m);
    let det = linear.determinant();
    match det.is_finite() && det.abs() >= SINGULAR_EPSILON
    {
        true => linear.inverse().transpose(),
        false => linear,
    }
}

#[inline] #[must_use]
pub fn with_translation(m: &DMat4, translation: DVec3) -> DMat4
{
    let mut out = *m;
    out.w_axis = translation.extend(out.w_axis.w);
    out
}

/// Narrow to single precision. Element order is column-major: translation sits in 12..15
#[inline] #[must_use]
pub fn to_mat4(m: &DMat4) -> Mat4
{
    Mat4::from_cols_array(&m.to_cols_array().map(|v| v as f32))
}
