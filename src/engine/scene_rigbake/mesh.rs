use crate::NodeId;
use glam::{DVec2, DVec3};

/// Links one bone node to the control points it deforms
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Cluster
{
    /// The bone node. Unlinked clusters are ignored
    pub link: Option<NodeId>,
    pub control_points: Vec<u32>,
    pub weights: Vec<f64>,
}
impl Cluster
{
    pub fn influences(&self) -> impl Iterator<Item = (u32, f64)> + '_
    {
        self.control_points.iter().copied().zip(self.weights.iter().copied())
    }
}

/// A skin deformer
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Skin
{
    pub clusters: Vec<Cluster>,
}

/// Triangulated mesh geometry, in the owning node's geometry space
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshData
{
    pub control_points: Vec<DVec3>,
    /// Control point index per corner
    pub triangles: Vec<[u32; 3]>,
    /// Per corner (three per triangle). Empty means face normals
    pub normals: Vec<DVec3>,
    /// Per corner UV set 0, bottom-left origin
    pub uvs: Option<Vec<DVec2>>,
    pub skins: Vec<Skin>,
}
impl MeshData
{
    #[inline] #[must_use]
    pub fn control_point_count(&self) -> usize { self.control_points.len() }

    #[inline] #[must_use]
    pub fn is_skinned(&self) -> bool { !self.skins.is_empty() }

    #[inline] #[must_use]
    pub fn corner_count(&self) -> usize { self.triangles.len() * 3 }

    /// Normal at a corner, falling back to the face normal
    #[must_use]
    pub fn corner_normal(&self, triangle: usize, corner: usize) -> DVec3
    {
        if let Some(n) = self.normals.get(triangle * 3 + corner)
        {
            return *n;
        }

        let [a, b, c] = self.triangles[triangle].map(|i| self.control_points.get(i as usize).copied().unwrap_or_default());
        (b - a).cross(c - a).normalize_or_zero()
    }

    #[must_use]
    pub fn corner_uv(&self, triangle: usize, corner: usize) -> Option<DVec2>
    {
        self.uvs.as_ref()?.get(triangle * 3 + corner).copied()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SourceMaterial
{
    pub name: String,
    /// File path/URI as authored
    pub diffuse_texture: Option<String>,
    pub normal_texture: Option<String>,
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn quad() -> MeshData
    {
        MeshData
        {
            control_points: vec![DVec3::ZERO, DVec3::X, DVec3::new(1.0, 1.0, 0.0), DVec3::Y],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
            ..Default::default()
        }
    }

    #[test]
    fn face_normal_fallback()
    {
        let mesh = quad();
        assert_eq!(mesh.corner_normal(1, 2), DVec3::Z);
        assert_eq!(mesh.corner_count(), 6);
        assert!(mesh.corner_uv(0, 0).is_none());
        assert!(!mesh.is_skinned());
    }

    #[test]
    fn authored_normals_win()
    {
        let mut mesh = quad();
        mesh.normals = vec![DVec3::NEG_Z; 6];
        assert_eq!(mesh.corner_normal(0, 1), DVec3::NEG_Z);
    }

    #[test]
    fn cluster_pairs()
    {
        let cluster = Cluster { link: None, control_points: vec![3, 1], weights: vec![0.25, 0.75] };
        assert_eq!(cluster.influences().collect::<Vec<_>>(), vec![(3, 0.25), (1, 0.75)]);
    }
}
