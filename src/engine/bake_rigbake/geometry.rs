use crate::skin::MeshSkinning;
use crate::{Issues, ResolveIssue};
use assets_rigbake::{SubMesh, Vertex};
use glam::{DMat4, DVec4};
use math_rigbake::{det3, winding_flip, CoordinateConvention};
use scene_rigbake::{MeshData, NodeId, Pose, Scene};

/// Tangent written when none is generated
pub const DEFAULT_TANGENT: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Negates all three axes
pub const LEGACY_STATIC_FLIP: DMat4 = DMat4::from_cols(
    DVec4::new(-1.0, 0.0, 0.0, 0.0),
    DVec4::new(0.0, -1.0, 0.0, 0.0),
    DVec4::new(0.0, 0.0, -1.0, 0.0),
    DVec4::W);

/// Transform from a mesh's control points into bake space (before the convention):
/// relative to the skeleton's reference mesh if given, otherwise world space
#[must_use]
pub fn mesh_space(scene: &Scene, node: NodeId, reference_inverse: Option<&DMat4>, legacy_flip: bool) -> DMat4
{
    let world = scene.evaluate_global(node, Pose::Rest) * scene.geometric_transform(node);
    let space = match reference_inverse
    {
        Some(inverse) => *inverse * world,
        None => world,
    };
    match legacy_flip
    {
        true => LEGACY_STATIC_FLIP * space,
        false => space,
    }
}

/// One vertex per triangle corner. `None` when no triangle survives
pub fn bake_sub_mesh(
    scene: &Scene,
    node: NodeId,
    mesh: &MeshData,
    space: &DMat4,
    convention: &CoordinateConvention,
    skinning: &MeshSkinning,
    material_index: u32,
    issues: &mut Issues) -> Option<SubMesh>
{
    let name = &scene.node(node).name;
    let flip = winding_flip(space, convention.is_mirrored());
    log::debug!("Sub-mesh {name:?}: det={:.4} flip={flip}", det3(space));

    let mut vertices = Vec::with_capacity(mesh.corner_count());
    let mut indices = Vec::with_capacity(mesh.corner_count());
    for (t, triangle) in mesh.triangles.iter().enumerate()
    {
        if triangle.iter().any(|cp| *cp as usize >= mesh.control_point_count())
        {
            issues.push(ResolveIssue::InvalidControlPoint { mesh: name.clone(), triangle: t });
            continue;
        }

        let base = vertices.len() as u32;
        for (corner, cp) in triangle.iter().enumerate()
        {
            let position = convention.bake_point(space.transform_point3(mesh.control_points[*cp as usize]));
            let normal = convention.bake_normal(space, mesh.corner_normal(t, corner));
            let uv = mesh.corner_uv(t, corner).map_or([0.0, 0.0], |uv| [uv.x as f32, 1.0 - uv.y as f32]);
            let (bone_indices, bone_weights) = skinning.vertex_influences(*cp);

            vertices.push(Vertex
            {
                position: position.as_vec3().to_array(),
                normal: normal.as_vec3().to_array(),
                uv,
                tangent: DEFAULT_TANGENT,
                bone_indices,
                bone_weights,
            });
        }

        match flip
        {
            true => indices.extend([base, base + 2, base + 1]),
            false => indices.extend([base, base + 1, base + 2]),
        }
    }

    if indices.is_empty()
    {
        log::debug!("Skipping empty sub-mesh {name:?}");
        return None;
    }

    Some(SubMesh
    {
        mesh_name: name.clone(),
        material_index,
        vertices,
        indices,
    })
}
