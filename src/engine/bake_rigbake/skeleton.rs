use crate::{Issues, MeshFilter, ResolveIssue};
use assets_rigbake::Bone;
use glam::DMat4;
use math_rigbake::{to_mat4, try_inverse, CoordinateConvention};
use scene_rigbake::{NodeId, NodeKind, Pose, Scene};
use std::collections::HashMap;

/// A bone before its bind pose is known
#[derive(Debug, Clone, PartialEq)]
pub struct BoneDecl
{
    pub name: String,
    pub parent_index: i32,
    pub node: Option<NodeId>,
}

/// Bone name -> bone index. Scoped to one scene
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BoneTable
{
    by_name: HashMap<String, u32>,
}
impl BoneTable
{
    #[must_use]
    pub fn from_decls(decls: &[BoneDecl]) -> Self
    {
        let mut by_name = HashMap::new();
        for (i, decl) in decls.iter().enumerate()
        {
            // duplicate names resolve to the first bone
            by_name.entry(decl.name.clone()).or_insert(i as u32);
        }
        Self { by_name }
    }

    #[inline] #[must_use]
    pub fn get(&self, name: &str) -> Option<u32> { self.by_name.get(name).copied() }
    #[inline] #[must_use]
    pub fn len(&self) -> usize { self.by_name.len() }
    #[inline] #[must_use]
    pub fn is_empty(&self) -> bool { self.by_name.is_empty() }
}

/// Every skeleton node in depth first order, parents before children
#[must_use]
pub fn collect_bones(scene: &Scene) -> Vec<BoneDecl>
{
    let mut bones = Vec::new();
    // nearest skeleton ancestor's bone index, per visited node
    let mut bone_parent: HashMap<NodeId, i32> = HashMap::new();

    for node in scene.depth_first()
    {
        let scene_node = scene.node(node);
        let inherited = scene_node.parent.and_then(|p| bone_parent.get(&p).copied()).unwrap_or(-1);

        let own = match scene_node.kind()
        {
            NodeKind::Skeleton =>
            {
                let index = bones.len() as i32;
                debug_assert!(inherited < index);
                bones.push(BoneDecl { name: scene_node.name.clone(), parent_index: inherited, node: Some(node) });
                index
            }
            _ => inherited,
        };
        bone_parent.insert(node, own);
    }

    bones
}

/// The mesh defining the skeleton's reference space: the skinned mesh with the most control points
/// (first wins ties), else the first accepted mesh
#[must_use]
pub fn select_reference_mesh(scene: &Scene, filter: MeshFilter) -> Option<NodeId>
{
    let mut best_skinned: Option<(NodeId, usize)> = None;
    let mut first = None;
    for (node, mesh) in scene.mesh_nodes()
    {
        if !filter.accepts(mesh.is_skinned())
        {
            continue;
        }
        first.get_or_insert(node);

        if mesh.is_skinned() && best_skinned.is_none_or(|(_, count)| mesh.control_point_count() > count)
        {
            best_skinned = Some((node, mesh.control_point_count()));
        }
    }

    best_skinned.map(|(n, _)| n).or(first)
}

#[derive(Debug, Default, Clone)]
pub struct ResolvedSkeleton
{
    pub bones: Vec<Bone>,
    /// Normalized global bind pose per bone, in reference space
    pub global_binds: Vec<DMat4>,
    pub table: BoneTable,
    pub reference: Option<NodeId>,
    /// Inverse of the reference mesh's global transform
    pub reference_inverse: DMat4,
}
impl ResolvedSkeleton
{
    #[inline] #[must_use]
    pub fn is_empty(&self) -> bool { self.bones.is_empty() }
}

fn inverse_or_identity(m: &DMat4, what: &'static str, node: &str, issues: &mut Issues) -> DMat4
{
    try_inverse(m).unwrap_or_else(||
    {
        issues.push(ResolveIssue::SingularMatrix { what, node: node.to_string() });
        DMat4::IDENTITY
    })
}

/// Compute bind local and offset matrices for `decls`, relative to the `reference` mesh
pub fn resolve_bind_poses(
    scene: &Scene,
    decls: &[BoneDecl],
    reference: Option<NodeId>,
    convention: &CoordinateConvention,
    issues: &mut Issues) -> ResolvedSkeleton
{
    let reference_inverse = match reference
    {
        Some(r) => inverse_or_identity(&scene.evaluate_global(r, Pose::Rest), "reference mesh", &scene.node(r).name, issues),
        None => DMat4::IDENTITY,
    };

    let global_binds: Vec<DMat4> = decls.iter().map(|decl| match decl.node
    {
        Some(node) => convention.normalize(&(reference_inverse * scene.evaluate_global(node, Pose::Rest))),
        None =>
        {
            issues.push(ResolveIssue::MissingBoneNode { bone: decl.name.clone() });
            DMat4::IDENTITY
        }
    }).collect();

    let bones = decls.iter().enumerate().map(|(i, decl)|
    {
        let global = &global_binds[i];
        let bind_local = match usize::try_from(decl.parent_index).ok().and_then(|p| global_binds.get(p))
        {
            Some(parent_global) => inverse_or_identity(parent_global, "parent bind", &decl.name, issues) * *global,
            None => *global,
        };
        let offset_matrix = inverse_or_identity(global, "offset", &decl.name, issues);

        Bone
        {
            name: decl.name.clone(),
            parent_index: decl.parent_index,
            bind_local: to_mat4(&bind_local),
            offset_matrix: to_mat4(&offset_matrix),
        }
    }).collect();

    ResolvedSkeleton
    {
        bones,
        global_binds,
        table: BoneTable::from_decls(decls),
        reference,
        reference_inverse,
    }
}

pub fn resolve_skeleton(scene: &Scene, filter: MeshFilter, convention: &CoordinateConvention, issues: &mut Issues) -> ResolvedSkeleton
{
    let decls = collect_bones(scene);
    let reference = select_reference_mesh(scene, filter);
    if let Some(r) = reference
    {
        log::debug!("Reference mesh {:?} for {} bones", scene.node(r).name, decls.len());
    }
    resolve_bind_poses(scene, &decls, reference, convention, issues)
}

#[cfg(test)]
mod tests
{
    use glam::{DQuat, DVec3, Mat4};
    use math_rigbake::Axis;
    use scene_rigbake::{LocalTransform, MeshData, NodeAttribute, Rotation, Skin};
    use super::*;

    fn root_arm_scene() -> (Scene, NodeId, NodeId)
    {
        let mut scene = Scene::default();
        let root = scene.add_node(Scene::ROOT, "Root", NodeAttribute::Skeleton, LocalTransform::default());
        let arm = scene.add_node(root, "Arm", NodeAttribute::Skeleton, LocalTransform::from_translation(DVec3::new(0.0, 1.0, 0.0)));
        (scene, root, arm)
    }

    fn mesh(points: usize, skinned: bool) -> NodeAttribute
    {
        NodeAttribute::Mesh(MeshData
        {
            control_points: vec![DVec3::ZERO; points],
            skins: if skinned { vec![Skin::default()] } else { vec![] },
            ..Default::default()
        })
    }

    #[test]
    fn root_arm_bind()
    {
        let (scene, _, _) = root_arm_scene();
        let mut issues = Issues::new("test");
        let resolved = resolve_skeleton(&scene, MeshFilter::All, &CoordinateConvention::default(), &mut issues);

        assert!(issues.is_empty());
        assert_eq!(resolved.bones.len(), 2);
        assert_eq!(resolved.bones[0].parent_index, -1);
        assert_eq!(resolved.bones[1].parent_index, 0);
        assert!(resolved.bones[1].bind_local.abs_diff_eq(Mat4::from_translation(glam::Vec3::new(0.0, 1.0, 0.0)), 1e-6));
        assert!(resolved.bones[1].offset_matrix.abs_diff_eq(Mat4::from_translation(glam::Vec3::new(0.0, -1.0, 0.0)), 1e-6));
    }

    #[test]
    fn bind_invariants_hold()
    {
        let mut scene = Scene::default();
        let hip = scene.add_node(Scene::ROOT, "Hip", NodeAttribute::Skeleton, LocalTransform
        {
            translation: DVec3::new(0.0, 90.0, 3.0),
            rotation: Rotation::Euler(DVec3::new(10.0, 20.0, 30.0)),
            scale: DVec3::ONE,
        });
        let knee = scene.add_node(hip, "Knee", NodeAttribute::Skeleton, LocalTransform
        {
            translation: DVec3::new(5.0, -40.0, 0.0),
            rotation: Rotation::Quat(DQuat::from_rotation_x(0.4)),
            scale: DVec3::ONE,
        });
        scene.add_node(knee, "Foot", NodeAttribute::Skeleton, LocalTransform::from_translation(DVec3::new(0.0, -45.0, 2.0)));
        scene.add_node(Scene::ROOT, "Body", mesh(10, true), LocalTransform::from_translation(DVec3::new(1.0, 0.0, 0.0)));

        let convention = CoordinateConvention { mirror: Some(Axis::X), length_scale: 0.01 };
        let mut issues = Issues::new("test");
        let resolved = resolve_skeleton(&scene, MeshFilter::All, &convention, &mut issues);
        assert!(issues.is_empty());

        for (i, bone) in resolved.bones.iter().enumerate()
        {
            let global = to_mat4(&resolved.global_binds[i]);
            assert!((bone.offset_matrix * global).abs_diff_eq(Mat4::IDENTITY, 1e-4));
            if let Ok(parent) = usize::try_from(bone.parent_index)
            {
                let parent_global = to_mat4(&resolved.global_binds[parent]);
                assert!((parent_global * bone.bind_local).abs_diff_eq(global, 1e-4));
            }
        }

        // hip translation is relative to the body mesh, scaled then mirrored
        let hip_t = resolved.global_binds[0].w_axis.truncate();
        assert!(hip_t.abs_diff_eq(DVec3::new(1.0 * 0.01, 0.9, 0.03), 1e-9));
    }

    #[test]
    fn parents_precede_children()
    {
        let (mut scene, root, arm) = root_arm_scene();
        let null = scene.add_node(arm, "Offset", NodeAttribute::Null, LocalTransform::default());
        scene.add_node(null, "Hand", NodeAttribute::Skeleton, LocalTransform::default());
        scene.add_node(root, "Leg", NodeAttribute::Skeleton, LocalTransform::default());

        let decls = collect_bones(&scene);
        let names: Vec<_> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "Arm", "Hand", "Leg"]);
        // Hand skips the null and parents to Arm
        assert_eq!(decls[2].parent_index, 1);
        assert_eq!(decls[3].parent_index, 0);
        for (i, d) in decls.iter().enumerate()
        {
            assert!(d.parent_index < i as i32);
        }
    }

    #[test]
    fn reference_mesh_choice()
    {
        let mut scene = Scene::default();
        let plain = scene.add_node(Scene::ROOT, "plain", mesh(100, false), LocalTransform::default());
        scene.add_node(Scene::ROOT, "small", mesh(5, true), LocalTransform::default());
        let big = scene.add_node(Scene::ROOT, "big", mesh(50, true), LocalTransform::default());
        let tie = scene.add_node(Scene::ROOT, "tie", mesh(50, true), LocalTransform::default());

        assert_eq!(select_reference_mesh(&scene, MeshFilter::All), Some(big));
        assert_ne!(select_reference_mesh(&scene, MeshFilter::All), Some(tie));
        assert_eq!(select_reference_mesh(&scene, MeshFilter::Static), Some(plain));

        let mut unskinned = Scene::default();
        let first = unskinned.add_node(Scene::ROOT, "a", mesh(3, false), LocalTransform::default());
        unskinned.add_node(Scene::ROOT, "b", mesh(30, false), LocalTransform::default());
        assert_eq!(select_reference_mesh(&unskinned, MeshFilter::All), Some(first));
        assert_eq!(select_reference_mesh(&Scene::default(), MeshFilter::All), None);
    }

    #[test]
    fn missing_node_is_identity()
    {
        let scene = Scene::default();
        let decls = vec![
            BoneDecl { name: "Ghost".to_string(), parent_index: -1, node: None },
        ];
        let mut issues = Issues::new("test");
        let resolved = resolve_bind_poses(&scene, &decls, None, &CoordinateConvention::default(), &mut issues);
        assert_eq!(resolved.bones[0].bind_local, Mat4::IDENTITY);
        assert_eq!(resolved.bones[0].offset_matrix, Mat4::IDENTITY);
        assert!(matches!(issues.iter().next(), Some(ResolveIssue::MissingBoneNode { .. })));
    }

    #[test]
    fn singular_bone_is_identity()
    {
        let mut scene = Scene::default();
        let flat = scene.add_node(Scene::ROOT, "Flat", NodeAttribute::Skeleton, LocalTransform
        {
            scale: DVec3::new(1.0, 0.0, 1.0),
            ..Default::default()
        });
        scene.add_node(flat, "Child", NodeAttribute::Skeleton, LocalTransform::default());

        let mut issues = Issues::new("test");
        let resolved = resolve_skeleton(&scene, MeshFilter::All, &CoordinateConvention::default(), &mut issues);
        assert_eq!(resolved.bones[0].offset_matrix, Mat4::IDENTITY);
        // parent bind inverse of the child plus both offsets
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| matches!(i, ResolveIssue::SingularMatrix { .. })));
    }

    #[test]
    fn duplicate_names_resolve_to_first()
    {
        let decls = vec![
            BoneDecl { name: "Bone".to_string(), parent_index: -1, node: None },
            BoneDecl { name: "Bone".to_string(), parent_index: 0, node: None },
        ];
        let table = BoneTable::from_decls(&decls);
        assert_eq!(table.get("Bone"), Some(0));
        assert_eq!(table.get("Other"), None);
    }
}
