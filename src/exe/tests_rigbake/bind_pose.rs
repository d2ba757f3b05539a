use crate::bone;
use bake_rigbake::skeleton::resolve_skeleton;
use bake_rigbake::{Issues, MeshFilter};
use glam::{DVec3, Mat4, Vec3};
use math_rigbake::{Axis, CoordinateConvention, to_mat4};
use scene_rigbake::{LocalTransform, NodeAttribute, Rotation, Scene};

#[test]
fn root_and_arm()
{
    let mut scene = Scene::default();
    let root = bone(&mut scene, Scene::ROOT, "Root", DVec3::ZERO);
    bone(&mut scene, root, "Arm", DVec3::X);

    let mut issues = Issues::new("root_and_arm");
    let resolved = resolve_skeleton(&scene, MeshFilter::All, &CoordinateConvention::default(), &mut issues);
    let [root_bone, arm_bone] = resolved.bones.as_slice() else { panic!("expected two bones") };

    assert_eq!(root_bone.bind_local, Mat4::IDENTITY);
    assert!(root_bone.offset_matrix.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    assert!(arm_bone.bind_local.w_axis.truncate().abs_diff_eq(Vec3::X, 1e-6));
    assert!(arm_bone.offset_matrix.w_axis.truncate().abs_diff_eq(-Vec3::X, 1e-6));
}

#[test]
fn root_and_arm_mirrored_and_scaled()
{
    let mut scene = Scene::default();
    let root = bone(&mut scene, Scene::ROOT, "Root", DVec3::ZERO);
    bone(&mut scene, root, "Arm", DVec3::new(100.0, 0.0, 0.0));

    let convention = CoordinateConvention { mirror: Some(Axis::X), length_scale: 0.01 };
    let mut issues = Issues::new("mirrored");
    let resolved = resolve_skeleton(&scene, MeshFilter::All, &convention, &mut issues);

    assert_eq!(resolved.bones[0].bind_local, Mat4::IDENTITY);
    assert!(resolved.bones[1].bind_local.w_axis.truncate().abs_diff_eq(-Vec3::X, 1e-6));
}

#[test]
fn deep_hierarchy_invariants()
{
    let mut scene = Scene::default();
    let mut parent = Scene::ROOT;
    for i in 0..6
    {
        let rotation = Rotation::Euler(DVec3::new(7.0 * i as f64, -13.0, 29.0 + i as f64));
        parent = scene.add_node(parent, format!("Bone{i}"), NodeAttribute::Skeleton, LocalTransform
        {
            translation: DVec3::new(1.0, 2.0 * i as f64, -0.5),
            rotation,
            scale: DVec3::ONE,
        });
        // interleaved nulls are transparent
        parent = scene.add_node(parent, format!("Null{i}"), NodeAttribute::Null, LocalTransform::from_translation(DVec3::Z));
    }

    for convention in [
        CoordinateConvention::default(),
        CoordinateConvention { mirror: Some(Axis::Z), length_scale: 0.1 },
    ]
    {
        let mut issues = Issues::new("deep");
        let resolved = resolve_skeleton(&scene, MeshFilter::All, &convention, &mut issues);
        assert!(issues.is_empty());
        assert_eq!(resolved.bones.len(), 6);

        for (i, b) in resolved.bones.iter().enumerate()
        {
            assert_eq!(b.parent_index, i as i32 - 1);
            let global = to_mat4(&resolved.global_binds[i]);
            assert!((b.offset_matrix * global).abs_diff_eq(Mat4::IDENTITY, 1e-4));
            if let Ok(p) = usize::try_from(b.parent_index)
            {
                let parent_global = to_mat4(&resolved.global_binds[p]);
                assert!((parent_global * b.bind_local).abs_diff_eq(global, 1e-4));
            }
        }
    }
}
