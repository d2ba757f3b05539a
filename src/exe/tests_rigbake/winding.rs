use bake_rigbake::{bake_model, BakeConfig, Issues, Mirror};
use glam::DVec3;
use scene_rigbake::{LocalTransform, MeshData, NodeAttribute, Rotation, Scene};

fn triangle_scene(scale: DVec3) -> Scene
{
    let mut scene = Scene::default();
    let mesh = MeshData
    {
        control_points: vec![DVec3::ZERO, DVec3::X, DVec3::Y],
        triangles: vec![[0, 1, 2]],
        ..Default::default()
    };
    scene.add_node(Scene::ROOT, "Tri", NodeAttribute::Mesh(mesh), LocalTransform
    {
        translation: DVec3::ZERO,
        rotation: Rotation::Euler(DVec3::new(0.0, 30.0, 0.0)),
        scale,
    });
    scene
}

#[test]
fn reversal_follows_determinant_and_mirror()
{
    let cases =
    [
        (DVec3::ONE, Mirror::None, [0, 1, 2]),
        (DVec3::new(-1.0, 1.0, 1.0), Mirror::None, [0, 2, 1]),
        (DVec3::ONE, Mirror::X, [0, 2, 1]),
        (DVec3::new(1.0, 1.0, -2.0), Mirror::Y, [0, 1, 2]),
        (DVec3::new(-1.0, -1.0, 1.0), Mirror::Z, [0, 2, 1]),
    ];

    for (scale, mirror, expected) in cases
    {
        let scene = triangle_scene(scale);
        let config = BakeConfig { mirror, ..BakeConfig::default() };
        let model = bake_model(&scene, &config, &mut Issues::new("winding")).unwrap();
        assert_eq!(model.sub_meshes[0].indices, expected, "scale {scale} mirror {mirror:?}");
    }
}

#[test]
fn flipped_triangle_keeps_facing()
{
    // a negative scale reverses the order, so the baked face normal still points along the mirrored +Z
    let scene = triangle_scene(DVec3::new(-1.0, 1.0, 1.0));
    let config = BakeConfig { mirror: Mirror::None, ..BakeConfig::default() };
    let model = bake_model(&scene, &config, &mut Issues::new("facing")).unwrap();
    let sub_mesh = &model.sub_meshes[0];

    let corner = |i: u32| glam::Vec3::from_array(sub_mesh.vertices[i as usize].position);
    let [a, b, c] = [corner(sub_mesh.indices[0]), corner(sub_mesh.indices[1]), corner(sub_mesh.indices[2])];
    let face = (b - a).cross(c - a);

    let rotated_z = glam::Quat::from_rotation_y(30f32.to_radians()) * glam::Vec3::Z;
    assert!(face.dot(rotated_z) > 0.0, "{face}");
}
