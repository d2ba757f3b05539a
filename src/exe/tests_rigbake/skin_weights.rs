use crate::bone;
use approx::assert_relative_eq;
use bake_rigbake::{bake_model, BakeConfig, Issues};
use glam::DVec3;
use scene_rigbake::{Cluster, LocalTransform, MeshData, NodeAttribute, NodeId, Scene, Skin};

fn weighted_scene(weights: &[&[f64]]) -> (Scene, Vec<NodeId>)
{
    let mut scene = Scene::default();
    let root = bone(&mut scene, Scene::ROOT, "Root", DVec3::ZERO);
    let bone_count = weights.iter().map(|w| w.len()).max().unwrap_or(0);
    let bones: Vec<_> = (0..bone_count).map(|i| bone(&mut scene, root, &format!("B{i}"), DVec3::new(i as f64, 0.0, 0.0))).collect();

    let clusters = bones.iter().enumerate().map(|(b, node)|
    {
        let (control_points, per_point): (Vec<u32>, Vec<f64>) = weights.iter().enumerate()
            .filter_map(|(cp, w)| w.get(b).map(|weight| (cp as u32, *weight)))
            .unzip();
        Cluster { link: Some(*node), control_points, weights: per_point }
    }).collect();

    let control_points = weights.len();
    let mesh = MeshData
    {
        control_points: (0..control_points).map(|i| DVec3::new(i as f64, (i % 2) as f64, 0.0)).collect(),
        triangles: (0..control_points as u32).collect::<Vec<_>>().chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
        skins: vec![Skin { clusters }],
        ..Default::default()
    };
    scene.add_node(Scene::ROOT, "Skin", NodeAttribute::Mesh(mesh), LocalTransform::default());
    (scene, bones)
}

#[test]
fn five_influences()
{
    let (scene, _) = weighted_scene(&[&[0.5, 0.3, 0.1, 0.05, 0.05], &[1.0], &[0.0, 1.0]]);
    let model = bake_model(&scene, &BakeConfig::default(), &mut Issues::new("five")).unwrap();

    // bone 0 is Root, B0..B4 are 1..5
    let vertex = &model.sub_meshes[0].vertices[0];
    assert_eq!(vertex.bone_indices, [1, 2, 3, 4]);
    let total = 0.95;
    assert_relative_eq!(vertex.bone_weights[0], (0.5 / total) as f32, epsilon = 1e-6);
    assert_relative_eq!(vertex.bone_weights[1], (0.3 / total) as f32, epsilon = 1e-6);
    assert_relative_eq!(vertex.bone_weights[2], (0.1 / total) as f32, epsilon = 1e-6);
    assert_relative_eq!(vertex.bone_weights[3], (0.05 / total) as f32, epsilon = 1e-6);
}

#[test]
fn weight_properties_hold_for_every_vertex()
{
    let weights: Vec<Vec<f64>> = (0..30).map(|cp| (0..7).map(|b| ((cp * 7 + b * 3) % 11) as f64 / 10.0 - 0.2).collect()).collect();
    let refs: Vec<&[f64]> = weights.iter().map(Vec::as_slice).collect();
    let (scene, _) = weighted_scene(&refs);

    let mut issues = Issues::new("properties");
    let model = bake_model(&scene, &BakeConfig::default(), &mut issues).unwrap();
    assert_eq!(model.sub_meshes[0].vertices.len(), 30);

    for vertex in &model.sub_meshes[0].vertices
    {
        let sum: f32 = vertex.bone_weights.iter().sum();
        assert!(sum == 0.0 || (0.999..=1.001).contains(&sum), "sum {sum}");
        assert!(vertex.bone_weights.iter().filter(|w| **w != 0.0).count() <= 4);
        assert!(vertex.bone_weights.windows(2).all(|w| w[0] >= w[1]), "{:?}", vertex.bone_weights);
        assert!(vertex.bone_weights.iter().all(|w| *w >= 0.0));
    }
}

#[test]
fn skin_disabled_is_all_zero()
{
    let (scene, _) = weighted_scene(&[&[1.0], &[1.0], &[1.0]]);
    let config = BakeConfig { include_skin: false, ..BakeConfig::default() };
    let model = bake_model(&scene, &config, &mut Issues::new("no_skin")).unwrap();
    assert!(model.sub_meshes[0].vertices.iter().all(|v| v.bone_weights == [0.0; 4] && v.bone_indices == [0; 4]));
    assert!(!model.flags.contains(assets_rigbake::ModelFlags::SKINNED));
}
