use crate::bone;
use bake_rigbake::animation::extract_clip;
use bake_rigbake::{bake_model, BakeConfig, BakeMode, Issues};
use assets_rigbake::{AnimationFile, DecodeError, ModelFile, ModelFlags};
use glam::{DVec2, DVec3};
use scene_rigbake::{AnimCurve, AnimStack, Cluster, CurveKey, LocalTransform, MeshData, NodeAttribute, Scene, Skin, SourceMaterial};

fn rig() -> Scene
{
    let mut scene = Scene::default();
    let root = bone(&mut scene, Scene::ROOT, "Root", DVec3::ZERO);
    let arm = bone(&mut scene, root, "Arm", DVec3::new(0.0, 1.0, 0.0));

    let material = scene.add_material(SourceMaterial
    {
        name: "skin".to_string(),
        diffuse_texture: Some("textures/hero_d.png".to_string()),
        normal_texture: Some("textures\\hero_n.tga".to_string()),
    });
    let mesh = MeshData
    {
        control_points: vec![DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::new(1.0, 1.0, 0.0)],
        triangles: vec![[0, 1, 2], [2, 1, 3]],
        uvs: Some(vec![DVec2::ZERO, DVec2::X, DVec2::Y, DVec2::ONE, DVec2::Y, DVec2::X]),
        skins: vec![Skin
        {
            clusters: vec![
                Cluster { link: Some(root), control_points: vec![0, 1, 2], weights: vec![1.0, 0.5, 0.25] },
                Cluster { link: Some(arm), control_points: vec![1, 2, 3], weights: vec![0.5, 0.75, 1.0] },
            ],
        }],
        ..Default::default()
    };
    let body = scene.add_node(Scene::ROOT, "Body", NodeAttribute::Mesh(mesh), LocalTransform::default());
    scene.node_mut(body).materials.push(material);

    let mut stack = AnimStack::new("wave", 0.0, 1.0);
    stack.curves_mut(arm).translation[0] = Some(AnimCurve::new(vec![CurveKey::linear(0.25, 0.0), CurveKey::linear(1.0, 2.0)]));
    scene.add_anim_stack(stack);
    scene
}

#[test]
fn model_survives_decode()
{
    let scene = rig();
    for generate_tangents in [true, false]
    {
        let config = BakeConfig { generate_tangents, ..BakeConfig::default() };
        let model = bake_model(&scene, &config, &mut Issues::new("rig")).unwrap();
        assert_eq!(model.flags, ModelFlags::HAS_SKELETON | ModelFlags::SKINNED);
        assert_eq!(model.materials[0].diffuse_texture_name, "hero_d");

        let mut bytes = Vec::new();
        model.encode(&mut bytes).unwrap();
        assert_eq!(&bytes[0..4], b"MBIN");
        assert_eq!(bytes[4..8], (if generate_tangents { 2u32 } else { 1u32 }).to_le_bytes());

        let decoded = ModelFile::decode(&mut bytes.as_slice()).unwrap();
        if generate_tangents
        {
            assert_eq!(decoded, model);
        }
        else
        {
            // version 1 stores no tangents or normal maps
            assert_eq!(decoded.bones, model.bones);
            assert_eq!(decoded.sub_meshes[0].indices, model.sub_meshes[0].indices);
            assert!(decoded.materials[0].normal_texture_name.is_empty());
        }

        let mut again = Vec::new();
        decoded.encode(&mut again).unwrap();
        assert_eq!(again, bytes);
    }
}

#[test]
fn clip_survives_decode()
{
    let scene = rig();
    let config = BakeConfig { length_scale: Some(1.0), ..BakeConfig::preset(BakeMode::Animation) };
    let clip = extract_clip(&scene, &config, "rig").unwrap().unwrap();
    assert_eq!(clip.tracks.len(), 1);

    let mut bytes = Vec::new();
    clip.encode(&mut bytes).unwrap();
    assert_eq!(&bytes[0..4], b"ABIN");

    let decoded = AnimationFile::decode(&mut bytes.as_slice()).unwrap();
    assert_eq!(decoded, clip);

    let mut again = Vec::new();
    decoded.encode(&mut again).unwrap();
    assert_eq!(again, bytes);
}

#[test]
fn containers_reject_each_other()
{
    let scene = rig();
    let model = bake_model(&scene, &BakeConfig::default(), &mut Issues::new("rig")).unwrap();
    let mut bytes = Vec::new();
    model.encode(&mut bytes).unwrap();

    assert!(matches!(AnimationFile::decode(&mut bytes.as_slice()), Err(DecodeError::BadMagic { .. })));
    assert!(matches!(ModelFile::decode(&mut &bytes[..bytes.len() - 1]), Err(DecodeError::IOError(_))));
}
