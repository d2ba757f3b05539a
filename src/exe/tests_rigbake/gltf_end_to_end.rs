use approx::assert_relative_eq;
use assets_rigbake::{AnimationFile, ModelFile, ModelFlags};
use bake_rigbake::{bake_file, BakeConfig, BakeMode, BakedAsset};
use glam::Vec3;
use std::fs;
use std::path::PathBuf;

const TRI_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "scene": 0,
    "scenes": [ { "nodes": [ 0, 1 ] } ],
    "nodes": [
        { "name": "Hip", "translation": [ 0.0, 1.0, 0.0 ] },
        { "name": "Tri", "mesh": 0, "skin": 0 }
    ],
    "skins": [ { "joints": [ 0 ] } ],
    "meshes": [ {
        "name": "Tri",
        "primitives": [ {
            "attributes": { "POSITION": 0, "JOINTS_0": 2, "WEIGHTS_0": 3 },
            "indices": 1
        } ]
    } ],
    "animations": [ {
        "name": "Run",
        "channels": [ { "sampler": 0, "target": { "node": 0, "path": "translation" } } ],
        "samplers": [ { "input": 4, "output": 5, "interpolation": "LINEAR" } ]
    } ],
    "buffers": [ { "uri": "tri.bin", "byteLength": 136 } ],
    "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
        { "buffer": 0, "byteOffset": 36, "byteLength": 6 },
        { "buffer": 0, "byteOffset": 44, "byteLength": 12 },
        { "buffer": 0, "byteOffset": 56, "byteLength": 48 },
        { "buffer": 0, "byteOffset": 104, "byteLength": 8 },
        { "buffer": 0, "byteOffset": 112, "byteLength": 24 }
    ],
    "accessors": [
        { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [ 0.0, 0.0, 0.0 ], "max": [ 1.0, 1.0, 0.0 ] },
        { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
        { "bufferView": 2, "componentType": 5121, "count": 3, "type": "VEC4" },
        { "bufferView": 3, "componentType": 5126, "count": 3, "type": "VEC4" },
        { "bufferView": 4, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [ 0.0 ], "max": [ 1.0 ] },
        { "bufferView": 5, "componentType": 5126, "count": 2, "type": "VEC3" }
    ]
}"#;

fn tri_bin() -> Vec<u8>
{
    let mut bytes = Vec::new();
    let f32s = |bytes: &mut Vec<u8>, values: &[f32]| bytes.extend(values.iter().flat_map(|v| v.to_le_bytes()));

    f32s(&mut bytes, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    bytes.extend([0u16, 1, 2].iter().flat_map(|i| i.to_le_bytes()));
    bytes.resize(44, 0);
    bytes.extend([0u8; 12]);
    f32s(&mut bytes, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    f32s(&mut bytes, &[0.0, 1.0]);
    f32s(&mut bytes, &[0.0, 1.0, 0.0, 0.0, 2.0, 0.0]);
    assert_eq!(bytes.len(), 136);
    bytes
}

struct TempDir(PathBuf);
impl TempDir
{
    fn new(tag: &str) -> Self
    {
        let dir = std::env::temp_dir().join(format!("rigbake_{tag}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }
}
impl Drop for TempDir
{
    fn drop(&mut self) { let _ = fs::remove_dir_all(&self.0); }
}

fn write_tri(dir: &TempDir, document: &str) -> PathBuf
{
    fs::write(dir.0.join("tri.bin"), tri_bin()).unwrap();
    let path = dir.0.join("tri.gltf");
    fs::write(&path, document).unwrap();
    path
}

#[test]
fn model_from_gltf()
{
    let dir = TempDir::new("model");
    let path = write_tri(&dir, TRI_GLTF);

    let output = bake_file(&path, BakeMode::Model, &BakeConfig::preset(BakeMode::Model)).unwrap();
    let Some(BakedAsset::Model(model)) = output.asset else { panic!("expected a model") };

    assert!(model.flags.contains(ModelFlags::HAS_SKELETON | ModelFlags::SKINNED));
    assert_eq!(model.bones.len(), 1);
    assert_eq!(model.bones[0].name, "Hip");
    assert_eq!(model.bones[0].parent_index, -1);
    assert!(model.bones[0].bind_local.w_axis.truncate().abs_diff_eq(Vec3::Y, 1e-5));

    let sub_mesh = &model.sub_meshes[0];
    assert_eq!(sub_mesh.mesh_name, "Tri");
    assert_eq!(sub_mesh.vertices.len(), 3);
    assert_eq!(sub_mesh.indices.len(), 3);
    for vertex in &sub_mesh.vertices
    {
        assert_eq!(vertex.bone_indices, [0; 4]);
        assert_eq!(vertex.bone_weights, [1.0, 0.0, 0.0, 0.0]);
    }

    let bytes = BakedAsset::Model(model.clone()).encode().unwrap();
    assert_eq!(ModelFile::decode(&mut bytes.as_slice()).unwrap().bones, model.bones);
}

#[test]
fn clip_from_gltf()
{
    let dir = TempDir::new("clip");
    let path = write_tri(&dir, TRI_GLTF);

    let output = bake_file(&path, BakeMode::Animation, &BakeConfig::preset(BakeMode::Animation)).unwrap();
    let Some(BakedAsset::Animation(clip)) = output.asset else { panic!("expected a clip") };

    assert_eq!(clip.clip_name, "Run");
    assert_eq!(clip.tracks.len(), 1);
    assert_eq!(clip.tracks[0].bone_name, "Hip");
    // the rest pose at 0 is trimmed, leaving the final pose
    let keys = &clip.tracks[0].keys;
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].time.0, 0.0);
    assert_relative_eq!(keys[0].translation.y, 2.0, epsilon = 1e-5);
    assert_eq!(clip.duration.0, 0.0);

    let bytes = BakedAsset::Animation(clip.clone()).encode().unwrap();
    assert_eq!(AnimationFile::decode(&mut bytes.as_slice()).unwrap(), clip);
}

#[test]
fn joint_with_mesh_stays_a_bone()
{
    let dir = TempDir::new("joint_mesh");
    let document = TRI_GLTF
        .replace(r#"{ "name": "Hip", "translation": [ 0.0, 1.0, 0.0 ] },"#, r#"{ "name": "Hip", "translation": [ 0.0, 1.0, 0.0 ], "mesh": 0, "skin": 0 },"#);
    assert_ne!(document, TRI_GLTF);
    let path = write_tri(&dir, &document);

    let output = bake_file(&path, BakeMode::Model, &BakeConfig::preset(BakeMode::Model)).unwrap();
    let Some(BakedAsset::Model(model)) = output.asset else { panic!("expected a model") };

    assert_eq!(model.bones.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(), vec!["Hip"]);
    assert!(model.bones[0].bind_local.w_axis.truncate().abs_diff_eq(Vec3::Y, 1e-5));
    let names: Vec<_> = model.sub_meshes.iter().map(|s| s.mesh_name.as_str()).collect();
    assert!(names.contains(&"Hip_mesh"), "{names:?}");
    assert!(model.sub_meshes.iter().flat_map(|s| &s.vertices).all(|v| v.bone_indices == [0; 4]));
}

#[test]
fn missing_buffer_is_an_import_error()
{
    let dir = TempDir::new("missing");
    let path = dir.0.join("tri.gltf");
    fs::write(&path, TRI_GLTF).unwrap();

    assert!(bake_file(&path, BakeMode::Model, &BakeConfig::default()).is_err());
}
