use crate::geometry::{bake_sub_mesh, mesh_space};
use crate::material::collect_materials;
use crate::skeleton::{resolve_skeleton, ResolvedSkeleton};
use crate::skin::{resolve_mesh_skinning, MeshSkinning};
use crate::{animation, tangents, BakeConfig, BakeError, BakeMode, Issues, ResolveIssue};
use assets_rigbake::{AnimationFile, EncodeError, ModelFile, ModelFlags};
use scene_rigbake::{import_scene, Scene};
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Re-express the scene in the configured axis system. Done once, before anything is resolved
pub fn prepare_scene(scene: &mut Scene, config: &BakeConfig)
{
    if let Some(target) = config.axis_system.axis_system()
    {
        log::debug!("Converting axes {:?} -> {:?}", scene.axis_system(), target);
        scene.convert_axis_system(target);
    }
}

pub fn bake_model(scene: &Scene, config: &BakeConfig, issues: &mut Issues) -> Result<ModelFile, BakeError>
{
    let convention = config.convention(scene);

    let skeleton = match config.include_skeleton
    {
        true => resolve_skeleton(scene, config.mesh_filter, &convention, issues),
        false => ResolvedSkeleton::default(),
    };
    let reference_inverse = (!skeleton.is_empty()).then_some(&skeleton.reference_inverse);
    let materials = collect_materials(scene, issues);

    let mut flags = ModelFlags::NONE;
    if !skeleton.is_empty()
    {
        flags |= ModelFlags::HAS_SKELETON;
    }
    if convention.is_mirrored()
    {
        flags |= ModelFlags::MIRRORED;
    }

    let mut sub_meshes = Vec::new();
    for (node, mesh) in scene.mesh_nodes()
    {
        if !config.mesh_filter.accepts(mesh.is_skinned())
        {
            continue;
        }

        let skinning = match config.include_skin
        {
            true => resolve_mesh_skinning(scene, node, mesh, &skeleton, config.default_bone, issues),
            false => MeshSkinning::Unbound,
        };
        if skinning != MeshSkinning::Unbound
        {
            flags |= ModelFlags::SKINNED;
        }

        let legacy_flip = config.legacy_static_flip && !mesh.is_skinned();
        let space = mesh_space(scene, node, reference_inverse, legacy_flip);
        let material_index = materials.submesh_material(scene, node);
        let Some(mut sub_mesh) = bake_sub_mesh(scene, node, mesh, &space, &convention, &skinning, material_index, issues) else { continue };

        if config.generate_tangents && !tangents::generate_tangents(&mut sub_mesh)
        {
            issues.push(ResolveIssue::TangentGenerationFailed { mesh: sub_mesh.mesh_name.clone() });
        }
        sub_meshes.push(sub_mesh);
    }

    if sub_meshes.is_empty()
    {
        return Err(BakeError::NoGeometry);
    }

    Ok(ModelFile
    {
        version: config.format_version(),
        flags,
        bones: skeleton.bones,
        materials: materials.into_materials(),
        sub_meshes,
    })
}

/// Everything one source file can produce
#[derive(Debug, Clone, PartialEq)]
pub enum BakedAsset
{
    Model(ModelFile),
    Animation(AnimationFile),
}
impl BakedAsset
{
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError>
    {
        let mut bytes = Vec::new();
        match self
        {
            BakedAsset::Model(model) => model.encode(&mut bytes)?,
            BakedAsset::Animation(clip) => clip.encode(&mut bytes)?,
        }
        Ok(bytes)
    }
}
impl Display for BakedAsset
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            BakedAsset::Model(model) => write!(f,
                "model v{}: {} bones, {} materials, {} sub-meshes, {} vertices",
                model.version,
                model.bones.len(),
                model.materials.len(),
                model.sub_meshes.len(),
                model.vertex_count()),
            BakedAsset::Animation(clip) => write!(f,
                "clip {:?}: {} tracks, {} keys, {}",
                clip.clip_name,
                clip.tracks.len(),
                clip.key_count(),
                clip.duration),
        }
    }
}

/// Bake an already imported scene. `Ok(None)` when an animation has nothing to write
pub fn bake_scene(mut scene: Scene, mode: BakeMode, config: &BakeConfig, name: &str, issues: &mut Issues) -> Result<Option<BakedAsset>, BakeError>
{
    prepare_scene(&mut scene, config);
    match mode.is_animation()
    {
        true => Ok(animation::extract_clip(&scene, config, name)?.map(BakedAsset::Animation)),
        false => Ok(Some(BakedAsset::Model(bake_model(&scene, config, issues)?))),
    }
}

#[derive(Debug)]
pub struct BakeOutput
{
    pub asset: Option<BakedAsset>,
    pub issues: Issues,
}

/// Import and bake one source file
pub fn bake_file(path: &Path, mode: BakeMode, config: &BakeConfig) -> Result<BakeOutput, BakeError>
{
    let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let mut issues = Issues::new(path.display().to_string());

    let scene = import_scene(path)?;
    let asset = bake_scene(scene, mode, config, &name, &mut issues)?;
    Ok(BakeOutput { asset, issues })
}

#[cfg(test)]
mod tests
{
    use glam::DVec3;
    use scene_rigbake::{Cluster, LocalTransform, MeshData, NodeAttribute, Skin};
    use crate::MeshFilter;
    use super::*;

    fn rigged_scene() -> Scene
    {
        let mut scene = Scene::default();
        let root = scene.add_node(Scene::ROOT, "Root", NodeAttribute::Skeleton, LocalTransform::default());
        let arm = scene.add_node(root, "Arm", NodeAttribute::Skeleton, LocalTransform::from_translation(DVec3::X));
        let skinned = MeshData
        {
            control_points: vec![DVec3::ZERO, DVec3::X, DVec3::Y],
            triangles: vec![[0, 1, 2]],
            skins: vec![Skin { clusters: vec![
                Cluster { link: Some(root), control_points: vec![0, 1, 2], weights: vec![1.0, 0.5, 1.0] },
                Cluster { link: Some(arm), control_points: vec![1], weights: vec![0.5] },
            ]}],
            ..Default::default()
        };
        scene.add_node(Scene::ROOT, "Body", NodeAttribute::Mesh(skinned), LocalTransform::default());
        let prop = MeshData
        {
            control_points: vec![DVec3::ZERO, DVec3::Z, DVec3::Y],
            triangles: vec![[0, 1, 2]],
            ..Default::default()
        };
        scene.add_node(arm, "Sword", NodeAttribute::Mesh(prop), LocalTransform::default());
        scene
    }

    #[test]
    fn model_preset()
    {
        let scene = rigged_scene();
        let mut issues = Issues::new("test");
        let model = bake_model(&scene, &BakeConfig::default(), &mut issues).unwrap();

        assert!(issues.is_empty());
        assert_eq!(model.version, ModelFile::VERSION_BASIC);
        assert_eq!(model.flags, ModelFlags::HAS_SKELETON | ModelFlags::SKINNED);
        assert_eq!(model.bones.len(), 2);
        // depth first: the sword under the arm comes before the body
        assert_eq!(model.sub_meshes.iter().map(|s| s.mesh_name.as_str()).collect::<Vec<_>>(), vec!["Sword", "Body"]);
        assert_eq!(model.sub_meshes[1].vertices[1].bone_indices, [0, 1, 0, 0]);
        // rigid attachment to the parent bone
        assert_eq!(model.sub_meshes[0].vertices[0].bone_indices, [1, 0, 0, 0]);
        assert_eq!(model.sub_meshes[0].vertices[0].bone_weights, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn skinned_preset_mirrors()
    {
        let scene = rigged_scene();
        let mut issues = Issues::new("test");
        let config = BakeConfig { generate_tangents: true, ..BakeConfig::preset(BakeMode::Skinned) };
        let model = bake_model(&scene, &config, &mut issues).unwrap();

        assert_eq!(model.version, ModelFile::VERSION_TANGENTS);
        assert!(model.flags.contains(ModelFlags::MIRRORED));
        assert_eq!(model.sub_meshes.len(), 1);
        assert_eq!(model.sub_meshes[0].mesh_name, "Body");
        assert_eq!(model.sub_meshes[0].indices, vec![0, 2, 1]);
        assert_eq!(model.sub_meshes[0].vertices[1].position, [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn static_preset_world_space()
    {
        let scene = rigged_scene();
        let mut issues = Issues::new("test");
        let model = bake_model(&scene, &BakeConfig::preset(BakeMode::Static), &mut issues).unwrap();

        assert_eq!(model.flags, ModelFlags::NONE);
        assert!(model.bones.is_empty());
        assert_eq!(model.sub_meshes.len(), 1);
        // the sword sits under the arm at x = 1
        assert_eq!(model.sub_meshes[0].vertices[1].position, [1.0, 0.0, 1.0]);
        assert_eq!(model.sub_meshes[0].vertices[1].bone_weights, [0.0; 4]);
    }

    #[test]
    fn nothing_to_bake()
    {
        let mut issues = Issues::new("test");
        let config = BakeConfig { mesh_filter: MeshFilter::Skinned, ..BakeConfig::default() };
        let result = bake_model(&Scene::default(), &config, &mut issues);
        assert!(matches!(result, Err(BakeError::NoGeometry)));
    }

    #[test]
    fn encodes_and_summarizes()
    {
        let mut issues = Issues::new("test");
        let asset = bake_scene(rigged_scene(), BakeMode::Model, &BakeConfig::default(), "rig", &mut issues).unwrap().unwrap();
        let bytes = asset.encode().unwrap();
        assert_eq!(&bytes[0..4], b"MBIN");
        let mut reencoded = Vec::new();
        ModelFile::decode(&mut bytes.as_slice()).unwrap().encode(&mut reencoded).unwrap();
        assert_eq!(reencoded, bytes);
        assert!(asset.to_string().starts_with("model v1: 2 bones"));

        let result = bake_scene(rigged_scene(), BakeMode::Animation, &BakeConfig::default(), "rig", &mut issues);
        assert!(matches!(result, Err(BakeError::NoAnimationStack)));
    }
}
