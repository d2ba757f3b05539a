use crate::{AnimCurve, AnimStack, AxisSystem, Cluster, CurveKey, ImportError, Interpolation, LocalTransform, MaterialId, MeshData, NodeAttribute, NodeId, QuatCurve, QuatKey, RotationCurves, Scene, Skin, SourceMaterial};
use glam::{DQuat, DVec2, DVec3, DVec4};
use gltf::animation::util::ReadOutputs;
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub fn import_gltf_file(path: &Path) -> Result<Scene, ImportError>
{
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)?;
    import_gltf(&document, &buffers)
}

// skin joints are stored as glTF node indices until every node has been created
struct PendingSkin
{
    node: NodeId,
    joints: Vec<usize>,
}

pub fn import_gltf(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<Scene, ImportError>
{
    let in_scene = document.default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(ImportError::NoScene)?;

    let mut scene = Scene::new(AxisSystem::GLTF, 1.0);

    let joints: HashSet<usize> = document.skins()
        .flat_map(|s| s.joints().map(|j| j.index()).collect::<Vec<_>>())
        .collect();

    let mut node_map: Vec<Option<NodeId>> = vec![None; document.nodes().len()];
    let mut material_map = HashMap::new();
    let mut pending_skins = Vec::new();

    let mut worklist: Vec<(gltf::Node, NodeId)> = in_scene.nodes().map(|n| (n, Scene::ROOT)).collect();
    worklist.reverse();
    while let Some((in_node, parent)) = worklist.pop()
    {
        let name = in_node.name().map(str::to_string).unwrap_or_else(|| format!("node_{}", in_node.index()));
        let (t, r, s) = in_node.transform().decomposed();
        let local = LocalTransform
        {
            translation: DVec3::new(t[0] as f64, t[1] as f64, t[2] as f64),
            rotation: crate::Rotation::Quat(DQuat::from_xyzw(r[0] as f64, r[1] as f64, r[2] as f64, r[3] as f64).normalize()),
            scale: DVec3::new(s[0] as f64, s[1] as f64, s[2] as f64),
        };

        let mut slots = Vec::new();
        let mesh = match in_node.mesh()
        {
            Some(in_mesh) =>
            {
                for prim in in_mesh.primitives()
                {
                    let slot = material_slot(&mut scene, &mut material_map, prim.material());
                    if !slots.contains(&slot)
                    {
                        slots.push(slot);
                    }
                }
                Some(read_mesh(&in_mesh, in_node.skin().as_ref(), buffers)?)
            }
            None => None,
        };

        let is_joint = joints.contains(&in_node.index());
        let (id, mesh_id) = match (mesh, is_joint)
        {
            // joints stay bones; their geometry moves to an untransformed child
            (Some(mesh), true) =>
            {
                let id = scene.add_node(parent, name.clone(), NodeAttribute::Skeleton, local);
                let mesh_id = scene.add_node(id, format!("{name}_mesh"), NodeAttribute::Mesh(mesh), LocalTransform::default());
                (id, Some(mesh_id))
            }
            (Some(mesh), false) =>
            {
                let id = scene.add_node(parent, name, NodeAttribute::Mesh(mesh), local);
                (id, Some(id))
            }
            (None, true) => (scene.add_node(parent, name, NodeAttribute::Skeleton, local), None),
            (None, false) => (scene.add_node(parent, name, NodeAttribute::Null, local), None),
        };
        node_map[in_node.index()] = Some(id);

        if let Some(mesh_id) = mesh_id
        {
            scene.node_mut(mesh_id).materials = slots;
            if let Some(skin) = in_node.skin()
            {
                pending_skins.push(PendingSkin { node: mesh_id, joints: skin.joints().map(|j| j.index()).collect() });
            }
        }

        let mut children: Vec<_> = in_node.children().map(|c| (c, id)).collect();
        children.reverse();
        worklist.extend(children);
    }

    for pending in pending_skins
    {
        let crate::SceneNode { attribute: NodeAttribute::Mesh(mesh), .. } = scene.node_mut(pending.node) else { continue };
        for skin in &mut mesh.skins
        {
            for (cluster, joint) in skin.clusters.iter_mut().zip(&pending.joints)
            {
                cluster.link = node_map.get(*joint).copied().flatten();
            }
        }
    }

    for in_anim in document.animations()
    {
        let stack = read_animation(&in_anim, &node_map, buffers);
        scene.add_anim_stack(stack);
    }
    if !scene.anim_stacks().is_empty()
    {
        scene.set_current_stack(Some(0));
    }

    log::debug!("Imported glTF scene with {} nodes, {} animations", scene.node_count(), scene.anim_stacks().len());
    Ok(scene)
}

fn material_slot(scene: &mut Scene, material_map: &mut HashMap<Option<usize>, MaterialId>, in_material: gltf::Material) -> MaterialId
{
    *material_map.entry(in_material.index()).or_insert_with(||
    {
        let name = match (in_material.name(), in_material.index())
        {
            (Some(name), _) => name.to_string(),
            (None, Some(index)) => format!("material_{index}"),
            (None, None) => "default".to_string(),
        };

        scene.add_material(SourceMaterial
        {
            name,
            diffuse_texture: in_material.pbr_metallic_roughness().base_color_texture().and_then(|t| texture_path(t.texture())),
            normal_texture: in_material.normal_texture().and_then(|t| texture_path(t.texture())),
        })
    })
}

fn texture_path(texture: gltf::Texture) -> Option<String>
{
    let image = texture.source();
    match image.source()
    {
        gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
        gltf::image::Source::View { .. } => image.name().map(str::to_string),
    }
}

fn read_mesh(in_mesh: &gltf::Mesh, in_skin: Option<&gltf::Skin>, buffers: &[gltf::buffer::Data]) -> Result<MeshData, ImportError>
{
    let mesh_name = || in_mesh.name().unwrap_or("<unnamed>").to_string();

    let mut mesh = MeshData::default();
    let mut uvs = Vec::new();
    let mut any_uvs = false;
    let mut clusters: Vec<Cluster> = in_skin
        .map(|s| s.joints().map(|_| Cluster::default()).collect())
        .unwrap_or_default();

    for prim in in_mesh.primitives()
    {
        if prim.mode() != gltf::mesh::Mode::Triangles
        {
            log::warn!("Skipping non-triangle primitive {} ({:?}) of mesh {}", prim.index(), prim.mode(), mesh_name());
            continue;
        }

        let reader = prim.reader(|b| Some(&buffers[b.index()]));
        let positions: Vec<DVec3> = reader.read_positions()
            .ok_or_else(|| ImportError::MissingAttribute { mesh: mesh_name(), attribute: "POSITION" })?
            .map(|p| DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64))
            .collect();
        let normals: Option<Vec<DVec3>> = reader.read_normals()
            .map(|it| it.map(|n| DVec3::new(n[0] as f64, n[1] as f64, n[2] as f64)).collect());
        // glTF UVs start top-left
        let tex_coords: Option<Vec<DVec2>> = reader.read_tex_coords(0)
            .map(|it| it.into_f32().map(|uv| DVec2::new(uv[0] as f64, 1.0 - uv[1] as f64)).collect());
        let indices: Vec<u32> = match reader.read_indices()
        {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let base = mesh.control_points.len() as u32;

        if !clusters.is_empty()
        {
            if let (Some(in_joints), Some(in_weights)) = (reader.read_joints(0), reader.read_weights(0))
            {
                for (vertex, (joint_set, weight_set)) in in_joints.into_u16().zip(in_weights.into_f32()).enumerate()
                {
                    for (joint, weight) in joint_set.into_iter().zip(weight_set)
                    {
                        let Some(cluster) = clusters.get_mut(joint as usize) else { continue };
                        cluster.control_points.push(base + vertex as u32);
                        cluster.weights.push(weight as f64);
                    }
                }
            }
        }

        any_uvs |= tex_coords.is_some();
        for tri in indices.chunks_exact(3)
        {
            let corners = [tri[0], tri[1], tri[2]];
            mesh.triangles.push(corners.map(|i| base + i));

            let face_normal =
            {
                let [a, b, c] = corners.map(|i| positions.get(i as usize).copied().unwrap_or_default());
                (b - a).cross(c - a).normalize_or_zero()
            };
            for i in corners
            {
                let normal = normals.as_ref().and_then(|n| n.get(i as usize).copied()).unwrap_or(face_normal);
                mesh.normals.push(normal);
                uvs.push(tex_coords.as_ref().and_then(|t| t.get(i as usize).copied()).unwrap_or_default());
            }
        }

        mesh.control_points.extend(positions);
    }

    if any_uvs
    {
        mesh.uvs = Some(uvs);
    }
    if !clusters.is_empty()
    {
        mesh.skins.push(Skin { clusters });
    }
    Ok(mesh)
}

fn interpolation(in_interp: gltf::animation::Interpolation) -> Interpolation
{
    match in_interp
    {
        gltf::animation::Interpolation::Step => Interpolation::Constant,
        gltf::animation::Interpolation::Linear => Interpolation::Linear,
        gltf::animation::Interpolation::CubicSpline => Interpolation::Cubic,
    }
}

// cubic spline outputs are (in-tangent, value, out-tangent) triplets
fn key_values<T: Copy + Default>(values: Vec<T>, key_count: usize, interp: Interpolation) -> Vec<(T, T, T)>
{
    match interp
    {
        Interpolation::Cubic => values.chunks_exact(3).take(key_count).map(|c| (c[0], c[1], c[2])).collect(),
        _ => values.into_iter().take(key_count).map(|v| (T::default(), v, T::default())).collect(),
    }
}

fn vec3_curves(times: &[f32], values: Vec<[f32; 3]>, interp: Interpolation) -> [Option<AnimCurve>; 3]
{
    let keys = key_values(values, times.len(), interp);
    std::array::from_fn(|axis|
    {
        Some(AnimCurve::new(times.iter().zip(&keys).map(|(t, (in_tan, value, out_tan))| CurveKey
        {
            time: *t as f64,
            value: value[axis] as f64,
            interpolation: interp,
            in_tangent: in_tan[axis] as f64,
            out_tangent: out_tan[axis] as f64,
        }).collect()))
    })
}

fn read_animation(in_anim: &gltf::Animation, node_map: &[Option<NodeId>], buffers: &[gltf::buffer::Data]) -> AnimStack
{
    let name = in_anim.name().map(str::to_string).unwrap_or_else(|| format!("animation_{}", in_anim.index()));

    let mut stack = AnimStack::new(name, f64::MAX, f64::MIN);
    for in_chan in in_anim.channels()
    {
        let Some(node) = node_map.get(in_chan.target().node().index()).copied().flatten() else { continue };
        let reader = in_chan.reader(|b| Some(&buffers[b.index()]));
        let Some(inputs) = reader.read_inputs() else { continue };
        let times: Vec<f32> = inputs.collect();
        if let (Some(first), Some(last)) = (times.first(), times.last())
        {
            stack.start = stack.start.min(*first as f64);
            stack.stop = stack.stop.max(*last as f64);
        }

        let interp = interpolation(in_chan.sampler().interpolation());
        let Some(outputs) = reader.read_outputs() else { continue };
        let curves = stack.curves_mut(node);
        match outputs
        {
            ReadOutputs::Translations(translations) =>
            {
                curves.translation = vec3_curves(&times, translations.collect(), interp);
            }
            ReadOutputs::Scales(scales) =>
            {
                curves.scale = vec3_curves(&times, scales.collect(), interp);
            }
            ReadOutputs::Rotations(rotations) =>
            {
                let to_vec4 = |r: [f32; 4]| DVec4::new(r[0] as f64, r[1] as f64, r[2] as f64, r[3] as f64);
                let keys = key_values(rotations.into_f32().collect(), times.len(), interp);
                curves.rotation = RotationCurves::Quat(QuatCurve::new(times.iter().zip(keys).map(|(t, (in_tan, value, out_tan))| QuatKey
                {
                    time: *t as f64,
                    value: DQuat::from_vec4(to_vec4(value)).normalize(),
                    interpolation: interp,
                    in_tangent: to_vec4(in_tan),
                    out_tangent: to_vec4(out_tan),
                }).collect()));
            }
            ReadOutputs::MorphTargetWeights(_) => {} // unsupported
        }
    }

    if stack.start > stack.stop
    {
        stack.start = 0.0;
        stack.stop = 0.0;
    }
    stack
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn step_and_cubic_mapping()
    {
        assert_eq!(interpolation(gltf::animation::Interpolation::Step), Interpolation::Constant);
        assert_eq!(interpolation(gltf::animation::Interpolation::CubicSpline), Interpolation::Cubic);
    }

    #[test]
    fn cubic_values_unpack_triplets()
    {
        let values = vec![[0.0f32; 3], [1.0, 2.0, 3.0], [0.5; 3], [0.0; 3], [4.0, 5.0, 6.0], [0.0; 3]];
        let curves = vec3_curves(&[0.0, 1.0], values, Interpolation::Cubic);
        let y = curves[1].as_ref().unwrap();
        assert_eq!(y.keys().len(), 2);
        assert_eq!(y.keys()[0].value, 2.0);
        assert_eq!(y.keys()[0].out_tangent, 0.5);
        assert_eq!(y.keys()[1].value, 5.0);
    }

    #[test]
    fn linear_values_pass_through()
    {
        let curves = vec3_curves(&[0.0, 0.5], vec![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]], Interpolation::Linear);
        let x = curves[0].as_ref().unwrap();
        assert_eq!(x.evaluate(0.25), Some(1.5));
    }
}
