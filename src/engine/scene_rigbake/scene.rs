use crate::{AxisSystem, MaterialId, MeshData, NodeCurves, RotationCurves, SourceMaterial};
use glam::{DMat4, DQuat, DVec3};
use math_rigbake::{euler_xyz_degrees_from_quat, quat_from_euler_xyz_degrees, Transform};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);
impl NodeId
{
    #[inline] #[must_use]
    pub fn index(self) -> usize { self.0 as usize }
}
impl Debug for NodeId
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "#{}", self.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind
{
    Null,
    Skeleton,
    Mesh,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub enum NodeAttribute
{
    #[default]
    Null,
    Skeleton,
    Mesh(MeshData),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rotation
{
    /// Degrees, applied X then Y then Z
    Euler(DVec3),
    Quat(DQuat),
}
impl Rotation
{
    #[must_use]
    pub fn to_quat(&self) -> DQuat
    {
        match self
        {
            Rotation::Euler(degrees) => quat_from_euler_xyz_degrees(*degrees),
            Rotation::Quat(q) => *q,
        }
    }
    #[must_use]
    pub fn to_euler(&self) -> DVec3
    {
        match self
        {
            Rotation::Euler(degrees) => *degrees,
            Rotation::Quat(q) => euler_xyz_degrees_from_quat(*q),
        }
    }
}

/// Un-animated local transform of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform
{
    pub translation: DVec3,
    pub rotation: Rotation,
    pub scale: DVec3,
}
impl Default for LocalTransform
{
    fn default() -> Self { Self
    {
        translation: DVec3::ZERO,
        rotation: Rotation::Quat(DQuat::IDENTITY),
        scale: DVec3::ONE,
    }}
}
impl LocalTransform
{
    #[must_use]
    pub fn from_translation(translation: DVec3) -> Self
    {
        Self { translation, ..Default::default() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode
{
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub attribute: NodeAttribute,
    pub local: LocalTransform,
    /// Pivot offset applied to the node's geometry only, not inherited by children
    pub geometric: DMat4,
    pub materials: Vec<MaterialId>,
}
impl SceneNode
{
    #[must_use]
    pub fn kind(&self) -> NodeKind
    {
        match self.attribute
        {
            NodeAttribute::Null => NodeKind::Null,
            NodeAttribute::Skeleton => NodeKind::Skeleton,
            NodeAttribute::Mesh(_) => NodeKind::Mesh,
        }
    }

    #[must_use]
    pub fn mesh(&self) -> Option<&MeshData>
    {
        match &self.attribute
        {
            NodeAttribute::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

/// A named clip: time span plus the curves of every animated node
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnimStack
{
    pub name: String,
    pub start: f64,
    pub stop: f64,
    pub curves: HashMap<NodeId, NodeCurves>,
}
impl AnimStack
{
    #[must_use]
    pub fn new(name: impl Into<String>, start: f64, stop: f64) -> Self
    {
        Self { name: name.into(), start, stop, curves: HashMap::new() }
    }

    pub fn curves_mut(&mut self, node: NodeId) -> &mut NodeCurves
    {
        self.curves.entry(node).or_default()
    }

    #[must_use]
    pub fn duration(&self) -> f64 { (self.stop - self.start).max(0.0) }
}

/// Which values to evaluate transforms with
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pose
{
    /// Authored (bind) values, ignoring animation
    Rest,
    Sample { stack: usize, time: f64 },
}

/// Node arena with a synthetic, untransformed root at index 0
#[derive(Debug, Clone, PartialEq)]
pub struct Scene
{
    nodes: Vec<SceneNode>,
    materials: Vec<SourceMaterial>,
    anim_stacks: Vec<AnimStack>,
    current_stack: Option<usize>,

    axis_system: AxisSystem,
    /// Change of basis conjugating every evaluated local transform
    basis: DMat4,
    /// Length of one scene unit in meters
    pub unit_meters: f64,
}
impl Default for Scene
{
    fn default() -> Self { Self::new(AxisSystem::default(), 1.0) }
}
impl Scene
{
    pub const ROOT: NodeId = NodeId(0);

    #[must_use]
    pub fn new(axis_system: AxisSystem, unit_meters: f64) -> Self
    {
        Self
        {
            nodes: vec![SceneNode
            {
                name: "RootNode".to_string(),
                parent: None,
                children: Vec::new(),
                attribute: NodeAttribute::Null,
                local: LocalTransform::default(),
                geometric: DMat4::IDENTITY,
                materials: Vec::new(),
            }],
            materials: Vec::new(),
            anim_stacks: Vec::new(),
            current_stack: None,
            axis_system,
            basis: DMat4::IDENTITY,
            unit_meters,
        }
    }

    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>, attribute: NodeAttribute, local: LocalTransform) -> NodeId
    {
        debug_assert!(parent.index() < self.nodes.len());
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode
        {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            attribute,
            local,
            geometric: DMat4::IDENTITY,
            materials: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn add_material(&mut self, material: SourceMaterial) -> MaterialId
    {
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(material);
        id
    }

    pub fn add_anim_stack(&mut self, stack: AnimStack) -> usize
    {
        self.anim_stacks.push(stack);
        self.anim_stacks.len() - 1
    }
    pub fn set_current_stack(&mut self, stack: Option<usize>)
    {
        self.current_stack = stack.filter(|s| *s < self.anim_stacks.len());
    }

    #[inline] #[must_use] pub fn root(&self) -> NodeId { Self::ROOT }
    #[inline] #[must_use] pub fn node_count(&self) -> usize { self.nodes.len() }
    #[inline] #[must_use] pub fn node(&self, id: NodeId) -> &SceneNode { &self.nodes[id.index()] }
    #[inline] pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode { &mut self.nodes[id.index()] }
    #[inline] #[must_use] pub fn material(&self, id: MaterialId) -> Option<&SourceMaterial> { self.materials.get(id.0 as usize) }
    #[inline] #[must_use] pub fn anim_stacks(&self) -> &[AnimStack] { &self.anim_stacks }
    #[inline] pub fn anim_stack_mut(&mut self, index: usize) -> Option<&mut AnimStack> { self.anim_stacks.get_mut(index) }
    #[inline] #[must_use] pub fn axis_system(&self) -> AxisSystem { self.axis_system }

    /// The current stack, else the first one
    #[must_use]
    pub fn active_stack(&self) -> Option<(usize, &AnimStack)>
    {
        let index = self.current_stack.unwrap_or(0);
        self.anim_stacks.get(index).map(|s| (index, s))
    }

    /// Pre-order depth first traversal from the root; parents are always visited before their children
    #[must_use]
    pub fn depth_first(&self) -> DepthFirst<'_>
    {
        DepthFirst { scene: self, stack: vec![Self::ROOT] }
    }

    /// `node`, then its parent, up to the root
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_
    {
        std::iter::successors(Some(node), |n| self.node(*n).parent)
    }

    /// First match in traversal order
    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeId>
    {
        self.depth_first().find(|n| self.node(*n).name == name)
    }

    pub fn mesh_nodes(&self) -> impl Iterator<Item = (NodeId, &MeshData)> + '_
    {
        self.depth_first().filter_map(|n| self.node(n).mesh().map(|m| (n, m)))
    }

    /// Scale, rotation and translation of `node` in the source axis system, before any basis change
    #[must_use]
    pub fn local_parts(&self, node: NodeId, pose: Pose) -> Transform
    {
        if node == Self::ROOT
        {
            return Transform::default();
        }

        let scene_node = self.node(node);
        let rest = &scene_node.local;
        let curves = match pose
        {
            Pose::Rest => None,
            Pose::Sample { stack, time } => self.anim_stacks.get(stack)
                .and_then(|s| s.curves.get(&node))
                .map(|c| (c, time)),
        };

        let Some((curves, time)) = curves else
        {
            return Transform { position: rest.translation, rotation: rest.rotation.to_quat(), scale: rest.scale };
        };

        let axes = |animated: &[Option<crate::AnimCurve>; 3], fallback: DVec3| -> DVec3
        {
            let mut out = fallback;
            for (i, curve) in animated.iter().enumerate()
            {
                if let Some(value) = curve.as_ref().and_then(|c| c.evaluate(time))
                {
                    out[i] = value;
                }
            }
            out
        };

        let rotation = match &curves.rotation
        {
            RotationCurves::Euler(euler) if euler.iter().all(Option::is_none) => rest.rotation.to_quat(),
            RotationCurves::Euler(euler) => quat_from_euler_xyz_degrees(axes(euler, rest.rotation.to_euler())),
            RotationCurves::Quat(quat) => quat.evaluate(time).unwrap_or_else(|| rest.rotation.to_quat()),
        };
        Transform
        {
            position: axes(&curves.translation, rest.translation),
            rotation,
            scale: axes(&curves.scale, rest.scale),
        }
    }

    /// Re-express a local matrix of the source axis system in the current one
    #[inline] #[must_use]
    pub fn to_scene_basis(&self, local: &DMat4) -> DMat4
    {
        self.basis * *local * self.basis.transpose()
    }

    #[must_use]
    pub fn evaluate_local(&self, node: NodeId, pose: Pose) -> DMat4
    {
        if node == Self::ROOT
        {
            return DMat4::IDENTITY;
        }
        self.to_scene_basis(&self.local_parts(node, pose).to_world_mtx())
    }

    #[must_use]
    pub fn evaluate_global(&self, node: NodeId, pose: Pose) -> DMat4
    {
        let mut global = DMat4::IDENTITY;
        for ancestor in self.ancestors(node)
        {
            global = self.evaluate_local(ancestor, pose) * global;
        }
        global
    }

    /// Geometric (pivot) transform in the current axis system
    #[must_use]
    pub fn geometric_transform(&self, node: NodeId) -> DMat4
    {
        self.node(node).geometric
    }

    /// Re-express the whole scene in another axis system. Applied once, before extraction
    pub fn convert_axis_system(&mut self, target: AxisSystem)
    {
        let conversion = self.axis_system.conversion_to(&target);
        if conversion == DMat4::IDENTITY
        {
            return;
        }

        for node in &mut self.nodes
        {
            node.geometric = conversion * node.geometric * conversion.transpose();
            if let NodeAttribute::Mesh(mesh) = &mut node.attribute
            {
                for p in &mut mesh.control_points
                {
                    *p = conversion.transform_vector3(*p);
                }
                for n in &mut mesh.normals
                {
                    *n = conversion.transform_vector3(*n);
                }
            }
        }

        self.basis = conversion * self.basis;
        self.axis_system = target;
    }
}

pub struct DepthFirst<'s>
{
    scene: &'s Scene,
    stack: Vec<NodeId>,
}
impl Iterator for DepthFirst<'_>
{
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item>
    {
        let node = self.stack.pop()?;
        self.stack.extend(self.scene.node(node).children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests
{
    use crate::{AnimCurve, CurveKey};
    use super::*;

    fn chain() -> (Scene, NodeId, NodeId, NodeId)
    {
        let mut scene = Scene::default();
        let a = scene.add_node(Scene::ROOT, "a", NodeAttribute::Skeleton, LocalTransform::from_translation(DVec3::new(1.0, 0.0, 0.0)));
        let b = scene.add_node(a, "b", NodeAttribute::Skeleton, LocalTransform::from_translation(DVec3::new(0.0, 2.0, 0.0)));
        let c = scene.add_node(Scene::ROOT, "c", NodeAttribute::Null, LocalTransform::default());
        (scene, a, b, c)
    }

    #[test]
    fn depth_first_is_preorder()
    {
        let (scene, a, b, c) = chain();
        let order: Vec<_> = scene.depth_first().collect();
        assert_eq!(order, vec![Scene::ROOT, a, b, c]);
    }

    #[test]
    fn global_composes_parents()
    {
        let (scene, _, b, _) = chain();
        let global = scene.evaluate_global(b, Pose::Rest);
        assert!(global.w_axis.truncate().abs_diff_eq(DVec3::new(1.0, 2.0, 0.0), 1e-12));
        assert_eq!(scene.ancestors(b).count(), 3);
        assert_eq!(scene.find_node_by_name("b"), Some(b));
        assert_eq!(scene.find_node_by_name("nope"), None);
    }

    #[test]
    fn animated_axis_overrides_rest()
    {
        let (mut scene, a, _, _) = chain();
        let mut stack = AnimStack::new("walk", 0.0, 1.0);
        stack.curves_mut(a).translation[2] = Some(AnimCurve::new(vec![CurveKey::linear(0.0, 0.0), CurveKey::linear(1.0, 4.0)]));
        let stack = scene.add_anim_stack(stack);

        let local = scene.evaluate_local(a, Pose::Sample { stack, time: 0.5 });
        // x comes from the rest pose, z from the curve
        assert!(local.w_axis.truncate().abs_diff_eq(DVec3::new(1.0, 0.0, 2.0), 1e-12));
        let rest = scene.evaluate_local(a, Pose::Rest);
        assert!(rest.w_axis.truncate().abs_diff_eq(DVec3::new(1.0, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn euler_curve_keeps_other_rest_axes()
    {
        let mut scene = Scene::default();
        let local = LocalTransform { rotation: Rotation::Euler(DVec3::new(90.0, 0.0, 0.0)), ..Default::default() };
        let n = scene.add_node(Scene::ROOT, "n", NodeAttribute::Skeleton, local);
        let mut stack = AnimStack::new("spin", 0.0, 1.0);
        stack.curves_mut(n).rotation = RotationCurves::Euler([None, None, Some(AnimCurve::new(vec![CurveKey::linear(0.0, 0.0), CurveKey::linear(1.0, 90.0)]))]);
        let stack = scene.add_anim_stack(stack);

        let m = scene.evaluate_local(n, Pose::Sample { stack, time: 1.0 });
        let expected = quat_from_euler_xyz_degrees(DVec3::new(90.0, 0.0, 90.0));
        assert!(m.abs_diff_eq(DMat4::from_quat(expected), 1e-9));
    }

    #[test]
    fn active_stack_prefers_current()
    {
        let mut scene = Scene::default();
        assert!(scene.active_stack().is_none());
        scene.add_anim_stack(AnimStack::new("first", 0.0, 1.0));
        scene.add_anim_stack(AnimStack::new("second", 0.0, 2.0));
        assert_eq!(scene.active_stack().unwrap().1.name, "first");
        scene.set_current_stack(Some(1));
        assert_eq!(scene.active_stack().unwrap().1.name, "second");
        scene.set_current_stack(Some(7));
        assert_eq!(scene.active_stack().unwrap().0, 0);
    }

    #[test]
    fn axis_conversion_preserves_world_positions()
    {
        let mut scene = Scene::new(AxisSystem::MAX, 1.0);
        let parent = scene.add_node(Scene::ROOT, "p", NodeAttribute::Null, LocalTransform
        {
            translation: DVec3::new(0.0, 0.0, 5.0),
            rotation: Rotation::Quat(DQuat::from_rotation_z(0.5)),
            scale: DVec3::ONE,
        });
        let mesh = MeshData
        {
            control_points: vec![DVec3::new(1.0, 2.0, 3.0)],
            ..Default::default()
        };
        let child = scene.add_node(parent, "m", NodeAttribute::Mesh(mesh), LocalTransform::from_translation(DVec3::X));

        let world_before = scene.evaluate_global(child, Pose::Rest).transform_point3(DVec3::new(1.0, 2.0, 3.0));
        let conversion = AxisSystem::MAX.conversion_to(&AxisSystem::GLTF);
        scene.convert_axis_system(AxisSystem::GLTF);

        let point = scene.node(child).mesh().unwrap().control_points[0];
        let world_after = scene.evaluate_global(child, Pose::Rest).transform_point3(point);
        assert!(world_after.abs_diff_eq(conversion.transform_point3(world_before), 1e-9));
        // max up ends up as y
        assert!(scene.evaluate_global(parent, Pose::Rest).w_axis.truncate().abs_diff_eq(DVec3::new(0.0, 5.0, 0.0), 1e-9));
    }
}
