use crate::skeleton::{BoneTable, ResolvedSkeleton};
use crate::{Issues, ResolveIssue};
use arrayvec::ArrayVec;
use assets_rigbake::MAX_INFLUENCES;
use scene_rigbake::{MeshData, NodeId, Scene};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influence
{
    pub bone: u32,
    pub weight: f64,
}

/// At most four influences, sorted by descending weight, summing to 1 (or empty)
pub type InfluenceSet = ArrayVec<Influence, MAX_INFLUENCES>;

/// How the vertices of one mesh are bound to the skeleton
#[derive(Debug, Clone, PartialEq)]
pub enum MeshSkinning
{
    /// Resolved set per control point
    Weighted(Vec<InfluenceSet>),
    /// Every vertex follows one bone with weight 1
    Rigid(u32),
    /// All-zero influences
    Unbound,
}
impl MeshSkinning
{
    /// Encoded bone indices/weights for a vertex of `control_point`
    #[must_use]
    pub fn vertex_influences(&self, control_point: u32) -> ([u32; MAX_INFLUENCES], [f32; MAX_INFLUENCES])
    {
        match self
        {
            MeshSkinning::Weighted(sets) => sets.get(control_point as usize).map(to_vertex_arrays).unwrap_or_default(),
            MeshSkinning::Rigid(bone) => ([*bone, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]),
            MeshSkinning::Unbound => Default::default(),
        }
    }
}

/// Every positive weight referencing each control point, across all skins and clusters
#[must_use]
pub fn collect_influences(scene: &Scene, mesh: &MeshData, table: &BoneTable) -> Vec<Vec<Influence>>
{
    let mut per_point = vec![Vec::new(); mesh.control_point_count()];
    for cluster in mesh.skins.iter().flat_map(|s| &s.clusters)
    {
        let Some(bone) = cluster.link.and_then(|link| table.get(&scene.node(link).name)) else { continue };
        for (control_point, weight) in cluster.influences()
        {
            if weight <= 0.0
            {
                continue;
            }
            if let Some(influences) = per_point.get_mut(control_point as usize)
            {
                influences.push(Influence { bone, weight });
            }
        }
    }
    per_point
}

/// Strongest four, renormalized. Empty when nothing positive survives
#[must_use]
pub fn resolve_influences(raw: &[Influence]) -> InfluenceSet
{
    let mut sorted = raw.to_vec();
    // stable: equal weights keep their authored order
    sorted.sort_by(|a, b| b.weight.total_cmp(&a.weight));

    let mut kept: InfluenceSet = sorted.into_iter().take(MAX_INFLUENCES).collect();
    let sum: f64 = kept.iter().map(|i| i.weight).sum();
    if sum <= 0.0 || !sum.is_finite()
    {
        return InfluenceSet::new();
    }

    for influence in &mut kept
    {
        influence.weight /= sum;
    }
    kept
}

#[must_use]
pub fn to_vertex_arrays(set: &InfluenceSet) -> ([u32; MAX_INFLUENCES], [f32; MAX_INFLUENCES])
{
    let mut indices = [0; MAX_INFLUENCES];
    let mut weights = [0.0; MAX_INFLUENCES];
    for (i, influence) in set.iter().enumerate()
    {
        indices[i] = influence.bone;
        weights[i] = influence.weight as f32;
    }
    (indices, weights)
}

/// Bone an unskinned mesh follows: the nearest ancestor (or the node itself) that is a bone
#[must_use]
pub fn rigid_bone(scene: &Scene, node: NodeId, table: &BoneTable) -> Option<u32>
{
    scene.ancestors(node).find_map(|n| table.get(&scene.node(n).name))
}

pub fn resolve_mesh_skinning(
    scene: &Scene,
    node: NodeId,
    mesh: &MeshData,
    skeleton: &ResolvedSkeleton,
    default_bone: u32,
    issues: &mut Issues) -> MeshSkinning
{
    if skeleton.is_empty()
    {
        return MeshSkinning::Unbound;
    }

    if !mesh.is_skinned()
    {
        let bone = rigid_bone(scene, node, &skeleton.table).unwrap_or(default_bone);
        return MeshSkinning::Rigid(bone);
    }

    let sets: Vec<InfluenceSet> = collect_influences(scene, mesh, &skeleton.table).iter()
        .map(|raw| resolve_influences(raw))
        .collect();

    let referenced: BTreeSet<u32> = mesh.triangles.iter().flatten().copied().collect();
    for control_point in referenced
    {
        if sets.get(control_point as usize).is_some_and(|s| s.is_empty())
        {
            issues.push(ResolveIssue::UnweightedControlPoint { mesh: scene.node(node).name.clone(), control_point });
        }
    }

    MeshSkinning::Weighted(sets)
}
