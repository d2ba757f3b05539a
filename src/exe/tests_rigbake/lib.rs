mod bind_pose;
mod skin_weights;
mod winding;
mod tracks;
mod containers;
mod gltf_end_to_end;

use glam::DVec3;
use scene_rigbake::{LocalTransform, NodeAttribute, NodeId, Scene};

pub(crate) fn bone(scene: &mut Scene, parent: NodeId, name: &str, translation: DVec3) -> NodeId
{
    scene.add_node(parent, name, NodeAttribute::Skeleton, LocalTransform::from_translation(translation))
}
