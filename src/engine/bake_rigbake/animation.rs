use crate::{BakeConfig, BakeError};
use assets_rigbake::{AnimationFile, Keyframe, Track};
use indexmap::IndexMap;
use glam::DVec3;
use math_rigbake::{det3, CoordinateConvention, Transform, SINGULAR_EPSILON};
use nab_rigbake::timing::FSeconds;
use scene_rigbake::{AnimStack, NodeCurves, NodeId, NodeKind, Pose, Scene};

/// Sorted, duplicate free key times of every channel, limited to `[start, stop]`
#[must_use]
pub fn unified_key_times(curves: &NodeCurves, start: f64, stop: f64) -> Vec<f64>
{
    let mut times: Vec<f64> = curves.key_times()
        .filter(|t| (start..=stop).contains(t))
        .collect();
    times.sort_by(f64::total_cmp);
    times.dedup();
    times
}

/// Nodes that get a track, depth first
pub fn track_candidates<'s>(scene: &'s Scene, stack: &'s AnimStack, skeleton_only: bool) -> impl Iterator<Item = (NodeId, &'s NodeCurves)> + 's
{
    scene.depth_first()
        .filter(move |n| !skeleton_only || scene.node(*n).kind() == NodeKind::Skeleton)
        .filter_map(move |n| stack.curves.get(&n).map(|c| (n, c)))
        .filter(|(_, c)| !c.is_empty())
}

/// Local transform of `node` at `time` (scene time), normalized and narrowed
#[must_use]
pub fn sample_keyframe(scene: &Scene, node: NodeId, stack: usize, time: f64, clip_start: f64, convention: &CoordinateConvention) -> Keyframe
{
    let parts = scene.local_parts(node, Pose::Sample { stack, time });
    let local = convention.normalize(&scene.to_scene_basis(&parts.to_world_mtx()));
    let mut transform = Transform::from(local);
    if det3(&local).abs() < SINGULAR_EPSILON
    {
        // a collapsed scale axis leaves nothing to decompose the rotation from
        let unscaled = Transform { scale: DVec3::ONE, ..parts };
        transform.rotation = Transform::from(convention.normalize(&scene.to_scene_basis(&unscaled.to_world_mtx()))).rotation;
    }
    let (translation, rotation, scale) = transform.normalized().to_f32();
    Keyframe
    {
        time: FSeconds((time - clip_start) as f32),
        translation,
        rotation,
        scale,
    }
}

/// Ascending times, the last sample written for a time wins
fn sort_keys(keys: &mut Vec<Keyframe>)
{
    keys.sort_by(|a, b| a.time.0.total_cmp(&b.time.0));
    let mut collapsed: Vec<Keyframe> = Vec::with_capacity(keys.len());
    for key in keys.drain(..)
    {
        match collapsed.last_mut()
        {
            Some(last) if last.time == key.time => *last = key,
            _ => collapsed.push(key),
        }
    }
    *keys = collapsed;
}

/// Remove leading dead time: shift by the earliest positive key time of any track,
/// dropping keys that end up before 0
pub fn trim_leading_pose(tracks: &mut [Track], duration: &mut FSeconds)
{
    let min_time = tracks.iter()
        .flat_map(|t| &t.keys)
        .map(|k| k.time)
        .filter(|t| t.0 > 0.0)
        .min_by(|a, b| a.0.total_cmp(&b.0));
    let Some(min_time) = min_time else { return };

    for track in tracks.iter_mut()
    {
        track.keys.retain_mut(|key|
        {
            key.time = key.time - min_time;
            key.time.0 >= 0.0
        });
    }
    *duration = (*duration - min_time).max(FSeconds::ZERO);
    log::debug!("Trimmed {min_time} of leading time");
}

/// Bone tracks of the scene's active animation stack. `Ok(None)` when nothing is animated
pub fn extract_clip(scene: &Scene, config: &BakeConfig, fallback_name: &str) -> Result<Option<AnimationFile>, BakeError>
{
    let (stack_index, stack) = scene.active_stack().ok_or(BakeError::NoAnimationStack)?;
    let convention = config.convention(scene);

    let clip_name = match stack.name.is_empty()
    {
        true => fallback_name.to_string(),
        false => stack.name.clone(),
    };

    let mut by_name: IndexMap<String, Vec<Keyframe>> = IndexMap::new();
    for (node, curves) in track_candidates(scene, stack, config.tracks.skeleton_only)
    {
        let keys = unified_key_times(curves, stack.start, stack.stop).into_iter()
            .map(|t| sample_keyframe(scene, node, stack_index, t, stack.start, &convention));
        // nodes sharing a name share a track
        by_name.entry(scene.node(node).name.clone()).or_default().extend(keys);
    }

    let mut tracks: Vec<Track> = by_name.into_iter()
        .map(|(bone_name, mut keys)|
        {
            sort_keys(&mut keys);
            Track { bone_name, keys }
        })
        .collect();

    if tracks.is_empty()
    {
        log::info!("Clip {clip_name:?} has no animated nodes");
        return Ok(None);
    }

    let mut duration = FSeconds(stack.duration() as f32);
    trim_leading_pose(&mut tracks, &mut duration);

    Ok(Some(AnimationFile
    {
        version: AnimationFile::VERSION,
        clip_name,
        duration,
        tracks,
    }))
}

#[cfg(test)]
mod tests
{
    use approx::assert_relative_eq;
    use glam::{DQuat, DVec3, Quat, Vec3};
    use scene_rigbake::{AnimCurve, CurveKey, LocalTransform, NodeAttribute, QuatCurve, QuatKey, RotationCurves, Rotation};
    use crate::BakeMode;
    use super::*;

    fn key(time: f32, x: f32) -> Keyframe
    {
        Keyframe { time: FSeconds(time), translation: Vec3::new(x, 0.0, 0.0), rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }

    fn linear(keys: &[(f64, f64)]) -> Option<AnimCurve>
    {
        Some(AnimCurve::new(keys.iter().map(|(t, v)| CurveKey::linear(*t, *v)).collect()))
    }

    #[test]
    fn times_union_sorted_and_clipped()
    {
        let curves = NodeCurves
        {
            translation: [linear(&[(0.0, 0.0), (1.0, 1.0)]), None, linear(&[(0.5, 0.0), (3.0, 1.0)])],
            rotation: RotationCurves::Euler([None, linear(&[(1.0, 0.0), (-1.0, 0.0)]), None]),
            scale: Default::default(),
        };
        assert_eq!(unified_key_times(&curves, 0.0, 2.0), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn rotation_only_curve()
    {
        let mut scene = Scene::default();
        let bone = scene.add_node(Scene::ROOT, "Spin", NodeAttribute::Skeleton, LocalTransform
        {
            translation: DVec3::new(1.0, 2.0, 3.0),
            rotation: Rotation::Euler(DVec3::ZERO),
            scale: DVec3::splat(2.0),
        });
        let mut stack = AnimStack::new("spin", 0.0, 1.0);
        stack.curves_mut(bone).rotation = RotationCurves::Quat(QuatCurve::new(vec![
            QuatKey::linear(0.0, DQuat::IDENTITY),
            QuatKey::linear(1.0, DQuat::from_rotation_y(1.0)),
        ]));
        scene.add_anim_stack(stack);

        let convention = BakeConfig { length_scale: Some(1.0), ..BakeConfig::preset(BakeMode::Animation) }.convention(&scene);
        let (stack_index, stack) = scene.active_stack().unwrap();
        let curves = &stack.curves[&bone];
        let times = unified_key_times(curves, stack.start, stack.stop);
        assert_eq!(times, vec![0.0, 1.0]);

        let keys: Vec<_> = times.iter().map(|t| sample_keyframe(&scene, bone, stack_index, *t, stack.start, &convention)).collect();
        assert_eq!(keys[0].time, FSeconds(0.0));
        assert_eq!(keys[1].time, FSeconds(1.0));
        for k in &keys
        {
            // untouched channels keep their rest values
            assert!(k.translation.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));
            assert!(k.scale.abs_diff_eq(Vec3::splat(2.0), 1e-5));
            assert_relative_eq!(k.rotation.length(), 1.0, epsilon = 1e-5);
        }
        assert!(keys[1].rotation.abs_diff_eq(Quat::from_rotation_y(1.0), 1e-5));

        // the key at 0 is the leading pose and is trimmed away
        let clip = extract_clip(&scene, &BakeConfig::preset(BakeMode::Animation), "fallback").unwrap().unwrap();
        assert_eq!(clip.clip_name, "spin");
        assert_eq!(clip.tracks[0].keys.len(), 1);
        assert_eq!(clip.tracks[0].keys[0].time, FSeconds(0.0));
        assert!(clip.tracks[0].keys[0].rotation.abs_diff_eq(Quat::from_rotation_y(1.0), 1e-5));
        assert_eq!(clip.duration, FSeconds(0.0));
    }

    #[test]
    fn zero_scale_keeps_rotation()
    {
        let mut scene = Scene::default();
        let bone = scene.add_node(Scene::ROOT, "Pop", NodeAttribute::Skeleton, LocalTransform
        {
            translation: DVec3::new(0.0, 1.0, 0.0),
            rotation: Rotation::Quat(DQuat::from_rotation_y(1.0)),
            scale: DVec3::ONE,
        });
        let mut stack = AnimStack::new("pop", 0.0, 1.0);
        stack.curves_mut(bone).scale[0] = linear(&[(0.0, 1.0), (1.0, 0.0)]);
        scene.add_anim_stack(stack);

        let convention = CoordinateConvention::default();
        let key = sample_keyframe(&scene, bone, 0, 1.0, 0.0, &convention);
        assert!(key.rotation.abs_diff_eq(Quat::from_rotation_y(1.0), 1e-5), "{:?}", key.rotation);
        assert_relative_eq!(key.scale.x, 0.0);
        assert!(key.translation.abs_diff_eq(Vec3::Y, 1e-6));

        let mirrored = CoordinateConvention { mirror: Some(math_rigbake::Axis::X), length_scale: 1.0 };
        let key = sample_keyframe(&scene, bone, 0, 1.0, 0.0, &mirrored);
        assert!(key.rotation.abs_diff_eq(Quat::from_rotation_y(-1.0), 1e-5), "{:?}", key.rotation);
    }

    #[test]
    fn leading_time_trimmed()
    {
        let mut tracks = vec![
            Track { bone_name: "a".to_string(), keys: vec![key(0.0, 0.0), key(0.5, 1.0), key(1.0, 2.0)] },
            Track { bone_name: "b".to_string(), keys: vec![key(0.75, 0.0), key(2.0, 1.0)] },
            Track { bone_name: "c".to_string(), keys: vec![] },
        ];
        let mut duration = FSeconds(2.0);
        trim_leading_pose(&mut tracks, &mut duration);

        assert_eq!(duration, FSeconds(1.5));
        assert_eq!(tracks[0].keys.iter().map(|k| k.time.0).collect::<Vec<_>>(), vec![0.0, 0.5]);
        assert_eq!(tracks[0].keys[0].translation.x, 1.0);
        assert_eq!(tracks[1].keys.iter().map(|k| k.time.0).collect::<Vec<_>>(), vec![0.25, 1.5]);
        assert!(tracks[2].keys.is_empty());
    }

    #[test]
    fn nothing_positive_is_untouched()
    {
        let mut tracks = vec![Track { bone_name: "a".to_string(), keys: vec![key(0.0, 0.0)] }];
        let mut duration = FSeconds(1.0);
        trim_leading_pose(&mut tracks, &mut duration);
        assert_eq!(duration, FSeconds(1.0));
        assert_eq!(tracks[0].keys.len(), 1);
    }

    #[test]
    fn duplicate_times_keep_last()
    {
        let mut keys = vec![key(1.0, 1.0), key(0.0, 0.0), key(1.0, 5.0)];
        sort_keys(&mut keys);
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].translation.x, 5.0);
    }

    fn two_bone_scene() -> (Scene, NodeId, NodeId)
    {
        let mut scene = Scene::default();
        let hip = scene.add_node(Scene::ROOT, "Hip", NodeAttribute::Skeleton, LocalTransform::default());
        let prop = scene.add_node(hip, "Prop", NodeAttribute::Null, LocalTransform::default());
        (scene, hip, prop)
    }

    #[test]
    fn skeleton_only_candidates()
    {
        let (mut scene, hip, prop) = two_bone_scene();
        let mut stack = AnimStack::new("", 1.0, 3.0);
        stack.curves_mut(hip).translation[0] = linear(&[(1.0, 0.0), (2.0, 100.0), (5.0, 0.0)]);
        stack.curves_mut(prop).translation[1] = linear(&[(2.0, 0.0), (3.0, 1.0)]);
        scene.add_anim_stack(stack);

        let config = BakeConfig { length_scale: Some(0.01), ..BakeConfig::preset(BakeMode::Animation) };
        let clip = extract_clip(&scene, &config, "walk_cycle").unwrap().unwrap();
        assert_eq!(clip.clip_name, "walk_cycle");
        assert_eq!(clip.tracks.iter().map(|t| t.bone_name.as_str()).collect::<Vec<_>>(), vec!["Hip"]);
        // keys at 1 and 2 relative to a start of 1, then trimmed by 1
        let hip_keys = &clip.tracks[0].keys;
        assert_eq!(hip_keys.len(), 1);
        assert_eq!(hip_keys[0].time, FSeconds(0.0));
        assert_relative_eq!(hip_keys[0].translation.x, 1.0, epsilon = 1e-5);
        assert_eq!(clip.duration, FSeconds(1.0));

        let config = BakeConfig { tracks: crate::TrackConfig { skeleton_only: false }, ..config };
        let clip = extract_clip(&scene, &config, "").unwrap().unwrap();
        assert_eq!(clip.tracks.len(), 2);
    }

    #[test]
    fn no_stack_is_error()
    {
        let (scene, _, _) = two_bone_scene();
        let result = extract_clip(&scene, &BakeConfig::default(), "x");
        assert!(matches!(result, Err(BakeError::NoAnimationStack)));
    }

    #[test]
    fn static_stack_has_no_clip()
    {
        let (mut scene, _, _) = two_bone_scene();
        scene.add_anim_stack(AnimStack::new("idle", 0.0, 1.0));
        let result = extract_clip(&scene, &BakeConfig::default(), "x").unwrap();
        assert!(result.is_none());
    }
}
