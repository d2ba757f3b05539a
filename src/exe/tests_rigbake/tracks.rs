use crate::bone;
use approx::assert_relative_eq;
use bake_rigbake::animation::extract_clip;
use bake_rigbake::{BakeConfig, BakeMode};
use glam::DVec3;
use nab_rigbake::timing::FSeconds;
use scene_rigbake::{AnimCurve, AnimStack, CurveKey, Scene};

fn linear(keys: &[(f64, f64)]) -> Option<AnimCurve>
{
    Some(AnimCurve::new(keys.iter().map(|(t, v)| CurveKey::linear(*t, *v)).collect()))
}

fn anim_config() -> BakeConfig
{
    BakeConfig { length_scale: Some(1.0), ..BakeConfig::preset(BakeMode::Animation) }
}

#[test]
fn half_second_of_leading_pose_is_trimmed()
{
    let mut scene = Scene::default();
    let hip = bone(&mut scene, Scene::ROOT, "Hip", DVec3::ZERO);
    let spine = bone(&mut scene, hip, "Spine", DVec3::Y);

    let mut stack = AnimStack::new("walk", 0.0, 2.0);
    stack.curves_mut(hip).translation[0] = linear(&[(0.0, 0.0), (1.0, 4.0)]);
    stack.curves_mut(spine).translation[1] = linear(&[(0.5, 1.0), (2.0, 3.0)]);
    scene.add_anim_stack(stack);

    let clip = extract_clip(&scene, &anim_config(), "unused").unwrap().unwrap();
    assert_eq!(clip.clip_name, "walk");
    assert_eq!(clip.duration, FSeconds(1.5));

    let hip_track = &clip.tracks[0];
    assert_eq!(hip_track.bone_name, "Hip");
    // the hip key at 0 shifts before the start and is dropped
    assert_eq!(hip_track.keys.iter().map(|k| k.time.0).collect::<Vec<_>>(), vec![0.5]);
    assert_relative_eq!(hip_track.keys[0].translation.x, 4.0, epsilon = 1e-5);

    let spine_track = &clip.tracks[1];
    assert_eq!(spine_track.keys.iter().map(|k| k.time.0).collect::<Vec<_>>(), vec![0.0, 1.5]);
    assert_relative_eq!(spine_track.keys[0].translation.y, 1.0, epsilon = 1e-5);
    assert_relative_eq!(spine_track.keys[1].translation.y, 3.0, epsilon = 1e-5);
}

#[test]
fn keys_ascending_from_zero()
{
    let mut scene = Scene::default();
    let mut parent = Scene::ROOT;
    let mut stack = AnimStack::new("", 1.0, 9.0);
    for i in 0..5
    {
        parent = bone(&mut scene, parent, &format!("B{i}"), DVec3::X);
        // shuffled, repeated and out of range times
        let times = [7.0, 0.5, 3.0 + i as f64, 3.0, 12.0, 1.25 * (i + 1) as f64, 3.0];
        stack.curves_mut(parent).translation[i % 3] = linear(&times.map(|t| (t, t * 2.0)));
        stack.curves_mut(parent).scale[(i + 1) % 3] = linear(&[(2.0, 1.0), (8.0 - i as f64, 2.0)]);
    }
    scene.add_anim_stack(stack);

    let clip = extract_clip(&scene, &anim_config(), "fallback").unwrap().unwrap();
    assert_eq!(clip.clip_name, "fallback");
    assert_eq!(clip.tracks.len(), 5);

    let earliest = clip.tracks.iter().flat_map(|t| &t.keys).map(|k| k.time.0).fold(f32::INFINITY, f32::min);
    assert_eq!(earliest, 0.0);
    for track in &clip.tracks
    {
        assert!(track.keys.windows(2).all(|w| w[0].time.0 < w[1].time.0), "{}", track.bone_name);
        assert!(track.keys.iter().all(|k| k.time.0 <= clip.duration.0));
        assert!(track.keys.iter().all(|k| (k.rotation.length() - 1.0).abs() < 1e-5));
    }
}
