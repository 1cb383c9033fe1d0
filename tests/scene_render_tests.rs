//! End-to-end rendering: routing model → launched scene → mixed output.

use approx::assert_relative_eq;
use ensemble::prelude::*;

mod helpers;
use helpers::tolerances::*;
use helpers::*;

fn single_track_engine(value: f32) -> (EnsembleEngine, SceneId) {
    let engine = test_engine();
    let scene = engine.edit(|edit| {
        add_master(edit);
        add_constant_track(edit, 2, value);
        edit.add_scene("all", Vec::new(), None)
    });
    (engine, scene)
}

#[test]
fn test_clip_reaches_every_output_channel() {
    let (engine, scene) = single_track_engine(0.25);
    engine.launch(scene).unwrap();
    engine.transport().play();

    let out = engine.render_offline(256);
    assert!(all_near(&channel(&out, 2, 0), 0.25, FLOAT_EPSILON));
    assert!(all_near(&channel(&out, 2, 1), 0.25, FLOAT_EPSILON));
    assert_eq!(engine.transport().playhead(), 256);
}

#[test]
fn test_stopped_transport_renders_silence() {
    let (engine, scene) = single_track_engine(0.25);
    engine.launch(scene).unwrap();

    let out = engine.render_offline(256);
    assert!(is_silent(&out));
    assert_eq!(engine.transport().playhead(), 0);
}

#[test]
fn test_unlaunched_scene_is_not_heard() {
    let (engine, scene) = single_track_engine(0.25);
    let instance = engine.build_scene(scene).unwrap();
    assert!(instance.is_built());
    engine.transport().play();
    assert!(is_silent(&engine.render_offline(128)));
}

#[test]
fn test_volume_and_mute_ramp_to_target() {
    let (engine, scene) = single_track_engine(0.5);
    engine.launch(scene).unwrap();
    engine.transport().play();

    assert!(engine.set_volume(TrackId::new(2), 0.5));
    let out = engine.render_offline(1024);
    let left = channel(&out, 2, 0);
    // 10 ms ramp is 480 frames at 48 kHz.
    assert!(left[0] > 0.25);
    assert_relative_eq!(left[1023], 0.25, epsilon = DSP_EPSILON);

    assert!(engine.set_mute(TrackId::new(2), true));
    let out = engine.render_offline(1024);
    assert!(is_silent(&channel(&out, 2, 0)[600..]));
}

#[test]
fn test_master_volume_scales_mix() {
    let engine = test_engine();
    let scene = engine.edit(|edit| {
        add_master(edit);
        add_constant_track(edit, 2, 0.25);
        add_constant_track(edit, 3, 0.5);
        edit.add_scene("all", Vec::new(), None)
    });
    engine.launch(scene).unwrap();
    engine.transport().play();

    assert_relative_eq!(
        rms(&engine.render_offline(256)),
        0.75,
        epsilon = FLOAT_EPSILON
    );

    engine.set_volume(MASTER, 0.0);
    let out = engine.render_offline(1024);
    assert!(is_silent(&out[2 * 600..]));
}

#[test]
fn test_plugin_chain_processes_signal() {
    let engine = test_engine();
    let scene = engine.edit(|edit| {
        add_master(edit);
        edit.add_track(
            Track::audio(TrackId::new(2), "lead")
                .with_output(MASTER)
                .with_clip(constant_clip(0.25))
                .with_plugin(PluginDescriptor::new("boost", "gain").with_parameter("gain", 2.0))
                .with_plugin(PluginDescriptor::new("flip", "invert")),
        )
        .unwrap();
        edit.add_scene("all", Vec::new(), None)
    });
    let instance = engine.launch(scene).unwrap();
    assert!(instance.failed_plugins().is_empty());
    engine.transport().play();

    let out = engine.render_offline(128);
    assert!(all_near(&out, -0.5, FLOAT_EPSILON));
    assert_eq!(
        engine.parameters().get(TrackId::new(2), "boost.gain"),
        Some(2.0)
    );
}

#[test]
fn test_failed_plugin_is_skipped_not_fatal() {
    let engine = test_engine();
    let scene = engine.edit(|edit| {
        add_master(edit);
        edit.add_track(
            Track::audio(TrackId::new(2), "lead")
                .with_output(MASTER)
                .with_clip(constant_clip(0.25))
                .with_plugin(PluginDescriptor::new("boost", "gain").with_parameter("gain", 2.0))
                .with_plugin(PluginDescriptor::new("vintage", "not-installed")),
        )
        .unwrap();
        edit.add_scene("all", Vec::new(), None)
    });
    let instance = engine.launch(scene).unwrap();

    let failed = instance.failed_plugins();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].plugin, "vintage");
    assert!(instance
        .plugin_nodes()
        .get(TrackId::new(2), "vintage")
        .is_none());

    engine.transport().play();
    assert!(all_near(&engine.render_offline(128), 0.5, FLOAT_EPSILON));
}

#[test]
fn test_send_to_aux_adds_parallel_path() {
    let engine = test_engine();
    let scene = engine.edit(|edit| {
        add_master(edit);
        edit.add_track(Track::aux(TrackId::new(10), "bus").with_output(MASTER))
            .unwrap();
        let vox = add_constant_track(edit, 2, 0.25);
        edit.add_send(vox, TrackId::new(10)).unwrap();
        edit.add_scene("all", Vec::new(), None)
    });
    engine.launch(scene).unwrap();
    engine.transport().play();

    // Direct path plus the aux path.
    assert!(all_near(&engine.render_offline(128), 0.5, FLOAT_EPSILON));
}

#[test]
fn test_mono_track_fans_out_to_stereo() {
    let engine = test_engine();
    let scene = engine.edit(|edit| {
        add_master(edit);
        edit.add_track(
            Track::audio(TrackId::new(2), "mono")
                .with_format(ChannelsFormat::Mono)
                .with_output(MASTER)
                .with_clip(constant_clip(0.3)),
        )
        .unwrap();
        edit.add_scene("all", Vec::new(), None)
    });
    engine.launch(scene).unwrap();
    engine.transport().play();

    let out = engine.render_offline(128);
    assert!(all_near(&channel(&out, 2, 1), 0.3, FLOAT_EPSILON));
}

#[test]
fn test_k_live_scenes_are_summed() {
    let engine = test_engine();
    let scenes: Vec<SceneId> = engine.edit(|edit| {
        add_master(edit);
        add_constant_track(edit, 2, 0.1);
        (0..3)
            .map(|i| edit.add_scene(format!("copy {i}"), Vec::new(), None))
            .collect()
    });
    for &scene in &scenes {
        engine.launch(scene).unwrap();
    }
    assert_eq!(engine.live_scenes().len(), 3);
    engine.transport().play();

    assert!(all_near(&engine.render_offline(256), 0.3, FLOAT_EPSILON));
    // The transport advanced once per chunk, not once per scene.
    assert_eq!(engine.transport().playhead(), 256);

    engine.stop_scene(scenes[0]);
    assert!(all_near(&engine.render_offline(64), 0.2, FLOAT_EPSILON));
}

#[test]
fn test_scenes_sharing_a_plugin_track_share_its_parameters() {
    let engine = test_engine();
    let scenes: Vec<SceneId> = engine.edit(|edit| {
        add_master(edit);
        edit.add_track(
            Track::audio(TrackId::new(2), "lead")
                .with_output(MASTER)
                .with_clip(constant_clip(0.25))
                .with_plugin(PluginDescriptor::new("boost", "gain").with_parameter("gain", 1.0)),
        )
        .unwrap();
        (0..2)
            .map(|i| edit.add_scene(format!("copy {i}"), Vec::new(), None))
            .collect()
    });
    for &scene in &scenes {
        engine.launch(scene).unwrap();
    }
    engine.transport().play();
    assert!(all_near(&engine.render_offline(256), 0.5, FLOAT_EPSILON));

    // One write reaches the gain plugin in both live scenes.
    assert!(engine
        .parameters()
        .set(TrackId::new(2), "boost.gain", 0.0));
    let out = engine.render_offline(2048);
    let tail = &out[out.len() - 512 * engine.channels()..];
    assert!(is_silent(tail), "tail peak {}", peak(tail));
}

#[test]
fn test_relaunch_picks_up_routing_edits() {
    let (engine, scene) = single_track_engine(0.25);
    engine.launch(scene).unwrap();
    engine.transport().play();
    assert!(all_near(&engine.render_offline(64), 0.25, FLOAT_EPSILON));

    engine.edit(|edit| {
        add_constant_track(edit, 3, 0.25);
    });
    // Not heard until the scene is rebuilt.
    assert!(all_near(&engine.render_offline(64), 0.25, FLOAT_EPSILON));

    engine.launch(scene).unwrap();
    assert!(all_near(&engine.render_offline(64), 0.5, FLOAT_EPSILON));
}
