use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use bbvs_formats::{
    scene_file_name, Animation, AnimationFrame, CameraInit, GameModule, Point, Rect, SceneExit,
    SceneObjectDef, SceneObjectInit, SceneSound,
};
use serde::Deserialize;
use tempfile::tempdir;

#[derive(Debug, Deserialize)]
struct TickRecord {
    tick: u32,
    scene: i32,
    butthead: Option<[i32; 2]>,
    draw_items: usize,
}

#[derive(Debug, Deserialize)]
struct EventLogEntry {
    label: String,
}

#[derive(Debug, Deserialize)]
struct EventLog {
    events: Vec<EventLogEntry>,
}

#[derive(Debug, Deserialize)]
struct AudioRecord {
    kind: String,
    index: Option<usize>,
    looped: Option<bool>,
}

const STAND_ANIM: usize = 8;

fn actor_def(name: &str) -> SceneObjectDef {
    SceneObjectDef {
        name: name.to_string(),
        anim_indices: (1..=12).collect(),
        walk_speed: 120,
    }
}

/// Butthead and Beavis on a 320x100 floor with one looping room tone.
fn fixture_scene(exits: Vec<SceneExit>) -> GameModule {
    let animations = (0..=12)
        .map(|anim| Animation {
            frames: vec![AnimationFrame {
                sprite_index: anim,
                ticks: 4,
                rect1: Rect::new(-10, -40, 20, 40),
                rect2: Rect::new(-8, -4, 16, 4),
            }],
        })
        .collect();
    let init = |scene_object_index: usize, x: i32| SceneObjectInit {
        conditions: Default::default(),
        scene_object_index,
        anim_index: STAND_ANIM,
        position: Point::new(x, 150),
    };
    GameModule {
        field_c: 320,
        primary_actor_index: Some(0),
        walk_rects: vec![Rect::new(0, 100, 320, 100)],
        scene_object_defs: vec![actor_def("Butthead"), actor_def("Beavis")],
        scene_object_inits: vec![init(0, 50), init(1, 250)],
        animations,
        camera_inits: vec![CameraInit::default()],
        scene_exits: exits,
        scene_sounds: vec![SceneSound {
            conditions: Default::default(),
            sound_num: 3,
        }],
        preload_sounds: vec![3],
        ..GameModule::default()
    }
}

fn write_scenes(dir: &Path) -> Result<()> {
    let first = fixture_scene(vec![SceneExit {
        rect: Rect::new(0, 100, 20, 100),
        new_scene_num: 2,
    }]);
    let second = fixture_scene(Vec::new());
    for (scene_num, module) in [(1, first), (2, second)] {
        let path = dir.join(scene_file_name(scene_num));
        let json = serde_json::to_vec_pretty(&module).context("serializing fixture scene")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn write_clicks(path: &Path, clicks: &[(u32, i32, i32)]) -> Result<()> {
    let events: Vec<_> = clicks
        .iter()
        .map(|&(tick, x, y)| serde_json::json!({ "tick": tick, "mouse": [x, y], "buttons": 1 }))
        .collect();
    fs::write(path, serde_json::to_vec(&events)?)
        .with_context(|| format!("writing input script {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("{} is not valid UTF-8", path.display()))
}

#[test]
fn click_walks_butthead_to_the_target() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary scene directory")?;
    write_scenes(temp_dir.path())?;
    let script = temp_dir.path().join("clicks.json");
    write_clicks(&script, &[(1, 200, 150)])?;
    let trace_path = temp_dir.path().join("trace.json");
    let audio_path = temp_dir.path().join("audio.json");
    let events_path = temp_dir.path().join("events.json");

    let status = Command::new(env!("CARGO_BIN_EXE_bbvs_engine"))
        .args([
            "--data-root",
            path_arg(temp_dir.path())?,
            "--ticks",
            "160",
            "--frame-ms",
            "34",
            "--input-script",
            path_arg(&script)?,
            "--trace-json",
            path_arg(&trace_path)?,
            "--audio-log-json",
            path_arg(&audio_path)?,
            "--event-log-json",
            path_arg(&events_path)?,
        ])
        .status()
        .context("executing bbvs_engine walk run")?;
    assert!(status.success(), "bbvs_engine exited with {status:?}");

    let trace: Vec<TickRecord> = read_json(&trace_path)?;
    assert_eq!(trace.len(), 160, "one trace record per tick");
    assert_eq!(trace[0].butthead, Some([50, 150]));
    assert!(trace.iter().all(|record| record.scene == 1));
    assert!(trace.iter().all(|record| record.draw_items >= 2));
    let last = trace.last().context("empty trace")?;
    assert_eq!(last.tick, 159);
    assert_eq!(last.butthead, Some([200, 150]), "butthead did not arrive");

    let events: EventLog = read_json(&events_path)?;
    assert!(
        events
            .events
            .iter()
            .any(|event| event.label == "walk.request 200,150"),
        "missing walk request in {:?}",
        events.events
    );
    assert!(events
        .events
        .iter()
        .any(|event| event.label.starts_with("walk.start 0 ")));

    let audio: Vec<AudioRecord> = read_json(&audio_path)?;
    let first = audio.first().context("no audio events recorded")?;
    assert_eq!(first.kind, "sound_play");
    assert_eq!(first.index, Some(0));
    assert_eq!(first.looped, Some(true));
    Ok(())
}

#[test]
fn scene_exit_survives_save_and_load() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary scene directory")?;
    write_scenes(temp_dir.path())?;
    let script = temp_dir.path().join("exit.json");
    write_clicks(&script, &[(0, 10, 150)])?;
    let save_path = temp_dir.path().join("manual.sav");
    let first_events = temp_dir.path().join("first_events.json");

    let status = Command::new(env!("CARGO_BIN_EXE_bbvs_engine"))
        .args([
            "--data-root",
            path_arg(temp_dir.path())?,
            "--ticks",
            "120",
            "--input-script",
            path_arg(&script)?,
            "--event-log-json",
            path_arg(&first_events)?,
            "--save-out",
            path_arg(&save_path)?,
        ])
        .status()
        .context("executing bbvs_engine exit run")?;
    assert!(status.success(), "bbvs_engine exited with {status:?}");
    assert!(save_path.is_file(), "no save file written");

    let events: EventLog = read_json(&first_events)?;
    let labels: Vec<&str> = events.events.iter().map(|event| event.label.as_str()).collect();
    let exit = labels
        .iter()
        .position(|label| *label == "scene.exit 2")
        .context("butthead never reached the exit")?;
    let change = labels
        .iter()
        .position(|label| *label == "scene.change 2")
        .context("scene never changed")?;
    assert!(exit < change);

    let trace_path = temp_dir.path().join("resumed.json");
    let second_events = temp_dir.path().join("second_events.json");
    let status = Command::new(env!("CARGO_BIN_EXE_bbvs_engine"))
        .args([
            "--data-root",
            path_arg(temp_dir.path())?,
            "--ticks",
            "3",
            "--load",
            path_arg(&save_path)?,
            "--trace-json",
            path_arg(&trace_path)?,
            "--event-log-json",
            path_arg(&second_events)?,
        ])
        .status()
        .context("executing bbvs_engine resume run")?;
    assert!(status.success(), "bbvs_engine exited with {status:?}");

    let trace: Vec<TickRecord> = read_json(&trace_path)?;
    assert_eq!(trace.len(), 3);
    assert!(trace.iter().all(|record| record.scene == 2));
    assert_eq!(trace[0].butthead, Some([50, 150]));

    let events: EventLog = read_json(&second_events)?;
    assert!(events.events.iter().any(|event| event.label == "save.load 2"));
    Ok(())
}

#[test]
fn zero_frame_step_is_rejected() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary scene directory")?;
    write_scenes(temp_dir.path())?;
    let output = Command::new(env!("CARGO_BIN_EXE_bbvs_engine"))
        .args(["--data-root", path_arg(temp_dir.path())?, "--frame-ms", "0"])
        .output()
        .context("executing bbvs_engine with --frame-ms 0")?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--frame-ms"), "unexpected stderr: {stderr}");
    Ok(())
}
