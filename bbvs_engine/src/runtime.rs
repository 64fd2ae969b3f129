use std::{
    fs::{self, File},
    io::BufReader,
    path::Path,
    rc::Rc,
};

use anyhow::{Context, Result};
use bbvs_engine::state::{MOUSE_LEFT_DOWN, MOUSE_RIGHT_DOWN};
use bbvs_engine::{
    AudioSink, DrawList, Engine, EngineHost, FrameClock, GameState, InputFrame, KeyCode,
    RecordingAudio,
};
use bbvs_formats::{Point, SceneLibrary};
use serde::{Deserialize, Serialize};

use crate::cli::RunArgs;

pub fn execute(args: RunArgs) -> Result<()> {
    let RunArgs {
        data_root,
        scene,
        ticks,
        input_script,
        trace_json,
        audio_log_json,
        event_log_json,
        save_out,
        load,
        frame_ms,
    } = args;

    let library = SceneLibrary::from_dir(&data_root)
        .with_context(|| format!("loading scene modules from {}", data_root.display()))?;
    let mut script = match input_script.as_ref() {
        Some(path) => InputScript::load(path)?,
        None => InputScript::default(),
    };
    if let Some(path) = audio_log_json.as_ref() {
        eprintln!(
            "[bbvs_engine] info: capturing audio events to {}",
            path.display()
        );
    }

    let recorder = Rc::new(RecordingAudio::new());
    let host = EngineHost::default().with_audio(recorder.clone() as Rc<dyn AudioSink>);
    let mut engine = Engine::new(Box::new(library), host);
    engine
        .start(scene)
        .with_context(|| format!("starting scene {scene}"))?;

    if let Some(path) = load.as_ref() {
        let file =
            File::open(path).with_context(|| format!("opening save file {}", path.display()))?;
        engine
            .read_save_game(&mut BufReader::new(file))
            .with_context(|| format!("restoring save file {}", path.display()))?;
        eprintln!(
            "[bbvs_engine] info: restored scene {} from {}",
            engine.state().scene_num,
            path.display()
        );
    }

    let mut clock = FrameClock::new();
    let mut trace = Vec::new();
    let mut events = EventLog::default();
    let record_events = event_log_json.is_some();
    events.extend(engine.take_events(), record_events);
    let mut tick = 0;
    'frames: while tick < ticks {
        for _ in 0..clock.advance(frame_ms) {
            if tick >= ticks {
                break 'frames;
            }
            let input = script.frame_for(tick);
            let running = engine
                .update(input)
                .with_context(|| format!("running tick {tick}"))?;
            events.extend(engine.take_events(), record_events);
            if !running {
                eprintln!("[bbvs_engine] info: quit requested at tick {tick}");
                break 'frames;
            }
            let mut draw_list = DrawList::new();
            engine.build_draw_list(&mut draw_list);
            trace.push(TickRecord::capture(tick, &engine, draw_list.len()));
            tick += 1;
        }
    }
    println!(
        "Ran {tick} ticks; now in scene {} ({:?})",
        engine.state().scene_num,
        engine.state().game_state
    );

    if let Some(path) = trace_json.as_ref() {
        write_json(path, &trace, "tick trace")?;
    }

    if let Some(path) = event_log_json.as_ref() {
        write_json(path, &events, "engine event log")?;
    }

    if let Some(path) = audio_log_json.as_ref() {
        write_json(path, &recorder.events(), "audio event log")?;
    }

    if let Some(path) = save_out.as_ref() {
        let mut file = File::create(path)
            .with_context(|| format!("creating save file {}", path.display()))?;
        engine
            .write_save_game(&mut file)
            .with_context(|| format!("writing save file to {}", path.display()))?;
        if let Some(summary) = engine.save_summary() {
            println!(
                "Saved scene {} at tick {} to {}",
                summary.scene_num,
                summary.game_ticks,
                path.display()
            );
        }
    }

    Ok(())
}

pub fn list_scenes(data_root: &Path) -> Result<()> {
    let library = SceneLibrary::from_dir(data_root)
        .with_context(|| format!("loading scene modules from {}", data_root.display()))?;
    println!("Scenes under {}:", library.root().display());
    for scene_num in library.scene_numbers() {
        if let Some(path) = library.path_for(scene_num) {
            println!("  {scene_num:>3}  {}", path.display());
        }
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serializing {what} to JSON"))?;
    fs::write(path, &json).with_context(|| format!("writing {what} to {}", path.display()))?;
    println!("Saved {what} to {}", path.display());
    Ok(())
}

#[derive(Serialize)]
struct TickRecord {
    tick: u32,
    scene: i32,
    game_state: GameState,
    #[serde(skip_serializing_if = "Option::is_none")]
    butthead: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    beavis: Option<Point>,
    draw_items: usize,
}

impl TickRecord {
    fn capture(tick: u32, engine: &Engine, draw_items: usize) -> Self {
        let state = engine.state();
        Self {
            tick,
            scene: state.scene_num,
            game_state: state.game_state,
            butthead: state.butthead_pos(),
            beavis: state.beavis.map(|index| state.object(index).int_pos()),
            draw_items,
        }
    }
}

#[derive(Serialize)]
struct EventLogEntry {
    sequence: usize,
    label: String,
}

#[derive(Default, Serialize)]
struct EventLog {
    events: Vec<EventLogEntry>,
}

impl EventLog {
    /// Appends a drained batch; the batch is dropped when nothing is recorded.
    fn extend(&mut self, labels: Vec<String>, record: bool) {
        if !record {
            return;
        }
        let start = self.events.len();
        self.events.extend(
            labels
                .into_iter()
                .enumerate()
                .map(|(offset, label)| EventLogEntry {
                    sequence: start + offset,
                    label,
                }),
        );
    }
}

/// One scripted input change, applied on its tick.
#[derive(Debug, Clone, Deserialize)]
struct ScriptEvent {
    tick: u32,
    /// Screen-space pointer position; the previous one is kept when absent.
    #[serde(default)]
    mouse: Option<Point>,
    #[serde(default)]
    buttons: u32,
    #[serde(default)]
    key: Option<KeyCode>,
    #[serde(default)]
    quit: bool,
}

/// Replays an input script. Button-held bits persist until the next event
/// changes them; click bits and keys last for their tick only.
#[derive(Debug, Default)]
struct InputScript {
    events: Vec<ScriptEvent>,
    next: usize,
    mouse: Point,
    held: u32,
}

impl InputScript {
    const HELD_MASK: u32 = MOUSE_LEFT_DOWN | MOUSE_RIGHT_DOWN;

    fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("reading input script {}", path.display()))?;
        let mut events: Vec<ScriptEvent> = serde_json::from_slice(&data)
            .with_context(|| format!("parsing input script {}", path.display()))?;
        events.sort_by_key(|event| event.tick);
        Ok(Self {
            events,
            ..Self::default()
        })
    }

    fn frame_for(&mut self, tick: u32) -> InputFrame {
        let mut frame = InputFrame {
            mouse: self.mouse,
            buttons: self.held,
            key: None,
            quit: false,
        };
        while let Some(event) = self.events.get(self.next) {
            if event.tick > tick {
                break;
            }
            self.next += 1;
            if event.tick < tick {
                continue;
            }
            if let Some(mouse) = event.mouse {
                self.mouse = mouse;
                frame.mouse = mouse;
            }
            self.held = event.buttons & Self::HELD_MASK;
            frame.buttons = (frame.buttons & !Self::HELD_MASK) | event.buttons;
            frame.key = event.key.or(frame.key);
            frame.quit |= event.quit;
        }
        frame
    }
}
