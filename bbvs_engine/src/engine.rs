//! Host-facing entry point: owns the simulation and steps it one tick at a
//! time.

use std::io::{Read, Write};
use std::ops::RangeInclusive;

use bbvs_formats::GameModule;
use bbvs_save::{encode_save, read_save, write_save, SaveHeader, SaveKind, SaveSummary};

use crate::draw_list::build_draw_list;
use crate::error::EngineError;
use crate::host::{DrawSink, EngineHost, Minigame, SceneProvider};
use crate::savegame::SaveState;
use crate::scene::SceneRuntime;
use crate::state::{set_flag, InputFrame, SimulationState};
use crate::walk::PathfindingWorkspace;

/// Scene numbers that hand off to a minigame (id = scene - 27).
pub const MINIGAME_SCENES: RangeInclusive<i32> = 27..=30;
/// Scene numbers that play a video and return.
pub const VIDEO_SCENES: RangeInclusive<i32> = 31..=43;

pub struct Engine {
    state: SimulationState,
    module: GameModule,
    scenes: Box<dyn SceneProvider>,
    host: EngineHost,
    workspace: PathfindingWorkspace,
    events: Vec<String>,
    snapshot: Option<SaveState>,
    continue_save: Option<Vec<u8>>,
    quit_requested: bool,
}

impl Engine {
    pub fn new(scenes: Box<dyn SceneProvider>, host: EngineHost) -> Self {
        Self {
            state: SimulationState::new(),
            module: GameModule::default(),
            scenes,
            host,
            workspace: PathfindingWorkspace::new(),
            events: Vec::new(),
            snapshot: None,
            continue_save: None,
            quit_requested: false,
        }
    }

    fn runtime(&mut self) -> SceneRuntime<'_> {
        SceneRuntime::new(
            &mut self.state,
            &self.module,
            self.host.audio.as_ref(),
            &mut self.workspace,
            &mut self.events,
        )
    }

    fn log(&mut self, message: String) {
        log::debug!(target: "bbvs_engine::trace", "{message}");
        self.events.push(message);
    }

    /// Loads `scene_num` as the opening scene.
    pub fn start(&mut self, scene_num: i32) -> Result<(), EngineError> {
        self.state = SimulationState::new();
        self.enter_scene(scene_num, 0)?;
        self.snapshot = Some(SaveState::capture(&self.state));
        Ok(())
    }

    fn enter_scene(&mut self, scene_num: i32, prev_scene_num: i32) -> Result<(), EngineError> {
        self.module = self.load_module(scene_num)?;
        self.state.scene_num = scene_num;
        self.state.prev_scene_num = prev_scene_num;
        self.state.new_scene_num = None;
        self.runtime().init_scene();
        log::info!("entered scene {scene_num} from {prev_scene_num}");
        Ok(())
    }

    fn load_module(&self, scene_num: i32) -> Result<GameModule, EngineError> {
        self.scenes
            .load_scene(scene_num)
            .map_err(|err| EngineError::SceneLoad {
                scene: scene_num,
                reason: format!("{err:#}"),
            })
    }

    /// Runs one logical tick. Returns `Ok(false)` once the host asked to quit.
    pub fn update(&mut self, input: InputFrame) -> Result<bool, EngineError> {
        if input.quit {
            self.quit_requested = true;
        }
        if self.quit_requested {
            return Ok(false);
        }

        self.runtime().handle_input(&input);
        if self.state.new_scene_num.is_some() {
            self.change_scene()?;
        }
        self.state.game_ticks = self.state.game_ticks.wrapping_add(1);
        if self.state.game_state.allows_save() && self.state.curr_action.is_none() {
            self.snapshot = Some(SaveState::capture(&self.state));
        }
        Ok(true)
    }

    pub fn set_new_scene_num(&mut self, scene_num: i32) {
        self.state.new_scene_num = Some(scene_num);
    }

    fn change_scene(&mut self) -> Result<(), EngineError> {
        let Some(new_scene) = self.state.new_scene_num.take() else {
            return Ok(());
        };
        let leaving = self.state.scene_num;

        let snapshot = SaveState::capture(&self.state);
        self.continue_save = Some(encode_save(SaveKind::Continue, &snapshot)?);
        set_flag(&mut self.state.scene_visited, leaving, true);
        if self.state.background_sound_playing {
            let camera = self.state.curr_camera_num;
            self.runtime().stop_background_sounds(camera);
        }
        self.log(format!("scene.change {new_scene}"));
        log::info!("scene change {leaving} -> {new_scene}");

        if MINIGAME_SCENES.contains(&new_scene) {
            self.run_minigame(new_scene - MINIGAME_SCENES.start())?;
            self.enter_scene(leaving, new_scene)
        } else if VIDEO_SCENES.contains(&new_scene) {
            self.log(format!("video.play {new_scene}"));
            self.host.video.play_video(new_scene);
            self.enter_scene(leaving, new_scene)
        } else {
            self.enter_scene(new_scene, leaving)
        }
    }

    /// Hands control to the minigame host; returns whether it was won.
    pub fn run_minigame(&mut self, id: i32) -> Result<bool, EngineError> {
        let minigame = Minigame::from_id(id).ok_or(EngineError::UnknownMinigame(id))?;
        self.log(format!("minigame.run {id}"));
        log::info!("running minigame {minigame:?}");
        let won = self.host.minigames.run_minigame(minigame);
        self.log(format!("minigame.end {id} {won}"));
        Ok(won)
    }

    pub fn build_draw_list(&self, sink: &mut dyn DrawSink) {
        build_draw_list(&self.state, &self.module, sink);
    }

    /// Writes the most recent save-allowed snapshot as a framed manual save.
    pub fn write_save_game<W: Write>(&self, writer: &mut W) -> Result<(), EngineError> {
        let snapshot = self.snapshot.as_ref().ok_or(EngineError::NoSnapshot)?;
        write_save(writer, SaveKind::Manual, snapshot)?;
        log::info!(
            "saved scene {} at tick {}",
            snapshot.scene_num,
            snapshot.game_ticks
        );
        Ok(())
    }

    pub fn save_game(&self) -> Result<Vec<u8>, EngineError> {
        let mut bytes = Vec::new();
        self.write_save_game(&mut bytes)?;
        Ok(bytes)
    }

    pub fn save_summary(&self) -> Option<SaveSummary> {
        self.snapshot
            .as_ref()
            .map(|snapshot| snapshot.summary(SaveKind::Manual))
    }

    /// Restores a save produced by [`Engine::write_save_game`] or a continue
    /// snapshot. The scene's inits are not re-run.
    pub fn read_save_game<R: Read>(&mut self, reader: &mut R) -> Result<(), EngineError> {
        let (header, snapshot): (SaveHeader, SaveState) = read_save(reader)?;
        self.restore_snapshot(header, snapshot)
    }

    pub fn load_game(&mut self, mut bytes: &[u8]) -> Result<(), EngineError> {
        self.read_save_game(&mut bytes)
    }

    fn restore_snapshot(
        &mut self,
        header: SaveHeader,
        snapshot: SaveState,
    ) -> Result<(), EngineError> {
        let module = self.load_module(snapshot.scene_num)?;
        snapshot
            .validate(&module)
            .map_err(|reason| EngineError::IncompatibleSave {
                scene: snapshot.scene_num,
                reason,
            })?;

        if self.state.background_sound_playing {
            let camera = self.state.curr_camera_num;
            self.runtime().stop_background_sounds(camera);
        }
        self.module = module;
        snapshot.restore(&mut self.state);
        self.state.butthead = self.module.primary_actor_index;
        self.state.beavis = self.module.find_scene_object_def("Beavis");
        let camera = self.state.curr_camera_num;
        let mut runtime = self.runtime();
        runtime.update_walkable_rects();
        if runtime.state.background_sound_playing {
            runtime.start_background_sounds(camera);
        }
        self.log(format!("save.load {}", snapshot.scene_num));
        log::info!(
            "loaded {:?} save of scene {} at tick {}",
            header.kind,
            snapshot.scene_num,
            snapshot.game_ticks
        );
        self.snapshot = Some(snapshot);
        Ok(())
    }

    /// Framed snapshot written on the last scene change.
    pub fn continue_save(&self) -> Option<&[u8]> {
        self.continue_save.as_deref()
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn module(&self) -> &GameModule {
        &self.module
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Hands over the events logged since the last call.
    pub fn take_events(&mut self) -> Vec<String> {
        std::mem::take(&mut self.events)
    }
}
