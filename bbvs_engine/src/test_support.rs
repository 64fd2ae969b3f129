//! Shared fixtures for the engine's unit tests.

use bbvs_formats::{
    Animation, AnimationFrame, CameraInit, GameModule, Point, Rect, SceneObjectDef,
    SceneObjectInit,
};

use crate::audio_bridge::RecordingAudio;
use crate::scene::SceneRuntime;
use crate::state::SimulationState;
use crate::walk::PathfindingWorkspace;

pub(crate) const BUTTHEAD: usize = 0;
pub(crate) const BEAVIS: usize = 1;
pub(crate) const LAMP: usize = 2;
pub(crate) const LAMP_ANIM: usize = 13;

/// Standing pose facing direction 0 (def slot 7).
pub(crate) const STAND_ANIM: usize = 8;

fn frame(sprite_index: i32, rect1: Rect, rect2: Rect) -> Animation {
    Animation {
        frames: vec![
            AnimationFrame {
                sprite_index,
                ticks: 1,
                rect1,
                rect2,
            },
            AnimationFrame {
                sprite_index: sprite_index + 100,
                ticks: 2,
                rect1,
                rect2,
            },
        ],
    }
}

fn actor(name: &str) -> SceneObjectDef {
    SceneObjectDef {
        name: name.to_string(),
        anim_indices: (1..=12).collect(),
        walk_speed: 120,
    }
}

/// Two actors and a lamp on a single 320x100 floor.
pub(crate) fn actor_module() -> GameModule {
    let mut animations = vec![Animation::default()];
    for anim in 1..=12 {
        animations.push(frame(
            anim,
            Rect::new(-10, -40, 20, 40),
            Rect::new(-8, -4, 16, 4),
        ));
    }
    animations.push(frame(
        LAMP_ANIM as i32,
        Rect::new(-10, -30, 20, 30),
        Rect::new(-10, -5, 20, 10),
    ));

    let init = |scene_object_index: usize, anim_index: usize, x: i32, y: i32| SceneObjectInit {
        conditions: Default::default(),
        scene_object_index,
        anim_index,
        position: Point::new(x, y),
    };

    GameModule {
        field_c: 320,
        primary_actor_index: Some(BUTTHEAD),
        walk_rects: vec![Rect::new(0, 100, 320, 100)],
        scene_object_defs: vec![
            actor("Butthead"),
            actor("Beavis"),
            SceneObjectDef {
                name: "Lamp".to_string(),
                anim_indices: Vec::new(),
                walk_speed: 60,
            },
        ],
        scene_object_inits: vec![
            init(BUTTHEAD, STAND_ANIM, 50, 150),
            init(BEAVIS, STAND_ANIM, 250, 150),
            init(LAMP, LAMP_ANIM, 160, 60),
        ],
        animations,
        camera_inits: vec![CameraInit::default()],
        ..GameModule::default()
    }
}

/// Owns everything a [`SceneRuntime`] borrows.
pub(crate) struct Harness {
    pub(crate) state: SimulationState,
    pub(crate) module: GameModule,
    pub(crate) audio: RecordingAudio,
    pub(crate) workspace: PathfindingWorkspace,
    pub(crate) events: Vec<String>,
}

impl Harness {
    pub(crate) fn new(module: GameModule) -> Self {
        Self {
            state: SimulationState::new(),
            module,
            audio: RecordingAudio::new(),
            workspace: PathfindingWorkspace::new(),
            events: Vec::new(),
        }
    }

    pub(crate) fn rt(&mut self) -> SceneRuntime<'_> {
        SceneRuntime::new(
            &mut self.state,
            &self.module,
            &self.audio,
            &mut self.workspace,
            &mut self.events,
        )
    }

    pub(crate) fn ticks_until_idle(&mut self, limit: usize) -> usize {
        for tick in 0..limit {
            if self.state.curr_action.is_none() {
                return tick;
            }
            self.rt().update_common();
        }
        panic!("action still running after {limit} ticks");
    }
}
