//! Seams to the collaborators the interpreter drives but does not own.

use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{Context, Result};
use bbvs_formats::{GameModule, SceneLibrary};

/// Receives sprites for one frame; higher `priority` draws later.
pub trait DrawSink {
    fn add(&mut self, sprite_index: i32, x: i32, y: i32, priority: i32);
}

/// Audio mixer contract. Sounds are addressed by their preload-table index.
pub trait AudioSink {
    fn play_sound(&self, index: usize, looped: bool);
    fn stop_sound(&self, index: usize);
    fn play_speech(&self, sound_num: i32);
    fn stop_speech(&self);
    fn is_speech_playing(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Minigame {
    Loogie,
    Tennis,
    Ant,
    AirGuitar,
}

impl Minigame {
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Self::Loogie),
            1 => Some(Self::Tennis),
            2 => Some(Self::Ant),
            3 => Some(Self::AirGuitar),
            _ => None,
        }
    }
}

/// Runs an arcade minigame to completion and hands control back.
pub trait MinigameHost {
    fn run_minigame(&self, minigame: Minigame) -> bool;
}

pub trait VideoPlayer {
    fn play_video(&self, video_num: i32);
}

/// Source of scene modules by scene number.
pub trait SceneProvider {
    fn load_scene(&self, scene_num: i32) -> Result<GameModule>;
}

impl SceneProvider for SceneLibrary {
    fn load_scene(&self, scene_num: i32) -> Result<GameModule> {
        self.load(scene_num)
    }
}

impl SceneProvider for BTreeMap<i32, GameModule> {
    fn load_scene(&self, scene_num: i32) -> Result<GameModule> {
        self.get(&scene_num)
            .cloned()
            .with_context(|| format!("scene {scene_num} is not registered"))
    }
}

/// Discards everything; used when no host is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl AudioSink for NullHost {
    fn play_sound(&self, _index: usize, _looped: bool) {}

    fn stop_sound(&self, _index: usize) {}

    fn play_speech(&self, _sound_num: i32) {}

    fn stop_speech(&self) {}

    fn is_speech_playing(&self) -> bool {
        false
    }
}

impl MinigameHost for NullHost {
    fn run_minigame(&self, minigame: Minigame) -> bool {
        log::info!("minigame {minigame:?} skipped by headless host");
        true
    }
}

impl VideoPlayer for NullHost {
    fn play_video(&self, video_num: i32) {
        log::info!("video {video_num} skipped by headless host");
    }
}

/// Bundle of host callbacks handed to the engine.
#[derive(Clone)]
pub struct EngineHost {
    pub audio: Rc<dyn AudioSink>,
    pub minigames: Rc<dyn MinigameHost>,
    pub video: Rc<dyn VideoPlayer>,
}

impl Default for EngineHost {
    fn default() -> Self {
        let null = Rc::new(NullHost);
        Self {
            audio: null.clone(),
            minigames: null.clone(),
            video: null,
        }
    }
}

impl EngineHost {
    pub fn with_audio(mut self, audio: Rc<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }
}
