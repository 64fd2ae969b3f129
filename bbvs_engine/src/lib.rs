//! Interactive runtime for the Bbvs adventure engine.
//!
//! A host builds an [`Engine`] from a [`SceneProvider`] and an
//! [`EngineHost`], then calls [`Engine::update`] once per logical tick (see
//! [`FrameClock`]) and renders the sprites handed to a [`DrawSink`].

mod action;
pub mod audio_bridge;
pub mod draw_list;
pub mod engine;
pub mod error;
pub mod game_loop;
pub mod host;
pub mod input;
pub mod logic;
pub mod objects;
pub mod savegame;
mod scene;
pub mod state;
pub mod walk;

#[cfg(test)]
mod test_support;

pub use audio_bridge::{AudioEvent, RecordingAudio};
pub use draw_list::{DrawItem, DrawList};
pub use engine::Engine;
pub use error::EngineError;
pub use game_loop::FrameClock;
pub use host::{
    AudioSink, DrawSink, EngineHost, Minigame, MinigameHost, NullHost, SceneProvider, VideoPlayer,
};
pub use savegame::SaveState;
pub use state::{GameState, InputFrame, KeyCode, SimulationState, Verb};
