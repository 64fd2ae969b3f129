use bbvs_save::SaveError;
use thiserror::Error;

/// Fatal conditions surfaced from the tick API.
///
/// Gameplay outcomes such as an unreachable walk target or a condition list
/// that fails are never reported through this type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown minigame id {0}")]
    UnknownMinigame(i32),
    #[error("scene {scene} could not be loaded: {reason}")]
    SceneLoad { scene: i32, reason: String },
    #[error("no save-allowed snapshot has been taken yet")]
    NoSnapshot,
    #[error("snapshot does not match scene {scene}: {reason}")]
    IncompatibleSave { scene: i32, reason: String },
    #[error(transparent)]
    Save(#[from] SaveError),
}
