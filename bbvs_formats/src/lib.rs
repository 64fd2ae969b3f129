pub mod geometry;
pub mod module;
pub mod tables;

pub use geometry::{Point, Rect, rect_subtract};
pub use module::{
    Animation, AnimationFrame, BgObject, BgSprite, CameraInit, CameraLink, DIALOG_ITEM_COUNT,
    GAME_VARS_COUNT, GameModule, INVENTORY_ITEM_COUNT, SCENE_OBJECTS_COUNT, SCENE_VISITED_COUNT,
    SceneExit, SceneLibrary, SceneObjectDef, SceneObjectInit, SceneSound, scene_file_name,
};
pub use tables::{
    Action, ActionCommand, ActionResult, ActionResults, CommandKind, Condition, ConditionKind,
    Conditions, RawSlot, ResultKind, SLOT_COUNT, Slot, SlotKind, SlotList,
};
