//! Snapshot of the mutable simulation state for manual and continue saves.

use bbvs_formats::{
    GameModule, Point, DIALOG_ITEM_COUNT, GAME_VARS_COUNT, INVENTORY_ITEM_COUNT,
    SCENE_OBJECTS_COUNT, SCENE_VISITED_COUNT,
};
use bbvs_save::{SaveKind, SaveSummary};
use serde::{Deserialize, Serialize};

use crate::state::{GameState, SceneObject, SimulationState, Verb};

/// Field set written to a save payload.
///
/// Derived data (walkable rects, walk-area graph, privileged actor indices)
/// is rebuilt from the scene module on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    pub scene_num: i32,
    pub prev_scene_num: i32,
    pub game_state: GameState,
    pub curr_verb: Verb,
    pub curr_inventory_item: Option<usize>,
    pub inventory: Vec<bool>,
    pub game_vars: Vec<bool>,
    pub scene_visited: Vec<bool>,
    pub dialog_items: Vec<bool>,
    pub dialog_slot_count: usize,
    pub curr_camera_num: usize,
    pub camera_pos: Point,
    pub new_camera_pos: Point,
    pub curr_talk_obj_index: Option<usize>,
    pub background_sound_playing: bool,
    pub walk_area_actions: Vec<usize>,
    pub objects: Vec<SceneObject>,
    pub game_ticks: u32,
}

impl SaveState {
    pub fn capture(state: &SimulationState) -> Self {
        Self {
            scene_num: state.scene_num,
            prev_scene_num: state.prev_scene_num,
            game_state: state.game_state,
            curr_verb: state.curr_verb,
            curr_inventory_item: state.curr_inventory_item,
            inventory: state.inventory.clone(),
            game_vars: state.game_vars.clone(),
            scene_visited: state.scene_visited.clone(),
            dialog_items: state.dialog_items.clone(),
            dialog_slot_count: state.dialog_slot_count,
            curr_camera_num: state.curr_camera_num,
            camera_pos: state.camera_pos,
            new_camera_pos: state.new_camera_pos,
            curr_talk_obj_index: state.curr_talk_obj_index,
            background_sound_playing: state.background_sound_playing,
            walk_area_actions: state.walk_area_actions.clone(),
            objects: state.objects.clone(),
            game_ticks: state.game_ticks,
        }
    }

    /// Checks the snapshot against the tables of the scene it names.
    pub fn validate(&self, module: &GameModule) -> Result<(), String> {
        let lengths = [
            ("inventory", self.inventory.len(), INVENTORY_ITEM_COUNT),
            ("game vars", self.game_vars.len(), GAME_VARS_COUNT),
            ("visited flags", self.scene_visited.len(), SCENE_VISITED_COUNT),
            ("dialog items", self.dialog_items.len(), DIALOG_ITEM_COUNT),
            ("objects", self.objects.len(), SCENE_OBJECTS_COUNT),
        ];
        for (name, actual, expected) in lengths {
            if actual != expected {
                return Err(format!("{name} table holds {actual} entries, expected {expected}"));
            }
        }
        if self.curr_camera_num >= module.camera_inits.len() {
            return Err(format!("camera {} does not exist", self.curr_camera_num));
        }
        if let Some(&action) = self
            .walk_area_actions
            .iter()
            .find(|&&action| action >= module.actions.len())
        {
            return Err(format!("walk-area action {action} does not exist"));
        }
        for (index, object) in self.objects.iter().enumerate() {
            if object
                .anim_index
                .is_some_and(|anim| anim >= module.animations.len())
            {
                return Err(format!("object {index} plays a missing animation"));
            }
            if object
                .def_index
                .is_some_and(|def| def >= module.scene_object_defs.len())
            {
                return Err(format!("object {index} is bound to a missing def"));
            }
        }
        Ok(())
    }

    /// Copies the snapshot over `state`, leaving per-tick interface fields
    /// and the action interpreter reset.
    pub fn restore(&self, state: &mut SimulationState) {
        state.scene_num = self.scene_num;
        state.prev_scene_num = self.prev_scene_num;
        state.new_scene_num = None;
        state.game_state = self.game_state;
        state.curr_verb = self.curr_verb;
        state.curr_inventory_item = self.curr_inventory_item;
        state.inventory.clone_from(&self.inventory);
        state.game_vars.clone_from(&self.game_vars);
        state.scene_visited.clone_from(&self.scene_visited);
        state.dialog_items.clone_from(&self.dialog_items);
        state.dialog_slot_count = self.dialog_slot_count;
        state.curr_camera_num = self.curr_camera_num;
        state.camera_pos = self.camera_pos;
        state.new_camera_pos = self.new_camera_pos;
        state.curr_talk_obj_index = self.curr_talk_obj_index;
        state.background_sound_playing = self.background_sound_playing;
        state.walk_area_actions.clone_from(&self.walk_area_actions);
        state.objects.clone_from(&self.objects);
        state.game_ticks = self.game_ticks;
        state.reset_action();
        state.skip_mode = false;
    }

    pub fn summary(&self, kind: SaveKind) -> SaveSummary {
        SaveSummary {
            kind,
            scene_num: self.scene_num,
            game_ticks: self.game_ticks,
        }
    }
}
