//! Condition evaluators and result application.
//!
//! All three evaluators walk the populated slots in order. They differ in
//! which kinds are meaningful and in how a slot's outcome ends the walk.

use bbvs_formats::{ActionResults, Condition, ConditionKind, Conditions, GameModule, ResultKind};

use crate::state::{set_flag, GameState, ItemType, SimulationState, Verb};

/// Result of [`eval_dialog_condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogSlot {
    Fail,
    Slot(usize),
}

/// AND over every slot, stopping at the first failure.
pub fn eval_condition(state: &SimulationState, module: &GameModule, conditions: &Conditions) -> bool {
    conditions
        .iter()
        .all(|condition| eval_condition_slot(state, module, condition))
}

fn eval_condition_slot(state: &SimulationState, module: &GameModule, condition: &Condition) -> bool {
    let v1 = condition.value1;
    let v2 = condition.value2;
    match condition.kind {
        ConditionKind::SceneObjectVerb => {
            state.active_item_type == ItemType::SceneObject
                && v1 == state.curr_verb.code()
                && is_active_index(state, v2)
        }
        ConditionKind::BgObjectVerb => {
            state.active_item_type == ItemType::BgObject
                && v1 == state.curr_verb.code()
                && is_active_index(state, v2)
        }
        ConditionKind::SceneObjectInventory => {
            state.active_item_type == ItemType::SceneObject
                && state.curr_verb == Verb::InvItem
                && is_curr_inventory_item(state, v1)
                && is_active_index(state, v2)
        }
        ConditionKind::BgObjectInventory => {
            state.active_item_type == ItemType::BgObject
                && state.curr_verb == Verb::InvItem
                && is_curr_inventory_item(state, v1)
                && is_active_index(state, v2)
        }
        ConditionKind::IsCurrTalkObject => {
            state.curr_talk_obj_index.map(|index| index as i32) == Some(v2)
        }
        ConditionKind::IsDialogItem => {
            state.active_item_type == ItemType::Dialog && is_active_index(state, v1)
        }
        ConditionKind::IsCameraNum => v1 == state.curr_camera_num as i32,
        ConditionKind::IsButtheadAtBgObject => {
            let (Some(pos), Ok(bg_index)) = (state.butthead_pos(), usize::try_from(v2)) else {
                return false;
            };
            module
                .bg_objects
                .get(bg_index)
                .is_some_and(|bg_object| bg_object.rect.contains(pos))
        }
        ConditionKind::Unused | ConditionKind::DialogItem0 | ConditionKind::IsCameraNumTransition => {
            false
        }
        _ => eval_state_slot(state, condition).unwrap_or(false),
    }
}

/// Kinds that only read persistent game state; shared by all evaluators.
fn eval_state_slot(state: &SimulationState, condition: &Condition) -> Option<bool> {
    let v1 = condition.value1;
    let v2 = condition.value2;
    let passed = match condition.kind {
        ConditionKind::HasInventoryItem => state.inventory_held(v1),
        ConditionKind::HasNotInventoryItem => !state.inventory_held(v1),
        ConditionKind::IsGameVar => state.game_var(v2),
        ConditionKind::IsNotGameVar => !state.game_var(v2),
        ConditionKind::IsPrevSceneNum => v2 == state.prev_scene_num,
        ConditionKind::IsNotPrevSceneNum => v2 != state.prev_scene_num,
        ConditionKind::IsSceneVisited => state.scene_visited(state.scene_num),
        ConditionKind::IsNotSceneVisited => !state.scene_visited(state.scene_num),
        _ => return None,
    };
    Some(passed)
}

/// Evaluator used for camera-keyed scene sounds; `camera` is the camera
/// number being tested.
pub fn eval_camera_condition(state: &SimulationState, conditions: &Conditions, camera: usize) -> bool {
    conditions.iter().all(|condition| match condition.kind {
        ConditionKind::IsCameraNumTransition => condition.value1 == camera as i32,
        _ => eval_state_slot(state, condition).unwrap_or(false),
    })
}

/// Picks the dialog slot an action offers.
///
/// `IsDialogItem` records its slot without testing it, `DialogItem0`
/// returns slot 0 at once, and any other failing or unsupported slot fails
/// the whole list.
pub fn eval_dialog_condition(state: &SimulationState, conditions: &Conditions) -> DialogSlot {
    let mut slot = None;
    for condition in conditions.iter() {
        match condition.kind {
            ConditionKind::IsDialogItem => slot = usize::try_from(condition.value1).ok(),
            ConditionKind::DialogItem0 => return DialogSlot::Slot(0),
            ConditionKind::IsCurrTalkObject => {
                if state.curr_talk_obj_index.map(|index| index as i32) != Some(condition.value2) {
                    return DialogSlot::Fail;
                }
            }
            ConditionKind::IsCameraNum => {
                if condition.value1 != state.curr_camera_num as i32 {
                    return DialogSlot::Fail;
                }
            }
            _ => {
                if !eval_state_slot(state, condition).unwrap_or(false) {
                    return DialogSlot::Fail;
                }
            }
        }
    }
    slot.map_or(DialogSlot::Fail, DialogSlot::Slot)
}

/// Applies an action's results in slot order.
pub fn eval_action_results(state: &mut SimulationState, results: &ActionResults) {
    for result in results.iter() {
        let v1 = result.value1;
        let v2 = result.value2;
        match result.kind {
            ResultKind::AddInventoryItem => {
                set_flag(&mut state.inventory, v1, true);
                state.curr_verb = Verb::InvItem;
                state.curr_inventory_item = usize::try_from(v1).ok();
            }
            ResultKind::RemoveInventoryItem => {
                set_flag(&mut state.inventory, v1, false);
                if is_curr_inventory_item(state, v1) {
                    state.curr_inventory_item = None;
                    state.curr_verb = Verb::Look;
                }
            }
            ResultKind::SetGameVar => set_flag(&mut state.game_vars, v2, true),
            ResultKind::UnsetGameVar => set_flag(&mut state.game_vars, v2, false),
            ResultKind::StartDialog => state.game_state = GameState::Dialog,
            ResultKind::ChangeScene => state.new_scene_num = Some(v2),
        }
    }
}

fn is_active_index(state: &SimulationState, value: i32) -> bool {
    value >= 0 && state.active_item_index == value as usize
}

fn is_curr_inventory_item(state: &SimulationState, value: i32) -> bool {
    state.curr_inventory_item.map(|item| item as i32) == Some(value)
}
