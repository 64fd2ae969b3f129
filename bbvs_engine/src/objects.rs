//! Per-object walk interpolation, octant turning and frame timing.

use bbvs_formats::{GameModule, Point};

use crate::state::{
    SceneObject, FIXED_FRACTION_MASK, FIXED_HALF, TURN_COOLDOWN_TICKS, TURN_PENDING,
    WALK_SPEED_UNIT,
};

/// Def animation slot showing the standing/turn pose for each direction.
pub const WALK_TURN_TABLE: [usize; 8] = [7, 9, 4, 8, 6, 10, 5, 11];

/// Def animation slot of the walk cycle for each direction.
pub const WALK_ANIM_TABLE: [usize; 8] = [3, 0, 0, 0, 2, 1, 1, 1];

/// Direction implied by each of the first twelve def animation slots.
pub const ANIM_SLOT_TURN_VALUES: [usize; 12] = [2, 6, 4, 0, 2, 6, 4, 0, 2, 6, 4, 0];

/// Step to take from direction `row` towards target column; `0` means done.
pub const TURN_INFO: [[i32; 8]; 8] = [
    [0, 1, 1, 1, 1, -1, -1, -1],
    [-1, 0, 1, 1, 1, 1, -1, -1],
    [-1, -1, 0, 1, 1, 1, 1, -1],
    [-1, -1, -1, 0, 1, 1, 1, 1],
    [1, -1, -1, -1, 0, 1, 1, 1],
    [1, 1, -1, -1, -1, 0, 1, 1],
    [1, 1, 1, -1, -1, -1, 0, 1],
    [1, 1, 1, 1, -1, -1, -1, 0],
];

/// Starts a straight-line walk towards `dest`.
///
/// A zero-length walk leaves `walk_count` at 0. The position is re-biased to
/// half a pixel so the truncated increments land exactly on `dest`.
pub fn walk_object(object: &mut SceneObject, dest: Point, speed: i32) {
    let pos = object.int_pos();
    let dx = (dest.x - pos.x) as f32;
    let dy = (dest.y - pos.y) as f32;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance == 0.0 {
        object.walk_count = 0;
        return;
    }
    let per_step = (dx.abs() / distance + 1.0) * (speed as f32 / WALK_SPEED_UNIT);
    let steps = ((distance / per_step) as i32).max(1);
    object.walk_count = steps;
    object.x_incr = (dx / steps as f32 * 65536.0) as i32;
    object.y_incr = (dy / steps as f32 * 65536.0) as i32;
    object.x = (object.x & !FIXED_FRACTION_MASK) | FIXED_HALF;
    object.y = (object.y & !FIXED_FRACTION_MASK) | FIXED_HALF;
}

/// Advances one walk step if a walk is running.
pub fn step_walk(object: &mut SceneObject) {
    if object.walk_count > 0 {
        object.x += object.x_incr;
        object.y += object.y_incr;
        object.walk_count -= 1;
    }
}

/// Completes the remaining walk steps at once.
pub fn finish_walk(object: &mut SceneObject) {
    if object.walk_count > 0 {
        object.x += object.x_incr * object.walk_count;
        object.y += object.y_incr * object.walk_count;
        object.walk_count = 0;
    }
}

/// Direction of travel for the current increments.
fn heading(x_incr: i32, y_incr: i32) -> usize {
    if x_incr.abs() <= y_incr.abs() {
        if y_incr >= 0 {
            0
        } else {
            4
        }
    } else if x_incr >= 0 {
        6
    } else {
        2
    }
}

/// Picks the walk cycle while moving and the standing pose otherwise.
pub fn update_walk_object(object: &mut SceneObject, module: &GameModule) {
    let Some(def_index) = object.def_index else {
        return;
    };
    let def = module.scene_object_def(def_index);
    let moving = object.walk_count > 0 && (object.x_incr != 0 || object.y_incr != 0);
    let anim = if moving {
        object.turn_value = heading(object.x_incr, object.y_incr);
        object.turn_count = 0;
        object.turn_ticks = 0;
        def.anim_index(WALK_ANIM_TABLE[object.turn_value])
    } else {
        def.anim_index(WALK_TURN_TABLE[object.turn_value])
    };
    apply_pose(object, module, anim);
}

/// Runs one tick of an octant turn towards `turn_count & 0x7F`.
pub fn turn_object(object: &mut SceneObject, module: &GameModule) {
    if object.turn_ticks > 0 {
        object.turn_ticks -= 1;
        return;
    }
    let target = (object.turn_count & 0x7F) as usize & 7;
    let step = TURN_INFO[object.turn_value][target];
    if step == 0 {
        object.turn_count = 0;
        return;
    }
    object.turn_value = (object.turn_value as i32 + step).rem_euclid(8) as usize;
    if let Some(def_index) = object.def_index {
        let anim = module
            .scene_object_def(def_index)
            .anim_index(WALK_TURN_TABLE[object.turn_value]);
        if anim != 0 {
            object.set_anim(module, anim as usize);
        }
    }
    object.turn_ticks = TURN_COOLDOWN_TICKS;
}

/// Completes a pending turn at once.
pub fn finish_turn(object: &mut SceneObject, module: &GameModule) {
    if object.turn_count == 0 {
        return;
    }
    object.turn_value = (object.turn_count & 7) as usize;
    object.turn_count = 0;
    object.turn_ticks = 0;
    if let Some(def_index) = object.def_index {
        let anim = module
            .scene_object_def(def_index)
            .anim_index(WALK_TURN_TABLE[object.turn_value]);
        if anim != 0 {
            object.set_anim(module, anim as usize);
        }
    }
}

/// Sets up a turn that ends on the pose `anim_index`, if that animation is
/// one of the object's turn poses.
pub fn begin_turn_to_anim(object: &mut SceneObject, module: &GameModule, anim_index: i32) -> bool {
    let Some(def_index) = object.def_index else {
        return false;
    };
    let def = module.scene_object_def(def_index);
    match WALK_TURN_TABLE
        .iter()
        .position(|&slot| def.anim_index(slot) == anim_index)
    {
        Some(direction) => {
            object.turn_count = direction as i32 | TURN_PENDING;
            object.turn_ticks = 0;
            true
        }
        None => false,
    }
}

/// Derives `turn_value` from the direction slot holding the current animation.
pub fn update_object_turn_value(object: &mut SceneObject, module: &GameModule) {
    object.turn_value = 0;
    let (Some(def_index), Some(anim_index)) = (object.def_index, object.anim_index) else {
        return;
    };
    let def = module.scene_object_def(def_index);
    if let Some(slot) = (0..ANIM_SLOT_TURN_VALUES.len()).find(|&slot| def.anim_index(slot) == anim_index as i32) {
        object.turn_value = ANIM_SLOT_TURN_VALUES[slot];
    }
}

/// Counts down the frame timer and moves to the next frame when it expires.
pub fn advance_animation(object: &mut SceneObject, module: &GameModule) {
    let Some(anim_index) = object.anim_index else {
        return;
    };
    object.frame_ticks -= 1;
    if object.frame_ticks > 0 {
        return;
    }
    let anim = module.animation(anim_index);
    object.frame_index = (object.frame_index + 1) % anim.frame_count().max(1);
    object.frame_ticks = anim.frame(object.frame_index).ticks;
}

fn apply_pose(object: &mut SceneObject, module: &GameModule, anim: i32) {
    if object.anim_index.map(|index| index as i32) == Some(anim) {
        return;
    }
    if anim == 0 {
        object.anim_index = None;
    } else {
        object.set_anim(module, anim as usize);
    }
}
