use bbvs_formats::{
    GameModule, Point, Rect, DIALOG_ITEM_COUNT, GAME_VARS_COUNT, INVENTORY_ITEM_COUNT,
    SCENE_OBJECTS_COUNT, SCENE_VISITED_COUNT,
};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Scene object positions are 16.16 fixed point.
pub const FIXED_SHIFT: u32 = 16;
pub const FIXED_FRACTION_MASK: i32 = 0xFFFF;
/// Half-pixel bias applied when a walk starts so arrival lands on the target.
pub const FIXED_HALF: i32 = 0x8000;

/// Logical tick quantum in milliseconds.
pub const TICK_MS: u32 = 17;
/// Upper bound on ticks simulated for a single wall-clock frame.
pub const MAX_CATCH_UP_TICKS: u32 = 20;

pub const WALK_AREAS_CAPACITY: usize = 80;
pub const WALK_INFOS_CAPACITY: usize = 256;
pub const WALK_AREA_LINKS_CAPACITY: usize = 16;
pub const WALKABLE_RECTS_CAPACITY: usize = 256;

/// Search budgets at or below this value cap the walk search at
/// [`SHORT_SEARCH_HOP_LIMIT`] hops.
pub const SHORT_SEARCH_BUDGET: i32 = 320;
pub const SHORT_SEARCH_HOP_LIMIT: usize = 20;

/// Reference walk speed; a def speed of 120 moves roughly one pixel per tick.
pub const WALK_SPEED_UNIT: f32 = 120.0;
/// Ticks between two octant steps of a turn.
pub const TURN_COOLDOWN_TICKS: i32 = 4;
/// Flag set in `turn_count` while a turn towards `turn_count & 0x7F` runs.
pub const TURN_PENDING: i32 = 0x80;

pub const SCREEN_WIDTH: i32 = 320;
pub const SCREEN_HEIGHT: i32 = 240;

/// Only the first cameras of a scene are candidates for the initial view.
pub const INITIAL_CAMERA_CANDIDATES: usize = 4;

/// Tick budget for fast-forwarding a skipped action.
pub const SKIP_TICK_LIMIT: u32 = 10_000;

pub const MOUSE_LEFT_CLICKED: u32 = 0x01;
pub const MOUSE_RIGHT_CLICKED: u32 = 0x02;
pub const MOUSE_LEFT_DOWN: u32 = 0x04;
pub const MOUSE_RIGHT_DOWN: u32 = 0x08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Verb {
    Look = 0,
    Use = 1,
    Talk = 2,
    Walk = 3,
    InvItem = 4,
    ShowInv = 5,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Look,
        Verb::Use,
        Verb::Talk,
        Verb::Walk,
        Verb::InvItem,
        Verb::ShowInv,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ItemType {
    #[default]
    None = 0,
    Empty = 1,
    SceneObject = 2,
    BgObject = 3,
    Dialog = 4,
    Scroll = 5,
    SceneExit = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum GameState {
    #[default]
    Scene = 0,
    Inventory = 1,
    Verbs = 2,
    Wait = 3,
    Dialog = 4,
    WaitDialog = 5,
}

impl GameState {
    /// States in which the engine refreshes its save snapshot.
    pub fn allows_save(self) -> bool {
        matches!(self, GameState::Scene | GameState::Inventory | GameState::Dialog)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCode {
    Space,
    I,
    Escape,
    Other,
}

/// Host input sampled for one logical tick. `mouse` is in screen space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    #[serde(default)]
    pub mouse: Point,
    #[serde(default)]
    pub buttons: u32,
    #[serde(default)]
    pub key: Option<KeyCode>,
    #[serde(default)]
    pub quit: bool,
}

impl InputFrame {
    pub fn left_clicked(&self) -> bool {
        self.buttons & MOUSE_LEFT_CLICKED != 0
    }

    pub fn right_clicked(&self) -> bool {
        self.buttons & MOUSE_RIGHT_CLICKED != 0
    }

    pub fn right_down(&self) -> bool {
        self.buttons & MOUSE_RIGHT_DOWN != 0
    }
}

/// Which pointer the draw list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cursor {
    #[default]
    Hidden,
    Verb { verb: Verb, highlighted: bool },
    NoWalk,
    Exit,
}

/// Mutable per-scene actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Bound `SceneObjectDef`, set for every def of the loaded scene.
    pub def_index: Option<usize>,
    /// Current animation; `None` hides the object and excludes it from play.
    pub anim_index: Option<usize>,
    pub x: i32,
    pub y: i32,
    pub frame_index: usize,
    pub frame_ticks: i32,
    pub walk_count: i32,
    pub x_incr: i32,
    pub y_incr: i32,
    pub turn_value: usize,
    pub turn_count: i32,
    pub turn_ticks: i32,
    /// Final destination of a pathfinding walk still in progress.
    pub walk_dest: Option<Point>,
}

impl SceneObject {
    pub fn int_pos(&self) -> Point {
        Point::new(self.x >> FIXED_SHIFT, self.y >> FIXED_SHIFT)
    }

    pub fn set_int_pos(&mut self, pos: Point) {
        self.x = pos.x << FIXED_SHIFT;
        self.y = pos.y << FIXED_SHIFT;
    }

    pub fn has_anim(&self) -> bool {
        self.anim_index.is_some()
    }

    /// Switches to `anim_index` so the next tick shows its first frame.
    pub fn set_anim(&mut self, module: &GameModule, anim_index: usize) {
        self.anim_index = Some(anim_index);
        self.frame_index = module.animation(anim_index).frame_count().saturating_sub(1);
        self.frame_ticks = 1;
    }

    /// Frame rectangle 1 (hit test) in world space.
    pub fn hit_rect(&self, module: &GameModule) -> Option<Rect> {
        let anim = module.animation(self.anim_index?);
        let pos = self.int_pos();
        Some(anim.frame(self.frame_index).rect1.translate(pos.x, pos.y))
    }

    /// Frame rectangle 2 (footprint) in world space.
    pub fn footprint(&self, module: &GameModule) -> Option<Rect> {
        let anim = module.animation(self.anim_index?);
        let pos = self.int_pos();
        Some(anim.frame(self.frame_index).rect2.translate(pos.x, pos.y))
    }
}

/// Walk/turn intent batched while an action waits on its timestamp-0 moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneObjectAction {
    pub scene_object_index: usize,
    pub animation_index: i32,
    pub walk_dest: Option<Point>,
}

/// Everything the interpreter mutates; the module tables stay read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationState {
    pub scene_num: i32,
    pub prev_scene_num: i32,
    pub new_scene_num: Option<i32>,
    pub game_state: GameState,
    pub game_ticks: u32,

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

    pub active_item_type: ItemType,
    pub active_item_index: usize,
    /// World-space pointer position.
    pub mouse_pos: Point,
    pub cursor: Cursor,
    /// Screen-space centre of the verb menu.
    pub verb_pos: Point,
    pub hovered_verb: Option<Verb>,
    pub hovered_inventory_item: Option<usize>,
    pub hovered_dialog_slot: Option<usize>,

    pub objects: Vec<SceneObject>,
    pub butthead: Option<usize>,
    pub beavis: Option<usize>,
    pub walkable_rects: Vec<Rect>,
    pub walk_area_actions: Vec<usize>,

    pub curr_action: Option<usize>,
    pub curr_action_command_index: usize,
    pub curr_action_command_time_stamp: u32,
    pub scene_object_actions: Vec<SceneObjectAction>,
    /// Set while a skipped action is fast-forwarded.
    pub skip_mode: bool,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationState {
    pub fn new() -> Self {
        Self {
            scene_num: 0,
            prev_scene_num: 0,
            new_scene_num: None,
            game_state: GameState::Scene,
            game_ticks: 0,
            curr_verb: Verb::Walk,
            curr_inventory_item: None,
            inventory: vec![false; INVENTORY_ITEM_COUNT],
            game_vars: vec![false; GAME_VARS_COUNT],
            scene_visited: vec![false; SCENE_VISITED_COUNT],
            dialog_items: vec![false; DIALOG_ITEM_COUNT],
            dialog_slot_count: 0,
            curr_camera_num: 0,
            camera_pos: Point::default(),
            new_camera_pos: Point::default(),
            curr_talk_obj_index: None,
            background_sound_playing: false,
            active_item_type: ItemType::None,
            active_item_index: 0,
            mouse_pos: Point::default(),
            cursor: Cursor::Hidden,
            verb_pos: Point::default(),
            hovered_verb: None,
            hovered_inventory_item: None,
            hovered_dialog_slot: None,
            objects: vec![SceneObject::default(); SCENE_OBJECTS_COUNT],
            butthead: None,
            beavis: None,
            walkable_rects: Vec::new(),
            walk_area_actions: Vec::new(),
            curr_action: None,
            curr_action_command_index: 0,
            curr_action_command_time_stamp: 0,
            scene_object_actions: Vec::new(),
            skip_mode: false,
        }
    }

    pub fn object(&self, index: usize) -> &SceneObject {
        &self.objects[index]
    }

    pub fn object_mut(&mut self, index: usize) -> &mut SceneObject {
        &mut self.objects[index]
    }

    /// Whether `index` names one of the two player-controlled actors.
    pub fn is_privileged(&self, index: usize) -> bool {
        self.butthead == Some(index) || self.beavis == Some(index)
    }

    /// The privileged actor that is not `index`.
    pub fn other_privileged(&self, index: usize) -> Option<usize> {
        if self.butthead == Some(index) {
            self.beavis
        } else if self.beavis == Some(index) {
            self.butthead
        } else {
            None
        }
    }

    pub fn butthead_pos(&self) -> Option<Point> {
        self.butthead.map(|index| self.objects[index].int_pos())
    }

    pub fn inventory_held(&self, item: i32) -> bool {
        flag(&self.inventory, item)
    }

    pub fn game_var(&self, var: i32) -> bool {
        flag(&self.game_vars, var)
    }

    pub fn scene_visited(&self, scene_num: i32) -> bool {
        flag(&self.scene_visited, scene_num)
    }

    pub fn reset_action(&mut self) {
        self.curr_action = None;
        self.curr_action_command_index = 0;
        self.curr_action_command_time_stamp = 0;
        self.scene_object_actions.clear();
    }

    pub fn begin_action(&mut self, action_index: usize) {
        self.reset_action();
        self.curr_action = Some(action_index);
    }
}

fn flag(flags: &[bool], index: i32) -> bool {
    usize::try_from(index)
        .ok()
        .and_then(|index| flags.get(index).copied())
        .unwrap_or(false)
}

pub(crate) fn set_flag(flags: &mut [bool], index: i32, value: bool) {
    if let Some(slot) = usize::try_from(index)
        .ok()
        .and_then(|index| flags.get_mut(index))
    {
        *slot = value;
    }
}
