//! Per-state input handling and the screen layout of the interface overlays.

use bbvs_formats::{Point, Rect, INVENTORY_ITEM_COUNT};

use crate::scene::SceneRuntime;
use crate::state::{
    Cursor, GameState, InputFrame, ItemType, KeyCode, SimulationState, Verb, SCREEN_WIDTH,
};

/// Pointer distance from the screen border that counts as a scroll edge.
pub const SCROLL_EDGE: i32 = 8;

pub const VERB_ICON_SIZE: i32 = 24;
/// Icon centres relative to the right-click point, in [`Verb::ALL`] order.
const VERB_ICON_OFFSETS: [(i32, i32); 6] =
    [(0, -32), (28, -16), (28, 16), (0, 32), (-28, 16), (-28, -16)];

pub const INVENTORY_COLUMNS: usize = 7;
pub const INVENTORY_ORIGIN: Point = Point::new(20, 12);
pub const INVENTORY_CELL_WIDTH: i32 = 40;
pub const INVENTORY_CELL_HEIGHT: i32 = 36;

pub const DIALOG_TOP: i32 = 144;
pub const DIALOG_ROW_HEIGHT: i32 = 16;

pub fn verb_icon_rect(center: Point, verb: Verb) -> Rect {
    let (dx, dy) = VERB_ICON_OFFSETS[verb as usize];
    Rect::new(
        center.x + dx - VERB_ICON_SIZE / 2,
        center.y + dy - VERB_ICON_SIZE / 2,
        VERB_ICON_SIZE,
        VERB_ICON_SIZE,
    )
}

pub fn inventory_panel() -> Rect {
    let rows = INVENTORY_ITEM_COUNT.div_ceil(INVENTORY_COLUMNS) as i32;
    Rect::new(
        INVENTORY_ORIGIN.x,
        INVENTORY_ORIGIN.y,
        INVENTORY_COLUMNS as i32 * INVENTORY_CELL_WIDTH,
        rows * INVENTORY_CELL_HEIGHT,
    )
}

pub fn inventory_cell(item: usize) -> Rect {
    let column = (item % INVENTORY_COLUMNS) as i32;
    let row = (item / INVENTORY_COLUMNS) as i32;
    Rect::new(
        INVENTORY_ORIGIN.x + column * INVENTORY_CELL_WIDTH,
        INVENTORY_ORIGIN.y + row * INVENTORY_CELL_HEIGHT,
        INVENTORY_CELL_WIDTH,
        INVENTORY_CELL_HEIGHT,
    )
}

pub fn dialog_row_rect(row: usize) -> Rect {
    Rect::new(
        0,
        DIALOG_TOP + row as i32 * DIALOG_ROW_HEIGHT,
        SCREEN_WIDTH,
        DIALOG_ROW_HEIGHT,
    )
}

/// Enabled dialog slots in display order.
pub fn dialog_rows(state: &SimulationState) -> impl Iterator<Item = usize> + '_ {
    state
        .dialog_items
        .iter()
        .enumerate()
        .filter(|(_, enabled)| **enabled)
        .map(|(slot, _)| slot)
}

impl SceneRuntime<'_> {
    /// Runs one tick of the state machine for `input`.
    pub(crate) fn handle_input(&mut self, input: &InputFrame) {
        let camera = self.state.camera_pos;
        self.state.mouse_pos = Point::new(input.mouse.x + camera.x, input.mouse.y + camera.y);

        match self.state.game_state {
            GameState::Scene => self.update_scene_state(input),
            GameState::Inventory => self.update_inventory(input),
            GameState::Verbs => self.update_verbs(input),
            GameState::Dialog => {
                self.update_dialog(input);
                self.update_common();
            }
            GameState::Wait | GameState::WaitDialog => {
                self.state.cursor = Cursor::Hidden;
                if input.key == Some(KeyCode::Escape) && self.state.curr_action.is_some() {
                    self.skip_current_action();
                } else {
                    self.update_common();
                }
            }
        }
    }

    fn update_scene_state(&mut self, input: &InputFrame) {
        if matches!(input.key, Some(KeyCode::Space | KeyCode::I)) {
            self.open_inventory();
            return;
        }
        if input.right_clicked() {
            self.state.verb_pos = input.mouse;
            self.state.hovered_verb = None;
            self.state.game_state = GameState::Verbs;
            return;
        }
        self.update_dialog_conditions();
        self.update_scene(input.left_clicked());
        self.update_common();
    }

    fn open_inventory(&mut self) {
        self.state.hovered_inventory_item = None;
        self.state.game_state = GameState::Inventory;
    }

    /// Classifies what the pointer is over.
    fn hit_test(&self, pos: Point, screen: Point) -> (ItemType, usize) {
        let module = self.module;
        if let Some(index) = module.scene_exits.iter().position(|exit| exit.rect.contains(pos)) {
            return (ItemType::SceneExit, index);
        }

        let mut best: Option<(usize, i32)> = None;
        for (index, object) in self.state.objects.iter().enumerate() {
            if self.state.butthead == Some(index) {
                continue;
            }
            let Some(rect) = object.hit_rect(module) else {
                continue;
            };
            let y = object.int_pos().y;
            if rect.contains(pos) && best.map_or(true, |(_, best_y)| y > best_y) {
                best = Some((index, y));
            }
        }
        if let Some((index, _)) = best {
            return (ItemType::SceneObject, index);
        }

        if let Some(index) = module.bg_objects.iter().position(|bg| bg.rect.contains(pos)) {
            return (ItemType::BgObject, index);
        }
        if screen.x < SCROLL_EDGE || screen.x >= SCREEN_WIDTH - SCROLL_EDGE {
            return (ItemType::Scroll, 0);
        }
        (ItemType::Empty, 0)
    }

    /// Hover, cursor and click handling while the scene has control.
    fn update_scene(&mut self, clicked: bool) {
        let pos = self.state.mouse_pos;
        let screen = Point::new(pos.x - self.state.camera_pos.x, pos.y - self.state.camera_pos.y);
        let (item_type, item_index) = if self.state.curr_action.is_none() {
            self.hit_test(pos, screen)
        } else {
            (ItemType::None, 0)
        };
        self.state.active_item_type = item_type;
        self.state.active_item_index = item_index;

        let verb = self.state.curr_verb;
        self.state.cursor = match item_type {
            ItemType::SceneObject | ItemType::BgObject => Cursor::Verb {
                verb,
                highlighted: true,
            },
            ItemType::SceneExit => Cursor::Exit,
            _ if verb == Verb::Walk && !self.can_butthead_walk_to_dest(pos) => Cursor::NoWalk,
            _ => Cursor::Verb {
                verb,
                highlighted: false,
            },
        };

        if !clicked || self.state.curr_action.is_some() {
            return;
        }
        match item_type {
            ItemType::SceneObject | ItemType::BgObject => {
                if !self.start_verb_action() && verb == Verb::Walk {
                    self.walk_butthead_to(pos);
                }
            }
            ItemType::SceneExit => self.walk_butthead_to(pos),
            ItemType::Empty | ItemType::Scroll if verb == Verb::Walk => self.walk_butthead_to(pos),
            _ => {}
        }
    }

    /// Pie menu: follows the pointer while the right button is held and
    /// commits on release.
    fn update_verbs(&mut self, input: &InputFrame) {
        let center = self.state.verb_pos;
        let has_item = self.state.curr_inventory_item.is_some();
        self.state.hovered_verb = Verb::ALL
            .into_iter()
            .filter(|&verb| verb != Verb::InvItem || has_item)
            .find(|&verb| verb_icon_rect(center, verb).contains(input.mouse));

        if input.right_down() {
            return;
        }
        match self.state.hovered_verb.take() {
            Some(Verb::ShowInv) => self.open_inventory(),
            Some(verb) => {
                self.state.curr_verb = verb;
                self.state.game_state = GameState::Scene;
                self.log(format!("verb.select {}", verb.code()));
            }
            None => self.state.game_state = GameState::Scene,
        }
    }

    fn update_inventory(&mut self, input: &InputFrame) {
        let inventory = &self.state.inventory;
        self.state.hovered_inventory_item = (0..INVENTORY_ITEM_COUNT)
            .find(|&item| inventory[item] && inventory_cell(item).contains(input.mouse));

        if input.key.is_some() || input.right_clicked() {
            self.state.game_state = GameState::Scene;
            return;
        }
        if !input.left_clicked() {
            return;
        }
        if let Some(item) = self.state.hovered_inventory_item {
            self.state.curr_inventory_item = Some(item);
            self.state.curr_verb = Verb::InvItem;
            self.state.game_state = GameState::Scene;
            self.log(format!("inventory.select {item}"));
        } else if !inventory_panel().contains(input.mouse) {
            self.state.game_state = GameState::Scene;
        }
    }

    fn update_dialog(&mut self, input: &InputFrame) {
        self.state.cursor = Cursor::Verb {
            verb: Verb::Talk,
            highlighted: false,
        };
        let hovered = dialog_rows(self.state)
            .enumerate()
            .find(|&(row, _)| dialog_row_rect(row).contains(input.mouse))
            .map(|(_, slot)| slot);
        self.state.hovered_dialog_slot = hovered;

        if !input.left_clicked() {
            return;
        }
        let Some(slot) = self.state.hovered_dialog_slot else {
            return;
        };
        self.state.active_item_type = ItemType::Dialog;
        self.state.active_item_index = slot;
        self.log(format!("dialog.select {slot}"));
        if !self.start_first_matching_action(GameState::WaitDialog) {
            self.state.active_item_type = ItemType::None;
            self.state.active_item_index = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use bbvs_formats::{
        Action, ActionCommand, BgObject, CommandKind, Condition, ConditionKind, Conditions,
        SceneExit,
    };

    use super::*;
    use crate::state::{
        MOUSE_LEFT_CLICKED, MOUSE_LEFT_DOWN, MOUSE_RIGHT_CLICKED, MOUSE_RIGHT_DOWN, SCREEN_HEIGHT,
    };
    use crate::test_support::{actor_module, Harness, BEAVIS, BUTTHEAD, LAMP};

    fn frame(x: i32, y: i32, buttons: u32) -> InputFrame {
        InputFrame {
            mouse: Point::new(x, y),
            buttons,
            ..InputFrame::default()
        }
    }

    fn key(key: KeyCode) -> InputFrame {
        InputFrame {
            key: Some(key),
            ..InputFrame::default()
        }
    }

    fn look_at_bg(bg: i32) -> Action {
        Action {
            conditions: Conditions::new(vec![Condition::new(
                ConditionKind::BgObjectVerb,
                Verb::Look.code(),
                bg,
            )])
            .expect("conditions"),
            commands: vec![ActionCommand::new(CommandKind::Stop, 3)],
            ..Action::default()
        }
    }

    fn scene_harness() -> Harness {
        let mut module = actor_module();
        module.bg_objects = vec![BgObject {
            name: "door".to_string(),
            rect: Rect::new(100, 20, 30, 60),
        }];
        module.scene_exits = vec![SceneExit {
            rect: Rect::new(310, 100, 10, 100),
            new_scene_num: 4,
        }];
        module.actions = vec![look_at_bg(0)];
        let mut harness = Harness::new(module);
        harness.rt().init_scene();
        harness
    }

    #[test]
    fn left_click_on_floor_walks_butthead() {
        let mut harness = scene_harness();
        harness.rt().handle_input(&frame(120, 180, MOUSE_LEFT_CLICKED | MOUSE_LEFT_DOWN));
        assert_eq!(harness.state.active_item_type, ItemType::Empty);
        assert!(harness.state.objects[BUTTHEAD].walk_count > 0);
        assert_eq!(
            harness.state.objects[BUTTHEAD].walk_dest,
            Some(Point::new(120, 180))
        );
    }

    #[test]
    fn cursor_reports_unreachable_floor() {
        let mut harness = scene_harness();
        harness.rt().handle_input(&frame(60, 40, 0));
        assert_eq!(harness.state.cursor, Cursor::NoWalk);
        harness.rt().handle_input(&frame(60, 160, 0));
        assert_eq!(
            harness.state.cursor,
            Cursor::Verb {
                verb: Verb::Walk,
                highlighted: false
            }
        );
        harness.rt().handle_input(&frame(312, 150, 0));
        assert_eq!(harness.state.cursor, Cursor::Exit);
        assert_eq!(harness.state.active_item_type, ItemType::SceneExit);
    }

    #[test]
    fn hover_prefers_the_lowest_scene_object() {
        let mut harness = scene_harness();
        harness.state.objects[LAMP].set_int_pos(Point::new(250, 140));
        harness.rt().handle_input(&frame(250, 130, 0));
        assert_eq!(harness.state.active_item_type, ItemType::SceneObject);
        assert_eq!(harness.state.active_item_index, BEAVIS);

        harness.state.objects[LAMP].set_int_pos(Point::new(250, 160));
        harness.rt().handle_input(&frame(250, 140, 0));
        assert_eq!(harness.state.active_item_index, LAMP);
    }

    #[test]
    fn verb_menu_commits_on_release() {
        let mut harness = scene_harness();
        harness.rt().handle_input(&frame(160, 120, MOUSE_RIGHT_CLICKED | MOUSE_RIGHT_DOWN));
        assert_eq!(harness.state.game_state, GameState::Verbs);

        let look = verb_icon_rect(Point::new(160, 120), Verb::Look);
        harness.rt().handle_input(&frame(look.x + 2, look.y + 2, MOUSE_RIGHT_DOWN));
        assert_eq!(harness.state.hovered_verb, Some(Verb::Look));
        assert_eq!(harness.state.game_state, GameState::Verbs);

        harness.rt().handle_input(&frame(look.x + 2, look.y + 2, 0));
        assert_eq!(harness.state.curr_verb, Verb::Look);
        assert_eq!(harness.state.game_state, GameState::Scene);
    }

    #[test]
    fn inventory_verb_needs_a_selected_item() {
        let mut harness = scene_harness();
        harness.state.game_state = GameState::Verbs;
        harness.state.verb_pos = Point::new(160, 120);
        let inv = verb_icon_rect(Point::new(160, 120), Verb::InvItem);
        harness.rt().handle_input(&frame(inv.x + 1, inv.y + 1, 0));
        assert_eq!(harness.state.curr_verb, Verb::Walk);
        assert_eq!(harness.state.game_state, GameState::Scene);
    }

    #[test]
    fn clicking_a_held_item_selects_it() {
        let mut harness = scene_harness();
        harness.state.inventory[9] = true;
        harness.rt().handle_input(&key(KeyCode::I));
        assert_eq!(harness.state.game_state, GameState::Inventory);

        let cell = inventory_cell(9);
        harness.rt().handle_input(&frame(cell.x + 5, cell.y + 5, MOUSE_LEFT_CLICKED));
        assert_eq!(harness.state.curr_inventory_item, Some(9));
        assert_eq!(harness.state.curr_verb, Verb::InvItem);
        assert_eq!(harness.state.game_state, GameState::Scene);
    }

    #[test]
    fn clicking_an_empty_cell_keeps_the_inventory_open() {
        let mut harness = scene_harness();
        harness.rt().handle_input(&key(KeyCode::Space));
        let cell = inventory_cell(3);
        harness.rt().handle_input(&frame(cell.x + 5, cell.y + 5, MOUSE_LEFT_CLICKED));
        assert_eq!(harness.state.game_state, GameState::Inventory);
        harness.rt().handle_input(&frame(2, 2, MOUSE_LEFT_CLICKED));
        assert_eq!(harness.state.game_state, GameState::Scene);
    }

    #[test]
    fn verb_on_background_object_starts_its_action_and_escape_skips_it() {
        let mut harness = scene_harness();
        harness.state.curr_verb = Verb::Look;
        harness.rt().handle_input(&frame(110, 30, MOUSE_LEFT_CLICKED));
        assert_eq!(harness.state.curr_action, Some(0));
        assert_eq!(harness.state.game_state, GameState::Wait);

        harness.rt().handle_input(&frame(110, 30, 0));
        assert_eq!(harness.state.cursor, Cursor::Hidden);
        assert!(harness.state.curr_action.is_some());

        harness.rt().handle_input(&key(KeyCode::Escape));
        assert_eq!(harness.state.curr_action, None);
        assert_eq!(harness.state.game_state, GameState::Scene);
    }

    #[test]
    fn dialog_click_runs_the_matching_line() {
        let mut harness = scene_harness();
        let line = |slot: i32| Action {
            conditions: Conditions::new(vec![Condition::new(ConditionKind::IsDialogItem, slot, 0)])
                .expect("conditions"),
            commands: vec![ActionCommand::new(CommandKind::Stop, 0)],
            ..Action::default()
        };
        harness.module.actions = vec![line(2), line(5)];
        harness.rt().update_dialog_conditions();
        harness.state.game_state = GameState::Dialog;

        let second_row = dialog_row_rect(1);
        harness.rt().handle_input(&frame(10, second_row.y + 2, MOUSE_LEFT_CLICKED));
        assert_eq!(harness.state.active_item_type, ItemType::Dialog);
        assert_eq!(harness.state.curr_action, None, "stop-only line finishes at once");
        assert!(harness.events.iter().any(|event| event == "action.start 1"));
        assert!(harness.events.iter().any(|event| event == "dialog.select 5"));
    }

    #[test]
    fn overlay_layout_fits_the_screen() {
        let screen = Rect::new(0, 0, SCREEN_WIDTH, SCREEN_HEIGHT);
        assert!(screen.contains(Point::new(
            inventory_panel().right() - 1,
            inventory_panel().bottom() - 1
        )));
        assert_eq!(inventory_cell(7), Rect::new(20, 48, 40, 36));
    }
}
