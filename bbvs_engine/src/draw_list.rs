//! Builds the per-frame sprite list the host renders.

use bbvs_formats::{GameModule, Point};
use serde::Serialize;

use crate::host::DrawSink;
use crate::input::{
    dialog_row_rect, dialog_rows, inventory_cell, inventory_panel, verb_icon_rect, DIALOG_TOP,
};
use crate::state::{Cursor, GameState, SimulationState, Verb};

pub const OVERLAY_PRIORITY: i32 = 500;
pub const CURSOR_PRIORITY: i32 = 1000;

// Indices into the module's GUI sprite table.
const GUI_VERB_CURSOR: usize = 0;
const GUI_VERB_CURSOR_HIGHLIGHTED: usize = 6;
const GUI_NO_WALK_CURSOR: usize = 12;
const GUI_EXIT_CURSOR: usize = 13;
const GUI_VERB_ICON: usize = 14;
const GUI_VERB_ICON_HIGHLIGHTED: usize = 20;
const GUI_INVENTORY_BACKGROUND: usize = 26;
const GUI_DIALOG_BACKGROUND: usize = 27;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawItem {
    pub sprite_index: i32,
    pub x: i32,
    pub y: i32,
    pub priority: i32,
}

/// [`DrawSink`] that keeps the items for inspection.
#[derive(Debug, Default, Clone)]
pub struct DrawList {
    items: Vec<DrawItem>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in paint order; equal priorities keep submission order.
    pub fn sorted(&self) -> Vec<DrawItem> {
        let mut items = self.items.clone();
        items.sort_by_key(|item| item.priority);
        items
    }
}

impl DrawSink for DrawList {
    fn add(&mut self, sprite_index: i32, x: i32, y: i32, priority: i32) {
        self.items.push(DrawItem {
            sprite_index,
            x,
            y,
            priority,
        });
    }
}

pub fn build_draw_list(state: &SimulationState, module: &GameModule, sink: &mut dyn DrawSink) {
    let camera = state.camera_pos;

    for object in &state.objects {
        let Some(anim_index) = object.anim_index else {
            continue;
        };
        let frame = module.animation(anim_index).frame(object.frame_index);
        let pos = object.int_pos();
        sink.add(frame.sprite_index, pos.x - camera.x, pos.y - camera.y, pos.y);
    }

    for bg_sprite in &module.bg_sprites {
        sink.add(bg_sprite.sprite_index, -camera.x, -camera.y, bg_sprite.priority);
    }

    match state.game_state {
        GameState::Verbs => add_verb_menu(state, module, sink),
        GameState::Inventory => add_inventory(state, module, sink),
        GameState::Dialog => add_dialog(state, module, sink),
        _ => {}
    }

    if matches!(state.game_state, GameState::Wait | GameState::WaitDialog) {
        return;
    }
    let sprite = match state.cursor {
        Cursor::Hidden => return,
        Cursor::Verb {
            verb: Verb::InvItem,
            highlighted,
        } => match state.curr_inventory_item {
            Some(item) => module.inventory_item_sprite(item, highlighted),
            None => return,
        },
        Cursor::Verb { verb, highlighted } => {
            let base = if highlighted {
                GUI_VERB_CURSOR_HIGHLIGHTED
            } else {
                GUI_VERB_CURSOR
            };
            module.gui_sprite(base + verb as usize)
        }
        Cursor::NoWalk => module.gui_sprite(GUI_NO_WALK_CURSOR),
        Cursor::Exit => module.gui_sprite(GUI_EXIT_CURSOR),
    };
    let screen = Point::new(state.mouse_pos.x - camera.x, state.mouse_pos.y - camera.y);
    sink.add(sprite, screen.x, screen.y, CURSOR_PRIORITY);
}

fn add_verb_menu(state: &SimulationState, module: &GameModule, sink: &mut dyn DrawSink) {
    for verb in Verb::ALL {
        if verb == Verb::InvItem && state.curr_inventory_item.is_none() {
            continue;
        }
        let base = if state.hovered_verb == Some(verb) {
            GUI_VERB_ICON_HIGHLIGHTED
        } else {
            GUI_VERB_ICON
        };
        let rect = verb_icon_rect(state.verb_pos, verb);
        sink.add(module.gui_sprite(base + verb as usize), rect.x, rect.y, OVERLAY_PRIORITY);
    }
}

fn add_inventory(state: &SimulationState, module: &GameModule, sink: &mut dyn DrawSink) {
    let panel = inventory_panel();
    sink.add(
        module.gui_sprite(GUI_INVENTORY_BACKGROUND),
        panel.x,
        panel.y,
        OVERLAY_PRIORITY,
    );
    for (item, _) in state.inventory.iter().enumerate().filter(|(_, held)| **held) {
        let cell = inventory_cell(item);
        let highlighted = state.hovered_inventory_item == Some(item);
        sink.add(
            module.inventory_item_sprite(item, highlighted),
            cell.x,
            cell.y,
            OVERLAY_PRIORITY + 1,
        );
    }
}

fn add_dialog(state: &SimulationState, module: &GameModule, sink: &mut dyn DrawSink) {
    sink.add(
        module.gui_sprite(GUI_DIALOG_BACKGROUND),
        0,
        DIALOG_TOP,
        OVERLAY_PRIORITY,
    );
    for (row, slot) in dialog_rows(state).enumerate() {
        let rect = dialog_row_rect(row);
        let priority = if state.hovered_dialog_slot == Some(slot) {
            OVERLAY_PRIORITY + 2
        } else {
            OVERLAY_PRIORITY + 1
        };
        sink.add(module.dialog_item_sprite(slot), rect.x, rect.y, priority);
    }
}

#[cfg(test)]
mod tests {
    use bbvs_formats::BgSprite;

    use super::*;
    use crate::test_support::{actor_module, Harness, BEAVIS, BUTTHEAD, LAMP, STAND_ANIM};

    fn scene() -> Harness {
        let mut module = actor_module();
        module.gui_sprites = (100..128).collect();
        module.inventory_item_sprites = (0..84).map(|sprite| 200 + sprite).collect();
        module.bg_sprites = vec![BgSprite {
            sprite_index: 42,
            priority: 0,
        }];
        let mut harness = Harness::new(module);
        harness.rt().init_scene();
        harness
    }

    #[test]
    fn objects_are_camera_relative_and_sorted_by_depth() {
        let mut harness = scene();
        harness.state.camera_pos = Point::new(10, 5);
        harness.state.cursor = Cursor::Verb {
            verb: Verb::Walk,
            highlighted: false,
        };
        harness.state.mouse_pos = Point::new(70, 85);

        let mut list = DrawList::new();
        build_draw_list(&harness.state, &harness.module, &mut list);
        let items = list.sorted();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].sprite_index, 42);
        assert_eq!((items[0].x, items[0].y), (-10, -5));

        let lamp = harness.state.objects[LAMP].int_pos();
        assert_eq!(items[1].priority, lamp.y);
        let butthead = harness.state.objects[BUTTHEAD].int_pos();
        assert_eq!((items[2].x, items[2].y), (butthead.x - 10, butthead.y - 5));
        // Equal depth keeps object order.
        assert_eq!(harness.state.objects[BEAVIS].int_pos().y, butthead.y);
        assert_eq!(items[2].sprite_index, items[3].sprite_index);
        assert_eq!(items[2].sprite_index, STAND_ANIM as i32 + 100);

        let cursor = items[4];
        assert_eq!(cursor.priority, CURSOR_PRIORITY);
        assert_eq!(cursor.sprite_index, 100 + Verb::Walk as i32);
        assert_eq!((cursor.x, cursor.y), (60, 80));
    }

    #[test]
    fn inventory_overlay_shows_held_items_and_item_cursor() {
        let mut harness = scene();
        harness.state.game_state = GameState::Inventory;
        harness.state.inventory[3] = true;
        harness.state.hovered_inventory_item = Some(3);
        harness.state.curr_inventory_item = Some(3);
        harness.state.cursor = Cursor::Verb {
            verb: Verb::InvItem,
            highlighted: false,
        };

        let mut list = DrawList::new();
        build_draw_list(&harness.state, &harness.module, &mut list);
        let overlay: Vec<_> = list
            .items()
            .iter()
            .filter(|item| item.priority >= OVERLAY_PRIORITY)
            .map(|item| item.sprite_index)
            .collect();
        assert_eq!(overlay, vec![126, 207, 206]);
    }

    #[test]
    fn cursor_is_hidden_while_an_action_runs() {
        let mut harness = scene();
        harness.state.game_state = GameState::Wait;
        harness.state.cursor = Cursor::Exit;
        let mut list = DrawList::new();
        build_draw_list(&harness.state, &harness.module, &mut list);
        assert!(list
            .items()
            .iter()
            .all(|item| item.priority < CURSOR_PRIORITY));
    }

    #[test]
    fn verb_menu_highlights_the_hovered_icon() {
        let mut harness = scene();
        harness.state.game_state = GameState::Verbs;
        harness.state.verb_pos = Point::new(160, 120);
        harness.state.hovered_verb = Some(Verb::Talk);
        let mut list = DrawList::new();
        build_draw_list(&harness.state, &harness.module, &mut list);
        let icons: Vec<_> = list
            .items()
            .iter()
            .filter(|item| item.priority == OVERLAY_PRIORITY)
            .map(|item| item.sprite_index)
            .collect();
        assert_eq!(icons, vec![114, 115, 122, 117, 119]);
    }
}
