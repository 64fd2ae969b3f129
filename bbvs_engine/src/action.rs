//! Scripted action interpreter.
//!
//! An action's commands are grouped by timestamp; the interpreter runs one
//! timestamp per tick. Before timestamp 0 runs, every `MoveObject` and
//! `AnimObject` aimed at it is folded into a per-object batch and the
//! action waits until those walks and turns have settled.

use bbvs_formats::{ActionCommand, CommandKind, Point};

use crate::logic::{eval_action_results, eval_condition};
use crate::objects::{begin_turn_to_anim, finish_turn, walk_object};
use crate::scene::SceneRuntime;
use crate::state::{GameState, ItemType, SceneObjectAction, Verb, SKIP_TICK_LIMIT};

impl SceneRuntime<'_> {
    pub(crate) fn start_action(&mut self, action_index: usize, game_state: GameState) {
        self.state.begin_action(action_index);
        self.state.game_state = game_state;
        self.log(format!("action.start {action_index}"));
    }

    /// Advances the current action by one timestamp.
    pub(crate) fn update_current_action(&mut self) {
        let Some(action_index) = self.state.curr_action else {
            return;
        };
        let module = self.module;
        let action = module.action(action_index);

        if self.state.curr_action_command_time_stamp == 0 && !self.process_curr_action(action_index) {
            return;
        }

        let time_stamp = self.state.curr_action_command_time_stamp;
        while let Some(command) = action.commands.get(self.state.curr_action_command_index) {
            if command.time_stamp != time_stamp {
                break;
            }
            self.state.curr_action_command_index += 1;
            if !self.perform_action_command(command) {
                self.finish_current_action();
                return;
            }
        }

        if self.state.curr_action_command_index >= action.commands.len() {
            self.finish_current_action();
        } else {
            self.state.curr_action_command_time_stamp += 1;
        }
    }

    /// Gathers the timestamp-0 moves into a batch on first call, then reports
    /// whether every batched object has arrived and finished turning.
    fn process_curr_action(&mut self, action_index: usize) -> bool {
        let module = self.module;
        if self.state.scene_object_actions.is_empty() {
            let mut batch: Vec<SceneObjectAction> = Vec::new();
            for command in module
                .action(action_index)
                .commands
                .iter()
                .take_while(|command| command.time_stamp == 0)
            {
                match command.cmd {
                    CommandKind::MoveObject | CommandKind::AnimObject => {
                        let index = command.scene_object_index;
                        let position = batch
                            .iter()
                            .position(|entry| entry.scene_object_index == index)
                            .unwrap_or_else(|| {
                                batch.push(SceneObjectAction {
                                    scene_object_index: index,
                                    animation_index: 0,
                                    walk_dest: None,
                                });
                                batch.len() - 1
                            });
                        let entry = &mut batch[position];
                        if command.cmd == CommandKind::MoveObject {
                            entry.walk_dest = Some(command.walk_dest);
                        } else {
                            entry.animation_index = command.param;
                        }
                    }
                    CommandKind::SetCameraPos => self.set_camera(command.param.max(0) as usize),
                    _ => {}
                }
            }

            batch.retain(|entry| self.state.objects[entry.scene_object_index].has_anim());
            let skip = self.state.skip_mode;
            for entry in &batch {
                let object = &mut self.state.objects[entry.scene_object_index];
                object.walk_count = 0;
                object.turn_count = 0;
                match entry.walk_dest {
                    Some(dest) if skip => {
                        object.set_int_pos(dest);
                        object.walk_dest = None;
                    }
                    Some(dest) => object.walk_dest = Some(dest),
                    None if entry.animation_index != 0 => {
                        begin_turn_to_anim(object, module, entry.animation_index);
                        if skip {
                            finish_turn(object, module);
                        }
                    }
                    None => {}
                }
            }
            self.state.scene_object_actions = batch;
        }

        let batch = self.state.scene_object_actions.clone();
        let mut done = true;
        for entry in &batch {
            let object = &self.state.objects[entry.scene_object_index];
            if object.walk_dest.is_some() || object.turn_count != 0 {
                done = false;
                continue;
            }
            let (pos, walking) = (object.int_pos(), object.walk_count > 0);
            match entry.walk_dest {
                Some(dest) if pos != dest && walking => done = false,
                Some(dest) if pos != dest => {
                    // Abandoned walk: the object is placed on the scripted
                    // target only when that point is walkable floor.
                    let index = entry.scene_object_index;
                    if self.state.walkable_rects.iter().any(|rect| rect.contains(dest)) {
                        self.state.objects[index].set_int_pos(dest);
                        self.log(format!("walk.snap {index} {},{}", dest.x, dest.y));
                    } else {
                        self.log(format!("walk.fail {index} {},{}", dest.x, dest.y));
                    }
                }
                _ => {}
            }
        }

        if done {
            self.state.scene_object_actions.clear();
        }
        done
    }

    /// Runs one command; returns `false` when the action must stop.
    fn perform_action_command(&mut self, command: &ActionCommand) -> bool {
        let module = self.module;
        let index = command.scene_object_index;
        match command.cmd {
            CommandKind::Stop => {
                self.audio.stop_speech();
                return false;
            }
            CommandKind::WalkObject => {
                let object = &mut self.state.objects[index];
                let speed = if command.param > 0 {
                    command.param
                } else {
                    object
                        .def_index
                        .map_or(0, |def| module.scene_object_def(def).walk_speed)
                };
                walk_object(object, command.walk_dest, speed);
                self.log(format!(
                    "walk.script {index} {},{}",
                    command.walk_dest.x, command.walk_dest.y
                ));
            }
            CommandKind::MoveObject => {
                let object = &mut self.state.objects[index];
                object.set_int_pos(command.walk_dest);
                object.x_incr = 0;
                object.y_incr = 0;
                object.walk_count = 0;
            }
            CommandKind::AnimObject => {
                let object = &mut self.state.objects[index];
                if command.param <= 0 {
                    object.anim_index = None;
                } else if command.time_stamp != 0
                    || object.anim_index != Some(command.param as usize)
                {
                    object.set_anim(module, command.param as usize);
                }
            }
            CommandKind::SetCameraPos => self.set_camera(command.param.max(0) as usize),
            CommandKind::PlaySpeech => self.audio.play_speech(command.param),
            CommandKind::PlaySound => {
                if let Some(sound) = u32::try_from(command.param)
                    .ok()
                    .and_then(|sound_num| self.sound_index(sound_num))
                {
                    self.audio.play_sound(sound, false);
                }
            }
            CommandKind::StartBackgroundSound => {
                if !self.state.background_sound_playing {
                    self.state.background_sound_playing = true;
                    self.start_background_sounds(self.state.curr_camera_num);
                }
            }
            CommandKind::StopBackgroundSound => {
                if self.state.background_sound_playing {
                    self.state.background_sound_playing = false;
                    self.stop_background_sounds(self.state.curr_camera_num);
                }
            }
        }
        true
    }

    /// Applies the action's results and returns control to the player.
    pub(crate) fn finish_current_action(&mut self) {
        let Some(action_index) = self.state.curr_action else {
            return;
        };
        let module = self.module;
        self.state.game_state = GameState::Scene;
        eval_action_results(self.state, &module.action(action_index).results);

        if self.state.game_state == GameState::Dialog {
            self.update_dialog_conditions();
            if self.state.dialog_slot_count == 0 {
                self.state.game_state = GameState::Scene;
            }
        }

        for object in &mut self.state.objects {
            object.walk_dest = None;
            object.walk_count = 0;
            object.turn_count = 0;
        }
        self.state.reset_action();
        self.update_walkable_rects();
        self.update_scene_objects_turn_value();
        if self.state.active_item_type != ItemType::Dialog {
            self.state.active_item_type = ItemType::None;
            self.state.active_item_index = 0;
        }
        self.log(format!("action.end {action_index}"));
    }

    /// Fast-forwards the running action with walks and turns resolved
    /// instantly.
    pub(crate) fn skip_current_action(&mut self) {
        self.audio.stop_speech();
        self.state.skip_mode = true;
        let mut ticks = 0;
        while self.state.curr_action.is_some()
            && self.state.new_scene_num.is_none()
            && ticks < SKIP_TICK_LIMIT
        {
            self.update_common();
            if self.audio.is_speech_playing() {
                self.audio.stop_speech();
            }
            ticks += 1;
        }
        self.state.skip_mode = false;
        self.state.camera_pos = self.state.new_camera_pos;
        if self.state.curr_action.is_some() {
            log::warn!("action still running after skipping {ticks} ticks");
        }
        self.log(format!("action.skip {ticks}"));
    }

    /// Starts the first action whose conditions match the current verb and
    /// hovered item.
    pub(crate) fn start_verb_action(&mut self) -> bool {
        if self.state.curr_verb == Verb::Talk
            && self.state.active_item_type == ItemType::SceneObject
        {
            self.state.curr_talk_obj_index = Some(self.state.active_item_index);
        }
        self.start_first_matching_action(GameState::Wait)
    }

    pub(crate) fn start_first_matching_action(&mut self, game_state: GameState) -> bool {
        let module = self.module;
        let state = &*self.state;
        match module
            .actions
            .iter()
            .position(|action| eval_condition(state, module, &action.conditions))
        {
            Some(action_index) => {
                self.start_action(action_index, game_state);
                true
            }
            None => false,
        }
    }

    /// Sends the primary actor towards `dest`, replanning from its current
    /// position.
    pub(crate) fn walk_butthead_to(&mut self, dest: Point) {
        let Some(butthead) = self.state.butthead else {
            return;
        };
        let object = &mut self.state.objects[butthead];
        object.walk_dest = Some(dest);
        object.walk_count = 0;
        self.log(format!("walk.request {},{}", dest.x, dest.y));
    }
}
