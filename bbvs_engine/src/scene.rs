use bbvs_formats::{rect_subtract, ConditionKind, GameModule, Point};

use crate::host::AudioSink;
use crate::logic::{eval_camera_condition, eval_condition, eval_dialog_condition, DialogSlot};
use crate::objects::{
    advance_animation, finish_turn, finish_walk, step_walk, turn_object, update_object_turn_value,
    update_walk_object, walk_object,
};
use crate::state::{
    GameState, ItemType, SceneObject, SimulationState, INITIAL_CAMERA_CANDIDATES, SCREEN_WIDTH,
    WALKABLE_RECTS_CAPACITY,
};
use crate::walk::{exclude_footprint, PathfindingWorkspace, SearchBudget};

/// Couples simulation-state mutations with the loaded scene tables, the
/// audio sink and the event trace for the duration of one tick.
pub(crate) struct SceneRuntime<'a> {
    pub(crate) state: &'a mut SimulationState,
    pub(crate) module: &'a GameModule,
    pub(crate) audio: &'a dyn AudioSink,
    pub(crate) workspace: &'a mut PathfindingWorkspace,
    pub(crate) events: &'a mut Vec<String>,
}

impl<'a> SceneRuntime<'a> {
    pub(crate) fn new(
        state: &'a mut SimulationState,
        module: &'a GameModule,
        audio: &'a dyn AudioSink,
        workspace: &'a mut PathfindingWorkspace,
        events: &'a mut Vec<String>,
    ) -> Self {
        Self {
            state,
            module,
            audio,
            workspace,
            events,
        }
    }

    pub(crate) fn log(&mut self, message: String) {
        log::debug!(target: "bbvs_engine::trace", "{message}");
        self.events.push(message);
    }

    /// Populates the scene objects for a freshly loaded module.
    pub(crate) fn init_scene(&mut self) {
        let module = self.module;
        for (index, object) in self.state.objects.iter_mut().enumerate() {
            *object = SceneObject {
                def_index: (index < module.scene_object_defs.len()).then_some(index),
                ..SceneObject::default()
            };
        }

        for init in &module.scene_object_inits {
            if eval_condition(self.state, module, &init.conditions) {
                let object = &mut self.state.objects[init.scene_object_index];
                object.set_anim(module, init.anim_index);
                object.set_int_pos(init.position);
            }
        }

        self.state.butthead = module.primary_actor_index;
        self.state.beavis = module.find_scene_object_def("Beavis");
        self.update_scene_objects_turn_value();
        self.update_walkable_rects();

        self.state.curr_camera_num = self.initial_camera();
        let camera_pos = module.camera_init(self.state.curr_camera_num).camera_pos;
        self.state.camera_pos = camera_pos;
        self.state.new_camera_pos = camera_pos;

        self.state.walk_area_actions = module
            .actions
            .iter()
            .enumerate()
            .filter(|(_, action)| {
                action
                    .conditions
                    .contains_kind(ConditionKind::IsButtheadAtBgObject)
            })
            .map(|(index, _)| index)
            .collect();

        self.state.background_sound_playing = true;
        self.start_background_sounds(self.state.curr_camera_num);

        self.state.reset_action();
        self.state.game_state = GameState::Scene;
        self.state.active_item_type = ItemType::None;
        self.state.active_item_index = 0;
        self.state.curr_talk_obj_index = None;
        self.log(format!(
            "scene.init {} camera {}",
            self.state.scene_num, self.state.curr_camera_num
        ));
    }

    /// Of the first cameras, the one whose left edge centres the primary
    /// actor best.
    fn initial_camera(&self) -> usize {
        let Some(pos) = self.state.butthead_pos() else {
            return 0;
        };
        self.module
            .camera_inits
            .iter()
            .take(INITIAL_CAMERA_CANDIDATES)
            .enumerate()
            .min_by_key(|(_, camera)| (camera.camera_pos.x - pos.x + SCREEN_WIDTH / 2).abs())
            .map_or(0, |(index, _)| index)
    }

    /// Authored walk rectangles minus the footprint of every visible object
    /// other than the two privileged actors.
    pub(crate) fn update_walkable_rects(&mut self) {
        let module = self.module;
        let mut rects = module.walk_rects.clone();
        let mut scratch = Vec::with_capacity(rects.len());
        for (index, object) in self.state.objects.iter().enumerate() {
            if self.state.is_privileged(index) {
                continue;
            }
            let Some(footprint) = object.footprint(module) else {
                continue;
            };
            scratch.clear();
            for rect in &rects {
                scratch.extend(rect_subtract(&footprint, rect));
            }
            assert!(
                scratch.len() <= WALKABLE_RECTS_CAPACITY,
                "walkable rect capacity ({WALKABLE_RECTS_CAPACITY}) exceeded by object {index}"
            );
            std::mem::swap(&mut rects, &mut scratch);
        }
        self.state.walkable_rects = rects;
    }

    pub(crate) fn update_scene_objects_turn_value(&mut self) {
        let module = self.module;
        for object in &mut self.state.objects {
            update_object_turn_value(object, module);
        }
    }

    pub(crate) fn sound_index(&self, sound_num: u32) -> Option<usize> {
        let index = self.module.sound_index(sound_num);
        if index.is_none() {
            log::warn!(
                "sound {sound_num} is not preloaded by scene {}",
                self.state.scene_num
            );
        }
        index
    }

    pub(crate) fn start_background_sounds(&mut self, camera: usize) {
        for sound in &self.module.scene_sounds {
            if eval_camera_condition(self.state, &sound.conditions, camera) {
                if let Some(index) = self.sound_index(sound.sound_num) {
                    self.audio.play_sound(index, true);
                }
            }
        }
    }

    pub(crate) fn stop_background_sounds(&mut self, camera: usize) {
        for sound in &self.module.scene_sounds {
            if eval_camera_condition(self.state, &sound.conditions, camera) {
                if let Some(index) = self.sound_index(sound.sound_num) {
                    self.audio.stop_sound(index);
                }
            }
        }
    }

    /// Stops sounds keyed only to `old` and starts those keyed only to `new`.
    fn swap_background_sounds(&mut self, old: usize, new: usize) {
        for sound in &self.module.scene_sounds {
            let was_playing = eval_camera_condition(self.state, &sound.conditions, old);
            let now_playing = eval_camera_condition(self.state, &sound.conditions, new);
            if was_playing == now_playing {
                continue;
            }
            if let Some(index) = self.sound_index(sound.sound_num) {
                if now_playing {
                    self.audio.play_sound(index, true);
                } else {
                    self.audio.stop_sound(index);
                }
            }
        }
    }

    /// Makes `camera` current and pans towards its position.
    pub(crate) fn set_camera(&mut self, camera: usize) {
        let old = self.state.curr_camera_num;
        self.state.curr_camera_num = camera;
        self.state.new_camera_pos = self.module.camera_init(camera).camera_pos;
        if self.state.background_sound_playing && old != camera {
            self.swap_background_sounds(old, camera);
        }
        if old != camera {
            self.log(format!("camera.switch {camera}"));
        }
    }

    /// Recomputes which dialog slots are on offer.
    pub(crate) fn update_dialog_conditions(&mut self) {
        self.state.dialog_items.iter_mut().for_each(|flag| *flag = false);
        self.state.dialog_slot_count = 0;
        for action in &self.module.actions {
            if let DialogSlot::Slot(slot) = eval_dialog_condition(self.state, &action.conditions) {
                if let Some(flag) = self.state.dialog_items.get_mut(slot) {
                    if !*flag {
                        *flag = true;
                        self.state.dialog_slot_count += 1;
                    }
                }
            }
        }
    }

    /// Per-tick driver shared by every state that lets time pass.
    pub(crate) fn update_common(&mut self) {
        if self.state.curr_action.is_some() {
            self.update_current_action();
        }
        self.update_scene_objects();
        self.check_walk_area_actions();
        if self.state.curr_action.is_none() {
            self.check_camera_links();
        }
        self.update_camera();
        self.check_scene_exits();
    }

    fn update_scene_objects(&mut self) {
        let module = self.module;
        for index in 0..self.state.objects.len() {
            let pending = {
                let object = &self.state.objects[index];
                object.walk_dest.is_some() && object.walk_count == 0
            };
            if pending {
                if self.state.is_privileged(index) {
                    self.start_walk_object(index);
                    let object = &mut self.state.objects[index];
                    if object.walk_count == 0 {
                        object.walk_dest = None;
                        update_walk_object(object, module);
                    }
                } else {
                    // Only the two actors plan walks; other requests are dropped.
                    self.state.objects[index].walk_dest = None;
                }
            }

            let skip = self.state.skip_mode;
            let object = &mut self.state.objects[index];
            if object.walk_count > 0 {
                if object.walk_dest.is_some() {
                    update_walk_object(object, module);
                }
                if skip {
                    finish_walk(object);
                } else {
                    step_walk(object);
                }
            } else if object.turn_count != 0 {
                if skip {
                    finish_turn(object, module);
                } else {
                    turn_object(object, module);
                }
            }
            advance_animation(object, module);
        }
    }

    /// Builds the walk-area graph as seen by `mover`.
    pub(crate) fn init_walk_areas(&mut self, mover: usize) {
        let module = self.module;
        let mover_pos = self.state.objects[mover].int_pos();
        let footprint = self
            .state
            .other_privileged(mover)
            .and_then(|other| self.state.objects[other].footprint(module))
            .map(|rect| rect.translate(0, 1));
        let rects = exclude_footprint(&self.state.walkable_rects, footprint, mover_pos);
        self.workspace.init_walk_areas(&rects);
    }

    /// Starts the next path-found leg of a privileged actor's pending walk.
    fn start_walk_object(&mut self, index: usize) {
        let object = &self.state.objects[index];
        let (Some(dest), Some(def_index)) = (object.walk_dest, object.def_index) else {
            return;
        };
        let source = object.int_pos();
        let speed = self.module.scene_object_def(def_index).walk_speed;
        self.init_walk_areas(index);
        let budget = SearchBudget::from_field_c(self.module.field_c);
        let target = match self.workspace.plan_walk(source, dest, budget) {
            Some(plan) => plan.target,
            None => {
                self.log(format!("walk.blocked {index} {},{}", dest.x, dest.y));
                return;
            }
        };
        walk_object(&mut self.state.objects[index], target, speed);
        if self.state.objects[index].walk_count > 0 {
            self.log(format!("walk.start {index} {},{}", target.x, target.y));
        }
    }

    pub(crate) fn can_butthead_walk_to_dest(&mut self, dest: Point) -> bool {
        let Some(butthead) = self.state.butthead else {
            return false;
        };
        self.init_walk_areas(butthead);
        let source = self.state.objects[butthead].int_pos();
        let budget = SearchBudget::from_field_c(self.module.field_c);
        self.workspace.can_walk_to_dest(source, dest, budget)
    }

    /// Fires the first walk-area action whose conditions now hold. Each one
    /// fires at most once per scene visit.
    fn check_walk_area_actions(&mut self) {
        let module = self.module;
        let state = &*self.state;
        let Some(position) = state
            .walk_area_actions
            .iter()
            .position(|&index| eval_condition(state, module, &module.action(index).conditions))
        else {
            return;
        };
        let action_index = self.state.walk_area_actions.remove(position);
        self.start_action(action_index, GameState::Wait);
    }

    fn check_camera_links(&mut self) {
        let Some(pos) = self.state.butthead_pos() else {
            return;
        };
        let curr = self.state.curr_camera_num;
        let target = self
            .module
            .camera_init(curr)
            .links
            .iter()
            .find(|link| link.camera_num != curr && link.rect.contains(pos))
            .map(|link| link.camera_num);
        if let Some(camera) = target {
            self.set_camera(camera);
        }
    }

    /// Eases the view one pixel per axis towards the target position.
    fn update_camera(&mut self) {
        let target = self.state.new_camera_pos;
        let pos = &mut self.state.camera_pos;
        pos.x += (target.x - pos.x).signum();
        pos.y += (target.y - pos.y).signum();
    }

    fn check_scene_exits(&mut self) {
        if self.state.new_scene_num.is_some() {
            return;
        }
        let Some(pos) = self.state.butthead_pos() else {
            return;
        };
        if let Some(exit) = self
            .module
            .scene_exits
            .iter()
            .find(|exit| exit.rect.contains(pos))
        {
            self.state.new_scene_num = Some(exit.new_scene_num);
            self.log(format!("scene.exit {}", exit.new_scene_num));
        }
    }
}
