use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::geometry::{Point, Rect};
use crate::tables::{Action, ActionResults, CommandKind, ConditionKind, Conditions, ResultKind};

pub const SCENE_OBJECTS_COUNT: usize = 64;
pub const INVENTORY_ITEM_COUNT: usize = 42;
pub const GAME_VARS_COUNT: usize = 2000;
pub const SCENE_VISITED_COUNT: usize = 64;
pub const DIALOG_ITEM_COUNT: usize = 50;
pub const ANIM_INDEX_SLOTS: usize = 16;
pub const CAMERA_LINK_SLOTS: usize = 8;

/// Static per-actor metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneObjectDef {
    pub name: String,
    /// Direction/pose animation table; `0` marks an empty slot.
    #[serde(default)]
    pub anim_indices: Vec<i32>,
    #[serde(default)]
    pub walk_speed: i32,
}

impl SceneObjectDef {
    pub fn anim_index(&self, slot: usize) -> i32 {
        self.anim_indices.get(slot).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneObjectInit {
    #[serde(default)]
    pub conditions: Conditions,
    pub scene_object_index: usize,
    pub anim_index: usize,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationFrame {
    pub sprite_index: i32,
    #[serde(default = "default_frame_ticks")]
    pub ticks: i32,
    /// Hit-test rectangle relative to the object position.
    #[serde(default)]
    pub rect1: Rect,
    /// Footprint rectangle relative to the object position.
    #[serde(default)]
    pub rect2: Rect,
}

fn default_frame_ticks() -> i32 {
    1
}

impl Default for AnimationFrame {
    fn default() -> Self {
        Self {
            sprite_index: 0,
            ticks: default_frame_ticks(),
            rect1: Rect::default(),
            rect2: Rect::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    pub frames: Vec<AnimationFrame>,
}

impl Animation {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> &AnimationFrame {
        &self.frames[index.min(self.frames.len().saturating_sub(1))]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraLink {
    pub camera_num: usize,
    pub rect: Rect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInit {
    pub camera_pos: Point,
    #[serde(default)]
    pub links: Vec<CameraLink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneExit {
    pub rect: Rect,
    pub new_scene_num: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSound {
    #[serde(default)]
    pub conditions: Conditions,
    pub sound_num: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgObject {
    pub name: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgSprite {
    pub sprite_index: i32,
    #[serde(default)]
    pub priority: i32,
}

/// Read-only tables for one scene.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameModule {
    /// Pathfinding search budget; at or below 320 the walk search is capped
    /// at 20 hops.
    #[serde(default)]
    pub field_c: i32,
    /// Index of the primary player actor, if the scene has one.
    #[serde(default)]
    pub primary_actor_index: Option<usize>,
    #[serde(default)]
    pub walk_rects: Vec<Rect>,
    #[serde(default)]
    pub scene_object_defs: Vec<SceneObjectDef>,
    #[serde(default)]
    pub scene_object_inits: Vec<SceneObjectInit>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub animations: Vec<Animation>,
    #[serde(default)]
    pub camera_inits: Vec<CameraInit>,
    #[serde(default)]
    pub scene_exits: Vec<SceneExit>,
    #[serde(default)]
    pub scene_sounds: Vec<SceneSound>,
    #[serde(default)]
    pub bg_objects: Vec<BgObject>,
    #[serde(default)]
    pub bg_sprites: Vec<BgSprite>,
    /// Sound numbers preloaded for this scene; a sound is addressed by its
    /// position in this table.
    #[serde(default)]
    pub preload_sounds: Vec<u32>,
    #[serde(default)]
    pub gui_sprites: Vec<i32>,
    /// Two sprites per inventory item: normal, highlighted.
    #[serde(default)]
    pub inventory_item_sprites: Vec<i32>,
    #[serde(default)]
    pub dialog_item_sprites: Vec<i32>,
}

impl GameModule {
    pub fn from_json_slice(input: &[u8]) -> Result<Self> {
        let module: GameModule =
            serde_json::from_slice(input).context("parsing scene module JSON")?;
        module.validate()?;
        Ok(module)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)
            .with_context(|| format!("reading scene module {}", path.display()))?;
        Self::from_json_slice(&data)
            .with_context(|| format!("loading scene module {}", path.display()))
    }

    pub fn action(&self, index: usize) -> &Action {
        &self.actions[index]
    }

    pub fn animation(&self, index: usize) -> &Animation {
        &self.animations[index]
    }

    pub fn camera_init(&self, index: usize) -> &CameraInit {
        &self.camera_inits[index]
    }

    pub fn bg_object(&self, index: usize) -> &BgObject {
        &self.bg_objects[index]
    }

    pub fn scene_object_def(&self, index: usize) -> &SceneObjectDef {
        &self.scene_object_defs[index]
    }

    pub fn find_scene_object_def(&self, name: &str) -> Option<usize> {
        self.scene_object_defs
            .iter()
            .position(|def| def.name == name)
    }

    /// Maps a sound number onto its slot in the preload table.
    pub fn sound_index(&self, sound_num: u32) -> Option<usize> {
        self.preload_sounds.iter().position(|&num| num == sound_num)
    }

    pub fn gui_sprite(&self, index: usize) -> i32 {
        self.gui_sprites.get(index).copied().unwrap_or(0)
    }

    pub fn inventory_item_sprite(&self, item: usize, highlighted: bool) -> i32 {
        let index = 2 * item + usize::from(highlighted);
        self.inventory_item_sprites
            .get(index)
            .copied()
            .unwrap_or(0)
    }

    pub fn dialog_item_sprite(&self, slot: usize) -> i32 {
        self.dialog_item_sprites.get(slot).copied().unwrap_or(0)
    }

    /// Checks every cross-table reference so the runtime can index freely.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.scene_object_defs.len() <= SCENE_OBJECTS_COUNT,
            "{} scene object defs exceed the limit of {SCENE_OBJECTS_COUNT}",
            self.scene_object_defs.len()
        );
        ensure!(!self.camera_inits.is_empty(), "scene module has no cameras");

        if let Some(index) = self.primary_actor_index {
            self.check_object(index)
                .context("primary actor index")?;
        }

        for (def_index, def) in self.scene_object_defs.iter().enumerate() {
            ensure!(
                def.anim_indices.len() <= ANIM_INDEX_SLOTS,
                "scene object def {def_index} ({}) has {} animation slots",
                def.name,
                def.anim_indices.len()
            );
            for &anim in &def.anim_indices {
                if anim != 0 {
                    self.check_animation(anim)
                        .with_context(|| format!("scene object def {def_index} ({})", def.name))?;
                }
            }
        }

        for (anim_index, anim) in self.animations.iter().enumerate() {
            // Index 0 is the "no animation" placeholder and may be empty.
            ensure!(
                anim_index == 0 || !anim.frames.is_empty(),
                "animation {anim_index} has no frames"
            );
            for (frame_index, frame) in anim.frames.iter().enumerate() {
                ensure!(
                    frame.ticks > 0,
                    "animation {anim_index} frame {frame_index} has non-positive tick count"
                );
            }
        }

        for (index, init) in self.scene_object_inits.iter().enumerate() {
            let context = || format!("scene object init {index}");
            self.check_object(init.scene_object_index)
                .with_context(context)?;
            self.check_animation(init.anim_index as i32)
                .with_context(context)?;
            self.check_conditions(&init.conditions)
                .with_context(context)?;
        }

        for (index, action) in self.actions.iter().enumerate() {
            let context = || format!("action {index}");
            self.check_conditions(&action.conditions)
                .with_context(context)?;
            self.check_results(&action.results).with_context(context)?;
            let mut last_stamp = 0;
            for (cmd_index, command) in action.commands.iter().enumerate() {
                ensure!(
                    command.time_stamp >= last_stamp,
                    "action {index} command {cmd_index} goes back in time ({} < {last_stamp})",
                    command.time_stamp
                );
                last_stamp = command.time_stamp;
                if command.cmd.targets_object() {
                    self.check_object(command.scene_object_index)
                        .with_context(context)?;
                }
                match command.cmd {
                    CommandKind::AnimObject if command.param != 0 => {
                        self.check_animation(command.param).with_context(context)?;
                    }
                    CommandKind::SetCameraPos => {
                        self.check_camera(command.param).with_context(context)?;
                    }
                    _ => {}
                }
            }
        }

        for (index, camera) in self.camera_inits.iter().enumerate() {
            ensure!(
                camera.links.len() <= CAMERA_LINK_SLOTS,
                "camera {index} has {} links (limit {CAMERA_LINK_SLOTS})",
                camera.links.len()
            );
            for link in &camera.links {
                self.check_camera(link.camera_num as i32)
                    .with_context(|| format!("camera {index} link"))?;
            }
        }

        for (index, sound) in self.scene_sounds.iter().enumerate() {
            self.check_conditions(&sound.conditions)
                .with_context(|| format!("scene sound {index}"))?;
        }

        Ok(())
    }

    fn check_object(&self, index: usize) -> Result<()> {
        ensure!(
            index < self.scene_object_defs.len(),
            "scene object index {index} out of range ({} defs)",
            self.scene_object_defs.len()
        );
        Ok(())
    }

    fn check_animation(&self, index: i32) -> Result<()> {
        ensure!(
            index >= 0 && (index as usize) < self.animations.len(),
            "animation index {index} out of range ({} animations)",
            self.animations.len()
        );
        Ok(())
    }

    fn check_camera(&self, index: i32) -> Result<()> {
        ensure!(
            index >= 0 && (index as usize) < self.camera_inits.len(),
            "camera index {index} out of range ({} cameras)",
            self.camera_inits.len()
        );
        Ok(())
    }

    fn check_conditions(&self, conditions: &Conditions) -> Result<()> {
        for condition in conditions.iter() {
            match condition.kind {
                ConditionKind::HasInventoryItem | ConditionKind::HasNotInventoryItem => {
                    check_range("inventory item", condition.value1, INVENTORY_ITEM_COUNT)?
                }
                ConditionKind::IsGameVar | ConditionKind::IsNotGameVar => {
                    check_range("game variable", condition.value2, GAME_VARS_COUNT)?
                }
                ConditionKind::IsDialogItem => {
                    check_range("dialog item", condition.value1, DIALOG_ITEM_COUNT)?
                }
                ConditionKind::IsButtheadAtBgObject => {
                    check_range("background object", condition.value2, self.bg_objects.len())?
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_results(&self, results: &ActionResults) -> Result<()> {
        for result in results.iter() {
            match result.kind {
                ResultKind::AddInventoryItem | ResultKind::RemoveInventoryItem => {
                    check_range("inventory item", result.value1, INVENTORY_ITEM_COUNT)?
                }
                ResultKind::SetGameVar | ResultKind::UnsetGameVar => {
                    check_range("game variable", result.value2, GAME_VARS_COUNT)?
                }
                ResultKind::StartDialog | ResultKind::ChangeScene => {}
            }
        }
        Ok(())
    }
}

fn check_range(what: &str, value: i32, limit: usize) -> Result<()> {
    if value < 0 || value as usize >= limit {
        bail!("{what} {value} out of range (limit {limit})");
    }
    Ok(())
}

/// Directory of scene modules named `scene_<num>.json`.
#[derive(Debug, Clone, Default)]
pub struct SceneLibrary {
    root: PathBuf,
    scenes: BTreeMap<i32, PathBuf>,
}

impl SceneLibrary {
    pub fn from_dir(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        ensure!(root.is_dir(), "scene directory {} not found", root.display());
        let mut scenes = BTreeMap::new();
        for entry in WalkDir::new(root).max_depth(1) {
            let entry = entry.with_context(|| format!("scanning {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(num) = parse_scene_file_name(&entry.file_name().to_string_lossy()) else {
                continue;
            };
            scenes.insert(num, entry.into_path());
        }
        Ok(Self {
            root: root.to_path_buf(),
            scenes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scene_numbers(&self) -> impl Iterator<Item = i32> + '_ {
        self.scenes.keys().copied()
    }

    pub fn path_for(&self, scene_num: i32) -> Option<&Path> {
        self.scenes.get(&scene_num).map(PathBuf::as_path)
    }

    pub fn load(&self, scene_num: i32) -> Result<GameModule> {
        let path = self
            .path_for(scene_num)
            .with_context(|| format!("no module for scene {scene_num} in {}", self.root.display()))?;
        GameModule::load(path)
    }
}

pub fn scene_file_name(scene_num: i32) -> String {
    format!("scene_{scene_num:02}.json")
}

fn parse_scene_file_name(name: &str) -> Option<i32> {
    name.strip_prefix("scene_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{ActionCommand, RawSlot};

    fn minimal_module() -> GameModule {
        GameModule {
            field_c: 320,
            primary_actor_index: Some(0),
            walk_rects: vec![Rect::new(0, 0, 100, 100)],
            scene_object_defs: vec![SceneObjectDef {
                name: "Butthead".to_string(),
                anim_indices: vec![0, 1],
                walk_speed: 120,
            }],
            animations: vec![
                Animation {
                    frames: vec![AnimationFrame::default()],
                },
                Animation {
                    frames: vec![AnimationFrame {
                        sprite_index: 3,
                        ticks: 2,
                        ..AnimationFrame::default()
                    }],
                },
            ],
            camera_inits: vec![CameraInit::default()],
            ..GameModule::default()
        }
    }

    #[test]
    fn minimal_module_validates() {
        minimal_module().validate().expect("valid module");
    }

    #[test]
    fn only_the_placeholder_animation_may_be_empty() {
        let mut module = minimal_module();
        module.animations[0] = Animation::default();
        module.validate().expect("empty placeholder");

        module.animations[1] = Animation::default();
        let err = module.validate().expect_err("empty animation 1");
        assert!(format!("{err:#}").contains("animation 1 has no frames"), "{err:#}");
    }

    #[test]
    fn rejects_command_with_unknown_object() {
        let mut module = minimal_module();
        module.actions.push(Action {
            commands: vec![ActionCommand::new(CommandKind::AnimObject, 0)
                .with_object(3)
                .with_param(1)],
            ..Action::default()
        });
        let err = module.validate().expect_err("bad object index");
        assert!(format!("{err:#}").contains("scene object index 3"), "{err:#}");
    }

    #[test]
    fn rejects_out_of_order_timestamps() {
        let mut module = minimal_module();
        module.actions.push(Action {
            commands: vec![
                ActionCommand::new(CommandKind::PlaySound, 4),
                ActionCommand::new(CommandKind::Stop, 2),
            ],
            ..Action::default()
        });
        assert!(module.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_game_var() {
        let mut module = minimal_module();
        module.actions.push(Action {
            conditions: Conditions::from_raw(&[RawSlot {
                kind: 8,
                value1: 0,
                value2: GAME_VARS_COUNT as i32,
            }])
            .expect("conditions"),
            ..Action::default()
        });
        assert!(module.validate().is_err());
    }

    #[test]
    fn sound_numbers_resolve_through_preload_table() {
        let module = GameModule {
            preload_sounds: vec![40, 7, 19],
            ..minimal_module()
        };
        assert_eq!(module.sound_index(19), Some(2));
        assert_eq!(module.sound_index(8), None);
        assert_eq!(module.inventory_item_sprite(3, true), 0);
    }

    #[test]
    fn library_discovers_scene_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let json = serde_json::to_vec(&minimal_module())?;
        fs::write(dir.path().join(scene_file_name(3)), &json)?;
        fs::write(dir.path().join("notes.txt"), b"ignored")?;

        let library = SceneLibrary::from_dir(dir.path())?;
        assert_eq!(library.scene_numbers().collect::<Vec<_>>(), vec![3]);
        let module = library.load(3)?;
        assert_eq!(module.walk_rects, vec![Rect::new(0, 0, 100, 100)]);
        assert!(library.load(4).is_err());
        Ok(())
    }
}
