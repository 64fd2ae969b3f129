//! Condition, result and command tables authored by the scene scripts.
//!
//! On disk conditions and results occupy eight fixed slots; a slot whose kind
//! code is `0` is padding. In memory only the populated prefix is kept.

use std::fmt;

use anyhow::{Result, anyhow, bail, ensure};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::Point;

/// Number of slots in an authored condition or result block.
pub const SLOT_COUNT: usize = 8;

/// Kind code used by padding slots.
pub const EMPTY_SLOT: u8 = 0;

/// Raw slot as stored in the module files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawSlot {
    pub kind: u8,
    #[serde(default)]
    pub value1: i32,
    #[serde(default)]
    pub value2: i32,
}

pub trait SlotKind: Copy + Eq + fmt::Debug {
    const LABEL: &'static str;

    fn from_code(code: u8) -> Option<Self>;

    fn code(self) -> u8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<K> {
    pub kind: K,
    pub value1: i32,
    pub value2: i32,
}

impl<K: SlotKind> Slot<K> {
    pub fn new(kind: K, value1: i32, value2: i32) -> Self {
        Self {
            kind,
            value1,
            value2,
        }
    }
}

/// Ordered, at most eight entries long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotList<K> {
    slots: Vec<Slot<K>>,
}

impl<K> Default for SlotList<K> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<K: SlotKind> SlotList<K> {
    pub fn new(slots: Vec<Slot<K>>) -> Result<Self> {
        ensure!(
            slots.len() <= SLOT_COUNT,
            "{} list has {} slots (limit {SLOT_COUNT})",
            K::LABEL,
            slots.len()
        );
        Ok(Self { slots })
    }

    /// Decodes a fixed-slot block, stopping at the first padding slot.
    pub fn from_raw(raw: &[RawSlot]) -> Result<Self> {
        ensure!(
            raw.len() <= SLOT_COUNT,
            "{} block has {} slots (limit {SLOT_COUNT})",
            K::LABEL,
            raw.len()
        );
        let mut slots = Vec::with_capacity(raw.len());
        for (index, entry) in raw.iter().enumerate() {
            if entry.kind == EMPTY_SLOT {
                break;
            }
            let kind = K::from_code(entry.kind).ok_or_else(|| {
                anyhow!(
                    "{} slot {index} has unknown kind code {}",
                    K::LABEL,
                    entry.kind
                )
            })?;
            slots.push(Slot::new(kind, entry.value1, entry.value2));
        }
        Ok(Self { slots })
    }

    /// Re-encodes into the fixed eight-slot framing.
    pub fn to_raw(&self) -> [RawSlot; SLOT_COUNT] {
        let mut raw = [RawSlot::default(); SLOT_COUNT];
        for (out, slot) in raw.iter_mut().zip(&self.slots) {
            *out = RawSlot {
                kind: slot.kind.code(),
                value1: slot.value1,
                value2: slot.value2,
            };
        }
        raw
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot<K>> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains_kind(&self, kind: K) -> bool {
        self.slots.iter().any(|slot| slot.kind == kind)
    }
}

impl<K: SlotKind> Serialize for SlotList<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_raw().serialize(serializer)
    }
}

impl<'de, K: SlotKind> Deserialize<'de> for SlotList<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<RawSlot>::deserialize(deserializer)?;
        Self::from_raw(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    Unused,
    SceneObjectVerb,
    BgObjectVerb,
    SceneObjectInventory,
    BgObjectInventory,
    HasInventoryItem,
    HasNotInventoryItem,
    IsGameVar,
    IsNotGameVar,
    IsPrevSceneNum,
    IsCurrTalkObject,
    IsDialogItem,
    IsCameraNum,
    IsNotPrevSceneNum,
    DialogItem0,
    IsButtheadAtBgObject,
    IsNotSceneVisited,
    IsSceneVisited,
    IsCameraNumTransition,
}

impl SlotKind for ConditionKind {
    const LABEL: &'static str = "condition";

    fn from_code(code: u8) -> Option<Self> {
        let kind = match code {
            1 => Self::Unused,
            2 => Self::SceneObjectVerb,
            3 => Self::BgObjectVerb,
            4 => Self::SceneObjectInventory,
            5 => Self::BgObjectInventory,
            6 => Self::HasInventoryItem,
            7 => Self::HasNotInventoryItem,
            8 => Self::IsGameVar,
            9 => Self::IsNotGameVar,
            10 => Self::IsPrevSceneNum,
            11 => Self::IsCurrTalkObject,
            12 => Self::IsDialogItem,
            13 => Self::IsCameraNum,
            14 => Self::IsNotPrevSceneNum,
            15 => Self::DialogItem0,
            16 => Self::IsButtheadAtBgObject,
            17 => Self::IsNotSceneVisited,
            18 => Self::IsSceneVisited,
            19 => Self::IsCameraNumTransition,
            _ => return None,
        };
        Some(kind)
    }

    fn code(self) -> u8 {
        match self {
            Self::Unused => 1,
            Self::SceneObjectVerb => 2,
            Self::BgObjectVerb => 3,
            Self::SceneObjectInventory => 4,
            Self::BgObjectInventory => 5,
            Self::HasInventoryItem => 6,
            Self::HasNotInventoryItem => 7,
            Self::IsGameVar => 8,
            Self::IsNotGameVar => 9,
            Self::IsPrevSceneNum => 10,
            Self::IsCurrTalkObject => 11,
            Self::IsDialogItem => 12,
            Self::IsCameraNum => 13,
            Self::IsNotPrevSceneNum => 14,
            Self::DialogItem0 => 15,
            Self::IsButtheadAtBgObject => 16,
            Self::IsNotSceneVisited => 17,
            Self::IsSceneVisited => 18,
            Self::IsCameraNumTransition => 19,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    AddInventoryItem,
    RemoveInventoryItem,
    SetGameVar,
    UnsetGameVar,
    StartDialog,
    ChangeScene,
}

impl SlotKind for ResultKind {
    const LABEL: &'static str = "action result";

    fn from_code(code: u8) -> Option<Self> {
        let kind = match code {
            1 => Self::AddInventoryItem,
            2 => Self::RemoveInventoryItem,
            3 => Self::SetGameVar,
            4 => Self::UnsetGameVar,
            5 => Self::StartDialog,
            6 => Self::ChangeScene,
            _ => return None,
        };
        Some(kind)
    }

    fn code(self) -> u8 {
        match self {
            Self::AddInventoryItem => 1,
            Self::RemoveInventoryItem => 2,
            Self::SetGameVar => 3,
            Self::UnsetGameVar => 4,
            Self::StartDialog => 5,
            Self::ChangeScene => 6,
        }
    }
}

pub type Condition = Slot<ConditionKind>;
pub type Conditions = SlotList<ConditionKind>;
pub type ActionResult = Slot<ResultKind>;
pub type ActionResults = SlotList<ResultKind>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum CommandKind {
    Stop,
    WalkObject,
    MoveObject,
    AnimObject,
    SetCameraPos,
    PlaySpeech,
    PlaySound,
    StartBackgroundSound,
    StopBackgroundSound,
}

impl CommandKind {
    /// Commands whose `scene_object_index` must name a scene object.
    pub fn targets_object(self) -> bool {
        matches!(self, Self::WalkObject | Self::MoveObject | Self::AnimObject)
    }
}

impl TryFrom<u16> for CommandKind {
    type Error = anyhow::Error;

    fn try_from(value: u16) -> Result<Self> {
        let kind = match value {
            0 => Self::Stop,
            3 => Self::WalkObject,
            4 => Self::MoveObject,
            5 => Self::AnimObject,
            7 => Self::SetCameraPos,
            8 => Self::PlaySpeech,
            10 => Self::PlaySound,
            11 => Self::StartBackgroundSound,
            12 => Self::StopBackgroundSound,
            other => bail!("unknown action command code {other}"),
        };
        Ok(kind)
    }
}

impl From<CommandKind> for u16 {
    fn from(kind: CommandKind) -> Self {
        match kind {
            CommandKind::Stop => 0,
            CommandKind::WalkObject => 3,
            CommandKind::MoveObject => 4,
            CommandKind::AnimObject => 5,
            CommandKind::SetCameraPos => 7,
            CommandKind::PlaySpeech => 8,
            CommandKind::PlaySound => 10,
            CommandKind::StartBackgroundSound => 11,
            CommandKind::StopBackgroundSound => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCommand {
    pub cmd: CommandKind,
    #[serde(default)]
    pub time_stamp: u32,
    #[serde(default)]
    pub scene_object_index: usize,
    #[serde(default)]
    pub param: i32,
    #[serde(default)]
    pub walk_dest: Point,
}

impl ActionCommand {
    pub fn new(cmd: CommandKind, time_stamp: u32) -> Self {
        Self {
            cmd,
            time_stamp,
            scene_object_index: 0,
            param: 0,
            walk_dest: Point::default(),
        }
    }

    pub fn with_object(mut self, scene_object_index: usize) -> Self {
        self.scene_object_index = scene_object_index;
        self
    }

    pub fn with_param(mut self, param: i32) -> Self {
        self.param = param;
        self
    }

    pub fn with_walk_dest(mut self, walk_dest: Point) -> Self {
        self.walk_dest = walk_dest;
        self
    }
}

/// Scripted response: runs its commands when its conditions hold, then
/// applies its results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub conditions: Conditions,
    #[serde(default)]
    pub results: ActionResults,
    #[serde(default)]
    pub commands: Vec<ActionCommand>,
}
