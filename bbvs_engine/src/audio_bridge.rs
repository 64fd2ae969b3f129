use std::{cell::RefCell, rc::Rc};

use serde::Serialize;

use crate::host::AudioSink;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AudioEvent {
    SoundPlay { index: usize, looped: bool },
    SoundStop { index: usize },
    SpeechPlay { sound_num: i32 },
    SpeechStop,
}

/// Audio sink that keeps an ordered log of every request.
///
/// Speech counts as playing from `play_speech` until the next `stop_speech`.
#[derive(Clone, Default)]
pub struct RecordingAudio {
    events: Rc<RefCell<Vec<AudioEvent>>>,
    speech: Rc<RefCell<Option<i32>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.events.borrow().clone()
    }
}

impl AudioSink for RecordingAudio {
    fn play_sound(&self, index: usize, looped: bool) {
        self.events
            .borrow_mut()
            .push(AudioEvent::SoundPlay { index, looped });
    }

    fn stop_sound(&self, index: usize) {
        self.events.borrow_mut().push(AudioEvent::SoundStop { index });
    }

    fn play_speech(&self, sound_num: i32) {
        *self.speech.borrow_mut() = Some(sound_num);
        self.events
            .borrow_mut()
            .push(AudioEvent::SpeechPlay { sound_num });
    }

    fn stop_speech(&self) {
        *self.speech.borrow_mut() = None;
        self.events.borrow_mut().push(AudioEvent::SpeechStop);
    }

    fn is_speech_playing(&self) -> bool {
        self.speech.borrow().is_some()
    }
}
