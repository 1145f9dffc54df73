#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Other,
}

impl Key {
    pub const ENTER_CODE: u32 = 13;
    pub const SPACE_CODE: u32 = 32;

    pub fn from_code(code: u32) -> Self {
        match code {
            Self::ENTER_CODE => Key::Enter,
            Self::SPACE_CODE => Key::Space,
            _ => Key::Other,
        }
    }
}

/// What the UI should do with a keystroke in the search field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyAction {
    pub prevent_default: bool,
    /// The pending parameters should be committed with
    /// [`crate::QueryOrchestrator::on_enter_key`].
    pub commit: bool,
}

impl From<Key> for KeyAction {
    fn from(key: Key) -> Self {
        match key {
            Key::Enter => KeyAction {
                prevent_default: true,
                commit: true,
            },
            Key::Space => KeyAction {
                prevent_default: true,
                commit: false,
            },
            Key::Other => KeyAction::default(),
        }
    }
}
