use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KeyModifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub logo: bool,
    #[serde(default)]
    pub shift: bool,
}

impl KeyModifiers {
    pub const NONE: KeyModifiers = KeyModifiers {
        ctrl: false,
        alt: false,
        logo: false,
        shift: false,
    };

    pub const SHIFT: KeyModifiers = KeyModifiers {
        ctrl: false,
        alt: false,
        logo: false,
        shift: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    TogglePlayPause,
    SpeedUp,
    SpeedDown,
    ToggleDirection,
    NextChapter,
    PrevChapter,
}

/// Configured shortcut strings, e.g. `space` or `shift+arrowup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    pub toggle_scroll: String,
    pub speed_up: String,
    pub speed_down: String,
    pub toggle_direction: String,
    pub next_chapter: String,
    pub prev_chapter: String,
}

impl Default for Keymap {
    fn default() -> Self {
        Keymap {
            toggle_scroll: "space".to_string(),
            speed_up: "shift+arrowup".to_string(),
            speed_down: "shift+arrowdown".to_string(),
            toggle_direction: "d".to_string(),
            next_chapter: "n".to_string(),
            prev_chapter: "p".to_string(),
        }
    }
}

impl Keymap {
    /// Resolve a key press. `pressed` is a DOM-style key name such as `" "`,
    /// `"ArrowUp"` or `"n"`.
    pub fn action_for(&self, pressed: &str, modifiers: KeyModifiers) -> Option<ShortcutAction> {
        let pressed = normalize_pressed_key(pressed)?;
        let bindings = [
            (&self.toggle_scroll, "space", ShortcutAction::TogglePlayPause),
            (&self.speed_up, "shift+arrowup", ShortcutAction::SpeedUp),
            (&self.speed_down, "shift+arrowdown", ShortcutAction::SpeedDown),
            (&self.toggle_direction, "d", ShortcutAction::ToggleDirection),
            (&self.next_chapter, "n", ShortcutAction::NextChapter),
            (&self.prev_chapter, "p", ShortcutAction::PrevChapter),
        ];
        bindings
            .into_iter()
            .find(|(raw, fallback, _)| shortcut_matches(raw, fallback, &pressed, modifiers))
            .map(|(_, _, action)| action)
    }
}

fn normalize_pressed_key(raw: &str) -> Option<String> {
    if raw == " " {
        return Some("space".to_string());
    }
    let key = raw.trim().to_ascii_lowercase();
    if key.is_empty() {
        return None;
    }
    Some(key.replace("spacebar", "space"))
}

pub fn shortcut_matches(raw: &str, fallback: &str, pressed: &str, modifiers: KeyModifiers) -> bool {
    let normalized = normalize_shortcut_token(raw, fallback);

    let mut required_ctrl = false;
    let mut required_alt = false;
    let mut required_logo = false;
    let mut required_shift = false;
    let mut required_key: Option<&str> = None;

    for token in normalized
        .split('+')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        match token {
            "ctrl" | "control" => required_ctrl = true,
            "alt" | "option" => required_alt = true,
            "logo" | "meta" | "super" | "cmd" | "command" => required_logo = true,
            "shift" => required_shift = true,
            key => required_key = Some(key),
        }
    }

    let Some(required_key) = required_key else {
        return false;
    };
    if pressed != required_key {
        return false;
    }

    modifiers.ctrl == required_ctrl
        && modifiers.alt == required_alt
        && modifiers.logo == required_logo
        && modifiers.shift == required_shift
}

pub fn normalize_shortcut_token(raw: &str, fallback: &str) -> String {
    let normalized = raw.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        fallback.to_string()
    } else {
        normalized.replace("spacebar", "space")
    }
}
