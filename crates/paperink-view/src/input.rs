//! Input vocabulary and gesture decisions.
//!
//! Framework-free event types; the embedding shell maps its toolkit's
//! events onto these. One gesture is decided per pointer-down from the
//! button and modifiers, and stays exclusive until release.

use paperink_core::BrushTool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state at the time of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }
}

/// The mutually exclusive gestures a pointer-down can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Right-button drag.
    Pan,
    /// Left-button drag while annotation is enabled, draw tool.
    Draw,
    /// Left-button drag while annotation is enabled, erase tool.
    Erase,
    /// Alt + left-button drag: rectangular text selection.
    SelectText,
}

/// Decide the gesture for a pointer-down, or `None` when the event should
/// fall through to the default scroll behavior.
pub fn gesture_for(
    button: PointerButton,
    modifiers: Modifiers,
    annotation_enabled: bool,
    tool: BrushTool,
) -> Option<Gesture> {
    match button {
        PointerButton::Right => Some(Gesture::Pan),
        PointerButton::Left if modifiers.alt => Some(Gesture::SelectText),
        PointerButton::Left if annotation_enabled => Some(match tool {
            BrushTool::Draw => Gesture::Draw,
            BrushTool::Erase => Gesture::Erase,
        }),
        _ => None,
    }
}

/// What a wheel event does, decided by modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelAction {
    /// Ctrl + wheel.
    Zoom,
    /// Shift + wheel while annotation is enabled.
    BrushSize,
    /// Unmodified wheel.
    Scroll,
}

pub fn wheel_action(modifiers: Modifiers, annotation_enabled: bool) -> WheelAction {
    if modifiers.shift && annotation_enabled {
        WheelAction::BrushSize
    } else if modifiers.ctrl {
        WheelAction::Zoom
    } else {
        WheelAction::Scroll
    }
}

/// Temporary tool switch while Shift is held: draw flips to erase on press
/// and back on release. Returns the tool to switch to, if any.
pub fn shift_override(tool: BrushTool, pressed: bool) -> Option<BrushTool> {
    match (tool, pressed) {
        (BrushTool::Draw, true) => Some(BrushTool::Erase),
        (BrushTool::Erase, false) => Some(BrushTool::Draw),
        _ => None,
    }
}
