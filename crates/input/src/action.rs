use glam::Vec2;

/// A high-level camera action. Deltas are in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraAction {
    /// Rotate around the target by a pointer drag.
    Orbit(Vec2),
    /// Slide camera and target together by a pointer drag.
    Pan(Vec2),
    /// Move toward (positive) or away from (negative) the target, in wheel lines.
    Zoom(f32),
    /// Return to the configured view.
    Reset,
    /// Input that maps to nothing.
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Tracks pointer buttons and position between events.
///
/// Primary drag orbits; secondary or middle drag pans, as does primary drag
/// with shift held.
#[derive(Debug, Default, Clone)]
pub struct PointerInput {
    primary: bool,
    secondary: bool,
    middle: bool,
    shift: bool,
    last: Option<Vec2>,
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn button(&mut self, button: PointerButton, pressed: bool) {
        match button {
            PointerButton::Primary => self.primary = pressed,
            PointerButton::Secondary => self.secondary = pressed,
            PointerButton::Middle => self.middle = pressed,
        }
    }

    pub fn set_shift(&mut self, held: bool) {
        self.shift = held;
    }

    pub fn is_dragging(&self) -> bool {
        self.primary || self.secondary || self.middle
    }

    /// Pointer moved to `position`; returns the drag it implies.
    pub fn moved(&mut self, position: Vec2) -> CameraAction {
        let delta = self.last.map(|last| position - last);
        self.last = Some(position);
        let Some(delta) = delta else {
            return CameraAction::Noop;
        };
        if delta == Vec2::ZERO {
            return CameraAction::Noop;
        }
        if self.secondary || self.middle || (self.primary && self.shift) {
            CameraAction::Pan(delta)
        } else if self.primary {
            CameraAction::Orbit(delta)
        } else {
            CameraAction::Noop
        }
    }

    /// Pointer left the window; the next move starts a fresh drag.
    pub fn left(&mut self) {
        self.last = None;
    }

    pub fn wheel(&mut self, lines: f32) -> CameraAction {
        if lines == 0.0 || !lines.is_finite() {
            CameraAction::Noop
        } else {
            CameraAction::Zoom(lines)
        }
    }

    /// Map a key name to an action. Only `R` (reset) is bound.
    pub fn key(&mut self, key: char) -> CameraAction {
        match key.to_ascii_lowercase() {
            'r' => {
                tracing::debug!("camera reset requested");
                CameraAction::Reset
            }
            _ => CameraAction::Noop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_move_has_no_delta() {
        let mut input = PointerInput::new();
        input.button(PointerButton::Primary, true);
        assert_eq!(input.moved(Vec2::new(10.0, 10.0)), CameraAction::Noop);
        assert_eq!(
            input.moved(Vec2::new(15.0, 8.0)),
            CameraAction::Orbit(Vec2::new(5.0, -2.0))
        );
    }

    #[test]
    fn hover_without_buttons_is_noop() {
        let mut input = PointerInput::new();
        input.moved(Vec2::ZERO);
        assert_eq!(input.moved(Vec2::ONE), CameraAction::Noop);
        assert!(!input.is_dragging());
    }

    #[test]
    fn secondary_and_shift_drag_pan() {
        let mut input = PointerInput::new();
        input.moved(Vec2::ZERO);
        input.button(PointerButton::Secondary, true);
        assert_eq!(input.moved(Vec2::X), CameraAction::Pan(Vec2::X));

        input.button(PointerButton::Secondary, false);
        input.button(PointerButton::Primary, true);
        input.set_shift(true);
        assert_eq!(input.moved(Vec2::ZERO), CameraAction::Pan(-Vec2::X));
    }

    #[test]
    fn leaving_resets_drag_origin() {
        let mut input = PointerInput::new();
        input.button(PointerButton::Primary, true);
        input.moved(Vec2::ZERO);
        input.left();
        assert_eq!(input.moved(Vec2::splat(100.0)), CameraAction::Noop);
    }

    #[test]
    fn wheel_and_keys() {
        let mut input = PointerInput::new();
        assert_eq!(input.wheel(1.5), CameraAction::Zoom(1.5));
        assert_eq!(input.wheel(0.0), CameraAction::Noop);
        assert_eq!(input.key('R'), CameraAction::Reset);
        assert_eq!(input.key('q'), CameraAction::Noop);
    }
}
