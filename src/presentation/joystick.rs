//! On-screen joystick
//!
//! Drag the knob to deflect the stick. While dragged it reports a vector
//! every frame; releasing it reports a single neutral sample. Deduplication
//! happens downstream in the dispatcher.

use crate::domain::models::{ControlSurface, JoystickVector};
use eframe::egui::{self, Color32, Pos2, Rect, Sense, Stroke, Vec2};

pub struct Joystick {
    pub surface: ControlSurface,
    pub radius: f32,
    /// Knob offset from the centre, normalised to the base radius.
    knob: Vec2,
    dragging: bool,
}

impl Joystick {
    pub fn new(surface: ControlSurface, radius: f32) -> Self {
        Self {
            surface,
            radius,
            knob: Vec2::ZERO,
            dragging: false,
        }
    }

    pub fn vector(&self) -> JoystickVector {
        JoystickVector::new(self.knob.x as f64, self.knob.y as f64)
    }

    /// Draw the stick and return the sample to forward this frame, if any.
    /// `threshold` is only used to draw the neutral band.
    pub fn show(&mut self, ui: &mut egui::Ui, threshold: f64) -> Option<JoystickVector> {
        let size = Vec2::splat(self.radius * 2.0);
        let (rect, response) = ui.allocate_exact_size(size, Sense::drag());
        let center = rect.center();

        let drag = if response.dragged() {
            response
                .interact_pointer_pos()
                .map(|pointer| knob_offset(center, pointer, self.radius))
        } else {
            None
        };
        let sample = self.step(drag);

        self.paint(ui, rect, threshold as f32);
        sample
    }

    /// Advance one frame. `drag` is the normalised knob offset while the
    /// pointer holds the stick and `None` otherwise.
    fn step(&mut self, drag: Option<Vec2>) -> Option<JoystickVector> {
        match drag {
            Some(knob) => {
                self.knob = knob;
                self.dragging = true;
                Some(self.vector())
            }
            None if self.dragging => {
                self.knob = Vec2::ZERO;
                self.dragging = false;
                Some(JoystickVector::NEUTRAL)
            }
            None => None,
        }
    }

    fn paint(&self, ui: &egui::Ui, rect: Rect, threshold: f32) {
        let painter = ui.painter_at(rect.expand(4.0));
        let visuals = ui.visuals();
        let stroke_color = visuals.widgets.noninteractive.fg_stroke.color;
        let center = rect.center();

        painter.circle_filled(center, self.radius, visuals.widgets.inactive.bg_fill);
        painter.circle_stroke(center, self.radius, Stroke::new(2.0, stroke_color));

        // Per-axis neutral band.
        let band = Rect::from_center_size(center, Vec2::splat(2.0 * threshold * self.radius));
        painter.rect_stroke(band, 0.0, Stroke::new(1.0, stroke_color.gamma_multiply(0.4)));

        let knob_color = if self.dragging {
            visuals.widgets.active.bg_fill
        } else {
            Color32::from_gray(160)
        };
        let knob_center = center + self.knob * self.radius;
        let knob_radius = self.radius * 0.3;
        painter.circle_filled(knob_center, knob_radius, knob_color);
        painter.circle_stroke(knob_center, knob_radius, Stroke::new(2.0, stroke_color));
    }
}

/// Pointer offset from `center`, limited to the base circle and scaled to
/// the unit disc.
fn knob_offset(center: Pos2, pointer: Pos2, radius: f32) -> Vec2 {
    let offset = pointer - center;
    let length = offset.length();
    if length > radius {
        offset / length
    } else {
        offset / radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knob_offset_inside_circle() {
        let v = knob_offset(Pos2::new(100.0, 100.0), Pos2::new(100.0, 70.0), 60.0);
        assert_eq!(v, Vec2::new(0.0, -0.5));
    }

    #[test]
    fn test_knob_offset_is_limited_to_rim() {
        let v = knob_offset(Pos2::new(0.0, 0.0), Pos2::new(300.0, 0.0), 60.0);
        assert_eq!(v, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_idle_stick_is_neutral() {
        let mut stick = Joystick::new(ControlSurface::Pad, 50.0);
        assert_eq!(stick.vector(), JoystickVector::NEUTRAL);
        assert_eq!(stick.step(None), None);
    }

    #[test]
    fn test_drag_reports_every_frame() {
        let mut stick = Joystick::new(ControlSurface::Joystick, 90.0);
        let held = Vec2::new(0.0, -0.6);
        assert_eq!(stick.step(Some(held)), Some(JoystickVector::new(0.0, -0.6_f32 as f64)));
        assert_eq!(stick.step(Some(held)), Some(JoystickVector::new(0.0, -0.6_f32 as f64)));
    }

    #[test]
    fn test_release_reports_one_neutral() {
        let mut stick = Joystick::new(ControlSurface::Joystick, 90.0);
        stick.step(Some(Vec2::new(0.5, 0.5)));
        assert_eq!(stick.step(None), Some(JoystickVector::NEUTRAL));
        assert_eq!(stick.vector(), JoystickVector::NEUTRAL);
        assert_eq!(stick.step(None), None);
        assert_eq!(stick.step(None), None);
    }
}
