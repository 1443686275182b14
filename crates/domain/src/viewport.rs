//! Viewport geometry: how much of a section container is on screen.

use std::time::Duration;

/// Vertical extent of a box in page coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub top: f64,
    pub height: f64,
}

impl Span {
    #[must_use]
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Options for observing one container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityOptions {
    /// Fraction of the container (0, 1] that must be visible to fire.
    pub threshold: f64,
    /// Pixels shaved off the bottom of the viewport before intersecting.
    pub root_margin_bottom: f64,
    /// Wait between crossing the threshold and firing.
    pub settle_delay: Duration,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            root_margin_bottom: 100.0,
            settle_delay: Duration::from_millis(800),
        }
    }
}

/// Fraction of `container` inside `viewport` once the viewport's bottom edge
/// is pulled up by `root_margin_bottom`.
///
/// Returns a value in `[0, 1]`; a zero-height container is never visible.
#[must_use]
pub fn visible_fraction(container: Span, viewport: Span, root_margin_bottom: f64) -> f64 {
    if container.height <= 0.0 {
        return 0.0;
    }
    let view_bottom = viewport.bottom() - root_margin_bottom;
    let overlap = container.bottom().min(view_bottom) - container.top.max(viewport.top);
    (overlap / container.height).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn should_report_zero_when_container_is_below_viewport() {
        let fraction = visible_fraction(Span::new(2000.0, 500.0), Span::new(0.0, 800.0), 0.0);
        assert!(fraction.abs() < EPSILON);
    }

    #[test]
    fn should_report_full_visibility_when_container_is_inside() {
        let fraction = visible_fraction(Span::new(100.0, 400.0), Span::new(0.0, 800.0), 0.0);
        assert!((fraction - 1.0).abs() < EPSILON);
    }

    #[test]
    fn should_report_partial_overlap() {
        let fraction = visible_fraction(Span::new(600.0, 400.0), Span::new(0.0, 800.0), 0.0);
        assert!((fraction - 0.5).abs() < EPSILON);
    }

    #[test]
    fn should_shrink_viewport_by_root_margin() {
        let fraction = visible_fraction(Span::new(600.0, 400.0), Span::new(0.0, 800.0), 100.0);
        assert!((fraction - 0.25).abs() < EPSILON);
    }

    #[test]
    fn should_never_report_zero_height_container_as_visible() {
        let fraction = visible_fraction(Span::new(100.0, 0.0), Span::new(0.0, 800.0), 0.0);
        assert!(fraction.abs() < EPSILON);
    }

    #[test]
    fn should_default_to_thirty_percent_after_settle_delay() {
        let options = VisibilityOptions::default();
        assert!((options.threshold - 0.3).abs() < EPSILON);
        assert_eq!(options.settle_delay, Duration::from_millis(800));
    }
}
