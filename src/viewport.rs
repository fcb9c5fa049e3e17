// ABOUTME: Fits the fixed-aspect design canvas into its container
// ABOUTME: Computes a uniform scale factor and applies it as a visual transform

use log::debug;

use crate::config::{CANVAS_HEIGHT, CANVAS_WIDTH};

/// Receives the scale transform for the canvas root.
///
/// Implementations change only the visual scale, never layout dimensions, so
/// coordinates seen by the rest of the deck stay in design space.
pub trait ScaleTarget {
    fn apply_scale(&self, scale: f64);
}

/// Tracks the container size and keeps the canvas scaled to fit it.
#[derive(Debug, Clone)]
pub struct ViewportFitter {
    canvas_width: f64,
    canvas_height: f64,
    scale: Option<f64>,
}

impl Default for ViewportFitter {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl ViewportFitter {
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            canvas_width,
            canvas_height,
            scale: None,
        }
    }

    /// Uniform, aspect-preserving scale for a container of the given size.
    ///
    /// Degenerate containers (zero, negative or non-finite sizes) yield `0.0`.
    pub fn compute_scale(&self, container_width: f64, container_height: f64) -> f64 {
        if !(container_width.is_finite() && container_height.is_finite())
            || container_width <= 0.0
            || container_height <= 0.0
        {
            return 0.0;
        }
        (container_width / self.canvas_width).min(container_height / self.canvas_height)
    }

    /// Recompute the scale for a mount or resize event and apply it to `target`.
    pub fn fit(
        &mut self,
        container_width: f64,
        container_height: f64,
        target: &dyn ScaleTarget,
    ) -> f64 {
        let scale = self.compute_scale(container_width, container_height);
        debug!(
            "Fitting canvas into {}x{} container at scale {:.4}",
            container_width, container_height, scale
        );
        target.apply_scale(scale);
        self.scale = Some(scale);
        scale
    }

    /// Scale last applied, if any event has been seen yet
    pub fn current_scale(&self) -> Option<f64> {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingTarget {
        applied: RefCell<Vec<f64>>,
    }

    impl ScaleTarget for RecordingTarget {
        fn apply_scale(&self, scale: f64) {
            self.applied.borrow_mut().push(scale);
        }
    }

    #[test]
    fn test_design_size_is_unit_scale() {
        assert_eq!(ViewportFitter::default().compute_scale(1600.0, 900.0), 1.0);
    }

    #[test]
    fn test_half_size_container() {
        assert_eq!(ViewportFitter::default().compute_scale(800.0, 450.0), 0.5);
    }

    #[test]
    fn test_scale_is_bounded_by_smaller_axis() {
        let fitter = ViewportFitter::default();
        assert_eq!(fitter.compute_scale(1600.0, 1800.0), 1.0);
        assert_eq!(fitter.compute_scale(800.0, 1800.0), 0.5);
        assert_eq!(fitter.compute_scale(3200.0, 450.0), 0.5);
    }

    #[test]
    fn test_degenerate_container_yields_zero() {
        let fitter = ViewportFitter::default();
        assert_eq!(fitter.compute_scale(0.0, 900.0), 0.0);
        assert_eq!(fitter.compute_scale(-10.0, 900.0), 0.0);
        assert_eq!(fitter.compute_scale(f64::NAN, 900.0), 0.0);
    }

    #[test]
    fn test_fit_applies_every_resize() {
        let mut fitter = ViewportFitter::default();
        let target = RecordingTarget::default();
        assert_eq!(fitter.current_scale(), None);

        fitter.fit(1600.0, 900.0, &target);
        fitter.fit(800.0, 900.0, &target);

        assert_eq!(*target.applied.borrow(), vec![1.0, 0.5]);
        assert_eq!(fitter.current_scale(), Some(0.5));
    }
}
