// ABOUTME: Staggered entrance timing for elements on the active slide
// ABOUTME: Maps an ordinal reveal step to an animation delay and its markup

use std::time::Duration;

/// Delay between consecutive reveal steps
pub const DEFAULT_REVEAL_UNIT: Duration = Duration::from_millis(120);

/// Class carried by every animatable element
pub const REVEAL_CLASS: &str = "reveal";
/// Class applied while the owning slide is active
pub const ANIMATING_CLASS: &str = "animate-fade-up";
/// Class applied while the owning slide is inactive
pub const HIDDEN_CLASS: &str = "reveal-hidden";

/// Computes per-element entrance delays from a reveal step.
///
/// Step `1` appears immediately; every following step waits one more `unit`.
/// The delay only applies while the owning slide is active. An inactive slide
/// renders its elements in the hidden pre-animation state with no delay at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTimer {
    unit: Duration,
}

impl Default for RevealTimer {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_UNIT)
    }
}

impl RevealTimer {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Delay for step `d`. Steps below 1 are treated as step 1.
    pub fn delay(&self, d: u32) -> Duration {
        self.unit * d.saturating_sub(1)
    }

    /// Inline style carrying the delay for step `d`.
    ///
    /// The stylesheet reads the variable only under an active slide, so an
    /// inactive slide never observes it.
    pub fn style(&self, d: u32) -> String {
        format!("--reveal-delay:{}ms", self.delay(d).as_millis())
    }
}

/// Class list for an animatable element given its slide's activation.
pub fn reveal_classes(active: bool) -> String {
    if active {
        format!("{} {}", REVEAL_CLASS, ANIMATING_CLASS)
    } else {
        format!("{} {}", REVEAL_CLASS, HIDDEN_CLASS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_has_no_delay() {
        assert_eq!(RevealTimer::default().delay(1), Duration::ZERO);
    }

    #[test]
    fn test_delay_is_linear_in_step() {
        let timer = RevealTimer::default();
        assert_eq!(timer.delay(3), Duration::from_millis(2 * 120));
        assert_eq!(timer.delay(11), Duration::from_millis(1200));
    }

    #[test]
    fn test_delay_is_non_decreasing() {
        let timer = RevealTimer::default();
        let delays: Vec<Duration> = (0..64).map(|d| timer.delay(d)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_step_zero_behaves_like_step_one() {
        assert_eq!(RevealTimer::default().delay(0), Duration::ZERO);
    }

    #[test]
    fn test_inactive_slide_uses_hidden_state() {
        let classes = reveal_classes(false);
        assert!(classes.contains(HIDDEN_CLASS));
        assert!(!classes.contains(ANIMATING_CLASS));
    }

    #[test]
    fn test_active_slide_animates() {
        assert_eq!(reveal_classes(true), "reveal animate-fade-up");
    }

    #[test]
    fn test_style_uses_custom_unit() {
        let timer = RevealTimer::new(Duration::from_millis(50));
        assert_eq!(timer.style(5), "--reveal-delay:200ms");
    }
}
