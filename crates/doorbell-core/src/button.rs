//! Rising-edge detection for the doorbell button

/// Compares each button sample with the previous one.
///
/// The pin idles low through its pull-down, so a press shows up as a low to
/// high transition. Holding the button produces one edge, not a stream of them.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeDetector {
    last: bool,
}

impl EdgeDetector {
    pub const fn new() -> Self {
        Self { last: false }
    }

    /// Record `sample` and report whether it completes a rising edge.
    pub fn update(&mut self, sample: bool) -> bool {
        let rising = sample && !self.last;
        self.last = sample;
        rising
    }

    pub const fn last(&self) -> bool {
        self.last
    }
}
