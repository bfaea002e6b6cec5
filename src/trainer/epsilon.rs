/// Exploration rate that decays multiplicatively toward a floor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpsilonSchedule {
    start: f32,
    end: f32,
    decay: f32,
    value: f32,
}

impl EpsilonSchedule {
    pub fn new(start: f32, end: f32, decay: f32) -> Self {
        EpsilonSchedule {
            start,
            end,
            decay,
            value: start,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// `epsilon <- max(end, epsilon * decay)`
    pub fn decay(&mut self) -> f32 {
        self.value = (self.value * self.decay).max(self.end);
        self.value
    }

    pub fn reset(&mut self) {
        self.value = self.start;
    }

    /// Pins epsilon to a fixed value, clamped to `[0, 1]`
    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(0.0, 1.0);
    }
}
