#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Quiet,
    Firing,
}

/// Edge-triggered alert for one metric.
///
/// Fires only on the tick a value goes from `<= threshold` to `> threshold`,
/// then stays silent until the value is back at or below the threshold.
#[derive(Debug, Clone, Default)]
pub struct AlertGate {
    state: GateState,
}

impl AlertGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the gate by one tick. Returns true when an alert should be raised.
    pub fn evaluate(&mut self, value: f64, threshold: f64) -> bool {
        let above = value > threshold;
        match (self.state, above) {
            (GateState::Quiet, true) => {
                self.state = GateState::Firing;
                true
            }
            (GateState::Firing, false) => {
                self.state = GateState::Quiet;
                false
            }
            _ => false,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_firing(&self) -> bool {
        self.state == GateState::Firing
    }
}
