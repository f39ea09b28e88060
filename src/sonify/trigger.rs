//! Edge trigger for bodies entering or leaving the sensing zone.

/// Edge reported by a [`TriggerState`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trigger {
    /// The summed gain just rose above the threshold.
    Enter,
    /// The summed gain just fell to or below the threshold.
    Exit,
    /// No crossing since the previous step.
    #[default]
    Stay,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enter => write!(f, "enter"),
            Self::Exit => write!(f, "exit"),
            Self::Stay => write!(f, "stay"),
        }
    }
}

/// Memory carried between trigger steps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriggerState {
    /// Level seen on the previous step (`Enter` above, `Exit` below).
    pub previous_status: Trigger,
    /// Gain sum seen on the previous step.
    pub previous_sum: f32,
}

impl TriggerState {
    /// Classifies `sum` against `enter_threshold` and reports the edge.
    ///
    /// A level that matches the previous one reports `Stay`. The first step
    /// after construction always reports the current level.
    pub fn step(&mut self, sum: f32, enter_threshold: f32) -> Trigger {
        let status = if sum > enter_threshold {
            Trigger::Enter
        } else {
            Trigger::Exit
        };

        let trigger = if status == self.previous_status {
            Trigger::Stay
        } else {
            status
        };

        if trigger != Trigger::Stay {
            tracing::debug!(
                "Trigger {}: gain sum {:.3} -> {:.3} (threshold {:.3})",
                trigger,
                self.previous_sum,
                sum,
                enter_threshold
            );
        }

        self.previous_status = status;
        self.previous_sum = sum;
        trigger
    }
}
