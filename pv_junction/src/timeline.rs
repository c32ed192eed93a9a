//! Narrated steps of the demo, keyed by elapsed animation time

use serde::Deserialize;

use crate::config::ConfigError;

/// One narrated step, active from `time` seconds onward
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimelineStep {
    pub time: f32,
    pub label: String,
    pub info: String,
}

impl TimelineStep {
    pub fn new(time: f32, label: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            time,
            label: label.into(),
            info: info.into(),
        }
    }
}

/// Validated, time-ordered list of steps
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    steps: Vec<TimelineStep>,
}

impl Timeline {
    /// Accepts steps whose times are finite, non-negative and non-decreasing
    pub fn new(steps: Vec<TimelineStep>) -> Result<Self, ConfigError> {
        let mut previous = 0.0_f32;
        for (index, step) in steps.iter().enumerate() {
            if !step.time.is_finite() || step.time < 0.0 {
                return Err(ConfigError::InvalidStepTime {
                    index,
                    time: step.time,
                });
            }
            if step.time < previous {
                return Err(ConfigError::StepsOutOfOrder {
                    index,
                    time: step.time,
                    previous,
                });
            }
            previous = step.time;
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&TimelineStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the last step whose time has been reached.
    ///
    /// `None` when the timeline is empty or `elapsed` is before the first step.
    pub fn phase_at(&self, elapsed: f32) -> Option<usize> {
        self.steps.iter().rposition(|step| elapsed >= step.time)
    }

    /// Total narrated duration, i.e. when the final step begins
    pub fn final_time(&self) -> f32 {
        self.steps.last().map_or(0.0, |step| step.time)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            steps: vec![
                TimelineStep::new(0.0, "Ready", "Click play to start the PV effect."),
                TimelineStep::new(
                    2.0,
                    "Photon Incident",
                    "Sunlight (photons) passes the AR coating into the silicon wafer.",
                ),
                TimelineStep::new(
                    4.0,
                    "Excite Electrons",
                    "Photon energy is absorbed, creating free electrons and holes.",
                ),
                TimelineStep::new(
                    6.0,
                    "Field Separation",
                    "The PN junction field separates electrons and holes.",
                ),
                TimelineStep::new(
                    8.0,
                    "Circuit Current",
                    "Electrons flow through the external circuit and light the bulb.",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Timeline {
        Timeline::new(vec![
            TimelineStep::new(0.0, "A", "first"),
            TimelineStep::new(2.0, "B", "second"),
            TimelineStep::new(4.0, "C", "third"),
        ])
        .expect("valid timeline")
    }

    #[test]
    fn selects_last_reached_step() {
        let timeline = abc();
        assert_eq!(timeline.phase_at(0.0), Some(0));
        assert_eq!(timeline.phase_at(1.9), Some(0));
        assert_eq!(timeline.phase_at(2.0), Some(1));
        assert_eq!(timeline.phase_at(3.99), Some(1));
    }

    #[test]
    fn pins_to_last_step() {
        let timeline = abc();
        assert_eq!(timeline.phase_at(5.0), Some(2));
        assert_eq!(timeline.phase_at(1000.0), Some(2));
    }

    #[test]
    fn nothing_before_first_step_or_when_empty() {
        let late = Timeline::new(vec![TimelineStep::new(1.0, "Late", "")]).expect("valid");
        assert_eq!(late.phase_at(0.5), None);
        assert_eq!(Timeline::new(Vec::new()).expect("valid").phase_at(3.0), None);
    }

    #[test]
    fn equal_times_resolve_to_later_step() {
        let timeline = Timeline::new(vec![
            TimelineStep::new(0.0, "A", ""),
            TimelineStep::new(1.0, "B", ""),
            TimelineStep::new(1.0, "C", ""),
        ])
        .expect("non-decreasing is fine");
        assert_eq!(timeline.phase_at(1.0), Some(2));
    }

    #[test]
    fn rejects_out_of_order_steps() {
        let result = Timeline::new(vec![
            TimelineStep::new(0.0, "A", ""),
            TimelineStep::new(3.0, "B", ""),
            TimelineStep::new(2.0, "C", ""),
        ]);
        assert!(matches!(
            result,
            Err(ConfigError::StepsOutOfOrder { index: 2, .. })
        ));
    }

    #[test]
    fn rejects_negative_and_nan_times() {
        let negative = Timeline::new(vec![TimelineStep::new(-1.0, "A", "")]);
        assert!(matches!(negative, Err(ConfigError::InvalidStepTime { index: 0, .. })));
        let nan = Timeline::new(vec![TimelineStep::new(f32::NAN, "A", "")]);
        assert!(matches!(nan, Err(ConfigError::InvalidStepTime { index: 0, .. })));
    }

    #[test]
    fn default_matches_demo_script() {
        let timeline = Timeline::default();
        assert_eq!(timeline.len(), 5);
        assert_eq!(timeline.get(0).map(|s| s.label.as_str()), Some("Ready"));
        assert_eq!(timeline.final_time(), 8.0);
        assert!(Timeline::new(timeline.steps().to_vec()).is_ok());
    }
}
