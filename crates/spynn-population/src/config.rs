//! Simulation timing configuration.
//!
//! All timing values the data specification needs come from here: the
//! machine time step, how much slower than real time the machine runs,
//! and how many time steps the run lasts.

use crate::error::{PopulationError, Result};
use spynn_chip::system::DEFAULT_APPLICATION_MAGIC;
use tracing::{info, warn};

/// Environment override for the machine time step (µs)
pub const ENV_MACHINE_TIME_STEP: &str = "SPYNN_MACHINE_TIME_STEP_US";
/// Environment override for the time scale factor
pub const ENV_TIME_SCALE_FACTOR: &str = "SPYNN_TIME_SCALE_FACTOR";

/// Default machine time step (µs)
pub const DEFAULT_MACHINE_TIME_STEP_US: u32 = 1000;

/// Timing shared by every core of a simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Simulated time per tick (µs)
    pub machine_time_step_us: u32,
    /// Wall-clock slow-down factor
    pub time_scale_factor: u32,
    /// Length of the run in ticks
    pub n_machine_time_steps: u32,
    /// Magic number the executable checks in the system region
    pub application_magic: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            machine_time_step_us: DEFAULT_MACHINE_TIME_STEP_US,
            time_scale_factor: 1,
            n_machine_time_steps: 0,
            application_magic: DEFAULT_APPLICATION_MAGIC,
        }
    }
}

impl SimulationConfig {
    /// Build timing from a time step and an optional time scale factor
    ///
    /// Without a time scale factor the machine is slowed so that one tick
    /// takes at least a millisecond of wall-clock time. With one, a tick
    /// shorter than a millisecond is rejected unless
    /// `allow_sub_millisecond_ticks` is set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTiming` for a zero time step or scale factor, or a
    /// wall-clock tick below 1 ms that was not explicitly allowed.
    pub fn new(
        machine_time_step_us: u32,
        time_scale_factor: Option<u32>,
        allow_sub_millisecond_ticks: bool,
    ) -> Result<Self> {
        if machine_time_step_us == 0 {
            return Err(PopulationError::invalid_timing("machine time step is zero"));
        }

        let time_scale_factor = match time_scale_factor {
            Some(0) => {
                return Err(PopulationError::invalid_timing("time scale factor is zero"));
            }
            Some(tsf) => {
                if u64::from(machine_time_step_us) * u64::from(tsf) < 1000 {
                    if !allow_sub_millisecond_ticks {
                        return Err(PopulationError::invalid_timing(format!(
                            "time step {machine_time_step_us} µs × time scale factor {tsf} \
                             gives a wall-clock tick below 1 ms"
                        )));
                    }
                    warn!(
                        "Time step {} µs × time scale factor {} gives a wall-clock tick \
                         that is not reliably supported by the machine",
                        machine_time_step_us, tsf
                    );
                }
                tsf
            }
            None => {
                let tsf = 1000u32.div_ceil(machine_time_step_us).max(1);
                if tsf > 1 {
                    warn!(
                        "Time step {} µs forced the simulation to run {}× slower than real time",
                        machine_time_step_us, tsf
                    );
                }
                tsf
            }
        };

        info!(
            "Machine time step {} µs, time scale factor {}",
            machine_time_step_us, time_scale_factor
        );

        let config = Self {
            machine_time_step_us,
            time_scale_factor,
            ..Self::default()
        };
        config.timer_period_us()?;
        Ok(config)
    }

    /// Build timing from defaults and environment overrides
    ///
    /// # Errors
    ///
    /// Returns `InvalidTiming` when an override does not parse or the
    /// resulting combination is invalid.
    pub fn from_env() -> Result<Self> {
        let step = match std::env::var(ENV_MACHINE_TIME_STEP) {
            Ok(v) => v.trim().parse().map_err(|_| {
                PopulationError::invalid_timing(format!("{ENV_MACHINE_TIME_STEP}={v} is not a number"))
            })?,
            Err(_) => DEFAULT_MACHINE_TIME_STEP_US,
        };
        let tsf = match std::env::var(ENV_TIME_SCALE_FACTOR) {
            Ok(v) => Some(v.trim().parse().map_err(|_| {
                PopulationError::invalid_timing(format!("{ENV_TIME_SCALE_FACTOR}={v} is not a number"))
            })?),
            Err(_) => None,
        };
        Self::new(step, tsf, false)
    }

    /// Set the run length from a duration in milliseconds, rounding up to whole ticks
    ///
    /// # Errors
    ///
    /// Returns `InvalidTiming` for a negative or non-finite duration, or
    /// one that needs more ticks than a 32-bit counter holds.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn with_run_time_ms(mut self, run_time_ms: f64) -> Result<Self> {
        let ticks = (run_time_ms * 1000.0 / f64::from(self.machine_time_step_us)).ceil();
        if !(0.0..=f64::from(u32::MAX)).contains(&ticks) {
            return Err(PopulationError::invalid_timing(format!(
                "run time {run_time_ms} ms is not 0..={} ticks of {} µs",
                u32::MAX,
                self.machine_time_step_us
            )));
        }
        self.n_machine_time_steps = ticks as u32;
        Ok(self)
    }

    /// Set the run length in ticks
    #[must_use]
    pub const fn with_time_steps(mut self, n_machine_time_steps: u32) -> Self {
        self.n_machine_time_steps = n_machine_time_steps;
        self
    }

    /// Extend the run by another `run_time_ms` without resetting
    ///
    /// # Errors
    ///
    /// As [`with_run_time_ms`](Self::with_run_time_ms), and `InvalidTiming`
    /// when the total overflows the tick counter.
    pub fn extend_run_ms(self, run_time_ms: f64) -> Result<Self> {
        let already = self.n_machine_time_steps;
        let extra = self.clone().with_run_time_ms(run_time_ms)?.n_machine_time_steps;
        let total = already.checked_add(extra).ok_or_else(|| {
            PopulationError::invalid_timing(format!(
                "{already} + {extra} ticks overflows the tick counter"
            ))
        })?;
        Ok(self.with_time_steps(total))
    }

    /// Wall-clock timer period written to the system region (µs)
    ///
    /// # Errors
    ///
    /// Returns `InvalidTiming` when time step × time scale factor does not
    /// fit in 32 bits.
    pub fn timer_period_us(&self) -> Result<u32> {
        self.machine_time_step_us
            .checked_mul(self.time_scale_factor)
            .ok_or_else(|| {
                PopulationError::invalid_timing(format!(
                    "time step {} µs × time scale factor {} overflows the timer period",
                    self.machine_time_step_us, self.time_scale_factor
                ))
            })
    }

    /// Milliseconds of simulated time per tick
    pub fn time_step_ms(&self) -> f64 {
        f64::from(self.machine_time_step_us) / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_millisecond_step_runs_real_time() {
        let cfg = SimulationConfig::new(1000, None, false).unwrap();
        assert_eq!(cfg.time_scale_factor, 1);
        assert_eq!(cfg.timer_period_us().ok(), Some(1000));
    }

    #[test]
    fn short_steps_raise_scale_factor() {
        let cfg = SimulationConfig::new(100, None, false).unwrap();
        assert_eq!(cfg.time_scale_factor, 10);
        let cfg = SimulationConfig::new(300, None, false).unwrap();
        assert_eq!(cfg.time_scale_factor, 4);
    }

    #[test]
    fn explicit_sub_millisecond_tick_needs_opt_in() {
        assert!(SimulationConfig::new(100, Some(2), false).is_err());
        let cfg = SimulationConfig::new(100, Some(2), true).unwrap();
        assert_eq!(cfg.timer_period_us().ok(), Some(200));
    }

    #[test]
    fn zero_values_are_rejected() {
        assert!(SimulationConfig::new(0, None, false).is_err());
        assert!(SimulationConfig::new(1000, Some(0), false).is_err());
    }

    #[test]
    fn run_time_rounds_up() {
        let cfg = SimulationConfig::new(1000, None, false)
            .unwrap()
            .with_run_time_ms(1000.0)
            .unwrap();
        assert_eq!(cfg.n_machine_time_steps, 1000);
        let cfg = SimulationConfig::new(300, None, false)
            .unwrap()
            .with_run_time_ms(1000.0)
            .unwrap();
        assert_eq!(cfg.n_machine_time_steps, 3334);
    }

    #[test]
    fn consecutive_runs_accumulate() {
        let cfg = SimulationConfig::default()
            .with_run_time_ms(1000.0)
            .and_then(|c| c.extend_run_ms(1000.0))
            .and_then(|c| c.extend_run_ms(1000.0))
            .unwrap();
        assert_eq!(cfg.n_machine_time_steps, 3000);
    }

    #[test]
    fn tick_counter_overflow_is_rejected() {
        let cfg = SimulationConfig::default().with_time_steps(u32::MAX - 10);
        assert!(matches!(
            cfg.clone().extend_run_ms(11.0),
            Err(PopulationError::InvalidTiming { .. })
        ));
        assert_eq!(
            cfg.extend_run_ms(10.0).map(|c| c.n_machine_time_steps).ok(),
            Some(u32::MAX)
        );
        assert!(SimulationConfig::default().with_run_time_ms(-1.0).is_err());
        assert!(SimulationConfig::default().with_run_time_ms(f64::NAN).is_err());
        assert!(SimulationConfig::default().with_run_time_ms(5.0e12).is_err());
    }

    #[test]
    fn timer_period_overflow_is_rejected() {
        assert!(matches!(
            SimulationConfig::new(1 << 20, Some(1 << 12), false),
            Err(PopulationError::InvalidTiming { .. })
        ));
        let cfg = SimulationConfig {
            machine_time_step_us: u32::MAX,
            time_scale_factor: 2,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            cfg.timer_period_us(),
            Err(PopulationError::InvalidTiming { .. })
        ));
    }
}
