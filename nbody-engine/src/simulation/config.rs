// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Run configuration
//!
//! A [`SimulationConfig`] carries every knob a run needs: the opening
//! angle, timestep, iteration and frame counts, the gravitational law's
//! constants, the force method, and the worker count used by the parallel
//! protocols. It can be built in code or loaded from TOML:
//!
//! ```toml
//! theta = 0.5
//! dt = 100000.0
//! iterations = 1000
//! frames = 200
//! softening = 1e-8
//! gravitational_constant = 6.673e-11
//! method = "barnes_hut"   # or "direct"
//! workers = 4
//! ```
//!
//! Missing keys take their defaults.

use serde::{Deserialize, Serialize};

use crate::body::{GravityLaw, DEFAULT_SOFTENING, GRAVITATIONAL_CONSTANT};
use crate::error::{Result, SimulationError};
use crate::force::{ForceEvaluator, ForceMethod};
use crate::integration::{Integrator, TaylorIntegrator};
use super::FrameSchedule;

/// Parameters for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Barnes-Hut opening angle
    pub theta: f64,
    /// Timestep in seconds
    pub dt: f64,
    /// Number of steps to run
    pub iterations: usize,
    /// Number of trajectory frames to sample (0 disables sampling)
    pub frames: usize,
    /// Softening added to the cubed separation
    pub softening: f64,
    /// Gravitational constant
    pub gravitational_constant: f64,
    /// Force-evaluation strategy for protocols that support both
    pub method: ForceMethod,
    /// Threads (shared memory) or ranks (distributed)
    pub workers: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            theta: 1.0,
            dt: 100_000.0,
            iterations: 1000,
            frames: 200,
            softening: DEFAULT_SOFTENING,
            gravitational_constant: GRAVITATIONAL_CONSTANT,
            method: ForceMethod::BarnesHut,
            workers: default_workers(),
        }
    }
}

/// Worker count used when none is configured
pub fn default_workers() -> usize {
    #[cfg(feature = "parallel")]
    {
        rayon::current_num_threads().max(1)
    }
    #[cfg(not(feature = "parallel"))]
    {
        1
    }
}

impl SimulationConfig {
    /// Build and validate a configuration from the four core parameters
    ///
    /// Everything else keeps its default.
    pub fn configure(theta: f64, dt: f64, iterations: usize, frames: usize) -> Result<Self> {
        let config = SimulationConfig {
            theta,
            dt,
            iterations,
            frames,
            ..SimulationConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the softening constant
    pub fn with_softening(mut self, softening: f64) -> Self {
        self.softening = softening;
        self
    }

    /// Set the gravitational constant
    pub fn with_gravitational_constant(mut self, g: f64) -> Self {
        self.gravitational_constant = g;
        self
    }

    /// Set the force method
    pub fn with_method(mut self, method: ForceMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Check every value is in range
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SimulationError::InvalidConfig(msg));

        if !(self.theta >= 0.0) {
            return invalid(format!("theta must be non-negative, got {}", self.theta));
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return invalid(format!("dt must be positive and finite, got {}", self.dt));
        }
        self.integrator().validate_timestep()?;
        if self.iterations == 0 {
            return invalid("iterations must be positive".to_string());
        }
        if self.frames > self.iterations {
            return invalid(format!(
                "frames ({}) cannot exceed iterations ({})",
                self.frames, self.iterations
            ));
        }
        if !(self.softening >= 0.0 && self.softening.is_finite()) {
            return invalid(format!(
                "softening must be non-negative and finite, got {}",
                self.softening
            ));
        }
        if !self.gravitational_constant.is_finite() {
            return invalid("gravitational constant must be finite".to_string());
        }
        if self.workers == 0 {
            return invalid("workers must be positive".to_string());
        }
        Ok(())
    }

    /// Gravitational law for this run
    ///
    /// # Panics
    ///
    /// Panics on values [`SimulationConfig::validate`] would reject.
    pub fn law(&self) -> GravityLaw {
        GravityLaw::new(self.gravitational_constant, self.softening)
    }

    /// Integrator for this run
    pub fn integrator(&self) -> TaylorIntegrator {
        TaylorIntegrator::new(self.dt)
    }

    /// Frame sampling schedule for this run
    pub fn schedule(&self) -> FrameSchedule {
        FrameSchedule::new(self.iterations, self.frames)
    }

    /// Force evaluator for the configured method
    pub fn evaluator(&self) -> Box<dyn ForceEvaluator> {
        self.method.evaluator(self.law(), self.theta)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_configure_accepts_reference_values() {
        let config = SimulationConfig::configure(1.0, 100_000.0, 10_000, 2000).unwrap();
        assert_eq!(config.iterations, 10_000);
        assert_eq!(config.schedule().stride(), 5);
    }

    #[test]
    fn test_configure_rejects_bad_values() {
        assert!(SimulationConfig::configure(-0.5, 1.0, 10, 1).is_err());
        assert!(SimulationConfig::configure(f64::NAN, 1.0, 10, 1).is_err());
        assert!(SimulationConfig::configure(0.5, 0.0, 10, 1).is_err());
        assert!(SimulationConfig::configure(0.5, 1.0, 0, 0).is_err());
        assert!(SimulationConfig::configure(0.5, 1.0, 10, 11).is_err());
        assert!(SimulationConfig::default().with_workers(0).validate().is_err());
        assert!(SimulationConfig::default().with_softening(-1.0).validate().is_err());
    }

    #[test]
    fn test_gravitational_constant_reaches_law() {
        let config = SimulationConfig::default().with_gravitational_constant(1.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.law().g_constant(), 1.0);
        assert!(SimulationConfig::default()
            .with_gravitational_constant(f64::INFINITY)
            .validate()
            .is_err());
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn warnings_during(f: impl FnOnce()) -> String {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = log.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_tiny_timestep_warns() {
        let output = warnings_during(|| {
            assert!(SimulationConfig::configure(0.5, 1e-12, 2, 0).is_ok());
        });
        assert!(output.contains("timestep is extremely small"), "captured: {:?}", output);

        let output = warnings_during(|| {
            assert!(SimulationConfig::configure(0.5, 1.0, 2, 0).is_ok());
        });
        assert!(output.is_empty(), "captured: {:?}", output);
    }

    #[test]
    fn test_huge_theta_is_allowed() {
        assert!(SimulationConfig::configure(f64::INFINITY, 1.0, 10, 1).is_ok());
    }

    #[test]
    fn test_from_toml_with_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            theta = 0.5
            iterations = 50
            frames = 5
            method = "direct"
            workers = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.theta, 0.5);
        assert_eq!(config.method, ForceMethod::Direct);
        assert_eq!(config.workers, 3);
        assert_eq!(config.dt, 100_000.0);
        assert_eq!(config.softening, DEFAULT_SOFTENING);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        assert!(matches!(
            SimulationConfig::from_toml_str("iterations = 5\nframes = 10"),
            Err(SimulationError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimulationConfig::from_toml_str("theta = \"wide\""),
            Err(SimulationError::Toml(_))
        ));
    }
}
