//! Ordered build driver.
//!
//! Runs build steps strictly in sequence, reporting progress before each
//! one. The first failing step halts the pipeline: later steps never run and
//! nothing already written to the work directory is rolled back.

use std::error::Error as StdError;
use std::fmt;
use std::io::Write;

use tracing::{error, info, warn};

use crate::report::Reporter;
use crate::stage::{BuildStep, Stage, StageContext};

/// A step failed; carries its 1-based position and name.
#[derive(Debug)]
pub struct StageFailure {
    pub step: usize,
    pub total: usize,
    pub name: String,
    pub error: anyhow::Error,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {}/{} failed: {}", self.step, self.total, self.name)
    }
}

impl StdError for StageFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.error.as_ref())
    }
}

/// The sequence of steps making up a build.
pub struct Pipeline {
    steps: Vec<Box<dyn BuildStep>>,
}

impl Pipeline {
    /// The ten standard build stages.
    pub fn standard() -> Self {
        Self::with_steps(
            Stage::all()
                .into_iter()
                .map(|stage| Box::new(stage) as Box<dyn BuildStep>)
                .collect(),
        )
    }

    pub fn with_steps(steps: Vec<Box<dyn BuildStep>>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step in order, stopping at the first failure.
    pub fn run<W: Write>(
        &self,
        ctx: &StageContext<'_>,
        reporter: &mut Reporter<W>,
    ) -> Result<(), StageFailure> {
        let total = self.steps.len();
        info!("starting build with {} step(s)", total);

        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;
            let name = step.name();
            if let Err(e) = reporter.progress(number, total, &name) {
                warn!("failed to write progress: {}", e);
            }

            if let Err(e) = step.run(ctx) {
                error!("step {} ({}) failed: {:#}", number, name, e);
                return Err(StageFailure {
                    step: number,
                    total,
                    name: name.into_owned(),
                    error: e,
                });
            }
        }

        info!("all {} step(s) completed", total);
        Ok(())
    }
}
