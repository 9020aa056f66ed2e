//! Error types raised by a [`SweepController`](crate::sweep::SweepController).

use super::Error;
use crate::sweep::Operation;

/// The one-time setup before a sweep failed, so no step was run.
#[derive(Debug)]
pub struct SweepSetupError(Box<(Operation, Error)>);

impl SweepSetupError {
    /// Create a new `SweepSetupError`.
    pub(crate) fn new(operation: Operation, source: Error) -> Self {
        SweepSetupError(Box::new((operation, source)))
    }

    /// The setup operation that failed.
    pub fn operation(&self) -> Operation {
        self.0 .0
    }

    /// The underlying error.
    pub fn source_error(&self) -> &Error {
        &self.0 .1
    }

    /// Consume the error and return the underlying error.
    pub fn into_source(self) -> Error {
        self.0 .1
    }
}

impl_error_display! {
    SweepSetupError,
    self => "sweep setup failed during {}: {}", self.0.0, self.0.1
}

/// One step of a sweep failed.
///
/// The step is identified both by its position in the input list and by its
/// stimulus value so that the sweep can be diagnosed or resumed.
#[derive(Debug)]
pub struct SweepStepError(Box<StepFailure>);

#[derive(Debug)]
struct StepFailure {
    index: usize,
    stimulus: f64,
    operation: Operation,
    source: Error,
}

impl SweepStepError {
    /// Create a new `SweepStepError`.
    pub(crate) fn new(index: usize, stimulus: f64, operation: Operation, source: Error) -> Self {
        SweepStepError(Box::new(StepFailure {
            index,
            stimulus,
            operation,
            source,
        }))
    }

    /// The position of the step in the input list.
    pub fn index(&self) -> usize {
        self.0.index
    }

    /// The stimulus value of the step.
    pub fn stimulus(&self) -> f64 {
        self.0.stimulus
    }

    /// The operation that failed.
    pub fn operation(&self) -> Operation {
        self.0.operation
    }

    /// The underlying error.
    pub fn source_error(&self) -> &Error {
        &self.0.source
    }

    /// Consume the error and return the underlying error.
    pub fn into_source(self) -> Error {
        self.0.source
    }
}

impl_error_display! {
    SweepStepError,
    self => "sweep step {} (stimulus {}) failed during {}: {}",
    self.0.index,
    self.0.stimulus,
    self.0.operation,
    self.0.source
}

error_enum! {
    /// Any error that ends a sweep early.
    #[derive(Debug)]
    #[non_exhaustive]
    pub enum SweepError {
        Setup(SweepSetupError),
        Step(SweepStepError),
    }
}
impl_is_variant! { SweepError { Setup, Step } }

impl SweepError {
    /// The underlying error, whichever phase of the sweep failed.
    pub fn source_error(&self) -> &Error {
        match self {
            SweepError::Setup(e) => e.source_error(),
            SweepError::Step(e) => e.source_error(),
        }
    }
}
