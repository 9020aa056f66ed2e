//! Stepping an instrument through a list of stimulus values.
//!
//! A [`SweepController`] prepares the instrument once, then, for each stimulus
//! value in turn, sets the stimulus, autosets, waits for the signal to settle,
//! and saves a screen capture named after the value:
//!
//! ```rust
//! # use scpisync::{
//! #     channel::OpenTcpOptions,
//! #     session::InstrumentSession,
//! #     sweep::{ArtifactNaming, SweepController, SweepOptions},
//! # };
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let mut scope = InstrumentSession::open(OpenTcpOptions::new(), "192.168.0.10:5025")?;
//! let mut options = SweepOptions::new();
//! options.naming(ArtifactNaming::new().directory("E:/").clone());
//! let mut sweep = SweepController::new(options);
//! let report = sweep.run(&mut scope, &[1e5, 1e6, 5e6, 1e7, 5e7])?;
//! for step in report.steps() {
//!     println!("{} Hz -> {}", step.stimulus(), step.artifact());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Every instrument operation is followed by a completion barrier, but the
//! settle delay is separate: the instrument may report an operation complete
//! before the signal it produces is stable.

use crate::{
	channel::SessionState,
	error::{Error, SweepError, SweepSetupError, SweepStepError},
	session::{Connect, InstrumentSession},
};
use std::time::Duration;

/// An operation performed by a sweep.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Resetting the instrument.
	Reset,
	/// Configuring a measurement.
	ConfigureMeasurement,
	/// Turning on the stimulus output.
	EnableStimulus,
	/// Autosetting.
	Autoset,
	/// Setting the stimulus frequency.
	SetStimulusFrequency,
	/// Saving a screen capture.
	Capture,
	/// Fetching a numeric measurement result.
	FetchResult,
}

impl std::fmt::Display for Operation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Operation::Reset => "reset",
			Operation::ConfigureMeasurement => "configure measurement",
			Operation::EnableStimulus => "enable stimulus",
			Operation::Autoset => "autoset",
			Operation::SetStimulusFrequency => "set stimulus frequency",
			Operation::Capture => "capture",
			Operation::FetchResult => "fetch result",
		})
	}
}

/// Where a sweep is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum SweepState {
	/// No sweep has been run.
	#[default]
	Idle,
	/// The instrument is being prepared.
	Configuring,
	/// The step at this position in the stimulus list is running.
	Sweeping {
		/// The position of the step.
		step: usize,
	},
	/// Every step was attempted.
	Done,
	/// The sweep stopped early.
	Aborted,
}

/// What to do when a step fails.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum FailurePolicy {
	/// Stop the sweep.
	#[default]
	AbortOnFirstError,
	/// Record the failure and go on with the next step.
	///
	/// If the failure faulted the session, the sweep stops anyway.
	SkipAndContinue,
}

/// A measurement to configure before sweeping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeasurementSetup {
	/// The measurement slot.
	pub slot: u32,
	/// What to measure, e.g., `FREQUENCY`.
	pub kind: String,
	/// Where to measure it, e.g., `CH1`.
	pub source: String,
}

impl MeasurementSetup {
	/// Create a new `MeasurementSetup`.
	pub fn new<K: Into<String>, S: Into<String>>(slot: u32, kind: K, source: S) -> Self {
		MeasurementSetup {
			slot,
			kind: kind.into(),
			source: source.into(),
		}
	}
}

/// How screen captures are named.
///
/// The capture for stimulus value `v` is saved at
/// `<directory>/<prefix>_<v>.<extension>`.
///
/// ```
/// # use scpisync::sweep::ArtifactNaming;
/// let naming = ArtifactNaming::new().directory("E:/").clone();
/// assert_eq!(naming.path(1e6), "E:/test_1000000.png");
/// assert_eq!(ArtifactNaming::new().path(2.5), "test_2.5.png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactNaming {
	directory: String,
	prefix: String,
	extension: String,
}

impl ArtifactNaming {
	/// Create the default naming: `test_<v>.png` in the instrument's current
	/// directory.
	pub fn new() -> Self {
		ArtifactNaming {
			directory: String::new(),
			prefix: "test".to_string(),
			extension: "png".to_string(),
		}
	}

	/// Set the directory on the instrument captures are saved in.
	pub fn directory<S: Into<String>>(&mut self, directory: S) -> &mut Self {
		self.directory = directory.into();
		self
	}

	/// Set the file name prefix. The default is `test`.
	pub fn prefix<S: Into<String>>(&mut self, prefix: S) -> &mut Self {
		self.prefix = prefix.into();
		self
	}

	/// Set the file extension. The default is `png`.
	pub fn extension<S: Into<String>>(&mut self, extension: S) -> &mut Self {
		self.extension = extension.into();
		self
	}

	/// The path of the capture for stimulus value `stimulus`.
	pub fn path(&self, stimulus: f64) -> String {
		let separator = if self.directory.is_empty() || self.directory.ends_with(['/', '\\']) {
			""
		} else {
			"/"
		};
		format!(
			"{}{}{}_{}.{}",
			self.directory, separator, self.prefix, stimulus, self.extension
		)
	}
}

impl Default for ArtifactNaming {
	fn default() -> Self {
		ArtifactNaming::new()
	}
}

/// Options for configuring a sweep.
#[derive(Debug, Clone)]
pub struct SweepOptions {
	settle: Duration,
	initial_settle: Duration,
	policy: FailurePolicy,
	naming: ArtifactNaming,
	measurements: Vec<MeasurementSetup>,
	enable_stimulus: bool,
	fetch: Vec<String>,
}

impl SweepOptions {
	/// Create the default options.
	///
	/// Measurement 1 measures the frequency and measurement 2 the
	/// peak-to-peak amplitude of `CH1`. The stimulus output is enabled during
	/// setup, which settles for 1 second. Each step settles for 700 ms and the
	/// sweep stops at the first failure.
	pub fn new() -> Self {
		SweepOptions {
			settle: Duration::from_millis(700),
			initial_settle: Duration::from_millis(1000),
			policy: FailurePolicy::default(),
			naming: ArtifactNaming::default(),
			measurements: vec![
				MeasurementSetup::new(1, "FREQUENCY", "CH1"),
				MeasurementSetup::new(2, "PK2PK", "CH1"),
			],
			enable_stimulus: true,
			fetch: Vec::new(),
		}
	}

	/// Set how long to wait after autosetting before capturing.
	pub fn settle(&mut self, delay: Duration) -> &mut Self {
		self.settle = delay;
		self
	}

	/// Set how long to wait after setup before the first step.
	pub fn initial_settle(&mut self, delay: Duration) -> &mut Self {
		self.initial_settle = delay;
		self
	}

	/// Set what to do when a step fails.
	pub fn policy(&mut self, policy: FailurePolicy) -> &mut Self {
		self.policy = policy;
		self
	}

	/// Set how captures are named.
	pub fn naming(&mut self, naming: ArtifactNaming) -> &mut Self {
		self.naming = naming;
		self
	}

	/// Set the measurements to configure during setup, replacing the defaults.
	pub fn measurements<I: IntoIterator<Item = MeasurementSetup>>(
		&mut self,
		measurements: I,
	) -> &mut Self {
		self.measurements = measurements.into_iter().collect();
		self
	}

	/// Set whether setup turns on the stimulus output.
	pub fn enable_stimulus(&mut self, enable: bool) -> &mut Self {
		self.enable_stimulus = enable;
		self
	}

	/// Add a query whose numeric answer is recorded after each capture.
	pub fn fetch<S: Into<String>>(&mut self, query: S) -> &mut Self {
		self.fetch.push(query.into());
		self
	}
}

impl Default for SweepOptions {
	fn default() -> Self {
		SweepOptions::new()
	}
}

/// How a step ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
	/// The capture was saved and every result fetched.
	Captured {
		/// The fetched results, in the order of the queries.
		results: Vec<f64>,
	},
	/// The step failed.
	Failed {
		/// The operation that failed.
		operation: Operation,
		/// Why it failed.
		reason: String,
	},
}

/// The record of one attempted step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
	index: usize,
	stimulus: f64,
	artifact: String,
	outcome: StepOutcome,
}

impl StepRecord {
	/// The position of the step in the stimulus list.
	pub fn index(&self) -> usize {
		self.index
	}

	/// The stimulus value.
	pub fn stimulus(&self) -> f64 {
		self.stimulus
	}

	/// The path of the step's capture on the instrument.
	pub fn artifact(&self) -> &str {
		&self.artifact
	}

	/// How the step ended.
	pub fn outcome(&self) -> &StepOutcome {
		&self.outcome
	}

	/// Whether the step succeeded.
	pub fn is_captured(&self) -> bool {
		matches!(self.outcome, StepOutcome::Captured { .. })
	}
}

/// The record of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
	steps: Vec<StepRecord>,
	state: SweepState,
}

impl SweepReport {
	/// Every attempted step, in the order they ran.
	pub fn steps(&self) -> &[StepRecord] {
		&self.steps
	}

	/// The state the sweep finished in: [`Done`](SweepState::Done) or
	/// [`Aborted`](SweepState::Aborted).
	pub fn state(&self) -> SweepState {
		self.state
	}

	/// The steps that failed.
	pub fn failures(&self) -> impl Iterator<Item = &StepRecord> + '_ {
		self.steps.iter().filter(|step| !step.is_captured())
	}
}

/// Runs sweeps on an [`InstrumentSession`].
#[derive(Debug)]
pub struct SweepController {
	options: SweepOptions,
	state: SweepState,
	report: Option<SweepReport>,
}

/// Tag the error of an operation with the operation.
fn during<T, E: Into<Error>>(operation: Operation, result: Result<T, E>) -> Result<T, (Operation, Error)> {
	result.map_err(|e| (operation, e.into()))
}

fn settle(delay: Duration) {
	if !delay.is_zero() {
		std::thread::sleep(delay);
	}
}

impl SweepController {
	/// Create a controller that runs sweeps with `options`.
	pub fn new(options: SweepOptions) -> Self {
		SweepController {
			options,
			state: SweepState::Idle,
			report: None,
		}
	}

	/// Get the options sweeps are run with.
	pub fn options(&self) -> &SweepOptions {
		&self.options
	}

	/// Get where the current (or last) sweep is.
	pub fn state(&self) -> SweepState {
		self.state
	}

	/// Get the report of the last sweep, including one that stopped early.
	pub fn report(&self) -> Option<&SweepReport> {
		self.report.as_ref()
	}

	/// Prepare the instrument for sweeping.
	fn setup<'a, C: Connect<'a>>(
		&self,
		session: &mut InstrumentSession<'a, C>,
	) -> Result<(), (Operation, Error)> {
		during(Operation::Reset, session.reset())?;
		for m in &self.options.measurements {
			during(
				Operation::ConfigureMeasurement,
				session.configure_measurement(m.slot, &m.kind, &m.source),
			)?;
		}
		if self.options.enable_stimulus {
			during(Operation::EnableStimulus, session.enable_stimulus())?;
		}
		during(Operation::Autoset, session.autoset())?;
		settle(self.options.initial_settle);
		Ok(())
	}

	/// Run one step.
	fn step<'a, C: Connect<'a>>(
		&self,
		session: &mut InstrumentSession<'a, C>,
		stimulus: f64,
		artifact: &str,
	) -> Result<Vec<f64>, (Operation, Error)> {
		during(
			Operation::SetStimulusFrequency,
			session.set_stimulus_frequency(stimulus),
		)?;
		during(Operation::Autoset, session.autoset())?;
		settle(self.options.settle);
		during(Operation::Capture, session.force_capture(artifact))?;
		self.options
			.fetch
			.iter()
			.map(|query| during(Operation::FetchResult, session.fetch_numeric_result(query)))
			.collect()
	}

	/// Run a sweep over `stimuli`.
	///
	/// The instrument is set up once, then each value is visited exactly once,
	/// in order. The instrument may finish writing captures in any order.
	///
	/// If setup fails, no step is run. If a step fails, the sweep stops unless
	/// the [`FailurePolicy`] says to skip it and the session is still
	/// [open](SessionState::Open). A sweep that completes is reported even if
	/// steps were skipped; see [`SweepReport::failures`]. A sweep that stops
	/// early returns the error that stopped it, and its partial report is
	/// available from [`report`](SweepController::report).
	pub fn run<'a, C: Connect<'a>>(
		&mut self,
		session: &mut InstrumentSession<'a, C>,
		stimuli: &[f64],
	) -> Result<SweepReport, SweepError> {
		self.report = None;
		self.state = SweepState::Configuring;
		log::info!(
			"{} sweep of {} steps: configuring",
			session.address(),
			stimuli.len()
		);
		if let Err((operation, e)) = self.setup(session) {
			self.state = SweepState::Aborted;
			log::warn!("{} sweep setup failed during {}: {}", session.address(), operation, e);
			return Err(SweepSetupError::new(operation, e).into());
		}

		let mut steps = Vec::with_capacity(stimuli.len());
		for (index, &stimulus) in stimuli.iter().enumerate() {
			self.state = SweepState::Sweeping { step: index };
			let artifact = self.options.naming.path(stimulus);
			log::info!(
				"{} sweep step {}/{}: {} -> {}",
				session.address(),
				index + 1,
				stimuli.len(),
				stimulus,
				artifact
			);
			match self.step(session, stimulus, &artifact) {
				Ok(results) => steps.push(StepRecord {
					index,
					stimulus,
					artifact,
					outcome: StepOutcome::Captured { results },
				}),
				Err((operation, e)) => {
					steps.push(StepRecord {
						index,
						stimulus,
						artifact,
						outcome: StepOutcome::Failed {
							operation,
							reason: e.to_string(),
						},
					});
					let error = SweepStepError::new(index, stimulus, operation, e);
					if self.options.policy == FailurePolicy::AbortOnFirstError
						|| session.state() != SessionState::Open
					{
						log::warn!("{} sweep aborted: {}", session.address(), error);
						self.state = SweepState::Aborted;
						self.report = Some(SweepReport {
							steps,
							state: SweepState::Aborted,
						});
						return Err(error.into());
					}
					log::warn!("{} sweep skipping: {}", session.address(), error);
				}
			}
		}

		self.state = SweepState::Done;
		log::info!("{} sweep done", session.address());
		let report = SweepReport {
			steps,
			state: SweepState::Done,
		};
		self.report = Some(report.clone());
		Ok(report)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		backend::{Mock, MockRecorder},
		channel::{Channel, Direction},
		error::TransportError,
	};
	use std::{cell::RefCell, rc::Rc, time::Instant};

	const IDN: &str = "TEKTRONIX,MSO58B,C000001,CF:91.1CT FV:1.0\n";
	const MEAN: &str = "MEASUREMENT:MEAS1:RESULTS:CURRENTACQ:MEAN?";

	/// Barriers issued by the default setup.
	const SETUP_BARRIERS: usize = 7;
	/// Barriers issued by each step.
	const STEP_BARRIERS: usize = 3;

	fn fast_options() -> SweepOptions {
		let mut options = SweepOptions::new();
		options
			.settle(Duration::ZERO)
			.initial_settle(Duration::ZERO);
		options
	}

	/// Open a session to a simulated scope that answers `barriers` barriers and
	/// then stops answering. `replies` are queued on top.
	fn session<'r>(
		recorder: &'r MockRecorder,
		barriers: Option<usize>,
		replies: &'r [(&'r str, &'r str)],
	) -> InstrumentSession<
		'static,
		impl FnMut(&str) -> Result<Channel<'static, Mock>, TransportError> + 'r,
	> {
		let connect = move |_: &str| -> Result<Channel<'static, Mock>, TransportError> {
			let mut mock = Mock::with_recorder(recorder.clone());
			mock.reply_to("*IDN?", IDN);
			match barriers {
				Some(n) => {
					for _ in 0..n {
						mock.reply_to("*OPC?", "1\n");
					}
					mock.reply_to("*OPC?", "");
				}
				None => {
					mock.reply_to("*OPC?", "1\n");
				}
			}
			for (line, reply) in replies {
				mock.reply_to(*line, *reply);
			}
			Ok(Channel::open_mock(mock))
		};
		let mut session = InstrumentSession::open(connect, "ADDR").unwrap();
		session.set_barrier_timeout(Duration::from_millis(100));
		recorder.clear_lines();
		session
	}

	fn lines_starting_with(recorder: &MockRecorder, prefix: &str) -> Vec<String> {
		recorder
			.lines()
			.into_iter()
			.filter(|line| line.starts_with(prefix))
			.collect()
	}

	#[test]
	fn five_step_sweep() {
		let recorder = MockRecorder::new();
		let mut session = session(&recorder, None, &[]);
		let mut options = fast_options();
		options.naming(ArtifactNaming::new().directory("E:/").clone());
		let mut sweep = SweepController::new(options);
		assert_eq!(sweep.state(), SweepState::Idle);

		let report = sweep
			.run(&mut session, &[1e5, 1e6, 5e6, 1e7, 5e7])
			.unwrap();
		assert_eq!(report.state(), SweepState::Done);
		assert_eq!(sweep.state(), SweepState::Done);
		assert_eq!(report.steps().len(), 5);
		assert_eq!(report.failures().count(), 0);
		assert_eq!(report.steps()[1].artifact(), "E:/test_1000000.png");
		assert_eq!(sweep.report(), Some(&report));

		assert_eq!(
			lines_starting_with(&recorder, "AFG:FREQUENCY"),
			[
				"AFG:FREQUENCY 100000",
				"AFG:FREQUENCY 1000000",
				"AFG:FREQUENCY 5000000",
				"AFG:FREQUENCY 10000000",
				"AFG:FREQUENCY 50000000",
			]
		);
		assert_eq!(
			lines_starting_with(&recorder, "SAVE:IMAGE"),
			[
				"SAVE:IMAGE 'E:/test_100000.png'",
				"SAVE:IMAGE 'E:/test_1000000.png'",
				"SAVE:IMAGE 'E:/test_5000000.png'",
				"SAVE:IMAGE 'E:/test_10000000.png'",
				"SAVE:IMAGE 'E:/test_50000000.png'",
			]
		);

		// Setup, then each step in order, every operation behind a barrier.
		let lines = recorder.lines();
		assert_eq!(
			lines[..14],
			[
				"*RST",
				"*OPC?",
				"MEASUREMENT:MEAS1:TYPE FREQUENCY",
				"*OPC?",
				"MEASUREMENT:MEAS1:SOURCE CH1",
				"*OPC?",
				"MEASUREMENT:MEAS2:TYPE PK2PK",
				"*OPC?",
				"MEASUREMENT:MEAS2:SOURCE CH1",
				"*OPC?",
				"AFG:OUTPUT:MODE CONTINUOUS",
				"*OPC?",
				"AUTOSET EXECUTE",
				"*OPC?",
			]
		);
		assert_eq!(
			lines[14..20],
			[
				"AFG:FREQUENCY 100000",
				"*OPC?",
				"AUTOSET EXECUTE",
				"*OPC?",
				"SAVE:IMAGE 'E:/test_100000.png'",
				"*OPC?",
			]
		);
		assert_eq!(lines.len(), 2 * (SETUP_BARRIERS + 5 * STEP_BARRIERS));
	}

	#[test]
	fn settle_delays_fall_between_autoset_and_capture() {
		const SETTLE: Duration = Duration::from_millis(50);
		const INITIAL_SETTLE: Duration = Duration::from_millis(80);

		let recorder = MockRecorder::new();
		let mut session = session(&recorder, None, &[]);
		let traffic = Rc::new(RefCell::new(Vec::new()));
		let log = Rc::clone(&traffic);
		session
			.channel_mut()
			.set_line_handler(move |line, direction| {
				let line = String::from_utf8_lossy(line).trim_end().to_string();
				log.borrow_mut().push((line, direction, Instant::now()));
			});
		let mut options = SweepOptions::new();
		options.settle(SETTLE).initial_settle(INITIAL_SETTLE);
		let mut sweep = SweepController::new(options);

		let start = Instant::now();
		sweep.run(&mut session, &[1e5, 1e6, 5e6]).unwrap();
		assert!(start.elapsed() >= INITIAL_SETTLE + 3 * SETTLE);

		let traffic = traffic.borrow();
		let gap_before = |i: usize| traffic[i].2.duration_since(traffic[i - 1].2);

		// The initial settle follows the setup's final autoset barrier.
		let first_step = traffic
			.iter()
			.position(|(line, ..)| line.starts_with("AFG:FREQUENCY"))
			.unwrap();
		assert_eq!(traffic[first_step - 3].0, "AUTOSET EXECUTE");
		assert_eq!(traffic[first_step - 1].1, Direction::Recv);
		assert!(gap_before(first_step) >= INITIAL_SETTLE);

		// Each capture waits out the settle after its autoset barrier answered.
		let captures: Vec<usize> = traffic
			.iter()
			.enumerate()
			.filter(|(_, (line, ..))| line.starts_with("SAVE:IMAGE"))
			.map(|(i, _)| i)
			.collect();
		assert_eq!(captures.len(), 3);
		for i in captures {
			assert_eq!(traffic[i - 3].0, "AUTOSET EXECUTE");
			assert_eq!(traffic[i - 2].0, "*OPC?");
			assert_eq!(traffic[i - 1].1, Direction::Recv);
			assert!(gap_before(i) >= SETTLE, "capture {i} settled {:?}", gap_before(i));
		}
	}

	#[test]
	fn failed_setup_runs_no_steps() {
		let recorder = MockRecorder::new();
		let mut session = session(&recorder, Some(2), &[]);
		let mut sweep = SweepController::new(fast_options());

		let err = sweep.run(&mut session, &[1e5, 1e6]).unwrap_err();
		let SweepError::Setup(err) = err else {
			panic!("unexpected error: {err:?}");
		};
		assert_eq!(err.operation(), Operation::ConfigureMeasurement);
		assert!(err.source_error().is_timeout());
		assert_eq!(sweep.state(), SweepState::Aborted);
		assert!(sweep.report().is_none());
		assert!(lines_starting_with(&recorder, "AFG:FREQUENCY").is_empty());
	}

	#[test]
	fn abort_on_first_error() {
		let recorder = MockRecorder::new();
		let replies = [(MEAN, "1.0E+5\n"), (MEAN, "ERR\n"), (MEAN, "5.0E+6\n")];
		let mut session = session(&recorder, None, &replies);
		let mut options = fast_options();
		options.fetch(MEAN);
		let mut sweep = SweepController::new(options);

		let err = sweep.run(&mut session, &[1e5, 1e6, 5e6]).unwrap_err();
		let SweepError::Step(err) = err else {
			panic!("unexpected error: {err:?}");
		};
		assert_eq!(err.index(), 1);
		assert_eq!(err.stimulus(), 1e6);
		assert_eq!(err.operation(), Operation::FetchResult);
		assert!(err.source_error().is_parse());

		assert_eq!(sweep.state(), SweepState::Aborted);
		let report = sweep.report().unwrap();
		assert_eq!(report.state(), SweepState::Aborted);
		assert_eq!(report.steps().len(), 2);
		assert_eq!(lines_starting_with(&recorder, "AFG:FREQUENCY").len(), 2);
		// A parse failure leaves the session usable.
		assert_eq!(session.state(), SessionState::Open);
	}

	#[test]
	fn skip_and_continue() {
		let recorder = MockRecorder::new();
		let replies = [(MEAN, "1.0E+5\n"), (MEAN, "ERR\n"), (MEAN, "5.0E+6\n")];
		let mut session = session(&recorder, None, &replies);
		let mut options = fast_options();
		options.fetch(MEAN).policy(FailurePolicy::SkipAndContinue);
		let mut sweep = SweepController::new(options);

		let report = sweep.run(&mut session, &[1e5, 1e6, 5e6]).unwrap();
		assert_eq!(report.state(), SweepState::Done);
		assert_eq!(report.steps().len(), 3);
		assert_eq!(
			report.steps()[0].outcome(),
			&StepOutcome::Captured {
				results: vec![1e5]
			}
		);
		assert!(matches!(
			report.steps()[1].outcome(),
			StepOutcome::Failed {
				operation: Operation::FetchResult,
				..
			}
		));
		assert_eq!(
			report.steps()[2].outcome(),
			&StepOutcome::Captured {
				results: vec![5e6]
			}
		);
		let failures: Vec<_> = report.failures().map(StepRecord::index).collect();
		assert_eq!(failures, [1]);
	}

	#[test]
	fn skip_stops_once_faulted() {
		let recorder = MockRecorder::new();
		// Answer setup and the first step, then nothing.
		let mut session = session(&recorder, Some(SETUP_BARRIERS + STEP_BARRIERS), &[]);
		let mut options = fast_options();
		options.policy(FailurePolicy::SkipAndContinue);
		let mut sweep = SweepController::new(options);

		let err = sweep.run(&mut session, &[1e5, 1e6, 5e6]).unwrap_err();
		let SweepError::Step(err) = err else {
			panic!("unexpected error: {err:?}");
		};
		assert_eq!(err.index(), 1);
		assert_eq!(err.operation(), Operation::SetStimulusFrequency);
		assert!(err.source_error().is_timeout());
		assert_eq!(session.state(), SessionState::Faulted);
		assert_eq!(sweep.state(), SweepState::Aborted);
		assert_eq!(lines_starting_with(&recorder, "AFG:FREQUENCY").len(), 2);
	}

	#[test]
	fn artifact_naming() {
		let mut naming = ArtifactNaming::new();
		assert_eq!(naming.path(1e5), "test_100000.png");
		naming.directory("captures").prefix("run").extension("bmp");
		assert_eq!(naming.path(5e7), "captures/run_50000000.bmp");
		naming.directory("C:\\captures\\");
		assert_eq!(naming.path(0.5), "C:\\captures\\run_0.5.bmp");
	}
}
