#![allow(missing_docs)]

use scpisync::{
    address::OpenResourceOptions,
    session::InstrumentSession,
    sweep::{ArtifactNaming, FailurePolicy, SweepController, SweepOptions},
};
use simple_logger::SimpleLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable logging
    SimpleLogger::new().init().unwrap();

    let address = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "TCPIP0::192.168.0.10::5025::SOCKET".to_string());

    // Connect to the scope. The AFG output on the back should be wired to CH1.
    let mut scope = InstrumentSession::open(OpenResourceOptions::new(), &address)?;
    println!("Connected to {}", scope.identity());

    // Step the AFG through each frequency and save a screenshot of each.
    let mut options = SweepOptions::new();
    options
        .naming(ArtifactNaming::new().directory("E:/").clone())
        .policy(FailurePolicy::SkipAndContinue)
        .fetch("MEASUREMENT:MEAS1:RESULTS:CURRENTACQ:MEAN?");
    let mut sweep = SweepController::new(options);
    let report = sweep.run(&mut scope, &[1e5, 1e6, 5e6, 1e7, 5e7])?;
    for step in report.steps() {
        println!("{} Hz: {:?} ({})", step.stimulus(), step.outcome(), step.artifact());
    }

    scope.close()?;
    Ok(())
}
