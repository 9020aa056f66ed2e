#![allow(missing_docs)]

use scpisync::{channel::OpenTcpOptions, session::InstrumentSession};
use simple_logger::SimpleLogger;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable logging
    SimpleLogger::new().init().unwrap();

    let address = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.0.10:5025".to_string());

    let mut tcp = OpenTcpOptions::new();
    tcp.timeout(Duration::from_secs(3));
    let mut scope = InstrumentSession::open(tcp, &address)?;
    println!("Connected to {}", scope.identity());

    // Reset, autoset, and add an amplitude measurement.
    scope.reset()?;
    scope.autoset()?;
    scope.add_measurement("AMPLITUDE")?;
    scope.stop_acquisition()?;

    // Take a single acquisition and wait for it to complete.
    scope.single_acquisition()?;

    let amplitude = scope.fetch_numeric_result("MEASUREMENT:MEAS1:RESULTS:CURRENTACQ:MEAN?")?;
    println!("Signal amplitude: {amplitude} V");

    // Grab the raw waveform too.
    let timeout = scope.barrier_timeout();
    let curve = scope.channel_mut().query_block("CURVE?", timeout)?;
    println!("Read {} bytes of waveform data", curve.len());

    scope.close()?;
    Ok(())
}
