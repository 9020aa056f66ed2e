//! The command text an [`InstrumentSession`](super::InstrumentSession) sends.

use std::fmt::Display;

/// The command text for each operation of an
/// [`InstrumentSession`](super::InstrumentSession).
///
/// Nothing about a particular instrument is built into the session itself;
/// everything it writes comes from here. Templates may contain the
/// placeholders `{slot}`, `{kind}`, `{source}`, `{value}`, and `{path}`, which
/// are replaced with the operation's arguments.
///
/// The [default](Vocabulary::default) targets 5-series mixed-signal
/// oscilloscopes with a built-in arbitrary function generator.
///
/// ## Example
///
/// ```
/// # use scpisync::session::Vocabulary;
/// let mut vocabulary = Vocabulary::new();
/// vocabulary
///     .set_stimulus_frequency("SOURCE1:FREQUENCY {value}")
///     .set_capture("HCOPY:FILE '{path}'");
/// assert_eq!(vocabulary.stimulus_frequency(2e3), "SOURCE1:FREQUENCY 2000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    identity: String,
    reset: String,
    barrier: String,
    measurement_type: String,
    measurement_source: String,
    add_measurement: String,
    autoset: String,
    stimulus_frequency: String,
    stimulus_enable: String,
    capture: String,
    stop_acquisition: String,
    single_acquisition: Vec<String>,
}

/// Replace `{key}` in `template` with `value`.
fn fill<V: Display>(template: &str, key: &str, value: V) -> String {
    template.replace(&format!("{{{key}}}"), &value.to_string())
}

macro_rules! vocabulary_setters {
    ($($(#[$doc:meta])* $setter:ident => $field:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $setter<S: Into<String>>(&mut self, text: S) -> &mut Self {
                self.$field = text.into();
                self
            }
        )+
    };
}

impl Vocabulary {
    /// Create the default vocabulary.
    ///
    /// Equivalent to [`default`](Vocabulary::default).
    pub fn new() -> Self {
        Vocabulary {
            identity: "*IDN?".to_string(),
            reset: "*RST".to_string(),
            barrier: "*OPC?".to_string(),
            measurement_type: "MEASUREMENT:MEAS{slot}:TYPE {kind}".to_string(),
            measurement_source: "MEASUREMENT:MEAS{slot}:SOURCE {source}".to_string(),
            add_measurement: "MEASUREMENT:ADDMEAS {kind}".to_string(),
            autoset: "AUTOSET EXECUTE".to_string(),
            stimulus_frequency: "AFG:FREQUENCY {value}".to_string(),
            stimulus_enable: "AFG:OUTPUT:MODE CONTINUOUS".to_string(),
            capture: "SAVE:IMAGE '{path}'".to_string(),
            stop_acquisition: "ACQUIRE:STATE STOP".to_string(),
            single_acquisition: vec![
                "ACQUIRE:STOPAFTER SEQUENCE".to_string(),
                "ACQUIRE:STATE RUN".to_string(),
                "TRIGGER FORCE".to_string(),
            ],
        }
    }

    vocabulary_setters! {
        /// Set the identity query. The default is `*IDN?`.
        set_identity => identity,
        /// Set the reset command. The default is `*RST`.
        set_reset => reset,
        /// Set the completion barrier query. The default is `*OPC?`.
        set_barrier => barrier,
        /// Set the template selecting a measurement's kind.
        set_measurement_type => measurement_type,
        /// Set the template selecting a measurement's source.
        set_measurement_source => measurement_source,
        /// Set the template adding a measurement.
        set_add_measurement => add_measurement,
        /// Set the autoset command.
        set_autoset => autoset,
        /// Set the template setting the stimulus frequency.
        set_stimulus_frequency => stimulus_frequency,
        /// Set the command enabling the stimulus output.
        set_stimulus_enable => stimulus_enable,
        /// Set the template saving a screen capture.
        set_capture => capture,
        /// Set the command stopping acquisition.
        set_stop_acquisition => stop_acquisition,
    }

    /// Set the commands that run one triggered acquisition. A single barrier
    /// follows the last of them.
    pub fn set_single_acquisition<I, S>(&mut self, commands: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.single_acquisition = commands.into_iter().map(Into::into).collect();
        self
    }

    /// The identity query.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The reset command.
    pub fn reset(&self) -> &str {
        &self.reset
    }

    /// The completion barrier query.
    pub fn barrier(&self) -> &str {
        &self.barrier
    }

    /// The command selecting the kind of measurement in `slot`.
    pub fn measurement_type(&self, slot: u32, kind: &str) -> String {
        fill(&fill(&self.measurement_type, "slot", slot), "kind", kind)
    }

    /// The command selecting the source of the measurement in `slot`.
    pub fn measurement_source(&self, slot: u32, source: &str) -> String {
        fill(&fill(&self.measurement_source, "slot", slot), "source", source)
    }

    /// The command adding a measurement of `kind`.
    pub fn add_measurement(&self, kind: &str) -> String {
        fill(&self.add_measurement, "kind", kind)
    }

    /// The autoset command.
    pub fn autoset(&self) -> &str {
        &self.autoset
    }

    /// The command setting the stimulus frequency.
    pub fn stimulus_frequency(&self, value: f64) -> String {
        fill(&self.stimulus_frequency, "value", value)
    }

    /// The command enabling the stimulus output.
    pub fn stimulus_enable(&self) -> &str {
        &self.stimulus_enable
    }

    /// The command saving a screen capture to `path`.
    pub fn capture(&self, path: &str) -> String {
        fill(&self.capture, "path", path)
    }

    /// The command stopping acquisition.
    pub fn stop_acquisition(&self) -> &str {
        &self.stop_acquisition
    }

    /// The commands that run one triggered acquisition.
    pub fn single_acquisition(&self) -> &[String] {
        &self.single_acquisition
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_templates() {
        let v = Vocabulary::default();
        assert_eq!(v.measurement_type(1, "FREQUENCY"), "MEASUREMENT:MEAS1:TYPE FREQUENCY");
        assert_eq!(v.measurement_source(2, "CH1"), "MEASUREMENT:MEAS2:SOURCE CH1");
        assert_eq!(v.add_measurement("AMPLITUDE"), "MEASUREMENT:ADDMEAS AMPLITUDE");
        assert_eq!(v.stimulus_frequency(1e6), "AFG:FREQUENCY 1000000");
        assert_eq!(v.capture("E:/test_100000.png"), "SAVE:IMAGE 'E:/test_100000.png'");
        assert_eq!(v.single_acquisition().len(), 3);
    }

    #[test]
    fn custom_templates() {
        let mut v = Vocabulary::new();
        v.set_measurement_type("MEAS{slot}:{kind}:{kind}")
            .set_single_acquisition(["INIT", "*TRG"]);
        assert_eq!(v.measurement_type(3, "VPP"), "MEAS3:VPP:VPP");
        assert_eq!(v.single_acquisition(), ["INIT", "*TRG"]);
    }
}
