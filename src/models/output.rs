//! Output - property logging channels
//!
//! Each `output` section declares one channel: a list of properties sampled
//! at a rate in Hz. Samples are kept in memory as `(time, values)` rows and
//! written as CSV when the channel has a file name.
//!
//! ```json
//! { "name": "output", "attributes": { "name": "run.csv", "rate": 20 },
//!   "children": [
//!     { "name": "property", "value": "position/h-sl-ft" },
//!     { "name": "property", "value": "velocities/vt-fps" }
//! ] }
//! ```
//!
//! Rates are clamped to 0..=1000 Hz and converted to a frame divisor of
//! `0.5 + 1/(dt*rate)`. A rate of zero disables the channel. Nothing is
//! logged while the executive holds.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::settable;
use crate::config::Element;
use crate::error::ModelError;
use crate::model::{LoadContext, Model, ModelBase, RateGate};
use crate::property::{PropertyManager, PropertyNode};
use crate::utils::constants::OUTPUT_RATE_MAX_HZ;
use crate::utils::indexed_property_name;

#[derive(Debug, Clone, Default)]
pub struct OutputInputs {
    pub sim_time: f64,
}

/// One logging channel
#[derive(Debug, Clone)]
pub struct OutputChannel {
    index: usize,
    file: Option<PathBuf>,
    labels: Vec<String>,
    nodes: Vec<PropertyNode>,
    dt: f64,

    // State
    rate_hz: f64,
    enabled: bool,
    gate: RateGate,
    rows: Vec<(f64, Vec<f64>)>,
    run_number: u32,

    rate_node: PropertyNode,
}

impl OutputChannel {
    fn load(el: &Element, index: usize, ctx: &LoadContext<'_>) -> Result<Self, ModelError> {
        let mut labels = Vec::new();
        let mut nodes = Vec::new();
        for p in el.find_all("property") {
            let Some(name) = p.value() else { continue };
            match ctx.pm.node(name, false) {
                Some(node) => {
                    labels.push(name.to_string());
                    nodes.push(node);
                }
                None => warn!(property = name, "Output property does not exist, skipping"),
            }
        }

        let rate_hz = match el.attr("rate") {
            Some(r) => r.trim().parse::<f64>().map_err(|_| ModelError::InvalidValue {
                element: "output rate".into(),
                value: r.to_string(),
            })?,
            None => 1.0,
        };
        let file = el.attr("name").map(|name| {
            let path = Path::new(name);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                ctx.paths.root_dir.join(path)
            }
        });

        let rate_name = format!("{}/log_rate_hz", indexed_property_name("simulation/output", index));
        let mut channel = Self {
            index,
            file,
            labels,
            nodes,
            dt: ctx.dt,
            rate_hz: 0.0,
            enabled: false,
            gate: RateGate::default(),
            rows: Vec::new(),
            run_number: 0,
            rate_node: settable(ctx.pm, &rate_name, rate_hz),
        };
        channel.set_rate_hz(rate_hz);
        Ok(channel)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    /// Frame divisor, zero when disabled
    pub fn divisor(&self) -> u32 {
        if self.enabled {
            self.gate.rate()
        } else {
            0
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_rate_hz(&mut self, hz: f64) {
        let hz = hz.clamp(0.0, OUTPUT_RATE_MAX_HZ);
        self.rate_hz = hz;
        self.rate_node.set(hz);
        if hz > 0.0 && self.dt > 0.0 {
            self.gate.set_rate((0.5 + 1.0 / (self.dt * hz)) as u32);
            self.enabled = true;
        } else {
            self.enabled = false;
        }
        self.gate.init();
    }

    /// Recorded `(time, values)` rows, oldest first
    pub fn rows(&self) -> &[(f64, Vec<f64>)] {
        &self.rows
    }

    /// Output path of the current run, if the channel has a file
    pub fn file_path(&self) -> Option<PathBuf> {
        let file = self.file.as_ref()?;
        if self.run_number == 0 {
            return Some(file.clone());
        }
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
        let name = match file.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}_{}.{ext}", self.run_number),
            None => format!("{stem}_{}", self.run_number),
        };
        Some(file.with_file_name(name))
    }

    fn sample(&mut self, time: f64) {
        let rate = self.rate_node.get();
        if rate != self.rate_hz {
            self.set_rate_hz(rate);
        }
        if !self.enabled || self.gate.tick() {
            return;
        }
        let values = self.nodes.iter().map(PropertyNode::get).collect();
        self.rows.push((time, values));
    }

    /// Write the header and every row as CSV
    pub fn save_to_writer<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec!["time [s]".to_string()];
        header.extend(self.labels.iter().cloned());
        wtr.write_record(&header)?;

        for (time, values) in &self.rows {
            let mut record = vec![time.to_string()];
            record.extend(values.iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the rows to this channel's file; channels without one are
    /// left alone
    pub fn flush(&self) -> Result<(), ModelError> {
        let Some(path) = self.file_path() else {
            return Ok(());
        };
        let file = std::fs::File::create(&path).map_err(|e| ModelError::Output {
            path: path.clone(),
            source: e.into(),
        })?;
        self.save_to_writer(file)
            .map_err(|source| ModelError::Output { path, source })
    }
}

pub struct Output {
    base: ModelBase,
    pub inputs: OutputInputs,

    channels: Vec<OutputChannel>,
    start_new_output: bool,
}

impl Output {
    pub fn new(_pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("output"),
            inputs: OutputInputs::default(),
            channels: Vec::new(),
            start_new_output: false,
        }
    }

    pub fn channels(&self) -> &[OutputChannel] {
        &self.channels
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut OutputChannel> {
        self.channels.get_mut(index)
    }

    /// Begin new files and clear the recorded rows on the next
    /// initialisation
    pub fn set_start_new_output(&mut self) {
        self.start_new_output = true;
    }

    /// Write every channel that has a file
    pub fn flush(&self) -> Result<(), ModelError> {
        self.channels.iter().try_for_each(OutputChannel::flush)
    }
}

impl Model for Output {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn init_model(&mut self) -> Result<(), ModelError> {
        self.base.init();
        if self.start_new_output {
            self.flush()?;
            for channel in &mut self.channels {
                channel.rows.clear();
                channel.run_number += 1;
            }
            self.start_new_output = false;
        }
        for channel in &mut self.channels {
            channel.gate.init();
        }
        Ok(())
    }

    fn run(&mut self, holding: bool) -> bool {
        if self.base.run_gate() {
            return true;
        }
        if holding {
            return false;
        }

        let time = self.inputs.sim_time;
        for channel in &mut self.channels {
            channel.sample(time);
        }
        false
    }

    fn load(&mut self, el: &Element, ctx: &LoadContext<'_>) -> Result<(), ModelError> {
        let channel = OutputChannel::load(el, self.channels.len(), ctx)?;
        if ctx.debug.startup() {
            info!(
                "    Output channel {}: {} properties at {} Hz",
                channel.index,
                channel.labels.len(),
                channel.rate_hz
            );
        } else {
            debug!(channel = channel.index, rate_hz = channel.rate_hz, "Output channel loaded");
        }
        self.channels.push(channel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AssetPaths;
    use crate::logging::DebugLevel;

    fn section(rate: f64) -> Element {
        Element::new("output")
            .with_attr("rate", rate)
            .with_child(Element::new("property").with_value("position/h-sl-ft"))
            .with_child(Element::new("property").with_value("no/such-property"))
    }

    fn loaded(pm: &PropertyManager, rate: f64, dt: f64) -> Output {
        pm.bind("position/h-sl-ft", 100.0);
        let paths = AssetPaths::default();
        let ctx = LoadContext {
            pm,
            paths: &paths,
            dt,
            debug: DebugLevel(0),
        };
        let mut out = Output::new(pm);
        out.load(&section(rate), &ctx).unwrap();
        out.init_model().unwrap();
        out
    }

    #[test]
    fn test_rate_to_divisor() {
        let pm = PropertyManager::new();
        let out = loaded(&pm, 10.0, 0.01);
        assert_eq!(out.channels()[0].divisor(), 10);
        assert_eq!(out.channels()[0].labels(), ["position/h-sl-ft"]);
    }

    #[test]
    fn test_rate_clamped_and_disabled() {
        let pm = PropertyManager::new();
        let mut out = loaded(&pm, 5000.0, 0.01);
        assert_eq!(out.channels()[0].rate_hz(), OUTPUT_RATE_MAX_HZ);
        assert_eq!(out.channels()[0].divisor(), 1);

        pm.set("simulation/output/log_rate_hz", 0.0);
        out.run(false);
        assert!(!out.channels()[0].enabled());
        assert!(out.channels()[0].rows().is_empty());
    }

    #[test]
    fn test_samples_every_nth_frame() {
        let pm = PropertyManager::new();
        let mut out = loaded(&pm, 25.0, 0.01);
        for frame in 1..=9 {
            out.inputs.sim_time = frame as f64 * 0.01;
            out.run(false);
        }
        let times: Vec<f64> = out.channels()[0].rows().iter().map(|r| r.0).collect();
        assert_eq!(times.len(), 3);
        assert_eq!(out.channels()[0].rows()[0].1, vec![100.0]);
    }

    #[test]
    fn test_no_logging_while_holding() {
        let pm = PropertyManager::new();
        let mut out = loaded(&pm, 100.0, 0.01);
        assert!(!out.run(true));
        assert!(out.channels()[0].rows().is_empty());
    }

    #[test]
    fn test_csv_export() {
        let pm = PropertyManager::new();
        let mut out = loaded(&pm, 100.0, 0.01);
        out.inputs.sim_time = 0.5;
        out.run(false);

        let mut buffer = Vec::new();
        out.channels()[0].save_to_writer(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "time [s],position/h-sl-ft\n0.5,100\n");
    }

    #[test]
    fn test_start_new_output_numbers_files() {
        let dir = tempfile::tempdir().unwrap();
        let pm = PropertyManager::new();
        pm.bind("position/h-sl-ft", 1.0);
        let paths = AssetPaths {
            root_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let ctx = LoadContext {
            pm: &pm,
            paths: &paths,
            dt: 0.01,
            debug: DebugLevel(0),
        };
        let el = section(100.0).with_attr("name", "log.csv");
        let mut out = Output::new(&pm);
        out.load(&el, &ctx).unwrap();
        out.init_model().unwrap();
        out.run(false);

        out.set_start_new_output();
        out.init_model().unwrap();
        assert!(dir.path().join("log.csv").is_file());
        assert!(out.channels()[0].rows().is_empty());
        assert_eq!(out.channels()[0].file_path(), Some(dir.path().join("log_1.csv")));
    }
}
