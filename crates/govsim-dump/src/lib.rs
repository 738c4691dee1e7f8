#![warn(missing_docs)]
#![doc = include_str!("../readme.md")]

use std::fmt::{Display, Write as _};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::info;
use serde::Serialize;

use govsim_core::parallel::EvalResult;
use govsim_core::tunables::{InteractiveTunables, Tunables, ABOVE_DELAY_MAX_LEN, TARGET_LOAD_MAX_LEN};
use govsim_core::units::{mhz_to_khz, ms_to_us, quantum_to_ms, ratio_to_pct, QUANTUM_MS};
use govsim_model::soc::{ClusterModel, Soc};

#[derive(Serialize)]
struct ScoreRow {
    performance: f64,
    battery_life: f64,
    idle_lasting: f64,
    index: usize,
}

/// Formats evaluated candidates of one SoC and writes them to `output_path`.
pub struct Dumper {
    soc: Soc,
    output_path: PathBuf,
}

impl Dumper {
    /// Creates a dumper writing `<soc name>.txt` and `<soc name>.csv` into `output_path`.
    pub fn new<P: Into<PathBuf>>(soc: Soc, output_path: P) -> Self {
        Self {
            soc,
            output_path: output_path.into(),
        }
    }

    fn model(&self, cluster: usize) -> &ClusterModel {
        &self.soc.clusters[cluster].model
    }

    fn interactive(&self, t: &Tunables, cluster: usize) -> InteractiveTunables {
        t.interactive
            .get(cluster)
            .cloned()
            .unwrap_or_else(|| InteractiveTunables::default_for(self.model(cluster)))
    }

    /// Converts a number of timer periods to µs the way the kernel tunables expect it.
    ///
    /// Durations are written 2 ms short, so a zero duration becomes -2000.
    fn multiple_to_us(t: &Tunables, multiple: u32) -> i64 {
        let quanta = multiple as i64 * t.sched.timer_rate as i64;
        (quanta * QUANTUM_MS as i64 - 2) * 1000
    }

    /// `target_loads` of a cluster in the governor's sysfs syntax.
    ///
    /// The value at `min_freq` is written bare, operating points below it are skipped. If no operating
    /// point sits exactly at `min_freq`, every entry carries its frequency.
    pub fn target_loads_to_str(&self, t: &Tunables, cluster: usize) -> String {
        let model = self.model(cluster);
        let g = self.interactive(t, cluster);
        let n = model.n_opp().min(TARGET_LOAD_MAX_LEN);
        let entries = model
            .opp_model
            .iter()
            .take(n)
            .enumerate()
            .map(|(idx, opp)| (opp.freq, value_at(&g.target_loads, idx)));
        collapse(model.min_freq, entries)
    }

    /// `above_hispeed_delay` of a cluster in the governor's sysfs syntax, in µs.
    ///
    /// Starts at `hispeed_freq` like `target_loads` starts at `min_freq`. The delay of the highest
    /// operating point is never used and is omitted.
    pub fn hispeed_delay_to_str(&self, t: &Tunables, cluster: usize) -> String {
        let model = self.model(cluster);
        let g = self.interactive(t, cluster);
        let n = model.n_opp().min(ABOVE_DELAY_MAX_LEN).saturating_sub(1);
        let entries = model
            .opp_model
            .iter()
            .take(n)
            .enumerate()
            .map(|(idx, opp)| (opp.freq, Self::multiple_to_us(t, value_at(&g.above_hispeed_delay, idx))));
        collapse(g.hispeed_freq, entries)
    }

    /// Human readable description of a candidate.
    pub fn sim_tunable_to_str(&self, t: &Tunables) -> String {
        let mut buf = String::new();
        for cluster in 0..self.soc.clusters.len() {
            let g = self.interactive(t, cluster);
            let _ = writeln!(buf, "[interactive] cluster {}\n", cluster);
            let _ = writeln!(buf, "hispeed_freq: {}", mhz_to_khz(g.hispeed_freq));
            let _ = writeln!(buf, "go_hispeed_load: {}", g.go_hispeed_load);
            let _ = writeln!(buf, "min_sample_time: {}", Self::multiple_to_us(t, g.min_sample_time));
            let _ = writeln!(buf, "max_freq_hysteresis: {}", Self::multiple_to_us(t, g.max_freq_hysteresis));
            let _ = writeln!(buf, "above_hispeed_delay: {}", self.hispeed_delay_to_str(t, cluster));
            let _ = writeln!(buf, "target_loads: {}\n", self.target_loads_to_str(t, cluster));
        }

        let sched = &t.sched;
        let _ = writeln!(buf, "[hmp sched]\n");
        let _ = writeln!(buf, "sched_downmigrate: {}", sched.sched_downmigrate);
        let _ = writeln!(buf, "sched_upmigrate: {}", sched.sched_upmigrate);
        let _ = writeln!(
            buf,
            "sched_freq_aggregate_threshold_pct: {}",
            sched.sched_freq_aggregate_threshold_pct
        );
        let _ = writeln!(buf, "sched_ravg_hist_size: {}", sched.sched_ravg_hist_size);
        let _ = writeln!(buf, "sched_window_stats_policy: {}", sched.sched_window_stats_policy);
        let _ = writeln!(buf, "timer_rate: {}\n", ms_to_us(quantum_to_ms(sched.timer_rate)));

        let _ = writeln!(buf, "[input boost]\n");
        for cluster in 0..self.soc.clusters.len() {
            let freq = t.input.boost_freq.get(cluster).copied().unwrap_or(0);
            let _ = writeln!(buf, "cluster {}: {}", cluster, freq);
        }
        let _ = writeln!(buf, "ms: {}\n", quantum_to_ms(t.input.duration_quantum));
        buf
    }

    /// Writes every candidate with its scores to `<soc name>.txt`.
    pub fn dump_to_txt(&self, results: &[EvalResult]) -> std::io::Result<PathBuf> {
        let path = self.output_path.join(format!("{}.txt", self.soc.name));
        let mut out = BufWriter::new(File::create(&path)?);
        for (idx, r) in results.iter().enumerate() {
            writeln!(out, "================\n")?;
            writeln!(out, ">>> {} <<<", idx)?;
            writeln!(out, "performance: {}", ratio_to_pct(r.score.performance))?;
            writeln!(out, "battery_life: {}", ratio_to_pct(r.score.battery_life))?;
            writeln!(out, "idle_lasting: {}\n", ratio_to_pct(r.score.idle_lasting))?;
            out.write_all(self.sim_tunable_to_str(&r.tunables).as_bytes())?;
        }
        out.flush()?;
        info!("{} candidates written to {}", results.len(), path.display());
        Ok(path)
    }

    /// Writes one `performance,battery_life,idle_lasting,index` row per candidate to `<soc name>.csv`.
    pub fn dump_to_csv(&self, results: &[EvalResult]) -> std::io::Result<PathBuf> {
        let path = self.output_path.join(format!("{}.csv", self.soc.name));
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        for (index, r) in results.iter().enumerate() {
            wtr.serialize(ScoreRow {
                performance: ratio_to_pct(r.score.performance),
                battery_life: ratio_to_pct(r.score.battery_life),
                idle_lasting: ratio_to_pct(r.score.idle_lasting),
                index,
            })?;
        }
        wtr.flush()?;
        info!("{} scores written to {}", results.len(), path.display());
        Ok(path)
    }
}

fn value_at(values: &[u32], idx: usize) -> u32 {
    values.get(idx).or(values.last()).copied().unwrap_or(0)
}

/// Joins `(freq, value)` pairs as `value freq:value ...` starting from `base_freq`.
///
/// The entry at `base_freq` is written bare, entries below it are skipped and entries repeating the
/// previously written value are dropped.
fn collapse<T, I>(base_freq: u32, entries: I) -> String
where
    T: Display + PartialEq + Copy,
    I: Iterator<Item = (u32, T)>,
{
    let mut buf = String::new();
    let mut prev = None;
    for (freq, value) in entries {
        if prev == Some(value) || freq < base_freq {
            continue;
        }
        if freq == base_freq {
            let _ = write!(buf, "{}", value);
        } else {
            let _ = write!(buf, " {}:{}", mhz_to_khz(freq), value);
        }
        prev = Some(value);
    }
    buf
}
