//! Interactive cpufreq governor.

use log::trace;

use govsim_model::soc::ClusterModel;

use crate::freq_table::FreqTable;
use crate::tunables::{InteractiveTunables, ABOVE_DELAY_MAX_LEN, TARGET_LOAD_MAX_LEN};

/// Interactive governor of one cluster.
///
/// Durations are kept in quanta: the tunables count timer periods and are multiplied by `timer_rate`.
#[derive(Debug, Clone)]
pub struct Interactive {
    model: ClusterModel,
    timer_rate: u64,
    hispeed_freq: u32,
    go_hispeed_load: u32,
    min_sample_time: u64,
    max_freq_hysteresis: u64,
    target_loads: FreqTable,
    above_hispeed_delay: FreqTable,
    target_freq: u32,
    floor_freq: u32,
    floor_validate_time: u64,
    hispeed_validate_time: u64,
    max_freq_hyst_start_time: u64,
}

impl Interactive {
    /// Creates the governor with the cluster parked at its lowest frequency.
    pub fn new(tunables: &InteractiveTunables, timer_rate: u32, model: &ClusterModel) -> Self {
        let timer_rate = timer_rate.max(1) as u64;
        let delays: Vec<u32> = tunables
            .above_hispeed_delay
            .iter()
            .map(|&multiple| (multiple as u64 * timer_rate).min(u32::MAX as u64) as u32)
            .collect();
        let lowest = model.lowest_freq();
        Self {
            model: model.clone(),
            timer_rate,
            hispeed_freq: model.freq_ceiling_to_opp(tunables.hispeed_freq),
            go_hispeed_load: tunables.go_hispeed_load,
            min_sample_time: tunables.min_sample_time as u64 * timer_rate,
            max_freq_hysteresis: tunables.max_freq_hysteresis as u64 * timer_rate,
            target_loads: FreqTable::from_opp_values(model, &tunables.target_loads, TARGET_LOAD_MAX_LEN),
            above_hispeed_delay: FreqTable::from_opp_values(model, &delays, ABOVE_DELAY_MAX_LEN),
            target_freq: lowest,
            floor_freq: lowest,
            floor_validate_time: 0,
            hispeed_validate_time: 0,
            max_freq_hyst_start_time: 0,
        }
    }

    /// Frequency last requested by the governor.
    pub fn target_freq(&self) -> u32 {
        self.target_freq
    }

    /// Target load in effect at `freq`.
    pub fn target_load(&self, freq: u32) -> u32 {
        self.target_loads.lookup(freq).max(1)
    }

    /// Above hispeed delay in effect at `freq`, in quanta.
    pub fn above_hispeed_delay(&self, freq: u32) -> u64 {
        self.above_hispeed_delay.lookup(freq) as u64
    }

    /// Returns true if the governor samples load at quantum `now`.
    pub fn is_sample_tick(&self, now: u64) -> bool {
        now % self.timer_rate == 0
    }

    /// Average target load over the usable operating points, in [0, 1].
    pub fn mean_target_load(&self) -> f64 {
        let freqs: Vec<u32> = self
            .model
            .opp_model
            .iter()
            .map(|opp| opp.freq)
            .filter(|&f| f >= self.model.lowest_freq() && f <= self.model.highest_freq())
            .collect();
        let sum: u64 = freqs.iter().map(|&f| self.target_load(f) as u64).sum();
        sum as f64 / freqs.len().max(1) as f64 / 100.
    }

    /// How lazily the governor reacts to load, 0 is instant ramp up, 1 is as late as possible.
    pub fn posture(&self) -> f64 {
        ((self.go_hispeed_load as f64 / 100. + self.mean_target_load()) / 2.).clamp(0., 1.)
    }

    /// Lowest frequency whose target load accommodates `load` percent measured at `cur_freq`.
    ///
    /// Bisects over the operating points because the target load itself depends on the frequency.
    pub fn choose_freq(&self, cur_freq: u32, load: u32) -> u32 {
        let loadadjfreq = load as u64 * cur_freq as u64;
        let mut freq = cur_freq;
        let mut freqmin = 0u32;
        let mut freqmax = u32::MAX;
        for _ in 0..=2 * self.model.n_opp() {
            let prevfreq = freq;
            let tl = self.target_load(freq) as u64;
            let wanted = (loadadjfreq / tl).min(u32::MAX as u64) as u32;
            freq = self.model.freq_ceiling_to_opp(wanted);
            if freq > prevfreq {
                freqmin = prevfreq;
                if freq >= freqmax {
                    freq = self.model.freq_floor_to_opp(freqmax - 1);
                    if freq == freqmin {
                        freq = freqmax;
                        break;
                    }
                }
            } else if freq < prevfreq {
                freqmax = prevfreq;
                if freq <= freqmin {
                    freq = self.model.freq_ceiling_to_opp(freqmin.saturating_add(1));
                    if freq == freqmax {
                        break;
                    }
                }
            }
            if freq == prevfreq {
                break;
            }
        }
        freq
    }

    /// Evaluates a sample at quantum `now` and returns the requested frequency.
    ///
    /// `cur_freq` is the frequency the cluster actually ran at, `load` the busy percentage measured at it.
    pub fn timer(&mut self, now: u64, cur_freq: u32, load: u32) -> u32 {
        let max_freq = self.model.highest_freq();
        let mut new_freq = if load >= self.go_hispeed_load {
            if cur_freq < self.hispeed_freq {
                self.hispeed_freq
            } else {
                self.choose_freq(cur_freq, load).max(self.hispeed_freq)
            }
        } else {
            let freq = self.choose_freq(cur_freq, load);
            if freq > self.hispeed_freq && cur_freq < self.hispeed_freq {
                self.hispeed_freq
            } else {
                freq
            }
        };

        if cur_freq >= self.hispeed_freq
            && new_freq > cur_freq
            && now.saturating_sub(self.hispeed_validate_time) < self.above_hispeed_delay(cur_freq)
        {
            trace!("interactive: t={} hold {} MHz, above hispeed delay", now, cur_freq);
            return self.target_freq;
        }
        self.hispeed_validate_time = now;

        new_freq = self.model.freq_ceiling_to_opp(new_freq);

        if new_freq < cur_freq
            && cur_freq == max_freq
            && now.saturating_sub(self.max_freq_hyst_start_time) < self.max_freq_hysteresis
        {
            trace!("interactive: t={} hold {} MHz, max freq hysteresis", now, cur_freq);
            return self.target_freq;
        }

        if new_freq < self.floor_freq && now.saturating_sub(self.floor_validate_time) < self.min_sample_time {
            trace!("interactive: t={} hold {} MHz, min sample time", now, cur_freq);
            return self.target_freq;
        }
        self.floor_freq = new_freq;
        self.floor_validate_time = now;

        if new_freq == max_freq {
            self.max_freq_hyst_start_time = now;
        }

        trace!("interactive: t={} load={} {} -> {} MHz", now, load, cur_freq, new_freq);
        self.target_freq = new_freq;
        new_freq
    }
}
