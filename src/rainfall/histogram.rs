//! Moving-hour and daily bin tallies.

use serde::Serialize;

/// Per-bin counts over the last hour of cycles plus today's and yesterday's totals.
#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    window: usize,
    moving_hour: Vec<u32>,
    today: Vec<u32>,
    yesterday: Vec<u32>,
}

impl Histogram {
    /// `window` is the number of cycles in one hour.
    pub fn new(bins: usize, window: usize) -> Self {
        Self {
            window: window.max(1),
            moving_hour: vec![0; bins],
            today: vec![0; bins],
            yesterday: vec![0; bins],
        }
    }

    /// Depth of the log entry that leaves the moving hour on the next push.
    pub fn leaving_depth(&self) -> usize {
        self.window - 1
    }

    /// Start the moving hour as if the whole window held `bin`.
    pub fn seed(&mut self, bin: usize) {
        self.moving_hour.iter_mut().for_each(|c| *c = 0);
        self.moving_hour[bin] = self.window as u32;
    }

    pub fn cycle(&mut self, new_day: bool, entering: usize, leaving: usize) {
        if new_day {
            self.yesterday = std::mem::replace(&mut self.today, vec![0; self.moving_hour.len()]);
        }
        self.moving_hour[leaving] = self.moving_hour[leaving].saturating_sub(1);
        self.moving_hour[entering] += 1;
        self.today[entering] += 1;
    }

    pub fn moving_hour(&self) -> &[u32] {
        &self.moving_hour
    }

    pub fn today(&self) -> &[u32] {
        &self.today
    }

    pub fn yesterday(&self) -> &[u32] {
        &self.yesterday
    }
}
