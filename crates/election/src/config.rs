use std::time::Duration;

use rand::Rng as _;

/// Timing of the election
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElectionConfig {
    /// Period of a single countdown tick
    pub tick: Duration,
    /// Lower bound of the randomized countdown
    pub timeout_min: Duration,
    /// Upper bound (exclusive) of the randomized countdown
    pub timeout_max: Duration,
    /// Maximum time the tick loop is allowed to run
    pub hard_timeout: Duration,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(1),
            timeout_min: Duration::from_millis(150),
            timeout_max: Duration::from_millis(300),
            hard_timeout: Duration::from_secs(10),
        }
    }
}

impl ElectionConfig {
    fn to_ticks(&self, duration: Duration) -> u64 {
        let tick = self.tick.as_nanos().max(1);
        u64::try_from(duration.as_nanos() / tick)
            .unwrap_or(u64::MAX)
            .max(1)
    }

    /// Draw a fresh countdown, in ticks
    pub fn new_rand_timeout_ticks(&self) -> u64 {
        let min = self.to_ticks(self.timeout_min);
        let max = self.to_ticks(self.timeout_max);

        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..max)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ElectionConfig;

    #[test]
    fn rand_timeout_stays_in_range() {
        let config = ElectionConfig::default();

        for _ in 0..1000 {
            let ticks = config.new_rand_timeout_ticks();
            assert!((150..300).contains(&ticks), "{ticks}");
        }
    }

    #[test]
    fn degenerate_range() {
        let config = ElectionConfig {
            tick: Duration::from_millis(10),
            timeout_min: Duration::from_millis(50),
            timeout_max: Duration::from_millis(50),
            ..ElectionConfig::default()
        };
        assert_eq!(config.new_rand_timeout_ticks(), 5);

        let config = ElectionConfig {
            tick: Duration::from_secs(1),
            timeout_min: Duration::ZERO,
            timeout_max: Duration::ZERO,
            ..ElectionConfig::default()
        };
        assert_eq!(config.new_rand_timeout_ticks(), 1);
    }
}
