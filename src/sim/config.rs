use clap::Parser;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on simulated crossings.
pub const MAX_INSTANCES: u32 = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one crossing is required")]
    NoInstances,

    #[error("{requested} crossings requested, at most {max} supported")]
    TooManyInstances { requested: u32, max: u32 },

    #[error("tick period must be at least 1ms")]
    ZeroTickPeriod,

    #[error("--{flag} {at} is past the last tick ({ticks})")]
    EventOutOfRange {
        flag: &'static str,
        at: u32,
        ticks: u32,
    },
}

/// Host simulation settings. Every flag falls back to a `FLASH_FSM_*`
/// environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "flash-fsm")]
#[command(about = "Simulate traffic signals that share one transition graph")]
#[command(version)]
pub struct SimConfig {
    /// Number of crossings
    #[arg(long, env = "FLASH_FSM_INSTANCES", default_value_t = 3)]
    pub instances: u32,

    /// Driver rounds to run
    #[arg(long, env = "FLASH_FSM_TICKS", default_value_t = 200)]
    pub ticks: u32,

    /// Milliseconds between rounds
    #[arg(long, env = "FLASH_FSM_TICK_MS", default_value_t = 50)]
    pub tick_ms: u64,

    /// Round at which the first crossing's pedestrian button is pressed
    #[arg(long, env = "FLASH_FSM_BUTTON_AT")]
    pub button_at: Option<u32>,

    /// Round at which the last crossing reports a lamp fault
    #[arg(long, env = "FLASH_FSM_FAULT_AT")]
    pub fault_at: Option<u32>,

    /// Print the transition graph as JSON and exit
    #[arg(long, env = "FLASH_FSM_DUMP_GRAPH")]
    pub dump_graph: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            instances: 3,
            ticks: 200,
            tick_ms: 50,
            button_at: None,
            fault_at: None,
            dump_graph: false,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instances == 0 {
            return Err(ConfigError::NoInstances);
        }
        if self.instances > MAX_INSTANCES {
            return Err(ConfigError::TooManyInstances {
                requested: self.instances,
                max: MAX_INSTANCES,
            });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        for (flag, at) in [("button-at", self.button_at), ("fault-at", self.fault_at)] {
            if let Some(at) = at.filter(|&at| at > self.ticks) {
                return Err(ConfigError::EventOutOfRange {
                    flag,
                    at,
                    ticks: self.ticks,
                });
            }
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn events_past_the_end_are_rejected() {
        let config = SimConfig {
            ticks: 10,
            fault_at: Some(11),
            ..SimConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::EventOutOfRange {
                flag: "fault-at",
                at: 11,
                ticks: 10,
            })
        );
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "--fault-at 11 is past the last tick (10)"
        );
    }

    #[test]
    fn flags_parse() {
        let config = SimConfig::try_parse_from([
            "flash-fsm",
            "--instances",
            "2",
            "--tick-ms",
            "10",
            "--button-at",
            "5",
            "--dump-graph",
        ])
        .unwrap();
        assert_eq!(config.instances, 2);
        assert_eq!(config.period(), Duration::from_millis(10));
        assert_eq!(config.button_at, Some(5));
        assert!(config.dump_graph);
    }
}
