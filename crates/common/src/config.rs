use serde::{Deserialize, Serialize};

/// Engine-wide configuration, layered from built-in defaults, then an
/// optional YAML/JSON file, then environment variables (`MOORMUD_*`), then
/// CLI flags, each a `figment` provider merged in ascending precedence by
/// the binary's `main.rs`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_address: String,
    pub listen_port: u16,
    pub default_spawn_room: Option<uuid::Uuid>,
    pub data_dir: String,
    pub combat_turn_timeout_secs: u64,
    pub session_idle_timeout_secs: u64,
    pub session_reaper_interval_secs: u64,
    pub scheduler_tick_secs: u64,
    pub flee_base_chance: f64,
    pub monster_lifecycle_interval_secs: u64,
    pub event_history_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            listen_port: 4000,
            default_spawn_room: None,
            data_dir: "./data".to_string(),
            combat_turn_timeout_secs: 30,
            session_idle_timeout_secs: 600,
            session_reaper_interval_secs: 60,
            scheduler_tick_secs: 15,
            flee_base_chance: 0.4,
            monster_lifecycle_interval_secs: 30,
            event_history_capacity: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.listen_port, 4000);
        assert_eq!(cfg.combat_turn_timeout_secs, 30);
        assert_eq!(cfg.event_history_capacity, 1000);
    }
}
