// File: config.rs
//
// The purpose of this file is to load the INI-style deployment config
// (§6 External Interfaces) naming the discovery strategy and the
// dissemination strategy. Both are ambient, out-of-core concerns per
// §1's Non-goals list, but the config file itself is a real external
// interface and is parsed the way the rest of the corpus parses INI
// files: with `rust-ini`.

use crate::error::ConfigError;
use crate::shard::Dissemination;
use ini::Ini;

/// `[Discovery] Strategy`. Only `Chord` is implemented; other values
/// parse but are rejected at the point of use, matching §6 ("other
/// values are accepted but reserved").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    Chord,
    Other(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discovery_strategy: DiscoveryStrategy,
    pub dissemination: Dissemination,
}

impl Config {
    pub fn load(path: &str) -> Result<Config, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::ConfigIo {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?;

        let discovery_section =
            ini.section(Some("Discovery"))
                .ok_or_else(|| ConfigError::MissingSection {
                    path: path.to_string(),
                    section: "Discovery".into(),
                })?;
        let strategy = discovery_section
            .get("Strategy")
            .ok_or_else(|| ConfigError::MissingKey {
                path: path.to_string(),
                section: "Discovery".into(),
                key: "Strategy".into(),
            })?;
        let discovery_strategy = match strategy {
            "Chord" => DiscoveryStrategy::Chord,
            other => DiscoveryStrategy::Other(other.to_string()),
        };

        let dissemination_section =
            ini.section(Some("Dissemination"))
                .ok_or_else(|| ConfigError::MissingSection {
                    path: path.to_string(),
                    section: "Dissemination".into(),
                })?;
        let strategy = dissemination_section
            .get("Strategy")
            .ok_or_else(|| ConfigError::MissingKey {
                path: path.to_string(),
                section: "Dissemination".into(),
                key: "Strategy".into(),
            })?;
        let dissemination = match strategy {
            "Broker" => Dissemination::Broker,
            _ => Dissemination::Direct,
        };

        Ok(Config {
            discovery_strategy,
            dissemination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn write_config(body: &str) -> String {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let mut path = std::env::temp_dir();
        path.push(format!("chordcast-config-test-{}-{}.ini", std::process::id(), n));
        fs::write(&path, body).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn parses_direct_dissemination() {
        let path = write_config("[Discovery]\nStrategy = Chord\n\n[Dissemination]\nStrategy = Direct\n");
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.discovery_strategy, DiscoveryStrategy::Chord);
        assert_eq!(cfg.dissemination, Dissemination::Direct);
    }

    #[test]
    fn parses_broker_dissemination() {
        let path = write_config("[Discovery]\nStrategy = Chord\n\n[Dissemination]\nStrategy = Broker\n");
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.dissemination, Dissemination::Broker);
    }

    #[test]
    fn missing_section_is_a_config_error() {
        let path = write_config("[Discovery]\nStrategy = Chord\n");
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::MissingSection { .. })
        ));
    }
}
