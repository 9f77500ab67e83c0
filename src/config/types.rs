//! Configuration types

use serde::Deserialize;

/// User-defined configuration (ndpxd.toml)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default, rename = "responder")]
    pub responders: Vec<ResponderConfig>,
    #[serde(default, rename = "proxy")]
    pub proxies: Vec<ProxyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: pretty, compact, json
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// One `[[responder]]` block: answer solicitations on a single
/// interface.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponderConfig {
    pub iface: String,
    /// Networks to answer for; each entry may hold several networks
    /// separated by semicolons.
    #[serde(default)]
    pub filter: Vec<String>,
    /// Answer for whatever networks this interface currently has.
    /// Mutually exclusive with `filter`.
    #[serde(default)]
    pub autosense: Option<String>,
    #[serde(default = "default_monitor_changes")]
    pub monitor_changes: bool,
}

/// One `[[proxy]]` block: relay neighbor discovery between two
/// interfaces.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Side the filtered solicitations arrive on.
    pub wan: String,
    /// Side holding the hosts being advertised.
    pub lan: String,
    #[serde(default)]
    pub filter: Vec<String>,
    #[serde(default)]
    pub autosense: Option<String>,
    #[serde(default = "default_monitor_changes")]
    pub monitor_changes: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_monitor_changes() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [log]
            level = "debug"
            format = "json"

            [[responder]]
            iface = "eth0"
            filter = ["2001:db8::/64", "fd00::/8"]

            [[responder]]
            iface = "eth1"
            autosense = "eth1"
            monitor_changes = false

            [[proxy]]
            wan = "eth0"
            lan = "eth2"
            autosense = "eth2"
        "#;

        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");

        assert_eq!(config.responders.len(), 2);
        assert_eq!(config.responders[0].iface, "eth0");
        assert_eq!(config.responders[0].filter.len(), 2);
        assert!(config.responders[0].monitor_changes);
        assert_eq!(config.responders[1].autosense.as_deref(), Some("eth1"));
        assert!(!config.responders[1].monitor_changes);

        assert_eq!(config.proxies.len(), 1);
        assert_eq!(config.proxies[0].wan, "eth0");
        assert_eq!(config.proxies[0].lan, "eth2");
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, "pretty");
        assert!(config.responders.is_empty());
        assert!(config.proxies.is_empty());
    }

    #[test]
    fn test_parse_rejects_responder_without_iface() {
        let toml = r#"
            [[responder]]
            filter = ["fd00::/8"]
        "#;

        assert!(toml::from_str::<Config>(toml).is_err());
    }
}
