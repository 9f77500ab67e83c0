//! Configuration validation

use super::Config;
use crate::engine::parse_filter;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn print_diagnostics(&self) {
        for warning in &self.warnings {
            println!("[WARN] {}", warning);
        }
        for error in &self.errors {
            println!("[ERROR] {}", error);
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate configuration and return warnings/errors
pub fn validate(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_log(config, &mut result);
    validate_responders(config, &mut result);
    validate_proxies(config, &mut result);

    if config.responders.is_empty() && config.proxies.is_empty() {
        result.warn("no responders or proxies defined, nothing to do");
    }

    result
}

fn validate_log(config: &Config, result: &mut ValidationResult) {
    let level = config.log.level.to_lowercase();
    if !["error", "warn", "info", "debug", "trace"].contains(&level.as_str()) {
        result.warn(format!(
            "log.level: unknown level '{}', falling back to info",
            config.log.level
        ));
    }

    if !["pretty", "compact", "json"].contains(&config.log.format.as_str()) {
        result.warn(format!(
            "log.format: unknown format '{}', falling back to pretty",
            config.log.format
        ));
    }
}

fn validate_responders(config: &Config, result: &mut ValidationResult) {
    let mut seen = HashSet::new();

    for (i, responder) in config.responders.iter().enumerate() {
        let label = format!("responder[{}]", i);

        if responder.iface.is_empty() {
            result.error(format!("{}: iface must not be empty", label));
        }
        if !seen.insert(&responder.iface) {
            result.warn(format!(
                "{}: interface '{}' already has a responder",
                label, responder.iface
            ));
        }

        validate_whitelist(
            &label,
            &responder.filter,
            responder.autosense.as_deref(),
            result,
        );
    }
}

fn validate_proxies(config: &Config, result: &mut ValidationResult) {
    for (i, proxy) in config.proxies.iter().enumerate() {
        let label = format!("proxy[{}]", i);

        if proxy.wan.is_empty() || proxy.lan.is_empty() {
            result.error(format!("{}: wan and lan must not be empty", label));
        }
        if proxy.wan == proxy.lan {
            result.error(format!(
                "{}: wan and lan are both '{}', must differ",
                label, proxy.wan
            ));
        }

        validate_whitelist(&label, &proxy.filter, proxy.autosense.as_deref(), result);
    }
}

fn validate_whitelist(
    label: &str,
    filter: &[String],
    autosense: Option<&str>,
    result: &mut ValidationResult,
) {
    if !filter.is_empty() && autosense.is_some() {
        result.error(format!(
            "{}: filter and autosense are mutually exclusive",
            label
        ));
    }

    if filter.is_empty() && autosense.is_none() {
        result.warn(format!(
            "{}: no filter or autosense, every solicitation will be answered",
            label
        ));
    }

    for entry in filter {
        if let Err(e) = parse_filter(entry) {
            result.error(format!("{}: {}", label, e));
        }
    }
}
