//! Immutable run configuration handed to the orchestrator.

use std::path::PathBuf;

use crate::core::filter::FilterMode;
use crate::error::RunPartsError;

/// Default `--umask`.
pub const DEFAULT_UMASK: &str = "022";

/// Everything one run needs to know. Built once by the CLI and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub directory: PathBuf,
    /// Forwarded to every script, in order.
    pub args: Vec<String>,
    pub list: bool,
    pub test: bool,
    pub verbose: bool,
    pub report: bool,
    pub reverse: bool,
    pub exit_on_error: bool,
    pub lsb_sysinit: bool,
    pub regex: Option<String>,
    /// Octal string, e.g. `"022"`.
    pub umask: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            args: Vec::new(),
            list: false,
            test: false,
            verbose: false,
            report: false,
            reverse: false,
            exit_on_error: false,
            lsb_sysinit: false,
            regex: None,
            umask: DEFAULT_UMASK.to_string(),
        }
    }
}

impl Configuration {
    pub fn validate(&self) -> Result<(), RunPartsError> {
        if self.list && self.test {
            return Err(RunPartsError::InvalidConfig(
                "--list and --test cannot be used together".to_string(),
            ));
        }
        if self.lsb_sysinit && self.regex.is_some() {
            return Err(RunPartsError::InvalidConfig(
                "--lsbsysinit and --regex cannot be used together".to_string(),
            ));
        }
        parse_umask(&self.umask)?;
        Ok(())
    }

    /// The single naming regime selected by the flags.
    pub fn filter_mode(&self) -> FilterMode {
        match (&self.regex, self.lsb_sysinit) {
            (_, true) => FilterMode::LsbSysInit,
            (Some(pattern), false) => FilterMode::Custom(pattern.clone()),
            (None, false) => FilterMode::Default,
        }
    }
}

/// Parse an octal umask such as `022` or `0077`.
pub fn parse_umask(raw: &str) -> Result<u32, RunPartsError> {
    let invalid = || RunPartsError::InvalidConfig(format!("bad umask value {raw:?}"));
    if raw.is_empty() || !raw.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return Err(invalid());
    }
    let mask = u32::from_str_radix(raw, 8).map_err(|_| invalid())?;
    if mask > 0o777 {
        return Err(invalid());
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        Configuration::default().validate().expect("valid");
    }

    #[test]
    fn list_and_test_rejected() {
        let cfg = Configuration {
            list: true,
            test: true,
            ..Configuration::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("--list and --test"));
    }

    #[test]
    fn lsb_and_regex_rejected() {
        let cfg = Configuration {
            lsb_sysinit: true,
            regex: Some(".*".to_string()),
            ..Configuration::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn filter_mode_follows_flags() {
        assert_eq!(Configuration::default().filter_mode(), FilterMode::Default);
        let lsb = Configuration {
            lsb_sysinit: true,
            ..Configuration::default()
        };
        assert_eq!(lsb.filter_mode(), FilterMode::LsbSysInit);
        let custom = Configuration {
            regex: Some("^S".to_string()),
            ..Configuration::default()
        };
        assert_eq!(custom.filter_mode(), FilterMode::Custom("^S".to_string()));
    }

    #[test]
    fn umask_parses_octal() {
        assert_eq!(parse_umask("022").expect("umask"), 0o022);
        assert_eq!(parse_umask("0077").expect("umask"), 0o077);
        assert_eq!(parse_umask("0").expect("umask"), 0);
        assert_eq!(parse_umask("777").expect("umask"), 0o777);
    }

    #[test]
    fn umask_rejects_garbage() {
        for raw in ["", "8", "0x22", "-1", "1000", "abc"] {
            assert!(parse_umask(raw).is_err(), "{raw} accepted");
        }
    }
}
