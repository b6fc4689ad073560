//! Command-line parsing: per-port specifications with the same inheritance and
//! cross-spec validation rules as the port-list option they are grounded on.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;
use structopt::StructOpt;

use crate::error::{IpfixdError, Result};

const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Cflowd,
    Ipfix,
}

impl std::str::FromStr for OutputFormat {
    type Err = IpfixdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cflowd" => Ok(OutputFormat::Cflowd),
            "ipfix" => Ok(OutputFormat::Ipfix),
            other => Err(IpfixdError::Configuration(format!("unknown output format '{}', expected 'cflowd' or 'ipfix'", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PortSpec {
    pub port: u16,
    pub temp_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub write_timeout: Duration,
    pub formats: Vec<OutputFormat>,
}

#[derive(Debug, StructOpt)]
#[structopt(name = "ipfixd", about = "NetFlow v5 / IPFIX collector that transcodes to cflowd and/or preserves raw IPFIX")]
pub struct Opts {
    /// `port:tempdir[:destdir[:write_timeout[:fmt,fmt,...]]]`, repeatable.
    #[structopt(long = "--ports", required = true)]
    pub ports: Vec<String>,

    #[structopt(long = "--log", default_value = "Info")]
    pub log_level: LevelFilter,

    /// Stay in the foreground instead of daemonizing. Daemonization itself is
    /// an external-collaborator concern (process supervision); this flag is
    /// parsed and recorded but has no further effect here.
    #[structopt(long = "--nofork")]
    pub nofork: bool,

    #[structopt(long = "--user")]
    pub user: Option<String>,

    #[structopt(long = "--group")]
    pub group: Option<String>,

    #[structopt(long = "--syslog")]
    pub syslog: bool,

    #[structopt(long = "--log-missing-full")]
    pub log_missing_full: bool,

    #[structopt(long = "--verbose")]
    pub verbose: bool,

    #[structopt(long = "--log-unchanged-templates")]
    pub log_unchanged_templates: bool,

    #[structopt(long = "--log-datarec")]
    pub log_datarec: bool,
}

impl Opts {
    pub fn port_specs(&self) -> Result<Vec<PortSpec>> {
        parse_port_specs(&self.ports)
    }
}

/// Parses every `--ports` value in order, applying write-timeout/format
/// inheritance from the previous spec and rejecting a `tempdir` that maps to
/// two different `destdir`s across the whole list.
pub fn parse_port_specs(raw: &[String]) -> Result<Vec<PortSpec>> {
    let mut specs = Vec::with_capacity(raw.len());
    let mut temp_to_dest: HashMap<PathBuf, PathBuf> = HashMap::new();

    let mut prev_write_timeout = Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS);
    let mut prev_formats = vec![OutputFormat::Cflowd];

    for entry in raw {
        let parts: Vec<&str> = entry.split(':').collect();
        if parts.len() < 2 || parts.len() > 5 {
            return Err(IpfixdError::Configuration(format!("malformed --ports entry '{}': expected port:tempdir[:destdir[:write_timeout[:fmt,fmt,...]]]", entry)));
        }

        let port: u16 = parts[0].parse().map_err(|_| IpfixdError::Configuration(format!("invalid port '{}' in --ports entry '{}'", parts[0], entry)))?;
        let temp_dir = PathBuf::from(parts[1]);
        let dest_dir = parts.get(2).filter(|s| !s.is_empty()).map(PathBuf::from).unwrap_or_else(|| temp_dir.clone());

        let write_timeout = match parts.get(3).filter(|s| !s.is_empty()) {
            Some(s) => Duration::from_secs(s.parse().map_err(|_| IpfixdError::Configuration(format!("invalid write_timeout '{}' in --ports entry '{}'", s, entry)))?),
            None => prev_write_timeout,
        };

        let formats = match parts.get(4).filter(|s| !s.is_empty()) {
            Some(s) => s.split(',').map(|f| f.parse()).collect::<Result<Vec<_>>>()?,
            None => prev_formats.clone(),
        };

        if let Some(existing_dest) = temp_to_dest.get(&temp_dir) {
            if existing_dest != &dest_dir {
                return Err(IpfixdError::Configuration(format!(
                    "tempdir {:?} maps to both {:?} and {:?} across --ports entries",
                    temp_dir, existing_dest, dest_dir
                )));
            }
        } else {
            temp_to_dest.insert(temp_dir.clone(), dest_dir.clone());
        }

        prev_write_timeout = write_timeout;
        prev_formats = formats.clone();

        specs.push(PortSpec { port, temp_dir, dest_dir, write_timeout, formats });
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn minimal_spec_uses_all_defaults() {
        let specs = parse_port_specs(&raw(&["9995:/tmp/a"])).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].port, 9995);
        assert_eq!(specs[0].dest_dir, PathBuf::from("/tmp/a"));
        assert_eq!(specs[0].write_timeout, Duration::from_secs(300));
        assert_eq!(specs[0].formats, vec![OutputFormat::Cflowd]);
    }

    #[test]
    fn later_spec_inherits_write_timeout_and_formats_from_earlier_one() {
        let specs = parse_port_specs(&raw(&["9995:/tmp/a:/tmp/a-out:60:cflowd,ipfix", "9996:/tmp/b"])).unwrap();
        assert_eq!(specs[1].write_timeout, Duration::from_secs(60));
        assert_eq!(specs[1].formats, vec![OutputFormat::Cflowd, OutputFormat::Ipfix]);
    }

    #[test]
    fn same_tempdir_different_destdir_is_rejected() {
        let err = parse_port_specs(&raw(&["9995:/tmp/a:/tmp/out1", "9996:/tmp/a:/tmp/out2"])).unwrap_err();
        assert!(matches!(err, IpfixdError::Configuration(_)));
    }

    #[test]
    fn same_tempdir_same_destdir_is_allowed() {
        let specs = parse_port_specs(&raw(&["9995:/tmp/a:/tmp/out", "9996:/tmp/a:/tmp/out"])).unwrap();
        assert_eq!(specs.len(), 2);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = parse_port_specs(&raw(&["9995:/tmp/a:/tmp/a:60:bogus"])).unwrap_err();
        assert!(matches!(err, IpfixdError::Configuration(_)));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = parse_port_specs(&raw(&["not-a-port:/tmp/a"])).unwrap_err();
        assert!(matches!(err, IpfixdError::Configuration(_)));
    }
}
