//! Command-line interface.
//!
//! Flags override the matching configuration file entries, but only when
//! they are given.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ProxyConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "distriproxy", version)]
#[command(about = "Reverse proxy fronting package mirrors under path prefixes", long_about = None)]
pub struct Cli {
    /// Load config from FILENAME
    #[arg(long, value_name = "FILENAME", default_value = "distriproxy.toml")]
    pub config: PathBuf,

    /// Run a TLS service (requires key and cert paths)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub enable_tls: Option<bool>,

    /// Load TLS certificate from FILENAME
    #[arg(long, value_name = "FILENAME")]
    pub certificate: Option<String>,

    /// Load TLS key from FILENAME
    #[arg(long, value_name = "FILENAME")]
    pub key: Option<String>,

    /// Address to bind when no socket is inherited
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,
}

impl Cli {
    /// Apply the flags that were given on top of the file configuration.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(enable) = self.enable_tls {
            config.tls.enable = Some(enable);
        }
        if let Some(certificate) = &self.certificate {
            config.tls.certificate_file = Some(certificate.clone());
        }
        if let Some(key) = &self.key {
            config.tls.key_file = Some(key.clone());
        }
        if let Some(listen) = &self.listen {
            config.listener.bind_address = listen.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("distriproxy").chain(args.iter().copied()))
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_leave_file_values_alone() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.config, PathBuf::from("distriproxy.toml"));

        let mut config = ProxyConfig::default();
        config.tls.enable = Some(true);
        config.tls.key_file = Some("file.key".into());
        cli.apply(&mut config);

        assert_eq!(config.tls.enable, Some(true));
        assert_eq!(config.tls.key_file.as_deref(), Some("file.key"));
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn given_flags_override_file_values() {
        let cli = parse(&[
            "--enable-tls",
            "--certificate",
            "/etc/ssl/proxy.pem",
            "--key=/etc/ssl/proxy.key",
            "--listen",
            "127.0.0.1:8443",
        ])
        .unwrap();

        let mut config = ProxyConfig::default();
        config.tls.enable = Some(false);
        cli.apply(&mut config);

        assert!(config.tls.enabled());
        assert_eq!(config.tls.certificate_file.as_deref(), Some("/etc/ssl/proxy.pem"));
        assert_eq!(config.tls.key_file.as_deref(), Some("/etc/ssl/proxy.key"));
        assert_eq!(config.listener.bind_address, "127.0.0.1:8443");
    }

    #[test]
    fn tls_can_be_switched_off_explicitly() {
        let cli = parse(&["--enable-tls=false"]).unwrap();

        let mut config = ProxyConfig::default();
        config.tls.enable = Some(true);
        cli.apply(&mut config);

        assert!(!config.tls.enabled());
    }

    #[test]
    fn positional_arguments_are_rejected() {
        let err = parse(&["extra"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
