//! `wpa_supplicant` backed configurator.
//!
//! Each apply renders a single-network config into a fresh private temp file
//! and restarts `wpa_supplicant` on it. The system config is never written.
//! If the new config fails to start, the supplicant is relaunched from the
//! last config that worked (or the system config when there is none).

use super::configurator::{ApplyError, WifiConfigurator};
use super::credentials::WifiCredentials;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::fmt::Write as _;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use tokio::process::Command;
use zeroize::Zeroize;

/// Default system supplicant config.
pub const DEFAULT_WPA_CONFIG: &str = "/etc/wpa_supplicant/wpa_supplicant.conf";

/// Default wireless interface.
pub const DEFAULT_INTERFACE: &str = "wlan0";

/// Restarts `wpa_supplicant` on freshly rendered configs.
#[derive(Debug)]
pub struct WpaSupplicantConfigurator {
    interface: String,
    fallback_config: PathBuf,
    killall_program: String,
    supplicant_program: String,
    /// Config the running supplicant was started from. Deleted when replaced.
    active: Mutex<Option<NamedTempFile>>,
}

impl WpaSupplicantConfigurator {
    pub fn new(interface: impl Into<String>, fallback_config: impl Into<PathBuf>) -> Self {
        Self {
            interface: interface.into(),
            fallback_config: fallback_config.into(),
            killall_program: "killall".to_string(),
            supplicant_program: "wpa_supplicant".to_string(),
            active: Mutex::new(None),
        }
    }

    #[cfg(test)]
    fn with_programs(mut self, killall: &str, supplicant: &str) -> Self {
        self.killall_program = killall.to_string();
        self.supplicant_program = supplicant.to_string();
        self
    }

    /// Render a single-network supplicant config.
    ///
    /// Credentials must already be validated; an empty password renders an
    /// open network.
    pub fn render_config(credentials: &WifiCredentials) -> String {
        let mut out = String::new();
        out.push_str("ctrl_interface=DIR=/var/run/wpa_supplicant GROUP=wheel\n");
        out.push_str("network={\n");
        let _ = writeln!(out, "    ssid=\"{}\"", credentials.ssid);
        out.push_str("    scan_ssid=1\n");
        if credentials.is_open() {
            out.push_str("    key_mgmt=NONE\n");
        } else {
            out.push_str("    key_mgmt=WPA-PSK\n");
            let _ = writeln!(out, "    psk=\"{}\"", credentials.password);
        }
        out.push_str("}\n");
        out
    }

    fn active_config_path(&self) -> Option<PathBuf> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|file| file.path().to_path_buf())
    }

    async fn stop_supplicant(&self) -> io::Result<()> {
        // Non-zero when no instance was running
        let status = Command::new(&self.killall_program)
            .arg("wpa_supplicant")
            .status()
            .await?;
        debug!("killall wpa_supplicant: {}", status);
        Ok(())
    }

    async fn launch(&self, config: &Path) -> Result<(), ApplyError> {
        let status = Command::new(&self.supplicant_program)
            .arg("-B")
            .arg("-i")
            .arg(&self.interface)
            .arg("-c")
            .arg(config)
            .status()
            .await?;
        if !status.success() {
            return Err(ApplyError::CommandFailed {
                program: "wpa_supplicant",
                status,
            });
        }
        Ok(())
    }

    async fn restore_previous(&self) {
        let previous = self
            .active_config_path()
            .unwrap_or_else(|| self.fallback_config.clone());
        match self.launch(&previous).await {
            Ok(()) => info!("wpa_supplicant restored from {}", previous.display()),
            Err(e) => error!(
                "Failed to restore wpa_supplicant from {}: {}",
                previous.display(),
                e
            ),
        }
    }
}

impl Default for WpaSupplicantConfigurator {
    fn default() -> Self {
        Self::new(DEFAULT_INTERFACE, DEFAULT_WPA_CONFIG)
    }
}

/// Write `contents` to a new owner-only temp file.
fn write_temp_config(contents: &str) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("wpa_supplicant-")
        .suffix(".conf")
        .tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    Ok(file)
}

#[async_trait]
impl WifiConfigurator for WpaSupplicantConfigurator {
    async fn apply_wifi_credentials(
        &self,
        credentials: &WifiCredentials,
    ) -> Result<(), ApplyError> {
        credentials.validate()?;

        let mut rendered = Self::render_config(credentials);
        let config = tokio::task::spawn_blocking(move || {
            let written = write_temp_config(&rendered);
            rendered.zeroize();
            written
        })
        .await
        .map_err(io::Error::other)??;
        info!(
            "Rendered supplicant config for '{}' to {}",
            credentials.ssid,
            config.path().display()
        );

        self.stop_supplicant().await?;
        if let Err(e) = self.launch(config.path()).await {
            warn!("wpa_supplicant rejected the new config: {}", e);
            self.restore_previous().await;
            return Err(e);
        }

        let replaced = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(config);
        drop(replaced);
        info!("wpa_supplicant restarted on {}", self.interface);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wifi::CredentialError;
    use std::io::Write;

    const SYSTEM_CONFIG: &str = "country=GB\nupdate_config=1\n\
                                 network={\n    ssid=\"Office\"\n    psk=\"officepass\"\n}\n";

    fn system_config() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SYSTEM_CONFIG.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_render_wpa_network() {
        let creds = WifiCredentials::new("HomeNetwork", "password123");
        let config = WpaSupplicantConfigurator::render_config(&creds);
        assert_eq!(
            config,
            "ctrl_interface=DIR=/var/run/wpa_supplicant GROUP=wheel\n\
             network={\n    \
             ssid=\"HomeNetwork\"\n    \
             scan_ssid=1\n    \
             key_mgmt=WPA-PSK\n    \
             psk=\"password123\"\n\
             }\n"
        );
    }

    #[test]
    fn test_render_open_network() {
        let creds = WifiCredentials::new("CoffeeShop", "");
        let config = WpaSupplicantConfigurator::render_config(&creds);
        assert!(config.contains("key_mgmt=NONE"));
        assert!(!config.contains("psk="));
    }

    #[test]
    fn test_defaults() {
        let configurator = WpaSupplicantConfigurator::default();
        assert_eq!(configurator.interface, "wlan0");
        assert_eq!(
            configurator.fallback_config,
            Path::new("/etc/wpa_supplicant/wpa_supplicant.conf")
        );
        assert!(configurator.active_config_path().is_none());
    }

    #[tokio::test]
    async fn test_apply_rejects_before_restarting() {
        let configurator =
            WpaSupplicantConfigurator::new("wlan0", "/nonexistent").with_programs("false", "false");
        let creds = WifiCredentials::new("bad\nssid", "password123");

        let result = configurator.apply_wifi_credentials(&creds).await;
        assert!(matches!(
            result,
            Err(ApplyError::InvalidCredentials(CredentialError::ForbiddenChar { .. }))
        ));
        assert!(configurator.active_config_path().is_none());
    }

    #[tokio::test]
    async fn test_apply_leaves_system_config_untouched() {
        let system = system_config();
        let configurator =
            WpaSupplicantConfigurator::new("wlan0", system.path()).with_programs("true", "true");

        configurator
            .apply_wifi_credentials(&WifiCredentials::new("HomeNetwork", "password123"))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(system.path()).unwrap(), SYSTEM_CONFIG);
        let active = configurator.active_config_path().unwrap();
        assert_ne!(active, system.path());
        let rendered = std::fs::read_to_string(&active).unwrap();
        assert!(rendered.contains("ssid=\"HomeNetwork\""));
        assert!(rendered.contains("psk=\"password123\""));
    }

    #[tokio::test]
    async fn test_replaced_config_is_deleted() {
        let system = system_config();
        let configurator =
            WpaSupplicantConfigurator::new("wlan0", system.path()).with_programs("true", "true");

        configurator
            .apply_wifi_credentials(&WifiCredentials::new("First", "password1"))
            .await
            .unwrap();
        let first = configurator.active_config_path().unwrap();
        configurator
            .apply_wifi_credentials(&WifiCredentials::new("Second", "password2"))
            .await
            .unwrap();

        assert!(!first.exists());
        let second = configurator.active_config_path().unwrap();
        assert!(std::fs::read_to_string(second).unwrap().contains("Second"));
    }

    #[tokio::test]
    async fn test_failed_start_keeps_previous_config() {
        let system = system_config();
        let mut configurator =
            WpaSupplicantConfigurator::new("wlan0", system.path()).with_programs("true", "true");
        configurator
            .apply_wifi_credentials(&WifiCredentials::new("HomeNetwork", "password123"))
            .await
            .unwrap();
        let working = configurator.active_config_path().unwrap();

        configurator.supplicant_program = "false".to_string();
        let result = configurator
            .apply_wifi_credentials(&WifiCredentials::new("Broken", "password456"))
            .await;

        assert!(matches!(
            result,
            Err(ApplyError::CommandFailed { program: "wpa_supplicant", .. })
        ));
        assert_eq!(configurator.active_config_path(), Some(working.clone()));
        assert!(std::fs::read_to_string(&working).unwrap().contains("HomeNetwork"));
        assert_eq!(std::fs::read_to_string(system.path()).unwrap(), SYSTEM_CONFIG);
    }
}
