use log::{error, info};
use std::{
    path::Path,
    process::{Command, ExitStatus},
};

use crate::error::{Result, UnitError};

/// The service manager a bundle is applied to after its files are written.
pub trait ServiceManager {
    fn daemon_reload(&self) -> Result<()>;
    fn restart(&self, unit: &str) -> Result<()>;
    fn enable(&self, unit: &str) -> Result<()>;
    fn status(&self, unit: &str) -> Result<()>;
    fn verify(&self, path: &Path) -> Result<()>;
}

/// Drives the real `systemctl`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Systemctl {
    pub use_sudo: bool,
    pub user: bool,
}

impl Systemctl {
    pub fn new(use_sudo: bool, user: bool) -> Self {
        Systemctl { use_sudo, user }
    }

    fn command(&self) -> Command {
        let mut cmd = if self.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg("systemctl");
            cmd
        } else {
            Command::new("systemctl")
        };
        if self.user {
            cmd.arg("--user");
        }
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<()> {
        let mut cmd = self.command();
        cmd.args(args);
        let command = describe(&cmd);
        info!("Running {}", command);
        let status = cmd
            .status()
            .map_err(|e| UnitError::io(cmd.get_program(), e))?;
        check(command, status)
    }
}

impl ServiceManager for Systemctl {
    fn daemon_reload(&self) -> Result<()> {
        self.run(&["daemon-reload"])
    }

    fn restart(&self, unit: &str) -> Result<()> {
        // restart also starts units that are not running yet
        self.run(&["restart", unit])
    }

    fn enable(&self, unit: &str) -> Result<()> {
        self.run(&["enable", unit])
    }

    fn status(&self, unit: &str) -> Result<()> {
        let mut cmd = Command::new("systemctl");
        if self.user {
            cmd.arg("--user");
        }
        cmd.args(["status", unit]);
        let command = describe(&cmd);
        let status = cmd
            .status()
            .map_err(|e| UnitError::io(cmd.get_program(), e))?;
        check(command, status)
    }

    fn verify(&self, path: &Path) -> Result<()> {
        let mut cmd = Command::new("systemd-analyze");
        cmd.arg("verify").arg(path);
        let command = describe(&cmd);
        let status = cmd
            .status()
            .map_err(|e| UnitError::io(cmd.get_program(), e))?;
        if !status.success() {
            error!("Verification failed for {}", path.display());
        }
        check(command, status)
    }
}

/// Logs what would run instead of touching the service manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

impl ServiceManager for DryRun {
    fn daemon_reload(&self) -> Result<()> {
        info!("[dry run] systemctl daemon-reload");
        Ok(())
    }

    fn restart(&self, unit: &str) -> Result<()> {
        info!("[dry run] systemctl restart {}", unit);
        Ok(())
    }

    fn enable(&self, unit: &str) -> Result<()> {
        info!("[dry run] systemctl enable {}", unit);
        Ok(())
    }

    fn status(&self, unit: &str) -> Result<()> {
        info!("[dry run] systemctl status {}", unit);
        Ok(())
    }

    fn verify(&self, path: &Path) -> Result<()> {
        info!("[dry run] systemd-analyze verify {}", path.display());
        Ok(())
    }
}

fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

fn check(command: String, status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(UnitError::Command {
            command,
            status: status.to_string(),
        })
    }
}
