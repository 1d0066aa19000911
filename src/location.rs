use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// Where a bundle's unit files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Administrator units, `/etc/systemd/system`.
    Global,
    /// Package-provided units, `/usr/lib/systemd/system`.
    Default,
    /// Units cleared on reboot, `/run/systemd/system`.
    Runtime,
    /// Per-user units below `~/.config/systemd/user`.
    User,
    /// Any other directory, e.g. a scratch directory in tests.
    Directory(PathBuf),
}

impl Location {
    /// Resolves the directory, using `home` for [`Location::User`].
    pub fn directory_in(&self, home: Option<&Path>) -> PathBuf {
        match self {
            Location::Global => PathBuf::from("/etc/systemd/system"),
            Location::Default => PathBuf::from("/usr/lib/systemd/system"),
            Location::Runtime => PathBuf::from("/run/systemd/system"),
            Location::User => match home {
                Some(home) => home.join(".config/systemd/user"),
                None => PathBuf::from("~/.config/systemd/user"),
            },
            Location::Directory(dir) => dir.clone(),
        }
    }

    pub fn directory(&self) -> PathBuf {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        self.directory_in(home.as_deref())
    }

    /// User units are driven through `systemctl --user`.
    pub fn is_user(&self) -> bool {
        matches!(self, Location::User)
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::Global
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationVariant {
    Global,
    Default,
    Runtime,
    User,
}

impl From<LocationVariant> for Location {
    fn from(variant: LocationVariant) -> Self {
        match variant {
            LocationVariant::Global => Location::Global,
            LocationVariant::Default => Location::Default,
            LocationVariant::Runtime => Location::Runtime,
            LocationVariant::User => Location::User,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_directories() {
        assert_eq!(Location::Global.directory_in(None), PathBuf::from("/etc/systemd/system"));
        assert_eq!(Location::Default.directory_in(None), PathBuf::from("/usr/lib/systemd/system"));
        assert_eq!(Location::Runtime.directory_in(None), PathBuf::from("/run/systemd/system"));
    }

    #[test]
    fn user_directory() {
        assert_eq!(
            Location::User.directory_in(Some(Path::new("/home/alice"))),
            PathBuf::from("/home/alice/.config/systemd/user")
        );
        assert_eq!(
            Location::User.directory_in(None),
            PathBuf::from("~/.config/systemd/user")
        );
    }

    #[test]
    fn explicit_directory() {
        let loc = Location::Directory(PathBuf::from("/tmp/units"));
        assert_eq!(loc.directory(), PathBuf::from("/tmp/units"));
        assert!(!loc.is_user());
    }
}
