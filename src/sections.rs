//! Typed records for the sections a unit bundle writes.
//!
//! Each record carries a static field table mapping its Rust field names to
//! the directive keys used on disk, so no name conversion happens at runtime.

use crate::document::{Section, ValueList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub key: &'static str,
}

pub trait SectionRecord: Default {
    /// Section header, e.g. `Service`.
    const NAME: &'static str;
    const FIELDS: &'static [Field];

    fn to_section(&self) -> Section;
}

macro_rules! section_record {
    ($(#[$meta:meta])* $record:ident, $section:literal, { $($field:ident => $key:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $record {
            $(pub $field: Option<ValueList>,)*
        }

        impl SectionRecord for $record {
            const NAME: &'static str = $section;
            const FIELDS: &'static [Field] = &[
                $(Field { name: stringify!($field), key: $key },)*
            ];

            fn to_section(&self) -> Section {
                let mut section = Section::new();
                $(
                    if let Some(values) = &self.$field {
                        section.set($key, values.clone());
                    }
                )*
                section
            }
        }
    };
}

section_record!(
    /// `[Unit]`: generic metadata and dependencies.
    UnitSection, "Unit", {
    description => "Description",
    documentation => "Documentation",
    requires => "Requires",
    wants => "Wants",
    binds_to => "BindsTo",
    part_of => "PartOf",
    before => "Before",
    after => "After",
    conflicts => "Conflicts",
    condition_path_exists => "ConditionPathExists",
    assert_path_exists => "AssertPathExists",
});

section_record!(
    /// `[Install]`: consulted by `systemctl enable`.
    InstallSection, "Install", {
    alias => "Alias",
    wanted_by => "WantedBy",
    required_by => "RequiredBy",
    also => "Also",
    default_instance => "DefaultInstance",
});

section_record!(ServiceSection, "Service", {
    service_type => "Type",
    exec_start => "ExecStart",
    exec_start_pre => "ExecStartPre",
    exec_start_post => "ExecStartPost",
    exec_reload => "ExecReload",
    exec_stop => "ExecStop",
    restart => "Restart",
    restart_sec => "RestartSec",
    timeout_sec => "TimeoutSec",
    remain_after_exit => "RemainAfterExit",
    pid_file => "PIDFile",
    user => "User",
    group => "Group",
    working_directory => "WorkingDirectory",
    environment => "Environment",
    environment_file => "EnvironmentFile",
    standard_output => "StandardOutput",
    standard_error => "StandardError",
});

section_record!(SocketSection, "Socket", {
    listen_stream => "ListenStream",
    listen_datagram => "ListenDatagram",
    listen_fifo => "ListenFIFO",
    accept => "Accept",
    service => "Service",
    socket_user => "SocketUser",
    socket_group => "SocketGroup",
    socket_mode => "SocketMode",
});

section_record!(
    /// `[Timer]`: monotonic and calendar triggers.
    TimerSection, "Timer", {
    on_active_sec => "OnActiveSec",
    on_boot_sec => "OnBootSec",
    on_startup_sec => "OnStartupSec",
    on_unit_active_sec => "OnUnitActiveSec",
    on_unit_inactive_sec => "OnUnitInactiveSec",
    on_calendar => "OnCalendar",
    accuracy_sec => "AccuracySec",
    unit => "Unit",
    persistent => "Persistent",
    wake_system => "WakeSystem",
});

section_record!(MountSection, "Mount", {
    what => "What",
    mount_point => "Where",
    mount_type => "Type",
    options => "Options",
    directory_mode => "DirectoryMode",
    timeout_sec => "TimeoutSec",
});

section_record!(AutomountSection, "Automount", {
    mount_point => "Where",
    directory_mode => "DirectoryMode",
    timeout_idle_sec => "TimeoutIdleSec",
});

section_record!(SwapSection, "Swap", {
    what => "What",
    priority => "Priority",
    options => "Options",
    timeout_sec => "TimeoutSec",
});

section_record!(PathSection, "Path", {
    path_exists => "PathExists",
    path_exists_glob => "PathExistsGlob",
    path_changed => "PathChanged",
    path_modified => "PathModified",
    directory_not_empty => "DirectoryNotEmpty",
    unit => "Unit",
    make_directory => "MakeDirectory",
    directory_mode => "DirectoryMode",
});

/// Known directive keys of a section, if it is one of the typed records.
pub fn known_fields(section: &str) -> Option<&'static [Field]> {
    let tables: [(&str, &'static [Field]); 9] = [
        (UnitSection::NAME, UnitSection::FIELDS),
        (InstallSection::NAME, InstallSection::FIELDS),
        (ServiceSection::NAME, ServiceSection::FIELDS),
        (SocketSection::NAME, SocketSection::FIELDS),
        (TimerSection::NAME, TimerSection::FIELDS),
        (MountSection::NAME, MountSection::FIELDS),
        (AutomountSection::NAME, AutomountSection::FIELDS),
        (SwapSection::NAME, SwapSection::FIELDS),
        (PathSection::NAME, PathSection::FIELDS),
    ];
    tables
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, fields)| *fields)
}

/// The field a directive key maps to in one of the typed sections.
pub fn field_by_key(section: &str, key: &str) -> Option<&'static Field> {
    known_fields(section)?.iter().find(|f| f.key == key)
}
