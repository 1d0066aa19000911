use env_logger::Builder;
use log::{info, LevelFilter};
use serde::de::DeserializeOwned;
use std::{
    env,
    io::{stdin, Read},
    path::{Path, PathBuf},
    str,
};
use tera::Tera;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use unitforge::{
    location::LocationVariant,
    systemd::{DryRun, ServiceManager, Systemctl},
    utils::{ask_confirm, is_interactive, print_files},
    BundleOptions, Location, UnitBundle, UnitFiles,
};

#[derive(Parser, Debug)]
#[clap(name = "unitforge", version = "0.1.0")]
pub struct Opts {
    #[clap(subcommand)]
    pub cmd: Cmd,
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print the unit files an input describes without writing them
    Render {
        name: String,
        #[clap(flatten)]
        input: InputArgs,
        #[clap(long)]
        require_sections: bool,
    },
    /// Print the unit files currently on disk
    Show {
        name: String,
        #[clap(flatten)]
        target: TargetArgs,
    },
    /// Write new unit files, refusing to touch existing ones unless --force
    Create {
        name: String,
        #[clap(flatten)]
        input: InputArgs,
        #[clap(flatten)]
        target: TargetArgs,
        #[clap(flatten)]
        apply: ApplyArgs,
    },
    /// Merge the input into the existing unit files
    Update {
        name: String,
        #[clap(flatten)]
        input: InputArgs,
        #[clap(flatten)]
        target: TargetArgs,
        #[clap(flatten)]
        apply: ApplyArgs,
    },
    /// Delete the existing unit files and write only the input
    Replace {
        name: String,
        #[clap(flatten)]
        input: InputArgs,
        #[clap(flatten)]
        target: TargetArgs,
        #[clap(flatten)]
        apply: ApplyArgs,
    },
    /// Delete every unit file of the bundle
    Delete {
        name: String,
        #[clap(flatten)]
        target: TargetArgs,
        #[clap(short, long)]
        yes: bool,
    },
    /// Show the service manager status
    Status {
        name: String,
        #[clap(flatten)]
        target: TargetArgs,
    },
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    // if no input is given, the desired state is read from stdin
    pub input: Option<PathBuf>,
    #[clap(short, long, value_enum)]
    pub from: Option<FromVariant>,

    #[clap(long, action = clap::ArgAction::SetTrue, overrides_with = "no_tera")]
    pub tera: bool,
    #[clap(long = "no-tera", action = clap::ArgAction::SetFalse, hide = true)]
    pub no_tera: bool,
}

#[derive(Parser, Debug)]
pub struct TargetArgs {
    #[clap(short, long, value_enum, default_value = "global")]
    pub location: LocationVariant,
    /// write to this directory instead of a systemd location
    #[clap(short, long)]
    pub dir: Option<PathBuf>,
    /// prefix systemctl with sudo
    #[clap(long)]
    pub sudo: bool,
}

impl TargetArgs {
    fn location(&self) -> Location {
        match &self.dir {
            Some(dir) => Location::Directory(dir.clone()),
            None => self.location.into(),
        }
    }

    fn manager(&self, dry_run: bool) -> Box<dyn ServiceManager> {
        if dry_run {
            Box::new(DryRun)
        } else {
            Box::new(Systemctl::new(self.sudo, self.location().is_user()))
        }
    }
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    #[clap(long)]
    pub force: bool,
    #[clap(long)]
    pub no_start: bool,
    #[clap(long)]
    pub enable: bool,
    #[clap(long)]
    pub require_sections: bool,
    #[clap(long)]
    pub verify: bool,
    /// only write the files, never call systemctl
    #[clap(long)]
    pub no_apply: bool,
}

impl ApplyArgs {
    fn options(&self) -> BundleOptions {
        BundleOptions {
            auto_start: !self.no_start,
            enable_at_startup: self.enable,
            force_overwrite: self.force,
            require_sections: self.require_sections,
            verify: self.verify,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum FromVariant {
    Json,
    Yaml,
    Ron,
    Toml,
}

impl FromVariant {
    // Deserialize into a struct
    pub fn deserialize_into<T>(&self, s: &[u8]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        match self {
            FromVariant::Json => serde_json::from_slice(s).map_err(anyhow::Error::new),
            FromVariant::Yaml => serde_yaml::from_slice(s).map_err(anyhow::Error::new),
            FromVariant::Ron => ron::de::from_bytes(s).map_err(anyhow::Error::new),
            FromVariant::Toml => {
                let s = str::from_utf8(s)?;
                toml::from_str(s).map_err(anyhow::Error::new)
            }
        }
    }

    // Get variant from filepath
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(FromVariant::Json),
            "yaml" | "yml" => Some(FromVariant::Yaml),
            "ron" => Some(FromVariant::Ron),
            "toml" => Some(FromVariant::Toml),
            _ => None,
        }
    }
}

fn read_desired(name: &str, args: InputArgs) -> Result<UnitFiles> {
    let mut tera_enabled = args.tera;
    let mut input_bytes = Vec::new();

    let from_variant = match &args.input {
        Some(inp_path) => {
            input_bytes = std::fs::read(inp_path)
                .with_context(|| format!("Failed to read input: {}", inp_path.display()))?;
            let mut format_path = inp_path.clone();
            if inp_path.extension().and_then(|e| e.to_str()) == Some("tera") {
                tera_enabled = true;
                format_path.set_extension("");
            }
            args.from
                .or_else(|| FromVariant::from_path(&format_path))
                .ok_or_else(|| anyhow!("Type of the file could not be inferred, use --from"))?
        }
        None => {
            stdin().lock().read_to_end(&mut input_bytes)?;
            args.from.ok_or_else(|| {
                anyhow!("Input format must be specified with --from when reading from stdin")
            })?
        }
    };

    if tera_enabled {
        let input_str = str::from_utf8(&input_bytes)?;
        let mut context = tera::Context::new();
        context.insert("name", name);
        let rendered = Tera::one_off(input_str, &context, false)?;
        log::debug!("Tera output:\n{rendered}");
        input_bytes = rendered.into_bytes();
    }

    let units: UnitFiles = from_variant.deserialize_into(&input_bytes)?;
    if units.0.is_empty() {
        bail!("Input resulted in no units to process.");
    }
    Ok(units)
}

fn bundle_from_input(
    name: String,
    input: InputArgs,
    location: Location,
    options: BundleOptions,
) -> Result<UnitBundle> {
    let units = read_desired(&name, input)?;
    let mut bundle = UnitBundle::new(name, location, options)?;
    bundle.insert_files(units)?;
    Ok(bundle)
}

pub fn run(opts: Opts) -> Result<()> {
    match opts.cmd {
        Cmd::Render {
            name,
            input,
            require_sections,
        } => {
            let options = BundleOptions {
                require_sections,
                ..Default::default()
            };
            let bundle = bundle_from_input(name, input, Location::Directory(".".into()), options)?;
            print_files(&bundle.render(bundle.desired())?);
        }
        Cmd::Show { name, target } => {
            let bundle = UnitBundle::new(name, target.location(), BundleOptions::default())?;
            let existing = bundle.load_existing()?;
            if existing.0.is_empty() {
                bail!("No units found for {}", bundle.name());
            }
            print_files(&bundle.render(&existing)?);
        }
        Cmd::Create {
            name,
            input,
            target,
            apply,
        } => {
            let bundle = bundle_from_input(name, input, target.location(), apply.options())?;
            let written = bundle.create(target.manager(apply.no_apply).as_ref())?;
            info!("Created {} unit file(s)", written.len());
        }
        Cmd::Update {
            name,
            input,
            target,
            apply,
        } => {
            let bundle = bundle_from_input(name, input, target.location(), apply.options())?;
            let written = bundle.update(target.manager(apply.no_apply).as_ref())?;
            info!("Updated {} unit file(s)", written.len());
        }
        Cmd::Replace {
            name,
            input,
            target,
            apply,
        } => {
            let bundle = bundle_from_input(name, input, target.location(), apply.options())?;
            let written = bundle.replace(target.manager(apply.no_apply).as_ref())?;
            info!("Replaced with {} unit file(s)", written.len());
        }
        Cmd::Delete { name, target, yes } => {
            let bundle = UnitBundle::new(name, target.location(), BundleOptions::default())?;
            let files = bundle.existing_files()?;
            if files.is_empty() {
                info!("Nothing to delete for {}", bundle.name());
                return Ok(());
            }
            if !yes
                && is_interactive()
                && !ask_confirm(
                    &format!("Delete {} file(s) of '{}'?", files.len(), bundle.name()),
                    false,
                )?
            {
                info!("Files were not deleted.");
                return Ok(());
            }
            bundle.delete()?;
        }
        Cmd::Status { name, target } => {
            let bundle = UnitBundle::new(name, target.location(), BundleOptions::default())?;
            bundle.status(target.manager(false).as_ref())?;
        }
    }

    Ok(())
}

#[allow(unused_variables)]
fn init_logger(opts: &Opts) {
    let rust_log = env::var("RUST_LOG").ok();

    let mut builder = Builder::from_default_env();

    #[cfg(debug_assertions)]
    {
        if rust_log.is_none() {
            builder.filter_level(LevelFilter::Debug);
        }
    }
    #[cfg(not(debug_assertions))]
    {
        builder
            .format_module_path(false)
            .format_target(false)
            .format_timestamp(None);

        if rust_log.is_none() {
            let log_level = match opts.verbose {
                0 | 1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            };
            builder.filter(None, log_level);
        }
    }

    builder.init();
}

fn main() {
    let opts = Opts::parse();

    init_logger(&opts);

    if let Err(e) = run(opts) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
