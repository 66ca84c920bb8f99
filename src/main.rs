mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{ConfigLoader, OPTIONS};
use console::style;
use output::Format;
use resolver::{resolve_flags, PkgConfig, PkgConfigSettings, PlatformProfile};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// symconf - Resolve compiler and linker flags for Symbian cross builds
#[derive(Parser, Debug)]
#[command(name = "symconf", version, author, about, long_about = None)]
struct Cli {
    /// Option file (TOML)
    #[arg(short, long, global = true, env = "SYMCONF_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve options into a flag set
    Resolve {
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: Format,

        /// Query pkg-config for libraries taken from the system
        #[arg(long)]
        probe: bool,

        /// Sysroot for pkg-config lookups
        #[arg(long, requires = "probe")]
        sysroot: Option<PathBuf>,

        /// Fail if the option file does not exist
        #[arg(long)]
        strict: bool,
    },
    /// List recognized options and their defaults
    Options,
    /// Show the target platform profile
    Profile,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Resolve {
            format,
            probe,
            sysroot,
            strict,
        } => cmd_resolve(cli.config, format, probe, sysroot, strict),
        Commands::Options => cmd_options(),
        Commands::Profile => cmd_profile(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_resolve(
    config: Option<PathBuf>,
    format: Format,
    probe: bool,
    sysroot: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    let loader = match config {
        Some(path) => ConfigLoader::new(path),
        None => ConfigLoader::from_env(),
    }
    .use_defaults(!strict);

    let raw = loader
        .load()
        .with_context(|| format!("Failed to load {}", loader.path().display()))?;

    let profile = PlatformProfile::symbian();
    let mut resolution = resolve_flags(&raw, profile).context("Configuration error")?;

    if probe && !resolution.flags.discovery.is_empty() {
        let settings = sysroot
            .as_deref()
            .map(PkgConfigSettings::for_sysroot)
            .unwrap_or_default();
        let pkg_config = PkgConfig::locate(settings)?;
        resolution = resolution.probe(&pkg_config, profile)?;
    }

    println!("{}", output::render(&resolution, format)?);
    Ok(())
}

fn cmd_options() -> Result<()> {
    println!("{}", style("Recognized options").bold());
    println!("Values other than paths match in any case.");
    println!("\"default\" or \"auto\" selects the declared default.");
    println!();
    for decl in OPTIONS {
        let default = decl.default.unwrap_or("(required)");
        println!(
            "  {:<22} {:<10} {}",
            style(decl.name).green(),
            default,
            decl.help
        );
        println!("  {:<22} {}", "", decl.kind.allowed().join(" | "));
    }
    Ok(())
}

fn cmd_profile() -> Result<()> {
    let profile = PlatformProfile::symbian();
    profile.check()?;

    println!("{}", style(format!("{} profile", profile.name)).bold());
    println!("  Target:        {}", profile.triplet);
    println!(
        "  Compiler:      {} ({})",
        profile.triplet.tool("g++"),
        profile.gcc_version
    );
    println!("  Base defines:  {}", profile.defines.len());
    println!("  Entry libs:    {}", profile.libraries.entry.join(" "));
    println!(
        "  Support libs:  {}",
        profile.libraries.toolchain_support.join(" ")
    );
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(profile).context("Failed to serialize profile")?
    );
    Ok(())
}
