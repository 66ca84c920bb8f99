//! Rendering of resolution results for the compile/link step

use anyhow::{Context, Result};
use resolver::{FlagSet, Resolution};

/// Output format for `symconf resolve`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Full resolution as JSON
    Json,
    /// `export VAR='...'` lines for a shell
    Shell,
}

/// Render a resolution in the requested format
pub fn render(resolution: &Resolution, format: Format) -> Result<String> {
    match format {
        Format::Json => {
            serde_json::to_string_pretty(resolution).context("Failed to serialize resolution")
        }
        Format::Shell => Ok(render_shell(&resolution.flags)),
    }
}

fn render_shell(flags: &FlagSet) -> String {
    let mut cflags = flags.compile_flags.clone();
    cflags.extend(flags.c_flags.iter().cloned());

    let vars = [
        ("CPPFLAGS", flags.cpp_flags()),
        ("CFLAGS", cflags),
        ("CXXFLAGS", flags.compile_flags.clone()),
        ("LDFLAGS", flags.link_flags.clone()),
        ("LIBS", flags.lib_args()),
    ];

    let mut out = String::new();
    for (name, args) in vars {
        let joined: Vec<String> = args.iter().map(|a| shell_quote(a)).collect();
        out.push_str(&format!("export {}={}\n", name, shell_quote(&joined.join(" "))));
    }
    out
}

/// Quote a word for POSIX shells
fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=+:,./@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}
