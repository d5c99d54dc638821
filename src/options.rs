//! Command-line options for the `cynthia` binary (§6 "CLI surface", §10
//! ambient stack).
//!
//! Mirrors the teacher crate's `clap`-derived `CliOptions`/`TraceLevel`
//! pattern: a single options struct parsed with `#[derive(Clap)]`, an
//! `ArgGroup` for mutually exclusive formula sources, and a `TraceLevel`
//! enum convertible into a [`log::LevelFilter`] for `env_logger`. The
//! mandated invocation is the two positional arguments of §6
//! (`synthesize <formula-path> <partition-path>`); `-f`/`--formula` is
//! ergonomic sugar letting the formula be given inline instead of as a
//! file, and `--cycle-wins-controller` is an experimentation knob over the
//! pinned tie-break of §4.E step 2 (see `DESIGN.md`).

use clap::{ArgGroup, Clap};

/// Implements [`std::fmt::Display`] from a [`clap::ArgEnum`]'s variant
/// names, so CLI help text and `Display` output always agree.
macro_rules! clap_display {
    ($t:ty) => {
        impl std::fmt::Display for $t
        where
            $t: clap::ArgEnum,
        {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                use clap::ArgEnum as _;
                let self_str = Self::VARIANTS
                    .iter()
                    .find(|s| &Self::from_str(s, false).unwrap() == self)
                    .unwrap();
                write!(f, "{}", self_str)
            }
        }
    };
}

/// Verbosity of the `env_logger` backend, set with `-t`/`--trace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Clap)]
pub enum TraceLevel {
    /// Turn logging off.
    #[clap(name = "off")]
    Off,
    /// Only print errors.
    #[clap(name = "error")]
    Error,
    /// Print errors and warnings.
    #[clap(name = "warn")]
    Warn,
    /// Print errors, warnings and useful information.
    #[clap(name = "info")]
    Info,
    /// Print errors, warnings, useful and debug information.
    #[clap(name = "debug")]
    Debug,
    /// Print all information, including very verbose output.
    #[clap(name = "trace")]
    Trace,
}

impl Default for TraceLevel {
    fn default() -> Self {
        Self::Warn
    }
}
clap_display!(TraceLevel);

impl From<TraceLevel> for log::LevelFilter {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off => Self::Off,
            TraceLevel::Error => Self::Error,
            TraceLevel::Warn => Self::Warn,
            TraceLevel::Info => Self::Info,
            TraceLevel::Debug => Self::Debug,
            TraceLevel::Trace => Self::Trace,
        }
    }
}

/// Parsed command-line arguments for the `cynthia` binary.
///
/// Only the CLI needs this struct; library callers should reach for
/// [`crate::synthesize`]/[`crate::synthesize_with_config`] instead.
#[derive(Debug, Clone, Clap)]
#[clap(
    name = "cynthia",
    version,
    about = "A realizability checker for LTLf reactive synthesis specifications"
)]
#[clap(group = ArgGroup::new("formula-source").required(true))]
pub struct CliOptions {
    /// Path to a file containing the LTLf formula for the specification.
    /// Either this field or [`CliOptions::formula`] has to be set.
    #[clap(index = 1, group = "formula-source", display_order = 0)]
    pub formula_path: Option<String>,

    /// The LTLf formula for the specification, given inline instead of a
    /// file. Either this field or [`CliOptions::formula_path`] has to be
    /// set.
    #[clap(
        short = 'f',
        long = "formula",
        group = "formula-source",
        display_order = 1
    )]
    pub formula: Option<String>,

    /// Path to the partition file assigning every atomic proposition of
    /// the formula to the environment (`.inputs:`) or the controller
    /// (`.outputs:`), per §6.
    #[clap(index = 2, display_order = 2)]
    pub partition_path: String,

    /// Trace level for the logging framework.
    #[clap(
        arg_enum,
        short = 't',
        long = "trace",
        name = "trace-level",
        default_value,
        display_order = 10
    )]
    pub trace_level: TraceLevel,

    /// Flip the cycle tie-break of §4.E step 2 so an unfounded cycle is a
    /// controller *win* instead of a loss. Deviates from the pinned
    /// semantics (`DESIGN.md`); the library entry points never expose
    /// this, only the CLI does.
    #[clap(long = "cycle-wins-controller", display_order = 11)]
    pub cycle_wins_controller: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_level_default_is_warn() {
        assert_eq!(TraceLevel::default(), TraceLevel::Warn);
    }

    #[test]
    fn trace_level_converts_to_level_filter() {
        assert_eq!(log::LevelFilter::from(TraceLevel::Debug), log::LevelFilter::Debug);
    }
}
