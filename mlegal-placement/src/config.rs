//! Global registry for configuration of a legalization run.
//!

use anyhow::{anyhow, Context, Result};
use clap::{Arg, Command};
use std::path::PathBuf;

use crate::error::LegalizeError;

/// Configuration variables related to input/output operations
#[derive(Clone, Debug)]
pub struct IOConfig {
    /// Input file name (a DEF file, or a JSON placement model)
    pub input_file: PathBuf,
    /// Output file name (the final placement model, as JSON)
    pub output_file: PathBuf,
    /// Where to dump every intermediate snapshot, if anywhere
    pub history_file: Option<PathBuf>,
    /// Where to dump per-snapshot overlap statistics, if anywhere
    pub stats_file: Option<PathBuf>,
}

/// Geometry shared by every macro in a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryConfig {
    /// Width of every macro, in design units
    pub macro_width: i64,
    /// Height of every macro, in design units
    pub macro_height: i64,
    /// Clearance kept around every macro on all four sides, in design units
    pub halo: i64,
}

impl GeometryConfig {
    pub fn validate(&self) -> Result<(), LegalizeError> {
        if self.macro_width <= 0 || self.macro_height <= 0 {
            return Err(LegalizeError::NonPositiveExtent {
                width: self.macro_width,
                height: self.macro_height,
            });
        }
        if self.halo < 0 {
            return Err(LegalizeError::NegativeHalo(self.halo));
        }
        Ok(())
    }
}

/// Configuration of the force relaxation legalizer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceConfig {
    /// Repulsion gain, multiplied with the overlap depth of a pair
    pub overlap_force: f64,
    /// Restoring gain, multiplied with the distance from the reference position
    pub spring_force: f64,
    /// Number of relaxation steps per run
    pub iterations: usize,
}

impl ForceConfig {
    pub fn validate(&self) -> Result<(), LegalizeError> {
        if !self.overlap_force.is_finite() {
            return Err(LegalizeError::NonFiniteParameter {
                name: "overlap_force",
                value: self.overlap_force,
            });
        }
        if !self.spring_force.is_finite() {
            return Err(LegalizeError::NonFiniteParameter {
                name: "spring_force",
                value: self.spring_force,
            });
        }
        Ok(())
    }
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            overlap_force: 0.2,
            spring_force: 0.05,
            iterations: 50,
        }
    }
}

/// Which legalization strategy drives the run
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Strategy {
    /// One greedy displacement step per macro, in order of distance from the origin
    Sequential,
    /// A fixed number of force relaxation steps
    Force(ForceConfig),
}

/// Overall legalization configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub io: IOConfig,
    pub geometry: GeometryConfig,
    pub strategy: Strategy,
}

/// Command line interface of the legalizer binary
pub fn command() -> Command<'static> {
    Command::new("MLegal Placer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Removes overlaps between equally sized macros in an existing placement")
        .arg(
            Arg::new("INPUT")
                .help("Input placement, a DEF file or a JSON model written by this tool")
                .allow_invalid_utf8(true)
                .index(1)
                .required(true),
        )
        .arg(
            Arg::new("OUTPUT")
                .help("Output file location for the legalized placement (JSON)")
                .allow_invalid_utf8(true)
                .index(2)
                .required(true),
        )
        .arg(
            Arg::new("STRATEGY")
                .long("strategy")
                .takes_value(true)
                .possible_values(["sequential", "force"])
                .default_value("sequential"),
        )
        .arg(
            Arg::new("WIDTH")
                .long("width")
                .takes_value(true)
                .default_value("155420")
                .help("Width of every macro, in design units"),
        )
        .arg(
            Arg::new("HEIGHT")
                .long("height")
                .takes_value(true)
                .default_value("81200")
                .help("Height of every macro, in design units"),
        )
        .arg(
            Arg::new("HALO")
                .long("halo")
                .takes_value(true)
                .default_value("10000")
                .help("Clearance required around every macro, in design units"),
        )
        .arg(
            Arg::new("OVERLAP_FORCE")
                .long("overlap-force")
                .takes_value(true)
                .default_value("0.2"),
        )
        .arg(
            Arg::new("SPRING_FORCE")
                .long("spring-force")
                .takes_value(true)
                .default_value("0.05"),
        )
        .arg(
            Arg::new("ITERATIONS")
                .long("iterations")
                .takes_value(true)
                .default_value("50")
                .help("Number of force relaxation steps"),
        )
        .arg(
            Arg::new("HISTORY")
                .long("history")
                .takes_value(true)
                .allow_invalid_utf8(true)
                .help("Write every intermediate placement to this file (JSON)"),
        )
        .arg(
            Arg::new("STATS")
                .long("stats")
                .takes_value(true)
                .allow_invalid_utf8(true)
                .help("Write per-step overlap statistics to this file (JSON)"),
        )
}

fn parse_value<T>(matches: &clap::ArgMatches, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .value_of(name)
        .ok_or_else(|| anyhow!("Missing value for {}", name))?
        .parse()
        .with_context(|| anyhow!("Parse {}", name))
}

impl Config {
    /// Construct a configuration from the clap argument matches
    pub fn from_args(matches: &clap::ArgMatches) -> Result<Self> {
        let strategy = match matches.value_of("STRATEGY") {
            Some("force") => Strategy::Force(ForceConfig {
                overlap_force: parse_value(matches, "OVERLAP_FORCE")?,
                spring_force: parse_value(matches, "SPRING_FORCE")?,
                iterations: parse_value(matches, "ITERATIONS")?,
            }),
            Some("sequential") | None => Strategy::Sequential,
            Some(other) => return Err(anyhow!("Unknown strategy {:?}", other)),
        };

        let config = Config {
            io: IOConfig {
                input_file: PathBuf::from(
                    matches
                        .value_of_os("INPUT")
                        .ok_or_else(|| anyhow!("Missing input file"))?,
                ),
                output_file: PathBuf::from(
                    matches
                        .value_of_os("OUTPUT")
                        .ok_or_else(|| anyhow!("Missing output file"))?,
                ),
                history_file: matches.value_of_os("HISTORY").map(PathBuf::from),
                stats_file: matches.value_of_os("STATS").map(PathBuf::from),
            },
            geometry: GeometryConfig {
                macro_width: parse_value(matches, "WIDTH")?,
                macro_height: parse_value(matches, "HEIGHT")?,
                halo: parse_value(matches, "HALO")?,
            },
            strategy,
        };

        config.geometry.validate().context("Invalid macro geometry")?;
        if let Strategy::Force(force) = &config.strategy {
            force.validate().context("Invalid force parameters")?;
        }

        Ok(config)
    }
}
