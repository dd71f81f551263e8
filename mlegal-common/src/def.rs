//! DEF reader
//!
//! Only the two pieces of a DEF file the legalizer cares about are read: the `DIEAREA` statement
//! and the placed records of the `COMPONENTS` section. Everything else is skipped.

use std::{
    fmt::{self, Display, Formatter},
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result};

use crate::placement::{DieArea, Macro, ModelError, PlacementModel, PlacementStatus, Point};

/// Number of whitespace separated tokens in a placed component record:
/// `- <name> <type> + <status> ( <x> <y> ) <orientation> ;`
const COMPONENT_TOKENS: usize = 11;

/// Error generated when a DEF file can't be turned into a [PlacementModel]
#[derive(Debug, PartialEq, Eq)]
pub enum DefParseError {
    Io(String),
    MissingDieArea,
    MalformedDieArea { line: usize },
    MalformedComponent { line: usize, tokens: usize },
    InvalidCoordinate { line: usize, value: String },
    UnknownStatus { line: usize, value: String },
    Model(ModelError),
}

impl Display for DefParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read DEF input: {}", e),
            Self::MissingDieArea => write!(f, "no DIEAREA statement found"),
            Self::MalformedDieArea { line } => {
                write!(f, "line {}: DIEAREA needs two ( x y ) points", line)
            }
            Self::MalformedComponent { line, tokens } => write!(
                f,
                "line {}: placed component has {} tokens, expected {}",
                line, tokens, COMPONENT_TOKENS
            ),
            Self::InvalidCoordinate { line, value } => {
                write!(f, "line {}: {:?} is not an integer coordinate", line, value)
            }
            Self::UnknownStatus { line, value } => {
                write!(f, "line {}: unknown placement status {:?}", line, value)
            }
            Self::Model(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DefParseError {}

impl From<ModelError> for DefParseError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}

/// Parse the die area and placed components out of a DEF stream.
pub fn parse_def(reader: impl BufRead) -> Result<PlacementModel, DefParseError> {
    let mut die_area = None;
    let mut components = Vec::new();
    let mut in_components = false;

    for (line_idx, line) in reader.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = line.map_err(|e| DefParseError::Io(e.to_string()))?;

        if die_area.is_none() && line.contains("DIEAREA") {
            die_area = Some(parse_die_area(&line, line_no)?);
        }

        if line.starts_with("COMPONENTS") {
            in_components = true;
            continue;
        }

        if line.trim_end() == "END COMPONENTS" {
            break;
        }

        if in_components {
            if let Some(m) = parse_component(&line, line_no)? {
                components.push(m);
            }
        }
    }

    let die_area = die_area.ok_or(DefParseError::MissingDieArea)?;
    die_area.validate()?;
    let mut model = PlacementModel::new(die_area);
    for m in components {
        model.insert(m)?;
    }

    log::info!(
        "Read {} macros, die area {} to {}",
        model.len(),
        model.die_area.lower_left,
        model.die_area.upper_right
    );

    Ok(model)
}

/// Parse a DEF file from disk.
pub fn parse_def_file(path: impl AsRef<Path>) -> Result<PlacementModel> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open DEF file {:?}", path))?;
    parse_def(BufReader::new(file)).with_context(|| format!("Failed to parse {:?}", path))
}

/// Pad parentheses so `(0 0)` and `( 0 0 )` tokenize the same way.
fn tokenize(line: &str) -> Vec<String> {
    line.replace('(', " ( ")
        .replace(')', " ) ")
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

fn parse_coordinate(value: &str, line: usize) -> Result<i64, DefParseError> {
    value.parse().map_err(|_| DefParseError::InvalidCoordinate {
        line,
        value: value.to_owned(),
    })
}

fn parse_die_area(line: &str, line_no: usize) -> Result<DieArea, DefParseError> {
    let tokens = tokenize(line);
    let mut points = Vec::with_capacity(2);

    let mut i = 0;
    while i + 3 < tokens.len() && points.len() < 2 {
        if tokens[i] == "(" && tokens[i + 3] == ")" {
            points.push(Point::new(
                parse_coordinate(&tokens[i + 1], line_no)?,
                parse_coordinate(&tokens[i + 2], line_no)?,
            ));
            i += 4;
        } else {
            i += 1;
        }
    }

    match points[..] {
        [lower_left, upper_right] => Ok(DieArea::new(lower_left, upper_right)),
        _ => Err(DefParseError::MalformedDieArea { line: line_no }),
    }
}

fn parse_component(line: &str, line_no: usize) -> Result<Option<Macro>, DefParseError> {
    let tokens = tokenize(line);
    if !tokens.iter().any(|t| t == "FIXED" || t == "PLACED") {
        return Ok(None);
    }

    if tokens.len() != COMPONENT_TOKENS {
        return Err(DefParseError::MalformedComponent {
            line: line_no,
            tokens: tokens.len(),
        });
    }

    let status =
        PlacementStatus::from_keyword(&tokens[4]).ok_or_else(|| DefParseError::UnknownStatus {
            line: line_no,
            value: tokens[4].clone(),
        })?;

    Ok(Some(Macro {
        id: tokens[1].clone(),
        kind: tokens[2].clone(),
        position: Point::new(
            parse_coordinate(&tokens[6], line_no)?,
            parse_coordinate(&tokens[7], line_no)?,
        ),
        orientation: tokens[9].clone(),
        status,
        highlighted: false,
    }))
}
