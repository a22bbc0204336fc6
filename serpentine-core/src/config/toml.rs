//! Minimal TOML reader for match configuration
//!
//! Handles only the subset used by `game.toml`. It does NOT support the
//! full TOML grammar and never allocates.
//!
//! Supported features:
//! - Key = value pairs (string, integer, hex integer)
//! - `[game]`, `[link]` and `[snake.N]` section headers
//! - Comments (# ...)
//!
//! NOT supported:
//! - Arrays and inline tables
//! - Multi-line strings
//! - Dotted keys outside section headers

use serpentine_protocol::{Direction, Role, SnakeId};

use super::types::{ConfigError, GameConfig, SnakeSpawn};
use crate::geometry::BoundaryMode;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Malformed or unknown section header
    InvalidSection,
    /// Line is not `key = value`
    InvalidLine,
    /// Key not valid in the current section
    UnknownKey,
    /// Value does not parse for its key
    InvalidValue,
    /// More snakes than a match holds
    TooManyItems,
    /// Parsed, but the result is not playable
    Invalid(ConfigError),
}

impl From<ConfigError> for ParseError {
    fn from(e: ConfigError) -> Self {
        ParseError::Invalid(e)
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Game,
    Link,
    /// Index into `config.snakes`
    Snake(usize),
}

/// Parse TOML text into a validated [`GameConfig`]
///
/// Keys that are absent keep their defaults. If any `[snake.N]` section is
/// present, only the listed snakes take part.
pub fn parse_config(input: &str) -> Result<GameConfig, ParseError> {
    let mut config = GameConfig::default();
    let defaults = config.snakes.clone();
    let mut section = Section::Root;
    let mut custom_snakes = false;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = match parse_section_header(header)? {
                Header::Game => Section::Game,
                Header::Link => Section::Link,
                Header::Snake(id) => {
                    if !custom_snakes {
                        config.snakes.clear();
                        custom_snakes = true;
                    }
                    let spawn = defaults
                        .iter()
                        .find(|s| s.id == id)
                        .copied()
                        .unwrap_or(SnakeSpawn {
                            id,
                            x: 0,
                            y: 0,
                            direction: Direction::Right,
                            colour: 0xFFFF,
                        });
                    config
                        .snakes
                        .push(spawn)
                        .map_err(|_| ParseError::TooManyItems)?;
                    Section::Snake(config.snakes.len() - 1)
                }
            };
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        apply_value(&mut config, section, key, value)?;
    }

    config.validate()?;
    Ok(config)
}

enum Header {
    Game,
    Link,
    Snake(SnakeId),
}

/// Parse section header like "game" or "snake.1"
fn parse_section_header(header: &str) -> Result<Header, ParseError> {
    match header.trim() {
        "game" => Ok(Header::Game),
        "link" => Ok(Header::Link),
        other => {
            let (kind, id) = other.split_once('.').ok_or(ParseError::InvalidSection)?;
            if kind.trim() != "snake" {
                return Err(ParseError::InvalidSection);
            }
            let id: u8 = id.trim().parse().map_err(|_| ParseError::InvalidSection)?;
            SnakeId::new(id)
                .map(Header::Snake)
                .ok_or(ParseError::InvalidSection)
        }
    }
}

/// Drop a trailing comment unless the `#` sits inside a string
fn strip_comment(line: &str) -> &str {
    line.match_indices('#')
        .map(|(pos, _)| pos)
        .find(|&pos| line[..pos].matches('"').count() % 2 == 0)
        .map_or(line, |pos| &line[..pos])
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse a decimal or `0x` hex integer
fn parse_int<T: TryFrom<u32>>(value: &str) -> Result<T, ParseError> {
    let raw = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse::<u32>(),
    }
    .map_err(|_| ParseError::InvalidValue)?;
    T::try_from(raw).map_err(|_| ParseError::InvalidValue)
}

fn parse_direction(value: &str) -> Result<Direction, ParseError> {
    match parse_string(value) {
        "up" | "Up" | "U" => Ok(Direction::Up),
        "right" | "Right" | "R" => Ok(Direction::Right),
        "down" | "Down" | "D" => Ok(Direction::Down),
        "left" | "Left" | "L" => Ok(Direction::Left),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_boundary(value: &str) -> Result<BoundaryMode, ParseError> {
    match parse_string(value) {
        "kill" | "Kill" => Ok(BoundaryMode::Kill),
        "wrap" | "Wrap" => Ok(BoundaryMode::Wrap),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_role(value: &str) -> Result<Role, ParseError> {
    match parse_string(value) {
        "host" | "Host" => Ok(Role::Host),
        "client" | "Client" => Ok(Role::Client),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_value(
    config: &mut GameConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match section {
        Section::Root => return Err(ParseError::UnknownKey),
        Section::Game => match key {
            "width" => config.width = parse_int(value)?,
            "height" => config.height = parse_int(value)?,
            "frame_interval_ms" => config.frame_interval_ms = parse_int(value)?,
            "fps" => {
                let fps: u32 = parse_int(value)?;
                if fps == 0 {
                    return Err(ParseError::InvalidValue);
                }
                config.frame_interval_ms = 1000 / fps;
            }
            "boundary" => config.boundary = parse_boundary(value)?,
            "starting_length" => config.starting_length = parse_int(value)?,
            "joystick_threshold" => config.joystick_threshold = parse_int(value)?,
            "background" => config.background = parse_int(value)?,
            "local_snake" => {
                let id: u8 = parse_int(value)?;
                config.local_snake = SnakeId::new(id).ok_or(ParseError::InvalidValue)?;
            }
            _ => return Err(ParseError::UnknownKey),
        },
        Section::Link => match key {
            "role" => config.link.role = parse_role(value)?,
            "baud" => config.link.baud = parse_int(value)?,
            "handshake_timeout_ms" => config.link.handshake_timeout_ms = parse_int(value)?,
            _ => return Err(ParseError::UnknownKey),
        },
        Section::Snake(i) => {
            let spawn = config
                .snakes
                .get_mut(i)
                .ok_or(ParseError::InvalidSection)?;
            match key {
                "x" => spawn.x = parse_int(value)?,
                "y" => spawn.y = parse_int(value)?,
                "direction" => spawn.direction = parse_direction(value)?,
                "colour" | "color" => spawn.colour = parse_int(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
    }
    Ok(())
}
