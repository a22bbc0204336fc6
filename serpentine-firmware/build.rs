//! Build script for serpentine-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates game.toml and client.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Config files embedded by the two board builds
const CONFIGS: [&str; 2] = ["game.toml", "client.toml"];

/// Snakes a match holds, one per board
const MAX_SNAKES: usize = 2;

/// Snake ids used when no [snake.N] section is given
const DEFAULT_SNAKES: [i64; 2] = [0, 1];

fn main() {
    setup_linker();

    let host = validate_config(CONFIGS[0]);
    let client = validate_config(CONFIGS[1]);
    validate_pair(&host, &client);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse one config file, panicking with a readable report on any problem
fn validate_config(name: &str) -> toml::Value {
    println!("cargo:rerun-if-changed={}", name);

    let path = Path::new(name);
    if !path.exists() {
        fail(name, &[format!("{} not found in the serpentine-firmware directory", name)]);
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => fail(name, &[format!("failed to read: {}", e)]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            name,
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_game(&config, &mut errors);
    validate_link(&config, &mut errors);
    validate_snakes(&config, &mut errors);

    if !errors.is_empty() {
        fail(name, &errors);
    }

    println!("cargo:warning={} validated successfully", name);
    config
}

/// Print errors in a box and stop the build
fn fail(name: &str, errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: Invalid {:<49}║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        name,
        errors
            .iter()
            .map(|e| {
                let e = if e.len() > 62 {
                    format!("{}...", &e[..59])
                } else {
                    e.clone()
                };
                format!("║  • {:<62} ║", e)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn int_in(
    table: &toml::Table,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) -> Option<i64> {
    match table.get(key) {
        None => None,
        Some(toml::Value::Integer(v)) if range.contains(v) => Some(*v),
        Some(toml::Value::Integer(_)) => {
            errors.push(format!(
                "[{}] {} must be {}-{}",
                section,
                key,
                range.start(),
                range.end()
            ));
            None
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
    }
}

fn string_in(
    table: &toml::Table,
    section: &str,
    key: &str,
    allowed: &[&str],
    errors: &mut Vec<String>,
) {
    match table.get(key) {
        None => {}
        Some(toml::Value::String(s)) if allowed.contains(&s.as_str()) => {}
        Some(_) => errors.push(format!(
            "[{}] {} must be one of {}",
            section,
            key,
            allowed.join(", ")
        )),
    }
}

fn check_keys(table: &toml::Table, section: &str, known: &[&str], errors: &mut Vec<String>) {
    for key in table.keys() {
        if !known.contains(&key.as_str()) {
            errors.push(format!("[{}] unknown key '{}'", section, key));
        }
    }
}

fn validate_game(config: &toml::Value, errors: &mut Vec<String>) {
    let game = match config.get("game") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[game] must be a table".to_string());
            return;
        }
        None => return,
    };

    check_keys(
        game,
        "game",
        &[
            "width",
            "height",
            "fps",
            "frame_interval_ms",
            "boundary",
            "starting_length",
            "joystick_threshold",
            "background",
            "local_snake",
        ],
        errors,
    );
    int_in(game, "game", "width", 1..=255, errors);
    int_in(game, "game", "height", 1..=255, errors);
    int_in(game, "game", "fps", 1..=1000, errors);
    int_in(game, "game", "frame_interval_ms", 1..=60_000, errors);
    int_in(game, "game", "starting_length", 1..=u16::MAX as i64, errors);
    int_in(game, "game", "joystick_threshold", 0..=4095, errors);
    int_in(game, "game", "background", 0..=0xFFFF, errors);
    int_in(game, "game", "local_snake", 0..=9, errors);
    string_in(game, "game", "boundary", &["kill", "Kill", "wrap", "Wrap"], errors);
}

fn validate_link(config: &toml::Value, errors: &mut Vec<String>) {
    let link = match config.get("link") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[link] must be a table".to_string());
            return;
        }
        None => {
            errors.push("Missing [link] section - the board needs a role".to_string());
            return;
        }
    };

    check_keys(link, "link", &["role", "baud", "handshake_timeout_ms"], errors);
    if link.get("role").is_none() {
        errors.push("[link] missing 'role'".to_string());
    }
    string_in(link, "link", "role", &["host", "Host", "client", "Client"], errors);
    int_in(link, "link", "baud", 1..=4_000_000, errors);
    int_in(link, "link", "handshake_timeout_ms", 1..=60_000, errors);
}

fn validate_snakes(config: &toml::Value, errors: &mut Vec<String>) {
    let game = config.get("game").and_then(|g| g.as_table());
    let width = game
        .and_then(|g| g.get("width"))
        .and_then(|v| v.as_integer())
        .unwrap_or(128);
    let height = game
        .and_then(|g| g.get("height"))
        .and_then(|v| v.as_integer())
        .unwrap_or(160);
    let local = game
        .and_then(|g| g.get("local_snake"))
        .and_then(|v| v.as_integer())
        .unwrap_or(0);

    let snakes = match config.get("snake") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[snake.N] sections must be tables".to_string());
            return;
        }
        // Built-in spawns apply
        None => return,
    };

    if snakes.len() > MAX_SNAKES {
        errors.push(format!("at most {} [snake.N] sections", MAX_SNAKES));
    }

    let mut ids = Vec::new();
    for (id, snake) in snakes {
        let section = format!("snake.{}", id);
        match id.parse::<u8>() {
            Ok(n) if n <= 9 => ids.push(i64::from(n)),
            _ => errors.push(format!("[{}] id must be a digit 0-9", section)),
        }

        let snake = match snake {
            toml::Value::Table(t) => t,
            _ => {
                errors.push(format!("[{}] must be a table", section));
                continue;
            }
        };

        check_keys(snake, &section, &["x", "y", "direction", "colour", "color"], errors);
        int_in(snake, &section, "x", 0..=width - 1, errors);
        int_in(snake, &section, "y", 0..=height - 1, errors);
        int_in(snake, &section, "colour", 0..=0xFFFF, errors);
        int_in(snake, &section, "color", 0..=0xFFFF, errors);
        string_in(
            snake,
            &section,
            "direction",
            &["up", "Up", "U", "right", "Right", "R", "down", "Down", "D", "left", "Left", "L"],
            errors,
        );
    }

    if !ids.contains(&local) {
        errors.push(format!("local_snake {} has no [snake.{}] section", local, local));
    }
}

/// Both boards must simulate the same match
fn validate_pair(host: &toml::Value, client: &toml::Value) {
    let mut errors = Vec::new();

    let role = |v: &toml::Value| {
        v.get("link")
            .and_then(|l| l.get("role"))
            .and_then(|r| r.as_str())
            .map(str::to_ascii_lowercase)
    };
    if role(host) == role(client) {
        errors.push("game.toml and client.toml must have different roles".to_string());
    }

    let local = |v: &toml::Value| {
        v.get("game")
            .and_then(|g| g.get("local_snake"))
            .and_then(|l| l.as_integer())
            .unwrap_or(0)
    };
    if local(host) == local(client) {
        errors.push("both boards drive the same local_snake".to_string());
    }

    if host.get("snake") != client.get("snake") {
        errors.push("[snake.N] sections differ between the boards".to_string());
    }

    // Only the driving board collision-tests a snake
    let ids: Vec<i64> = match host.get("snake").and_then(|s| s.as_table()) {
        Some(snakes) => snakes.keys().filter_map(|k| k.parse().ok()).collect(),
        None => DEFAULT_SNAKES.to_vec(),
    };
    for id in ids {
        if id != local(host) && id != local(client) {
            errors.push(format!("[snake.{}] is driven by neither board", id));
        }
    }

    let shared = |v: &toml::Value| {
        let mut game = v
            .get("game")
            .and_then(|g| g.as_table())
            .cloned()
            .unwrap_or_default();
        game.remove("local_snake");
        game
    };
    if shared(host) != shared(client) {
        errors.push("[game] differs between the boards beyond local_snake".to_string());
    }

    if !errors.is_empty() {
        fail("board pair", &errors);
    }
}
