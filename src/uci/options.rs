//! UCI option table: printing `option name ...` lines on `uci` and parsing
//! `setoption name ... value ...` commands into a (name, value) pair for
//! `Engine::apply_setoption`.

use crate::engine::Engine;
use crate::search::params::SearchParams;

fn print_spin(name: &str, default: impl std::fmt::Display, min: impl std::fmt::Display, max: impl std::fmt::Display) {
    println!("option name {name} type spin default {default} min {min} max {max}");
}

fn print_check(name: &str, default: bool) {
    println!("option name {name} type check default {}", if default { "true" } else { "false" });
}

fn print_button(name: &str) {
    println!("option name {name} type button");
}

/// Print every `option` line this engine supports: the engine-level knobs
/// (`Hash`/`Threads`/`Move Overhead`/`Ponder`/`UCI_Chess960`/`Clear Hash`)
/// followed by every SPSA-tunable search parameter as a spin option with
/// a wide `[-1_000_000, 1_000_000]` range (the original's per-constant
/// min/max bounds aren't part of this spec; the range here only needs to
/// admit any value a tuner or a `setoption` caller might send).
pub fn print_options(engine: &Engine) {
    println!("id name vireo");
    println!("id author the vireo contributors");

    print_spin("Hash", engine.options.hash_mb, 1, 33_554_432);
    print_spin("Threads", engine.options.threads, 1, 256);
    print_spin("Move Overhead", engine.options.move_overhead_ms, 0, 10_000);
    print_check("Ponder", engine.options.ponder);
    print_check("UCI_Chess960", engine.options.chess960);
    print_button("Clear Hash");

    for name in SearchParams::TUNABLE_NAMES {
        print_spin(name, 0, -1_000_000, 1_000_000);
    }

    println!("uciok");
}

/// Parse a `setoption name <NAME...> value <VALUE...>` command line into
/// `(name, value)`. `name` may itself contain spaces ("Move Overhead",
/// "Clear Hash"), which is why this walks token-by-token rather than
/// splitting once on "value".
#[must_use]
pub fn parse_setoption(parts: &[&str]) -> Option<(String, Option<String>)> {
    if parts.is_empty() || parts[0] != "setoption" {
        return None;
    }

    let mut name_parts: Vec<&str> = Vec::new();
    let mut value_parts: Vec<&str> = Vec::new();
    let mut mode = "";

    for part in &parts[1..] {
        match *part {
            "name" => mode = "name",
            "value" => mode = "value",
            _ => match mode {
                "name" => name_parts.push(part),
                "value" => value_parts.push(part),
                _ => {}
            },
        }
    }

    if name_parts.is_empty() {
        return None;
    }

    let name = name_parts.join(" ");
    let value = if value_parts.is_empty() { None } else { Some(value_parts.join(" ")) };
    Some((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_spin_option() {
        let parts: Vec<&str> = "setoption name Hash value 256".split_whitespace().collect();
        let (name, value) = parse_setoption(&parts).unwrap();
        assert_eq!(name, "Hash");
        assert_eq!(value.as_deref(), Some("256"));
    }

    #[test]
    fn parses_a_multi_word_option_name() {
        let parts: Vec<&str> = "setoption name Move Overhead value 50".split_whitespace().collect();
        let (name, value) = parse_setoption(&parts).unwrap();
        assert_eq!(name, "Move Overhead");
        assert_eq!(value.as_deref(), Some("50"));
    }

    #[test]
    fn parses_a_button_option_with_no_value() {
        let parts: Vec<&str> = "setoption name Clear Hash".split_whitespace().collect();
        let (name, value) = parse_setoption(&parts).unwrap();
        assert_eq!(name, "Clear Hash");
        assert_eq!(value, None);
    }

    #[test]
    fn rejects_non_setoption_lines() {
        let parts: Vec<&str> = "go depth 5".split_whitespace().collect();
        assert!(parse_setoption(&parts).is_none());
    }
}
