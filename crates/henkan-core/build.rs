//! Checks the tables embedded with `include_str!`, so loading them at
//! runtime cannot fail.

use toml::{Table, Value};

const SETTINGS: &str = "src/default_settings.toml";
const KANA: &str = "src/romaji/default_kana.toml";

fn main() {
    println!("cargo:rerun-if-changed={SETTINGS}");
    println!("cargo:rerun-if-changed={KANA}");

    let settings = parse(SETTINGS, include_str!("src/default_settings.toml"));
    for section in ["history", "prediction", "converter"] {
        let Some(Value::Table(fields)) = settings.get(section) else {
            panic!("{SETTINGS}: missing [{section}]");
        };
        for (name, value) in fields {
            if !matches!(value, Value::Integer(n) if *n >= 0) {
                panic!("{SETTINGS}: {section}.{name} must be a non-negative integer");
            }
        }
    }

    let kana = parse(KANA, include_str!("src/romaji/default_kana.toml"));
    let Some(Value::Table(mappings)) = kana.get("mappings") else {
        panic!("{KANA}: missing [mappings]");
    };
    if mappings.is_empty() {
        panic!("{KANA}: [mappings] is empty");
    }
    for (kana, romaji) in mappings {
        match romaji.as_str() {
            Some(r) if !kana.is_empty() && !r.is_empty() && r.is_ascii() => {}
            _ => panic!("{KANA}: bad mapping for {kana:?}"),
        }
    }
}

fn parse(path: &str, content: &str) -> Table {
    content
        .parse::<Table>()
        .unwrap_or_else(|e| panic!("{path}: {e}"))
}
