use super::*;

use henkan_core::segments::{Candidate, Segment, SegmentType};

/// Learn each (key, value) as a separate commit, one second apart, and save.
fn write_history(path: &Path, words: &[(&str, &str)]) {
    let predictor = UserHistoryPredictor::new(
        Arc::new(WordList::new()),
        Arc::new(SuppressionList::new()),
        Arc::new(FileStorage::new(path)),
    );
    predictor.wait();
    for (i, &(key, value)) in words.iter().enumerate() {
        let mut segments = Segments::new();
        let segment = segments.push_segment(Segment::new(key));
        segment.set_segment_type(SegmentType::FixedValue);
        segment.push_candidate(Candidate::new(key, value));
        predictor.finish_at(&ConversionRequest::new(), &mut segments, 1_700_000_000 + i as u64);
    }
    predictor.save().unwrap();
}

fn history_file(words: &[(&str, &str)]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");
    write_history(&path, words);
    (dir, path)
}

#[test]
fn test_read_entries_most_recent_first() {
    let (_dir, path) = history_file(&[("きょう", "今日"), ("あした", "明日")]);
    let entries = read_entries(&path).unwrap();
    let values: Vec<&str> = entries.iter().map(|e| e.value.as_str()).collect();
    assert_eq!(values, vec!["明日", "今日"]);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nothing.db");
    assert!(matches!(read_entries(&path), Err(CliError::Missing(_))));
    assert!(matches!(delete(&path, "a", "b"), Err(CliError::Missing(_))));
}

#[test]
fn test_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.db");
    std::fs::write(&path, b"not a history file").unwrap();
    assert!(matches!(
        read_entries(&path),
        Err(CliError::History(HistoryError::InvalidMagic))
    ));
}

#[test]
fn test_dump_text() {
    let (_dir, path) = history_file(&[("きょう", "今日")]);
    let mut out = Vec::new();
    assert_eq!(dump(&path, false, &mut out).unwrap(), 1);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("きょう\t今日\t"));
    assert!(text.contains("2023-11-14T22:13:20Z"));
}

#[test]
fn test_dump_json() {
    let (_dir, path) = history_file(&[("きょう", "今日"), ("あした", "明日")]);
    let mut out = Vec::new();
    dump(&path, true, &mut out).unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let list = parsed.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["value"], "明日");
    assert_eq!(list[0]["entry_type"], "Default");
    assert_eq!(list[1]["removed"], false);
}

#[test]
fn test_lookup_prefix() {
    let (_dir, path) = history_file(&[("きょう", "今日"), ("きょうと", "京都"), ("あした", "明日")]);
    let mut out = Vec::new();
    let found = lookup(&path, "きょ", 10, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(found, 2);
    assert!(text.contains("今日"));
    assert!(text.contains("京都"));
    assert!(!text.contains("明日"));
}

#[test]
fn test_lookup_nothing() {
    let (_dir, path) = history_file(&[("きょう", "今日")]);
    let mut out = Vec::new();
    assert_eq!(lookup(&path, "あ", 10, &mut out).unwrap(), 0);
    assert_eq!(String::from_utf8(out).unwrap(), "(no predictions)\n");
}

#[test]
fn test_delete_tombstones_entry() {
    let (_dir, path) = history_file(&[("きょう", "今日"), ("あした", "明日")]);
    delete(&path, "きょう", "今日").unwrap();

    let entries = read_entries(&path).unwrap();
    let today = entries.iter().find(|e| e.value == "今日").unwrap();
    assert!(today.removed);
    assert_eq!(stats(&path).unwrap().removed, 1);

    assert!(matches!(
        delete(&path, "きょう", "京"),
        Err(CliError::NotFound { .. })
    ));
}

#[test]
fn test_clear_all_leaves_event() {
    let (_dir, path) = history_file(&[("きょう", "今日"), ("あした", "明日")]);
    clear_all(&path).unwrap();
    let entries = read_entries(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entry_type, EntryType::CleanAllEvent);
}

#[test]
fn test_clear_unused() {
    let (_dir, path) = history_file(&[("きょう", "今日")]);
    clear_unused(&path).unwrap();
    let s = stats(&path).unwrap();
    assert_eq!(s.entries, 0);
    assert_eq!(s.events, 1);
}

#[test]
fn test_stats() {
    let (_dir, path) = history_file(&[("きょう", "今日"), ("あした", "明日"), ("きょう", "今日")]);
    let s = stats(&path).unwrap();
    assert_eq!(s.entries, 2);
    assert_eq!(s.events, 0);
    assert_eq!(s.conversion_freq, 3);
    assert_eq!(s.oldest, Some(1_700_000_001));
    assert_eq!(s.newest, Some(1_700_000_002));
    assert!(s.to_string().contains("entries:         2"));
}
