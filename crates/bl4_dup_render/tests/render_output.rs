use std::path::PathBuf;

use bl4_dup_core::core_api::{
    AppliedEdits, ChallengeCounts, DuplicateReport, SaveDocument, Snapshot,
};
use bl4_dup_render::{
    render_report_json, render_report_lines, render_summary_json, render_summary_text,
};

const SAMPLE: &str = "\
state:
  char_name: Vex
  char_guid: 0123456789ABCDEF0123456789ABCDEF
  total_playtime: 123456
stats:
  challenge:
    uvh_1: 1
    boss_a: 2
    uvh_2: 3
globals:
  highest_unlocked_vault_hunter_level: 3
  vault_hunter_level: 2
";

fn sample_snapshot() -> Snapshot {
    SaveDocument::parse(SAMPLE.as_bytes(), "76561198000000000")
        .expect("sample should parse")
        .snapshot()
        .expect("sample snapshot")
}

fn report(applied: AppliedEdits, after: Snapshot) -> DuplicateReport {
    DuplicateReport {
        destination: PathBuf::from("/saves/SaveGames/1/Profiles/client/7.sav"),
        before: sample_snapshot(),
        after,
        applied,
    }
}

#[test]
fn summary_text_lists_each_field() {
    let text = render_summary_text(&sample_snapshot());
    assert!(text.contains("Vex"), "{text}");
    assert!(text.contains("0123456789ABCDEF0123456789ABCDEF"), "{text}");
    assert!(text.contains("123456"), "{text}");
    assert!(text.contains("1 base, 2 UVH"), "{text}");
    assert!(text.contains("UVH level: 2 (highest unlocked 3)"), "{text}");
}

#[test]
fn summary_text_marks_missing_fields() {
    let text = render_summary_text(&Snapshot::default());
    assert!(text.starts_with("Name:      -\n"), "{text}");
}

#[test]
fn summary_json_uses_stable_key_order() {
    let value = render_summary_json(&sample_snapshot());
    let keys: Vec<&str> = value
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        keys,
        vec![
            "char_name",
            "char_guid",
            "total_playtime",
            "challenges",
            "highest_unlocked_vault_hunter_level",
            "vault_hunter_level",
        ]
    );
    assert_eq!(value["challenges"]["base"], 1);
    assert_eq!(value["challenges"]["uvh"], 2);
}

#[test]
fn report_lines_describe_changes() {
    let mut after = sample_snapshot();
    after.char_guid = Some("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF".to_string());
    after.char_name = Some("Copy".to_string());
    after.total_playtime = Some(0);
    after.challenges = ChallengeCounts::default();

    let lines = render_report_lines(&report(
        AppliedEdits {
            guid_randomized: true,
            name_changed: true,
            playtime_reset: true,
            challenges_removed: Some(1),
            uvh_challenges_removed: Some(2),
        },
        after,
    ));

    assert_eq!(
        lines,
        vec![
            "Updated character:",
            "  GUID: 0123456789ABCDEF0123456789ABCDEF → FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
            "  Name: Vex → Copy",
            "  Playtime: 123456 → 0",
            "  Challenges: Reset",
            "  UVH Challenges: Reset",
            "Successfully wrote 7.sav",
            "Don't forget to return to title screen, new saves don't load otherwise.",
        ]
    );
}

#[test]
fn report_lines_mark_untouched_fields() {
    let lines = render_report_lines(&report(AppliedEdits::default(), sample_snapshot()));
    assert_eq!(lines[1], "  GUID: Unchanged (0123456789ABCDEF0123456789ABCDEF)");
    assert_eq!(lines[2], "  Name: Unchanged (Vex)");
    assert_eq!(lines[3], "  Playtime: Unchanged (123456)");
    assert_eq!(lines[4], "  Challenges: Unchanged");
    assert_eq!(lines[5], "  UVH Challenges: Unchanged");
}

#[test]
fn report_json_nests_snapshots() {
    let value = render_report_json(&report(
        AppliedEdits {
            challenges_removed: Some(0),
            ..AppliedEdits::default()
        },
        sample_snapshot(),
    ));
    let keys: Vec<&str> = value
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["destination", "before", "after", "applied"]);
    assert_eq!(value["before"]["char_name"], "Vex");
    assert_eq!(value["applied"]["challenges_removed"], 0);
    assert!(value["applied"]["uvh_challenges_removed"].is_null());
}
