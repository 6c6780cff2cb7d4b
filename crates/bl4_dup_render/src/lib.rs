use std::fmt::Write as _;
use std::path::Path;

use bl4_dup_core::core_api::{AppliedEdits, ChallengeCounts, DuplicateReport, Snapshot};
use serde_json::{Map as JsonMap, Value as JsonValue};

const MISSING: &str = "-";
const TITLE_SCREEN_REMINDER: &str =
    "Don't forget to return to title screen, new saves don't load otherwise.";

pub fn render_summary_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    writeln!(&mut out, "Name:      {}", display_str(snapshot.char_name.as_deref()))
        .expect("writing to String cannot fail");
    writeln!(&mut out, "GUID:      {}", display_str(snapshot.char_guid.as_deref()))
        .expect("writing to String cannot fail");
    writeln!(&mut out, "Playtime:  {}", display_int(snapshot.total_playtime))
        .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "Challenges: {} base, {} UVH",
        snapshot.challenges.base, snapshot.challenges.uvh
    )
    .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "UVH level: {} (highest unlocked {})",
        display_int(snapshot.vault_hunter_level),
        display_int(snapshot.highest_unlocked_vault_hunter_level)
    )
    .expect("writing to String cannot fail");
    out
}

pub fn render_summary_json(snapshot: &Snapshot) -> JsonValue {
    JsonValue::Object(snapshot_json(snapshot))
}

/// One line per field touched by a duplicate, ending with the write
/// confirmation and the title screen reminder.
pub fn render_report_lines(report: &DuplicateReport) -> Vec<String> {
    let before = &report.before;
    let after = &report.after;
    let applied = &report.applied;
    let mut lines = vec!["Updated character:".to_string()];

    lines.push(change_line(
        "GUID",
        applied.guid_randomized,
        display_str(before.char_guid.as_deref()),
        display_str(after.char_guid.as_deref()),
    ));
    lines.push(change_line(
        "Name",
        applied.name_changed,
        display_str(before.char_name.as_deref()),
        display_str(after.char_name.as_deref()),
    ));
    lines.push(change_line(
        "Playtime",
        applied.playtime_reset,
        display_int(before.total_playtime),
        display_int(after.total_playtime),
    ));
    lines.push(reset_line("Challenges", applied.challenges_removed));
    lines.push(reset_line("UVH Challenges", applied.uvh_challenges_removed));

    lines.push(format!(
        "Successfully wrote {}",
        file_name(&report.destination)
    ));
    lines.push(TITLE_SCREEN_REMINDER.to_string());
    lines
}

pub fn render_report_json(report: &DuplicateReport) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "destination".to_string(),
        JsonValue::String(report.destination.display().to_string()),
    );
    out.insert(
        "before".to_string(),
        JsonValue::Object(snapshot_json(&report.before)),
    );
    out.insert(
        "after".to_string(),
        JsonValue::Object(snapshot_json(&report.after)),
    );
    out.insert("applied".to_string(), applied_json(&report.applied));
    JsonValue::Object(out)
}

fn snapshot_json(snapshot: &Snapshot) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();
    out.insert(
        "char_name".to_string(),
        JsonValue::from(snapshot.char_name.clone()),
    );
    out.insert(
        "char_guid".to_string(),
        JsonValue::from(snapshot.char_guid.clone()),
    );
    out.insert(
        "total_playtime".to_string(),
        JsonValue::from(snapshot.total_playtime),
    );
    out.insert(
        "challenges".to_string(),
        challenges_json(&snapshot.challenges),
    );
    out.insert(
        "highest_unlocked_vault_hunter_level".to_string(),
        JsonValue::from(snapshot.highest_unlocked_vault_hunter_level),
    );
    out.insert(
        "vault_hunter_level".to_string(),
        JsonValue::from(snapshot.vault_hunter_level),
    );
    out
}

fn challenges_json(counts: &ChallengeCounts) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("base".to_string(), JsonValue::from(counts.base));
    m.insert("uvh".to_string(), JsonValue::from(counts.uvh));
    JsonValue::Object(m)
}

fn applied_json(applied: &AppliedEdits) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert(
        "guid_randomized".to_string(),
        JsonValue::Bool(applied.guid_randomized),
    );
    m.insert(
        "name_changed".to_string(),
        JsonValue::Bool(applied.name_changed),
    );
    m.insert(
        "playtime_reset".to_string(),
        JsonValue::Bool(applied.playtime_reset),
    );
    m.insert(
        "challenges_removed".to_string(),
        JsonValue::from(applied.challenges_removed),
    );
    m.insert(
        "uvh_challenges_removed".to_string(),
        JsonValue::from(applied.uvh_challenges_removed),
    );
    JsonValue::Object(m)
}

fn change_line(label: &str, changed: bool, before: String, after: String) -> String {
    if changed {
        format!("  {label}: {before} → {after}")
    } else {
        format!("  {label}: Unchanged ({before})")
    }
}

fn reset_line(label: &str, removed: Option<usize>) -> String {
    match removed {
        Some(_) => format!("  {label}: Reset"),
        None => format!("  {label}: Unchanged"),
    }
}

fn display_str(value: Option<&str>) -> String {
    value.unwrap_or(MISSING).to_string()
}

fn display_int(value: Option<i64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
