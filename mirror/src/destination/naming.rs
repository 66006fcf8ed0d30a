/// Longest identifier the destination engine accepts.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Separator between the destination table name and the sync id.
const SEPARATOR: char = '_';

/// Derives the staging table name for a sync.
///
/// The name is `destination_table_name + "_" + sync_id` with every
/// non-alphanumeric character of the sync id mapped to the separator,
/// truncated to [`MAX_IDENTIFIER_LEN`] and stripped of trailing separators so
/// the result stays a valid identifier for sync ids of arbitrary length and
/// content.
///
/// Two sync ids that only diverge past the truncation point produce the same
/// name; the pipeline's loud staging-table creation is the collision check
/// for that case.
pub fn staging_table_name(destination_table_name: &str, sync_id: &str) -> String {
    let sanitized: String = sync_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { SEPARATOR })
        .collect();

    let mut name = format!("{destination_table_name}{SEPARATOR}{sanitized}");
    if name.len() > MAX_IDENTIFIER_LEN {
        let mut cut = MAX_IDENTIFIER_LEN;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }

    let trimmed_len = name.trim_end_matches(SEPARATOR).len();
    name.truncate(trimmed_len);

    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_destination_name_and_sync_id() {
        assert_eq!(staging_table_name("events", "2024_07_01"), "events_2024_07_01");
    }

    #[test]
    fn sanitizes_separator_characters() {
        assert_eq!(
            staging_table_name("events", "2024-07-01T00:00"),
            "events_2024_07_01T00_00"
        );
        assert_eq!(staging_table_name("events", "a.b/c d"), "events_a_b_c_d");
    }

    #[test]
    fn truncates_to_identifier_limit_without_trailing_separator() {
        // A sync id built so the cut lands on a run of separators.
        let sync_id = format!("{}__________tail", "x".repeat(45));
        let name = staging_table_name("events", &sync_id);

        assert!(name.len() <= MAX_IDENTIFIER_LEN);
        assert!(!name.ends_with('_'));
    }

    #[test]
    fn arbitrary_content_stays_within_limit() {
        for sync_id in ["", "-", "🦀🦀🦀", &"长".repeat(200), &"a-".repeat(500)] {
            let name = staging_table_name("events", sync_id);
            assert!(name.len() <= MAX_IDENTIFIER_LEN, "sync_id {sync_id:?}");
            assert!(!name.ends_with('_'), "sync_id {sync_id:?}");
        }
    }

    #[test]
    fn distinct_sync_ids_yield_distinct_names() {
        let a = staging_table_name("events", "2024_07_01");
        let b = staging_table_name("events", "2024_07_02");
        assert_ne!(a, b);
    }
}
