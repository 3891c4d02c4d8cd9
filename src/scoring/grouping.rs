// src/scoring/grouping.rs

use std::collections::HashMap;

use crate::models::response::ResponseRow;

/// All answers one submitter identity gave to a quiz, plus the most
/// recent submission timestamp across them.
#[derive(Debug, Clone)]
pub struct SubmissionGroup {
    pub answers: Vec<ResponseRow>,
    pub latest_submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Buckets a flat list of response rows by identity token.
///
/// The token is compared byte-for-byte; "Alice:abc" and "alice:abc" are
/// two different submitters. Output order is unspecified, the ranker
/// imposes it.
pub fn group_by_identity(rows: Vec<ResponseRow>) -> HashMap<String, SubmissionGroup> {
    let mut groups: HashMap<String, SubmissionGroup> = HashMap::new();

    for row in rows {
        let group = groups
            .entry(row.name.clone())
            .or_insert_with(|| SubmissionGroup {
                answers: Vec::new(),
                latest_submitted_at: row.submitted_at,
            });
        if row.submitted_at > group.latest_submitted_at {
            group.latest_submitted_at = row.submitted_at;
        }
        group.answers.push(row);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn row(name: &str, secs: i64) -> ResponseRow {
        ResponseRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            quiz_id: Uuid::new_v4(),
            question_id: Uuid::new_v4(),
            answer: None,
            text_answer: Some("x".to_string()),
            submitted_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn groups_rows_by_exact_token() {
        let rows = vec![row("Alice:abc", 1), row("Bob:xyz", 2), row("Alice:abc", 3)];

        let groups = group_by_identity(rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["Alice:abc"].answers.len(), 2);
        assert_eq!(groups["Bob:xyz"].answers.len(), 1);
    }

    #[test]
    fn grouping_is_case_sensitive() {
        let groups = group_by_identity(vec![row("sam:1", 1), row("Sam:1", 1)]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn latest_timestamp_is_the_maximum() {
        let rows = vec![row("a:1", 10), row("a:1", 30), row("a:1", 20)];

        let groups = group_by_identity(rows);

        assert_eq!(
            groups["a:1"].latest_submitted_at,
            Utc.timestamp_opt(30, 0).unwrap()
        );
    }

    #[test]
    fn no_rows_means_no_groups() {
        assert!(group_by_identity(Vec::new()).is_empty());
    }
}
