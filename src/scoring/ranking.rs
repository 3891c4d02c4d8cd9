// src/scoring/ranking.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::models::quiz::Question;
use crate::scoring::grouping::SubmissionGroup;
use crate::scoring::matcher;

/// One leaderboard row. Derived on every query, never persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// 1-based position in the ranking.
    pub rank: usize,
    /// Submitter identity token.
    pub name: String,
    pub total_correct_answers: usize,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Ranks grouped submissions for one quiz.
///
/// Order: total correct descending, then earlier `latest_submitted_at`
/// first, then identity token ascending so the order stays total even if
/// two submissions land on the same timestamp. An answer whose question id
/// is unknown is skipped for that answer only; ungraded answers count as
/// not-correct here.
pub fn rank(
    groups: HashMap<String, SubmissionGroup>,
    questions_by_id: &HashMap<uuid::Uuid, Question>,
) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = groups
        .into_iter()
        .map(|(name, group)| {
            let total_correct_answers = group
                .answers
                .iter()
                .filter_map(|row| questions_by_id.get(&row.question_id).map(|q| (q, row)))
                .filter(|(question, row)| {
                    matcher::grade(question, &row.as_submitted()).is_correct()
                })
                .count();

            LeaderboardEntry {
                rank: 0,
                name,
                total_correct_answers,
                submitted_at: group.latest_submitted_at,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.total_correct_answers
            .cmp(&a.total_correct_answers)
            .then(a.submitted_at.cmp(&b.submitted_at))
            .then(a.name.cmp(&b.name))
    });

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{QuestionKind, QuestionOption};
    use crate::models::response::ResponseRow;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    struct Fixture {
        questions: HashMap<Uuid, Question>,
        q_id: Uuid,
        right: Uuid,
        wrong: Uuid,
    }

    fn fixture() -> Fixture {
        let q_id = Uuid::new_v4();
        let right = Uuid::new_v4();
        let wrong = Uuid::new_v4();
        let question = Question {
            id: q_id,
            kind: QuestionKind::SingleChoice,
            question_text: "pick".to_string(),
            correct_answer: None,
            options: vec![
                QuestionOption {
                    id: right,
                    question_id: q_id,
                    option_text: "right".to_string(),
                    is_correct: true,
                },
                QuestionOption {
                    id: wrong,
                    question_id: q_id,
                    option_text: "wrong".to_string(),
                    is_correct: false,
                },
            ],
        };
        let mut questions = HashMap::new();
        questions.insert(q_id, question);
        Fixture {
            questions,
            q_id,
            right,
            wrong,
        }
    }

    fn row(name: &str, question_id: Uuid, option: Uuid, secs: i64) -> ResponseRow {
        ResponseRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            quiz_id: Uuid::new_v4(),
            question_id,
            answer: Some(option),
            text_answer: None,
            submitted_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    fn grouped(rows: Vec<ResponseRow>) -> HashMap<String, SubmissionGroup> {
        crate::scoring::grouping::group_by_identity(rows)
    }

    #[test]
    fn orders_by_score_then_earlier_timestamp() {
        let f = fixture();
        // X and Y both score 1, X finished at t=10, Y at t=5; Z scores 0.
        let rows = vec![
            row("X", f.q_id, f.right, 10),
            row("Y", f.q_id, f.right, 5),
            row("Z", f.q_id, f.wrong, 1),
        ];

        let entries = rank(grouped(rows), &f.questions);

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Y", "X", "Z"]);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[2].rank, 3);
    }

    #[test]
    fn equal_score_and_timestamp_falls_back_to_token_order() {
        let f = fixture();
        let rows = vec![
            row("b:2", f.q_id, f.right, 7),
            row("a:1", f.q_id, f.right, 7),
        ];

        let entries = rank(grouped(rows), &f.questions);

        assert_eq!(entries[0].name, "a:1");
        assert_eq!(entries[1].name, "b:2");
    }

    #[test]
    fn dangling_question_reference_is_skipped_not_fatal() {
        let f = fixture();
        let rows = vec![
            row("X", Uuid::new_v4(), f.right, 3),
            row("X", f.q_id, f.right, 4),
        ];

        let entries = rank(grouped(rows), &f.questions);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].total_correct_answers, 1);
    }

    #[test]
    fn ungraded_answers_do_not_count_as_correct() {
        let f = fixture();
        let ungraded_q = Uuid::new_v4();
        let mut questions = f.questions;
        questions.insert(
            ungraded_q,
            Question {
                id: ungraded_q,
                kind: QuestionKind::ShortText,
                question_text: "opinion".to_string(),
                correct_answer: None,
                options: vec![],
            },
        );
        let mut text_row = row("X", ungraded_q, f.right, 2);
        text_row.answer = None;
        text_row.text_answer = Some("free form".to_string());

        let entries = rank(grouped(vec![text_row]), &questions);

        assert_eq!(entries[0].total_correct_answers, 0);
    }

    #[test]
    fn ranking_is_reproducible() {
        let f = fixture();
        let make_rows = || {
            vec![
                row("Sam:111", f.q_id, f.right, 3),
                row("Sam:222", f.q_id, f.wrong, 9),
                row("Kim:333", f.q_id, f.right, 1),
            ]
        };

        let first = rank(grouped(make_rows()), &f.questions);
        let second = rank(grouped(make_rows()), &f.questions);

        let order = |entries: &[LeaderboardEntry]| {
            entries
                .iter()
                .map(|e| (e.rank, e.name.clone(), e.total_correct_answers))
                .collect::<Vec<_>>()
        };
        assert_eq!(order(&first), order(&second));
    }
}
