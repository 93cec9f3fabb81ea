use crate::models::{Assignment, RubricPresence, RubricSummaryLine};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Ordering bucket of an assignment; lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssignmentKind {
    Forum = 1,
    Group = 2,
    Quiz = 3,
    Other = 4,
}

impl AssignmentKind {
    /// First matching rule wins: forum, then group, then quiz.
    pub fn of(assignment: &Assignment) -> Self {
        if assignment.discussion_topic.is_some() {
            AssignmentKind::Forum
        } else if assignment.group_category_id.is_some() {
            AssignmentKind::Group
        } else if assignment.is_quiz() {
            AssignmentKind::Quiz
        } else {
            AssignmentKind::Other
        }
    }
}

pub fn priority(assignment: &Assignment) -> u8 {
    AssignmentKind::of(assignment) as u8
}

/// Sortable due date. Missing or unparsable dates map to `NaiveDateTime::MAX`.
pub fn due_key(assignment: &Assignment) -> NaiveDateTime {
    parse_due_date(assignment.due_at.as_deref())
}

pub fn parse_due_date(due_at: Option<&str>) -> NaiveDateTime {
    let raw = match due_at.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return NaiveDateTime::MAX,
    };

    // A trailing "Z" is dropped, not converted: the wall-clock value is kept.
    let raw = raw.strip_suffix('Z').unwrap_or(raw);

    if let Ok(dt) = raw.parse::<NaiveDateTime>() {
        return dt;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return dt;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_local();
    }
    if let Ok(date) = raw.parse::<NaiveDate>() {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return dt;
        }
    }

    tracing::debug!(due_at = raw, "Unparsable due date, sorting last");
    NaiveDateTime::MAX
}

/// Stable sort by (priority, due date); ties keep API order.
pub fn sort_assignments(assignments: &[Assignment]) -> Vec<Assignment> {
    let mut sorted = assignments.to_vec();
    sorted.sort_by_key(|a| (priority(a), due_key(a)));
    sorted
}

/// A course is "massive" when any assignment is a quiz. Display only.
pub fn is_massive(assignments: &[Assignment]) -> bool {
    assignments.iter().any(Assignment::is_quiz)
}

pub fn rubric_summary(assignments: &[Assignment]) -> Vec<RubricSummaryLine> {
    assignments
        .iter()
        .map(|a| RubricSummaryLine {
            assignment: a.display_name().to_string(),
            presence: if a.is_quiz() {
                RubricPresence::Massive
            } else if a.has_rubric() {
                RubricPresence::Present
            } else {
                RubricPresence::Missing
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assignment(value: serde_json::Value) -> Assignment {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_forum_wins_over_everything() {
        let a = assignment(json!({
            "id": 1,
            "name": "Foro 1",
            "discussion_topic": { "id": 10 },
            "group_category_id": 5,
            "submission_types": ["online_quiz"]
        }));
        assert_eq!(priority(&a), 1);
    }

    #[test]
    fn test_group_then_quiz_then_other() {
        let group = assignment(json!({
            "id": 2,
            "group_category_id": 5,
            "submission_types": ["online_quiz"]
        }));
        assert_eq!(priority(&group), 2);

        let quiz = assignment(json!({
            "id": 3,
            "submission_types": ["online_upload", "online_quiz"]
        }));
        assert_eq!(priority(&quiz), 3);

        let other = assignment(json!({ "id": 4, "submission_types": ["online_upload"] }));
        assert_eq!(priority(&other), 4);

        let untyped = assignment(json!({ "id": 5, "submission_types": [] }));
        assert_eq!(AssignmentKind::of(&untyped), AssignmentKind::Other);
    }

    #[test]
    fn test_due_key_sentinels() {
        assert_eq!(parse_due_date(None), NaiveDateTime::MAX);
        assert_eq!(parse_due_date(Some("")), NaiveDateTime::MAX);
        assert_eq!(parse_due_date(Some("next tuesday")), NaiveDateTime::MAX);
    }

    #[test]
    fn test_due_key_strips_z_without_conversion() {
        let zulu = parse_due_date(Some("2024-05-01T23:59:00Z"));
        let naive = parse_due_date(Some("2024-05-01T23:59:00"));
        assert_eq!(zulu, naive);
        assert_eq!(zulu.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-05-01 23:59:00");
    }

    #[test]
    fn test_due_key_other_iso_forms() {
        let offset = parse_due_date(Some("2024-05-01T23:59:00-04:00"));
        assert_eq!(offset, parse_due_date(Some("2024-05-01T23:59:00")));

        let date_only = parse_due_date(Some("2024-05-01"));
        assert_eq!(date_only.format("%H:%M").to_string(), "00:00");

        let fractional = parse_due_date(Some("2024-05-01T23:59:00.500Z"));
        assert!(fractional > naive_at("2024-05-01T23:59:00"));
    }

    fn naive_at(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    #[test]
    fn test_sort_is_stable_within_bucket() {
        let assignments = vec![
            assignment(json!({ "id": 1, "name": "Tarea B", "submission_types": ["online_upload"] })),
            assignment(json!({ "id": 2, "name": "Quiz", "due_at": "2024-01-01T00:00:00Z", "submission_types": ["online_quiz"] })),
            assignment(json!({ "id": 3, "name": "Tarea A", "submission_types": ["online_upload"] })),
            assignment(json!({ "id": 4, "name": "Tarea C", "due_at": "2024-03-01T00:00:00Z", "submission_types": ["online_upload"] })),
            assignment(json!({ "id": 5, "name": "Foro", "discussion_topic": {}, "due_at": "2025-01-01T00:00:00Z" })),
            assignment(json!({ "id": 6, "name": "Tarea D", "due_at": "", "submission_types": ["online_upload"] })),
        ];

        let ids: Vec<u64> = sort_assignments(&assignments).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![5, 2, 4, 1, 3, 6]);
    }

    #[test]
    fn test_massive_and_rubric_summary() {
        let assignments = vec![
            assignment(json!({ "id": 1, "name": "Quiz 1", "submission_types": ["online_quiz"] })),
            assignment(json!({ "id": 2, "name": "Informe", "submission_types": ["online_upload"], "rubric": [{ "id": "c1" }] })),
            assignment(json!({ "id": 3, "name": "Ensayo", "submission_types": ["online_text_entry"] })),
        ];
        assert!(is_massive(&assignments));
        assert!(!is_massive(&assignments[1..]));

        let summary = rubric_summary(&assignments);
        let presence: Vec<RubricPresence> = summary.iter().map(|l| l.presence).collect();
        assert_eq!(
            presence,
            vec![RubricPresence::Massive, RubricPresence::Present, RubricPresence::Missing]
        );
        assert_eq!(summary[1].assignment, "Informe");
    }
}
