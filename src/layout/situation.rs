//! Situation phase grammar (record types 89 to 91, terminated by 99).

use super::schema::{Phase, PhaseLayout, Predecessor, RecordRole, RecordSpec};

use Predecessor::{FileStart, Record};

pub static SITUATION: PhaseLayout = PhaseLayout {
    phase: Phase::Situation,
    records: &[
        RecordSpec {
            code: "89",
            description: "School and manager header",
            field_count: 6,
            role: RecordRole::Primary,
            predecessors: &[FileStart, Record("89"), Record("90"), Record("91")],
            class_field: None,
            // manager e-mail
            charset_exempt: &[5],
        },
        RecordSpec {
            code: "90",
            description: "Student situation",
            field_count: 8,
            role: RecordRole::Secondary,
            predecessors: &[Record("89"), Record("90")],
            class_field: Some(2),
            charset_exempt: &[],
        },
        RecordSpec {
            code: "91",
            description: "Student admitted after the census reference date",
            field_count: 11,
            role: RecordRole::Secondary,
            predecessors: &[Record("89"), Record("90"), Record("91")],
            class_field: Some(2),
            charset_exempt: &[],
        },
        RecordSpec {
            code: "99",
            description: "End of file",
            field_count: 1,
            role: RecordRole::Terminal,
            predecessors: &[],
            class_field: None,
            charset_exempt: &[],
        },
    ],
    key_field: 1,
    status_field: None,
    status_rules: &[],
    strict_charset: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_situation_roles() {
        assert_eq!(SITUATION.primary_code(), "89");
        assert_eq!(SITUATION.terminal_code(), "99");
        assert_eq!(SITUATION.role_of("91"), Some(RecordRole::Secondary));
        assert_eq!(SITUATION.role_of("00"), None);
    }

    #[test]
    fn test_secondary_records_follow_header_or_themselves() {
        let students = SITUATION.record("90").expect("record 90");
        assert!(students.allows_after(Some("89")));
        assert!(students.allows_after(Some("90")));
        assert!(!students.allows_after(Some("91")));
        assert!(!students.allows_after(None));
    }
}
