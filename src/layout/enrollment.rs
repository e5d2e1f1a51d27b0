//! Enrollment phase grammar (record types 00 to 60, terminated by 99).

use super::schema::{Phase, PhaseLayout, Predecessor, RecordRole, RecordSpec, StatusRule};

use Predecessor::{FileStart, Record};

pub static ENROLLMENT: PhaseLayout = PhaseLayout {
    phase: Phase::Enrollment,
    records: &[
        RecordSpec {
            code: "00",
            description: "School identification",
            field_count: 56,
            role: RecordRole::Primary,
            predecessors: &[
                FileStart,
                Record("00"),
                Record("10"),
                Record("20"),
                Record("30"),
                Record("40"),
                Record("50"),
                Record("60"),
            ],
            class_field: None,
            charset_exempt: &[],
        },
        RecordSpec {
            code: "10",
            description: "School characterization and infrastructure",
            field_count: 187,
            role: RecordRole::Presence,
            predecessors: &[Record("00")],
            class_field: None,
            charset_exempt: &[],
        },
        RecordSpec {
            code: "20",
            description: "Class",
            field_count: 70,
            role: RecordRole::Class,
            predecessors: &[Record("10"), Record("20")],
            class_field: Some(2),
            charset_exempt: &[],
        },
        RecordSpec {
            code: "30",
            description: "Person (student, teacher or manager)",
            field_count: 108,
            role: RecordRole::Presence,
            predecessors: &[Record("00"), Record("10"), Record("20"), Record("30")],
            class_field: None,
            charset_exempt: &[],
        },
        RecordSpec {
            code: "40",
            description: "School manager",
            field_count: 7,
            role: RecordRole::Manager,
            predecessors: &[Record("30"), Record("40")],
            class_field: None,
            charset_exempt: &[],
        },
        RecordSpec {
            code: "50",
            description: "School professional linked to a class",
            field_count: 38,
            role: RecordRole::StaffLink,
            predecessors: &[Record("40"), Record("50")],
            class_field: Some(4),
            charset_exempt: &[],
        },
        RecordSpec {
            code: "60",
            description: "Student enrollment in a class",
            field_count: 33,
            role: RecordRole::PersonLink,
            predecessors: &[Record("50"), Record("60")],
            class_field: Some(4),
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
    status_field: Some(2),
    status_rules: &[
        StatusRule {
            status: "1",
            label: "active",
            required: &["10", "20", "30", "40"],
            forbidden: &[],
        },
        StatusRule {
            status: "2",
            label: "suspended",
            required: &["30", "40"],
            forbidden: &["10", "20", "50", "60"],
        },
        StatusRule {
            status: "3",
            label: "closed",
            required: &["30", "40"],
            forbidden: &["10", "20", "50", "60"],
        },
    ],
    strict_charset: false,
};
