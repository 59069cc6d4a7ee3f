//! Metadata hints from curriculum file names.
//!
//! Recognised shapes:
//! - `1-Grade 1-2023-Approved-Math-SOL.docx`
//! - `1. Grade 1 Mathematics Instructional Guide.docx`
//! - `12-AFDA-Understanding the Standards.docx`
//! - `11. Algebra 2 Mathematics Instructional Guide.docx`
//!
//! Anything else yields empty hints.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::source::DocumentHints;

static RE_APPROVED_SOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)-(.+?)-(\d{4})-Approved-Math-SOL\.(?:docx|txt)$").expect("valid regex")
});
static RE_GRADE_GUIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.\s+Grade\s+(\d+)\s+Mathematics\s+Instructional\s+Guide\.(?:docx|txt)$")
        .expect("valid regex")
});
static RE_UNDERSTANDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)-(.+?)-Understanding\s+the\s+Standards\.(?:docx|txt)$").expect("valid regex")
});
static RE_SUBJECT_GUIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.\s+(.+?)\s+Mathematics\s+Instructional\s+Guide\.(?:docx|txt)$")
        .expect("valid regex")
});

/// Courses after grade 8, by document number.
const COURSES: [(u32, &str); 10] = [
    (9, "Algebra 1"),
    (10, "Geometry"),
    (11, "AFDA"),
    (12, "Algebra 2"),
    (13, "Trigonometry"),
    (14, "Computational Mathematics"),
    (15, "Probability & Statistics"),
    (16, "Discrete Mathematics"),
    (17, "Mathematical Analysis"),
    (18, "Data Science"),
];

/// Parse hints from a bare file name (no directories).
pub fn parse_filename_hints(file_name: &str) -> DocumentHints {
    if let Some(caps) = RE_APPROVED_SOL.captures(file_name) {
        let number = caps[1].parse().ok();
        return with_level(
            "Approved SOL Standards",
            number,
            &caps[2],
            Some(caps[3].to_string()),
        );
    }

    if let Some(caps) = RE_GRADE_GUIDE.captures(file_name) {
        return DocumentHints {
            document_type: Some("Instructional Guide".into()),
            number: caps[1].parse().ok(),
            grade_level: Some(format!("Grade {}", &caps[2])),
            course_name: None,
            year: None,
        };
    }

    if let Some(caps) = RE_UNDERSTANDING.captures(file_name) {
        return with_level("Understanding the Standards", caps[1].parse().ok(), &caps[2], None);
    }

    if let Some(caps) = RE_SUBJECT_GUIDE.captures(file_name) {
        return with_level("Instructional Guide", caps[1].parse().ok(), &caps[2], None);
    }

    DocumentHints::default()
}

fn with_level(
    document_type: &str,
    number: Option<u32>,
    subject: &str,
    year: Option<String>,
) -> DocumentHints {
    let (grade_level, course_name) = match number {
        Some(n @ 1..=8) => (format!("Grade {n}"), None),
        Some(n) => match COURSES.iter().find(|(num, _)| *num == n) {
            Some((_, course)) => (course.to_string(), Some(course.to_string())),
            None => (subject.trim().to_string(), Some(subject.trim().to_string())),
        },
        None => (subject.trim().to_string(), None),
    };

    DocumentHints {
        document_type: Some(document_type.into()),
        number,
        grade_level: Some(grade_level),
        course_name,
        year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approved_sol_grade() {
        let hints = parse_filename_hints("1-Grade 1-2023-Approved-Math-SOL.docx");
        assert_eq!(hints.number, Some(1));
        assert_eq!(hints.grade_level.as_deref(), Some("Grade 1"));
        assert_eq!(hints.year.as_deref(), Some("2023"));
        assert_eq!(hints.course_name, None);
    }

    #[test]
    fn test_approved_sol_course() {
        let hints = parse_filename_hints("11-AFDA-2023-Approved-Math-SOL.docx");
        assert_eq!(hints.grade_level.as_deref(), Some("AFDA"));
        assert_eq!(hints.course_name.as_deref(), Some("AFDA"));
    }

    #[test]
    fn test_instructional_guides() {
        let hints = parse_filename_hints("3. Grade 3 Mathematics Instructional Guide.docx");
        assert_eq!(hints.grade_level.as_deref(), Some("Grade 3"));
        assert_eq!(hints.document_type.as_deref(), Some("Instructional Guide"));

        let hints = parse_filename_hints("12. Algebra 2 Mathematics Instructional Guide.docx");
        assert_eq!(hints.grade_level.as_deref(), Some("Algebra 2"));
    }

    #[test]
    fn test_understanding_the_standards() {
        let hints = parse_filename_hints("15-Probability and Statistics-Understanding the Standards.docx");
        assert_eq!(hints.grade_level.as_deref(), Some("Probability & Statistics"));
        assert_eq!(hints.document_type.as_deref(), Some("Understanding the Standards"));
    }

    #[test]
    fn test_unknown_number_falls_back_to_subject() {
        let hints = parse_filename_hints("21-Calculus-Understanding the Standards.docx");
        assert_eq!(hints.grade_level.as_deref(), Some("Calculus"));
    }

    #[test]
    fn test_unrecognised_name() {
        assert!(parse_filename_hints("notes.docx").is_empty());
    }
}
