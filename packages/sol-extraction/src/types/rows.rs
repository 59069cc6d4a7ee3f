//! Tabular projections of the corpus.
//!
//! Field order is the CSV column order.

use serde::{Deserialize, Serialize};

/// One objective with every ancestor field inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRow {
    pub source_file: String,
    pub grade_level: String,
    pub course_name: String,
    pub strand_code: String,
    pub strand_name: String,
    pub standard_id: String,
    pub standard_statement: String,

    /// 1-based position within the standard
    pub objective_index: usize,
    pub objective_text: String,
    pub action_verb: String,

    // Delimiter-joined lists
    pub examples: String,
    pub constraints: String,
    pub sub_objectives: String,
    pub tags: String,

    pub cognitive_level: String,
    pub suggested_question_types: String,
}

impl FlatRow {
    pub const COLUMNS: &'static [&'static str] = &[
        "source_file",
        "grade_level",
        "course_name",
        "strand_code",
        "strand_name",
        "standard_id",
        "standard_statement",
        "objective_index",
        "objective_text",
        "action_verb",
        "examples",
        "constraints",
        "sub_objectives",
        "tags",
        "cognitive_level",
        "suggested_question_types",
    ];
}

/// One standard, for overview listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardRow {
    pub source_file: String,
    pub grade_level: String,
    pub strand_code: String,
    pub strand_name: String,
    pub standard_id: String,
    pub standard_statement: String,
    pub objective_count: usize,
    pub cognitive_level: String,
    pub tags: String,
}

impl StandardRow {
    pub const COLUMNS: &'static [&'static str] = &[
        "source_file",
        "grade_level",
        "strand_code",
        "strand_name",
        "standard_id",
        "standard_statement",
        "objective_count",
        "cognitive_level",
        "tags",
    ];
}
