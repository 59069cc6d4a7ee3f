//! Canonical shape of one extracted curriculum document.
//!
//! These types are the output compatibility surface: field names and nesting
//! are consumed as-is by quiz tooling, so renames here are breaking changes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bloom's taxonomy level assigned per standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CognitiveLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl CognitiveLevel {
    pub const ALL: [CognitiveLevel; 6] = [
        Self::Remember,
        Self::Understand,
        Self::Apply,
        Self::Analyze,
        Self::Evaluate,
        Self::Create,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remember => "remember",
            Self::Understand => "understand",
            Self::Apply => "apply",
            Self::Analyze => "analyze",
            Self::Evaluate => "evaluate",
            Self::Create => "create",
        }
    }

    /// Parse a model-provided label. Case-insensitive; `None` outside the closed set.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize_label(raw);
        Self::ALL.into_iter().find(|level| level.as_str() == normalized)
    }
}

impl fmt::Display for CognitiveLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quiz formats a standard lends itself to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    ProblemSolving,
    Matching,
    FillInBlank,
    Graphical,
    Computational,
}

impl QuestionType {
    pub const ALL: [QuestionType; 8] = [
        Self::MultipleChoice,
        Self::TrueFalse,
        Self::ShortAnswer,
        Self::ProblemSolving,
        Self::Matching,
        Self::FillInBlank,
        Self::Graphical,
        Self::Computational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::ShortAnswer => "short_answer",
            Self::ProblemSolving => "problem_solving",
            Self::Matching => "matching",
            Self::FillInBlank => "fill_in_blank",
            Self::Graphical => "graphical",
            Self::Computational => "computational",
        }
    }

    /// Parse a model-provided label, accepting `"Fill in blank"` and
    /// `"fill-in-blank"` spellings of `fill_in_blank`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize_label(raw);
        Self::ALL.into_iter().find(|kind| kind.as_str() == normalized)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(|c: char| c == ' ' || c == '-', "_")
}

/// Title block of a document. Only `grade_level` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub grade_level: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl DocumentMetadata {
    pub fn new(grade_level: impl Into<String>) -> Self {
        Self {
            title: None,
            grade_level: grade_level.into(),
            course_name: None,
            year: None,
            state: None,
        }
    }
}

/// A concrete, assessable skill. The unit that becomes a quiz question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub objective_text: String,

    pub action_verb: String,

    #[serde(default)]
    pub examples: Vec<String>,

    #[serde(default)]
    pub constraints: Vec<String>,

    #[serde(default)]
    pub sub_objectives: Vec<String>,
}

impl Objective {
    pub fn new(objective_text: impl Into<String>, action_verb: impl Into<String>) -> Self {
        Self {
            objective_text: objective_text.into(),
            action_verb: action_verb.into(),
            examples: Vec::new(),
            constraints: Vec::new(),
            sub_objectives: Vec::new(),
        }
    }

    pub fn with_constraints(mut self, constraints: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.constraints = constraints.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_examples(mut self, examples: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }
}

/// A single uniquely identified learning requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standard {
    /// `<course>.<strand_code>.<n>`, unique within its document
    pub standard_id: String,

    pub standard_statement: String,

    /// Objectives in document order
    pub knowledge_and_skills: Vec<Objective>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cognitive_level: Option<CognitiveLevel>,

    #[serde(default)]
    pub suggested_question_types: Vec<QuestionType>,
}

impl Standard {
    pub fn new(standard_id: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            standard_id: standard_id.into(),
            standard_statement: statement.into(),
            knowledge_and_skills: Vec::new(),
            tags: Vec::new(),
            cognitive_level: None,
            suggested_question_types: Vec::new(),
        }
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.knowledge_and_skills.push(objective);
        self
    }
}

/// A named content domain grouping related standards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strand {
    pub strand_code: String,

    pub strand_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strand_description: Option<String>,

    pub standards: Vec<Standard>,
}

impl Strand {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            strand_code: code.into(),
            strand_name: name.into(),
            strand_description: None,
            standards: Vec::new(),
        }
    }

    pub fn with_standard(mut self, standard: Standard) -> Self {
        self.standards.push(standard);
        self
    }
}

/// Provenance of one extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub source_file: String,
    pub model: String,
    pub temperature: f32,
    pub tokens_used: u64,
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,

    /// Hash of the instruction the response was produced under
    #[serde(default)]
    pub prompt_hash: String,

    /// Oracle requests issued, including retries
    #[serde(default)]
    pub attempts: u32,

    /// Set when validation dropped or repaired part of the response
    #[serde(default)]
    pub partial: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Validated output for one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub document_metadata: DocumentMetadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,

    pub strands: Vec<Strand>,

    pub extraction_metadata: ExtractionMetadata,
}

impl StructuredDocument {
    pub fn standards(&self) -> impl Iterator<Item = &Standard> {
        self.strands.iter().flat_map(|s| s.standards.iter())
    }

    pub fn standard_count(&self) -> usize {
        self.standards().count()
    }

    pub fn objective_count(&self) -> usize {
        self.standards().map(|s| s.knowledge_and_skills.len()).sum()
    }
}
