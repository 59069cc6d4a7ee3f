//! Validate and repair a model response against the schema contract.
//!
//! Model replies are untyped text, so parsing is an explicit three-way step:
//! the text either fails to parse ([`ParsedResponse::Malformed`]), parses but
//! yields nothing usable ([`ParsedResponse::Invalid`]), or yields a document
//! ([`ParsedResponse::Valid`]) together with every issue found on the way.
//!
//! Policy:
//! - enrichment lists (`tags`, `examples`, `constraints`, `sub_objectives`,
//!   `suggested_question_types`) default to empty when absent
//! - a standard missing `standard_id`, `standard_statement`, or
//!   `knowledge_and_skills` is dropped on its own; the document survives as
//!   long as one valid standard remains
//! - enum values outside the closed sets are dropped with an issue

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::schema::{CognitiveLevel, DocumentMetadata, Objective, QuestionType, Standard, Strand};
use crate::types::source::DocumentHints;

/// One problem found while validating, with a JSON-path-like location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,

    /// Content was discarded, not just reshaped
    pub dropped: bool,
}

impl ValidationIssue {
    fn repaired(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            dropped: false,
        }
    }

    fn dropped(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            dropped: true,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Document content that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub metadata: DocumentMetadata,
    pub introduction: Option<String>,
    pub strands: Vec<Strand>,

    /// Repairs and drops applied; empty for a clean response
    pub issues: Vec<ValidationIssue>,
}

impl Validated {
    /// Some content of the response was discarded.
    pub fn is_partial(&self) -> bool {
        self.issues.iter().any(|issue| issue.dropped)
    }
}

/// Outcome of turning response text into a document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// Not parseable as JSON
    Malformed(String),

    /// Parsed, but no valid standard survived
    Invalid(Vec<ValidationIssue>),

    Valid(Validated),
}

/// Parse response text and validate it.
///
/// A surrounding markdown code fence is tolerated.
pub fn parse_response(text: &str, hints: &DocumentHints) -> ParsedResponse {
    let value: Value = match serde_json::from_str(text)
        .or_else(|_| serde_json::from_str(strip_code_fence(text)))
    {
        Ok(value) => value,
        Err(e) => return ParsedResponse::Malformed(e.to_string()),
    };

    match validate_response(&value, hints) {
        Ok(validated) => ParsedResponse::Valid(validated),
        Err(issues) => ParsedResponse::Invalid(issues),
    }
}

fn strip_code_fence(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Validate a parsed value.
pub fn validate_response(
    value: &Value,
    hints: &DocumentHints,
) -> Result<Validated, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let Some(root) = value.as_object() else {
        return Err(vec![ValidationIssue::dropped("$", "expected a JSON object")]);
    };

    let metadata = validate_metadata(root.get("document_metadata"), hints, &mut issues);
    let introduction = text_field(root, "introduction");

    let strands = match root.get("strands").and_then(Value::as_array) {
        Some(items) => validate_strands(items, &mut issues),
        None => {
            issues.push(ValidationIssue::dropped("strands", "missing or not an array"));
            Vec::new()
        }
    };

    let standard_count: usize = strands.iter().map(|s| s.standards.len()).sum();

    match metadata {
        Some(metadata) if standard_count > 0 => Ok(Validated {
            metadata,
            introduction,
            strands,
            issues,
        }),
        Some(_) => {
            issues.push(ValidationIssue::dropped("strands", "no valid standard in document"));
            Err(issues)
        }
        None => Err(issues),
    }
}

fn validate_metadata(
    value: Option<&Value>,
    hints: &DocumentHints,
    issues: &mut Vec<ValidationIssue>,
) -> Option<DocumentMetadata> {
    let empty = Map::new();
    let object = match value {
        Some(Value::Object(object)) => object,
        Some(_) => {
            issues.push(ValidationIssue::repaired("document_metadata", "not an object"));
            &empty
        }
        None => {
            issues.push(ValidationIssue::repaired("document_metadata", "missing"));
            &empty
        }
    };

    let grade_level = match text_field(object, "grade_level") {
        Some(grade) => grade,
        None => match &hints.grade_level {
            Some(hint) => {
                issues.push(ValidationIssue::repaired(
                    "document_metadata.grade_level",
                    format!("missing, filled from file name as {hint:?}"),
                ));
                hint.clone()
            }
            None => {
                issues.push(ValidationIssue::dropped(
                    "document_metadata.grade_level",
                    "missing and no file name hint available",
                ));
                return None;
            }
        },
    };

    Some(DocumentMetadata {
        title: text_field(object, "title"),
        grade_level,
        course_name: text_field(object, "course_name").or_else(|| hints.course_name.clone()),
        year: text_field(object, "year").or_else(|| hints.year.clone()),
        state: text_field(object, "state"),
    })
}

fn validate_strands(items: &[Value], issues: &mut Vec<ValidationIssue>) -> Vec<Strand> {
    let mut strands: Vec<Strand> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (i, item) in items.iter().enumerate() {
        let path = format!("strands[{i}]");
        let Some(object) = item.as_object() else {
            issues.push(ValidationIssue::dropped(path, "not an object, strand dropped"));
            continue;
        };

        let code = text_field(object, "strand_code");
        let name = text_field(object, "strand_name");
        let standards = object.get("standards").and_then(Value::as_array);

        let (Some(code), Some(name), Some(standards)) = (code, name, standards) else {
            for (key, present) in [
                ("strand_code", text_field(object, "strand_code").is_some()),
                ("strand_name", text_field(object, "strand_name").is_some()),
                ("standards", object.get("standards").and_then(Value::as_array).is_some()),
            ] {
                if !present {
                    issues.push(ValidationIssue::dropped(
                        format!("{path}.{key}"),
                        "missing, strand dropped",
                    ));
                }
            }
            continue;
        };

        let valid: Vec<Standard> = standards
            .iter()
            .enumerate()
            .filter_map(|(j, standard)| {
                validate_standard(standard, &format!("{path}.standards[{j}]"), &mut seen_ids, issues)
            })
            .collect();

        match strands.iter_mut().find(|s| s.strand_code == code) {
            Some(existing) => {
                issues.push(ValidationIssue::repaired(
                    path,
                    format!("repeats strand_code {code:?}, merged into earlier strand"),
                ));
                existing.standards.extend(valid);
                if existing.strand_description.is_none() {
                    existing.strand_description = text_field(object, "strand_description");
                }
            }
            None => strands.push(Strand {
                strand_code: code,
                strand_name: name,
                strand_description: text_field(object, "strand_description"),
                standards: valid,
            }),
        }
    }

    strands
}

fn validate_standard(
    value: &Value,
    path: &str,
    seen_ids: &mut HashSet<String>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Standard> {
    let Some(object) = value.as_object() else {
        issues.push(ValidationIssue::dropped(path, "not an object, standard dropped"));
        return None;
    };

    let id = text_field(object, "standard_id");
    let statement = text_field(object, "standard_statement");
    let objectives = object.get("knowledge_and_skills").and_then(Value::as_array);

    let mut missing = Vec::new();
    if id.is_none() {
        missing.push("standard_id");
    }
    if statement.is_none() {
        missing.push("standard_statement");
    }
    if objectives.is_none() {
        missing.push("knowledge_and_skills");
    }
    let (Some(id), Some(statement), Some(objectives)) = (id, statement, objectives) else {
        issues.push(ValidationIssue::dropped(
            path,
            format!("missing {}, standard dropped", missing.join(", ")),
        ));
        return None;
    };

    if !seen_ids.insert(id.clone()) {
        issues.push(ValidationIssue::dropped(
            path,
            format!("duplicate standard_id {id:?}, standard dropped"),
        ));
        return None;
    }

    let knowledge_and_skills = objectives
        .iter()
        .enumerate()
        .filter_map(|(k, objective)| {
            validate_objective(objective, &format!("{path}.knowledge_and_skills[{k}]"), issues)
        })
        .collect();

    let cognitive_level = match object.get("cognitive_level") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => {
            let parsed = CognitiveLevel::parse(raw);
            if parsed.is_none() {
                issues.push(ValidationIssue::dropped(
                    format!("{path}.cognitive_level"),
                    format!("{raw:?} is not a cognitive level, dropped"),
                ));
            }
            parsed
        }
        Some(_) => {
            issues.push(ValidationIssue::dropped(
                format!("{path}.cognitive_level"),
                "not a string, dropped",
            ));
            None
        }
    };

    let mut suggested_question_types = Vec::new();
    for raw in string_list(object, "suggested_question_types", path, issues) {
        match QuestionType::parse(&raw) {
            Some(kind) if !suggested_question_types.contains(&kind) => {
                suggested_question_types.push(kind)
            }
            Some(_) => {}
            None => issues.push(ValidationIssue::dropped(
                format!("{path}.suggested_question_types"),
                format!("{raw:?} is not a question type, dropped"),
            )),
        }
    }

    Some(Standard {
        standard_id: id,
        standard_statement: statement,
        knowledge_and_skills,
        tags: dedupe(string_list(object, "tags", path, issues)),
        cognitive_level,
        suggested_question_types,
    })
}

fn validate_objective(
    value: &Value,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Objective> {
    let object = match value {
        Value::Object(object) => object,
        Value::String(text) if !text.trim().is_empty() => {
            issues.push(ValidationIssue::repaired(path, "bare string, treated as objective_text"));
            let text = text.trim().to_string();
            let verb = first_verb(&text);
            return Some(Objective::new(text, verb));
        }
        _ => {
            issues.push(ValidationIssue::dropped(path, "not an object, objective dropped"));
            return None;
        }
    };

    let Some(objective_text) = text_field(object, "objective_text") else {
        issues.push(ValidationIssue::dropped(
            format!("{path}.objective_text"),
            "missing, objective dropped",
        ));
        return None;
    };

    let action_verb = text_field(object, "action_verb")
        .map(|verb| verb.to_lowercase())
        .unwrap_or_else(|| first_verb(&objective_text));

    Some(Objective {
        examples: string_list(object, "examples", path, issues),
        constraints: string_list(object, "constraints", path, issues),
        sub_objectives: string_list(object, "sub_objectives", path, issues),
        objective_text,
        action_verb,
    })
}

/// Trimmed non-empty string. Numbers are accepted and rendered.
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// List of strings; absent means empty. A lone string becomes one item.
fn string_list(
    object: &Map<String, Value>,
    key: &str,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<String> {
    match object.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(Value::String(s)) => {
            issues.push(ValidationIssue::repaired(
                format!("{path}.{key}"),
                "string instead of list, wrapped",
            ));
            vec![s.trim().to_string()]
        }
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (n, item) in items.iter().enumerate() {
                match item {
                    Value::String(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
                    Value::String(_) => {}
                    Value::Number(num) => out.push(num.to_string()),
                    _ => issues.push(ValidationIssue::dropped(
                        format!("{path}.{key}[{n}]"),
                        "not a string, dropped",
                    )),
                }
            }
            out
        }
        Some(_) => {
            issues.push(ValidationIssue::dropped(
                format!("{path}.{key}"),
                "not a list, treated as empty",
            ));
            Vec::new()
        }
    }
}

fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn first_verb(text: &str) -> String {
    text.split_whitespace()
        .next()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EXAMPLE_OUTPUT;
    use serde_json::json;

    fn standard(id: Option<&str>) -> Value {
        let mut value = json!({
            "standard_statement": "The student will count.",
            "knowledge_and_skills": [
                {"objective_text": "Count forward by ones to 120.", "action_verb": "count"}
            ],
            "cognitive_level": "apply"
        });
        if let Some(id) = id {
            value["standard_id"] = json!(id);
        }
        value
    }

    fn document(standards: Vec<Value>) -> Value {
        json!({
            "document_metadata": {"title": "Grade 1 Mathematics", "grade_level": "Grade 1"},
            "strands": [
                {"strand_code": "NS", "strand_name": "Number and Number Sense", "standards": standards}
            ]
        })
    }

    #[test]
    fn test_worked_example_is_valid_and_clean() {
        match parse_response(EXAMPLE_OUTPUT, &DocumentHints::default()) {
            ParsedResponse::Valid(validated) => {
                assert!(validated.issues.is_empty(), "{:?}", validated.issues);
                assert_eq!(validated.strands[0].standards[0].knowledge_and_skills.len(), 2);
            }
            other => panic!("example should validate: {other:?}"),
        }
    }

    #[test]
    fn test_standard_missing_id_is_dropped_alone() {
        let value = document(vec![
            standard(Some("1.NS.1")),
            standard(None),
            standard(Some("1.NS.3")),
        ]);

        let validated = validate_response(&value, &DocumentHints::default()).unwrap();
        let ids: Vec<_> = validated.strands[0]
            .standards
            .iter()
            .map(|s| s.standard_id.as_str())
            .collect();

        assert_eq!(ids, vec!["1.NS.1", "1.NS.3"]);
        assert_eq!(validated.issues.len(), 1);
        assert!(validated.is_partial());
        assert!(validated.issues[0].message.contains("standard_id"));
        assert_eq!(validated.issues[0].path, "strands[0].standards[1]");
    }

    #[test]
    fn test_no_valid_standard_fails_document() {
        let value = document(vec![standard(None)]);
        let issues = validate_response(&value, &DocumentHints::default()).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("no valid standard")));
    }

    #[test]
    fn test_enrichment_lists_default_to_empty() {
        let value = document(vec![standard(Some("1.NS.1"))]);
        let validated = validate_response(&value, &DocumentHints::default()).unwrap();
        let std = &validated.strands[0].standards[0];

        assert!(std.tags.is_empty());
        assert!(std.suggested_question_types.is_empty());
        assert!(std.knowledge_and_skills[0].examples.is_empty());
        assert!(std.knowledge_and_skills[0].constraints.is_empty());
        assert!(validated.issues.is_empty());
    }

    #[test]
    fn test_out_of_set_enum_values_dropped() {
        let mut std = standard(Some("1.NS.1"));
        std["cognitive_level"] = json!("memorize");
        std["suggested_question_types"] = json!(["multiple_choice", "essay", "Multiple Choice"]);

        let validated = validate_response(&document(vec![std]), &DocumentHints::default()).unwrap();
        let std = &validated.strands[0].standards[0];

        assert_eq!(std.cognitive_level, None);
        assert_eq!(std.suggested_question_types, vec![QuestionType::MultipleChoice]);
        assert_eq!(validated.issues.len(), 2);
        assert!(validated.is_partial());
    }

    #[test]
    fn test_duplicate_standard_id_dropped() {
        let value = document(vec![standard(Some("1.NS.1")), standard(Some("1.NS.1"))]);
        let validated = validate_response(&value, &DocumentHints::default()).unwrap();
        assert_eq!(validated.strands[0].standards.len(), 1);
        assert!(validated.issues[0].message.contains("duplicate"));
    }

    #[test]
    fn test_repeated_strand_code_merges_in_order() {
        let value = json!({
            "document_metadata": {"grade_level": "Grade 1"},
            "strands": [
                {"strand_code": "NS", "strand_name": "Number Sense", "standards": [standard(Some("1.NS.1"))]},
                {"strand_code": "CE", "strand_name": "Computation", "standards": [standard(Some("1.CE.1"))]},
                {"strand_code": "NS", "strand_name": "Number Sense", "standards": [standard(Some("1.NS.2"))]}
            ]
        });

        let validated = validate_response(&value, &DocumentHints::default()).unwrap();
        assert_eq!(validated.strands.len(), 2);
        let ns: Vec<_> = validated.strands[0].standards.iter().map(|s| s.standard_id.clone()).collect();
        assert_eq!(ns, vec!["1.NS.1", "1.NS.2"]);
    }

    #[test]
    fn test_grade_level_filled_from_hint() {
        let mut value = document(vec![standard(Some("1.NS.1"))]);
        value["document_metadata"] = json!({"title": "Mathematics"});

        let hints = DocumentHints {
            grade_level: Some("Grade 1".into()),
            ..Default::default()
        };
        let validated = validate_response(&value, &hints).unwrap();
        assert_eq!(validated.metadata.grade_level, "Grade 1");
        assert_eq!(validated.issues.len(), 1);
        assert!(!validated.is_partial());

        let issues = validate_response(&value, &DocumentHints::default()).unwrap_err();
        assert!(issues[0].path.ends_with("grade_level"));
    }

    #[test]
    fn test_objective_repairs() {
        let mut std = standard(Some("1.NS.1"));
        std["knowledge_and_skills"] = json!([
            "Identify the number before and after.",
            {"objective_text": "Represent numbers (e.g., base ten blocks).", "constraints": "up to 120"},
            {"action_verb": "count"}
        ]);

        let validated = validate_response(&document(vec![std]), &DocumentHints::default()).unwrap();
        let objectives = &validated.strands[0].standards[0].knowledge_and_skills;

        assert_eq!(objectives.len(), 2);
        assert_eq!(objectives[0].action_verb, "identify");
        assert_eq!(objectives[1].action_verb, "represent");
        assert_eq!(objectives[1].constraints, vec!["up to 120"]);
        assert_eq!(validated.issues.len(), 3);
    }

    #[test]
    fn test_reshaping_alone_is_not_partial() {
        let mut std = standard(Some("1.NS.1"));
        std["tags"] = json!("counting");
        std["knowledge_and_skills"] = json!(["Count forward by ones to 120."]);
        let value = json!({
            "document_metadata": {"title": "Mathematics"},
            "strands": [
                {"strand_code": "NS", "strand_name": "Number Sense", "standards": [std]},
                {"strand_code": "NS", "strand_name": "Number Sense", "standards": [standard(Some("1.NS.2"))]}
            ]
        });
        let hints = DocumentHints {
            grade_level: Some("Grade 1".into()),
            ..Default::default()
        };

        let validated = validate_response(&value, &hints).unwrap();

        assert_eq!(validated.issues.len(), 4);
        assert!(validated.issues.iter().all(|issue| !issue.dropped));
        assert!(!validated.is_partial());
    }

    #[test]
    fn test_malformed_and_fenced_text() {
        assert!(matches!(
            parse_response("not json at all", &DocumentHints::default()),
            ParsedResponse::Malformed(_)
        ));

        let fenced = format!("```json\n{EXAMPLE_OUTPUT}\n```");
        assert!(matches!(
            parse_response(&fenced, &DocumentHints::default()),
            ParsedResponse::Valid(_)
        ));

        assert!(matches!(
            parse_response("[1, 2, 3]", &DocumentHints::default()),
            ParsedResponse::Invalid(_)
        ));
    }
}
