//! Project the nested corpus into flat rows.
//!
//! List fields become one string joined with `"; "`. Items that contain the
//! delimiter are either escaped (`\` to `\\`, `;` to `\;`) or rejected,
//! depending on [`DelimiterPolicy`]. Use [`split_list`] to reverse the join.

use crate::error::FailureReason;
use crate::types::config::{DelimiterPolicy, FlattenConfig};
use crate::types::corpus::Corpus;
use crate::types::rows::{FlatRow, StandardRow};

pub const LIST_DELIMITER: &str = "; ";

/// One row per objective, in document/strand/standard/objective order.
pub fn flatten(corpus: &Corpus, config: &FlattenConfig) -> Result<Vec<FlatRow>, FailureReason> {
    let policy = config.delimiter_policy;
    let mut rows = Vec::new();

    for doc in &corpus.documents {
        let meta = &doc.document_metadata;
        let course_name = meta.course_name.clone().unwrap_or_default();

        for strand in &doc.strands {
            for standard in &strand.standards {
                let tags = join_list("tags", &standard.tags, policy)?;
                let question_types: Vec<&str> = standard
                    .suggested_question_types
                    .iter()
                    .map(|q| q.as_str())
                    .collect();
                let question_types = join_list("suggested_question_types", &question_types, policy)?;
                let cognitive_level = standard
                    .cognitive_level
                    .map(|l| l.as_str().to_string())
                    .unwrap_or_default();

                for (i, objective) in standard.knowledge_and_skills.iter().enumerate() {
                    rows.push(FlatRow {
                        source_file: doc.extraction_metadata.source_file.clone(),
                        grade_level: meta.grade_level.clone(),
                        course_name: course_name.clone(),
                        strand_code: strand.strand_code.clone(),
                        strand_name: strand.strand_name.clone(),
                        standard_id: standard.standard_id.clone(),
                        standard_statement: standard.standard_statement.clone(),
                        objective_index: i + 1,
                        objective_text: objective.objective_text.clone(),
                        action_verb: objective.action_verb.clone(),
                        examples: join_list("examples", &objective.examples, policy)?,
                        constraints: join_list("constraints", &objective.constraints, policy)?,
                        sub_objectives: join_list("sub_objectives", &objective.sub_objectives, policy)?,
                        tags: tags.clone(),
                        cognitive_level: cognitive_level.clone(),
                        suggested_question_types: question_types.clone(),
                    });
                }
            }
        }
    }

    Ok(rows)
}

/// One row per standard.
pub fn standards_view(
    corpus: &Corpus,
    config: &FlattenConfig,
) -> Result<Vec<StandardRow>, FailureReason> {
    let mut rows = Vec::new();
    for doc in &corpus.documents {
        for strand in &doc.strands {
            for standard in &strand.standards {
                rows.push(StandardRow {
                    source_file: doc.extraction_metadata.source_file.clone(),
                    grade_level: doc.document_metadata.grade_level.clone(),
                    strand_code: strand.strand_code.clone(),
                    strand_name: strand.strand_name.clone(),
                    standard_id: standard.standard_id.clone(),
                    standard_statement: standard.standard_statement.clone(),
                    objective_count: standard.knowledge_and_skills.len(),
                    cognitive_level: standard
                        .cognitive_level
                        .map(|l| l.as_str().to_string())
                        .unwrap_or_default(),
                    tags: join_list("tags", &standard.tags, config.delimiter_policy)?,
                });
            }
        }
    }
    Ok(rows)
}

fn join_list<S: AsRef<str>>(
    field: &str,
    items: &[S],
    policy: DelimiterPolicy,
) -> Result<String, FailureReason> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        let item = item.as_ref();
        match policy {
            DelimiterPolicy::Escape => parts.push(escape_item(item)),
            DelimiterPolicy::Reject if item.contains(';') => {
                return Err(FailureReason::UnrepresentableValue {
                    field: field.to_string(),
                    value: item.to_string(),
                })
            }
            DelimiterPolicy::Reject => parts.push(item.to_string()),
        }
    }
    Ok(parts.join(LIST_DELIMITER))
}

fn escape_item(item: &str) -> String {
    if !item.contains(|c: char| c == ';' || c == '\\') {
        return item.to_string();
    }
    let mut out = String::with_capacity(item.len() + 4);
    for c in item.chars() {
        if c == '\\' || c == ';' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Split a joined list column back into items, undoing escapes.
pub fn split_list(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = joined.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ';' => {
                items.push(std::mem::take(&mut current));
                if chars.peek() == Some(&' ') {
                    chars.next();
                }
            }
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}
