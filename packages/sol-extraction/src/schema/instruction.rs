//! Instruction text sent with every extraction request.
//!
//! The validator in `pipeline::validate` enforces exactly what this text
//! promises. When a field, requirement, or enumeration value changes here it
//! must change there too; the tests at the bottom pin the two together.

use sha2::{Digest, Sha256};

/// System instruction describing the target JSON shape.
pub const EXTRACTION_INSTRUCTION: &str = r#"You are analyzing a Virginia Standards of Learning (SOL) mathematics document.

Extract the content into one JSON object with this shape:

{
  "document_metadata": {
    "title": string (optional),
    "grade_level": string (REQUIRED, e.g. "Grade 1", "Algebra 1"),
    "course_name": string (optional),
    "year": string (optional, e.g. "2023"),
    "state": string (optional, e.g. "Virginia")
  },
  "introduction": string (optional overview paragraph(s)),
  "strands": [                                   (REQUIRED)
    {
      "strand_code": string (REQUIRED, e.g. "NS", "CE", "MG", "PS", "PFA", "EO", "EI", "F", "ST"),
      "strand_name": string (REQUIRED, e.g. "Number and Number Sense"),
      "strand_description": string (optional),
      "standards": [                             (REQUIRED)
        {
          "standard_id": string (REQUIRED, unique in this document, e.g. "1.NS.1", "A.EO.1"),
          "standard_statement": string (REQUIRED, the complete statement),
          "knowledge_and_skills": [              (REQUIRED)
            {
              "objective_text": string (REQUIRED),
              "action_verb": string (first verb: identify, solve, count, represent, ...),
              "examples": [string] (items from parentheses, e.g. "(e.g., pictorial, concrete)" gives ["pictorial", "concrete"]),
              "constraints": [string] (numerical limits or ranges, e.g. "within 20", "up to 120"),
              "sub_objectives": [string] (sub-bullets under the objective)
            }
          ],
          "tags": [string] (keywords such as "addition", "fractions", "measurement"),
          "cognitive_level": one of "remember" | "understand" | "apply" | "analyze" | "evaluate" | "create",
          "suggested_question_types": [one or more of "multiple_choice" | "true_false" | "short_answer" | "problem_solving" | "matching" | "fill_in_blank" | "graphical" | "computational"]
        }
      ]
    }
  ]
}

Optional list fields may be empty arrays. Never invent values outside the listed
enumerations.

GUIDELINES:
1. Keep strands, standards, and objectives in the order they appear in the document.
2. Every bullet under a standard's "Knowledge and Skills" section is one objective.
3. Cognitive level follows Bloom's taxonomy:
   remember = recall facts; understand = explain concepts; apply = use in new situations;
   analyze = break down and examine; evaluate = judge or critique; create = produce something new.
4. Suggested question types follow the action verbs:
   identify/recognize -> multiple_choice, matching
   solve/calculate -> problem_solving, computational
   compare/contrast -> matching, short_answer
   represent/model -> graphical, short_answer
   explain/describe -> short_answer
   verification statements -> true_false

EXAMPLE OUTPUT:
{example}

Respond with JSON only, no prose. Capture every standard and objective."#;

/// Worked example embedded in the instruction.
pub const EXAMPLE_OUTPUT: &str = r#"{
  "document_metadata": {
    "title": "Mathematics Standards of Learning for Virginia Public Schools",
    "grade_level": "Grade 1",
    "course_name": "Mathematics",
    "year": "2023",
    "state": "Virginia"
  },
  "introduction": "In Grade 1, instructional time focuses on counting and place value.",
  "strands": [
    {
      "strand_code": "NS",
      "strand_name": "Number and Number Sense",
      "standards": [
        {
          "standard_id": "1.NS.1",
          "standard_statement": "The student will utilize flexible counting strategies to determine and describe quantities up to 120.",
          "knowledge_and_skills": [
            {
              "objective_text": "Count forward by ones to 120, starting at any number.",
              "action_verb": "count",
              "examples": [],
              "constraints": ["up to 120", "by ones"],
              "sub_objectives": []
            },
            {
              "objective_text": "Count backward by ones from 30.",
              "action_verb": "count",
              "examples": [],
              "constraints": ["from 30", "by ones"],
              "sub_objectives": []
            }
          ],
          "tags": ["counting", "number_sense", "sequences"],
          "cognitive_level": "apply",
          "suggested_question_types": ["multiple_choice", "fill_in_blank", "short_answer"]
        }
      ]
    }
  ]
}"#;

/// Full system instruction with the worked example inlined.
pub fn extraction_instruction() -> String {
    EXTRACTION_INSTRUCTION.replace("{example}", EXAMPLE_OUTPUT)
}

/// SHA-256 of the full instruction, recorded with every extraction.
pub fn instruction_hash() -> String {
    let mut hasher = Sha256::new();
    hasher.update(extraction_instruction().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CognitiveLevel, QuestionType};

    #[test]
    fn test_instruction_hash_is_consistent() {
        let hash1 = instruction_hash();
        let hash2 = instruction_hash();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 hex
    }

    #[test]
    fn test_instruction_lists_every_enumeration_value() {
        let instruction = extraction_instruction();
        for level in CognitiveLevel::ALL {
            assert!(instruction.contains(&format!("\"{}\"", level.as_str())), "{level}");
        }
        for kind in QuestionType::ALL {
            assert!(instruction.contains(&format!("\"{}\"", kind.as_str())), "{kind}");
        }
    }

    #[test]
    fn test_instruction_demands_json_only() {
        let instruction = extraction_instruction();
        assert!(instruction.contains("Respond with JSON only, no prose."));
        assert!(instruction.contains("\"standard_id\": \"1.NS.1\""));
        assert!(!instruction.contains("{example}"));
    }
}
