//! Schema contract: the document shape, its closed enumerations, and the
//! instruction that describes both to the model.

pub mod document;
pub mod instruction;

pub use document::{
    CognitiveLevel, DocumentMetadata, ExtractionMetadata, Objective, QuestionType, Standard,
    Strand, StructuredDocument,
};
pub use instruction::{extraction_instruction, instruction_hash, EXAMPLE_OUTPUT, EXTRACTION_INSTRUCTION};
