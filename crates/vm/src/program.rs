//! Loading of compiled program artifacts.
//!
//! The compiler emits a JSON document whose `data` field is the instruction
//! stream as hex-encoded integers. Only the handful of fields the machine
//! needs are read here; hint-related fields are ignored.

use groudon_felt::Felt;
use serde::Deserialize;

use crate::memory::Value;

/// The Starknet prime, as compilers spell it in program artifacts.
const PRIME: &str = "0x800000000000011000000000000000000000000000000000000000000000001";

/// An error produced while loading a compiled program.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// The artifact is not valid JSON or misses a required field.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The artifact does not define a main entrypoint.
    #[error("missing main()")]
    MissingMain,
    /// A `data` entry is not a valid hex-encoded field element.
    #[error("invalid data entry at index {index}: {entry:?}")]
    InvalidEntry {
        /// The position of the offending entry within `data`.
        index: usize,
        /// The raw string found there.
        entry: String,
    },
    /// The artifact was compiled for a different field.
    #[error("unsupported prime: {0}")]
    UnsupportedPrime(String),
}

/// A compiled Cairo program, ready to be loaded into the program segment.
#[derive(Debug, Clone)]
pub struct Program {
    /// The instruction stream, one memory cell per entry.
    pub data: Vec<Value>,
    /// The offset of the entrypoint within `data`.
    pub main_offset: usize,
    /// The builtins the program expects, in segment-allocation order.
    pub builtins: Vec<String>,
}

/// The raw shape of a compiled artifact. Unknown fields (`hints`,
/// `reference_manager`, ...) are skipped by serde.
#[derive(Debug, Deserialize)]
struct ProgramArtifact {
    data: Vec<String>,
    main: Option<usize>,
    #[serde(default)]
    builtins: Vec<String>,
    prime: Option<String>,
}

impl Program {
    /// Builds a program directly from its parts.
    pub fn new(data: Vec<Value>, main_offset: usize, builtins: Vec<String>) -> Self {
        Self {
            data,
            main_offset,
            builtins,
        }
    }

    /// Parses a compiled program artifact from its JSON source.
    pub fn from_json(json: &str) -> Result<Program, ProgramError> {
        let artifact: ProgramArtifact = serde_json::from_str(json)?;

        if let Some(prime) = &artifact.prime {
            if prime != PRIME {
                return Err(ProgramError::UnsupportedPrime(prime.clone()));
            }
        }

        let main_offset = artifact.main.ok_or(ProgramError::MissingMain)?;

        let data = artifact
            .data
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let felt = Felt::from_hex(entry).map_err(|_| ProgramError::InvalidEntry {
                    index,
                    entry: entry.clone(),
                })?;
                Ok(Value::Scalar(felt))
            })
            .collect::<Result<Vec<Value>, ProgramError>>()?;

        Ok(Program::new(data, main_offset, artifact.builtins))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_a_minimal_artifact() {
        let program = Program::from_json(
            r#"{
                "data": ["0x480680017fff8000", "0x5", "0x208b7fff7fff7ffe"],
                "main": 0,
                "prime": "0x800000000000011000000000000000000000000000000000000000000000001",
                "hints": {"0": [{"code": "ignored"}]},
                "reference_manager": {"references": []}
            }"#,
        )
        .unwrap();

        assert_eq!(program.main_offset, 0);
        assert!(program.builtins.is_empty());
        assert_eq!(
            program.data,
            vec![
                Value::from(0x480680017fff8000u64),
                Value::from(5u64),
                Value::from(0x208b7fff7fff7ffeu64),
            ]
        );
    }

    #[test]
    fn parses_builtin_names_in_order() {
        let program = Program::from_json(
            r#"{"data": [], "main": 0, "builtins": ["output", "pedersen"]}"#,
        )
        .unwrap();
        assert_eq!(program.builtins, vec!["output", "pedersen"]);
    }

    #[test]
    fn missing_main_is_rejected() {
        assert_matches!(
            Program::from_json(r#"{"data": []}"#),
            Err(ProgramError::MissingMain)
        );
    }

    #[test]
    fn bad_data_entries_are_rejected() {
        assert_matches!(
            Program::from_json(r#"{"data": ["0xnope"], "main": 0}"#),
            Err(ProgramError::InvalidEntry { index: 0, .. })
        );
    }

    #[test]
    fn foreign_primes_are_rejected() {
        assert_matches!(
            Program::from_json(r#"{"data": [], "main": 0, "prime": "0x11"}"#),
            Err(ProgramError::UnsupportedPrime(_))
        );
    }

    #[test]
    fn invalid_json_is_reported() {
        assert_matches!(Program::from_json("not json"), Err(ProgramError::Json(_)));
    }
}
