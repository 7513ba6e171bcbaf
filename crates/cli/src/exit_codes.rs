//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 3-9     | engine           | Engine write/read errors                 |
//! | 10-19   | check            | Startup self-check codes                 |
//! | 20-29   | serve            | JSONL serve loop codes                   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use valvesheet_engine::error::EngineError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed key=value pairs.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Engine (3-9) — one code per error kind of the write/read contract
// =============================================================================

/// Input value outside its declared domain.
pub const EXIT_VALIDATION: u8 = 3;

/// Write to a computed parameter.
pub const EXIT_ROLE: u8 = 4;

/// Key not registered.
pub const EXIT_UNKNOWN_PARAM: u8 = 5;

/// Reference table had no entry for the requested code combination.
pub const EXIT_LOOKUP: u8 = 6;

/// Formula received an out-of-domain numeric input.
pub const EXIT_COMPUTATION: u8 = 7;

// =============================================================================
// Check (10-19)
// =============================================================================

/// Registry/table consistency self-check failed.
pub const EXIT_CHECK_FAILED: u8 = 10;

// =============================================================================
// Serve (20-29)
// =============================================================================

/// I/O failure on the JSONL stdin/stdout loop.
pub const EXIT_SERVE_IO: u8 = 20;

/// Map an EngineError to its exit code.
pub fn engine_exit_code(err: &EngineError) -> u8 {
    match err {
        EngineError::Validation { .. } => EXIT_VALIDATION,
        EngineError::Role { .. } => EXIT_ROLE,
        EngineError::UnknownParameter { .. } => EXIT_UNKNOWN_PARAM,
        EngineError::Lookup { .. } => EXIT_LOOKUP,
        EngineError::Computation { .. } => EXIT_COMPUTATION,
    }
}

/// Structured error output for engine failures.
/// Designed for both human-readable and machine-parseable output.
#[derive(Debug, serde::Serialize)]
pub struct ErrorOutput {
    pub kind: String,
    pub key: String,
    pub message: String,
    pub exit_code: u8,
}

impl ErrorOutput {
    pub fn from_engine_error(err: &EngineError) -> Self {
        Self {
            kind: err.kind().to_string(),
            key: err.key().to_string(),
            message: err.to_string(),
            exit_code: engine_exit_code(err),
        }
    }

    /// Print error to stderr (human-readable by default).
    pub fn print(&self, json: bool) {
        if json {
            if let Ok(output) = serde_json::to_string(self) {
                eprintln!("{}", output);
            }
        } else {
            eprintln!("error: {}", self.message);
        }
    }
}
