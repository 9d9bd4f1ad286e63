//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; batch wrappers that restart
//! `prodmatch run` after a crash rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | data             | Input and output file codes              |
//! | 10-19   | oracle           | Oracle provider codes                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use prodmatch_config::ConfigError;
use prodmatch_matcher::MatchError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
/// Individual oracle failures do not change this; they are recorded per row.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing config file, no session to report on.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Data (3-9)
// =============================================================================

/// Records, catalog, prior output or settings file is not valid.
pub const EXIT_INPUT_PARSE: u8 = 3;

/// A file could not be read or written.
pub const EXIT_IO: u8 = 4;

// =============================================================================
// Oracle (10-19)
// =============================================================================

/// No API key in the keychain or environment.
pub const EXIT_ORACLE_MISSING_KEY: u8 = 10;

/// Map an engine error to its exit code.
pub fn match_exit_code(err: &MatchError) -> u8 {
    match err {
        MatchError::Parse { .. } => EXIT_INPUT_PARSE,
        MatchError::Read { .. } | MatchError::Write { .. } | MatchError::Encode(_) => EXIT_IO,
    }
}

/// Map a settings error to its exit code.
pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::Read { .. } => EXIT_USAGE,
        ConfigError::Parse(_) | ConfigError::Invalid(_) => EXIT_INPUT_PARSE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_errors_are_distinct_from_io() {
        let parse = MatchError::Parse { path: PathBuf::from("a.json"), message: "eof".into() };
        let read = MatchError::Read { path: PathBuf::from("a.json"), message: "missing".into() };
        assert_eq!(match_exit_code(&parse), EXIT_INPUT_PARSE);
        assert_eq!(match_exit_code(&read), EXIT_IO);
    }

    #[test]
    fn missing_config_is_usage() {
        let err = ConfigError::Read { path: PathBuf::from("x.toml"), message: "nope".into() };
        assert_eq!(config_exit_code(&err), EXIT_USAGE);
        assert_eq!(config_exit_code(&ConfigError::Invalid("bad".into())), EXIT_INPUT_PARSE);
    }

    #[test]
    fn codes_are_unique() {
        let codes = [EXIT_SUCCESS, EXIT_ERROR, EXIT_USAGE, EXIT_INPUT_PARSE, EXIT_IO, EXIT_ORACLE_MISSING_KEY];
        let mut seen = std::collections::HashSet::new();
        for code in codes {
            assert!(seen.insert(code), "duplicate exit code {code}");
        }
    }
}
