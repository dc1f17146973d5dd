//! CLI Exit Code Registry
//!
//! Single source of truth for all `scancount` exit codes. Scripts rely on
//! them, so codes are never reused for a different meaning.
//!
//! | Code | Command | Description                                   |
//! |------|---------|-----------------------------------------------|
//! | 0    | all     | Success                                       |
//! | 1    | all     | General error (unspecified)                   |
//! | 2    | all     | Usage error (bad args, unreadable file)       |
//! | 3    | decode  | Payload carries no identifying field          |
//! | 4    | run     | `--strict` and not every article is complete  |
//! | 5    | all     | Article list could not be imported            |
//! | 6    | all     | Invalid config file                           |
//! | 7    | run     | Malformed session file                        |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing or unreadable input file.
pub const EXIT_USAGE: u8 = 2;

/// `decode`: neither LOT, REF nor GTIN could be extracted.
pub const EXIT_DECODE_NO_IDENTITY: u8 = 3;

/// `run --strict`: at least one article is not complete after the session.
pub const EXIT_RUN_INCOMPLETE: u8 = 4;

/// Article list rejected (CSV error, bad count, negative count).
pub const EXIT_IMPORT: u8 = 5;

/// Config file failed to parse or validate.
pub const EXIT_CONFIG: u8 = 6;

/// Session file has a directive that cannot be parsed.
pub const EXIT_SESSION_PARSE: u8 = 7;
