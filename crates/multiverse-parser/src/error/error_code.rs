//! Error codes for the multiverse diagnostic system.
//!
//! Error codes are organized by kind:
//! - `E0xx` - Syntax errors
//! - `E1xx` - Reference errors
//! - `E2xx` - Structural errors
//! - `E3xx` - Flow graph problems
//! - `E4xx` - Constraint shape errors
//! - `E5xx` - Sampling errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Syntax Errors (E0xx)
    // =========================================================================
    /// Malformed block marker.
    ///
    /// A line starting with `# ---` is not of the form
    /// `# --- (id) [option] [@if condition]`.
    E001,

    /// Malformed placeholder.
    ///
    /// The options of an inline definition `{{name=...}}` are not a valid,
    /// non-empty list of values.
    E002,

    /// Malformed condition.
    E003,

    /// Malformed graph edge chain.
    E004,

    /// Malformed specification document.
    E005,

    /// Unterminated configuration block.
    ///
    /// A `# --- (MULTIVERSE_CONFIG)` line has no matching `# --- (END)`.
    E006,

    // =========================================================================
    // Reference Errors (E1xx)
    // =========================================================================
    /// Undefined decision.
    E100,

    /// Undefined block.
    E101,

    /// Undefined option.
    E102,

    // =========================================================================
    // Structural Errors (E2xx)
    // =========================================================================
    /// Duplicate block.
    E200,

    /// Duplicate decision.
    E201,

    /// Decision name collides with a block or graph node.
    E202,

    /// Specification supplied both in the template and out of band.
    E203,

    // =========================================================================
    // Flow Graph (E3xx)
    // =========================================================================
    /// Graph node without a matching block (warning).
    E300,

    /// Block missing from the explicit graph (warning).
    E301,

    /// Flow graph has no source node.
    E302,

    /// Flow graph has no sink node.
    E303,

    /// Flow graph contains a cycle.
    E304,

    // =========================================================================
    // Constraint Shape (E4xx)
    // =========================================================================
    /// Invalid combination of constraint fields.
    E400,

    /// Linked decisions have different numbers of options.
    E401,

    // =========================================================================
    // Sampling (E5xx)
    // =========================================================================
    /// Invalid or missing sampling parameters.
    E500,

    /// Unknown distribution.
    E501,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E400 => "E400",
            ErrorCode::E401 => "E401",
            ErrorCode::E500 => "E500",
            ErrorCode::E501 => "E501",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "malformed block marker",
            ErrorCode::E002 => "malformed placeholder",
            ErrorCode::E003 => "malformed condition",
            ErrorCode::E004 => "malformed graph edge",
            ErrorCode::E005 => "malformed specification",
            ErrorCode::E006 => "unterminated configuration block",
            ErrorCode::E100 => "undefined decision",
            ErrorCode::E101 => "undefined block",
            ErrorCode::E102 => "undefined option",
            ErrorCode::E200 => "duplicate block",
            ErrorCode::E201 => "duplicate decision",
            ErrorCode::E202 => "name collision",
            ErrorCode::E203 => "specification supplied twice",
            ErrorCode::E300 => "graph node without block",
            ErrorCode::E301 => "block missing from graph",
            ErrorCode::E302 => "no source node",
            ErrorCode::E303 => "no sink node",
            ErrorCode::E304 => "cyclic flow graph",
            ErrorCode::E400 => "invalid constraint",
            ErrorCode::E401 => "link mismatch",
            ErrorCode::E500 => "invalid sampling parameters",
            ErrorCode::E501 => "unknown distribution",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
