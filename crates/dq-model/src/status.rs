use std::fmt;

use serde::{Deserialize, Serialize};

/// Final state of a run, written to the status file and mapped to an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    ValidationPassed,
    ValidationFailed,
    ScriptFailed,
}

impl RunStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationPassed => "validation_passed",
            Self::ValidationFailed => "validation_failed",
            Self::ScriptFailed => "script_failed",
        }
    }

    /// 0 on pass, 1 when constraints failed, 2 when the run itself failed.
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::ValidationPassed => 0,
            Self::ValidationFailed => 1,
            Self::ScriptFailed => 2,
        }
    }

    pub const fn from_success(success: bool) -> Self {
        if success {
            Self::ValidationPassed
        } else {
            Self::ValidationFailed
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
