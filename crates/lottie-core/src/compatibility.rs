use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CompileError, CompileResult};

/// How the compiler reacts to features the backend cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityMode {
    /// Collect the issue and keep compiling with an approximation.
    #[default]
    Track,
    /// Stop at the first issue.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompatibilityIssue {
    pub message: String,
    /// Dotted keypath of the node or property that raised the issue.
    pub context: String,
}

impl CompatibilityIssue {
    pub fn new(message: impl Into<String>, context: impl Into<String>) -> Self {
        let message = message
            .into()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        CompatibilityIssue {
            message,
            context: context.into(),
        }
    }
}

impl fmt::Display for CompatibilityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.context, self.message)
    }
}

/// Aggregates compatibility issues for one compilation pass.
#[derive(Debug, Default)]
pub struct CompatibilityTracker {
    mode: CompatibilityMode,
    issues: Vec<CompatibilityIssue>,
}

impl CompatibilityTracker {
    pub fn new(mode: CompatibilityMode) -> Self {
        CompatibilityTracker {
            mode,
            issues: Vec::new(),
        }
    }

    pub fn mode(&self) -> CompatibilityMode {
        self.mode
    }

    pub fn log_issue(
        &mut self,
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> CompileResult<()> {
        let issue = CompatibilityIssue::new(message, context);
        warn!(context = %issue.context, "{}", issue.message);

        match self.mode {
            CompatibilityMode::Abort => Err(CompileError::Compatibility(issue)),
            CompatibilityMode::Track => {
                if !self.issues.contains(&issue) {
                    self.issues.push(issue);
                }
                Ok(())
            }
        }
    }

    /// Logs `message` when `condition` does not hold.
    pub fn assert(
        &mut self,
        condition: bool,
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> CompileResult<()> {
        if condition {
            Ok(())
        } else {
            self.log_issue(message, context)
        }
    }

    pub fn issues(&self) -> &[CompatibilityIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<CompatibilityIssue> {
        self.issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_collapses_newlines() {
        let issue = CompatibilityIssue::new("first line\n    second line", "Layer");
        assert_eq!(issue.to_string(), "[Layer] first line second line");
    }

    #[test]
    fn track_mode_collects_unique_issues() {
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Track);
        tracker.log_issue("unsupported", "A").unwrap();
        tracker.log_issue("unsupported", "A").unwrap();
        tracker.assert(true, "never logged", "B").unwrap();
        tracker.assert(false, "logged", "B").unwrap();
        assert_eq!(tracker.issues().len(), 2);
    }

    #[test]
    fn abort_mode_returns_error() {
        let mut tracker = CompatibilityTracker::new(CompatibilityMode::Abort);
        let err = tracker.log_issue("unsupported", "A").unwrap_err();
        assert!(matches!(err, CompileError::Compatibility(ref issue) if issue.context == "A"));
        assert!(tracker.issues().is_empty());
    }
}
