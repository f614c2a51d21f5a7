use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ProjectId
// ---------------------------------------------------------------------------

/// Server-assigned project identifier. The API has handed out both integer
/// and string ids, so both shapes are accepted on the wire.
///
/// Integers order numerically and sort before all string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectId::Int(n) => write!(f, "{n}"),
            ProjectId::Text(s) => f.write_str(s),
        }
    }
}

impl std::str::FromStr for ProjectId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<i64>() {
            Ok(n) => ProjectId::Int(n),
            Err(_) => ProjectId::Text(s.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// ToolId
// ---------------------------------------------------------------------------

/// The nine AI-backed tools exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolId {
    #[serde(rename = "design")]
    ArchitectureGenerator,
    #[serde(rename = "tradeoff")]
    TradeoffAnalyzer,
    #[serde(rename = "techstack")]
    TechStackSelector,
    #[serde(rename = "review")]
    DesignReviewer,
    #[serde(rename = "risk")]
    RiskScanner,
    #[serde(rename = "compliance")]
    ComplianceAuditor,
    #[serde(rename = "testcases")]
    TestCaseBuilder,
    #[serde(rename = "codegen")]
    CodegenAssistant,
    #[serde(rename = "debug")]
    SmartDebugger,
}

impl ToolId {
    pub fn all() -> &'static [ToolId] {
        &[
            ToolId::ArchitectureGenerator,
            ToolId::TradeoffAnalyzer,
            ToolId::TechStackSelector,
            ToolId::DesignReviewer,
            ToolId::RiskScanner,
            ToolId::ComplianceAuditor,
            ToolId::TestCaseBuilder,
            ToolId::CodegenAssistant,
            ToolId::SmartDebugger,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolId::ArchitectureGenerator => "design",
            ToolId::TradeoffAnalyzer => "tradeoff",
            ToolId::TechStackSelector => "techstack",
            ToolId::DesignReviewer => "review",
            ToolId::RiskScanner => "risk",
            ToolId::ComplianceAuditor => "compliance",
            ToolId::TestCaseBuilder => "testcases",
            ToolId::CodegenAssistant => "codegen",
            ToolId::SmartDebugger => "debug",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ToolId::ArchitectureGenerator => "Architecture Generator",
            ToolId::TradeoffAnalyzer => "Trade-off Analyzer",
            ToolId::TechStackSelector => "Stack Selector",
            ToolId::DesignReviewer => "Design Reviewer",
            ToolId::RiskScanner => "Risk Scanner",
            ToolId::ComplianceAuditor => "Compliance Auditor",
            ToolId::TestCaseBuilder => "Test Case Builder",
            ToolId::CodegenAssistant => "Boilerplate Assistant",
            ToolId::SmartDebugger => "Smart Debugger",
        }
    }

    /// API path (relative to the base URL) the tool is invoked on.
    pub fn endpoint(self) -> String {
        format!("/{}/", self.as_str())
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolId {
    type Err = crate::error::SdlcaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolId::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| crate::error::SdlcaiError::UnknownTool(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
