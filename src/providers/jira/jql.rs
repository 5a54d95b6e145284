use std::fmt;

use crate::error::{DefectLensError, Result};

/// Issue types the dashboard can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    All,
    Bug,
    Task,
}

impl TypeFilter {
    /// Exact, case-sensitive match on the query parameter value.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "All" => Some(Self::All),
            "Bug" => Some(Self::Bug),
            "Task" => Some(Self::Task),
            _ => None,
        }
    }

    /// Same as [`TypeFilter::parse`] but anything unrecognized becomes Bug.
    pub fn from_param(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::Bug)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Bug => "Bug",
            Self::Task => "Task",
        }
    }

    pub fn clause(self) -> &'static str {
        match self {
            Self::All => "type IN (Bug, Task)",
            Self::Bug => "type = Bug",
            Self::Task => "type = Task",
        }
    }
}

/// A clause ANDed onto the base query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Trusted text appended verbatim (fixed time windows, the `time` parameter).
    Raw(String),
    /// Caller-supplied JQL, wrapped in parentheses so its ORs stay local.
    Grouped(String),
}

impl Clause {
    pub fn created_between(start: &str, end: &str) -> Self {
        Self::Raw(format!(
            "created >= {} AND created < {}",
            escape_literal(start),
            escape_literal(end)
        ))
    }

    pub fn changed_to_between(status: &str, start: &str, end: &str) -> Self {
        Self::Raw(format!(
            "status CHANGED TO {} AFTER {} BEFORE {}",
            escape_literal(status),
            escape_literal(start),
            escape_literal(end)
        ))
    }

    pub fn changed_to(status: &str, time_condition: &str) -> Self {
        Self::Grouped(format!(
            "status CHANGED TO {} {time_condition}",
            escape_literal(status)
        ))
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(text) => f.write_str(text),
            Self::Grouped(text) => write!(f, "({text})"),
        }
    }
}

/// Immutable JQL query value.
///
/// Rendering order is fixed: project, issue type, optional status, then extra
/// clauses in insertion order, all joined with `AND`.
///
/// # Example
/// ```
/// use defectlens::providers::jira::{Clause, JqlQuery, TypeFilter};
///
/// let jql = JqlQuery::new("S2SWFE", TypeFilter::Bug)
///     .with_status("To Do")
///     .and(Clause::Grouped("duedate is EMPTY".to_string()));
///
/// assert_eq!(
///     jql.to_string(),
///     r#"project = "S2SWFE" AND type = Bug AND status = "To Do" AND (duedate is EMPTY)"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JqlQuery {
    project_key: String,
    type_filter: TypeFilter,
    status: Option<String>,
    clauses: Vec<Clause>,
}

impl JqlQuery {
    pub fn new(project_key: &str, type_filter: TypeFilter) -> Self {
        Self {
            project_key: project_key.to_string(),
            type_filter,
            status: None,
            clauses: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    #[must_use]
    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }
}

impl fmt::Display for JqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "project = {} AND {}",
            escape_literal(&self.project_key),
            self.type_filter.clause()
        )?;
        if let Some(status) = &self.status {
            write!(f, " AND status = {}", escape_literal(status))?;
        }
        for clause in &self.clauses {
            write!(f, " AND {clause}")?;
        }
        Ok(())
    }
}

/// Quotes a value as a JQL string literal.
pub fn escape_literal(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

pub fn type_clause(type_filter: &str) -> &'static str {
    TypeFilter::from_param(type_filter).clause()
}

/// Project and type scope, plus the status when one is given.
pub fn base_jql(project_key: &str, type_filter: TypeFilter, status: Option<&str>) -> String {
    let query = JqlQuery::new(project_key, type_filter);
    match status {
        Some(status) if !status.is_empty() => query.with_status(status).to_string(),
        _ => query.to_string(),
    }
}

pub fn with_extra_clauses(base: &str, clauses: &[Clause]) -> String {
    clauses
        .iter()
        .fold(base.to_string(), |jql, clause| format!("{jql} AND {clause}"))
}

/// Checks that a free-form fragment keeps its parentheses and string literals
/// balanced, so it cannot close the group it is wrapped in. JQL strings may be
/// single or double quoted; parentheses inside either do not count.
pub fn validate_fragment(name: &str, fragment: &str) -> Result<()> {
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in fragment.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some(_), '\\') => escaped = true,
            (Some(open), ch) if ch == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            (None, _) => {}
        }
    }

    if quote.is_some() || depth != 0 {
        return Err(DefectLensError::InvalidInput(format!(
            "Parameter '{name}' must have balanced parentheses and quotes"
        )));
    }
    Ok(())
}
