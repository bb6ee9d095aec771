//! Structural validation of a single model file.
//!
//! Checks the rules that can be decided from the file alone plus the set of
//! implicitly visible system types. Cross-namespace checks happen when the
//! graph is linked (see [`crate::graph::ModelGraph::link`]).

use std::collections::HashSet;

use modelpub_shared::{ModelPubError, Result};

use crate::ast::{DeclKind, Declaration, Identified, ModelFile, is_primitive};

/// A single structural problem found in a model file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Human-readable description of the problem.
    pub message: String,
    /// Source line the problem was found on.
    pub line: usize,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Validate a model file and return all problems found.
///
/// `implicit` lists type names visible without an import (the system base
/// model's declarations). An empty `Vec` means the file is structurally sound.
pub fn validate(model: &ModelFile, implicit: &[String]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_duplicates(model, &mut issues);

    let scope = Scope::new(model, implicit);
    for decl in &model.declarations {
        check_declaration(decl, &scope, &mut issues);
    }

    issues
}

/// Validate and convert any problems into a single [`ModelPubError`].
pub fn check(model: &ModelFile, implicit: &[String]) -> Result<()> {
    let issues = validate(model, implicit);
    if issues.is_empty() {
        return Ok(());
    }
    let message = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(ModelPubError::validation(format!(
        "{}: {message}",
        model.qualified_namespace()
    )))
}

/// Names resolvable from inside one file without consulting the graph.
struct Scope<'a> {
    local: HashSet<&'a str>,
    imported: HashSet<&'a str>,
    implicit: &'a [String],
    has_wildcard: bool,
}

impl<'a> Scope<'a> {
    fn new(model: &'a ModelFile, implicit: &'a [String]) -> Self {
        let local = model.declarations.iter().map(|d| d.name.as_str()).collect();
        let mut imported = HashSet::new();
        let mut has_wildcard = false;
        for import in &model.imports {
            match &import.names {
                crate::ast::ImportNames::All => has_wildcard = true,
                crate::ast::ImportNames::Types(types) => {
                    imported.extend(types.iter().map(String::as_str));
                }
            }
        }
        Self {
            local,
            imported,
            implicit,
            has_wildcard,
        }
    }

    /// Whether `name` could refer to a declared type. Names that may come
    /// from a wildcard import are accepted here and checked at link time.
    fn knows(&self, name: &str) -> bool {
        let short = name.rsplit('.').next().unwrap_or(name);
        self.local.contains(short)
            || self.imported.contains(short)
            || self.implicit.iter().any(|t| t == short)
            || self.has_wildcard
    }
}

fn check_duplicates(model: &ModelFile, issues: &mut Vec<ValidationIssue>) {
    let mut seen = HashSet::new();
    for decl in &model.declarations {
        if !seen.insert(decl.name.as_str()) {
            issues.push(ValidationIssue {
                message: format!("duplicate declaration '{}'", decl.name),
                line: decl.line,
            });
        }
    }

    let mut imported = HashSet::new();
    for import in &model.imports {
        if let crate::ast::ImportNames::Types(types) = &import.names {
            for t in types {
                if seen.contains(t.as_str()) {
                    issues.push(ValidationIssue {
                        message: format!("imported type '{t}' clashes with a local declaration"),
                        line: import.line,
                    });
                }
                if !imported.insert(t.as_str()) {
                    issues.push(ValidationIssue {
                        message: format!("type '{t}' is imported more than once"),
                        line: import.line,
                    });
                }
            }
        }
    }
}

fn check_declaration(decl: &Declaration, scope: &Scope<'_>, issues: &mut Vec<ValidationIssue>) {
    let mut push = |message: String, line: usize| issues.push(ValidationIssue { message, line });

    if let Some(sup) = &decl.super_type {
        if sup == &decl.name {
            push(format!("'{}' cannot extend itself", decl.name), decl.line);
        } else if decl.kind == DeclKind::Enum {
            push(format!("enum '{}' cannot extend another type", decl.name), decl.line);
        } else if is_primitive(sup) || !scope.knows(sup) {
            push(
                format!("'{}' extends undeclared type '{sup}'", decl.name),
                decl.line,
            );
        }
    }

    if decl.kind == DeclKind::Enum {
        let mut seen = HashSet::new();
        for value in &decl.values {
            if !seen.insert(value.as_str()) {
                push(
                    format!("enum '{}' declares '{value}' more than once", decl.name),
                    decl.line,
                );
            }
        }
        return;
    }

    let mut seen = HashSet::new();
    for member in &decl.members {
        if !seen.insert(member.name.as_str()) {
            push(
                format!("'{}' declares member '{}' more than once", decl.name, member.name),
                member.line,
            );
        }
        if !is_primitive(&member.type_name) && !scope.knows(&member.type_name) {
            push(
                format!(
                    "member '{}.{}' has undeclared type '{}'",
                    decl.name, member.name, member.type_name
                ),
                member.line,
            );
        }
        if member.relationship && is_primitive(&member.type_name) {
            push(
                format!(
                    "relationship '{}.{}' must target a declared type, not '{}'",
                    decl.name, member.name, member.type_name
                ),
                member.line,
            );
        }
    }

    if let Identified::By(field) = &decl.identified {
        match decl.members.iter().find(|m| &m.name == field) {
            Some(m) if m.type_name == "String" && !m.is_array && !m.relationship => {}
            Some(_) => push(
                format!(
                    "identifying field '{}.{field}' must be a single String property",
                    decl.name
                ),
                decl.line,
            ),
            // Might be inherited; resolved against the supertype chain when linking.
            None if decl.super_type.is_some() => {}
            None => push(
                format!("'{}' is identified by unknown field '{field}'", decl.name),
                decl.line,
            ),
        }
    }
}
