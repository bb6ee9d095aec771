//! The model graph: one file's model plus everything it depends on.
//!
//! A graph is built fresh for every source file. It always starts with the
//! system base model, then the file itself, then any models pulled in while
//! resolving external imports. Namespaces are kept in a `BTreeMap` so every
//! traversal is deterministic.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use modelpub_shared::{ModelPubError, RejectionReason, Result};

use crate::ast::{Declaration, Import, Member, ModelFile, is_primitive};
use crate::parser::parse_model;
use crate::system::SYSTEM_MODEL_NAME;
use crate::validate;

/// A model registered in the graph.
#[derive(Debug, Clone)]
pub struct RegisteredModel {
    /// Registration name (file name or URL).
    pub name: String,
    /// Parsed model.
    pub file: ModelFile,
    /// Whether this is the trusted system base model.
    pub system: bool,
}

/// A declaration resolved somewhere in the graph.
#[derive(Debug, Clone, Copy)]
pub struct TypeRef<'g> {
    pub model: &'g ModelFile,
    pub decl: &'g Declaration,
}

impl TypeRef<'_> {
    /// Bare namespace of the declaring model.
    pub fn namespace(&self) -> &str {
        &self.model.namespace
    }

    /// Fully qualified name, `namespace.Name`.
    pub fn fqn(&self) -> String {
        format!("{}.{}", self.model.namespace, self.decl.name)
    }
}

/// The validated, linked representation of a model and its dependencies.
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    models: BTreeMap<String, RegisteredModel>,
    system_namespace: Option<String>,
}

impl ModelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the trusted system base model. It is parsed but not validated.
    pub fn add_system_model(&mut self, text: &str) -> Result<()> {
        let file = parse_model(text)?;
        let namespace = file.namespace.clone();
        self.insert(SYSTEM_MODEL_NAME, file, true)?;
        self.system_namespace = Some(namespace);
        Ok(())
    }

    /// Parse and register a model under `name`, validating it when asked.
    pub fn add_model(&mut self, text: &str, name: &str, validate: bool) -> Result<&ModelFile> {
        let file = parse_model(text)?;
        if validate {
            validate::check(&file, &self.implicit_types())?;
        }
        let namespace = file.namespace.clone();
        self.insert(name, file, false)?;
        debug!(%namespace, name, "model registered");
        self.models
            .get(&namespace)
            .map(|m| &m.file)
            .ok_or_else(|| ModelPubError::validation(format!("namespace {namespace} vanished")))
    }

    fn insert(&mut self, name: &str, file: ModelFile, system: bool) -> Result<()> {
        if let Some(existing) = self.models.get(&file.namespace) {
            return Err(ModelPubError::validation(format!(
                "namespace {} from {name} is already registered by {}",
                file.namespace, existing.name
            )));
        }
        self.models.insert(
            file.namespace.clone(),
            RegisteredModel {
                name: name.to_string(),
                file,
                system,
            },
        );
        Ok(())
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.models.contains_key(namespace)
    }

    pub fn get(&self, namespace: &str) -> Option<&RegisteredModel> {
        self.models.get(namespace)
    }

    /// All registered models in namespace order.
    pub fn models(&self) -> impl Iterator<Item = &RegisteredModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn system_namespace(&self) -> Option<&str> {
        self.system_namespace.as_deref()
    }

    /// Names of the system declarations, visible everywhere without import.
    pub fn implicit_types(&self) -> Vec<String> {
        self.system_namespace
            .as_deref()
            .and_then(|ns| self.models.get(ns))
            .map(|m| m.file.declarations.iter().map(|d| d.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Imports naming a namespace that is not yet in the graph, one per namespace.
    pub fn missing_imports(&self) -> Vec<Import> {
        let mut seen = HashSet::new();
        self.models
            .values()
            .flat_map(|m| m.file.imports.iter())
            .filter(|i| !self.models.contains_key(&i.namespace))
            .filter(|i| seen.insert(i.namespace.clone()))
            .cloned()
            .collect()
    }

    /// Resolve a type name as seen from inside `from_namespace`.
    ///
    /// Lookup order: fully qualified name, local declaration, explicit
    /// import, wildcard import, system base model.
    pub fn resolve(&self, from_namespace: &str, type_name: &str) -> Option<TypeRef<'_>> {
        if let Some((ns, short)) = type_name.rsplit_once('.') {
            return self.lookup(ns, short);
        }

        let model = &self.models.get(from_namespace)?.file;
        if let Some(decl) = model.declaration(type_name) {
            return Some(TypeRef { model, decl });
        }

        if let Some(found) = model
            .imports
            .iter()
            .filter(|i| i.names_type(type_name))
            .find_map(|i| self.lookup(&i.namespace, type_name))
        {
            return Some(found);
        }

        if let Some(found) = model
            .imports
            .iter()
            .filter(|i| i.is_wildcard())
            .find_map(|i| self.lookup(&i.namespace, type_name))
        {
            return Some(found);
        }

        self.system_namespace
            .as_deref()
            .and_then(|ns| self.lookup(ns, type_name))
    }

    fn lookup(&self, namespace: &str, name: &str) -> Option<TypeRef<'_>> {
        let model = &self.models.get(namespace)?.file;
        let decl = model.declaration(name)?;
        Some(TypeRef { model, decl })
    }

    /// Name of the supertype of `decl`, explicit or implied by its kind.
    pub fn super_type_name(&self, namespace: &str, decl: &Declaration) -> Option<String> {
        if let Some(explicit) = &decl.super_type {
            return Some(explicit.clone());
        }
        if self.system_namespace.as_deref() == Some(namespace) {
            return None;
        }
        let implicit = decl.kind.system_super_type()?;
        // Only implied when the system model actually declares it.
        self.system_namespace
            .as_deref()
            .and_then(|ns| self.lookup(ns, implicit))
            .map(|_| implicit.to_string())
    }

    /// Resolve the supertype of `decl`. `Some(Err(name))` means the supertype
    /// is named but cannot be found.
    pub fn super_type<'g>(
        &'g self,
        namespace: &str,
        decl: &Declaration,
    ) -> Option<std::result::Result<TypeRef<'g>, String>> {
        let name = self.super_type_name(namespace, decl)?;
        Some(self.resolve(namespace, &name).ok_or(name))
    }

    /// All members of `decl`, inherited ones first.
    pub fn all_members<'g>(
        &'g self,
        namespace: &str,
        decl: &'g Declaration,
    ) -> Vec<&'g Member> {
        let mut chain = vec![decl];
        let mut current_ns = namespace.to_string();
        let mut current = decl;
        let mut visited = HashSet::new();
        while let Some(Ok(parent)) = self.super_type(&current_ns, current) {
            if !visited.insert(parent.fqn()) {
                break;
            }
            chain.push(parent.decl);
            current_ns = parent.namespace().to_string();
            current = parent.decl;
        }
        chain.into_iter().rev().flat_map(|d| d.members.iter()).collect()
    }

    /// Check that every inheritance chain terminates. Unresolvable supertypes
    /// end a chain without error; use [`link`](Self::link) to reject those.
    pub fn check_inheritance(&self) -> std::result::Result<(), RejectionReason> {
        for model in self.models.values() {
            for decl in &model.file.declarations {
                let mut visited = HashSet::new();
                visited.insert(format!("{}.{}", model.file.namespace, decl.name));
                let mut ns = model.file.namespace.clone();
                let mut current = decl;
                while let Some(Ok(parent)) = self.super_type(&ns, current) {
                    if !visited.insert(parent.fqn()) {
                        return Err(RejectionReason::Structure(format!(
                            "inheritance cycle involving {}.{}",
                            model.file.namespace, decl.name
                        )));
                    }
                    ns = parent.namespace().to_string();
                    current = parent.decl;
                }
            }
        }
        Ok(())
    }

    /// Verify the graph is fully linked: every import is present, every
    /// referenced type resolves, and inheritance is acyclic.
    pub fn link(&self) -> std::result::Result<(), RejectionReason> {
        for model in self.models.values() {
            let ns = &model.file.namespace;

            for import in &model.file.imports {
                let Some(target) = self.models.get(&import.namespace) else {
                    return Err(RejectionReason::Unresolved {
                        namespace: import.namespace.clone(),
                        message: format!("imported by {ns} but not available"),
                    });
                };
                if let crate::ast::ImportNames::Types(types) = &import.names {
                    if let Some(missing) =
                        types.iter().find(|t| target.file.declaration(t).is_none())
                    {
                        return Err(RejectionReason::Unresolved {
                            namespace: import.namespace.clone(),
                            message: format!("does not declare {missing}"),
                        });
                    }
                }
            }

            for decl in &model.file.declarations {
                if let Some(Err(name)) = self.super_type(ns, decl) {
                    return Err(RejectionReason::Unresolved {
                        namespace: ns.clone(),
                        message: format!("{} extends unknown type {name}", decl.name),
                    });
                }
                for member in &decl.members {
                    if !is_primitive(&member.type_name)
                        && self.resolve(ns, &member.type_name).is_none()
                    {
                        return Err(RejectionReason::Unresolved {
                            namespace: ns.clone(),
                            message: format!(
                                "{}.{} has unknown type {}",
                                decl.name, member.name, member.type_name
                            ),
                        });
                    }
                }
            }
        }

        self.check_inheritance()?;
        self.check_identifiers()
    }

    fn check_identifiers(&self) -> std::result::Result<(), RejectionReason> {
        for model in self.models.values() {
            let ns = &model.file.namespace;
            for decl in &model.file.declarations {
                let crate::ast::Identified::By(field) = &decl.identified else {
                    continue;
                };
                let found = self
                    .all_members(ns, decl)
                    .into_iter()
                    .any(|m| &m.name == field && m.type_name == "String" && !m.is_array);
                if !found {
                    return Err(RejectionReason::Structure(format!(
                        "{ns}.{} is identified by '{field}', which is not an inherited String property",
                        decl.name
                    )));
                }
            }
        }
        Ok(())
    }
}
