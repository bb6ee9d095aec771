//! Go sources, one package per namespace in the graph, archived.

use std::collections::BTreeMap;
use std::path::PathBuf;

use modelpub_artifacts::{ArchivingSink, FileSink};
use modelpub_model::{DeclKind, Declaration, Member, ModelFile};
use modelpub_shared::{FormatTag, Result};

use crate::emitter::{EmitContext, Emitter, Scope};
use crate::naming::{capitalize, go_package, namespace_path};

pub struct GoEmitter;

impl Emitter for GoEmitter {
    fn format(&self) -> FormatTag {
        FormatTag::Go
    }

    fn scope(&self) -> Scope {
        Scope::Graph
    }

    fn destination(&self, ctx: &EmitContext<'_>) -> PathBuf {
        ctx.dest_dir.join(format!("{}.go.zip", ctx.base_name))
    }

    fn sink(&self, ctx: &EmitContext<'_>) -> Box<dyn FileSink> {
        Box::new(ArchivingSink::new(self.destination(ctx)))
    }

    fn generate(&self, ctx: &EmitContext<'_>, sink: &mut dyn FileSink) -> Result<()> {
        for registered in ctx.models(self.scope())? {
            let model = &registered.file;
            if model.declarations.is_empty() {
                continue;
            }
            let name = format!(
                "{}/{}.go",
                namespace_path(&model.namespace),
                go_package(&model.namespace)
            );
            sink.write_file(&name, &package_source(ctx, model)?)?;
        }
        Ok(())
    }
}

fn package_source(ctx: &EmitContext<'_>, model: &ModelFile) -> Result<String> {
    let ns = model.namespace.as_str();
    // package name -> import path
    let mut imports: BTreeMap<String, String> = BTreeMap::new();
    let mut body = String::new();

    for decl in &model.declarations {
        body.push('\n');
        if let Some(doc) = &decl.doc {
            body.push_str(&format!("// {} {doc}\n", decl.name));
        }
        match decl.kind {
            DeclKind::Enum => body.push_str(&enum_source(decl)),
            _ => body.push_str(&struct_source(ctx, ns, decl, &mut imports)?),
        }
    }

    let package = go_package(ns);
    let mut out = format!(
        "// Package {package} was generated from {}. Do not edit.\npackage {package}\n",
        model.qualified_namespace()
    );
    if !imports.is_empty() {
        out.push_str("\nimport (\n");
        for (name, path) in &imports {
            if name == path {
                out.push_str(&format!("\t\"{path}\"\n"));
            } else {
                out.push_str(&format!("\t{name} \"{path}\"\n"));
            }
        }
        out.push_str(")\n");
    }
    out.push_str(&body);
    Ok(out)
}

fn enum_source(decl: &Declaration) -> String {
    let name = &decl.name;
    let mut out = format!("type {name} int\n\nconst (\n");
    for (i, value) in decl.values.iter().enumerate() {
        if i == 0 {
            out.push_str(&format!("\t{name}_{value} {name} = 1 + iota\n"));
        } else {
            out.push_str(&format!("\t{name}_{value}\n"));
        }
    }
    out.push_str(")\n");
    out
}

fn struct_source(
    ctx: &EmitContext<'_>,
    ns: &str,
    decl: &Declaration,
    imports: &mut BTreeMap<String, String>,
) -> Result<String> {
    let mut out = format!("type {} struct {{\n", decl.name);

    if let Some(parent) = ctx.super_type(ns, decl)? {
        let embedded = qualify(ns, parent.namespace(), &parent.decl.name, imports);
        out.push_str(&format!("\t{embedded}\n"));
    }

    for member in &decl.members {
        out.push_str(&format!(
            "\t{} {} `json:\"{}\"`\n",
            capitalize(&member.name),
            go_type(ctx, ns, member, imports)?,
            member.name
        ));
    }

    out.push_str("}\n");
    Ok(out)
}

/// Reference `name` declared in `target_ns` from package `ns`.
fn qualify(
    ns: &str,
    target_ns: &str,
    name: &str,
    imports: &mut BTreeMap<String, String>,
) -> String {
    if target_ns == ns {
        return name.to_string();
    }
    let package = go_package(target_ns);
    imports.insert(package.clone(), namespace_path(target_ns));
    format!("{package}.{name}")
}

fn go_type(
    ctx: &EmitContext<'_>,
    ns: &str,
    member: &Member,
    imports: &mut BTreeMap<String, String>,
) -> Result<String> {
    let base = match member.type_name.as_str() {
        "String" => "string".to_string(),
        "Boolean" => "bool".to_string(),
        "DateTime" => {
            imports.insert("time".into(), "time".into());
            "time.Time".to_string()
        }
        "Integer" => "int32".to_string(),
        "Long" => "int64".to_string(),
        "Double" => "float64".to_string(),
        other => {
            let target = ctx.resolve(ns, other)?;
            let name = qualify(ns, target.namespace(), &target.decl.name, imports);
            if member.relationship { format!("*{name}") } else { name }
        }
    };
    Ok(if member.is_array { format!("[]{base}") } else { base })
}
