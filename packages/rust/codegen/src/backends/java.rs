//! Java sources for every declaration in the graph, archived as a jar.

use std::collections::BTreeSet;
use std::path::PathBuf;

use modelpub_artifacts::{ArchivingSink, FileSink};
use modelpub_model::{DeclKind, Declaration, Member};
use modelpub_shared::{FormatTag, Result};

use crate::emitter::{EmitContext, Emitter, Scope};
use crate::naming::{capitalize, namespace_path};

pub struct JavaEmitter;

impl Emitter for JavaEmitter {
    fn format(&self) -> FormatTag {
        FormatTag::Java
    }

    fn scope(&self) -> Scope {
        Scope::Graph
    }

    fn destination(&self, ctx: &EmitContext<'_>) -> PathBuf {
        ctx.dest_dir.join(format!("{}.jar", ctx.base_name))
    }

    fn sink(&self, ctx: &EmitContext<'_>) -> Box<dyn FileSink> {
        Box::new(ArchivingSink::new(self.destination(ctx)))
    }

    fn generate(&self, ctx: &EmitContext<'_>, sink: &mut dyn FileSink) -> Result<()> {
        for registered in ctx.models(self.scope())? {
            let ns = registered.file.namespace.as_str();
            for decl in &registered.file.declarations {
                let text = match decl.kind {
                    DeclKind::Enum => enum_source(ns, decl),
                    _ => class_source(ctx, ns, decl)?,
                };
                let name = format!("{}/{}.java", namespace_path(ns), decl.name);
                sink.write_file(&name, &text)?;
            }
        }
        Ok(())
    }
}

fn header(ns: &str) -> String {
    format!("// Generated code. Do not edit.\npackage {ns};\n\n")
}

fn enum_source(ns: &str, decl: &Declaration) -> String {
    let mut out = header(ns);
    out.push_str(&format!("public enum {} {{\n", decl.name));
    for value in &decl.values {
        out.push_str(&format!("   {value},\n"));
    }
    out.push_str("}\n");
    out
}

fn class_source(ctx: &EmitContext<'_>, ns: &str, decl: &Declaration) -> Result<String> {
    let mut imports = BTreeSet::new();

    let extends = match ctx.super_type(ns, decl)? {
        Some(parent) => {
            if parent.namespace() != ns {
                imports.insert(parent.fqn());
            }
            format!(" extends {}", parent.decl.name)
        }
        None => String::new(),
    };

    let mut fields = String::new();
    let mut accessors = String::new();
    for member in &decl.members {
        let ty = java_type(ctx, ns, member, &mut imports)?;
        let getter = capitalize(&member.name);
        fields.push_str(&format!("   private {ty} {};\n", member.name));
        accessors.push_str(&format!(
            "   public {ty} get{getter}() {{\n      return this.{name};\n   }}\n\
             \x20  public void set{getter}({ty} {name}) {{\n      this.{name} = {name};\n   }}\n",
            name = member.name
        ));
    }

    let mut out = header(ns);
    for import in &imports {
        out.push_str(&format!("import {import};\n"));
    }
    if !imports.is_empty() {
        out.push('\n');
    }
    if let Some(doc) = &decl.doc {
        out.push_str(&format!("/** {doc} */\n"));
    }
    let modifier = if decl.is_abstract { "public abstract" } else { "public" };
    out.push_str(&format!("{modifier} class {}{extends} {{\n", decl.name));
    out.push_str(&fields);
    if !accessors.is_empty() {
        out.push('\n');
        out.push_str(&accessors);
    }
    out.push_str("}\n");
    Ok(out)
}

fn java_type(
    ctx: &EmitContext<'_>,
    ns: &str,
    member: &Member,
    imports: &mut BTreeSet<String>,
) -> Result<String> {
    let base = match member.type_name.as_str() {
        "String" => "String".to_string(),
        "Boolean" => "Boolean".to_string(),
        "DateTime" => {
            imports.insert("java.util.Date".into());
            "Date".to_string()
        }
        "Integer" => "Integer".to_string(),
        "Long" => "Long".to_string(),
        "Double" => "Double".to_string(),
        other => {
            let target = ctx.resolve(ns, other)?;
            if target.namespace() != ns {
                imports.insert(target.fqn());
            }
            target.decl.name.clone()
        }
    };
    Ok(if member.is_array { format!("{base}[]") } else { base })
}
