//! TypeScript interface stubs for the published file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use modelpub_artifacts::{DirectFileSink, FileSink};
use modelpub_model::{DeclKind, Declaration, Member, TypeRef};
use modelpub_shared::{FormatTag, Result};

use crate::emitter::{EmitContext, Emitter, Scope};

pub struct TypeScriptEmitter;

impl TypeScriptEmitter {
    fn file_name(ctx: &EmitContext<'_>) -> Result<String> {
        Ok(format!("{}.ts", ctx.model()?.file.qualified_namespace()))
    }
}

impl Emitter for TypeScriptEmitter {
    fn format(&self) -> FormatTag {
        FormatTag::TypeScript
    }

    fn scope(&self) -> Scope {
        Scope::File
    }

    fn destination(&self, ctx: &EmitContext<'_>) -> PathBuf {
        let name = Self::file_name(ctx).unwrap_or_else(|_| format!("{}.ts", ctx.namespace));
        ctx.dest_dir.join(name)
    }

    fn sink(&self, ctx: &EmitContext<'_>) -> Box<dyn FileSink> {
        Box::new(DirectFileSink::new(ctx.dest_dir))
    }

    fn generate(&self, ctx: &EmitContext<'_>, sink: &mut dyn FileSink) -> Result<()> {
        let text = render(ctx)?;
        sink.write_file(&Self::file_name(ctx)?, &text)
    }
}

/// Imported names, grouped by the module they come from.
#[derive(Default)]
struct Imports(BTreeMap<String, BTreeSet<String>>);

impl Imports {
    fn note(&mut self, ns: &str, target: &TypeRef<'_>, name: String) {
        if target.namespace() != ns {
            self.0
                .entry(target.model.qualified_namespace())
                .or_default()
                .insert(name);
        }
    }
}

fn render(ctx: &EmitContext<'_>) -> Result<String> {
    let model = &ctx.model()?.file;
    let ns = model.namespace.as_str();
    let mut imports = Imports::default();
    let mut body = String::new();

    for decl in &model.declarations {
        if let Some(doc) = &decl.doc {
            body.push_str(&format!("/** {doc} */\n"));
        }
        if decl.kind == DeclKind::Enum {
            body.push_str(&format!("export enum {} {{\n", decl.name));
            for value in &decl.values {
                body.push_str(&format!("   {value} = '{value}',\n"));
            }
            body.push_str("}\n\n");
            continue;
        }
        body.push_str(&interface(ctx, ns, decl, &mut imports)?);
    }

    let mut out = format!(
        "// Generated from {}. Do not edit.\n\n",
        model.qualified_namespace()
    );
    for (module, names) in &imports.0 {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        out.push_str(&format!("import {{{}}} from './{module}';\n", names.join(", ")));
    }
    if !imports.0.is_empty() {
        out.push('\n');
    }
    out.push_str(body.trim_end());
    out.push('\n');
    Ok(out)
}

fn interface(
    ctx: &EmitContext<'_>,
    ns: &str,
    decl: &Declaration,
    imports: &mut Imports,
) -> Result<String> {
    let mut out = format!("export interface I{}", decl.name);
    if let Some(parent) = ctx.super_type(ns, decl)? {
        let name = format!("I{}", parent.decl.name);
        out.push_str(&format!(" extends {name}"));
        imports.note(ns, &parent, name);
    }
    out.push_str(" {\n");

    for member in &decl.members {
        let ty = member_type(ctx, ns, member, imports)?;
        let optional = if member.optional { "?" } else { "" };
        let array = if member.is_array { "[]" } else { "" };
        out.push_str(&format!("   {}{optional}: {ty}{array};\n", member.name));
    }

    out.push_str("}\n\n");
    Ok(out)
}

fn member_type(
    ctx: &EmitContext<'_>,
    ns: &str,
    member: &Member,
    imports: &mut Imports,
) -> Result<String> {
    let primitive = match member.type_name.as_str() {
        "String" => Some("string"),
        "Boolean" => Some("boolean"),
        "DateTime" => Some("Date"),
        "Integer" | "Long" | "Double" => Some("number"),
        _ => None,
    };
    if let Some(p) = primitive {
        return Ok(p.to_string());
    }

    let target = ctx.resolve(ns, &member.type_name)?;
    let name = if target.decl.kind == DeclKind::Enum {
        target.decl.name.clone()
    } else {
        format!("I{}", target.decl.name)
    };
    imports.note(ns, &target, name.clone());
    Ok(name)
}

#[cfg(test)]
mod tests {
    use modelpub_model::{ModelGraph, SYSTEM_MODEL};

    use super::*;
    use crate::emitter::tests::{ctx, temp_dir, vehicle_graph};

    #[test]
    fn interfaces_for_the_file_only() {
        let tmp = temp_dir();
        let graph = vehicle_graph();
        let artifact = TypeScriptEmitter.emit(&ctx(&graph, &tmp)).unwrap();

        let path = tmp.join("org.acme.vehicle@1.0.0.ts");
        assert_eq!(artifact.files, vec![path.clone()]);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("import {IAsset} from './concerto@1.0.0';"));
        assert!(text.contains("import {IOwner} from './org.acme.party@1.0.0';"));
        assert!(text.contains("/** A registered vehicle. */\nexport interface IVehicle extends IAsset {"));
        assert!(text.contains("   tags?: string[];\n"));
        assert!(text.contains("   owner: IOwner;\n"));
        assert!(text.contains("export interface ICar extends IVehicle {"));
        assert!(text.contains("   color: Color;\n"));
        assert!(text.contains("   registered: Date;\n"));
        assert!(text.contains("   RED = 'RED',\n"));
        // Imported declarations are referenced, never declared.
        assert!(!text.contains("export interface IOwner"));
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unknown_member_type_fails() {
        let mut graph = ModelGraph::new();
        graph.add_system_model(SYSTEM_MODEL).unwrap();
        graph
            .add_model("namespace a\nimport b.Thing\nconcept X { o Thing t }", "a.cto", true)
            .unwrap();
        let tmp = temp_dir();
        let ctx = EmitContext {
            graph: &graph,
            namespace: "a",
            dest_dir: &tmp,
            base_name: "a",
        };

        let err = TypeScriptEmitter.emit(&ctx).unwrap_err();
        assert_eq!(err.format, FormatTag::TypeScript);
        assert!(err.message.contains("Thing"));
        assert!(!tmp.join("a.ts").exists());
        let _ = std::fs::remove_dir_all(&tmp);
    }
}
