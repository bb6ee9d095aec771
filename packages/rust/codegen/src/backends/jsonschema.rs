//! A single draft-07 JSON Schema covering every declaration in the graph.

use std::path::PathBuf;

use serde_json::{Map, Value, json};

use modelpub_artifacts::{DirectFileSink, FileSink};
use modelpub_model::{DeclKind, Declaration, Member};
use modelpub_shared::{FormatTag, ModelPubError, Result};

use crate::emitter::{EmitContext, Emitter, Scope};

const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

pub struct JsonSchemaEmitter;

impl Emitter for JsonSchemaEmitter {
    fn format(&self) -> FormatTag {
        FormatTag::JsonSchema
    }

    fn scope(&self) -> Scope {
        Scope::Graph
    }

    fn destination(&self, ctx: &EmitContext<'_>) -> PathBuf {
        ctx.dest_dir.join(format!("{}.json", ctx.base_name))
    }

    fn sink(&self, ctx: &EmitContext<'_>) -> Box<dyn FileSink> {
        Box::new(DirectFileSink::new(ctx.dest_dir))
    }

    fn generate(&self, ctx: &EmitContext<'_>, sink: &mut dyn FileSink) -> Result<()> {
        let schema = build_schema(ctx)?;
        let text = serde_json::to_string_pretty(&schema)
            .map_err(|e| ModelPubError::validation(format!("failed to serialize schema: {e}")))?;
        sink.write_file(&format!("{}.json", ctx.base_name), &text)
    }
}

/// Build the whole schema document in memory.
pub fn build_schema(ctx: &EmitContext<'_>) -> Result<Value> {
    let mut definitions = Map::new();
    for registered in ctx.models(Scope::Graph)? {
        let ns = registered.file.namespace.as_str();
        for decl in &registered.file.declarations {
            let fqn = format!("{ns}.{}", decl.name);
            let definition = match decl.kind {
                DeclKind::Enum => enum_definition(&fqn, decl),
                _ => object_definition(ctx, ns, &fqn, decl)?,
            };
            definitions.insert(fqn, definition);
        }
    }

    // The root accepts any concrete type declared by the published file.
    let model = &ctx.model()?.file;
    let roots: Vec<Value> = model
        .declarations
        .iter()
        .filter(|d| d.kind != DeclKind::Enum && !d.is_abstract)
        .map(|d| json!({ "$ref": format!("#/definitions/{}.{}", model.namespace, d.name) }))
        .collect();

    Ok(json!({
        "$schema": DRAFT_07,
        "title": model.qualified_namespace(),
        "definitions": definitions,
        "anyOf": roots,
    }))
}

fn describe(fqn: &str, decl: &Declaration) -> String {
    decl.doc
        .clone()
        .unwrap_or_else(|| format!("An instance of {fqn}"))
}

fn enum_definition(fqn: &str, decl: &Declaration) -> Value {
    json!({
        "title": decl.name,
        "description": describe(fqn, decl),
        "enum": decl.values,
    })
}

fn object_definition(
    ctx: &EmitContext<'_>,
    ns: &str,
    fqn: &str,
    decl: &Declaration,
) -> Result<Value> {
    // Fail on a broken inheritance chain instead of silently truncating it.
    ctx.super_type(ns, decl)?;

    let mut properties = Map::new();
    properties.insert(
        "$class".into(),
        json!({ "type": "string", "default": fqn, "pattern": format!("^{}$", fqn.replace('.', "\\.")) }),
    );
    let mut required = vec![Value::from("$class")];

    for member in ctx.graph.all_members(ns, decl) {
        properties.insert(member.name.clone(), member_schema(ctx, ns, member)?);
        if !member.optional {
            required.push(Value::from(member.name.clone()));
        }
    }

    Ok(json!({
        "title": decl.name,
        "description": describe(fqn, decl),
        "type": "object",
        "properties": properties,
        "required": required,
    }))
}

fn member_schema(ctx: &EmitContext<'_>, ns: &str, member: &Member) -> Result<Value> {
    let mut item = if member.relationship {
        let target = ctx.resolve(ns, &member.type_name)?;
        json!({
            "type": "string",
            "description": format!("The identifier of an instance of {}", target.fqn()),
        })
    } else {
        match member.type_name.as_str() {
            "String" => json!({ "type": "string" }),
            "Boolean" => json!({ "type": "boolean" }),
            "DateTime" => json!({ "type": "string", "format": "date-time" }),
            "Integer" | "Long" => json!({ "type": "integer" }),
            "Double" => json!({ "type": "number" }),
            other => {
                let target = ctx.resolve(ns, other)?;
                json!({ "$ref": format!("#/definitions/{}", target.fqn()) })
            }
        }
    };

    if let (Some(default), Value::Object(fields)) = (&member.default, &mut item) {
        fields.insert("default".into(), default_value(&member.type_name, default));
    }

    if member.is_array {
        return Ok(json!({ "type": "array", "items": item }));
    }
    Ok(item)
}

/// Convert a default literal to the JSON value matching the member type.
fn default_value(type_name: &str, literal: &str) -> Value {
    match type_name {
        "Integer" | "Long" => literal.parse::<i64>().map(Value::from).ok(),
        "Double" => literal.parse::<f64>().ok().map(Value::from),
        "Boolean" => literal.parse::<bool>().map(Value::from).ok(),
        _ => None,
    }
    .unwrap_or_else(|| Value::from(literal))
}
