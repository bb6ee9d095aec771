//! XML Schema documents for every namespace in the graph, archived.

use std::collections::BTreeSet;
use std::path::PathBuf;

use modelpub_artifacts::{ArchivingSink, FileSink};
use modelpub_model::{DeclKind, Declaration, Member, ModelFile};
use modelpub_shared::{FormatTag, Result};

use crate::emitter::{EmitContext, Emitter, Scope};
use crate::naming::xml_escape;

pub struct XsdEmitter;

impl Emitter for XsdEmitter {
    fn format(&self) -> FormatTag {
        FormatTag::Xsd
    }

    fn scope(&self) -> Scope {
        Scope::Graph
    }

    fn destination(&self, ctx: &EmitContext<'_>) -> PathBuf {
        ctx.dest_dir.join(format!("{}.xsd.zip", ctx.base_name))
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
            let text = schema(ctx, model)?;
            sink.write_file(&format!("{}.xsd", model.namespace), &text)?;
        }
        Ok(())
    }
}

fn schema(ctx: &EmitContext<'_>, model: &ModelFile) -> Result<String> {
    let ns = model.namespace.as_str();
    let mut referenced = BTreeSet::new();
    let mut body = String::new();

    for decl in &model.declarations {
        if decl.kind == DeclKind::Enum {
            body.push_str(&enum_type(decl));
        } else {
            body.push_str(&complex_type(ctx, ns, decl, &mut referenced)?);
        }
        body.push_str(&format!(
            "  <xs:element name=\"{name}\" type=\"{ns}:{name}\"/>\n",
            name = decl.name
        ));
    }

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\"");
    out.push_str(&format!(" xmlns:{ns}=\"{ns}\""));
    for other in &referenced {
        out.push_str(&format!(" xmlns:{other}=\"{other}\""));
    }
    out.push_str(&format!(
        " targetNamespace=\"{ns}\" elementFormDefault=\"qualified\">\n"
    ));
    for other in &referenced {
        out.push_str(&format!(
            "  <xs:import namespace=\"{other}\" schemaLocation=\"{other}.xsd\"/>\n"
        ));
    }
    out.push_str(&body);
    out.push_str("</xs:schema>\n");
    Ok(out)
}

fn enum_type(decl: &Declaration) -> String {
    let mut out = format!("  <xs:simpleType name=\"{}\">\n", decl.name);
    if let Some(doc) = &decl.doc {
        out.push_str(&annotation(doc, "    "));
    }
    out.push_str("    <xs:restriction base=\"xs:string\">\n");
    for value in &decl.values {
        out.push_str(&format!("      <xs:enumeration value=\"{value}\"/>\n"));
    }
    out.push_str("    </xs:restriction>\n  </xs:simpleType>\n");
    out
}

fn complex_type(
    ctx: &EmitContext<'_>,
    ns: &str,
    decl: &Declaration,
    referenced: &mut BTreeSet<String>,
) -> Result<String> {
    let abstract_attr = if decl.is_abstract { " abstract=\"true\"" } else { "" };
    let mut out = format!("  <xs:complexType name=\"{}\"{abstract_attr}>\n", decl.name);
    if let Some(doc) = &decl.doc {
        out.push_str(&annotation(doc, "    "));
    }

    let mut elements = String::new();
    for member in &decl.members {
        elements.push_str(&element(ctx, ns, member, referenced)?);
    }

    match ctx.super_type(ns, decl)? {
        Some(parent) => {
            let parent_ns = parent.namespace();
            if parent_ns != ns {
                referenced.insert(parent_ns.to_string());
            }
            out.push_str("    <xs:complexContent>\n");
            out.push_str(&format!(
                "      <xs:extension base=\"{parent_ns}:{}\">\n",
                parent.decl.name
            ));
            out.push_str("        <xs:sequence>\n");
            out.push_str(&indent(&elements, "    "));
            out.push_str("        </xs:sequence>\n");
            out.push_str("      </xs:extension>\n");
            out.push_str("    </xs:complexContent>\n");
        }
        None => {
            out.push_str("    <xs:sequence>\n");
            out.push_str(&elements);
            out.push_str("    </xs:sequence>\n");
        }
    }

    out.push_str("  </xs:complexType>\n");
    Ok(out)
}

fn element(
    ctx: &EmitContext<'_>,
    ns: &str,
    member: &Member,
    referenced: &mut BTreeSet<String>,
) -> Result<String> {
    let ty = if member.relationship {
        // A relationship is serialised as the target's identifier.
        ctx.resolve(ns, &member.type_name)?;
        "xs:string".to_string()
    } else {
        match member.type_name.as_str() {
            "String" => "xs:string".to_string(),
            "Boolean" => "xs:boolean".to_string(),
            "DateTime" => "xs:dateTime".to_string(),
            "Integer" => "xs:integer".to_string(),
            "Long" => "xs:long".to_string(),
            "Double" => "xs:double".to_string(),
            other => {
                let target = ctx.resolve(ns, other)?;
                if target.namespace() != ns {
                    referenced.insert(target.namespace().to_string());
                }
                format!("{}:{}", target.namespace(), target.decl.name)
            }
        }
    };

    let mut attrs = format!("name=\"{}\" type=\"{ty}\"", member.name);
    if member.optional {
        attrs.push_str(" minOccurs=\"0\"");
    }
    if member.is_array {
        attrs.push_str(" maxOccurs=\"unbounded\"");
    }
    if let Some(default) = &member.default {
        attrs.push_str(&format!(" default=\"{}\"", xml_escape(default)));
    }
    Ok(format!("      <xs:element {attrs}/>\n"))
}

fn annotation(doc: &str, pad: &str) -> String {
    format!(
        "{pad}<xs:annotation>\n{pad}  <xs:documentation>{}</xs:documentation>\n{pad}</xs:annotation>\n",
        xml_escape(doc)
    )
}

fn indent(text: &str, pad: &str) -> String {
    text.lines().map(|l| format!("{pad}{l}\n")).collect()
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use modelpub_model::ModelGraph;

    use super::*;
    use crate::emitter::tests::{ctx, temp_dir, vehicle_graph};

    fn entries(path: &std::path::Path) -> Vec<(String, String)> {
        let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).unwrap();
                let mut text = String::new();
                entry.read_to_string(&mut text).unwrap();
                (entry.name().to_string(), text)
            })
            .collect()
    }

    #[test]
    fn one_schema_per_namespace_in_the_graph() {
        let tmp = temp_dir();
        let graph = vehicle_graph();
        let artifact = XsdEmitter.emit(&ctx(&graph, &tmp)).unwrap();

        let container = tmp.join("vehicle.xsd.zip");
        assert_eq!(artifact.files, vec![container.clone()]);

        let entries = entries(&container);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            ["concerto.xsd", "org.acme.party.xsd", "org.acme.vehicle.xsd"]
        );

        let vehicle = &entries[2].1;
        assert!(vehicle.contains("targetNamespace=\"org.acme.vehicle\""));
        assert!(vehicle.contains("<xs:import namespace=\"concerto\" schemaLocation=\"concerto.xsd\"/>"));
        assert!(vehicle.contains("<xs:complexType name=\"Vehicle\" abstract=\"true\">"));
        assert!(vehicle.contains("<xs:extension base=\"concerto:Asset\">"));
        assert!(vehicle.contains(
            "<xs:element name=\"tags\" type=\"xs:string\" minOccurs=\"0\" maxOccurs=\"unbounded\"/>"
        ));
        assert!(vehicle.contains("<xs:element name=\"wheels\" type=\"xs:integer\" default=\"4\"/>"));
        assert!(vehicle.contains("<xs:element name=\"color\" type=\"org.acme.vehicle:Color\"/>"));
        assert!(vehicle.contains("<xs:enumeration value=\"GREEN\"/>"));
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn nothing_to_emit_means_no_container() {
        let tmp = temp_dir();
        let mut graph = ModelGraph::new();
        graph.add_model("namespace empty", "empty.cto", true).unwrap();
        let ctx = EmitContext {
            graph: &graph,
            namespace: "empty",
            dest_dir: &tmp,
            base_name: "empty",
        };

        let artifact = XsdEmitter.emit(&ctx).unwrap();
        assert!(artifact.files.is_empty());
        assert!(!tmp.join("empty.xsd.zip").exists());
        let _ = std::fs::remove_dir_all(&tmp);
    }
}
