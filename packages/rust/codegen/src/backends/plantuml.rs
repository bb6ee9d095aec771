//! Class diagram of the published file, plus a hosted rendering link.

use std::path::PathBuf;

use modelpub_artifacts::{DirectFileSink, FileSink};
use modelpub_model::{DeclKind, Declaration, Member, ModelFile};
use modelpub_shared::{EmitFailure, FormatTag, Result};

use crate::diagram_url;
use crate::emitter::{EmitContext, Emitter, GeneratedArtifact, Scope, run};
use crate::naming::simple_name;

pub struct PlantUmlEmitter {
    server: String,
}

impl PlantUmlEmitter {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
        }
    }
}

impl Emitter for PlantUmlEmitter {
    fn format(&self) -> FormatTag {
        FormatTag::PlantUml
    }

    fn scope(&self) -> Scope {
        Scope::File
    }

    fn destination(&self, ctx: &EmitContext<'_>) -> PathBuf {
        ctx.dest_dir.join(format!("{}.puml", ctx.base_name))
    }

    fn sink(&self, ctx: &EmitContext<'_>) -> Box<dyn FileSink> {
        Box::new(DirectFileSink::new(ctx.dest_dir))
    }

    fn generate(&self, ctx: &EmitContext<'_>, sink: &mut dyn FileSink) -> Result<()> {
        let model = ctx.model()?;
        sink.write_file(&format!("{}.puml", ctx.base_name), &render(&model.file))
    }

    /// Writes the diagram source, then encodes the written file as a link.
    fn emit(&self, ctx: &EmitContext<'_>) -> std::result::Result<GeneratedArtifact, EmitFailure> {
        let files = run(self, ctx)?;
        let destination = self.destination(ctx);
        let fail = |message: String| EmitFailure::new(FormatTag::PlantUml, &destination, message);

        let source = std::fs::read_to_string(&destination).map_err(|e| fail(e.to_string()))?;
        let link = diagram_url::svg_url(&self.server, &source).map_err(|e| fail(e.to_string()))?;

        let mut artifact = GeneratedArtifact::new(FormatTag::PlantUml, ctx, files);
        artifact.link = Some(link);
        Ok(artifact)
    }
}

/// Render one model file as a class diagram. Edges are drawn only between
/// types declared in the file itself.
pub fn render(model: &ModelFile) -> String {
    let ns = &model.namespace;
    let mut out = String::new();

    out.push_str("@startuml\n");
    out.push_str(&format!("title\nModel {}\nend title\n", model.qualified_namespace()));

    for decl in &model.declarations {
        out.push_str(&class_block(ns, decl));
    }

    for decl in &model.declarations {
        let from = format!("{ns}.{}", decl.name);
        if let Some(sup) = decl.super_type.as_deref().filter(|s| is_local(model, s)) {
            out.push_str(&format!("{from} --|> {ns}.{}\n", simple_name(sup)));
        }
        for member in decl.members.iter().filter(|m| is_local(model, &m.type_name)) {
            let arrow = if member.relationship { "-->" } else { "*--" };
            let many = if member.is_array { "*" } else { "1" };
            out.push_str(&format!(
                "{from} \"1\" {arrow} \"{many}\" {ns}.{} : {}\n",
                simple_name(&member.type_name),
                member.name
            ));
        }
    }

    out.push_str("@enduml\n");
    out
}

fn class_block(ns: &str, decl: &Declaration) -> String {
    let mut out = String::new();

    if decl.kind == DeclKind::Enum {
        out.push_str(&format!("enum {ns}.{} {{\n", decl.name));
        for value in &decl.values {
            out.push_str(&format!("   + {value}\n"));
        }
        out.push_str("}\n");
        return out;
    }

    let prefix = if decl.is_abstract { "abstract class" } else { "class" };
    let stereotype = match decl.kind {
        DeclKind::Asset => " << (A,green) >>",
        DeclKind::Participant => " << (P,lightblue) >>",
        DeclKind::Transaction => " << (T,yellow) >>",
        DeclKind::Event => " << (E,lightgrey) >>",
        DeclKind::Concept | DeclKind::Enum => "",
    };
    out.push_str(&format!("{prefix} {ns}.{}{stereotype} {{\n", decl.name));
    for member in &decl.members {
        out.push_str(&format!("   + {}\n", member_label(member)));
    }
    out.push_str("}\n");
    out
}

fn member_label(member: &Member) -> String {
    let array = if member.is_array { "[]" } else { "" };
    format!("{}{array} {}", member.type_name, member.name)
}

fn is_local(model: &ModelFile, type_name: &str) -> bool {
    match type_name.rsplit_once('.') {
        Some((ns, short)) => ns == model.namespace && model.declaration(short).is_some(),
        None => model.declaration(type_name).is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::tests::{ctx, temp_dir, vehicle_graph};

    #[test]
    fn diagram_covers_only_the_file() {
        let graph = vehicle_graph();
        let text = render(&graph.get("org.acme.vehicle").unwrap().file);

        assert!(text.starts_with("@startuml\n"));
        assert!(text.contains("Model org.acme.vehicle@1.0.0"));
        assert!(text.contains("abstract class org.acme.vehicle.Vehicle << (A,green) >> {"));
        assert!(text.contains("   + String[] tags\n"));
        assert!(text.contains("org.acme.vehicle.Car --|> org.acme.vehicle.Vehicle\n"));
        assert!(text.contains("org.acme.vehicle.Car \"1\" *-- \"1\" org.acme.vehicle.Color : color\n"));
        assert!(text.contains("enum org.acme.vehicle.Color {\n   + RED\n   + GREEN\n}"));
        // Imported and system types are never drawn.
        assert!(!text.contains("org.acme.party"));
        assert!(!text.contains("concerto"));
    }

    #[test]
    fn emit_writes_source_and_link() {
        let tmp = temp_dir();
        let graph = vehicle_graph();
        let artifact = PlantUmlEmitter::new("https://diagrams.example.com")
            .emit(&ctx(&graph, &tmp))
            .unwrap();

        assert_eq!(artifact.files, vec![tmp.join("vehicle.puml")]);
        let link = artifact.link.unwrap();
        assert!(link.starts_with("https://diagrams.example.com/plantuml/svg/"));
        let _ = std::fs::remove_dir_all(&tmp);
    }
}
