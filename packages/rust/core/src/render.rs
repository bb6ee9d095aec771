//! HTML rendering for model pages and the site index.
//!
//! Pages are plain HTML built with `format!`. Every piece of model-derived
//! text goes through [`escape`].

use modelpub_model::{DeclKind, Declaration, Identified, ModelFile, ModelGraph};
use modelpub_shared::{ArtifactRef, SiteIndex};

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Inputs for one model's documentation page.
#[derive(Debug, Clone, Copy)]
pub struct ModelPage<'a> {
    pub model: &'a ModelFile,
    pub graph: &'a ModelGraph,
    /// Version label, e.g. `" (v2.1)"`, possibly empty.
    pub version: &'a str,
    /// Hosted diagram link; the diagram section is omitted when empty.
    pub diagram_url: &'a str,
    /// Artifacts that exist next to the page.
    pub artifacts: &'a [ArtifactRef],
    /// File name of the verbatim source copy.
    pub source_file: &'a str,
    /// Link back to the site index.
    pub index_href: &'a str,
    pub tool_version: &'a str,
}

fn head(title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n",
        escape(title)
    )
}

fn footer(tool_version: &str) -> String {
    let mut out = String::new();
    if !tool_version.is_empty() {
        out.push_str(&format!(
            "<footer>Generated by modelpub {}</footer>\n",
            escape(tool_version)
        ));
    }
    out.push_str("</body>\n</html>\n");
    out
}

/// Render a model's documentation page.
pub fn render_model_page(page: &ModelPage<'_>) -> String {
    let model = page.model;
    let title = format!("{}{}", model.qualified_namespace(), page.version);

    let mut out = head(&title);
    out.push_str(&format!(
        "<nav><a href=\"{}\">All models</a></nav>\n<h1>{}</h1>\n",
        escape(page.index_href),
        escape(&title)
    ));

    if !page.diagram_url.is_empty() {
        let url = escape(page.diagram_url);
        out.push_str(&format!(
            "<section class=\"diagram\">\n<a href=\"{url}\"><img src=\"{url}\" alt=\"Class diagram\"></a>\n</section>\n"
        ));
    }

    if !model.imports.is_empty() {
        out.push_str("<section class=\"imports\">\n<h2>Imports</h2>\n<ul>\n");
        for import in &model.imports {
            let names = match &import.names {
                modelpub_model::ImportNames::All => "*".to_string(),
                modelpub_model::ImportNames::Types(types) => types.join(", "),
            };
            out.push_str(&format!(
                "<li><code>{}</code>: {}</li>\n",
                escape(&import.namespace),
                escape(&names)
            ));
        }
        out.push_str("</ul>\n</section>\n");
    }

    out.push_str("<section class=\"declarations\">\n<h2>Declarations</h2>\n");
    for decl in &model.declarations {
        out.push_str(&declaration(page.graph, &model.namespace, decl));
    }
    out.push_str("</section>\n");

    out.push_str("<section class=\"downloads\">\n<h2>Downloads</h2>\n<ul>\n");
    for artifact in page.artifacts {
        let file = artifact.path.rsplit('/').next().unwrap_or(&artifact.path);
        out.push_str(&format!(
            "<li><a href=\"{file}\">{file}</a> ({format})</li>\n",
            file = escape(file),
            format = artifact.format
        ));
    }
    out.push_str(&format!(
        "<li><a href=\"{file}\">{file}</a> (source)</li>\n",
        file = escape(page.source_file)
    ));
    out.push_str("</ul>\n</section>\n");

    out.push_str(&footer(page.tool_version));
    out
}

fn declaration(graph: &ModelGraph, ns: &str, decl: &Declaration) -> String {
    let mut out = format!("<article id=\"{}\">\n", escape(&decl.name));
    let kind = if decl.is_abstract {
        format!("abstract {}", decl.kind.keyword())
    } else {
        decl.kind.keyword().to_string()
    };
    out.push_str(&format!(
        "<h3><small>{kind}</small> {}</h3>\n",
        escape(&decl.name)
    ));

    if let Some(doc) = &decl.doc {
        out.push_str(&format!("<p>{}</p>\n", escape(doc)));
    }

    let mut facts = Vec::new();
    if let Some(sup) = graph.super_type_name(ns, decl) {
        facts.push(format!("extends <code>{}</code>", escape(&sup)));
    }
    match &decl.identified {
        Identified::None => {}
        Identified::System => facts.push("system identified".to_string()),
        Identified::By(field) => {
            facts.push(format!("identified by <code>{}</code>", escape(field)));
        }
    }
    if !facts.is_empty() {
        out.push_str(&format!("<p>{}</p>\n", facts.join("; ")));
    }

    if decl.kind == DeclKind::Enum {
        out.push_str("<ul class=\"values\">\n");
        for value in &decl.values {
            out.push_str(&format!("<li><code>{}</code></li>\n", escape(value)));
        }
        out.push_str("</ul>\n</article>\n");
        return out;
    }

    if !decl.members.is_empty() {
        out.push_str(
            "<table>\n<thead><tr><th>Name</th><th>Type</th><th>Kind</th><th>Optional</th><th>Default</th></tr></thead>\n<tbody>\n",
        );
        for m in &decl.members {
            let ty = if m.is_array {
                format!("{}[]", m.type_name)
            } else {
                m.type_name.clone()
            };
            out.push_str(&format!(
                "<tr><td>{}</td><td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape(&m.name),
                escape(&ty),
                if m.relationship { "relationship" } else { "property" },
                if m.optional { "yes" } else { "no" },
                escape(m.default.as_deref().unwrap_or(""))
            ));
        }
        out.push_str("</tbody>\n</table>\n");
    }

    out.push_str("</article>\n");
    out
}

/// Render the site index from records already in display order.
pub fn render_index(title: &str, index: &SiteIndex, tool_version: &str) -> String {
    let mut out = head(title);
    out.push_str(&format!("<h1>{}</h1>\n", escape(title)));

    if index.is_empty() {
        out.push_str("<p>No models have been published.</p>\n");
    } else {
        out.push_str("<ul class=\"models\">\n");
        for record in &index.entries {
            out.push_str(&format!(
                "<li><a href=\"{}\">{}</a>{}</li>\n",
                escape(&record.page),
                escape(&record.namespace),
                escape(&record.version)
            ));
        }
        out.push_str("</ul>\n");
    }

    out.push_str(&footer(tool_version));
    out
}
