//! Parsed representation of a model file.

/// Built-in scalar types.
pub const PRIMITIVES: &[&str] = &["String", "Boolean", "DateTime", "Integer", "Long", "Double"];

/// Returns `true` if `name` is a built-in scalar type.
pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// One parsed model file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFile {
    /// Dotted namespace name without version, e.g. `org.acme.vehicle`.
    pub namespace: String,
    /// Optional semantic version from `namespace x@1.0.0`.
    pub version: Option<String>,
    pub imports: Vec<Import>,
    pub declarations: Vec<Declaration>,
}

impl ModelFile {
    /// Namespace including its version suffix, if any.
    pub fn qualified_namespace(&self) -> String {
        match &self.version {
            Some(v) => format!("{}@{v}", self.namespace),
            None => self.namespace.clone(),
        }
    }

    /// Look up a declaration by its short name.
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }
}

/// What an import statement brings into scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportNames {
    /// `import ns.*`
    All,
    /// `import ns.Type` or `import ns.{A, B}`
    Types(Vec<String>),
}

/// An `import` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Imported namespace without version.
    pub namespace: String,
    pub version: Option<String>,
    pub names: ImportNames,
    /// Remote location given with `from <url>`.
    pub from: Option<String>,
    /// Source line, for diagnostics.
    pub line: usize,
}

impl Import {
    /// Whether `type_name` is explicitly named by this import.
    pub fn names_type(&self, type_name: &str) -> bool {
        match &self.names {
            ImportNames::All => false,
            ImportNames::Types(types) => types.iter().any(|t| t == type_name),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.names, ImportNames::All)
    }
}

/// The kind of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Concept,
    Asset,
    Participant,
    Transaction,
    Event,
    Enum,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Asset => "asset",
            Self::Participant => "participant",
            Self::Transaction => "transaction",
            Self::Event => "event",
            Self::Enum => "enum",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "concept" => Self::Concept,
            "asset" => Self::Asset,
            "participant" => Self::Participant,
            "transaction" => Self::Transaction,
            "event" => Self::Event,
            "enum" => Self::Enum,
            _ => return None,
        })
    }

    /// The system base type a declaration of this kind implicitly extends.
    pub fn system_super_type(self) -> Option<&'static str> {
        match self {
            Self::Concept => Some("Concept"),
            Self::Asset => Some("Asset"),
            Self::Participant => Some("Participant"),
            Self::Transaction => Some("Transaction"),
            Self::Event => Some("Event"),
            Self::Enum => None,
        }
    }
}

/// How instances of a declaration are identified.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identified {
    #[default]
    None,
    /// `identified`: a system-provided identifier.
    System,
    /// `identified by <field>`
    By(String),
}

/// A type declaration (`concept`, `asset`, `enum`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    pub is_abstract: bool,
    pub identified: Identified,
    /// Explicit supertype, as written.
    pub super_type: Option<String>,
    /// Properties and relationships (empty for enums).
    pub members: Vec<Member>,
    /// Enum values (empty for non-enums).
    pub values: Vec<String>,
    /// Text of a preceding `/** */` comment.
    pub doc: Option<String>,
    pub line: usize,
}

/// A property (`o`) or relationship (`-->`) member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    /// Type name as written (primitive or declaration name).
    pub type_name: String,
    pub is_array: bool,
    pub optional: bool,
    pub relationship: bool,
    /// Literal text of a `default=` value.
    pub default: Option<String>,
    pub line: usize,
}
