//! Model text parser.
//!
//! Parses the modelling notation into a [`ModelFile`]:
//! - Header: `namespace org.acme.vehicle@1.0.0`
//! - Imports: `import ns.Type`, `import ns.*`, `import ns.{A, B}`, each with an
//!   optional `from <url>`
//! - Declarations: `[abstract] concept|asset|participant|transaction|event|enum Name
//!   [identified [by field]] [extends Super] { ... }`
//! - Members: `o Type[] name [optional] [default=value]` and `--> Type name`

use modelpub_shared::{ModelPubError, Result};

use crate::ast::{DeclKind, Declaration, Identified, Import, ImportNames, Member, ModelFile};

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Str(String),
    Number(String),
    Url(String),
    Doc(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Eq,
    Dot,
    Star,
    At,
    Arrow,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Ident(s) => format!("'{s}'"),
            Tok::Str(s) => format!("string \"{s}\""),
            Tok::Number(n) => format!("number {n}"),
            Tok::Url(u) => format!("URL {u}"),
            Tok::Doc(_) => "doc comment".into(),
            Tok::LBrace => "'{'".into(),
            Tok::RBrace => "'}'".into(),
            Tok::LBracket => "'['".into(),
            Tok::RBracket => "']'".into(),
            Tok::Comma => "','".into(),
            Tok::Eq => "'='".into(),
            Tok::Dot => "'.'".into(),
            Tok::Star => "'*'".into(),
            Tok::At => "'@'".into(),
            Tok::Arrow => "'-->'".into(),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn lex(text: &str) -> Result<Vec<(Tok, usize)>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut i = 0;
    let mut in_import = false;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == '\n' {
            line += 1;
            in_import = false;
            i += 1;
            continue;
        }
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Comments
        if c == '/' && next == Some('/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if c == '/' && next == Some('*') {
            let start_line = line;
            let is_doc = chars.get(i + 2) == Some(&'*') && chars.get(i + 3) != Some(&'/');
            i += 2;
            let body_start = i;
            loop {
                if i + 1 >= chars.len() {
                    return Err(ModelPubError::parse(start_line, "unterminated comment"));
                }
                if chars[i] == '*' && chars[i + 1] == '/' {
                    break;
                }
                if chars[i] == '\n' {
                    line += 1;
                }
                i += 1;
            }
            if is_doc {
                let body: String = chars[body_start..i].iter().collect();
                tokens.push((Tok::Doc(clean_doc(&body)), start_line));
            }
            i += 2;
            continue;
        }

        if c == '-' && next == Some('-') && chars.get(i + 2) == Some(&'>') {
            tokens.push((Tok::Arrow, line));
            i += 3;
            continue;
        }

        if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) {
            let start = i;
            i += 1;
            while i < chars.len() {
                let ch = chars[i];
                let dotted_digit =
                    ch == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
                if ch.is_ascii_digit() || dotted_digit {
                    i += 1;
                } else {
                    break;
                }
            }
            tokens.push((Tok::Number(chars[start..i].iter().collect()), line));
            continue;
        }

        if is_ident_start(c) {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let is_from = in_import && word == "from";
            in_import |= word == "import";
            tokens.push((Tok::Ident(word), line));

            // The operand of an import's `from` is a URL, lexed as one opaque token.
            if is_from {
                while i < chars.len() && chars[i] != '\n' && chars[i].is_whitespace() {
                    i += 1;
                }
                let url_start = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                if url_start == i {
                    return Err(ModelPubError::parse(line, "expected URL after 'from'"));
                }
                tokens.push((Tok::Url(chars[url_start..i].iter().collect()), line));
            }
            continue;
        }

        if c == '"' {
            let start_line = line;
            i += 1;
            let mut value = String::new();
            loop {
                match chars.get(i) {
                    None | Some('\n') => {
                        return Err(ModelPubError::parse(start_line, "unterminated string"));
                    }
                    Some('\\') => {
                        if let Some(escaped) = chars.get(i + 1) {
                            value.push(*escaped);
                        }
                        i += 2;
                    }
                    Some('"') => {
                        i += 1;
                        break;
                    }
                    Some(ch) => {
                        value.push(*ch);
                        i += 1;
                    }
                }
            }
            tokens.push((Tok::Str(value), start_line));
            continue;
        }

        let tok = match c {
            '{' => Tok::LBrace,
            '}' => Tok::RBrace,
            '[' => Tok::LBracket,
            ']' => Tok::RBracket,
            ',' => Tok::Comma,
            '=' => Tok::Eq,
            '.' => Tok::Dot,
            '*' => Tok::Star,
            '@' => Tok::At,
            other => {
                return Err(ModelPubError::parse(
                    line,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        tokens.push((tok, line));
        i += 1;
    }

    Ok(tokens)
}

/// Strip the leading `*` decoration from doc comment lines.
fn clean_doc(body: &str) -> String {
    body.trim_start_matches('*')
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse model text into a [`ModelFile`].
pub fn parse_model(text: &str) -> Result<ModelFile> {
    let tokens = lex(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.model()
}

struct Parser {
    tokens: Vec<(Tok, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, l)| *l)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, msg: impl Into<String>) -> ModelPubError {
        ModelPubError::parse(self.line(), msg)
    }

    fn unexpected(&self, expected: &str) -> ModelPubError {
        match self.peek() {
            Some(tok) => self.error(format!("expected {expected}, found {}", tok.describe())),
            None => self.error(format!("expected {expected}, found end of input")),
        }
    }

    fn expect(&mut self, tok: Tok, expected: &str) -> Result<()> {
        if self.peek() == Some(&tok) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn ident(&mut self, expected: &str) -> Result<String> {
        match self.peek() {
            Some(Tok::Ident(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn keyword(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Tok::Ident(s)) if s == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_docs(&mut self) -> Option<String> {
        let mut doc = None;
        while let Some(Tok::Doc(text)) = self.peek() {
            doc = Some(text.clone());
            self.pos += 1;
        }
        doc
    }

    fn model(&mut self) -> Result<ModelFile> {
        self.skip_docs();
        if !self.keyword("namespace") {
            return Err(self.unexpected("'namespace'"));
        }
        let namespace = self.dotted_name("namespace name")?;
        let version = if self.peek() == Some(&Tok::At) {
            self.pos += 1;
            Some(self.version()?)
        } else {
            None
        };

        // A doc comment before the first declaration is read while looking
        // for imports and carried over to that declaration.
        let mut imports = Vec::new();
        let mut pending_doc = self.skip_docs();
        while matches!(self.peek(), Some(Tok::Ident(s)) if s == "import") {
            imports.push(self.import()?);
            pending_doc = self.skip_docs();
        }

        let mut declarations = Vec::new();
        loop {
            let doc = pending_doc.take().or_else(|| self.skip_docs());
            if self.peek().is_none() {
                break;
            }
            declarations.push(self.declaration(doc)?);
        }

        Ok(ModelFile {
            namespace,
            version,
            imports,
            declarations,
        })
    }

    fn dotted_name(&mut self, expected: &str) -> Result<String> {
        let mut name = self.ident(expected)?;
        while self.peek() == Some(&Tok::Dot) && matches!(self.peek_at(1), Some(Tok::Ident(_))) {
            self.pos += 1;
            name.push('.');
            name.push_str(&self.ident(expected)?);
        }
        Ok(name)
    }

    fn version(&mut self) -> Result<String> {
        match self.next() {
            Some(Tok::Number(n)) if !n.starts_with('-') => Ok(n),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.unexpected("version number"))
            }
        }
    }

    fn import(&mut self) -> Result<Import> {
        let line = self.line();
        self.keyword("import");

        let mut segments = vec![self.ident("imported name")?];
        let mut version = None;
        let mut names = None;

        loop {
            match self.peek() {
                Some(Tok::At) if version.is_none() => {
                    self.pos += 1;
                    version = Some(self.version()?);
                    if self.peek() != Some(&Tok::Dot) {
                        return Err(self.unexpected("'.' after import version"));
                    }
                }
                Some(Tok::Dot) => {
                    self.pos += 1;
                    match self.next() {
                        Some(Tok::Ident(s)) if version.is_some() => {
                            names = Some(ImportNames::Types(vec![s]));
                            break;
                        }
                        Some(Tok::Ident(s)) => segments.push(s),
                        Some(Tok::Star) => {
                            names = Some(ImportNames::All);
                            break;
                        }
                        Some(Tok::LBrace) => {
                            let mut types = vec![self.ident("imported type")?];
                            while self.peek() == Some(&Tok::Comma) {
                                self.pos += 1;
                                types.push(self.ident("imported type")?);
                            }
                            self.expect(Tok::RBrace, "'}'")?;
                            names = Some(ImportNames::Types(types));
                            break;
                        }
                        _ => {
                            self.pos -= 1;
                            return Err(self.unexpected("type name, '*' or '{'"));
                        }
                    }
                }
                _ => break,
            }
        }

        let names = match names {
            Some(n) => n,
            None => {
                if segments.len() < 2 {
                    return Err(ModelPubError::parse(
                        line,
                        "import must name a namespace and a type",
                    ));
                }
                let type_name = segments.pop().unwrap_or_default();
                ImportNames::Types(vec![type_name])
            }
        };

        let from = if self.keyword("from") {
            match self.next() {
                Some(Tok::Url(u)) => Some(u),
                _ => return Err(ModelPubError::parse(line, "expected URL after 'from'")),
            }
        } else {
            None
        };

        Ok(Import {
            namespace: segments.join("."),
            version,
            names,
            from,
            line,
        })
    }

    fn declaration(&mut self, doc: Option<String>) -> Result<Declaration> {
        let line = self.line();
        let is_abstract = self.keyword("abstract");
        let keyword = self.ident("declaration keyword")?;
        let kind = DeclKind::from_keyword(&keyword).ok_or_else(|| {
            ModelPubError::parse(line, format!("unknown declaration kind '{keyword}'"))
        })?;
        let name = self.ident("declaration name")?;

        let mut identified = Identified::None;
        let mut super_type = None;
        loop {
            if self.keyword("identified") {
                identified = if self.keyword("by") {
                    Identified::By(self.ident("identifying field")?)
                } else {
                    Identified::System
                };
            } else if self.keyword("extends") {
                super_type = Some(self.dotted_name("supertype name")?);
            } else {
                break;
            }
        }

        self.expect(Tok::LBrace, "'{'")?;

        let mut members = Vec::new();
        let mut values = Vec::new();
        loop {
            self.skip_docs();
            match self.peek() {
                Some(Tok::RBrace) => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.unexpected("'}'")),
                _ if kind == DeclKind::Enum => {
                    if !self.keyword("o") {
                        return Err(self.unexpected("'o'"));
                    }
                    values.push(self.ident("enum value")?);
                }
                _ => members.push(self.member()?),
            }
        }

        Ok(Declaration {
            name,
            kind,
            is_abstract,
            identified,
            super_type,
            members,
            values,
            doc,
            line,
        })
    }

    fn member(&mut self) -> Result<Member> {
        let line = self.line();
        let relationship = if self.peek() == Some(&Tok::Arrow) {
            self.pos += 1;
            true
        } else if self.keyword("o") {
            false
        } else {
            return Err(self.unexpected("'o' or '-->'"));
        };

        let type_name = self.dotted_name("member type")?;
        let is_array = if self.peek() == Some(&Tok::LBracket) {
            self.pos += 1;
            self.expect(Tok::RBracket, "']'")?;
            true
        } else {
            false
        };
        let name = self.ident("member name")?;

        let mut optional = false;
        let mut default = None;
        loop {
            if self.keyword("optional") {
                optional = true;
            } else if self.keyword("default") {
                self.expect(Tok::Eq, "'='")?;
                default = Some(match self.next() {
                    Some(Tok::Str(s)) => s,
                    Some(Tok::Number(n)) => n,
                    Some(Tok::Ident(s)) => s,
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        return Err(self.unexpected("default value"));
                    }
                });
            } else {
                break;
            }
        }

        Ok(Member {
            name,
            type_name,
            is_array,
            optional,
            relationship,
            default,
            line,
        })
    }
}
