//! Minimal Go file header reader: build lines, package clause, imports.

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub package: String,
    pub imports: Vec<String>,
    /// Expression of the first `//go:build` line, if any.
    pub go_build: Option<String>,
    /// Bodies of `// +build` lines.
    pub plus_build: Vec<String>,
}

impl Header {
    pub fn imports_c(&self) -> bool {
        self.imports.iter().any(|i| i == "C")
    }
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Skip whitespace and comments, handing line comments to `on_comment`.
    fn skip_trivia(&mut self, on_comment: &mut dyn FnMut(&'a str)) -> Result<(), String> {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if let Some(body) = trimmed.strip_prefix("//") {
                let end = body.find('\n').unwrap_or(body.len());
                on_comment(&body[..end]);
                self.pos += 2 + end;
            } else if let Some(body) = trimmed.strip_prefix("/*") {
                let end = body
                    .find("*/")
                    .ok_or_else(|| "comment not terminated".to_string())?;
                self.pos += 2 + end + 2;
            } else {
                return Ok(());
            }
        }
    }

    fn skip(&mut self) -> Result<(), String> {
        self.skip_trivia(&mut |_| {})
    }

    fn ident(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(i, c)| {
                !(c.is_alphanumeric() || *c == '_') || (*i == 0 && c.is_ascii_digit())
            })
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    fn peek_keyword(&self, kw: &str) -> bool {
        let rest = self.rest();
        rest.starts_with(kw)
            && !rest[kw.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
    }

    fn eat(&mut self, c: char) -> bool {
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn string_lit(&mut self) -> Result<String, String> {
        let rest = self.rest();
        let quote = rest.chars().next().ok_or("unexpected end of file")?;
        if quote != '"' && quote != '`' {
            return Err("expected import path".to_string());
        }
        let mut out = String::new();
        let mut chars = rest[1..].char_indices();
        while let Some((i, c)) = chars.next() {
            if c == quote {
                self.pos += 1 + i + 1;
                return Ok(out);
            }
            if c == '\\' && quote == '"' {
                if let Some((_, esc)) = chars.next() {
                    out.push(esc);
                }
                continue;
            }
            if c == '\n' && quote == '"' {
                break;
            }
            out.push(c);
        }
        Err("string literal not terminated".to_string())
    }

    fn import_spec(&mut self) -> Result<String, String> {
        if !self.eat('.') {
            let _ = self.ident();
        }
        self.skip()?;
        self.string_lit()
    }
}

/// Read the header of a Go source file.
pub fn parse(src: &str) -> Result<Header, String> {
    let mut header = Header::default();
    let src = src.strip_prefix('\u{FEFF}').unwrap_or(src);
    let mut s = Scanner { src, pos: 0 };
    {
        let mut go_build: Option<String> = None;
        let mut plus_build: Vec<String> = Vec::new();
        s.skip_trivia(&mut |comment: &str| {
            if let Some(expr) = comment.strip_prefix("go:build") {
                if go_build.is_none() && (expr.is_empty() || expr.starts_with([' ', '\t'])) {
                    go_build = Some(expr.trim().to_string());
                }
            } else if let Some(body) = comment.trim_start().strip_prefix("+build") {
                if body.is_empty() || body.starts_with([' ', '\t']) {
                    plus_build.push(body.trim().to_string());
                }
            }
        })?;
        header.go_build = go_build;
        header.plus_build = plus_build;
    }
    if !s.peek_keyword("package") {
        return Err("expected 'package', found something else".to_string());
    }
    s.pos += "package".len();
    s.skip()?;
    header.package = s
        .ident()
        .ok_or_else(|| "expected package name".to_string())?
        .to_string();

    loop {
        s.skip()?;
        if s.eat(';') {
            continue;
        }
        if !s.peek_keyword("import") {
            break;
        }
        s.pos += "import".len();
        s.skip()?;
        if s.eat('(') {
            loop {
                s.skip()?;
                if s.eat(')') {
                    break;
                }
                if s.eat(';') {
                    continue;
                }
                header.imports.push(s.import_spec()?);
            }
        } else {
            header.imports.push(s.import_spec()?);
        }
    }
    Ok(header)
}
