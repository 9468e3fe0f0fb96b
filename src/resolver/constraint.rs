//! Build constraint expressions (`//go:build` and legacy `// +build`).

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Tag(String),
    Not(Box<Constraint>),
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
}

impl Constraint {
    /// Evaluate with `has_tag` deciding each tag.
    pub fn eval(&self, has_tag: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Constraint::Tag(t) => has_tag(t),
            Constraint::Not(x) => !x.eval(has_tag),
            Constraint::And(a, b) => a.eval(has_tag) && b.eval(has_tag),
            Constraint::Or(a, b) => a.eval(has_tag) || b.eval(has_tag),
        }
    }

    /// Parse the expression following `//go:build`.
    pub fn parse_go_build(expr: &str) -> Result<Self, String> {
        let tokens = tokenize(expr)?;
        let mut p = Parser { tokens, pos: 0 };
        let c = p.or()?;
        if p.pos != p.tokens.len() {
            return Err(format!("unexpected token in build constraint: {}", expr));
        }
        Ok(c)
    }

    /// Combine legacy `+build` lines: lines AND, spaces OR, commas AND.
    pub fn parse_plus_build(lines: &[String]) -> Result<Option<Self>, String> {
        let mut all: Option<Constraint> = None;
        for line in lines {
            let mut any: Option<Constraint> = None;
            for option in line.split_whitespace() {
                let mut terms: Option<Constraint> = None;
                for term in option.split(',') {
                    let (neg, name) = match term.strip_prefix('!') {
                        Some(rest) => (true, rest),
                        None => (false, term),
                    };
                    if name.is_empty() || !name.chars().all(is_tag_char) {
                        return Err(format!("invalid +build term: {}", term));
                    }
                    let mut c = Constraint::Tag(name.to_string());
                    if neg {
                        c = Constraint::Not(Box::new(c));
                    }
                    terms = Some(and(terms, c));
                }
                if let Some(t) = terms {
                    any = Some(match any {
                        Some(prev) => Constraint::Or(Box::new(prev), Box::new(t)),
                        None => t,
                    });
                }
            }
            if let Some(line_c) = any {
                all = Some(and(all, line_c));
            }
        }
        Ok(all)
    }
}

fn and(prev: Option<Constraint>, next: Constraint) -> Constraint {
    match prev {
        Some(p) => Constraint::And(Box::new(p), Box::new(next)),
        None => next,
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Tag(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(s: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = s.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '!' => {
                out.push(Token::Not);
                i += 1;
            }
            '(' => {
                out.push(Token::Open);
                i += 1;
            }
            ')' => {
                out.push(Token::Close);
                i += 1;
            }
            '&' | '|' => {
                if chars.get(i + 1) != Some(&c) {
                    return Err(format!("invalid operator in build constraint: {}", s));
                }
                out.push(if c == '&' { Token::And } else { Token::Or });
                i += 2;
            }
            _ if is_tag_char(c) => {
                let start = i;
                while i < chars.len() && is_tag_char(chars[i]) {
                    i += 1;
                }
                out.push(Token::Tag(chars[start..i].iter().collect()));
            }
            _ => return Err(format!("invalid character {:?} in build constraint", c)),
        }
    }
    Ok(out)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn or(&mut self) -> Result<Constraint, String> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = Constraint::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Constraint, String> {
        let mut left = self.not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.not()?;
            left = Constraint::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Constraint, String> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(Constraint::Not(Box::new(self.not()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Constraint, String> {
        match self.tokens.get(self.pos).cloned() {
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.or()?;
                if self.peek() != Some(&Token::Close) {
                    return Err("missing ) in build constraint".to_string());
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(Token::Tag(t)) => {
                self.pos += 1;
                Ok(Constraint::Tag(t))
            }
            _ => Err("unexpected end of build constraint".to_string()),
        }
    }
}
