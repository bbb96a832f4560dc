//! Macro-invocation scanner.
//!
//! Finds calls such as `OBJECT(MODEL_GOOMBA, 100, 0, 200, 0, 90, 0, 0x1, bhvGoomba),`
//! in loosely formatted C and reports each with its exact byte span. The
//! span starts at the macro name and ends after the optional trailing
//! separator (plus the whitespace that follows it), so removing a span
//! removes the call and its line break but nothing belonging to a
//! neighbour.
//!
//! Scanning is best effort: a candidate that does not fit the grammar is
//! skipped and the scan carries on after its name.

use std::ops::Range;

use super::lexer::{Cursor, is_ident_continue, is_ident_start, strip_comments};

/// Number of arguments a macro variant takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == k,
            Arity::AtLeast(k) => n >= k,
        }
    }

    fn weight(self) -> usize {
        match self {
            Arity::Exact(k) | Arity::AtLeast(k) => k,
        }
    }
}

/// One spelling of a macro, e.g. `OBJECT_WITH_ACTS` with ten arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub name: &'static str,
    pub arity: Arity,
}

impl Variant {
    pub const fn new(name: &'static str, arity: Arity) -> Self {
        Self { name, arity }
    }
}

/// A family of variants scanned together.
#[derive(Debug, Clone, Copy)]
pub struct Grammar {
    pub variants: &'static [Variant],
    /// Whether an argument may itself contain balanced parentheses.
    pub nested: bool,
}

impl Grammar {
    pub fn variant(&self, name: &str) -> Option<&'static Variant> {
        self.variants.iter().find(|v| v.name == name)
    }
}

/// The grammars of every macro the editor understands.
pub mod grammar {
    use super::{Arity, Grammar, Variant};

    pub const OBJECT: Grammar = Grammar {
        variants: &[
            Variant::new("OBJECT_WITH_ACTS", Arity::Exact(10)),
            Variant::new("OBJECT", Arity::Exact(9)),
        ],
        nested: true,
    };

    pub const MARIO_POS: Grammar = Grammar {
        variants: &[Variant::new("MARIO_POS", Arity::Exact(5))],
        nested: true,
    };

    pub const MACRO_OBJECT: Grammar = Grammar {
        variants: &[
            Variant::new("MACRO_OBJECT_WITH_BHV_PARAM", Arity::Exact(6)),
            Variant::new("MACRO_OBJECT", Arity::Exact(5)),
        ],
        nested: true,
    };

    pub const SPECIAL_OBJECT: Grammar = Grammar {
        variants: &[
            Variant::new("SPECIAL_OBJECT_WITH_YAW_AND_PARAM", Arity::Exact(6)),
            Variant::new("SPECIAL_OBJECT_WITH_YAW", Arity::Exact(5)),
            Variant::new("SPECIAL_OBJECT", Arity::Exact(4)),
        ],
        nested: true,
    };

    pub const AREA: Grammar = Grammar {
        variants: &[Variant::new("AREA", Arity::AtLeast(1))],
        nested: true,
    };

    pub const END_AREA: Grammar = Grammar {
        variants: &[Variant::new("END_AREA", Arity::Exact(0))],
        nested: false,
    };

    pub const JUMP_LINK: Grammar = Grammar {
        variants: &[Variant::new("JUMP_LINK", Arity::Exact(1))],
        nested: false,
    };

    pub const MACRO_OBJECTS: Grammar = Grammar {
        variants: &[Variant::new("MACRO_OBJECTS", Arity::Exact(1))],
        nested: false,
    };

    pub const MACRO_OBJECT_END: Grammar = Grammar {
        variants: &[Variant::new("MACRO_OBJECT_END", Arity::Exact(0))],
        nested: false,
    };

    pub const LOAD_MODEL_FROM_GEO: Grammar = Grammar {
        variants: &[Variant::new("LOAD_MODEL_FROM_GEO", Arity::Exact(2))],
        nested: true,
    };

    pub const COL_SPECIAL_INIT: Grammar = Grammar {
        variants: &[Variant::new("COL_SPECIAL_INIT", Arity::Exact(1))],
        nested: true,
    };

    pub const COL_END: Grammar = Grammar {
        variants: &[Variant::new("COL_END", Arity::Exact(0))],
        nested: false,
    };
}

/// One matched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The variant that matched, e.g. `MACRO_OBJECT_WITH_BHV_PARAM`.
    pub name: &'static str,
    /// Arguments with comments removed, trimmed.
    pub args: Vec<String>,
    /// Arguments exactly as written (comments kept), trimmed.
    pub raw_args: Vec<String>,
    /// Absolute offset of the macro name.
    pub offset: usize,
    /// Bytes from the macro name up to and including the closing `)`.
    pub call_len: usize,
    /// Full span length including the trailing separator.
    pub len: usize,
}

impl Invocation {
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Offset right after the closing parenthesis.
    pub fn call_end(&self) -> usize {
        self.offset + self.call_len
    }

    /// Separator and whitespace captured after the call.
    pub fn tail<'t>(&self, text: &'t str) -> &'t str {
        &text[self.call_end()..self.end()]
    }

    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(String::as_str).unwrap_or("")
    }

    fn overlaps(&self, other: &Invocation) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// Lazy left-to-right scan of `text` for one grammar.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    cursor: Cursor<'a>,
    end: usize,
    grammar: Grammar,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str, grammar: Grammar) -> Self {
        Self::within(text, 0..text.len(), grammar)
    }

    /// Scans only calls whose name starts inside `range`; offsets stay
    /// absolute to `text`.
    pub fn within(text: &'a str, range: Range<usize>, grammar: Grammar) -> Self {
        let end = range.end.min(text.len());
        Self {
            text,
            cursor: Cursor::at(text, range.start),
            end,
            grammar,
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Invocation;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor.pos() < self.end {
            if self.cursor.skip_comment() || self.cursor.skip_string() {
                continue;
            }
            let b = self.cursor.peek()?;
            let at_boundary = !self.cursor.prev().is_some_and(is_ident_continue);
            if !(is_ident_start(b) && at_boundary) {
                self.cursor.bump();
                continue;
            }

            let start = self.cursor.pos();
            let ident = self.cursor.read_ident()?;
            let Some(variant) = self.grammar.variant(ident) else {
                continue;
            };
            match parse_call(self.text, start, self.cursor.clone(), variant, self.grammar.nested) {
                Some(inv) => {
                    self.cursor = Cursor::at(self.text, inv.end());
                    return Some(inv);
                }
                None => tracing::debug!(at = start, name = ident, "skipping malformed invocation"),
            }
        }
        None
    }
}

/// Matches a call of `grammar` that starts exactly at `offset`.
pub fn match_at(text: &str, offset: usize, grammar: &Grammar) -> Option<Invocation> {
    let mut cursor = Cursor::at(text, offset);
    if cursor.prev().is_some_and(is_ident_continue) {
        return None;
    }
    let ident = cursor.read_ident()?;
    let variant = grammar.variant(ident)?;
    parse_call(text, offset, cursor, variant, grammar.nested)
}

/// Scans several grammars over the same text.
///
/// More specific variants (longer names, then more arguments) are applied
/// first and a later match overlapping an accepted one is dropped. The
/// result is ordered by offset.
pub fn scan_all(text: &str, grammars: &[Grammar]) -> Vec<Invocation> {
    let mut variants: Vec<(&'static Variant, bool)> = grammars
        .iter()
        .flat_map(|g| g.variants.iter().map(move |v| (v, g.nested)))
        .collect();
    variants.sort_by(|(a, _), (b, _)| {
        b.name
            .len()
            .cmp(&a.name.len())
            .then(b.arity.weight().cmp(&a.arity.weight()))
    });

    let mut accepted: Vec<Invocation> = Vec::new();
    for (variant, nested) in variants {
        let single = Grammar {
            variants: std::slice::from_ref(variant),
            nested,
        };
        for inv in Scanner::new(text, single) {
            if accepted.iter().any(|a| a.overlaps(&inv)) {
                tracing::debug!(at = inv.offset, name = inv.name, "dropping overlapped match");
                continue;
            }
            accepted.push(inv);
        }
    }
    accepted.sort_by_key(|inv| inv.offset);
    accepted
}

/// Parses `( args ) [sep]` after a macro name; `cursor` sits right
/// after the name.
fn parse_call(
    text: &str,
    start: usize,
    mut cursor: Cursor<'_>,
    variant: &'static Variant,
    nested: bool,
) -> Option<Invocation> {
    cursor.skip_trivia();
    if !cursor.eat(b'(') {
        return None;
    }

    let mut raw: Vec<&str> = Vec::new();
    let mut arg_start = cursor.pos();
    let mut depth = 0usize;
    loop {
        if cursor.skip_comment() || cursor.skip_string() {
            continue;
        }
        match cursor.peek()? {
            b'(' => {
                if !nested {
                    return None;
                }
                depth += 1;
            }
            b')' if depth > 0 => depth -= 1,
            b')' => {
                raw.push(&text[arg_start..cursor.pos()]);
                cursor.bump();
                break;
            }
            b',' if depth == 0 => {
                raw.push(&text[arg_start..cursor.pos()]);
                arg_start = cursor.pos() + 1;
            }
            b';' | b'{' | b'}' => return None,
            _ => {}
        }
        cursor.bump();
    }

    let mut args: Vec<String> = raw.iter().map(|r| strip_comments(r)).collect();
    if args.len() == 1 && args[0].is_empty() {
        args.clear();
        raw.clear();
    }
    if args.iter().any(String::is_empty) || !variant.arity.accepts(args.len()) {
        return None;
    }

    let call_end = cursor.pos();
    let mut tail = cursor.clone();
    tail.skip_whitespace();
    let end = if matches!(tail.peek(), Some(b',' | b';')) {
        tail.bump();
        tail.skip_whitespace();
        tail.pos()
    } else {
        call_end
    };

    Some(Invocation {
        name: variant.name,
        args,
        raw_args: raw.iter().map(|r| r.trim().to_string()).collect(),
        offset: start,
        call_len: call_end - start,
        len: end - start,
    })
}
