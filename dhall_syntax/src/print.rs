//! A pretty-printer for `Expr`, used both by `Display` and by the parser's
//! own round-trip tests. One print phase per grammar precedence tier (see
//! `grammar/dhall.pest`); a child is parenthesized exactly when its own
//! phase is looser than the phase its parent requires of it — this mirrors
//! the grammar directly instead of hand-listing parenthesization cases.

use std::fmt::{self, Display};

use crate::ast::{Expr, RawExpr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Base,
    Equivalence,
    ImportAlt,
    Or,
    Plus,
    TextAppend,
    ListAppend,
    CombineTypes,
    Prefer,
    Combine,
    And,
    NotEqual,
    Equal,
    Times,
    App,
    Import,
    Primitive,
}

pub fn fmt_expr(e: &Expr, f: &mut fmt::Formatter) -> fmt::Result {
    fmt_phase(e, f, Phase::Base)
}

fn needs_paren(e: &RawExpr, phase: Phase) -> bool {
    use RawExpr::*;
    match e {
        Lam(..) | BoolIf(..) | Pi(..) | Let(..) | Annot(..) => phase > Phase::Base,
        Equivalence(..) => phase > Phase::Equivalence,
        ImportAlt(..) => phase > Phase::ImportAlt,
        BoolOr(..) => phase > Phase::Or,
        NaturalPlus(..) => phase > Phase::Plus,
        TextAppend(..) => phase > Phase::TextAppend,
        ListAppend(..) => phase > Phase::ListAppend,
        CombineTypes(..) => phase > Phase::CombineTypes,
        Prefer(..) => phase > Phase::Prefer,
        Combine(..) => phase > Phase::Combine,
        BoolAnd(..) => phase > Phase::And,
        BoolNE(..) => phase > Phase::NotEqual,
        BoolEQ(..) => phase > Phase::Equal,
        NaturalTimes(..) => phase > Phase::Times,
        App(..) | Some_(..) | Constructors(..) | Merge(..) => phase > Phase::App,
        Field(..) | Project(..) => phase > Phase::Import,
        _ => false,
    }
}

fn fmt_phase(e: &Expr, f: &mut fmt::Formatter, phase: Phase) -> fmt::Result {
    let paren = needs_paren(e.as_raw(), phase);
    if paren {
        f.write_str("(")?;
    }
    fmt_bare(e, f)?;
    if paren {
        f.write_str(")")?;
    }
    Ok(())
}

fn binop(
    f: &mut fmt::Formatter,
    op: &str,
    phase: Phase,
    a: &Expr,
    b: &Expr,
) -> fmt::Result {
    fmt_phase(a, f, phase)?;
    write!(f, " {} ", op)?;
    fmt_phase(b, f, phase)
}

fn fmt_bare(e: &Expr, f: &mut fmt::Formatter) -> fmt::Result {
    use RawExpr::*;
    match e.as_raw() {
        Const(c) => write!(f, "{}", c),
        Var(v) => {
            if v.1 == 0 {
                write!(f, "{}", v.0)
            } else {
                write!(f, "{}@{}", v.0, v.1)
            }
        }
        Lam(x, t, b) => {
            write!(f, "λ({} : ", x)?;
            fmt_phase(t, f, Phase::Base)?;
            write!(f, ") → ")?;
            fmt_phase(b, f, Phase::Base)
        }
        Pi(x, t, b) if x.as_str() == "_" => {
            fmt_phase(t, f, Phase::ImportAlt)?;
            write!(f, " → ")?;
            fmt_phase(b, f, Phase::Base)
        }
        Pi(x, t, b) => {
            write!(f, "∀({} : ", x)?;
            fmt_phase(t, f, Phase::Base)?;
            write!(f, ") → ")?;
            fmt_phase(b, f, Phase::Base)
        }
        App(g, a) => {
            fmt_phase(g, f, Phase::Import)?;
            write!(f, " ")?;
            fmt_phase(a, f, Phase::Import)
        }
        Let(x, ty, v, b) => {
            write!(f, "let {}", x)?;
            if let Some(ty) = ty {
                write!(f, " : ")?;
                fmt_phase(ty, f, Phase::Base)?;
            }
            write!(f, " = ")?;
            fmt_phase(v, f, Phase::Base)?;
            write!(f, " in ")?;
            fmt_phase(b, f, Phase::Base)
        }
        Annot(x, t) => {
            fmt_phase(x, f, Phase::ImportAlt)?;
            write!(f, " : ")?;
            fmt_phase(t, f, Phase::Base)
        }
        Bool => write!(f, "Bool"),
        BoolLit(true) => write!(f, "True"),
        BoolLit(false) => write!(f, "False"),
        BoolAnd(a, b) => binop(f, "&&", Phase::And, a, b),
        BoolOr(a, b) => binop(f, "||", Phase::Or, a, b),
        BoolEQ(a, b) => binop(f, "==", Phase::Equal, a, b),
        BoolNE(a, b) => binop(f, "!=", Phase::NotEqual, a, b),
        BoolIf(c, t, e) => {
            write!(f, "if ")?;
            fmt_phase(c, f, Phase::Base)?;
            write!(f, " then ")?;
            fmt_phase(t, f, Phase::Base)?;
            write!(f, " else ")?;
            fmt_phase(e, f, Phase::Base)
        }
        Natural => write!(f, "Natural"),
        NaturalLit(n) => write!(f, "{}", n),
        NaturalPlus(a, b) => binop(f, "+", Phase::Plus, a, b),
        NaturalTimes(a, b) => binop(f, "*", Phase::Times, a, b),
        Integer => write!(f, "Integer"),
        IntegerLit(n) => {
            if *n >= num_bigint::BigInt::from(0) {
                write!(f, "+{}", n)
            } else {
                write!(f, "{}", n)
            }
        }
        Double => write!(f, "Double"),
        DoubleLit(n) => write!(f, "{}", n),
        Text => write!(f, "Text"),
        TextLit(t) => fmt_text_lit(t, f),
        TextAppend(a, b) => binop(f, "++", Phase::TextAppend, a, b),
        List => write!(f, "List"),
        ListLit(Some(t), xs) if xs.is_empty() => {
            write!(f, "[] : List ")?;
            fmt_phase(t, f, Phase::Import)
        }
        ListLit(_, xs) => fmt_seq(f, "[", ", ", "]", xs, Phase::Base),
        ListAppend(a, b) => binop(f, "#", Phase::ListAppend, a, b),
        Optional => write!(f, "Optional"),
        OptionalLit(t, None) => {
            write!(f, "None ")?;
            fmt_phase(t, f, Phase::Import)
        }
        OptionalLit(_, Some(x)) => {
            write!(f, "Some ")?;
            fmt_phase(x, f, Phase::Import)
        }
        Some_(x) => {
            write!(f, "Some ")?;
            fmt_phase(x, f, Phase::Import)
        }
        None_ => write!(f, "None"),
        Record(kts) if kts.is_empty() => write!(f, "{{}}"),
        Record(kts) => fmt_map(f, "{ ", ", ", " }", kts, |f, k, v| {
            write!(f, "{} : ", k)?;
            fmt_phase(v, f, Phase::Base)
        }),
        RecordLit(kvs) if kvs.is_empty() => write!(f, "{{=}}"),
        RecordLit(kvs) => fmt_map(f, "{ ", ", ", " }", kvs, |f, k, v| {
            write!(f, "{} = ", k)?;
            fmt_phase(v, f, Phase::Base)
        }),
        Field(r, l) => {
            fmt_phase(r, f, Phase::Primitive)?;
            write!(f, ".{}", l)
        }
        Project(r, ls) => {
            fmt_phase(r, f, Phase::Primitive)?;
            write!(f, ".{{ ")?;
            for (i, l) in ls.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", l)?;
            }
            write!(f, " }}")
        }
        Combine(a, b) => binop(f, "/\\", Phase::Combine, a, b),
        CombineTypes(a, b) => binop(f, "//\\\\", Phase::CombineTypes, a, b),
        Prefer(a, b) => binop(f, "//", Phase::Prefer, a, b),
        Union(kts) if kts.is_empty() => write!(f, "<>"),
        Union(kts) => fmt_map(f, "< ", " | ", " >", kts, |f, k, v| {
            write!(f, "{} : ", k)?;
            fmt_phase(v, f, Phase::Base)
        }),
        UnionLit(l, v, kts) => {
            write!(f, "< {} = ", l)?;
            fmt_phase(v, f, Phase::Base)?;
            for (k, t) in kts {
                write!(f, " | {} : ", k)?;
                fmt_phase(t, f, Phase::Base)?;
            }
            write!(f, " >")
        }
        Merge(h, u, ty) => {
            write!(f, "merge ")?;
            fmt_phase(h, f, Phase::Import)?;
            write!(f, " ")?;
            fmt_phase(u, f, Phase::Import)?;
            if let Some(ty) = ty {
                write!(f, " : ")?;
                fmt_phase(ty, f, Phase::App)?;
            }
            Ok(())
        }
        Constructors(u) => {
            write!(f, "constructors ")?;
            fmt_phase(u, f, Phase::Import)
        }
        Builtin(b) => write!(f, "{}", b),
        ImportAlt(a, b) => binop(f, "?", Phase::ImportAlt, a, b),
        Import(i) => write!(f, "{}", ImportDisplay(i)),
        Equivalence(a, b) => binop(f, "===", Phase::Equivalence, a, b),
    }
}

fn fmt_seq(
    f: &mut fmt::Formatter,
    open: &str,
    sep: &str,
    close: &str,
    xs: &[Expr],
    phase: Phase,
) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, x) in xs.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        fmt_phase(x, f, phase)?;
    }
    write!(f, "{}", close)
}

fn fmt_map<'a, I>(
    f: &mut fmt::Formatter,
    open: &str,
    sep: &str,
    close: &str,
    entries: I,
    mut item: impl FnMut(&mut fmt::Formatter, &crate::ast::Label, &Expr) -> fmt::Result,
) -> fmt::Result
where
    I: IntoIterator<Item = (&'a crate::ast::Label, &'a Expr)>,
{
    write!(f, "{}", open)?;
    for (i, (k, v)) in entries.into_iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        item(f, k, v)?;
    }
    write!(f, "{}", close)
}

fn fmt_text_lit(t: &crate::ast::InterpolatedText, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "\"")?;
    fmt_text_chunk(&t.head, f)?;
    for (e, s) in &t.tail {
        write!(f, "${{ ")?;
        fmt_phase(e, f, Phase::Base)?;
        write!(f, " }}")?;
        fmt_text_chunk(s, f)?;
    }
    write!(f, "\"")
}

fn fmt_text_chunk(s: &str, f: &mut fmt::Formatter) -> fmt::Result {
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\"),
            '"' => f.write_str("\\\""),
            '\u{8}' => f.write_str("\\b"),
            '\u{c}' => f.write_str("\\f"),
            '\n' => f.write_str("\\n"),
            '\r' => f.write_str("\\r"),
            '\t' => f.write_str("\\t"),
            c => write!(f, "{}", c),
        }?;
    }
    Ok(())
}

struct ImportDisplay<'a>(&'a crate::ast::Import);

impl<'a> Display for ImportDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use crate::ast::{FilePrefix, ImportKind, Scheme};
        let hashed = &self.0.hashed;
        match &hashed.kind {
            ImportKind::Missing => write!(f, "missing")?,
            ImportKind::Env(name) => write!(f, "env:{}", name)?,
            ImportKind::Local(p) => {
                let prefix = match p.prefix {
                    FilePrefix::Here => "./",
                    FilePrefix::Parent => "../",
                    FilePrefix::Home => "~/",
                    FilePrefix::Absolute => "/",
                };
                write!(f, "{}{}", prefix, p.components.join("/"))?;
            }
            ImportKind::Remote(url) => {
                let scheme = match url.scheme {
                    Scheme::HTTP => "http",
                    Scheme::HTTPS => "https",
                };
                write!(f, "{}://{}", scheme, url.authority)?;
                for c in &url.components {
                    write!(f, "/{}", c)?;
                }
                if let Some(q) = &url.query {
                    write!(f, "?{}", q)?;
                }
                if let Some(frag) = &url.fragment {
                    write!(f, "#{}", frag)?;
                }
            }
        }
        if let Some(h) = &hashed.hash {
            write!(f, " sha256:{}", hex_encode(&h.0))?;
        }
        if self.0.mode == crate::ast::ImportMode::RawText {
            write!(f, " as Text")?;
        }
        Ok(())
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{:02x}", b).unwrap();
    }
    s
}
