//! Built-in rules (component F): arithmetic, text, list, optional,
//! record/union combinators, and build/fold fusion. Operates on the
//! application spine (component D) so each rule reads as a concise pattern
//! match on head and argument slots, per the spec's own notation.

use std::rc::Rc;

use indexmap::IndexMap;
use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;

use dhall_syntax::{
    rc, shift, Builtin, Expr, InterpolatedText, Label, RawExpr, RecordMap, Spine, UnionMap, V,
};

use crate::engine::{normalize_with, NormalizationRules};

/// Dispatches a fully children-normalized application spine to the built-in
/// rule set. Returns `None` to fall through to a plain congruence rebuild.
pub(crate) fn apply(spine: &Spine, rules: &dyn NormalizationRules) -> Option<Expr> {
    match spine.head.as_raw() {
        RawExpr::Builtin(b) => apply_builtin(*b, &spine.args, rules),
        _ => None,
    }
}

fn apply_builtin(b: Builtin, args: &[Expr], rules: &dyn NormalizationRules) -> Option<Expr> {
    use Builtin::*;
    match (b, args) {
        (NaturalToInteger, [n]) => {
            let n = n.natural_lit()?;
            Some(rc(RawExpr::IntegerLit(BigInt::from(n.clone()))))
        }
        (NaturalShow, [n]) => {
            let n = n.natural_lit()?;
            Some(text_literal(n.to_string()))
        }
        (NaturalIsZero, [n]) => {
            use num_traits::Zero;
            let n = n.natural_lit()?;
            Some(rc(RawExpr::BoolLit(n.is_zero())))
        }
        (NaturalEven, [n]) => {
            let n = n.natural_lit()?;
            Some(rc(RawExpr::BoolLit(n % 2u32 == BigUint::from(0u32))))
        }
        (NaturalOdd, [n]) => {
            let n = n.natural_lit()?;
            Some(rc(RawExpr::BoolLit(n % 2u32 != BigUint::from(0u32))))
        }
        (IntegerShow, [z]) => {
            let z = z.integer_lit()?;
            let s = if *z >= BigInt::from(0) {
                format!("+{}", z)
            } else {
                z.to_string()
            };
            Some(text_literal(s))
        }
        (IntegerToDouble, [z]) => {
            let z = z.integer_lit()?;
            let d = z.to_f64()?;
            Some(rc(RawExpr::DoubleLit(d.into())))
        }
        (DoubleShow, [d]) => {
            let d = d.double_lit()?;
            Some(text_literal(d.to_string()))
        }
        (TextShow, [s]) => {
            let t = s.text_lit()?;
            if !t.tail.is_empty() {
                return None;
            }
            Some(text_literal(escape_text_source(&t.head)))
        }

        (ListLength, [_, xs]) => {
            if let RawExpr::ListLit(_, items) = xs.as_raw() {
                Some(rc(RawExpr::NaturalLit(BigUint::from(items.len()))))
            } else {
                None
            }
        }
        (ListHead, [ty, xs]) => list_edge(ty, xs, true),
        (ListLast, [ty, xs]) => list_edge(ty, xs, false),
        (ListIndexed, [_, xs]) => {
            if let RawExpr::ListLit(ty, items) = xs.as_raw() {
                if items.is_empty() {
                    let record_ty = indexed_record_type(ty.as_ref());
                    return Some(rc(RawExpr::ListLit(record_ty, vec![])));
                }
                let indexed = items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let mut fields = RecordMap::new();
                        fields.insert(Label::from("index"), rc(RawExpr::NaturalLit(BigUint::from(i))));
                        fields.insert(Label::from("value"), v.clone());
                        rc(RawExpr::RecordLit(fields))
                    })
                    .collect();
                Some(rc(RawExpr::ListLit(None, indexed)))
            } else {
                None
            }
        }
        (ListReverse, [_, xs]) => {
            if let RawExpr::ListLit(ty, items) = xs.as_raw() {
                let mut items = items.clone();
                items.reverse();
                Some(rc(RawExpr::ListLit(ty.clone(), items)))
            } else {
                None
            }
        }
        (ListBuild, [a, g]) => {
            if let Some(e) = fusion_arg(g, Builtin::ListFold, 2) {
                return Some(e);
            }
            Some(normalize_with(&list_build_desugar(a, g), rules))
        }
        (ListFold, [_, xs, _, cons, nil]) => {
            if let RawExpr::ListLit(_, items) = xs.as_raw() {
                let mut acc = nil.clone();
                for x in items.iter().rev() {
                    acc = rc(RawExpr::App(rc(RawExpr::App(cons.clone(), x.clone())), acc));
                }
                Some(normalize_with(&acc, rules))
            } else {
                None
            }
        }

        (NaturalBuild, [g]) => {
            if let Some(e) = fusion_arg(g, Builtin::NaturalFold, 1) {
                return Some(e);
            }
            Some(normalize_with(&natural_build_desugar(g), rules))
        }
        (NaturalFold, [n, _, succ, zero]) => {
            let n = n.natural_lit()?;
            let count = n.to_usize()?;
            let mut acc = zero.clone();
            for _ in 0..count {
                acc = rc(RawExpr::App(succ.clone(), acc));
            }
            Some(normalize_with(&acc, rules))
        }

        (OptionalBuild, [a, g]) => {
            if let Some(e) = fusion_arg(g, Builtin::OptionalFold, 2) {
                return Some(e);
            }
            Some(normalize_with(&optional_build_desugar(a, g), rules))
        }
        (OptionalFold, [_, opt, _, just, nothing]) => match opt.as_raw() {
            RawExpr::App(f, _) if matches!(f.as_raw(), RawExpr::None_) => Some(nothing.clone()),
            RawExpr::Some_(x) => Some(normalize_with(&rc(RawExpr::App(just.clone(), x.clone())), rules)),
            _ => None,
        },

        _ => None,
    }
}

fn text_literal(s: String) -> Expr {
    rc(RawExpr::TextLit(InterpolatedText::from_text(
        Rc::<str>::from(s.as_str()),
    )))
}

fn escape_text_source(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn list_edge(ty: &Expr, xs: &Expr, head: bool) -> Option<Expr> {
    if let RawExpr::ListLit(elem_ty, items) = xs.as_raw() {
        if items.is_empty() {
            let t = elem_ty.clone().unwrap_or_else(|| ty.clone());
            return Some(rc(RawExpr::App(rc(RawExpr::None_), t)));
        }
        let picked = if head {
            items.first().unwrap()
        } else {
            items.last().unwrap()
        };
        Some(rc(RawExpr::Some_(picked.clone())))
    } else {
        None
    }
}

fn indexed_record_type(elem_ty: Option<&Expr>) -> Option<Expr> {
    let elem_ty = elem_ty?;
    let mut fields = RecordMap::new();
    fields.insert(Label::from("index"), rc(RawExpr::Natural));
    fields.insert(Label::from("value"), elem_ty.clone());
    Some(rc(RawExpr::Record(fields)))
}

/// Recognizes `List/build _ (List/fold _ e)`-shaped fusion (and the
/// `Natural`/`Optional` analogues): `g`'s own application spine is headed by
/// the matching fold builtin, partially applied with exactly
/// `prefix_arity` arguments — i.e. it hasn't yet received the
/// `(resultType, cons, nil)`-shaped remainder that `build` would supply.
fn fusion_arg(g: &Expr, fold_builtin: Builtin, prefix_arity: usize) -> Option<Expr> {
    let sp = dhall_syntax::view(g);
    if sp.args.len() != prefix_arity {
        return None;
    }
    if !sp.head.is_builtin(fold_builtin) {
        return None;
    }
    sp.args.last().cloned()
}

fn list_build_desugar(elem_ty: &Expr, g: &Expr) -> Expr {
    let a = Label::from("a");
    let xs = Label::from("as");
    let shifted_ty = shift(1, &V(a.clone(), 0), elem_ty);
    let cons = rc(RawExpr::Lam(
        a.clone(),
        elem_ty.clone(),
        rc(RawExpr::Lam(
            xs.clone(),
            rc(RawExpr::App(rc(RawExpr::List), shifted_ty)),
            rc(RawExpr::ListAppend(
                rc(RawExpr::ListLit(None, vec![rc(RawExpr::Var(V(a, 0)))])),
                rc(RawExpr::Var(V(xs, 0))),
            )),
        )),
    ));
    let nil = rc(RawExpr::ListLit(Some(elem_ty.clone()), vec![]));
    let list_ty = rc(RawExpr::App(rc(RawExpr::List), elem_ty.clone()));
    apply_chain(g.clone(), vec![list_ty, cons, nil])
}

fn natural_build_desugar(g: &Expr) -> Expr {
    let x = Label::from("x");
    let succ = rc(RawExpr::Lam(
        x.clone(),
        rc(RawExpr::Natural),
        rc(RawExpr::NaturalPlus(
            rc(RawExpr::Var(V(x, 0))),
            rc(RawExpr::NaturalLit(BigUint::from(1u32))),
        )),
    ));
    let zero = rc(RawExpr::NaturalLit(BigUint::from(0u32)));
    apply_chain(g.clone(), vec![rc(RawExpr::Natural), succ, zero])
}

fn optional_build_desugar(elem_ty: &Expr, g: &Expr) -> Expr {
    let a = Label::from("a");
    let just = rc(RawExpr::Lam(
        a.clone(),
        elem_ty.clone(),
        rc(RawExpr::Some_(rc(RawExpr::Var(V(a, 0))))),
    ));
    let nothing = rc(RawExpr::App(rc(RawExpr::None_), elem_ty.clone()));
    let optional_ty = rc(RawExpr::App(rc(RawExpr::Optional), elem_ty.clone()));
    apply_chain(g.clone(), vec![optional_ty, just, nothing])
}

fn apply_chain(head: Expr, args: Vec<Expr>) -> Expr {
    args.into_iter().fold(head, |acc, a| rc(RawExpr::App(acc, a)))
}

/// The `{}`/`Record {}` empty-identity shared by `Combine`, `CombineTypes`
/// and `Prefer`: `l` or `r` being an empty record literal makes the whole
/// expression the other side, regardless of whether that side is itself a
/// literal.
pub(crate) fn merge_identity(l: &Expr, r: &Expr) -> Option<Expr> {
    if matches!(l.as_raw(), RawExpr::RecordLit(m) if m.is_empty()) {
        return Some(r.clone());
    }
    if matches!(r.as_raw(), RawExpr::RecordLit(m) if m.is_empty()) {
        return Some(l.clone());
    }
    None
}

pub(crate) fn merge_identity_type(l: &Expr, r: &Expr) -> Option<Expr> {
    if matches!(l.as_raw(), RawExpr::Record(m) if m.is_empty()) {
        return Some(r.clone());
    }
    if matches!(r.as_raw(), RawExpr::Record(m) if m.is_empty()) {
        return Some(l.clone());
    }
    None
}

/// Left-biased recursive merge for `Combine` on record literals: shared
/// keys recurse (further, if both sides are themselves record literals;
/// otherwise the pair is left as an unreduced `Combine` congruence node).
pub(crate) fn combine_record_lits(a: &RecordMap, b: &RecordMap) -> RecordMap {
    let mut result: RecordMap = a.clone();
    for (k, v) in b {
        match result.get(k).cloned() {
            Some(existing) => {
                let merged = match (existing.record_lit(), v.record_lit()) {
                    (Some(m1), Some(m2)) => rc(RawExpr::RecordLit(combine_record_lits(m1, m2))),
                    _ => rc(RawExpr::Combine(existing, v.clone())),
                };
                result.insert(k.clone(), merged);
            }
            None => {
                result.insert(k.clone(), v.clone());
            }
        }
    }
    result
}

/// Same shape as [`combine_record_lits`] but for `CombineTypes` over
/// `Record` type maps.
pub(crate) fn combine_record_types(a: &RecordMap, b: &RecordMap) -> RecordMap {
    let mut result: RecordMap = a.clone();
    for (k, v) in b {
        match result.get(k).cloned() {
            Some(existing) => {
                let merged = match (record_type(&existing), record_type(v)) {
                    (Some(m1), Some(m2)) => rc(RawExpr::Record(combine_record_types(m1, m2))),
                    _ => rc(RawExpr::CombineTypes(existing, v.clone())),
                };
                result.insert(k.clone(), merged);
            }
            None => {
                result.insert(k.clone(), v.clone());
            }
        }
    }
    result
}

fn record_type(e: &Expr) -> Option<&RecordMap> {
    match e.as_raw() {
        RawExpr::Record(m) => Some(m),
        _ => None,
    }
}

/// Right-biased union for `Prefer`: `r`'s value wins on overlapping keys,
/// but keys keep `l`'s original position; new keys from `r` are appended in
/// their relative order.
pub(crate) fn prefer_merge(a: &RecordMap, b: &RecordMap) -> RecordMap {
    let mut result: RecordMap = IndexMap::new();
    for (k, v) in a {
        let value = b.get(k).cloned().unwrap_or_else(|| v.clone());
        result.insert(k.clone(), value);
    }
    for (k, v) in b {
        if !result.contains_key(k) {
            result.insert(k.clone(), v.clone());
        }
    }
    result
}

/// `λ(k: τ) → UnionLit(k, Var(k,0), kts \ {k})`, shared by `Constructors`
/// and `Field` on a union type.
pub(crate) fn union_constructor(k: &Label, ty: &Expr, kts: &UnionMap) -> Expr {
    let rest: UnionMap = kts
        .iter()
        .filter(|(label, _)| *label != k)
        .map(|(label, ty)| (label.clone(), ty.clone()))
        .collect();
    rc(RawExpr::Lam(
        k.clone(),
        ty.clone(),
        rc(RawExpr::UnionLit(k.clone(), rc(RawExpr::Var(V(k.clone(), 0))), rest)),
    ))
}

pub(crate) fn constructors_record(kts: &UnionMap) -> RecordMap {
    kts.iter()
        .map(|(k, ty)| (k.clone(), union_constructor(k, ty, kts)))
        .collect()
}

/// Splices any interpolated `TextLit` directly into the surrounding chunk
/// sequence (§4.5's `TextLit` rule), without yet applying the
/// `"" ⟨e⟩ ""` single-interpolation collapse (left to the caller via
/// `InterpolatedText::as_single_expr`).
pub(crate) fn splice_text(t: &InterpolatedText) -> InterpolatedText {
    let mut chunks: Vec<String> = vec![t.head.to_string()];
    let mut exprs: Vec<Expr> = Vec::new();

    for (e, s) in &t.tail {
        match e.as_raw() {
            RawExpr::TextLit(inner) => {
                chunks.last_mut().unwrap().push_str(&inner.head);
                for (e2, s2) in &inner.tail {
                    exprs.push(e2.clone());
                    chunks.push(s2.to_string());
                }
            }
            _ => {
                exprs.push(e.clone());
                chunks.push(String::new());
            }
        }
        chunks.last_mut().unwrap().push_str(s);
    }

    let mut chunks = chunks.into_iter();
    let head: Rc<str> = Rc::from(chunks.next().unwrap().as_str());
    let tail = exprs
        .into_iter()
        .zip(chunks)
        .map(|(e, s)| (e, Rc::from(s.as_str())))
        .collect();
    InterpolatedText { head, tail }
}

pub(crate) fn concat_text(l: &InterpolatedText, r: &InterpolatedText) -> InterpolatedText {
    if l.tail.is_empty() {
        let mut head = l.head.to_string();
        head.push_str(&r.head);
        return InterpolatedText {
            head: Rc::from(head.as_str()),
            tail: r.tail.clone(),
        };
    }
    let mut tail = l.tail.clone();
    let (last_expr, last_s) = tail.pop().unwrap();
    let mut joined = last_s.to_string();
    joined.push_str(&r.head);
    tail.push((last_expr, Rc::from(joined.as_str())));
    tail.extend(r.tail.iter().cloned());
    InterpolatedText {
        head: l.head.clone(),
        tail,
    }
}
