//! The bottom-up, child-first rewriter (component E). Every node's
//! immediate children are normalized first; the per-node rule then either
//! rebuilds the node as a plain congruence (unchanged iff every child was
//! unchanged) or replaces it with something simpler, in which case the
//! "changed" bit is set. Rules whose replacement may itself be reducible
//! (`Let`, β-reduction, `Merge`, `Field`/`Project` of a literal, built-in
//! rewrites that construct applications) re-enter `normalize_with` on their
//! result, matching the fix-point requirement in the spec this crate
//! implements.

use dhall_syntax::{
    alpha_equivalent, map_children, rc, shift_subst_shift, view, Expr, Label, RawExpr, Spine, V,
};

use crate::builtins;

/// A pluggable user normaliser (§6.4): consulted only at `App` nodes where
/// the built-in rules decline, ahead of them in the composition order. The
/// first rule returning `Some` wins.
pub trait NormalizationRules {
    fn normalize_application(&self, spine: &Spine) -> Option<Expr>;
}

impl<F> NormalizationRules for F
where
    F: Fn(&Spine) -> Option<Expr>,
{
    fn normalize_application(&self, spine: &Spine) -> Option<Expr> {
        self(spine)
    }
}

/// The empty user rule set: every application falls straight through to the
/// built-in rules.
pub struct NoUserRules;

impl NormalizationRules for NoUserRules {
    fn normalize_application(&self, _spine: &Spine) -> Option<Expr> {
        None
    }
}

/// Normalize with no user rules.
pub fn normalize(e: &Expr) -> Expr {
    normalize_with(e, &NoUserRules)
}

/// Normalize, consulting `rules` before the built-in rule set at every
/// application.
pub fn normalize_with(e: &Expr, rules: &dyn NormalizationRules) -> Expr {
    step(e, rules).0
}

/// §4.5 item 5: true iff `normalize_with` makes no change anywhere in the
/// tree.
pub fn is_normalized(e: &Expr) -> bool {
    is_normalized_with(e, &NoUserRules)
}

pub fn is_normalized_with(e: &Expr, rules: &dyn NormalizationRules) -> bool {
    !step(e, rules).1
}

/// Child-first normalization of one node, returning the result and whether
/// anything changed (in the children, at this node, or both).
fn step(e: &Expr, rules: &dyn NormalizationRules) -> (Expr, bool) {
    let mut children_changed = false;
    let rebuilt_raw = map_children(e.as_raw(), &mut |child| {
        let (new_child, changed) = step(child, rules);
        children_changed |= changed;
        new_child
    });
    let rebuilt = if children_changed { rc(rebuilt_raw) } else { e.clone() };
    apply_node_rule(&rebuilt, rules, children_changed)
}

/// Applies the per-node rule to an already children-normalized node.
/// `children_changed` is threaded through so a congruence rebuild correctly
/// reports "unchanged" only when every child was unchanged (§4.5 item 2).
fn apply_node_rule(
    e: &Expr,
    rules: &dyn NormalizationRules,
    children_changed: bool,
) -> (Expr, bool) {
    use RawExpr::*;
    match e.as_raw() {
        Annot(inner, _) => (inner.clone(), true),

        Let(x, _, v, b) => {
            let result = shift_subst_shift(&V(x.clone(), 0), v, b);
            (normalize_with(&result, rules), true)
        }

        BoolAnd(l, r) => match (l.bool_lit(), r.bool_lit()) {
            (Some(true), _) => (r.clone(), true),
            (Some(false), _) => (l.clone(), true),
            (_, Some(true)) => (l.clone(), true),
            (_, Some(false)) => (r.clone(), true),
            _ if alpha_equivalent(l, r) => (l.clone(), true),
            _ => (e.clone(), children_changed),
        },
        BoolOr(l, r) => match (l.bool_lit(), r.bool_lit()) {
            (Some(true), _) => (l.clone(), true),
            (Some(false), _) => (r.clone(), true),
            (_, Some(true)) => (r.clone(), true),
            (_, Some(false)) => (l.clone(), true),
            _ if alpha_equivalent(l, r) => (l.clone(), true),
            _ => (e.clone(), children_changed),
        },
        BoolEQ(l, r) => match (l.bool_lit(), r.bool_lit()) {
            (Some(a), Some(b)) => (rc(BoolLit(a == b)), true),
            (Some(true), _) => (r.clone(), true),
            (_, Some(true)) => (l.clone(), true),
            _ if alpha_equivalent(l, r) => (rc(BoolLit(true)), true),
            _ => (e.clone(), children_changed),
        },
        BoolNE(l, r) => match (l.bool_lit(), r.bool_lit()) {
            (Some(a), Some(b)) => (rc(BoolLit(a != b)), true),
            (Some(false), _) => (r.clone(), true),
            (_, Some(false)) => (l.clone(), true),
            _ if alpha_equivalent(l, r) => (rc(BoolLit(false)), true),
            _ => (e.clone(), children_changed),
        },
        BoolIf(c, t, f) => match c.bool_lit() {
            Some(true) => (t.clone(), true),
            Some(false) => (f.clone(), true),
            None => {
                if t.bool_lit() == Some(true) && f.bool_lit() == Some(false) {
                    (c.clone(), true)
                } else if alpha_equivalent(t, f) {
                    (t.clone(), true)
                } else {
                    (e.clone(), children_changed)
                }
            }
        },

        NaturalPlus(l, r) => match (l.natural_lit(), r.natural_lit()) {
            (Some(a), Some(b)) => (rc(NaturalLit(a + b)), true),
            (Some(a), None) if a == &num_bigint::BigUint::from(0u32) => (r.clone(), true),
            (None, Some(b)) if b == &num_bigint::BigUint::from(0u32) => (l.clone(), true),
            _ => (e.clone(), children_changed),
        },
        NaturalTimes(l, r) => {
            use num_traits::{One, Zero};
            match (l.natural_lit(), r.natural_lit()) {
                (Some(a), Some(b)) => (rc(NaturalLit(a * b)), true),
                (Some(a), _) if a.is_zero() => (l.clone(), true),
                (_, Some(b)) if b.is_zero() => (r.clone(), true),
                (Some(a), None) if a.is_one() => (r.clone(), true),
                (None, Some(b)) if b.is_one() => (l.clone(), true),
                _ => (e.clone(), children_changed),
            }
        }

        TextLit(t) => {
            let spliced = builtins::splice_text(t);
            if let Some(single) = spliced.as_single_expr() {
                (single.clone(), true)
            } else if &spliced != t {
                (rc(TextLit(spliced)), true)
            } else {
                (e.clone(), children_changed)
            }
        }
        TextAppend(l, r) => match (l.text_lit(), r.text_lit()) {
            (Some(lt), _) if lt.is_empty() => (r.clone(), true),
            (_, Some(rt)) if rt.is_empty() => (l.clone(), true),
            (Some(lt), Some(rt)) => (rc(TextLit(builtins::concat_text(lt, rt))), true),
            _ => (e.clone(), children_changed),
        },

        ListLit(Some(t), xs) if !xs.is_empty() => {
            let _ = t;
            (rc(ListLit(None, xs.clone())), true)
        }
        ListAppend(l, r) => match (l.as_raw(), r.as_raw()) {
            (ListLit(lt, lxs), ListLit(rt, rxs)) => {
                let mut xs = lxs.clone();
                xs.extend(rxs.iter().cloned());
                let ty = if xs.is_empty() {
                    lt.clone().or_else(|| rt.clone())
                } else {
                    None
                };
                (rc(ListLit(ty, xs)), true)
            }
            _ => (e.clone(), children_changed),
        },

        OptionalLit(t, None) => (rc(App(rc(None_), t.clone())), true),
        OptionalLit(_, Some(x)) => (rc(Some_(x.clone())), true),

        Combine(l, r) => match builtins::merge_identity(l, r) {
            Some(result) => (result, true),
            None => match (l.record_lit(), r.record_lit()) {
                (Some(lm), Some(rm)) => {
                    (rc(RecordLit(builtins::combine_record_lits(lm, rm))), true)
                }
                _ => (e.clone(), children_changed),
            },
        },
        CombineTypes(l, r) => match builtins::merge_identity_type(l, r) {
            Some(result) => (result, true),
            None => {
                let lm = match l.as_raw() {
                    RawExpr::Record(m) => Some(m),
                    _ => None,
                };
                let rm = match r.as_raw() {
                    RawExpr::Record(m) => Some(m),
                    _ => None,
                };
                match (lm, rm) {
                    (Some(lm), Some(rm)) => (
                        rc(Record(builtins::combine_record_types(lm, rm))),
                        true,
                    ),
                    _ => (e.clone(), children_changed),
                }
            }
        },
        Prefer(l, r) => match builtins::merge_identity(l, r) {
            Some(result) => (result, true),
            None => match (l.record_lit(), r.record_lit()) {
                (Some(lm), Some(rm)) => (rc(RecordLit(builtins::prefer_merge(lm, rm))), true),
                _ => (e.clone(), children_changed),
            },
        },

        Merge(h, u, ty) => match (h.record_lit(), u.union_lit()) {
            (Some(handlers), Some((active, v, _others))) => match handlers.get(active) {
                Some(handler) => {
                    let applied = rc(App(handler.clone(), v.clone()));
                    (normalize_with(&applied, rules), true)
                }
                None => (e.clone(), children_changed),
            },
            _ => {
                let _ = ty;
                (e.clone(), children_changed)
            }
        },
        Constructors(u) => match u.union_type() {
            Some(kts) => (rc(RecordLit(builtins::constructors_record(kts))), true),
            None => (e.clone(), children_changed),
        },

        Field(r, l) => match r.record_lit() {
            Some(kvs) => match kvs.get(l) {
                Some(v) => (v.clone(), true),
                None => (e.clone(), children_changed),
            },
            None => match r.union_type() {
                Some(kts) => match kts.get(l) {
                    Some(ty) => (builtins::union_constructor(l, ty, kts), true),
                    None => (e.clone(), children_changed),
                },
                None => (e.clone(), children_changed),
            },
        },
        Project(r, ls) => match r.record_lit() {
            Some(kvs) if ls.iter().all(|l| kvs.contains_key(l)) => {
                let restricted = kvs
                    .iter()
                    .filter(|(k, _)| ls.contains(*k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                (normalize_with(&rc(RecordLit(restricted)), rules), true)
            }
            _ => (e.clone(), children_changed),
        },

        Lam(x, _, body) => match eta_reduce(x, body) {
            Some(f) => (f, true),
            None => (e.clone(), children_changed),
        },

        App(f, arg) => match f.as_raw() {
            Lam(x, _, body) => {
                let result = shift_subst_shift(&V(x.clone(), 0), arg, body);
                (normalize_with(&result, rules), true)
            }
            _ => {
                let sp = view(e);
                match rules
                    .normalize_application(&sp)
                    .or_else(|| builtins::apply(&sp, rules))
                {
                    Some(result) => (result, true),
                    None => (e.clone(), children_changed),
                }
            }
        },

        _ => (e.clone(), children_changed),
    }
}

/// η-reduction (§4.5): `λ x:τ. f x` → `f` when `x` is not free in `f`.
fn eta_reduce(x: &Label, body: &Expr) -> Option<Expr> {
    if let RawExpr::App(f, arg) = body.as_raw() {
        if let RawExpr::Var(v) = arg.as_raw() {
            if v.0 == *x && v.1 == 0 && !dhall_syntax::free_in(&V(x.clone(), 0), f) {
                return Some(f.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhall_syntax::parse_expr;
    use num_bigint::BigUint;
    use pretty_assertions::assert_eq;

    fn n(x: u32) -> Expr {
        rc(RawExpr::NaturalLit(BigUint::from(x)))
    }

    #[test]
    fn beta_reduction_s1() {
        let e = parse_expr("(\\(x : Natural) -> x + 1) 2").unwrap();
        assert_eq!(normalize(&e), n(3));
    }

    #[test]
    fn let_inlining_s2() {
        let e = parse_expr("let x = 1 in x + x").unwrap();
        assert_eq!(normalize(&e), n(2));
    }

    #[test]
    fn eta_reduction_s3() {
        let e = parse_expr("\\(x : Natural) -> (\\(y : Natural) -> y) x").unwrap();
        let expected = parse_expr("\\(x : Natural) -> x").unwrap();
        assert_eq!(normalize(&e), normalize(&expected));
    }

    #[test]
    fn list_length_s4() {
        let e = parse_expr("List/length Natural [1, 2, 3]").unwrap();
        assert_eq!(normalize(&e), n(3));
    }

    #[test]
    fn merge_on_non_union_lit_is_unreduced_s5() {
        // `merge {=} u : Natural` where `u` isn't a union literal (e.g. a
        // free variable standing in for the empty union `<>`): no handler
        // can be looked up, so the merge is left as a congruence rebuild.
        let e = rc(RawExpr::Merge(
            rc(RawExpr::RecordLit(Default::default())),
            rc(RawExpr::Var(V(Label::from("u"), 0))),
            Some(rc(RawExpr::Natural)),
        ));
        let normalized = normalize(&e);
        assert!(matches!(normalized.as_raw(), RawExpr::Merge(..)));
    }

    #[test]
    fn prefer_s6() {
        let e = parse_expr("{ a = 1, b = 2 } // { b = 3, c = 4 }").unwrap();
        let expected = parse_expr("{ a = 1, b = 3, c = 4 }").unwrap();
        assert_eq!(normalize(&e), expected);
    }

    #[test]
    fn text_interpolation_collapse_s8() {
        let e = parse_expr("\"hello ${\"world\"}\"").unwrap();
        let expected = parse_expr("\"hello world\"").unwrap();
        assert_eq!(normalize(&e), expected);
    }

    #[test]
    fn idempotence() {
        let e = parse_expr("(\\(x : Natural) -> x + 1) 2").unwrap();
        let once = normalize(&e);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn is_normalized_reports_false_for_redex() {
        let e = parse_expr("(\\(x : Natural) -> x) 1").unwrap();
        assert!(!is_normalized(&e));
        assert!(is_normalized(&normalize(&e)));
    }

    #[test]
    fn shift_zero_identity_carried_through_normalize() {
        let e = parse_expr("\\(x : Natural) -> x").unwrap();
        assert_eq!(normalize(&e), e);
    }

    #[test]
    fn fold_build_fusion_list() {
        let e = parse_expr(
            "List/build Natural (List/fold Natural ([1, 2, 3] : List Natural))",
        )
        .unwrap();
        let expected = parse_expr("[1, 2, 3] : List Natural").unwrap();
        assert_eq!(normalize(&e), normalize(&expected));
    }

    #[test]
    fn user_rules_consulted_before_builtins() {
        // A user rule that rewrites any application of a free variable `f`
        // to the natural literal `9`, regardless of builtins.
        let e = parse_expr("f 1").unwrap();
        let rule = |sp: &Spine| -> Option<Expr> {
            if let RawExpr::Var(v) = sp.head.as_raw() {
                if v.0.as_str() == "f" {
                    return Some(n(9));
                }
            }
            None
        };
        assert_eq!(normalize_with(&e, &rule), n(9));
    }
}
