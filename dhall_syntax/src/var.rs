//! De Bruijn shift, capture-avoiding substitution, α-normalisation and
//! `freeIn` (component B). All four share the "track binders" traversal
//! from `ast::for_each_child`.

use crate::ast::{child_refs, for_each_child, rc, Expr, Label, RawExpr, V};

/// `shift(d, V(x,n), e)`: add `d` to the index of every free occurrence of a
/// variable named `x` whose index is `>= n + m`, where `m` is the number of
/// same-named binders enclosing the occurrence within `e`.
pub fn shift(delta: isize, v: &V, e: &Expr) -> Expr {
    match e.as_raw() {
        RawExpr::Var(v2) if v2.0 == v.0 && v2.1 >= v.1 => {
            let new_index = (v2.1 as isize + delta) as usize;
            rc(RawExpr::Var(V(v2.0.clone(), new_index)))
        }
        RawExpr::Var(_) => e.clone(),
        other => rc(for_each_child(other, &mut |intro, child| match intro {
            Some(name) => shift(delta, &v.under_binder(name), child),
            None => shift(delta, v, child),
        })),
    }
}

/// `subst(V(x,n), C, B)`: replace every occurrence of `V(x,n)` in `B` with
/// `C`. Descending under a binder named `y` first shifts `C` by `+1` around
/// `V(y,0)` (so its own free variables stay correctly scoped), and bumps the
/// target variable's index the same way a shift cutoff would.
pub fn subst(v: &V, c: &Expr, b: &Expr) -> Expr {
    match b.as_raw() {
        RawExpr::Var(v2) if v2 == v => c.clone(),
        RawExpr::Var(v2) => rc(RawExpr::Var(v2.clone())),
        other => rc(for_each_child(other, &mut |intro, child| match intro {
            Some(name) => {
                let c2 = shift(1, &V(name.clone(), 0), c);
                subst(&v.under_binder(name), &c2, child)
            }
            None => subst(v, c, child),
        })),
    }
}

/// The combined move used to eliminate a binder: `shift(-1, V, subst(V,
/// shift(+1, V, A), B))`. This is what β-reduction, `Let` inlining and
/// `Merge`'s handler application all reduce to.
pub fn shift_subst_shift(v: &V, a: &Expr, b: &Expr) -> Expr {
    let a_up = shift(1, v, a);
    let substituted = subst(v, &a_up, b);
    shift(-1, v, &substituted)
}

/// `rename(v0, v1, e)`: identity when `v0 == v1`.
pub fn rename(v0: &V, v1: &V, e: &Expr) -> Expr {
    if v0 == v1 {
        return e.clone();
    }
    let e_up = shift(1, v1, e);
    let substituted = subst(v0, &rc(RawExpr::Var(v1.clone())), &e_up);
    shift(-1, v0, &substituted)
}

const ALPHA: &str = "_";

/// Rewrite every `Lam`/`Pi`/`Let` binder name to the fixed symbol `_`,
/// bottom-up.
pub fn alpha_normalize(e: &Expr) -> Expr {
    match e.as_raw() {
        RawExpr::Lam(x, t, b) => {
            let t = alpha_normalize(t);
            let b = rename_to_alpha(x, b);
            rc(RawExpr::Lam(Label::from(ALPHA), t, alpha_normalize(&b)))
        }
        RawExpr::Pi(x, t, b) => {
            let t = alpha_normalize(t);
            let b = rename_to_alpha(x, b);
            rc(RawExpr::Pi(Label::from(ALPHA), t, alpha_normalize(&b)))
        }
        RawExpr::Let(x, ty, v, b) => {
            let ty = ty.as_ref().map(alpha_normalize);
            let v = alpha_normalize(v);
            let b = rename_to_alpha(x, b);
            rc(RawExpr::Let(
                Label::from(ALPHA),
                ty,
                v,
                alpha_normalize(&b),
            ))
        }
        other => rc(for_each_child(other, &mut |_, child| {
            alpha_normalize(child)
        })),
    }
}

fn rename_to_alpha(x: &Label, body: &Expr) -> Expr {
    if x.as_str() == ALPHA {
        body.clone()
    } else {
        rename(&V(x.clone(), 0), &V(Label::from(ALPHA), 0), body)
    }
}

/// Two expressions are alpha-equivalent iff they agree after
/// α-normalisation.
pub fn alpha_equivalent(a: &Expr, b: &Expr) -> bool {
    alpha_normalize(a) == alpha_normalize(b)
}

/// `freeIn(v, e)`: true iff some occurrence of `v` in `e` is not shadowed.
pub fn free_in(v: &V, e: &Expr) -> bool {
    match e.as_raw() {
        RawExpr::Var(v2) => v2 == v,
        other => child_refs(other).into_iter().any(|(intro, child)| {
            let target = match intro {
                Some(name) => v.under_binder(name),
                None => v.clone(),
            };
            free_in(&target, child)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Const, RawExpr};
    use pretty_assertions::assert_eq;

    fn var(name: &str, idx: usize) -> Expr {
        rc(RawExpr::Var(V(Label::from(name), idx)))
    }

    #[test]
    fn shift_by_zero_is_identity() {
        let e = rc(RawExpr::Lam(
            Label::from("x"),
            rc(RawExpr::Const(Const::Type)),
            var("x", 0),
        ));
        assert_eq!(shift(0, &V(Label::from("x"), 0), &e), e);
    }

    #[test]
    fn shift_composition() {
        let e = var("x", 2);
        let v = V(Label::from("x"), 0);
        let once = shift(3, &v, &shift(2, &v, &e));
        let combined = shift(5, &v, &e);
        assert_eq!(once, combined);
    }

    #[test]
    fn shift_does_not_touch_other_names() {
        let e = var("y", 0);
        let v = V(Label::from("x"), 0);
        assert_eq!(shift(10, &v, &e), e);
    }

    #[test]
    fn subst_replaces_matching_var() {
        let target = V(Label::from("x"), 0);
        let replacement = rc(RawExpr::NaturalLit(5u32.into()));
        let body = var("x", 0);
        assert_eq!(subst(&target, &replacement, &body), replacement);
    }

    #[test]
    fn subst_shifts_replacement_under_same_named_binder() {
        // \(x : Natural) -> x  substituting the outer `x` (index 1 once
        // under the binder) for `y` must not affect the bound `x`.
        let target = V(Label::from("x"), 0);
        let replacement = var("y", 0);
        let body = rc(RawExpr::Lam(
            Label::from("x"),
            rc(RawExpr::Natural),
            var("x", 0),
        ));
        let result = subst(&target, &replacement, &body);
        assert_eq!(result, body);
    }

    #[test]
    fn alpha_normalize_renames_bound_names_only() {
        let e = rc(RawExpr::Lam(
            Label::from("foo"),
            rc(RawExpr::Natural),
            var("foo", 0),
        ));
        let normalized = alpha_normalize(&e);
        match normalized.as_raw() {
            RawExpr::Lam(name, _, body) => {
                assert_eq!(name.as_str(), "_");
                assert_eq!(*body, var("_", 0));
            }
            _ => panic!("expected Lam"),
        }
    }

    #[test]
    fn alpha_normalize_is_idempotent() {
        let e = rc(RawExpr::Lam(
            Label::from("foo"),
            rc(RawExpr::Natural),
            var("foo", 0),
        ));
        let once = alpha_normalize(&e);
        let twice = alpha_normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn alpha_normalize_preserves_free_var_indices() {
        let e = var("x", 3);
        assert_eq!(alpha_normalize(&e), e);
    }

    #[test]
    fn free_in_detects_unshadowed_occurrence() {
        let e = var("x", 0);
        assert!(free_in(&V(Label::from("x"), 0), &e));
    }

    #[test]
    fn free_in_false_for_shadowed_occurrence() {
        let e = rc(RawExpr::Lam(
            Label::from("x"),
            rc(RawExpr::Natural),
            var("x", 0),
        ));
        assert!(!free_in(&V(Label::from("x"), 0), &e));
    }
}
