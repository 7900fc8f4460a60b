//! The application spine (component D): a view of an expression as a head
//! plus a list of arguments, used by the normalizer's built-in rules to
//! pattern-match multi-argument application concisely.

use crate::ast::{rc, Builtin, Expr, RawExpr};

/// `head · a1 · … · ak`, as a non-empty list with `head` split out.
#[derive(Debug, Clone)]
pub struct Spine {
    pub head: Expr,
    pub args: Vec<Expr>,
}

/// Turn an expression into a spine view.
pub fn view(e: &Expr) -> Spine {
    let mut args = Vec::new();
    let mut head = e.clone();
    while let RawExpr::App(f, a) = head.as_raw() {
        args.push(a.clone());
        head = f.clone();
    }
    args.reverse();
    Spine { head, args }
}

/// Rebuild left-nested `App`s from a spine view.
pub fn review(spine: Spine) -> Expr {
    let mut e = spine.head;
    for a in spine.args {
        e = rc(RawExpr::App(e, a));
    }
    e
}

impl Spine {
    /// `a` is a nullary node of the given builtin tag with no arguments
    /// applied — `noapp` from §4.4.
    pub fn is_bare_builtin(&self, b: Builtin) -> bool {
        self.args.is_empty() && self.head.is_builtin(b)
    }
}

/// `noapp(prism, a)`: `a` is a nullary node of that tag, with nothing
/// applied to it.
pub fn noapp(e: &Expr, b: Builtin) -> bool {
    e.is_builtin(b)
}

/// `noapplit(prism, a)`: `a` is a nullary node of that tag applied to
/// nothing else; since builtins carry no scalar payload of their own (the
/// payload-bearing literal tags — `BoolLit`, `NaturalLit`, ... — are never
/// themselves applicable heads), this coincides with `noapp` here and is
/// provided under its own name for parity with §4.4's two accessors.
pub fn noapplit(e: &Expr, b: Builtin) -> bool {
    noapp(e, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{rc, Const, RawExpr};

    #[test]
    fn view_then_review_round_trips() {
        let f = rc(RawExpr::Var(crate::ast::V(crate::ast::Label::from("f"), 0)));
        let a = rc(RawExpr::Const(Const::Type));
        let b = rc(RawExpr::Const(Const::Kind));
        let app = rc(RawExpr::App(rc(RawExpr::App(f.clone(), a.clone())), b.clone()));
        let spine = view(&app);
        assert_eq!(spine.head, f);
        assert_eq!(spine.args, vec![a, b]);
        assert_eq!(review(spine), app);
    }

    #[test]
    fn noapp_recognizes_bare_builtin() {
        let e = rc(RawExpr::Builtin(Builtin::ListLength));
        assert!(noapp(&e, Builtin::ListLength));
        assert!(!noapp(&e, Builtin::ListReverse));
        assert!(noapplit(&e, Builtin::ListLength));
    }
}
