//! The abstract syntax tree: a single closed tagged sum covering every
//! expression shape the grammar can produce (component A of the spec).

use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::rc::Rc;

use num_bigint::{BigInt, BigUint};

/// Naturals and integers are unbounded, matching the source language's
/// arbitrary-precision arithmetic.
pub type Natural = BigUint;
pub type Integer = BigInt;

/// A label: a restricted identifier used for variable names, record/union
/// keys, and binder names. Cheap to clone (reference-counted string).
#[derive(Debug, Clone, Eq, PartialOrd, Ord, Hash)]
pub struct Label(Rc<str>);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label(Rc::from(s))
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label(Rc::from(s.as_str()))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for Label {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

/// A bit-exact double, matching the source language's requirement that
/// `DoubleLit` equality never folds syntactically distinct doubles together.
#[derive(Debug, Clone, Copy)]
pub struct NaiveDouble(f64);

impl From<f64> for NaiveDouble {
    fn from(x: f64) -> Self {
        NaiveDouble(x)
    }
}
impl From<NaiveDouble> for f64 {
    fn from(x: NaiveDouble) -> Self {
        x.0
    }
}
impl PartialEq for NaiveDouble {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}
impl Eq for NaiveDouble {}
impl std::hash::Hash for NaiveDouble {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state)
    }
}
impl fmt::Display for NaiveDouble {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Dhall always shows a decimal point, even for whole numbers.
        if self.0.is_finite() && self.0.fract() == 0.0 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A De Bruijn-indexed variable reference: `V(name, index)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct V(pub Label, pub usize);

impl V {
    /// The same variable, one binder deeper (used when tracking whether a
    /// shift/substitution cutoff must increment under a same-named binder).
    pub fn under_binder(&self, binder: &Label) -> V {
        if &self.0 == binder {
            V(self.0.clone(), self.1 + 1)
        } else {
            self.clone()
        }
    }
}

/// The three universes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Const {
    Type,
    Kind,
    Sort,
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Const::Type => write!(f, "Type"),
            Const::Kind => write!(f, "Kind"),
            Const::Sort => write!(f, "Sort"),
        }
    }
}

/// Named built-ins that are nullary tokens in the grammar but behave as
/// ordinary free-standing values the normalizer's built-in rules match on
/// via the application spine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    NaturalFold,
    NaturalBuild,
    NaturalIsZero,
    NaturalEven,
    NaturalOdd,
    NaturalToInteger,
    NaturalShow,
    IntegerShow,
    IntegerToDouble,
    DoubleShow,
    TextShow,
    ListBuild,
    ListFold,
    ListLength,
    ListHead,
    ListLast,
    ListIndexed,
    ListReverse,
    OptionalBuild,
    OptionalFold,
}

impl Builtin {
    pub fn parse(s: &str) -> Option<Self> {
        use Builtin::*;
        Some(match s {
            "Natural/fold" => NaturalFold,
            "Natural/build" => NaturalBuild,
            "Natural/isZero" => NaturalIsZero,
            "Natural/even" => NaturalEven,
            "Natural/odd" => NaturalOdd,
            "Natural/toInteger" => NaturalToInteger,
            "Natural/show" => NaturalShow,
            "Integer/show" => IntegerShow,
            "Integer/toDouble" => IntegerToDouble,
            "Double/show" => DoubleShow,
            "Text/show" => TextShow,
            "List/build" => ListBuild,
            "List/fold" => ListFold,
            "List/length" => ListLength,
            "List/head" => ListHead,
            "List/last" => ListLast,
            "List/indexed" => ListIndexed,
            "List/reverse" => ListReverse,
            "Optional/build" => OptionalBuild,
            "Optional/fold" => OptionalFold,
            _ => return None,
        })
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Builtin::*;
        let s = match self {
            NaturalFold => "Natural/fold",
            NaturalBuild => "Natural/build",
            NaturalIsZero => "Natural/isZero",
            NaturalEven => "Natural/even",
            NaturalOdd => "Natural/odd",
            NaturalToInteger => "Natural/toInteger",
            NaturalShow => "Natural/show",
            IntegerShow => "Integer/show",
            IntegerToDouble => "Integer/toDouble",
            DoubleShow => "Double/show",
            TextShow => "Text/show",
            ListBuild => "List/build",
            ListFold => "List/fold",
            ListLength => "List/length",
            ListHead => "List/head",
            ListLast => "List/last",
            ListIndexed => "List/indexed",
            ListReverse => "List/reverse",
            OptionalBuild => "Optional/build",
            OptionalFold => "Optional/fold",
        };
        write!(f, "{}", s)
    }
}

/// Text with interpolation: `head $\{e1} mid1 $\{e2} mid2 ... tail`, stored
/// as a leading literal chunk followed by (expr, literal) pairs. This
/// representation makes the alternating-sequence invariant from §3.2
/// structural rather than asserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpolatedText {
    pub head: Rc<str>,
    pub tail: Vec<(Expr, Rc<str>)>,
}

impl InterpolatedText {
    pub fn from_text(s: impl Into<Rc<str>>) -> Self {
        InterpolatedText {
            head: s.into(),
            tail: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tail.is_empty() && self.head.is_empty()
    }

    /// If this is exactly one interpolation with no surrounding text,
    /// returns that expression (the `"" ⟨e⟩ ""` collapse from §4.5).
    pub fn as_single_expr(&self) -> Option<&Expr> {
        if self.head.is_empty() && self.tail.len() == 1 && self.tail[0].1.is_empty() {
            Some(&self.tail[0].0)
        } else {
            None
        }
    }
}

/// Where a local import path is rooted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilePrefix {
    Here,
    Parent,
    Home,
    Absolute,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalPath {
    pub prefix: FilePrefix,
    /// Path components, file last.
    pub components: Vec<Rc<str>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    HTTP,
    HTTPS,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct URL {
    pub scheme: Scheme,
    pub authority: Rc<str>,
    pub components: Vec<Rc<str>>,
    pub query: Option<Rc<str>>,
    pub fragment: Option<Rc<str>>,
    pub headers: Option<Box<ImportHashed>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    Missing,
    Local(LocalPath),
    Remote(URL),
    Env(Rc<str>),
}

/// A sha256 content hash, stored as its 64 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash(pub [u8; 32]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportHashed {
    pub kind: ImportKind,
    pub hash: Option<Hash>,
}

/// Whether an import is pulled in as code (parsed and normalized) or as raw
/// `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportMode {
    Code,
    RawText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub hashed: ImportHashed,
    pub mode: ImportMode,
}

/// A reference-counted, structurally-shared expression node. Cloning an
/// `Expr` is O(1); subtrees are immutable once built.
#[derive(Debug, Clone)]
pub struct Expr(Rc<RawExpr>);

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for Expr {}

impl Expr {
    pub fn new(raw: RawExpr) -> Self {
        Expr(Rc::new(raw))
    }

    pub fn as_raw(&self) -> &RawExpr {
        &self.0
    }

    /// True if this and `other` point at the same heap allocation. Used by
    /// the normalizer to short-circuit congruence rebuilds (§5: "preserve
    /// subtree identity where possible").
    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for Expr {
    type Target = RawExpr;
    fn deref(&self) -> &RawExpr {
        &self.0
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        crate::print::fmt_expr(self, f)
    }
}

pub type RecordMap = IndexMap<Label, Expr>;
pub type UnionMap = IndexMap<Label, Expr>;

/// The expression shapes themselves. See spec §3.2 for the full enumeration;
/// every constructor named there has a variant here with the same shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawExpr {
    Const(Const),
    Var(V),

    Lam(Label, Expr, Expr),
    Pi(Label, Expr, Expr),
    App(Expr, Expr),
    Let(Label, Option<Expr>, Expr, Expr),
    Annot(Expr, Expr),

    Bool,
    BoolLit(bool),
    BoolAnd(Expr, Expr),
    BoolOr(Expr, Expr),
    BoolEQ(Expr, Expr),
    BoolNE(Expr, Expr),
    BoolIf(Expr, Expr, Expr),

    Natural,
    NaturalLit(Natural),
    NaturalPlus(Expr, Expr),
    NaturalTimes(Expr, Expr),

    Integer,
    IntegerLit(Integer),

    Double,
    DoubleLit(NaiveDouble),

    Text,
    TextLit(InterpolatedText),
    TextAppend(Expr, Expr),

    List,
    /// `ListLit` carries an element-type annotation iff the vector is empty
    /// (§3.2 invariant).
    ListLit(Option<Expr>, Vec<Expr>),
    ListAppend(Expr, Expr),

    Optional,
    OptionalLit(Expr, Option<Expr>),
    Some_(Expr),
    None_,

    Record(RecordMap),
    RecordLit(RecordMap),
    Field(Expr, Label),
    Project(Expr, IndexSet<Label>),
    Combine(Expr, Expr),
    CombineTypes(Expr, Expr),
    Prefer(Expr, Expr),

    Union(UnionMap),
    UnionLit(Label, Expr, UnionMap),
    Merge(Expr, Expr, Option<Expr>),
    Constructors(Expr),

    Builtin(Builtin),

    ImportAlt(Expr, Expr),
    Import(Import),

    /// A judgmental-equality proof obligation (`a === b`). Never reduces —
    /// the type checker is the only consumer, and it is out of scope here —
    /// so the normalizer treats it as an ordinary congruence node.
    Equivalence(Expr, Expr),
}

impl PartialEq for RawExpr {
    fn eq(&self, other: &Self) -> bool {
        // derive(PartialEq) would require deriving it manually anyway given
        // IndexMap's key-order-independent equality, which is exactly the
        // semantics we want (record/union field order is not observable).
        format_eq(self, other)
    }
}

// A manual, structural equality that treats IndexMap/IndexSet as the maps
// and sets they are (order-independent), matching the rest of the language:
// reordering a record literal's fields does not change its meaning.
fn format_eq(a: &RawExpr, b: &RawExpr) -> bool {
    use RawExpr::*;
    match (a, b) {
        (Const(x), Const(y)) => x == y,
        (Var(x), Var(y)) => x == y,
        (Lam(l1, t1, b1), Lam(l2, t2, b2)) => l1 == l2 && t1 == t2 && b1 == b2,
        (Pi(l1, t1, b1), Pi(l2, t2, b2)) => l1 == l2 && t1 == t2 && b1 == b2,
        (App(f1, a1), App(f2, a2)) => f1 == f2 && a1 == a2,
        (Let(l1, t1, v1, b1), Let(l2, t2, v2, b2)) => {
            l1 == l2 && t1 == t2 && v1 == v2 && b1 == b2
        }
        (Annot(e1, t1), Annot(e2, t2)) => e1 == e2 && t1 == t2,
        (Bool, Bool) => true,
        (BoolLit(x), BoolLit(y)) => x == y,
        (BoolAnd(a1, b1), BoolAnd(a2, b2)) => a1 == a2 && b1 == b2,
        (BoolOr(a1, b1), BoolOr(a2, b2)) => a1 == a2 && b1 == b2,
        (BoolEQ(a1, b1), BoolEQ(a2, b2)) => a1 == a2 && b1 == b2,
        (BoolNE(a1, b1), BoolNE(a2, b2)) => a1 == a2 && b1 == b2,
        (BoolIf(c1, t1, f1), BoolIf(c2, t2, f2)) => c1 == c2 && t1 == t2 && f1 == f2,
        (Natural, Natural) => true,
        (NaturalLit(x), NaturalLit(y)) => x == y,
        (NaturalPlus(a1, b1), NaturalPlus(a2, b2)) => a1 == a2 && b1 == b2,
        (NaturalTimes(a1, b1), NaturalTimes(a2, b2)) => a1 == a2 && b1 == b2,
        (Integer, Integer) => true,
        (IntegerLit(x), IntegerLit(y)) => x == y,
        (Double, Double) => true,
        (DoubleLit(x), DoubleLit(y)) => x == y,
        (Text, Text) => true,
        (TextLit(x), TextLit(y)) => x == y,
        (TextAppend(a1, b1), TextAppend(a2, b2)) => a1 == a2 && b1 == b2,
        (List, List) => true,
        (ListLit(t1, xs1), ListLit(t2, xs2)) => t1 == t2 && xs1 == xs2,
        (ListAppend(a1, b1), ListAppend(a2, b2)) => a1 == a2 && b1 == b2,
        (Optional, Optional) => true,
        (OptionalLit(t1, x1), OptionalLit(t2, x2)) => t1 == t2 && x1 == x2,
        (Some_(x), Some_(y)) => x == y,
        (None_, None_) => true,
        (Record(m1), Record(m2)) => maps_eq(m1, m2),
        (RecordLit(m1), RecordLit(m2)) => maps_eq(m1, m2),
        (Field(e1, l1), Field(e2, l2)) => e1 == e2 && l1 == l2,
        (Project(e1, s1), Project(e2, s2)) => {
            e1 == e2 && s1.len() == s2.len() && s1.iter().all(|l| s2.contains(l))
        }
        (Combine(a1, b1), Combine(a2, b2)) => a1 == a2 && b1 == b2,
        (CombineTypes(a1, b1), CombineTypes(a2, b2)) => a1 == a2 && b1 == b2,
        (Prefer(a1, b1), Prefer(a2, b2)) => a1 == a2 && b1 == b2,
        (Union(m1), Union(m2)) => maps_eq(m1, m2),
        (UnionLit(l1, v1, m1), UnionLit(l2, v2, m2)) => {
            l1 == l2 && v1 == v2 && maps_eq(m1, m2)
        }
        (Merge(h1, u1, t1), Merge(h2, u2, t2)) => h1 == h2 && u1 == u2 && t1 == t2,
        (Constructors(e1), Constructors(e2)) => e1 == e2,
        (Builtin(x), Builtin(y)) => x == y,
        (ImportAlt(a1, b1), ImportAlt(a2, b2)) => a1 == a2 && b1 == b2,
        (Import(x), Import(y)) => x == y,
        (Equivalence(a1, b1), Equivalence(a2, b2)) => a1 == a2 && b1 == b2,
        _ => false,
    }
}

fn maps_eq(a: &RecordMap, b: &RecordMap) -> bool {
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
}

impl Eq for RawExpr {}

/// Construct an `Expr` from a `RawExpr`; shorthand used throughout the
/// crate, matching the teacher's own `rc()` helper.
pub fn rc(raw: RawExpr) -> Expr {
    Expr::new(raw)
}

/// The generic "immediate children" traversal (component A). Applies `f` to
/// every immediate child expression of `e`, tagging binder-introducing
/// children with the name they bind so the four variable algorithms in
/// `var.rs` can share one traversal (DESIGN NOTES: "track binders").
///
/// `f`'s first argument is `Some(name)` exactly when the second argument is
/// the body of a fresh binder of that name; otherwise `None`.
pub fn for_each_child(
    e: &RawExpr,
    f: &mut impl FnMut(Option<&Label>, &Expr) -> Expr,
) -> RawExpr {
    use RawExpr::*;
    match e {
        Const(c) => Const(*c),
        Var(v) => Var(v.clone()),
        Lam(x, t, b) => Lam(x.clone(), f(None, t), f(Some(x), b)),
        Pi(x, t, b) => Pi(x.clone(), f(None, t), f(Some(x), b)),
        App(g, a) => App(f(None, g), f(None, a)),
        Let(x, t, v, b) => Let(
            x.clone(),
            t.as_ref().map(|t| f(None, t)),
            f(None, v),
            f(Some(x), b),
        ),
        Annot(x, t) => Annot(f(None, x), f(None, t)),
        Bool => Bool,
        BoolLit(b) => BoolLit(*b),
        BoolAnd(a, b) => BoolAnd(f(None, a), f(None, b)),
        BoolOr(a, b) => BoolOr(f(None, a), f(None, b)),
        BoolEQ(a, b) => BoolEQ(f(None, a), f(None, b)),
        BoolNE(a, b) => BoolNE(f(None, a), f(None, b)),
        BoolIf(c, t, e) => BoolIf(f(None, c), f(None, t), f(None, e)),
        Natural => Natural,
        NaturalLit(n) => NaturalLit(n.clone()),
        NaturalPlus(a, b) => NaturalPlus(f(None, a), f(None, b)),
        NaturalTimes(a, b) => NaturalTimes(f(None, a), f(None, b)),
        Integer => Integer,
        IntegerLit(n) => IntegerLit(n.clone()),
        Double => Double,
        DoubleLit(n) => DoubleLit(*n),
        Text => Text,
        TextLit(t) => TextLit(InterpolatedText {
            head: t.head.clone(),
            tail: t
                .tail
                .iter()
                .map(|(e, s)| (f(None, e), s.clone()))
                .collect(),
        }),
        TextAppend(a, b) => TextAppend(f(None, a), f(None, b)),
        List => List,
        ListLit(t, xs) => ListLit(
            t.as_ref().map(|t| f(None, t)),
            xs.iter().map(|x| f(None, x)).collect(),
        ),
        ListAppend(a, b) => ListAppend(f(None, a), f(None, b)),
        Optional => Optional,
        OptionalLit(t, x) => {
            OptionalLit(f(None, t), x.as_ref().map(|x| f(None, x)))
        }
        Some_(x) => Some_(f(None, x)),
        None_ => None_,
        Record(kts) => Record(kts.iter().map(|(k, v)| (k.clone(), f(None, v))).collect()),
        RecordLit(kvs) => {
            RecordLit(kvs.iter().map(|(k, v)| (k.clone(), f(None, v))).collect())
        }
        Field(r, l) => Field(f(None, r), l.clone()),
        Project(r, ls) => Project(f(None, r), ls.clone()),
        Combine(a, b) => Combine(f(None, a), f(None, b)),
        CombineTypes(a, b) => CombineTypes(f(None, a), f(None, b)),
        Prefer(a, b) => Prefer(f(None, a), f(None, b)),
        Union(kts) => Union(kts.iter().map(|(k, v)| (k.clone(), f(None, v))).collect()),
        UnionLit(l, v, kts) => UnionLit(
            l.clone(),
            f(None, v),
            kts.iter().map(|(k, v)| (k.clone(), f(None, v))).collect(),
        ),
        Merge(h, u, t) => Merge(f(None, h), f(None, u), t.as_ref().map(|t| f(None, t))),
        Constructors(u) => Constructors(f(None, u)),
        Builtin(b) => Builtin(*b),
        ImportAlt(a, b) => ImportAlt(f(None, a), f(None, b)),
        Import(i) => Import(i.clone()),
        Equivalence(a, b) => Equivalence(f(None, a), f(None, b)),
    }
}

/// `for_each_child` without binder tracking; used by traversals (like the
/// normalizer's congruence step) that don't care about variable capture.
pub fn map_children(e: &RawExpr, f: &mut impl FnMut(&Expr) -> Expr) -> RawExpr {
    for_each_child(e, &mut |_, child| f(child))
}

/// Read-only variant of `for_each_child` for queries (like `freeIn`) that
/// only need to inspect children, not rebuild the node.
pub fn child_refs(e: &RawExpr) -> Vec<(Option<&Label>, &Expr)> {
    use RawExpr::*;
    match e {
        Const(_) | Var(_) | Bool | Natural | Integer | Double | Text | List
        | Optional | None_ | Builtin(_) | Import(_) => vec![],
        Lam(x, t, b) => vec![(None, t), (Some(x), b)],
        Pi(x, t, b) => vec![(None, t), (Some(x), b)],
        App(g, a) => vec![(None, g), (None, a)],
        Let(x, t, v, b) => {
            let mut out = vec![];
            if let Some(t) = t {
                out.push((None, t));
            }
            out.push((None, v));
            out.push((Some(x), b));
            out
        }
        Annot(x, t) => vec![(None, x), (None, t)],
        BoolLit(_) => vec![],
        BoolAnd(a, b) | BoolOr(a, b) | BoolEQ(a, b) | BoolNE(a, b) => {
            vec![(None, a), (None, b)]
        }
        BoolIf(c, t, f) => vec![(None, c), (None, t), (None, f)],
        NaturalLit(_) => vec![],
        NaturalPlus(a, b) | NaturalTimes(a, b) => vec![(None, a), (None, b)],
        IntegerLit(_) => vec![],
        DoubleLit(_) => vec![],
        TextLit(t) => {
            let mut out = vec![];
            for (e, _) in &t.tail {
                out.push((None, e));
            }
            out
        }
        TextAppend(a, b) => vec![(None, a), (None, b)],
        ListLit(t, xs) => {
            let mut out = vec![];
            if let Some(t) = t {
                out.push((None, t));
            }
            out.extend(xs.iter().map(|x| (None, x)));
            out
        }
        ListAppend(a, b) => vec![(None, a), (None, b)],
        OptionalLit(t, x) => {
            let mut out = vec![(None, t)];
            if let Some(x) = x {
                out.push((None, x));
            }
            out
        }
        Some_(x) => vec![(None, x)],
        Record(kts) => kts.values().map(|v| (None, v)).collect(),
        RecordLit(kvs) => kvs.values().map(|v| (None, v)).collect(),
        Field(r, _) => vec![(None, r)],
        Project(r, _) => vec![(None, r)],
        Combine(a, b) | CombineTypes(a, b) | Prefer(a, b) => {
            vec![(None, a), (None, b)]
        }
        Union(kts) => kts.values().map(|v| (None, v)).collect(),
        UnionLit(_, v, kts) => {
            let mut out = vec![(None, v)];
            out.extend(kts.values().map(|v| (None, v)));
            out
        }
        Merge(h, u, t) => {
            let mut out = vec![(None, h), (None, u)];
            if let Some(t) = t {
                out.push((None, t));
            }
            out
        }
        Constructors(u) => vec![(None, u)],
        ImportAlt(a, b) => vec![(None, a), (None, b)],
        Equivalence(a, b) => vec![(None, a), (None, b)],
    }
}

// ---- prism-like accessors (observe-or-fail), component A ----

impl RawExpr {
    pub fn bool_lit(&self) -> Option<bool> {
        match self {
            RawExpr::BoolLit(b) => Some(*b),
            _ => None,
        }
    }
    pub fn natural_lit(&self) -> Option<&Natural> {
        match self {
            RawExpr::NaturalLit(n) => Some(n),
            _ => None,
        }
    }
    pub fn integer_lit(&self) -> Option<&Integer> {
        match self {
            RawExpr::IntegerLit(n) => Some(n),
            _ => None,
        }
    }
    pub fn double_lit(&self) -> Option<NaiveDouble> {
        match self {
            RawExpr::DoubleLit(n) => Some(*n),
            _ => None,
        }
    }
    pub fn text_lit(&self) -> Option<&InterpolatedText> {
        match self {
            RawExpr::TextLit(t) => Some(t),
            _ => None,
        }
    }
    pub fn record_lit(&self) -> Option<&RecordMap> {
        match self {
            RawExpr::RecordLit(kvs) => Some(kvs),
            _ => None,
        }
    }
    pub fn union_lit(&self) -> Option<(&Label, &Expr, &UnionMap)> {
        match self {
            RawExpr::UnionLit(l, v, kts) => Some((l, v, kts)),
            _ => None,
        }
    }
    pub fn union_type(&self) -> Option<&UnionMap> {
        match self {
            RawExpr::Union(kts) => Some(kts),
            _ => None,
        }
    }
    pub fn is_builtin(&self, b: Builtin) -> bool {
        matches!(self, RawExpr::Builtin(x) if *x == b)
    }
}
