//! Abstract syntax, variable operations, parsing and pretty-printing for the
//! configuration language — everything above "what does it mean" and below
//! "how do I evaluate it".

mod ast;
mod parser;
mod print;
mod spine;
mod var;

pub use ast::{
    child_refs, for_each_child, map_children, rc, Builtin, Const, Expr, FilePrefix, Hash, Import,
    ImportHashed, ImportKind, ImportMode, InterpolatedText, Label, LocalPath, NaiveDouble, Natural,
    Integer, RawExpr, RecordMap, Scheme, UnionMap, URL, V,
};
pub use parser::{parse_expr, ParseError};
pub use print::fmt_expr;
pub use spine::{noapp, noapplit, review, view, Spine};
pub use var::{alpha_equivalent, alpha_normalize, free_in, rename, shift, shift_subst_shift, subst};
