//! Textual form edits for `linkform dump`.
//!
//! Positions count form parameters, so position 0 is the handle itself.
//! Each edit is checked against the current form before it reaches the
//! editor, which treats out-of-range positions as bugs.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use linkform_compiler::{FormContext, LambdaForm};
use linkform_core::{BasicType, MethodType, Ty};

use super::CliError;

#[derive(Clone, Debug, PartialEq)]
pub enum Edit {
    Bind { pos: usize, ty: BasicType },
    Add { pos: usize, ty: BasicType },
    Dup { src: usize, dst: usize },
    Spread { pos: usize, element: Ty, count: usize },
    Filter { pos: usize, ty: BasicType },
    Collect { pos: usize, collector: MethodType },
    Fold { pos: usize, combiner: MethodType, void: bool },
    FilterReturn(BasicType),
    ZeroReturn(BasicType),
    Permute(Vec<usize>),
}

impl Edit {
    /// Derive a form from `form`, or explain why the edit does not apply.
    pub fn apply(
        &self,
        ctx: &FormContext,
        form: &Arc<LambdaForm>,
    ) -> Result<Arc<LambdaForm>, CliError> {
        let arity = form.arity();
        let editor = ctx.editor(form);
        let derived = match self {
            Edit::Bind { pos, ty } => {
                self.require(*pos < arity, || format!("no parameter {pos}"))?;
                let top = form.parameter_constraint(0).is_none_or(|s| s.is_top());
                self.require(*pos != 0 || top, || {
                    "parameter 0 already carries bound values".to_string()
                })?;
                editor.bind_argument_form(*pos, *ty)?
            }
            Edit::Add { pos, ty } => {
                self.require(*pos > 0 && *pos <= arity, || {
                    format!("position must be in 1..={arity}")
                })?;
                self.require(ty.is_arg(), || "cannot add a void parameter".to_string())?;
                editor.add_argument_form(*pos, *ty)?
            }
            Edit::Dup { src, dst } => {
                self.require(0 < *src && src < dst && *dst < arity, || {
                    format!("need 0 < SRC < DST < {arity}")
                })?;
                editor.dup_argument_form(*src, *dst)?
            }
            Edit::Spread {
                pos,
                element,
                count,
            } => {
                self.require(*pos > 0 && pos + count <= arity, || {
                    format!("{count} parameters from {pos} exceed arity {arity}")
                })?;
                editor.spread_arguments_form(*pos, &Ty::array_of(element.clone()), *count)?
            }
            Edit::Filter { pos, ty } => {
                self.require(*pos > 0 && *pos < arity, || {
                    format!("position must be in 1..{arity}")
                })?;
                self.require(ty.is_arg(), || "cannot filter into void".to_string())?;
                editor.filter_argument_form(*pos, *ty)?
            }
            Edit::Collect { pos, collector } => {
                let consumed = usize::from(!collector.return_type().is_void());
                self.require(*pos > 0 && pos + consumed <= arity, || {
                    format!("no parameter {pos} to collect into")
                })?;
                editor.collect_arguments_form(*pos, collector)?
            }
            Edit::Fold {
                pos,
                combiner,
                void,
            } => {
                self.require(*pos > 0, || "cannot fold into the handle".to_string())?;
                editor.fold_arguments_form(*pos, *void, combiner)?
            }
            Edit::FilterReturn(ty) => editor.filter_return_form(*ty, false)?,
            Edit::ZeroReturn(ty) => editor.filter_return_form(*ty, true)?,
            Edit::Permute(reorder) => {
                self.require(reorder.len() + 1 == arity, || {
                    format!("expected {} indexes, found {}", arity - 1, reorder.len())
                })?;
                let mut seen = vec![false; reorder.len()];
                for &r in reorder {
                    self.require(r < reorder.len() && !seen[r], || {
                        "indexes must be a permutation".to_string()
                    })?;
                    seen[r] = true;
                }
                editor.permute_arguments_form(1, reorder)?
            }
        };
        Ok(derived)
    }

    fn require(&self, ok: bool, reason: impl FnOnce() -> String) -> Result<(), CliError> {
        if ok {
            return Ok(());
        }
        Err(CliError::Inapplicable {
            edit: self.to_string(),
            reason: reason(),
        })
    }
}

impl FromStr for Edit {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |reason: &str| CliError::BadEdit {
            edit: s.to_string(),
            reason: reason.to_string(),
        };
        let (op, rest) = s.split_once(':').ok_or_else(|| bad("expected OP:OPERANDS"))?;
        let pos_and = |rest: &str| -> Result<(usize, String), CliError> {
            let (pos, tail) = rest.split_once(':').ok_or_else(|| bad("expected POS:..."))?;
            Ok((parse_index(pos).ok_or_else(|| bad("bad position"))?, tail.to_string()))
        };
        let basic = |t: &str| {
            parse_type(t)
                .map(|t| BasicType::from_ty(&t))
                .ok_or_else(|| bad("bad type"))
        };
        let signature = |t: &str| MethodType::parse(t).map_err(|e| bad(&e.to_string()));

        let edit = match op {
            "bind" => {
                let (pos, t) = pos_and(rest)?;
                Edit::Bind { pos, ty: basic(&t)? }
            }
            "add" => {
                let (pos, t) = pos_and(rest)?;
                Edit::Add { pos, ty: basic(&t)? }
            }
            "dup" => {
                let (src, dst) = pos_and(rest)?;
                let dst = parse_index(&dst).ok_or_else(|| bad("bad position"))?;
                Edit::Dup { src, dst }
            }
            "spread" => {
                let (pos, tail) = pos_and(rest)?;
                let (t, count) = tail.split_once(':').ok_or_else(|| bad("expected T:N"))?;
                let element = parse_type(t)
                    .filter(|t| !t.is_void())
                    .ok_or_else(|| bad("bad element type"))?;
                let count = parse_index(count).ok_or_else(|| bad("bad count"))?;
                Edit::Spread {
                    pos,
                    element,
                    count,
                }
            }
            "filter" => {
                let (pos, t) = pos_and(rest)?;
                Edit::Filter { pos, ty: basic(&t)? }
            }
            "collect" => {
                let (pos, sig) = pos_and(rest)?;
                Edit::Collect {
                    pos,
                    collector: signature(&sig)?,
                }
            }
            "fold" | "fold-void" => {
                let (pos, sig) = pos_and(rest)?;
                Edit::Fold {
                    pos,
                    combiner: signature(&sig)?,
                    void: op == "fold-void",
                }
            }
            "ret" => Edit::FilterReturn(basic(rest)?),
            "zero" => Edit::ZeroReturn(basic(rest)?),
            "permute" => {
                let reorder = if rest.trim().is_empty() {
                    Vec::new()
                } else {
                    rest.split(',')
                        .map(parse_index)
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| bad("bad index list"))?
                };
                Edit::Permute(reorder)
            }
            _ => return Err(bad("unknown operation")),
        };
        Ok(edit)
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Bind { pos, ty } => write!(f, "bind:{pos}:{ty}"),
            Edit::Add { pos, ty } => write!(f, "add:{pos}:{ty}"),
            Edit::Dup { src, dst } => write!(f, "dup:{src}:{dst}"),
            Edit::Spread {
                pos,
                element,
                count,
            } => write!(f, "spread:{pos}:{element}:{count}"),
            Edit::Filter { pos, ty } => write!(f, "filter:{pos}:{ty}"),
            Edit::Collect { pos, collector } => write!(f, "collect:{pos}:{collector}"),
            Edit::Fold {
                pos,
                combiner,
                void,
            } => {
                let op = if *void { "fold-void" } else { "fold" };
                write!(f, "{op}:{pos}:{combiner}")
            }
            Edit::FilterReturn(ty) => write!(f, "ret:{ty}"),
            Edit::ZeroReturn(ty) => write!(f, "zero:{ty}"),
            Edit::Permute(reorder) => {
                let list: Vec<String> = reorder.iter().map(|i| i.to_string()).collect();
                write!(f, "permute:{}", list.join(","))
            }
        }
    }
}

fn parse_index(s: &str) -> Option<usize> {
    s.trim().parse().ok()
}

/// A descriptor letter (`I`, `[L`) or a readable name (`int`, `String[]`).
fn parse_type(s: &str) -> Option<Ty> {
    let s = s.trim();
    Ty::parse_descriptor(s).or_else(|| Ty::parse_word(s))
}
