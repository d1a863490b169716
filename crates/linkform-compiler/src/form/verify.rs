//! Structural checks for forms.

use linkform_core::{BasicType, MAX_JVM_ARITY};

use super::{Arg, LambdaForm};

impl LambdaForm {
    /// Check every form invariant, describing the first violation.
    ///
    /// - parameters occupy exactly `[0, arity)`
    /// - operands refer only to strictly earlier names, with matching types
    /// - the result, if any, names an existing non-void name
    /// - only reference parameters carry a species constraint
    pub fn verify(&self) -> Result<(), String> {
        let names = self.names();
        if self.arity() > names.len() {
            return Err(format!("arity {} exceeds {} names", self.arity(), names.len()));
        }
        let slots: usize = self.parameter_types().iter().map(|t| t.slots()).sum();
        if slots > MAX_JVM_ARITY {
            return Err(format!("{slots} parameter slots"));
        }

        for (i, name) in names.iter().enumerate() {
            let is_param = i < self.arity();
            if name.is_param() != is_param {
                return Err(format!(
                    "{} is {} but sits {} the arity",
                    self.label(i),
                    if name.is_param() { "a parameter" } else { "an expression" },
                    if is_param { "inside" } else { "outside" },
                ));
            }
            if name.constraint().is_some() && (!is_param || name.ty() != BasicType::L) {
                return Err(format!("{} has a constraint", self.label(i)));
            }
            let Some(function) = name.function() else {
                continue;
            };
            let expected = function.parameter_types();
            if expected.len() != name.args().len() {
                return Err(format!(
                    "{} passes {} operands to {function}, which takes {}",
                    self.label(i),
                    name.args().len(),
                    expected.len()
                ));
            }
            for (k, (arg, want)) in name.args().iter().zip(&expected).enumerate() {
                let found = match arg {
                    Arg::Name(j) => {
                        let j = *j as usize;
                        if j >= i {
                            return Err(format!(
                                "{} operand {k} refers forward to {}",
                                self.label(i),
                                self.label(j)
                            ));
                        }
                        names[j].ty()
                    }
                    Arg::Const(c) => c.basic_type(),
                };
                if found != *want {
                    return Err(format!(
                        "{} operand {k} has type {found}, {function} expects {want}",
                        self.label(i)
                    ));
                }
            }
        }

        if let Some(r) = self.result() {
            if r >= names.len() {
                return Err(format!("result {r} is out of range"));
            }
        }
        Ok(())
    }
}
