//! Human-readable rendering of forms.
//!
//! ```text
//! (a0:L/LI,a1:I)=>{
//!     t2:L=BoundField[LI.0](a0);
//!     t3:L=InvokeBasic[(LI)L](t2,a1);
//! }t3
//! ```

use std::fmt::{self, Write as _};

use super::{Arg, LambdaForm};

impl LambdaForm {
    /// Label of name `index`: `a<i>` for parameters, `t<i>` otherwise.
    pub fn label(&self, index: usize) -> String {
        let prefix = if index < self.arity() { 'a' } else { 't' };
        format!("{prefix}{index}")
    }

    fn write_arg(&self, out: &mut String, arg: &Arg) {
        match arg {
            Arg::Name(i) => out.push_str(&self.label(*i as usize)),
            Arg::Const(c) => {
                let _ = write!(out, "{c}");
            }
        }
    }

    /// Single-line rendering, for log fields.
    pub fn signature_line(&self) -> String {
        self.render(false)
    }

    fn render(&self, multiline: bool) -> String {
        let mut out = String::from("(");
        for (i, name) in self.names()[..self.arity()].iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{}:{}", self.label(i), name.ty());
            if let Some(species) = name.constraint() {
                let _ = write!(out, "/{}", species.key());
            }
        }
        out.push_str(")=>{");
        for i in self.arity()..self.len() {
            let name = self.name(i);
            if multiline {
                out.push_str("\n    ");
            }
            let _ = write!(out, "{}:{}=", self.label(i), name.ty());
            if let Some(function) = name.function() {
                let _ = write!(out, "{function}");
            }
            out.push('(');
            for (k, arg) in name.args().iter().enumerate() {
                if k > 0 {
                    out.push(',');
                }
                self.write_arg(&mut out, arg);
            }
            out.push_str(");");
        }
        if multiline && self.len() > self.arity() {
            out.push('\n');
        }
        out.push('}');
        match self.result() {
            Some(r) => out.push_str(&self.label(r)),
            None => out.push_str("void"),
        }
        out
    }
}

impl fmt::Display for LambdaForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}
