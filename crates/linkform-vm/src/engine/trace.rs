//! Instrumentation of form interpretation.
//!
//! The tracer is a zero-cost abstraction: with [`NoopTracer`] every hook is
//! an empty `#[inline(always)]` function and disappears from the
//! interpreter. [`PrintTracer`] collects a readable trace for debugging.

use linkform_compiler::{Arg, LambdaForm};

use super::value::Value;

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Form entry and exit only.
    #[default]
    Default,
    /// Also every evaluated expression.
    Verbose,
    /// Also the arguments of every entered form.
    VeryVerbose,
}

/// Hooks called by the interpreter.
///
/// - `trace_enter` - before the first expression of a form
/// - `trace_expression` - before an expression is evaluated
/// - `trace_value` - after an expression produced its value
/// - `trace_exit` - after a form produced its result
/// - `trace_form_swap` - when a direct handle drops its barrier form
pub trait Tracer {
    fn trace_enter(&mut self, form: &LambdaForm, args: &[Value]);

    fn trace_expression(&mut self, form: &LambdaForm, index: usize);

    fn trace_value(&mut self, index: usize, value: &Value);

    fn trace_exit(&mut self, form: &LambdaForm, result: &Value);

    fn trace_form_swap(&mut self, from: &LambdaForm, to: &LambdaForm);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_enter(&mut self, _form: &LambdaForm, _args: &[Value]) {}

    #[inline(always)]
    fn trace_expression(&mut self, _form: &LambdaForm, _index: usize) {}

    #[inline(always)]
    fn trace_value(&mut self, _index: usize, _value: &Value) {}

    #[inline(always)]
    fn trace_exit(&mut self, _form: &LambdaForm, _result: &Value) {}

    #[inline(always)]
    fn trace_form_swap(&mut self, _from: &LambdaForm, _to: &LambdaForm) {}
}

/// Tracer that collects an indented execution trace.
pub struct PrintTracer {
    verbosity: Verbosity,
    lines: Vec<String>,
    depth: usize,
    /// Rendered expressions waiting for their values, innermost last.
    pending: Vec<String>,
}

impl PrintTracer {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            lines: Vec::new(),
            depth: 0,
            pending: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The trace as one string, one line per event.
    pub fn dump(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn push(&mut self, line: String) {
        self.lines.push(format!("{}{line}", "  ".repeat(self.depth)));
    }
}

impl Tracer for PrintTracer {
    fn trace_enter(&mut self, form: &LambdaForm, args: &[Value]) {
        self.push(format!("enter {} {}", form.kind(), form.basic_method_type()));
        if self.verbosity == Verbosity::VeryVerbose {
            for (i, arg) in args.iter().enumerate() {
                self.push(format!("  a{i} = {arg}"));
            }
        }
        self.depth += 1;
    }

    fn trace_expression(&mut self, form: &LambdaForm, index: usize) {
        if self.verbosity == Verbosity::Default {
            return;
        }
        if let Some(expr) = form.name(index).expression() {
            let args: Vec<String> = expr
                .args
                .iter()
                .map(|arg| match arg {
                    Arg::Name(i) => form.label(*i as usize),
                    Arg::Const(c) => c.to_string(),
                })
                .collect();
            let label = form.label(index);
            self.pending.push(format!("{label} = {}({})", expr.function, args.join(",")));
        }
    }

    fn trace_value(&mut self, _index: usize, value: &Value) {
        if let Some(line) = self.pending.pop() {
            self.push(format!("{line} -> {value}"));
        }
    }

    fn trace_exit(&mut self, form: &LambdaForm, result: &Value) {
        self.depth = self.depth.saturating_sub(1);
        self.push(format!("exit {} -> {result}", form.kind()));
    }

    fn trace_form_swap(&mut self, from: &LambdaForm, to: &LambdaForm) {
        self.push(format!("swap {} -> {}", from.kind(), to.kind()));
    }
}
