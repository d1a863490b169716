//! Form interpreter.
//!
//! Evaluates the expressions of a form in order, each over constants and
//! the values of earlier names. Nested handle calls recurse through
//! `InvokeBasic`; everything outside the form vocabulary goes to the host.

use std::sync::Arc;

use linkform_compiler::{Arg, FormKind, Intrinsic, LambdaForm, NamedFunction};

use super::direct::{DirectMethodHandle, MemberName};
use super::error::{Result, RuntimeError};
use super::handle::{HandleData, MethodHandle};
use super::init_barrier::InitStatus;
use super::runtime::Runtime;
use super::trace::{NoopTracer, Tracer};
use super::value::Value;

pub struct Interpreter<'r, 't, T: Tracer = NoopTracer> {
    rt: &'r Runtime,
    tracer: &'t mut T,
    exec_fuel: u32,
    recursion_depth: u32,
}

impl<'r, 't, T: Tracer> Interpreter<'r, 't, T> {
    pub fn new(rt: &'r Runtime, tracer: &'t mut T) -> Self {
        Self {
            rt,
            tracer,
            exec_fuel: rt.limits().get_exec_fuel(),
            recursion_depth: 0,
        }
    }

    /// Fuel left for further expressions.
    pub fn remaining_fuel(&self) -> u32 {
        self.exec_fuel
    }

    /// Run `mh`'s current form. `args` exclude the handle itself.
    pub fn invoke_handle(&mut self, mh: &Arc<MethodHandle>, args: Vec<Value>) -> Result<Value> {
        let form = mh.form();
        let mut values = Vec::with_capacity(form.len());
        values.push(Value::Handle(Arc::clone(mh)));
        values.extend(args);
        self.run_form(&form, values)
    }

    /// Run `form` with its parameters bound to `args`.
    pub fn run_form(&mut self, form: &LambdaForm, mut args: Vec<Value>) -> Result<Value> {
        if args.len() != form.arity() {
            return Err(RuntimeError::ArityMismatch {
                expected: form.arity(),
                found: args.len(),
            });
        }
        debug_assert!(
            args.iter()
                .zip(form.parameter_types())
                .all(|(v, &t)| v.basic_type() == t),
            "arguments {args:?} do not fit {form}"
        );
        if self.recursion_depth >= self.rt.limits().get_recursion_limit() {
            return Err(RuntimeError::RecursionLimitExceeded);
        }

        self.recursion_depth += 1;
        self.tracer.trace_enter(form, &args);
        args.reserve(form.expression_count());
        let result = self.eval_body(form, args);
        self.recursion_depth -= 1;
        let result = result?;
        self.tracer.trace_exit(form, &result);
        Ok(result)
    }

    fn eval_body(&mut self, form: &LambdaForm, mut values: Vec<Value>) -> Result<Value> {
        for index in form.arity()..form.len() {
            self.consume_fuel()?;
            let Some(expr) = form.name(index).expression() else {
                unreachable!("name {index} past the arity of {form} is a parameter");
            };
            self.tracer.trace_expression(form, index);
            let args = expr
                .args
                .iter()
                .map(|arg| match arg {
                    Arg::Name(i) => values[*i as usize].clone(),
                    Arg::Const(c) => Value::from(c),
                })
                .collect();
            let value = self.apply(&expr.function, args)?;
            self.tracer.trace_value(index, &value);
            values.push(value);
        }
        Ok(form.result().map_or(Value::Void, |r| values[r].clone()))
    }

    fn consume_fuel(&mut self) -> Result<()> {
        if self.exec_fuel == 0 {
            return Err(RuntimeError::ExecFuelExhausted);
        }
        self.exec_fuel -= 1;
        Ok(())
    }

    fn apply(&mut self, function: &NamedFunction, args: Vec<Value>) -> Result<Value> {
        match function {
            NamedFunction::Intrinsic(intrinsic) => self.apply_intrinsic(intrinsic, args),
            NamedFunction::External { name, .. } => {
                self.rt.host().call_primitive(self.rt, name, &args)
            }
            NamedFunction::Form(form) => self.run_form(form, args),
        }
    }

    fn apply_intrinsic(&mut self, intrinsic: &Intrinsic, mut args: Vec<Value>) -> Result<Value> {
        match intrinsic {
            Intrinsic::InvokeBasic(basic) => {
                let target = Arc::clone(args[0].as_handle()?);
                if target.ty().basic_type() != *basic {
                    return Err(RuntimeError::WrongMethodType {
                        expected: basic.clone(),
                        found: target.ty().clone(),
                    });
                }
                args.remove(0);
                self.invoke_handle(&target, args)
            }
            Intrinsic::BoundField { species, index } => {
                let carrier = args[0].as_handle()?;
                match carrier.data() {
                    HandleData::Bound {
                        species: actual,
                        values,
                    } if actual == species => Ok(values[*index].clone()),
                    _ => Err(RuntimeError::ClassCast {
                        expected: "bound method handle",
                        found: format!("{carrier:?}"),
                    }),
                }
            }
            Intrinsic::CheckSpreadLength => {
                let expected = args[1].as_int()? as usize;
                match &args[0] {
                    Value::Null if expected == 0 => Ok(Value::Void),
                    Value::Null => Err(RuntimeError::NullPointer {
                        operation: "argument spreading",
                    }),
                    Value::Array(array) if array.len() == expected => Ok(Value::Void),
                    Value::Array(array) => Err(RuntimeError::SpreadLength {
                        expected,
                        found: array.len(),
                    }),
                    other => Err(RuntimeError::ClassCast {
                        expected: "array",
                        found: other.type_name().to_string(),
                    }),
                }
            }
            Intrinsic::ArrayLoad(_) => {
                let index = i64::from(args[1].as_int()?);
                match &args[0] {
                    Value::Array(array) => Ok(array.get(index)?.clone()),
                    Value::Null => Err(RuntimeError::NullPointer {
                        operation: "array load",
                    }),
                    other => Err(RuntimeError::ClassCast {
                        expected: "array",
                        found: other.type_name().to_string(),
                    }),
                }
            }
            Intrinsic::Zero(bt) => Ok(Value::zero(*bt)),
            Intrinsic::Identity(_) => Ok(args.swap_remove(0)),
            Intrinsic::CheckExactType => {
                let target = args[0].as_handle()?;
                let expected = args[1].as_type()?;
                if target.ty() != expected {
                    return Err(RuntimeError::WrongMethodType {
                        expected: expected.clone(),
                        found: target.ty().clone(),
                    });
                }
                Ok(Value::Void)
            }
            Intrinsic::CheckGenericType => {
                let target = args[0].as_handle()?;
                let expected = args[1].as_type()?;
                Ok(Value::Handle(target.as_type(expected)?))
            }
            Intrinsic::EnsureInitialized => {
                let dmh = Arc::clone(args[0].as_handle()?);
                self.ensure_initialized(&dmh)?;
                Ok(Value::Void)
            }
            Intrinsic::InternalMemberName | Intrinsic::ConstructorMember => {
                let member = direct_member(&args[0])?;
                Ok(Value::Member(Arc::clone(member)))
            }
            Intrinsic::AllocateInstance => {
                let member = direct_member(&args[0])?;
                self.rt.host().allocate_instance(member.class())
            }
            Intrinsic::LinkTo { kind, .. } => {
                let Some((member, rest)) = args.split_last() else {
                    unreachable!("linker calls carry the member");
                };
                let member = member.as_member()?;
                self.rt.host().invoke_member(self.rt, *kind, member, rest)
            }
        }
    }

    /// Pass the class barrier of a direct handle. Once the class is
    /// observably initialized the handle switches to its barrier-free form.
    fn ensure_initialized(&mut self, dmh: &Arc<MethodHandle>) -> Result<()> {
        let Some(member) = dmh.member() else {
            return Err(RuntimeError::ClassCast {
                expected: "direct method handle",
                found: format!("{dmh:?}"),
            });
        };
        if self.rt.ensure_class_initialized(member.class())? == InitStatus::Reentrant {
            return Ok(());
        }
        let current = dmh.form();
        if matches!(
            current.kind(),
            FormKind::DirectInvokeStaticInit | FormKind::DirectNewInvokeSpecialInit
        ) {
            let prepared =
                DirectMethodHandle::prepared_form(self.rt, dmh.ty(), member.kind(), false)?;
            self.tracer.trace_form_swap(&current, &prepared);
            dmh.update_form(prepared);
        }
        Ok(())
    }
}

fn direct_member(value: &Value) -> Result<&Arc<MemberName>> {
    let handle = value.as_handle()?;
    handle.member().ok_or_else(|| RuntimeError::ClassCast {
        expected: "direct method handle",
        found: format!("{handle:?}"),
    })
}
