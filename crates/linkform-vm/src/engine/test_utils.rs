use std::sync::{Arc, Mutex};

use linkform_core::{ClassKey, MethodType};

use super::handle::MethodHandle;
use super::host::SimpleHost;
use super::runtime::Runtime;
use super::value::Value;

pub fn mt(sig: &str) -> MethodType {
    MethodType::parse(sig).unwrap()
}

pub fn s(text: &str) -> Value {
    Value::str(text)
}

/// String rendering used by the test primitives; strings lose their quotes.
pub fn text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Calls recorded by the `log` primitive.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Primitives:
/// - `concat (Object,Object)Object`, `concat3 (Object,Object,Object)Object`
/// - `upper (Object)Object`, `length (Object)int`, `add (int,int)int`
/// - `log (Object)void`, recording its argument
pub fn string_host(log: &CallLog) -> SimpleHost {
    let log = log.clone();
    SimpleHost::builder()
        .primitive("concat", |_, args| {
            Ok(Value::str(&format!("{}{}", text(&args[0]), text(&args[1]))))
        })
        .primitive("concat3", |_, args| {
            let joined: String = args.iter().map(text).collect();
            Ok(Value::str(&joined))
        })
        .primitive("upper", |_, args| {
            Ok(Value::str(&text(&args[0]).to_uppercase()))
        })
        .primitive("length", |_, args| Ok(Value::Int(text(&args[0]).len() as i32)))
        .primitive("add", |_, args| Ok(Value::Int(args[0].as_int()? + args[1].as_int()?)))
        .primitive("log", move |_, args| {
            log.push(text(&args[0]));
            Ok(Value::Void)
        })
        .build()
}

pub fn runtime() -> Runtime {
    Runtime::new(string_host(&CallLog::default()))
}

pub fn runtime_with_log() -> (Runtime, CallLog) {
    let log = CallLog::default();
    (Runtime::new(string_host(&log)), log)
}

pub fn concat(rt: &Runtime) -> Arc<MethodHandle> {
    MethodHandle::external(rt, "concat", &mt("(Object,Object)Object")).unwrap()
}

pub fn concat3(rt: &Runtime) -> Arc<MethodHandle> {
    MethodHandle::external(rt, "concat3", &mt("(Object,Object,Object)Object")).unwrap()
}

pub fn upper(rt: &Runtime) -> Arc<MethodHandle> {
    MethodHandle::external(rt, "upper", &mt("(Object)Object")).unwrap()
}

pub fn length(rt: &Runtime) -> Arc<MethodHandle> {
    MethodHandle::external(rt, "length", &mt("(Object)int")).unwrap()
}

pub fn add(rt: &Runtime) -> Arc<MethodHandle> {
    MethodHandle::external(rt, "add", &mt("(int,int)int")).unwrap()
}

pub fn log(rt: &Runtime) -> Arc<MethodHandle> {
    MethodHandle::external(rt, "log", &mt("(Object)void")).unwrap()
}

pub fn class(name: &str) -> ClassKey {
    ClassKey::new(name)
}
