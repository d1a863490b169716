use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use linkform_compiler::{DispatchKind, FormKind};
use linkform_core::{ClassKey, MAX_MH_ARITY, MethodType, Ty};

use super::direct::{DirectMethodHandle, MemberName};
use super::error::RuntimeError;
use super::host::SimpleHost;
use super::runtime::Runtime;
use super::test_utils::{class, mt};
use super::trace::{PrintTracer, Verbosity};
use super::value::{Instance, Value};

fn point_host() -> SimpleHost {
    let point = class("Point");
    SimpleHost::builder()
        .member(&point, "<init>", |_, args| {
            let obj = args[0].as_object()?;
            obj.set_field("x", args[1].clone());
            obj.set_field("y", args[2].clone());
            Ok(Value::Void)
        })
        .member(&point, "getX", |_, args| Ok(args[0].as_object()?.field("x")))
        .build()
}

fn static_member(class: &ClassKey, name: &str) -> MemberName {
    MemberName::method(class.clone(), name, mt("()int"), DispatchKind::Static)
}

/// A host whose `Counter` class counts initializer runs; `Counter.runs`
/// returns the count.
fn counter_host(runs: &Arc<AtomicUsize>) -> SimpleHost {
    let counter = class("Counter");
    let init_runs = Arc::clone(runs);
    let read_runs = Arc::clone(runs);
    SimpleHost::builder()
        .initializer(&counter, move |_| {
            init_runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .member(&counter, "runs", move |_, _| {
            Ok(Value::Int(read_runs.load(Ordering::SeqCst) as i32))
        })
        .build()
}

#[test]
fn member_handle_types() {
    let point = class("Point");
    let ctor = MemberName::constructor(point.clone(), &[Ty::Int, Ty::Int]).unwrap();
    assert!(ctor.is_constructor());
    assert!(ctor.needs_class_init());
    assert_eq!(ctor.handle_type().unwrap(), mt("(int,int)Point"));
    assert_eq!(ctor.to_string(), "Point.<init>(int,int)void");

    let get_x = MemberName::method(point.clone(), "getX", mt("()int"), DispatchKind::Virtual);
    assert!(!get_x.needs_class_init());
    assert_eq!(get_x.handle_type().unwrap(), mt("(Point)int"));
    assert_eq!(format!("{get_x:?}"), "Point.getX()int/Virtual");

    let stat = static_member(&point, "origin");
    assert_eq!(stat.handle_type().unwrap(), mt("()int"));
}

#[test]
fn constructor_and_virtual_call() {
    let rt = Runtime::new(point_host());
    let point = class("Point");
    let ctor = MemberName::constructor(point.clone(), &[Ty::Int, Ty::Int]).unwrap();
    let new_point = DirectMethodHandle::make(&rt, ctor).unwrap();
    assert_eq!(new_point.form().kind(), FormKind::DirectNewInvokeSpecial);

    let obj = rt
        .invoke_basic(&new_point, vec![Value::Int(1), Value::Int(2)])
        .unwrap();
    let instance = obj.as_object().unwrap();
    assert_eq!(instance.class(), &point);
    assert_eq!(instance.field_names(), ["x", "y"]);

    let get_x = MemberName::method(point, "getX", mt("()int"), DispatchKind::Virtual);
    let get_x = DirectMethodHandle::make(&rt, get_x).unwrap();
    assert_eq!(get_x.ty(), &mt("(Point)int"));
    assert_eq!(rt.invoke_basic(&get_x, vec![obj]).unwrap(), Value::Int(1));
}

#[test]
fn prepared_forms_are_shared_per_erased_type() {
    let rt = Runtime::new(point_host());
    let a = MemberName::method(class("A"), "f", mt("(int)Object"), DispatchKind::Virtual);
    let b = MemberName::method(class("B"), "g", mt("(int)Object"), DispatchKind::Virtual);
    let a = DirectMethodHandle::make(&rt, a).unwrap();
    let b = DirectMethodHandle::make(&rt, b).unwrap();
    assert!(Arc::ptr_eq(&a.form(), &b.form()));
    assert_eq!(
        a.form().signature_line(),
        "(a0:L,a1:L,a2:I)=>{t3:L=InternalMemberName(a0);t4:L=linkToVirtual[(LIL)L](a1,a2,t3);}t4"
    );
}

#[test]
fn unknown_member_is_reported() {
    let rt = Runtime::new(point_host());
    let missing = MemberName::method(class("Point"), "getZ", mt("()int"), DispatchKind::Virtual);
    let mh = DirectMethodHandle::make(&rt, missing).unwrap();
    let obj = Value::Object(Arc::new(Instance::new(class("Point"))));
    let err = rt.invoke_basic(&mh, vec![obj]).unwrap_err();
    assert_eq!(err.to_string(), "unknown member Point.getZ");
}

#[test]
fn static_barrier_runs_initializer_once_and_swaps_form() {
    let runs = Arc::new(AtomicUsize::new(0));
    let rt = Runtime::new(counter_host(&runs));
    let counter = class("Counter");
    let mh = DirectMethodHandle::make(&rt, static_member(&counter, "runs")).unwrap();
    assert_eq!(mh.form().kind(), FormKind::DirectInvokeStaticInit);
    assert_eq!(
        mh.form().signature_line(),
        "(a0:L)=>{t1:V=EnsureInitialized(a0);t2:L=InternalMemberName(a0);t3:I=linkToStatic[(L)I](t2);}t3"
    );

    let mut tracer = PrintTracer::new(Verbosity::Default);
    let out = rt.invoke_traced(&mh, vec![], &mut tracer).unwrap();
    assert_eq!(out, Value::Int(1));
    assert_eq!(mh.form().kind(), FormKind::DirectInvokeStatic);
    assert!(
        tracer
            .lines()
            .iter()
            .any(|l| l.contains("swap DirectInvokeStaticInit -> DirectInvokeStatic"))
    );

    assert_eq!(rt.invoke_basic(&mh, vec![]).unwrap(), Value::Int(1));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!rt.init_table().is_tracked(&counter));

    let later = DirectMethodHandle::make(&rt, static_member(&counter, "runs")).unwrap();
    assert_eq!(later.form().kind(), FormKind::DirectInvokeStatic);
}

#[test]
fn constructor_barrier() {
    let shape = class("Shape");
    let inits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&inits);
    let host = SimpleHost::builder()
        .initializer(&shape, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .member(&shape, "<init>", |_, _| Ok(Value::Void))
        .build();
    let rt = Runtime::new(host);
    let ctor = MemberName::constructor(shape.clone(), &[]).unwrap();
    let mh = DirectMethodHandle::make(&rt, ctor).unwrap();
    assert_eq!(mh.form().kind(), FormKind::DirectNewInvokeSpecialInit);

    let obj = rt.invoke_basic(&mh, vec![]).unwrap();
    assert_eq!(obj.as_object().unwrap().class(), &shape);
    assert_eq!(mh.form().kind(), FormKind::DirectNewInvokeSpecial);
    assert_eq!(inits.load(Ordering::SeqCst), 1);
}

#[test]
fn initializer_may_call_its_own_statics() {
    let cyclic = class("Cyclic");
    let seen = Arc::new(AtomicUsize::new(0));
    let record = Arc::clone(&seen);
    let host = SimpleHost::builder()
        .initializer(&cyclic, move |rt| {
            let inner = DirectMethodHandle::make(rt, static_member(&class("Cyclic"), "seven"))
                .map_err(|e| e.to_string())?;
            let value = rt.invoke_basic(&inner, vec![]).map_err(|e| e.to_string())?;
            assert_eq!(inner.form().kind(), FormKind::DirectInvokeStaticInit);
            record.store(value.as_int().map_err(|e| e.to_string())? as usize, Ordering::SeqCst);
            Ok(())
        })
        .member(&cyclic, "seven", |_, _| Ok(Value::Int(7)))
        .build();
    let rt = Runtime::new(host);
    let mh = DirectMethodHandle::make(&rt, static_member(&cyclic, "seven")).unwrap();
    assert_eq!(rt.invoke_basic(&mh, vec![]).unwrap(), Value::Int(7));
    assert_eq!(seen.load(Ordering::SeqCst), 7);
    assert_eq!(mh.form().kind(), FormKind::DirectInvokeStatic);
}

#[test]
fn other_threads_wait_for_the_initializer() {
    let slow = class("Slow");
    let (started_tx, started_rx) = mpsc::channel();
    let ready = Arc::new(AtomicBool::new(false));
    let set_ready = Arc::clone(&ready);
    let read_ready = Arc::clone(&ready);
    let host = SimpleHost::builder()
        .initializer(&slow, move |_| {
            started_tx.send(()).map_err(|e| e.to_string())?;
            thread::sleep(Duration::from_millis(50));
            set_ready.store(true, Ordering::SeqCst);
            Ok(())
        })
        .member(&slow, "ready", move |_, _| {
            Ok(Value::Int(i32::from(read_ready.load(Ordering::SeqCst))))
        })
        .build();
    let rt = Runtime::new(host);
    let mh = DirectMethodHandle::make(&rt, static_member(&slow, "ready")).unwrap();

    thread::scope(|scope| {
        let first = scope.spawn(|| rt.invoke_basic(&mh, vec![]));
        started_rx.recv().unwrap();
        let second = scope.spawn(|| rt.invoke_basic(&mh, vec![]));
        assert_eq!(first.join().unwrap().unwrap(), Value::Int(1));
        assert_eq!(second.join().unwrap().unwrap(), Value::Int(1));
    });
    assert!(ready.load(Ordering::SeqCst));
}

#[test]
fn failed_initialization_persists() {
    let broken = class("Broken");
    let runs = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&runs);
    let host = SimpleHost::builder()
        .initializer(&broken, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Err("boom".to_string())
        })
        .member(&broken, "f", |_, _| Ok(Value::Int(0)))
        .build();
    let rt = Runtime::new(host);
    let mh = DirectMethodHandle::make(&rt, static_member(&broken, "f")).unwrap();

    for _ in 0..2 {
        let err = rt.invoke_basic(&mh, vec![]).unwrap_err();
        assert!(matches!(err, RuntimeError::ClassInitFailed { .. }));
        assert_eq!(err.to_string(), "initialization of Broken failed: boom");
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(rt.init_table().is_tracked(&broken));
    assert_eq!(mh.form().kind(), FormKind::DirectInvokeStaticInit);
}

#[test]
fn too_many_arguments_are_rejected() {
    let rt = Runtime::new(point_host());
    let ty = MethodType::generic(MAX_MH_ARITY).unwrap();
    let err = DirectMethodHandle::prepared_form(&rt, &ty, DispatchKind::NewSpecial, false)
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Type(_)));
    assert!(DirectMethodHandle::prepared_form(&rt, &ty, DispatchKind::Static, false).is_ok());
}
