use std::sync::Arc;

use linkform_core::{BasicType, MethodType};

use crate::form::{FormBuilder, FormKind, LambdaForm, NamedFunction};

pub fn mt(sig: &str) -> MethodType {
    MethodType::parse(sig).unwrap()
}

/// `(a0:L,a1:L,a2:L)=>{t3:L=f(a1,a2);}t3`
pub fn call_f() -> Arc<LambdaForm> {
    use BasicType::L;
    let mut b = FormBuilder::new(&[L, L, L]);
    let args = b.args(1, 3);
    let t = b.push(NamedFunction::external("f", &mt("(LL)L")), args);
    b.build(Some(t), FormKind::External)
}

/// A form with `types` parameters after the handle, returning its first
/// argument (or nothing when there is none).
pub fn passthrough(types: &[BasicType]) -> Arc<LambdaForm> {
    let mut params = vec![BasicType::L];
    params.extend_from_slice(types);
    let result = (!types.is_empty()).then_some(1);
    FormBuilder::new(&params).build(result, FormKind::Generic)
}
