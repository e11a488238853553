use devproxy_protocol::{Kwargs, Value};

use crate::{Fault, Vars};

/// What an attribute read resolved to.
#[derive(Clone, Debug, PartialEq)]
pub enum Member {
    Callable,
    Value(Value),
}

/// An object served under a class name.
pub trait Target: Send + 'static {
    fn attribute(&mut self, name: &str, vars: &mut Vars) -> Result<Member, Fault>;

    fn call(&mut self, name: &str, args: Vec<Value>, kwargs: Kwargs, vars: &mut Vars) -> Result<Value, Fault>;
}

/// Look up an argument either by position or by keyword.
pub fn arg<'a>(args: &'a [Value], kwargs: &'a Kwargs, pos: usize, name: &str) -> Result<&'a Value, Fault> {
    args.get(pos)
        .or_else(|| kwargs.get(name))
        .ok_or_else(|| Fault::new(format!("missing required argument: '{}'", name)))
}

pub fn int_arg(args: &[Value], kwargs: &Kwargs, pos: usize, name: &str) -> Result<i64, Fault> {
    let x = arg(args, kwargs, pos, name)?;
    x.as_i64()
        .ok_or_else(|| Fault::new(format!("argument '{}' must be int, not {}", name, x.type_name())))
}

pub fn float_arg(args: &[Value], kwargs: &Kwargs, pos: usize, name: &str) -> Result<f64, Fault> {
    let x = arg(args, kwargs, pos, name)?;
    x.as_f64()
        .ok_or_else(|| Fault::new(format!("argument '{}' must be float, not {}", name, x.type_name())))
}

pub fn str_arg<'a>(args: &'a [Value], kwargs: &'a Kwargs, pos: usize, name: &str) -> Result<&'a str, Fault> {
    let x = arg(args, kwargs, pos, name)?;
    x.as_str()
        .ok_or_else(|| Fault::new(format!("argument '{}' must be str, not {}", name, x.type_name())))
}
