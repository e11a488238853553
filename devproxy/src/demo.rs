//! Demo targets served by the `devproxy` binary.
use devproxy_protocol::{Kwargs, Value};

use crate::target::{arg, float_arg, int_arg, str_arg};
use crate::{fault, Fault, Member, Registry, Target, Vars};

/// Stand-in for an instrument driver with a settable value and an opaque session handle.
pub struct Widget {
    name: String,
    value: i64,
    calls: i64,
}

/// Remote-only object handed out by `Widget::open_handle`.
struct Session {
    label: String,
    reads: u32,
}

impl Widget {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: 0,
            calls: 0,
        }
    }
}

fn session<'a>(args: &'a [Value], kwargs: &'a Kwargs, vars: &'a mut Vars) -> Result<&'a mut Session, Fault> {
    let handle = arg(args, kwargs, 0, "handle")?;
    let var = handle
        .as_remote_var()
        .ok_or_else(|| fault!("argument 'handle' must be RemoteVar, not {}", handle.type_name()))?;
    vars.get_mut::<Session>(var)
        .ok_or_else(|| fault!("unknown session handle '{}'", var.name()))
}

impl Target for Widget {
    fn attribute(&mut self, name: &str, _vars: &mut Vars) -> Result<Member, Fault> {
        match name {
            "name" => Ok(Member::Value(self.name.clone().into())),
            "value" => Ok(Member::Value(self.value.into())),
            "calls" => Ok(Member::Value(self.calls.into())),
            "get_value" | "set_value" | "scale" | "sum" | "open_handle" | "read_handle" | "close_handle"
            | "fail" => Ok(Member::Callable),
            _ => Err(fault!("'Widget' object has no attribute '{}'", name)),
        }
    }

    fn call(&mut self, name: &str, args: Vec<Value>, kwargs: Kwargs, vars: &mut Vars) -> Result<Value, Fault> {
        self.calls += 1;
        match name {
            "get_value" => {
                let x = int_arg(&args, &kwargs, 0, "x")?;
                let ret = x.checked_mul(2).ok_or_else(|| fault!("integer overflow doubling {}", x))?;
                Ok(ret.into())
            }
            "set_value" => {
                self.value = int_arg(&args, &kwargs, 0, "value")?;
                Ok(Value::None)
            }
            "scale" => {
                let factor = match arg(&args, &kwargs, 0, "factor") {
                    Ok(_) => float_arg(&args, &kwargs, 0, "factor")?,
                    Err(_) => 1.0,
                };
                Ok((self.value as f64 * factor).into())
            }
            "sum" => {
                let items = arg(&args, &kwargs, 0, "items")?;
                let items = items
                    .as_seq()
                    .ok_or_else(|| fault!("argument 'items' must be a sequence, not {}", items.type_name()))?;
                let mut ret = 0_i64;
                for item in items {
                    let x = item
                        .as_i64()
                        .ok_or_else(|| fault!("unsupported operand type for +: '{}'", item.type_name()))?;
                    ret = ret.checked_add(x).ok_or_else(|| fault!("integer overflow in sum"))?;
                }
                Ok(ret.into())
            }
            "open_handle" => {
                let label = str_arg(&args, &kwargs, 0, "label")?.to_string();
                Ok(vars.insert(Session { label, reads: 0 }).into())
            }
            "read_handle" => {
                let session = session(&args, &kwargs, vars)?;
                session.reads += 1;
                Ok(format!("{}#{}", session.label, session.reads).into())
            }
            "close_handle" => {
                let handle = arg(&args, &kwargs, 0, "handle")?;
                let removed = handle.as_remote_var().and_then(|x| vars.remove(x)).is_some();
                Ok(removed.into())
            }
            "fail" => Err(fault!("boom")),
            _ => Err(fault!("'Widget' object has no attribute '{}'", name)),
        }
    }
}

/// Register all demo targets.
pub fn register(registry: &Registry) {
    registry.register("Widget", Widget::new("widget-0"));
}
