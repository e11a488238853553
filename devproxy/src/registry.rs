use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use devproxy_protocol::{unmarshal_args, unmarshal_kwargs, Command, Response, TypedValue, WireValue};

use crate::{fault, Fault, Member, Target, Vars};

struct RegistryShared {
    targets: HashMap<String, Box<dyn Target>>,
    vars: Vars,
}

/// Target objects by class name, plus the remote vars they handed out.
#[derive(Clone)]
pub struct Registry(Arc<Mutex<RegistryShared>>);

impl Registry {
    pub fn new() -> Self {
        let inner = RegistryShared {
            targets: Default::default(),
            vars: Vars::new(),
        };
        Self(Arc::new(Mutex::new(inner)))
    }

    fn lock(&self) -> MutexGuard<'_, RegistryShared> {
        // a panicking target must not take the whole server down
        self.0.lock().unwrap_or_else(|x| x.into_inner())
    }

    /// Serve `target` under `class`, replacing any target registered under that name.
    pub fn register<T: Target>(&self, class: &str, target: T) {
        log::debug!("Registering target `{}`", class);
        self.lock().targets.insert(class.to_string(), Box::new(target));
    }

    pub fn unregister(&self, class: &str) -> bool {
        self.lock().targets.remove(class).is_some()
    }

    pub fn classes(&self) -> Vec<String> {
        let mut ret: Vec<_> = self.lock().targets.keys().cloned().collect();
        ret.sort();
        ret
    }

    pub fn var_count(&self) -> usize {
        self.lock().vars.len()
    }

    /// Run one command against its target. Failures become exception responses.
    pub fn dispatch(&self, command: Command) -> Response {
        match self.try_dispatch(command) {
            Ok(ret) => Response::success(ret),
            Err(fault) => fault.into_response(),
        }
    }

    fn try_dispatch(&self, command: Command) -> Result<WireValue, Fault> {
        let mut inner = self.lock();
        let RegistryShared { targets, vars } = &mut *inner;
        let target = targets
            .get_mut(command.class())
            .ok_or_else(|| fault!("no target registered for class '{}'", command.class()))?;
        match command {
            Command::Read { attribute, .. } => match target.attribute(&attribute, vars) {
                Ok(Member::Callable) => Ok(WireValue::Typed(TypedValue::callable())),
                Ok(Member::Value(x)) => Ok(x.marshal()),
                Err(fault) => Err(fault.context(file!(), "dispatch", line!())),
            },
            Command::Call {
                function, args, kwargs, ..
            } => {
                let args = unmarshal_args(args)?;
                let kwargs = unmarshal_kwargs(kwargs)?;
                target
                    .call(&function, args, kwargs, vars)
                    .map(|x| x.marshal())
                    .map_err(|fault| fault.context(file!(), "dispatch", line!()))
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
