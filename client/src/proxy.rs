use std::io;
use std::time::Duration;

use devproxy_protocol::{Command, Kwargs, Response, Value, WireValue, STATUS_EXCEPTION, STATUS_SUCCESS};
use tokio::runtime::{Builder, Runtime};

use crate::{Error, LineRpc, RemoteException, Rpc, TransportError};

/// Member names starting with this prefix belong to the proxy itself and are never sent to the
/// remote side.
pub const RESERVED_PREFIX: &str = "_";

/// A local stand-in for an object of class `target_class` living in another process.
///
/// The proxy owns a dedicated single-threaded runtime which drives all of its network I/O.
/// Every operation blocks the calling thread until the response arrived, so a `Proxy` must not
/// be used from within an async context. Operations take `&mut self`: a proxy never has more
/// than one command in flight.
pub struct Proxy<T: Rpc = LineRpc> {
    rpc: T,
    target_class: String,
    rt: Runtime,
}

/// The result of probing a member of the remote target.
pub enum Member<'a, T: Rpc> {
    Value(Value),
    Method(BoundMethod<'a, T>),
}

impl<'a, T: Rpc> Member<'a, T> {
    pub fn is_callable(&self) -> bool {
        matches!(self, Member::Method(_))
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Member::Value(x) => Some(x),
            Member::Method(_) => None,
        }
    }

    pub fn into_method(self) -> Option<BoundMethod<'a, T>> {
        match self {
            Member::Value(_) => None,
            Member::Method(x) => Some(x),
        }
    }
}

/// A remote method bound to its proxy. Can be called any number of times.
pub struct BoundMethod<'a, T: Rpc> {
    proxy: &'a mut Proxy<T>,
    name: String,
}

impl<'a, T: Rpc> BoundMethod<'a, T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&mut self, args: Vec<Value>, kwargs: Kwargs) -> crate::Result<Value> {
        self.proxy.invoke(&self.name, args, kwargs)
    }

    pub fn call_args(&mut self, args: Vec<Value>) -> crate::Result<Value> {
        self.call(args, Kwargs::new())
    }
}

impl Proxy<LineRpc> {
    /// Does not connect, a connection is opened for each command.
    pub fn new(host: &str, port: u16, target_class: &str) -> io::Result<Self> {
        Self::with_rpc(LineRpc::new(host, port), target_class)
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.rpc.set_read_timeout(Some(timeout));
        self
    }
}

impl<T: Rpc> Proxy<T> {
    pub fn with_rpc(rpc: T, target_class: &str) -> io::Result<Self> {
        let rt = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            rpc,
            target_class: target_class.to_string(),
            rt,
        })
    }

    pub fn target_class(&self) -> &str {
        &self.target_class
    }

    pub fn rpc(&self) -> &T {
        &self.rpc
    }

    /// Probe a member of the remote target.
    ///
    /// Every lookup queries the remote side, attribute values are never cached. Names with the
    /// [`RESERVED_PREFIX`] resolve to `Value::None` without any network traffic.
    pub fn attr(&mut self, name: &str) -> crate::Result<Member<'_, T>> {
        if name.starts_with(RESERVED_PREFIX) {
            return Ok(Member::Value(Value::None));
        }
        let ret = self.request(Command::read(&self.target_class, name))?;
        if ret.is_callable() {
            return Ok(Member::Method(BoundMethod {
                proxy: self,
                name: name.to_string(),
            }));
        }
        Ok(Member::Value(ret.into_value()?))
    }

    /// Read a plain attribute. Fails with [`Error::Callable`] if the member is a method.
    pub fn get_attribute(&mut self, name: &str) -> crate::Result<Value> {
        match self.attr(name)? {
            Member::Value(x) => Ok(x),
            Member::Method(_) => Err(Error::Callable(name.to_string())),
        }
    }

    /// Call a remote function directly, skipping the attribute lookup.
    pub fn invoke(&mut self, name: &str, args: Vec<Value>, kwargs: Kwargs) -> crate::Result<Value> {
        let ret = self.request(Command::call(&self.target_class, name, &args, &kwargs))?;
        Ok(ret.into_value()?)
    }

    pub fn call(&mut self, name: &str, args: Vec<Value>) -> crate::Result<Value> {
        self.invoke(name, args, Kwargs::new())
    }

    fn request(&mut self, command: Command) -> crate::Result<WireValue> {
        let response = self.rt.block_on(self.rpc.request(command))?;
        unpack(response)
    }
}

impl<T: Rpc> Drop for Proxy<T> {
    fn drop(&mut self) {
        log::debug!("Closing proxy for `{}`", self.target_class);
    }
}

fn unpack(response: Response) -> crate::Result<WireValue> {
    match response.status.as_str() {
        STATUS_SUCCESS => response.ret.ok_or_else(|| TransportError::MissingReturn.into()),
        STATUS_EXCEPTION => Err(RemoteException::from_response(response.message, response.traceback).into()),
        other => Err(TransportError::UnexpectedStatus(other.to_string()).into()),
    }
}
