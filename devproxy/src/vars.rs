use std::any::Any;
use std::collections::HashMap;

use devproxy_protocol::RemoteVar;
use uuid::Uuid;

/// Objects which cannot be marshalled and are handed out as [`RemoteVar`] handles instead.
#[derive(Default)]
pub struct Vars {
    objects: HashMap<String, Box<dyn Any + Send>>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send>(&mut self, obj: T) -> RemoteVar {
        let name = Uuid::new_v4().to_string();
        log::debug!("Storing remote var {}", name);
        self.objects.insert(name.clone(), Box::new(obj));
        RemoteVar::new(name)
    }

    /// `None` if the handle is unknown or refers to an object of another type.
    pub fn get<T: Any>(&self, var: &RemoteVar) -> Option<&T> {
        self.objects.get(var.name()).and_then(|x| x.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self, var: &RemoteVar) -> Option<&mut T> {
        self.objects.get_mut(var.name()).and_then(|x| x.downcast_mut())
    }

    pub fn remove(&mut self, var: &RemoteVar) -> Option<Box<dyn Any + Send>> {
        self.objects.remove(var.name())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
