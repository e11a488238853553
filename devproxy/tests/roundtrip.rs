use std::thread;

use devproxy::{demo, App};
use devproxy_client::{Error, Kwargs, Proxy, Value};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

/// Serve the demo targets from a background thread, return the port.
fn spawn_server() -> (u16, App) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    listener.set_nonblocking(true).unwrap();

    let app = App::new();
    demo::register(&app.registry);
    let server = app.clone();
    thread::spawn(move || {
        let rt = Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = TcpListener::from_std(listener).unwrap();
            let _ = server.run(listener).await;
        });
    });
    (port, app)
}

#[test]
fn attributes_and_methods() {
    let (port, _) = spawn_server();
    let mut widget = Proxy::new("127.0.0.1", port, "Widget").unwrap();

    assert_eq!(widget.get_attribute("name").unwrap(), Value::from("widget-0"));
    assert_eq!(widget.get_attribute("value").unwrap(), Value::Int(0));

    let mut set_value = widget.attr("set_value").unwrap().into_method().unwrap();
    assert!(set_value.call_args(vec![Value::Int(21)]).unwrap().is_none());
    assert_eq!(widget.get_attribute("value").unwrap(), Value::Int(21));

    let mut kwargs = Kwargs::new();
    kwargs.insert("factor".to_string(), Value::Float(2.0));
    assert_eq!(widget.invoke("scale", vec![], kwargs).unwrap(), Value::Float(42.0));
    assert_eq!(widget.call("get_value", vec![Value::Int(5)]).unwrap(), Value::Int(10));
    assert_eq!(widget.call("sum", vec![vec![1, 2, 3].into()]).unwrap(), Value::Int(6));

    assert!(matches!(widget.get_attribute("get_value"), Err(Error::Callable(_))));
}

#[test]
fn remote_vars_never_leave_the_server() {
    let (port, app) = spawn_server();
    let mut widget = Proxy::new("127.0.0.1", port, "Widget").unwrap();

    let handle = widget.call("open_handle", vec!["scope".into()]).unwrap();
    assert!(handle.as_remote_var().is_some());
    assert_eq!(app.registry.var_count(), 1);

    assert_eq!(widget.call("read_handle", vec![handle.clone()]).unwrap(), Value::from("scope#1"));
    assert_eq!(widget.call("read_handle", vec![handle.clone()]).unwrap(), Value::from("scope#2"));
    assert_eq!(widget.call("close_handle", vec![handle.clone()]).unwrap().as_bool(), Some(true));
    assert_eq!(widget.call("close_handle", vec![handle]).unwrap().as_bool(), Some(false));
    assert_eq!(app.registry.var_count(), 0);
}

#[test]
fn remote_failures() {
    let (port, _) = spawn_server();
    let mut widget = Proxy::new("127.0.0.1", port, "Widget").unwrap();

    match widget.call("fail", vec![]) {
        Err(Error::Remote(exc)) => {
            assert!(exc.to_string().contains("boom"));
            let names: Vec<_> = exc.frames().iter().map(|x| x.name.as_str()).collect();
            assert_eq!(names, vec!["dispatch", "devproxy::demo"]);
        }
        _ => panic!("expected a remote exception"),
    }

    match widget.get_attribute("no_such_member") {
        Err(Error::Remote(exc)) => assert_eq!(exc.message(), "'Widget' object has no attribute 'no_such_member'"),
        _ => panic!("expected a remote exception"),
    }

    // a failed call leaves the proxy usable
    assert_eq!(widget.call("get_value", vec![Value::Int(1)]).unwrap(), Value::Int(2));

    let mut unknown = Proxy::new("127.0.0.1", port, "Gadget").unwrap();
    match unknown.get_attribute("value") {
        Err(Error::Remote(exc)) => assert_eq!(exc.message(), "no target registered for class 'Gadget'"),
        _ => panic!("expected a remote exception"),
    }
}
