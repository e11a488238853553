use anyhow::Context;
use clap::{crate_authors, crate_version, Arg, Command as ClapCommand};
use env_logger::Env;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

use devproxy::{demo, App};

fn main() -> anyhow::Result<()> {
    let matches = ClapCommand::new("Remote object server")
        .author(crate_authors!())
        .version(crate_version!())
        .about("Serve local objects to devproxy clients over line-delimited JSON")
        .arg(
            Arg::new("host")
                .long("host")
                .takes_value(true)
                .default_value("127.0.0.1")
                .help("Define the address to listen on."),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .takes_value(true)
                .default_value("5905")
                .help("Define the port to listen on."),
        )
        .arg(Arg::new("verbose").long("verbose").short('v').help("Log verbose output"))
        .get_matches();

    if matches.is_present("verbose") {
        env_logger::Builder::from_env(Env::default().default_filter_or("devproxy=debug")).init();
    } else {
        env_logger::init();
    }

    let host = matches.value_of("host").unwrap_or("127.0.0.1").to_string();
    let port = matches.value_of("port").unwrap_or("5905");
    let port: u16 = port
        .parse()
        .with_context(|| format!("Cannot parse `{}` as a port number.", port))?;

    let rt = Runtime::new()?;
    rt.block_on(async move {
        let app = App::new();
        demo::register(&app.registry);

        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .with_context(|| format!("Failed to listen on {}:{}", host, port))?;
        log::info!("Serving {:?} on tcp://{}:{}", app.registry.classes(), host, port);
        println!("Listening on tcp://{}:{}", host, port);

        app.run(listener).await?;
        log::debug!("Application quitting.");
        Ok(())
    })
}
