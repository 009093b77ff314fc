use clap::Parser;
use picoredis::config::Config;
use picoredis::db::Database;
use picoredis::executor::{spawn_periodic_flush, Executor};
use picoredis::logging;
use picoredis::persistence::PersistenceEngine;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "picoredis", about = "A lightweight in-memory key/value server speaking a RESP subset")]
struct Cli {
    /// redis.conf-style configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// TCP port to listen on, overrides the config file
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind, overrides the config file
    #[arg(long)]
    bind_host: Option<String>,

    /// Disable the periodic background flush timer
    #[arg(long)]
    no_periodic_flush: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut config = Config::default();
    if let Some(path) = &cli.config {
        if let Err(e) = config.load_file(path) {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.bind_host {
        config.bind_host = host;
    }
    if cli.no_periodic_flush {
        config.periodic_flush_enabled = false;
    }

    logging::init(config.loglevel);
    info!(?config, "starting picoredis");

    let persistence = match PersistenceEngine::open(std::path::Path::new(&config.dir), config.databases) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!(error = %e, "failed to open persistence engine");
            std::process::exit(1);
        }
    };

    let mut databases: Vec<Database> = (0..config.databases).map(Database::new).collect();
    for db in databases.iter_mut() {
        if let Err(e) = db.restore(&persistence) {
            error!(error = %e, index = db.index(), "failed to restore database");
            std::process::exit(1);
        }
    }

    let executor = Executor::spawn(databases, Arc::clone(&persistence));
    let handle = executor.handle();

    let flush_stop = Arc::new(AtomicBool::new(false));
    let flush_join = config.periodic_flush_enabled.then(|| {
        spawn_periodic_flush(
            handle.clone(),
            Duration::from_secs_f32(config.periodic_flush_seconds),
            Arc::clone(&flush_stop),
        )
    });

    {
        let shutdown_handle = handle.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("received shutdown signal, draining executor");
            shutdown_handle.shutdown();
            std::process::exit(0);
        }) {
            error!(error = %e, "failed to install signal handler");
        }
    }

    let num_dbs = config.databases;
    let serve_result = picoredis::server::serve(&config.bind_host, config.port, num_dbs, handle);

    flush_stop.store(true, Ordering::SeqCst);
    if let Some(join) = flush_join {
        let _ = join.join();
    }
    drop(executor);

    if let Err(e) = serve_result {
        error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
