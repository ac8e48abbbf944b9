#[macro_use]
extern crate log;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use structopt::StructOpt;
use tally::{socket, Notification, Vote, DEFAULT_OPTIONS};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

mod server;

/// Upper bound on sending a single simulated vote.
const SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Attempts to reach a freshly spawned server before giving up.
const CONNECT_ATTEMPTS: usize = 50;

#[derive(StructOpt)]
#[structopt(name = "loadtest")]
struct Opt {
    /// Address of the voting server
    #[structopt(short = "a", long = "address", default_value = "127.0.0.1:5672")]
    address: SocketAddr,

    /// Number of simulated voters
    #[structopt(short = "n", long = "clients", default_value = "20000")]
    clients: usize,

    /// Voters multiplexed onto each TCP connection
    #[structopt(short = "c", long = "per-connection", default_value = "1000")]
    per_connection: usize,

    /// Option every voter picks, or `random`
    #[structopt(short = "o", long = "option", default_value = "A")]
    option: String,

    /// Prefix for generated voter IDs
    #[structopt(short = "p", long = "prefix", default_value = "loadtest_")]
    prefix: String,

    /// Wait for the final result before exiting
    #[structopt(short = "w", long = "wait")]
    wait: bool,

    /// Server binary to spawn before the test
    #[structopt(short = "s", long = "server", parse(from_os_str))]
    server: Option<std::path::PathBuf>,

    /// Poll duration for a spawned server
    #[structopt(short = "t", long = "timeout", default_value = "180s")]
    #[structopt(parse(try_from_str = humantime::parse_duration))]
    timeout: Duration,

    /// Logging verbosity, also passed to a spawned server
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,
}

type Connection = Arc<Mutex<socket::Tx<Vote>>>;

/// Number of connections needed to carry `clients` voters.
fn connections_for(clients: usize, per_connection: usize) -> usize {
    let per_connection = std::cmp::max(per_connection, 1);
    (clients + per_connection - 1) / per_connection
}

/// Option voter `id` picks.
fn choose(option: &str, id: usize) -> String {
    if option.eq_ignore_ascii_case("random") {
        let mut rng = rand::thread_rng();
        DEFAULT_OPTIONS.choose(&mut rng)
            .map(|option| option.to_string())
            .unwrap_or_else(|| DEFAULT_OPTIONS[id % DEFAULT_OPTIONS.len()].to_string())
    } else {
        option.to_string()
    }
}

async fn connect(address: SocketAddr, attempts: usize) -> std::io::Result<TcpStream> {
    let mut attempt = 1;
    loop {
        match TcpStream::connect(address).await {
        | Ok(stream) => return Ok(stream),
        | Err(error) if attempt >= attempts => return Err(error),
        | Err(_) => {
            attempt += 1;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        }
    }
}

async fn vote(connection: Connection, vote: Vote) -> bool {
    let user_id = vote.user_id.clone();
    let send = async {
        let mut tx = connection.lock().await;
        tx.send(&vote).await
    };
    match tokio::time::timeout(SEND_TIMEOUT, send).await {
    | Ok(Ok(())) => true,
    | Ok(Err(error)) => {
        warn!("failed to send vote for {}: {}", user_id, error);
        false
    }
    | Err(_) => {
        warn!("timed out sending vote for {}", user_id);
        false
    }
    }
}

async fn run(opt: Opt) {
    let _server = match &opt.server {
    | None => None,
    | Some(path) => match server::Server::new(path, opt.address, opt.timeout, opt.verbose) {
        | Ok(server) => {
            println!("Spawned server {:?} as process {}", path, server.id());
            Some(server)
        }
        | Err(error) => {
            error!("could not spawn server {:?}: {}", path, error);
            std::process::exit(1)
        }
        },
    };
    let attempts = if opt.server.is_some() { CONNECT_ATTEMPTS } else { 1 };

    println!("Starting load test with {} concurrent clients.", opt.clients);
    let count = connections_for(opt.clients, opt.per_connection);
    println!("Opening {} TCP connections to spread the load...", count);

    let start = Instant::now();
    let mut readers = Vec::with_capacity(count);
    let mut writers: Vec<Connection> = Vec::with_capacity(count);
    for i in 0..count {
        let stream = match connect(opt.address, attempts).await {
        | Ok(stream) => stream,
        | Err(error) => {
            error!("failed to open connection {}: {}", i, error);
            std::process::exit(1)
        }
        };
        let (rx, tx) = socket::split::<Notification, Vote>(stream);
        readers.push(rx);
        writers.push(Arc::new(Mutex::new(tx)));
    }

    let tasks = (1..=opt.clients)
        .map(|id| {
            let connection = writers[id % count].clone();
            let request = Vote::new(format!("{}{}", opt.prefix, id), choose(&opt.option, id));
            tokio::spawn(vote(connection, request))
        })
        .collect::<Vec<_>>();

    let mut sent = 0;
    for task in tasks {
        if let Ok(true) = task.await {
            sent += 1;
        }
    }

    let elapsed = start.elapsed();
    let rate = sent as f64 / elapsed.as_secs_f64();
    println!("Test finished.");
    println!("Total: {} votes ({} failed)", sent, opt.clients - sent);
    println!("Time: {:?}", elapsed);
    println!("Performance: {:.2} req/s", rate);

    if !opt.wait {
        return
    }

    let mut rx = match readers.into_iter().next() {
    | Some(rx) => rx,
    | None => return,
    };
    println!("Waiting for the poll to close...");
    while let Some(message) = rx.next().await {
        if let Ok(Notification::Final { result }) = message {
            println!("Final result:\n{}", ballot::render(&result));
            return
        }
    }
    error!("server disconnected before the final result");
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();
    if let Err(error) = ballot::logger::init(opt.verbose) {
        eprintln!("[ERROR]: could not install logger: {}", error);
    }
    run(opt).await
}
