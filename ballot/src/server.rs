#[macro_use]
extern crate log;

use std::net::SocketAddr;

use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "ballot-server")]
struct Opt {
    /// Address to accept voters on
    #[structopt(short = "a", long = "address", default_value = "127.0.0.1:5672")]
    address: SocketAddr,

    /// How long the poll stays open, e.g. `180s` or `1h 30m`
    #[structopt(short = "t", long = "timeout", env = "VOTING_TIMEOUT", default_value = "180s")]
    timeout: String,

    /// Number of concurrent vote workers
    #[structopt(short = "w", long = "workers", env = "VOTING_WORKERS", default_value = "20")]
    workers: usize,

    /// Logging verbosity (-v for debug, -vv for trace)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();

    if let Err(error) = ballot::logger::init(opt.verbose) {
        eprintln!("[ERROR]: could not install logger: {}", error);
    }

    let transport = match tally::transport::Tcp::bind(opt.address).await {
    | Ok(transport) => transport,
    | Err(error) => {
        error!("{}", error);
        std::process::exit(1)
    }
    };

    let config = tally::Config::default();
    let duration = match ballot::parse_duration(&opt.timeout) {
    | Some(duration) => duration,
    | None => {
        warn!("invalid timeout {:?}, using {:?}", opt.timeout, config.duration());
        config.duration()
    }
    };
    let config = config
        .with_workers(opt.workers)
        .with_duration(duration);

    info!("voting server started with {} workers", config.workers());
    info!("maximum voting time: {:?}", config.duration());

    match config.run(transport).await {
    | Ok(_) => std::process::exit(0),
    | Err(error) => {
        error!("{}", error);
        std::process::exit(1)
    }
    }
}
