use std::io::Write;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use structopt::StructOpt;
use tally::{socket, Notification, Vote, DEFAULT_OPTIONS};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Upper bound on sending the single vote.
const SEND_TIMEOUT: Duration = Duration::from_secs(2);

type Input = Lines<BufReader<Stdin>>;

fn prompt(text: &str) {
    print!("{}", text);
    std::io::stdout().flush().ok();
}

fn options() {
    println!("\nVoting options: {}", DEFAULT_OPTIONS.join(", "));
    prompt("Enter your option: ");
}

/// Reads the next line of input, or `None` once stdin is closed.
async fn line(input: &mut Input) -> Option<String> {
    input.next_line().await.ok().flatten()
}

/// Asks for an identifier until a non-empty one is entered.
async fn read_id(input: &mut Input) -> Option<String> {
    loop {
        prompt("Enter your unique ID or name: ");
        let id = line(input).await?.trim().to_string();
        if !id.is_empty() {
            return Some(id)
        }
        println!("[ERROR]: ID cannot be empty, try again");
    }
}

/// Asks for an option until a valid one is entered.
async fn read_option(input: &mut Input) -> Option<String> {
    loop {
        options();
        let option = line(input).await?.trim().to_uppercase();
        if DEFAULT_OPTIONS.contains(&option.as_str()) {
            return Some(option)
        }
        println!("[ERROR]: invalid option, try again");
    }
}

/// Prints server broadcasts until the final result arrives.
async fn listen(mut rx: socket::Rx<Notification>, id: String, voted: Arc<AtomicBool>) {
    while let Some(message) = rx.next().await {
        let message = match message {
        | Ok(message) => message,
        | Err(_) => continue,
        };
        match message {
        | Notification::Confirmation { user_id, message } => {
            if user_id == id {
                voted.store(true, Ordering::SeqCst);
                println!("\n[RESPONSE]: {}", message);
            }
        }
        | Notification::Error { user_id, message } => {
            if user_id == id {
                println!("\n[ERROR]: {}", message);
            }
        }
        | Notification::Partial { result } => {
            println!("\nPartial result:\n{}", ballot::render(&result));
            if !voted.load(Ordering::SeqCst) {
                options();
            }
        }
        | Notification::Final { result } => {
            println!("\nFinal result:\n{}", ballot::render(&result));
            println!("\nPoll closed, exiting.");
            std::process::exit(0)
        }
        }
    }
    println!("\n[ERROR]: server disconnected");
    std::process::exit(1)
}

#[derive(StructOpt)]
#[structopt(name = "ballot-client")]
struct Opt {
    /// Address of the voting server
    #[structopt(short = "a", long = "address", default_value = "127.0.0.1:5672")]
    address: SocketAddr,

    /// Unique voter ID, prompted for if absent
    #[structopt(short = "i", long = "id")]
    id: Option<String>,
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let id = match opt.id.filter(|id| !id.trim().is_empty()) {
    | Some(id) => id.trim().to_string(),
    | None => match read_id(&mut input).await {
        | Some(id) => id,
        | None => return,
        },
    };

    let stream = match tokio::net::TcpStream::connect(&opt.address).await {
    | Ok(stream) => stream,
    | Err(error) => {
        println!("[ERROR]: failed to connect to server at {}: {}", opt.address, error);
        std::process::exit(1)
    }
    };

    let (rx, mut tx) = socket::split::<Notification, Vote>(stream);
    let voted = Arc::new(AtomicBool::new(false));
    tokio::spawn(listen(rx, id.clone(), voted.clone()));

    let option = match read_option(&mut input).await {
    | Some(option) => option,
    | None => return,
    };

    let vote = Vote::new(id, option);
    match tokio::time::timeout(SEND_TIMEOUT, tx.send(&vote)).await {
    | Ok(Ok(())) => println!("\nVote sent, waiting for confirmation and updates from the server...\n"),
    | Ok(Err(error)) => {
        println!("[ERROR]: failed to send vote: {}", error);
        std::process::exit(1)
    }
    | Err(_) => {
        println!("[ERROR]: timed out sending vote");
        std::process::exit(1)
    }
    }

    // Votes are final; keep reading so stray input gets an answer
    while line(&mut input).await.is_some() {
        println!("Duplicate votes are not allowed, you have already taken part in this poll.");
    }
    std::future::pending::<()>().await
}
