use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Voting server spawned as a child process. Killed when dropped.
pub struct Server(std::process::Child);

impl Server {
    pub fn new(
        path: &Path,
        address: SocketAddr,
        timeout: Duration,
        verbose: u8,
    ) -> std::io::Result<Self> {
        let address = address.to_string();
        let timeout = humantime::format_duration(timeout).to_string();
        let mut command = std::process::Command::new(path);
        if verbose > 0 {
            let verbosity = "-".to_string() + &"v".repeat(verbose as usize);
            command.arg(&verbosity);
        }
        command.args(&["-a", &address])
            .args(&["-t", &timeout])
            .spawn()
            .map(Server)
    }

    pub fn id(&self) -> u32 {
        self.0.id()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.0.kill().ok();
    }
}
