use std::time::Duration;

use crate::error::Error;
use crate::shared::Shared;
use crate::state::{self, Tally};
use crate::thread::publisher::{self, Publisher};
use crate::thread::timer::Timer;
use crate::thread::worker::Worker;
use crate::transport::Transport;

const DEFAULT_WORKERS: usize = 20;
const DEFAULT_DURATION: Duration = Duration::from_secs(180);

#[derive(Clone, Debug)]
pub struct Config {
    /// Number of concurrent vote workers
    workers: usize,

    /// Time from start until the poll closes
    duration: Duration,

    /// Upper bound on a single broadcast attempt
    publish_timeout: Duration,

    /// Options voters may choose from
    options: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workers: DEFAULT_WORKERS,
            duration: DEFAULT_DURATION,
            publish_timeout: publisher::DEFAULT_TIMEOUT,
            options: state::DEFAULT_OPTIONS.iter().map(|option| option.to_string()).collect(),
        }
    }
}

impl Config {
    /// Sets the worker pool size. At least one worker always runs.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = std::cmp::max(workers, 1);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub fn with_options<I, O>(mut self, options: I) -> Self
    where I: IntoIterator<Item = O>,
          O: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Runs a poll over `transport` until its deadline and returns the final
    /// tally. Fails only if the inbound stream cannot be obtained.
    ///
    /// In-flight workers are aborted once the final tally has been published;
    /// anything they were doing at that point is lost.
    pub async fn run<T: Transport>(self, mut transport: T) -> Result<Tally, Error> {
        let rx = transport.subscribe()?;
        let shared = Shared::new(self.options.iter().cloned());
        let publisher = Publisher::new(transport, self.publish_timeout);

        info!("starting {} workers", self.workers);
        info!("poll closes in {:?}, options {:?}", self.duration, self.options);

        let workers = (0..self.workers)
            .map(|id| Worker::new(id, rx.clone(), shared.clone(), publisher.clone()))
            .map(|worker| tokio::spawn(worker.run()))
            .collect::<Vec<_>>();

        let mut timer = Timer::new(self.duration, shared, publisher);
        let result = timer.run().await;

        for worker in workers {
            worker.abort();
        }

        Ok(result)
    }
}
