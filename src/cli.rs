// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Drives the command-line program.

use crate::conf::{CredentialError, Credentials};
use crate::output::{self, Columns, WriteOptions};
use crate::reddit::auth::AuthError;
use crate::reddit::client;
use crate::reddit::service::{RedditService, Service};
use crate::reddit::{SortBy, Subreddit, TimeFilter};
use crate::scrape::{self, FailurePolicy, ScrapeOptions, Scraper, Strategy};
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::{future, process};
use thiserror::Error;
use tokio::signal;

/// Prints `message` to stderr and exits with `error_code`.
pub fn die(error_code: i32, message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(error_code);
}

/// Program configuration.
#[derive(Debug, Parser)]
#[command(version)]
#[command(about = "Downloads well-received comments from a subreddit into a CSV file", long_about = None)]
pub struct Config {
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// Name of the subreddit, without the leading "r/"
    subreddit: String,

    /// Which posts to scrape
    #[arg(short = 's', long = "sort", value_enum, default_value_t = SortBy::Top)]
    sort_by: SortBy,

    /// Time window for top posts
    #[arg(short = 't', long = "time", value_enum, default_value_t = TimeFilter::Year)]
    time_filter: TimeFilter,

    /// Maximum number of posts to scrape
    #[arg(short = 'n', long, default_value_t = 999, value_parser = clap::value_parser!(u32).range(1..))]
    limit: u32,

    /// Only keep comments scoring more than this
    #[arg(short = 'u', long = "threshold", default_value_t = scrape::DEFAULT_UPVOTE_THRESHOLD, allow_negative_numbers = true)]
    upvote_threshold: i64,

    /// Where to write the CSV file [default: <SUBREDDIT>_<TIMESTAMP>.csv]
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Keep comment text exactly as posted instead of flattening it onto one line
    #[arg(long, default_value_t = false)]
    raw: bool,

    /// Fetch one post at a time, preserving listing order
    #[arg(long, default_value_t = false, conflicts_with = "jobs")]
    sequential: bool,

    /// Number of posts to fetch at once [default: number of CPUs]
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Leave out posts whose comments cannot be retrieved instead of failing
    #[arg(long, default_value_t = false)]
    skip_failed: bool,

    /// Also write each comment's post title and author
    #[arg(long, default_value_t = false)]
    metadata: bool,

    /// Fail instead of replacing an existing output file
    #[arg(long, default_value_t = false)]
    no_clobber: bool,

    /// Read credentials from this file instead of .env
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Do not draw a progress bar
    #[arg(long, default_value_t = false)]
    no_progress: bool,
}

impl Config {
    /// Requested logging verbosity.
    pub fn verbosity(&self) -> Verbosity<WarnLevel> {
        self.verbosity
    }

    fn strategy(&self) -> Strategy {
        if self.sequential {
            Strategy::Sequential
        } else {
            self.jobs
                .map(Strategy::with_workers)
                .unwrap_or_else(Strategy::parallel)
        }
    }

    fn failure_policy(&self) -> FailurePolicy {
        if self.skip_failed {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        }
    }

    fn scrape_options(&self) -> Result<ScrapeOptions, Error> {
        Ok(ScrapeOptions::build()
            .sort_by(self.sort_by)
            .time_filter(self.time_filter)
            .limit(self.limit)
            .upvote_threshold(self.upvote_threshold)
            .strip_comments(!self.raw)
            .strategy(self.strategy())
            .failure_policy(self.failure_policy())
            .progress(!self.no_progress)
            .build()?)
    }

    fn write_options(&self) -> WriteOptions {
        let columns = if self.metadata {
            Columns::WithMetadata
        } else {
            Columns::Basic
        };
        WriteOptions::default()
            .columns(columns)
            .no_clobber(self.no_clobber)
    }
}

/// Runs the command-line program.
#[derive(Debug)]
pub struct Runner {
    config: Config,
}

impl Runner {
    /// Create a new program runner using the given `config`.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the command-line program using its stored configuration options.
    ///
    /// Pressing Ctrl-C stops the scrape early; whatever was collected up
    /// to that point is still written out. Returns the path of the file
    /// that was written.
    pub async fn run(&self) -> Result<PathBuf, Error> {
        let config = &self.config;
        let job = Job {
            subreddit: &config.subreddit,
            scrape: config.scrape_options()?,
            write: config.write_options(),
            path: config.output.clone(),
            env_file: config.env_file.as_deref(),
        };
        job.run(interrupted()).await
    }
}

/// Downloads comments from `subreddit` and writes them to `path`.
///
/// `time_filter` is one of `all`, `day`, `month`, `week`, `year`, or
/// `hour`, and `sort_by` is one of `top`, `new`, or `hot`; anything else
/// fails with an invalid argument error before Reddit is contacted.
/// Credentials are read from a `.env` file (see [`crate::conf`]). If
/// `path` is `None`, a name is derived from the subreddit and the current
/// time. Returns the path of the file that was written.
#[allow(clippy::too_many_arguments)]
pub async fn scrape_subreddit(
    subreddit: &str,
    time_filter: &str,
    limit: u32,
    upvote_threshold: i64,
    sort_by: &str,
    path: Option<&Path>,
    strip_comments: bool,
    use_multiprocessing: bool,
) -> Result<PathBuf, Error> {
    let time_filter: TimeFilter = time_filter.parse().map_err(scrape::Error::from)?;
    let sort_by: SortBy = sort_by.parse().map_err(scrape::Error::from)?;
    let strategy = if use_multiprocessing {
        Strategy::parallel()
    } else {
        Strategy::Sequential
    };
    let scrape = ScrapeOptions::build()
        .sort_by(sort_by)
        .time_filter(time_filter)
        .limit(limit)
        .upvote_threshold(upvote_threshold)
        .strip_comments(strip_comments)
        .strategy(strategy)
        .build()?;

    let job = Job {
        subreddit,
        scrape,
        write: WriteOptions::default(),
        path: path.map(Path::to_path_buf),
        env_file: None,
    };
    job.run(future::pending()).await
}

/// Everything needed for one scrape, from credentials to output file.
struct Job<'a> {
    subreddit: &'a str,
    scrape: ScrapeOptions,
    write: WriteOptions,
    path: Option<PathBuf>,
    env_file: Option<&'a Path>,
}

impl Job<'_> {
    async fn run(self, cancel: impl Future<Output = ()>) -> Result<PathBuf, Error> {
        let path = self.output_path();
        if self.write.is_no_clobber() && path.exists() {
            return Err(output::Error::Exists(path).into());
        }

        let credentials = Credentials::load(self.env_file)?;
        info!("Authenticating as {}", credentials.user_agent());
        let service = RedditService::authenticate(&credentials).await?;

        self.scrape_into(Subreddit::new(self.subreddit, service), path, cancel)
            .await
    }

    fn output_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| output::default_path(self.subreddit))
    }

    async fn scrape_into<S: Service + 'static>(
        &self,
        subreddit: Subreddit<S>,
        path: PathBuf,
        cancel: impl Future<Output = ()>,
    ) -> Result<PathBuf, Error> {
        let about = subreddit.about().await?;
        if about.is_quarantined() {
            warn!(
                "r/{} is quarantined; Reddit may refuse to list its posts",
                about.display_name()
            );
        }

        let scrape = Scraper::new(subreddit)
            .scrape_until(&self.scrape, cancel)
            .await?;
        if scrape.is_cancelled() {
            warn!(
                "Interrupted; writing the {} comments collected so far",
                scrape.rows().len()
            );
        }
        if !scrape.skipped().is_empty() {
            warn!("Skipped {} posts", scrape.skipped().len());
        }

        output::write_rows(&path, scrape.rows(), &self.write)?;
        info!("Wrote {} comments to {}", scrape.rows().len(), path.display());
        Ok(path)
    }
}

/// Resolves when the user presses Ctrl-C.
async fn interrupted() {
    if signal::ctrl_c().await.is_err() {
        warn!("Could not listen for Ctrl-C; the scrape cannot be interrupted");
        future::pending::<()>().await;
    }
}

/// A program error.
#[derive(Debug, Error)]
pub enum Error {
    /// Credentials could not be loaded.
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// Reddit refused to authenticate.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The subreddit could not be read.
    #[error(transparent)]
    Client(#[from] client::Error),

    /// The scrape failed.
    #[error(transparent)]
    Scrape(#[from] scrape::Error),

    /// The output file could not be written.
    #[error(transparent)]
    Output(#[from] output::Error),
}
