// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Collects well-received comments from a subreddit's posts.
//!
//! A [`Scraper`] lists posts once, retrieves the comments on each post,
//! keeps the comments whose score is strictly greater than a threshold,
//! and optionally flattens their text onto a single line. Posts can be
//! visited one at a time or by a pool of concurrent workers; the
//! [`Strategy`] only affects the order of the resulting rows and how long
//! it takes to produce them, never which rows are produced.

use crate::reddit::client;
use crate::reddit::listing::{InvalidArgument, ListingOptions, SortBy, TimeFilter};
use crate::reddit::service::Service;
use crate::reddit::{CommentRecord, Post, Subreddit};
use crate::text;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// Default minimum score, exclusive, for a comment to be kept.
pub const DEFAULT_UPVOTE_THRESHOLD: i64 = 5;

/// A source of posts and their comments.
///
/// [`Subreddit`] is the real implementation. Sources are shared between
/// concurrent workers, so they must be [`Send`] and [`Sync`].
pub trait CommentSource: Send + Sync {
    /// Lists posts according to `opts`.
    fn posts(&self, opts: &ListingOptions)
    -> impl Future<Output = Result<Vec<Post>, Error>> + Send;

    /// Retrieves every comment on `post`.
    fn comments(&self, post: &Post)
    -> impl Future<Output = Result<Vec<CommentRecord>, Error>> + Send;
}

impl<S: Service> CommentSource for Subreddit<S> {
    async fn posts(&self, opts: &ListingOptions) -> Result<Vec<Post>, Error> {
        Ok(Subreddit::posts(self, opts).await?)
    }

    async fn comments(&self, post: &Post) -> Result<Vec<CommentRecord>, Error> {
        Ok(Subreddit::comments(self, post).await?)
    }
}

/// How posts are visited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// One post at a time, in listing order.
    Sequential,

    /// Up to `workers` posts at a time, in no particular order.
    Parallel { workers: usize },
}

impl Strategy {
    /// Parallel strategy with one worker per available CPU.
    pub fn parallel() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::Parallel { workers }
    }

    /// Parallel strategy with the given number of workers (at least one).
    pub fn with_workers(workers: usize) -> Self {
        Self::Parallel {
            workers: workers.max(1),
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::parallel()
    }
}

/// What to do when a post's comments cannot be retrieved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Fail the whole scrape.
    #[default]
    Abort,

    /// Log a warning, leave the post out, and carry on.
    Skip,
}

/// Options for a scrape.
#[derive(Clone, Debug)]
pub struct ScrapeOptions {
    listing: ListingOptions,
    upvote_threshold: i64,
    strip_comments: bool,
    strategy: Strategy,
    failure_policy: FailurePolicy,
    progress: bool,
}

impl ScrapeOptions {
    /// Incrementally builds a new set of scrape options.
    ///
    /// # Examples
    ///
    /// ```
    /// use subscrape::reddit::{SortBy, TimeFilter};
    /// use subscrape::scrape::{ScrapeOptions, Strategy};
    /// let opts = ScrapeOptions::build()
    ///     .sort_by(SortBy::Top)
    ///     .time_filter(TimeFilter::Week)
    ///     .limit(50)
    ///     .upvote_threshold(10)
    ///     .strategy(Strategy::Sequential)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(opts.upvote_threshold(), 10);
    /// ```
    pub fn build() -> ScrapeOptionsBuilder {
        ScrapeOptionsBuilder::default()
    }

    /// Which posts are listed.
    pub fn listing(&self) -> &ListingOptions {
        &self.listing
    }

    /// Comments must score strictly more than this to be kept.
    pub fn upvote_threshold(&self) -> i64 {
        self.upvote_threshold
    }

    /// True if comment text is flattened onto a single line.
    pub fn strip_comments(&self) -> bool {
        self.strip_comments
    }

    /// How posts are visited.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// What happens when a post cannot be retrieved.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }
}

/// A builder for scrape options.
///
/// You probably don't want to use this directly; call [`ScrapeOptions::build()`]
/// and construct it incrementally instead.
#[derive(Debug)]
#[must_use]
pub struct ScrapeOptionsBuilder {
    sort_by: SortBy,
    time_filter: TimeFilter,
    limit: u32,
    upvote_threshold: i64,
    strip_comments: bool,
    strategy: Strategy,
    failure_policy: FailurePolicy,
    progress: bool,
}

impl Default for ScrapeOptionsBuilder {
    fn default() -> Self {
        Self {
            sort_by: SortBy::default(),
            time_filter: TimeFilter::default(),
            limit: ListingOptions::DEFAULT_LIMIT,
            upvote_threshold: DEFAULT_UPVOTE_THRESHOLD,
            strip_comments: true,
            strategy: Strategy::default(),
            failure_policy: FailurePolicy::default(),
            progress: false,
        }
    }
}

impl ScrapeOptionsBuilder {
    /// Sets the order in which posts are listed.
    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Sets the time window for top posts.
    pub fn time_filter(mut self, time_filter: TimeFilter) -> Self {
        self.time_filter = time_filter;
        self
    }

    /// Sets the maximum number of posts to visit.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the exclusive minimum score for kept comments.
    pub fn upvote_threshold(mut self, upvote_threshold: i64) -> Self {
        self.upvote_threshold = upvote_threshold;
        self
    }

    /// Sets whether comment text is flattened onto a single line.
    pub fn strip_comments(mut self, strip_comments: bool) -> Self {
        self.strip_comments = strip_comments;
        self
    }

    /// Sets how posts are visited.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets what happens when a post cannot be retrieved.
    pub fn failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Sets whether a progress bar is drawn on stderr.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Finalizes the [`ScrapeOptions`].
    ///
    /// Fails if the limit is zero.
    pub fn build(self) -> Result<ScrapeOptions, Error> {
        let listing = ListingOptions::new(self.sort_by, self.time_filter, self.limit)?;
        Ok(ScrapeOptions {
            listing,
            upvote_threshold: self.upvote_threshold,
            strip_comments: self.strip_comments,
            strategy: self.strategy,
            failure_policy: self.failure_policy,
            progress: self.progress,
        })
    }
}

/// A comment that survived filtering, ready to be written out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRow {
    body: String,
    score: i64,
    post: String,
    author: Option<String>,
}

impl OutputRow {
    /// The comment text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The comment's score.
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Title of the post the comment was made on.
    pub fn post(&self) -> &str {
        &self.post
    }

    /// The comment's author, if the account still exists.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }
}

/// The outcome of a scrape.
#[derive(Debug, Default)]
pub struct Scrape {
    rows: Vec<OutputRow>,
    visited: usize,
    skipped: Vec<String>,
    cancelled: bool,
}

impl Scrape {
    /// The comments that were kept.
    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    /// Consumes the scrape, returning the comments that were kept.
    pub fn into_rows(self) -> Vec<OutputRow> {
        self.rows
    }

    /// Number of posts whose comments were retrieved.
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// IDs of posts left out under [`FailurePolicy::Skip`].
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// True if the scrape was cancelled before every post was visited.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Keeps the comments scoring above the threshold and shapes them into rows.
///
/// This is the only place comments are filtered or transformed, so every
/// [`Strategy`] produces the same rows.
pub fn filter_comments(
    post: &Post,
    comments: Vec<CommentRecord>,
    opts: &ScrapeOptions,
) -> Vec<OutputRow> {
    comments
        .into_iter()
        .filter(|c| c.score() > opts.upvote_threshold)
        .map(|c| {
            let score = c.score();
            let author = c.author().map(String::from);
            let body = if opts.strip_comments {
                text::normalize(c.body())
            } else {
                c.into_body()
            };
            OutputRow {
                body,
                score,
                post: post.title().to_string(),
                author,
            }
        })
        .collect()
}

/// Scrapes comments from a [`CommentSource`].
#[derive(Debug)]
pub struct Scraper<C> {
    source: Arc<C>,
}

impl<C: CommentSource + 'static> Scraper<C> {
    /// Creates a scraper that reads from `source`.
    pub fn new(source: C) -> Self {
        Self::from_arc(Arc::new(source))
    }

    /// Creates a scraper that reads from a shared `source`.
    pub fn from_arc(source: Arc<C>) -> Self {
        Self { source }
    }

    /// Runs a scrape to completion.
    pub async fn scrape(&self, opts: &ScrapeOptions) -> Result<Scrape, Error> {
        self.scrape_until(opts, future::pending()).await
    }

    /// Runs a scrape until it completes or `cancel` resolves.
    ///
    /// On cancellation, outstanding fetches are abandoned and the rows
    /// gathered so far are returned with [`Scrape::is_cancelled()`] set.
    pub async fn scrape_until(
        &self,
        opts: &ScrapeOptions,
        cancel: impl Future<Output = ()>,
    ) -> Result<Scrape, Error> {
        tokio::pin!(cancel);

        let posts = tokio::select! {
            biased;
            _ = &mut cancel => {
                warn!("Cancelled while listing posts");
                return Ok(Scrape { cancelled: true, ..Scrape::default() });
            }
            posts = self.source.posts(&opts.listing) => posts?,
        };
        info!("Found {} posts", posts.len());

        let progress = progress_bar(posts.len(), opts.progress);
        let scrape = match opts.strategy {
            Strategy::Sequential => self.sequential(posts, opts, &progress, cancel).await,
            Strategy::Parallel { workers } => {
                self.parallel(posts, workers, opts, &progress, cancel).await
            }
        };
        progress.finish_and_clear();

        let scrape = scrape?;
        info!(
            "Kept {} comments from {} posts",
            scrape.rows.len(),
            scrape.visited
        );
        Ok(scrape)
    }

    async fn sequential(
        &self,
        posts: Vec<Post>,
        opts: &ScrapeOptions,
        progress: &ProgressBar,
        mut cancel: std::pin::Pin<&mut impl Future<Output = ()>>,
    ) -> Result<Scrape, Error> {
        let mut scrape = Scrape::default();

        for post in posts {
            let result = tokio::select! {
                biased;
                _ = &mut cancel => {
                    warn!("Cancelled after {} posts", scrape.visited);
                    scrape.cancelled = true;
                    break;
                }
                result = self.source.comments(&post) => result,
            };
            collect(&mut scrape, &post, result, opts)?;
            progress.inc(1);
        }

        Ok(scrape)
    }

    async fn parallel(
        &self,
        posts: Vec<Post>,
        workers: usize,
        opts: &ScrapeOptions,
        progress: &ProgressBar,
        mut cancel: std::pin::Pin<&mut impl Future<Output = ()>>,
    ) -> Result<Scrape, Error> {
        debug!("Fetching comments with {workers} workers");
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut tasks = JoinSet::new();

        for post in posts {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = source.comments(&post).await;
                (post, result)
            });
        }

        // Dropping the JoinSet on an early return aborts the remaining workers.
        let mut scrape = Scrape::default();
        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    tasks.abort_all();
                    // Workers that finished before the abort still count.
                    while let Some(joined) = tasks.try_join_next() {
                        if let Ok((post, result)) = joined {
                            collect(&mut scrape, &post, result, opts)?;
                            progress.inc(1);
                        }
                    }
                    warn!("Cancelled after {} posts", scrape.visited);
                    scrape.cancelled = true;
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(joined) => {
                        let (post, result) = joined?;
                        collect(&mut scrape, &post, result, opts)?;
                        progress.inc(1);
                    }
                    None => break,
                },
            }
        }

        Ok(scrape)
    }
}

fn collect(
    scrape: &mut Scrape,
    post: &Post,
    result: Result<Vec<CommentRecord>, Error>,
    opts: &ScrapeOptions,
) -> Result<(), Error> {
    match result {
        Ok(comments) => {
            let total = comments.len();
            let rows = filter_comments(post, comments, opts);
            debug!("Kept {} of {total} comments from post {}", rows.len(), post.id());
            scrape.rows.extend(rows);
            scrape.visited += 1;
            Ok(())
        }
        Err(err) => match opts.failure_policy {
            FailurePolicy::Abort => Err(Error::Post {
                id: post.id().to_string(),
                source: Box::new(err),
            }),
            FailurePolicy::Skip => {
                warn!("Skipping post {}: {err}", post.id());
                scrape.skipped.push(post.id().to_string());
                Ok(())
            }
        },
    }
}

fn progress_bar(len: usize, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} Scraping post comments {pos}/{len} [{bar:.cyan/blue}] {percent:>3}%  \
         elapsed: {elapsed_precise}  eta: {eta_precise}",
    ) {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// A scrape error.
#[derive(Debug, Error)]
pub enum Error {
    /// An option had a value that is not allowed.
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    /// The Reddit client failed.
    #[error(transparent)]
    Client(#[from] client::Error),

    /// The comments on a single post could not be retrieved.
    #[error("Could not retrieve comments for post {id}: {source}")]
    Post {
        id: String,
        #[source]
        source: Box<Error>,
    },

    /// A worker panicked or was aborted.
    #[error("Worker failed: {0}")]
    Worker(#[from] JoinError),
}
