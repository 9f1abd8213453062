use crate::http::{HTTPError, HTTPResult};
use crate::reddit::service::{Param, Service};
use crate::reddit::client;
use crate::reddit::{CommentRecord, ListingOptions, Post, Subreddit};
use crate::scrape::{CommentSource, Error};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn do_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn load_data(file: &str) -> String {
    fs::read_to_string(format!("tests/data/{file}.json")).expect("could not find test data")
}

/// Query parameters whose values select a different fixture file.
const FIXTURE_PARAMS: [&str; 3] = ["after", "comment", "link_id"];

/// Serves API responses from JSON files in `tests/data`.
///
/// The fixture for a request is named after its path, with slashes
/// replaced by underscores, followed by the values of any `after`,
/// `comment`, or `link_id` parameters. A GET for `/r/rust/top?after=t3_x`
/// is served from `tests/data/r_rust_top_t3_x.json`. Missing fixtures
/// behave like an HTTP 404.
#[derive(Debug, Default)]
pub struct TestService {
    requests: Mutex<Vec<String>>,
}

impl TestService {
    fn fixture_name(path: &str, params: &[Param<'_>]) -> String {
        let mut name = path.trim_matches('/').replace('/', "_");
        for (key, value) in params {
            if FIXTURE_PARAMS.contains(key) {
                name.push('_');
                name.push_str(value);
            }
        }
        name
    }

    /// Every request made so far, as `path?query`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Service for TestService {
    async fn get_resource(&self, path: &str, params: &[Param<'_>]) -> HTTPResult<String> {
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let request = if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        };
        self.requests.lock().unwrap().push(request);

        let filename = format!("tests/data/{}.json", Self::fixture_name(path, params));
        fs::read_to_string(&filename).map_err(|_| HTTPError::Http(StatusCode::NOT_FOUND))
    }
}

impl Subreddit<TestService> {
    /// Returns a subreddit with a handful of posts and comments.
    pub fn test() -> Self {
        Subreddit::new("rustaceans", TestService::default())
    }

    /// Returns a subreddit that does not exist.
    pub fn test_none() -> Self {
        Subreddit::new("doesnotexist", TestService::default())
    }
}

/// An in-memory source of posts and comments.
///
/// Posts are listed in insertion order. A post with no comments
/// registered fails as though it had been deleted.
#[derive(Debug, Default)]
pub struct FakeSource {
    posts: Vec<Post>,
    comments: HashMap<String, Vec<CommentRecord>>,
    delays: HashMap<String, Duration>,
    fetches: AtomicUsize,
    completed: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a post with the given `(body, score)` comments.
    pub fn post(mut self, id: &str, comments: &[(&str, i64)]) -> Self {
        self.posts.push(Post::new(id, format!("Post {id}"), comments.len() as u64));
        let records = comments
            .iter()
            .map(|(body, score)| CommentRecord::new(*body, *score).with_author(format!("{id}-author")))
            .collect();
        self.comments.insert(id.to_string(), records);
        self
    }

    /// Adds a post whose comments cannot be retrieved.
    pub fn broken_post(mut self, id: &str) -> Self {
        self.posts.push(Post::new(id, format!("Post {id}"), 1));
        self
    }

    /// Makes fetching the comments for post `id` take `delay`.
    pub fn delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    /// Number of comment fetches that have been started.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of comment fetches that have finished.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl CommentSource for FakeSource {
    async fn posts(&self, opts: &ListingOptions) -> Result<Vec<Post>, Error> {
        Ok(self
            .posts
            .iter()
            .take(opts.limit() as usize)
            .cloned()
            .collect())
    }

    async fn comments(&self, post: &Post) -> Result<Vec<CommentRecord>, Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(post.id()) {
            tokio::time::sleep(*delay).await;
        }
        let result = self.comments.get(post.id()).cloned().ok_or_else(|| {
            client::Error::NotFound(format!("post {}", post.id())).into()
        });
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}
