// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! A "thing" in the Reddit sense.
//!
//! Historically in the Reddit API and its old source code, a "Thing" was
//! any element of the Reddit system: users, posts, comments, etc. This
//! module parses the JSON representation of the things a subreddit scrape
//! touches (subreddits, posts, comments, and the "load more comments"
//! placeholders that stand in for the parts of a comment tree that Reddit
//! does not send up front).

use crate::text::convert_html_entities;
use serde::Deserialize;
use thiserror::Error;

/// Author name Reddit reports for comments whose account no longer exists.
const DELETED_AUTHOR: &str = "[deleted]";

/// Information about a subreddit.
#[derive(Clone, Debug, Deserialize)]
pub struct About {
    display_name: String,

    #[serde(default)]
    subscribers: Option<u64>,

    #[serde(default)]
    quarantine: bool,
}

impl About {
    /// Parses the result of a call to `/r/<subreddit>/about`.
    pub fn parse(data: &str) -> Result<Self, Error> {
        let child: Child<About> = serde_json::from_str(data)?;
        if child.kind != "t5" {
            return Err(Error::UnexpectedKind(child.kind));
        }
        Ok(child.data)
    }

    /// The subreddit's name, as Reddit capitalizes it.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Number of subscribers, if Reddit reports it.
    pub fn subscribers(&self) -> Option<u64> {
        self.subscribers
    }

    /// True if the subreddit is quarantined.
    pub fn is_quarantined(&self) -> bool {
        self.quarantine
    }
}

/// A submission in a subreddit.
///
/// Posts are mostly used as handles for fetching their comments.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Post {
    id: String,

    #[serde(deserialize_with = "decoded")]
    title: String,

    #[serde(default)]
    num_comments: u64,
}

impl Post {
    /// Creates a new post handle.
    pub fn new(id: impl Into<String>, title: impl Into<String>, num_comments: u64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            num_comments,
        }
    }

    /// Parses a listing of posts, such as the result of a call to
    /// `/r/<subreddit>/top`.
    ///
    /// Returns the posts and the "after" cursor for the next page, if
    /// there is one.
    pub fn parse_listing(data: &str) -> Result<(Vec<Self>, Option<String>), Error> {
        let listing: Listing<Child<Post>> = serde_json::from_str(data)?;
        let after = listing.data.after;
        let posts = listing.data.children.into_iter().map(|c| c.data).collect();
        Ok((posts, after))
    }

    /// The post's ID, without its `t3_` prefix.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The post's "fullname" (`t3_<id>`), used to refer to it in API calls.
    pub fn fullname(&self) -> String {
        format!("t3_{}", self.id)
    }

    /// The post's title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of comments Reddit reports for the post.
    pub fn num_comments(&self) -> u64 {
        self.num_comments
    }
}

/// A single comment's text and score.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentRecord {
    body: String,
    score: i64,
    author: Option<String>,
}

impl CommentRecord {
    /// Creates a new comment record.
    pub fn new(body: impl Into<String>, score: i64) -> Self {
        Self {
            body: body.into(),
            score,
            author: None,
        }
    }

    /// Attaches an author to the record.
    pub fn with_author(self, author: impl Into<String>) -> Self {
        let author = Some(author.into());
        Self { author, ..self }
    }

    /// The comment text, in Markdown.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The comment's score (upvotes minus downvotes).
    pub fn score(&self) -> i64 {
        self.score
    }

    /// The comment's author, or `None` if the account was deleted.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Consumes the record, returning its body.
    pub fn into_body(self) -> String {
        self.body
    }
}

/// One node of a comment tree as Reddit sends it.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CommentNode {
    /// An actual comment.
    #[serde(rename = "t1")]
    Comment(CommentData),

    /// A placeholder for comments that were not included in the response.
    #[serde(rename = "more")]
    More(MoreData),
}

impl CommentNode {
    /// Parses the result of a call to `/comments/<post>`.
    ///
    /// Reddit returns a two-element array: a listing containing the post
    /// itself, then a listing of the top-level comments. Only the
    /// comments are returned.
    pub fn parse_tree(data: &str) -> Result<Vec<Self>, Error> {
        let listings: Vec<serde_json::Value> = serde_json::from_str(data)?;
        let comments = listings
            .into_iter()
            .nth(1)
            .ok_or(Error::MissingCommentListing)?;
        let listing: Listing<CommentNode> = serde_json::from_value(comments)?;
        Ok(listing.data.children)
    }

    /// Parses the result of a call to `/api/morechildren`.
    pub fn parse_more_children(data: &str) -> Result<Vec<Self>, Error> {
        let response: MoreChildrenResponse = serde_json::from_str(data)?;
        if let Some(error) = response.json.errors.into_iter().next() {
            return Err(Error::Api(error.to_string()));
        }
        Ok(response.json.data.map(|d| d.things).unwrap_or_default())
    }
}

/// The raw data of a comment.
#[derive(Clone, Debug, Deserialize)]
pub struct CommentData {
    id: String,

    #[serde(default, deserialize_with = "decoded")]
    body: String,

    #[serde(default)]
    score: i64,

    #[serde(default)]
    author: Option<String>,

    #[serde(default)]
    replies: Replies,
}

impl CommentData {
    /// The comment's ID, without its `t1_` prefix.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Splits the comment into its record and its direct replies.
    pub fn into_parts(self) -> (CommentRecord, Vec<CommentNode>) {
        let author = self.author.filter(|a| a != DELETED_AUTHOR);
        let record = CommentRecord {
            body: self.body,
            score: self.score,
            author,
        };
        let replies = match self.replies {
            Replies::Listing(listing) => listing.data.children,
            Replies::Empty(_) => vec![],
        };
        (record, replies)
    }
}

/// The raw data of a "load more comments" placeholder.
#[derive(Clone, Debug, Deserialize)]
pub struct MoreData {
    id: String,

    #[serde(default)]
    parent_id: String,

    #[serde(default)]
    children: Vec<String>,
}

impl MoreData {
    /// IDs of the comments hidden behind this placeholder.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// True if this is a "continue this thread" link.
    ///
    /// Reddit sends these when a thread is nested too deeply. They carry
    /// no child IDs; the rest of the thread has to be fetched by
    /// requesting the parent comment directly.
    pub fn is_continuation(&self) -> bool {
        self.children.is_empty() && self.id == "_"
    }

    /// The ID of the parent comment (without its `t1_` prefix), if the
    /// parent is a comment rather than the post itself.
    pub fn parent_comment_id(&self) -> Option<&str> {
        self.parent_id.strip_prefix("t1_")
    }
}

/// A parsing error.
#[derive(Debug, Error)]
pub enum Error {
    /// The response was not valid JSON, or not the JSON that was expected.
    #[error("Could not parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A thing of the wrong kind was returned.
    #[error("Unexpected thing of kind {0}")]
    UnexpectedKind(String),

    /// A comment response did not contain a listing of comments.
    #[error("Response does not contain a comment listing")]
    MissingCommentListing,

    /// Reddit reported an error in the response body.
    #[error("Reddit API error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct Child<T> {
    kind: String,
    data: T,
}

#[derive(Clone, Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Clone, Debug, Deserialize)]
struct ListingData<T> {
    children: Vec<T>,

    #[serde(default)]
    after: Option<String>,
}

/// Replies are either a listing or, when there are none, an empty string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum Replies {
    Listing(Listing<CommentNode>),
    Empty(String),
}

impl Default for Replies {
    fn default() -> Self {
        Replies::Empty(String::new())
    }
}

#[derive(Debug, Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    errors: Vec<serde_json::Value>,

    #[serde(default)]
    data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenData {
    things: Vec<CommentNode>,
}

fn decoded<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(convert_html_entities(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::load_data;
    use pretty_assertions::assert_eq;

    #[test]
    fn it_parses_subreddit_info() {
        let about = About::parse(&load_data("r_rustaceans_about")).unwrap();
        assert_eq!(about.display_name(), "rustaceans");
        assert_eq!(about.subscribers(), Some(4096));
        assert!(!about.is_quarantined());
    }

    #[test]
    fn it_rejects_things_that_are_not_subreddits() {
        let data = r#"{"kind": "t2", "data": {"display_name": "someone"}}"#;
        assert!(matches!(About::parse(data), Err(Error::UnexpectedKind(k)) if k == "t2"));
    }

    #[test]
    fn it_parses_a_page_of_posts() {
        let (posts, after) = Post::parse_listing(&load_data("r_rustaceans_top")).unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["aaa", "bbb"]);
        assert_eq!(after, Some(String::from("t3_bbb")));
    }

    #[test]
    fn it_decodes_entities_in_post_titles() {
        let (posts, _) = Post::parse_listing(&load_data("r_rustaceans_top")).unwrap();
        assert_eq!(posts[1].title(), "Borrowing & lifetimes");
    }

    #[test]
    fn it_returns_no_cursor_on_the_last_page() {
        let (posts, after) = Post::parse_listing(&load_data("r_rustaceans_top_t3_bbb")).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(after, None);
    }

    #[test]
    fn it_returns_a_posts_fullname() {
        let post = Post::new("abc123", "A title", 0);
        assert_eq!(post.fullname(), "t3_abc123");
    }

    #[test]
    fn it_parses_top_level_comments() {
        let nodes = CommentNode::parse_tree(&load_data("comments_aaa")).unwrap();
        assert_eq!(nodes.len(), 4);
        assert!(matches!(nodes[0], CommentNode::Comment(_)));
        assert!(matches!(nodes[3], CommentNode::More(_)));
    }

    #[test]
    fn it_splits_comments_into_records_and_replies() {
        let mut nodes = CommentNode::parse_tree(&load_data("comments_aaa")).unwrap();
        let CommentNode::Comment(first) = nodes.remove(0) else {
            panic!("expected a comment");
        };
        let (record, replies) = first.into_parts();
        assert_eq!(record.body(), "First!");
        assert_eq!(record.score(), 10);
        assert_eq!(record.author(), Some("alice"));
        assert_eq!(replies.len(), 1);
    }

    #[test]
    fn it_drops_deleted_authors() {
        let nodes = CommentNode::parse_tree(&load_data("comments_aaa")).unwrap();
        let CommentNode::Comment(deleted) = nodes[2].clone() else {
            panic!("expected a comment");
        };
        let (record, _) = deleted.into_parts();
        assert_eq!(record.author(), None);
    }

    #[test]
    fn it_recognizes_continue_this_thread_links() {
        let more: MoreData = serde_json::from_str(
            r#"{"id": "_", "parent_id": "t1_c3", "children": [], "count": 0}"#,
        )
        .unwrap();
        assert!(more.is_continuation());
        assert_eq!(more.parent_comment_id(), Some("c3"));
    }

    #[test]
    fn it_does_not_treat_ordinary_placeholders_as_continuations() {
        let more: MoreData = serde_json::from_str(
            r#"{"id": "c5", "parent_id": "t3_aaa", "children": ["c5", "c6"], "count": 2}"#,
        )
        .unwrap();
        assert!(!more.is_continuation());
        assert_eq!(more.parent_comment_id(), None);
        assert_eq!(more.children(), ["c5", "c6"]);
    }

    #[test]
    fn it_parses_more_children() {
        let nodes = CommentNode::parse_more_children(&load_data("api_morechildren_t3_aaa")).unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn it_reports_errors_from_more_children() {
        let data = r#"{"json": {"errors": [["BAD", "bad request", "children"]]}}"#;
        assert!(matches!(
            CommentNode::parse_more_children(data),
            Err(Error::Api(_))
        ));
    }

    #[test]
    fn it_fails_on_a_response_without_comments() {
        let data = r#"[{"kind": "Listing", "data": {"children": []}}]"#;
        assert!(matches!(
            CommentNode::parse_tree(data),
            Err(Error::MissingCommentListing)
        ));
    }
}
