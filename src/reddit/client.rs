// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Clients for reading data from the Reddit API.

use crate::http::{self, HTTPError};
use crate::reddit::listing::{ListingOptions, SortBy};
use crate::reddit::service::{Param, Service};
use crate::reddit::thing::{self, About, CommentNode, CommentRecord, MoreData, Post};
use itertools::Itertools;
use log::{debug, trace};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// Most items Reddit returns in a single page of a listing.
const PAGE_SIZE: u32 = 100;

/// Most comment IDs that may be expanded in a single `morechildren` call.
const MORE_CHILDREN_BATCH: usize = 100;

/// Most comments requested when fetching a post's comment tree.
const COMMENT_LIMIT: u32 = 500;

/// Represents a subreddit.
#[derive(Debug)]
pub struct Subreddit<S: Service> {
    name: String,
    service: S,
}

impl<S: Service> Subreddit<S> {
    /// Creates a new client for the subreddit called `name` (without the
    /// leading `r/`), using `service` to talk to Reddit.
    pub fn new(name: impl Into<String>, service: S) -> Self {
        let name = name.into();
        let name = name
            .strip_prefix("r/")
            .map(String::from)
            .unwrap_or(name);
        Self { name, service }
    }

    /// The subreddit's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Retrieves information about the subreddit.
    ///
    /// Returns [`Error::NotFound`] if the subreddit does not exist, which
    /// makes this a cheap way to check a name before scraping it.
    pub async fn about(&self) -> Result<About, Error> {
        let path = format!("/r/{}/about", self.name);
        let data = self
            .service
            .get_resource(&path, &[])
            .await
            .map_err(|err| Error::from_http(err, format!("r/{}", self.name)))?;
        Ok(About::parse(&data)?)
    }

    /// Lists posts in the subreddit.
    ///
    /// Pages through the listing until `opts.limit()` posts have been
    /// collected or Reddit runs out of posts.
    pub async fn posts(&self, opts: &ListingOptions) -> Result<Vec<Post>, Error> {
        let path = format!("/r/{}/{}", self.name, opts.sort_by());
        let limit = opts.limit() as usize;
        let mut posts: Vec<Post> = Vec::new();
        let mut after: Option<String> = None;

        while posts.len() < limit {
            let page_size = PAGE_SIZE.min((limit - posts.len()) as u32);
            let mut params: Vec<Param<'_>> = vec![("limit", page_size.to_string())];
            if opts.sort_by() == SortBy::Top {
                params.push(("t", opts.time_filter().to_string()));
            }
            if let Some(cursor) = &after {
                params.push(("after", cursor.clone()));
            }

            let data = self
                .service
                .get_resource(&path, &params)
                .await
                .map_err(|err| Error::from_http(err, format!("r/{}", self.name)))?;
            let (page, next) = Post::parse_listing(&data)?;
            debug!("Retrieved {} posts from {path}", page.len());

            if page.is_empty() {
                break;
            }
            let remaining = limit - posts.len();
            posts.extend(page.into_iter().take(remaining));

            match next {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        Ok(posts)
    }

    /// Retrieves every comment on `post`.
    ///
    /// The comment tree is flattened breadth-first: top-level comments in
    /// the order Reddit returns them, then their replies, and so on.
    /// Placeholders for comments Reddit did not include are expanded as
    /// they are reached.
    pub async fn comments(&self, post: &Post) -> Result<Vec<CommentRecord>, Error> {
        let path = format!("/comments/{}", post.id());
        let params = [("limit", COMMENT_LIMIT.to_string())];
        let data = self
            .service
            .get_resource(&path, &params)
            .await
            .map_err(|err| Error::from_http(err, format!("post {}", post.id())))?;

        let mut queue: VecDeque<CommentNode> = CommentNode::parse_tree(&data)?.into();
        let mut seen: HashSet<String> = HashSet::new();
        let mut records = Vec::new();

        while let Some(node) = queue.pop_front() {
            match node {
                CommentNode::Comment(comment) => {
                    if !seen.insert(comment.id().to_string()) {
                        continue;
                    }
                    let (record, replies) = comment.into_parts();
                    records.push(record);
                    queue.extend(replies);
                }
                CommentNode::More(more) => {
                    let expanded = self.expand(post, &more, &seen).await?;
                    trace!("Expanded {} more comments on post {}", expanded.len(), post.id());
                    queue.extend(expanded);
                }
            }
        }

        debug!("Retrieved {} comments from post {}", records.len(), post.id());
        Ok(records)
    }

    async fn expand(
        &self,
        post: &Post,
        more: &MoreData,
        seen: &HashSet<String>,
    ) -> Result<Vec<CommentNode>, Error> {
        if more.is_continuation() {
            match more.parent_comment_id() {
                Some(parent) => self.continue_thread(post, parent).await,
                None => Ok(vec![]),
            }
        } else {
            self.more_children(post, more, seen).await
        }
    }

    async fn more_children(
        &self,
        post: &Post,
        more: &MoreData,
        seen: &HashSet<String>,
    ) -> Result<Vec<CommentNode>, Error> {
        let unseen: Vec<&String> = more
            .children()
            .iter()
            .filter(|id| !seen.contains(*id))
            .collect();
        let mut nodes = Vec::new();

        for batch in unseen.chunks(MORE_CHILDREN_BATCH) {
            let params = [
                ("api_type", String::from("json")),
                ("link_id", post.fullname()),
                ("children", batch.iter().join(",")),
            ];
            let data = self
                .service
                .get_resource("/api/morechildren", &params)
                .await
                .map_err(|err| Error::from_http(err, format!("post {}", post.id())))?;
            nodes.extend(CommentNode::parse_more_children(&data)?);
        }

        Ok(nodes)
    }

    /// Fetches the replies to a comment that sits too deep in a thread
    /// for Reddit to include them in the original response.
    async fn continue_thread(&self, post: &Post, parent: &str) -> Result<Vec<CommentNode>, Error> {
        let path = format!("/comments/{}", post.id());
        let params = [
            ("comment", parent.to_string()),
            ("limit", COMMENT_LIMIT.to_string()),
        ];
        let data = self
            .service
            .get_resource(&path, &params)
            .await
            .map_err(|err| Error::from_http(err, format!("comment {parent}")))?;

        // The response is rooted at the parent comment, which has
        // already been recorded; only its replies are new.
        let replies = CommentNode::parse_tree(&data)?
            .into_iter()
            .filter_map(|node| match node {
                CommentNode::Comment(comment) if comment.id() == parent => {
                    Some(comment.into_parts().1)
                }
                _ => None,
            })
            .flatten()
            .collect();
        Ok(replies)
    }
}

/// A client error.
#[derive(Debug, Error)]
pub enum Error {
    /// The subreddit, post, or comment does not exist.
    #[error("Not found: {0} does not exist")]
    NotFound(String),

    /// An error from the underlying HTTP service.
    #[error("Service error: {0}")]
    Service(#[from] http::HTTPError),

    /// An error parsing data.
    #[error("Parse error: {0}")]
    Parse(#[from] thing::Error),
}

impl Error {
    fn from_http(err: HTTPError, what: String) -> Self {
        if err.is_not_found() {
            Error::NotFound(what)
        } else {
            Error::Service(err)
        }
    }
}

#[cfg(test)]
mod tests {
    mod subreddit {
        use super::super::*;
        use crate::reddit::listing::TimeFilter;
        use crate::test_utils::TestService;

        #[test]
        fn it_strips_a_leading_r_slash() {
            let subreddit = Subreddit::new("r/rustaceans", TestService::default());
            assert_eq!(subreddit.name(), "rustaceans");
        }

        #[tokio::test]
        async fn it_returns_its_info() {
            let about = Subreddit::test().about().await.unwrap();
            assert_eq!(about.display_name(), "rustaceans");
        }

        #[tokio::test]
        async fn it_is_not_found_if_it_does_not_exist() {
            let result = Subreddit::test_none().about().await;
            assert!(matches!(result, Err(Error::NotFound(name)) if name == "r/doesnotexist"));
        }

        #[tokio::test]
        async fn it_pages_through_posts() {
            let opts = ListingOptions::new(SortBy::Top, TimeFilter::Year, 10).unwrap();
            let posts = Subreddit::test().posts(&opts).await.unwrap();
            let ids: Vec<_> = posts.iter().map(|p| p.id()).collect();
            assert_eq!(ids, vec!["aaa", "bbb", "ccc"]);
        }

        #[tokio::test]
        async fn it_stops_paging_at_the_limit() {
            let opts = ListingOptions::new(SortBy::Top, TimeFilter::Year, 2).unwrap();
            let service = TestService::default();
            let subreddit = Subreddit::new("rustaceans", &service);
            let posts = subreddit.posts(&opts).await.unwrap();
            assert_eq!(posts.len(), 2);
            assert_eq!(service.requests(), vec!["/r/rustaceans/top?limit=2&t=year"]);
        }

        #[tokio::test]
        async fn it_truncates_a_page_to_the_limit() {
            let opts = ListingOptions::new(SortBy::Top, TimeFilter::Year, 1).unwrap();
            let posts = Subreddit::test().posts(&opts).await.unwrap();
            assert_eq!(posts.len(), 1);
        }

        #[tokio::test]
        async fn it_only_sends_a_time_filter_for_top_posts() {
            let opts = ListingOptions::new(SortBy::New, TimeFilter::Week, 5).unwrap();
            let service = TestService::default();
            let subreddit = Subreddit::new("rustaceans", &service);
            let posts = subreddit.posts(&opts).await.unwrap();
            assert_eq!(posts.len(), 1);
            assert_eq!(service.requests(), vec!["/r/rustaceans/new?limit=5"]);
        }

        #[tokio::test]
        async fn it_returns_no_posts_for_an_empty_listing() {
            let opts = ListingOptions::new(SortBy::Hot, TimeFilter::Year, 5).unwrap();
            let posts = Subreddit::test().posts(&opts).await.unwrap();
            assert!(posts.is_empty());
        }

        #[tokio::test]
        async fn it_is_not_found_when_listing_a_missing_subreddit() {
            let opts = ListingOptions::default();
            let result = Subreddit::test_none().posts(&opts).await;
            assert!(matches!(result, Err(Error::NotFound(_))));
        }
    }

    mod comments {
        use super::super::*;
        use crate::test_utils::{TestService, do_logging};
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn it_flattens_the_comment_tree_breadth_first() {
            do_logging();
            let post = Post::new("aaa", "Welcome", 7);
            let comments = Subreddit::test().comments(&post).await.unwrap();
            let bodies: Vec<_> = comments.iter().map(|c| c.body()).collect();
            assert_eq!(
                bodies,
                vec![
                    "First!",
                    "deep\n\nthread",
                    "[deleted]",
                    "reply & more",
                    "loaded later",
                    "also loaded later",
                    "continued",
                ]
            );
        }

        #[tokio::test]
        async fn it_keeps_scores_and_authors() {
            let post = Post::new("aaa", "Welcome", 7);
            let comments = Subreddit::test().comments(&post).await.unwrap();
            let scores: Vec<_> = comments.iter().map(|c| c.score()).collect();
            assert_eq!(scores, vec![10, 7, 1, 3, -2, 12, 6]);
            assert_eq!(comments[0].author(), Some("alice"));
            assert_eq!(comments[2].author(), None);
        }

        #[tokio::test]
        async fn it_expands_placeholders_with_a_batched_request() {
            let post = Post::new("aaa", "Welcome", 7);
            let service = TestService::default();
            Subreddit::new("rustaceans", &service)
                .comments(&post)
                .await
                .unwrap();
            assert_eq!(
                service.requests(),
                vec![
                    "/comments/aaa?limit=500",
                    "/api/morechildren?api_type=json&link_id=t3_aaa&children=c5,c6",
                    "/comments/aaa?comment=c3&limit=500",
                ]
            );
        }

        #[tokio::test]
        async fn it_returns_no_comments_for_an_empty_post() {
            let post = Post::new("ccc", "Crickets", 0);
            let comments = Subreddit::test().comments(&post).await.unwrap();
            assert!(comments.is_empty());
        }

        #[tokio::test]
        async fn it_is_not_found_for_a_deleted_post() {
            let post = Post::new("gone", "Deleted", 3);
            let result = Subreddit::test().comments(&post).await;
            assert!(matches!(result, Err(Error::NotFound(what)) if what == "post gone"));
        }
    }
}
