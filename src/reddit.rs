// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Reddit API clients and services for communicating with Reddit over HTTP.

pub mod auth;
pub mod client;
pub mod listing;
pub mod service;
pub mod thing;

pub use client::Subreddit;
pub use listing::{ListingOptions, SortBy, TimeFilter};
pub use thing::{CommentRecord, Post};
