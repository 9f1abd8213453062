// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! subscrape is a command-line tool for collecting well-received comments
//! from a subreddit. It walks a subreddit's posts, reads every comment on
//! each post, keeps the comments whose score is above a threshold, and
//! writes them to a CSV file with one row per comment.
//!
//! # Examples
//!
//! (In all examples, replace `rust` with the name of an actual subreddit.)
//!
//! Save comments scoring more than 5 from the top posts of the past year:
//!
//! ```bash
//! subscrape rust
//! ```
//!
//! Only keep comments scoring more than 100 from this week's top 50 posts:
//!
//! ```bash
//! subscrape rust --time week --limit 50 --threshold 100
//! ```
//!
//! Scrape the newest posts one at a time, writing to a chosen file and
//! including the post title and author of each comment:
//!
//! ```bash
//! subscrape rust --sort new --sequential --metadata -o rust.csv
//! ```
//!
//! Keep comments exactly as written, including line breaks:
//!
//! ```bash
//! subscrape rust --raw
//! ```
//!
//! Get usage and help for the tool:
//!
//! ```bash
//! subscrape --help
//! ```
//!
//! Press Ctrl-C at any time to stop early. The comments collected up to
//! that point are still written.
//!
//! # Reddit API Setup
//!
//! subscrape talks to the Reddit API as an application, so it needs API
//! credentials:
//!
//! 1. Log in to Reddit and visit the [app preferences] page.
//! 2. Create a new app of type "script".
//! 3. Note the client ID shown under the app's name and the client secret.
//! 4. Store them, along with a descriptive user agent, in a `.env` file in
//!    the directory you run subscrape from:
//!
//!    ```bash
//!    client_id=copied client id
//!    client_secret=copied client secret
//!    user_agent=subscrape by u/your_username
//!    ```
//!
//!    Variables already set in the environment take precedence, and a
//!    different file can be given with `--env-file`. See [`conf`] for
//!    details.
//!
//! Reddit's [API terms] apply to your use of the data you download.
//!
//! # License
//!
//! subscrape is licensed under the terms of the [Apache License 2.0]. Please
//! see the LICENSE file accompanying this source code or visit the previous
//! link for more information on licensing.
//!
//! [Apache License 2.0]: https://www.apache.org/licenses/LICENSE-2.0
//! [API terms]: https://redditinc.com/policies/data-api-terms
//! [app preferences]: https://www.reddit.com/prefs/apps

pub mod cli;
pub mod conf;
pub mod http;
pub mod output;
pub mod reddit;
pub mod scrape;
pub mod text;

#[cfg(test)]
mod test_utils;
