// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Options controlling which posts are listed from a subreddit.

use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Time window applied to "top" listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TimeFilter {
    /// Every post ever made to the subreddit.
    All,

    /// Posts from the last 24 hours.
    Day,

    /// Posts from the last hour.
    Hour,

    /// Posts from the last month.
    Month,

    /// Posts from the last week.
    Week,

    /// Posts from the last year.
    #[default]
    Year,
}

impl TimeFilter {
    /// The value Reddit expects in the `t` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::All => "all",
            TimeFilter::Day => "day",
            TimeFilter::Hour => "hour",
            TimeFilter::Month => "month",
            TimeFilter::Week => "week",
            TimeFilter::Year => "year",
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeFilter {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TimeFilter::All),
            "day" => Ok(TimeFilter::Day),
            "hour" => Ok(TimeFilter::Hour),
            "month" => Ok(TimeFilter::Month),
            "week" => Ok(TimeFilter::Week),
            "year" => Ok(TimeFilter::Year),
            _ => Err(InvalidArgument::new(
                "time filter",
                s,
                "all, day, month, week, year, hour",
            )),
        }
    }
}

/// Order in which posts are listed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    /// Highest-scoring posts within a [time window](TimeFilter).
    #[default]
    Top,

    /// Most recent posts.
    New,

    /// Posts Reddit currently considers popular.
    Hot,
}

impl SortBy {
    /// The listing endpoint for this sort order.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Top => "top",
            SortBy::New => "new",
            SortBy::Hot => "hot",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(SortBy::Top),
            "new" => Ok(SortBy::New),
            "hot" => Ok(SortBy::Hot),
            _ => Err(InvalidArgument::new("sort order", s, "top, new, hot")),
        }
    }
}

/// Which posts to list and how many.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListingOptions {
    sort_by: SortBy,
    time_filter: TimeFilter,
    limit: u32,
}

impl ListingOptions {
    /// Default maximum number of posts to list.
    pub const DEFAULT_LIMIT: u32 = 999;

    /// Creates a new set of listing options.
    ///
    /// Returns an error if `limit` is zero.
    pub fn new(sort_by: SortBy, time_filter: TimeFilter, limit: u32) -> Result<Self, InvalidArgument> {
        if limit == 0 {
            return Err(InvalidArgument::new("limit", "0", "a positive number"));
        }
        Ok(Self {
            sort_by,
            time_filter,
            limit,
        })
    }

    /// The sort order.
    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    /// The time window; only meaningful for [`SortBy::Top`].
    pub fn time_filter(&self) -> TimeFilter {
        self.time_filter
    }

    /// Maximum number of posts to list.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            sort_by: SortBy::default(),
            time_filter: TimeFilter::default(),
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// An argument had a value that is not allowed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Invalid {name} '{value}': expected one of {expected}")]
pub struct InvalidArgument {
    name: &'static str,
    value: String,
    expected: &'static str,
}

impl InvalidArgument {
    fn new(name: &'static str, value: impl Into<String>, expected: &'static str) -> Self {
        let value = value.into();
        Self {
            name,
            value,
            expected,
        }
    }

    /// Name of the offending argument.
    pub fn name(&self) -> &str {
        self.name
    }
}
