// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

use clap::Parser;
use subscrape::cli::{self, Config, Runner};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    env_logger::Builder::new()
        .filter_level(config.verbosity().log_level_filter())
        .init();

    match Runner::new(config).run().await {
        Ok(path) => println!("{}", path.display()),
        Err(err) => cli::die(1, &err.to_string()),
    }
}
