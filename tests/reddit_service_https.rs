// These tests talk to the live Reddit API and need credentials in the
// environment or a .env file, so they only run with `cargo test -- --ignored`.
// What comes back changes from day to day, so they mostly check that the
// types line up and that the requests succeed.

use subscrape::conf::Credentials;
use subscrape::reddit::service::{RedditService, Service};
use subscrape::reddit::{ListingOptions, SortBy, Subreddit, TimeFilter};

async fn service() -> RedditService {
    let credentials =
        Credentials::load(None).expect("Could not load credentials. Is .env set up?");
    RedditService::authenticate(&credentials)
        .await
        .expect("could not authenticate with Reddit")
}

#[tokio::test]
#[ignore]
async fn it_retrieves_subreddit_info() {
    let service = service().await;
    let resp = service.get_resource("/r/rust/about", &[]).await.unwrap();
    assert_ne!(resp, "");
}

#[tokio::test]
#[ignore]
async fn it_lists_posts() {
    let subreddit = Subreddit::new("rust", service().await);
    let opts = ListingOptions::new(SortBy::Top, TimeFilter::Week, 3).unwrap();
    let posts = subreddit.posts(&opts).await.unwrap();
    assert!(posts.len() <= 3);
}

#[tokio::test]
#[ignore]
async fn it_retrieves_comments() {
    let subreddit = Subreddit::new("rust", service().await);
    let opts = ListingOptions::new(SortBy::Top, TimeFilter::Month, 1).unwrap();
    let posts = subreddit.posts(&opts).await.unwrap();
    if let Some(post) = posts.first() {
        subreddit.comments(post).await.unwrap();
    }
}

#[tokio::test]
#[ignore]
async fn it_fails_for_missing_subreddits() {
    let subreddit = Subreddit::new("thissubredditdoesnotexist1234567", service().await);
    assert!(subreddit.about().await.is_err());
}
