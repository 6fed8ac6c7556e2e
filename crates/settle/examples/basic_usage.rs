//! Basic usage example for settle
//!
//! Builds a few lazy sequences, then settles a batch of delayed tasks in input
//! order, in completion order, and as an all-or-nothing aggregate. Finally it
//! races a slow executor against a timeout.
//!
//! Run with `RUST_LOG=settle=trace` to see the settlement events.

use std::time::Duration;

use settle::{
    after_settled, all_settled, all_settled_iterable, delay_reject, delay_resolve, drain,
    sequence, timed_or_resolve, Resolver, Settlement,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Basic Settle Usage Example ===\n");

    let word = "settle";
    let reversed: String = sequence::reverse(word).cursor().collect();
    let tail: String = sequence::skip(word, 3).cursor().collect();
    let twice: String = sequence::reiterable(word, 2).cursor().collect();
    println!("reverse({word:?})       -> {reversed:?}");
    println!("skip({word:?}, 3)       -> {tail:?}");
    println!("reiterable({word:?}, 2) -> {twice:?}");

    let mut cursor = sequence::default(vec![1, 2]).cursor();
    while let Some(item) = cursor.pull() {
        println!("pulled {item}, exhausted = {:?}", cursor.exhausted());
    }
    println!("after last pull, exhausted = {:?}", cursor.exhausted());

    let batch = || {
        [
            delay_resolve("fast", Duration::from_millis(100)),
            delay_reject("failed", Duration::from_millis(50)),
            delay_resolve("slow", Duration::from_millis(150)),
        ]
    };

    println!("\nInput order:");
    for settlement in all_settled(batch()).await {
        match settlement {
            Settlement::Fulfilled { value } => println!("  fulfilled -> {value}"),
            Settlement::Rejected { reason } => println!("  rejected  -> {reason}"),
        }
    }

    println!("\nCompletion order:");
    for settled in drain(all_settled_iterable(batch())).await {
        println!("  #{} {}", settled.index, describe(&settled.settlement));
    }

    match after_settled(batch()).await {
        Ok(values) => println!("\nAll fulfilled: {values:?}"),
        Err(error) => println!("\nAggregate failure ({error}): {:?}", error.reasons()),
    }

    let outcome = timed_or_resolve(
        |resolver: Resolver<&'static str, &'static str>| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                resolver.resolve("executor");
            });
        },
        Duration::from_millis(50),
        "timeout fallback",
    )
    .await;
    println!("\nTimed race: {outcome:?}");

    println!("\n=== Example completed ===");
    Ok(())
}

fn describe(settlement: &Settlement<&str, &str>) -> String {
    match settlement {
        Settlement::Fulfilled { value } => format!("{} {value}", settlement.state()),
        Settlement::Rejected { reason } => format!("{} {reason}", settlement.state()),
    }
}
