//! Board Overview - Entry Point
//!
//! Loads a seed document, replays it through the board views and prints the
//! project overview.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    board_overview::run().await
}
