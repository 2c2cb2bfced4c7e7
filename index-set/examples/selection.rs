use std::sync::{Arc, Mutex};

use index_set::{IndexSet, Result};
use tracing::info;

/// Rows of a list view whose selection is tracked by an `IndexSet`.
const ROWS: [&str; 12] = [
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
    "kilo", "lima",
];

fn main() -> Result<()> {
    // Run with RUST_LOG=index_set=trace to see every mutation.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut selection = IndexSet::with_hint_stride(4)?;

    let redraws = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&redraws);
    let id = selection.observe(move |set: &IndexSet, start: u64, length: u64| {
        if let Ok(mut sink) = sink.lock() {
            sink.push((start, length, set.len()));
        }
    });

    selection.insert_range(2..6)?;
    selection.insert(9)?;
    selection.remove(4)?;
    selection.insert_span(10, 2)?;
    info!(%selection, frontier = selection.frontier(), "selection changed");

    let names: Vec<_> = selection.objects(&ROWS).collect();
    info!(?names, "selected rows");

    for range in selection.ranges() {
        info!(start = range.start, end = range.end, "selected run");
    }

    selection.unobserve(id);
    selection.clear();

    if let Ok(redraws) = redraws.lock() {
        for (start, length, len) in redraws.iter() {
            info!(start, length, len, "redraw");
        }
    }
    info!(dump = selection.dump(), "after clear");

    Ok(())
}
