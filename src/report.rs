//! One-line text rendering of a snapshot.

use netpulse_sdk::{Origin, ThroughputSnapshot, Timestamp};

/// Render rates, optionally totals, and connectivity on one line.
pub fn summary_line(snapshot: &ThroughputSnapshot, show_totals: bool) -> String {
    let mut line = format!(
        "↓ {:.1} MB/s  ↑ {:.1} MB/s",
        snapshot.download_rate_mbps, snapshot.upload_rate_mbps
    );
    if show_totals {
        line.push_str(&format!(
            "  Σ↓ {:.1} GB  Σ↑ {:.1} GB",
            snapshot.total_received_gb, snapshot.total_sent_gb
        ));
    }
    line.push_str(if snapshot.is_connected {
        "  online"
    } else {
        "  offline"
    });
    line
}

/// Short label describing where a snapshot came from and how old it is.
pub fn origin_label(origin: Origin, snapshot: &ThroughputSnapshot, now: Timestamp) -> String {
    match origin {
        Origin::Published => format!(
            "published {}s ago",
            snapshot.last_updated.age(now).as_secs()
        ),
        Origin::Measured => "measured directly".to_string(),
    }
}
