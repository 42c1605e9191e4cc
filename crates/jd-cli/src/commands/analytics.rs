use jd_client::backend::refresh_analytics;
use jd_client::TicketClient;
use jd_core::analytics::{
    insights, AnalyticsSnapshot, DerivedMetrics, Distribution, InsightLevel, TrendSettings,
};
use jd_core::history::TimeWindow;
use jd_core::state::AppState;

/// Run the `analytics` subcommand for one time window.
pub async fn run(
    client: &TicketClient,
    window: TimeWindow,
    settings: TrendSettings,
) -> anyhow::Result<()> {
    let mut state = AppState::new(settings);
    refresh_analytics(client, &mut state, window).await;
    if let Some(err) = state.analytics.error() {
        tracing::error!(error = err, window = %window, "analytics refresh failed");
        anyhow::bail!("Failed to load analytics: {err}");
    }

    match (state.analytics.snapshot(), state.analytics.metrics()) {
        (Some(snapshot), Some(metrics)) => print!("{}", render(window, snapshot, metrics)),
        _ => println!("No analytics available."),
    }
    Ok(())
}

fn marker(level: InsightLevel) -> &'static str {
    match level {
        InsightLevel::Info => "·",
        InsightLevel::Positive => "+",
        InsightLevel::Warning => "!",
    }
}

fn distribution(out: &mut String, title: &str, dist: &Distribution) {
    if dist.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}:\n"));
    for (label, count) in dist.iter() {
        out.push_str(&format!("  {label:<20} {count}\n"));
    }
}

pub fn render(window: TimeWindow, snapshot: &AnalyticsSnapshot, metrics: &DerivedMetrics) -> String {
    let mut out = format!("Analytics ({window})\n");
    out.push_str(&format!("  Total tickets:    {}\n", metrics.total_tickets));
    out.push_str(&format!("  Weekly average:   {:.1}\n", metrics.weekly_average));
    out.push_str(&format!(
        "  Trend:            {} ({:.0}%)\n",
        metrics.trend, metrics.trend_percent
    ));
    out.push_str(&format!("  High priority:    {}\n", metrics.high_priority_count));
    out.push_str(&format!("  Most common type: {}\n", metrics.most_common_type));
    out.push_str(&format!("  Resolution:       {}\n", metrics.resolution));

    out.push_str("\nInsights:\n");
    for insight in insights(metrics) {
        out.push_str(&format!("  {} {}\n", marker(insight.level), insight.message));
    }

    if !snapshot.weekly_buckets.is_empty() {
        out.push_str("\nWeekly tickets:\n");
        for bucket in &snapshot.weekly_buckets {
            out.push_str(&format!("  {:<10} {}\n", bucket.week, bucket.count));
        }
    }
    distribution(&mut out, "By priority", &snapshot.priority_distribution);
    distribution(&mut out, "By type", &snapshot.type_distribution);
    distribution(&mut out, "By assignee", &snapshot.assignment_distribution);
    out
}
