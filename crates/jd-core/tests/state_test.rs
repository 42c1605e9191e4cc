use jd_core::analytics::{AnalyticsSnapshot, Trend, TrendSettings, WeeklyBucket};
use jd_core::facets::{BoardFilter, TicketBoard};
use jd_core::history::TimeWindow;
use jd_core::state::{AppState, Connectivity};
use serde_json::json;

fn board(tickets: &[&str]) -> TicketBoard {
    let mut board = TicketBoard::new();
    board.insert(
        "À faire".to_string(),
        tickets.iter().map(|t| t.to_string()).collect(),
    );
    board
}

#[test]
fn board_apply_replaces_and_recomputes_facets() {
    let mut state = AppState::default();
    assert!(state.board.begin_refresh(&BoardFilter::default()));
    assert!(state.board.is_loading());

    state
        .board
        .apply::<String>(Ok(board(&["P-1: Fix [Alice] [Bug] [High]"])));
    assert!(!state.board.is_loading());
    assert!(state.board.facets().assignees.contains("Alice"));

    state.board.begin_refresh(&BoardFilter::default());
    state
        .board
        .apply::<String>(Ok(board(&["P-2: Other [Bob] [Task]"])));
    assert!(!state.board.facets().assignees.contains("Alice"));
    assert!(state.board.facets().assignees.contains("Bob"));
}

#[test]
fn board_failure_keeps_last_good_data() {
    let mut state = AppState::default();
    state.board.begin_refresh(&BoardFilter::default());
    state
        .board
        .apply::<String>(Ok(board(&["P-1: Fix [Alice] [Bug] [High]"])));

    state.board.begin_refresh(&BoardFilter::default());
    state.board.apply(Err("HTTP 502"));
    assert_eq!(state.board.error(), Some("HTTP 502"));
    assert_eq!(state.board.board().len(), 1);
    assert!(state.board.facets().assignees.contains("Alice"));

    state.board.dismiss_error();
    assert_eq!(state.board.error(), None);
}

#[test]
fn slices_refresh_independently() {
    let mut state = AppState::default();
    assert!(state.board.begin_refresh(&BoardFilter::default()));
    assert!(state.analytics.begin_refresh(TimeWindow::Week));
    assert!(!state.analytics.begin_refresh(TimeWindow::Week));
    assert_eq!(state.analytics.window(), TimeWindow::Week);

    state.analytics.apply(Err("timeout"));
    assert!(!state.analytics.is_loading());
    assert!(state.board.is_loading());
    assert_eq!(state.board.error(), None);
    assert_eq!(state.analytics.error(), Some("timeout"));
}

#[test]
fn last_applied_response_wins() {
    let mut state = AppState::default();
    state.board.begin_refresh(&BoardFilter::default());
    state.board.apply::<String>(Ok(board(&["P-2: Newer [Bob] [Task]"])));
    // An older response resolving later still overwrites.
    state.board.apply::<String>(Ok(board(&["P-1: Older [Alice] [Bug]"])));
    assert!(state.board.facets().assignees.contains("Alice"));
}

#[test]
fn filter_change_during_pending_refresh_is_sent_and_applied() {
    let mut state = AppState::default();
    let bugs = BoardFilter {
        issue_type: "Bug".into(),
        ..BoardFilter::default()
    };
    assert!(state.board.begin_refresh(&BoardFilter::default()));
    assert!(state.board.begin_refresh(&bugs));

    // The unfiltered response resolves first, the Bug-only one last.
    state.board.apply::<String>(Ok(board(&[
        "P-1: Fix [Alice] [Bug] [High]",
        "P-2: Docs [Bob] [Task]",
    ])));
    assert!(state.board.is_loading());
    state.board.apply::<String>(Ok(board(&["P-1: Fix [Alice] [Bug] [High]"])));

    assert!(!state.board.is_loading());
    assert!(!state.board.facets().assignees.contains("Bob"));
    assert!(state.board.facets().assignees.contains("Alice"));
}

#[test]
fn window_change_during_pending_analytics_refresh() {
    let mut state = AppState::default();
    assert!(state.analytics.begin_refresh(TimeWindow::Week));
    assert!(state.analytics.begin_refresh(TimeWindow::Month));
    assert_eq!(state.analytics.window(), TimeWindow::Month);

    state.analytics.apply::<String>(Ok(AnalyticsSnapshot::default()));
    assert!(state.analytics.is_loading());
    state.analytics.apply::<String>(Ok(AnalyticsSnapshot {
        total_tickets: 7,
        ..AnalyticsSnapshot::default()
    }));
    assert!(!state.analytics.is_loading());
    assert_eq!(state.analytics.metrics().unwrap().total_tickets, 7);
}

#[test]
fn analytics_apply_uses_trend_settings() {
    let mut state = AppState::new(TrendSettings {
        window: 4,
        threshold_percent: 50.0,
    });
    let snapshot = AnalyticsSnapshot {
        weekly_buckets: [5, 5, 6, 7]
            .iter()
            .enumerate()
            .map(|(i, &count)| WeeklyBucket {
                week: format!("2024-W{:02}", i + 1),
                count,
            })
            .collect(),
        ..AnalyticsSnapshot::default()
    };
    state.analytics.begin_refresh(TimeWindow::All);
    state.analytics.apply::<String>(Ok(snapshot));

    let metrics = state.analytics.metrics().unwrap();
    assert_eq!(metrics.trend, Trend::Stable);
    assert_eq!(metrics.total_tickets, 23);
    assert!(state.analytics.snapshot().is_some());
}

#[test]
fn degraded_connectivity_disables_creation_only() {
    let mut state = AppState::default();
    assert!(state.connectivity.can_create_tickets());

    state.set_connectivity(Connectivity::from_health(&json!({"jira_connection": "disconnected"})));
    assert!(!state.connectivity.can_create_tickets());

    state.board.begin_refresh(&BoardFilter::default());
    state.board.apply::<String>(Ok(board(&["P-1: Fix [Alice] [Bug] [High]"])));
    assert_eq!(state.board.board().len(), 1);

    state.set_connectivity(Connectivity::from_health(&json!({"jira_connection": "connected"})));
    assert_eq!(state.connectivity, Connectivity::Connected);
}

#[test]
fn selection_is_tracked() {
    let mut state = AppState::default();
    state.select("P-1");
    assert_eq!(state.selection(), Some("P-1"));
    state.clear_selection();
    assert_eq!(state.selection(), None);
}
