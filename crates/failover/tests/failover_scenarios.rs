//! End-to-end failover behaviour through the public manager API.

mod common;

use std::time::Duration;

use common::{candidate_names, is_enabled, manager, manager_with, ScriptedClient, Step};
use quotewatch_failover::{
    CancellationToken, FailoverConfig, FetchError, ProbeOutcome, SourceConfig, SourceErrorKind,
};
use rust_decimal_macros::dec;

// =============================================================================
// Request path
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_pinned_timeout_fails_over_to_next_source() {
    let a = ScriptedClient::always("A", Step::Hang);
    let b = ScriptedClient::always("B", Step::Price(dec!(100.0)));
    let manager = manager(
        vec![
            SourceConfig::new("A", 1)
                .pinned()
                .with_timeout(Duration::from_secs(2)),
            SourceConfig::new("B", 2),
        ],
        &[a.clone(), b.clone()],
    );

    let quote = manager.fetch_quote("NIFTY").await.unwrap();
    assert_eq!(quote.price(), dec!(100.0));
    assert_eq!(quote.source(), "B");

    let a_stats = manager.tracker().snapshot("A").unwrap();
    assert_eq!(a_stats.sample_count, 1);
    assert!(a_stats.success_rate < 0.5);
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
}

#[tokio::test]
async fn test_three_failures_disable_source() {
    let a = ScriptedClient::always("A", Step::Network);
    let b = ScriptedClient::always("B", Step::Price(dec!(55)));
    let manager = manager(
        vec![SourceConfig::new("A", 1).pinned(), SourceConfig::new("B", 2)],
        &[a.clone(), b.clone()],
    );

    for _ in 0..3 {
        assert_eq!(manager.fetch_quote("NIFTY").await.unwrap().source(), "B");
    }
    assert!(!is_enabled(&manager, "A"));
    assert_eq!(candidate_names(&manager), vec!["B"]);

    // A costs nothing once disabled
    let quote = manager.fetch_quote("NIFTY").await.unwrap();
    assert_eq!(quote.source(), "B");
    assert_eq!(a.calls(), 3);
}

#[tokio::test]
async fn test_all_disabled_reports_no_enabled_sources() {
    let manager = manager(
        vec![
            SourceConfig::new("A", 1).disabled(),
            SourceConfig::new("B", 2).disabled(),
        ],
        &[
            ScriptedClient::always("A", Step::Price(dec!(1))),
            ScriptedClient::always("B", Step::Price(dec!(1))),
        ],
    );

    let err = manager.fetch_quote("NIFTY").await.unwrap_err();
    assert!(matches!(err, FetchError::AllSourcesFailed { .. }));
    assert!(err.attempts().is_empty());
    assert_eq!(
        err.to_string(),
        "All sources failed for NIFTY: no enabled sources"
    );
}

#[tokio::test]
async fn test_all_attempted_and_failed_is_distinguishable() {
    let manager = manager(
        vec![SourceConfig::new("A", 1), SourceConfig::new("B", 2)],
        &[
            ScriptedClient::always("A", Step::Network),
            ScriptedClient::always("B", Step::Protocol),
        ],
    );

    let err = manager.fetch_quote("BANKNIFTY").await.unwrap_err();
    assert_eq!(err.code(), "ALL_SOURCES_FAILED");
    assert_eq!(err.symbol(), "BANKNIFTY");
    assert_eq!(err.attempts().len(), 2);

    let kinds: Vec<_> = err.attempts().iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![SourceErrorKind::Network, SourceErrorKind::Protocol]);
    assert!(err
        .to_string()
        .starts_with("All sources failed for BANKNIFTY: all 2 attempted sources failed"));
}

#[tokio::test]
async fn test_no_quote_is_ever_fabricated() {
    let clients = [
        ScriptedClient::always("A", Step::Network),
        ScriptedClient::always("B", Step::Price(dec!(0))),
        ScriptedClient::always("C", Step::Protocol),
    ];
    let manager = manager(
        vec![
            SourceConfig::new("A", 1),
            SourceConfig::new("B", 2),
            SourceConfig::new("C", 3),
        ],
        &clients,
    );

    let err = manager.fetch_quote("NIFTY").await.unwrap_err();
    let mut tried = err.attempts().sources();
    tried.sort_unstable();
    assert_eq!(tried, vec!["A", "B", "C"]);
}

#[tokio::test(start_paused = true)]
async fn test_slow_success_disables_source() {
    let slow = ScriptedClient::always("SLOW", Step::Slow(Duration::from_secs(6), dec!(10)));
    let manager = manager(
        vec![SourceConfig::new("SLOW", 1).with_timeout(Duration::from_secs(8))],
        &[slow],
    );

    // The quote is still genuine and returned
    let quote = manager.fetch_quote("NIFTY").await.unwrap();
    assert_eq!(quote.source(), "SLOW");
    assert!(!is_enabled(&manager, "SLOW"));
}

#[tokio::test]
async fn test_same_symbol_requests_race_independently() {
    let a = ScriptedClient::always("A", Step::Price(dec!(3)));
    let manager = manager(vec![SourceConfig::new("A", 1)], &[a.clone()]);

    let (first, second) = tokio::join!(manager.fetch_quote("NIFTY"), manager.fetch_quote("NIFTY"));
    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(a.calls(), 2);
}

#[tokio::test]
async fn test_bulk_fetch_mixes_success_and_failure() {
    let a = ScriptedClient::always("A", Step::Price(dec!(8)));
    a.then([Step::Price(dec!(9)), Step::Network]);
    let manager = manager(vec![SourceConfig::new("A", 1)], &[a]);

    let results = manager.fetch_quotes(&["NIFTY", "SENSEX", "BANKNIFTY"]).await;
    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    for (result, symbol) in results.iter().zip(["NIFTY", "SENSEX", "BANKNIFTY"]) {
        match result {
            Ok(quote) => assert_eq!(quote.symbol(), symbol),
            Err(err) => assert_eq!(err.symbol(), symbol),
        }
    }
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancellation_stops_candidate_loop() {
    let a = ScriptedClient::always("A", Step::Network);
    let b = ScriptedClient::always("B", Step::Hang);
    let c = ScriptedClient::always("C", Step::Price(dec!(1)));
    let manager = manager(
        vec![
            SourceConfig::new("A", 1).pinned(),
            SourceConfig::new("B", 2).pinned(),
            SourceConfig::new("C", 3),
        ],
        &[a, b, c.clone()],
    );

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        trigger.cancel();
    });

    let err = manager
        .fetch_quote_with_cancel("NIFTY", &token)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "CANCELLED");
    assert_eq!(err.attempts().sources(), vec!["A", "B"]);
    assert_eq!(err.attempts().completed(), 1);
    assert_eq!(c.calls(), 0);

    // B's health is untouched, A's failure still counts
    assert_eq!(manager.tracker().snapshot("B").unwrap().sample_count, 0);
    assert_eq!(manager.tracker().snapshot("A").unwrap().sample_count, 1);
}

// =============================================================================
// Recovery
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_canary_recovers_disabled_source() {
    let c = ScriptedClient::always("C", Step::Slow(Duration::from_millis(200), dec!(22150)));
    let manager = manager(vec![SourceConfig::new("C", 1).disabled()], &[c.clone()]);
    assert!(manager.fetch_quote("NIFTY").await.is_err());

    let reports = manager.run_health_check().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].source, "C");
    assert!(reports[0].recovered());
    assert!(is_enabled(&manager, "C"));

    // Eligible for the very next live request
    assert_eq!(candidate_names(&manager), vec!["C"]);
    assert_eq!(manager.fetch_quote("NIFTY").await.unwrap().source(), "C");
}

#[tokio::test]
async fn test_recovered_source_gets_clean_window() {
    let a = ScriptedClient::always("A", Step::Network);
    let b = ScriptedClient::always("B", Step::Price(dec!(2)));
    let manager = manager(
        vec![SourceConfig::new("A", 1).pinned(), SourceConfig::new("B", 2)],
        &[a.clone(), b],
    );

    for _ in 0..3 {
        manager.fetch_quote("NIFTY").await.unwrap();
    }
    assert!(!is_enabled(&manager, "A"));

    a.set_behavior(Step::Price(dec!(1)));
    assert!(manager.run_health_check().await[0].recovered());

    let stats = manager.tracker().snapshot("A").unwrap();
    assert_eq!(stats.sample_count, 1);
    assert_eq!(stats.consecutive_failures, 0);
    assert_eq!(stats.success_rate, 1.0);
    assert_eq!(manager.fetch_quote("NIFTY").await.unwrap().source(), "A");
}

#[tokio::test]
async fn test_failed_canary_leaves_source_disabled() {
    let a = ScriptedClient::always("A", Step::Network);
    let b = ScriptedClient::always("B", Step::Price(dec!(4)));
    let manager = manager(
        vec![SourceConfig::new("A", 1).disabled(), SourceConfig::new("B", 2)],
        &[a, b],
    );

    let reports = manager.run_health_check().await;
    assert!(matches!(
        &reports[0].outcome,
        ProbeOutcome::StillUnavailable { error } if error.kind() == SourceErrorKind::Network
    ));
    assert!(!is_enabled(&manager, "A"));

    // Probe failures never reach callers
    assert_eq!(manager.fetch_quote("NIFTY").await.unwrap().source(), "B");
}

#[tokio::test]
async fn test_canary_answer_in_foreign_name_does_not_recover() {
    let a = ScriptedClient::always("A", Step::Impersonate("SOMEONE_ELSE", dec!(100)));
    let manager = manager(vec![SourceConfig::new("A", 1).disabled()], &[a]);

    let reports = manager.run_health_check().await;
    assert!(matches!(
        &reports[0].outcome,
        ProbeOutcome::StillUnavailable { error }
            if error.kind() == SourceErrorKind::Protocol && error.source_name() == "A"
    ));
    assert!(!is_enabled(&manager, "A"));
    assert_eq!(manager.tracker().snapshot("A").unwrap().consecutive_failures, 1);
}

#[tokio::test]
async fn test_foreign_quote_never_reaches_caller() {
    let a = ScriptedClient::always("A", Step::Impersonate("SOMEONE_ELSE", dec!(0)));
    let x = ScriptedClient::always("X", Step::Network);
    let manager = manager(
        vec![SourceConfig::new("A", 1).pinned(), SourceConfig::new("X", 2)],
        &[a, x],
    );

    let err = manager.fetch_quote("NIFTY").await.unwrap_err();
    assert_eq!(err.attempts().sources(), vec!["A", "X"]);
    assert_eq!(manager.tracker().snapshot("A").unwrap().sample_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_canary_does_not_recover() {
    let a = ScriptedClient::always("A", Step::Slow(Duration::from_secs(6), dec!(1)));
    let manager = manager(
        vec![SourceConfig::new("A", 1)
            .disabled()
            .with_timeout(Duration::from_secs(10))],
        &[a],
    );

    let reports = manager.run_health_check().await;
    assert!(matches!(reports[0].outcome, ProbeOutcome::TooSlow { .. }));
    assert!(!is_enabled(&manager, "A"));
}

#[tokio::test]
async fn test_health_check_skips_enabled_sources() {
    let a = ScriptedClient::always("A", Step::Price(dec!(1)));
    let manager = manager(vec![SourceConfig::new("A", 1)], &[a.clone()]);

    assert!(manager.run_health_check().await.is_empty());
    assert_eq!(a.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_background_monitor_runs_on_interval() {
    let a = ScriptedClient::always("A", Step::Price(dec!(1)));
    let config = FailoverConfig {
        health_check_interval_minutes: 1,
        ..FailoverConfig::with_sources(vec![SourceConfig::new("A", 1).disabled()])
    };
    let manager = manager_with(config, &[a.clone()]);

    let shutdown = CancellationToken::new();
    let handle = manager.start_health_monitor(shutdown.clone());

    // Nothing happens before the first interval elapses
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(a.calls(), 0);
    assert!(!is_enabled(&manager, "A"));

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(a.calls(), 1);
    assert!(is_enabled(&manager, "A"));

    shutdown.cancel();
    handle.await.unwrap();
}

// =============================================================================
// Operator controls
// =============================================================================

#[tokio::test]
async fn test_reset_all_restores_every_source() {
    let a = ScriptedClient::always("A", Step::Network);
    let manager = manager(
        vec![SourceConfig::new("A", 1), SourceConfig::new("B", 2).disabled()],
        &[a, ScriptedClient::always("B", Step::Price(dec!(1)))],
    );

    for _ in 0..3 {
        let _ = manager.fetch_quote("NIFTY").await;
    }
    assert!(candidate_names(&manager).is_empty());

    manager.reset_all();
    assert_eq!(candidate_names(&manager), vec!["A", "B"]);
    assert_eq!(manager.tracker().snapshot("A").unwrap().sample_count, 0);
}

#[tokio::test]
async fn test_source_status_report() {
    let manager = manager(
        vec![
            SourceConfig::new("UPSTOX_PRIMARY", 1).pinned(),
            SourceConfig::new("YAHOO_FINANCE", 3),
            SourceConfig::new("FINNHUB", 6).disabled(),
        ],
        &[
            ScriptedClient::always("UPSTOX_PRIMARY", Step::Price(dec!(22150.35))),
            ScriptedClient::always("YAHOO_FINANCE", Step::Price(dec!(22150.40))),
            ScriptedClient::always("FINNHUB", Step::Price(dec!(22150.00))),
        ],
    );

    manager.fetch_quote("NIFTY").await.unwrap();

    let status = manager.source_status();
    let names: Vec<_> = status.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["UPSTOX_PRIMARY", "YAHOO_FINANCE", "FINNHUB"]);

    let primary = &status[0];
    assert!(primary.enabled && primary.pinned);
    assert_eq!(primary.sample_count, 1);
    assert_eq!(primary.success_rate, 1.0);
    assert!(primary.last_checked.is_some());
    assert!(primary.performance_score > 90.0);

    let json = serde_json::to_value(&status[2]).unwrap();
    assert_eq!(json["name"], "FINNHUB");
    assert_eq!(json["enabled"], false);
    assert_eq!(json["successRate"], 0.5);
    assert!(json["avgResponseTimeMs"].is_null());
}
