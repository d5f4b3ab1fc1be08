use bitematch_core::config::{ApiMode, AppConfig};
use bitematch_core::models::DietaryPreferences;
use bitematch_core::places::{mock_candidates, Coordinates, DiscoveryState};
use bitematch_core::services::DatabaseService;
use bitematch_core::{Candidate, CandidateId, Outcome};

use crate::cli::{CompletionShell, ExportFormat};
use crate::commands::common::{
    find_match, find_swipeable_candidate, format_candidate_lines, format_rating,
    format_relative_time, format_timestamp, list_all_matches, load_discovery_cache,
    normalize_candidate_id, resolve_db_path, save_discovery_cache, truncate, CliContext,
    DiscoveryCache,
};
use crate::commands::completions::render_completions;
use crate::commands::config::merge_profile;
use crate::commands::discover::run_discover;
use crate::commands::export::run_export;
use crate::commands::feedback::{help_center_lines, run_feedback};
use crate::commands::matches::run_unmatch;
use crate::commands::prefs::{apply_changes, format_preferences};
use crate::commands::swipe::{run_decide, run_swipe, simulate_gesture};
use crate::commands::sync::{format_flush_report, status_label};
use crate::config_profiles::CliProfile;
use crate::error::CliError;

fn candidate(id: &str, name: &str) -> Candidate {
    Candidate::new(CandidateId::new(id).unwrap(), name)
}

async fn mock_context() -> CliContext {
    CliContext {
        profile_name: "test".to_string(),
        config: AppConfig {
            api_mode: Some(ApiMode::Mock),
            ..AppConfig::default()
        },
        db: DatabaseService::open_in_memory().await.unwrap(),
    }
}

#[test]
fn normalize_candidate_id_rejects_empty() {
    assert!(matches!(
        normalize_candidate_id(" \n "),
        Err(CliError::EmptyCandidateId)
    ));
    assert_eq!(normalize_candidate_id("  abc  ").unwrap().as_str(), "abc");
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
}

#[test]
fn format_timestamp_returns_utc_label() {
    assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn truncate_adds_ellipsis() {
    assert_eq!(truncate("Sushi Zen", 20), "Sushi Zen");
    assert_eq!(
        truncate("The Longest Restaurant Name In Town", 12),
        "The Longe..."
    );
}

#[test]
fn format_rating_handles_missing_values() {
    let mut place = candidate("1", "Burger Haven");
    assert_eq!(format_rating(&place), "-");
    place.rating = Some(4.5);
    assert_eq!(format_rating(&place), "4.5");
    place.user_ratings_total = Some(120);
    assert_eq!(format_rating(&place), "4.5 (120)");
}

#[test]
fn candidate_lines_include_name_and_address() {
    let lines = format_candidate_lines(&mock_candidates());
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("Burger Haven"));
    assert!(lines[0].contains("123 Burger St"));
}

#[test]
fn gesture_past_threshold_likes() {
    let gesture = simulate_gesture(candidate("1", "Burger Haven"), 150.0, 400.0).unwrap();
    assert_eq!(gesture.decision, Some(Outcome::Liked));
    assert!(gesture.rotation_degrees > 0.0);
    assert!(gesture.like_opacity > 0.0);
    assert!(gesture.nope_opacity.abs() < f64::EPSILON);
}

#[test]
fn gesture_left_past_threshold_dislikes() {
    let gesture = simulate_gesture(candidate("1", "Burger Haven"), -200.0, 400.0).unwrap();
    assert_eq!(gesture.decision, Some(Outcome::Disliked));
    assert!(gesture.rotation_degrees < 0.0);
}

#[test]
fn short_gesture_springs_back() {
    let gesture = simulate_gesture(candidate("1", "Burger Haven"), 50.0, 400.0).unwrap();
    assert_eq!(gesture.decision, None);
}

#[test]
fn gesture_rejects_invalid_width() {
    assert!(simulate_gesture(candidate("1", "Burger Haven"), 50.0, 0.0).is_err());
}

#[test]
fn resolve_db_path_prefers_flag() {
    let explicit = std::path::PathBuf::from("/tmp/bitematch-test.db");
    assert_eq!(resolve_db_path(Some(explicit.clone())).unwrap(), explicit);
}

#[test]
fn completions_mention_binary_name() {
    for shell in [CompletionShell::Bash, CompletionShell::Zsh, CompletionShell::Fish] {
        let script = String::from_utf8(render_completions(shell)).unwrap();
        assert!(script.contains("bitematch"));
        assert!(script.contains("discover"));
    }
}

#[test]
fn merge_profile_prefers_flags_then_env_then_existing() {
    let explicit = CliProfile {
        firebase_api_key: Some("  flag-key ".to_string()),
        ..CliProfile::default()
    };
    let env = AppConfig {
        firebase_api_key: Some("env-key".to_string()),
        firebase_project_id: Some("env-project".to_string()),
        ..AppConfig::default()
    };
    let existing = CliProfile {
        firebase_project_id: Some("old-project".to_string()),
        places_api_key: Some("old-places".to_string()),
        api_mode: Some(ApiMode::Mock),
        ..CliProfile::default()
    };

    let merged = merge_profile(explicit, env, existing);
    assert_eq!(merged.firebase_api_key.as_deref(), Some("flag-key"));
    assert_eq!(merged.firebase_project_id.as_deref(), Some("env-project"));
    assert_eq!(merged.places_api_key.as_deref(), Some("old-places"));
    assert_eq!(merged.api_mode, Some(ApiMode::Mock));
    assert!(merged.missing_fields().is_empty());
}

#[test]
fn prefs_changes_apply_in_order() {
    let mut preferences = DietaryPreferences::default();
    apply_changes(
        &mut preferences,
        &["vegan".to_string(), "gluten-free".to_string()],
        &["nuts".to_string(), "Dairy".to_string()],
        &["dairy".to_string()],
        Some(4),
    )
    .unwrap();

    assert_eq!(preferences.goals.len(), 2);
    assert_eq!(preferences.allergies, vec!["Nuts".to_string()]);
    assert_eq!(preferences.spice_level.value(), 4);

    let lines = format_preferences(&preferences);
    assert!(lines[1].contains("Nuts"));
    assert!(lines[2].contains("Extra Hot"));
}

#[test]
fn prefs_changes_reject_unknown_allergy() {
    let mut preferences = DietaryPreferences::default();
    let result = apply_changes(&mut preferences, &[], &["kryptonite".to_string()], &[], None);
    assert!(result.is_err());
}

#[test]
fn help_center_filters_topics_and_questions() {
    let all = help_center_lines("");
    assert!(all.iter().any(|line| line.contains("App Guide")));
    assert!(all.iter().any(|line| line.contains("Bite Match")));

    let location = help_center_lines("location");
    assert!(location.iter().any(|line| line.contains("change my location")));
    assert!(!location.iter().any(|line| line.contains("Payments")));

    let nothing = help_center_lines("zzz");
    assert_eq!(nothing.len(), 1);
    assert!(nothing[0].contains("How can we help?"));
}

#[test]
fn flush_report_lines_explain_skips() {
    use bitematch_core::sync::{FlushReport, FlushSkip};
    use bitematch_core::SyncState;

    let skipped = FlushReport {
        skipped: Some(FlushSkip::NoUser),
        ..FlushReport::default()
    };
    assert!(format_flush_report(&skipped, SyncState::Offline)[0].contains("Not signed in"));

    let partial = FlushReport {
        attempted: 3,
        synced: 2,
        failed: vec![CandidateId::new("2").unwrap()],
        skipped: None,
    };
    let lines = format_flush_report(&partial, SyncState::Error);
    assert!(lines[0].starts_with("Synced 2 of 3"));
    assert_eq!(lines[1], "  will retry: 2");
}

#[test]
fn sync_status_labels_queued_swipes_as_pending() {
    assert_eq!(status_label(false, 3), "offline");
    assert_eq!(status_label(true, 0), "synced");
    assert_eq!(status_label(true, 2), "pending");
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn discovery_cache_roundtrips_through_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("bitematch.db");
    let cache = DiscoveryCache {
        state: DiscoveryState {
            candidates: mock_candidates(),
            next_page_token: Some("next".to_string()),
        },
        location: Some(Coordinates::new(40.7, -74.0).unwrap()),
    };

    {
        let db = DatabaseService::open_path(&db_path).await.unwrap();
        save_discovery_cache(&db, &cache).await.unwrap();
    }

    let db = DatabaseService::open_path(&db_path).await.unwrap();
    assert_eq!(load_discovery_cache(&db).await.unwrap(), cache);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn corrupt_discovery_cache_loads_empty() {
    let db = DatabaseService::open_in_memory().await.unwrap();
    db.set_setting("discovery_cache", "{not json").await.unwrap();
    assert_eq!(load_discovery_cache(&db).await.unwrap(), DiscoveryCache::default());
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn find_swipeable_candidate_requires_discovery() {
    let db = DatabaseService::open_in_memory().await.unwrap();
    let result = find_swipeable_candidate(&db, "1").await;
    assert!(matches!(result, Err(CliError::CandidateNotFound(id)) if id == "1"));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn swipe_flow_records_match_and_blocks_repeat() {
    let ctx = mock_context().await;
    run_discover(&ctx, None, true, true).await.unwrap();
    assert_eq!(load_discovery_cache(&ctx.db).await.unwrap().state.candidates.len(), 3);

    run_swipe(&ctx, "1", 200.0, 400.0).await.unwrap();
    let saved = find_match(&ctx.db, "1").await.unwrap();
    assert_eq!(saved.candidate.name, "Burger Haven");

    let cache = load_discovery_cache(&ctx.db).await.unwrap();
    assert!(cache.state.candidates.iter().all(|place| place.id.as_str() != "1"));

    let repeat = find_swipeable_candidate(&ctx.db, "1").await;
    assert!(matches!(repeat, Err(CliError::AlreadySwiped(_))));

    // Swiped places do not come back on the next search
    run_discover(&ctx, None, true, true).await.unwrap();
    let cache = load_discovery_cache(&ctx.db).await.unwrap();
    assert_eq!(cache.state.candidates.len(), 2);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn short_swipe_leaves_candidate_in_deck() {
    let ctx = mock_context().await;
    run_discover(&ctx, None, true, true).await.unwrap();

    run_swipe(&ctx, "2", 30.0, 400.0).await.unwrap();
    assert!(ctx.db.get_decision(&CandidateId::new("2").unwrap()).await.unwrap().is_none());
    assert!(find_swipeable_candidate(&ctx.db, "2").await.is_ok());
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn pass_does_not_create_match_and_queues_decision() {
    let ctx = mock_context().await;
    run_discover(&ctx, None, true, true).await.unwrap();

    run_decide(&ctx, "3", Outcome::Disliked).await.unwrap();
    assert!(matches!(
        find_match(&ctx.db, "3").await,
        Err(CliError::MatchNotFound(_))
    ));
    assert_eq!(ctx.db.pending_count().await.unwrap(), 1);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn unmatch_offline_removes_local_match() {
    let ctx = mock_context().await;
    run_discover(&ctx, None, true, true).await.unwrap();
    run_decide(&ctx, "2", Outcome::Liked).await.unwrap();

    run_unmatch(&ctx, "2").await.unwrap();
    assert!(list_all_matches(&ctx.db).await.unwrap().is_empty());
    assert!(matches!(
        run_unmatch(&ctx, "2").await,
        Err(CliError::MatchNotFound(_))
    ));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn export_writes_markdown_into_directory() {
    let ctx = mock_context().await;
    run_discover(&ctx, None, true, true).await.unwrap();
    run_decide(&ctx, "2", Outcome::Liked).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    run_export(&ctx, ExportFormat::Markdown, Some(dir.path()))
        .await
        .unwrap();

    let written = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect::<Vec<_>>();
    assert_eq!(written.len(), 1);
    let name = written[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("bitematch-matches-") && name.ends_with(".md"));
    let contents = std::fs::read_to_string(&written[0]).unwrap();
    assert!(contents.contains("# Sushi Zen"));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn feedback_is_stored_locally() {
    let ctx = mock_context().await;
    run_feedback(
        &ctx,
        5,
        &["ui/design".to_string(), "Swipe Logic".to_string()],
        Some("  Love it  ".to_string()),
    )
    .await
    .unwrap();

    let stored = ctx.db.list_feedback(10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].areas.len(), 2);
    assert_eq!(stored[0].comment.as_deref(), Some("Love it"));

    let bad_area = run_feedback(&ctx, 3, &["teleport".to_string()], None).await;
    assert!(bad_area.is_err());
}
