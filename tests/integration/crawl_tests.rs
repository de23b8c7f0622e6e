//! Integration tests for the export crawl
//!
//! These tests drive the export session against an in-memory Slack workspace
//! and check the archive left on disk across repeated and interrupted runs.

mod support;

use serde_json::{json, Value};
use slack_archiver::client::{fetch_all, ApiCaller, ApiRequest, RateLimiter, RetryPolicy};
use slack_archiver::config::OutputConfig;
use slack_archiver::crawler::{run_export, Channel, ExportOptions};
use slack_archiver::state::CheckpointState;
use slack_archiver::store::{Format, ObjectName, ObjectStore};
use std::fs;
use std::time::Duration;
use support::{
    create_test_session, files_page, history_page, no_files, ok, FakeSlack,
};
use tempfile::TempDir;

fn channel(id: &str, name: Option<&str>) -> Channel {
    let mut raw = json!({"id": id});
    if let Some(name) = name {
        raw["name"] = json!(name);
    }
    serde_json::from_value(raw).unwrap()
}

fn scope(path: &str) -> ObjectName {
    ObjectName::from_segments(path.split('/')).unwrap()
}

/// `general` (C1): two history pages, one thread with replies, one shared file
fn mock_general(api: &FakeSlack) {
    api.respond(
        "conversations.history",
        &[("channel", "C1")],
        history_page(
            json!([
                {"ts": "2.0", "text": "latest"},
                {"ts": "1.0", "thread_ts": "1.0", "reply_count": 1, "text": "question"}
            ]),
            "c2",
        ),
    );
    api.respond(
        "conversations.history",
        &[("channel", "C1"), ("cursor", "c2")],
        history_page(json!([{"ts": "0.5", "text": "first"}]), ""),
    );
    api.respond(
        "conversations.replies",
        &[("channel", "C1"), ("ts", "1.0")],
        history_page(
            json!([
                {"ts": "1.0", "thread_ts": "1.0", "reply_count": 1},
                {"ts": "1.1", "thread_ts": "1.0", "text": "answer"}
            ]),
            "",
        ),
    );
    api.respond(
        "files.list",
        &[("channel", "C1")],
        files_page(
            json!([{
                "id": "F1",
                "name": "notes.txt",
                "url_private": "https://files.example/F1/notes.txt"
            }]),
            1,
            1,
        ),
    );
    api.serve_file("https://files.example/F1/notes.txt", b"meeting notes");
}

fn read_lines(store: &ObjectStore, name: &ObjectName) -> Vec<Value> {
    store.load_lines(name).unwrap().unwrap_or_default()
}

#[tokio::test]
async fn test_conversation_export_writes_history_threads_and_files() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    mock_general(&api);
    let mut session = create_test_session(api.clone(), dir.path());

    let scope = scope("conversations/channels/general");
    let outcome = session
        .export_conversation(&channel("C1", Some("general")), &scope)
        .await
        .unwrap();

    assert_eq!(outcome.history, CheckpointState::NotStarted);
    assert_eq!(outcome.files, CheckpointState::NotStarted);

    let store = session.store();
    let history = read_lines(store, &scope.child("C1").unwrap());
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["messages"][0]["text"], "first");

    let replies = read_lines(store, &scope.child("reply_1.0").unwrap());
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["messages"][1]["text"], "answer");

    let files_scope = scope.child("files").unwrap();
    assert_eq!(read_lines(store, &files_scope.child("C1").unwrap()).len(), 1);
    let saved = store.path_of(&files_scope.child("(F1) notes.txt").unwrap(), Format::Raw);
    assert_eq!(fs::read(saved).unwrap(), b"meeting notes");

    assert_eq!(CheckpointState::detect(store, &scope), CheckpointState::Done);
    assert_eq!(CheckpointState::detect(store, &files_scope), CheckpointState::Done);
    assert_eq!(session.stats().threads_expanded, 1);
    assert_eq!(session.stats().files_downloaded, 1);
}

#[tokio::test]
async fn test_rerun_of_finished_conversation_makes_no_calls() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    mock_general(&api);
    let scope = scope("conversations/channels/general");
    let general = channel("C1", Some("general"));

    let mut first = create_test_session(api.clone(), dir.path());
    first.export_conversation(&general, &scope).await.unwrap();
    let calls_after_first = api.call_count();
    let downloads_after_first = api.download_count();
    let history_before = read_lines(first.store(), &scope.child("C1").unwrap());

    let mut second = create_test_session(api.clone(), dir.path());
    let outcome = second.export_conversation(&general, &scope).await.unwrap();

    assert_eq!(outcome.history, CheckpointState::Done);
    assert_eq!(outcome.files, CheckpointState::Done);
    assert_eq!(api.call_count(), calls_after_first);
    assert_eq!(api.download_count(), downloads_after_first);
    assert_eq!(second.stats().checkpoints_skipped, 2);
    assert_eq!(
        read_lines(second.store(), &scope.child("C1").unwrap()),
        history_before
    );
}

#[tokio::test]
async fn test_partial_checkpoint_is_discarded_and_recrawled() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    mock_general(&api);
    let mut session = create_test_session(api.clone(), dir.path());
    let scope = scope("conversations/channels/general");

    // An interrupted run left a stale page and a stale reply file behind
    let stale_dir = session.store().dir_of(&scope);
    fs::create_dir_all(&stale_dir).unwrap();
    fs::write(stale_dir.join("C1.txt"), "{\"stale\":true}\n").unwrap();
    fs::write(stale_dir.join("reply_9.9.txt"), "{\"stale\":true}\n").unwrap();
    assert_eq!(
        CheckpointState::detect(session.store(), &scope),
        CheckpointState::Partial
    );

    let outcome = session
        .export_conversation(&channel("C1", Some("general")), &scope)
        .await
        .unwrap();

    assert_eq!(outcome.history, CheckpointState::Partial);
    let history = read_lines(session.store(), &scope.child("C1").unwrap());
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|page| page.get("stale").is_none()));
    assert!(!stale_dir.join("reply_9.9.txt").exists());
    assert_eq!(session.stats().checkpoints_restarted, 1);
    assert_eq!(
        CheckpointState::detect(session.store(), &scope),
        CheckpointState::Done
    );
}

#[tokio::test]
async fn test_done_history_with_interrupted_files_only_recrawls_files() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    mock_general(&api);
    let mut session = create_test_session(api.clone(), dir.path());
    let scope = scope("conversations/channels/general");
    let files_scope = scope.child("files").unwrap();

    session.store().write_marker(&scope).unwrap();
    fs::create_dir_all(session.store().dir_of(&files_scope)).unwrap();

    let outcome = session
        .export_conversation(&channel("C1", Some("general")), &scope)
        .await
        .unwrap();

    assert_eq!(outcome.history, CheckpointState::Done);
    assert_eq!(outcome.files, CheckpointState::Partial);
    assert!(api.calls_to("conversations.history").is_empty());
    assert_eq!(api.calls_to("files.list").len(), 1);
    assert_eq!(api.download_count(), 1);
}

#[tokio::test]
async fn test_files_paged_by_number_and_downloaded_once() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    api.respond(
        "conversations.history",
        &[("channel", "C7")],
        history_page(json!([]), ""),
    );

    let file = json!({
        "id": "F9",
        "name": "report.docx",
        "url_private": "https://files.example/F9/report.docx",
        "converted_pdf": "https://files.example/F9/report.pdf"
    });
    api.respond(
        "files.list",
        &[("channel", "C7")],
        files_page(json!([file.clone()]), 1, 2),
    );
    api.respond(
        "files.list",
        &[("channel", "C7"), ("page", "2")],
        files_page(json!([file]), 2, 2),
    );
    api.serve_file("https://files.example/F9/report.docx", b"docx");
    api.serve_file("https://files.example/F9/report.pdf", b"pdf");

    let mut session = create_test_session(api.clone(), dir.path());
    let scope = scope("conversations/channels/reports");
    session
        .export_conversation(&channel("C7", Some("reports")), &scope)
        .await
        .unwrap();

    assert_eq!(api.calls_to("files.list").len(), 2);
    assert_eq!(api.download_count(), 2);
    assert_eq!(session.stats().files_downloaded, 2);
    assert_eq!(session.stats().files_skipped, 2);

    let files_scope = scope.child("files").unwrap();
    let pdf = session.store().path_of(
        &files_scope.child("(F9) report.docx.pdf").unwrap(),
        Format::Raw,
    );
    assert_eq!(fs::read(pdf).unwrap(), b"pdf");
}

#[tokio::test]
async fn test_missing_file_is_recorded_and_checkpoint_completes() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    api.respond(
        "conversations.history",
        &[("channel", "C3")],
        history_page(json!([]), ""),
    );
    api.respond(
        "files.list",
        &[("channel", "C3")],
        files_page(
            json!([{"id": "F3", "name": "gone.png", "url_private": "https://files.example/gone"}]),
            1,
            1,
        ),
    );

    let mut session = create_test_session(api.clone(), dir.path());
    let scope = scope("conversations/channels/lost");
    session
        .export_conversation(&channel("C3", Some("lost")), &scope)
        .await
        .unwrap();

    assert_eq!(session.stats().failed_resources.len(), 1);
    assert!(session.stats().failed_resources[0]
        .resource
        .ends_with("(F3) gone.png"));
    assert_eq!(
        CheckpointState::detect(session.store(), &scope.child("files").unwrap()),
        CheckpointState::Done
    );
}

#[tokio::test]
async fn test_failed_history_leaves_partial_checkpoint() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    api.respond(
        "conversations.history",
        &[("channel", "C5")],
        history_page(json!([{"ts": "5.0"}]), "next"),
    );
    api.respond(
        "conversations.history",
        &[("channel", "C5"), ("cursor", "next")],
        json!({"ok": false, "error": "channel_not_found"}),
    );

    let mut session = create_test_session(api.clone(), dir.path());
    let scope = scope("conversations/channels/broken");
    let result = session
        .export_conversation(&channel("C5", Some("broken")), &scope)
        .await;

    assert!(result.is_err());
    assert_eq!(
        CheckpointState::detect(session.store(), &scope),
        CheckpointState::Partial
    );
}

/// Workspace with a named channel, an empty channel, one the bot cannot read,
/// and two direct messages
fn mock_workspace(api: &FakeSlack) {
    api.respond(
        "conversations.list",
        &[("types", "public_channel,private_channel,mpim,im")],
        ok(json!({
            "channels": [
                {"id": "C1", "name": "general", "num_members": 2},
                {"id": "C2", "name": "empty", "num_members": 0},
                {"id": "C3", "name": "secret", "num_members": 4},
                {"id": "D2", "is_im": true, "user": "U2"},
                {"id": "D1", "is_im": true, "user": "U1"}
            ],
            "response_metadata": {"next_cursor": ""}
        })),
    );
    api.respond(
        "users.list",
        &[],
        ok(json!({
            "members": [
                {"id": "U1", "profile": {"real_name": "Ada Lovelace", "display_name": "ada"}},
                {"id": "U2", "profile": {"display_name": "bob"}}
            ]
        })),
    );
    api.respond(
        "conversations.members",
        &[("channel", "C1")],
        ok(json!({"members": ["U2", "U1"]})),
    );
    api.respond(
        "conversations.members",
        &[("channel", "C3")],
        json!({"ok": false, "error": "not_in_channel"}),
    );
    api.respond(
        "conversations.members",
        &[("channel", "D1")],
        ok(json!({"members": ["U1"]})),
    );
    api.respond(
        "conversations.members",
        &[("channel", "D2")],
        ok(json!({"members": ["U2"]})),
    );
}

#[tokio::test]
async fn test_members_phase_skips_failures_and_resolves_names() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    mock_workspace(&api);
    let mut session = create_test_session(api.clone(), dir.path());

    let members = session.export_members().await.unwrap();

    assert_eq!(members.len(), 3);
    assert_eq!(members["C1"], vec!["U1", "U2"]);
    assert!(!members.contains_key("C3"));
    let member_calls: Vec<String> = api
        .calls_to("conversations.members")
        .iter()
        .filter_map(|r| r.get_param("channel").map(str::to_string))
        .collect();
    assert_eq!(member_calls, vec!["C1", "C3", "D2", "D1"]);
    assert_eq!(session.stats().failed_resources.len(), 1);

    let store = session.store();
    let names = store
        .load_json(&ObjectName::new("convo_members_map_names").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(
        names,
        json!({"C1": ["Ada Lovelace", "U2"], "D1": ["Ada Lovelace"], "D2": ["U2"]})
    );
    for object in ["convo_members_map", "convo_members_map_names"] {
        let path = store.path_of(&ObjectName::new(object).unwrap(), Format::PRETTY_JSON);
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("{\n    \"C1\": ["), "{} is not indented", object);
    }

    let cached = store
        .load_json(&scope("channel_members/C1"))
        .unwrap()
        .unwrap();
    assert_eq!(cached, json!(["U1", "U2"]));
    assert!(store.exists(&scope("channel_members/C1_call"), Format::JSON));
}

#[tokio::test]
async fn test_directory_objects_are_cached_across_sessions() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    mock_workspace(&api);

    let mut first = create_test_session(api.clone(), dir.path());
    first.export_directory().await.unwrap();
    assert_eq!(api.calls_to("conversations.list").len(), 1);
    assert_eq!(api.calls_to("users.list").len(), 1);

    let store = first.store();
    let channel_map = store
        .load_json(&ObjectName::new("channel_map").unwrap())
        .unwrap()
        .unwrap();
    let ids: Vec<&String> = channel_map.as_object().unwrap().keys().collect();
    assert_eq!(ids, vec!["C1", "C2", "C3", "D1", "D2"]);

    let nicknames = store
        .load_json(&ObjectName::new("user_nickname_map").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(nicknames, json!({"U1": "ada", "U2": "bob"}));

    let mut second = create_test_session(api.clone(), dir.path());
    assert_eq!(second.channels().await.unwrap().len(), 5);
    assert_eq!(second.users().await.unwrap().len(), 2);
    assert_eq!(api.calls_to("conversations.list").len(), 1);
    assert_eq!(api.calls_to("users.list").len(), 1);
}

#[tokio::test]
async fn test_private_messages_exported_in_id_order() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    mock_workspace(&api);
    for id in ["D1", "D2"] {
        api.respond(
            "conversations.history",
            &[("channel", id)],
            history_page(json!([{"ts": "1.0", "text": id}]), ""),
        );
        no_files(&api, id);
    }

    let mut session = create_test_session(api.clone(), dir.path());
    session.export_private_messages().await.unwrap();

    let order: Vec<String> = api
        .calls_to("conversations.history")
        .iter()
        .filter_map(|r| r.get_param("channel").map(str::to_string))
        .collect();
    assert_eq!(order, vec!["D1", "D2"]);
    assert_eq!(
        CheckpointState::detect(session.store(), &scope("conversations/private/D2")),
        CheckpointState::Done
    );
}

#[tokio::test]
async fn test_refused_private_conversation_is_recorded_and_export_continues() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    api.respond(
        "conversations.list",
        &[("types", "public_channel,private_channel,mpim,im")],
        ok(json!({
            "channels": [
                {"id": "C1", "name": "general"},
                {"id": "D1", "is_im": true},
                {"id": "G7", "name": "", "is_mpim": true}
            ]
        })),
    );
    api.respond(
        "conversations.history",
        &[("channel", "D1")],
        json!({"ok": false, "error": "not_in_channel"}),
    );
    api.respond(
        "conversations.history",
        &[("channel", "G7")],
        history_page(json!([{"ts": "1.0", "text": "hi all"}]), ""),
    );
    no_files(&api, "G7");

    let mut session = create_test_session(api.clone(), dir.path());
    session.export_private_messages().await.unwrap();

    let order: Vec<String> = api
        .calls_to("conversations.history")
        .iter()
        .filter_map(|r| r.get_param("channel").map(str::to_string))
        .collect();
    assert_eq!(order, vec!["D1", "G7"]);

    let failures = &session.stats().failed_resources;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].resource, "conversations/private/D1");
    assert!(failures[0].reason.contains("not_in_channel"));
    assert_ne!(
        CheckpointState::detect(session.store(), &scope("conversations/private/D1")),
        CheckpointState::Done
    );
    assert_eq!(
        CheckpointState::detect(session.store(), &scope("conversations/private/G7")),
        CheckpointState::Done
    );

    let names: Vec<String> = session
        .channel_name_map()
        .await
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(names, vec!["general"]);
}

fn output_config(dir: &TempDir) -> OutputConfig {
    OutputConfig {
        archive_root: dir.path().join("archives"),
        channels_file: dir.path().join("channels_to_export.json"),
        template_file: dir.path().join("channels_to_export_template.json"),
    }
}

#[tokio::test]
async fn test_channel_phase_without_curated_list_is_skipped() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    mock_workspace(&api);
    let output = output_config(&dir);
    let mut session = create_test_session(api.clone(), &dir.path().join("archive"));

    session.export_channel_messages(&output).await.unwrap();

    assert_eq!(session.stats().skipped_phases.len(), 1);
    assert!(api.calls_to("conversations.history").is_empty());
}

#[tokio::test]
async fn test_curated_channels_exported_and_unknown_names_reported() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    mock_workspace(&api);
    mock_general(&api);
    let output = output_config(&dir);
    fs::write(&output.channels_file, r#"["general", "ghost"]"#).unwrap();

    let mut session = create_test_session(api.clone(), &dir.path().join("archive"));
    session.export_channel_messages(&output).await.unwrap();

    assert_eq!(session.stats().unknown_channels, vec!["ghost"]);
    assert_eq!(
        CheckpointState::detect(session.store(), &scope("conversations/channels/general")),
        CheckpointState::Done
    );
}

#[tokio::test]
async fn test_refused_channel_is_recorded_and_later_channels_still_export() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    api.respond(
        "conversations.list",
        &[("types", "public_channel,private_channel,mpim,im")],
        ok(json!({
            "channels": [
                {"id": "C1", "name": "general"},
                {"id": "C5", "name": "broken"}
            ]
        })),
    );
    api.respond(
        "conversations.history",
        &[("channel", "C5")],
        json!({"ok": false, "error": "not_in_channel"}),
    );
    mock_general(&api);
    let output = output_config(&dir);
    fs::write(&output.channels_file, r#"["broken", "general"]"#).unwrap();

    let mut session = create_test_session(api.clone(), &dir.path().join("archive"));
    session.export_channel_messages(&output).await.unwrap();

    let failures = &session.stats().failed_resources;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].resource, "conversations/channels/broken");
    assert!(session.stats().has_problems());
    assert_ne!(
        CheckpointState::detect(session.store(), &scope("conversations/channels/broken")),
        CheckpointState::Done
    );
    assert_eq!(
        CheckpointState::detect(session.store(), &scope("conversations/channels/general")),
        CheckpointState::Done
    );
}

#[tokio::test]
async fn test_emoji_left_half_written_is_downloaded_again() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    api.respond(
        "emoji.list",
        &[],
        ok(json!({"emoji": {"party": "https://emoji.example/T1/party/abc.gif"}})),
    );
    api.serve_file("https://emoji.example/T1/party/abc.gif", b"GIF89a");

    let leftover = dir.path().join("emojis").join("party.gif.part");
    fs::create_dir_all(leftover.parent().unwrap()).unwrap();
    fs::write(&leftover, b"GI").unwrap();

    let mut session = create_test_session(api.clone(), dir.path());
    session.export_emojis().await.unwrap();

    assert_eq!(api.download_count(), 1);
    assert_eq!(session.stats().files_skipped, 0);
    assert!(!leftover.exists());
    let image = session.store().path_of(&scope("emojis/party.gif"), Format::Raw);
    assert_eq!(fs::read(image).unwrap(), b"GIF89a");
}

#[tokio::test]
async fn test_emoji_export_skips_aliases_and_existing_images() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    api.respond(
        "emoji.list",
        &[],
        ok(json!({
            "emoji": {
                "party": "https://emoji.example/T1/party/abc.gif",
                "partyparrot": "alias:party"
            }
        })),
    );
    api.serve_file("https://emoji.example/T1/party/abc.gif", b"GIF89a");

    let mut session = create_test_session(api.clone(), dir.path());
    session.export_emojis().await.unwrap();
    session.export_emojis().await.unwrap();

    assert_eq!(api.calls_to("emoji.list").len(), 2);
    assert_eq!(api.download_count(), 1);
    assert_eq!(session.stats().files_skipped, 1);

    let store = session.store();
    assert!(store.exists(&scope("emojis/emojis"), Format::PRETTY_JSON));
    let image = store.path_of(&scope("emojis/party.gif"), Format::Raw);
    assert_eq!(fs::read(image).unwrap(), b"GIF89a");
}

#[tokio::test]
async fn test_run_export_writes_template_and_honors_phase_selection() {
    let dir = TempDir::new().unwrap();
    let api = FakeSlack::new();
    mock_workspace(&api);
    api.respond("emoji.list", &[], ok(json!({"emoji": {}})));
    let output = output_config(&dir);

    let mut session = create_test_session(api.clone(), &dir.path().join("archive"));
    run_export(&mut session, &output, ExportOptions::default())
        .await
        .unwrap();

    let template: Value =
        serde_json::from_str(&fs::read_to_string(&output.template_file).unwrap()).unwrap();
    assert_eq!(template, json!(["empty", "general", "secret"]));
    assert!(api.calls_to("conversations.history").is_empty());

    let only_emojis = ExportOptions {
        only_emojis: true,
        ..ExportOptions::default()
    };
    let before = api.call_count();
    run_export(&mut session, &output, only_emojis).await.unwrap();
    assert_eq!(api.call_count(), before + 1);
}

#[tokio::test(start_paused = true)]
async fn test_pagination_waits_when_window_is_full() {
    let api = FakeSlack::new();
    api.respond("users.list", &[], ok(json!({"members": ["U1"], "response_metadata": {"next_cursor": "p2"}})));
    api.respond("users.list", &[("cursor", "p2")], ok(json!({"members": ["U2"], "response_metadata": {"next_cursor": "p3"}})));
    api.respond("users.list", &[("cursor", "p3")], ok(json!({"members": ["U3"]})));

    let mut caller = ApiCaller::new(
        api.clone(),
        RateLimiter::new(
            2,
            Duration::from_secs(55),
            Duration::from_secs(2),
            Duration::from_secs(60),
        ),
        RetryPolicy::default(),
    );

    let start = tokio::time::Instant::now();
    let result = fetch_all(&mut caller, ApiRequest::new("users.list"), Some("members"))
        .await
        .unwrap();

    assert_eq!(result.items, vec![json!("U1"), json!("U2"), json!("U3")]);
    assert!(start.elapsed() >= Duration::from_secs(55));
    assert_eq!(api.call_count(), 3);
}
