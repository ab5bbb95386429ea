
use fixtures::*;
use sfw::api::parser;
use sfw::app::{BuildStatus, View};
use sfw::input::{self, Action, InputContext, ViewMode};
use sfw::tail::{TailEvent, TailStatus};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use pretty_assertions::assert_eq;

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

// ========== Data flow tests ==========

#[test]
fn full_flow_json_to_parse_to_state() {
    // Step 1: JSON as the backend would return it
    let json = r#"[
        {
            "id": 100,
            "origin": "https://git.example.com/nixpkgs-overlay.git",
            "rev": "main",
            "created_at": "2024-06-01T10:00:00Z",
            "status": "succeeded",
            "finished_at": "2024-06-01T10:05:00Z",
            "error_msg": null
        },
        {
            "id": 101,
            "origin": "https://git.example.com/infra.git",
            "rev": "staging",
            "created_at": "2024-06-01T11:00:00Z",
            "status": "building",
            "finished_at": null,
            "error_msg": null
        }
    ]"#;

    // Step 2: Parse
    let builds = parser::parse_builds(json).expect("parse should succeed");
    assert_eq!(builds.len(), 2);

    // Step 3: Feed into state
    let mut state = make_state_with_builds(builds);
    assert_eq!(state.cursor, 0);
    assert_eq!(state.current_build().unwrap().id, 100);

    state.move_cursor_down();
    let current = state.current_build().unwrap();
    assert_eq!(current.id, 101);
    assert_eq!(current.status, BuildStatus::Building);
    assert!(current.status.is_running());
}

#[test]
fn full_flow_detail_with_tail_events() {
    let json = r#"{
        "build": {
            "id": 5,
            "origin": "https://git.example.com/project.git",
            "rev": "main",
            "created_at": "2024-06-01T10:00:00Z",
            "status": "building",
            "finished_at": null,
            "error_msg": null
        },
        "inputs": [
            {"id": 1, "build_id": 5, "path": "release.nix", "outputs": []}
        ]
    }"#;
    let (build, inputs) = parser::parse_build(json).unwrap();

    let mut state = make_state_with_builds(vec![build.clone()]);
    let sub = state.next_subscription();
    state.open_detail(build, inputs, sfw::api::stream::TailStream::detached(sub));
    assert_eq!(state.view, View::Detail);

    // Backlog arrives first as a Lines replacement
    state.apply_tail(
        sub,
        TailEvent::Lines(vec!["unpacking sources".to_string(), "configuring".to_string()]),
    );
    // Then incremental text, split across events
    state.apply_tail(sub, TailEvent::Text("building\npha".to_string()));
    state.apply_tail(sub, TailEvent::Text("se 2\n".to_string()));

    let detail = state.detail.as_ref().unwrap();
    assert_eq!(detail.tail.status(), TailStatus::Streaming);
    assert_eq!(
        detail.tail.contents(),
        "unpacking sources\nconfiguring\nbuilding\nphase 2\n"
    );
}

#[test]
fn stale_subscription_events_do_not_leak_across_builds() {
    let mut state = make_state_with_builds(vec![build_running(1), build_running(2)]);

    let old_sub = open_detail(&mut state, build_running(1));
    state.apply_tail(old_sub, TailEvent::Text("from build one\n".to_string()));

    // Switching builds replaces the subscription
    let new_sub = open_detail(&mut state, build_running(2));
    assert!(!state.apply_tail(old_sub, TailEvent::Text("late event\n".to_string())));
    assert!(!state.tail_disconnected(old_sub));

    let detail = state.detail.as_ref().unwrap();
    assert_eq!(detail.build.id, 2);
    assert_eq!(detail.tail.contents(), "");
    assert_eq!(detail.tail.status(), TailStatus::Loading);

    // The live subscription still works
    assert!(state.apply_tail(new_sub, TailEvent::Text("from build two\n".to_string())));
    assert_eq!(
        state.detail.as_ref().unwrap().tail.contents(),
        "from build two\n"
    );
}

#[test]
fn disconnect_keeps_buffer_contents() {
    let mut state = make_state_with_builds(vec![build_running(1)]);
    let sub = open_detail(&mut state, build_running(1));
    state.apply_tail(sub, TailEvent::Text("line one\nline two\npartial".to_string()));
    assert!(state.tail_disconnected(sub));

    let detail = state.detail.as_ref().unwrap();
    assert_eq!(detail.tail.status(), TailStatus::Disconnected);
    assert_eq!(detail.tail.contents(), "line one\nline two\npartial");
}

#[test]
fn wire_format_events_round_through_state() {
    let mut state = make_state_with_builds(vec![build_running(1)]);
    let sub = open_detail(&mut state, build_running(1));

    for frame in [
        r#"{"t":"Lines","c":["old line"]}"#,
        r#"{"t":"Text","c":"fresh\n"}"#,
        r#"{"t":"Reset"}"#,
        r#"{"t":"Text","c":"after reset\n"}"#,
    ] {
        let event: TailEvent = serde_json::from_str(frame).unwrap();
        assert!(state.apply_tail(sub, event));
    }

    let detail = state.detail.as_ref().unwrap();
    assert_eq!(detail.tail.contents(), "after reset\n");
}

#[test]
fn input_to_state_action_flow() {
    let mut state =
        make_state_with_builds(vec![build_with_id(1), build_with_id(2), build_with_id(3)]);

    let ctx = InputContext {
        view: ViewMode::Builds,
        has_error: false,
        is_loading: false,
        can_restart: false,
    };

    let action = input::map_key(press(KeyCode::Char('j')), &ctx);
    assert_eq!(action, Action::MoveDown);
    state.move_cursor_down();
    assert_eq!(state.cursor, 1);

    let action = input::map_key(press(KeyCode::Char('k')), &ctx);
    assert_eq!(action, Action::MoveUp);
    state.move_cursor_up();
    assert_eq!(state.cursor, 0);

    let action = input::map_key(press(KeyCode::Enter), &ctx);
    assert_eq!(action, Action::OpenBuild);
    let sub = open_detail(&mut state, build_with_id(1));
    assert_eq!(state.view, View::Detail);
    assert!(sub > 0);

    let detail_ctx = InputContext {
        view: ViewMode::Detail,
        has_error: false,
        is_loading: false,
        can_restart: state.can_restart(),
    };
    let action = input::map_key(press(KeyCode::Esc), &detail_ctx);
    assert_eq!(action, Action::Back);
    state.close_detail();
    assert_eq!(state.view, View::Builds);
    assert!(state.detail.is_none());
}

#[test]
fn detail_fetch_identity_guards_against_navigation() {
    let mut state = make_state_with_builds(vec![build_running(1), build_running(2)]);

    // Ask for build 1, back out before the response arrives, ask for 2.
    state.request_detail(1);
    assert_eq!(state.view, View::Detail);
    state.close_detail();
    state.request_detail(2);

    // Build 1's late response must be dropped, not opened.
    assert!(!state.detail_result_wanted(1));
    assert!(state.detail_result_wanted(2));

    // Build 2's response opens the detail and consumes the request.
    let sub = open_detail(&mut state, build_running(2));
    assert_eq!(state.detail_build_id(), Some(2));
    assert!(sub > 0);
    assert!(!state.detail_result_wanted(1));
    // A refresh of the open build is still accepted.
    assert!(state.detail_result_wanted(2));
}

#[test]
fn form_flow_builds_submit_payload() {
    let mut state = make_state_with_builds(vec![]);
    state.view = View::NewBuild;

    let ctx = InputContext {
        view: ViewMode::Form,
        has_error: false,
        is_loading: false,
        can_restart: false,
    };
    for c in "https://git.example.com/x.git".chars() {
        match input::map_key(press(KeyCode::Char(c)), &ctx) {
            Action::FormInput(c) => state.form.insert(c),
            other => panic!("expected FormInput, got {other:?}"),
        }
    }
    assert_eq!(input::map_key(press(KeyCode::Tab), &ctx), Action::FormNextField);
    state.form.focus = state.form.focus.next();
    state.form.insert('2');

    let payload = state.form.payload();
    assert_eq!(payload.origin, "https://git.example.com/x.git");
    assert_eq!(payload.rev, "main2");
    assert_eq!(payload.paths, "");
}

// ========== TUI snapshot tests ==========

fn buffer_text(terminal: &ratatui::Terminal<ratatui::backend::TestBackend>) -> String {
    let buffer = terminal.backend().buffer().clone();
    let mut text = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            text.push_str(buffer.cell((x, y)).unwrap().symbol());
        }
        text.push('\n');
    }
    text
}

#[test]
fn tui_header_contains_server() {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    let state = make_state_with_builds(vec![build_with_id(1)]);
    let backend = TestBackend::new(80, 24);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|f| sfw::tui::render::render(f, &state)).unwrap();

    let text = buffer_text(&terminal);
    assert!(
        text.contains("http://localhost:8000"),
        "Header should contain server URL, got: {text}"
    );
}

#[test]
fn tui_footer_contains_key_hints() {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    let state = make_state_with_builds(vec![build_with_id(1)]);
    let backend = TestBackend::new(80, 24);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|f| sfw::tui::render::render(f, &state)).unwrap();

    let text = buffer_text(&terminal);
    assert!(
        text.contains("navigate"),
        "Footer should contain 'navigate' hint, got: {text}"
    );
}

#[test]
fn tui_table_renders_origins_and_statuses() {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    let state = make_state_with_builds(vec![build_with_id(1), build_running(2)]);
    let backend = TestBackend::new(100, 24);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|f| sfw::tui::render::render(f, &state)).unwrap();

    let text = buffer_text(&terminal);
    assert!(text.contains("project1.git"), "got: {text}");
    assert!(text.contains("project2.git"), "got: {text}");
    assert!(text.contains("succeeded"), "got: {text}");
    assert!(text.contains("building"), "got: {text}");
}

#[test]
fn tui_empty_state_shows_hint() {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    let state = make_state_with_builds(vec![]);
    let backend = TestBackend::new(80, 24);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|f| sfw::tui::render::render(f, &state)).unwrap();

    let text = buffer_text(&terminal);
    assert!(
        text.contains("No builds found"),
        "Empty state should show hint, got: {text}"
    );
}

#[test]
fn tui_detail_renders_tail_lines() {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    let mut state = make_state_with_builds(vec![build_running(1)]);
    let sub = open_detail(&mut state, build_running(1));
    state.apply_tail(
        sub,
        TailEvent::Text("unpacking sources\nbuilding phase\n".to_string()),
    );

    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|f| sfw::tui::render::render(f, &state)).unwrap();

    let text = buffer_text(&terminal);
    assert!(text.contains("Build #1"), "got: {text}");
    assert!(text.contains("release.nix"), "got: {text}");
    assert!(text.contains("unpacking sources"), "got: {text}");
    assert!(text.contains("building phase"), "got: {text}");
    assert!(
        text.contains("/build/1/raw"),
        "Detail should link the raw log, got: {text}"
    );
}

#[test]
fn tui_detail_footer_offers_restart_only_when_finished() {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    let mut state = make_state_with_builds(vec![build_running(1)]);
    open_detail(&mut state, build_running(1));

    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|f| sfw::tui::render::render(f, &state)).unwrap();
    let text = buffer_text(&terminal);
    assert!(
        !text.contains("restart"),
        "Running build must not offer restart, got: {text}"
    );

    // Build finishes; the hint appears.
    state.update_detail(build_failed(1), default_inputs(1));
    terminal.draw(|f| sfw::tui::render::render(f, &state)).unwrap();
    let text = buffer_text(&terminal);
    assert!(
        text.contains("restart"),
        "Finished build should offer restart, got: {text}"
    );
}

#[test]
fn tui_detail_shows_disconnect_notice() {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    let mut state = make_state_with_builds(vec![build_running(1)]);
    let sub = open_detail(&mut state, build_running(1));
    state.apply_tail(sub, TailEvent::Text("some output\n".to_string()));
    state.tail_disconnected(sub);

    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|f| sfw::tui::render::render(f, &state)).unwrap();

    let text = buffer_text(&terminal);
    assert!(
        text.contains("unable to communicate"),
        "Disconnected tail should show the notice, got: {text}"
    );
}

#[test]
fn tui_form_renders_fields() {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    let mut state = make_state_with_builds(vec![]);
    state.view = View::NewBuild;
    state.form.origin = "https://git.example.com/x.git".to_string();

    let backend = TestBackend::new(80, 24);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|f| sfw::tui::render::render(f, &state)).unwrap();

    let text = buffer_text(&terminal);
    assert!(text.contains("Queue a new build"), "got: {text}");
    assert!(text.contains("origin"), "got: {text}");
    assert!(text.contains("https://git.example.com/x.git"), "got: {text}");
}

// ========== Live backend tests (ignored by default) ==========

#[tokio::test]
#[ignore]
async fn backend_fetch_and_parse_builds() {
    let client = sfw::api::client::Client::new("http://localhost:8000").unwrap();
    let json = client.fetch_builds().await.expect("backend reachable");
    let builds = parser::parse_builds(&json).expect("should parse builds");
    for build in &builds {
        assert!(build.id > 0);
        assert!(!build.origin.is_empty());
    }
}

#[tokio::test]
#[ignore]
async fn backend_fetch_single_build() {
    let client = sfw::api::client::Client::new("http://localhost:8000").unwrap();
    let json = client.fetch_builds().await.expect("backend reachable");
    let builds = parser::parse_builds(&json).expect("should parse builds");
    if let Some(first) = builds.first() {
        let detail_json = client.fetch_build(first.id).await.expect("fetch build");
        let (build, _inputs) = parser::parse_build(&detail_json).expect("parse build");
        assert_eq!(build.id, first.id);
    }
}
