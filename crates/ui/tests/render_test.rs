use peditor_agent::Orchestrator;
use peditor_core::{HistoryKind, HistoryStore, SettingsContext, notice::messages};
use peditor_providers::{MockProvider, MockResponse};
use peditor_ui::{App, MemoryClipboard, event_handler::KeyAction};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use std::sync::Arc;

fn create_test_app(credential: &str, responses: Vec<MockResponse>) -> App {
    let histories = Arc::new(HistoryStore::new());
    let settings = Arc::new(SettingsContext::in_memory());
    if !credential.is_empty() {
        settings.set_credential(credential).unwrap();
    }
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(MockProvider::new(responses)), histories, settings));
    App::new(orchestrator, Box::new(MemoryClipboard::new()))
}

fn render(app: &App, width: u16, height: u16) -> String {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|f| app.render(f)).unwrap();
    buffer_to_string(terminal.backend().buffer())
}

fn buffer_to_string(buffer: &ratatui::buffer::Buffer) -> String {
    let mut s = String::new();
    for y in 0..buffer.area().height {
        for x in 0..buffer.area().width {
            s.push(buffer[(x, y)].symbol().chars().next().unwrap_or(' '));
        }
        s.push('\n');
    }
    s
}

#[test]
fn test_render_empty_editor() {
    let app = create_test_app("", Vec::new());
    let content = render(&app, 120, 24);

    assert!(content.contains("peditor"));
    assert!(content.contains("Input"));
    assert!(content.contains("Output"));
    assert!(content.contains("Summarize"));
    assert!(content.contains("Type or paste text here"));
    assert!(content.contains("Please enter an API key"));
}

#[test]
fn test_render_hides_banner_with_credential() {
    let app = create_test_app("sk-test-1234", Vec::new());
    let content = render(&app, 120, 24);
    assert!(!content.contains("Please enter an API key"));
}

#[test]
fn test_render_position_indicators() {
    let mut app = create_test_app("sk-test-1234", Vec::new());
    let histories = Arc::clone(app.orchestrator().histories());
    histories.append(HistoryKind::Input, "first draft");
    histories.append(HistoryKind::Input, "second draft");
    histories.append(HistoryKind::Output, "## Result\n- point one");
    app.refresh();

    let content = render(&app, 120, 24);
    assert!(content.contains("2/2"));
    assert!(content.contains("1/1"));
    assert!(content.contains("second draft"));
    assert!(content.contains("Result"));
    assert!(content.contains("• point one"));
}

#[test]
fn test_render_stacked_on_narrow_terminal() {
    let mut app = create_test_app("sk-test-1234", Vec::new());
    app.handle_action(KeyAction::InputChanged { text: "narrow input".to_string() });
    let content = render(&app, 60, 30);

    let input_row = content.lines().position(|l| l.contains("Input")).unwrap();
    let output_row = content.lines().position(|l| l.contains("Output")).unwrap();
    assert!(output_row > input_row);
    assert!(content.contains("narrow input"));
}

#[test]
fn test_render_settings_dialog() {
    let mut app = create_test_app("sk-1234567890abcdef", Vec::new());
    app.state_mut().open_settings();
    let content = render(&app, 120, 30);

    assert!(content.contains("Settings"));
    assert!(content.contains("API key"));
    assert!(content.contains("cdef"));
    assert!(!content.contains("sk-1234567890abcdef"));
    assert!(content.contains("GPT-4o"));
    assert!(content.contains("0.7"));
}

#[test]
fn test_render_notice_in_footer() {
    let mut app = create_test_app("", Vec::new());
    app.handle_action(KeyAction::MoveOutputToInput);
    let content = render(&app, 120, 24);
    assert!(content.contains(messages::NOTHING_TO_MOVE));
}

#[tokio::test]
async fn test_render_after_streaming() {
    let mut app = create_test_app("sk-test-1234", vec![MockResponse::sequence(["Sum", "mary."])]);
    app.handle_action(KeyAction::InputChanged { text: "hello".to_string() });
    app.handle_action(KeyAction::RunTemplate { title: "Summarize", option: None });
    app.orchestrator().wait_idle().await;
    app.refresh();

    let content = render(&app, 120, 24);
    assert!(content.contains("Summary."));
    assert!(content.contains("idle"));
}

#[tokio::test]
async fn test_render_while_streaming() {
    let mut app = create_test_app("sk-test-1234", vec![MockResponse::hang(["partial"])]);
    app.handle_action(KeyAction::InputChanged { text: "hello".to_string() });
    app.handle_action(KeyAction::RunTemplate { title: "Summarize", option: None });

    let content = render(&app, 120, 24);
    assert!(content.contains("generating"));
    assert!(content.contains("stop"));

    app.handle_action(KeyAction::CancelGeneration);
    let content = render(&app, 120, 24);
    assert!(content.contains("idle"));
}
