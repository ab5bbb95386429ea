use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a keypress should do, independent of how it gets carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    MoveUp,
    MoveDown,
    OpenBuild,
    Back,
    Refresh,
    NewBuild,
    Restart,
    OpenRaw,
    FormInput(char),
    FormBackspace,
    FormNextField,
    FormPrevField,
    Submit,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Builds,
    Detail,
    Form,
}

/// The slice of app state that key mapping depends on.
#[derive(Debug, Clone, Copy)]
pub struct InputContext {
    pub view: ViewMode,
    pub has_error: bool,
    pub is_loading: bool,
    /// Restart is only offered once the viewed build has finished.
    pub can_restart: bool,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits, including from the form
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    match ctx.view {
        ViewMode::Form => map_form_key(key),
        ViewMode::Detail => map_detail_key(key, ctx),
        ViewMode::Builds => map_builds_key(key, ctx),
    }
}

fn map_form_key(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc => Action::Back,
        KeyCode::Tab => Action::FormNextField,
        KeyCode::BackTab => Action::FormPrevField,
        KeyCode::Enter => Action::Submit,
        KeyCode::Backspace => Action::FormBackspace,
        KeyCode::Char(c) => Action::FormInput(c),
        _ => Action::None,
    }
}

fn map_detail_key(key: KeyEvent, ctx: &InputContext) -> Action {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Back,
        KeyCode::Char('h') | KeyCode::Left => Action::Back,
        KeyCode::Char('R') => {
            if ctx.can_restart {
                Action::Restart
            } else {
                Action::None
            }
        }
        KeyCode::Char('o') => Action::OpenRaw,
        KeyCode::Char('r') => Action::Refresh,
        _ => Action::None,
    }
}

fn map_builds_key(key: KeyEvent, ctx: &InputContext) -> Action {
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_error {
                Action::DismissError
            } else {
                Action::Quit
            }
        }
        KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
        KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => Action::OpenBuild,
        KeyCode::Char('n') => Action::NewBuild,
        KeyCode::Char('r') => {
            if ctx.is_loading {
                Action::None
            } else {
                Action::Refresh
            }
        }
        _ => Action::None,
    }
}
