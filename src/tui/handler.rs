use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    Collect,
    OpenInBrowser,
    CycleCategoryFilter,
    CycleKeywordFilter,
    CycleHandleFilter,
    ClearFilters,
    ShowHelp,
    HideHelp,
    // Manual keyword add
    AddKeywordStart,
    KeywordInputChar(char),
    KeywordInputBackspace,
    KeywordInputConfirm,
    KeywordInputCancel,
    // Keyword file import
    ImportStart,
    ImportInputChar(char),
    ImportInputBackspace,
    ImportInputConfirm,
    ImportInputCancel,
}

pub fn handle_key_event(
    key: KeyEvent,
    keyword_input_active: bool,
    import_input_active: bool,
    show_help: bool,
) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    // Keyword input mode
    if keyword_input_active {
        return match key.code {
            KeyCode::Enter => Some(AppAction::KeywordInputConfirm),
            KeyCode::Esc => Some(AppAction::KeywordInputCancel),
            KeyCode::Backspace => Some(AppAction::KeywordInputBackspace),
            KeyCode::Char(c) => Some(AppAction::KeywordInputChar(c)),
            _ => None,
        };
    }

    // Import path input mode
    if import_input_active {
        return match key.code {
            KeyCode::Enter => Some(AppAction::ImportInputConfirm),
            KeyCode::Esc => Some(AppAction::ImportInputCancel),
            KeyCode::Backspace => Some(AppAction::ImportInputBackspace),
            KeyCode::Char(c) => Some(AppAction::ImportInputChar(c)),
            _ => None,
        };
    }

    // Normal mode
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(AppAction::MoveDown),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(AppAction::MoveUp),
        (KeyCode::Char('<'), _) => Some(AppAction::MoveToTop),
        (KeyCode::Char('>'), _) => Some(AppAction::MoveToBottom),

        (KeyCode::Char('r'), _) => Some(AppAction::Collect),
        (KeyCode::Char('o'), _) => Some(AppAction::OpenInBrowser),

        (KeyCode::Char('f'), _) => Some(AppAction::CycleCategoryFilter),
        (KeyCode::Char('s'), _) => Some(AppAction::CycleKeywordFilter),
        (KeyCode::Char('h'), _) => Some(AppAction::CycleHandleFilter),
        (KeyCode::Char('x'), _) => Some(AppAction::ClearFilters),

        (KeyCode::Char('a'), _) => Some(AppAction::AddKeywordStart),
        (KeyCode::Char('i'), _) => Some(AppAction::ImportStart),

        (KeyCode::Char('?'), _) => Some(AppAction::ShowHelp),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn input_modes_capture_characters() {
        let action = handle_key_event(key(KeyCode::Char('r')), true, false, false);
        assert!(matches!(action, Some(AppAction::KeywordInputChar('r'))));

        let action = handle_key_event(key(KeyCode::Char('r')), false, true, false);
        assert!(matches!(action, Some(AppAction::ImportInputChar('r'))));
    }

    #[test]
    fn help_swallows_the_next_key() {
        let action = handle_key_event(key(KeyCode::Char('q')), false, false, true);
        assert!(matches!(action, Some(AppAction::HideHelp)));
    }

    #[test]
    fn normal_mode_maps_collect_and_filters() {
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('r')), false, false, false),
            Some(AppAction::Collect)
        ));
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('f')), false, false, false),
            Some(AppAction::CycleCategoryFilter)
        ));
    }
}
