use super::history_entries;
use super::truncate_label;
use super::Sidebar;
use crate::domain::models::Message;

fn conversation() -> Vec<Message> {
    return vec![
        Message::user("First question"),
        Message::placeholder().resolved("First answer"),
        Message::user("Second question\nwith more lines"),
        Message::placeholder(),
    ];
}

mod labels {
    use super::*;

    #[test]
    fn it_keeps_short_labels() {
        assert_eq!(truncate_label("Hello"), "Hello");
    }

    #[test]
    fn it_keeps_exactly_sixty_chars() {
        let text = "a".repeat(60);
        assert_eq!(truncate_label(&text), text);
    }

    #[test]
    fn it_truncates_long_labels() {
        let text = "a".repeat(61);
        assert_eq!(truncate_label(&text), format!("{}...", "a".repeat(60)));
    }

    #[test]
    fn it_uses_the_first_line() {
        assert_eq!(truncate_label("Line one\nLine two"), "Line one");
    }

    #[test]
    fn it_truncates_on_chars() {
        let text = "°".repeat(70);
        assert_eq!(truncate_label(&text), format!("{}...", "°".repeat(60)));
    }
}

mod entries {
    use super::*;

    #[test]
    fn it_lists_user_messages_only() {
        let messages = conversation();
        let entries = history_entries(&messages);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, messages[0].id);
        assert_eq!(entries[0].label, "First question");
        assert_eq!(entries[1].id, messages[2].id);
        assert_eq!(entries[1].label, "Second question");
    }

    #[test]
    fn it_is_empty_without_messages() {
        assert!(history_entries(&[]).is_empty());
    }
}

mod selection {
    use super::*;

    #[test]
    fn it_selects_nothing_by_default() {
        let mut sidebar = Sidebar::default();
        sidebar.set_messages(&conversation());

        assert_eq!(sidebar.selected_id(), None);
    }

    #[test]
    fn it_moves_the_selection() {
        let messages = conversation();
        let mut sidebar = Sidebar::default();
        sidebar.set_messages(&messages);

        sidebar.select_next();
        assert_eq!(sidebar.selected_id(), Some(messages[0].id));

        sidebar.select_next();
        sidebar.select_next();
        assert_eq!(sidebar.selected_id(), Some(messages[2].id));

        sidebar.select_prev();
        sidebar.select_prev();
        assert_eq!(sidebar.selected_id(), Some(messages[0].id));
    }

    #[test]
    fn it_starts_from_the_bottom_going_up() {
        let messages = conversation();
        let mut sidebar = Sidebar::default();
        sidebar.set_messages(&messages);
        sidebar.select_prev();

        assert_eq!(sidebar.selected_id(), Some(messages[2].id));
    }

    #[test]
    fn it_keeps_the_selection_across_updates() {
        let mut messages = conversation();
        let mut sidebar = Sidebar::default();
        sidebar.set_messages(&messages);
        sidebar.select_prev();

        messages.insert(0, Message::user("Earlier"));
        sidebar.set_messages(&messages);

        assert_eq!(sidebar.selected_id(), Some(messages[3].id));
        assert_eq!(sidebar.entries().len(), 3);
    }

    #[test]
    fn it_ignores_moves_without_entries() {
        let mut sidebar = Sidebar::default();
        sidebar.select_next();
        sidebar.select_prev();

        assert_eq!(sidebar.selected_id(), None);
    }
}
