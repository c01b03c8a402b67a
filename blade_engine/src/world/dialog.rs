use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// One branch of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialogOption {
    /// Line the player says when picking the option.
    #[serde(default)]
    pub text: Option<String>,
    /// Line the other party answers with.
    #[serde(default)]
    pub response_text: Option<String>,
    /// Verb run when the option is picked, looked up in the responder's scope.
    #[serde(default)]
    pub verb: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl DialogOption {
    pub fn new(text: Option<&str>, response_text: Option<&str>) -> Self {
        Self {
            text: text.map(str::to_string),
            response_text: response_text.map(str::to_string),
            verb: None,
            visible: true,
        }
    }

    /// Player line, treating an empty string as absent.
    pub fn player_line(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }

    pub fn response_line(&self) -> Option<&str> {
        self.response_text.as_deref().filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    pub id: String,
    /// Actor the player is talking to.
    pub actor: String,
    #[serde(default)]
    pub options: Vec<DialogOption>,
}

/// The dialog currently on screen and the option the player picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogSession {
    pub dialog: String,
    #[serde(default)]
    pub current_option: Option<usize>,
}

/// Read-only accessor joining a session with its dialog definition.
pub struct DialogView<'a> {
    dialog: &'a Dialog,
    session: &'a DialogSession,
}

impl<'a> DialogView<'a> {
    pub(crate) fn new(dialog: &'a Dialog, session: &'a DialogSession) -> Self {
        Self { dialog, session }
    }

    pub fn id(&self) -> &str {
        &self.dialog.id
    }

    pub fn actor_id(&self) -> &str {
        &self.dialog.actor
    }

    pub fn current_option(&self) -> Option<&'a DialogOption> {
        self.session
            .current_option
            .and_then(|index| self.dialog.options.get(index))
    }

    /// A visible option by index.
    pub fn option(&self, index: usize) -> Option<&'a DialogOption> {
        self.dialog.options.get(index).filter(|option| option.visible)
    }

    pub fn visible_options(&self) -> impl Iterator<Item = (usize, &'a DialogOption)> {
        self.dialog
            .options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lines_count_as_absent() {
        let option = DialogOption::new(Some(""), Some("Hello"));
        assert_eq!(option.player_line(), None);
        assert_eq!(option.response_line(), Some("Hello"));
    }

    #[test]
    fn view_resolves_current_option() {
        let dialog = Dialog {
            id: "bar".into(),
            actor: "barkeep".into(),
            options: vec![
                DialogOption::new(Some("Hi"), Some("Hello")),
                DialogOption::new(Some("Bye"), None),
            ],
        };
        let session = DialogSession {
            dialog: "bar".into(),
            current_option: Some(1),
        };
        let view = DialogView::new(&dialog, &session);
        assert_eq!(view.actor_id(), "barkeep");
        assert_eq!(
            view.current_option().and_then(DialogOption::player_line),
            Some("Bye")
        );
        assert_eq!(view.visible_options().count(), 2);
        assert_eq!(
            view.option(0).and_then(DialogOption::response_line),
            Some("Hello")
        );
        assert!(view.option(2).is_none());
    }
}
