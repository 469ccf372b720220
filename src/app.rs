use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info};

use crate::client::CompletionClient;
use crate::config::Config;
use crate::conversation::{Conversation, Failure, Outcome, Rejected};
use crate::credential::CredentialGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Direct mode, waiting for an API key
    Credential,
    Chat,
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,

    pub conversation: Conversation,
    /// Cursor within the draft, in characters
    pub draft_cursor: usize,

    /// Absent in proxy mode
    pub gate: Option<CredentialGate>,

    pub client: CompletionClient,
    pub pending: Option<JoinHandle<Outcome>>,

    // Chat view geometry and scrolling, refreshed on every draw
    pub chat_scroll: u16,
    pub chat_height: u16,
    /// Lines the chat text occupies once wrapped, as rendered
    pub chat_lines: u16,
    /// Pin the view to the newest entry until the user scrolls up
    pub follow_newest: bool,
    /// Message count at the last draw, to spot appended messages
    pub seen_messages: usize,

    pub animation_frame: u8,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let endpoint = config.endpoint();
        let gate = endpoint.needs_credential().then(CredentialGate::new);
        let screen = if gate.is_some() {
            Screen::Credential
        } else {
            Screen::Chat
        };

        info!(url = endpoint.url(), model = %config.model, "chat widget ready");

        Self {
            should_quit: false,
            screen,
            conversation: Conversation::new(),
            draft_cursor: 0,
            gate,
            client: CompletionClient::new(endpoint, &config.model),
            pending: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_lines: 0,
            follow_newest: true,
            seen_messages: 0,
            animation_frame: 0,
        }
    }

    pub fn is_proxy_mode(&self) -> bool {
        self.gate.is_none()
    }

    /// Confirm the typed key and open the chat if it was accepted
    pub fn confirm_credential(&mut self) {
        if let Some(gate) = self.gate.as_mut() {
            if gate.confirm() {
                info!("API key captured for this session");
                self.screen = Screen::Chat;
            }
        }
    }

    /// Submit the draft and start the request for this turn
    pub fn send_turn(&mut self) {
        let history = match self.conversation.submit() {
            Ok(history) => history,
            Err(Rejected::EmptyDraft) => return,
            Err(Rejected::Busy) => {
                debug!("turn already in flight, submission ignored");
                return;
            }
        };
        self.draft_cursor = 0;

        let client = self.client.clone();
        let key = self.gate.as_ref().and_then(|gate| gate.key().cloned());
        self.pending = Some(tokio::spawn(async move {
            client.send_turn(&history, key.as_ref()).await
        }));

        self.scroll_chat_to_bottom();
    }

    /// Apply the outcome of a finished request, if there is one
    pub async fn poll_pending(&mut self) {
        let finished = self
            .pending
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        self.wait_pending().await;
    }

    /// Wait for the in-flight request, if any, and apply it
    pub async fn wait_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            let outcome = task_outcome(task.await);
            self.settle(outcome);
        }
    }

    fn settle(&mut self, outcome: Outcome) {
        if self.conversation.settle(outcome) {
            self.scroll_chat_to_bottom();
        }
    }

    pub fn tick_animation(&mut self) {
        if self.conversation.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    fn max_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.chat_height)
    }

    /// Record the rendered chat geometry and settle the scroll offset.
    /// New messages pull the view back to the bottom.
    pub fn update_chat_view(&mut self, height: u16, lines: u16, messages: usize) {
        self.chat_height = height;
        self.chat_lines = lines;
        if messages != self.seen_messages {
            self.seen_messages = messages;
            self.follow_newest = true;
        }

        if self.follow_newest {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        self.follow_newest = true;
        self.chat_scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_newest = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        self.follow_newest = self.chat_scroll >= self.max_scroll();
    }

    pub fn page_height(&self) -> u16 {
        self.chat_height.max(1)
    }
}

fn task_outcome(result: Result<Outcome, JoinError>) -> Outcome {
    result.unwrap_or_else(|err| {
        error!("request task failed: {}", err);
        Outcome::Failed(Failure::Transport)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatMessage;

    fn proxy_config() -> Config {
        Config {
            use_proxy: true,
            // Nothing listens here; tests that send use wiremock instead
            proxy_url: "http://127.0.0.1:9".to_string(),
            ..Config::new()
        }
    }

    fn direct_config() -> Config {
        Config {
            use_proxy: false,
            ..Config::new()
        }
    }

    #[test]
    fn proxy_mode_skips_the_gate() {
        let app = App::new(&proxy_config());
        assert_eq!(app.screen, Screen::Chat);
        assert!(app.gate.is_none());
        assert!(app.is_proxy_mode());
    }

    #[test]
    fn direct_mode_starts_at_the_gate() {
        let mut app = App::new(&direct_config());
        assert_eq!(app.screen, Screen::Credential);

        app.confirm_credential();
        assert_eq!(app.screen, Screen::Credential);

        app.gate.as_mut().unwrap().input = "sk-test".to_string();
        app.confirm_credential();
        assert_eq!(app.screen, Screen::Chat);
    }

    #[tokio::test]
    async fn missing_key_settles_without_network() {
        let mut app = App::new(&direct_config());
        app.conversation.draft_mut().push_str("Hello");

        app.send_turn();
        assert!(app.conversation.is_busy());
        app.wait_pending().await;

        assert_eq!(
            app.conversation.messages(),
            &[
                ChatMessage::user("Hello"),
                ChatMessage::assistant("An API key is required when not using a proxy."),
            ]
        );
        assert!(!app.conversation.is_busy());
    }

    #[tokio::test]
    async fn blank_draft_spawns_nothing() {
        let mut app = App::new(&proxy_config());
        app.conversation.draft_mut().push_str("  ");

        app.send_turn();

        assert!(app.pending.is_none());
        assert!(app.conversation.messages().is_empty());
        assert!(!app.conversation.is_busy());
    }

    async fn crashing_turn() -> Outcome {
        panic!("request task blew up")
    }

    #[tokio::test]
    async fn panicked_request_still_settles_the_turn() {
        let mut app = App::new(&proxy_config());
        app.conversation.draft_mut().push_str("Hello");
        app.conversation.submit().unwrap();
        app.pending = Some(tokio::spawn(crashing_turn()));

        app.wait_pending().await;

        assert_eq!(
            app.conversation.messages().last(),
            Some(&ChatMessage::assistant(Failure::Transport.user_message()))
        );
        assert!(!app.conversation.is_busy());
        assert!(app.pending.is_none());
    }

    #[test]
    fn new_messages_pull_the_view_to_the_bottom() {
        let mut app = App::new(&proxy_config());
        app.update_chat_view(5, 20, 4);
        assert_eq!(app.chat_scroll, 15);

        app.scroll_up(10);
        assert!(!app.follow_newest);
        app.update_chat_view(5, 20, 4);
        assert_eq!(app.chat_scroll, 5);

        app.update_chat_view(5, 26, 6);
        assert!(app.follow_newest);
        assert_eq!(app.chat_scroll, 21);
    }

    #[test]
    fn scrolling_is_clamped() {
        let mut app = App::new(&proxy_config());
        app.update_chat_view(3, 24, 8);
        let bottom = app.chat_scroll;
        assert_eq!(bottom, 21);

        app.scroll_down(10);
        assert_eq!(app.chat_scroll, bottom);
        assert!(app.follow_newest);

        app.scroll_up(100);
        assert_eq!(app.chat_scroll, 0);

        app.scroll_down(app.page_height());
        assert_eq!(app.chat_scroll, 3);
        assert!(!app.follow_newest);

        app.scroll_down(100);
        assert!(app.follow_newest);
    }

    #[test]
    fn shrinking_content_clamps_the_offset() {
        let mut app = App::new(&proxy_config());
        app.update_chat_view(5, 30, 2);
        app.scroll_up(3);
        assert_eq!(app.chat_scroll, 22);

        app.update_chat_view(20, 30, 2);
        assert_eq!(app.chat_scroll, 10);
    }
}
