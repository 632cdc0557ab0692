use std::sync::Arc;

use codify_core::{
    CompletionService, Conversation, ExchangeController, PendingRequest, RemoteCallError,
    Submission,
};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// A request that has been dispatched and is running in the background.
pub struct InFlight {
    request: PendingRequest,
    task: JoinHandle<Result<String, RemoteCallError>>,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub endpoint: String,

    // Conversation and request lifecycle
    pub controller: ExchangeController,
    pub client: Arc<dyn CompletionService>,
    pub in_flight: Option<InFlight>,

    // Input line
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Blocking notice (validation or remote failure)
    pub notice: Option<String>,

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16,      // inner height of the chat area, set during render
    pub chat_total_lines: u16, // wrapped line count of the last render
    pub follow_tail: bool,     // keep the newest entry in view
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(client: Arc<dyn CompletionService>, endpoint: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            endpoint: endpoint.into(),

            controller: ExchangeController::new(),
            client,
            in_flight: None,

            input: String::new(),
            cursor: 0,

            notice: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_total_lines: 0,
            follow_tail: true,
            chat_area: None,

            animation_frame: 0,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        self.controller.conversation()
    }

    pub fn is_busy(&self) -> bool {
        self.controller.is_busy()
    }

    /// Send the current input line. The controller ignores this while a
    /// request is in flight, even if the UI let the key through.
    pub fn submit_input(&mut self) {
        match self.controller.begin(&self.input) {
            Ok(Submission::Dispatched(request)) => {
                self.input.clear();
                self.cursor = 0;
                self.follow_tail = true;

                let client = Arc::clone(&self.client);
                let message = request.message().to_string();
                let task = tokio::spawn(async move { client.complete(&message).await });
                self.in_flight = Some(InFlight { request, task });
            }
            Ok(Submission::Rejected) => {}
            Err(err) => self.notice = Some(err.notice().to_string()),
        }
    }

    /// Apply the result of the in-flight request once its task has finished.
    /// Returns without waiting if it's still running.
    pub async fn poll_exchange(&mut self) {
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.task.is_finished());
        if !finished {
            return;
        }
        let Some(InFlight { request, task }) = self.in_flight.take() else {
            return;
        };

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!(error = %join_err, "completion task did not finish cleanly");
                Err(RemoteCallError::Interrupted(join_err.to_string()))
            }
        };

        if let Err(err) = self.controller.finish(request, outcome) {
            self.notice = Some(err.notice().to_string());
        }
        self.follow_tail = true;
    }

    /// Abort the in-flight request, if any. Used on shutdown.
    pub fn abort_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    fn max_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        self.follow_tail = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_tail = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
        self.follow_tail = true;
    }

    /// Record the chat viewport after layout; keeps the newest entry visible
    /// when following the tail.
    pub fn update_chat_viewport(&mut self, height: u16, total_lines: u16) {
        self.chat_height = height;
        self.chat_total_lines = total_lines;
        if self.follow_tail {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codify_core::{ChatEntry, ChatRole};
    use std::time::Duration;

    struct FixedReply(Result<&'static str, ()>);

    #[async_trait]
    impl CompletionService for FixedReply {
        async fn complete(&self, _message: &str) -> Result<String, RemoteCallError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.0
                .map(str::to_string)
                .map_err(|()| RemoteCallError::MissingResponse)
        }
    }

    fn test_app(reply: Result<&'static str, ()>) -> App {
        App::new(Arc::new(FixedReply(reply)), "http://localhost")
    }

    async fn settle(app: &mut App) {
        for _ in 0..100 {
            app.poll_exchange().await;
            if !app.is_busy() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("exchange never finished");
    }

    #[tokio::test]
    async fn submit_clears_input_and_appends_reply() {
        let mut app = test_app(Ok("Hi there!"));
        app.input = "Hello".to_string();
        app.cursor = 5;

        app.submit_input();
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert!(app.is_busy());
        assert_eq!(app.conversation().len(), 1);

        settle(&mut app).await;

        let roles: Vec<ChatRole> = app.conversation().entries().iter().map(ChatEntry::role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
        assert!(app.notice.is_none());
    }

    #[tokio::test]
    async fn failure_raises_generic_notice() {
        let mut app = test_app(Err(()));
        app.input = "Hello".to_string();

        app.submit_input();
        settle(&mut app).await;

        assert_eq!(app.notice.as_deref(), Some("Something went wrong!"));
        assert_eq!(app.conversation().len(), 1);
    }

    #[tokio::test]
    async fn blank_input_raises_notice_and_keeps_buffer() {
        let mut app = test_app(Ok("unused"));
        app.input = "   ".to_string();

        app.submit_input();

        assert_eq!(app.notice.as_deref(), Some("Input cannot be empty"));
        assert_eq!(app.input, "   ");
        assert!(app.conversation().is_empty());
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn second_submit_while_busy_keeps_input() {
        let mut app = test_app(Ok("reply"));
        app.input = "A".to_string();
        app.submit_input();

        app.input = "B".to_string();
        app.submit_input();

        assert_eq!(app.input, "B");
        assert_eq!(app.conversation().len(), 1);
        settle(&mut app).await;
        assert_eq!(app.conversation().len(), 2);
    }

    #[test]
    fn scrolling_up_stops_following_tail() {
        let mut app = test_app(Ok("unused"));
        app.update_chat_viewport(10, 30);
        assert_eq!(app.chat_scroll, 20);

        app.scroll_up(5);
        assert!(!app.follow_tail);
        app.update_chat_viewport(10, 40);
        assert_eq!(app.chat_scroll, 15);

        app.scroll_to_bottom();
        assert_eq!(app.chat_scroll, 30);
        assert!(app.follow_tail);
    }
}
