use crate::conversation::{ChatMessage, Conversation};
use crate::llm::{Gateway, GenerationRequest};
use crate::ui::conversation::composer::TextInput;
use std::sync::Arc;
use tokio::sync::mpsc;

/// State of the chat panel: visibility, turns, input buffer and flags.
///
/// At most one send is in flight; while `loading` is set the trailing turn is
/// the model placeholder receiving fragments.
pub struct ChatWidget {
    is_open: bool,
    conversation: Conversation,
    input: TextInput,
    loading: bool,
    thinking_mode: bool,
    /// Lines scrolled up from the newest message
    scroll_offset: u16,
    stream_receiver: Option<mpsc::UnboundedReceiver<String>>,
}

impl Default for ChatWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatWidget {
    pub fn new() -> Self {
        Self {
            is_open: false,
            conversation: Conversation::new(),
            input: TextInput::default(),
            loading: false,
            thinking_mode: false,
            scroll_offset: 0,
            stream_receiver: None,
        }
    }

    pub fn toggle_open(&mut self) {
        self.is_open = !self.is_open;
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input.set_content(text.into());
    }

    pub fn toggle_thinking_mode(&mut self) {
        self.thinking_mode = !self.thinking_mode;
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_thinking_mode(&self) -> bool {
        self.thinking_mode
    }

    pub fn input(&self) -> &str {
        self.input.content()
    }

    pub fn input_mut(&mut self) -> &mut TextInput {
        &mut self.input
    }

    pub fn input_state(&self) -> &TextInput {
        &self.input
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    pub fn scroll_offset(&self) -> u16 {
        self.scroll_offset
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Whether `send()` would do anything right now
    pub fn can_send(&self) -> bool {
        !self.loading && !self.input.content().trim().is_empty()
    }

    /// Record the user turn and placeholder; returns the request to stream.
    ///
    /// `None` when the input is blank or a send is already in flight.
    pub fn begin_send(&mut self) -> Option<GenerationRequest> {
        if self.loading {
            tracing::debug!("send ignored while a reply is streaming");
            return None;
        }

        let text = self.input.content().trim().to_string();
        if text.is_empty() {
            return None;
        }

        self.push_message(ChatMessage::user(text));
        self.input.clear();
        self.loading = true;

        let request = GenerationRequest::new(self.conversation.messages().to_vec(), self.thinking_mode);
        self.push_message(ChatMessage::placeholder());

        tracing::info!(
            request_id = %request.id,
            mode = request.mode().display_name(),
            turns = request.messages.len(),
            "sending message"
        );
        Some(request)
    }

    /// Append a streamed fragment to the placeholder turn.
    ///
    /// Fragments are dropped unless a send is in flight and the last turn is
    /// a model turn.
    pub fn apply_fragment(&mut self, fragment: &str) -> bool {
        if !self.loading {
            tracing::warn!("dropping fragment received with no send in flight");
            return false;
        }
        if !self.conversation.append_to_last_model(fragment) {
            tracing::warn!("dropping fragment: last turn is not a model turn");
            return false;
        }
        self.scroll_offset = 0;
        true
    }

    pub fn finish_send(&mut self) {
        self.loading = false;
        self.stream_receiver = None;
    }

    /// Send the pending input and stream the reply to completion
    pub async fn send<G: Gateway + ?Sized>(&mut self, gateway: &G) {
        let Some(request) = self.begin_send() else {
            return;
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let produce = gateway.stream_reply(request, tx);
        let consume = async {
            while let Some(fragment) = rx.recv().await {
                self.apply_fragment(&fragment);
            }
        };
        tokio::join!(produce, consume);

        self.finish_send();
    }

    /// Start a send on the runtime; fragments are applied by [`Self::poll_stream`].
    pub fn start_send(&mut self, gateway: Arc<dyn Gateway>) -> bool {
        let Some(request) = self.begin_send() else {
            return false;
        };

        let (tx, rx) = mpsc::unbounded_channel();
        self.stream_receiver = Some(rx);
        tokio::spawn(async move {
            gateway.stream_reply(request, tx).await;
        });
        true
    }

    /// Apply any fragments that have arrived; returns whether state changed
    pub fn poll_stream(&mut self) -> bool {
        let Some(mut stream_rx) = self.stream_receiver.take() else {
            return false;
        };

        let mut changed = false;
        loop {
            match stream_rx.try_recv() {
                Ok(fragment) => {
                    changed |= self.apply_fragment(&fragment);
                }
                Err(mpsc::error::TryRecvError::Empty) => {
                    self.stream_receiver = Some(stream_rx);
                    break;
                }
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.finish_send();
                    changed = true;
                    break;
                }
            }
        }
        changed
    }

    fn push_message(&mut self, message: ChatMessage) {
        self.conversation.push(message);
        self.scroll_offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::error::GenerationError;
    use crate::llm::{APOLOGY, FragmentSender};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned fragments, or fails, and records what it was asked.
    #[derive(Default)]
    struct ScriptedGateway {
        fragments: Vec<String>,
        fail: bool,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGateway {
        fn replying(fragments: &[&str]) -> Self {
            Self {
                fragments: fragments.iter().map(|f| f.to_string()).collect(),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn thinking_flags(&self) -> Vec<bool> {
            self.requests.lock().unwrap().iter().map(|r| r.thinking).collect()
        }
    }

    #[async_trait]
    impl Gateway for ScriptedGateway {
        async fn try_stream(
            &self,
            request: &GenerationRequest,
            fragments: &FragmentSender,
        ) -> Result<(), GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(GenerationError::Upstream("simulated".to_string()));
            }
            for fragment in &self.fragments {
                fragments.send(fragment.clone()).unwrap();
            }
            Ok(())
        }
    }

    fn turns(widget: &ChatWidget) -> Vec<(Role, &str)> {
        widget
            .messages()
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect()
    }

    #[test]
    fn toggles_are_independent() {
        let mut widget = ChatWidget::new();
        widget.toggle_open();
        assert!(widget.is_open());
        assert!(!widget.is_thinking_mode());

        widget.toggle_thinking_mode();
        widget.toggle_open();
        assert!(!widget.is_open());
        assert!(widget.is_thinking_mode());
        assert!(widget.messages().is_empty());
    }

    #[test]
    fn begin_send_adds_user_turn_and_placeholder() {
        let mut widget = ChatWidget::new();
        widget.set_input("  Hello  ");

        let request = widget.begin_send().unwrap();

        assert_eq!(turns(&widget), vec![(Role::User, "Hello"), (Role::Model, "")]);
        assert_eq!(widget.input(), "");
        assert!(widget.is_loading());
        // The placeholder is not part of what the gateway sees
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "Hello");
    }

    #[tokio::test]
    async fn hello_scenario() {
        let gateway = ScriptedGateway::replying(&["Hi", " there"]);
        let mut widget = ChatWidget::new();
        widget.set_input("Hello");

        widget.send(&gateway).await;

        assert_eq!(turns(&widget), vec![(Role::User, "Hello"), (Role::Model, "Hi there")]);
        assert!(!widget.is_loading());
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn reply_is_concatenation_of_fragments() {
        let pieces = ["The ", "quick ", "", "brown\n", "fox ✨"];
        let gateway = ScriptedGateway::replying(&pieces);
        let mut widget = ChatWidget::new();
        widget.set_input("Tell me something");

        widget.send(&gateway).await;

        assert_eq!(widget.messages().last().unwrap().content, pieces.concat());
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let gateway = ScriptedGateway::replying(&["unused"]);
        let mut widget = ChatWidget::new();

        widget.send(&gateway).await;
        widget.set_input(" \n\t ");
        widget.send(&gateway).await;

        assert!(widget.messages().is_empty());
        assert_eq!(gateway.calls(), 0);
        assert!(!widget.is_loading());
    }

    #[tokio::test]
    async fn mode_flag_is_read_at_each_send() {
        let gateway = ScriptedGateway::replying(&["ok"]);
        let mut widget = ChatWidget::new();

        widget.set_input("first");
        widget.send(&gateway).await;
        widget.toggle_thinking_mode();
        widget.set_input("second");
        widget.send(&gateway).await;

        assert_eq!(gateway.thinking_flags(), vec![false, true]);
        // Second call carries the whole history up to the new user turn
        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].messages[1].content, "ok");
    }

    #[tokio::test]
    async fn gateway_fault_appends_apology_and_clears_loading() {
        let gateway = ScriptedGateway::failing();
        let mut widget = ChatWidget::new();
        widget.set_input("Hello");

        widget.send(&gateway).await;

        assert_eq!(turns(&widget), vec![(Role::User, "Hello"), (Role::Model, APOLOGY)]);
        assert!(!widget.is_loading());
    }

    #[test]
    fn send_while_loading_is_rejected() {
        let mut widget = ChatWidget::new();
        widget.set_input("one");
        assert!(widget.begin_send().is_some());

        widget.set_input("two");
        assert!(!widget.can_send());
        assert!(widget.begin_send().is_none());
        assert_eq!(widget.messages().len(), 2);
        assert_eq!(widget.input(), "two");
    }

    #[test]
    fn fragments_need_an_in_flight_placeholder() {
        let mut widget = ChatWidget::new();
        assert!(!widget.apply_fragment("stray"));

        widget.set_input("Hello");
        widget.begin_send();
        assert!(widget.apply_fragment("Hi"));
        widget.finish_send();

        assert!(!widget.apply_fragment(" late"));
        assert_eq!(widget.messages()[1].content, "Hi");
    }

    #[test]
    fn growth_resets_scroll() {
        let mut widget = ChatWidget::new();
        widget.scroll_up(5);
        assert_eq!(widget.scroll_offset(), 5);

        widget.set_input("Hello");
        widget.begin_send();
        assert_eq!(widget.scroll_offset(), 0);

        widget.scroll_up(3);
        widget.apply_fragment("x");
        assert_eq!(widget.scroll_offset(), 0);
    }

    #[tokio::test]
    async fn start_send_streams_through_poll() {
        let gateway: Arc<dyn Gateway> = Arc::new(ScriptedGateway::replying(&["Hi", " there"]));
        let mut widget = ChatWidget::new();
        widget.set_input("Hello");

        assert!(widget.start_send(gateway));
        assert!(widget.is_loading());

        let mut polls = 0;
        while widget.is_loading() {
            widget.poll_stream();
            tokio::task::yield_now().await;
            polls += 1;
            assert!(polls < 1000, "stream never finished");
        }

        assert_eq!(turns(&widget), vec![(Role::User, "Hello"), (Role::Model, "Hi there")]);
        assert!(!widget.poll_stream());
    }
}
