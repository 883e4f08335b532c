//! Single global modal message slot.
//!
//! Only one message is ever live: a new [`show`](MessageBoxStore::show)
//! replaces the previous payload even if it was never seen. Dispatching an
//! action runs its handler and then always hides the box, whatever the
//! handler's outcome; the box must never be left open by a failing action.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

/// Future returned by an action handler.
pub type ActionFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

type ActionHandler = Arc<dyn Fn() -> ActionFuture + Send + Sync>;

/// Visual weight of an action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionVariant {
    #[default]
    Primary,
    Secondary,
    Danger,
}

/// One button on the message box.
#[derive(Clone)]
pub struct MessageAction {
    pub label: String,
    pub variant: ActionVariant,
    handler: Option<ActionHandler>,
}

impl MessageAction {
    pub fn new(label: impl Into<String>, variant: ActionVariant) -> Self {
        Self {
            label: label.into(),
            variant,
            handler: None,
        }
    }

    /// The default action added when a payload carries none.
    pub fn dismiss() -> Self {
        Self::new("OK", ActionVariant::Primary)
    }

    /// Attach a handler run when the action is dispatched.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn() -> ActionFuture + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

impl fmt::Debug for MessageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageAction")
            .field("label", &self.label)
            .field("variant", &self.variant)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// What a caller asks to show.
#[derive(Debug, Clone, Default)]
pub struct MessageBoxPayload {
    pub title: Option<String>,
    pub message: Option<String>,
    pub actions: Vec<MessageAction>,
}

impl MessageBoxPayload {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            message: Some(message.into()),
            actions: Vec::new(),
        }
    }

    pub fn with_actions(mut self, actions: Vec<MessageAction>) -> Self {
        self.actions = actions;
        self
    }
}

/// The live slot, as rendered by the modal collaborator.
#[derive(Debug, Clone, Default)]
pub struct MessageBoxState {
    pub visible: bool,
    pub title: Option<String>,
    pub message: Option<String>,
    pub actions: Vec<MessageAction>,
}

/// Handle to the single message slot. Cheap to clone.
#[derive(Clone)]
pub struct MessageBoxStore {
    state: Arc<watch::Sender<MessageBoxState>>,
}

impl MessageBoxStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(MessageBoxState::default());
        Self {
            state: Arc::new(state),
        }
    }

    /// Replace the slot with a new payload and make it visible. A payload
    /// without actions gets a single dismiss action.
    pub fn show(&self, payload: MessageBoxPayload) {
        let actions = if payload.actions.is_empty() {
            vec![MessageAction::dismiss()]
        } else {
            payload.actions
        };
        self.state.send_replace(MessageBoxState {
            visible: true,
            title: payload.title,
            message: payload.message,
            actions,
        });
    }

    /// Clear visibility and content.
    pub fn hide(&self) {
        self.state.send_replace(MessageBoxState::default());
    }

    /// Run the handler of the action at `index`, then hide the box
    /// unconditionally; a failing handler must not keep the box open.
    pub async fn dispatch(&self, index: usize) {
        let action = self.state.borrow().actions.get(index).cloned();
        if let Some(action) = action {
            if let Some(handler) = &action.handler {
                if let Err(error) = handler().await {
                    warn!(label = %action.label, %error, "message box action failed");
                }
            }
        }
        self.hide();
    }

    /// Current slot snapshot.
    pub fn snapshot(&self) -> MessageBoxState {
        self.state.borrow().clone()
    }

    /// Subscribe to slot changes.
    pub fn subscribe(&self) -> watch::Receiver<MessageBoxState> {
        self.state.subscribe()
    }
}

impl Default for MessageBoxStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn show_replaces_previous_payload() {
        let store = MessageBoxStore::new();
        store.show(MessageBoxPayload::new("First", "first message"));
        store.show(MessageBoxPayload::new("Second", "second message"));

        let state = store.snapshot();
        assert!(state.visible);
        assert_eq!(state.title.as_deref(), Some("Second"));
        assert_eq!(state.message.as_deref(), Some("second message"));
    }

    #[test]
    fn empty_actions_get_default_dismiss() {
        let store = MessageBoxStore::new();
        store.show(MessageBoxPayload::new("Hi", "message"));

        let state = store.snapshot();
        assert_eq!(state.actions.len(), 1);
        assert_eq!(state.actions[0].label, "OK");
        assert!(!state.actions[0].has_handler());
    }

    #[test]
    fn hide_clears_content() {
        let store = MessageBoxStore::new();
        store.show(MessageBoxPayload::new("Hi", "message"));
        store.hide();

        let state = store.snapshot();
        assert!(!state.visible);
        assert_eq!(state.title, None);
        assert!(state.actions.is_empty());
    }

    #[tokio::test]
    async fn dispatch_runs_handler_then_hides() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let action = MessageAction::new("Retry", ActionVariant::Primary).with_handler(move || {
            let seen = seen.clone();
            Box::pin(async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        });

        let store = MessageBoxStore::new();
        store.show(MessageBoxPayload::new("Hi", "message").with_actions(vec![action]));
        store.dispatch(0).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!store.snapshot().visible);
    }

    #[tokio::test]
    async fn dispatch_hides_even_when_handler_fails() {
        let action = MessageAction::new("Retry", ActionVariant::Danger)
            .with_handler(|| Box::pin(async { Err(anyhow::anyhow!("handler failed")) }));

        let store = MessageBoxStore::new();
        store.show(MessageBoxPayload::new("Hi", "message").with_actions(vec![action]));
        store.dispatch(0).await;

        assert!(!store.snapshot().visible);
    }

    #[tokio::test]
    async fn dispatch_out_of_range_still_hides() {
        let store = MessageBoxStore::new();
        store.show(MessageBoxPayload::new("Hi", "message"));
        store.dispatch(5).await;

        assert!(!store.snapshot().visible);
    }
}
