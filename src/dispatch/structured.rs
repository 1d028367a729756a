//! Structured command executor
//!
//! Runs intents resolved by the pattern table. Used by the in-panel
//! assistant and page-level shortcut handling; the heavier phrasing work
//! lives in the resolver, so this stage is a thin mapping onto the shared
//! action layer.

use std::sync::Arc;

use crate::commerce::{ActionOutcome, CommerceActions, ProductRef};
use crate::intent::{Intent, ParsedCommand};
use crate::store::Route;

use super::NOT_UNDERSTOOD;

/// Executes resolved intents
pub struct StructuredExecutor {
    actions: Arc<CommerceActions>,
}

impl StructuredExecutor {
    /// Create an executor over the shared action layer
    #[must_use]
    pub const fn new(actions: Arc<CommerceActions>) -> Self {
        Self { actions }
    }

    /// Execute a resolved command. Never returns an error: failures become
    /// `success: false` outcomes with a spoken message.
    pub async fn execute(&self, command: &ParsedCommand) -> ActionOutcome {
        match self.run(&command.intent).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(intent = ?command.intent, error = %e, "command failed");
                ActionOutcome::fail(e.spoken_message())
            }
        }
    }

    /// Convenience for callers holding an unresolved transcript slot:
    /// `None` becomes the fixed not-understood outcome, without side effects
    pub async fn execute_opt(&self, command: Option<&ParsedCommand>) -> ActionOutcome {
        match command {
            Some(command) => self.execute(command).await,
            None => ActionOutcome::fail(NOT_UNDERSTOOD),
        }
    }

    async fn run(&self, intent: &Intent) -> crate::Result<ActionOutcome> {
        let actions = &self.actions;
        match intent {
            Intent::NavigateHome => actions.navigate(Route::Home),
            Intent::NavigateCart => actions.navigate(Route::Cart),
            Intent::Search { query } => actions.search(query).await,
            Intent::AddToCart => actions.add_to_cart(&ProductRef::current_page(), None).await,
            Intent::BuyNow => actions.buy_now(&ProductRef::current_page(), None).await,
            Intent::Checkout => actions.checkout().await,
            Intent::ReadPage => actions.read_page().await,
            Intent::ShowHelp => actions.show_help(),
            Intent::EnableHighContrast => actions.set_high_contrast(true),
            Intent::DisableHighContrast => actions.set_high_contrast(false),
            Intent::IncreaseTextSize => actions.adjust_text_size(true),
            Intent::DecreaseTextSize => actions.adjust_text_size(false),
            Intent::SignOut => actions.sign_out(),
            Intent::ChangeQuantity { quantity } => {
                actions
                    .change_quantity(&ProductRef::current_page(), *quantity)
                    .await
            }
            Intent::RemoveItem => actions.remove_item(&ProductRef::current_page()).await,
            Intent::PinLogin { pin } => actions.pin_login(pin).await,
            Intent::OpenAssistant => actions.open_assistant(),
            Intent::NextProduct => actions.step_product(true),
            Intent::PreviousProduct => actions.step_product(false),
            Intent::ReadProduct => actions.read_product().await,
            Intent::ConfirmOrder => actions.confirm_order().await,
        }
    }
}
