//! Handler registry and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, warn};

use concierge_core::types::{Directive, Intent};
use concierge_storage::HotelStore;

use crate::directive;
use crate::error::ActionError;
use crate::handler::billing::{CreateInvoiceHandler, ShowInvoicesHandler, ShowReportsHandler};
use crate::handler::conversation::{FallbackHandler, GreetingHandler, HelpHandler};
use crate::handler::reservation::{
    CancelReservationHandler, ModifyReservationHandler, ReservationHandler,
};
use crate::handler::rooms::{CheckAvailabilityHandler, RoomProblemHandler, ShowCalendarHandler};
use crate::handler::stock::{AddStockHandler, OpenPosHandler, SellProductHandler, ShowStockHandler};
use crate::handler::{HandlerContext, IntentHandler, Responder};

/// Shown to the operator when a handler fails unexpectedly.
pub const FAILURE_MESSAGE: &str = "A apărut o eroare la procesarea cererii. Încercați din nou.";

/// Exact-match intent → handler table with a fallback.
pub struct HandlerRegistry {
    handlers: HashMap<Intent, Arc<dyn IntentHandler>>,
    fallback: Arc<dyn IntentHandler>,
}

impl HandlerRegistry {
    /// Empty registry; every intent goes to `fallback`.
    pub fn new(fallback: Arc<dyn IntentHandler>) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback,
        }
    }

    /// Registry with a handler for every known intent.
    pub fn with_defaults(store: Arc<dyn HotelStore>) -> Self {
        let mut registry = Self::new(Arc::new(FallbackHandler));
        registry.register(Arc::new(ReservationHandler::new(store.clone())));
        registry.register(Arc::new(ModifyReservationHandler::new(store.clone())));
        registry.register(Arc::new(CancelReservationHandler::new(store.clone())));
        registry.register(Arc::new(CheckAvailabilityHandler));
        registry.register(Arc::new(ShowCalendarHandler));
        registry.register(Arc::new(RoomProblemHandler::new(store.clone())));
        registry.register(Arc::new(CreateInvoiceHandler));
        registry.register(Arc::new(ShowInvoicesHandler));
        registry.register(Arc::new(AddStockHandler::new(store.clone())));
        registry.register(Arc::new(SellProductHandler::new(store)));
        registry.register(Arc::new(ShowStockHandler));
        registry.register(Arc::new(OpenPosHandler));
        registry.register(Arc::new(ShowReportsHandler));
        registry.register(Arc::new(HelpHandler));
        registry.register(Arc::new(GreetingHandler));
        registry
    }

    /// Register `handler` under its own intent, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn IntentHandler>) {
        self.handlers.insert(handler.intent(), handler);
    }

    pub fn get(&self, intent: Intent) -> Arc<dyn IntentHandler> {
        self.handlers
            .get(&intent)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn is_registered(&self, intent: Intent) -> bool {
        self.handlers.contains_key(&intent)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler for `ctx.intent` and return exactly one directive.
    ///
    /// The handler runs in its own task so a panic is contained. Handlers
    /// answer rejected requests themselves; an `Err`, a panic or a missing
    /// response becomes an error directive with [`FAILURE_MESSAGE`].
    pub async fn dispatch(&self, ctx: HandlerContext) -> Directive {
        let intent = ctx.intent;
        let handler = self.get(intent);
        let (responder, rx) = Responder::channel();

        let joined = tokio::spawn(async move { handler.handle(ctx, responder).await }).await;
        let outcome = match joined {
            Ok(result) => result,
            Err(join_err) => Err(ActionError::HandlerPanicked(join_err.to_string())),
        };

        let result = match outcome {
            Ok(()) => rx.await.map_err(|_| ActionError::NoResponse(intent)),
            Err(e) => Err(e),
        };

        match result {
            Ok(directive) => {
                debug!(intent = %intent, kind = ?directive.kind, "Directive produced");
                directive
            }
            Err(e) => {
                match &e {
                    ActionError::Storage(_) => {
                        warn!(intent = %intent, error = %e, "Handler storage failure")
                    }
                    _ => error!(intent = %intent, error = %e, "Handler failed"),
                }
                directive::error(intent, FAILURE_MESSAGE)
            }
        }
    }
}
