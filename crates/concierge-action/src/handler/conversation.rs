//! Help, greetings and the fallback for anything not understood.

use async_trait::async_trait;

use concierge_core::types::{Directive, DirectiveType, Intent};

use super::{HandlerContext, IntentHandler, Responder};
use crate::directive::DirectiveBuilder;
use crate::error::ActionError;

const HELP_MESSAGE: &str = "Pot crea, modifica și anula rezervări, verifica disponibilitatea, \
                            raporta probleme în camere, gestiona stocul și vânzările, \
                            emite facturi și deschide rapoartele. Încercați unul dintre exemple.";
const GREETING_MESSAGE: &str = "Bună! Cu ce vă pot ajuta?";
const REPHRASE_MESSAGE: &str = "Nu am înțeles cererea. Puteți reformula?";

fn chat_with_suggestions(intent: Intent, message: &str) -> Directive {
    DirectiveBuilder::new(intent, DirectiveType::Chat)
        .message(message)
        .suggestions()
        .build()
}

pub struct HelpHandler;

#[async_trait]
impl IntentHandler for HelpHandler {
    fn intent(&self) -> Intent {
        Intent::Help
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        responder.respond(chat_with_suggestions(ctx.intent, HELP_MESSAGE));
        Ok(())
    }
}

pub struct GreetingHandler;

#[async_trait]
impl IntentHandler for GreetingHandler {
    fn intent(&self) -> Intent {
        Intent::Greeting
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        responder.respond(chat_with_suggestions(ctx.intent, GREETING_MESSAGE));
        Ok(())
    }
}

/// Answers `Unknown` and any intent without a registered handler.
pub struct FallbackHandler;

#[async_trait]
impl IntentHandler for FallbackHandler {
    fn intent(&self) -> Intent {
        Intent::Unknown
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        responder.respond(chat_with_suggestions(ctx.intent, REPHRASE_MESSAGE));
        Ok(())
    }
}
