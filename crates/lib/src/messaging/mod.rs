//! Background push messaging: provider app context, messaging client, and
//! the inbound payload type.
//!
//! The provider SDK's process-wide messaging singleton is wrapped in an
//! explicitly constructed `App` context; the worker obtains a `Messaging`
//! client from it and registers a single background handler.

mod client;
mod inbound;
mod provider;

pub use client::{BackgroundHandler, Messaging, MessagingError, Subscription};
pub use inbound::InboundMessage;
pub use provider::{App, ProviderError};
