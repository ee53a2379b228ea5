//! Notification fanout.
//!
//! The dispatcher resolves every registered device token and hands one
//! multicast batch per cycle to the push transport. The transport and
//! registry implementations live alongside it.
pub mod dispatcher;
pub mod fcm;
pub mod registry;

pub use dispatcher::{MessageTemplate, NotificationDispatcher};
pub use fcm::FcmClient;
pub use registry::{FirestoreTokenRegistry, StaticTokenRegistry};
