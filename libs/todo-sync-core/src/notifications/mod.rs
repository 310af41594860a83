//! User-facing notification queue
//!
//! [`NotificationCenter`] owns a bounded, ordered queue of notifications with
//! per-entry expiry timers and suppression of repeated error messages.
//! [`classify_failure`] turns any failure into the message/title pair shown
//! to the user.

mod center;
mod classify;

pub use center::{NewNotification, Notification, NotificationCenter, NotificationId, NotificationType};
pub use classify::{classify_failure, ErrorNotice, Failure};
