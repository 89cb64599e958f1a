//! Capabilities the engine consumes from the outside world.
//!
//! Both traits are object safe; the engine stores them as `Arc<dyn ...>` in the
//! shared [`Context`](crate::context::Context).
use anyhow::Result;
use async_trait::async_trait;
use cadence_behavior::BehaviorProfile;

/// Drives the remote document being worked through.
///
/// Ordinary failures are reported as `Ok(false)`. `Err` is reserved for
/// failures the implementation cannot classify (a dead session, a missing page).
#[async_trait]
pub trait Automation: Send + Sync {
    /// Wait until the next item is on screen.
    async fn wait_for_item(&self) -> Result<bool>;

    /// Whether the current item qualifies for deeper engagement.
    async fn evaluate_item(&self) -> Result<bool>;

    async fn act_positive(&self) -> Result<bool>;

    async fn act_negative(&self) -> Result<bool>;

    /// Browse the item's detail views, paced by `profile` when present.
    async fn view_detail(&self, profile: Option<&BehaviorProfile>) -> Result<bool>;

    /// Incidental pointer movement, paced by `profile` when present.
    async fn move_pointer(&self, profile: Option<&BehaviorProfile>) -> Result<bool>;

    /// Close any overlay covering the item.
    async fn dismiss_obstruction(&self) -> Result<bool>;

    async fn cleanup(&self) -> Result<()>;
}

/// Polled cancellation source.
pub trait CancellationSignal: Send + Sync {
    fn is_cancelled(&self) -> bool;

    fn cleanup(&self) -> Result<()>;
}
