use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};

struct RawContext {
	// Dropped together with the last clone of the context, which is what
	// `Handler::cancel` waits for.
	_alive: oneshot::Sender<()>,
	cancel_receiver: broadcast::Receiver<()>,
}

/// A cloneable cancellation token. Long running tasks hold a clone and stop
/// when [`Context::done`] resolves.
#[derive(Clone)]
pub struct Context(Arc<RawContext>);

/// The owning side of a [`Context`].
pub struct Handler {
	alive: oneshot::Receiver<()>,
	cancel_sender: broadcast::Sender<()>,
}

impl Context {
	#[must_use]
	pub fn new() -> (Self, Handler) {
		let (alive_sender, alive) = oneshot::channel();
		let (cancel_sender, cancel_receiver) = broadcast::channel(1);

		(
			Self(Arc::new(RawContext {
				_alive: alive_sender,
				cancel_receiver,
			})),
			Handler { alive, cancel_sender },
		)
	}

	/// Resolves once the handler has been cancelled or dropped.
	pub async fn done(&self) {
		let mut recv = self.0.cancel_receiver.resubscribe();
		let _ = recv.recv().await;
	}
}

impl Handler {
	/// Waits until every clone of the context has been dropped, without
	/// cancelling it.
	pub async fn done(&mut self) {
		let _ = (&mut self.alive).await;
	}

	/// Cancels the context and waits for every clone to be dropped.
	pub async fn cancel(self) {
		drop(self.cancel_sender);

		let _ = self.alive.await;
	}
}
