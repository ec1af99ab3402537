//! One source stream, two independently paced readers.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::{Future, Stream, StreamExt};
use log::debug;

/// One reader of a fanned-out stream.
pub struct Branch<T> {
	rx: UnboundedReceiver<T>,
}

impl<T> Stream for Branch<T> {
	type Item = T;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
		self.rx.poll_next_unpin(cx)
	}
}

/// Splits `source` into two branches plus the pump future that drives them.
///
/// The pump forwards every item to both branches through unbounded buffers,
/// so a slow reader never holds back the other. It keeps reading until the
/// source ends or both branches have been dropped, then drops the source.
pub fn fan_out<S, T>(source: S) -> (Branch<T>, Branch<T>, impl Future<Output = ()>)
where
	S: Stream<Item = T> + Unpin,
	T: Clone,
{
	let (left_tx, left_rx) = mpsc::unbounded();
	let (right_tx, right_rx) = mpsc::unbounded();

	let pump = async move {
		let mut source = source;
		let (mut left, mut right) = (Some(left_tx), Some(right_tx));
		let mut forwarded = 0usize;
		while left.is_some() || right.is_some() {
			let Some(item) = source.next().await else {
				break;
			};
			forward(&mut left, item.clone());
			forward(&mut right, item);
			forwarded += 1;
		}
		debug!("fan-out finished after {forwarded} chunks");
	};

	(Branch { rx: left_rx }, Branch { rx: right_rx }, pump)
}

fn forward<T>(slot: &mut Option<UnboundedSender<T>>, item: T) {
	if let Some(tx) = slot {
		if tx.unbounded_send(item).is_err() {
			*slot = None;
		}
	}
}
