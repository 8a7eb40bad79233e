use {
    async_std::stream::Stream,
    core::{
        pin::Pin,
        task::{Context, Poll, Waker},
    },
    parking_lot::Mutex,
    std::sync::Arc,
};

                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                Event Sink
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/

/// Where a view's events are handed off to another execution context.
///
/// A sink must deliver every posted message at least once, in posting order.
pub trait EventSink<M>: Send + Sync {
    fn post(&self, msg: M);
}

/// Sink that runs a closure synchronously on the posting thread.
pub struct FnSink<F>(pub F);

impl<M, F> EventSink<M> for FnSink<F>
where
    F: Fn(M) + Send + Sync,
{
    fn post(&self, msg: M) {
        (self.0)(msg);
    }
}

                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
               Queue Channel
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/
struct ChannelState<M> {
    send_buf: Option<Vec<M>>,
    recv_iter: Option<std::vec::IntoIter<M>>,
    num_senders: usize,
    waker: Option<Waker>,
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

pub struct ChannelSender<M>(Arc<Mutex<ChannelState<M>>>);
pub struct ChannelReceiver<M>(Arc<Mutex<ChannelState<M>>>);

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

impl<M> ChannelSender<M> {
    pub fn send(&self, msg: M) {
        let mut state = self.0.lock();
        state.send_buf.get_or_insert_with(Vec::new).push(msg);

        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }
}

impl<M: Send> EventSink<M> for ChannelSender<M> {
    fn post(&self, msg: M) {
        self.send(msg);
    }
}

impl<M> Clone for ChannelSender<M> {
    fn clone(&self) -> Self {
        self.0.lock().num_senders += 1;
        ChannelSender(self.0.clone())
    }
}

impl<M> Drop for ChannelSender<M> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.num_senders -= 1;
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

impl<M> ChannelReceiver<M> {
    pub async fn recv(&self) -> Option<Vec<M>> {
        ChannelRead(self.0.clone()).await
    }

    /// Takes everything sent since the last call, oldest first.
    pub fn try_recv(&self) -> Option<Vec<M>> {
        take_pending(&mut self.0.lock())
    }
}

/// Drains messages left behind by the stream before newer ones.
fn take_pending<M>(state: &mut ChannelState<M>) -> Option<Vec<M>> {
    let mut pending: Vec<M> = state.recv_iter.take().map(|it| it.collect()).unwrap_or_default();
    if let Some(buf) = state.send_buf.take() {
        pending.extend(buf);
    }

    if pending.is_empty() {
        None
    } else {
        Some(pending)
    }
}

struct ChannelRead<M>(Arc<Mutex<ChannelState<M>>>);

impl<M> std::future::Future for ChannelRead<M> {
    type Output = Option<Vec<M>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.0.lock();
        if let Some(pending) = take_pending(&mut state) {
            Poll::Ready(Some(pending))
        } else if state.num_senders == 0 {
            Poll::Ready(None)
        } else {
            state.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

impl<M> Stream for ChannelReceiver<M> {
    type Item = M;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut state = self.0.lock();

        if let Some(recv_iter) = state.recv_iter.as_mut() {
            if let Some(val) = recv_iter.next() {
                return Poll::Ready(Some(val));
            } else {
                state.recv_iter = None
            }
        }

        if let Some(send_buf) = state.send_buf.take() {
            let mut recv_iter = send_buf.into_iter();
            let next = recv_iter.next();
            state.recv_iter = Some(recv_iter);
            Poll::Ready(next)
        } else if state.num_senders == 0 {
            Poll::Ready(None)
        } else {
            state.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

/*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
             Factory Functions
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/
pub fn queue_channel<M>() -> (ChannelSender<M>, ChannelReceiver<M>) {
    let state = Arc::new(Mutex::new(ChannelState {
        send_buf: None,
        recv_iter: None,
        num_senders: 1,
        waker: None,
    }));

    (ChannelSender(state.clone()), ChannelReceiver(state))
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
