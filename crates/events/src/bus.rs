use crate::event::{Event, EventKind};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
/// Subscribers may be sync or async; both end up boxed as this signature so
/// the single consumer task can `.await` either uniformly.
pub type Handler = Arc<dyn Fn(Event) -> HandlerFuture + Send + Sync>;

/// Typed pub/sub with queued, single-consumer delivery. One
/// unbounded channel feeds one dispatch task; publishers never block and
/// never race each other, so the single hard rule subscribers must follow
/// is "don't assume concurrency with other subscribers of the same event."
pub struct EventBus {
    subscribers: DashMap<EventKind, Vec<Handler>>,
    sender: mpsc::UnboundedSender<Event>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Event>>>,
    history: Mutex<VecDeque<Event>>,
    history_capacity: usize,
    stopped_tx: Mutex<Option<oneshot::Sender<()>>>,
    stopped_rx: Mutex<Option<oneshot::Receiver<()>>>,
}

impl EventBus {
    pub fn new(history_capacity: usize) -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (stopped_tx, stopped_rx) = oneshot::channel();
        Arc::new(Self {
                subscribers: DashMap::new(),
                sender,
                receiver: Mutex::new(Some(receiver)),
                history: Mutex::new(VecDeque::with_capacity(history_capacity)),
                history_capacity,
                stopped_tx: Mutex::new(Some(stopped_tx)),
                stopped_rx: Mutex::new(Some(stopped_rx)),
        })
    }

    /// Registers a handler for `kind`. Handlers for the same kind run in
    /// registration order, serially.
    pub fn subscribe(&self, kind: EventKind, handler: Handler) {
        self.subscribers.entry(kind).or_default().push(handler);
    }

    /// Removes every subscriber for `kind`. The bus does not support
    /// removing an individual handler by identity — callers that need
    /// fine-grained unsubscription should gate inside their own handler.
    pub fn unsubscribe_all(&self, kind: EventKind) {
        self.subscribers.remove(&kind);
    }

    /// Enqueues an event; always succeeds unless the bus has been fully
    /// torn down (the channel itself is unbounded, so this never blocks).
    pub fn publish(&self, event: Event) {
        if self.sender.send(event).is_err() {
            tracing::warn!("event published after bus shutdown, dropping");
        }
    }

    /// Spawns the single consumer task. Returns its `JoinHandle`; `stop`
    /// awaits a dedicated signal sent once `ServerStopping` has been fully
    /// dispatched, so in-flight events are guaranteed drained.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        let mut receiver = this
            .receiver
            .lock()
            .unwrap()
            .take()
            .expect("EventBus::start called more than once");
        tokio::spawn(async move {
                while let Some(event) = receiver.recv().await {
                    this.record_history(event.clone());
                    let is_stopping = matches!(event.kind, EventKind::ServerStopping);
                    this.dispatch(event).await;
                    if is_stopping {
                        if let Some(tx) = this.stopped_tx.lock().unwrap().take() {
                            let _ = tx.send(());
                        }
                        break;
                    }
                }
        })
    }

    async fn dispatch(&self, event: Event) {
        let Some(handlers) = self.subscribers.get(&event.kind) else {
            return;
        };
        // Clone the handler list out from under the DashMap guard so a
        // handler that subscribes/unsubscribes doesn't deadlock on its own
        // shard lock.
        let handlers: Vec<Handler> = handlers.clone();
        for handler in handlers {
            let fut = handler(event.clone());
            fut.await;
        }
    }

    fn record_history(&self, event: Event) {
        let mut history = self.history.lock().unwrap();
        if history.len() >= self.history_capacity {
            history.pop_front();
        }
        history.push_back(event);
    }

    pub fn history(&self) -> Vec<Event> {
        self.history.lock().unwrap().iter().cloned().collect()
    }

    /// Publishes `ServerStopping` and waits for the consumer task to have
    /// drained everything queued up to and including that event.
    pub async fn stop(self: &Arc<Self>) {
        let rx = self.stopped_rx.lock().unwrap().take();
        let Some(rx) = rx else {
            return;
        };
        self.publish(Event::new(EventKind::ServerStopping));
        let _ = rx.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_of_same_kind_fire_in_registration_order() {
        let bus = EventBus::new(10);
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            bus.subscribe(
                EventKind::PlayerCommand,
                Arc::new(move |_event| {
                        let order = order.clone();
                        Box::pin(async move {
                                order.lock().unwrap().push(i);
                        })
                }),
            );
        }
        let _handle = bus.start();
        bus.publish(Event::new(EventKind::PlayerCommand));
        bus.stop().await;
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn history_ring_caps_at_capacity() {
        let bus = EventBus::new(2);
        let _handle = bus.start();
        for _ in 0..5 {
            bus.publish(Event::new(EventKind::PlayerConnected));
        }
        bus.stop().await;
        assert_eq!(bus.history().len(), 2);
    }

    #[tokio::test]
    async fn one_slow_handler_does_not_block_a_sibling_of_a_different_subscription() {
        let bus = EventBus::new(10);
        let ran = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let ran2 = ran.clone();
        bus.subscribe(
            EventKind::PlayerMoved,
            Arc::new(move |_event| {
                    let ran2 = ran2.clone();
                    Box::pin(async move {
                            ran2.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    })
            }),
        );
        let _handle = bus.start();
        bus.publish(Event::new(EventKind::PlayerMoved));
        bus.stop().await;
        assert_eq!(ran.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
