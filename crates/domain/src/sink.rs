use std::sync::mpsc::Sender;

use tracing::debug;

/// Destination for results a filter produces while it runs.
///
/// Sinks are owned by the filter that feeds them and are dropped with it.
pub trait Sink<T>: Send {
    fn deliver(&self, item: T);
}

impl<T, F> Sink<T> for F
where
    F: Fn(T) + Send,
{
    fn deliver(&self, item: T) {
        self(item)
    }
}

/// Forwards results into an `mpsc` channel. A hung-up receiver is not an
/// error; the item is dropped.
pub struct ChannelSink<T> {
    sender: Sender<T>,
}

impl<T> ChannelSink<T> {
    pub fn new(sender: Sender<T>) -> Self {
        Self { sender }
    }
}

impl<T: Send> Sink<T> for ChannelSink<T> {
    fn deliver(&self, item: T) {
        if self.sender.send(item).is_err() {
            debug!("sink receiver disconnected, dropping result");
        }
    }
}

pub type BoxSink<T> = Box<dyn Sink<T>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    #[test]
    fn closure_sink_receives_items() {
        let seen = Arc::new(Mutex::new(Vec::<u32>::new()));
        let inner = seen.clone();
        let sink: BoxSink<u32> = Box::new(move |item: u32| inner.lock().unwrap().push(item));
        sink.deliver(3);
        sink.deliver(4);
        assert_eq!(*seen.lock().unwrap(), vec![3, 4]);
    }

    #[test]
    fn channel_sink_tolerates_dropped_receiver() {
        let (tx, rx) = mpsc::channel::<String>();
        let sink = ChannelSink::new(tx);
        sink.deliver("first".to_string());
        assert_eq!(rx.recv().unwrap(), "first");
        drop(rx);
        sink.deliver("second".to_string());
    }
}
