use std::time::Duration;

use tokio::sync::mpsc;

/// A build finished according to some outside observer (an IDE plugin, a CI
/// hook), independent of the filesystem watches.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildCompletion {
    pub name: String,
    pub succeeded: bool,
    pub duration: Duration,
}

/// Optional feed of build completions a [`crate::BuildMonitor`] can consume.
///
/// Implementations forward completions into `tx` from wherever they observe
/// them, for as long as the receiver is alive.
pub trait BuildEventSource: Send {
    fn subscribe(self: Box<Self>, tx: mpsc::UnboundedSender<BuildCompletion>);
}

/// Source backed by a plain channel, for hosts that already push completions
/// through tokio.
pub struct ChannelEventSource {
    rx: mpsc::UnboundedReceiver<BuildCompletion>,
}

impl ChannelEventSource {
    pub fn new() -> (mpsc::UnboundedSender<BuildCompletion>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

impl BuildEventSource for ChannelEventSource {
    fn subscribe(self: Box<Self>, tx: mpsc::UnboundedSender<BuildCompletion>) {
        let mut rx = self.rx;
        tokio::spawn(async move {
            while let Some(completion) = rx.recv().await {
                if tx.send(completion).is_err() {
                    break;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn channel_source_forwards_completions() {
        let (host, source) = ChannelEventSource::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        Box::new(source).subscribe(tx);

        let completion = BuildCompletion {
            name: "App".to_string(),
            succeeded: true,
            duration: Duration::from_secs(42),
        };
        host.send(completion.clone()).expect("send completion");
        assert_eq!(rx.recv().await, Some(completion));

        drop(host);
        assert_eq!(rx.recv().await, None);
    }
}
