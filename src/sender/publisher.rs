use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

use super::TransportError;
use crate::port::Publisher;

/// Adapts an async closure `(topic, body) -> Result<(), TransportError>`.
pub struct FnPublisher<F> {
    func: F,
}

impl<F, Fut> FnPublisher<F>
where
    F: Fn(String, Bytes) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), TransportError>> + Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Publisher for FnPublisher<F>
where
    F: Fn(String, Bytes) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), TransportError>> + Send + 'static,
{
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        body: Bytes,
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        (self.func)(topic.to_string(), body).boxed()
    }
}

/// Publishes the same body to every publisher in order and fails on the
/// first error; later publishers are not tried.
pub struct FanoutPublisher {
    publishers: Vec<Arc<dyn Publisher>>,
}

impl FanoutPublisher {
    pub fn new(publishers: Vec<Arc<dyn Publisher>>) -> Self {
        Self { publishers }
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}

impl Publisher for FanoutPublisher {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        body: Bytes,
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            if self.publishers.is_empty() {
                return Err(TransportError::NoPublishers);
            }
            for publisher in &self.publishers {
                publisher.publish(topic, body.clone()).await?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recording(
        name: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    ) -> Arc<dyn Publisher> {
        Arc::new(FnPublisher::new(move |topic, _body| {
            calls.lock().push(format!("{name}:{topic}"));
            async move {
                if fail {
                    Err(TransportError::Failed(format!("{name} is down")))
                } else {
                    Ok(())
                }
            }
        }))
    }

    #[tokio::test]
    async fn test_fn_publisher_receives_topic_and_body() {
        let seen = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let publisher = FnPublisher::new(move |topic, body| {
            *captured.lock() = Some((topic, body));
            async { Ok(()) }
        });

        publisher
            .publish("log", Bytes::from_static(b"payload"))
            .await
            .unwrap();

        let (topic, body) = seen.lock().clone().unwrap();
        assert_eq!(topic, "log");
        assert_eq!(&body[..], b"payload");
    }

    #[tokio::test]
    async fn test_fanout_is_fail_fast() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let fanout = FanoutPublisher::new(vec![
            recording("a", calls.clone(), false),
            recording("b", calls.clone(), true),
            recording("c", calls.clone(), false),
        ]);

        let err = fanout.publish("log", Bytes::new()).await.unwrap_err();
        assert!(matches!(err, TransportError::Failed(ref msg) if msg == "b is down"));
        assert_eq!(*calls.lock(), vec!["a:log", "b:log"]);
    }

    #[tokio::test]
    async fn test_fanout_reaches_every_publisher() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let fanout = FanoutPublisher::new(vec![
            recording("a", calls.clone(), false),
            recording("b", calls.clone(), false),
        ]);

        fanout.publish("log", Bytes::new()).await.unwrap();
        assert_eq!(calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_fanout_is_an_error() {
        let fanout = FanoutPublisher::new(Vec::new());
        assert!(matches!(
            fanout.publish("log", Bytes::new()).await,
            Err(TransportError::NoPublishers)
        ));
    }
}
