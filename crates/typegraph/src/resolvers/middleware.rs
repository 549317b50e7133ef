//! Interceptors wrapped around handler and field resolution.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use super::{HandlerResult, ResolverData};

/// Interceptor running around a field resolution.
///
/// A middleware either short-circuits with its own result or awaits
/// [`Next::run`] to continue with the rest of the chain.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn resolve(&self, data: &ResolverData, next: Next<'_>) -> HandlerResult;

    /// Name used when the middleware is logged.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl fmt::Debug for dyn Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Middleware({})", self.name())
    }
}

pub(crate) type Endpoint<'a> = dyn Fn() -> BoxFuture<'a, HandlerResult> + Send + Sync + 'a;

/// Continuation handed to a [`Middleware`].
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    data: &'a ResolverData,
    endpoint: &'a Endpoint<'a>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        chain: &'a [Arc<dyn Middleware>],
        data: &'a ResolverData,
        endpoint: &'a Endpoint<'a>,
    ) -> Self {
        Self {
            chain,
            data,
            endpoint,
        }
    }

    /// Runs the remaining middlewares, then the resolver itself.
    pub async fn run(self) -> HandlerResult {
        match self.chain.split_first() {
            Some((middleware, rest)) => {
                middleware
                    .resolve(self.data, Next::new(rest, self.data, self.endpoint))
                    .await
            }
            None => (self.endpoint)().await,
        }
    }
}

/// Flattens per-member middleware records into a single chain.
///
/// Each record contributes its own ordered list; later records are placed in
/// front of the lists flattened before them.
pub(crate) fn flatten_middlewares<'a, I>(records: I) -> Vec<Arc<dyn Middleware>>
where
    I: IntoIterator<Item = &'a [Arc<dyn Middleware>]>,
{
    records.into_iter().fold(Vec::new(), |acc, current| {
        let mut flattened = current.to_vec();
        flattened.extend(acc);
        flattened
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::{ResolveInfo, ResolvedValue};
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Middleware for Recorder {
        async fn resolve(&self, _data: &ResolverData, next: Next<'_>) -> HandlerResult {
            self.log
                .lock()
                .expect("log lock")
                .push(format!("before {}", self.label));
            let result = next.run().await;
            self.log
                .lock()
                .expect("log lock")
                .push(format!("after {}", self.label));
            result
        }
    }

    struct ShortCircuit;

    #[async_trait]
    impl Middleware for ShortCircuit {
        async fn resolve(&self, _data: &ResolverData, _next: Next<'_>) -> HandlerResult {
            Ok(ResolvedValue::from("intercepted"))
        }
    }

    fn data() -> ResolverData {
        ResolverData {
            root: ResolvedValue::Null,
            args: Default::default(),
            context: None,
            info: ResolveInfo {
                field_name: "books".into(),
                parent_type: "Query".into(),
                return_type: "String!".into(),
            },
        }
    }

    fn recorder(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Middleware> {
        Arc::new(Recorder {
            label,
            log: Arc::clone(log),
        })
    }

    #[tokio::test]
    async fn test_chain_runs_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = vec![recorder("a", &log), recorder("b", &log)];
        let data = data();
        let endpoint_log = Arc::clone(&log);
        let endpoint = move || {
            let log = Arc::clone(&endpoint_log);
            let future: BoxFuture<'_, HandlerResult> = Box::pin(async move {
                log.lock().expect("log lock").push("handler".into());
                Ok(ResolvedValue::from("done"))
            });
            future
        };

        let result = Next::new(&chain, &data, &endpoint).run().await;
        assert_eq!(result.ok(), Some(ResolvedValue::from("done")));
        assert_eq!(
            *log.lock().expect("log lock"),
            vec!["before a", "before b", "handler", "after b", "after a"]
        );
    }

    #[tokio::test]
    async fn test_middleware_can_short_circuit() {
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(ShortCircuit)];
        let data = data();
        let endpoint = || {
            let future: BoxFuture<'_, HandlerResult> =
                Box::pin(async { Err(async_graphql::Error::new("handler must not run")) });
            future
        };

        let result = Next::new(&chain, &data, &endpoint).run().await;
        assert_eq!(result.ok(), Some(ResolvedValue::from("intercepted")));
    }

    #[test]
    fn test_flatten_places_later_records_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a1 = recorder("a1", &log);
        let a2 = recorder("a2", &log);
        let b1 = recorder("b1", &log);
        let first = vec![Arc::clone(&a1), Arc::clone(&a2)];
        let second = vec![Arc::clone(&b1)];

        let flattened = flatten_middlewares([first.as_slice(), second.as_slice()]);
        let expected = [b1, a1, a2];
        assert_eq!(flattened.len(), expected.len());
        for (actual, expected) in flattened.iter().zip(expected.iter()) {
            assert!(Arc::ptr_eq(actual, expected));
        }
    }
}
