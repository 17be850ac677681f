//! Tower middleware that instruments every call of a wrapped service.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use serde_json::Value;
use tower::{Layer, Service};

use crate::instrument::instrumenter::{CallSite, Instrumenter};

type ArgExtractor<Req> = Arc<dyn Fn(&Req) -> Vec<Value> + Send + Sync>;

/// Layer producing [`InstrumentService`].
///
/// ```ignore
/// let svc = ServiceBuilder::new()
///     .layer(InstrumentLayer::new(instrumenter, CallSite::new("createUser"))
///         .with_arguments(|req: &CreateUser| vec![json!(req.user_name)]))
///     .service(create_user);
/// ```
pub struct InstrumentLayer<Req> {
    instrumenter: Instrumenter,
    site: CallSite,
    extract: Option<ArgExtractor<Req>>,
}

impl<Req> InstrumentLayer<Req> {
    pub fn new(instrumenter: Instrumenter, site: CallSite) -> Self {
        Self {
            instrumenter,
            site,
            extract: None,
        }
    }

    /// Capture arguments from each request.
    pub fn with_arguments<F>(mut self, extract: F) -> Self
    where
        F: Fn(&Req) -> Vec<Value> + Send + Sync + 'static,
    {
        self.extract = Some(Arc::new(extract));
        self
    }
}

impl<Req> Clone for InstrumentLayer<Req> {
    fn clone(&self) -> Self {
        Self {
            instrumenter: self.instrumenter.clone(),
            site: self.site.clone(),
            extract: self.extract.clone(),
        }
    }
}

impl<S, Req> Layer<S> for InstrumentLayer<Req> {
    type Service = InstrumentService<S, Req>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentService {
            inner,
            instrumenter: self.instrumenter.clone(),
            site: self.site.clone(),
            extract: self.extract.clone(),
            _request: PhantomData,
        }
    }
}

/// Service wrapper recording one invocation per call.
pub struct InstrumentService<S, Req> {
    inner: S,
    instrumenter: Instrumenter,
    site: CallSite,
    extract: Option<ArgExtractor<Req>>,
    _request: PhantomData<fn(Req)>,
}

impl<S: Clone, Req> Clone for InstrumentService<S, Req> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            instrumenter: self.instrumenter.clone(),
            site: self.site.clone(),
            extract: self.extract.clone(),
            _request: PhantomData,
        }
    }
}

impl<S, Req> Service<Req> for InstrumentService<S, Req>
where
    S: Service<Req>,
    S::Future: Send + 'static,
    S::Response: fmt::Debug + Send + 'static,
    S::Error: fmt::Display + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let arguments = self
            .extract
            .as_ref()
            .map(|extract| extract(&req))
            .unwrap_or_default();
        let fut = self.inner.call(req);
        let instrumenter = self.instrumenter.clone();
        let site = self.site.clone();

        Box::pin(async move { instrumenter.instrument_async(site, arguments, fut).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Outcome;
    use crate::sink::MemorySink;
    use serde_json::json;
    use tower::{service_fn, ServiceBuilder, ServiceExt};

    #[tokio::test]
    async fn test_layer_records_calls() {
        let sink = MemorySink::new();
        let instrumenter = Instrumenter::with_sink(Arc::new(sink.clone()));

        let layer = InstrumentLayer::new(
            instrumenter,
            CallSite::new("double").log_kind("MATH").operate_kind("COMPUTE"),
        )
        .with_arguments(|req: &i64| vec![json!(req)]);

        let svc = ServiceBuilder::new().layer(layer).service(service_fn(|n: i64| async move {
            if n < 0 {
                Err(format!("negative input {}", n))
            } else {
                Ok(n * 2)
            }
        }));

        assert_eq!(svc.clone().oneshot(21).await, Ok(42));
        assert_eq!(svc.oneshot(-1).await, Err("negative input -1".to_string()));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].arguments, vec![json!(21)]);
        assert_eq!(records[0].log_kind, "MATH");
        assert_eq!(records[1].outcome, Outcome::Failure { error: "negative input -1".into() });
    }
}
