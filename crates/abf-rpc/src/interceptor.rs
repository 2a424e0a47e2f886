//! Logging middleware: records peer IP, method, response code and latency
//! per call, the direct analogue of `internal/api/interceptor.go`'s
//! `loggingInterceptor`.

use std::task::{Context, Poll};
use std::time::Instant;

use tonic::body::BoxBody;
use tower::{Layer, Service};
use tracing::info;

#[derive(Clone, Default)]
pub struct LoggingLayer;

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingService { inner }
    }
}

#[derive(Clone)]
pub struct LoggingService<S> {
    inner: S,
}

impl<S> Service<http::Request<BoxBody>> for LoggingService<S>
where
    S: Service<http::Request<BoxBody>, Response = http::Response<BoxBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future =
        std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<BoxBody>) -> Self::Future {
        let method = req.uri().path().to_string();
        let peer_ip = req
            .extensions()
            .get::<tonic::transport::server::TcpConnectInfo>()
            .and_then(|info| info.remote_addr())
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let start = Instant::now();
        let mut inner = self.inner.clone();
        Box::pin(async move {
            let result = inner.call(req).await;
            let elapsed = start.elapsed();
            match &result {
                Ok(resp) => info!(
                    method = %method,
                    peer_ip = %peer_ip,
                    status = resp.status().as_u16(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "rpc handled"
                ),
                Err(_) => info!(
                    method = %method,
                    peer_ip = %peer_ip,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "rpc failed at transport layer"
                ),
            }
            result
        })
    }
}
