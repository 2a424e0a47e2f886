//! `AntiBruteForce` tonic service implementation: a thin adapter over
//! `abf_guard::Guard`, the direct analogue of `internal/api/service.go`'s
//! `Service` wrapping `app.App`.

use std::sync::Arc;

use abf_core::error::{AbfError, ClientCode};
use abf_guard::Guard;
use tonic::{Request, Response, Status};
use tracing::{error, warn};

use crate::pb::anti_brute_force_server::AntiBruteForce;
use crate::pb::{AuthRequest, AuthResponse, Empty, NetworkRequest, ResetRequest, ResetResponse};

pub struct AbfService {
    guard: Arc<Guard>,
}

impl AbfService {
    pub fn new(guard: Arc<Guard>) -> Self {
        Self { guard }
    }
}

/// Log full detail server-side, then cross the wire with only the
/// abstracted message + code — the direct port of
/// `s.log.Error(err.Error())` followed by `status.Errorf(...)`.
fn to_status(err: AbfError) -> Status {
    match err.client_code() {
        ClientCode::InvalidArgument => {
            warn!(error = %err, "rejecting request: invalid argument");
            Status::invalid_argument(err.to_string())
        }
        ClientCode::Overlap => {
            warn!(error = %err, "rejecting request: overlap");
            Status::invalid_argument(err.to_string())
        }
        ClientCode::Internal => {
            error!(error = %err, "internal error");
            Status::internal("internal error")
        }
    }
}

#[tonic::async_trait]
impl AntiBruteForce for AbfService {
    async fn auth(&self, request: Request<AuthRequest>) -> Result<Response<AuthResponse>, Status> {
        let req = request.into_inner();
        let verdict = self
            .guard
            .auth(&req.login, &req.password, &req.ip)
            .await
            .map_err(to_status)?;
        Ok(Response::new(AuthResponse { ok: verdict.ok() }))
    }

    async fn reset(
        &self,
        request: Request<ResetRequest>,
    ) -> Result<Response<ResetResponse>, Status> {
        let req = request.into_inner();
        self.guard
            .reset(&req.login, &req.password, &req.ip)
            .map_err(to_status)?;
        Ok(Response::new(ResetResponse {}))
    }

    async fn add_to_allow_list(
        &self,
        request: Request<NetworkRequest>,
    ) -> Result<Response<Empty>, Status> {
        self.guard
            .add_allow(&request.into_inner().network)
            .await
            .map_err(to_status)?;
        Ok(Response::new(Empty {}))
    }

    async fn add_to_deny_list(
        &self,
        request: Request<NetworkRequest>,
    ) -> Result<Response<Empty>, Status> {
        self.guard
            .add_deny(&request.into_inner().network)
            .await
            .map_err(to_status)?;
        Ok(Response::new(Empty {}))
    }

    async fn remove_from_allow_list(
        &self,
        request: Request<NetworkRequest>,
    ) -> Result<Response<Empty>, Status> {
        self.guard
            .remove_allow(&request.into_inner().network)
            .await
            .map_err(to_status)?;
        Ok(Response::new(Empty {}))
    }

    async fn remove_from_deny_list(
        &self,
        request: Request<NetworkRequest>,
    ) -> Result<Response<Empty>, Status> {
        self.guard
            .remove_deny(&request.into_inner().network)
            .await
            .map_err(to_status)?;
        Ok(Response::new(Empty {}))
    }
}
