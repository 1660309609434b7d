//! Rate limiting middleware.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{self, HeaderName, HeaderValue},
};
use blogify_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use blogify_core::ports::RateLimiter;

use crate::observability::RequestId;

/// Requests left in the current window, sent on every throttled route.
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Rate limiting middleware factory, keyed by client IP.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = self.limiter.clone();

        let key = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        Box::pin(async move {
            let result = match limiter.check(&key).await {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::error!(error = %e, "Rate limiter error, failing open");
                    None
                }
            };

            if let Some(result) = result.filter(|result| !result.allowed) {
                let retry_after = result.retry_after_secs();
                tracing::warn!(
                    client = %key,
                    path = %req.path(),
                    retry_after,
                    "Auth request throttled"
                );

                let mut error = ErrorResponse::too_many_requests(retry_after)
                    .with_instance(req.path().to_string());
                if let Some(request_id) = RequestId::of(&req) {
                    error = error.with_request_id(request_id);
                }
                let response = HttpResponse::TooManyRequests()
                    .insert_header((REMAINING_HEADER, "0"))
                    .insert_header((header::RETRY_AFTER, retry_after.to_string()))
                    .json(error);
                return Ok(req.into_response(response).map_into_right_body());
            }

            let mut res = service.call(req).await?;
            if let Some(result) = result {
                res.headers_mut().insert(
                    HeaderName::from_static(REMAINING_HEADER),
                    HeaderValue::from(result.remaining),
                );
            }
            Ok(res.map_into_left_body())
        })
    }
}
