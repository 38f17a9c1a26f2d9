/// HTTP middleware for youtube-upload-service
///
/// [`RequireSession`] guards every route that needs a signed-in user. It
/// resolves the session cookie against the [`SessionStore`], and either puts
/// the session into request extensions or redirects the browser to the
/// login page.
///
/// [`SessionStore`]: crate::session::SessionStore
use actix_web::body::BoxBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::LOCATION;
use actix_web::{error::ErrorUnauthorized, web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::app_state::AppState;
use crate::session::Session;

pub const LOGIN_PATH: &str = "/giris";

/// Session of the signed-in user, available to handlers behind [`RequireSession`].
#[derive(Debug, Clone)]
pub struct AuthenticatedSession(pub Session);

pub struct RequireSession;

impl<S, B> Transform<S, ServiceRequest> for RequireSession
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireSessionService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireSessionService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireSessionService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireSessionService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        let session = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.sessions.load_from_request(req.request()))
            .filter(Session::is_authenticated);

        Box::pin(async move {
            match session {
                Some(session) => {
                    req.extensions_mut().insert(AuthenticatedSession(session));
                    let res = service.call(req).await?;
                    Ok(res.map_into_boxed_body())
                }
                None => {
                    tracing::debug!(path = %req.path(), "no authenticated session; redirecting to login");
                    let response = HttpResponse::SeeOther()
                        .insert_header((LOCATION, LOGIN_PATH))
                        .finish();
                    Ok(req.into_response(response))
                }
            }
        })
    }
}

impl FromRequest for AuthenticatedSession {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedSession>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Oturum bulunamadı")),
        )
    }
}
