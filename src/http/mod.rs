//! HTTP/1 JSON front end.
//!
//! Every API call is a `POST` with a JSON body; authenticated calls carry
//! `Authorization: Bearer <token>`. Errors come back as `{"detail": "..."}`
//! with the status of the underlying [`ServiceError`].

use std::convert::Infallible;

use anyhow::{Context, Result};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::error::{ServiceError, ServiceResult};
use crate::security::AuthBundle;
use crate::service::WatchService;
use crate::{log_error, log_info, log_warn};

const ENABLE_LOGS: bool = true;

/// Accept connections until the listener fails. Each connection is served
/// on its own task.
pub async fn serve(listener: TcpListener, service: WatchService) -> Result<()> {
    let local = listener.local_addr().context("listener has no local address")?;
    log_info!("Listening on http://{local}");

    loop {
        let (stream, peer) = listener.accept().await.context("failed to accept connection")?;
        let io = TokioIo::new(stream);
        let service = service.clone();

        tokio::spawn(async move {
            let handler = service_fn(move |req: Request<hyper::body::Incoming>| {
                let service = service.clone();
                async move { handle_request(&service, req).await }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, handler).await {
                log_warn!("Connection error from {peer}: {err}");
            }
        });
    }
}

async fn handle_request(
    service: &WatchService,
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if method == Method::GET && path == "/health" {
        return Ok(respond(StatusCode::OK, "text/plain", Bytes::from_static(b"OK")));
    }

    let bearer = bearer_token(&req).map(str::to_string);
    let (status, payload) = match req.into_body().collect().await {
        Ok(collected) => {
            let body = collected.to_bytes();
            dispatch(service, &method, &path, bearer.as_deref(), &body).await
        }
        Err(err) => {
            log_warn!("Failed to read body of {method} {path}: {err}");
            (StatusCode::BAD_REQUEST, json!({ "detail": "unreadable request body" }))
        }
    };

    log_info!("{method} {path} -> {}", status.as_u16());
    Ok(respond(
        status,
        "application/json",
        Bytes::from(payload.to_string()),
    ))
}

fn respond(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn bearer_token<B>(req: &Request<B>) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Route one request and render the outcome as a status plus JSON body.
pub async fn dispatch(
    service: &WatchService,
    method: &Method,
    path: &str,
    bearer: Option<&str>,
    body: &[u8],
) -> (StatusCode, Value) {
    match route(service, method, path, bearer, body).await {
        Ok(value) => (StatusCode::OK, value),
        Err(err) => {
            let status = err.status();
            match &err {
                ServiceError::Internal(cause) => {
                    log_error!("{method} {path} failed: {cause:#}");
                }
                _ => {
                    log_warn!("{method} {path} rejected: {err}");
                }
            }
            (status, json!({ "detail": err.to_string() }))
        }
    }
}

async fn route(
    service: &WatchService,
    method: &Method,
    path: &str,
    bearer: Option<&str>,
    body: &[u8],
) -> ServiceResult<Value> {
    if *method != Method::POST {
        return Err(ServiceError::NotFound("Not Found".into()));
    }

    match path {
        "/register" => return to_json(service.register(parse(body)?).await?),
        "/login" => return to_json(service.login(parse(body)?).await?),
        _ => {}
    }

    if !is_authenticated_route(path) {
        return Err(ServiceError::NotFound("Not Found".into()));
    }
    let auth = authorize(service, bearer).await?;

    match path {
        "/refresh" => to_json(service.refresh(&auth)),
        "/terminate" => to_json(service.terminate(auth).await?),
        "/watch/list" => to_json(service.list_watches(&auth).await?),
        "/watch/info" => to_json(service.watch_info(&auth, parse(body)?).await?),
        "/watch/add" => to_json(service.add_watch(&auth, parse(body)?).await?),
        "/watch/delete" => to_json(service.delete_watch(&auth, parse(body)?).await?),
        "/logs/list" => to_json(service.list_logs(&auth, parse(body)?).await?),
        "/logs/stats" => to_json(service.stats(&auth, parse(body)?).await?),
        "/logs/add" => to_json(service.add_log(&auth, parse(body)?).await?),
        "/logs/delete" => to_json(service.delete_log(&auth, parse(body)?).await?),
        "/cycle/new" => to_json(service.new_cycle(&auth, parse(body)?).await?),
        "/cycle/delete" => to_json(service.delete_cycle(&auth, parse(body)?).await?),
        _ => Err(ServiceError::NotFound("Not Found".into())),
    }
}

const AUTHENTICATED_ROUTES: &[&str] = &[
    "/refresh",
    "/terminate",
    "/watch/list",
    "/watch/info",
    "/watch/add",
    "/watch/delete",
    "/logs/list",
    "/logs/stats",
    "/logs/add",
    "/logs/delete",
    "/cycle/new",
    "/cycle/delete",
];

fn is_authenticated_route(path: &str) -> bool {
    AUTHENTICATED_ROUTES.contains(&path)
}

async fn authorize(service: &WatchService, bearer: Option<&str>) -> ServiceResult<AuthBundle> {
    let token = bearer.ok_or_else(|| ServiceError::unauthorized("Not authenticated."))?;
    service.authenticate(token).await
}

/// An empty body reads as `{}`.
fn parse<T: DeserializeOwned>(body: &[u8]) -> ServiceResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"{}")?);
    }
    Ok(serde_json::from_slice(body)?)
}

fn to_json<T: Serialize>(response: T) -> ServiceResult<Value> {
    Ok(serde_json::to_value(response).context("failed to serialize response")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::test_support::open_temp_database;
    use crate::settings::ServiceSettings;
    use tempfile::TempDir;

    fn service() -> (TempDir, WatchService) {
        let (dir, db) = open_temp_database();
        let settings = ServiceSettings {
            hash_rounds: 2,
            ..ServiceSettings::default()
        };
        (dir, WatchService::new(db, &settings))
    }

    async fn post(
        service: &WatchService,
        path: &str,
        bearer: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let body = body.to_string();
        dispatch(service, &Method::POST, path, bearer, body.as_bytes()).await
    }

    async fn logged_in(service: &WatchService) -> String {
        let credentials = json!({ "user_name": "ada", "password": "secret" });
        let (status, _) = post(service, "/register", None, credentials.clone()).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = post(service, "/login", None, credentials).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn full_measurement_flow() {
        let (_dir, service) = service();
        let token = logged_in(&service).await;
        let bearer = Some(token.as_str());

        let (status, body) = post(&service, "/watch/add", bearer, json!({ "name": "weight" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["auth"]["user_name"], "ada");

        for (datetime, measure) in [("2024-03-01T08:00:00Z", 10.0), ("2024-03-04T08:00:00Z", 40.0)] {
            let (status, _) = post(
                &service,
                "/logs/add",
                bearer,
                json!({ "watch_name": "weight", "cycle": 1, "datetime": datetime, "measure": measure }),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let selector = json!({ "watch_name": "weight", "cycle": 1 });
        let (status, body) = post(&service, "/logs/list", bearer, selector.clone()).await;
        assert_eq!(status, StatusCode::OK);
        let logs = body["logs"].as_array().unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs[0]["difference"].is_null());
        assert_eq!(logs[1]["difference"], 30.0);

        let (status, body) = post(&service, "/logs/stats", bearer, selector).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["average"], 25.0);
        assert_eq!(body["delta"], 30.0);
    }

    #[tokio::test]
    async fn empty_body_is_an_empty_object() {
        let (_dir, service) = service();
        let token = logged_in(&service).await;

        let (status, body) =
            dispatch(&service, &Method::POST, "/watch/list", Some(&token), b"").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["watches"], json!([]));
    }

    #[tokio::test]
    async fn missing_or_bad_token_is_unauthorized() {
        let (_dir, service) = service();

        let (status, body) = post(&service, "/watch/list", None, json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Not authenticated.");

        let (status, _) = post(&service, "/refresh", Some("nope"), json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn client_errors_carry_detail() {
        let (_dir, service) = service();
        let token = logged_in(&service).await;
        let bearer = Some(token.as_str());

        let (status, body) = post(
            &service,
            "/logs/stats",
            bearer,
            json!({ "watch_name": "ghost", "cycle": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Watch 'ghost' not found.");

        let (status, _) =
            dispatch(&service, &Method::POST, "/watch/add", bearer, b"{ not json").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = post(&service, "/watch/add", bearer, json!({ "title": "x" })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let (_dir, service) = service();
        let (status, _) = post(&service, "/nowhere", None, json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = dispatch(&service, &Method::GET, "/login", None, b"").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn bearer_header_parsing() {
        let with = |value: &str| {
            Request::builder()
                .header(AUTHORIZATION, value)
                .body(())
                .unwrap()
        };
        assert_eq!(bearer_token(&with("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&with("bearer  abc ")), Some("abc"));
        assert_eq!(bearer_token(&with("Basic abc")), None);
        assert_eq!(bearer_token(&with("Bearer ")), None);
        assert_eq!(bearer_token(&Request::new(())), None);
    }
}
