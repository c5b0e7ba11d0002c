//! Dispatcher tests over an in-memory transport.

use std::collections::{BTreeMap, HashMap};
use std::future::{Ready, ready};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use assert2::{check, let_assert};
use bytes::Bytes;
use courier::tower::Service;
use courier::{
    AppConfig, AppContext, BearerAccessToken, Client, Error, ErrorKind, Method, PartValue,
    QueryAccessToken, Reply, Request, RequestOptions, Response, Result, UploadForm,
};
use serde::Deserialize;
use serde_json::json;

type Responder = Arc<dyn Fn() -> Result<Response<Bytes>> + Send + Sync>;

/// Transport that records what it was asked to send.
#[derive(Clone)]
struct Recorder {
    sent: Arc<Mutex<Vec<Request<Bytes>>>>,
    respond: Responder,
}

impl Recorder {
    fn replying(status: u16, body: &'static str) -> Self {
        Self::with(move || Ok(Response::new(status, HashMap::new(), Bytes::from(body))))
    }

    fn with(respond: impl Fn() -> Result<Response<Bytes>> + Send + Sync + 'static) -> Self {
        Self {
            sent: Arc::default(),
            respond: Arc::new(respond),
        }
    }

    fn sent(&self) -> Vec<Request<Bytes>> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Service<Request<Bytes>> for Recorder {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Ready<Result<Response<Bytes>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        ready((self.respond)())
    }
}

fn app(response_type: &str) -> Arc<AppContext> {
    let config = AppConfig::builder()
        .response_type(response_type)
        .base_url(url::Url::parse("https://api.example.com/").expect("url"))
        .build();
    Arc::new(AppContext::new(config))
}

fn body_text(request: &Request<Bytes>) -> String {
    let body = request.body().cloned().unwrap_or_default();
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

// ============================================================================
// Middleware installation
// ============================================================================

#[tokio::test]
async fn defaults_are_installed_once() {
    let transport = Recorder::replying(200, r#"{"errcode":0}"#);
    let client = Client::with_transport(app("array"), transport.clone());

    client.get("cgi-bin/menu/get", &json!({})).await.expect("first");
    client.get("cgi-bin/menu/get", &json!({})).await.expect("second");

    check!(client.middlewares().names() == ["access_token"]);
    check!(transport.sent().len() == 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_calls_install_once() {
    let transport = Recorder::replying(200, r#"{"errcode":0}"#);
    let client = Arc::new(Client::with_transport(app("array"), transport.clone()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.get("cgi-bin/menu/get", &json!({})).await })
        })
        .collect();
    for handle in handles {
        handle.await.expect("task").expect("reply");
    }

    check!(client.middlewares().len() == 1);
    check!(transport.sent().len() == 16);
}

#[tokio::test]
async fn pushed_middlewares_run_after_defaults() {
    let app = app("array");
    app.set_access_token(QueryAccessToken::new("t0k"));
    let transport = Recorder::replying(200, "{}");
    let client = Client::with_transport(app, transport.clone());

    client.push_middleware(
        |request: &mut Request<Bytes>| -> Result<()> {
            let seen = request.url().query().unwrap_or_default().to_string();
            request.headers_mut().insert("X-Seen-Query".into(), seen);
            Ok(())
        },
        "audit",
    );
    client.get("cgi-bin/user/get", &json!({})).await.expect("reply");

    check!(client.middlewares().names() == ["access_token", "audit"]);
    let sent = transport.sent();
    let_assert!([request] = sent.as_slice());
    check!(request.header("X-Seen-Query") == Some("access_token=t0k"));
}

#[tokio::test]
async fn skipped_defaults_send_without_token() {
    let app = app("array");
    app.set_access_token(QueryAccessToken::new("t0k"));
    let transport = Recorder::replying(200, "{}");
    let client = Client::with_transport(app, transport.clone());

    check!(client.middlewares().skip_defaults());
    client.get("cgi-bin/user/get", &json!({})).await.expect("reply");

    check!(client.middlewares().is_empty());
    check!(transport.sent()[0].url().query().is_none());
}

// ============================================================================
// Access token
// ============================================================================

#[tokio::test]
async fn missing_token_sends_request_unchanged() {
    let transport = Recorder::replying(200, "{}");
    let client = Client::with_transport(app("array"), transport.clone());

    client
        .request_raw("cgi-bin/menu/get", Method::Get, RequestOptions::new())
        .await
        .expect("reply");

    let sent = transport.sent();
    check!(sent[0].url().as_str() == "https://api.example.com/cgi-bin/menu/get");
    check!(sent[0].headers().is_empty());
}

#[tokio::test]
async fn query_token_follows_call_query() {
    let app = app("array");
    app.set_access_token(QueryAccessToken::new("t0k"));
    let transport = Recorder::replying(200, "{}");
    let client = Client::with_transport(app, transport.clone());

    client
        .get("cgi-bin/user/info", &json!({"openid": "o1"}))
        .await
        .expect("reply");

    check!(transport.sent()[0].url().query() == Some("openid=o1&access_token=t0k"));
}

#[tokio::test]
async fn token_can_change_between_calls() {
    let app = app("array");
    let transport = Recorder::replying(200, "{}");
    let client = Client::with_transport(app.clone(), transport.clone());

    app.set_access_token(BearerAccessToken::new("first"));
    client.get("cgi-bin/menu/get", &json!({})).await.expect("first");
    app.set_access_token(BearerAccessToken::new("second"));
    client.get("cgi-bin/menu/get", &json!({})).await.expect("second");
    app.clear_access_token();
    client.get("cgi-bin/menu/get", &json!({})).await.expect("third");

    let sent = transport.sent();
    check!(sent[0].header("Authorization") == Some("Bearer first"));
    check!(sent[1].header("Authorization") == Some("Bearer second"));
    check!(sent[2].header("Authorization").is_none());
}

#[tokio::test]
async fn middleware_failure_sends_nothing() {
    let app = app("array");
    app.set_access_token(BearerAccessToken::new("bad\ntoken"));
    let transport = Recorder::replying(200, "{}");
    let client = Client::with_transport(app, transport.clone());

    let result = client.get("cgi-bin/menu/get", &json!({})).await;

    let_assert!(Err(err) = result);
    check!(err.kind() == ErrorKind::Middleware);
    let_assert!(Error::Middleware { name, .. } = err);
    check!(name == "access_token");
    check!(transport.sent().is_empty());
}

// ============================================================================
// Raw and cast modes
// ============================================================================

#[tokio::test]
async fn raw_mode_ignores_response_type() {
    let transport = Recorder::replying(502, "<html>bad gateway</html>");
    let client = Client::with_transport(app("no-such-type"), transport);

    let reply = client
        .request_raw("cgi-bin/menu/get", Method::Get, RequestOptions::new())
        .await
        .expect("raw reply");

    let_assert!(Reply::Raw(response) = reply);
    check!(response.status() == 502);
    check!(response.body().as_ref() == b"<html>bad gateway</html>");
}

#[tokio::test]
async fn cast_mode_rejects_unknown_response_type() {
    let transport = Recorder::replying(200, "{}");
    let client = Client::with_transport(app("no-such-type"), transport);

    let result = client.get("cgi-bin/menu/get", &json!({})).await;

    let_assert!(Err(err) = result);
    check!(err.kind() == ErrorKind::Cast);
}

#[tokio::test]
async fn cast_mode_returns_map() {
    let transport = Recorder::replying(200, r#"{"errcode":0,"errmsg":"ok"}"#);
    let client = Client::with_transport(app("array"), transport);

    let reply = client.get("cgi-bin/menu/get", &json!({})).await.expect("reply");

    let_assert!(Reply::Map(map) = reply);
    check!(map.get("errmsg") == Some(&json!("ok")));
}

#[tokio::test]
async fn cast_mode_rejects_mismatched_body() {
    let transport = Recorder::replying(200, "[1, 2, 3]");
    let client = Client::with_transport(app("array"), transport);

    let result = client.get("cgi-bin/menu/get", &json!({})).await;

    let_assert!(Err(Error::Cast { response_type, .. }) = result);
    check!(response_type == "array");
}

#[tokio::test]
async fn reply_decodes_into_caller_type() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Ticket {
        ticket: String,
        expires_in: u32,
    }

    let transport = Recorder::replying(200, r#"{"ticket":"tk","expires_in":7200}"#);
    let client = Client::with_transport(app("json"), transport);

    let ticket: Ticket = client
        .get("cgi-bin/ticket/getticket", &json!({"type": "jsapi"}))
        .await
        .expect("reply")
        .decode()
        .expect("ticket");

    check!(
        ticket
            == Ticket {
                ticket: "tk".into(),
                expires_in: 7200
            }
    );
}

#[tokio::test]
async fn transport_error_propagates_unchanged() {
    let transport = Recorder::with(|| Err(Error::Timeout));
    let client = Client::with_transport(app("array"), transport.clone());

    let result = client.get("cgi-bin/menu/get", &json!({})).await;

    let_assert!(Err(err) = result);
    check!(err.is_timeout());
    check!(err.kind() == ErrorKind::Transport);
    check!(transport.sent().len() == 1);
}

#[tokio::test]
async fn every_call_shape_propagates_transport_error_without_retry() {
    let mut files = BTreeMap::new();
    files.insert("media".to_string(), PartValue::bytes("fake-png-bytes"));
    let form = UploadForm::new("description", "logo");

    for shape in ["post", "post_json", "upload"] {
        let transport = Recorder::with(|| Err(Error::Timeout));
        let client = Client::with_transport(app("array"), transport.clone());

        let result = match shape {
            "post" => client.post("cgi-bin/tags/create", &json!({"name": "vip"})).await,
            "post_json" => {
                client
                    .post_json("cgi-bin/menu/create", &json!({"button": []}), &json!({}))
                    .await
            }
            _ => {
                client
                    .upload("cgi-bin/media/upload", Some(&files), Some(&form), &json!({}))
                    .await
            }
        };

        let_assert!(Err(Error::Timeout) = result, "{shape}");
        check!(transport.sent().len() == 1, "{shape}");
    }
}

#[tokio::test]
async fn raw_mode_propagates_transport_error() {
    let transport = Recorder::with(|| Err(Error::connection("refused")));
    let client = Client::with_transport(app("array"), transport);

    let result = client
        .request_raw("cgi-bin/menu/get", Method::Get, RequestOptions::new())
        .await;

    let_assert!(Err(err) = result);
    check!(err.is_connection());
}

// ============================================================================
// Call shapes
// ============================================================================

#[tokio::test]
async fn post_sends_form_body() {
    let transport = Recorder::replying(200, "{}");
    let client = Client::with_transport(app("array"), transport.clone());

    client
        .post("cgi-bin/tags/create", &json!({"name": "vip"}))
        .await
        .expect("reply");

    let sent = transport.sent();
    check!(sent[0].method() == Method::Post);
    check!(sent[0].header("Content-Type") == Some("application/x-www-form-urlencoded"));
    check!(body_text(&sent[0]) == "name=vip");
}

#[tokio::test]
async fn post_json_sends_json_body_and_query() {
    let transport = Recorder::replying(200, "{}");
    let client = Client::with_transport(app("array"), transport.clone());

    client
        .post_json(
            "cgi-bin/menu/create",
            &json!({"button": [{"name": "Home"}]}),
            &json!({"agentid": 7}),
        )
        .await
        .expect("reply");

    let sent = transport.sent();
    check!(sent[0].url().query() == Some("agentid=7"));
    check!(sent[0].header("Content-Type") == Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(&body_text(&sent[0])).expect("json");
    check!(body == json!({"button": [{"name": "Home"}]}));
}

#[tokio::test]
async fn upload_sends_multipart_with_long_timeouts() {
    let transport = Recorder::replying(200, r#"{"media_id":"m1"}"#);
    let client = Client::with_transport(app("array"), transport.clone());

    let mut files = BTreeMap::new();
    files.insert("media".to_string(), PartValue::bytes("fake-png-bytes"));
    let form = UploadForm::new("description", r#"{"title":"logo"}"#).with_filename("logo.png");

    client
        .upload("cgi-bin/media/upload", Some(&files), Some(&form), &json!({"type": "image"}))
        .await
        .expect("reply");

    let sent = transport.sent();
    let request = &sent[0];
    let timeouts = request.timeouts();
    check!(timeouts.connect == Some(Duration::from_secs(30)));
    check!(timeouts.read == Some(Duration::from_secs(30)));
    check!(timeouts.total == Some(Duration::from_secs(30)));
    check!(request.url().query() == Some("type=image"));

    let_assert!(Some(content_type) = request.header("Content-Type"));
    check!(content_type.starts_with("multipart/form-data; boundary="));

    let body = body_text(request);
    check!(body.contains(r#"Content-Disposition: form-data; name="media"; filename="logo.png""#));
    check!(body.contains(r#"Content-Disposition: form-data; name="description""#));
    let media = body.find("fake-png-bytes").expect("file part");
    let description = body.find(r#"{"title":"logo"}"#).expect("form part");
    check!(media < description);
}

#[tokio::test]
async fn upload_without_files_or_form_still_sends() {
    let transport = Recorder::replying(200, "{}");
    let client = Client::with_transport(app("array"), transport.clone());

    client
        .upload("cgi-bin/media/upload", None, None, &json!({}))
        .await
        .expect("reply");

    let sent = transport.sent();
    check!(sent.len() == 1);
    check!(sent[0].timeouts().total == Some(Duration::from_secs(30)));
}

#[tokio::test]
async fn upload_of_missing_file_fails_before_send() {
    let transport = Recorder::replying(200, "{}");
    let client = Client::with_transport(app("array"), transport.clone());

    let mut files = BTreeMap::new();
    files.insert(
        "media".to_string(),
        PartValue::path("/nonexistent/courier/upload.jpg"),
    );

    let result = client
        .upload("cgi-bin/media/upload", Some(&files), None, &json!({}))
        .await;

    let_assert!(Err(Error::Io(_)) = result);
    check!(transport.sent().is_empty());
}
