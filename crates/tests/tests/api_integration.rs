use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;
use wayfarer_agents::{AgentConfig, CompletionModel, InvocationError, TravelDesk};
use wayfarer_api::{build_router, ApiState};
use wayfarer_core::{DomainKind, InvocationContext, Prompt};
use wayfarer_observability::AppMetrics;

/// Answers each domain with a fixed completion; unscripted domains fail.
#[derive(Default)]
struct ScriptedModel {
    replies: HashMap<DomainKind, String>,
    calls: Mutex<Vec<(InvocationContext, Prompt)>>,
}

impl ScriptedModel {
    fn reply(mut self, kind: DomainKind, text: impl Into<String>) -> Self {
        self.replies.insert(kind, text.into());
        self
    }
}

impl CompletionModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        context: &InvocationContext,
        prompt: &Prompt,
    ) -> Result<String, InvocationError> {
        self.calls.lock().push((context.clone(), prompt.clone()));
        self.replies
            .get(&context.domain)
            .cloned()
            .ok_or_else(|| InvocationError::Transport("connection refused".to_string()))
    }
}

fn app(model: Arc<ScriptedModel>, config: &AgentConfig) -> Router {
    let metrics = AppMetrics::shared();
    let desk = TravelDesk::new(model, config, metrics.clone()).unwrap();
    build_router(ApiState {
        desk: Arc::new(desk),
        metrics,
        allowed_origins: Arc::new(vec!["http://localhost:8501".to_string()]),
    })
}

fn paris_model() -> ScriptedModel {
    ScriptedModel::default()
        .reply(
            DomainKind::Flights,
            "Here are a few options for your trip:\n\n```json\n{\n  \"flights\": [\n    \
             {\"name\": \"Air France AF7\", \"description\": \"Nonstop from JFK\", \"price_estimate\": \"$640\", \"duration\": 7.5},\n    \
             {\"name\": \"Delta DL264\", \"description\": \"One stop in Boston\", \"price_estimate\": 520, \"duration\": \"9\"}\n  ]\n}\n```\n\nEnjoy Paris!",
        )
        .reply(
            DomainKind::Lodging,
            "{\"hotels\": [{\"name\": \"Hôtel Lumière\", \"description\": \"Boutique stay in Le Marais\", \"price\": \"210\", \"amenities\": [\"wifi\", \"breakfast\"]}]}",
        )
        .reply(
            DomainKind::Activities,
            "Paris has so much to offer! You could visit the Louvre, walk along the Seine \
             and finish with dinner in Montmartre.",
        )
}

fn paris_request() -> Value {
    json!({
        "destination": "Paris",
        "start_date": "2025-07-01",
        "end_date": "2025-07-07",
        "budget": 1500
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_lists_local_services() {
    let app = app(Arc::new(ScriptedModel::default()), &AgentConfig::default());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["services"]["flights"], "local");
    assert_eq!(parsed["services"]["lodging"], "local");
    assert_eq!(parsed["services"]["activities"], "local");
}

#[tokio::test]
async fn paris_plan_mixes_records_and_sentinels() {
    let model = Arc::new(paris_model());
    let app = app(model.clone(), &AgentConfig::default());

    let response = app.oneshot(post_json("/run", &paris_request())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let plan = read_json(response).await;
    let flights = plan["flights"].as_array().unwrap();
    assert_eq!(flights.len(), 2);
    assert_eq!(flights[0]["name"], "Air France AF7");
    assert_eq!(flights[1]["price_estimate"], "520");

    let stay = plan["stay"].as_array().unwrap();
    assert_eq!(stay.len(), 1);
    assert_eq!(stay[0]["name"], "Hôtel Lumière");
    assert_eq!(stay[0]["price_estimate"], "210");

    assert_eq!(plan["activities"], "No activities found.");

    let calls = model.calls.lock();
    assert_eq!(calls.len(), 3);
    let flight_prompt = calls
        .iter()
        .find(|(context, _)| context.domain == DomainKind::Flights)
        .map(|(_, prompt)| prompt.user.clone())
        .unwrap();
    assert!(flight_prompt.contains("to Paris from 2025-07-01 to 2025-07-07"));
}

#[tokio::test]
async fn failing_model_yields_every_sentinel() {
    let app = app(Arc::new(ScriptedModel::default()), &AgentConfig::default());

    let response = app.oneshot(post_json("/run", &paris_request())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let plan = read_json(response).await;
    assert_eq!(
        plan,
        json!({
            "flights": "No flights returned.",
            "stay": "No stay options returned.",
            "activities": "No activities found."
        })
    );
}

#[tokio::test]
async fn stay_endpoint_replies_under_stays() {
    let app = app(Arc::new(paris_model()), &AgentConfig::default());

    for uri in ["/run/stay", "/run/lodging"] {
        let response = app
            .clone()
            .oneshot(post_json(uri, &paris_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let reply = read_json(response).await;
        assert_eq!(reply["stays"].as_array().unwrap().len(), 1, "{uri}");
        assert_eq!(reply["stays"][0]["amenities"], "wifi, breakfast");
    }
}

#[tokio::test]
async fn empty_service_reply_is_an_empty_list() {
    let app = app(Arc::new(paris_model()), &AgentConfig::default());

    let response = app
        .oneshot(post_json("/run/activities", &paris_request()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!({"activities": []}));
}

#[tokio::test]
async fn reversed_dates_are_rejected() {
    let model = Arc::new(paris_model());
    let app = app(model.clone(), &AgentConfig::default());

    let mut body = paris_request();
    body["end_date"] = json!("2025-06-28");

    let response = app.oneshot(post_json("/run", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let parsed = read_json(response).await;
    assert_eq!(parsed["error"], "invalid_request");
    assert!(model.calls.lock().is_empty());
}

#[tokio::test]
async fn each_request_gets_fresh_sessions() {
    let model = Arc::new(paris_model());
    let app = app(model.clone(), &AgentConfig::default());

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/run/flights", &paris_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let calls = model.calls.lock();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].0.session_id, calls[1].0.session_id);
    assert_eq!(calls[0].0.user_id, "user_flights");
}

#[tokio::test]
async fn coordinator_reaches_remote_services() {
    let services = serve(app(Arc::new(paris_model()), &AgentConfig::default())).await;

    // Replies with prose around a fenced block instead of a JSON body.
    let leaky = serve(Router::new().route(
        "/",
        post(|| async {
            "Of course!\n```json\n{\"hotels\": [{\"name\": \"Le Marais Loft\"}, {\"name\": \"Hôtel Lumière\"}]}\n```"
        }),
    ))
    .await;

    let config = AgentConfig {
        flights_url: Some(format!("{services}/run/flights")),
        lodging_url: Some(format!("{leaky}/")),
        activities_url: Some(format!("{services}/run/activities")),
        ..AgentConfig::default()
    };
    let local = Arc::new(ScriptedModel::default());
    let host = app(local.clone(), &config);

    let health = read_json(
        host.clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(health["services"]["flights"], format!("{services}/run/flights"));

    let response = host.oneshot(post_json("/run", &paris_request())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let plan = read_json(response).await;
    assert_eq!(plan["flights"].as_array().unwrap().len(), 2);
    assert_eq!(plan["stay"][0]["name"], "Le Marais Loft");
    assert_eq!(plan["stay"].as_array().unwrap().len(), 2);
    assert_eq!(plan["activities"], "No activities found.");
    assert!(local.calls.lock().is_empty());
}

#[tokio::test]
async fn unreachable_remote_service_leaves_its_slot_empty() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = format!("http://{}/run/flights", listener.local_addr().unwrap());
    drop(listener);

    let config = AgentConfig {
        flights_url: Some(dead),
        ..AgentConfig::default()
    };
    let host = app(Arc::new(paris_model()), &config);

    let response = host.oneshot(post_json("/run", &paris_request())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let plan = read_json(response).await;
    assert_eq!(plan["flights"], "No flights returned.");
    assert_eq!(plan["stay"].as_array().unwrap().len(), 1);
}
