//! End-to-end HTTP coverage over the in-memory marketplace.
//!
//! Each test wires the real services to a fresh `InMemoryMarketplace` and
//! drives them through the session cookie exactly as a browser would.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};

use bookswap::Trace;
use bookswap::domain::ports::{
    ChatPrompt, DisabledImageStore, TextGenerationError, TextGenerator, UnconfiguredTextGenerator,
};
use bookswap::domain::recommendation::TROUBLE_REPLY;
use bookswap::domain::{
    CatalogService, ExchangeService, IdentityService, RecommendationService, TRACE_ID_HEADER,
};
use bookswap::inbound::http::books::{browse_books, delete_book, list_book, owned_books};
use bookswap::inbound::http::chatbot::recommend;
use bookswap::inbound::http::exchanges::{list_exchanges, request_exchange, update_exchange_status};
use bookswap::inbound::http::state::HttpState;
use bookswap::inbound::http::users::{get_profile, login, logout, register, update_profile};
use bookswap::outbound::credentials::Pbkdf2CredentialHasher;
use bookswap::outbound::memory::InMemoryMarketplace;

const PASSWORD: &str = "correct-horse";

/// Generator that always answers with the same text.
struct ScriptedGenerator(&'static str);

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &ChatPrompt) -> Result<String, TextGenerationError> {
        Ok(self.0.to_owned())
    }
}

fn marketplace_state(generator: Arc<dyn TextGenerator>) -> HttpState {
    let store = Arc::new(InMemoryMarketplace::new());
    let clock = Arc::new(DefaultClock);
    let identity = Arc::new(IdentityService::new(
        store.clone(),
        Arc::new(Pbkdf2CredentialHasher::new(1)),
        clock.clone(),
    ));
    HttpState {
        login: identity.clone(),
        accounts: identity,
        catalog: Arc::new(CatalogService::new(
            store.clone(),
            Arc::new(DisabledImageStore),
            clock.clone(),
        )),
        exchanges: Arc::new(ExchangeService::new(store.clone(), clock)),
        recommendations: Arc::new(RecommendationService::new(store, generator)),
    }
}

async fn marketplace_app(
    state: HttpState,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build();
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
                    .wrap(session)
                    .service(register)
                    .service(login)
                    .service(logout)
                    .service(get_profile)
                    .service(update_profile)
                    .service(list_book)
                    .service(owned_books)
                    .service(browse_books)
                    .service(delete_book)
                    .service(request_exchange)
                    .service(list_exchanges)
                    .service(update_exchange_status)
                    .service(recommend),
            ),
    )
    .await
}

async fn sign_up<S, B>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let registered = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/register")
            .set_json(json!({ "username": username, "password": PASSWORD }))
            .to_request(),
    )
    .await;
    assert_eq!(registered.status(), StatusCode::CREATED);

    let logged_in = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "username": username, "password": PASSWORD }))
            .to_request(),
    )
    .await;
    assert_eq!(logged_in.status(), StatusCode::OK);
    logged_in
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

async fn list<S, B>(app: &S, cookie: &Cookie<'static>, title: &str, author: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let response = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/books")
            .cookie(cookie.clone())
            .set_json(json!({ "title": title, "author": author }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(response).await;
    body["id"].as_str().expect("book id").to_owned()
}

async fn send<S, B>(app: &S, request: test::TestRequest) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let response = test::call_service(app, request.to_request()).await;
    let status = response.status();
    let bytes = test::read_body(response).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn titles(body: &Value) -> Vec<&str> {
    body.as_array()
        .expect("array")
        .iter()
        .filter_map(|book| book["title"].as_str())
        .collect()
}

#[actix_web::test]
async fn registered_members_can_manage_their_profile() {
    let app = marketplace_app(marketplace_state(Arc::new(UnconfiguredTextGenerator))).await;
    let cookie = sign_up(&app, "alice").await;

    let (status, profile) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/user/profile")
            .cookie(cookie.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "alice");
    assert!(profile["email"].is_null());

    let (status, updated) = send(
        &app,
        test::TestRequest::put()
            .uri("/api/v1/user/profile")
            .cookie(cookie.clone())
            .set_json(json!({ "email": "alice@example.com", "location": "York" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["email"], "alice@example.com");
    assert_eq!(updated["location"], "York");

    let (status, _) = send(
        &app,
        test::TestRequest::post().uri("/api/v1/logout").cookie(cookie),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn duplicate_usernames_conflict() {
    let app = marketplace_app(marketplace_state(Arc::new(UnconfiguredTextGenerator))).await;
    sign_up(&app, "alice").await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/register")
            .set_json(json!({ "username": "alice", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[rstest]
#[case("alice", "wrong-password")]
#[case("nobody", PASSWORD)]
#[actix_web::test]
async fn bad_credentials_are_unauthorised(#[case] username: &str, #[case] password: &str) {
    let app = marketplace_app(marketplace_state(Arc::new(UnconfiguredTextGenerator))).await;
    sign_up(&app, "alice").await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid credentials");
}

#[actix_web::test]
async fn anonymous_requests_carry_a_trace_id() {
    let app = marketplace_app(marketplace_state(Arc::new(UnconfiguredTextGenerator))).await;

    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/user/profile")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("trace id header");
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["traceId"], header.as_str());
}

#[actix_web::test]
async fn browsing_hides_own_and_unavailable_books() {
    let app = marketplace_app(marketplace_state(Arc::new(UnconfiguredTextGenerator))).await;
    let alice = sign_up(&app, "alice").await;
    let bob = sign_up(&app, "bob").await;
    list(&app, &alice, "Dune", "Frank Herbert").await;
    list(&app, &bob, "Emma", "Jane Austen").await;

    let (_, as_alice) = send(
        &app,
        test::TestRequest::get().uri("/api/v1/books").cookie(alice),
    )
    .await;
    assert_eq!(titles(&as_alice), vec!["Emma"]);

    let (status, anonymous) = send(&app, test::TestRequest::get().uri("/api/v1/books")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&anonymous), vec!["Emma", "Dune"]);
}

#[actix_web::test]
async fn accepting_an_offer_trades_books_and_rejects_rivals() {
    let app = marketplace_app(marketplace_state(Arc::new(UnconfiguredTextGenerator))).await;
    let alice = sign_up(&app, "alice").await;
    let bob = sign_up(&app, "bob").await;
    let carol = sign_up(&app, "carol").await;
    let dune = list(&app, &alice, "Dune", "Frank Herbert").await;
    let emma = list(&app, &bob, "Emma", "Jane Austen").await;

    let (status, bob_request) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/request")
            .cookie(bob.clone())
            .set_json(json!({ "bookId": dune, "offeredBookId": emma })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bob_request["status"], "pending");

    let (status, carol_request) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/request")
            .cookie(carol.clone())
            .set_json(json!({
                "bookId": dune,
                "offeredBookTitle": "Ulysses",
                "offeredBookAuthor": "James Joyce"
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, inbox) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/exchanges")
            .cookie(alice.clone()),
    )
    .await;
    let inbox = inbox.as_array().expect("exchanges");
    assert_eq!(inbox.len(), 2);
    assert!(inbox.iter().all(|row| row["isOwner"] == true));

    let bob_exchange = bob_request["id"].as_str().expect("id");
    let (status, decision) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/exchanges/{bob_exchange}"))
            .cookie(alice.clone())
            .set_json(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decision["exchange"]["status"], "accepted");
    assert_eq!(decision["autoRejected"], json!([carol_request["id"]]));

    let (_, carol_books) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/books/user")
            .cookie(carol.clone()),
    )
    .await;
    assert_eq!(titles(&carol_books), vec!["Ulysses"]);

    let (_, bob_traded) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/books/user?status=exchanged")
            .cookie(bob),
    )
    .await;
    assert_eq!(titles(&bob_traded), vec!["Emma"]);

    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/exchanges/{bob_exchange}"))
            .cookie(alice)
            .set_json(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_state");
}

#[rstest]
#[case("pending")]
#[case("bogus")]
#[actix_web::test]
async fn unknown_decisions_leave_the_offer_pending(#[case] decision: &str) {
    let app = marketplace_app(marketplace_state(Arc::new(UnconfiguredTextGenerator))).await;
    let alice = sign_up(&app, "alice").await;
    let bob = sign_up(&app, "bob").await;
    let dune = list(&app, &alice, "Dune", "Frank Herbert").await;
    let emma = list(&app, &bob, "Emma", "Jane Austen").await;
    let (_, request) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/request")
            .cookie(bob)
            .set_json(json!({ "bookId": dune, "offeredBookId": emma })),
    )
    .await;
    let exchange = request["id"].as_str().expect("id");

    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/exchanges/{exchange}"))
            .cookie(alice.clone())
            .set_json(json!({ "status": decision })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_state");

    let (_, inbox) = send(
        &app,
        test::TestRequest::get().uri("/api/v1/exchanges").cookie(alice),
    )
    .await;
    assert_eq!(inbox[0]["status"], "pending");
}

#[actix_web::test]
async fn requesting_your_own_book_is_forbidden() {
    let app = marketplace_app(marketplace_state(Arc::new(UnconfiguredTextGenerator))).await;
    let alice = sign_up(&app, "alice").await;
    let dune = list(&app, &alice, "Dune", "Frank Herbert").await;
    let emma = list(&app, &alice, "Emma", "Jane Austen").await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/request")
            .cookie(alice)
            .set_json(json!({ "bookId": dune, "offeredBookId": emma })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[actix_web::test]
async fn books_under_offer_cannot_be_deleted() {
    let app = marketplace_app(marketplace_state(Arc::new(UnconfiguredTextGenerator))).await;
    let alice = sign_up(&app, "alice").await;
    let bob = sign_up(&app, "bob").await;
    let dune = list(&app, &alice, "Dune", "Frank Herbert").await;
    let emma = list(&app, &bob, "Emma", "Jane Austen").await;
    let spare = list(&app, &alice, "Middlemarch", "George Eliot").await;

    send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/request")
            .cookie(bob)
            .set_json(json!({ "bookId": dune, "offeredBookId": emma })),
    )
    .await;

    let (status, _) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/books/{dune}"))
            .cookie(alice.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/books/{spare}"))
            .cookie(alice.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/books/{spare}"))
            .cookie(alice),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[actix_web::test]
async fn recommendations_link_a_listed_book() {
    let app = marketplace_app(marketplace_state(Arc::new(ScriptedGenerator(
        "You might enjoy Dune by Frank Herbert.",
    ))))
    .await;
    let alice = sign_up(&app, "alice").await;
    let bob = sign_up(&app, "bob").await;
    list(&app, &alice, "Dune", "Frank Herbert").await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/chatbot/recommend")
            .cookie(bob)
            .set_json(json!({
                "message": "something with deserts",
                "conversationHistory": [{ "type": "bot", "content": "Hi! What do you like?" }]
            })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendedBook"]["title"], "Dune");
    assert!(body.get("error").is_none());
}

#[actix_web::test]
async fn unconfigured_assistant_apologises() {
    let app = marketplace_app(marketplace_state(Arc::new(UnconfiguredTextGenerator))).await;
    let alice = sign_up(&app, "alice").await;
    let bob = sign_up(&app, "bob").await;
    list(&app, &alice, "Dune", "Frank Herbert").await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/chatbot/recommend")
            .cookie(bob)
            .set_json(json!({ "message": "anything" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], TROUBLE_REPLY);
    assert!(body["recommendedBook"].is_null());
    assert_eq!(body["error"], "text generation is not configured");
}
