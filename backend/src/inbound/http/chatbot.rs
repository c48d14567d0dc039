//! Recommendation assistant handler.
//!
//! ```text
//! POST /api/v1/chatbot/recommend
//! {"message":"something short","conversationHistory":[{"type":"bot","content":"Hi!"}]}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::ports::{ChatRole, ChatTurn, Recommendation, RecommendationRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::books::BookResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// A prior turn as the client recorded it. `type: "bot"` marks assistant
/// turns; anything else is treated as the user.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    #[schema(example = "bot")]
    pub kind: String,
    pub content: String,
}

impl From<HistoryEntry> for ChatTurn {
    fn from(entry: HistoryEntry) -> Self {
        let role = if entry.kind == "bot" {
            ChatRole::Assistant
        } else {
            ChatRole::User
        };
        Self {
            role,
            content: entry.content,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub message: String,
    #[serde(default, alias = "conversation_history")]
    pub conversation_history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub message: String,
    pub recommended_book: Option<BookResponse>,
    /// Present when the assistant could not answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Recommendation> for RecommendResponse {
    fn from(recommendation: Recommendation) -> Self {
        Self {
            message: recommendation.reply,
            recommended_book: recommendation.book.map(BookResponse::from),
            error: recommendation.failure,
        }
    }
}

/// Ask the assistant for a book from the live catalog.
///
/// A generator failure still answers 200 with the apology reply and the
/// failure detail in `error`, so clients can show the text as-is.
#[utoipa::path(
    post,
    path = "/api/v1/chatbot/recommend",
    request_body = RecommendRequest,
    responses(
        (status = 200, description = "Assistant reply, or an apology with `error` set", body = RecommendResponse),
        (status = 400, description = "Empty message", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["chatbot"],
    operation_id = "recommend"
)]
#[post("/chatbot/recommend")]
pub async fn recommend(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RecommendRequest>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let RecommendRequest {
        message,
        conversation_history,
    } = payload.into_inner();
    let request = RecommendationRequest {
        message,
        history: conversation_history.into_iter().map(ChatTurn::from).collect(),
    };

    let recommendation = state
        .recommendations
        .recommend(&requester, &request)
        .await?;
    Ok(HttpResponse::Ok().json(RecommendResponse::from(recommendation)))
}

#[cfg(test)]
mod tests {
    //! Handler tests for the recommendation endpoint.
    use super::*;
    use crate::domain::recommendation::TROUBLE_REPLY;
    use crate::domain::{Book, BookDetails, BookId, BookStatus, CatalogEntry, UserId, Username};
    use crate::inbound::http::session::USER_ID_KEY;
    use crate::inbound::http::test_utils::{MockPorts, test_session_middleware};
    use actix_session::Session;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};

    const USER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    async fn call(ports: MockPorts, body: Value) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(ports.into_state()))
                .wrap(test_session_middleware())
                .route(
                    "/sign-in",
                    web::get().to(|session: Session| async move {
                        session.insert(USER_ID_KEY, USER_ID).expect("store user id");
                        HttpResponse::Ok()
                    }),
                )
                .service(web::scope("/api/v1").service(recommend)),
        )
        .await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/sign-in").to_request(),
        )
        .await;
        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .map(Cookie::into_owned)
            .expect("session cookie");
        actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/chatbot/recommend")
                .cookie(cookie)
                .set_json(body)
                .to_request(),
        )
        .await
    }

    #[rstest]
    #[case("bot", ChatRole::Assistant)]
    #[case("user", ChatRole::User)]
    #[case("system", ChatRole::User)]
    fn history_types_map_to_roles(#[case] kind: &str, #[case] role: ChatRole) {
        let turn = ChatTurn::from(HistoryEntry {
            kind: kind.to_owned(),
            content: "hi".to_owned(),
        });
        assert_eq!(turn.role, role);
    }

    #[rstest]
    #[actix_web::test]
    async fn replies_carry_the_matched_book() {
        let entry = CatalogEntry {
            book: Book::new(
                BookId::random(),
                UserId::random(),
                BookDetails::try_new("Dune", "Frank Herbert", None).expect("details"),
                BookStatus::Available,
                Utc::now(),
            ),
            owner: Username::new("bob").expect("username"),
        };
        let mut ports = MockPorts::default();
        ports
            .recommendations
            .expect_recommend()
            .withf(|_: &UserId, request: &RecommendationRequest| {
                request.message == "sci-fi?"
                    && request.history.len() == 1
                    && request.history[0].role == ChatRole::Assistant
            })
            .return_once(move |_, _| {
                Ok(Recommendation {
                    reply: "Try Dune.".to_owned(),
                    book: Some(entry),
                    failure: None,
                })
            });

        let res = call(
            ports,
            json!({
                "message": "sci-fi?",
                "conversation_history": [{"type": "bot", "content": "Hello!"}]
            }),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], "Try Dune.");
        assert_eq!(body["recommendedBook"]["title"], "Dune");
        assert!(body.get("error").is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn degraded_replies_still_succeed_with_an_apology() {
        let mut ports = MockPorts::default();
        ports.recommendations.expect_recommend().return_once(|_, _| {
            Ok(Recommendation {
                reply: TROUBLE_REPLY.to_owned(),
                book: None,
                failure: Some("text generation is not configured".to_owned()),
            })
        });

        let res = call(ports, json!({"message": "anything"})).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], TROUBLE_REPLY);
        assert_eq!(body["recommendedBook"], Value::Null);
        assert_eq!(body["error"], "text generation is not configured");
    }
}
