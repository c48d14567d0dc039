//! Tests for the domain user model.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

#[fixture]
fn created_at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

#[rstest]
#[case("", UserValidationError::EmptyId)]
#[case("not-a-uuid", UserValidationError::InvalidId)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
fn user_id_rejects_invalid_values(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(UserId::new(raw).expect_err("invalid id"), expected);
}

#[rstest]
fn user_id_round_trips_through_serde() {
    let id = UserId::new(VALID_ID).expect("valid id");
    let value = serde_json::to_value(&id).expect("serialise");
    assert_eq!(value, json!(VALID_ID));
    let decoded: UserId = serde_json::from_value(value).expect("deserialise");
    assert_eq!(decoded, id);
}

#[rstest]
fn user_id_from_uuid_matches_string_form() {
    let uuid = Uuid::new_v4();
    let id = UserId::from_uuid(uuid);
    assert_eq!(id.as_ref(), uuid.to_string());
    assert_eq!(id.as_uuid(), &uuid);
}

#[rstest]
#[case("   ", UserValidationError::EmptyUsername)]
#[case("ab", UserValidationError::UsernameTooShort { min: USERNAME_MIN })]
#[case(&"a".repeat(USERNAME_MAX + 1), UserValidationError::UsernameTooLong { max: USERNAME_MAX })]
#[case("bad name", UserValidationError::UsernameInvalidCharacters)]
#[case("bad$name", UserValidationError::UsernameInvalidCharacters)]
fn username_rejects_invalid_values(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(Username::new(raw).expect_err("invalid username"), expected);
}

#[rstest]
#[case("  alice  ", "alice")]
#[case("bob_the.reader-1", "bob_the.reader-1")]
fn username_trims_surrounding_whitespace(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(Username::new(raw).expect("valid username").as_ref(), expected);
}

#[rstest]
#[case("reader@example.org", true)]
#[case(" reader@example.org ", true)]
#[case("reader@example", false)]
#[case("reader example@x.org", false)]
#[case("@example.org", false)]
fn email_validation(#[case] raw: &str, #[case] ok: bool) {
    assert_eq!(EmailAddress::new(raw).is_ok(), ok, "{raw}");
}

#[rstest]
#[case(None)]
#[case(Some(""))]
#[case(Some("   "))]
fn blank_optional_email_means_none(#[case] raw: Option<&str>) {
    assert_eq!(EmailAddress::parse_optional(raw).expect("blank accepted"), None);
}

#[rstest]
fn location_is_trimmed_and_bounded() {
    assert_eq!(
        parse_location(Some("  Leeds ")).expect("valid"),
        Some("Leeds".to_owned())
    );
    assert_eq!(parse_location(Some(" ")).expect("blank"), None);
    assert_eq!(
        parse_location(Some(&"x".repeat(LOCATION_MAX + 1))).expect_err("too long"),
        UserValidationError::LocationTooLong { max: LOCATION_MAX }
    );
}

#[rstest]
fn with_contact_replaces_email_and_location(created_at: DateTime<Utc>) {
    let user = User::new(
        UserId::random(),
        Username::new("alice").expect("username"),
        None,
        Some("York".to_owned()),
        created_at,
    );
    let email = EmailAddress::new("alice@example.org").expect("email");

    let updated = user.clone().with_contact(Some(email.clone()), None);

    assert_eq!(updated.id(), user.id());
    assert_eq!(updated.email(), Some(&email));
    assert_eq!(updated.location(), None);
    assert_eq!(updated.created_at(), created_at);
}
