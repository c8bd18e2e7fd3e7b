//! Behavioural tests for batch validation using rstest-bdd.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use panoguess_core::{GuessBatch, ValidationError, parse_batch};

#[derive(Debug, Default)]
struct ValidationWorld {
    body: RefCell<String>,
    outcome: RefCell<Option<Result<GuessBatch, ValidationError>>>,
}

impl ValidationWorld {
    fn set_body(&self, body: &str) {
        self.body.replace(body.to_owned());
    }

    fn expect_error(&self) -> ValidationError {
        match self.outcome.take() {
            Some(Err(err)) => err,
            Some(Ok(batch)) => panic!("expected validation failure, got {batch:?}"),
            None => panic!("validation has not run"),
        }
    }
}

#[fixture]
fn world() -> ValidationWorld {
    ValidationWorld::default()
}

#[given("a request body with two well-formed guesses")]
fn given_two_guesses(world: &ValidationWorld) {
    world.set_body(
        r#"[
            {"panoId":"first","clickedLat":1,"clickedLng":2,"actualLat":3,"actualLng":4},
            {"panoId":"second","clickedLat":5,"clickedLng":6,"actualLat":7,"actualLng":8}
        ]"#,
    );
}

#[given("a request body whose second guess has no panoId")]
fn given_missing_pano_id(world: &ValidationWorld) {
    world.set_body(
        r#"[
            {"panoId":"first","clickedLat":1,"clickedLng":2,"actualLat":3,"actualLng":4},
            {"clickedLat":5,"clickedLng":6,"actualLat":7,"actualLng":8}
        ]"#,
    );
}

#[given("a request body whose first guess has a string latitude")]
fn given_string_latitude(world: &ValidationWorld) {
    world.set_body(
        r#"[{"panoId":"first","clickedLat":"1","clickedLng":2,"actualLat":3,"actualLng":4}]"#,
    );
}

#[given("an empty request body array")]
fn given_empty_array(world: &ValidationWorld) {
    world.set_body("[]");
}

#[when("I validate the request body")]
fn validate(world: &ValidationWorld) {
    let outcome = parse_batch(&world.body.borrow());
    world.outcome.replace(Some(outcome));
}

#[then("the batch holds two guesses in submission order")]
fn then_two_guesses(world: &ValidationWorld) {
    let batch = match world.outcome.take() {
        Some(Ok(batch)) => batch,
        other => panic!("expected a valid batch, got {other:?}"),
    };
    let ids: Vec<_> = batch.iter().map(|guess| guess.pano_id.clone()).collect();
    assert_eq!(ids, ["first", "second"]);
}

#[then("validation fails naming the second guess")]
fn then_names_second(world: &ValidationWorld) {
    let err = world.expect_error();
    assert!(matches!(err, ValidationError::MissingPanoId { index: 1 }));
    assert!(err.to_string().contains("item 1"));
}

#[then("validation fails with a non-numeric coordinate error")]
fn then_non_numeric(world: &ValidationWorld) {
    let err = world.expect_error();
    assert!(matches!(
        err,
        ValidationError::NonNumericCoordinate {
            index: 0,
            field: "clickedLat"
        }
    ));
}

#[then("validation fails because the batch is empty")]
fn then_empty(world: &ValidationWorld) {
    assert!(matches!(world.expect_error(), ValidationError::EmptyBatch));
}

#[scenario(path = "tests/features/batch_validation.feature", index = 0)]
fn accepts_well_formed(world: ValidationWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/batch_validation.feature", index = 1)]
fn rejects_missing_pano_id(world: ValidationWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/batch_validation.feature", index = 2)]
fn rejects_string_coordinate(world: ValidationWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/batch_validation.feature", index = 3)]
fn rejects_empty_array(world: ValidationWorld) {
    let _ = world;
}
