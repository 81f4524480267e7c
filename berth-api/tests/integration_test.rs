use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use berth_api::{
    app,
    metrics::BookingMetrics,
    middleware::issue_token,
    state::{AppState, AuthConfig},
};
use berth_booking::{BookingOrchestrator, PnrMinter, SearchProjector};
use berth_catalog::{ClassConfig, FareClass, RunningDay, Station, Train};
use berth_core::clock::{Clock, FixedClock};
use berth_core::events::TracingEventPublisher;
use berth_core::identity::Actor;
use berth_store::{MemoryBookingLedger, MemoryTrainRepository};
use chrono::{NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    auth: AuthConfig,
    train: Train,
}

fn karnataka_express() -> Train {
    let mut classes = BTreeMap::new();
    classes.insert(FareClass::Sleeper, ClassConfig { total_seats: Some(72), fare: Some(485) });
    classes.insert(FareClass::ThreeTierAc, ClassConfig { total_seats: Some(64), fare: Some(1280) });
    let stop = |code: &str, name: &str, distance| Station {
        station_code: code.to_string(),
        station_name: name.to_string(),
        arrival_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        departure_time: NaiveTime::from_hms_opt(8, 10, 0).unwrap(),
        distance,
    };
    Train {
        id: Uuid::new_v4(),
        train_number: "12627".to_string(),
        train_name: "Karnataka Express".to_string(),
        source: "NDLS".to_string(),
        destination: "SBC".to_string(),
        stations: vec![stop("AGC", "Agra Cantt", 188), stop("BPL", "Bhopal Jn", 707)],
        classes,
        running_days: RunningDay::EVERY_DAY.to_vec(),
        duration: "31h 40m".to_string(),
    }
}

fn test_app() -> TestApp {
    let train = karnataka_express();
    let trains = Arc::new(MemoryTrainRepository::with_trains(vec![train.clone()]));
    let ledger = Arc::new(MemoryBookingLedger::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));

    let orchestrator = BookingOrchestrator::new(
        trains.clone(),
        ledger,
        clock.clone(),
        Arc::new(TracingEventPublisher),
        PnrMinter::new(StdRng::seed_from_u64(12627), 5),
    );
    let search = SearchProjector::new(trains.clone(), orchestrator.calculator().clone(), clock);
    let auth = AuthConfig {
        secret: SECRET.to_string(),
        expiration: 3600,
    };

    let state = AppState {
        bookings: Arc::new(orchestrator),
        search: Arc::new(search),
        trains,
        redis: None,
        metrics: Arc::new(BookingMetrics::new().unwrap()),
        auth: auth.clone(),
        rate_limit_per_minute: 100,
    };

    TestApp {
        router: app(state),
        auth,
        train,
    }
}

impl TestApp {
    fn token(&self, actor: &Actor) -> String {
        issue_token(&self.auth, actor).unwrap()
    }

    async fn send(&self, method: Method, uri: &str, actor: Option<&Actor>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(actor)));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    fn booking_body(&self, passengers: usize) -> Value {
        let passengers: Vec<Value> = (0..passengers)
            .map(|i| json!({ "name": format!("Traveller {}", i), "age": 34, "gender": "Male" }))
            .collect();
        json!({
            "trainId": self.train.id,
            "travelDate": "2025-03-01",
            "class": "SL",
            "passengers": passengers,
        })
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();
    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_booking_requires_a_token() {
    let app = test_app();
    let (status, _) = app
        .send(Method::POST, "/api/bookings", None, Some(app.booking_body(1)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_book_until_capacity_then_search_reflects_it() {
    let app = test_app();
    let user = Actor::user(Uuid::new_v4());

    let (status, body) = app
        .send(Method::POST, "/api/bookings", Some(&user), Some(app.booking_body(70)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["totalFare"], 33950);
    assert_eq!(body["booking"]["status"], "Confirmed");
    assert_eq!(body["booking"]["class"], "SL");
    assert_eq!(body["booking"]["PNR"].as_str().unwrap().len(), 10);
    assert_eq!(body["booking"]["passengers"][0]["name"], "Traveller 0");

    let (status, body) = app
        .send(Method::POST, "/api/bookings", Some(&user), Some(app.booking_body(3)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "CapacityExceeded");
    assert_eq!(body["availableSeats"], 2);
    assert_eq!(body["error"], "Only 2 seats available in SL class");

    let (status, body) = app
        .send(
            Method::GET,
            "/api/trains/search?source=agra&destination=SBC&date=2025-03-01",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let trains = body["trains"].as_array().unwrap();
    assert_eq!(trains.len(), 1);
    assert_eq!(trains[0]["trainNumber"], "12627");
    assert_eq!(trains[0]["availability"]["SL"]["availableSeats"], 2);
    assert_eq!(trains[0]["availability"]["SL"]["totalSeats"], 72);
    assert_eq!(trains[0]["availability"]["3A"]["availableSeats"], 64);

    let (_, metrics) = app.send(Method::GET, "/metrics", None, None).await;
    let text = metrics.as_str().unwrap();
    assert!(text.contains("berth_bookings_created_total 1"));
    assert!(text.contains(r#"berth_booking_rejections_total{kind="CapacityExceeded"} 1"#));
}

#[tokio::test]
async fn test_validation_errors_map_to_bad_request() {
    let app = test_app();
    let user = Actor::user(Uuid::new_v4());

    let mut past = app.booking_body(1);
    past["travelDate"] = json!("2025-02-28");
    let (status, body) = app.send(Method::POST, "/api/bookings", Some(&user), Some(past)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidRequest");
    assert_eq!(body["error"], "Travel date cannot be in the past");

    let mut unknown = app.booking_body(1);
    unknown["trainId"] = json!(Uuid::new_v4());
    let (status, body) = app.send(Method::POST, "/api/bookings", Some(&user), Some(unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Train not found");

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/bookings")
                .header(header::AUTHORIZATION, format!("Bearer {}", app.token(&user)))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_flow_and_ownership() {
    let app = test_app();
    let owner = Actor::user(Uuid::new_v4());
    let stranger = Actor::user(Uuid::new_v4());
    let admin = Actor::admin(Uuid::new_v4());

    let (_, body) = app
        .send(Method::POST, "/api/bookings", Some(&owner), Some(app.booking_body(2)))
        .await;
    let pnr = body["booking"]["PNR"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(Method::GET, &format!("/api/bookings/pnr/{}", pnr), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::PUT, &format!("/api/bookings/cancel/{}", pnr), Some(&stranger), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "Forbidden");

    let (status, body) = app
        .send(Method::PUT, &format!("/api/bookings/cancel/{}", pnr), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["status"], "Cancelled");
    assert_eq!(body["booking"]["totalFare"], 970);

    let (status, body) = app
        .send(Method::PUT, &format!("/api/bookings/cancel/{}", pnr), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidState");

    let (status, body) = app.send(Method::GET, "/api/bookings", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bookings"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(Method::GET, "/api/bookings/pnr/0000000000", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_train_management() {
    let app = test_app();
    let user = Actor::user(Uuid::new_v4());
    let admin = Actor::admin(Uuid::new_v4());

    let (status, _) = app.send(Method::GET, "/api/trains", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let new_train = json!({
        "trainNumber": "16235",
        "trainName": "Mysore Express",
        "source": "MAS",
        "destination": "KRR",
        "stations": [
            { "stationCode": "SA", "stationName": "Salem Jn", "arrivalTime": "02:30", "departureTime": "02:35", "distance": 340 }
        ],
        "classes": { "SL": { "totalSeats": 72, "fare": 180 } },
        "runningDays": ["Monday", "Tuesday"],
        "duration": "7h 00m"
    });
    let (status, body) = app
        .send(Method::POST, "/api/trains", Some(&admin), Some(new_train.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["train"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.send(Method::POST, "/api/trains", Some(&admin), Some(new_train)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Train 16235 already exists");

    let (status, body) = app.send(Method::GET, &format!("/api/trains/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["train"]["stations"][0]["arrivalTime"], "02:30");

    let (status, body) = app.send(Method::GET, "/api/trains", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trains"].as_array().unwrap().len(), 2);

    let (status, _) = app.send(Method::GET, "/api/trains/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
