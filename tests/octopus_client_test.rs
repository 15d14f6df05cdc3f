use mockito::{Matcher, Server};
use octolog::config::OctopusConfig;
use octolog::error::OctologError;
use octolog::octopus::{
    Consumption, Endpoint, Grouping, MeterKind, MeterRef, OctopusClient, Period, Query, Rate,
    RateSeries, TariffCode,
};
use serde_json::json;

const CONSUMPTION_PATH: &str = "/v1/electricity-meter-points/1200000000001/meters/21L1/consumption/";
const AUTH: &str = "Basic c2tfdGVzdDo=";

fn client(url: &str, api_key: &str, max_pages: u32) -> OctopusClient {
    let config = OctopusConfig {
        api_key: api_key.to_string(),
        base_url: url.to_string(),
        max_pages,
        ..OctopusConfig::default()
    };
    OctopusClient::new(&config).unwrap()
}

fn meter() -> MeterRef {
    MeterRef::new("1200000000001", "21L1")
}

fn reading(start: &str, kwh: f64) -> serde_json::Value {
    json!({
        "consumption": kwh,
        "interval_start": start,
        "interval_end": start,
    })
}

#[tokio::test]
async fn follows_next_links_and_sends_auth() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", CONSUMPTION_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("group_by".into(), "day".into()),
            Matcher::UrlEncoded("page_size".into(), "25000".into()),
            Matcher::UrlEncoded("period_from".into(), "2024-03-01T00:00Z".into()),
        ]))
        .match_header("authorization", AUTH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "count": 3,
                "next": format!("{}/pages/2", server.url()),
                "previous": null,
                "results": [
                    reading("2024-03-01T00:00:00Z", 10.5),
                    reading("2024-03-02T00:00:00Z", 11.0),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/pages/2")
        .match_header("authorization", AUTH)
        .with_status(200)
        .with_body(
            json!({
                "count": 3,
                "next": null,
                "previous": CONSUMPTION_PATH,
                "results": [reading("2024-03-03T00:00:00Z", 9.25)]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let c = client(&server.url(), "sk_test", 10);
    let today = chrono::NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    let query = Query::new()
        .period(Period::days_ago(today, 30, 30).unwrap())
        .group_by(Grouping::Day);
    let records: Vec<Consumption> = c.consumption(MeterKind::Import, &meter(), query).await.unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[2].consumption, 9.25);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn pages_are_lazy_and_restartable() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/v1/industry/grid-supply-points/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({"count": 1, "next": null, "results": [{"group_id": "_C"}]}).to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let c = client(&server.url(), "", 10);
    let query = Query::new().postcode("SW1A 1AA");
    let mut pages = c
        .pages::<serde_json::Value>(&Endpoint::SupplyPoints, &query)
        .unwrap();
    assert_eq!(pages.pages_fetched(), 0);

    let page = pages.next_page().await.unwrap().unwrap();
    assert_eq!(page.results.len(), 1);
    assert!(pages.next_page().await.unwrap().is_none());

    pages.restart();
    assert!(pages.next_page().await.unwrap().is_some());
    assert_eq!(pages.pages_fetched(), 1);
    first.assert_async().await;
}

#[tokio::test]
async fn page_cap_stops_endless_chains() {
    let mut server = Server::new_async().await;
    let url = server.url();
    for n in 1..=3 {
        server
            .mock("GET", format!("/chain/{}", n).as_str())
            .with_status(200)
            .with_body(
                json!({"count": 9, "next": format!("{}/chain/{}", url, n + 1), "results": []})
                    .to_string(),
            )
            .create_async()
            .await;
    }
    let _start = server
        .mock("GET", "/v1/products/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"count": 9, "next": format!("{}/chain/1", url), "results": []}).to_string())
        .create_async()
        .await;

    let c = client(&url, "", 3);
    let err = c
        .fetch_all::<serde_json::Value>(&Endpoint::Products, &Query::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OctologError::Pagination { .. }));
}

#[tokio::test]
async fn looping_next_link_is_an_error() {
    let mut server = Server::new_async().await;
    let url = server.url();
    let _looping = server
        .mock("GET", "/v1/products/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({"count": 1, "next": format!("{}/v1/products/", url), "results": []}).to_string(),
        )
        .create_async()
        .await;

    let c = client(&url, "", 100);
    let err = c
        .fetch_all::<serde_json::Value>(&Endpoint::Products, &Query::new().page_size(1))
        .await
        .unwrap_err();
    // the first URL carries page_size, the link does not, so the loop shows on the third page
    assert!(matches!(err, OctologError::Pagination { .. }));
}

#[tokio::test]
async fn error_statuses_are_mapped() {
    let mut server = Server::new_async().await;
    let _missing = server
        .mock("GET", "/v1/products/NOPE/")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body("{\"detail\": \"Not found.\"}")
        .create_async()
        .await;
    let _denied = server
        .mock("GET", "/v1/accounts/A-1/")
        .with_status(401)
        .create_async()
        .await;
    let _throttled = server
        .mock("GET", "/v1/industry/grid-supply-points/")
        .match_query(Matcher::Any)
        .with_status(429)
        .create_async()
        .await;

    let c = client(&server.url(), "sk_test", 10);

    match c.product("NOPE", None).await {
        Err(OctologError::Http { status, body }) => {
            assert_eq!(status, 404);
            assert!(body.contains("Not found"));
        }
        other => panic!("expected Http error, got {:?}", other.map(|p| p.code)),
    }
    assert!(matches!(
        c.account("A-1").await,
        Err(OctologError::Auth { .. })
    ));
    assert!(matches!(
        c.grid_supply_points("SW1A").await,
        Err(OctologError::RateLimited)
    ));
}

#[tokio::test]
async fn missing_key_sends_nothing() {
    let mut server = Server::new_async().await;
    let never = server
        .mock("GET", CONSUMPTION_PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let c = client(&server.url(), "", 10);
    let err = c
        .consumption(MeterKind::Import, &meter(), Query::new())
        .await
        .unwrap_err();
    match err {
        OctologError::ApiKeyMissing { endpoint } => assert_eq!(endpoint, "ElectricityConsumption"),
        other => panic!("unexpected {}", other),
    }
    never.assert_async().await;
}

#[tokio::test]
async fn unit_rates_hit_tariff_path_without_auth() {
    let mut server = Server::new_async().await;
    let rates = server
        .mock(
            "GET",
            "/v1/products/AGILE-24-10-01/electricity-tariffs/E-1R-AGILE-24-10-01-C/standard-unit-rates/",
        )
        .match_query(Matcher::Any)
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(
            json!({
                "count": 1,
                "next": null,
                "results": [{
                    "value_exc_vat": 20.0, "value_inc_vat": 21.0,
                    "valid_from": "2024-03-01T00:00:00Z", "valid_to": "2024-03-01T00:30:00Z",
                    "payment_method": null
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let c = client(&server.url(), "sk_test", 10);
    let tariff = TariffCode::new("E-1R-AGILE-24-10-01-C").unwrap();
    let result: Vec<Rate> = c
        .unit_rates(&tariff, RateSeries::ElectricityStandard, Query::new())
        .await
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].value_inc_vat, 21.0);
    rates.assert_async().await;
}
