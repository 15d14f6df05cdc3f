use chrono::{DateTime, Utc};
use mockito::{Matcher, Server, ServerGuard};
use octolog::config::OctopusConfig;
use octolog::error::OctologError;
use octolog::jobs;
use octolog::octopus::types::Account;
use octolog::octopus::{AccountInfo, MeterKind, Octopus, OctopusClient, ProductFilter, Region};
use octolog::tariff::PriceBasis;
use serde_json::json;

const ACCOUNT_PATH: &str = "/v1/accounts/A-1234ABCD/";
const AUTH: &str = "Basic c2tfdGVzdDo=";
const ELEC_TARIFF: &str = "/v1/products/AGILE-24-10-01/electricity-tariffs/E-1R-AGILE-24-10-01-C";
const GAS_TARIFF: &str = "/v1/products/VAR-22-11-01/gas-tariffs/G-1R-VAR-22-11-01-C";

fn now() -> DateTime<Utc> {
    "2024-03-31T12:10:00Z".parse().unwrap()
}

fn config(server: &ServerGuard, api_key: &str) -> OctopusConfig {
    OctopusConfig {
        api_key: api_key.to_string(),
        base_url: server.url(),
        ..OctopusConfig::default()
    }
}

fn account_json() -> serde_json::Value {
    json!({
        "number": "A-1234ABCD",
        "properties": [{
            "id": 1,
            "electricity_meter_points": [{
                "mpan": "1200000000001",
                "is_export": false,
                "meters": [{"serial_number": "21L1"}],
                "agreements": [{"tariff_code": "E-1R-AGILE-24-10-01-C",
                                "valid_from": "2024-01-01T00:00:00Z", "valid_to": null}]
            }],
            "gas_meter_points": [{
                "mprn": "9000000001",
                "meters": [{"serial_number": "G4P1"}],
                "agreements": [{"tariff_code": "G-1R-VAR-22-11-01-C",
                                "valid_from": "2023-11-01T00:00:00Z", "valid_to": null}]
            }]
        }]
    })
}

fn page(results: serde_json::Value) -> String {
    json!({"count": 0, "next": null, "previous": null, "results": results}).to_string()
}

fn resolved(server: &ServerGuard) -> Octopus {
    let client = OctopusClient::new(&config(server, "sk_test")).unwrap();
    let account: Account = serde_json::from_value(account_json()).unwrap();
    let info = AccountInfo::resolve(&account, now()).unwrap();
    Octopus::from_parts(client, info, PriceBasis::IncVat)
}

#[tokio::test]
async fn connect_prefers_meter_point_region() {
    let mut server = Server::new_async().await;
    let account = server
        .mock("GET", ACCOUNT_PATH)
        .match_header("authorization", AUTH)
        .with_status(200)
        .with_body(account_json().to_string())
        .create_async()
        .await;
    let point = server
        .mock("GET", "/v1/electricity-meter-points/1200000000001/")
        .match_header("authorization", AUTH)
        .with_status(200)
        .with_body(json!({"gsp": "_J", "mpan": "1200000000001", "profile_class": 1}).to_string())
        .create_async()
        .await;

    let mut cfg = config(&server, "sk_test");
    cfg.account = "A-1234ABCD".to_string();
    let octopus = Octopus::connect(&cfg, now()).await.unwrap();

    assert_eq!(octopus.account_number(), "A-1234ABCD");
    assert_eq!(octopus.region(), Some(Region::J));
    assert_eq!(octopus.info().meters(MeterKind::Gas).len(), 1);
    account.assert_async().await;
    point.assert_async().await;
}

#[tokio::test]
async fn connect_keeps_tariff_region_when_meter_point_fails() {
    let mut server = Server::new_async().await;
    let _account = server
        .mock("GET", ACCOUNT_PATH)
        .with_status(200)
        .with_body(account_json().to_string())
        .create_async()
        .await;
    let _point = server
        .mock("GET", "/v1/electricity-meter-points/1200000000001/")
        .with_status(500)
        .create_async()
        .await;

    let mut cfg = config(&server, "sk_test");
    cfg.account = "A-1234ABCD".to_string();
    let octopus = Octopus::connect(&cfg, now()).await.unwrap();

    // from the -C suffix of the tariff code
    assert_eq!(octopus.region(), Some(Region::C));
}

#[tokio::test]
async fn connect_with_postcode_uses_group_id() {
    let mut server = Server::new_async().await;
    let gsp = server
        .mock("GET", "/v1/industry/grid-supply-points/")
        .match_query(Matcher::UrlEncoded("postcode".into(), "SW1A 1AA".into()))
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(page(json!([{"group_id": "_C"}])))
        .create_async()
        .await;

    let mut cfg = config(&server, "");
    cfg.postcode = " SW1A 1AA ".to_string();
    let octopus = Octopus::connect(&cfg, now()).await.unwrap();

    assert_eq!(octopus.account_number(), "");
    assert_eq!(octopus.region(), Some(Region::C));
    assert!(octopus.info().meters(MeterKind::Import).is_empty());
    gsp.assert_async().await;
}

#[tokio::test]
async fn current_prices_pick_the_window_in_force() {
    let mut server = Server::new_async().await;
    let _import = server
        .mock("GET", format!("{}/standard-unit-rates/", ELEC_TARIFF).as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page(json!([
            {"value_exc_vat": 19.0, "value_inc_vat": 20.0,
             "valid_from": "2024-03-31T12:30:00Z", "valid_to": "2024-03-31T13:00:00Z"},
            {"value_exc_vat": 14.25, "value_inc_vat": 15.0,
             "valid_from": "2024-03-31T12:00:00Z", "valid_to": "2024-03-31T12:30:00Z"},
            {"value_exc_vat": 9.5, "value_inc_vat": 10.0,
             "valid_from": "2024-03-31T11:30:00Z", "valid_to": "2024-03-31T12:00:00Z"}
        ])))
        .create_async()
        .await;
    let _gas = server
        .mock("GET", format!("{}/standard-unit-rates/", GAS_TARIFF).as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page(json!([
            {"value_exc_vat": 6.5, "value_inc_vat": 6.83, "payment_method": "NON_DIRECT_DEBIT",
             "valid_from": "2024-01-01T00:00:00Z", "valid_to": null},
            {"value_exc_vat": 5.9, "value_inc_vat": 6.2, "payment_method": "DIRECT_DEBIT",
             "valid_from": "2024-01-01T00:00:00Z", "valid_to": null}
        ])))
        .create_async()
        .await;

    let octopus = resolved(&server);
    assert_eq!(octopus.current_import_price(now()).await.unwrap(), Some(15.0));
    assert_eq!(octopus.current_gas_price(now()).await.unwrap(), Some(6.2));
    // no export meter, no request
    assert_eq!(octopus.current_export_price(now()).await.unwrap(), None);
}

#[tokio::test]
async fn standing_charges_skip_ended_and_other_payment_windows() {
    let mut server = Server::new_async().await;
    let _electricity = server
        .mock("GET", format!("{}/standing-charges/", ELEC_TARIFF).as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page(json!([
            {"value_exc_vat": 45.0, "value_inc_vat": 47.25,
             "valid_from": "2024-04-01T00:00:00Z", "valid_to": null},
            {"value_exc_vat": 40.0, "value_inc_vat": 42.0,
             "valid_from": "2024-01-01T00:00:00Z", "valid_to": "2024-04-01T00:00:00Z"}
        ])))
        .create_async()
        .await;
    let _gas = server
        .mock("GET", format!("{}/standing-charges/", GAS_TARIFF).as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page(json!([
            {"value_exc_vat": 30.0, "value_inc_vat": 31.5, "payment_method": "NON_DIRECT_DEBIT",
             "valid_from": "2024-01-01T00:00:00Z", "valid_to": null},
            {"value_exc_vat": 27.0, "value_inc_vat": 28.35, "payment_method": "DIRECT_DEBIT",
             "valid_from": "2024-01-01T00:00:00Z", "valid_to": null}
        ])))
        .create_async()
        .await;

    let octopus = resolved(&server);
    assert_eq!(octopus.electricity_standing_charge(now()).await.unwrap(), Some(42.0));
    assert_eq!(octopus.gas_standing_charge(now()).await.unwrap(), Some(28.35));
}

#[tokio::test]
async fn product_is_cut_to_the_account_region() {
    let mut server = Server::new_async().await;
    let tariff = |code: &str| json!({"direct_debit_monthly": {"code": code, "standing_charge_inc_vat": 47.25}});
    let product = server
        .mock("GET", "/v1/products/AGILE-24-10-01/")
        .match_query(Matcher::UrlEncoded(
            "tariffs_active_at".into(),
            "2024-03-31T12:10Z".into(),
        ))
        .with_status(200)
        .with_body(
            json!({
                "code": "AGILE-24-10-01",
                "full_name": "Agile Octopus October 2024 v1",
                "single_register_electricity_tariffs": {
                    "_A": tariff("E-1R-AGILE-24-10-01-A"),
                    "_C": tariff("E-1R-AGILE-24-10-01-C"),
                    "_P": tariff("E-1R-AGILE-24-10-01-P")
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let octopus = resolved(&server);
    let found = octopus.import_product(now()).await.unwrap().unwrap();
    let regions: Vec<_> = found.single_register_electricity_tariffs.keys().collect();
    assert_eq!(regions, vec!["_C"]);
    assert!(octopus.export_product(now()).await.unwrap().is_none());
    product.assert_async().await;
}

#[tokio::test]
async fn product_filter_flags_reach_the_query() {
    let mut server = Server::new_async().await;
    let catalogue = server
        .mock("GET", "/v1/products/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("is_variable".into(), "true".into()),
            Matcher::UrlEncoded("is_business".into(), "false".into()),
        ]))
        .with_status(200)
        .with_body(page(json!([
            {"code": "AGILE-24-10-01", "direction": "IMPORT", "is_variable": true},
            {"code": "VAR-22-11-01", "direction": "IMPORT", "is_variable": true}
        ])))
        .create_async()
        .await;

    let client = OctopusClient::new(&config(&server, "")).unwrap();
    let filter = ProductFilter {
        is_variable: Some(true),
        is_business: Some(false),
        ..ProductFilter::default()
    };
    let products = client.products(filter).await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].code, "AGILE-24-10-01");
    catalogue.assert_async().await;
}

#[tokio::test]
async fn raw_job_prints_account_json() {
    let mut server = Server::new_async().await;
    let _account = server
        .mock("GET", ACCOUNT_PATH)
        .match_header("authorization", AUTH)
        .with_status(200)
        .with_body(account_json().to_string())
        .create_async()
        .await;

    let octopus = resolved(&server);
    let text = jobs::raw_account(&octopus).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["number"], "A-1234ABCD");
    // pretty printed
    assert!(text.contains("\n  \"number\""));
}

#[tokio::test]
async fn raw_without_account_sends_nothing() {
    let mut server = Server::new_async().await;
    let never = server
        .mock("GET", Matcher::Regex("^/v1/accounts/".into()))
        .expect(0)
        .create_async()
        .await;

    let client = OctopusClient::new(&config(&server, "sk_test")).unwrap();
    let octopus = Octopus::from_parts(client, AccountInfo::anonymous(Some(Region::C)), PriceBasis::IncVat);
    let err = octopus.raw_account().await.unwrap_err();
    assert!(matches!(err, OctologError::Config { .. }));
    never.assert_async().await;
}
