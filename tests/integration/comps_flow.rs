//! Search, subject details and comparables against a local server.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use compscope::commands;
use compscope::models::property::Property;
use compscope::models::search::SearchFilters;
use compscope::services::notice::NoticeLevel;
use compscope_core::RepairInputs;

use crate::support::{json_response, MockApi};

fn comp(n: usize) -> Value {
    json!({
        "_id": format!("comp-{}", n),
        "address": format!("{} Elm St", n),
        "salePrice": 300000 + n * 1000,
        "distance": 0.4
    })
}

#[tokio::test]
async fn test_search_select_and_find_comparables() {
    let subject = json!({
        "zpid": "2077",
        "address": "12 Oak St",
        "city": "Austin",
        "state": "TX",
        "squareFootage": 1500,
        "latitude": 30.27,
        "longitude": -97.74,
        "price": 350000
    });
    let comps: Vec<Value> = (1..=6).map(comp).collect();
    let api = MockApi::start(vec![
        json_response(200, json!({"success": true, "data": [subject, {"zpid": "3001"}]})),
        json_response(
            200,
            json!({
                "success": true,
                "property": {"zpid": "2077", "lotSize": 6000, "images": ["a.jpg", "b.jpg"]},
                "images": ["a.jpg", "b.jpg"]
            }),
        ),
        json_response(
            200,
            json!({"success": true, "propertyId": "db-1", "count": 6, "data": comps}),
        ),
    ])
    .await;
    let state = api.state();
    let mut notices = state.notifier().subscribe();

    let filters = SearchFilters {
        city: Some("Austin".into()),
        state: Some("TX".into()),
        ..SearchFilters::default()
    };
    let found = commands::search_properties(&state, filters).await;
    assert_eq!(found.data.map(|r| r.count), Some(2));
    assert_eq!(notices.recv().await.unwrap().message, "Found 2 properties");

    let selected = commands::select_property(&state, "1", vec![]).await;
    assert_eq!(selected.data.and_then(|p| p.any_id()), Some("2077".to_string()));

    let details = commands::fetch_property_details(&state).await;
    let details = details.data.unwrap();
    assert_eq!(details.subject_images(), vec!["a.jpg".to_string(), "b.jpg".to_string()]);
    assert_eq!(
        notices.recv().await.unwrap().message,
        "Fetched property details with 2 images"
    );

    let list = commands::find_comparables(&state).await;
    assert!(list.success, "{:?}", list.error);
    assert_eq!(list.data.map(|l| l.count), Some(6));
    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Found 6 sold comparable properties");

    // Server id replaces the source id on the subject and in the results
    let subject = state.comps().selected_property().unwrap();
    assert_eq!(subject.get("_id"), Some(&json!("db-1")));
    let results = state.comps().search_results();
    assert_eq!(results.properties[0].get("_id"), Some(&json!("db-1")));

    let requests = api.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].path, "/api/property/searchproperties");
    assert_eq!(requests[0].body["city"], "Austin");
    assert_eq!(requests[1].path, "/api/property/fetch-details");
    assert_eq!(requests[1].body["zpid"], "2077");
    assert_eq!(requests[2].path, "/api/comps/find/2077");
    assert_eq!(requests[2].body["timeWindowMonths"], 12);
    assert_eq!(requests[2].body["maxResults"], 1000);
    assert_eq!(requests[2].body["propertyData"]["city"], "Austin");
    assert_eq!(requests[2].body["propertyData"]["latitude"], 30.27);

    for n in 1..=5 {
        let toggled = commands::toggle_comp(&state, &format!("comp-{}", n), true);
        assert!(toggled.success);
    }
    let sixth = commands::toggle_comp(&state, "comp-6", true);
    assert!(!sixth.success);
    assert!(sixth.error.unwrap().contains("Maximum 5 comparables"));
    assert_eq!(state.comps().selection().len(), 5);

    let total = commands::set_repair_inputs(
        &state,
        RepairInputs {
            needs_roof: true,
            add_buffer: true,
            ..RepairInputs::default()
        },
    );
    assert_eq!(total.data, Some(62150));
    assert_eq!(state.comps().mao_inputs().estimated_repairs, 62150.0);
}

#[tokio::test]
async fn test_find_comparables_not_found() {
    let api = MockApi::start(vec![json_response(404, json!({"message": "no such property"}))]).await;
    let state = api.state();
    let subject = Property::from_value(json!({
        "_id": "subject-1",
        "address": "12 Oak St",
        "city": "Austin",
        "state": "TX"
    }))
    .unwrap();
    state.comps().select_property(subject, vec![]).unwrap();

    let response = commands::find_comparables(&state).await;
    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("Property not found. Please try a different property.")
    );
    let stored = state.comps().comparables();
    assert_eq!(
        stored.error.as_deref(),
        Some("Property not found. Please try a different property.")
    );
    assert!(stored.data.is_empty());
}

#[tokio::test]
async fn test_no_comparables_is_informational() {
    let api = MockApi::start(vec![json_response(
        200,
        json!({"success": true, "count": 0, "data": []}),
    )])
    .await;
    let state = api.state();
    let subject = Property::from_value(json!({
        "_id": "subject-1",
        "address": "12 Oak St",
        "city": "Austin",
        "state": "TX"
    }))
    .unwrap();
    state.comps().select_property(subject, vec![]).unwrap();
    let mut notices = state.notifier().subscribe();

    let response = commands::find_comparables(&state).await;
    assert!(response.success);
    assert!(response.data.unwrap().is_empty());
    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Info);
    assert!(notice.message.starts_with("No comparable properties found."));
}

#[tokio::test]
async fn test_lookup_miss_reports_not_found() {
    let api = MockApi::start(vec![json_response(200, json!({"success": false}))]).await;
    let state = api.state();
    let mut notices = state.notifier().subscribe();

    let response = commands::lookup_address(&state, "  1 Nowhere Rd, Austin, TX ").await;
    assert_eq!(response.data.map(|r| r.count), Some(0));
    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Property not found for the given address");
    assert_eq!(api.requests()[0].body["address"], "1 Nowhere Rd, Austin, TX");
}
