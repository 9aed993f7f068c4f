mod common;

use common::{
    OWNER_ID, Scripted, client, detail, hits, releases, route, saved, status,
};
use rtc_core::ErrorCode;
use rtc_core::lifecycle::LifecycleAction;
use rtc_core::model::{IterationSelector, NewWorkItem, WorkItemUpdate};
use rtc_core::query::{FilterOp, QuerySpec};
use rtc_core::transport::{Cookie, HttpResponse, Method};

const DETAIL_1001: &str = include_str!("fixtures/detail_1001.xml");
const ALL_VALUES: &str = include_str!("fixtures/all_values.xml");

fn form_value(body: &str, name: &str) -> Option<String> {
    body.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| urlencoding::decode(value).expect("utf-8").into_owned())
    })
}

// Session and login

#[test]
fn login_then_requests_carry_every_cookie() {
    let check = HttpResponse::new(
        302,
        vec![
            ("Set-Cookie".into(), "JSESSIONID=abc; Path=/jazz".into()),
            ("Location".into(), "https://jazz.example.com/jazz/web".into()),
        ],
        Vec::new(),
    );
    let init = HttpResponse::new(
        200,
        vec![("Set-Cookie".into(), "LtpaToken2=tok; Secure".into())],
        Vec::new(),
    );
    let exchange = Scripted::new()
        .on(route::LOGIN_CHECK, check)
        .on(route::INITIALIZER, init)
        .on_xml(&route::retrieve("1001"), &hits(&[("1001", "Fix crash", "Defect")]));

    let mut rtc = client(exchange);
    rtc.login().expect("login");
    rtc.retrieve("1001").expect("retrieve");

    let jar = rtc.session().jar();
    assert_eq!(
        jar.cookies(),
        &[Cookie::new("JSESSIONID", "abc"), Cookie::new("LtpaToken2", "tok")]
    );

    let requests = &rtc.session().exchange().requests;
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].header("Cookie"), None);
    assert_eq!(requests[1].header("Cookie"), Some("JSESSIONID=abc"));
    assert_eq!(
        requests[2].header("Cookie"),
        Some("JSESSIONID=abc; LtpaToken2=tok")
    );
    assert!(requests[0].url.contains("j_username=fcoury&j_password=s3cret"));
}

#[test]
fn login_redirect_to_authfailed_is_an_auth_error() {
    let check = HttpResponse::new(
        302,
        vec![(
            "Location".into(),
            "https://jazz.example.com/jazz/authenticated/authfailed".into(),
        )],
        Vec::new(),
    );
    let mut rtc = client(Scripted::new().on(route::LOGIN_CHECK, check));

    let err = rtc.login().expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::AuthFailed);
    assert!(err.to_string().contains("fcoury"));
    assert_eq!(rtc.session().exchange().requests.len(), 1);
}

#[test]
fn login_initializer_failure_is_reported() {
    let exchange = Scripted::new()
        .on(route::LOGIN_CHECK, status(200))
        .on(route::INITIALIZER, status(503));
    let err = client(exchange).login().expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::HttpStatus);
    assert!(err.to_string().contains("503"));
}

#[test]
fn login_check_failure_does_not_echo_the_password() {
    let exchange = Scripted::new().on(route::LOGIN_CHECK, status(500));
    let err = client(exchange).login().expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::HttpStatus);
    let msg = err.to_string();
    assert!(msg.contains("j_security_check"), "{msg}");
    assert!(!msg.contains("s3cret"), "{msg}");
}

// Reads

#[test]
fn retrieve_returns_the_single_hit() {
    let exchange =
        Scripted::new().on_xml(&route::retrieve("1001"), &hits(&[("1001", "Fix crash", "Defect")]));
    let item = client(exchange).retrieve("1001").expect("retrieve");

    assert_eq!(item.id, "1001");
    assert_eq!(item.summary, "Fix crash");
    assert_eq!(item.kind, "Defect");
    assert_eq!(item.item_id, "_item1001");
    assert_eq!(item.owned_by, "Felipe Coury");
    assert_eq!(item.created_by, "Marcelo De Campos");
    assert_eq!(item.description, "<p>details</p>");
    assert!(item.location_uri.ends_with("/1001"));
}

#[test]
fn retrieve_without_hits_names_the_id() {
    let exchange = Scripted::new().on_xml(&route::retrieve("1001"), &hits(&[]));
    let err = client(exchange).retrieve("1001").expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::ItemNotFound);
    assert!(err.to_string().contains("1001"));
}

#[test]
fn http_error_status_is_not_decoded() {
    let exchange = Scripted::new().on(&route::retrieve("1001"), status(500));
    let err = client(exchange).retrieve("1001").expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::HttpStatus);
}

#[test]
fn get_work_item_merges_detail_and_links() {
    let exchange = Scripted::new()
        .on_xml(&route::retrieve("1001"), &hits(&[("1001", "Fix crash", "Defect")]))
        .on_xml(&route::detail("1001"), DETAIL_1001);
    let item = client(exchange).get_work_item("1001").expect("get");

    assert_eq!(item.state, "In Progress");
    assert_eq!(item.state_id, "_state1001");
    assert_eq!(item.estimate, "24 hours");
    assert_eq!(item.time_spent, "6 hours");
    assert_eq!(item.planned_for, "[2014] February R1, S1");
    assert_eq!(item.filed_against, "SD-OPS");
    assert_eq!(item.code_changes, "r1234");
    assert_eq!(item.resolution, "");

    assert_eq!(item.parents.len(), 1);
    assert_eq!(item.parents[0].id, "900");
    assert_eq!(item.parents[0].kind, "Story");
    let children: Vec<&str> = item.children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(children, vec!["1002", "1003"]);
}

#[test]
fn search_hits_have_no_planning_data() {
    let exchange = Scripted::new().on_xml(
        route::SEARCH,
        &hits(&[("1", "Crash on save", "Defect"), ("2", "Crash on load", "Defect")]),
    );
    let mut rtc = client(exchange);
    let items = rtc.search("crash on").expect("search");

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.planned_for == "-"));
    assert_eq!(items[1].state, "New");
    assert!(rtc.session().exchange().requests[0].url.contains("fullText=crash%20on"));
}

#[test]
fn query_posts_the_filter_expression_and_maps_rows() {
    let rows = common::envelope(
        "<value><totalCount>1</totalCount><rows><id>42</id><itemId>_item42</itemId>\
         <labels>Task</labels><labels>Write docs</labels><labels>Ana Barros</labels>\
         <labels>Felipe Coury</labels><labels>1374758469269</labels><labels>2 hours</labels>\
         <labels>SD-OPS</labels><labels>Sprint 1</labels><labels>SD-OPS</labels>\
         <labels></labels><labels>New</labels>\
         <locationUri>https://jazz.example.com/jazz/42</locationUri></rows></value>",
    );
    let mut rtc = client(Scripted::new().on_xml(route::RESULT_SET, &rows));

    let spec = QuerySpec {
        max_results: 15,
        ..QuerySpec::default()
    };
    let items = rtc.query(&spec).expect("query");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].summary, "Write docs");
    assert_eq!(items[0].owner_initials(), "FC");
    assert_eq!(items[0].planned_for, "Sprint 1");
    assert_eq!(items[0].state, "New");

    let request = &rtc.session().exchange().requests[0];
    assert_eq!(form_value(&request.body, "maxResults").as_deref(), Some("15"));
    assert_eq!(form_value(&request.body, "sortDirections").as_deref(), Some("false"));
    let json = form_value(&request.body, "jsonExpression").expect("expression");
    assert!(json.starts_with(r#"{"operator":"AND","attributeExpressions":[]"#), "{json}");
}

#[test]
fn current_work_items_are_scoped_to_owner_and_open_states() {
    let mut rtc = client(Scripted::new().on_xml(route::RESULT_SET, &common::envelope("<value/>")));
    assert!(rtc.current_work_items().expect("query").is_empty());

    let body = &rtc.session().exchange().requests[0].body;
    let json = form_value(body, "jsonExpression").expect("expression");
    let expr: serde_json::Value = serde_json::from_str(&json).expect("json");
    let exprs = expr["attributeExpressions"].as_array().expect("array");
    assert_eq!(exprs.len(), 2);
    assert_eq!(exprs[0]["attributeId"], "owner");
    assert_eq!(exprs[0]["values"][0], OWNER_ID);
    assert_eq!(exprs[1]["variables"][0]["arguments"], "open or in progress");
    assert_eq!(exprs[1]["operator"], serde_json::json!(FilterOp::Is));
}

#[test]
fn owners_come_back_sorted_by_name() {
    let mut rtc = client(Scripted::new().on_xml(route::ALL_VALUES, ALL_VALUES));
    let owners = rtc.owners().expect("owners");
    let names: Vec<&str> = owners.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Ana Barros", "Felipe Coury", "Marcelo De Campos"]);

    let tables = rtc.all_values().expect("all values");
    assert_eq!(tables["category"].get("_cat"), "SD-OPS");
    assert_eq!(tables["owner"].len(), 3);
}

// Lifecycle actions

fn action_exchange(current_state: &str, saved_state: &str) -> Scripted {
    Scripted::new()
        .on_xml(&route::detail("1001"), &detail("1001", current_state))
        .on_xml(route::SAVE, &saved("1001", saved_state))
        .on_xml(&route::retrieve("1001"), &hits(&[("1001", "Fix crash", "Defect")]))
}

#[test]
fn resolve_succeeds_when_server_reports_resolved() {
    let mut rtc = client(action_exchange("In Progress", "Resolved"));
    rtc.transition("1001", LifecycleAction::Resolve).expect("resolve");

    let saves = rtc.session().exchange().requests_to(route::SAVE);
    assert_eq!(saves.len(), 1);
    let body = &saves[0].body;
    assert_eq!(
        form_value(body, "action").as_deref(),
        Some("bugzillaWorkflow.action.resolve")
    );
    assert_eq!(form_value(body, "itemId").as_deref(), Some("_item1001"));
    assert_eq!(form_value(body, "stateId").as_deref(), Some("_state1001"));
    assert_eq!(form_value(body, "attributeIdentifiers").as_deref(), Some("internalResolution"));
}

#[test]
fn resolve_mismatch_names_expected_and_actual_state() {
    let exchange = Scripted::new()
        .on_xml(&route::detail("1001"), &detail("1001", "Open"))
        .on_xml(route::SAVE, &saved("1001", "Open"))
        .on_xml(&route::retrieve("1001"), &hits(&[("1001", "Fix crash", "Defect")]));
    let mut rtc = client(exchange);

    let err = rtc
        .transition("1001", LifecycleAction::Resolve)
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::ActionNotApplied);
    let msg = err.to_string();
    assert!(msg.contains("Resolved"), "{msg}");
    assert!(msg.contains("Open"), "{msg}");

    // Verification re-read the item after the write.
    assert_eq!(rtc.session().exchange().requests_to(&route::retrieve("1001")).len(), 1);
}

#[test]
fn invalid_transition_is_rejected_before_writing() {
    let mut rtc = client(action_exchange("Closed", "Started"));
    let err = rtc
        .transition("1001", LifecycleAction::Start)
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    assert!(err.to_string().contains("Closed"));
    assert!(rtc.session().exchange().requests_to(route::SAVE).is_empty());
}

#[test]
fn perform_action_uses_the_configured_prefix() {
    let mut rtc = client(action_exchange("Resolved", "Closed"));
    rtc.perform_action("close", "1001", "close", "Closed")
        .expect("close");
    let saves = rtc.session().exchange().requests_to(route::SAVE);
    assert_eq!(
        form_value(&saves[0].body, "action").as_deref(),
        Some("bugzillaWorkflow.action.close")
    );
}

#[test]
fn verify_phase_without_saved_item_rereads_and_fails() {
    let mut rtc = client(action_exchange("Resolved", "Closed"));
    let err = rtc
        .verify_action("close", "1001", None, "Closed")
        .expect_err("must fail");
    let msg = err.to_string();
    assert!(msg.contains("expected state Closed"), "{msg}");
    assert!(msg.contains("current state is Resolved"), "{msg}");
}

#[test]
fn failed_re_read_after_posting_reports_the_posted_action() {
    let exchange = Scripted::new()
        .on_xml(&route::detail("1001"), &detail("1001", "Open"))
        .on_xml(route::SAVE, &saved("1001", "Open"))
        .on(&route::retrieve("1001"), status(500));
    let mut rtc = client(exchange);

    let err = rtc
        .transition("1001", LifecycleAction::Resolve)
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::PartialFailure);
    let msg = err.to_string();
    assert!(msg.contains("verify re-read"), "{msg}");
    assert!(msg.contains("resolve posted for work item 1001"), "{msg}");
    assert!(msg.contains("500"), "{msg}");
    assert_eq!(rtc.session().exchange().requests_to(route::SAVE).len(), 1);
}

#[test]
fn apply_phase_returns_the_saved_item() {
    let mut rtc = client(action_exchange("Open", "Started"));
    let ids = rtc.resolve_ids("1001").expect("ids");
    assert_eq!(ids.state, "Open");
    let saved = rtc
        .apply_action(&ids, "bugzillaWorkflow.action.startWorking")
        .expect("apply")
        .expect("saved item");
    assert_eq!(saved.id, "1001");
}

// Planning

fn move_exchange() -> Scripted {
    Scripted::new()
        .on_xml(&route::retrieve("1001"), &hits(&[("1001", "Fix crash", "Defect")]))
        .on_xml(&route::detail("1001"), &detail("1001", "Open"))
        .on_xml(route::ITERATIONS, &releases(5))
        .on_xml(route::SAVE, &saved("1001", "Open"))
}

#[test]
fn move_to_last_iteration_by_index() {
    let mut rtc = client(move_exchange());
    let (item, iteration) = rtc
        .move_to_iteration("1001", &IterationSelector::Index(4))
        .expect("move");
    assert_eq!(item.id, "1001");
    assert_eq!(iteration.label, "Sprint 4");

    let saves = rtc.session().exchange().requests_to(route::SAVE);
    assert_eq!(form_value(&saves[0].body, "attributeIdentifiers").as_deref(), Some("target"));
    assert_eq!(form_value(&saves[0].body, "attributeValues").as_deref(), Some("_it4"));
}

#[test]
fn move_past_the_last_iteration_is_out_of_range() {
    let mut rtc = client(move_exchange());
    let err = rtc
        .move_to_iteration("1001", &IterationSelector::Index(5))
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    assert!(err.to_string().contains("out of range"), "{err}");
    assert!(rtc.session().exchange().requests_to(route::SAVE).is_empty());
}

#[test]
fn move_by_stable_item_id() {
    let mut rtc = client(move_exchange());
    let (_, iteration) = rtc
        .move_to_iteration("1001", &IterationSelector::ItemId("_it2".into()))
        .expect("move");
    assert_eq!(iteration.label, "Sprint 2");
}

#[test]
fn releases_keep_their_iterations_in_order() {
    let mut rtc = client(Scripted::new().on_xml(route::ITERATIONS, &releases(5)));
    let releases = rtc.releases().expect("releases");
    let labels: Vec<&str> = releases.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["R1", "R2"]);
    assert_eq!(releases[0].iterations.len(), 2);
    assert_eq!(releases[1].iterations.len(), 3);
    assert_eq!(releases[1].iterations[0].label, "Sprint 2");

    let by_id = rtc.iterations_by_item_id().expect("by id");
    assert_eq!(by_id.len(), 5);
    assert_eq!(by_id["_it3"].label, "Sprint 3");
}

#[test]
fn update_requires_at_least_one_field() {
    let mut rtc = client(Scripted::new());
    let err = rtc.update(&WorkItemUpdate::new("1001")).expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    assert!(rtc.session().exchange().requests.is_empty());
}

#[test]
fn update_writes_every_given_field() {
    let mut rtc = client(move_exchange());
    let update = WorkItemUpdate {
        estimate: Some("4h".into()),
        time_spent: Some("1h".into()),
        iteration: Some(IterationSelector::Index(0)),
        ..WorkItemUpdate::new("1001")
    };
    rtc.update(&update).expect("update");

    let saves = rtc.session().exchange().requests_to(route::SAVE);
    let body = &saves[0].body;
    assert!(body.contains("attributeIdentifiers=timeSpent&attributeValues=1h"), "{body}");
    assert!(body.contains("attributeIdentifiers=duration&attributeValues=4h"), "{body}");
    assert!(body.contains("attributeIdentifiers=target&attributeValues=_it0"), "{body}");
}

// Creation

#[test]
fn create_allocates_commits_and_refetches() {
    let allocated = common::envelope("<value><itemId>_new</itemId></value>");
    let exchange = Scripted::new()
        .on_xml(route::ALLOCATE, &allocated)
        .on_xml(route::SAVE, &saved("2002", "New"))
        .on_xml(&route::retrieve("2002"), &hits(&[("2002", "Write docs", "Task")]));
    let mut rtc = client(exchange);

    let item = rtc.create(&NewWorkItem::new("Write docs")).expect("create");
    assert_eq!(item.id, "2002");

    let saves = rtc.session().exchange().requests_to(route::SAVE);
    let body = &saves[0].body;
    assert_eq!(form_value(body, "itemId").as_deref(), Some("_new"));
    assert!(body.contains("attributeIdentifiers=summary&attributeValues=Write%20docs"));
    assert!(body.contains(&format!("attributeIdentifiers=owner&attributeValues={OWNER_ID}")));
    assert!(rtc.session().exchange().requests[0].url.contains("typeId=task"));
}

#[test]
fn subtask_link_failure_reports_the_created_item() {
    let allocated = common::envelope("<value><itemId>_new</itemId></value>");
    let exchange = Scripted::new()
        .on_xml(&route::retrieve("900"), &hits(&[("900", "Fix crash", "Defect")]))
        .on_xml(&route::detail("900"), &detail("900", "Open"))
        .on_xml(route::ALLOCATE, &allocated)
        .on_xml(&route::retrieve("2002"), &hits(&[("2002", "Artifacts: Fix crash", "Task")]))
        .on_xml(&route::detail("2002"), &detail("2002", "New"))
        .on_xml(route::SAVE, &saved("2002", "New"))
        .on(route::SAVE, status(500));
    let mut rtc = client(exchange);

    let err = rtc.create_subtask("900", "Artifacts").expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::PartialFailure);
    let msg = err.to_string();
    assert!(msg.contains("link parent"), "{msg}");
    assert!(msg.contains("work item 2002"), "{msg}");

    let saves = rtc.session().exchange().requests_to(route::SAVE);
    assert!(saves[0].body.contains("attributeValues=Artifacts%3A%20Fix%20crash"));
    let link = form_value(&saves[1].body, "updateLinks").expect("link command");
    let command: serde_json::Value = serde_json::from_str(&link).expect("json");
    assert_eq!(command["cmd"], "addLink");
    assert_eq!(command["itemId"], "_item900");
    assert_eq!(command["comment"], "900: Fix crash");
}

#[test]
fn create_with_empty_summary_sends_nothing() {
    let mut rtc = client(Scripted::new());
    let err = rtc.create(&NewWorkItem::new("  ")).expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    assert!(rtc.session().exchange().requests.is_empty());
}

// Web and developer helpers

#[test]
fn work_item_uri_is_the_location_of_the_hit() {
    let mut rtc = client(
        Scripted::new().on_xml(&route::retrieve("1001"), &hits(&[("1001", "Fix crash", "Defect")])),
    );
    let uri = rtc.work_item_uri("1001").expect("uri");
    assert!(uri.ends_with("/com.ibm.team.workitem.WorkItem/1001"), "{uri}");
}

#[test]
fn raw_request_resolves_relative_paths_and_returns_the_body() {
    let mut rtc = client(Scripted::new().on("com.example.Raw", common::ok("<raw/>")));
    let body = rtc
        .raw_request(Method::Get, "/com.example.Raw?x=1")
        .expect("raw");
    assert_eq!(body, b"<raw/>");

    let requests = &rtc.session().exchange().requests;
    assert_eq!(
        requests[0].url,
        "https://jazz.example.com/jazz/service/com.example.Raw?x=1"
    );
}

#[test]
fn raw_request_reports_error_statuses() {
    let mut rtc = client(Scripted::new().on("com.example.Raw", status(404)));
    let err = rtc
        .raw_request(Method::Get, "https://jazz.example.com/jazz/service/com.example.Raw")
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::HttpStatus);
}
