//! Routing engine behavior through the public API.

use vms_gateway::routing::{DispatchError, Dispatcher, Outcome, Params, RouteTable};

fn table() -> RouteTable<&'static str> {
    let mut table = RouteTable::new();
    table.get("/api/version", "version").unwrap();
    table.any("/api/ping", "ping").unwrap();
    table
        .get("/instance/{id}", "instance")
        .unwrap()
        .constrain("id", r"\d+")
        .unwrap();
    table.get("/files/{path*}", "files").unwrap();
    table.get("/search/{query?}", "search").unwrap();
    table
}

#[test]
fn test_literal_route_matches_exactly() {
    let table = table();

    let matched = table.resolve("/api/version", "GET").unwrap();
    assert_eq!(*matched.route.handler(), "version");
    assert!(matched.params.is_empty());

    assert!(table.resolve("/api/version", "POST").is_none());
    assert!(table.resolve("/api/versions", "GET").is_none());
    assert!(table.resolve("/API/version", "GET").is_none());
    assert!(table.resolve("/api/version/extra", "GET").is_none());

    for method in ["GET", "POST", "DELETE", "PURGE"] {
        let matched = table.resolve("/api/ping", method).unwrap();
        assert_eq!(*matched.route.handler(), "ping");
        assert!(matched.params.is_empty());
    }
}

#[test]
fn test_registration_order_wins() {
    let mut table = RouteTable::new();
    table.get("/files/*", "catch-all").unwrap();
    table.get("/files/readme", "readme").unwrap();

    let matched = table.resolve("/files/readme", "GET").unwrap();
    assert_eq!(*matched.route.handler(), "catch-all");

    let mut table = RouteTable::new();
    table.get("/files/readme", "readme").unwrap();
    table.get("/files/*", "catch-all").unwrap();

    let matched = table.resolve("/files/readme", "GET").unwrap();
    assert_eq!(*matched.route.handler(), "readme");
}

#[test]
fn test_constrained_parameter() {
    let table = table();

    let matched = table.resolve("/instance/42", "GET").unwrap();
    assert_eq!(matched.params.get("id"), Some("42"));

    assert!(table.resolve("/instance/abc", "GET").is_none());
    assert!(table.resolve("/instance/42a", "GET").is_none());
}

#[test]
fn test_named_wildcard_captures_rest() {
    let table = table();

    let matched = table.resolve("/files/a/b/c", "GET").unwrap();
    assert_eq!(matched.params.len(), 1);
    assert_eq!(matched.params.get("path"), Some("a/b/c"));
}

#[test]
fn test_optional_trailing_parameter() {
    let table = table();

    let matched = table.resolve("/search", "GET").unwrap();
    assert_eq!(*matched.route.handler(), "search");
    assert!(!matched.params.contains("query"));

    let matched = table.resolve("/search/term", "GET").unwrap();
    assert_eq!(matched.params.get("query"), Some("term"));
}

#[test]
fn test_round_trip() {
    let table = table();
    let paths = [
        "/api/version",
        "/instance/42",
        "/files/a/b/c",
        "/search",
        "/search/term",
    ];

    for path in paths {
        let matched = table.resolve(path, "GET").unwrap();
        let rendered = matched.route.render(&matched.params).unwrap();
        assert_eq!(rendered, path);
    }

    let mut table = RouteTable::new();
    table
        .get("/repo/v{version}/{rest}", "repo")
        .unwrap()
        .constrain("rest", ".+")
        .unwrap();
    let path = "/repo/v2/src/lib.rs";
    let matched = table.resolve(path, "GET").unwrap();
    assert_eq!(matched.params.get("version"), Some("2"));
    assert_eq!(matched.params.get("rest"), Some("src/lib.rs"));
    assert_eq!(matched.route.render(&matched.params).unwrap(), path);

    // A parameter that absorbs the rest of the path ends the rendered path,
    // whatever the template declares after it.
    let mut table = RouteTable::new();
    table
        .get("/proxy/{target}/edit", "proxy")
        .unwrap()
        .constrain("target", ".+")
        .unwrap();
    table.get(r"/tree/{path<[a-z/]+>}", "tree").unwrap();
    for path in ["/proxy/a/b/c", "/tree/src/main"] {
        let matched = table.resolve(path, "GET").unwrap();
        assert_eq!(matched.route.render(&matched.params).unwrap(), path);
    }
}

#[test]
fn test_unregistered_is_not_found() {
    let dispatcher = Dispatcher::new(table());

    for (path, method) in [("/nope", "GET"), ("/api/version", "DELETE"), ("/", "GET")] {
        assert!(dispatcher.table().resolve(path, method).is_none());

        let outcome = dispatcher.dispatch(path, method, |_, _| Ok::<_, std::io::Error>(()));
        assert!(matches!(outcome, Ok(Outcome::RouteNotFound)));
    }
}

#[test]
fn test_handler_error_is_wrapped() {
    let dispatcher = Dispatcher::new(table());
    let outcome: Result<Outcome<()>, _> =
        dispatcher.dispatch("/instance/7", "GET", |_, params: Params| {
            Err(format!("instance {} is gone", params.get("id").unwrap_or_default()))
        });

    match outcome {
        Err(DispatchError::Internal(message)) => assert_eq!(message, "instance 7 is gone"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_concurrent_resolve() {
    let table = table();

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let table = &table;
            scope.spawn(move || {
                for i in 0..500 {
                    let id = worker * 1000 + i;
                    let path = format!("/instance/{id}");
                    let matched = table.resolve(&path, "GET").unwrap();
                    assert_eq!(matched.params.get("id"), Some(id.to_string().as_str()));

                    let path = format!("/files/w{worker}/{i}");
                    let matched = table.resolve(&path, "GET").unwrap();
                    assert_eq!(
                        matched.params.get("path"),
                        Some(format!("w{worker}/{i}").as_str())
                    );

                    assert!(table.resolve(&format!("/instance/x{id}"), "GET").is_none());
                }
            });
        }
    });
}
