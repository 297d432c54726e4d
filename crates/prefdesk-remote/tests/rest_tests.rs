// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use prefdesk_app::{PreferenceFlags, RecordId, RemoteTable};
use prefdesk_remote::RestTable;
use std::io::Read;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server};

const ALICE_ROW: &str = r#"{"id":1,"name":"Alice","sub_dom":true,"roleplay":false,"pictures":true,"videos":false,"challenges":false}"#;

fn start_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());
    Ok((server, addr))
}

fn client(addr: &str) -> Result<RestTable> {
    RestTable::new(addr, "user_preferences", "anon-key", Duration::from_secs(1))
}

fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_owned())
}

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

#[test]
fn unreachable_endpoint_error_names_the_url() -> Result<()> {
    let table = RestTable::new(
        "http://127.0.0.1:1",
        "user_preferences",
        "anon-key",
        Duration::from_millis(50),
    )?;

    let error = table
        .lookup_by_exact_name("Alice")
        .expect_err("lookup should fail for unreachable endpoint");
    let message = format!("{error:#}");
    assert!(message.contains("cannot reach http://127.0.0.1:1"));
    Ok(())
}

#[test]
fn lookup_sends_exact_filter_and_auth_headers() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Get);
        let url = request.url().to_owned();
        assert!(url.starts_with("/rest/v1/user_preferences?"), "url {url}");
        assert!(url.contains("name=eq.Alice"), "url {url}");
        assert!(url.contains("select=id%2Cname%2Csub_dom"), "url {url}");
        assert!(url.contains("limit=2"), "url {url}");
        assert_eq!(header_value(&request, "apikey").as_deref(), Some("anon-key"));
        assert_eq!(
            header_value(&request, "Authorization").as_deref(),
            Some("Bearer anon-key")
        );
        request
            .respond(json_response(&format!("[{ALICE_ROW}]"), 200))
            .expect("response should succeed");
    });

    let record = client(&addr)?
        .lookup_by_exact_name("Alice")?
        .ok_or_else(|| anyhow!("Alice should be found"))?;
    assert_eq!(record.id, RecordId::from(1));
    assert!(record.flags.sub_dom);
    assert!(record.flags.pictures);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn lookup_without_rows_is_none_and_duplicates_are_errors() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let empty = server.recv().expect("request expected");
        empty
            .respond(json_response("[]", 200))
            .expect("response should succeed");

        let duplicate = server.recv().expect("request expected");
        duplicate
            .respond(json_response(&format!("[{ALICE_ROW},{ALICE_ROW}]"), 200))
            .expect("response should succeed");
    });

    let table = client(&addr)?;
    assert!(table.lookup_by_exact_name("Nobody")?.is_none());
    let error = table
        .lookup_by_exact_name("Alice")
        .expect_err("two rows should fail");
    assert!(error.to_string().contains("expected a single row"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn update_patches_all_flags_by_name() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Patch);
        let url = request.url().to_owned();
        assert!(url.contains("name=eq.Alice+Walker"), "url {url}");
        assert_eq!(
            header_value(&request, "Prefer").as_deref(),
            Some("return=minimal")
        );

        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("body should be readable");
        let value: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(
            value,
            serde_json::json!({
                "sub_dom": true,
                "roleplay": false,
                "pictures": false,
                "videos": true,
                "challenges": false,
            })
        );
        request
            .respond(Response::empty(204))
            .expect("response should succeed");
    });

    client(&addr)?.update_flags(
        "Alice Walker",
        &PreferenceFlags {
            sub_dom: true,
            videos: true,
            ..PreferenceFlags::default()
        },
    )?;

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn search_uses_ilike_with_wildcards() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let url = request.url().to_owned();
        assert!(url.contains("name=ilike.*ali*"), "url {url}");
        request
            .respond(json_response(&format!("[{ALICE_ROW}]"), 200))
            .expect("response should succeed");
    });

    let rows = client(&addr)?.search_by_name_substring("ali")?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Alice");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn literal_asterisk_drops_wildcard_matches() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let url = request.url().to_owned();
        assert!(url.contains("name=ilike.*a*e*"), "url {url}");
        let rows = r#"[{"id":1,"name":"Alice","sub_dom":false,"roleplay":false,"pictures":false,"videos":false,"challenges":false},{"id":2,"name":"A*E Rowan","sub_dom":false,"roleplay":false,"pictures":false,"videos":false,"challenges":false}]"#;
        request
            .respond(json_response(rows, 200))
            .expect("response should succeed");
    });

    let rows = client(&addr)?.search_by_name_substring("a*e")?;
    let names = rows.iter().map(|row| row.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["A*E Rowan"]);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn server_errors_carry_postgrest_message() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(
                r#"{"code":"42P01","message":"relation \"public.user_preferences\" does not exist","hint":null,"details":null}"#,
                404,
            ))
            .expect("response should succeed");
    });

    let error = client(&addr)?
        .search_by_name_substring("ali")
        .expect_err("404 should fail");
    let message = format!("{error:#}");
    assert!(message.contains("search for \"ali\""), "{message}");
    assert!(message.contains("server error (404) [42P01]"), "{message}");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn ping_reads_one_row() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let url = request.url().to_owned();
        assert!(url.contains("select=id"), "url {url}");
        assert!(url.contains("limit=1"), "url {url}");
        request
            .respond(json_response("[]", 200))
            .expect("response should succeed");
    });

    client(&addr)?.ping()?;

    handle.join().expect("server thread should join");
    Ok(())
}
