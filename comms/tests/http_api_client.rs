use comms::transport::http::{ApiClient, ApiError};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

const SESSION_BODY: &str = r##"{
    "accessToken": "tok-1",
    "user": {
        "id": "u-1",
        "email": "ayse@example.com",
        "username": "ayse",
        "displayColor": "#38bdf8",
        "createdAt": "2024-05-01T12:00:00Z",
        "updatedAt": "2024-05-01T12:00:00Z"
    }
}"##;

#[tokio::test]
async fn assert_login_success_parses_session() {
    let (listener, base_url) = bind_server().await;
    let client = ApiClient::new(&base_url).expect("could not build the api client");

    let (request, session) = tokio::join!(
        serve_canned_response(listener, "200 OK", SESSION_BODY),
        client.login("ayse", "secret")
    );

    let request = request.expect("server side failed");
    assert!(request.starts_with("POST /auth/login"));
    assert!(request.contains(r#""username":"ayse""#));

    let session = session.expect("login should succeed");
    assert_eq!(session.access_token, "tok-1");
    assert_eq!(session.user.username, "ayse");
}

#[tokio::test]
async fn assert_login_rejection_maps_to_invalid_credentials() {
    let (listener, base_url) = bind_server().await;
    let client = ApiClient::new(&base_url).expect("could not build the api client");

    let (_, result) = tokio::join!(
        serve_canned_response(listener, "401 Unauthorized", "{}"),
        client.login("ayse", "wrong")
    );

    assert!(matches!(result, Err(ApiError::InvalidCredentials)));
}

#[tokio::test]
async fn assert_register_conflict_maps_to_username_taken() {
    let (listener, base_url) = bind_server().await;
    let client = ApiClient::new(&base_url).expect("could not build the api client");

    let (_, result) = tokio::join!(
        serve_canned_response(listener, "409 Conflict", "{}"),
        client.register("ayse", "secret")
    );

    assert!(matches!(result, Err(ApiError::UsernameTaken)));
}

#[tokio::test]
async fn assert_authenticated_requests_carry_bearer_token() {
    let (listener, base_url) = bind_server().await;
    let mut client = ApiClient::new(&base_url).expect("could not build the api client");
    client.set_access_token(Some("tok-1".into()));

    let (request, rooms) = tokio::join!(
        serve_canned_response(listener, "200 OK", "[]"),
        client.rooms()
    );

    let request = request.expect("server side failed");
    assert!(request.starts_with("GET /rooms"));
    assert!(request.contains("authorization: Bearer tok-1"));

    assert!(rooms.expect("rooms request should succeed").is_empty());
}

async fn bind_server() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("could not bind to a port");
    let base_url = format!(
        "http://{}",
        listener.local_addr().expect("could not read local addr")
    );

    (listener, base_url)
}

/// Accepts a single connection, reads one full HTTP request and replies with
/// the canned status line and JSON body. Returns the raw request for asserts.
async fn serve_canned_response(
    listener: TcpListener,
    status_line: &str,
    body: &str,
) -> anyhow::Result<String> {
    let (mut stream, _addr) = listener.accept().await?;
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    // read until the end of the request headers
    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(anyhow::anyhow!("connection closed before headers"));
        }
        buffer.extend_from_slice(&chunk[..n]);

        if let Some(pos) = find_subsequence(&buffer, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    // drain the body according to content-length, if any
    let headers = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    while buffer.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;

    Ok(String::from_utf8_lossy(&buffer).to_string())
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
