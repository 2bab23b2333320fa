use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

pub fn json(status: u16, body: &str) -> StubResponse {
    StubResponse {
        status,
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        body: body.to_string(),
    }
}

pub fn html(status: u16, body: &str) -> StubResponse {
    StubResponse {
        status,
        headers: vec![("Content-Type".to_string(), "text/html".to_string())],
        body: body.to_string(),
    }
}

pub fn store_page(token: &str) -> StubResponse {
    let mut response = html(200, "<html>store</html>");
    response.headers.push((
        "Set-Cookie".to_string(),
        format!("csrftoken={token}; Path=/"),
    ));
    response
}

/// Answers exactly `responses.len()` connections, one request each.
pub struct StubServer {
    pub base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl StubServer {
    pub fn start(responses: Vec<StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));

        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for response in responses {
                let (stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
                recorded.push(read_request(&mut reader));
                write_response(stream, &response);
            }
            recorded
        });

        Self { base_url, handle }
    }

    pub fn finish(self) -> Vec<RecordedRequest> {
        self.handle.join().expect("stub server thread")
    }
}

fn read_request(reader: &mut impl BufRead) -> RecordedRequest {
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(key, _)| key == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).expect("request body");

    RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    }
}

fn write_response(mut stream: impl Write, response: &StubResponse) {
    let mut raw = format!("HTTP/1.1 {} Stub\r\n", response.status);
    for (key, value) in &response.headers {
        raw.push_str(&format!("{key}: {value}\r\n"));
    }
    raw.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.body.len(),
        response.body
    ));
    stream.write_all(raw.as_bytes()).expect("write response");
    stream.flush().expect("flush response");
}
