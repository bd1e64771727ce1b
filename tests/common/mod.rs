#![allow(dead_code)]

pub mod tracing_util;

pub mod test_server {
    use petstore_openapi::config::AppConfig;
    use petstore_openapi::petstore;
    use petstore_openapi::server::{AppService, HttpServer, ServerHandle};
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::sync::Arc;
    use std::time::Duration;

    /// Config bound to an ephemeral loopback port with a fixed seed
    pub fn test_config() -> AppConfig {
        AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            workers: 2,
            mock_seed: Some(7),
            ..AppConfig::default()
        }
    }

    pub fn build_service(config: &AppConfig) -> AppService {
        let registry = petstore::sealed_registry(config).unwrap();
        AppService::new(registry, petstore::dispatcher(), config).unwrap()
    }

    pub fn start_server(config: &AppConfig) -> ServerHandle {
        let service = Arc::new(build_service(config));
        let handle = HttpServer::new(service, config.workers)
            .start(config.bind_addr.as_str())
            .unwrap();
        handle.wait_ready().unwrap();
        handle
    }

    /// Send a raw request and read until the server closes the connection
    pub fn send_request(addr: SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn get(addr: SocketAddr, path: &str) -> String {
        send_request(
            addr,
            &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
        )
    }

    /// Status code, lowercased headers and body of a raw response
    pub fn parse_response(resp: &str) -> (u16, Vec<(String, String)>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();
        (status, headers, body.to_string())
    }

    pub fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
