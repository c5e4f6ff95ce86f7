use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod errors;
pub mod logging;
pub mod methods;
pub mod rpc;
pub mod server;
pub mod settings;

use rpc::dispatch::Registry;
use settings::SettingsStore;

/// Process-wide read-only state, created once before the accept loop
/// starts. Cloning is cheap; the store and registry are shared across all
/// connection tasks without locking since no writer exists.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<SettingsStore>,
    pub registry: Arc<Registry>,
    pub max_request_bytes: usize,
    pub read_timeout: Duration,
}

impl AppState {
    pub fn new(
        settings: SettingsStore,
        registry: Registry,
        max_request_bytes: usize,
        read_timeout: Duration,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            registry: Arc::new(registry),
            max_request_bytes,
            read_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::{methods, server, settings::SettingsStore};

    async fn spawn_server() -> SocketAddr {
        let state = AppState::new(
            SettingsStore::defaults(),
            methods::build_registry(),
            1000,
            Duration::from_secs(2),
        );
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(server::run(listener, state));
        addr
    }

    async fn raw_roundtrip(addr: SocketAddr, payload: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).await.expect("connect");
        // The server may already have closed on an oversized payload, so a
        // write failure here is not itself a test failure.
        let _ = stream.write_all(payload).await;
        let _ = stream.flush().await;

        // Tolerate a reset too: closing with unread bytes in the kernel
        // buffer surfaces as ECONNRESET rather than a clean EOF.
        let mut buffer = Vec::new();
        let _ = stream.read_to_end(&mut buffer).await;
        buffer
    }

    async fn roundtrip(addr: SocketAddr, payload: Value) -> Value {
        let raw = raw_roundtrip(addr, payload.to_string().as_bytes()).await;
        serde_json::from_slice(&raw).expect("valid json response")
    }

    #[tokio::test]
    async fn get_setting_returns_configured_default() {
        let addr = spawn_server().await;

        let response = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"GetSetting","params":{"id":"log_level"},"id":1}),
        )
        .await;

        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"], "5");
    }

    #[tokio::test]
    async fn get_setting_unknown_name_returns_typed_error() {
        let addr = spawn_server().await;

        let response = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"GetSetting","params":{"id":"does_not_exist"},"id":2}),
        )
        .await;

        assert_eq!(response["id"], 2);
        assert_eq!(response["error"]["code"], -32000);
        assert_eq!(response["error"]["data"]["key"], "does_not_exist");
    }

    #[tokio::test]
    async fn unknown_method_returns_method_not_found() {
        let addr = spawn_server().await;

        let response = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"NoSuchMethod","id":"req-x"}),
        )
        .await;

        assert_eq!(response["id"], "req-x");
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn translate_path_rewrites_virtual_prefix_over_the_wire() {
        let addr = spawn_server().await;

        let rewritten = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"TranslatePath","params":{"path":"special://profile/foo"},"id":3}),
        )
        .await;
        let passthrough = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"TranslatePath","params":["plain/path"],"id":4}),
        )
        .await;

        assert_eq!(rewritten["result"], "/tmp/profile/foo");
        assert_eq!(passthrough["result"], "/tmp/plain/path");
    }

    #[tokio::test]
    async fn get_all_settings_matches_store_table() {
        let addr = spawn_server().await;

        let response = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"GetAllSettings","id":5}),
        )
        .await;

        let entries = response["result"].as_array().expect("settings array");
        assert_eq!(entries.len(), SettingsStore::defaults().len());

        let log_level = entries
            .iter()
            .find(|entry| entry["key"] == "log_level")
            .expect("log_level entry");
        assert_eq!(log_level["type"], "int");
        assert_eq!(log_level["value"], "5");
    }

    #[tokio::test]
    async fn identity_and_platform_queries_return_fixed_records() {
        let addr = spawn_server().await;

        let info = roundtrip(addr, json!({"jsonrpc":"2.0","method":"GetAddonInfo","id":6})).await;
        let platform =
            roundtrip(addr, json!({"jsonrpc":"2.0","method":"GetPlatform","id":7})).await;

        assert_eq!(info["result"]["id"], "jay");
        assert_eq!(info["result"]["path"], "/tmp");
        assert_eq!(platform["result"], json!({"OS":"linux","Arch":"x86_64"}));
    }

    #[tokio::test]
    async fn language_query_returns_fixed_tag() {
        let addr = spawn_server().await;

        let response = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"GetLanguage","params":{"format":"iso","withRegion":false},"id":8}),
        )
        .await;

        assert_eq!(response["result"], "English-UK");
    }

    #[tokio::test]
    async fn language_query_with_missing_flag_is_invalid_params() {
        let addr = spawn_server().await;

        let response = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"GetLanguage","params":{"format":"iso"},"id":9}),
        )
        .await;

        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn settings_open_variants_acknowledge_over_the_wire() {
        let addr = spawn_server().await;

        let opened = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"AddonSettings","params":{"addonID":"plugin.video.jay"},"id":10}),
        )
        .await;
        let confirmed = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"AddonSettingsOpened","params":{"addonID":"plugin.video.jay"},"id":11}),
        )
        .await;

        assert_eq!(opened["result"], "");
        assert_eq!(confirmed["result"], true);
    }

    #[tokio::test]
    async fn identical_requests_yield_identical_results() {
        let addr = spawn_server().await;

        let request = json!({"jsonrpc":"2.0","method":"GetAllSettings","id":12});
        let first = roundtrip(addr, request.clone()).await;
        let second = roundtrip(addr, request).await;

        assert_eq!(first["result"], second["result"]);
    }

    #[tokio::test]
    async fn malformed_json_gets_parse_error_and_service_continues() {
        let addr = spawn_server().await;

        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream.write_all(b"{not json").await.expect("write");
        stream.shutdown().await.expect("shutdown write half");

        let mut buffer = Vec::new();
        stream
            .read_to_end(&mut buffer)
            .await
            .expect("read response");
        let response: Value = serde_json::from_slice(&buffer).expect("valid json response");
        assert_eq!(response["error"]["code"], -32700);
        assert_eq!(response["id"], Value::Null);

        // A fresh connection is served normally afterwards.
        let follow_up = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"GetPlatform","id":13}),
        )
        .await;
        assert_eq!(follow_up["result"]["OS"], "linux");
    }

    #[tokio::test]
    async fn oversized_payload_closes_without_response() {
        let addr = spawn_server().await;

        let oversized = vec![b'a'; 1500];
        let raw = raw_roundtrip(addr, &oversized).await;
        assert!(raw.is_empty());

        let follow_up = roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"GetPlatform","id":14}),
        )
        .await;
        assert_eq!(follow_up["result"]["Arch"], "x86_64");
    }

    #[tokio::test]
    async fn request_without_id_closes_without_response() {
        let addr = spawn_server().await;

        let raw = raw_roundtrip(
            addr,
            json!({"jsonrpc":"2.0","method":"GetPlatform"})
                .to_string()
                .as_bytes(),
        )
        .await;

        assert!(raw.is_empty());
    }

    #[tokio::test]
    async fn concurrent_connections_do_not_cross_talk() {
        let addr = spawn_server().await;
        let defaults = SettingsStore::defaults();

        let keys = [
            "download_path",
            "buffer_size",
            "log_level",
            "listen_port_min",
            "seed_forever",
            "library_path",
            "results_per_page",
            "torrents_path",
        ];

        let mut tasks = Vec::new();
        for (index, key) in keys.iter().enumerate() {
            let key = key.to_string();
            tasks.push(tokio::spawn(async move {
                let mut stream = TcpStream::connect(addr).await.expect("connect");
                let request = json!({
                    "jsonrpc": "2.0",
                    "method": "GetSetting",
                    "params": {"id": key},
                    "id": index,
                });
                stream
                    .write_all(request.to_string().as_bytes())
                    .await
                    .expect("write");

                let mut buffer = Vec::new();
                stream
                    .read_to_end(&mut buffer)
                    .await
                    .expect("read response");
                (index, key, buffer)
            }));
        }

        for task in tasks {
            let (index, key, buffer) = task.await.expect("connection task");
            let response: Value = serde_json::from_slice(&buffer).expect("valid json response");
            let expected = defaults.get(&key).expect("known key").value.render();

            assert_eq!(response["id"], index, "response id belongs to its own request");
            assert_eq!(response["result"], expected, "result for key {key}");
        }
    }
}
