use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use parking_lot::Mutex;
use rask_log_bus::app::{InputEncoding, TailApp, TailConfig};
use rask_log_bus::codec::WireFormat;
use rask_log_bus::domain::{Level, LogEntry};
use rask_log_bus::handler::{CliHandler, Logger, MemoryHandler, SERVICE_FIELD};
use rask_log_bus::port::Publisher;
use rask_log_bus::sender::{FnPublisher, SyncPublishHandler};
use std::io::Write;
use std::sync::Arc;

/// Publishes `entries` through a sync handler and returns the bodies that
/// reached the bus.
async fn published(format: WireFormat, entries: Vec<LogEntry>) -> Vec<Bytes> {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let captured = sent.clone();
    let publisher: Arc<dyn Publisher> = Arc::new(FnPublisher::new(move |_topic, body| {
        captured.lock().push(body);
        async { Ok(()) }
    }));
    let handler = Arc::new(SyncPublishHandler::new(format.encoder(), publisher, "log"));
    let logger = Arc::new(Logger::new(handler, Level::Debug));

    for entry in entries {
        let mut ctx = logger.context();
        for (key, value) in &entry.fields {
            ctx = ctx.with_field(key.clone(), value.clone());
        }
        ctx.log(entry.level, entry.message).await.unwrap();
    }

    let bodies = sent.lock().clone();
    bodies
}

fn lines(bodies: &[Bytes], input: InputEncoding) -> Vec<u8> {
    let mut out = Vec::new();
    for body in bodies {
        match input {
            InputEncoding::Raw => out.extend_from_slice(body),
            InputEncoding::Base64 => out.extend(STANDARD.encode(body).into_bytes()),
        }
        out.push(b'\n');
    }
    out
}

fn from_service(service: &str, message: &str) -> LogEntry {
    LogEntry::new(Level::Info, message).with_field(SERVICE_FIELD, service)
}

#[tokio::test]
async fn test_service_filter_over_json_lines() {
    let bodies = published(
        WireFormat::Json,
        vec![
            from_service("api", "from api"),
            from_service("worker", "from worker"),
            LogEntry::new(Level::Info, "no service"),
            from_service("cron", "from cron"),
        ],
    )
    .await;

    let memory = Arc::new(MemoryHandler::new());
    let config = TailConfig::from_args([
        "rask-log-tail",
        "--format",
        "json",
        "--service",
        "api",
        "--service",
        "cron",
    ])
    .unwrap();
    let app = TailApp::with_sink(config, memory.clone());

    let input = lines(&bodies, InputEncoding::Raw);
    let stats = app
        .tail(input.as_slice(), std::future::pending())
        .await
        .unwrap();

    assert_eq!(stats.messages, 4);
    assert_eq!(stats.discarded, 0);
    let messages: Vec<_> = memory.entries().into_iter().map(|e| e.message).collect();
    assert_eq!(messages, vec!["from api", "no service", "from cron"]);
    assert_eq!(app.bus().delivered(), 4);
}

#[tokio::test]
async fn test_protobuf_over_base64_with_level_gate() {
    let bodies = published(
        WireFormat::Protobuf,
        vec![
            LogEntry::new(Level::Debug, "chatty"),
            LogEntry::new(Level::Warn, "slow query").with_field("ms", "900"),
            LogEntry::new(Level::Error, "payment failed"),
        ],
    )
    .await;

    let memory = Arc::new(MemoryHandler::new());
    let config = TailConfig {
        input: InputEncoding::Base64,
        min_level: Level::Warn,
        ..TailConfig::default()
    };
    let app = TailApp::with_sink(config, memory.clone());

    let input = lines(&bodies, InputEncoding::Base64);
    let stats = app
        .tail(input.as_slice(), std::future::pending())
        .await
        .unwrap();

    assert_eq!(stats.messages, 3);
    let entries = memory.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].level, Level::Warn);
    assert_eq!(entries[0].field("ms").map(ToString::to_string).as_deref(), Some("900"));
    assert_eq!(entries[1].message, "payment failed");
}

#[tokio::test]
async fn test_undecodable_body_is_discarded() {
    let memory = Arc::new(MemoryHandler::new());
    let config = TailConfig {
        input: InputEncoding::Base64,
        max_attempts: 2,
        ..TailConfig::default()
    };
    let app = TailApp::with_sink(config, memory.clone());

    let mut bodies = vec![Bytes::from_static(&[0xff, 0xff, 0xff])];
    bodies.extend(published(WireFormat::Protobuf, vec![from_service("api", "ok")]).await);
    let input = lines(&bodies, InputEncoding::Base64);

    let stats = app
        .tail(input.as_slice(), std::future::pending())
        .await
        .unwrap();

    assert_eq!(stats.messages, 2);
    assert_eq!(stats.discarded, 1);
    assert_eq!(app.bus().requeued(), 1);
    assert_eq!(memory.len(), 1);
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_cli_rendering() {
    let bodies = published(
        WireFormat::Json,
        vec![from_service("api", "hello").with_field("user", "alice")],
    )
    .await;

    let buf = SharedBuf::default();
    let sink = Arc::new(CliHandler::with_writer(Box::new(buf.clone())).with_color(false));
    let config = TailConfig::from_args(["rask-log-tail", "--cli", "--format", "json"]).unwrap();
    assert!(config.cli);
    let app = TailApp::with_sink(config, sink);

    let input = lines(&bodies, InputEncoding::Raw);
    app.tail(input.as_slice(), std::future::pending())
        .await
        .unwrap();

    let output = String::from_utf8(buf.0.lock().clone()).unwrap();
    assert_eq!(
        output,
        "   • hello                     service=api user=alice\n"
    );
}
