use std::io;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alphadash::{
    log_app_start, log_feed_started, FeedConfig, FeedError, FeedTask, LoggingConfig, Token,
    TokenFeed, TokenListSource,
};
use async_trait::async_trait;
use tracing::dispatcher::with_default;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriter;

#[derive(Clone, Default)]
struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    fn contents(&self) -> String {
        let bytes = self
            .buffer
            .lock()
            .expect("capture buffer lock should not be poisoned");
        String::from_utf8_lossy(&bytes).to_string()
    }
}

struct CaptureGuard {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl<'a> MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureGuard;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureGuard {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

impl Write for CaptureGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("capture buffer lock should not be poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs(max_level: Level, f: impl FnOnce()) -> String {
    let writer = CaptureWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_max_level(max_level)
        .with_writer(writer.clone())
        .finish();
    let dispatch = tracing::Dispatch::new(subscriber);

    with_default(&dispatch, f);
    writer.contents()
}

fn sample_token(id: &str) -> Token {
    Token {
        token_id: id.to_string(),
        name: "Sample".to_string(),
        symbol: "SMP".to_string(),
        icon_url: format!("https://cdn.example/{id}.png"),
        price: "1".to_string(),
        percent_change_24h: "0".to_string(),
        mul_point: "1".to_string(),
    }
}

#[test]
fn settled_cycles_emit_ok_and_error_events() {
    let logs = capture_logs(Level::INFO, || {
        let mut feed = TokenFeed::new();

        feed.begin_cycle();
        feed.complete_cycle(Ok(vec![sample_token("a"), sample_token("b")]));

        feed.begin_cycle();
        feed.complete_cycle(Err(FeedError::Status(503)));
    });

    assert!(logs.contains("\"event\":\"feed.cycle.ok\""));
    assert!(logs.contains("\"token_count\":2"));
    assert!(logs.contains("\"event\":\"feed.cycle.error\""));
    assert!(logs.contains("HTTP 503"));
}

#[test]
fn startup_helpers_emit_baseline_events() {
    let logs = capture_logs(Level::INFO, || {
        log_app_start(&LoggingConfig::default());
        log_feed_started(&FeedConfig::default());
    });

    assert!(logs.contains("\"event\":\"app.start\""));
    assert!(logs.contains("\"event\":\"feed.started\""));
    assert!(logs.contains("\"refresh_interval_ms\":30000"));
}

struct OneShotSource;

#[async_trait]
impl TokenListSource for OneShotSource {
    async fn fetch_tokens(&self) -> Result<Vec<Token>, FeedError> {
        Ok(vec![sample_token("live")])
    }
}

#[test]
fn spawned_feed_task_logs_its_cycles() {
    let logs = capture_logs(Level::INFO, || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("single-thread runtime should build");

        rt.block_on(async {
            let task = FeedTask::spawn(
                Arc::new(OneShotSource),
                FeedConfig {
                    refresh_interval_ms: 40,
                    tick_interval_ms: 10,
                    ..FeedConfig::default()
                },
            );

            tokio::time::sleep(Duration::from_millis(120)).await;
            task.stop();
        });
    });

    assert!(logs.contains("\"event\":\"feed.cycle.ok\""));
    assert!(logs.contains("\"token_count\":1"));
}
