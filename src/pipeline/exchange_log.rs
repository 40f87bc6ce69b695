// JSONL log of model exchanges, one line per call
use serde::{Serialize, Serializer};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Serialize)]
struct ExchangeEntry<'a, I, O>
where
    I: Serialize,
    O: Serialize,
{
    phase: &'a str,
    #[serde(serialize_with = "serialize_as_json")]
    request: &'a I,
    #[serde(serialize_with = "serialize_as_json")]
    response: &'a O,
    latency_ms: u64,
    timestamp: String,
}

fn serialize_as_json<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    let json_string = serde_json::to_string(value).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&json_string)
}

pub struct ExchangeLog {
    writer: Option<Mutex<BufWriter<File>>>,
}

impl ExchangeLog {
    /// Opens `log_file` for appending. An unopenable file disables logging
    /// with a warning rather than failing the build.
    pub fn new(log_file: Option<PathBuf>) -> Self {
        let writer = log_file.and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => Some(Mutex::new(BufWriter::new(file))),
                Err(e) => {
                    warn!("Failed to open exchange log {}: {}", path.display(), e);
                    None
                }
            }
        });

        Self { writer }
    }

    pub fn disabled() -> Self {
        Self { writer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn log_exchange<I, O>(&self, phase: &str, request: &I, response: &O, latency_ms: u64)
    where
        I: Serialize,
        O: Serialize,
    {
        let Some(writer) = &self.writer else {
            return;
        };

        let entry = ExchangeEntry {
            phase,
            request,
            response,
            latency_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        if let Ok(mut writer) = writer.lock() {
            match serde_json::to_string(&entry) {
                Ok(json) => {
                    if let Err(e) = writeln!(writer, "{}", json) {
                        warn!("Failed to write exchange log entry: {}", e);
                    }
                    if let Err(e) = writer.flush() {
                        warn!("Failed to flush exchange log: {}", e);
                    }
                }
                Err(e) => {
                    warn!("Failed to serialize exchange for phase {}: {}", phase, e);
                }
            }
        }

        debug!("Exchange log: phase={} latency_ms={}", phase, latency_ms);
    }
}

impl Default for ExchangeLog {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for ExchangeLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeLog")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
