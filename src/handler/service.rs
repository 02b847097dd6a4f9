use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use super::logger::{Context, Logger};
use crate::domain::{FieldValue, Fields};

pub const SERVICE_FIELD: &str = "service";
pub const HOSTNAME_FIELD: &str = "hostname";
pub const PID_FIELD: &str = "pid";

/// Base name of the running executable.
pub fn process_name() -> String {
    std::env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .or_else(|| {
            std::env::current_exe().ok().and_then(|exe| {
                exe.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
        })
        .unwrap_or_default()
}

fn host_name() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            warn!(error = %e, "Unable to get hostname for service logging");
            String::new()
        }
    }
}

/// The three fields that identify the producing process. `pid` is a
/// decimal string so every field crosses the wire unchanged.
pub fn service_fields() -> Fields {
    let mut fields = Fields::new();
    fields.insert(SERVICE_FIELD.to_string(), FieldValue::Str(process_name()));
    fields.insert(HOSTNAME_FIELD.to_string(), FieldValue::Str(host_name()));
    fields.insert(
        PID_FIELD.to_string(),
        FieldValue::Str(std::process::id().to_string()),
    );
    fields
}

/// A context that tags every entry with `service`, `hostname` and `pid`.
pub fn service_context(logger: &Arc<Logger>) -> Context {
    logger.with_fields(service_fields())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Level;
    use crate::handler::MemoryHandler;

    #[test]
    fn test_process_name_is_executable_base_name() {
        let exe = std::env::current_exe().unwrap();
        let expected = exe.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(process_name(), expected);
    }

    #[tokio::test]
    async fn test_service_context_adds_exactly_three_fields() {
        let memory = Arc::new(MemoryHandler::new());
        let logger = Arc::new(Logger::new(memory.clone(), Level::Debug));

        service_context(&logger).info("Hello").await.unwrap();

        let entry = &memory.entries()[0];
        assert_eq!(entry.fields.len(), 3);
        assert_eq!(
            entry.field(SERVICE_FIELD),
            Some(&FieldValue::Str(process_name()))
        );
        assert_eq!(
            entry.field(PID_FIELD),
            Some(&FieldValue::Str(std::process::id().to_string()))
        );
        let expected_host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert_eq!(entry.field(HOSTNAME_FIELD), Some(&FieldValue::Str(expected_host)));
    }
}
