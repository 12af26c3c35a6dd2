use serde::Serialize;

use fgmod_steam::InstalledGame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// The single JSON object every subcommand prints to stdout.
#[derive(Debug, Default, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backups: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub games: Option<Vec<InstalledGame>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<serde_json::Value>,
}

impl Response {
    pub fn success() -> Self {
        Self {
            status: Some(Status::Success),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Some(Status::Error),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Attaches a serializable report; a report that fails to serialize is dropped.
    pub fn with_report<T: Serialize>(mut self, report: &T) -> Self {
        match serde_json::to_value(report) {
            Ok(value) => self.report = Some(value),
            Err(err) => tracing::warn!(error = %err, "dropping unserializable report"),
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == Some(Status::Error)
    }

    pub fn render(&self, pretty: bool) -> String {
        let rendered = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        rendered.unwrap_or_else(|err| {
            format!(r#"{{"status":"error","message":"failed to encode response: {err}"}}"#)
        })
    }

    pub fn print(&self, pretty: bool) {
        println!("{}", self.render(pretty));
    }
}
