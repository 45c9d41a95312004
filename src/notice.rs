use serde::Serialize;

/// Severity of a user-visible message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
    Info,
}

/// A message shown inline on the dashboard page
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

/// Ordered list of notices collected while rendering
///
/// Every notice is also written to the log when it is pushed.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Notices(Vec<Notice>);

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.0.push(Notice {
            level: Level::Error,
            message,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.0.push(Notice {
            level: Level::Warning,
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.0.push(Notice {
            level: Level::Info,
            message,
        });
    }

    /// Append notices that were already logged elsewhere
    pub fn extend_from(&mut self, other: &Notices) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.0.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|n| n.level == Level::Error)
    }

    /// Messages only, in order
    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|n| n.message.as_str()).collect()
    }
}
