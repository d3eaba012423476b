use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::{Severity, ValidationEvent};
use crate::error::DescriptorError;

/// Verbosity levels for event reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbosityLevel {
    /// Report nothing
    Quiet,
    /// Report errors only
    #[default]
    Normal,
    /// Report every event, warnings included
    Verbose,
    /// Report every event with its full structure
    Debug,
}

impl FromStr for VerbosityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" => Ok(VerbosityLevel::Quiet),
            "normal" => Ok(VerbosityLevel::Normal),
            "verbose" => Ok(VerbosityLevel::Verbose),
            "debug" => Ok(VerbosityLevel::Debug),
            other => Err(format!("unknown output level '{}'", other)),
        }
    }
}

impl fmt::Display for VerbosityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerbosityLevel::Quiet => "quiet",
            VerbosityLevel::Normal => "normal",
            VerbosityLevel::Verbose => "verbose",
            VerbosityLevel::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// Writes validation events to stderr according to a verbosity level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventReporter {
    verbosity: VerbosityLevel,
}

impl EventReporter {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    /// Line printed for `event`, or `None` when the level suppresses it
    pub fn format_event(&self, event: &ValidationEvent) -> Option<String> {
        match self.verbosity {
            VerbosityLevel::Quiet => None,
            VerbosityLevel::Normal => (event.severity >= Severity::Error).then(|| event.to_string()),
            VerbosityLevel::Verbose => Some(event.to_string()),
            VerbosityLevel::Debug => Some(format!("{:?}", event)),
        }
    }

    pub fn render<'a, I>(&self, events: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a ValidationEvent>,
    {
        events
            .into_iter()
            .filter_map(|event| self.format_event(event))
            .collect()
    }

    pub fn report<'a, I>(&self, events: I)
    where
        I: IntoIterator<Item = &'a ValidationEvent>,
    {
        for line in self.render(events) {
            eprintln!("{}", line);
        }
    }

    /// Text printed for a failed operation, or `None` when quiet
    pub fn format_error(&self, error: &DescriptorError) -> Option<String> {
        match self.verbosity {
            VerbosityLevel::Quiet => None,
            VerbosityLevel::Normal | VerbosityLevel::Verbose => Some(format!("ERROR: {}", error)),
            VerbosityLevel::Debug => Some(format!("ERROR: {}\nDebug: {:?}", error, error)),
        }
    }

    /// Report a failed operation
    pub fn report_error(&self, error: &DescriptorError) {
        if let Some(text) = self.format_error(error) {
            eprintln!("{}", text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ValidationEvent> {
        vec![
            ValidationEvent::warning("unexpected namespace"),
            ValidationEvent::error("element not allowed").at_line(7),
        ]
    }

    #[test]
    fn test_verbosity_parsing() {
        assert_eq!("VERBOSE".parse::<VerbosityLevel>(), Ok(VerbosityLevel::Verbose));
        assert_eq!(" quiet ".parse::<VerbosityLevel>(), Ok(VerbosityLevel::Quiet));
        assert!("chatty".parse::<VerbosityLevel>().is_err());
        assert_eq!(VerbosityLevel::default(), VerbosityLevel::Normal);
        assert_eq!(VerbosityLevel::Debug.to_string(), "debug");
    }

    #[test]
    fn test_quiet_renders_nothing() {
        let reporter = EventReporter::new(VerbosityLevel::Quiet);
        assert!(reporter.render(&sample()).is_empty());
    }

    #[test]
    fn test_normal_renders_errors_only() {
        let reporter = EventReporter::new(VerbosityLevel::Normal);
        assert_eq!(
            reporter.render(&sample()),
            vec!["[ERROR] line 7: element not allowed".to_string()]
        );
    }

    #[test]
    fn test_verbose_renders_everything() {
        let reporter = EventReporter::new(VerbosityLevel::Verbose);
        let lines = reporter.render(&sample());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[WARNING] unexpected namespace");
    }

    #[test]
    fn test_debug_uses_debug_format() {
        let reporter = EventReporter::new(VerbosityLevel::Debug);
        let lines = reporter.render(&sample());
        assert!(lines[1].contains("ValidationEvent"));
        assert!(lines[1].contains("line: Some(7)"));
    }

    #[test]
    fn test_error_formatting_follows_verbosity() {
        let error = DescriptorError::Xml {
            details: "unexpected end of input".to_string(),
        };

        assert_eq!(EventReporter::new(VerbosityLevel::Quiet).format_error(&error), None);
        assert_eq!(
            EventReporter::new(VerbosityLevel::Normal).format_error(&error).as_deref(),
            Some("ERROR: XML parse error: unexpected end of input")
        );
        let debug = EventReporter::new(VerbosityLevel::Debug).format_error(&error).unwrap();
        assert!(debug.contains("Debug: Xml {"));
    }
}
