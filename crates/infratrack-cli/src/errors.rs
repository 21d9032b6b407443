use console::style;
use infratrack_core::InfraTrackError;
use std::fmt;

/// Error shown to the user, with hints on how to get past it
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Convert anyhow::Error to CliError, looking for a known cause in the chain
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let summary = error.to_string();
    let cause = error.chain().find_map(|e| e.downcast_ref::<InfraTrackError>());

    match cause {
        Some(InfraTrackError::UnsupportedFormat { extension, supported }) => {
            CliError::new(format!("Unsupported file format: .{}", extension))
                .with_context(format!("Supported extensions: {}", supported.join(", ")))
                .with_suggestion("Export the data to one of the supported formats")
                .with_suggestion("Or fill in a CSV template: infratrack template segments")
                .with_help("Run: infratrack import --help")
        }
        Some(InfraTrackError::Io(io)) if io.kind() == std::io::ErrorKind::NotFound => {
            CliError::new("File not found")
                .with_context(format!("Error: {}", summary))
                .with_suggestion("Check the file path and try again")
        }
        Some(InfraTrackError::FormatError { format, message }) => {
            CliError::new(format!("The file could not be read as {}", format))
                .with_context(format!("{}\n\nError: {}", summary, message))
                .with_suggestion("Check that the file is not truncated or corrupt")
                .with_suggestion("Nothing was imported, existing data is unchanged")
        }
        Some(InfraTrackError::Archive { path, reason }) => CliError::new("Archive is missing content")
            .with_context(format!("{}: {}", path, reason))
            .with_suggestion("KMZ files need a .kml document, shapefile bundles need a .shp"),
        Some(InfraTrackError::ConfigInvalid { key, reason }) => {
            CliError::new(format!("Invalid configuration: {}", key))
                .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
                .with_suggestion("Check infratrack.toml or the INFRATRACK_* environment variables")
                .with_help("Run: infratrack config")
        }
        _ => CliError::new(summary),
    }
}
