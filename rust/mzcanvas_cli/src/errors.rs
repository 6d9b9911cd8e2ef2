#[derive(Debug)]
pub enum CliError {
    Io {
        source: String,
        path: Option<String>,
    },
    ParseError {
        msg: String,
        path: String,
    },
    Render {
        source: String,
    },
}

impl CliError {
    pub fn io(e: std::io::Error, path: &std::path::Path) -> Self {
        CliError::Io {
            source: e.to_string(),
            path: Some(path.to_string_lossy().to_string()),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io { source, path } => {
                if let Some(path) = path {
                    write!(f, "Error accessing file {}: {}", path, source)
                } else {
                    write!(f, "Error accessing file: {}", source)
                }
            }
            CliError::ParseError { msg, path } => write!(f, "Error parsing {}: {}", path, msg),
            CliError::Render { source } => write!(f, "Error drawing the view: {}", source),
        }
    }
}

impl From<mzcanvas::CanvasError> for CliError {
    fn from(e: mzcanvas::CanvasError) -> Self {
        CliError::Render {
            source: e.to_string(),
        }
    }
}
