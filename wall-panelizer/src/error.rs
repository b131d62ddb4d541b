use std::path::PathBuf;

/// Error types for catalog loading, detection parsing and plan output
#[derive(Debug)]
pub enum PanelizeError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    JsonError(serde_json::Error),
    InvalidCatalog(PathBuf),
    MissingWidthColumn(PathBuf),
}

impl std::fmt::Display for PanelizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanelizeError::IoError(e) => write!(f, "IO error: {}", e),
            PanelizeError::CsvError(e) => write!(f, "CSV error: {}", e),
            PanelizeError::JsonError(e) => write!(f, "JSON error: {}", e),
            PanelizeError::InvalidCatalog(path) => {
                write!(f, "Panel list file invalid (expected .csv): {}", path.display())
            }
            PanelizeError::MissingWidthColumn(path) => write!(
                f,
                "No panels specified in {} or the panel width column is not named as expected",
                path.display()
            ),
        }
    }
}

impl std::error::Error for PanelizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PanelizeError::IoError(e) => Some(e),
            PanelizeError::CsvError(e) => Some(e),
            PanelizeError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PanelizeError {
    fn from(err: std::io::Error) -> Self {
        PanelizeError::IoError(err)
    }
}

impl From<csv::Error> for PanelizeError {
    fn from(err: csv::Error) -> Self {
        PanelizeError::CsvError(err)
    }
}

impl From<serde_json::Error> for PanelizeError {
    fn from(err: serde_json::Error) -> Self {
        PanelizeError::JsonError(err)
    }
}

pub type Result<T> = std::result::Result<T, PanelizeError>;
