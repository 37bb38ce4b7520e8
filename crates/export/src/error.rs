use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error writing {0}: {1}")]
    Csv(String, #[source] csv::Error),

    #[error("I/O error writing {0}: {1}")]
    Io(String, #[source] std::io::Error),
}
