use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error reading {0}: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("CSV error in {0}: {1}")]
    Csv(String, #[source] csv::Error),
}
