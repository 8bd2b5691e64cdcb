use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid poller configuration: {message}")]
    InvalidConfig { message: String },
}

impl ChatError {
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
