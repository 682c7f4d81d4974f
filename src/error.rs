pub type ParadeResult<T> = Result<T, ParadeError>;

#[derive(thiserror::Error, Debug)]
pub enum ParadeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("load error: {0}")]
    Load(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ParadeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ParadeError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(ParadeError::load("x").to_string().contains("load error:"));
        assert!(
            ParadeError::surface("x")
                .to_string()
                .contains("surface error:")
        );
        assert!(
            ParadeError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ParadeError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
