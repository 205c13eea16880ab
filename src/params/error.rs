use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParamError {
    #[error("parameter '{name}': cannot parse '{value}' as {target}")]
    Malformed {
        name: String,
        value: String,
        target: &'static str,
    },

    #[error("parameter '{name}': requested {expected} but value is {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}
