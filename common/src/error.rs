use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown command topic `{0}`")]
    UnknownTopic(String),
    #[error("invalid value `{value}` for `{control}`")]
    InvalidValue { control: &'static str, value: String },
    #[error("{control} value {value} outside {min}..={max}")]
    OutOfRange {
        control: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown timezone `{0}`")]
    InvalidTimezone(String),
}
