#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Evaluation,
    Schema,
    Provider,
    Refresh,
    Unknown,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "Configuration",
            ErrorKind::Evaluation => "Evaluation",
            ErrorKind::Schema => "Schema",
            ErrorKind::Provider => "Provider",
            ErrorKind::Refresh => "Refresh",
            ErrorKind::Unknown => "Unknown",
        }
    }
}
