/// Fatal pipeline error carrying the process exit code.
///
/// Exit codes:
/// - `2`: local I/O (report file)
/// - `3`: input schema (unreadable CSV, missing required column)
/// - `4`: source fetch (transport error or non-200 response)
/// - `5`: persistence or query failure
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub const IO: u8 = 2;
    pub const SCHEMA: u8 = 3;
    pub const FETCH: u8 = 4;
    pub const STORE: u8 = 5;

    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(Self::IO, message)
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(Self::SCHEMA, message)
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(Self::FETCH, message)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(Self::STORE, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
