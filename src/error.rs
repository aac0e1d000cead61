/// Error type shared by the library and the binary.
///
/// Every failure carries the process exit code the binary should use:
///
/// - `2`: input/usage (unreadable file or URL, bad CLI date)
/// - `3`: data (missing required column, empty table, absent reference years)
/// - `4`: computation (series combined without a shared date axis)
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Two series that must share one date axis have different lengths.
    pub fn misaligned(what: &str, expected: usize, found: usize) -> Self {
        Self::new(
            4,
            format!("Alignment mismatch in {what}: expected {expected} days, found {found}."),
        )
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
