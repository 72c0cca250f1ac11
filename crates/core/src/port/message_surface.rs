// Message Surface Port
// Where a page shows "Cannot ..." errors to the operator

/// Message-display surface owned by a page
///
/// Jobs only hold a `Weak` reference to a surface. Both methods are called
/// from the interactive thread.
pub trait MessageSurface: Send + Sync {
    /// Show an error message to the operator
    fn show_error(&self, message: &str);

    /// A surface can outlive its widget; a disposed surface must not be written to
    fn is_disposed(&self) -> bool {
        false
    }
}
